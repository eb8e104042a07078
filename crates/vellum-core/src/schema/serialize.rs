//! Document → DOM serialization through the schema's render templates.

use serde_json::Value;

use crate::dom::DomNode;
use crate::model::{Attrs, Mark, Node};

use super::{AttributeSpecs, MarkType, RenderCtx, Schema};

/// DOM attribute pairs computed from a type's attribute specs: declared,
/// `rendered` specs only, nulls skipped. Strings pass through verbatim;
/// other values serialize to compact JSON.
pub(crate) fn computed_dom_attrs(attrs: &Attrs, specs: &AttributeSpecs) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (name, spec) in specs {
        if !spec.rendered {
            continue;
        }
        let value = match attrs.get(name) {
            Some(v) => v,
            None => &spec.default,
        };
        match value {
            Value::Null => {}
            Value::String(s) => out.push((name.clone(), s.clone())),
            other => out.push((name.clone(), other.to_string())),
        }
    }
    out
}

/// Serialize a document to a DOM-lite forest, one tree per block.
///
/// Blocks go through their type's render template; inline runs become text
/// nodes wrapped in their marks' templates. When a run carries several
/// marks, the earliest-registered mark type wraps outermost, so output
/// nesting is deterministic regardless of how the marks were applied.
pub fn serialize_document(doc: &Node, schema: &Schema) -> Vec<DomNode> {
    let blocks: Vec<DomNode> = doc
        .content
        .iter()
        .flat_map(|block| serialize_block(block, schema))
        .collect();
    match schema.node(&doc.type_name) {
        Some(node_type) if node_type.render.is_some() => {
            render_with(node_type.render.as_ref(), &doc.attrs, node_type.attr_specs(), &blocks)
        }
        _ => blocks,
    }
}

fn serialize_block(node: &Node, schema: &Schema) -> Vec<DomNode> {
    if node.is_text() {
        return serialize_run(node, schema);
    }
    let Some(node_type) = schema.node(&node.type_name) else {
        log::warn!("serialize: unknown node type `{}` skipped", node.type_name);
        return Vec::new();
    };
    let content: Vec<DomNode> = if node_type.is_textblock() {
        node.content
            .iter()
            .flat_map(|run| serialize_run(run, schema))
            .collect()
    } else {
        node.content
            .iter()
            .flat_map(|child| serialize_block(child, schema))
            .collect()
    };
    if node_type.render.is_none() {
        return content;
    }
    render_with(node_type.render.as_ref(), &node.attrs, node_type.attr_specs(), &content)
}

fn render_with(
    render: Option<&super::RenderFn>,
    attrs: &Attrs,
    specs: &AttributeSpecs,
    content: &[DomNode],
) -> Vec<DomNode> {
    let Some(render) = render else {
        return content.to_vec();
    };
    let dom_attrs = computed_dom_attrs(attrs, specs);
    let ctx = RenderCtx {
        attrs,
        dom_attrs: &dom_attrs,
    };
    render(&ctx).fill(content)
}

fn serialize_run(run: &Node, schema: &Schema) -> Vec<DomNode> {
    let Some(text) = run.text.as_deref() else {
        return Vec::new();
    };
    if text.is_empty() {
        return Vec::new();
    }
    let mut ordered: Vec<(&Mark, &MarkType)> = Vec::with_capacity(run.marks.len());
    for name in schema.mark_names() {
        if let Some(mark) = run.marks.iter().find(|m| m.type_name == name) {
            if let Some(mark_type) = schema.mark(name) {
                ordered.push((mark, mark_type));
            }
        }
    }
    // registration order is outermost-first; build inside out
    let mut node = DomNode::text(text);
    for (mark, mark_type) in ordered.iter().rev() {
        node = wrap_in_mark(node, mark, mark_type);
    }
    vec![node]
}

fn wrap_in_mark(inner: DomNode, mark: &Mark, mark_type: &MarkType) -> DomNode {
    let Some(render) = mark_type.render.as_ref() else {
        return inner;
    };
    let dom_attrs = computed_dom_attrs(&mark.attrs, mark_type.attr_specs());
    let ctx = RenderCtx {
        attrs: &mark.attrs,
        dom_attrs: &dom_attrs,
    };
    let content = [inner];
    let mut filled = render(&ctx).fill(&content);
    if filled.is_empty() {
        let [inner] = content;
        return inner;
    }
    filled.remove(0)
}
