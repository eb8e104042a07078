//! DOM → document parsing through the schema's parse rules.
//!
//! Block-level elements are matched against node-type rules in schema
//! registration order; inline elements against mark-type rules the same
//! way. Elements nothing claims are unwrapped in place, so unknown markup
//! degrades to its content instead of being dropped. Rule extractors that
//! return `None` reject their element and matching continues with the next
//! rule.

use crate::dom::{parse_html, DomElement, DomNode, DomParseError};
use crate::model::{Mark, Node};

use super::{CompiledParseRule, MarkType, NodeType, Schema, Whitespace};

/// Parse an HTML fragment into a document node.
///
/// The result's content may be empty (an empty or all-whitespace fragment);
/// callers that need a non-empty document supply their own fallback block.
pub fn parse_document(html: &str, schema: &Schema) -> Result<Node, DomParseError> {
    let dom = parse_html(html)?;
    Ok(Node::doc(parse_blocks(&dom, schema)))
}

fn parse_blocks(nodes: &[DomNode], schema: &Schema) -> Vec<Node> {
    let mut blocks = Vec::new();
    let mut inline_buf: Vec<DomNode> = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(el) => {
                if let Some((node_type, rule, attrs)) = match_block(el, schema) {
                    flush_inline(&mut blocks, &mut inline_buf, schema);
                    blocks.push(build_block(node_type, rule, attrs, el, schema));
                } else if has_block_descendant(el, schema) {
                    // container nothing claims; its blocks surface in place
                    flush_inline(&mut blocks, &mut inline_buf, schema);
                    blocks.extend(parse_blocks(&el.children, schema));
                } else {
                    inline_buf.push(node.clone());
                }
            }
            DomNode::Text(_) => inline_buf.push(node.clone()),
        }
    }
    flush_inline(&mut blocks, &mut inline_buf, schema);
    blocks
}

/// Wrap stray inline content in a paragraph, dropping whitespace-only
/// stretches between blocks.
fn flush_inline(blocks: &mut Vec<Node>, inline_buf: &mut Vec<DomNode>, schema: &Schema) {
    if inline_buf.is_empty() {
        return;
    }
    let buffered = std::mem::take(inline_buf);
    let mut acc = InlineAcc::default();
    parse_inline(&buffered, schema, Whitespace::Collapse, &[], &mut acc);
    let mut runs = acc.runs;
    trim_trailing_space(&mut runs);
    if runs.is_empty() {
        return;
    }
    let Some(paragraph) = schema.node("paragraph") else {
        log::warn!("parse: dropped stray inline content; no paragraph type registered");
        return;
    };
    blocks.push(Node::element(
        paragraph.name().to_owned(),
        paragraph.default_attrs(),
        runs,
    ));
}

fn match_block<'s>(
    el: &DomElement,
    schema: &'s Schema,
) -> Option<(&'s NodeType, &'s CompiledParseRule, crate::model::Attrs)> {
    for node_type in schema.nodes.values() {
        for rule in &node_type.parse_rules {
            if !rule.matches(el) {
                continue;
            }
            if let Some(attrs) = rule.extract(el) {
                return Some((node_type, rule, attrs));
            }
        }
    }
    None
}

fn match_mark<'s>(
    el: &DomElement,
    schema: &'s Schema,
) -> Option<(&'s MarkType, &'s CompiledParseRule, crate::model::Attrs)> {
    for mark_type in schema.marks.values() {
        for rule in &mark_type.parse_rules {
            if !rule.matches(el) {
                continue;
            }
            if let Some(attrs) = rule.extract(el) {
                return Some((mark_type, rule, attrs));
            }
        }
    }
    None
}

fn has_block_descendant(el: &DomElement, schema: &Schema) -> bool {
    el.children.iter().any(|child| match child {
        DomNode::Element(e) => match_block(e, schema).is_some() || has_block_descendant(e, schema),
        DomNode::Text(_) => false,
    })
}

fn build_block(
    node_type: &NodeType,
    rule: &CompiledParseRule,
    attrs: crate::model::Attrs,
    el: &DomElement,
    schema: &Schema,
) -> Node {
    let attrs = node_type.fill_attrs(attrs);
    let content = if node_type.is_textblock() {
        let mut acc = InlineAcc::default();
        parse_inline(&el.children, schema, rule.whitespace, &[], &mut acc);
        let mut runs = acc.runs;
        if rule.whitespace == Whitespace::Collapse {
            trim_trailing_space(&mut runs);
        }
        runs
    } else if node_type.content.is_some() {
        parse_blocks(&el.children, schema)
    } else {
        Vec::new()
    };
    Node::element(node_type.name().to_owned(), attrs, content)
}

// ── Inline assembly ────────────────────────────────────────────────────────

#[derive(Default)]
struct InlineAcc {
    runs: Vec<Node>,
}

impl InlineAcc {
    fn push_text(&mut self, text: &str, marks: &[Mark]) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.marks.as_slice() == marks {
                if let Some(t) = last.text.as_mut() {
                    t.push_str(text);
                    return;
                }
            }
        }
        self.runs.push(Node::text_run(text, marks.to_vec()));
    }

    fn ends_with_space(&self) -> bool {
        self.runs
            .last()
            .and_then(|run| run.text.as_deref())
            .is_some_and(|t| t.ends_with(' '))
    }

    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

fn parse_inline(
    nodes: &[DomNode],
    schema: &Schema,
    ws: Whitespace,
    marks: &[Mark],
    acc: &mut InlineAcc,
) {
    for node in nodes {
        match node {
            DomNode::Text(t) => match ws {
                Whitespace::Full => acc.push_text(t, marks),
                Whitespace::Collapse => {
                    let mut collapsed = collapse_whitespace(t);
                    // no double spaces across node boundaries, no leading
                    // space at the block edge
                    if collapsed.starts_with(' ') && (acc.is_empty() || acc.ends_with_space()) {
                        collapsed.remove(0);
                    }
                    acc.push_text(&collapsed, marks);
                }
            },
            DomNode::Element(el) => {
                if let Some((mark_type, rule, extracted)) = match_mark(el, schema) {
                    let mark =
                        Mark::with_attrs(mark_type.name().to_owned(), mark_type.fill_attrs(extracted));
                    let mut inner = marks.to_vec();
                    inner.retain(|m| m.type_name != mark.type_name);
                    inner.push(mark);
                    let inner_ws = match rule.whitespace {
                        Whitespace::Full => Whitespace::Full,
                        Whitespace::Collapse => ws,
                    };
                    parse_inline(&el.children, schema, inner_ws, &inner, acc);
                } else {
                    parse_inline(&el.children, schema, ws, marks, acc);
                }
            }
        }
    }
}

fn trim_trailing_space(runs: &mut Vec<Node>) {
    while let Some(last) = runs.last_mut() {
        let Some(text) = last.text.as_mut() else {
            break;
        };
        let kept = text.trim_end_matches(' ').len();
        if kept == text.len() {
            break;
        }
        if kept == 0 {
            runs.pop();
        } else {
            text.truncate(kept);
            break;
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if matches!(ch, ' ' | '\t' | '\n' | '\r') {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(ch);
            in_ws = false;
        }
    }
    out
}
