//! Schema assembly: collects per-extension specs and validates the whole
//! set before any editor state exists.
//!
//! Validation failures all carry the contributing extension's name, so a
//! bad fragment in a long extension list is attributable. Checks run in
//! registration order and stop at the first failure.

use indexmap::{IndexMap, IndexSet};

use crate::dom::Selector;
use crate::error::ConfigError;
use crate::extension::ExtensionKind;
use crate::model::{DOC_TYPE, TEXT_TYPE};

use super::serialize::computed_dom_attrs;
use super::{
    default_attrs, AttributeSpecs, CompiledParseRule, ContentExpr, MarkSpec, MarkType, MarksPolicy,
    NodeSpec, NodeType, ParseRule, RenderCtx, RenderFn, Schema,
};

struct PendingNode {
    name: String,
    spec: NodeSpec,
    attrs: AttributeSpecs,
}

struct PendingMark {
    name: String,
    spec: MarkSpec,
    attrs: AttributeSpecs,
}

/// Accumulates node and mark specs, then resolves them into a [`Schema`].
#[derive(Default)]
pub struct SchemaBuilder {
    nodes: Vec<PendingNode>,
    marks: Vec<PendingMark>,
    order: Vec<(String, ExtensionKind)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: impl Into<String>, spec: NodeSpec, attrs: AttributeSpecs) {
        let name = name.into();
        self.order.push((name.clone(), ExtensionKind::Node));
        self.nodes.push(PendingNode { name, spec, attrs });
    }

    pub fn add_mark(&mut self, name: impl Into<String>, spec: MarkSpec, attrs: AttributeSpecs) {
        let name = name.into();
        self.order.push((name.clone(), ExtensionKind::Mark));
        self.marks.push(PendingMark { name, spec, attrs });
    }

    /// Validate every collected spec and build the schema.
    ///
    /// The reserved `doc` and `text` types must both be present; they are
    /// the only types allowed to omit a render template.
    pub fn finish(self) -> Result<Schema, ConfigError> {
        let mut seen: IndexMap<&str, ExtensionKind> = IndexMap::new();
        for (name, kind) in &self.order {
            if let Some(first) = seen.get(name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    name: name.clone(),
                    first: *first,
                    second: *kind,
                });
            }
            seen.insert(name, *kind);
        }
        for reserved in [DOC_TYPE, TEXT_TYPE] {
            if !self.nodes.iter().any(|n| n.name == reserved) {
                return Err(ConfigError::ReservedMissing { name: reserved });
            }
        }

        // name tables needed before individual nodes resolve
        let node_names: IndexSet<String> = self.nodes.iter().map(|n| n.name.clone()).collect();
        let mark_names: IndexSet<String> = self.marks.iter().map(|m| m.name.clone()).collect();
        let mut groups: IndexSet<String> = IndexSet::new();
        let mut inline_nodes: IndexSet<String> = IndexSet::new();
        inline_nodes.insert(TEXT_TYPE.to_owned());
        for pending in &self.nodes {
            if let Some(group) = &pending.spec.group {
                for token in group.split_whitespace() {
                    groups.insert(token.to_owned());
                    if token == "inline" {
                        inline_nodes.insert(pending.name.clone());
                    }
                }
            }
        }

        let mut nodes = IndexMap::with_capacity(self.nodes.len());
        for PendingNode { name, spec, attrs } in self.nodes {
            let NodeSpec {
                content,
                marks,
                group,
                code,
                defining,
                draggable,
                parse_rules,
                render,
            } = spec;

            let content = match content {
                Some(src) => {
                    Some(
                        ContentExpr::parse(&src).map_err(|e| ConfigError::InvalidContent {
                            extension: name.clone(),
                            expr: e.expr,
                            reason: e.reason,
                        })?,
                    )
                }
                None => None,
            };
            if let Some(expr) = &content {
                for referenced in expr.references() {
                    if !node_names.contains(referenced) && !groups.contains(referenced) {
                        return Err(ConfigError::UnknownContentRef {
                            extension: name.clone(),
                            referenced: referenced.to_owned(),
                        });
                    }
                }
            }
            // a textblock holds inline content only
            let textblock = content.as_ref().is_some_and(|expr| {
                expr.references()
                    .all(|r| r == TEXT_TYPE || r == "inline" || inline_nodes.contains(r))
            });

            let marks = MarksPolicy::from_spec(marks.as_deref());
            if let MarksPolicy::Only(listed) = &marks {
                for mark in listed {
                    if !mark_names.contains(mark) {
                        return Err(ConfigError::UnknownMarkRef {
                            extension: name.clone(),
                            referenced: mark.clone(),
                        });
                    }
                }
            }

            let parse_rules = compile_rules(&name, parse_rules, &attrs)?;
            match &render {
                Some(hook) => check_holes(&name, hook, &attrs, content.is_some())?,
                None if name != DOC_TYPE && name != TEXT_TYPE => {
                    return Err(ConfigError::MissingRender { extension: name });
                }
                None => {}
            }

            nodes.insert(
                name.clone(),
                NodeType {
                    extension: name.clone(),
                    name,
                    content,
                    marks,
                    group,
                    code,
                    defining,
                    draggable,
                    textblock,
                    attrs,
                    parse_rules,
                    render,
                },
            );
        }

        let mut marks = IndexMap::with_capacity(self.marks.len());
        for PendingMark { name, spec, attrs } in self.marks {
            let MarkSpec {
                inclusive,
                parse_rules,
                render,
            } = spec;
            let parse_rules = compile_rules(&name, parse_rules, &attrs)?;
            let Some(render) = render else {
                return Err(ConfigError::MissingRender { extension: name });
            };
            check_holes(&name, &render, &attrs, true)?;
            marks.insert(
                name.clone(),
                MarkType {
                    extension: name.clone(),
                    name,
                    inclusive,
                    attrs,
                    parse_rules,
                    render: Some(render),
                },
            );
        }

        Ok(Schema {
            nodes,
            marks,
            top: DOC_TYPE.to_owned(),
        })
    }
}

fn compile_rules(
    extension: &str,
    rules: Vec<ParseRule>,
    attrs: &AttributeSpecs,
) -> Result<Vec<CompiledParseRule>, ConfigError> {
    let mut out = Vec::with_capacity(rules.len());
    for rule in rules {
        for key in &rule.attr_keys {
            if !attrs.contains_key(key) {
                return Err(ConfigError::UndeclaredAttr {
                    extension: extension.to_owned(),
                    attr: key.clone(),
                });
            }
        }
        let selector =
            Selector::parse(&rule.selector).map_err(|_| ConfigError::InvalidSelector {
                extension: extension.to_owned(),
                selector: rule.selector.clone(),
            })?;
        out.push(CompiledParseRule {
            selector,
            whitespace: rule.whitespace,
            get_attrs: rule.get_attrs,
        });
    }
    Ok(out)
}

/// Run the render hook once against default attributes and count content
/// holes: content-bearing types need exactly one, leaves at most one.
fn check_holes(
    extension: &str,
    render: &RenderFn,
    attrs: &AttributeSpecs,
    requires_hole: bool,
) -> Result<(), ConfigError> {
    let defaults = default_attrs(attrs);
    let dom_attrs = computed_dom_attrs(&defaults, attrs);
    let ctx = RenderCtx {
        attrs: &defaults,
        dom_attrs: &dom_attrs,
    };
    let holes = render(&ctx).hole_count();
    let ok = if requires_hole { holes == 1 } else { holes <= 1 };
    if ok {
        Ok(())
    } else {
        Err(ConfigError::BadRenderTemplate {
            extension: extension.to_owned(),
            holes,
        })
    }
}
