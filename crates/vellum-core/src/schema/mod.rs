//! Document schema: per-type specs contributed by extensions, and the
//! resolved [`Schema`] the builder assembles from them.
//!
//! Specs (`NodeSpec`, `MarkSpec`, `ParseRule`, `AttributeSpec`) are the raw
//! declarative form hooks produce. Resolved types (`NodeType`, `MarkType`)
//! are what the rest of the editor works against: selectors parsed, content
//! expressions checked, attribute maps merged.

mod builder;
mod content;
mod parse;
mod serialize;

pub use builder::SchemaBuilder;
pub use content::ContentExpr;
pub use parse::parse_document;
pub use serialize::serialize_document;

use indexmap::IndexMap;
use serde_json::Value;

use crate::dom::{DomElement, DomTemplate, Selector};
use crate::model::Attrs;

// ── Attribute specs ────────────────────────────────────────────────────────

/// Declaration of one attribute on a node or mark type.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    /// Value used when the attribute is absent at creation time.
    pub default: Value,
    /// When `false` the attribute is excluded from the computed DOM
    /// attribute set and the render hook is expected to emit it itself.
    pub rendered: bool,
}

impl AttributeSpec {
    pub fn new(default: Value) -> Self {
        Self {
            default,
            rendered: true,
        }
    }

    pub fn rendered(mut self, rendered: bool) -> Self {
        self.rendered = rendered;
        self
    }
}

impl Default for AttributeSpec {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

pub type AttributeSpecs = IndexMap<String, AttributeSpec>;

// ── Parse rules ────────────────────────────────────────────────────────────

/// Whitespace handling while parsing the content of a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whitespace {
    /// Collapse runs of whitespace to single spaces.
    #[default]
    Collapse,
    /// Keep text verbatim (`pre` semantics).
    Full,
}

type GetAttrsFn = Box<dyn Fn(&DomElement) -> Option<Attrs>>;

/// A DOM pattern that maps matched elements to one node or mark type.
///
/// `attr_keys` declares up front which attribute names `get_attrs` may
/// extract; the schema builder checks them against the type's attribute
/// specs so a mismatch fails at configuration time.
pub struct ParseRule {
    pub selector: String,
    pub whitespace: Whitespace,
    pub attr_keys: Vec<String>,
    pub get_attrs: Option<GetAttrsFn>,
}

impl ParseRule {
    pub fn tag(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            whitespace: Whitespace::Collapse,
            attr_keys: Vec::new(),
            get_attrs: None,
        }
    }

    pub fn preserve_whitespace(mut self) -> Self {
        self.whitespace = Whitespace::Full;
        self
    }

    /// Attach an attribute extractor. `keys` lists every attribute name the
    /// closure may put into the returned map. Returning `None` rejects the
    /// element, letting later rules try it.
    pub fn get_attrs<F>(mut self, keys: &[&str], f: F) -> Self
    where
        F: Fn(&DomElement) -> Option<Attrs> + 'static,
    {
        self.attr_keys = keys.iter().map(|k| (*k).to_owned()).collect();
        self.get_attrs = Some(Box::new(f));
        self
    }
}

/// A parse rule with its selector compiled, as stored on resolved types.
pub(crate) struct CompiledParseRule {
    pub selector: Selector,
    pub whitespace: Whitespace,
    pub get_attrs: Option<GetAttrsFn>,
}

impl CompiledParseRule {
    pub fn matches(&self, element: &DomElement) -> bool {
        self.selector.matches(element)
    }

    /// Run the extractor. `None` means the rule rejects this element.
    pub fn extract(&self, element: &DomElement) -> Option<Attrs> {
        match &self.get_attrs {
            Some(f) => f(element),
            None => Some(Attrs::new()),
        }
    }
}

// ── Render hooks ───────────────────────────────────────────────────────────

/// Input to a render hook: the node/mark attributes plus the computed DOM
/// attribute set (rendered specs only, nulls skipped, values stringified).
pub struct RenderCtx<'a> {
    pub attrs: &'a Attrs,
    pub dom_attrs: &'a [(String, String)],
}

impl RenderCtx<'_> {
    /// Merge explicit attribute pairs over the computed set; explicit pairs
    /// win on key conflict and append after the computed ones otherwise.
    pub fn merged_with(&self, explicit: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .dom_attrs
            .iter()
            .filter(|(k, _)| !explicit.iter().any(|(ek, _)| ek == k))
            .cloned()
            .collect();
        out.extend(explicit);
        out
    }
}

pub type RenderFn = Box<dyn Fn(&RenderCtx) -> DomTemplate>;

// ── Specs ──────────────────────────────────────────────────────────────────

/// Which marks a node type's inline content accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MarksPolicy {
    /// Unset: every mark, provided the node is a textblock.
    #[default]
    Default,
    /// Explicitly none (the empty string in spec form).
    None,
    /// Only the listed mark type names.
    Only(Vec<String>),
}

impl MarksPolicy {
    fn from_spec(spec: Option<&str>) -> Self {
        match spec {
            None => MarksPolicy::Default,
            Some("") => MarksPolicy::None,
            Some(list) => MarksPolicy::Only(
                list.split_whitespace().map(str::to_owned).collect(),
            ),
        }
    }

    fn allows(&self, is_textblock: bool, mark: &str) -> bool {
        match self {
            MarksPolicy::Default => is_textblock,
            MarksPolicy::None => false,
            MarksPolicy::Only(names) => names.iter().any(|n| n == mark),
        }
    }
}

/// Schema contribution of a node extension.
#[derive(Default)]
pub struct NodeSpec {
    pub content: Option<String>,
    pub marks: Option<String>,
    pub group: Option<String>,
    pub code: bool,
    pub defining: bool,
    pub draggable: bool,
    pub parse_rules: Vec<ParseRule>,
    pub render: Option<RenderFn>,
}

impl NodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = Some(expr.into());
        self
    }

    pub fn marks(mut self, marks: impl Into<String>) -> Self {
        self.marks = Some(marks.into());
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn code(mut self, code: bool) -> Self {
        self.code = code;
        self
    }

    pub fn defining(mut self, defining: bool) -> Self {
        self.defining = defining;
        self
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_rules.push(rule);
        self
    }

    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&RenderCtx) -> DomTemplate + 'static,
    {
        self.render = Some(Box::new(f));
        self
    }
}

/// Schema contribution of a mark extension.
pub struct MarkSpec {
    /// Whether text typed at the trailing edge inherits the mark.
    pub inclusive: bool,
    pub parse_rules: Vec<ParseRule>,
    pub render: Option<RenderFn>,
}

impl Default for MarkSpec {
    fn default() -> Self {
        Self {
            inclusive: true,
            parse_rules: Vec::new(),
            render: None,
        }
    }
}

impl MarkSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    pub fn parse_rule(mut self, rule: ParseRule) -> Self {
        self.parse_rules.push(rule);
        self
    }

    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(&RenderCtx) -> DomTemplate + 'static,
    {
        self.render = Some(Box::new(f));
        self
    }
}

// ── Resolved types ─────────────────────────────────────────────────────────

/// A node type after schema resolution.
pub struct NodeType {
    pub(crate) name: String,
    pub(crate) extension: String,
    pub(crate) content: Option<ContentExpr>,
    pub(crate) marks: MarksPolicy,
    pub(crate) group: Option<String>,
    pub(crate) code: bool,
    pub(crate) defining: bool,
    pub(crate) draggable: bool,
    pub(crate) textblock: bool,
    pub(crate) attrs: AttributeSpecs,
    pub(crate) parse_rules: Vec<CompiledParseRule>,
    pub(crate) render: Option<RenderFn>,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the extension that contributed this type.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_code(&self) -> bool {
        self.code
    }

    pub fn is_defining(&self) -> bool {
        self.defining
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    /// Whether the node's content is inline text.
    pub fn is_textblock(&self) -> bool {
        self.textblock
    }

    pub fn allows_mark(&self, mark: &str) -> bool {
        self.marks.allows(self.textblock, mark)
    }

    pub fn attr_specs(&self) -> &AttributeSpecs {
        &self.attrs
    }

    /// Attribute map with every declared attribute at its default.
    pub fn default_attrs(&self) -> Attrs {
        default_attrs(&self.attrs)
    }

    /// Defaults overlaid with `given`; unknown keys in `given` are kept
    /// (they round-trip, they just have no spec-driven behavior).
    pub fn fill_attrs(&self, given: Attrs) -> Attrs {
        fill_attrs(&self.attrs, given)
    }
}

/// A mark type after schema resolution.
pub struct MarkType {
    pub(crate) name: String,
    pub(crate) extension: String,
    pub(crate) inclusive: bool,
    pub(crate) attrs: AttributeSpecs,
    pub(crate) parse_rules: Vec<CompiledParseRule>,
    pub(crate) render: Option<RenderFn>,
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    pub fn attr_specs(&self) -> &AttributeSpecs {
        &self.attrs
    }

    pub fn default_attrs(&self) -> Attrs {
        default_attrs(&self.attrs)
    }

    pub fn fill_attrs(&self, given: Attrs) -> Attrs {
        fill_attrs(&self.attrs, given)
    }
}

fn default_attrs(specs: &AttributeSpecs) -> Attrs {
    let mut out = Attrs::new();
    for (name, spec) in specs {
        out.insert(name.clone(), spec.default.clone());
    }
    out
}

fn fill_attrs(specs: &AttributeSpecs, given: Attrs) -> Attrs {
    let mut out = default_attrs(specs);
    for (k, v) in given {
        out.insert(k, v);
    }
    out
}

// ── Schema ─────────────────────────────────────────────────────────────────

/// The resolved document schema. Built once by [`SchemaBuilder`], then
/// shared immutably for the editor's lifetime.
pub struct Schema {
    pub(crate) nodes: IndexMap<String, NodeType>,
    pub(crate) marks: IndexMap<String, MarkType>,
    pub(crate) top: String,
}

impl Schema {
    pub fn node(&self, name: &str) -> Option<&NodeType> {
        self.nodes.get(name)
    }

    pub fn mark(&self, name: &str) -> Option<&MarkType> {
        self.marks.get(name)
    }

    /// Node type names in registration order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Mark type names in registration order.
    pub fn mark_names(&self) -> impl Iterator<Item = &str> {
        self.marks.keys().map(String::as_str)
    }

    pub fn top_node(&self) -> &str {
        &self.top
    }

    /// Whether `node` accepts `mark` on its inline content. Unknown names
    /// answer `false`.
    pub fn allows_mark(&self, node: &str, mark: &str) -> bool {
        if self.mark(mark).is_none() {
            return false;
        }
        self.node(node).is_some_and(|nt| nt.allows_mark(mark))
    }

    /// Whether typing at `pos` should keep an inherited mark of this type.
    pub fn mark_is_inclusive(&self, mark: &str) -> bool {
        self.mark(mark).map_or(true, MarkType::is_inclusive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_policy_from_spec_strings() {
        assert_eq!(MarksPolicy::from_spec(None), MarksPolicy::Default);
        assert_eq!(MarksPolicy::from_spec(Some("")), MarksPolicy::None);
        assert_eq!(
            MarksPolicy::from_spec(Some("link em")),
            MarksPolicy::Only(vec!["link".into(), "em".into()])
        );
    }

    #[test]
    fn default_policy_tracks_textblock() {
        assert!(MarksPolicy::Default.allows(true, "link"));
        assert!(!MarksPolicy::Default.allows(false, "link"));
        assert!(!MarksPolicy::None.allows(true, "link"));
        assert!(MarksPolicy::Only(vec!["em".into()]).allows(false, "em"));
        assert!(!MarksPolicy::Only(vec!["em".into()]).allows(true, "link"));
    }

    #[test]
    fn fill_attrs_overlays_defaults() {
        let mut specs = AttributeSpecs::new();
        specs.insert("href".into(), AttributeSpec::default());
        specs.insert(
            "target".into(),
            AttributeSpec::new(Value::String("_self".into())),
        );
        let mut given = Attrs::new();
        given.insert("href".into(), Value::String("https://x.test".into()));
        let filled = fill_attrs(&specs, given);
        assert_eq!(filled["href"], Value::String("https://x.test".into()));
        assert_eq!(filled["target"], Value::String("_self".into()));
    }

    #[test]
    fn merged_with_gives_explicit_pairs_precedence() {
        let attrs = Attrs::new();
        let computed = vec![
            ("class".to_string(), "a".to_string()),
            ("id".to_string(), "x".to_string()),
        ];
        let ctx = RenderCtx {
            attrs: &attrs,
            dom_attrs: &computed,
        };
        let merged = ctx.merged_with(vec![("class".into(), "b".into())]);
        assert_eq!(
            merged,
            vec![
                ("id".to_string(), "x".to_string()),
                ("class".to_string(), "b".to_string()),
            ]
        );
    }
}
