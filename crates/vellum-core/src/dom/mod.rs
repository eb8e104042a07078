//! DOM-lite tree shared by schema serialization and parsing.
//!
//! The editor core never touches a browser DOM; it works on this minimal
//! element/text tree plus an HTML codec ([`parse_html`] / [`to_html`]) so
//! round-trip behavior is testable from plain strings. Render hooks produce
//! [`DomTemplate`] values — the `[tag, attrs, ...children]` shape with a
//! single content hole marking where a node's children are spliced in.

mod parse;
mod selector;

pub use parse::{parse_html, DomParseError};
pub use selector::{Selector, SelectorError};

// ── Types ──────────────────────────────────────────────────────────────────

/// A node in the DOM-lite tree: a text leaf or an element.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    /// Text content leaf.
    Text(String),
    /// Element with tag, attributes, and children.
    Element(DomElement),
}

impl DomNode {
    pub fn text(s: impl Into<String>) -> Self {
        DomNode::Text(s.into())
    }

    pub fn as_element(&self) -> Option<&DomElement> {
        match self {
            DomNode::Element(el) => Some(el),
            DomNode::Text(_) => None,
        }
    }
}

/// An element: tag, attributes, children.
///
/// Attributes are an ordered `Vec<(key, value)>` so that output order always
/// matches insertion order; lookups are linear, which is fine at the fanout
/// real documents have.
#[derive(Debug, Clone, PartialEq)]
pub struct DomElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<DomNode>,
}

impl DomElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The capability parse rules are written against: read one attribute.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value for the same key.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// First child element with the given tag, if any.
    pub fn find_child_element(&self, tag: &str) -> Option<&DomElement> {
        self.children.iter().find_map(|c| match c {
            DomNode::Element(el) if el.tag == tag => Some(el),
            _ => None,
        })
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(children: &[DomNode], out: &mut String) {
    for child in children {
        match child {
            DomNode::Text(s) => out.push_str(s),
            DomNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

// ── Render templates ───────────────────────────────────────────────────────

/// Output of a render hook: an element tree with at most one [`Hole`]
/// marking where the node's serialized content is spliced in.
///
/// [`Hole`]: DomTemplate::Hole
#[derive(Debug, Clone, PartialEq)]
pub enum DomTemplate {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<DomTemplate>,
    },
    Text(String),
    Hole,
}

impl DomTemplate {
    pub fn element(
        tag: impl Into<String>,
        attrs: Vec<(String, String)>,
        children: Vec<DomTemplate>,
    ) -> Self {
        DomTemplate::Element {
            tag: tag.into(),
            attrs,
            children,
        }
    }

    /// Element with no attributes.
    pub fn node(tag: impl Into<String>, children: Vec<DomTemplate>) -> Self {
        Self::element(tag, Vec::new(), children)
    }

    /// Number of content holes in the template. The schema builder rejects
    /// templates with more than one.
    pub fn hole_count(&self) -> usize {
        match self {
            DomTemplate::Hole => 1,
            DomTemplate::Text(_) => 0,
            DomTemplate::Element { children, .. } => {
                children.iter().map(DomTemplate::hole_count).sum()
            }
        }
    }

    /// Instantiate the template, splicing `content` at the hole. A template
    /// without a hole ignores `content`.
    pub fn fill(&self, content: &[DomNode]) -> Vec<DomNode> {
        match self {
            DomTemplate::Hole => content.to_vec(),
            DomTemplate::Text(s) => vec![DomNode::Text(s.clone())],
            DomTemplate::Element {
                tag,
                attrs,
                children,
            } => {
                let mut out = Vec::with_capacity(children.len());
                for child in children {
                    out.extend(child.fill(content));
                }
                vec![DomNode::Element(DomElement {
                    tag: tag.clone(),
                    attrs: attrs.clone(),
                    children: out,
                })]
            }
        }
    }
}

// ── HTML serializer ────────────────────────────────────────────────────────

/// Tags serialized without a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(ch),
        }
    }
}

/// Serialize one node to compact HTML. Compact output keeps whitespace in
/// text nodes verbatim, which `pre` content depends on.
pub fn to_html(node: &DomNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

/// Serialize a sequence of sibling nodes (e.g. a whole document body).
pub fn to_html_fragment(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &DomNode, out: &mut String) {
    match node {
        DomNode::Text(s) => escape_text(s, out),
        DomNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (k, v) in &el.attrs {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                escape_attr(v, out);
                out.push('"');
            }
            if is_void(&el.tag) && el.children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in &el.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> DomNode {
        DomNode::Text(s.to_owned())
    }

    fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<DomNode>) -> DomNode {
        DomNode::Element(DomElement {
            tag: tag.to_owned(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        })
    }

    #[test]
    fn text_node_to_html() {
        assert_eq!(to_html(&text("a & b")), "a &amp; b");
        assert_eq!(to_html(&text("<p>")), "&lt;p&gt;");
    }

    #[test]
    fn element_with_text_child() {
        assert_eq!(to_html(&el("p", &[], vec![text("hi")])), "<p>hi</p>");
    }

    #[test]
    fn empty_non_void_element_keeps_closing_tag() {
        assert_eq!(to_html(&el("p", &[], vec![])), "<p></p>");
    }

    #[test]
    fn void_element_self_closes() {
        assert_eq!(to_html(&el("br", &[], vec![])), "<br />");
    }

    #[test]
    fn attrs_preserve_insertion_order() {
        let node = el("a", &[("z", "1"), ("a", "2")], vec![text("x")]);
        assert_eq!(to_html(&node), r#"<a z="1" a="2">x</a>"#);
    }

    #[test]
    fn attr_values_escaped() {
        let node = el("a", &[("href", "a?x=1&y=\"2\"")], vec![]);
        assert_eq!(to_html(&node), r#"<a href="a?x=1&amp;y=&quot;2&quot;"></a>"#);
    }

    #[test]
    fn nested_elements() {
        let node = el("pre", &[], vec![el("code", &[], vec![text("fn main()")])]);
        assert_eq!(to_html(&node), "<pre><code>fn main()</code></pre>");
    }

    #[test]
    fn whitespace_in_text_kept_verbatim() {
        let node = el("pre", &[], vec![el("code", &[], vec![text("a\n\n  b\tc")])]);
        assert_eq!(to_html(&node), "<pre><code>a\n\n  b\tc</code></pre>");
    }

    #[test]
    fn get_attribute_and_set_attribute() {
        let mut e = DomElement::new("a");
        assert_eq!(e.get_attribute("href"), None);
        e.set_attribute("href", "https://x.test");
        e.set_attribute("rel", "noopener");
        e.set_attribute("href", "https://y.test");
        assert_eq!(e.get_attribute("href"), Some("https://y.test"));
        assert_eq!(e.attrs.len(), 2);
    }

    #[test]
    fn find_child_element_skips_text() {
        let node = el("pre", &[], vec![text(" "), el("code", &[], vec![])]);
        let pre = node.as_element().unwrap();
        assert_eq!(pre.find_child_element("code").map(|c| c.tag.as_str()), Some("code"));
        assert!(pre.find_child_element("span").is_none());
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let node = el(
            "p",
            &[],
            vec![text("a"), el("b", &[], vec![text("b")]), text("c")],
        );
        assert_eq!(node.as_element().unwrap().text_content(), "abc");
    }

    #[test]
    fn template_fill_splices_content_at_hole() {
        let tpl = DomTemplate::node("pre", vec![DomTemplate::node("code", vec![DomTemplate::Hole])]);
        assert_eq!(tpl.hole_count(), 1);
        let filled = tpl.fill(&[text("xs.iter()")]);
        assert_eq!(to_html_fragment(&filled), "<pre><code>xs.iter()</code></pre>");
    }

    #[test]
    fn template_without_hole_ignores_content() {
        let tpl = DomTemplate::node("hr", vec![]);
        assert_eq!(tpl.hole_count(), 0);
        let filled = tpl.fill(&[text("dropped")]);
        assert_eq!(to_html_fragment(&filled), "<hr />");
    }

    #[test]
    fn template_with_static_attrs() {
        let tpl = DomTemplate::element(
            "a",
            vec![("rel".into(), "noopener".into())],
            vec![DomTemplate::Hole],
        );
        let filled = tpl.fill(&[text("link")]);
        assert_eq!(to_html_fragment(&filled), r#"<a rel="noopener">link</a>"#);
    }
}
