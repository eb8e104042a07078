//! Tag selectors for parse rules.
//!
//! Supports the forms parse rules actually use: `tag`, `tag[attr]`, and
//! `tag[attr=value]`. Matching is against lowercased names, which is what
//! [`parse_html`](super::parse_html) produces.

use thiserror::Error;

use super::DomElement;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid selector `{0}`")]
pub struct SelectorError(pub String);

/// A parsed tag selector, e.g. `a[href]` or `pre`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: String,
    /// Required attributes; `None` value means "present with any value".
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let source = source.trim();
        let bad = || SelectorError(source.to_owned());

        let (tag, rest) = match source.find('[') {
            Some(i) => (&source[..i], &source[i..]),
            None => (source, ""),
        };
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(bad());
        }

        let mut attrs = Vec::new();
        let mut rest = rest;
        while !rest.is_empty() {
            let inner = rest
                .strip_prefix('[')
                .and_then(|r| r.find(']').map(|end| (&r[..end], &r[end + 1..])));
            let (body, tail) = inner.ok_or_else(bad)?;
            if body.is_empty() {
                return Err(bad());
            }
            match body.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim_matches('"').trim_matches('\'');
                    attrs.push((name.to_ascii_lowercase(), Some(value.to_owned())));
                }
                None => attrs.push((body.to_ascii_lowercase(), None)),
            }
            rest = tail;
        }

        Ok(Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn matches(&self, element: &DomElement) -> bool {
        if element.tag != self.tag {
            return false;
        }
        self.attrs.iter().all(|(name, expected)| {
            match (element.get_attribute(name), expected) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, attrs: &[(&str, &str)]) -> DomElement {
        let mut el = DomElement::new(tag);
        for (k, v) in attrs {
            el.set_attribute(*k, *v);
        }
        el
    }

    #[test]
    fn bare_tag_matches_tag_only() {
        let sel = Selector::parse("pre").expect("selector");
        assert!(sel.matches(&element("pre", &[])));
        assert!(!sel.matches(&element("p", &[])));
    }

    #[test]
    fn attr_presence_required() {
        let sel = Selector::parse("a[href]").expect("selector");
        assert!(sel.matches(&element("a", &[("href", "https://x.test")])));
        assert!(sel.matches(&element("a", &[("href", "")])));
        assert!(!sel.matches(&element("a", &[("name", "anchor")])));
    }

    #[test]
    fn attr_value_must_match_exactly() {
        let sel = Selector::parse(r#"input[type="checkbox"]"#).expect("selector");
        assert!(sel.matches(&element("input", &[("type", "checkbox")])));
        assert!(!sel.matches(&element("input", &[("type", "text")])));
    }

    #[test]
    fn multiple_attr_requirements() {
        let sel = Selector::parse("a[href][target]").expect("selector");
        assert!(sel.matches(&element("a", &[("href", "x"), ("target", "_blank")])));
        assert!(!sel.matches(&element("a", &[("href", "x")])));
    }

    #[test]
    fn malformed_selectors_rejected() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("[href]").is_err());
        assert!(Selector::parse("a[href").is_err());
        assert!(Selector::parse("a[]").is_err());
        assert!(Selector::parse("a b").is_err());
    }
}
