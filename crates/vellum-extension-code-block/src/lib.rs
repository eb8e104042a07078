//! Fenced code block extension: a `code_block` node type with verbatim
//! whitespace, a backtick-fence input rule, a toggle command, and a
//! keyboard shortcut.
//!
//! The node parses from `pre` and serializes back to exactly `pre > code`.
//! A `language` attribute (default null) round-trips through a class on the
//! inner `code` element; the class prefix is an option.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use vellum_core::{
    Attrs, AttributeSpec, AttributeSpecs, CommandFactory, CommandScope, DomElement, DomTemplate,
    InputRule, NodeExtension, NodeSpec, Options, ParseRule,
};

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```$").expect("valid fence regex"));

/// Typed mirror of the extension's option bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeBlockOptions {
    /// Prefix of the `class` emitted on (and parsed from) the inner `code`
    /// element, e.g. `language-` in `class="language-rust"`.
    pub language_class_prefix: String,
}

impl Default for CodeBlockOptions {
    fn default() -> Self {
        Self {
            language_class_prefix: "language-".to_owned(),
        }
    }
}

/// Build the `code_block` node extension.
pub fn code_block() -> NodeExtension {
    NodeExtension::new("code_block")
        .default_options(Options::from_serialize(&CodeBlockOptions::default()))
        .attributes(|_| {
            let mut specs = AttributeSpecs::new();
            specs.insert("language".into(), AttributeSpec::default().rendered(false));
            specs
        })
        .schema(|ctx| {
            let opts: CodeBlockOptions = ctx.options.deserialize().unwrap_or_default();
            let parse_prefix = opts.language_class_prefix.clone();
            let render_prefix = opts.language_class_prefix;
            NodeSpec::new()
                .content("text*")
                .marks("")
                .group("block")
                .code(true)
                .defining(true)
                .draggable(false)
                .parse_rule(
                    ParseRule::tag("pre")
                        .preserve_whitespace()
                        .get_attrs(&["language"], move |el| {
                            let mut attrs = Attrs::new();
                            attrs.insert("language".into(), language_of(el, &parse_prefix));
                            Some(attrs)
                        }),
                )
                .render(move |ctx| {
                    let mut code_attrs = Vec::new();
                    if let Some(language) = ctx.attrs.get("language").and_then(Value::as_str) {
                        code_attrs.push(("class".to_owned(), format!("{render_prefix}{language}")));
                    }
                    DomTemplate::element(
                        "pre",
                        Vec::new(),
                        vec![DomTemplate::element(
                            "code",
                            code_attrs,
                            vec![DomTemplate::Hole],
                        )],
                    )
                })
        })
        .commands(|ctx| {
            let type_name = ctx.name.to_owned();
            let factory: CommandFactory = Box::new(move |args| {
                let args = args.clone();
                let type_name = type_name.clone();
                Box::new(move |scope: &mut CommandScope| {
                    scope.run(
                        "toggleBlockType",
                        json!({ "type": type_name, "toggle_to": "paragraph", "attrs": args }),
                    )
                })
            });
            vec![("codeBlock".to_owned(), factory)]
        })
        .input_rules(|ctx| {
            let node = ctx.name.to_owned();
            vec![InputRule::textblock(FENCE_RE.clone(), node, |_| {
                Some(Attrs::new())
            })]
        })
        .keys(|_| {
            let handler: vellum_core::KeyHandler =
                Box::new(|editor| editor.command("codeBlock", json!({})).unwrap_or(false));
            vec![("Shift-Control-\\".to_owned(), handler)]
        })
}

/// Language carried by the `class` of the first `code` child, or null.
fn language_of(el: &DomElement, prefix: &str) -> Value {
    let Some(code) = el.find_child_element("code") else {
        return Value::Null;
    };
    let Some(class) = code.get_attribute("class") else {
        return Value::Null;
    };
    class
        .split_whitespace()
        .find_map(|token| token.strip_prefix(prefix))
        .map(|language| json!(language))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_carry_the_standard_prefix() {
        let bag = Options::from_serialize(&CodeBlockOptions::default());
        assert_eq!(bag.str("language_class_prefix"), Some("language-"));
    }

    #[test]
    fn fence_pattern_requires_the_whole_prefix() {
        assert!(FENCE_RE.is_match("```"));
        assert!(!FENCE_RE.is_match("`` "));
        assert!(!FENCE_RE.is_match("see ```"));
    }
}
