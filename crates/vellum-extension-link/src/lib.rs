//! Hyperlink mark extension: an `a[href]` mark with href/target attributes,
//! a URL paste rule, a `link` command, and a click plugin that surfaces
//! navigation as an [`Effect`] for the embedder.
//!
//! Serialization always forces the configured `rel` and falls back to the
//! configured `target` when the mark carries none.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use vellum_core::{
    Attrs, AttributeSpec, AttributeSpecs, CommandFactory, CommandScope, DomTemplate, Effect,
    MarkExtension, MarkSpec, Options, ParseRule, PasteRule, Plugin,
};

/// URLs recognized by the paste rule.
pub static PASTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z]{2,}\b[-a-zA-Z0-9@:%_+.~#?&/=]*",
    )
    .expect("valid url regex")
});

/// Typed mirror of the extension's option bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    /// When `false`, clicks inside a link are left to other plugins.
    pub open_on_click: bool,
    /// `target` emitted when the mark itself carries none.
    pub target: String,
    /// `rel` forced onto every serialized link.
    pub rel: String,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            open_on_click: true,
            target: "_blank".to_owned(),
            rel: "noopener noreferrer nofollow".to_owned(),
        }
    }
}

/// Build the `link` mark extension.
pub fn link() -> MarkExtension {
    MarkExtension::new("link")
        .default_options(Options::from_serialize(&LinkOptions::default()))
        .attributes(|_| {
            let mut specs = AttributeSpecs::new();
            specs.insert("href".into(), AttributeSpec::default().rendered(false));
            specs.insert("target".into(), AttributeSpec::default().rendered(false));
            specs
        })
        .schema(|ctx| {
            let opts: LinkOptions = ctx.options.deserialize().unwrap_or_default();
            let LinkOptions { target, rel, .. } = opts;
            MarkSpec::new()
                .inclusive(false)
                .parse_rule(ParseRule::tag("a[href]").get_attrs(&["href", "target"], |el| {
                    let mut attrs = Attrs::new();
                    attrs.insert(
                        "href".into(),
                        el.get_attribute("href").map_or(Value::Null, |h| json!(h)),
                    );
                    attrs.insert(
                        "target".into(),
                        el.get_attribute("target").map_or(Value::Null, |t| json!(t)),
                    );
                    Some(attrs)
                }))
                .render(move |ctx| {
                    let mut explicit = Vec::new();
                    if let Some(href) = ctx.attrs.get("href").and_then(Value::as_str) {
                        explicit.push(("href".to_owned(), href.to_owned()));
                    }
                    let t = ctx
                        .attrs
                        .get("target")
                        .and_then(Value::as_str)
                        .unwrap_or(&target);
                    explicit.push(("target".to_owned(), t.to_owned()));
                    explicit.push(("rel".to_owned(), rel.clone()));
                    DomTemplate::element("a", ctx.merged_with(explicit), vec![DomTemplate::Hole])
                })
        })
        .commands(|ctx| {
            let mark_name = ctx.name.to_owned();
            let factory: CommandFactory = Box::new(move |args| {
                let args = args.clone();
                let mark_name = mark_name.clone();
                Box::new(move |scope: &mut CommandScope| {
                    let href = args.get("href").and_then(Value::as_str).unwrap_or_default();
                    if href.is_empty() {
                        scope.run("removeMark", json!({ "mark": mark_name }))
                    } else {
                        scope.run("updateMark", json!({ "mark": mark_name, "attrs": args }))
                    }
                })
            });
            vec![("link".to_owned(), factory)]
        })
        .paste_rules(|ctx| {
            let mark = ctx.name.to_owned();
            vec![PasteRule::mark(PASTE_RE.clone(), mark, |c| {
                let url = c.get(0)?.as_str();
                let mut attrs = Attrs::new();
                attrs.insert("href".into(), json!(url));
                Some(attrs)
            })]
        })
        .plugins(|ctx| {
            let opts: LinkOptions = ctx.options.deserialize().unwrap_or_default();
            if !opts.open_on_click {
                return Vec::new();
            }
            let mark_name = ctx.name.to_owned();
            vec![Plugin::new("handleClick").on_click(move |editor, _event| {
                let Some(attrs) = editor.mark_attrs(&mark_name) else {
                    return false;
                };
                let Some(href) = attrs.get("href").and_then(Value::as_str) else {
                    return false;
                };
                if href.is_empty() {
                    return false;
                }
                let target = attrs
                    .get("target")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                editor.push_effect(Effect::OpenUrl {
                    href: href.to_owned(),
                    target,
                });
                true
            })]
        })
}
