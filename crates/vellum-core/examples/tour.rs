//! A short tour of the composition pipeline: two ad-hoc extensions are
//! registered next to the base set, then typing, commands, and key dispatch
//! drive the same document.
//!
//! Run:  cargo run --example tour -p vellum-core

use regex::Regex;
use serde_json::{json, Value};

use vellum_core::{
    base, AttributeSpec, AttributeSpecs, Attrs, DomTemplate, Editor, InputRule, MarkExtension,
    MarkSpec, NodeExtension, NodeSpec, ParseRule, Selection,
};

// ── demo extensions ────────────────────────────────────────────────────────

fn heading() -> NodeExtension {
    NodeExtension::new("heading")
        .attributes(|_| {
            let mut specs = AttributeSpecs::new();
            specs.insert("level".into(), AttributeSpec::new(json!(1)).rendered(false));
            specs
        })
        .schema(|_| {
            let mut spec = NodeSpec::new().content("inline*").group("block").defining(true);
            for (tag, level) in [("h1", 1), ("h2", 2)] {
                spec = spec.parse_rule(ParseRule::tag(tag).get_attrs(&["level"], move |_| {
                    let mut attrs = Attrs::new();
                    attrs.insert("level".into(), json!(level));
                    Some(attrs)
                }));
            }
            spec.render(|ctx| {
                let level = ctx.attrs.get("level").and_then(Value::as_u64).unwrap_or(1);
                DomTemplate::node(format!("h{level}"), vec![DomTemplate::Hole])
            })
        })
        .input_rules(|ctx| {
            let node = ctx.name.to_owned();
            vec![InputRule::textblock(
                Regex::new(r"^(#{1,2}) $").expect("pattern"),
                node,
                |c| {
                    let level = c.get(1)?.as_str().len();
                    let mut attrs = Attrs::new();
                    attrs.insert("level".into(), json!(level));
                    Some(attrs)
                },
            )]
        })
}

fn em() -> MarkExtension {
    MarkExtension::new("em")
        .schema(|_| {
            MarkSpec::new()
                .parse_rule(ParseRule::tag("em"))
                .render(|_| DomTemplate::node("em", vec![DomTemplate::Hole]))
        })
        .input_rules(|ctx| {
            let mark = ctx.name.to_owned();
            vec![InputRule::mark(
                Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*$").expect("pattern"),
                mark,
                |_| Some(Attrs::new()),
            )]
        })
        .keys(|ctx| {
            let mark = ctx.name.to_owned();
            let handler: vellum_core::KeyHandler = Box::new(move |editor| {
                editor
                    .command("toggleMark", json!({ "mark": mark }))
                    .unwrap_or(false)
            });
            vec![("Mod-i".to_owned(), handler)]
        })
}

fn row(label: &str, editor: &Editor) {
    println!("  {label:<26}  {}", editor.to_html());
}

// ── main ───────────────────────────────────────────────────────────────────

fn main() {
    let mut editor = Editor::builder()
        .add_extension(base::document())
        .add_extension(base::paragraph())
        .add_extension(base::text())
        .add_extension(heading())
        .add_extension(em())
        .build()
        .expect("editor config");

    println!("\n  vellum {}  composition tour\n", vellum_core::version());
    row("empty document", &editor);

    editor.insert_text("## ");
    row("typing \"## \"", &editor);
    editor.insert_text("Composition");
    row("typing the title", &editor);

    editor.set_content("<p></p>").expect("content");
    editor.insert_text("plain and *starred*");
    row("star input rule", &editor);

    editor.set_selection(Selection::range(0, 0, 5));
    editor
        .command("toggleMark", json!({ "mark": "em" }))
        .expect("known command");
    row("toggleMark over \"plain\"", &editor);

    editor.dispatch_key("Mod-i");
    row("Mod-i toggles it back", &editor);
    println!();
}
