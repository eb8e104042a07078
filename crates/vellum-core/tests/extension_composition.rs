//! Composition behavior across whole extension sets: registration order,
//! collision policies, option resolution, atomic command sequences.

use regex::Regex;
use serde_json::json;

use vellum_core::{
    base, Attrs, BoxedCommand, CommandFactory, CommandScope, ConfigError, DomTemplate, Editor,
    EditorBuilder, ExtensionKind, InputRule, MarkExtension, MarkSpec, NodeExtension, NodeSpec,
    Options, ShadowedBinding,
};

fn base_builder() -> EditorBuilder {
    Editor::builder()
        .add_extension(base::document())
        .add_extension(base::paragraph())
        .add_extension(base::text())
}

fn simple_mark(name: &str, tag: &'static str) -> MarkExtension {
    MarkExtension::new(name)
        .schema(move |_| MarkSpec::new().render(move |_| DomTemplate::node(tag, vec![DomTemplate::Hole])))
}

fn simple_textblock(name: &str, tag: &'static str) -> NodeExtension {
    NodeExtension::new(name).schema(move |_| {
        NodeSpec::new()
            .content("inline*")
            .group("block")
            .render(move |_| DomTemplate::node(tag, vec![DomTemplate::Hole]))
    })
}

fn insert_command(text: &'static str) -> CommandFactory {
    Box::new(move |_args| {
        Box::new(move |scope: &mut CommandScope| {
            scope.run("insertText", json!({ "text": text }))
        }) as BoxedCommand
    })
}

#[test]
fn distinct_extensions_compose_into_one_schema() {
    let editor = base_builder()
        .add_extension(simple_textblock("heading", "h1"))
        .add_extension(simple_mark("em", "em"))
        .add_extension(simple_mark("strong", "strong"))
        .build()
        .expect("editor");

    let names: Vec<&str> = editor.schema().node_names().collect();
    assert_eq!(names, ["doc", "paragraph", "text", "heading"]);
    let marks: Vec<&str> = editor.schema().mark_names().collect();
    assert_eq!(marks, ["em", "strong"]);
}

#[test]
fn duplicate_names_name_both_kinds_in_registration_order() {
    let err = base_builder()
        .add_extension(simple_textblock("note", "aside"))
        .add_extension(simple_mark("note", "span"))
        .build()
        .err()
        .expect("duplicate must fail");
    match err {
        ConfigError::DuplicateName { name, first, second } => {
            assert_eq!(name, "note");
            assert_eq!(first, ExtensionKind::Node);
            assert_eq!(second, ExtensionKind::Mark);
        }
        other => panic!("expected DuplicateName, got {other:?}"),
    }
}

#[test]
fn later_command_registration_wins() {
    let alpha = simple_mark("alpha", "em")
        .commands(|_| vec![("stamp".into(), insert_command("*"))]);
    let beta = simple_mark("beta", "strong")
        .commands(|_| vec![("stamp".into(), insert_command("+"))]);

    let mut editor = base_builder()
        .add_extension(alpha)
        .add_extension(beta)
        .build()
        .expect("editor");

    assert!(editor.command("stamp", json!({})).expect("stamp"));
    assert_eq!(editor.to_html(), "<p>+</p>");
}

#[test]
fn extensions_can_replace_base_commands() {
    let loud = simple_mark("loud", "em").commands(|_| {
        let factory: CommandFactory = Box::new(|args| {
            let text = args
                .get("text")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_uppercase();
            Box::new(move |scope: &mut CommandScope| {
                if text.is_empty() {
                    return false;
                }
                let sel = scope.selection();
                let at = sel.from();
                scope.tr().insert_text(sel.block, at, &text, &[])
            }) as BoxedCommand
        });
        vec![("insertText".into(), factory)]
    });

    let mut editor = base_builder().add_extension(loud).build().expect("editor");
    assert!(editor.command("insertText", json!({"text": "hi"})).expect("cmd"));
    assert_eq!(editor.to_html(), "<p>HI</p>");
}

#[test]
fn commands_resolve_through_the_registry_at_call_time() {
    // `caller` was registered before `beta` overwrote `stamp`; it still
    // reaches the final registration because names resolve per invocation.
    let caller = simple_mark("caller", "u").commands(|_| {
        let factory: CommandFactory = Box::new(|_| {
            Box::new(|scope: &mut CommandScope| scope.run("stamp", json!({}))) as BoxedCommand
        });
        vec![("callStamp".into(), factory)]
    });
    let alpha = simple_mark("alpha", "em")
        .commands(|_| vec![("stamp".into(), insert_command("*"))]);
    let beta = simple_mark("beta", "strong")
        .commands(|_| vec![("stamp".into(), insert_command("+"))]);

    let mut editor = base_builder()
        .add_extension(caller)
        .add_extension(alpha)
        .add_extension(beta)
        .build()
        .expect("editor");

    assert!(editor.command("callStamp", json!({})).expect("callStamp"));
    assert_eq!(editor.to_html(), "<p>+</p>");
}

#[test]
fn key_shadowing_is_last_wins_and_recorded() {
    let alpha = simple_mark("alpha", "em").keys(|_| {
        let handler: vellum_core::KeyHandler = Box::new(|editor| editor.insert_text("A"));
        vec![("Mod-k".into(), handler)]
    });
    let beta = simple_mark("beta", "strong").keys(|_| {
        let handler: vellum_core::KeyHandler = Box::new(|editor| editor.insert_text("B"));
        vec![("Control-K".into(), handler)]
    });

    let mut editor = base_builder()
        .add_extension(alpha)
        .add_extension(beta)
        .build()
        .expect("editor");

    assert_eq!(editor.keymap().len(), 1);
    assert_eq!(
        editor.keymap().shadowed(),
        [ShadowedBinding {
            chord: "Ctrl-k".into(),
            shadowed: "alpha".into(),
            replaced_by: "beta".into(),
        }]
    );
    assert!(editor.dispatch_key("Ctrl-k"));
    assert_eq!(editor.to_html(), "<p>B</p>");
}

fn conversion_rule(target: &'static str) -> Vec<InputRule> {
    vec![InputRule::textblock(
        Regex::new(r"^> $").expect("pattern"),
        target,
        |_| Some(Attrs::new()),
    )]
}

#[test]
fn input_rules_run_in_extension_registration_order() {
    let quote = simple_textblock("quote", "blockquote").input_rules(|_| conversion_rule("quote"));
    let aside = simple_textblock("aside", "aside").input_rules(|_| conversion_rule("aside"));

    let mut first_wins = base_builder()
        .add_extension(quote)
        .add_extension(aside)
        .build()
        .expect("editor");
    assert!(first_wins.insert_text("> "));
    assert_eq!(first_wins.doc().content[0].type_name, "quote");

    let quote = simple_textblock("quote", "blockquote").input_rules(|_| conversion_rule("quote"));
    let aside = simple_textblock("aside", "aside").input_rules(|_| conversion_rule("aside"));
    let mut swapped = base_builder()
        .add_extension(aside)
        .add_extension(quote)
        .build()
        .expect("editor");
    assert!(swapped.insert_text("> "));
    assert_eq!(swapped.doc().content[0].type_name, "aside");
}

#[test]
fn configure_merges_shallow_and_replaces_nested_values_wholesale() {
    let deco = simple_mark("deco", "em")
        .default_options(Options::from_value(json!({
            "wrap": { "left": "<", "right": ">" },
            "on": true,
        })))
        .commands(|ctx| {
            let left = ctx
                .options
                .get("wrap")
                .and_then(|w| w.get("left"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("?")
                .to_owned();
            let right = ctx
                .options
                .get("wrap")
                .and_then(|w| w.get("right"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("?")
                .to_owned();
            let on = ctx.options.bool_or("on", false);
            let factory: CommandFactory = Box::new(move |_| {
                let text = format!("{left}{right}{on}");
                Box::new(move |scope: &mut CommandScope| {
                    scope.run("insertText", json!({ "text": text }))
                }) as BoxedCommand
            });
            vec![("wrap".into(), factory)]
        });
    let deco = deco.configure(Options::from_value(json!({
        "wrap": { "left": "[" },
    })));

    let mut editor = base_builder().add_extension(deco).build().expect("editor");
    assert!(editor.command("wrap", json!({})).expect("wrap"));
    // `wrap` was replaced as a whole value, so `right` is gone; the
    // untouched top-level `on` survives.
    assert_eq!(editor.to_html(), "<p>[?true</p>");
}

#[test]
fn chains_spanning_extensions_are_atomic() {
    let alpha = simple_mark("alpha", "em")
        .commands(|_| vec![("stampA".into(), insert_command("a"))]);
    let beta = simple_mark("beta", "strong").commands(|_| {
        let factory: CommandFactory = Box::new(|_| {
            Box::new(|_: &mut CommandScope| false) as BoxedCommand
        });
        vec![
            ("stampB".into(), insert_command("b")),
            ("refuse".into(), factory),
        ]
    });

    let mut editor = base_builder()
        .add_extension(alpha)
        .add_extension(beta)
        .build()
        .expect("editor");

    let applied = editor
        .chain()
        .run("stampA", json!({}))
        .run("stampB", json!({}))
        .apply()
        .expect("chain");
    assert!(applied);
    assert_eq!(editor.to_html(), "<p>ab</p>");

    let applied = editor
        .chain()
        .run("stampA", json!({}))
        .run("refuse", json!({}))
        .run("stampB", json!({}))
        .apply()
        .expect("chain");
    assert!(!applied);
    assert_eq!(editor.to_html(), "<p>ab</p>");
}
