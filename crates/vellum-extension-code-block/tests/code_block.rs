//! DOM round trip, fence input rule, toggle command, and shortcut behavior
//! of the code block extension inside a full editor.

use proptest::prelude::*;
use serde_json::{json, Value};

use vellum_core::{
    base, DomTemplate, Editor, MarkExtension, MarkSpec, Options, ParseRule, Selection,
};
use vellum_extension_code_block::code_block;

fn editor() -> Editor {
    Editor::builder()
        .add_extension(base::document())
        .add_extension(base::paragraph())
        .add_extension(base::text())
        .add_extension(code_block())
        .build()
        .expect("editor")
}

fn em() -> MarkExtension {
    MarkExtension::new("em").schema(|_| {
        MarkSpec::new()
            .parse_rule(ParseRule::tag("em"))
            .render(|_| DomTemplate::node("em", vec![DomTemplate::Hole]))
    })
}

#[test]
fn pre_code_round_trips_verbatim_whitespace() {
    let mut editor = editor();
    let html = "<pre><code>fn main() {\n    let x = 1;\n\n    x\n}\n</code></pre>";
    editor.set_content(html).expect("content");
    assert_eq!(
        editor.doc().content[0].block_text(),
        "fn main() {\n    let x = 1;\n\n    x\n}\n"
    );
    assert_eq!(editor.to_html(), html);
}

#[test]
fn language_round_trips_through_the_code_class() {
    let mut editor = editor();
    let html = "<pre><code class=\"language-rust\">let x = 1;</code></pre>";
    editor.set_content(html).expect("content");
    assert_eq!(
        editor.doc().content[0].attrs.get("language"),
        Some(&json!("rust"))
    );
    assert_eq!(editor.to_html(), html);
}

#[test]
fn missing_language_class_parses_to_null_and_renders_bare() {
    let mut editor = editor();
    editor
        .set_content("<pre><code>plain</code></pre>")
        .expect("content");
    assert_eq!(
        editor.doc().content[0].attrs.get("language"),
        Some(&Value::Null)
    );
    assert_eq!(editor.to_html(), "<pre><code>plain</code></pre>");
}

#[test]
fn language_class_prefix_is_an_option() {
    let mut editor = Editor::builder()
        .add_extension(base::document())
        .add_extension(base::paragraph())
        .add_extension(base::text())
        .add_extension(
            code_block().configure(Options::from_value(json!({
                "language_class_prefix": "lang-",
            }))),
        )
        .build()
        .expect("editor");
    let html = "<pre><code class=\"lang-go\">x := 1</code></pre>";
    editor.set_content(html).expect("content");
    assert_eq!(
        editor.doc().content[0].attrs.get("language"),
        Some(&json!("go"))
    );
    assert_eq!(editor.to_html(), html);
}

#[test]
fn fence_converts_an_empty_paragraph_at_block_start_only() {
    let mut editor = editor();
    assert!(editor.insert_text("```"));
    assert_eq!(editor.doc().content[0].type_name, "code_block");
    assert_eq!(editor.to_html(), "<pre><code></code></pre>");

    let mut editor = editor_with_text("see ");
    assert!(editor.insert_text("```"));
    assert_eq!(editor.doc().content[0].type_name, "paragraph");
    assert_eq!(editor.to_html(), "<p>see ```</p>");
}

fn editor_with_text(text: &str) -> Editor {
    let mut editor = editor();
    assert!(editor.insert_text(text));
    editor
}

#[test]
fn code_block_command_toggles_against_paragraph() {
    let mut editor = editor_with_text("let x = 1;");
    assert!(editor.command("codeBlock", json!({})).expect("command"));
    assert_eq!(editor.doc().content[0].type_name, "code_block");
    assert!(editor.command("codeBlock", json!({})).expect("command"));
    assert_eq!(editor.doc().content[0].type_name, "paragraph");
}

#[test]
fn code_block_command_accepts_a_language() {
    let mut editor = editor_with_text("let x = 1;");
    assert!(editor
        .command("codeBlock", json!({"language": "rust"}))
        .expect("command"));
    assert_eq!(
        editor.to_html(),
        "<pre><code class=\"language-rust\">let x = 1;</code></pre>"
    );
}

#[test]
fn shortcut_matches_either_chord_spelling() {
    let mut editor = editor_with_text("x");
    assert!(editor.dispatch_key("Ctrl-Shift-\\"));
    assert_eq!(editor.doc().content[0].type_name, "code_block");
    assert!(editor.dispatch_key("Shift-Control-\\"));
    assert_eq!(editor.doc().content[0].type_name, "paragraph");
}

#[test]
fn converting_to_code_block_strips_marks() {
    let mut editor = Editor::builder()
        .add_extension(base::document())
        .add_extension(base::paragraph())
        .add_extension(base::text())
        .add_extension(em())
        .add_extension(code_block())
        .content("<p>keep <em>this</em></p>")
        .build()
        .expect("editor");
    assert!(editor.command("codeBlock", json!({})).expect("command"));
    assert_eq!(editor.to_html(), "<pre><code>keep this</code></pre>");
}

#[test]
fn typing_inside_a_code_block_never_triggers_input_rules() {
    let mut editor = editor();
    assert!(editor.command("codeBlock", json!({})).expect("command"));
    assert!(editor.insert_text("```"));
    assert_eq!(editor.doc().content[0].type_name, "code_block");
    assert_eq!(editor.doc().content[0].block_text(), "```");
}

#[test]
fn dry_running_the_toggle_leaves_the_document_alone() {
    let editor = editor();
    assert!(editor.can_run("codeBlock", json!({})).expect("command"));
    assert_eq!(editor.to_html(), "<p></p>");
}

proptest! {
    // Whatever text a code block holds, serializing and re-parsing it keeps
    // every byte of whitespace.
    #[test]
    fn arbitrary_code_round_trips(code in "[ -~\t\n]{0,60}") {
        let mut editor = editor();
        let applied = editor.command("codeBlock", json!({})).expect("command");
        prop_assert!(applied);
        if !code.is_empty() {
            editor.set_selection(Selection::caret(0, 0));
            prop_assert!(editor.insert_text(&code));
        }
        let html = editor.to_html();
        editor.set_content(&html).expect("content");
        prop_assert_eq!(editor.doc().content[0].block_text(), code);
        prop_assert_eq!(editor.to_html(), html);
    }
}
