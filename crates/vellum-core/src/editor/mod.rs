//! The assembled editor: committed state plus every aggregate the
//! extensions contributed, with the event entry points embedders call.
//!
//! All mutation goes through one shape: open a [`Transaction`], run steps
//! against it, commit only on success. `insert_text` and `paste` run their
//! rule pumps inside the same transaction as the text change, so a rule
//! firing and the text it fired on land atomically.

mod builder;

pub use builder::EditorBuilder;

use std::mem;
use std::sync::Arc;

use serde_json::Value;

use crate::command::{CommandError, CommandRegistry, CommandScope};
use crate::dom::{to_html_fragment, DomParseError};
use crate::keymap::{canonicalize, Keymap};
use crate::model::{Attrs, Node};
use crate::plugin::{ClickEvent, Plugin};
use crate::rules::RuleSet;
use crate::schema::{parse_document, serialize_document, Schema};
use crate::state::{EditorState, Selection, Transaction};

// ── Effects ────────────────────────────────────────────────────────────────

/// A side effect a handler requested. The editor only queues these; the
/// embedder drains them with [`Editor::take_effects`] and performs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Navigate to `href`, optionally in a named browsing target.
    OpenUrl {
        href: String,
        target: Option<String>,
    },
}

// ── Editor ─────────────────────────────────────────────────────────────────

/// A configured editor instance. Build one with [`EditorBuilder`].
pub struct Editor {
    schema: Arc<Schema>,
    state: EditorState,
    commands: CommandRegistry,
    rules: RuleSet,
    keymap: Keymap,
    plugins: Vec<Arc<Plugin>>,
    effects: Vec<Effect>,
}

impl Editor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder::new()
    }

    pub(crate) fn from_parts(
        schema: Arc<Schema>,
        doc: Node,
        commands: CommandRegistry,
        rules: RuleSet,
        keymap: Keymap,
        plugins: Vec<Arc<Plugin>>,
    ) -> Self {
        Self {
            schema,
            state: EditorState::new(doc),
            commands,
            rules,
            keymap,
            plugins,
            effects: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn doc(&self) -> &Node {
        &self.state.doc
    }

    pub fn selection(&self) -> Selection {
        self.state.selection
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    fn transaction(&self) -> Transaction {
        Transaction::new(&self.state, Arc::clone(&self.schema))
    }

    fn commit(&mut self, tr: Transaction) {
        let (doc, selection, _steps) = tr.into_parts();
        self.state.doc = doc;
        self.state.selection = selection;
    }

    // ── Commands ───────────────────────────────────────────────────────────

    /// Run a registered command. `Ok(true)` means it applied and the state
    /// advanced; `Ok(false)` means it declined and nothing changed.
    pub fn command(&mut self, name: &str, args: Value) -> Result<bool, CommandError> {
        let definition = self
            .commands
            .get(name)
            .cloned()
            .ok_or_else(|| CommandError::Unknown(name.to_owned()))?;
        let mut tr = self.transaction();
        let applied = {
            let mut scope = CommandScope::new(&mut tr, &self.commands);
            definition.build(&args)(&mut scope)
        };
        if applied {
            self.commit(tr);
        }
        Ok(applied)
    }

    /// Dry-run a command: same evaluation, the transaction is always
    /// discarded.
    pub fn can_run(&self, name: &str, args: Value) -> Result<bool, CommandError> {
        let definition = self
            .commands
            .get(name)
            .cloned()
            .ok_or_else(|| CommandError::Unknown(name.to_owned()))?;
        let mut tr = self.transaction();
        let mut scope = CommandScope::new(&mut tr, &self.commands);
        Ok(definition.build(&args)(&mut scope))
    }

    /// Start an all-or-nothing command sequence over one transaction.
    pub fn chain(&mut self) -> Chain<'_> {
        Chain {
            editor: self,
            queue: Vec::new(),
        }
    }

    // ── Text entry ─────────────────────────────────────────────────────────

    /// Insert typed text at the selection, replacing a range selection.
    /// Inherited typing marks apply, then input rules get one shot at the
    /// result. Returns whether anything was inserted.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let Some((mut tr, _)) = self.insert_at_selection(text) else {
            return false;
        };
        self.rules.apply_input(&mut tr);
        self.commit(tr);
        true
    }

    /// Insert pasted text at the selection, then scan exactly the inserted
    /// span with the paste rules.
    pub fn paste(&mut self, text: &str) -> bool {
        let Some((mut tr, at)) = self.insert_at_selection(text) else {
            return false;
        };
        let block = tr.selection().block;
        self.rules.apply_paste(&mut tr, block, at, at + text.len());
        self.commit(tr);
        true
    }

    fn insert_at_selection(&self, text: &str) -> Option<(Transaction, usize)> {
        if text.is_empty() {
            return None;
        }
        let mut tr = self.transaction();
        let sel = tr.selection();
        if !sel.is_caret() {
            tr.delete_range(sel.block, sel.from(), sel.to());
        }
        let at = tr.selection().from();
        let marks = tr.typing_marks(sel.block, at);
        if !tr.insert_text(sel.block, at, text, &marks) {
            return None;
        }
        Some((tr, at))
    }

    // ── Event dispatch ─────────────────────────────────────────────────────

    /// Dispatch a keypress. The chord is canonicalized first, so any alias
    /// spelling reaches the binding registered under the canonical form.
    /// Returns whether a binding handled it.
    pub fn dispatch_key(&mut self, chord: &str) -> bool {
        let canonical = match canonicalize(chord) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("dropping keypress: {e}");
                return false;
            }
        };
        let Some(binding) = self.keymap.get(&canonical).cloned() else {
            return false;
        };
        binding.handle(self)
    }

    /// Dispatch a pointer click at a document position. The selection moves
    /// to the click point first, then plugins see the event in registration
    /// order until one claims it.
    pub fn dispatch_click(&mut self, block: usize, pos: usize) -> bool {
        let mut tr = self.transaction();
        tr.set_selection(Selection::caret(block, pos));
        self.commit(tr);
        let sel = self.state.selection;
        let event = ClickEvent {
            block: sel.block,
            pos: sel.head,
        };
        let plugins = self.plugins.clone();
        for plugin in plugins {
            if plugin.handle_click(self, &event) {
                return true;
            }
        }
        false
    }

    // ── Queries ────────────────────────────────────────────────────────────

    /// Attributes of the named mark at the selection start, if present.
    pub fn mark_attrs(&self, name: &str) -> Option<Attrs> {
        let sel = self.state.selection;
        let block = self.state.block(sel.block)?;
        block
            .marks_at(sel.from())
            .into_iter()
            .find(|m| m.type_name == name)
            .map(|m| m.attrs)
    }

    // ── Content ────────────────────────────────────────────────────────────

    /// Serialize the document to an HTML fragment.
    pub fn to_html(&self) -> String {
        to_html_fragment(&serialize_document(&self.state.doc, &self.schema))
    }

    /// Replace the document from an HTML fragment. The selection resets to
    /// the document start.
    pub fn set_content(&mut self, html: &str) -> Result<(), DomParseError> {
        let doc = parse_document(html, &self.schema)?;
        let doc = with_fallback_block(doc, &self.schema);
        self.state = EditorState::new(doc);
        Ok(())
    }

    /// Move the selection; offsets clamp to the target block.
    pub fn set_selection(&mut self, selection: Selection) {
        let mut tr = self.transaction();
        tr.set_selection(selection);
        self.commit(tr);
    }

    // ── Effect outbox ──────────────────────────────────────────────────────

    pub fn push_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Drain queued effects. The embedder is expected to call this after
    /// each dispatched event.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        mem::take(&mut self.effects)
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }
}

/// Documents never render without at least one block; an empty parse result
/// gets the schema's paragraph if it has one.
pub(crate) fn with_fallback_block(mut doc: Node, schema: &Schema) -> Node {
    if doc.content.is_empty() {
        if let Some(paragraph) = schema.node("paragraph") {
            doc.content.push(Node::element(
                paragraph.name().to_owned(),
                paragraph.default_attrs(),
                Vec::new(),
            ));
        }
    }
    doc
}

// ── Chain ──────────────────────────────────────────────────────────────────

/// A queued command sequence sharing one transaction. Either every command
/// applies and the editor commits once, or nothing changes.
#[must_use = "a chain does nothing until `apply` is called"]
pub struct Chain<'a> {
    editor: &'a mut Editor,
    queue: Vec<(String, Value)>,
}

impl Chain<'_> {
    pub fn run(mut self, name: impl Into<String>, args: Value) -> Self {
        self.queue.push((name.into(), args));
        self
    }

    /// Resolve every queued name, then run them in order over a shared
    /// transaction. An unknown name errors before anything runs; a command
    /// returning `false` aborts with `Ok(false)` and no commit.
    pub fn apply(self) -> Result<bool, CommandError> {
        let mut resolved = Vec::with_capacity(self.queue.len());
        for (name, args) in &self.queue {
            let definition = self
                .editor
                .commands
                .get(name)
                .cloned()
                .ok_or_else(|| CommandError::Unknown(name.clone()))?;
            resolved.push((definition, args));
        }
        let mut tr = self.editor.transaction();
        for (definition, args) in resolved {
            let applied = {
                let mut scope = CommandScope::new(&mut tr, &self.editor.commands);
                definition.build(args)(&mut scope)
            };
            if !applied {
                return Ok(false);
            }
        }
        self.editor.commit(tr);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use serde_json::json;

    use crate::base::{document, paragraph, text};
    use crate::dom::DomTemplate;
    use crate::extension::{MarkExtension, NodeExtension};
    use crate::rules::{InputRule, PasteRule};
    use crate::schema::MarkSpec;

    fn em() -> MarkExtension {
        MarkExtension::new("em")
            .schema(|_| MarkSpec::new().render(|_| DomTemplate::node("em", vec![DomTemplate::Hole])))
    }

    fn editor_with(extra: Vec<crate::extension::Extension>) -> Editor {
        let mut b = Editor::builder()
            .add_extension(document())
            .add_extension(paragraph())
            .add_extension(text());
        for ext in extra {
            b = b.add_extension(ext);
        }
        b.build().expect("editor")
    }

    fn plain_editor(content: &str) -> Editor {
        Editor::builder()
            .add_extension(document())
            .add_extension(paragraph())
            .add_extension(text())
            .content(content)
            .build()
            .expect("editor")
    }

    #[test]
    fn command_commits_only_when_it_applies() {
        let mut editor = plain_editor("<p>hi</p>");
        editor.set_selection(Selection::caret(0, 2));
        let applied = editor
            .command("insertText", json!({"text": "!"}))
            .expect("known command");
        assert!(applied);
        assert_eq!(editor.to_html(), "<p>hi!</p>");

        // Empty text declines; the document stays put.
        let applied = editor
            .command("insertText", json!({"text": ""}))
            .expect("known command");
        assert!(!applied);
        assert_eq!(editor.to_html(), "<p>hi!</p>");
    }

    #[test]
    fn unknown_command_is_an_error() {
        let mut editor = plain_editor("<p></p>");
        assert_eq!(
            editor.command("nope", json!({})),
            Err(CommandError::Unknown("nope".into()))
        );
    }

    #[test]
    fn can_run_reports_without_mutating() {
        let editor = plain_editor("<p>hi</p>");
        let before = editor.to_html();
        assert!(editor
            .can_run("insertText", json!({"text": "x"}))
            .expect("known command"));
        assert_eq!(editor.to_html(), before);
        assert_eq!(editor.selection(), Selection::caret(0, 0));
    }

    #[test]
    fn chain_commits_once_when_every_command_applies() {
        let mut editor = plain_editor("<p></p>");
        let applied = editor
            .chain()
            .run("insertText", json!({"text": "ab"}))
            .run("insertText", json!({"text": "cd"}))
            .apply()
            .expect("known commands");
        assert!(applied);
        assert_eq!(editor.to_html(), "<p>abcd</p>");
    }

    #[test]
    fn chain_discards_everything_when_one_command_declines() {
        let mut editor = plain_editor("<p></p>");
        let applied = editor
            .chain()
            .run("insertText", json!({"text": "ab"}))
            .run("insertText", json!({"text": ""}))
            .apply()
            .expect("known commands");
        assert!(!applied);
        assert_eq!(editor.to_html(), "<p></p>");
    }

    #[test]
    fn chain_rejects_unknown_names_before_running_anything() {
        let mut editor = plain_editor("<p></p>");
        let result = editor
            .chain()
            .run("insertText", json!({"text": "ab"}))
            .run("missing", json!({}))
            .apply();
        assert_eq!(result, Err(CommandError::Unknown("missing".into())));
        assert_eq!(editor.to_html(), "<p></p>");
    }

    #[test]
    fn insert_text_replaces_a_range_selection() {
        let mut editor = plain_editor("<p>hello world</p>");
        editor.set_selection(Selection::range(0, 6, 11));
        assert!(editor.insert_text("there"));
        assert_eq!(editor.to_html(), "<p>hello there</p>");
        assert_eq!(editor.selection(), Selection::caret(0, 11));
    }

    #[test]
    fn insert_text_runs_input_rules_in_the_same_commit() {
        let ext = em().input_rules(|ctx| {
            let mark = ctx.name.to_owned();
            vec![InputRule::mark(
                Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*$").expect("pattern"),
                mark,
                |_| Some(Attrs::new()),
            )]
        });
        let mut editor = editor_with(vec![ext.into()]);
        assert!(editor.insert_text("say *hi*"));
        assert_eq!(editor.to_html(), "<p>say <em>hi</em></p>");
        // Both delimiters are gone from the committed text.
        assert_eq!(editor.selection(), Selection::caret(0, 6));
    }

    #[test]
    fn paste_scans_only_the_inserted_span() {
        let ext = em().paste_rules(|ctx| {
            let mark = ctx.name.to_owned();
            vec![PasteRule::mark(
                Regex::new(r"\bmark\b").expect("pattern"),
                mark,
                |_| Some(Attrs::new()),
            )]
        });
        let mut editor = editor_with(vec![ext.into()]);
        assert!(editor.insert_text("mark "));
        // The pre-existing occurrence is outside the pasted span.
        editor.set_selection(Selection::caret(0, 5));
        assert!(editor.paste("mark"));
        assert_eq!(editor.to_html(), "<p>mark <em>mark</em></p>");
    }

    #[test]
    fn dispatch_key_matches_any_alias_spelling() {
        let ext = em().keys(|_| {
            let handler: crate::keymap::KeyHandler =
                Box::new(|editor| editor.insert_text("!"));
            vec![("Shift-Control-1".into(), handler)]
        });
        let mut editor = editor_with(vec![ext.into()]);
        assert!(editor.dispatch_key("Ctrl-Shift-1"));
        assert_eq!(editor.to_html(), "<p>!</p>");
        assert!(!editor.dispatch_key("Ctrl-Shift-2"));
        assert!(!editor.dispatch_key("Ctrl-"));
    }

    #[test]
    fn dispatch_click_moves_the_selection_then_asks_plugins() {
        let ext = em().plugins(|_| {
            vec![Plugin::new("probe").on_click(|editor, event| {
                editor.push_effect(Effect::OpenUrl {
                    href: format!("probe:{}:{}", event.block, event.pos),
                    target: None,
                });
                true
            })]
        });
        let mut editor = editor_with(vec![ext.into()]);
        editor.set_content("<p>hello</p>").expect("content");
        assert!(editor.dispatch_click(0, 3));
        assert_eq!(editor.selection(), Selection::caret(0, 3));
        assert_eq!(
            editor.take_effects(),
            vec![Effect::OpenUrl {
                href: "probe:0:3".into(),
                target: None,
            }]
        );
        assert!(editor.effects().is_empty());
    }

    #[test]
    fn dispatch_click_clamps_to_the_block() {
        let mut editor = plain_editor("<p>hi</p>");
        // No plugins claim it, but the selection still moves (and clamps).
        assert!(!editor.dispatch_click(0, 99));
        assert_eq!(editor.selection(), Selection::caret(0, 2));
    }

    #[test]
    fn mark_attrs_reads_the_mark_under_the_caret() {
        let ext = em();
        let mut editor = editor_with(vec![ext.into()]);
        assert!(editor.insert_text("hi"));
        editor.set_selection(Selection::range(0, 0, 2));
        assert!(editor
            .command("toggleMark", json!({"mark": "em"}))
            .expect("known command"));
        editor.set_selection(Selection::caret(0, 1));
        assert_eq!(editor.mark_attrs("em"), Some(Attrs::new()));
        assert_eq!(editor.mark_attrs("strong"), None);
    }

    #[test]
    fn set_content_replaces_the_document_and_resets_the_selection() {
        let mut editor = plain_editor("<p>old</p>");
        editor.set_selection(Selection::caret(0, 3));
        editor.set_content("<p>a</p><p>b</p>").expect("content");
        assert_eq!(editor.to_html(), "<p>a</p><p>b</p>");
        assert_eq!(editor.selection(), Selection::caret(0, 0));
    }

    #[test]
    fn set_content_empty_falls_back_to_a_paragraph() {
        let mut editor = plain_editor("<p>old</p>");
        editor.set_content("").expect("content");
        assert_eq!(editor.to_html(), "<p></p>");
    }
}
