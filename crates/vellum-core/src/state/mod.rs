//! Editor state and the speculative transaction.
//!
//! A [`Transaction`] clones the current document and selection, applies
//! mutation steps against the clone, and records each step. The editor
//! commits it at most once; chains and dry runs work on the same type and
//! simply never commit on failure. Step variants follow the patch-operation
//! shape: struct variants plus `name()` accessors.

use std::sync::Arc;

use crate::model::{floor_char_boundary, Attrs, Mark, Node};
use crate::schema::Schema;

// ── Selection ──────────────────────────────────────────────────────────────

/// A selection within one block: `anchor` is the fixed side, `head` the
/// moving side. Equal offsets make a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub block: usize,
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn caret(block: usize, pos: usize) -> Self {
        Self {
            block,
            anchor: pos,
            head: pos,
        }
    }

    pub fn range(block: usize, anchor: usize, head: usize) -> Self {
        Self {
            block,
            anchor,
            head,
        }
    }

    /// Lower bound of the selected range.
    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Upper bound of the selected range.
    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::caret(0, 0)
    }
}

// ── Steps ──────────────────────────────────────────────────────────────────

/// One recorded document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    InsertText {
        block: usize,
        at: usize,
        text: String,
        marks: Vec<Mark>,
    },
    DeleteRange {
        block: usize,
        from: usize,
        to: usize,
    },
    AddMark {
        block: usize,
        from: usize,
        to: usize,
        mark: Mark,
    },
    RemoveMark {
        block: usize,
        from: usize,
        to: usize,
        mark_name: String,
    },
    SetBlockType {
        block: usize,
        type_name: String,
        attrs: Attrs,
    },
    SetSelection {
        selection: Selection,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::InsertText { .. } => "insert_text",
            Step::DeleteRange { .. } => "delete_range",
            Step::AddMark { .. } => "add_mark",
            Step::RemoveMark { .. } => "remove_mark",
            Step::SetBlockType { .. } => "set_block_type",
            Step::SetSelection { .. } => "set_selection",
        }
    }

    /// Whether the step mutates the document (rather than just the
    /// selection).
    pub fn is_doc_change(&self) -> bool {
        !matches!(self, Step::SetSelection { .. })
    }
}

// ── Editor state ───────────────────────────────────────────────────────────

/// The committed document plus selection.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub doc: Node,
    pub selection: Selection,
}

impl EditorState {
    pub fn new(doc: Node) -> Self {
        Self {
            doc,
            selection: Selection::default(),
        }
    }

    pub fn block(&self, index: usize) -> Option<&Node> {
        self.doc.content.get(index)
    }

    pub fn block_count(&self) -> usize {
        self.doc.content.len()
    }
}

// ── Transaction ────────────────────────────────────────────────────────────

/// A speculative edit: document + selection clone, plus the step log.
pub struct Transaction {
    schema: Arc<Schema>,
    doc: Node,
    selection: Selection,
    steps: Vec<Step>,
}

impl Transaction {
    pub(crate) fn new(state: &EditorState, schema: Arc<Schema>) -> Self {
        Self {
            schema,
            doc: state.doc.clone(),
            selection: state.selection,
            steps: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn doc_changed(&self) -> bool {
        self.steps.iter().any(Step::is_doc_change)
    }

    pub fn block(&self, index: usize) -> Option<&Node> {
        self.doc.content.get(index)
    }

    /// Block the selection lives in.
    pub fn current_block(&self) -> Option<&Node> {
        self.block(self.selection.block)
    }

    /// Marks that text typed at `pos` should carry: inherited from the left
    /// of the caret, minus non-inclusive marks that end there.
    pub fn typing_marks(&self, block: usize, pos: usize) -> Vec<Mark> {
        let Some(node) = self.block(block) else {
            return Vec::new();
        };
        node.marks_before(pos)
            .into_iter()
            .filter(|m| {
                self.schema.mark_is_inclusive(&m.type_name)
                    || node.mark_continues_at(pos, &m.type_name)
            })
            .collect()
    }

    // ── Mutation steps ─────────────────────────────────────────────────────

    /// Insert `text` carrying `marks` at a byte offset. Marks the block's
    /// type does not allow are dropped. Returns whether anything applied.
    pub fn insert_text(&mut self, block: usize, at: usize, text: &str, marks: &[Mark]) -> bool {
        if text.is_empty() {
            return false;
        }
        let schema = Arc::clone(&self.schema);
        let Some(node) = self.doc.content.get_mut(block) else {
            return false;
        };
        let marks: Vec<Mark> = marks
            .iter()
            .filter(|m| schema.allows_mark(&node.type_name, &m.type_name))
            .cloned()
            .collect();
        let at = floor_char_boundary(&node.block_text(), at.min(node.text_len()));
        node.insert_text_at(at, text, &marks);
        self.map_insert(block, at, text.len());
        self.steps.push(Step::InsertText {
            block,
            at,
            text: text.to_owned(),
            marks,
        });
        true
    }

    /// Delete `[from, to)` within a block.
    pub fn delete_range(&mut self, block: usize, from: usize, to: usize) -> bool {
        let Some(node) = self.doc.content.get_mut(block) else {
            return false;
        };
        let text = node.block_text();
        let from = floor_char_boundary(&text, from.min(text.len()));
        let to = floor_char_boundary(&text, to.min(text.len())).max(from);
        if from == to {
            return false;
        }
        node.delete_text_range(from, to);
        self.map_delete(block, from, to);
        self.steps.push(Step::DeleteRange { block, from, to });
        true
    }

    /// Apply a mark over `[from, to)`. Rejected when the block's type does
    /// not accept the mark.
    pub fn add_mark(&mut self, block: usize, from: usize, to: usize, mark: Mark) -> bool {
        let schema = Arc::clone(&self.schema);
        let Some(node) = self.doc.content.get_mut(block) else {
            return false;
        };
        if !schema.allows_mark(&node.type_name, &mark.type_name) {
            return false;
        }
        if from >= to || from >= node.text_len() {
            return false;
        }
        node.add_mark_range(from, to, mark.clone());
        self.steps.push(Step::AddMark {
            block,
            from,
            to,
            mark,
        });
        true
    }

    /// Remove marks of one type over `[from, to)`.
    pub fn remove_mark(&mut self, block: usize, from: usize, to: usize, mark_name: &str) -> bool {
        let Some(node) = self.doc.content.get_mut(block) else {
            return false;
        };
        if from >= to {
            return false;
        }
        node.remove_mark_range(from, to, mark_name);
        self.steps.push(Step::RemoveMark {
            block,
            from,
            to,
            mark_name: mark_name.to_owned(),
        });
        true
    }

    /// Convert a block to another textblock type. Declared attribute
    /// defaults are filled in; marks the new type rejects are stripped.
    pub fn set_block_type(&mut self, block: usize, type_name: &str, attrs: Attrs) -> bool {
        let schema = Arc::clone(&self.schema);
        let Some(node_type) = schema.node(type_name) else {
            log::error!("set_block_type: unknown node type `{type_name}`");
            return false;
        };
        if !node_type.is_textblock() {
            return false;
        }
        let Some(node) = self.doc.content.get_mut(block) else {
            return false;
        };
        let attrs = node_type.fill_attrs(attrs);
        node.type_name = type_name.to_owned();
        node.attrs = attrs.clone();

        let present: Vec<String> = node
            .content
            .iter()
            .flat_map(|run| run.marks.iter().map(|m| m.type_name.clone()))
            .collect();
        let len = node.text_len();
        for mark_name in present {
            if !node_type.allows_mark(&mark_name) {
                node.remove_mark_range(0, len, &mark_name);
            }
        }

        self.steps.push(Step::SetBlockType {
            block,
            type_name: type_name.to_owned(),
            attrs,
        });
        true
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let block = selection.block.min(self.doc.content.len().saturating_sub(1));
        let clamp = |pos: usize| -> usize {
            match self.doc.content.get(block) {
                Some(node) => floor_char_boundary(&node.block_text(), pos.min(node.text_len())),
                None => 0,
            }
        };
        self.selection = Selection {
            block,
            anchor: clamp(selection.anchor),
            head: clamp(selection.head),
        };
        self.steps.push(Step::SetSelection {
            selection: self.selection,
        });
    }

    pub(crate) fn into_parts(self) -> (Node, Selection, Vec<Step>) {
        (self.doc, self.selection, self.steps)
    }

    // Selection mapping through document edits.

    fn map_insert(&mut self, block: usize, at: usize, len: usize) {
        if self.selection.block != block {
            return;
        }
        if self.selection.anchor >= at {
            self.selection.anchor += len;
        }
        if self.selection.head >= at {
            self.selection.head += len;
        }
    }

    fn map_delete(&mut self, block: usize, from: usize, to: usize) {
        if self.selection.block != block {
            return;
        }
        let map = |pos: usize| -> usize {
            if pos <= from {
                pos
            } else if pos < to {
                from
            } else {
                pos - (to - from)
            }
        };
        self.selection.anchor = map(self.selection.anchor);
        self.selection.head = map(self.selection.head);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attrs, Mark, Node};
    use crate::testutil::{state_with, test_schema};
    use serde_json::Value;

    #[test]
    fn insert_maps_selection_forward() {
        let mut state = state_with("hello");
        state.selection = Selection::caret(0, 5);
        let mut tr = Transaction::new(&state, test_schema());
        assert!(tr.insert_text(0, 0, "> ", &[]));
        assert_eq!(tr.selection(), Selection::caret(0, 7));
        assert_eq!(tr.block(0).map(Node::block_text), Some("> hello".into()));
    }

    #[test]
    fn delete_maps_selection_into_gap() {
        let mut state = state_with("abcdef");
        state.selection = Selection::caret(0, 4);
        let mut tr = Transaction::new(&state, test_schema());
        assert!(tr.delete_range(0, 1, 5));
        assert_eq!(tr.selection(), Selection::caret(0, 1));
        assert_eq!(tr.block(0).map(Node::block_text), Some("af".into()));
    }

    #[test]
    fn add_mark_rejected_where_type_forbids() {
        let state = state_with("code here");
        let mut tr = Transaction::new(&state, test_schema());
        assert!(tr.set_block_type(0, "code_block", Attrs::new()));
        assert!(!tr.add_mark(0, 0, 4, Mark::new("link")));
    }

    #[test]
    fn unknown_mark_is_rejected() {
        let state = state_with("plain");
        let mut tr = Transaction::new(&state, test_schema());
        assert!(!tr.add_mark(0, 0, 5, Mark::new("shout")));
    }

    #[test]
    fn insert_drops_disallowed_marks() {
        let state = state_with("txt");
        let mut tr = Transaction::new(&state, test_schema());
        assert!(tr.set_block_type(0, "code_block", Attrs::new()));
        assert!(tr.insert_text(0, 3, "x", &[Mark::new("link")]));
        let block = tr.block(0).expect("block");
        assert!(block.content.iter().all(|r| r.marks.is_empty()));
    }

    #[test]
    fn typing_marks_drop_non_inclusive_at_trailing_edge() {
        let mut state = state_with("");
        state.doc.content[0] = Node::element(
            "paragraph",
            Attrs::new(),
            vec![
                Node::text_run("go ", vec![]),
                Node::text_run("here", vec![Mark::new("link")]),
                Node::text_run(" now", vec![]),
            ],
        );
        let tr = Transaction::new(&state, test_schema());
        assert!(tr.typing_marks(0, 7).is_empty(), "link is not inclusive");
        assert_eq!(tr.typing_marks(0, 5).len(), 1, "inside the link it sticks");
        assert!(tr.typing_marks(0, 0).is_empty());
    }

    #[test]
    fn set_block_type_fills_attr_defaults_and_strips_marks() {
        let mut state = state_with("");
        state.doc.content[0] = Node::element(
            "paragraph",
            Attrs::new(),
            vec![
                Node::text_run("see ", vec![]),
                Node::text_run("docs", vec![Mark::new("link")]),
            ],
        );
        let mut tr = Transaction::new(&state, test_schema());
        assert!(tr.set_block_type(0, "code_block", Attrs::new()));
        let block = tr.block(0).expect("block");
        assert_eq!(block.type_name, "code_block");
        assert_eq!(block.attrs.get("language"), Some(&Value::Null));
        assert_eq!(block.content.len(), 1);
        assert!(block.content[0].marks.is_empty());
    }

    #[test]
    fn set_block_type_rejects_unknown_and_non_textblock() {
        let state = state_with("x");
        let mut tr = Transaction::new(&state, test_schema());
        assert!(!tr.set_block_type(0, "nope", Attrs::new()));
        assert!(!tr.set_block_type(0, "doc", Attrs::new()));
        assert!(tr.steps().is_empty());
    }

    #[test]
    fn doc_changed_ignores_selection_steps() {
        let state = state_with("x");
        let mut tr = Transaction::new(&state, test_schema());
        tr.set_selection(Selection::caret(0, 1));
        assert!(!tr.doc_changed());
        tr.insert_text(0, 1, "!", &[]);
        assert!(tr.doc_changed());
    }

    #[test]
    fn set_selection_clamps_to_block_bounds() {
        let state = state_with("ab");
        let mut tr = Transaction::new(&state, test_schema());
        tr.set_selection(Selection::range(5, 10, 1));
        assert_eq!(tr.selection().block, 0);
        assert_eq!(tr.selection().anchor, 2);
        assert_eq!(tr.selection().head, 1);
    }
}
