//! Document tree: a `doc` root holding block nodes, each block holding a
//! sequence of text runs with marks.
//!
//! Positions inside a block are byte offsets into its concatenated text.
//! Offsets that land inside a UTF-8 sequence are rounded down to the nearest
//! character boundary rather than panicking. After every mutation the block
//! is kept normalized: no empty runs, adjacent runs with identical mark sets
//! merged.

use serde_json::{Map, Value};

/// Reserved top node type name.
pub const DOC_TYPE: &str = "doc";
/// Reserved inline leaf type name.
pub const TEXT_TYPE: &str = "text";

/// Attribute values, insertion-ordered.
pub type Attrs = Map<String, Value>;

// ── Marks ──────────────────────────────────────────────────────────────────

/// An inline annotation applied over a span of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub type_name: String,
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attrs(type_name: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            type_name: type_name.into(),
            attrs,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// String attribute value; `None` for missing, null, or non-string.
    pub fn attr_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(Value::as_str)
    }
}

// ── Nodes ──────────────────────────────────────────────────────────────────

/// A document node. Text runs carry `text` and `marks`; element nodes carry
/// `attrs` and `content`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub type_name: String,
    pub attrs: Attrs,
    pub marks: Vec<Mark>,
    pub text: Option<String>,
    pub content: Vec<Node>,
}

impl Node {
    pub fn element(type_name: impl Into<String>, attrs: Attrs, content: Vec<Node>) -> Self {
        Self {
            type_name: type_name.into(),
            attrs,
            marks: Vec::new(),
            text: None,
            content,
        }
    }

    pub fn text_run(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            type_name: TEXT_TYPE.to_owned(),
            attrs: Attrs::new(),
            marks,
            text: Some(text.into()),
            content: Vec::new(),
        }
    }

    pub fn doc(blocks: Vec<Node>) -> Self {
        Self::element(DOC_TYPE, Attrs::new(), blocks)
    }

    pub fn is_text(&self) -> bool {
        self.type_name == TEXT_TYPE
    }

    /// Concatenated text of this block's runs.
    pub fn block_text(&self) -> String {
        let mut out = String::new();
        for run in &self.content {
            if let Some(t) = &run.text {
                out.push_str(t);
            }
        }
        out
    }

    /// Total text length of this block in bytes.
    pub fn text_len(&self) -> usize {
        self.content
            .iter()
            .map(|run| run.text.as_deref().map_or(0, str::len))
            .sum()
    }

    // ── Run algebra ────────────────────────────────────────────────────────

    /// Insert `text` at byte offset `at`, carrying `marks`.
    pub fn insert_text_at(&mut self, at: usize, text: &str, marks: &[Mark]) {
        if text.is_empty() {
            return;
        }
        let at = clamp_offset(self, at);
        let mut runs = take_runs(self);
        let mut out = Vec::with_capacity(runs.len() + 2);
        let mut offset = 0usize;
        let mut inserted = false;
        for run in runs.drain(..) {
            let len = run.text.len();
            if !inserted && at <= offset + len {
                let split = at - offset;
                let (left, right) = split_run(run, split);
                push_run(&mut out, left);
                push_run(
                    &mut out,
                    Run {
                        text: text.to_owned(),
                        marks: marks.to_vec(),
                    },
                );
                push_run(&mut out, right);
                inserted = true;
            } else {
                push_run(&mut out, run);
            }
            offset += len;
        }
        if !inserted {
            push_run(
                &mut out,
                Run {
                    text: text.to_owned(),
                    marks: marks.to_vec(),
                },
            );
        }
        set_runs(self, out);
    }

    /// Delete text in `[from, to)`.
    pub fn delete_text_range(&mut self, from: usize, to: usize) {
        let from = clamp_offset(self, from);
        let to = clamp_offset(self, to).max(from);
        if from == to {
            return;
        }
        let mut runs = take_runs(self);
        let mut out = Vec::with_capacity(runs.len());
        let mut offset = 0usize;
        for run in runs.drain(..) {
            let len = run.text.len();
            let (start, end) = (offset, offset + len);
            offset = end;
            if end <= from || start >= to {
                push_run(&mut out, run);
                continue;
            }
            let keep_left = from.saturating_sub(start).min(len);
            let keep_right = to.min(end) - start;
            let (left, rest) = split_run(run, keep_left);
            let (_, right) = split_run(rest, keep_right - keep_left);
            push_run(&mut out, left);
            push_run(&mut out, right);
        }
        set_runs(self, out);
    }

    /// Apply `mark` over `[from, to)`, replacing any mark of the same type
    /// on the covered text.
    pub fn add_mark_range(&mut self, from: usize, to: usize, mark: Mark) {
        self.map_marks_in_range(from, to, |marks| {
            marks.retain(|m| m.type_name != mark.type_name);
            marks.push(mark.clone());
        });
    }

    /// Remove marks of `type_name` from `[from, to)`.
    pub fn remove_mark_range(&mut self, from: usize, to: usize, type_name: &str) {
        self.map_marks_in_range(from, to, |marks| {
            marks.retain(|m| m.type_name != type_name);
        });
    }

    fn map_marks_in_range(&mut self, from: usize, to: usize, f: impl Fn(&mut Vec<Mark>)) {
        let from = clamp_offset(self, from);
        let to = clamp_offset(self, to).max(from);
        if from == to {
            return;
        }
        let mut runs = take_runs(self);
        let mut out = Vec::with_capacity(runs.len() + 2);
        let mut offset = 0usize;
        for run in runs.drain(..) {
            let len = run.text.len();
            let (start, end) = (offset, offset + len);
            offset = end;
            if end <= from || start >= to {
                push_run(&mut out, run);
                continue;
            }
            let cut_left = from.saturating_sub(start).min(len);
            let cut_right = to.min(end) - start;
            let (left, rest) = split_run(run, cut_left);
            let (mut middle, right) = split_run(rest, cut_right - cut_left);
            f(&mut middle.marks);
            push_run(&mut out, left);
            push_run(&mut out, middle);
            push_run(&mut out, right);
        }
        set_runs(self, out);
    }

    /// Drop every mark in the block. Used when the block converts to a type
    /// that allows no marks.
    pub fn strip_marks(&mut self) {
        let text = self.block_text();
        self.content = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text_run(text, Vec::new())]
        };
    }

    /// Marks of the character left of `pos` (caret inheritance source).
    pub fn marks_before(&self, pos: usize) -> Vec<Mark> {
        let pos = clamp_offset(self, pos);
        if pos == 0 {
            return Vec::new();
        }
        let mut offset = 0usize;
        for run in &self.content {
            let len = run.text.as_deref().map_or(0, str::len);
            if pos <= offset + len {
                return run.marks.clone();
            }
            offset += len;
        }
        self.content.last().map(|r| r.marks.clone()).unwrap_or_default()
    }

    /// Marks of the character at `pos` (right-biased; falls back to the left
    /// run at the block end). Used for hit testing.
    pub fn marks_at(&self, pos: usize) -> Vec<Mark> {
        let pos = clamp_offset(self, pos);
        let mut offset = 0usize;
        for run in &self.content {
            let len = run.text.as_deref().map_or(0, str::len);
            if pos < offset + len {
                return run.marks.clone();
            }
            offset += len;
        }
        self.marks_before(pos)
    }

    /// Extent of the contiguous span of runs carrying `type_name` that
    /// touches `pos`. `None` when no such run touches it.
    pub fn mark_span(&self, pos: usize, type_name: &str) -> Option<(usize, usize)> {
        let pos = clamp_offset(self, pos);
        let mut spans: Vec<(usize, usize, bool)> = Vec::with_capacity(self.content.len());
        let mut offset = 0usize;
        for run in &self.content {
            let len = run.text.as_deref().map_or(0, str::len);
            let has = run.marks.iter().any(|m| m.type_name == type_name);
            spans.push((offset, offset + len, has));
            offset += len;
        }
        let idx = spans
            .iter()
            .position(|&(start, end, has)| has && start <= pos && pos <= end)?;
        let mut from = spans[idx].0;
        let mut to = spans[idx].1;
        for &(start, _, has) in spans[..idx].iter().rev() {
            if !has {
                break;
            }
            from = start;
        }
        for &(_, end, has) in &spans[idx + 1..] {
            if !has {
                break;
            }
            to = end;
        }
        Some((from, to))
    }

    /// Whether a mark of `type_name` covers the character at `pos`.
    pub fn mark_continues_at(&self, pos: usize, type_name: &str) -> bool {
        let pos = clamp_offset(self, pos);
        let mut offset = 0usize;
        for run in &self.content {
            let len = run.text.as_deref().map_or(0, str::len);
            if pos < offset + len {
                return run.marks.iter().any(|m| m.type_name == type_name);
            }
            offset += len;
        }
        false
    }
}

// ── Run helpers ────────────────────────────────────────────────────────────

struct Run {
    text: String,
    marks: Vec<Mark>,
}

fn take_runs(block: &mut Node) -> Vec<Run> {
    std::mem::take(&mut block.content)
        .into_iter()
        .filter_map(|node| {
            node.text.map(|text| Run {
                text,
                marks: node.marks,
            })
        })
        .collect()
}

fn set_runs(block: &mut Node, runs: Vec<Run>) {
    block.content = runs
        .into_iter()
        .map(|run| Node::text_run(run.text, run.marks))
        .collect();
}

/// Split a run at a byte offset within it, returning both halves.
fn split_run(mut run: Run, at: usize) -> (Run, Run) {
    let at = floor_char_boundary(&run.text, at);
    let right_text = run.text.split_off(at);
    let right = Run {
        text: right_text,
        marks: run.marks.clone(),
    };
    (run, right)
}

/// Push a run, dropping empties and merging into a preceding run with the
/// same marks.
fn push_run(out: &mut Vec<Run>, run: Run) {
    if run.text.is_empty() {
        return;
    }
    if let Some(last) = out.last_mut() {
        if last.marks == run.marks {
            last.text.push_str(&run.text);
            return;
        }
    }
    out.push(run);
}

fn clamp_offset(block: &Node, pos: usize) -> usize {
    let text = block.block_text();
    floor_char_boundary(&text, pos.min(text.len()))
}

/// Round a byte offset down to the nearest char boundary.
pub(crate) fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
