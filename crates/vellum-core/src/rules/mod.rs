//! Input and paste rules: pattern-triggered transforms.
//!
//! Rules come in the combinations the editor actually supports, encoded in
//! the constructors: input rules either convert the current textblock to a
//! node type or apply a mark to matched text; paste rules apply a mark per
//! match in the pasted span. A transform returning `None` makes its rule a
//! no-op and the engine moves on to the next rule in order.
//!
//! Aggregation keeps extension registration order, then hook-internal order,
//! so evaluation is deterministic across the whole extension set.

use regex::{Captures, Regex};

use crate::model::{Attrs, Mark};
use crate::state::Transaction;

/// Computes attributes for the transform target from the regex captures.
/// `None` aborts this rule (the engine tries the next one).
pub type TransformFn = Box<dyn Fn(&Captures) -> Option<Attrs>>;

// ── Rule types ─────────────────────────────────────────────────────────────

enum InputAction {
    /// Convert the current textblock to `node`, deleting the matched text.
    Textblock { node: String },
    /// Delete the match's delimiters and mark the first capture group.
    Mark { mark: String },
}

/// A rule matched against the current textblock's text up to the caret on
/// every text insertion. The first rule whose match ends exactly at the
/// caret and whose transform returns attributes commits.
pub struct InputRule {
    pattern: Regex,
    action: InputAction,
    transform: TransformFn,
}

impl InputRule {
    /// Textblock-conversion rule: on match, the matched text is removed and
    /// the block converts to `node` with the transform's attributes.
    pub fn textblock<F>(pattern: Regex, node: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Captures) -> Option<Attrs> + 'static,
    {
        Self {
            pattern,
            action: InputAction::Textblock { node: node.into() },
            transform: Box::new(transform),
        }
    }

    /// Mark-application rule: the pattern must have a first capture group
    /// holding the text to keep; surrounding delimiter text is deleted and
    /// the group gets the mark.
    pub fn mark<F>(pattern: Regex, mark: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Captures) -> Option<Attrs> + 'static,
    {
        Self {
            pattern,
            action: InputAction::Mark { mark: mark.into() },
            transform: Box::new(transform),
        }
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

/// A rule scanned over the freshly pasted span. Every non-overlapping match
/// whose transform returns attributes gets the mark.
pub struct PasteRule {
    pattern: Regex,
    mark: String,
    transform: TransformFn,
}

impl PasteRule {
    pub fn mark<F>(pattern: Regex, mark: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Captures) -> Option<Attrs> + 'static,
    {
        Self {
            pattern,
            mark: mark.into(),
            transform: Box::new(transform),
        }
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

// ── Aggregation and evaluation ─────────────────────────────────────────────

/// All rules of one editor, in contribution order.
#[derive(Default)]
pub struct RuleSet {
    input: Vec<InputRule>,
    paste: Vec<PasteRule>,
}

impl RuleSet {
    pub(crate) fn add_input(&mut self, rules: Vec<InputRule>) {
        self.input.extend(rules);
    }

    pub(crate) fn add_paste(&mut self, rules: Vec<PasteRule>) {
        self.paste.extend(rules);
    }

    pub fn input_rules(&self) -> &[InputRule] {
        &self.input
    }

    pub fn paste_rules(&self) -> &[PasteRule] {
        &self.paste
    }

    /// Try input rules at the transaction's caret. Commits the first rule
    /// whose match ends at the caret and whose transform accepts, appending
    /// its steps to `tr`. Returns whether a rule applied.
    ///
    /// Skipped entirely inside `code: true` blocks, so typing in a code
    /// block never re-triggers formatting.
    pub(crate) fn apply_input(&self, tr: &mut Transaction) -> bool {
        let sel = tr.selection();
        if !sel.is_caret() {
            return false;
        }
        let caret = sel.head;
        let (text, is_code, textblock) = {
            let Some(node) = tr.current_block() else {
                return false;
            };
            let node_type = tr.schema().node(&node.type_name);
            (
                node.block_text(),
                node_type.is_some_and(|t| t.is_code()),
                node_type.is_some_and(|t| t.is_textblock()),
            )
        };
        if is_code || !textblock || caret > text.len() {
            return false;
        }
        let prefix = &text[..caret];

        for rule in &self.input {
            let Some(m) = rule
                .pattern
                .captures_iter(prefix)
                .find(|m| m.get(0).is_some_and(|g| g.end() == caret))
            else {
                continue;
            };
            let Some(attrs) = (rule.transform)(&m) else {
                continue;
            };
            let Some(whole) = m.get(0) else {
                continue;
            };
            match &rule.action {
                InputAction::Textblock { node } => {
                    if !tr.set_block_type(sel.block, node, attrs) {
                        continue;
                    }
                    tr.delete_range(sel.block, whole.start(), whole.end());
                    return true;
                }
                InputAction::Mark { mark } => {
                    let Some(content) = m.get(1) else {
                        log::debug!("mark input rule without a capture group never applies");
                        continue;
                    };
                    let mark = {
                        let Some(mark_type) = tr.schema().mark(mark) else {
                            continue;
                        };
                        Mark::with_attrs(mark_type.name().to_owned(), mark_type.fill_attrs(attrs))
                    };
                    // trailing delimiter first so earlier offsets stay valid
                    tr.delete_range(sel.block, content.end(), whole.end());
                    tr.delete_range(sel.block, whole.start(), content.start());
                    let from = whole.start();
                    let to = from + content.len();
                    tr.add_mark(sel.block, from, to, mark);
                    return true;
                }
            }
        }
        false
    }

    /// Scan `[from, to)` of `block` — the freshly inserted paste span — with
    /// every paste rule, applying marks per match. Returns whether anything
    /// applied.
    pub(crate) fn apply_paste(
        &self,
        tr: &mut Transaction,
        block: usize,
        from: usize,
        to: usize,
    ) -> bool {
        let text = {
            let Some(node) = tr.block(block) else {
                return false;
            };
            node.block_text()
        };
        let to = to.min(text.len());
        if from >= to {
            return false;
        }
        let span = &text[from..to];

        let mut applied = false;
        for rule in &self.paste {
            // collect first: the transform and the transaction both want
            // the match data, and `add_mark` needs `tr` mutably
            let mut marks: Vec<(usize, usize, Attrs)> = Vec::new();
            for m in rule.pattern.captures_iter(span) {
                let Some(whole) = m.get(0) else { continue };
                if let Some(attrs) = (rule.transform)(&m) {
                    marks.push((from + whole.start(), from + whole.end(), attrs));
                }
            }
            if marks.is_empty() {
                continue;
            }
            let Some(mark_type) = tr.schema().mark(&rule.mark) else {
                continue;
            };
            let name = mark_type.name().to_owned();
            let filled: Vec<(usize, usize, Attrs)> = marks
                .into_iter()
                .map(|(s, e, attrs)| (s, e, mark_type.fill_attrs(attrs)))
                .collect();
            for (start, end, attrs) in filled {
                applied |= tr.add_mark(block, start, end, Mark::with_attrs(name.clone(), attrs));
            }
        }
        applied
    }
}
