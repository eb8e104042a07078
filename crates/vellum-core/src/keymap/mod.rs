//! Keyboard shortcut aggregation.
//!
//! Chords are canonicalized before they enter the table — modifier aliases
//! resolved (`Control`→`Ctrl`, `Cmd`→`Meta`, `Mod`→`Ctrl`), modifiers
//! emitted in a fixed order, single letters lowercased — so `Shift-Control-\`
//! and `Ctrl-Shift-\` land on the same entry.
//!
//! Collisions follow last-registration-wins, like commands, but the shadowed
//! binding is recorded and logged at warn level. Shadowing a chord is a
//! supported customization move, yet unlike a command overwrite it usually
//! surprises someone, so it stays queryable via [`Keymap::shadowed`].

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::editor::Editor;

/// A bound shortcut handler. Returning `true` consumes the keypress.
pub type KeyHandler = Box<dyn Fn(&mut Editor) -> bool>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid key chord `{0}`")]
pub struct ChordError(pub String);

// ── Canonicalization ───────────────────────────────────────────────────────

/// Named keys the dispatcher understands, in canonical spelling. Chords with
/// any other multi-character key name fail to parse.
const NAMED_KEYS: &[&str] = &[
    "Enter",
    "Tab",
    "Space",
    "Backspace",
    "Delete",
    "Escape",
    "Home",
    "End",
    "PageUp",
    "PageDown",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
];

fn named_key(token: &str) -> Option<&'static str> {
    NAMED_KEYS
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(token))
        .or_else(|| {
            // F1..F12
            let rest = token.strip_prefix(['f', 'F'])?;
            let n: u8 = rest.parse().ok()?;
            if (1..=12).contains(&n) {
                const F: [&str; 12] = [
                    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
                ];
                Some(F[(n - 1) as usize])
            } else {
                None
            }
        })
}

/// Resolve one chord to its canonical spelling: `Alt`, `Ctrl`, `Meta`,
/// `Shift` in that order, then the key.
pub fn canonicalize(chord: &str) -> Result<String, ChordError> {
    let bad = || ChordError(chord.to_owned());
    let (mut alt, mut ctrl, mut meta, mut shift) = (false, false, false, false);

    let mut rest = chord.trim();
    while let Some(dash) = rest.find('-') {
        let token = &rest[..dash];
        match token.to_ascii_lowercase().as_str() {
            "alt" | "option" => alt = true,
            "ctrl" | "control" => ctrl = true,
            "meta" | "cmd" | "command" | "super" => meta = true,
            "shift" => shift = true,
            // `Mod` is the platform-primary modifier; this core is
            // single-platform and binds it to Ctrl.
            "mod" => ctrl = true,
            _ => break,
        }
        rest = &rest[dash + 1..];
    }

    let key = if rest.chars().count() == 1 {
        let ch = rest.chars().next().ok_or_else(bad)?;
        if ch.is_ascii_alphabetic() {
            ch.to_ascii_lowercase().to_string()
        } else {
            rest.to_owned()
        }
    } else {
        named_key(rest).ok_or_else(bad)?.to_owned()
    };

    let mut out = String::new();
    for (on, name) in [(alt, "Alt"), (ctrl, "Ctrl"), (meta, "Meta"), (shift, "Shift")] {
        if on {
            out.push_str(name);
            out.push('-');
        }
    }
    out.push_str(&key);
    Ok(out)
}

// ── Keymap ─────────────────────────────────────────────────────────────────

/// One chord binding, with the contributing extension recorded for
/// diagnostics.
pub struct KeyBinding {
    chord: String,
    extension: String,
    handler: KeyHandler,
}

impl KeyBinding {
    pub fn chord(&self) -> &str {
        &self.chord
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub(crate) fn handle(&self, editor: &mut Editor) -> bool {
        (self.handler)(editor)
    }
}

/// Record of a binding replaced by a later registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedBinding {
    pub chord: String,
    pub shadowed: String,
    pub replaced_by: String,
}

/// The flattened chord → handler table, canonical chords as keys.
#[derive(Default)]
pub struct Keymap {
    bindings: IndexMap<String, Arc<KeyBinding>>,
    shadowed: Vec<ShadowedBinding>,
}

impl Keymap {
    /// Bind a chord. A duplicate canonical chord replaces the earlier
    /// binding and records it as shadowed.
    pub(crate) fn bind(
        &mut self,
        extension: &str,
        chord: &str,
        handler: KeyHandler,
    ) -> Result<(), ChordError> {
        let canonical = canonicalize(chord)?;
        if let Some(prev) = self.bindings.get(&canonical) {
            log::warn!(
                "key `{canonical}` from `{}` shadowed by `{extension}`",
                prev.extension
            );
            self.shadowed.push(ShadowedBinding {
                chord: canonical.clone(),
                shadowed: prev.extension.clone(),
                replaced_by: extension.to_owned(),
            });
        }
        let binding = KeyBinding {
            chord: canonical.clone(),
            extension: extension.to_owned(),
            handler,
        };
        self.bindings.insert(canonical, Arc::new(binding));
        Ok(())
    }

    /// Look up by canonical chord.
    pub(crate) fn get(&self, canonical: &str) -> Option<&Arc<KeyBinding>> {
        self.bindings.get(canonical)
    }

    /// Bound chords in first-registration order.
    pub fn chords(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Bindings replaced by later registrations, oldest first.
    pub fn shadowed(&self) -> &[ShadowedBinding] {
        &self.shadowed
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
