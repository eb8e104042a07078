//! Substrate-level plugins: the escape hatch for behavior that is not a
//! command, rule, or key binding.
//!
//! The one capability the substrate exposes is click interception. Plugins
//! are tried in registration order; a handler returning `true` consumes the
//! click, symmetrical with key handlers.

use crate::editor::Editor;

/// A click in the rendered document, located the same way selections are:
/// block index plus byte offset in the block's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub block: usize,
    pub pos: usize,
}

pub type ClickHandler = Box<dyn Fn(&mut Editor, &ClickEvent) -> bool>;

/// One plugin contribution. Handlers run against the live editor; anything
/// they cannot do in-process (open a URL) goes through the effect outbox.
pub struct Plugin {
    name: String,
    click: Option<ClickHandler>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            click: None,
        }
    }

    pub fn on_click<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Editor, &ClickEvent) -> bool + 'static,
    {
        self.click = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the click handler, if any. `false` when the plugin has none.
    pub(crate) fn handle_click(&self, editor: &mut Editor, event: &ClickEvent) -> bool {
        match &self.click {
            Some(f) => f(editor, event),
            None => false,
        }
    }
}
