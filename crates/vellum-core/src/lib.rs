//! Extension composition core for a structured rich-text document editor.
//!
//! Everything an editor does arrives as an extension: a descriptor
//! contributing a schema fragment (one node or mark type) plus hooks for
//! commands, input rules, paste rules, key bindings, DOM rendering, and
//! plugins. The core validates the combined schema, aggregates the hook
//! output in registration order, and runs the event pipelines (typing,
//! paste, keys, clicks) over a flat block document.
//!
//! # Example
//!
//! ```
//! use vellum_core::{base, Editor, Selection};
//!
//! let mut editor = Editor::builder()
//!     .add_extension(base::document())
//!     .add_extension(base::paragraph())
//!     .add_extension(base::text())
//!     .content("<p>hello</p>")
//!     .build()?;
//!
//! editor.set_selection(Selection::caret(0, 5));
//! editor.insert_text(" world");
//! assert_eq!(editor.to_html(), "<p>hello world</p>");
//! # Ok::<(), vellum_core::ConfigError>(())
//! ```

pub mod base;
pub mod command;
pub mod dom;
pub mod editor;
pub mod error;
pub mod extension;
pub mod keymap;
pub mod model;
pub mod plugin;
pub mod rules;
pub mod schema;
pub mod state;

#[cfg(test)]
mod testutil;

pub use command::{BoxedCommand, CommandError, CommandFactory, CommandRegistry, CommandScope};
pub use dom::{DomElement, DomNode, DomParseError, DomTemplate};
pub use editor::{Chain, Editor, EditorBuilder, Effect};
pub use error::ConfigError;
pub use extension::{
    CommandSet, ConfigContext, Extension, ExtensionKind, KeySet, MarkContext, MarkExtension,
    NodeContext, NodeExtension, Options,
};
pub use keymap::{ChordError, KeyHandler, Keymap, ShadowedBinding};
pub use model::{Attrs, Mark, Node};
pub use plugin::{ClickEvent, Plugin};
pub use rules::{InputRule, PasteRule};
pub use schema::{
    AttributeSpec, AttributeSpecs, MarkSpec, NodeSpec, ParseRule, RenderCtx, Schema, Whitespace,
};
pub use state::{EditorState, Selection, Transaction};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
