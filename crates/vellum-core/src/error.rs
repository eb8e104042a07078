//! Configuration errors surfaced before the editor becomes interactive.
//!
//! Every variant names the extension it came from, so a failing build points
//! straight at the offending contribution. Runtime non-applications (a
//! command returning `false`, a rule transform returning `None`) are not
//! errors and never appear here.

use thiserror::Error;

use crate::dom::DomParseError;
use crate::extension::ExtensionKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two extensions registered under one name. The name is shared; the
    /// kinds tell the two parties apart when a node and a mark collide.
    #[error("extension name `{name}` registered twice (as {first} and as {second})")]
    DuplicateName {
        name: String,
        first: ExtensionKind,
        second: ExtensionKind,
    },

    #[error("extension `{extension}`: invalid content expression `{expr}`: {reason}")]
    InvalidContent {
        extension: String,
        expr: String,
        reason: String,
    },

    /// A content expression refers to a node or group nothing declares.
    #[error("extension `{extension}`: content expression references undeclared name `{referenced}`")]
    UnknownContentRef {
        extension: String,
        referenced: String,
    },

    /// A `marks` list refers to a mark type nothing declares.
    #[error("extension `{extension}`: marks list references undeclared mark `{referenced}`")]
    UnknownMarkRef {
        extension: String,
        referenced: String,
    },

    /// A parse rule declares it extracts an attribute the type has no
    /// [`AttributeSpec`](crate::schema::AttributeSpec) for.
    #[error("extension `{extension}`: parse rule extracts attribute `{attr}` with no attribute spec")]
    UndeclaredAttr { extension: String, attr: String },

    #[error("extension `{extension}`: invalid parse selector `{selector}`")]
    InvalidSelector {
        extension: String,
        selector: String,
    },

    /// A render template must carry exactly one content hole for a type
    /// with content, and at most one otherwise.
    #[error("extension `{extension}`: render template has {holes} content holes")]
    BadRenderTemplate { extension: String, holes: usize },

    #[error("extension `{extension}`: type has no render template")]
    MissingRender { extension: String },

    /// The reserved `doc` top node or `text` inline leaf was never
    /// registered; the base extensions provide both.
    #[error("reserved type `{name}` is not registered")]
    ReservedMissing { name: &'static str },

    #[error("extension `{extension}`: invalid key chord `{chord}`")]
    InvalidChord { extension: String, chord: String },

    /// The initial content handed to the builder failed to parse.
    #[error("initial content: {0}")]
    Content(#[from] DomParseError),
}
