//! Extension descriptors: the declarative unit everything else composes.
//!
//! An extension contributes one schema fragment — a node type or a mark
//! type — plus optional behavior hooks (commands, input/paste rules, keys,
//! plugins). Descriptors are built with chained setters, frozen on
//! registration, and resolved by the editor builder in registration order.
//!
//! Hooks come in two stages. Schema-stage hooks (`schema`, `attributes`)
//! run before any type exists and see a [`ConfigContext`]: resolved name and
//! options. Binding-stage hooks run after the schema is built and see a
//! [`NodeContext`] / [`MarkContext`], which additionally expose the schema
//! and the extension's own resolved type. Handlers that need the live
//! editor receive it as an argument when invoked.

mod options;

pub use options::Options;

use crate::command::CommandFactory;
use crate::keymap::KeyHandler;
use crate::plugin::Plugin;
use crate::rules::{InputRule, PasteRule};
use crate::schema::{AttributeSpecs, MarkSpec, MarkType, NodeSpec, NodeType, Schema};

// ── Contexts ───────────────────────────────────────────────────────────────

/// What kind of schema fragment an extension contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    Node,
    Mark,
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtensionKind::Node => f.write_str("node"),
            ExtensionKind::Mark => f.write_str("mark"),
        }
    }
}

/// Context for schema-stage hooks.
pub struct ConfigContext<'a> {
    pub name: &'a str,
    pub options: &'a Options,
}

/// Context for binding-stage hooks of a node extension.
pub struct NodeContext<'a> {
    pub name: &'a str,
    pub options: &'a Options,
    pub schema: &'a Schema,
    pub node_type: &'a NodeType,
}

/// Context for binding-stage hooks of a mark extension.
pub struct MarkContext<'a> {
    pub name: &'a str,
    pub options: &'a Options,
    pub schema: &'a Schema,
    pub mark_type: &'a MarkType,
}

// ── Hook signatures ────────────────────────────────────────────────────────

/// A named command contribution.
pub type CommandSet = Vec<(String, CommandFactory)>;
/// A chord/handler contribution.
pub type KeySet = Vec<(String, KeyHandler)>;

type NodeSchemaHook = Box<dyn Fn(&ConfigContext) -> NodeSpec>;
type MarkSchemaHook = Box<dyn Fn(&ConfigContext) -> MarkSpec>;
type AttributesHook = Box<dyn Fn(&ConfigContext) -> AttributeSpecs>;

type NodeHook<T> = Box<dyn Fn(&NodeContext) -> T>;
type MarkHook<T> = Box<dyn Fn(&MarkContext) -> T>;

// ── Node extensions ────────────────────────────────────────────────────────

/// Descriptor for an extension contributing a block-level node type.
pub struct NodeExtension {
    name: String,
    default_options: Options,
    overrides: Options,
    schema: Option<NodeSchemaHook>,
    attributes: Option<AttributesHook>,
    commands: Option<NodeHook<CommandSet>>,
    input_rules: Option<NodeHook<Vec<InputRule>>>,
    paste_rules: Option<NodeHook<Vec<PasteRule>>>,
    keys: Option<NodeHook<KeySet>>,
    plugins: Option<NodeHook<Vec<Plugin>>>,
}

impl NodeExtension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_options: Options::new(),
            overrides: Options::new(),
            schema: None,
            attributes: None,
            commands: None,
            input_rules: None,
            paste_rules: None,
            keys: None,
            plugins: None,
        }
    }

    pub fn default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }

    /// Registry-time option override; shallow-merged over the defaults.
    pub fn configure(mut self, overrides: Options) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn schema<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigContext) -> NodeSpec + 'static,
    {
        self.schema = Some(Box::new(f));
        self
    }

    pub fn attributes<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigContext) -> AttributeSpecs + 'static,
    {
        self.attributes = Some(Box::new(f));
        self
    }

    pub fn commands<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeContext) -> CommandSet + 'static,
    {
        self.commands = Some(Box::new(f));
        self
    }

    pub fn input_rules<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeContext) -> Vec<InputRule> + 'static,
    {
        self.input_rules = Some(Box::new(f));
        self
    }

    pub fn paste_rules<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeContext) -> Vec<PasteRule> + 'static,
    {
        self.paste_rules = Some(Box::new(f));
        self
    }

    pub fn keys<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeContext) -> KeySet + 'static,
    {
        self.keys = Some(Box::new(f));
        self
    }

    pub fn plugins<F>(mut self, f: F) -> Self
    where
        F: Fn(&NodeContext) -> Vec<Plugin> + 'static,
    {
        self.plugins = Some(Box::new(f));
        self
    }

    // Invocation side, used by the builder.

    pub(crate) fn resolved_options(&self) -> Options {
        Options::resolve(&self.default_options, &self.overrides)
    }

    pub(crate) fn build_schema(&self, ctx: &ConfigContext) -> NodeSpec {
        self.schema.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn build_attributes(&self, ctx: &ConfigContext) -> AttributeSpecs {
        self.attributes.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_commands(&self, ctx: &NodeContext) -> CommandSet {
        self.commands.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_input_rules(&self, ctx: &NodeContext) -> Vec<InputRule> {
        self.input_rules.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_paste_rules(&self, ctx: &NodeContext) -> Vec<PasteRule> {
        self.paste_rules.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_keys(&self, ctx: &NodeContext) -> KeySet {
        self.keys.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_plugins(&self, ctx: &NodeContext) -> Vec<Plugin> {
        self.plugins.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }
}

// ── Mark extensions ────────────────────────────────────────────────────────

/// Descriptor for an extension contributing an inline mark type.
pub struct MarkExtension {
    name: String,
    default_options: Options,
    overrides: Options,
    schema: Option<MarkSchemaHook>,
    attributes: Option<AttributesHook>,
    commands: Option<MarkHook<CommandSet>>,
    input_rules: Option<MarkHook<Vec<InputRule>>>,
    paste_rules: Option<MarkHook<Vec<PasteRule>>>,
    keys: Option<MarkHook<KeySet>>,
    plugins: Option<MarkHook<Vec<Plugin>>>,
}

impl MarkExtension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_options: Options::new(),
            overrides: Options::new(),
            schema: None,
            attributes: None,
            commands: None,
            input_rules: None,
            paste_rules: None,
            keys: None,
            plugins: None,
        }
    }

    pub fn default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }

    pub fn configure(mut self, overrides: Options) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn schema<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigContext) -> MarkSpec + 'static,
    {
        self.schema = Some(Box::new(f));
        self
    }

    pub fn attributes<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConfigContext) -> AttributeSpecs + 'static,
    {
        self.attributes = Some(Box::new(f));
        self
    }

    pub fn commands<F>(mut self, f: F) -> Self
    where
        F: Fn(&MarkContext) -> CommandSet + 'static,
    {
        self.commands = Some(Box::new(f));
        self
    }

    pub fn input_rules<F>(mut self, f: F) -> Self
    where
        F: Fn(&MarkContext) -> Vec<InputRule> + 'static,
    {
        self.input_rules = Some(Box::new(f));
        self
    }

    pub fn paste_rules<F>(mut self, f: F) -> Self
    where
        F: Fn(&MarkContext) -> Vec<PasteRule> + 'static,
    {
        self.paste_rules = Some(Box::new(f));
        self
    }

    pub fn keys<F>(mut self, f: F) -> Self
    where
        F: Fn(&MarkContext) -> KeySet + 'static,
    {
        self.keys = Some(Box::new(f));
        self
    }

    pub fn plugins<F>(mut self, f: F) -> Self
    where
        F: Fn(&MarkContext) -> Vec<Plugin> + 'static,
    {
        self.plugins = Some(Box::new(f));
        self
    }

    pub(crate) fn resolved_options(&self) -> Options {
        Options::resolve(&self.default_options, &self.overrides)
    }

    pub(crate) fn build_schema(&self, ctx: &ConfigContext) -> MarkSpec {
        self.schema.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn build_attributes(&self, ctx: &ConfigContext) -> AttributeSpecs {
        self.attributes.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_commands(&self, ctx: &MarkContext) -> CommandSet {
        self.commands.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_input_rules(&self, ctx: &MarkContext) -> Vec<InputRule> {
        self.input_rules.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_paste_rules(&self, ctx: &MarkContext) -> Vec<PasteRule> {
        self.paste_rules.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_keys(&self, ctx: &MarkContext) -> KeySet {
        self.keys.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }

    pub(crate) fn bind_plugins(&self, ctx: &MarkContext) -> Vec<Plugin> {
        self.plugins.as_ref().map(|f| f(ctx)).unwrap_or_default()
    }
}

// ── Descriptor enum ────────────────────────────────────────────────────────

/// A frozen extension descriptor of either kind.
pub enum Extension {
    Node(NodeExtension),
    Mark(MarkExtension),
}

impl Extension {
    pub fn name(&self) -> &str {
        match self {
            Extension::Node(n) => &n.name,
            Extension::Mark(m) => &m.name,
        }
    }

    pub fn kind(&self) -> ExtensionKind {
        match self {
            Extension::Node(_) => ExtensionKind::Node,
            Extension::Mark(_) => ExtensionKind::Mark,
        }
    }

    /// Registry-time option override, regardless of kind.
    pub fn configure(self, overrides: Options) -> Self {
        match self {
            Extension::Node(n) => Extension::Node(n.configure(overrides)),
            Extension::Mark(m) => Extension::Mark(m.configure(overrides)),
        }
    }

    pub(crate) fn resolved_options(&self) -> Options {
        match self {
            Extension::Node(n) => n.resolved_options(),
            Extension::Mark(m) => m.resolved_options(),
        }
    }
}

impl From<NodeExtension> for Extension {
    fn from(n: NodeExtension) -> Self {
        Extension::Node(n)
    }
}

impl From<MarkExtension> for Extension {
    fn from(m: MarkExtension) -> Self {
        Extension::Mark(m)
    }
}
