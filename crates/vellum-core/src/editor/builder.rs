//! Editor assembly: runs the two-stage extension pipeline and produces a
//! ready [`Editor`].
//!
//! Stage one resolves options and collects schema fragments; the schema
//! builder validates the whole set. Stage two re-walks the extensions in
//! registration order and binds commands, rules, keys, and plugins against
//! the now-existing schema. Both stages keep registration order, which is
//! what makes collision policies deterministic.

use std::sync::Arc;

use crate::command::CommandRegistry;
use crate::error::ConfigError;
use crate::extension::{ConfigContext, Extension, MarkContext, NodeContext, Options};
use crate::keymap::Keymap;
use crate::model::Node;
use crate::plugin::Plugin;
use crate::rules::RuleSet;
use crate::schema::{parse_document, SchemaBuilder};

use super::{with_fallback_block, Editor};

/// Builds an [`Editor`] from extensions plus optional initial content.
#[derive(Default)]
pub struct EditorBuilder {
    extensions: Vec<Extension>,
    content: Option<String>,
}

impl EditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension. Registration order is the composition order
    /// everywhere: schema types, commands, rules, keys, plugins.
    pub fn add_extension(mut self, extension: impl Into<Extension>) -> Self {
        self.extensions.push(extension.into());
        self
    }

    /// Initial document as an HTML fragment.
    pub fn content(mut self, html: impl Into<String>) -> Self {
        self.content = Some(html.into());
        self
    }

    pub fn build(self) -> Result<Editor, ConfigError> {
        let EditorBuilder {
            extensions,
            content,
        } = self;
        let resolved: Vec<(Extension, Options)> = extensions
            .into_iter()
            .map(|ext| {
                let options = ext.resolved_options();
                (ext, options)
            })
            .collect();

        let mut schema_builder = SchemaBuilder::new();
        for (ext, options) in &resolved {
            let ctx = ConfigContext {
                name: ext.name(),
                options,
            };
            match ext {
                Extension::Node(n) => schema_builder.add_node(
                    ext.name(),
                    n.build_schema(&ctx),
                    n.build_attributes(&ctx),
                ),
                Extension::Mark(m) => schema_builder.add_mark(
                    ext.name(),
                    m.build_schema(&ctx),
                    m.build_attributes(&ctx),
                ),
            }
        }
        let schema = Arc::new(schema_builder.finish()?);

        let mut commands = CommandRegistry::default();
        crate::command::register_base_commands(&mut commands);
        let mut rules = RuleSet::default();
        let mut keymap = Keymap::default();
        let mut plugins: Vec<Arc<Plugin>> = Vec::new();

        for (ext, options) in &resolved {
            let name = ext.name();
            match ext {
                Extension::Node(n) => {
                    let Some(node_type) = schema.node(name) else {
                        continue;
                    };
                    let ctx = NodeContext {
                        name,
                        options,
                        schema: schema.as_ref(),
                        node_type,
                    };
                    for (command, factory) in n.bind_commands(&ctx) {
                        commands.register(name, command, factory);
                    }
                    rules.add_input(n.bind_input_rules(&ctx));
                    rules.add_paste(n.bind_paste_rules(&ctx));
                    for (chord, handler) in n.bind_keys(&ctx) {
                        keymap.bind(name, &chord, handler).map_err(|_| {
                            ConfigError::InvalidChord {
                                extension: name.to_owned(),
                                chord,
                            }
                        })?;
                    }
                    plugins.extend(n.bind_plugins(&ctx).into_iter().map(Arc::new));
                }
                Extension::Mark(m) => {
                    let Some(mark_type) = schema.mark(name) else {
                        continue;
                    };
                    let ctx = MarkContext {
                        name,
                        options,
                        schema: schema.as_ref(),
                        mark_type,
                    };
                    for (command, factory) in m.bind_commands(&ctx) {
                        commands.register(name, command, factory);
                    }
                    rules.add_input(m.bind_input_rules(&ctx));
                    rules.add_paste(m.bind_paste_rules(&ctx));
                    for (chord, handler) in m.bind_keys(&ctx) {
                        keymap.bind(name, &chord, handler).map_err(|_| {
                            ConfigError::InvalidChord {
                                extension: name.to_owned(),
                                chord,
                            }
                        })?;
                    }
                    plugins.extend(m.bind_plugins(&ctx).into_iter().map(Arc::new));
                }
            }
        }

        let doc = match &content {
            Some(html) => parse_document(html, &schema)?,
            None => Node::doc(Vec::new()),
        };
        let doc = with_fallback_block(doc, &schema);

        Ok(Editor::from_parts(schema, doc, commands, rules, keymap, plugins))
    }
}
