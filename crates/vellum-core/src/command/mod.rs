//! Command registry and composition.
//!
//! Commands live in one flat, insertion-ordered namespace. Each entry is a
//! factory: given JSON arguments it builds a closure that runs against a
//! [`CommandScope`] and reports whether it applied. A command body can
//! invoke other commands by name through the scope, so extensions compose
//! without importing each other.
//!
//! Re-registering a name overwrites the earlier entry. That is the declared
//! integration point — extensions replace built-ins on purpose — so it logs
//! at debug level only, unlike key shadowing.

mod base;

pub(crate) use base::register_base_commands;

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::model::Mark;
use crate::schema::Schema;
use crate::state::{Selection, Transaction};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
}

/// A built command, ready to run against a scope.
pub type BoxedCommand = Box<dyn Fn(&mut CommandScope) -> bool>;

/// Builds a command from invocation arguments.
pub type CommandFactory = Box<dyn Fn(&Value) -> BoxedCommand>;

/// A registered command: name, contributing extension, factory.
pub struct CommandDefinition {
    name: String,
    extension: String,
    factory: CommandFactory,
}

impl CommandDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the extension that registered this command.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub(crate) fn build(&self, args: &Value) -> BoxedCommand {
        (self.factory)(args)
    }
}

/// The flat command namespace, in registration order.
#[derive(Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, Arc<CommandDefinition>>,
}

impl CommandRegistry {
    pub(crate) fn register(&mut self, extension: &str, name: String, factory: CommandFactory) {
        if let Some(prev) = self.commands.get(&name) {
            log::debug!(
                "command `{name}` from `{}` overwritten by `{extension}`",
                prev.extension
            );
        }
        let definition = CommandDefinition {
            name: name.clone(),
            extension: extension.to_owned(),
            factory,
        };
        self.commands.insert(name, Arc::new(definition));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CommandDefinition>> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Command names in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// What a running command sees: the speculative transaction plus the
/// registry for by-name dispatch.
pub struct CommandScope<'a> {
    tr: &'a mut Transaction,
    registry: &'a CommandRegistry,
}

impl<'a> CommandScope<'a> {
    pub(crate) fn new(tr: &'a mut Transaction, registry: &'a CommandRegistry) -> Self {
        Self { tr, registry }
    }

    pub fn tr(&mut self) -> &mut Transaction {
        self.tr
    }

    pub fn schema(&self) -> &Schema {
        self.tr.schema()
    }

    pub fn selection(&self) -> Selection {
        self.tr.selection()
    }

    /// Read view of the block the selection lives in.
    pub fn current_block(&self) -> Option<&crate::model::Node> {
        self.tr.current_block()
    }

    /// Marks typed text would carry at the current caret.
    pub fn typing_marks(&self) -> Vec<Mark> {
        let sel = self.tr.selection();
        self.tr.typing_marks(sel.block, sel.from())
    }

    /// Invoke another command by name against the same transaction. An
    /// unknown name logs and evaluates to `false`; inside a composition
    /// that is a local non-application, not a fatal error.
    pub fn run(&mut self, name: &str, args: Value) -> bool {
        let Some(definition) = self.registry.get(name).cloned() else {
            log::error!("unknown command `{name}` invoked from a command body");
            return false;
        };
        let command = definition.build(&args);
        command(self)
    }
}
