//! Built-in commands registered before any extension binds.
//!
//! Extensions build on these through [`CommandScope::run`] — `codeBlock`
//! composes `toggleBlockType`, `link` composes `updateMark` / `removeMark`.
//! They live under the reserved contributor name `core`, and an extension
//! re-registering one of these names replaces it.

use serde_json::{json, Value};

use crate::model::{Attrs, Mark};

use super::{BoxedCommand, CommandFactory, CommandRegistry, CommandScope};

const CORE: &str = "core";

pub(crate) fn register_base_commands(registry: &mut CommandRegistry) {
    registry.register(CORE, "insertText".into(), insert_text());
    registry.register(CORE, "removeMark".into(), remove_mark());
    registry.register(CORE, "updateMark".into(), update_mark());
    registry.register(CORE, "toggleMark".into(), toggle_mark());
    registry.register(CORE, "setBlockType".into(), set_block_type());
    registry.register(CORE, "toggleBlockType".into(), toggle_block_type());
}

fn arg_str(args: &Value, key: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn arg_attrs(args: &Value) -> Attrs {
    args.get("attrs")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// `{"text": …}` — insert at the caret, replacing a non-empty selection.
/// Inserted text carries the marks typing would inherit there.
fn insert_text() -> CommandFactory {
    Box::new(|args| {
        let text = arg_str(args, "text");
        Box::new(move |scope: &mut CommandScope| {
            if text.is_empty() {
                return false;
            }
            let sel = scope.selection();
            if !sel.is_caret() {
                scope.tr().delete_range(sel.block, sel.from(), sel.to());
            }
            let at = scope.selection().from();
            let marks = scope.tr().typing_marks(sel.block, at);
            scope.tr().insert_text(sel.block, at, &text, &marks)
        }) as BoxedCommand
    })
}

/// `{"mark": …}` — remove the mark over the selection; with a caret, over
/// the contiguous marked span touching it.
fn remove_mark() -> CommandFactory {
    Box::new(|args| {
        let mark_name = arg_str(args, "mark");
        Box::new(move |scope: &mut CommandScope| {
            if mark_name.is_empty() {
                return false;
            }
            let sel = scope.selection();
            let range = if sel.is_caret() {
                scope
                    .current_block()
                    .and_then(|b| b.mark_span(sel.head, &mark_name))
            } else {
                Some((sel.from(), sel.to()))
            };
            let Some((from, to)) = range else {
                return false;
            };
            scope.tr().remove_mark(sel.block, from, to, &mark_name)
        }) as BoxedCommand
    })
}

/// `{"mark": …, "attrs": …}` — apply the mark over the selection, or merge
/// attributes into an existing mark. With a caret the existing mark's
/// contiguous span is the target; a caret with no existing mark is a no-op.
fn update_mark() -> CommandFactory {
    Box::new(|args| {
        let mark_name = arg_str(args, "mark");
        let given = arg_attrs(args);
        Box::new(move |scope: &mut CommandScope| {
            if mark_name.is_empty() {
                return false;
            }
            let Some(mark_type) = scope.schema().mark(&mark_name) else {
                log::error!("updateMark: unknown mark type `{mark_name}`");
                return false;
            };
            let mut attrs = mark_type.default_attrs();

            let sel = scope.selection();
            let target = {
                let Some(node) = scope.current_block() else {
                    return false;
                };
                if sel.is_caret() {
                    node.mark_span(sel.head, &mark_name).map(|span| (span, span.0))
                } else {
                    Some(((sel.from(), sel.to()), sel.from()))
                }
            };
            let Some(((from, to), probe)) = target else {
                return false;
            };
            if from >= to {
                return false;
            }

            let existing = scope
                .current_block()
                .and_then(|b| b.marks_at(probe).into_iter().find(|m| m.type_name == mark_name));
            if let Some(mark) = existing {
                for (k, v) in mark.attrs {
                    attrs.insert(k, v);
                }
            }
            for (k, v) in &given {
                attrs.insert(k.clone(), v.clone());
            }

            scope
                .tr()
                .add_mark(sel.block, from, to, Mark::with_attrs(mark_name.clone(), attrs))
        }) as BoxedCommand
    })
}

/// `{"mark": …, "attrs": …}` — remove where present, apply where absent.
fn toggle_mark() -> CommandFactory {
    Box::new(|args| {
        let mark_name = arg_str(args, "mark");
        let given = arg_attrs(args);
        Box::new(move |scope: &mut CommandScope| {
            if mark_name.is_empty() {
                return false;
            }
            let sel = scope.selection();
            let present = {
                let Some(node) = scope.current_block() else {
                    return false;
                };
                if sel.is_caret() {
                    node.mark_span(sel.head, &mark_name).is_some()
                } else {
                    node.marks_at(sel.from())
                        .iter()
                        .any(|m| m.type_name == mark_name)
                }
            };
            if present {
                scope.run("removeMark", json!({ "mark": mark_name }))
            } else {
                scope.run(
                    "updateMark",
                    json!({ "mark": mark_name, "attrs": given.clone() }),
                )
            }
        }) as BoxedCommand
    })
}

/// `{"type": …, "attrs": …}` — convert the current block.
fn set_block_type() -> CommandFactory {
    Box::new(|args| {
        let type_name = arg_str(args, "type");
        let attrs = arg_attrs(args);
        Box::new(move |scope: &mut CommandScope| {
            if type_name.is_empty() {
                return false;
            }
            let block = scope.selection().block;
            scope.tr().set_block_type(block, &type_name, attrs.clone())
        }) as BoxedCommand
    })
}

/// `{"type": …, "toggle_to": …, "attrs": …}` — convert to `type`, or back
/// to `toggle_to` when the block already is `type`.
fn toggle_block_type() -> CommandFactory {
    Box::new(|args| {
        let type_name = arg_str(args, "type");
        let toggle_to = arg_str(args, "toggle_to");
        let attrs = arg_attrs(args);
        Box::new(move |scope: &mut CommandScope| {
            if type_name.is_empty() || toggle_to.is_empty() {
                return false;
            }
            let Some(current) = scope.current_block().map(|b| b.type_name.clone()) else {
                return false;
            };
            if current == type_name {
                scope.run("setBlockType", json!({ "type": toggle_to }))
            } else {
                scope.run(
                    "setBlockType",
                    json!({ "type": type_name, "attrs": attrs.clone() }),
                )
            }
        }) as BoxedCommand
    })
}
