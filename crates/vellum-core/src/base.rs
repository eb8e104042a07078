//! The three extensions every editor registers: the `doc` top node, the
//! `paragraph` textblock, and the `text` inline leaf.
//!
//! They are plain [`NodeExtension`] values, not special cases; the schema
//! builder only knows `doc` and `text` as reserved names that may omit a
//! render template.

use serde_json::json;

use crate::command::{CommandFactory, CommandScope};
use crate::dom::DomTemplate;
use crate::extension::NodeExtension;
use crate::schema::{NodeSpec, ParseRule};

/// The document top node: one or more blocks.
pub fn document() -> NodeExtension {
    NodeExtension::new("doc").schema(|_| NodeSpec::new().content("block+"))
}

/// The default textblock. Contributes a `paragraph` command converting the
/// current block back to a paragraph.
pub fn paragraph() -> NodeExtension {
    NodeExtension::new("paragraph")
        .schema(|_| {
            NodeSpec::new()
                .content("inline*")
                .group("block")
                .draggable(false)
                .parse_rule(ParseRule::tag("p"))
                .render(|_| DomTemplate::node("p", vec![DomTemplate::Hole]))
        })
        .commands(|ctx| {
            let type_name = ctx.name.to_owned();
            let factory: CommandFactory = Box::new(move |args| {
                let args = args.clone();
                let type_name = type_name.clone();
                Box::new(move |scope: &mut CommandScope| {
                    scope.run("setBlockType", json!({ "type": type_name, "attrs": args }))
                })
            });
            vec![("paragraph".to_owned(), factory)]
        })
}

/// The inline text leaf.
pub fn text() -> NodeExtension {
    NodeExtension::new("text").schema(|_| NodeSpec::new().group("inline"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::to_html_fragment;
    use crate::extension::{ConfigContext, Extension};
    use crate::schema::{parse_document, serialize_document, Schema, SchemaBuilder};

    fn base_schema() -> Schema {
        let mut builder = SchemaBuilder::new();
        for ext in [document(), paragraph(), text()] {
            let ext: Extension = ext.into();
            let options = ext.resolved_options();
            let ctx = ConfigContext {
                name: ext.name(),
                options: &options,
            };
            match &ext {
                Extension::Node(n) => {
                    builder.add_node(ext.name(), n.build_schema(&ctx), n.build_attributes(&ctx));
                }
                Extension::Mark(m) => {
                    builder.add_mark(ext.name(), m.build_schema(&ctx), m.build_attributes(&ctx));
                }
            }
        }
        builder.finish().expect("base schema")
    }

    #[test]
    fn base_extensions_compose_into_a_schema() {
        let schema = base_schema();
        assert_eq!(schema.top_node(), "doc");
        assert!(schema.node("paragraph").expect("paragraph").is_textblock());
        assert!(!schema.node("doc").expect("doc").is_textblock());
        assert_eq!(schema.node("text").expect("text").group(), Some("inline"));
    }

    #[test]
    fn paragraph_round_trips_through_html() {
        let schema = base_schema();
        let doc = parse_document("<p>plain text</p>", &schema).expect("parse");
        assert_eq!(
            to_html_fragment(&serialize_document(&doc, &schema)),
            "<p>plain text</p>"
        );
    }
}
