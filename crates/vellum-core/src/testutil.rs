//! Shared fixtures for module tests: a small hand-built schema and states.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{Attrs, Node};
use crate::schema::{
    AttributeSpec, AttributeSpecs, ContentExpr, MarkType, MarksPolicy, NodeType, Schema,
};
use crate::state::EditorState;

pub(crate) fn node_type(
    name: &str,
    content: Option<&str>,
    marks: MarksPolicy,
    textblock: bool,
    attrs: AttributeSpecs,
) -> NodeType {
    NodeType {
        name: name.into(),
        extension: name.into(),
        content: content.map(|c| ContentExpr::parse(c).expect("content")),
        marks,
        group: None,
        code: false,
        defining: false,
        draggable: false,
        textblock,
        attrs,
        parse_rules: Vec::new(),
        render: None,
    }
}

/// doc / paragraph / text plus a markless `code_block` (with a `language`
/// attribute) and a non-inclusive `link` mark (href/target attributes).
pub(crate) fn test_schema() -> Arc<Schema> {
    let mut nodes = IndexMap::new();
    nodes.insert(
        "doc".to_string(),
        node_type(
            "doc",
            Some("block+"),
            MarksPolicy::Default,
            false,
            AttributeSpecs::new(),
        ),
    );
    nodes.insert(
        "paragraph".to_string(),
        node_type(
            "paragraph",
            Some("inline*"),
            MarksPolicy::Default,
            true,
            AttributeSpecs::new(),
        ),
    );
    nodes.insert(
        "text".to_string(),
        node_type(
            "text",
            None,
            MarksPolicy::Default,
            false,
            AttributeSpecs::new(),
        ),
    );
    let mut cb_attrs = AttributeSpecs::new();
    cb_attrs.insert("language".to_string(), AttributeSpec::default());
    let mut code_block = node_type(
        "code_block",
        Some("text*"),
        MarksPolicy::None,
        true,
        cb_attrs,
    );
    code_block.code = true;
    nodes.insert("code_block".to_string(), code_block);

    let mut link_attrs = AttributeSpecs::new();
    link_attrs.insert("href".to_string(), AttributeSpec::default());
    link_attrs.insert("target".to_string(), AttributeSpec::default());
    let mut marks = IndexMap::new();
    marks.insert(
        "link".to_string(),
        MarkType {
            name: "link".into(),
            extension: "link".into(),
            inclusive: false,
            attrs: link_attrs,
            parse_rules: Vec::new(),
            render: None,
        },
    );

    Arc::new(Schema {
        nodes,
        marks,
        top: "doc".to_string(),
    })
}

/// One-paragraph document with the given text and a caret at 0.
pub(crate) fn state_with(text: &str) -> EditorState {
    let block = Node::element(
        "paragraph",
        Attrs::new(),
        if text.is_empty() {
            vec![]
        } else {
            vec![Node::text_run(text, vec![])]
        },
    );
    EditorState::new(Node::doc(vec![block]))
}
