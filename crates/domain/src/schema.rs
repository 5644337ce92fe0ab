//! Declarative screen schema
//!
//! A `ScreenSchema` is the server's description of one screen: document metadata
//! plus a screen definition whose sections hold `SchemaNode` trees. Nodes are plain
//! values (no parent links), so a tree is acyclic and can be shared immutably.
//!
//! Decoding is lenient per node: a child or section that fails to decode becomes a
//! fallback node carrying the raw JSON, instead of failing the whole screen.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::action::UiAction;
use crate::action_parser::parse_action;

/// Ordered JSON object used for node properties, styles, and references.
pub type JsonObject = Map<String, Value>;

/// `type` assigned to nodes that could not be decoded.
pub const FALLBACK_NODE_TYPE: &str = "fallback";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSchema {
    pub document: DocumentMeta,
    pub screen: ScreenDefinition,
}

/// Export metadata of the design document the screen came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub document_id: String,
    pub name: String,
    pub exported_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub screen_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub style: JsonObject,
    #[serde(default)]
    pub sections: ScreenSections,
    #[serde(default)]
    pub references: JsonObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSections {
    #[serde(
        default,
        deserialize_with = "lenient_optional_node",
        skip_serializing_if = "Option::is_none"
    )]
    pub top_bar: Option<SchemaNode>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_node",
        skip_serializing_if = "Option::is_none"
    )]
    pub body: Option<SchemaNode>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_node",
        skip_serializing_if = "Option::is_none"
    )]
    pub bottom_bar: Option<SchemaNode>,
}

/// One element of the schema tree.
///
/// `node_type` selects the renderer; `children` order is rendering order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: JsonObject,
    #[serde(default)]
    pub style: JsonObject,
    #[serde(default, deserialize_with = "lenient_children")]
    pub children: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<JsonObject>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
}

impl ScreenSchema {
    /// Depth-first search across all sections, top bar first.
    pub fn find_node(&self, id: &str) -> Option<&SchemaNode> {
        self.screen.sections.iter().find_map(|root| root.find(id))
    }
}

impl ScreenSections {
    /// Present sections in layout order: top bar, body, bottom bar.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaNode> {
        [&self.top_bar, &self.body, &self.bottom_bar]
            .into_iter()
            .filter_map(Option::as_ref)
    }
}

impl SchemaNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Self::default()
        }
    }

    /// Placeholder for a node that failed to decode.
    ///
    /// The raw JSON and the decode error are kept in `properties` so a renderer
    /// can show something generic (or a debug overlay).
    pub fn fallback(raw: Value, reason: impl Into<String>) -> Self {
        let mut properties = JsonObject::new();
        properties.insert("raw".to_string(), raw);
        properties.insert("error".to_string(), Value::String(reason.into()));
        Self {
            node_type: FALLBACK_NODE_TYPE.to_string(),
            properties,
            ..Self::default()
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.node_type == FALLBACK_NODE_TYPE
    }

    /// Parse the embedded action, if any. Unparseable actions yield `None`.
    pub fn parsed_action(&self) -> Option<UiAction> {
        self.action
            .as_ref()
            .and_then(|action| parse_action(&Value::Object(action.clone())))
    }

    /// Scalar `content` rendered as text (strings verbatim, numbers and booleans formatted).
    pub fn content_text(&self) -> Option<String> {
        self.content.as_ref().and_then(scalar_text)
    }

    /// Scalar `data` rendered as text.
    pub fn data_text(&self) -> Option<String> {
        self.data.as_ref().and_then(scalar_text)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Visit this node and all descendants, depth-first in rendering order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SchemaNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn find(&self, id: &str) -> Option<&SchemaNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decode_node(raw: Value) -> SchemaNode {
    match serde_json::from_value::<SchemaNode>(raw.clone()) {
        Ok(node) => node,
        Err(e) => SchemaNode::fallback(raw, e.to_string()),
    }
}

fn lenient_children<'de, D>(deserializer: D) -> Result<Vec<SchemaNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(decode_node)
        .collect())
}

fn lenient_optional_node<'de, D>(deserializer: D) -> Result<Option<SchemaNode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|v| !v.is_null()).map(decode_node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema_json() -> Value {
        json!({
            "document": {
                "documentId": "doc-main",
                "name": "Main",
                "exportedAt": "2025-01-01T00:00:00Z"
            },
            "screen": {
                "id": "main",
                "type": "screen",
                "name": "Main screen",
                "sections": {
                    "topBar": {"type": "text", "content": "Top"},
                    "body": {
                        "type": "column",
                        "properties": {"spacing": 8, "align": "start"},
                        "children": [
                            {"id": "greeting", "type": "text", "content": "Hello"},
                            {
                                "id": "go",
                                "type": "button",
                                "content": "Action",
                                "action": {"type": "navigate", "screenId": "details"}
                            }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn decodes_document_and_sections() {
        let schema: ScreenSchema = serde_json::from_value(sample_schema_json()).unwrap();

        assert_eq!(schema.document.document_id, "doc-main");
        assert_eq!(schema.screen.screen_type, "screen");
        assert!(schema.screen.sections.bottom_bar.is_none());

        let body = schema.screen.sections.body.as_ref().unwrap();
        assert_eq!(body.node_type, "column");
        let ids: Vec<_> = body.children.iter().filter_map(|c| c.id.as_deref()).collect();
        assert_eq!(ids, vec!["greeting", "go"]);
    }

    #[test]
    fn properties_keep_wire_order() {
        let schema: ScreenSchema = serde_json::from_value(sample_schema_json()).unwrap();
        let body = schema.screen.sections.body.unwrap();
        let keys: Vec<_> = body.properties.keys().cloned().collect();
        assert_eq!(keys, vec!["spacing", "align"]);
    }

    #[test]
    fn embedded_action_is_parsed_on_demand() {
        let schema: ScreenSchema = serde_json::from_value(sample_schema_json()).unwrap();
        let button = schema.find_node("go").unwrap();

        match button.parsed_action() {
            Some(UiAction::Navigate(nav)) => {
                assert_eq!(nav.screen_id, "details");
                assert!(!nav.clear_stack);
            }
            other => panic!("expected navigate, got {:?}", other),
        }
        assert_eq!(button.content_text().as_deref(), Some("Action"));
    }

    #[test]
    fn bad_child_becomes_fallback_without_failing_tree() {
        let raw = json!({
            "type": "column",
            "children": [
                {"type": "text", "content": "ok"},
                {"content": "missing type"},
                {"type": "text", "children": "not a list"}
            ]
        });

        let node: SchemaNode = serde_json::from_value(raw).unwrap();

        assert_eq!(node.children.len(), 3);
        assert!(!node.children[0].is_fallback());
        assert!(node.children[1].is_fallback());
        assert!(node.children[2].is_fallback());
        assert_eq!(
            node.children[1].property("raw"),
            Some(&json!({"content": "missing type"}))
        );
    }

    #[test]
    fn bad_section_becomes_fallback() {
        let raw = json!({"body": {"children": []}});
        let sections: ScreenSections = serde_json::from_value(raw).unwrap();
        assert!(sections.body.unwrap().is_fallback());
        assert!(sections.top_bar.is_none());
    }

    #[test]
    fn walk_visits_in_rendering_order() {
        let schema: ScreenSchema = serde_json::from_value(sample_schema_json()).unwrap();
        let body = schema.screen.sections.body.unwrap();

        let mut seen = Vec::new();
        body.walk(&mut |node| seen.push(node.node_type.clone()));

        assert_eq!(seen, vec!["column", "text", "button"]);
    }
}
