use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::search::RetrievedDocument;

/// One message of prior conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[cfg(test)]
impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// An element of the agent's `input.context` list.
///
/// Structured turns and documents are serialized by their declared fields;
/// anything else is forwarded untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextItem {
    Turn(ChatTurn),
    Document(RetrievedDocument),
    Raw(Map<String, Value>),
}

impl ContextItem {
    /// Convert to the plain key-value map sent upstream.
    pub fn to_map(&self) -> Map<String, Value> {
        match self {
            ContextItem::Turn(turn) => {
                let mut map = Map::new();
                map.insert("role".to_string(), Value::String(turn.role.clone()));
                map.insert("content".to_string(), Value::String(turn.content.clone()));
                map
            }
            ContextItem::Document(doc) => {
                let mut map = Map::new();
                map.insert("title".to_string(), Value::String(doc.title.clone()));
                map.insert("content".to_string(), Value::String(doc.content.clone()));
                if let Some(url) = &doc.url {
                    map.insert("url".to_string(), Value::String(url.clone()));
                }
                map
            }
            ContextItem::Raw(map) => map.clone(),
        }
    }
}

impl From<ChatTurn> for ContextItem {
    fn from(turn: ChatTurn) -> Self {
        ContextItem::Turn(turn)
    }
}

/// Classify an inbound map by its exact shape.
///
/// Only a map holding nothing but string `role` and `content` is a turn, and
/// only string `title`/`content` with an optional string `url` is a document.
/// Extra keys or other value types keep the map raw so no field is lost.
impl From<Map<String, Value>> for ContextItem {
    fn from(map: Map<String, Value>) -> Self {
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);

        if map.len() == 2 {
            if let (Some(role), Some(content)) = (text("role"), text("content")) {
                return ContextItem::Turn(ChatTurn { role, content });
            }
        }

        let has_url = map.contains_key("url");
        if map.len() == 2 + usize::from(has_url) {
            if let (Some(title), Some(content)) = (text("title"), text("content")) {
                let url = text("url");
                if has_url == url.is_some() {
                    return ContextItem::Document(RetrievedDocument {
                        title,
                        content,
                        url,
                    });
                }
            }
        }

        ContextItem::Raw(map)
    }
}

impl<'de> Deserialize<'de> for ContextItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(ContextItem::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_turn_serializes_role_and_content_only() {
        let item = ContextItem::from(ChatTurn::new("user", "Hello"));
        assert_eq!(
            Value::Object(item.to_map()),
            json!({"role": "user", "content": "Hello"})
        );
    }

    #[test]
    fn test_document_without_url_omits_url_key() {
        let item = ContextItem::Document(RetrievedDocument {
            title: "Pricing".to_string(),
            content: "Plans start at 1 USD".to_string(),
            url: None,
        });
        assert_eq!(
            Value::Object(item.to_map()),
            json!({"title": "Pricing", "content": "Plans start at 1 USD"})
        );
    }

    #[test]
    fn test_raw_map_passes_through() {
        let raw = json!({"kind": "note", "weight": 3});
        assert_eq!(Value::Object(ContextItem::from(object(raw.clone())).to_map()), raw);
    }

    #[test]
    fn test_exact_turn_shape_is_a_turn() {
        let item: ContextItem = serde_json::from_value(json!({"role": "user", "content": "hi"})).unwrap();
        assert_eq!(item, ContextItem::Turn(ChatTurn::new("user", "hi")));
    }

    #[test]
    fn test_turn_with_extra_key_stays_raw() {
        let raw = json!({"role": "user", "content": "hi", "name": "bob"});
        let item: ContextItem = serde_json::from_value(raw.clone()).unwrap();

        assert!(matches!(item, ContextItem::Raw(_)));
        assert_eq!(Value::Object(item.to_map()), raw);
    }

    #[test]
    fn test_non_string_role_stays_raw() {
        let raw = json!({"role": 1, "content": "hi"});
        let item: ContextItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(item, ContextItem::Raw(object(raw)));
    }

    #[test]
    fn test_document_shapes() {
        let item: ContextItem =
            serde_json::from_value(json!({"title": "T", "content": "C", "url": "https://a"})).unwrap();
        assert_eq!(
            item,
            ContextItem::Document(RetrievedDocument {
                title: "T".to_string(),
                content: "C".to_string(),
                url: Some("https://a".to_string()),
            })
        );

        let item: ContextItem = serde_json::from_value(json!({"title": "T", "content": "C"})).unwrap();
        assert!(matches!(item, ContextItem::Document(RetrievedDocument { url: None, .. })));

        let raw = json!({"title": "T", "content": "C", "url": null});
        let item: ContextItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(Value::Object(item.to_map()), raw);
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(serde_json::from_value::<ContextItem>(json!("plain text")).is_err());
    }
}
