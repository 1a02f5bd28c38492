use crate::article::{parse_articles, Article};
use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw envelope as it arrives from the host.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    msg_type: String,
    #[serde(default)]
    articles: serde_json::Value,
}

/// Inbound host message, dispatched on the `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Open { articles: Vec<Article> },
    Update { articles: Vec<Article> },
    Hide,
    /// Any other `type`; carried so it can be logged, otherwise ignored.
    Unknown(String),
}

impl InboundMessage {
    /// Decode a JSON text frame. Only non-JSON text is an error; a missing or
    /// malformed `articles` field decodes as an empty list.
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).context("inbound message is not JSON")?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        let envelope = match Envelope::deserialize(value) {
            Ok(env) => env,
            Err(_) => {
                return InboundMessage::Unknown(String::new());
            }
        };

        match envelope.msg_type.as_str() {
            "open" | "openNewspaper" => InboundMessage::Open {
                articles: parse_articles(&envelope.articles),
            },
            "update" | "updateArticles" => InboundMessage::Update {
                articles: parse_articles(&envelope.articles),
            },
            "hide" | "hideNewspaper" => InboundMessage::Hide,
            other => InboundMessage::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_with_articles() {
        let msg = InboundMessage::parse(
            r#"{"type":"open","articles":[{"id":1,"headline":"A"},{"id":2,"headline":"B"}]}"#,
        )
        .unwrap();
        match msg {
            InboundMessage::Open { articles } => assert_eq!(articles.len(), 2),
            other => panic!("expected open, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_type_names() {
        assert!(matches!(
            InboundMessage::parse(r#"{"type":"openNewspaper"}"#).unwrap(),
            InboundMessage::Open { .. }
        ));
        assert!(matches!(
            InboundMessage::parse(r#"{"type":"updateArticles","articles":[]}"#).unwrap(),
            InboundMessage::Update { .. }
        ));
        assert_eq!(
            InboundMessage::parse(r#"{"type":"hideNewspaper"}"#).unwrap(),
            InboundMessage::Hide
        );
    }

    #[test]
    fn test_missing_articles_is_empty() {
        let msg = InboundMessage::parse(r#"{"type":"open"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Open { articles: vec![] });
    }

    #[test]
    fn test_articles_not_a_sequence_is_empty() {
        let msg = InboundMessage::parse(r#"{"type":"update","articles":"oops"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Update { articles: vec![] });
    }

    #[test]
    fn test_unknown_type() {
        let msg = InboundMessage::parse(r#"{"type":"dance"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown("dance".to_string()));
    }

    #[test]
    fn test_non_object_json_is_unknown() {
        let msg = InboundMessage::parse("[1,2,3]").unwrap();
        assert_eq!(msg, InboundMessage::Unknown(String::new()));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(InboundMessage::parse("not json").is_err());
    }
}
