use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Write;

/// A single news item as supplied by the host. The overlay never mutates one;
/// it only swaps the whole collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Article {
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub headline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub submitted_at: Option<Timestamp>,
}

/// Integer ids, also accepted as integral floats or numeric strings.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    let id = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| serde::de::Error::custom(format!("unusable article id: {}", value)))
}

/// Text fields: numbers are shown as written, any other type reads as absent.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(Timestamp::Text(s)),
        Value::Number(n) => n.as_f64().map(Timestamp::Millis),
        _ => None,
    })
}

/// Submission time as the host sends it: either text (ISO-8601 or a SQL
/// `YYYY-MM-DD HH:MM:SS` column) or epoch milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    Millis(f64),
    Text(String),
}

impl Timestamp {
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        match self {
            Timestamp::Millis(ms) if ms.is_finite() => {
                Local.timestamp_millis_opt(*ms as i64).single()
            }
            Timestamp::Millis(_) => None,
            Timestamp::Text(raw) => {
                let raw = raw.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                    return Some(dt.with_timezone(&Local));
                }
                if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
                    return Local.from_local_datetime(&naive).earliest();
                }
                if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
                    return Local.from_local_datetime(&naive).earliest();
                }
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            }
        }
    }
}

impl Article {
    pub fn headline(&self) -> Option<&str> {
        non_empty(self.headline.as_deref())
    }

    pub fn content(&self) -> Option<&str> {
        non_empty(self.content.as_deref())
    }

    pub fn image_url(&self) -> Option<&str> {
        non_empty(self.image_url.as_deref())
    }

    pub fn author_name(&self) -> Option<&str> {
        non_empty(self.author_name.as_deref())
    }

    /// Submission date rendered with `format`, or `None` when absent,
    /// unparseable, or when `format` itself is not a valid strftime string.
    pub fn formatted_date(&self, format: &str) -> Option<String> {
        let dt = self.submitted_at.as_ref().and_then(Timestamp::to_local)?;
        let mut out = String::new();
        write!(out, "{}", dt.format(format)).ok()?;
        Some(out)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Lenient conversion of an `articles` payload. Anything that is not an array
/// yields an empty list. Fields of the wrong type read as absent; only
/// elements without a usable id are skipped.
pub fn parse_articles(value: &serde_json::Value) -> Vec<Article> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            tracing::debug!("articles payload is not an array, treating as empty");
        }
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match Article::deserialize(item) {
            Ok(article) => Some(article),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed article");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_article() {
        let articles = parse_articles(&json!([{
            "id": 7,
            "headline": "Gold found",
            "content": "Near the river",
            "image_url": "https://example.com/a.png",
            "author_name": "Arthur",
            "submitted_at": "2024-03-01 12:00:00"
        }]));
        assert_eq!(articles.len(), 1);
        let a = &articles[0];
        assert_eq!(a.id, 7);
        assert_eq!(a.headline(), Some("Gold found"));
        assert_eq!(a.author_name(), Some("Arthur"));
        assert!(a.submitted_at.is_some());
    }

    #[test]
    fn test_non_array_payload_is_empty() {
        assert!(parse_articles(&json!(null)).is_empty());
        assert!(parse_articles(&json!({"id": 1})).is_empty());
        assert!(parse_articles(&json!("nope")).is_empty());
    }

    #[test]
    fn test_malformed_elements_skipped() {
        let articles = parse_articles(&json!([
            {"id": 1, "headline": "ok"},
            "garbage",
            {"headline": "no id"},
            {"id": 2, "headline": null, "content": null}
        ]));
        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(articles[1].headline(), None);
    }

    #[test]
    fn test_empty_strings_read_as_absent() {
        let articles = parse_articles(&json!([{"id": 1, "headline": "", "author_name": ""}]));
        assert_eq!(articles[0].headline(), None);
        assert_eq!(articles[0].author_name(), None);
    }

    #[test]
    fn test_timestamp_forms() {
        let iso = Timestamp::Text("2024-03-01T12:00:00Z".to_string());
        let sql = Timestamp::Text("2024-03-01 12:00:00".to_string());
        let date = Timestamp::Text("2024-03-01".to_string());
        let millis = Timestamp::Millis(1_709_294_400_000.0);
        let bad = Timestamp::Text("yesterday".to_string());
        assert!(iso.to_local().is_some());
        assert!(sql.to_local().is_some());
        assert!(date.to_local().is_some());
        assert!(millis.to_local().is_some());
        assert!(bad.to_local().is_none());
    }

    #[test]
    fn test_odd_field_types_keep_the_article() {
        let articles = parse_articles(&json!([
            {"id": 1},
            {"id": 2, "submitted_at": true},
            {"id": "3", "headline": "string id"},
            {"id": 4, "author_name": 5, "headline": {"nested": 1}, "image_url": []},
            {"id": "x"},
            {"id": 6.0, "submitted_at": 1_709_294_400_000_i64}
        ]));
        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 6]);
        assert_eq!(articles[1].submitted_at, None);
        assert_eq!(articles[2].headline(), Some("string id"));
        assert_eq!(articles[3].author_name(), Some("5"));
        assert_eq!(articles[3].headline(), None);
        assert_eq!(articles[3].image_url(), None);
        assert!(articles[4].submitted_at.is_some());
    }

    #[test]
    fn test_invalid_date_format_yields_none() {
        let articles = parse_articles(&json!([{"id": 1, "submitted_at": "2024-03-01 12:00:00"}]));
        assert_eq!(articles[0].formatted_date("%Q"), None);
    }

    #[test]
    fn test_formatted_date_uses_format() {
        let articles = parse_articles(&json!([{"id": 1, "submitted_at": "2024-03-01 12:00:00"}]));
        assert_eq!(articles[0].formatted_date("%Y-%m-%d").as_deref(), Some("2024-03-01"));
    }
}
