// Debug provider payloads - per-source status, error and free-form data
use crate::debug_render::plain_string;
use crate::payload::{check_provider_error, PayloadError};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// One upstream source's outcome. `data` has no fixed schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResult {
    pub status: Option<String>,
    pub error: Option<String>,
    pub data: Option<Value>,
}

impl SourceResult {
    /// Tolerant of whatever the provider sends: non-string statuses and errors
    /// are stringified, and a bare value is treated as the source's data.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self {
                status: None,
                error: None,
                data: Some(value),
            };
        };

        let status = fields
            .remove("status")
            .and_then(text_field)
            .filter(|s| !s.is_empty());
        let error = fields
            .remove("error")
            .and_then(text_field)
            .filter(|e| !e.is_empty());
        let data = fields.remove("data");

        Self {
            status,
            error,
            data,
        }
    }
}

fn text_field(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(plain_string(&other)),
    }
}

/// Multi-source diagnostic response for one player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugPayload {
    pub player_name: Option<String>,
    pub player_id: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
    pub sources: Vec<(String, SourceResult)>,
}

impl DebugPayload {
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        check_provider_error(&value)?;
        let Value::Object(mut fields) = value else {
            return Err(PayloadError::Shape(
                "debug payload must be a JSON object".to_string(),
            ));
        };

        let sources = match fields.remove("data_sources") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(map)) => map
                .into_iter()
                .map(|(name, v)| (name, SourceResult::from_value(v)))
                .collect(),
            Some(_) => {
                return Err(PayloadError::Shape(
                    "data_sources must be an object keyed by source".to_string(),
                ))
            }
        };
        debug!("Debug payload carries {} sources", sources.len());

        Ok(Self {
            player_name: fields.remove("player_name").and_then(text_field),
            player_id: fields.remove("player_id").and_then(text_field),
            position: fields.remove("position").and_then(text_field),
            team: fields.remove("team").and_then(text_field),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload_in_source_order() {
        let payload = DebugPayload::from_value(json!({
            "player_id": 1628973,
            "player_name": "Jalen Brunson",
            "position": "PG",
            "team": "NYK",
            "data_sources": {
                "nba_api_per_game": {"status": "OK", "data": {"pts": 28.7}},
                "shotdetail_csv": {"status": "NO_DATA", "data": {}},
                "player_info": {"status": "FAILED", "error": "timeout", "data": {}}
            }
        }))
        .unwrap();

        assert_eq!(payload.player_id.as_deref(), Some("1628973"));
        let names: Vec<_> = payload.sources.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["nba_api_per_game", "shotdetail_csv", "player_info"]);
        assert_eq!(payload.sources[2].1.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_source_result_is_tolerant() {
        let odd = SourceResult::from_value(json!({"status": 503, "error": ""}));
        assert_eq!(odd.status.as_deref(), Some("503"));
        assert!(odd.error.is_none());
        assert!(odd.data.is_none());

        let blank = SourceResult::from_value(json!({"status": "", "data": {"a": 1}}));
        assert!(blank.status.is_none());

        let bare = SourceResult::from_value(json!([1, 2, 3]));
        assert!(bare.status.is_none());
        assert_eq!(bare.data, Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_missing_sources_is_empty() {
        let payload = DebugPayload::from_value(json!({"player_name": "X"})).unwrap();
        assert!(payload.sources.is_empty());
        assert!(payload.team.is_none());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(matches!(
            DebugPayload::from_value(json!({"data_sources": [1, 2]})),
            Err(PayloadError::Shape(_))
        ));
        assert!(matches!(
            DebugPayload::from_value(json!("nope")),
            Err(PayloadError::Shape(_))
        ));
        assert!(matches!(
            DebugPayload::from_value(json!({"error": "rate limited"})),
            Err(PayloadError::Provider(_))
        ));
    }
}
