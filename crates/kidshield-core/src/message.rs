//! Wire types for the analyzer and assistant endpoints.
//!
//! Request bodies are parsed from a loose [`serde_json::Value`] rather than a
//! derived struct: clients send either `text` or `message`, and the metadata
//! fields are opaque JSON that must be echoed back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::verdict::Verdict;

/// Sender reported when the client omits one.
pub const UNKNOWN_SENDER: &str = "unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("JSON body required")]
    BodyRequired,
    #[error("Missing 'text' field")]
    MissingText,
    #[error("Query text required")]
    MissingQuery,
}

/// Inbound message to analyze.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub text: String,
    pub sender: Value,
    pub id: Value,
    pub timestamp: Value,
}

impl AnalysisRequest {
    /// Parse a request body. `None` means the body was absent or not JSON.
    pub fn from_json(body: Option<&Value>) -> Result<Self, RequestError> {
        let obj = match body {
            Some(Value::Object(map)) if !map.is_empty() => map,
            _ => return Err(RequestError::BodyRequired),
        };

        let text = ["text", "message"]
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .ok_or(RequestError::MissingText)?
            .to_string();

        let sender = obj
            .get("sender")
            .cloned()
            .unwrap_or_else(|| Value::String(UNKNOWN_SENDER.to_string()));

        Ok(Self {
            text,
            sender,
            id: obj.get("id").cloned().unwrap_or(Value::Null),
            timestamp: obj.get("timestamp").cloned().unwrap_or(Value::Null),
        })
    }

    /// Attach pass-through metadata to a verdict.
    pub fn respond(self, verdict: Verdict) -> AnalysisResponse {
        AnalysisResponse {
            verdict,
            id: self.id,
            sender: self.sender,
            timestamp: self.timestamp,
        }
    }
}

/// Verdict plus the request's pass-through metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub id: Value,
    pub sender: Value,
    pub timestamp: Value,
}

/// Inbound assistant question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    /// Parse a request body; the query is trimmed and must be non-empty.
    pub fn from_json(body: Option<&Value>) -> Result<Self, RequestError> {
        let obj = match body {
            Some(Value::Object(map)) => map,
            _ => return Err(RequestError::BodyRequired),
        };

        let query = obj
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or(RequestError::MissingQuery)?;

        Ok(Self {
            query: query.to_string(),
        })
    }
}

/// Assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub query: String,
    pub context: String,
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_field() {
        let body = json!({"text": "hi", "sender": "mum", "id": 7, "timestamp": "2025-01-01"});
        let req = AnalysisRequest::from_json(Some(&body)).unwrap();
        assert_eq!(req.text, "hi");
        assert_eq!(req.sender, json!("mum"));
        assert_eq!(req.id, json!(7));
        assert_eq!(req.timestamp, json!("2025-01-01"));
    }

    #[test]
    fn falls_back_to_message_field() {
        let body = json!({"message": "hello"});
        let req = AnalysisRequest::from_json(Some(&body)).unwrap();
        assert_eq!(req.text, "hello");
    }

    #[test]
    fn empty_text_falls_back_to_message() {
        let body = json!({"text": "", "message": "hello"});
        let req = AnalysisRequest::from_json(Some(&body)).unwrap();
        assert_eq!(req.text, "hello");
    }

    #[test]
    fn defaults_missing_metadata() {
        let body = json!({"text": "hi"});
        let req = AnalysisRequest::from_json(Some(&body)).unwrap();
        assert_eq!(req.sender, json!("unknown"));
        assert_eq!(req.id, Value::Null);
        assert_eq!(req.timestamp, Value::Null);
    }

    #[test]
    fn rejects_missing_body() {
        assert_eq!(
            AnalysisRequest::from_json(None),
            Err(RequestError::BodyRequired)
        );
        assert_eq!(
            AnalysisRequest::from_json(Some(&json!({}))),
            Err(RequestError::BodyRequired)
        );
        assert_eq!(
            AnalysisRequest::from_json(Some(&json!([1, 2]))),
            Err(RequestError::BodyRequired)
        );
    }

    #[test]
    fn rejects_missing_or_empty_text() {
        for body in [
            json!({"sender": "x"}),
            json!({"text": ""}),
            json!({"text": 42}),
            json!({"text": null, "message": ""}),
        ] {
            assert_eq!(
                AnalysisRequest::from_json(Some(&body)),
                Err(RequestError::MissingText),
                "{body}"
            );
        }
    }

    #[test]
    fn response_flattens_verdict() {
        let req = AnalysisRequest::from_json(Some(&json!({"text": "hi", "id": "m1"}))).unwrap();
        let resp = req.respond(Verdict::degraded());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["flag"], 0);
        assert_eq!(json["tox_label"], "error");
        assert_eq!(json["id"], "m1");
        assert_eq!(json["sender"], "unknown");
        assert!(json["timestamp"].is_null());
    }

    #[test]
    fn query_is_trimmed() {
        let req = QueryRequest::from_json(Some(&json!({"query": "  screen time?  "}))).unwrap();
        assert_eq!(req.query, "screen time?");
    }

    #[test]
    fn blank_query_rejected() {
        for body in [json!({}), json!({"query": "   "}), json!({"query": 3})] {
            assert_eq!(
                QueryRequest::from_json(Some(&body)),
                Err(RequestError::MissingQuery)
            );
        }
        assert_eq!(QueryRequest::from_json(None), Err(RequestError::BodyRequired));
    }
}
