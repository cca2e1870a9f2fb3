//! Message analyzer endpoints: `GET /health`, `POST /analyze`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use kidshield_core::{AnalysisRequest, AnalysisResponse, MessageAnalyzer};
use tracing::info;

use crate::{ApiError, health, parse_body};

#[derive(Clone)]
struct AnalyzerState {
    analyzer: Arc<dyn MessageAnalyzer>,
}

/// Router for the message analyzer service.
pub fn analyzer_router(analyzer: Arc<dyn MessageAnalyzer>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .with_state(AnalyzerState { analyzer })
}

async fn analyze(
    State(state): State<AnalyzerState>,
    body: Bytes,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let value = parse_body(&body);
    let request = AnalysisRequest::from_json(value.as_ref())
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    info!(text = %request.text, sender = %request.sender, "received message");

    let analyzer = Arc::clone(&state.analyzer);
    let text = request.text.clone();
    let assessment = tokio::task::spawn_blocking(move || analyzer.analyze(&text))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    if let kidshield_core::Assessment::Degraded { reason } = &assessment {
        info!(reason = %reason, "analysis degraded; returning safe default");
    }

    let response = request.respond(assessment.into_verdict());
    info!(
        flag = response.verdict.flag,
        label = %response.verdict.tox_label,
        "analysis complete"
    );
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{get, post, send};
    use axum::http::StatusCode;
    use kidshield_core::{Assessment, KeywordScreen};
    use serde_json::json;

    fn keyword_router() -> Router {
        analyzer_router(Arc::new(KeywordScreen::default()))
    }

    struct AlwaysDegraded;

    impl MessageAnalyzer for AlwaysDegraded {
        fn analyze(&self, _text: &str) -> Assessment {
            Assessment::degraded("classifier unavailable")
        }
    }

    struct Panicking;

    impl MessageAnalyzer for Panicking {
        fn analyze(&self, _text: &str) -> Assessment {
            panic!("inference crashed")
        }
    }

    #[tokio::test]
    async fn health_ok() {
        let (status, body) = send(keyword_router(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn threat_is_flagged() {
        let (status, body) = send(
            keyword_router(),
            post("/analyze", r#"{"text": "I will kill you", "sender": "+4412345", "id": "m-1", "timestamp": 1700000000}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flag"], 1);
        assert_eq!(body["tox_label"], "Toxic");
        assert_eq!(body["id"], "m-1");
        assert_eq!(body["sender"], "+4412345");
        assert_eq!(body["timestamp"], 1700000000);
        assert_eq!(body["similarity_score"], 0.0);
    }

    #[tokio::test]
    async fn greeting_is_safe() {
        let (status, body) = send(
            keyword_router(),
            post("/analyze", r#"{"text": "Hello how are you"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flag"], 0);
        assert_eq!(body["tox_label"], "Safe");
        assert_eq!(body["sender"], "unknown");
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn message_field_accepted() {
        let (status, body) = send(
            keyword_router(),
            post("/analyze", r#"{"message": "you are harami"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tox_label"], "Harassment");
    }

    #[tokio::test]
    async fn missing_text_is_400() {
        for payload in [r#"{"text": ""}"#, r#"{"sender": "x"}"#] {
            let (status, body) = send(keyword_router(), post("/analyze", payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
            assert_eq!(body["error"], "Missing 'text' field");
        }
    }

    #[tokio::test]
    async fn missing_body_is_400() {
        for payload in ["", "not json", "{}"] {
            let (status, body) = send(keyword_router(), post("/analyze", payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{payload:?}");
            assert_eq!(body["error"], "JSON body required");
        }
    }

    #[tokio::test]
    async fn degraded_analysis_is_still_200() {
        let router = analyzer_router(Arc::new(AlwaysDegraded));
        let (status, body) = send(router, post("/analyze", r#"{"text": "anything"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["flag"], 0);
        assert_eq!(body["tox_label"], "error");
        assert_eq!(body["tox_score"], 0.0);
    }

    #[tokio::test]
    async fn crashed_analysis_is_500() {
        let router = analyzer_router(Arc::new(Panicking));
        let (status, body) = send(router, post("/analyze", r#"{"text": "anything"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn same_input_same_output() {
        let payload = r#"{"text": "You are stupid and I hate you", "id": 3}"#;
        let (_, first) = send(keyword_router(), post("/analyze", payload)).await;
        let (_, second) = send(keyword_router(), post("/analyze", payload)).await;
        assert_eq!(first, second);
    }
}
