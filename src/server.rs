use crate::error::PipelineError;
use crate::inference::InferenceClient;
use crate::parse::MediaSuggestion;
use crate::pipeline::{Pipeline, PipelineResult};
use crate::progress;
use crate::researcher::Depth;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const RELATED_TOPIC_COUNT: usize = 5;

pub struct AppState {
    pub pipeline: Pipeline<InferenceClient>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/research", post(research))
        .route("/api/related-topics", post(related_topics))
        .route("/api/progress", get(recent_progress))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ResearchBody {
    topic: String,
    #[serde(default)]
    depth: Depth,
    #[serde(default)]
    include_media: bool,
}

#[derive(Debug, Serialize)]
struct StageBody {
    name: String,
    agent: String,
    output: String,
}

#[derive(Debug, Serialize)]
struct ResearchResponse {
    topic: String,
    stages: Vec<StageBody>,
    total_time: f64,
    final_report: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<Vec<MediaSuggestion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_file: Option<String>,
}

impl From<PipelineResult> for ResearchResponse {
    fn from(result: PipelineResult) -> Self {
        ResearchResponse {
            topic: result.topic,
            stages: result
                .stages
                .into_iter()
                .map(|s| StageBody {
                    name: s.name,
                    agent: s.agent,
                    output: s.output,
                })
                .collect(),
            total_time: result.total_time.as_secs_f64(),
            final_report: result.final_report,
            media: result.media,
            download_file: result
                .report_path
                .map(|p| p.display().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(err: PipelineError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

async fn research(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResearchBody>,
) -> Result<Json<ResearchResponse>, (StatusCode, Json<ErrorBody>)> {
    let result = state
        .pipeline
        .run(&body.topic, body.depth, body.include_media)
        .await
        .map_err(error_response)?;

    Ok(Json(ResearchResponse::from(result)))
}

#[derive(Debug, Deserialize)]
struct RelatedTopicsBody {
    topic: String,
}

#[derive(Debug, Serialize)]
struct RelatedTopicsResponse {
    topics: Vec<String>,
}

async fn related_topics(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RelatedTopicsBody>,
) -> Result<Json<RelatedTopicsResponse>, (StatusCode, Json<ErrorBody>)> {
    let topics = state
        .pipeline
        .researcher()
        .find_related_topics(&body.topic, RELATED_TOPIC_COUNT)
        .await
        .map_err(error_response)?;

    Ok(Json(RelatedTopicsResponse { topics }))
}

#[derive(Debug, Serialize)]
struct ProgressBody {
    kind: &'static str,
    text: String,
}

fn kind_label(kind: progress::Kind) -> &'static str {
    match kind {
        progress::Kind::Info => "info",
        progress::Kind::Inference => "inference",
        progress::Kind::Research => "research",
        progress::Kind::Analysis => "analysis",
        progress::Kind::Critique => "critique",
        progress::Kind::Synthesis => "synthesis",
        progress::Kind::Media => "media",
    }
}

async fn recent_progress() -> Json<Vec<ProgressBody>> {
    let entries = progress::recent(50)
        .into_iter()
        .map(|e| ProgressBody {
            kind: kind_label(e.kind),
            text: e.text,
        })
        .collect();
    Json(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_defaults_to_comprehensive() {
        let body: ResearchBody = serde_json::from_str(r#"{"topic": "AI"}"#).unwrap();
        assert_eq!(body.depth, Depth::Comprehensive);
        assert!(!body.include_media);
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let (status, body) =
            error_response(PipelineError::Validation("Topic is required".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Topic is required");
    }

    #[test]
    fn test_other_errors_map_to_internal_error() {
        let (status, _) = error_response(PipelineError::Configuration("no key".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
