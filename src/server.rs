//! HTTP front end: `POST /analyze`.

use crate::error::ResearchError;
use crate::orchestrator::{Synthesizer, NO_QUESTION};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    question: Option<String>,
}

pub fn router(synthesizer: Arc<Synthesizer>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(analyze))
        .layer(cors)
        .with_state(synthesizer)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(synthesizer: Arc<Synthesizer>, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    ::log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(synthesizer))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            ::log::info!("Shutting down");
        })
        .await
}

pub fn status_for(error: &ResearchError) -> StatusCode {
    match error {
        ResearchError::Input(_) => StatusCode::BAD_REQUEST,
        ResearchError::NoResults | ResearchError::NoDataScraped | ResearchError::Config(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ResearchError::Llm(_) => StatusCode::BAD_GATEWAY,
        ResearchError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub async fn analyze(
    State(synthesizer): State<Arc<Synthesizer>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let question = match body {
        Ok(Json(AnalyzeRequest {
            question: Some(q), ..
        })) if !q.trim().is_empty() => q,
        Ok(_) => return error_response(StatusCode::BAD_REQUEST, NO_QUESTION.to_string()),
        Err(rejection) => {
            ::log::debug!("Rejected /analyze body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, NO_QUESTION.to_string());
        }
    };

    // a disconnecting client drops this future, and with it the guard
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match synthesizer.synthesize_with_cancel(&question, &cancel).await {
        Ok(analysis) => (StatusCode::OK, Json(analysis)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            ::log::error!("Analysis failed with {}: {}", status, e);
            error_response(status, e.to_string())
        }
    }
}
