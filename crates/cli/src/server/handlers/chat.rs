//! `/chat` and `/chat/debug`.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wellness_research::{DocumentRecord, RouteKind, SourceRef};

use crate::server::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Pipeline internals for troubleshooting retrieval.
#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub question: String,
    pub search_query: String,
    pub route: RouteKind,
    pub answer: String,
    pub retrieved_articles: Vec<DocumentRecord>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::info!("Chat request ({} chars)", request.message.chars().count());

    let outcome = state.pipeline.run(&request.message).await?;
    let sources = outcome.sources();

    Ok(Json(ChatResponse {
        answer: outcome.answer,
        sources,
    }))
}

pub async fn chat_debug(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<DebugResponse>, ApiError> {
    let outcome = state.pipeline.run(&request.message).await?;

    Ok(Json(DebugResponse {
        question: outcome.question,
        search_query: outcome.search_query,
        route: outcome.route,
        answer: outcome.answer,
        retrieved_articles: outcome.documents,
    }))
}
