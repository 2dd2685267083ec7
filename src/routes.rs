use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::agent::ContextItem;
use crate::error::ApiError;
use crate::search::format_context;
use crate::state::AppState;

/// Inbound chat request from the widget.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Prior history, oldest first. Elements that are not plain turns are kept as sent.
    #[serde(default, alias = "history")]
    pub context: Vec<ContextItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Formatted search documents shown alongside the answer.
    pub context: Vec<String>,
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .route("/chat", post(chat))
}

/// Full application: routes, CORS, request tracing and shared state.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "settings": state.is_settings_loaded(),
        "agent": state.is_agent_ready(),
    }))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let agent = state.agent.clone().ok_or(ApiError::AgentUnavailable)?;

    let documents = match &state.search {
        Some(search) => match search.search(&request.question).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Search failed, answering without context: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let answer = agent
        .get_answer(&request.question, &request.context, request.session_id.as_deref())
        .await
        .map_err(|e| {
            error!(kind = e.kind(), "Agent call failed: {}", e);
            ApiError::from(e)
        })?;

    info!(
        answer_len = answer.len(),
        documents = documents.len(),
        "Chat answered"
    );

    Ok(Json(ChatResponse {
        answer,
        context: format_context(&documents),
    }))
}
