//! Plant GPT chat endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assistant::{compose_reply, detect_intent, ChatSessions, ChatTurn, Speaker};
use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2_000;

/// Longest accepted client-supplied session id, in characters.
pub const MAX_SESSION_ID_CHARS: usize = 64;

/// Route group for the chatbot.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/:session_id", get(session_history).delete(end_session))
}

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Operator message.
    pub message: String,
    /// Existing session to continue; a new one is opened when absent.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Chat response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Session the exchange was recorded in.
    pub session_id: String,
    /// Detected intent label.
    pub intent: String,
    /// Assistant reply.
    pub reply: String,
}

/// Session transcript.
#[derive(Debug, Serialize)]
pub struct SessionHistory {
    /// Session id.
    pub session_id: String,
    /// Turns, oldest first.
    pub turns: Vec<ChatTurn>,
}

/// `POST /chat` - answer an operator question from live plant data.
///
/// # Errors
/// Returns [`ApiError::InvalidRequest`] for a blank or oversized message, or
/// an oversized session id.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::InvalidRequest("message must not be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::InvalidRequest(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let session_id = match request.session_id.as_deref().map(str::trim) {
        Some(id) if id.chars().count() > MAX_SESSION_ID_CHARS => {
            return Err(ApiError::InvalidRequest(format!(
                "session_id must be at most {MAX_SESSION_ID_CHARS} characters"
            )));
        }
        Some(id) if !id.is_empty() => id.to_string(),
        _ => ChatSessions::new_session_id(),
    };

    let intent = detect_intent(message);
    let kind = intent.kind().to_string();
    let reply = {
        let history = state.history.read().await;
        compose_reply(&intent, &history, &state.settings.thresholds)
    };

    state.chat.append(
        &session_id,
        [
            ChatTurn::new(Speaker::User, message),
            ChatTurn::new(Speaker::Assistant, reply.clone()),
        ],
    );
    metrics::inc_chat_messages(&kind);
    debug!(session = %session_id, intent = %kind, "Chat message answered");

    Ok(Json(ChatResponse {
        session_id,
        intent: kind,
        reply,
    }))
}

/// `GET /chat/:session_id` - conversation transcript.
///
/// # Errors
/// Returns [`ApiError::NotFound`] for an unknown session.
pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistory>, ApiError> {
    let turns = state
        .chat
        .history(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("chat session {session_id}")))?;
    Ok(Json(SessionHistory { session_id, turns }))
}

/// `DELETE /chat/:session_id` - forget a conversation.
///
/// # Errors
/// Returns [`ApiError::NotFound`] for an unknown session.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.chat.remove(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("chat session {session_id}")))
    }
}
