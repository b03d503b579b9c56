//! HTTP request handlers

use super::types::{
    ActivityRequest, ConversationListResponse, ConversationResponse,
    CreateConversationResponse, ErrorResponse, SuccessResponse,
};
use super::AppState;
use crate::db::DbError;
use crate::runtime::{TurnError, TurnReply};
use crate::state_machine::{ConversationState, Event};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Conversation listing
        .route("/api/conversations", get(list_conversations))
        // Conversation creation
        .route("/api/conversations/new", post(create_conversation))
        // Conversation retrieval
        .route("/api/conversations/:key", get(get_conversation))
        // Turns
        .route("/api/conversations/:key/activities", post(post_activity))
        .route("/api/conversations/:key/reservation", post(begin_reservation))
        // Lifecycle
        .route("/api/conversations/:key/delete", post(delete_conversation))
        // Version
        .route("/version", get(get_version))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================
// Conversations
// ============================================================

async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<ConversationListResponse>, AppError> {
    let conversations = state.runtime.db().list_conversations()?;
    Ok(Json(ConversationListResponse { conversations }))
}

async fn create_conversation(
    State(state): State<AppState>,
) -> Result<Json<CreateConversationResponse>, AppError> {
    let key = uuid::Uuid::new_v4().to_string();
    state
        .runtime
        .db()
        .save_state(&key, &ConversationState::default())?;

    tracing::info!(conv_key = %key, "Created conversation");
    Ok(Json(CreateConversationResponse { key }))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    let db = state.runtime.db();
    Ok(Json(ConversationResponse {
        state: db.load_state(&key)?,
        identity: db.load_identity(&key)?,
    }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.runtime.delete_conversation(&key).await?;

    tracing::info!(conv_key = %key, "Deleted conversation");
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Turns
// ============================================================

async fn post_activity(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ActivityRequest>,
) -> Result<Json<TurnReply>, AppError> {
    if req.activity_type.trim().is_empty() {
        return Err(AppError::BadRequest("Activity type is required".to_string()));
    }

    let event = Event::from_activity(req.activity_type.trim(), &req.text);
    let reply = state.runtime.dispatch(&key, event).await?;
    Ok(Json(reply))
}

async fn begin_reservation(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TurnReply>, AppError> {
    let reply = state.runtime.dispatch(&key, Event::BeginReservation).await?;
    Ok(Json(reply))
}

async fn get_version() -> &'static str {
    concat!("concierge ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    Turn(TurnError),
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::ConversationNotFound(_) => AppError::NotFound(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<TurnError> for AppError {
    fn from(e: TurnError) -> Self {
        AppError::Turn(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg)),
            AppError::Turn(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "Turn failed");
                let status = match &e {
                    TurnError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
                    TurnError::Step(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    TurnError::FlowBusy(_) => StatusCode::CONFLICT,
                };
                let body = ErrorResponse::new(e.to_string()).with_message(e.user_message());
                (status, body)
            }
        };

        (status, Json(body)).into_response()
    }
}
