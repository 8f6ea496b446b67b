//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use chat_core::{ChatError, Holding, Message, Session, SessionId, portfolio};

use crate::state::AppState;

const LIST_LIMIT: usize = 50;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub market_data: String,
    pub market_data_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: SessionId,
    pub message: Message,
    pub holdings: Vec<Holding>,
    pub total_value: Decimal,
}

/// A stored session as returned to clients
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub title: String,
    pub total_value: Decimal,
}

impl TryFrom<Session> for SessionView {
    type Error = ChatError;

    fn try_from(session: Session) -> Result<Self, Self::Error> {
        Ok(Self {
            title: session.title(),
            total_value: portfolio::total_value(&session.holdings)?,
            session,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub title: String,
    pub message_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct HoldingsRequest {
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn store_error(e: ChatError) -> ApiError {
    tracing::error!(error = %e, "Session store failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR", e.user_message())
}

fn valuation_error(e: ChatError) -> ApiError {
    tracing::error!(error = %e, "Stored holdings cannot be valued");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "INVALID_HOLDINGS", e.to_string())
}

fn view(session: Session) -> Result<Json<SessionView>, ApiError> {
    SessionView::try_from(session).map(Json).map_err(valuation_error)
}

fn parse_id(raw: &str) -> Result<SessionId, ApiError> {
    SessionId::parse(raw)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, "INVALID_SESSION_ID", e.to_string()))
}

fn busy(id: &SessionId) -> ApiError {
    tracing::info!(session_id = %id, "Rejected message for busy session");
    api_error(
        StatusCode::CONFLICT,
        "SESSION_BUSY",
        "Still working on your previous message. Please wait for the reply.",
    )
}

fn not_found(id: &SessionId) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", format!("No session {id}"))
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gateway = state.assistant.gateway();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        market_data: gateway.name().to_string(),
        market_data_connected: gateway.health_check().await,
    })
}

/// Run one conversation turn
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let text = payload.message.trim();
    if text.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message is empty"));
    }

    let id = match payload.session_id.as_deref() {
        Some(raw) => parse_id(raw)?,
        None => SessionId::new(),
    };

    let _guard = state.begin_turn(&id).ok_or_else(|| busy(&id))?;

    let mut session = match state.store.load(&id).map_err(store_error)? {
        Some(session) => session,
        None => {
            tracing::info!(session_id = %id, "Starting session");
            Session::with_id(id)
        }
    };

    let message = state.assistant.respond(&mut session, text).await;
    state.store.save(&session).map_err(store_error)?;

    let total_value = portfolio::total_value(&session.holdings).map_err(valuation_error)?;
    Ok(Json(ChatResponse {
        session_id: session.id,
        message,
        holdings: session.holdings,
        total_value,
    }))
}

/// Recent sessions, most recently active first
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    let sessions = state.store.list(LIST_LIMIT).map_err(store_error)?;

    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionSummary {
                title: s.title(),
                message_count: s.message_count(),
                updated_at: s.updated_at,
                id: s.id,
            })
            .collect(),
    ))
}

/// Full session: conversation and holdings
pub async fn get_session(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let id = parse_id(&raw_id)?;

    let session = state
        .store
        .load(&id)
        .map_err(store_error)?
        .ok_or_else(|| not_found(&id))?;

    view(session)
}

/// Replace a session's holdings wholesale
pub async fn replace_holdings(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(payload): Json<HoldingsRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let id = parse_id(&raw_id)?;

    let invalid =
        |e: ChatError| api_error(StatusCode::BAD_REQUEST, "INVALID_HOLDINGS", e.to_string());
    portfolio::ensure_unique(&payload.holdings).map_err(invalid)?;
    portfolio::total_value(&payload.holdings).map_err(invalid)?;
    if let Some(h) = payload.holdings.iter().find(|h| h.amount.is_sign_negative()) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_HOLDINGS",
            format!("negative amount for {}", h.coin_id),
        ));
    }

    let _guard = state.begin_turn(&id).ok_or_else(|| busy(&id))?;

    let mut session = state
        .store
        .load(&id)
        .map_err(store_error)?
        .ok_or_else(|| not_found(&id))?;

    session.holdings = payload.holdings;
    session.touch();
    state.store.save(&session).map_err(store_error)?;

    tracing::info!(session_id = %id, holdings = session.holdings.len(), "Replaced holdings");
    view(session)
}

/// Delete a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let _guard = state.begin_turn(&id).ok_or_else(|| busy(&id))?;

    if state.store.delete(&id).map_err(store_error)? {
        tracing::info!(session_id = %id, "Deleted session");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}
