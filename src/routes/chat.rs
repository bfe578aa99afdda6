use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    error::AppError,
    message::{ChatRequest, ChatResponse, LocationReport, LocationResponse, SessionCreated},
    services::session_manager::{ChatMessage, GREETING, MessageRole},
    state::SharedState,
};

pub async fn create_session_handler(State(state): State<SharedState>) -> Json<SessionCreated> {
    let session_id = state.sessions.create_session().await;
    Json(SessionCreated {
        session_id,
        greeting: GREETING.to_string(),
    })
}

pub async fn history_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    state
        .sessions
        .get_history(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("session {} not found", session_id)))
}

pub async fn location_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    report: Result<Json<LocationReport>, JsonRejection>,
) -> Result<Json<LocationResponse>, AppError> {
    let Json(report) = report?;
    if let LocationReport::Denied { reason: Some(reason) } = &report {
        tracing::debug!(session_id = %session_id, reason = %reason, "geolocation denied");
    }
    let location = state
        .sessions
        .resolve_location(&session_id, report.coordinate())
        .await?;
    Ok(Json(LocationResponse { session_id, location }))
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(payload) = payload?;

    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }

    let session_id = match &payload.session_id {
        Some(s) if !s.trim().is_empty() => state.sessions.ensure_session(s).await,
        _ => state.sessions.create_session().await,
    };

    let prompt = payload.message;
    let user_message = ChatMessage::new(MessageRole::User, prompt.clone());
    let turn = state.sessions.begin_turn(&session_id, user_message).await?;

    // Spawned so the turn finishes even if the client hangs up.
    let task_state = state.clone();
    let task_session = session_id.clone();
    let handle = tokio::spawn(async move {
        let reply = task_state
            .advisor
            .send_turn(&turn.history, &prompt, turn.location)
            .await;
        task_state
            .metrics
            .record_turn(reply.outcome, reply.links.len())
            .await;

        let assistant = ChatMessage::new(MessageRole::Assistant, reply.reply_text.clone())
            .with_links(reply.links.clone());
        task_state
            .sessions
            .complete_turn(&task_session, assistant)
            .await
            .map(|_| reply)
    });

    let reply = handle
        .await
        .map_err(|e| AppError::Internal(format!("chat turn aborted: {}", e)))??;

    Ok(Json(ChatResponse {
        session_id,
        reply: reply.reply_text,
        links: reply.links,
    }))
}
