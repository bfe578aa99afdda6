use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;

use crate::{
    error::AppError,
    services::mortgage::{
        MortgageInputs, MortgageResult, MortgageUpdate, OFFERED_TERMS, amortize, is_offered_term,
    },
    state::SharedState,
};

#[derive(Serialize)]
pub struct MortgageResponse {
    pub inputs: MortgageInputs,
    pub result: MortgageResult,
}

fn validate(inputs: &MortgageInputs) -> Result<(), AppError> {
    let money = [
        ("price", inputs.price),
        ("down_payment", inputs.down_payment),
        ("annual_rate_percent", inputs.annual_rate_percent),
    ];
    for (field, value) in money {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::BadRequest(format!(
                "{} must be a non-negative number",
                field
            )));
        }
    }
    if !is_offered_term(inputs.term_years) {
        return Err(AppError::BadRequest(format!(
            "term_years must be one of {:?}",
            OFFERED_TERMS
        )));
    }
    Ok(())
}

/// One-off calculation; missing fields take the calculator defaults.
pub async fn calculate_handler(
    State(state): State<SharedState>,
    change: Result<Json<MortgageUpdate>, JsonRejection>,
) -> Result<Json<MortgageResponse>, AppError> {
    let Json(change) = change?;
    let mut inputs = MortgageInputs::default();
    change.apply_to(&mut inputs);
    validate(&inputs)?;

    state.metrics.record_mortgage(inputs.term_years).await;
    Ok(Json(MortgageResponse {
        inputs,
        result: amortize(&inputs),
    }))
}

pub async fn session_mortgage_handler(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    change: Result<Json<MortgageUpdate>, JsonRejection>,
) -> Result<Json<MortgageResponse>, AppError> {
    let Json(change) = change?;
    let mut candidate = state
        .sessions
        .mortgage_inputs(&session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("session {} not found", session_id)))?;
    change.apply_to(&mut candidate);
    validate(&candidate)?;

    let (inputs, result) = state.sessions.update_mortgage(&session_id, change).await?;
    state.metrics.record_mortgage(inputs.term_years).await;
    Ok(Json(MortgageResponse { inputs, result }))
}
