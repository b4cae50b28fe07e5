use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct RelayParams {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    pub to: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub text: Option<String>,
}

pub async fn send(
    State(state): State<SharedState>,
    Query(params): Query<RelayParams>,
    Json(req): Json<RelayRequest>,
) -> Result<Response, AppError> {
    let mail = state
        .config
        .mail
        .as_ref()
        .ok_or_else(|| AppError::Configuration("Mail bridge is not configured".to_string()))?;

    let token = params.token.as_deref().unwrap_or("");
    if !bool::from(token.as_bytes().ct_eq(mail.token.as_bytes())) {
        return Err(AppError::Unauthorized("Invalid bridge token".to_string()));
    }

    let to = require(&req.to, "to")?;
    let from = require(&req.from, "from")?;
    let subject = require(&req.subject, "subject")?;
    let text = require(&req.text, "text")?;

    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| AppError::Configuration("Mail bridge is not configured".to_string()))?;

    let message_id = mailer
        .send(to, from, subject, text)
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(%message_id, "Mail relayed");

    Ok((
        StatusCode::OK,
        Json(json!({ "status": "sent", "message_id": message_id })),
    )
        .into_response())
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing required field: {name}")))
}
