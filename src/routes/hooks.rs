use std::net::SocketAddr;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::AppError;
use crate::event::forward::ForwardError;
use crate::event::{EventBatch, normalize};
use crate::hooks::ProbePolicy;
use crate::state::SharedState;
use crate::submission::parser::ParsedSubmission;
use crate::submission::{extract, metadata, parser};

/// Single entry point for every registered hook. Per-hook differences
/// (event label, probe policy, static tags) come from the profile; the
/// parse/extract/forward pipeline is shared.
pub async fn receive(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let hook = state
        .hooks
        .get(&slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown hook: {slug}")))?;

    if method == Method::OPTIONS {
        return Ok(preflight());
    }
    if method != Method::POST {
        return match hook.probe {
            ProbePolicy::AlwaysOk => {
                Ok((StatusCode::OK, Json(json!({ "status": "ok" }))).into_response())
            }
            ProbePolicy::MethodNotAllowed => Err(AppError::MethodNotAllowed),
        };
    }

    // Credentials are checked before the body is even parsed; nothing
    // leaves the process without them.
    let capi = state.config.capi.as_ref().ok_or_else(|| {
        AppError::Configuration("Events API credentials are not configured".to_string())
    })?;

    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());

    let parsed = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body).await
    } else {
        parser::parse_body(content_type, &body)
    };

    // A body we cannot read degrades to an empty submission; the event
    // still goes out with whatever was recovered.
    let submission = parsed.unwrap_or_else(|e| {
        tracing::warn!(hook = hook.slug, "Unparseable body: {e}");
        ParsedSubmission::default()
    });

    let extracted = extract::extract(&submission);
    let meta = metadata::extract(&headers, Some(addr.ip()), &state.config.trusted_proxies);

    tracing::info!(
        hook = hook.slug,
        event = hook.event_name.as_str(),
        has_email = extracted.email.is_some(),
        has_phone = extracted.phone.is_some(),
        has_name = extracted.first_name.is_some() || extracted.last_name.is_some(),
        has_dob = extracted.date_of_birth.is_some(),
        has_fbp = extracted.fbp.is_some(),
        has_fbc = extracted.fbc.is_some(),
        has_event_id = extracted.event_id.is_some(),
        "Submission received"
    );

    let event = normalize::build_event(
        hook,
        &extracted,
        &meta,
        state.config.source_url.as_deref(),
    );
    let batch = EventBatch { data: vec![event] };

    match state.forwarder.send(capi, &batch).await {
        Ok(remote) => Ok((StatusCode::OK, Json(remote)).into_response()),
        Err(ForwardError::Remote { status, body }) => {
            tracing::error!(hook = hook.slug, status, "Events API rejected the event");
            Err(AppError::Upstream(body))
        }
        Err(ForwardError::Request(msg)) => Err(AppError::Internal(msg)),
    }
}

fn preflight() -> Response {
    (
        [
            ("access-control-allow-origin", "*"),
            ("access-control-allow-methods", "POST, OPTIONS"),
            ("access-control-allow-headers", "Content-Type"),
            ("access-control-max-age", "86400"),
        ],
        StatusCode::NO_CONTENT,
    )
        .into_response()
}
