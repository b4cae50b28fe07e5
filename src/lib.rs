pub mod config;
pub mod email;
pub mod error;
pub mod event;
pub mod hooks;
pub mod routes;
pub mod state;
pub mod submission;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::BridgeMailer;
use crate::event::forward::Forwarder;
use crate::hooks::{EventName, HookProfile, HookRegistry, ProbePolicy};
use crate::state::{AppState, SharedState};

pub fn build_app(config: Config) -> Router {
    // Every deployed hook variant collapses into a profile here; the
    // pipeline behind them is shared.
    let mut hooks = HookRegistry::new();
    hooks.register(
        HookProfile::new("lead", EventName::Lead, ProbePolicy::AlwaysOk)
            .tag("lead_source", "web_form"),
    );
    hooks.register(
        HookProfile::new(
            "application",
            EventName::SubmitApplication,
            ProbePolicy::MethodNotAllowed,
        )
        .tag("lead_source", "application_form"),
    );
    hooks.register(
        HookProfile::new(
            "registration",
            EventName::CompleteRegistration,
            ProbePolicy::AlwaysOk,
        )
        .tag("lead_source", "registration_form"),
    );

    let mailer = config.mail.as_ref().and_then(|mail| {
        match BridgeMailer::new(&mail.smtp) {
            Ok(mailer) => {
                tracing::info!("Mail bridge configured");
                Some(mailer)
            }
            Err(e) => {
                tracing::warn!("Mail bridge not available: {e}");
                None
            }
        }
    });

    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        config,
        hooks,
        forwarder: Forwarder::new(),
        mailer,
    });

    Router::new()
        .merge(routes::hook_routes())
        .merge(routes::relay_routes())
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
