pub mod hooks;
pub mod relay;

use axum::Router;
use axum::routing::{any, post};

use crate::state::SharedState;

pub fn hook_routes() -> Router<SharedState> {
    Router::new().route("/hooks/{slug}", any(hooks::receive))
}

pub fn relay_routes() -> Router<SharedState> {
    Router::new().route("/relay/send", post(relay::send))
}
