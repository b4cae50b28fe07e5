use std::sync::Arc;

use crate::config::Config;
use crate::email::BridgeMailer;
use crate::event::forward::Forwarder;
use crate::hooks::HookRegistry;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub hooks: HookRegistry,
    pub forwarder: Forwarder,
    pub mailer: Option<BridgeMailer>,
}
