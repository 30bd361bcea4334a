//! HTTP adapter (axum).
//!
//! Routes feed and media requests onto the core aggregator/gateway over an
//! injected session handle. Each request runs as one independent task on
//! the shared runtime; the only shared state is the session handle itself.

use std::sync::Arc;

use tgrss_core::{config::Config, session::SessionHandle};

pub mod handlers;
pub mod router;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub session: SessionHandle,
}
