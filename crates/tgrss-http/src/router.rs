use axum::{routing::get, Router};

use crate::{handlers, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/channel/{channel}", get(handlers::feed::get_feed))
        .route("/channel/{channel}/{token}", get(handlers::media::get_media))
        .with_state(state)
}
