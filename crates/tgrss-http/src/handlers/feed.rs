use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use tgrss_core::{domain::ChatRef, feed::build_feed};

use super::error_status;
use crate::AppState;

pub async fn get_feed(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let chat = ChatRef::parse(&channel);
    let allow_empty = query.contains_key("allow_empty");

    match build_feed(
        &state.session,
        &state.cfg.public_base_url,
        &chat,
        state.cfg.feed_window,
        allow_empty,
    )
    .await
    {
        Ok(feed) => Json(feed).into_response(),
        Err(e) => {
            error!(%channel, error = %e, "feed build failed");
            error_status(&e).into_response()
        }
    }
}
