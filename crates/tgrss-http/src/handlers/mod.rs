use axum::http::StatusCode;

use tgrss_core::Error;

pub mod feed;
pub mod media;

pub(crate) fn error_status(err: &Error) -> StatusCode {
    match err {
        Error::UpstreamNotReady => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
