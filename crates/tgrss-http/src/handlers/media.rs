use std::{collections::HashMap, io};

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use tgrss_core::{
    domain::ChatRef,
    gateway::{serve_media, MediaBody, MediaReply},
    session::{BoxMediaStream, MediaStream},
};

use super::error_status;
use crate::AppState;

pub async fn get_media(
    State(state): State<AppState>,
    Path((channel, token)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let chat = ChatRef::parse(&channel);
    let want_thumbnail = query.contains_key("thumb");
    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());

    let cancel = CancellationToken::new();
    let reply = match serve_media(
        &state.session,
        &chat,
        &token,
        want_thumbnail,
        range_header,
        &cancel,
    )
    .await
    {
        Ok(Some(reply)) => reply,
        // Client was already gone; there is nobody to answer.
        Ok(None) => return StatusCode::OK.into_response(),
        Err(e) => {
            error!(%channel, token, error = %e, "media request failed");
            return error_status(&e).into_response();
        }
    };

    into_response(reply)
}

fn into_response(reply: MediaReply) -> Response {
    let mut builder = Response::builder().status(reply.status);

    if let Some(ct) = &reply.content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    if reply.accept_ranges {
        builder = builder.header(header::ACCEPT_RANGES, "bytes");
    }
    if let Some(len) = reply.content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    if let Some(cr) = &reply.content_range {
        builder = builder.header(header::CONTENT_RANGE, cr);
    }
    if let Some(cd) = &reply.content_disposition {
        builder = builder.header(header::CONTENT_DISPOSITION, cd);
    }

    let body = match reply.body {
        MediaBody::Empty => Body::empty(),
        MediaBody::Bytes(bytes) => Body::from(bytes),
        MediaBody::Stream(stream) => stream_body(stream),
    };

    match builder.body(body) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "failed to assemble media response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Bridge the core's pull stream into a response body.
///
/// The capacity-1 channel makes the downstream write rate gate upstream
/// reads; a dropped body (client disconnect) fails the send, which stops
/// the pump and drops the stream, releasing the upstream handle.
fn stream_body(mut stream: BoxMediaStream) -> Body {
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(1);

    tokio::spawn(async move {
        loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    if tx.send(Ok(chunk)).await.is_err() {
                        debug!("client disconnected mid-stream");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
                    break;
                }
            }
        }
    });

    Body::from_stream(ReceiverStream::new(rx))
}
