//! Media streaming gateway: resolve an opaque media token and stream the
//! resource with HTTP byte-range semantics.

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    domain::{ByteRange, ChatRef, DocumentInfo, MediaLocator, MediaResource},
    errors::Error,
    medialink::decode_token,
    range::parse_range,
    session::{BoxMediaStream, SessionHandle, StreamGuard},
    Result,
};

/// `encodeURIComponent` character set for `Content-Disposition` filenames.
const FILENAME_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Transport-agnostic reply; the HTTP adapter maps this onto a response.
pub struct MediaReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub content_range: Option<String>,
    pub accept_ranges: bool,
    pub content_disposition: Option<String>,
    pub body: MediaBody,
}

pub enum MediaBody {
    Empty,
    Bytes(Bytes),
    Stream(BoxMediaStream),
}

impl MediaReply {
    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            content_length: None,
            content_range: None,
            accept_ranges: false,
            content_disposition: None,
            body: MediaBody::Empty,
        }
    }
}

/// Serve one media request.
///
/// Returns `Ok(None)` when the client disconnected before any upstream
/// work started. Failures with a defined client-facing status are folded
/// into the reply; only readiness-bound exhaustion surfaces as an error.
pub async fn serve_media(
    session: &SessionHandle,
    chat: &ChatRef,
    token: &str,
    want_thumbnail: bool,
    range_header: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Option<MediaReply>> {
    session.ready().await?;

    let (locator, resource) = match resolve(session, chat, token).await {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!(%chat, token, error = %e, "media token resolution failed");
            return Ok(Some(MediaReply::empty(500)));
        }
    };

    // The caller already hung up: skip the upstream fetch entirely.
    if cancel.is_cancelled() {
        return Ok(None);
    }

    if want_thumbnail {
        let reply = match session.client().open_thumbnail_stream(chat, locator).await {
            Ok(stream) => jpeg_reply(stream, cancel),
            Err(e) => {
                debug!(%chat, token, error = %e, "thumbnail unavailable");
                MediaReply::empty(404)
            }
        };
        return Ok(Some(reply));
    }

    let reply = match resource {
        MediaResource::Document(doc) => {
            serve_document(session, chat, locator, doc, range_header, cancel).await
        }
        // Photos have no random access upstream: atomic fetch, single write.
        MediaResource::Photo => match session.client().download_media(chat, locator).await {
            Ok(bytes) => MediaReply {
                status: 200,
                content_type: Some("image/jpeg".to_string()),
                content_length: Some(bytes.len() as u64),
                content_range: None,
                accept_ranges: false,
                content_disposition: None,
                body: MediaBody::Bytes(bytes),
            },
            Err(e) => {
                warn!(%chat, token, error = %e, "photo download failed");
                MediaReply::empty(500)
            }
        },
        MediaResource::Unsupported { class_tag } => MediaReply {
            status: 415,
            content_type: None,
            content_length: None,
            content_range: None,
            accept_ranges: false,
            content_disposition: None,
            body: MediaBody::Bytes(Bytes::from(class_tag)),
        },
    };
    Ok(Some(reply))
}

async fn resolve(
    session: &SessionHandle,
    chat: &ChatRef,
    token: &str,
) -> Result<(MediaLocator, MediaResource)> {
    let locator = decode_token(token)?;
    let resource = session.client().resolve_media(chat, locator).await?;
    Ok((locator, resource))
}

async fn serve_document(
    session: &SessionHandle,
    chat: &ChatRef,
    locator: MediaLocator,
    doc: DocumentInfo,
    range_header: Option<&str>,
    cancel: &CancellationToken,
) -> MediaReply {
    let range = match single_range(range_header, doc.size.saturating_sub(1)) {
        Ok(range) => range,
        Err(e) => {
            debug!(%chat, error = %e, "range not satisfiable");
            return not_satisfiable(&doc);
        }
    };

    if let Some(range) = range {
        debug!(%chat, offset = range.offset, limit = range.limit, "serving partial document");
        let stream = match session
            .client()
            .open_document_stream(chat, locator, Some(range))
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                warn!(%chat, error = %e, "document stream open failed");
                return MediaReply::empty(500);
            }
        };
        return MediaReply {
            status: 206,
            content_type: Some(doc.mime_type.clone()),
            content_length: Some(range.byte_len()),
            content_range: Some(format!(
                "bytes {}-{}/{}",
                range.offset, range.limit, doc.size
            )),
            accept_ranges: true,
            content_disposition: None,
            body: guarded(stream, cancel, Some(range.byte_len())),
        };
    }

    let stream = match session
        .client()
        .open_document_stream(chat, locator, None)
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            warn!(%chat, error = %e, "document stream open failed");
            return MediaReply::empty(500);
        }
    };

    // Generic binary documents download as attachments.
    let content_disposition = doc.mime_type.starts_with("application/").then(|| {
        let name = doc
            .filename
            .clone()
            .unwrap_or_else(|| format!("doc{}-{}", locator.message_id.0, locator.media_index));
        format!(
            r#"attachment; filename="{}""#,
            utf8_percent_encode(&name, FILENAME_ENCODE)
        )
    });

    MediaReply {
        status: 200,
        content_type: Some(doc.mime_type.clone()),
        content_length: Some(doc.size),
        content_range: None,
        accept_ranges: true,
        content_disposition,
        body: guarded(stream, cancel, Some(doc.size)),
    }
}

/// Range policy: at most one range per request.
fn single_range(header: Option<&str>, last_byte_index: u64) -> Result<Option<ByteRange>> {
    let ranges = parse_range(header, last_byte_index)?;
    if ranges.len() > 1 {
        return Err(Error::MultiRangeRejected);
    }
    Ok(ranges.first().copied())
}

fn jpeg_reply(stream: BoxMediaStream, cancel: &CancellationToken) -> MediaReply {
    MediaReply {
        status: 200,
        content_type: Some("image/jpeg".to_string()),
        content_length: None,
        content_range: None,
        accept_ranges: false,
        content_disposition: None,
        body: guarded(stream, cancel, None),
    }
}

fn guarded(stream: BoxMediaStream, cancel: &CancellationToken, budget: Option<u64>) -> MediaBody {
    MediaBody::Stream(Box::new(StreamGuard::new(stream, cancel.clone(), budget)))
}

fn not_satisfiable(doc: &DocumentInfo) -> MediaReply {
    MediaReply {
        status: 416,
        content_type: Some(doc.mime_type.clone()),
        content_length: None,
        content_range: None,
        accept_ranges: true,
        content_disposition: None,
        body: MediaBody::Empty,
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        domain::MessageId,
        medialink::encode_token,
        session::MediaStream,
        testutil::FakeSession,
    };

    fn locator() -> MediaLocator {
        MediaLocator {
            message_id: MessageId(1),
            media_index: 0,
        }
    }

    fn document_session(size: u64, mime: &str, data: Bytes) -> SessionHandle {
        let fake = FakeSession::new()
            .with_resource(
                locator(),
                MediaResource::Document(DocumentInfo {
                    mime_type: mime.to_string(),
                    size,
                    filename: Some("my file.bin".to_string()),
                }),
            )
            .with_document(locator(), data);
        SessionHandle::new(Arc::new(fake), Duration::from_millis(10))
    }

    fn chat() -> ChatRef {
        ChatRef::parse("chan")
    }

    async fn drain(body: MediaBody) -> Bytes {
        match body {
            MediaBody::Empty => Bytes::new(),
            MediaBody::Bytes(bytes) => bytes,
            MediaBody::Stream(mut stream) => {
                let mut out = Vec::new();
                while let Some(chunk) = stream.next_chunk().await.unwrap() {
                    out.extend_from_slice(&chunk);
                }
                Bytes::from(out)
            }
        }
    }

    async fn serve(
        session: &SessionHandle,
        want_thumbnail: bool,
        range_header: Option<&str>,
    ) -> MediaReply {
        serve_media(
            session,
            &chat(),
            &encode_token(locator()),
            want_thumbnail,
            range_header,
            &CancellationToken::new(),
        )
        .await
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn full_document_downloads_byte_identical() {
        let data = Bytes::from((0..1000u32).map(|i| i as u8).collect::<Vec<_>>());
        let session = document_session(1000, "application/octet-stream", data.clone());

        let reply = serve(&session, false, None).await;

        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_length, Some(1000));
        assert!(reply.accept_ranges);
        assert_eq!(
            reply.content_disposition.as_deref(),
            Some(r#"attachment; filename="my%20file.bin""#)
        );
        assert_eq!(drain(reply.body).await, data);
    }

    #[tokio::test]
    async fn open_range_serves_partial_content() {
        let data = Bytes::from(vec![9u8; 1000]);
        let session = document_session(1000, "video/mp4", data.clone());

        let reply = serve(&session, false, Some("bytes=500-")).await;

        assert_eq!(reply.status, 206);
        assert_eq!(reply.content_length, Some(500));
        assert_eq!(
            reply.content_range.as_deref(),
            Some("bytes 500-999/1000")
        );
        assert_eq!(drain(reply.body).await.len(), 500);
    }

    #[tokio::test]
    async fn never_writes_more_than_content_length() {
        // Upstream misbehaves and has more bytes than the resource size.
        let data = Bytes::from(vec![1u8; 1200]);
        let session = document_session(1000, "video/mp4", data);

        let reply = serve(&session, false, None).await;
        assert_eq!(drain(reply.body).await.len(), 1000);

        let reply = serve(&session, false, Some("bytes=0-99")).await;
        assert_eq!(reply.content_length, Some(100));
        assert_eq!(drain(reply.body).await.len(), 100);
    }

    #[tokio::test]
    async fn multi_range_is_rejected_with_416() {
        let session = document_session(1000, "video/mp4", Bytes::from(vec![0u8; 1000]));

        let reply = serve(&session, false, Some("bytes=0-10,20-30")).await;

        assert_eq!(reply.status, 416);
        assert!(reply.accept_ranges);
        assert!(drain(reply.body).await.is_empty());
    }

    #[tokio::test]
    async fn non_bytes_unit_is_rejected_with_416() {
        let session = document_session(1000, "video/mp4", Bytes::from(vec![0u8; 1000]));
        let reply = serve(&session, false, Some("items=0-10")).await;
        assert_eq!(reply.status, 416);
    }

    #[tokio::test]
    async fn non_binary_mime_gets_no_disposition() {
        let session = document_session(10, "video/mp4", Bytes::from(vec![0u8; 10]));
        let reply = serve(&session, false, None).await;
        assert_eq!(reply.content_disposition, None);
    }

    #[tokio::test]
    async fn bad_token_is_a_500_with_empty_body() {
        let session = document_session(10, "video/mp4", Bytes::from(vec![0u8; 10]));

        let reply = serve_media(
            &session,
            &chat(),
            "not-a-token!",
            false,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(reply.status, 500);
        assert!(drain(reply.body).await.is_empty());
    }

    #[tokio::test]
    async fn thumbnail_streams_as_jpeg() {
        let thumb = Bytes::from_static(b"jpegdata");
        let fake = FakeSession::new()
            .with_resource(
                locator(),
                MediaResource::Document(DocumentInfo {
                    mime_type: "video/mp4".to_string(),
                    size: 10,
                    filename: None,
                }),
            )
            .with_document(locator(), Bytes::from(vec![0u8; 10]))
            .with_thumbnail(locator(), thumb.clone());
        let session = SessionHandle::new(Arc::new(fake), Duration::from_millis(10));

        let reply = serve(&session, true, None).await;

        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(drain(reply.body).await, thumb);
    }

    #[tokio::test]
    async fn missing_thumbnail_is_a_404() {
        let session = document_session(10, "video/mp4", Bytes::from(vec![0u8; 10]));
        let reply = serve(&session, true, None).await;
        assert_eq!(reply.status, 404);
        assert!(drain(reply.body).await.is_empty());
    }

    #[tokio::test]
    async fn photo_is_fetched_atomically() {
        let photo = Bytes::from_static(b"photobytes");
        let fake = FakeSession::new()
            .with_resource(locator(), MediaResource::Photo)
            .with_document(locator(), photo.clone());
        let session = SessionHandle::new(Arc::new(fake), Duration::from_millis(10));

        let reply = serve(&session, false, None).await;

        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type.as_deref(), Some("image/jpeg"));
        assert!(matches!(reply.body, MediaBody::Bytes(ref b) if *b == photo));
    }

    #[tokio::test]
    async fn unsupported_class_is_a_415_with_tag_body() {
        let fake = FakeSession::new().with_resource(
            locator(),
            MediaResource::Unsupported {
                class_tag: "MessageMediaGeo".to_string(),
            },
        );
        let session = SessionHandle::new(Arc::new(fake), Duration::from_millis(10));

        let reply = serve(&session, false, None).await;

        assert_eq!(reply.status, 415);
        assert_eq!(drain(reply.body).await, Bytes::from_static(b"MessageMediaGeo"));
    }

    #[tokio::test]
    async fn already_disconnected_client_is_a_noop() {
        let session = document_session(10, "video/mp4", Bytes::from(vec![0u8; 10]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let reply = serve_media(
            &session,
            &chat(),
            &encode_token(locator()),
            false,
            None,
            &cancel,
        )
        .await
        .unwrap();

        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn unready_session_escalates_after_the_bound() {
        let fake = FakeSession::new().disconnected();
        let session = SessionHandle::new(Arc::new(fake), Duration::from_millis(5));

        let result = serve_media(
            &session,
            &chat(),
            &encode_token(locator()),
            false,
            None,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(Error::UpstreamNotReady)));
    }
}
