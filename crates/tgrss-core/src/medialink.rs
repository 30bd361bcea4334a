//! Media tokens and feed attachment placeholders.
//!
//! A token addresses one attachment of one message and decodes without any
//! server-side session state: it is the URL-safe base64 of
//! `"{message_id}/{media_index}"`, which keeps it injective per channel and
//! stable for as long as the underlying media stays fetchable.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::{
    domain::{AttachmentKind, MediaAttachment, MediaLocator, MessageId},
    errors::Error,
    render::escape_html,
    Result,
};

pub fn encode_token(locator: MediaLocator) -> String {
    URL_SAFE_NO_PAD.encode(format!(
        "{}/{}",
        locator.message_id.0, locator.media_index
    ))
}

pub fn decode_token(token: &str) -> Result<MediaLocator> {
    let bad = |reason: &str| Error::TokenDecode(format!("{token}: {reason}"));

    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| bad("not base64"))?;
    let raw = String::from_utf8(raw).map_err(|_| bad("not utf-8"))?;
    let (id, index) = raw.split_once('/').ok_or_else(|| bad("missing separator"))?;

    Ok(MediaLocator {
        message_id: MessageId(id.parse().map_err(|_| bad("bad message id"))?),
        media_index: index.parse().map_err(|_| bad("bad media index"))?,
    })
}

/// Gateway URL for one attachment.
pub fn media_url(base_url: &str, channel: &str, token: &str) -> String {
    format!("{}/channel/{channel}/{token}", base_url.trim_end_matches('/'))
}

/// Render the HTML placeholder embedded in a feed item for one attachment.
pub fn attachment_html(
    base_url: &str,
    channel: &str,
    token: &str,
    attachment: &MediaAttachment,
) -> String {
    let url = media_url(base_url, channel, token);
    match attachment.kind {
        AttachmentKind::Photo => format!(r#"<img src="{url}">"#),
        AttachmentKind::Video => {
            format!(r#"<video controls src="{url}" poster="{url}?thumb"></video>"#)
        }
        AttachmentKind::Audio => format!(r#"<audio controls src="{url}"></audio>"#),
        AttachmentKind::File => {
            let label = attachment.filename.as_deref().unwrap_or("attachment");
            format!(r#"<a href="{url}">{}</a>"#, escape_html(label))
        }
    }
}
