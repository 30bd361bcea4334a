//! Feed aggregation: a channel message window grouped into feed items.

use tracing::debug;

use crate::{
    domain::{ChannelMessage, ChatRef, Feed, FeedItem, MediaLocator},
    medialink::{attachment_html, encode_token},
    render::render_entities,
    session::SessionHandle,
    Result,
};

const TITLE_MAX_CHARS: usize = 80;

/// Build a feed from the latest `window` messages of `chat`.
///
/// Messages are processed oldest to newest. Attachment-only messages are
/// buffered and attached to the next text-bearing message; a buffer still
/// pending at the end of the window is force-flushed into a final item so
/// trailing attachments are never dropped.
pub async fn build_feed(
    session: &SessionHandle,
    base_url: &str,
    chat: &ChatRef,
    window: usize,
    allow_empty: bool,
) -> Result<Feed> {
    session.ready().await?;

    let info = session.client().resolve_entity(chat).await?;
    let messages = session.client().fetch_messages(chat, window).await?;
    debug!(channel = %info.handle, messages = messages.len(), "building feed");

    let mut items = Vec::new();
    let mut attachments: Vec<String> = Vec::new();

    let last = messages.len();
    for (i, message) in messages.iter().enumerate() {
        if let Some(media) = &message.media {
            let token = encode_token(MediaLocator {
                message_id: message.id,
                media_index: media.index,
            });
            attachments.push(attachment_html(base_url, &info.handle, &token, media));
        }

        if !message.text.is_empty() || i + 1 == last {
            let mut description = attachments.join("\n");
            attachments.clear();

            if !message.text.is_empty() {
                description.push_str(&format!(
                    "<p>{}</p>",
                    render_entities(&message.text, &message.entities)
                ));
            }

            items.push(FeedItem {
                title: item_title(message),
                link: format!("https://t.me/s/{}/{}", info.handle, message.id.0),
                description,
                pub_date: display_date(message),
                author: format!("{} (@{})", info.title, info.handle),
            });
        }
    }

    Ok(Feed {
        title: info.title.clone(),
        link: format!("https://t.me/{}", info.handle),
        description: format!("@{} on Telegram", info.handle),
        items,
        allow_empty,
    })
}

fn item_title(message: &ChannelMessage) -> String {
    if message.text.is_empty() {
        return display_date(message);
    }
    let mut title: String = message.text.chars().take(TITLE_MAX_CHARS).collect();
    if message.text.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

fn display_date(message: &ChannelMessage) -> String {
    message.date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
