use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Channel/user reference: a public handle or a numeric id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatRef {
    Handle(String),
    Id(i64),
}

impl ChatRef {
    /// All-numeric path segments are ids, everything else is a handle.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => ChatRef::Id(id),
            Err(_) => ChatRef::Handle(raw.trim_start_matches('@').to_string()),
        }
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Handle(handle) => write!(f, "{handle}"),
            ChatRef::Id(id) => write!(f, "{id}"),
        }
    }
}

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub i32);

/// Address of one attachment of one message within a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MediaLocator {
    pub message_id: MessageId,
    pub media_index: u32,
}

/// Channel metadata as resolved by the session client.
#[derive(Clone, Debug)]
pub struct ChannelInfo {
    pub id: i64,
    pub handle: String,
    pub title: String,
}

/// Inline formatting span over the message text, in character offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitySpan {
    pub offset: usize,
    pub length: usize,
    pub kind: SpanKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpanKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Pre,
    Link { url: String },
    Spoiler,
}

/// Attachment shape hint used when rendering feed placeholders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Video,
    Audio,
    File,
}

#[derive(Clone, Debug)]
pub struct MediaAttachment {
    pub index: u32,
    pub kind: AttachmentKind,
    pub filename: Option<String>,
}

/// One message of a channel window; immutable once fetched.
#[derive(Clone, Debug)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub text: String,
    pub entities: Vec<EntitySpan>,
    pub media: Option<MediaAttachment>,
    pub date: DateTime<Utc>,
}

/// A media token resolved against the upstream session.
#[derive(Clone, Debug)]
pub enum MediaResource {
    /// Random-access streamable.
    Document(DocumentInfo),
    /// Atomic, whole-object fetch only.
    Photo,
    Unsupported { class_tag: String },
}

#[derive(Clone, Debug)]
pub struct DocumentInfo {
    pub mime_type: String,
    pub size: u64,
    pub filename: Option<String>,
}

/// Inclusive byte range; `offset <= limit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub limit: u64,
}

impl ByteRange {
    pub fn byte_len(&self) -> u64 {
        self.limit - self.offset + 1
    }
}

/// One syndicated entry.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
    pub author: String,
}

/// Feed payload handed to the serialization layer.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(rename = "item")]
    pub items: Vec<FeedItem>,
    pub allow_empty: bool,
}
