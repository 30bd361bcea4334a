//! Replay session adapter: serves recorded channel snapshots from disk.
//!
//! Snapshot layout, one directory per channel handle under the root:
//!
//! ```text
//! {root}/{handle}/channel.json    {"id": 1, "handle": "...", "title": "..."}
//! {root}/{handle}/messages.json   [{"id": 1, "text": "...", "date": 1700000000,
//!                                   "entities": [...],
//!                                   "media": {"file": "a.bin", "kind": "file",
//!                                             "mime": "application/octet-stream",
//!                                             "filename": "a.bin",
//!                                             "thumbnail": "a.jpg"}}, ...]
//! ```
//!
//! Media files live next to the json. The adapter implements the full
//! session port so the HTTP gateway can be exercised end to end (ranges,
//! chunked streaming, thumbnails) without a live upstream connection.

use std::{
    io::SeekFrom,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use serde::Deserialize;
use tokio::{
    fs,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tracing::debug;

use tgrss_core::{
    domain::{
        AttachmentKind, ByteRange, ChannelInfo, ChannelMessage, ChatRef, DocumentInfo,
        EntitySpan, MediaAttachment, MediaLocator, MediaResource, MessageId, SpanKind,
    },
    errors::Error,
    session::{BoxMediaStream, MediaStream, SessionClient},
    Result,
};

#[derive(Deserialize)]
struct ChannelRecord {
    id: i64,
    handle: String,
    title: String,
}

#[derive(Deserialize)]
struct MessageRecord {
    id: i32,
    #[serde(default)]
    text: String,
    date: i64,
    #[serde(default)]
    entities: Vec<SpanRecord>,
    #[serde(default)]
    media: Option<MediaRecord>,
}

#[derive(Deserialize)]
struct SpanRecord {
    offset: usize,
    length: usize,
    kind: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct MediaRecord {
    file: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    mime: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    /// Class tag for media classes the gateway refuses.
    #[serde(default)]
    unsupported: Option<String>,
}

pub struct ReplaySession {
    root: PathBuf,
    chunk_size: usize,
    connected: AtomicBool,
}

impl ReplaySession {
    pub async fn open(root: impl Into<PathBuf>, chunk_size: usize) -> Result<Self> {
        let root = root.into();
        let meta = fs::metadata(&root)
            .await
            .map_err(|e| Error::Config(format!("replay root {}: {e}", root.display())))?;
        if !meta.is_dir() {
            return Err(Error::Config(format!(
                "replay root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            chunk_size,
            connected: AtomicBool::new(true),
        })
    }

    fn channel_dir(&self, chat: &ChatRef) -> PathBuf {
        self.root.join(chat.to_string())
    }

    async fn load_channel(&self, chat: &ChatRef) -> Result<ChannelRecord> {
        let path = self.channel_dir(chat).join("channel.json");
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|_| Error::Session(format!("unknown channel: {chat}")))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn load_messages(&self, chat: &ChatRef) -> Result<Vec<MessageRecord>> {
        let path = self.channel_dir(chat).join("messages.json");
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|_| Error::Session(format!("unknown channel: {chat}")))?;
        let mut records: Vec<MessageRecord> = serde_json::from_str(&raw)?;
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn media_record(&self, chat: &ChatRef, locator: MediaLocator) -> Result<MediaRecord> {
        let records = self.load_messages(chat).await?;
        let record = records
            .into_iter()
            .find(|r| r.id == locator.message_id.0)
            .ok_or_else(|| Error::Session(format!("no message {}", locator.message_id.0)))?;
        // Snapshots carry at most one attachment per message.
        if locator.media_index != 0 {
            return Err(Error::Session(format!(
                "no attachment {} on message {}",
                locator.media_index, locator.message_id.0
            )));
        }
        record
            .media
            .ok_or_else(|| Error::Session(format!("message {} has no media", locator.message_id.0)))
    }

    async fn open_file(&self, chat: &ChatRef, name: &str) -> Result<fs::File> {
        Ok(fs::File::open(self.channel_dir(chat).join(name)).await?)
    }
}

#[async_trait]
impl SessionClient for ReplaySession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn resolve_entity(&self, chat: &ChatRef) -> Result<ChannelInfo> {
        let record = self.load_channel(chat).await?;
        Ok(ChannelInfo {
            id: record.id,
            handle: record.handle,
            title: record.title,
        })
    }

    async fn fetch_messages(
        &self,
        chat: &ChatRef,
        window: usize,
    ) -> Result<Vec<ChannelMessage>> {
        let mut records = self.load_messages(chat).await?;
        if records.len() > window {
            records = records.split_off(records.len() - window);
        }
        debug!(%chat, messages = records.len(), "replaying message window");
        records.into_iter().map(to_message).collect()
    }

    async fn resolve_media(
        &self,
        chat: &ChatRef,
        locator: MediaLocator,
    ) -> Result<MediaResource> {
        let record = self.media_record(chat, locator).await?;
        if let Some(class_tag) = record.unsupported {
            return Ok(MediaResource::Unsupported { class_tag });
        }
        if record.kind.as_deref() == Some("photo") {
            return Ok(MediaResource::Photo);
        }

        let path = self.channel_dir(chat).join(&record.file);
        let size = fs::metadata(&path).await?.len();
        Ok(MediaResource::Document(DocumentInfo {
            mime_type: record
                .mime
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size,
            filename: record.filename.or(Some(record.file)),
        }))
    }

    async fn download_media(&self, chat: &ChatRef, locator: MediaLocator) -> Result<Bytes> {
        let record = self.media_record(chat, locator).await?;
        let data = fs::read(self.channel_dir(chat).join(&record.file)).await?;
        Ok(Bytes::from(data))
    }

    async fn open_document_stream(
        &self,
        chat: &ChatRef,
        locator: MediaLocator,
        range: Option<ByteRange>,
    ) -> Result<BoxMediaStream> {
        let record = self.media_record(chat, locator).await?;
        let mut file = self.open_file(chat, &record.file).await?;

        let remaining = match range {
            Some(range) => {
                if range.offset > 0 {
                    file.seek(SeekFrom::Start(range.offset)).await?;
                }
                Some(range.byte_len())
            }
            None => None,
        };

        Ok(Box::new(FileStream {
            file,
            remaining,
            chunk_size: self.chunk_size,
        }))
    }

    async fn open_thumbnail_stream(
        &self,
        chat: &ChatRef,
        locator: MediaLocator,
    ) -> Result<BoxMediaStream> {
        let record = self.media_record(chat, locator).await?;
        let Some(thumbnail) = record.thumbnail else {
            return Err(Error::ThumbnailUnavailable);
        };
        let file = self
            .open_file(chat, &thumbnail)
            .await
            .map_err(|_| Error::ThumbnailUnavailable)?;
        Ok(Box::new(FileStream {
            file,
            remaining: None,
            chunk_size: self.chunk_size,
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

fn to_message(record: MessageRecord) -> Result<ChannelMessage> {
    let date = DateTime::from_timestamp(record.date, 0)
        .ok_or_else(|| Error::Session(format!("message {}: bad timestamp", record.id)))?;

    let entities = record
        .entities
        .into_iter()
        .filter_map(to_span)
        .collect();

    let media = record.media.map(|m| MediaAttachment {
        index: 0,
        kind: match m.kind.as_deref() {
            Some("photo") => AttachmentKind::Photo,
            Some("video") => AttachmentKind::Video,
            Some("audio") => AttachmentKind::Audio,
            _ => AttachmentKind::File,
        },
        filename: m.filename.or(Some(m.file)),
    });

    Ok(ChannelMessage {
        id: MessageId(record.id),
        text: record.text,
        entities,
        media,
        date,
    })
}

fn to_span(record: SpanRecord) -> Option<EntitySpan> {
    let kind = match record.kind.as_str() {
        "bold" => SpanKind::Bold,
        "italic" => SpanKind::Italic,
        "underline" => SpanKind::Underline,
        "strikethrough" => SpanKind::Strikethrough,
        "code" => SpanKind::Code,
        "pre" => SpanKind::Pre,
        "link" => SpanKind::Link {
            url: record.url.unwrap_or_default(),
        },
        "spoiler" => SpanKind::Spoiler,
        other => {
            debug!(kind = other, "skipping unknown entity kind");
            return None;
        }
    };
    Some(EntitySpan {
        offset: record.offset,
        length: record.length,
        kind,
    })
}

struct FileStream {
    file: fs::File,
    remaining: Option<u64>,
    chunk_size: usize,
}

#[async_trait]
impl MediaStream for FileStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let cap = match self.remaining {
            Some(0) => return Ok(None),
            Some(remaining) => self.chunk_size.min(remaining as usize),
            None => self.chunk_size,
        };

        let mut buf = vec![0u8; cap];
        let n = self.file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= n as u64;
        }
        buf.truncate(n);
        Ok(Some(Bytes::from(buf)))
    }
}
