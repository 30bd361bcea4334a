//! Hand-rolled session fake shared by the core test modules.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    domain::{ByteRange, ChannelInfo, ChannelMessage, ChatRef, MediaLocator, MediaResource},
    errors::Error,
    session::{BoxMediaStream, MediaStream, SessionClient},
    Result,
};

pub(crate) struct FakeSession {
    pub connected: bool,
    pub info: ChannelInfo,
    pub messages: Vec<ChannelMessage>,
    pub resources: HashMap<MediaLocator, MediaResource>,
    pub documents: HashMap<MediaLocator, Bytes>,
    pub thumbnails: HashMap<MediaLocator, Bytes>,
    pub chunk_size: usize,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            connected: true,
            info: ChannelInfo {
                id: 1,
                handle: "chan".to_string(),
                title: "Test Channel".to_string(),
            },
            messages: Vec::new(),
            resources: HashMap::new(),
            documents: HashMap::new(),
            thumbnails: HashMap::new(),
            chunk_size: 100,
        }
    }

    pub fn with_messages(mut self, messages: Vec<ChannelMessage>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_resource(mut self, locator: MediaLocator, resource: MediaResource) -> Self {
        self.resources.insert(locator, resource);
        self
    }

    pub fn with_document(mut self, locator: MediaLocator, data: Bytes) -> Self {
        self.documents.insert(locator, data);
        self
    }

    pub fn with_thumbnail(mut self, locator: MediaLocator, data: Bytes) -> Self {
        self.thumbnails.insert(locator, data);
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    fn chunked(&self, data: Bytes) -> BoxMediaStream {
        let mut chunks = VecDeque::new();
        let mut rest = data;
        while !rest.is_empty() {
            let take = self.chunk_size.min(rest.len());
            chunks.push_back(rest.split_to(take));
        }
        Box::new(VecStream(chunks))
    }
}

#[async_trait]
impl SessionClient for FakeSession {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn resolve_entity(&self, _chat: &ChatRef) -> Result<ChannelInfo> {
        Ok(self.info.clone())
    }

    async fn fetch_messages(
        &self,
        _chat: &ChatRef,
        window: usize,
    ) -> Result<Vec<ChannelMessage>> {
        let mut messages = self.messages.clone();
        if messages.len() > window {
            messages = messages.split_off(messages.len() - window);
        }
        Ok(messages)
    }

    async fn resolve_media(
        &self,
        _chat: &ChatRef,
        locator: MediaLocator,
    ) -> Result<MediaResource> {
        self.resources
            .get(&locator)
            .cloned()
            .ok_or_else(|| Error::Session(format!("no media at {locator:?}")))
    }

    async fn download_media(&self, _chat: &ChatRef, locator: MediaLocator) -> Result<Bytes> {
        self.documents
            .get(&locator)
            .cloned()
            .ok_or_else(|| Error::Session(format!("no media at {locator:?}")))
    }

    async fn open_document_stream(
        &self,
        _chat: &ChatRef,
        locator: MediaLocator,
        range: Option<ByteRange>,
    ) -> Result<BoxMediaStream> {
        let data = self
            .documents
            .get(&locator)
            .cloned()
            .ok_or_else(|| Error::Session(format!("no media at {locator:?}")))?;
        let data = match range {
            Some(range) => {
                let start = (range.offset as usize).min(data.len());
                let end = ((range.limit + 1) as usize).min(data.len());
                data.slice(start..end)
            }
            None => data,
        };
        Ok(self.chunked(data))
    }

    async fn open_thumbnail_stream(
        &self,
        _chat: &ChatRef,
        locator: MediaLocator,
    ) -> Result<BoxMediaStream> {
        let data = self
            .thumbnails
            .get(&locator)
            .cloned()
            .ok_or(Error::ThumbnailUnavailable)?;
        Ok(self.chunked(data))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

struct VecStream(VecDeque<Bytes>);

#[async_trait]
impl MediaStream for VecStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.0.pop_front())
    }
}
