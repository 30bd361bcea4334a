use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    domain::{ByteRange, ChannelInfo, ChannelMessage, ChatRef, MediaLocator, MediaResource},
    session::stream::BoxMediaStream,
    Result,
};

/// Upstream messaging session port.
///
/// The production implementation owns the long-lived MTProto connection;
/// the replay adapter serves recorded channel snapshots from disk. The
/// gateway and the feed aggregator only ever see this trait.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Connection health; checked by the lifecycle handle before first use.
    fn is_connected(&self) -> bool;

    async fn resolve_entity(&self, chat: &ChatRef) -> Result<ChannelInfo>;

    /// Latest `window` messages in chronological (oldest to newest) order.
    async fn fetch_messages(&self, chat: &ChatRef, window: usize)
        -> Result<Vec<ChannelMessage>>;

    async fn resolve_media(&self, chat: &ChatRef, locator: MediaLocator)
        -> Result<MediaResource>;

    /// Whole-object fetch for media without random access (photos).
    async fn download_media(&self, chat: &ChatRef, locator: MediaLocator) -> Result<Bytes>;

    /// Open a chunked document stream, optionally bounded to an inclusive range.
    async fn open_document_stream(
        &self,
        chat: &ChatRef,
        locator: MediaLocator,
        range: Option<ByteRange>,
    ) -> Result<BoxMediaStream>;

    async fn open_thumbnail_stream(
        &self,
        chat: &ChatRef,
        locator: MediaLocator,
    ) -> Result<BoxMediaStream>;

    /// Release the underlying connection. Called once at shutdown.
    async fn shutdown(&self) -> Result<()>;
}
