use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Pull-based chunk stream over one opened media handle.
///
/// Dropping the stream releases the handle, so release happens exactly
/// once no matter which exit path (EOF, byte budget, cancellation) ends
/// the transfer.
#[async_trait]
pub trait MediaStream: Send {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

pub type BoxMediaStream = Box<dyn MediaStream>;

/// Wraps an upstream stream with the gateway-side stop conditions: a
/// cancellation token checked at every pull and an optional byte budget.
/// Once either fires (or upstream reports EOF or an error) the inner
/// stream is dropped and no further upstream chunks are requested.
pub struct StreamGuard {
    inner: Option<BoxMediaStream>,
    cancel: CancellationToken,
    remaining: Option<u64>,
}

impl StreamGuard {
    pub fn new(inner: BoxMediaStream, cancel: CancellationToken, budget: Option<u64>) -> Self {
        Self {
            inner: Some(inner),
            cancel,
            remaining: budget,
        }
    }

    fn finish(&mut self) {
        self.inner = None;
    }
}

#[async_trait]
impl MediaStream for StreamGuard {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.cancel.is_cancelled() || matches!(self.remaining, Some(0)) {
            self.finish();
            return Ok(None);
        }
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };

        let chunk = match inner.next_chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                self.finish();
                return Ok(None);
            }
            Err(e) => {
                self.finish();
                return Err(e);
            }
        };

        let Some(remaining) = self.remaining.as_mut() else {
            return Ok(Some(chunk));
        };

        let take = (*remaining).min(chunk.len() as u64);
        *remaining -= take;
        let chunk = if take < chunk.len() as u64 {
            chunk.slice(0..take as usize)
        } else {
            chunk
        };
        if *remaining == 0 {
            self.finish();
        }
        Ok(Some(chunk))
    }
}
