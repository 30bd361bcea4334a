use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::warn;

use crate::{errors::Error, session::port::SessionClient, Result};

/// Lifecycle-managed handle to the shared upstream session.
///
/// The session is initialized once at startup and injected wherever it is
/// needed; this handle adds the bounded readiness wait and clean shutdown
/// on top of the raw client.
#[derive(Clone)]
pub struct SessionHandle {
    client: Arc<dyn SessionClient>,
    ready_wait: Duration,
}

impl SessionHandle {
    pub fn new(client: Arc<dyn SessionClient>, ready_wait: Duration) -> Self {
        Self { client, ready_wait }
    }

    pub fn client(&self) -> &dyn SessionClient {
        self.client.as_ref()
    }

    pub fn is_healthy(&self) -> bool {
        self.client.is_connected()
    }

    /// Single bounded wait for the connection, never a retry loop.
    /// Exceeding the bound is a failure, not a silent hang.
    pub async fn ready(&self) -> Result<()> {
        if self.client.is_connected() {
            return Ok(());
        }
        sleep(self.ready_wait).await;
        if self.client.is_connected() {
            return Ok(());
        }
        warn!(
            "upstream session still not connected after {:?}",
            self.ready_wait
        );
        Err(Error::UpstreamNotReady)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.client.shutdown().await
    }
}
