use std::sync::Arc;

use tracing::info;

use tgrss_core::{
    config::Config,
    errors::Error,
    session::SessionHandle,
};
use tgrss_http::{router::router, AppState};
use tgrss_replay::ReplaySession;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tgrss_core::logging::init("tgrss")?;

    let cfg = Arc::new(Config::load()?);

    let client = ReplaySession::open(cfg.replay_root.clone(), cfg.chunk_size).await?;
    let session = SessionHandle::new(Arc::new(client), cfg.ready_wait);

    let app = router(AppState {
        cfg: cfg.clone(),
        session: session.clone(),
    });

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr)
        .await
        .map_err(|e| Error::Config(format!("bind {}: {e}", cfg.listen_addr)))?;
    info!(addr = %cfg.listen_addr, root = %cfg.replay_root.display(), "serving channel feeds");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .map_err(|e| Error::Session(format!("server failed: {e}")))?;

    session.shutdown().await?;
    Ok(())
}
