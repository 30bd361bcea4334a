use std::{
    env, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed runtime configuration, loaded from the environment (with a
/// best-effort `.env` file for local runs).
#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// External base URL embedded in attachment links.
    pub public_base_url: String,
    /// Message window fetched per feed build.
    pub feed_window: usize,
    /// Bound for the one-shot session readiness wait.
    pub ready_wait: Duration,
    /// Upstream read chunk size for document streaming.
    pub chunk_size: usize,
    /// Root directory of recorded channel snapshots (replay adapter).
    pub replay_root: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let listen_addr = match env_str("TGRSS_LISTEN_ADDR") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| Error::Config(format!("TGRSS_LISTEN_ADDR: {e}")))?,
            None => SocketAddr::from(([127, 0, 0, 1], 1200)),
        };

        let public_base_url =
            env_str("TGRSS_PUBLIC_BASE_URL").unwrap_or_else(|| format!("http://{listen_addr}"));

        let feed_window = env_usize("TGRSS_FEED_WINDOW").unwrap_or(50);
        if feed_window == 0 {
            return Err(Error::Config(
                "TGRSS_FEED_WINDOW must be positive".to_string(),
            ));
        }

        let ready_wait = Duration::from_millis(env_u64("TGRSS_READY_WAIT_MS").unwrap_or(1000));

        let chunk_size = env_usize("TGRSS_CHUNK_SIZE").unwrap_or(64 * 1024);
        if chunk_size == 0 {
            return Err(Error::Config("TGRSS_CHUNK_SIZE must be positive".to_string()));
        }

        let replay_root = env_str("TGRSS_REPLAY_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("channels"));

        Ok(Self {
            listen_addr,
            public_base_url,
            feed_window,
            ready_wait,
            chunk_size,
            replay_root,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}
