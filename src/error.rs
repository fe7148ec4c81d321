// src/error.rs
use std::path::PathBuf;

/// Failure to obtain the listing page. Always raised before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("GET {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("building http client")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("seen-state {} is unreadable: {reason}", path.display())]
    PersistedState { path: PathBuf, reason: String },

    #[error("rendering feed: {0}")]
    Render(String),

    #[error("writing {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WatchError {
    pub fn is_fetch(&self) -> bool {
        matches!(self, WatchError::Fetch(_))
    }
}
