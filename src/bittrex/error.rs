use thiserror::Error;

/// Failure while pulling candles from the market-data provider.
///
/// Everything that goes wrong before the normalizer sees a record surfaces as
/// one of these variants. `Transport` and `Status` are considered transient
/// and are retried by the client; the rest are not.
#[derive(Debug, Error)]
pub enum RemoteDataError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("BITTREX: {0}")]
    Provider(String),

    #[error("failed to decode ticks payload: {error} for payload: {payload}")]
    Decode {
        error: serde_json::Error,
        payload: String,
    },

    #[error("malformed tick record #{index}: {reason}")]
    Malformed { index: usize, reason: String },
}

impl RemoteDataError {
    /// Whether the same request may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}
