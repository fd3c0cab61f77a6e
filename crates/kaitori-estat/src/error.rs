use kaitori_core::CoreError;
use thiserror::Error;

/// Errors returned by the e-Stat API client.
#[derive(Debug, Error)]
pub enum EstatError {
    /// Network or TLS failure, or a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `RESULT.STATUS` was non-zero.
    #[error("e-Stat API error (status {status}): {message}")]
    ApiError { status: i64, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// The region name is not in the municipality table.
    #[error(transparent)]
    Region(#[from] CoreError),
}
