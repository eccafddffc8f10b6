use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection failure or failed health check against the model provider.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Required model '{model}' not found on provider")]
    ProviderModelMissing { model: String },

    #[error("Provider request timed out after {}s", .after.as_secs_f32())]
    ProviderTimeout { after: Duration },

    #[error("Provider returned HTTP {status} for {url}")]
    ProviderHttp { status: u16, url: String },

    #[error("Malformed provider response: {0}")]
    ProviderResponse(String),

    #[error("Store operation failed: {0}")]
    Store(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        Error::Store(err.to_string())
    }

    /// True for failures raised by the model provider, false for local ones.
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnavailable(_)
                | Error::ProviderModelMissing { .. }
                | Error::ProviderTimeout { .. }
                | Error::ProviderHttp { .. }
                | Error::ProviderResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
