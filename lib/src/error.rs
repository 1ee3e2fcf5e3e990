//! Error types for the gateways and the local store

use thiserror::Error;

/// Failure of a single JSON request
#[derive(Debug, Error)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("HTTP error {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection, DNS, timeout or an unreadable body
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    pub(crate) fn transport(
        url: &url::Url,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// A `{ result: [...] }` envelope that could not be turned into records
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("envelope `result` is not a list")]
    NotAList,

    #[error("malformed record in envelope: {0}")]
    Record(#[from] serde_json::Error),
}

/// Storage backend failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a stored document was rejected on read
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("stored document is not valid JSON: {0}")]
    Json(serde_json::Error),

    #[error("stored document is missing the `{0}` collection")]
    MissingCollection(&'static str),
}

/// Errors surfaced by gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Requested entity is absent from the local store
    #[error("{collection} record {id} not found")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A bundled fallback dataset failed to parse
    #[error("fallback dataset {name} is malformed: {source}")]
    Fallback {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for gateway operations
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;
