use ccdb_core::StoreError;
use ccdb_scraper::{FetchError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The document was fetched but matches no known page layout.
    #[error("failed to parse document for {target}: {source}")]
    Parse {
        target: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Transport and temporary source failures; the next tick may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Fetch(e) => e.is_retryable(),
            SyncError::Parse { .. } | SyncError::Store(_) => false,
        }
    }

    /// The source changed its behaviour and someone has to look at it.
    #[must_use]
    pub fn requires_operator(&self) -> bool {
        matches!(
            self,
            SyncError::Fetch(FetchError::Unknown { .. }) | SyncError::Parse { .. }
        )
    }
}
