use thiserror::Error;

use tandem_core::LinkError;

/// Storage-layer failures: either a domain rule fired (`Link`) or the
/// database itself misbehaved (`Db`). The API layer maps `Link` variants
/// onto client errors and treats `Db` as infrastructure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl StoreError {
    pub fn as_link(&self) -> Option<&LinkError> {
        match self {
            StoreError::Link(e) => Some(e),
            StoreError::Db(_) => None,
        }
    }
}
