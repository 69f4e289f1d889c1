use config::ConfigError;
use record::AddressError;
use sparse::IndexError;
use thiserror::Error;

/// Errors from [`ByteSpace`](crate::ByteSpace) operations.
///
/// Argument errors are raised before anything is changed. Address errors
/// raised in the middle of a write leave the chunks placed so far in the
/// document.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("address must not be negative, got {0}")]
    NegativeAddress(i64),

    #[error("length must not be negative, got {0}")]
    NegativeLength(i64),

    /// The cached index points at a record that is gone or no longer holds
    /// data. Call [`refresh_index`](crate::ByteSpace::refresh_index).
    #[error("cached index is stale at document position {0}; refresh it")]
    StaleIndex(usize),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Index(IndexError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IndexError> for SpaceError {
    fn from(e: IndexError) -> Self {
        match e {
            IndexError::Address(e) => SpaceError::Address(e),
            IndexError::StalePosition(pos) => SpaceError::StaleIndex(pos),
            other => SpaceError::Index(other),
        }
    }
}
