use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid ledger state: {0}")]
    InvalidState(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("snapshot is corrupted: {0}")]
    Corruption(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
