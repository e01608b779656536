use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Malformed request body: {0}")]
    MalformedInput(String),
    #[error("Invalid data")]
    InvalidInput(String),
    #[error("User not found")]
    UserNotFound(String),
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Transaction conflict")]
    TransactionConflict,
    #[error("Transaction aborted after {attempts} conflicting attempts")]
    TransactionAborted { attempts: u32 },
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDB(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentError {
    /// True for failures caused by the request itself rather than the store.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput(_)
                | Self::InvalidInput(_)
                | Self::UserNotFound(_)
                | Self::InsufficientBalance
        )
    }

    /// Reason attached to an `InvalidInput` failure.
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::InvalidInput(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
