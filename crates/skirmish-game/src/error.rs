//! Error types for the game layer.

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The key can't be used with this store (e.g. it isn't a safe file
    /// name for [`FileStore`](crate::FileStore)).
    #[error("invalid store key: {0}")]
    InvalidKey(String),

    /// The backend refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by [`GameHandle`](crate::GameHandle) operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The stored state couldn't be read. The mutation was not applied.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The game actor's channel is closed (the task has stopped).
    #[error("game actor is unavailable")]
    Unavailable,
}
