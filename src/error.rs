use thiserror::Error;

pub type Result<T> = std::result::Result<T, KvError>;

/// Message carried by every successful response.
pub const MSG_SUCCESS: &str = "SUCCESS";

/// Error taxonomy shared by the store, the replicas and the coordinator.
///
/// The `Display` text of each variant is exactly what ends up in the
/// `message` field of the response sent back to a client.
#[derive(Error, Debug)]
pub enum KvError {
    #[error("ERROR: no such key")]
    NoSuchKey,

    #[error("ERROR: key too long")]
    KeyTooLong,

    #[error("ERROR: value too long")]
    ValueTooLong,

    #[error("ERROR: unable to access storage")]
    StorageUnavailable,

    #[error("ERROR: generic error")]
    Generic,

    #[error("ERROR: invalid request")]
    InvalidRequest,

    #[error("ERROR: connection failure: {0}")]
    ConnectionFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Initialization error: {0}")]
    Init(String),
}
