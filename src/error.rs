//! Error types for the library

use thiserror::Error;

use crate::config::{MAX_BIT_COUNT, MAX_LAYER_COUNT, MIN_LAYER_COUNT};
use crate::storage::StorageError;

/// Failure reported by a [`crate::merkle::BatchWorker`] for one batch of leaves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct WorkerError(pub String);

impl WorkerError {
    pub fn new(message: impl Into<String>) -> Self {
        WorkerError(message.into())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("bit count must be between 1 and {}, got {}", MAX_BIT_COUNT, .0)]
    InvalidBitCount(usize),

    #[error(
        "layer count must be between {} and {}, got {}",
        MIN_LAYER_COUNT,
        MAX_LAYER_COUNT,
        .0
    )]
    InvalidLayerCount(usize),

    #[error("random bound must be positive, got {0}")]
    InvalidBound(i32),

    #[error("invalid builder configuration: {0}")]
    InvalidConfig(&'static str),

    /// The message digest produced something other than `0` or `1`.
    #[error("message digest contains non-binary symbol {0:?}")]
    NonBinaryDigest(char),

    #[error("malformed signature: {0}")]
    MalformedSignature(&'static str),

    #[error("leaf job starting at index {start_index} failed: {source}")]
    Job {
        start_index: usize,
        #[source]
        source: WorkerError,
    },

    #[error("worker pool disconnected before all jobs completed")]
    PoolDisconnected,

    #[error("failed to start worker pool: {0}")]
    Spawn(#[source] rayon::ThreadPoolBuildError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no merkle tree stored for wallet {0}")]
    TreeNotFound(String),

    #[error("merkle tree layer {0} is missing")]
    MissingLayer(usize),

    #[error("unsupported merkle tree version {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt merkle tree: {0}")]
    CorruptTree(String),
}

pub type Result<T> = std::result::Result<T, Error>;
