//! Tunables for key derivation and tree generation.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Message bits signed per leaf (and Lamport key pairs per leaf).
pub const DEFAULT_BIT_COUNT: usize = 100;

/// The message digest bit string drops the leading zeros of its first byte, so
/// it is never shorter than 1 + 31 * 8 characters.
pub const MAX_BIT_COUNT: usize = 249;

/// Leaves handed to a worker per job.
pub const KEYS_PER_JOB: usize = 100;

pub const MIN_LAYER_COUNT: usize = 2;
pub const MAX_LAYER_COUNT: usize = 24;

/// Explicit configuration for [`crate::merkle::MerkleTreeBuilder`].
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    pub bit_count: usize,
    pub keys_per_job: usize,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            bit_count: DEFAULT_BIT_COUNT,
            keys_per_job: KEYS_PER_JOB,
            workers: None,
        }
    }
}

impl BuilderConfig {
    pub fn with_bit_count(mut self, bit_count: usize) -> Self {
        self.bit_count = bit_count;
        self
    }

    pub fn with_keys_per_job(mut self, keys_per_job: usize) -> Self {
        self.keys_per_job = keys_per_job;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_bit_count(self.bit_count)?;
        if self.keys_per_job == 0 {
            return Err(Error::InvalidConfig("keys_per_job must be at least 1"));
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig("workers must be at least 1"));
        }
        Ok(())
    }
}

pub fn check_bit_count(bit_count: usize) -> Result<()> {
    if bit_count == 0 || bit_count > MAX_BIT_COUNT {
        return Err(Error::InvalidBitCount(bit_count));
    }
    Ok(())
}

pub fn check_layer_count(layer_count: usize) -> Result<()> {
    if !(MIN_LAYER_COUNT..=MAX_LAYER_COUNT).contains(&layer_count) {
        return Err(Error::InvalidLayerCount(layer_count));
    }
    Ok(())
}
