//! Parallel construction of a [`MerkleTree`] from a root secret.
//!
//! Leaf seeds are drawn sequentially from the root secret, since each one
//! depends on every draw before it. Turning seeds into leaf commitments is the
//! expensive part and is split into batches that run on a worker pool. Batches
//! may finish in any order; the leaves are put back in index order before the
//! tree is assembled.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::{check_layer_count, BuilderConfig};
use crate::error::{Error, Result, WorkerError};
use crate::lamport::leaf_commitment;
use crate::merkle::pool::{BatchOutput, WorkerPool};
use crate::merkle::{LeafSeeds, MerkleTree};

/// Share of the progress range covered by leaf generation. The rest is left
/// for tree assembly.
const GENERATION_PROGRESS: f64 = 0.99;

/// A run of consecutive leaf seeds handed to one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafBatch {
    /// Index of the first leaf in the batch.
    pub start_index: usize,
    pub bit_count: usize,
    pub seeds: Vec<Vec<u8>>,
}

/// Turns a batch of leaf seeds into leaf commitments, one per seed and in
/// seed order.
pub trait BatchWorker: Send + Sync {
    fn process(&self, batch: &LeafBatch) -> std::result::Result<Vec<String>, WorkerError>;
}

/// The standard worker: a one-time Lamport key commitment per seed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LamportBatchWorker;

impl BatchWorker for LamportBatchWorker {
    fn process(&self, batch: &LeafBatch) -> std::result::Result<Vec<String>, WorkerError> {
        Ok(batch
            .seeds
            .iter()
            .map(|seed| leaf_commitment(seed, batch.bit_count))
            .collect())
    }
}

pub struct MerkleTreeBuilder {
    config: BuilderConfig,
    worker: Arc<dyn BatchWorker>,
}

impl MerkleTreeBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        MerkleTreeBuilder::with_worker(config, Arc::new(LamportBatchWorker))
    }

    pub fn with_worker(config: BuilderConfig, worker: Arc<dyn BatchWorker>) -> Self {
        MerkleTreeBuilder { config, worker }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Builds the tree of `2^(layer_count - 1)` leaves derived from
    /// `root_secret`.
    pub fn generate<A: AsRef<[u8]>>(&self, root_secret: A, layer_count: usize) -> Result<MerkleTree> {
        self.generate_with_progress(root_secret, layer_count, |_| {})
    }

    /// Like [`MerkleTreeBuilder::generate`], reporting progress in `[0, 0.99]`
    /// after each finished batch.
    ///
    /// The first failing batch aborts the whole build: queued batches are
    /// skipped and that batch's error is returned.
    pub fn generate_with_progress<A, F>(
        &self,
        root_secret: A,
        layer_count: usize,
        mut progress: F,
    ) -> Result<MerkleTree>
    where
        A: AsRef<[u8]>,
        F: FnMut(f64),
    {
        check_layer_count(layer_count)?;
        self.config.validate()?;

        let leaf_count = 1usize << (layer_count - 1);
        let batches = self.batches(root_secret.as_ref(), leaf_count);
        let total = batches.len();
        let workers = self.config.worker_count().min(total);
        info!(
            leaves = leaf_count,
            jobs = total,
            workers,
            bit_count = self.config.bit_count,
            "generating merkle tree"
        );

        let pool = WorkerPool::new(workers)?;
        let mut done = Vec::with_capacity(total);
        let collected = pool.run(&*self.worker, batches, |output| {
            let expected = self
                .config
                .keys_per_job
                .min(leaf_count.saturating_sub(output.start_index));
            let leaves = checked_output(output, expected)?;
            debug!(start_index = leaves.0, leaves = leaves.1.len(), "leaf job finished");
            done.push(leaves);
            progress(done.len() as f64 / total as f64 * GENERATION_PROGRESS);
            Ok(())
        });
        if let Err(err) = &collected {
            error!(%err, "aborting merkle tree generation");
        }
        collected?;

        done.sort_unstable_by_key(|(start_index, _)| *start_index);
        let leaves: Vec<String> = done.into_iter().flat_map(|(_, leaves)| leaves).collect();
        let tree = MerkleTree::from_leaves(leaves)?;
        info!(layers = tree.layers().len(), "merkle tree generated");
        Ok(tree)
    }

    /// Draws the leaf seeds in index order, moving them straight into batches
    /// of `keys_per_job`.
    fn batches(&self, root_secret: &[u8], leaf_count: usize) -> Vec<LeafBatch> {
        let bit_count = self.config.bit_count;
        let keys_per_job = self.config.keys_per_job;
        let mut seeds = LeafSeeds::new(root_secret, bit_count);
        (0..leaf_count)
            .step_by(keys_per_job)
            .map(|start_index| LeafBatch {
                start_index,
                bit_count,
                seeds: seeds
                    .by_ref()
                    .take(keys_per_job.min(leaf_count - start_index))
                    .collect(),
            })
            .collect()
    }
}

fn checked_output(output: BatchOutput, expected: usize) -> Result<(usize, Vec<String>)> {
    let start_index = output.start_index;
    match output.result {
        Ok(leaves) if leaves.len() == expected => Ok((start_index, leaves)),
        Ok(leaves) => Err(Error::Job {
            start_index,
            source: WorkerError::new(format!(
                "expected {expected} commitments, got {}",
                leaves.len()
            )),
        }),
        Err(source) => Err(Error::Job {
            start_index,
            source,
        }),
    }
}
