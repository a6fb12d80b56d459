use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::error::{Error, Result, WorkerError};
use crate::merkle::builder::{BatchWorker, LeafBatch};

/// What a worker reports back for one batch.
pub(crate) struct BatchOutput {
    pub(crate) start_index: usize,
    pub(crate) result: std::result::Result<Vec<String>, WorkerError>,
}

/// A fixed set of rayon threads owned by a single tree build.
pub(crate) struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub(crate) fn new(size: usize) -> Result<WorkerPool> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|id| format!("leaf-worker-{id}"))
            .build()
            .map_err(Error::Spawn)?;
        debug!(workers = size, "leaf worker pool started");
        Ok(WorkerPool { pool })
    }

    /// Runs every batch on the pool and hands each output to `accept` on the
    /// calling thread as soon as it arrives.
    ///
    /// The first error returned by `accept` is returned from `run`; batches
    /// that have not started by then are skipped.
    pub(crate) fn run<F>(
        &self,
        worker: &dyn BatchWorker,
        batches: Vec<LeafBatch>,
        mut accept: F,
    ) -> Result<()>
    where
        F: FnMut(BatchOutput) -> Result<()>,
    {
        let total = batches.len();
        let abort = AtomicBool::new(false);
        let (results_tx, results) = mpsc::channel();

        self.pool.in_place_scope(|scope| {
            let abort = &abort;
            scope.spawn(move |_| {
                batches
                    .into_par_iter()
                    .for_each_with(results_tx, |results, batch| {
                        if abort.load(Ordering::SeqCst) {
                            return;
                        }
                        // The receiver is gone only once the build has given up.
                        let _ = results.send(process(worker, batch));
                    });
            });

            let collected = (0..total).try_for_each(|_| {
                let output = results.recv().map_err(|_| Error::PoolDisconnected)?;
                accept(output)
            });
            if collected.is_err() {
                abort.store(true, Ordering::SeqCst);
            }
            collected
        })
    }
}

fn process(worker: &dyn BatchWorker, batch: LeafBatch) -> BatchOutput {
    let result = panic::catch_unwind(AssertUnwindSafe(|| worker.process(&batch)))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            warn!(start_index = batch.start_index, %message, "leaf worker panicked");
            Err(WorkerError::new(format!("worker panicked: {message}")))
        });
    BatchOutput {
        start_index: batch.start_index,
        result,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
