use futures03::future::join_all;
use std::collections::BTreeSet;
use std::time::Instant;

use graph::prelude::*;

use super::{BatchKeyCollector, BatchResult, FieldLoader, Key, PendingBatch, PerRequestCache};

/// Where an operation is in its current resolution phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Fields are registering the keys they need
    Collecting,
    /// The batches of the phase are being loaded
    Dispatching,
    /// Every waiter of the last phase has its value
    Fulfilled,
}

/// Decides when the keys collected during a phase are handed to their
/// loaders. The execution engine signals the end of a phase by calling
/// `dispatch` once all fields of a depth level have registered their keys.
pub struct ResolutionScheduler {
    logger: Logger,
    phase: Phase,
    phases: usize,
    parallel: bool,
    log_timing: bool,
}

impl ResolutionScheduler {
    pub fn new(logger: &Logger, env: &EnvVars) -> Self {
        ResolutionScheduler {
            logger: logger.new(o!("component" => "ResolutionScheduler")),
            phase: Phase::Fulfilled,
            phases: 0,
            parallel: env.parallel_dispatch(),
            log_timing: env.log_loader_timing(),
        }
    }

    /// Load the batches of different fields one after the other instead of
    /// concurrently.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of phases that were dispatched so far
    pub fn phases(&self) -> usize {
        self.phases
    }

    /// Called whenever a key is registered.
    pub fn collecting(&mut self) {
        self.phase = Phase::Collecting;
    }

    /// Load everything the collector has accumulated, one loader call per
    /// field, and hand the results to the waiters. Results are written to
    /// `cache`. The failure of one field's loader only affects the waiters
    /// of that field.
    ///
    /// If `cancel` was canceled, nothing is loaded, all waiters fail with
    /// `Canceled` and so does `dispatch`. Loads run as separate tasks; if
    /// the operation is dropped while they are in flight, they complete and
    /// their results are discarded.
    ///
    /// Returns the number of batches that were loaded.
    pub async fn dispatch<C>(
        &mut self,
        collector: &mut BatchKeyCollector,
        cache: &mut PerRequestCache,
        cancel: &C,
    ) -> Result<usize, QueryExecutionError>
    where
        C: CancelToken + Sync,
    {
        let batches = collector.take();
        if batches.is_empty() {
            self.phase = Phase::Fulfilled;
            return Ok(0);
        }

        if cancel.is_canceled() {
            for batch in batches {
                batch.fail(QueryExecutionError::Canceled);
            }
            self.phase = Phase::Fulfilled;
            return Err(QueryExecutionError::Canceled);
        }

        self.phase = Phase::Dispatching;
        self.phases += 1;
        let count = batches.len();

        let results = if self.parallel {
            let loads = batches.iter().map(|batch| self.spawn_load(batch)).collect::<Vec<_>>();
            join_all(loads.into_iter().map(|(keys, handle)| async move {
                (keys, handle.await)
            }))
            .await
        } else {
            let mut results = Vec::with_capacity(batches.len());
            for batch in &batches {
                let (keys, handle) = self.spawn_load(batch);
                results.push((keys, handle.await));
            }
            results
        };

        for (batch, (keys, outcome)) in batches.into_iter().zip(results) {
            let field = batch.field().to_owned();
            let result = match outcome {
                Ok(Ok(values)) => Ok(values),
                Ok(Err(e)) => Err(QueryExecutionError::batch_load_failure(&field, &e)),
                Err(join_error) => Err(QueryExecutionError::batch_load_failure(
                    &field,
                    &anyhow!("batch loader task failed: {}", join_error),
                )),
            };

            if let Err(e) = &result {
                warn!(self.logger, "Batch load failed";
                      "field" => &field,
                      "keys" => keys.len(),
                      "error" => e.to_string(),
                      "code" => LogCode::BatchLoadFailure);
            }

            for (key, value) in batch.fulfill(result) {
                cache.insert(&field, key, value);
            }
        }

        self.phase = Phase::Fulfilled;
        Ok(count)
    }

    fn spawn_load(
        &self,
        batch: &PendingBatch,
    ) -> (
        BTreeSet<Key>,
        tokio::task::JoinHandle<Result<BatchResult<Value>, anyhow::Error>>,
    ) {
        let keys = batch.keys();
        let loader: Arc<dyn FieldLoader> = batch.loader();
        let logger = self.logger.cheap_clone();
        let field = batch.field().to_owned();
        let log_timing = self.log_timing;
        let task_keys = keys.clone();

        let handle = graph::spawn_allow_panic(async move {
            let start = Instant::now();
            let result = loader.load_values(&task_keys).await;
            if log_timing {
                debug!(logger, "Batch loaded";
                       "field" => &field,
                       "keys" => task_keys.len(),
                       "ok" => result.is_ok(),
                       "time_ms" => start.elapsed().as_millis() as u64);
            }
            result
        });
        (keys, handle)
    }
}

