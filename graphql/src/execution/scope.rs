use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use graph::prelude::*;

use crate::loader::{
    BatchKeyCollector, FieldLoader, Key, LoadHandle, PerRequestCache, Phase, ResolutionScheduler,
};

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Everything that lives exactly as long as one GraphQL operation: its
/// cache of loaded values, the keys collected for the current phase and
/// the means to cancel it. A scope is never shared between operations, so
/// two concurrent operations can not see each other's cached values.
pub struct OperationScope {
    id: u64,
    logger: Logger,
    cache: PerRequestCache,
    collector: BatchKeyCollector,
    scheduler: ResolutionScheduler,
    cancel: CancelHandle,
    // Keeps `cancel` alive for scopes that own their cancelation
    guard: Option<CancelGuard>,
    deadline: Option<Instant>,
}

impl OperationScope {
    /// A scope that is canceled when the guard behind `cancel` goes away.
    pub fn new(logger: &Logger, cancel: CancelHandle) -> Self {
        Self::with_env(logger, cancel, &ENV_VARS)
    }

    pub fn with_env(logger: &Logger, cancel: CancelHandle, env: &EnvVars) -> Self {
        let id = NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed);
        let logger = logger.new(o!("operation_id" => id));
        let scheduler = ResolutionScheduler::new(&logger, env);
        let deadline = env.query_timeout().map(|timeout| Instant::now() + timeout);

        OperationScope {
            id,
            logger,
            cache: PerRequestCache::new(),
            collector: BatchKeyCollector::new(),
            scheduler,
            cancel,
            guard: None,
            deadline,
        }
    }

    /// A scope that can only be canceled by dropping it.
    pub fn detached(logger: &Logger) -> Self {
        let guard = CancelGuard::new();
        let mut scope = Self::new(logger, guard.handle());
        scope.guard = Some(guard);
        scope
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Load the batches of different fields one after the other.
    pub fn sequential(mut self) -> Self {
        self.scheduler = self.scheduler.sequential();
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn cache(&self) -> &PerRequestCache {
        &self.cache
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    /// Number of phases that needed loading
    pub fn phases(&self) -> usize {
        self.scheduler.phases()
    }

    /// Cancel the operation. Only has an effect on detached scopes; other
    /// scopes are canceled through their guard.
    pub fn cancel(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard.cancel();
        }
    }

    /// Request the value of `field` for `key`. A cached value is returned
    /// right away and a key that is already pending in this phase only
    /// gains another waiter. Everything else is registered for the current
    /// phase. Nothing is loaded here: pending handles resolve once the
    /// phase is complete and `dispatch` ran.
    pub fn get_or_load(
        &mut self,
        field: &str,
        key: Key,
        loader: &Arc<dyn FieldLoader>,
    ) -> LoadHandle {
        if let Some(result) = self.cache.get(field, &key) {
            return LoadHandle::ready(result);
        }
        self.scheduler.collecting();
        self.collector.register(field, loader, key)
    }

    /// Signal that the current phase is complete and load everything it
    /// collected.
    pub async fn dispatch(&mut self) -> Result<usize, QueryExecutionError> {
        let OperationScope {
            collector,
            cache,
            scheduler,
            cancel,
            ..
        } = self;
        scheduler.dispatch(collector, cache, &*cancel).await
    }

    /// Fails if the operation was canceled or ran past its deadline.
    pub fn check(&self) -> Result<(), QueryExecutionError> {
        if self.cancel.is_canceled() {
            return Err(QueryExecutionError::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline < Instant::now() => Err(QueryExecutionError::Timeout),
            _ => Ok(()),
        }
    }
}
