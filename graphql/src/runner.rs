use std::time::Instant;

use graph::prelude::*;

use crate::execution::{execute_operation, OperationScope};
use crate::query::{OperationKind, Query};
use crate::schema::Schema;
use crate::subscription::{execute_subscription, SubscriptionExecutionOptions, SubscriptionHub};

/// Runs GraphQL requests against a schema.
pub struct GraphQlRunner {
    logger: Logger,
    schema: Arc<Schema>,
    hub: Arc<SubscriptionHub>,
}

impl GraphQlRunner {
    /// Creates a new query runner.
    pub fn new(logger: &Logger, schema: Arc<Schema>, hub: Arc<SubscriptionHub>) -> Self {
        GraphQlRunner {
            logger: logger.new(o!("component" => "GraphQlRunner")),
            schema,
            hub,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn hub(&self) -> &Arc<SubscriptionHub> {
        &self.hub
    }

    /// Run a query or mutation. The operation is canceled if the returned
    /// future is dropped.
    pub async fn run_query(&self, query: Query) -> QueryResult {
        let guard = CancelGuard::new();
        let result = self.run_query_with_cancel(query, guard.handle()).await;
        drop(guard);
        result
    }

    /// Run a query or mutation that is canceled when the guard behind
    /// `cancel` goes away.
    pub async fn run_query_with_cancel(&self, query: Query, cancel: CancelHandle) -> QueryResult {
        let start = Instant::now();

        let operation = match query.operation() {
            Ok(operation) => operation,
            Err(e) => return QueryResult::from(e),
        };
        if operation.kind == OperationKind::Subscription {
            return QueryResult::from(QueryExecutionError::NotSupported(
                "Subscriptions must be run with `run_subscription`".to_owned(),
            ));
        }

        let mut scope = OperationScope::new(&self.logger, cancel);
        let result = execute_operation(&mut scope, &self.schema, &operation, Value::Null).await;

        if ENV_VARS.log_gql_timing() {
            let code = if result.has_errors() {
                LogCode::GraphQlQueryFailure
            } else {
                LogCode::GraphQlQuerySuccess
            };
            info!(scope.logger(), "Query timing (GraphQL)";
                  "query" => &query.text,
                  "operation" => operation.name.as_deref().unwrap_or(""),
                  "phases" => scope.phases(),
                  "cache_hits" => scope.cache().hits(),
                  "query_time_ms" => start.elapsed().as_millis() as u64,
                  "code" => code);
        }

        result
    }

    /// Start a subscription. Every event published to the subscribed topic
    /// produces one result on the returned stream.
    pub fn run_subscription(&self, query: Query) -> Result<SubscriptionResult, SubscriptionError> {
        let operation = query.operation()?;
        execute_subscription(
            operation,
            SubscriptionExecutionOptions {
                logger: self.logger.cheap_clone(),
                schema: self.schema.cheap_clone(),
                hub: self.hub.cheap_clone(),
            },
        )
    }
}
