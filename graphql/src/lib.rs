pub extern crate graphql_parser;

/// Batch loading of related entities.
pub mod loader;

/// Utilities for executing GraphQL.
pub mod execution;

/// Parsing GraphQL requests into operations.
pub mod query;

/// The registry of object types and how their fields are resolved.
pub mod schema;

/// Utilities for executing GraphQL subscriptions.
pub mod subscription;

/// The external interface for actually running queries
mod runner;

/// Prelude that exports the most important traits and types.
pub mod prelude {
    pub use super::execution::{execute_operation, Arguments, OperationScope, Resolve};
    pub use super::loader::{
        BatchKeyCollector, BatchLoader, BatchResult, FieldLoader, Key, LoadHandle, LoadShape,
        OneToMany, OneToOne, PerRequestCache, Phase, ResolutionScheduler,
    };
    pub use super::query::{Field, Operation, OperationKind, Query};
    pub use super::schema::{
        key_field, FieldDef, FieldKind, FieldType, KeyFn, ObjectType, Schema, SchemaBuilder,
        SchemaError,
    };
    pub use super::subscription::{
        execute_subscription, EventStream, SubscriptionExecutionOptions, SubscriptionHub,
    };

    pub use super::runner::GraphQlRunner;
}
