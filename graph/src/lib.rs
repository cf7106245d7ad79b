/// Traits and types for all system components.
pub mod components;

/// Common data types used throughout postgraph.
pub mod data;

/// Extension traits for external types.
pub mod ext;

/// Logging utilities
pub mod log;

/// Configuration through environment variables.
pub mod env;

/// Wrapper for spawning tasks on the runtime.
mod task_spawn;
pub use task_spawn::spawn_allow_panic;

mod cheap_clone;

pub use anyhow;
pub use futures03;
pub use serde_json;
pub use slog;
pub use tokio;
pub use tokio_stream;

/// A prelude that makes all system component traits and data types available.
///
/// Add the following code to import all traits and data types listed below at once.
///
/// ```
/// use postgraph::prelude::*;
/// ```
pub mod prelude {
    pub use ::anyhow::{self, anyhow, Context as _};
    pub use async_trait::async_trait;
    pub use futures03;
    pub use lazy_static::lazy_static;
    pub use serde_derive::Serialize;
    pub use slog::{self, crit, debug, error, info, o, trace, warn, Logger};
    pub use std::fmt::Debug;
    pub use std::iter::FromIterator;
    pub use std::sync::Arc;
    pub use thiserror;
    pub use tokio;

    pub use crate::cheap_clone::CheapClone;
    pub use crate::components::store::{AuthorStore, PostStore, StoreError};
    pub use crate::data::blog::{
        Author, Comment, CommentInput, CreatePostInput, Post, PostStatus,
    };
    pub use crate::data::query::{PathSegment, QueryError, QueryExecutionError, QueryResult};
    pub use crate::data::subscription::{
        QueryResultStream, SubscriptionError, SubscriptionPublishError, SubscriptionResult,
    };
    pub use crate::data::value::{IntoValue, Object, TryFromValue, Value};
    pub use crate::env::{EnvVars, ReplayPolicy, ENV_VARS};
    pub use crate::ext::futures::{CancelGuard, CancelHandle, CancelToken, Canceled};
    pub use crate::log::codes::LogCode;
    pub use crate::object;
}
