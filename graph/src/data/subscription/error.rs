use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::data::query::QueryExecutionError;

/// Error caused while setting up a subscription, before any event was
/// delivered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubscriptionError {
    #[error("GraphQL error: {0:?}")]
    GraphQLError(Vec<QueryExecutionError>),
}

impl From<QueryExecutionError> for SubscriptionError {
    fn from(e: QueryExecutionError) -> Self {
        SubscriptionError::GraphQLError(vec![e])
    }
}

impl From<Vec<QueryExecutionError>> for SubscriptionError {
    fn from(e: Vec<QueryExecutionError>) -> Self {
        SubscriptionError::GraphQLError(e)
    }
}

impl Serialize for SubscriptionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        let msg = format!("{}", self);
        map.serialize_entry("message", msg.as_str())?;
        map.end()
    }
}

/// Error caused while broadcasting an event to subscribers. Publishing is
/// fire-and-forget for the mutation that triggers it, so these errors are
/// logged and never returned to a client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionPublishError {
    #[error("the subscription hub has been shut down, dropping `{0}` event")]
    Closed(String),
}
