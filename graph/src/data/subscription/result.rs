use futures03::stream::Stream;
use std::pin::Pin;

use crate::data::query::QueryResult;

/// A stream of query results for a subscription.
pub type QueryResultStream = Pin<Box<dyn Stream<Item = QueryResult> + Send>>;

/// The result of running a subscription, if successful.
pub type SubscriptionResult = QueryResultStream;
