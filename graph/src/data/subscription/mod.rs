mod error;
mod result;

pub use self::error::{SubscriptionError, SubscriptionPublishError};
pub use self::result::{QueryResultStream, SubscriptionResult};
