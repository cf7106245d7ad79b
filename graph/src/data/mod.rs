/// Data types for dealing with GraphQL values.
pub mod value;

/// Data types for dealing with GraphQL queries.
pub mod query;

/// Data types for dealing with GraphQL subscriptions.
pub mod subscription;

/// The entities of the blog domain.
pub mod blog;
