mod error;
mod result;

pub use self::error::{PathSegment, QueryError, QueryExecutionError};
pub use self::result::QueryResult;
