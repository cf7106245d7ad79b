use itertools::Itertools;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use thiserror::Error;

/// Error caused while executing an operation. Errors carry their cause as a
/// rendered message so that one failure can be handed to every waiter of a
/// batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryExecutionError {
    #[error("Failed to batch load field `{field}`: {cause}")]
    BatchLoadFailure { field: String, cause: String },
    #[error("Failed to resolve field `{field}`: {cause}")]
    ResolveFailure { field: String, cause: String },
    #[error("Type \"{0}\" has no field \"{1}\"")]
    UnknownField(String, String),
    #[error("Type \"{0}\" is not defined in the schema")]
    UnknownType(String),
    #[error("No root {0} type defined in the schema")]
    NoRootType(String),
    #[error("Invalid value provided for argument \"{0}\": {1}")]
    InvalidArgument(String, String),
    #[error("No value provided for required argument: {0}")]
    MissingArgument(String),
    #[error("The operation was canceled")]
    Canceled,
    #[error("The operation took too long")]
    Timeout,
    #[error("Not supported: {0}")]
    NotSupported(String),
    #[error("Only a single top-level field is allowed in subscriptions")]
    MultipleSubscriptionFields,
    #[error("Operation name not found: {0}")]
    OperationNotFound(String),
    #[error("Operation name required")]
    OperationNameRequired,
    #[error("query parse error: {0}")]
    ParseError(String),
}

impl QueryExecutionError {
    pub fn batch_load_failure(field: &str, cause: &anyhow::Error) -> Self {
        QueryExecutionError::BatchLoadFailure {
            field: field.to_owned(),
            cause: format!("{:#}", cause),
        }
    }

    pub fn resolve_failure(field: &str, cause: &anyhow::Error) -> Self {
        QueryExecutionError::ResolveFailure {
            field: field.to_owned(),
            cause: format!("{:#}", cause),
        }
    }
}

impl From<QueryExecutionError> for Vec<QueryExecutionError> {
    fn from(e: QueryExecutionError) -> Self {
        vec![e]
    }
}

/// One step in the path from the root of a response to a field
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PathSegment::Field(name) => serializer.serialize_str(name),
            PathSegment::Index(idx) => serializer.serialize_u64(*idx as u64),
        }
    }
}

/// An execution error attributed to the response path of the field that
/// produced it. Errors raised before any field was resolved have an empty
/// path.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryError {
    pub error: QueryExecutionError,
    pub path: Vec<PathSegment>,
}

impl QueryError {
    pub fn new(error: QueryExecutionError, path: Vec<PathSegment>) -> Self {
        QueryError { error, path }
    }

    /// The path rendered as `allPosts.0.author`
    pub fn path_string(&self) -> String {
        self.path.iter().join(".")
    }
}

impl From<QueryExecutionError> for QueryError {
    fn from(error: QueryExecutionError) -> Self {
        QueryError {
            error,
            path: vec![],
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.error)
        } else {
            write!(f, "{} (at {})", self.error, self.path_string())
        }
    }
}

impl std::error::Error for QueryError {}

impl Serialize for QueryError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.path.is_empty() { 1 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("message", &self.error.to_string())?;
        if !self.path.is_empty() {
            map.serialize_entry("path", &self.path)?;
        }
        map.end()
    }
}
