use super::error::{QueryError, QueryExecutionError};
use crate::data::value::{Object, Value};
use serde::Serialize as _;
use serde_derive::Serialize;

fn serialize_data<S>(data: &Option<Value>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    data.as_ref().unwrap_or(&Value::Null).serialize(serializer)
}

/// The result of running an operation. Execution produces partial results:
/// a field that failed is `null` in `data` and its error is listed in
/// `errors` together with the field's path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_data"
    )]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<QueryError>,
}

impl QueryResult {
    /// A result with an empty object as the data.
    pub fn empty() -> Self {
        QueryResult {
            data: Some(Value::Object(Object::new())),
            errors: vec![],
        }
    }

    pub fn new(data: Option<Value>) -> Self {
        QueryResult {
            data,
            errors: vec![],
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Follow `path` (dotted field names and list indexes) into `data`
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        let mut current = self.data.as_ref()?;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::List(values) => values.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<QueryExecutionError> for QueryResult {
    fn from(e: QueryExecutionError) -> Self {
        QueryResult {
            data: None,
            errors: vec![QueryError::from(e)],
        }
    }
}

impl From<QueryError> for QueryResult {
    fn from(e: QueryError) -> Self {
        QueryResult {
            data: None,
            errors: vec![e],
        }
    }
}

impl From<Vec<QueryExecutionError>> for QueryResult {
    fn from(e: Vec<QueryExecutionError>) -> Self {
        QueryResult {
            data: None,
            errors: e.into_iter().map(QueryError::from).collect(),
        }
    }
}

impl From<Object> for QueryResult {
    fn from(val: Object) -> Self {
        QueryResult::new(Some(Value::Object(val)))
    }
}

impl<V: Into<QueryResult>, E: Into<QueryResult>> From<Result<V, E>> for QueryResult {
    fn from(result: Result<V, E>) -> Self {
        match result {
            Ok(v) => v.into(),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::query::PathSegment;
    use crate::object;

    #[test]
    fn serializes_partial_results() {
        let result = QueryResult {
            data: Some(object! { post: object! { id: "p1", author: Value::Null } }),
            errors: vec![QueryError::new(
                QueryExecutionError::BatchLoadFailure {
                    field: "author".to_owned(),
                    cause: "backend down".to_owned(),
                },
                vec![
                    PathSegment::Field("post".to_owned()),
                    PathSegment::Field("author".to_owned()),
                ],
            )],
        };

        assert_eq!(
            serde_json::json!({
                "data": { "post": { "author": null, "id": "p1" } },
                "errors": [{
                    "message": "Failed to batch load field `author`: backend down",
                    "path": ["post", "author"]
                }]
            }),
            result.to_json()
        );
    }

    #[test]
    fn pointer_walks_lists_and_objects() {
        let result = QueryResult::new(Some(object! {
            allPosts: vec![object! { id: "p1" }, object! { id: "p2" }]
        }));

        assert_eq!(
            Some(&Value::String("p2".to_owned())),
            result.pointer("allPosts.1.id")
        );
        assert_eq!(None, result.pointer("allPosts.2.id"));
    }
}
