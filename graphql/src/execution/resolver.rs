use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;

use graph::prelude::{QueryExecutionError, TryFromValue, Value};

/// The arguments a field was called with, with variables already
/// substituted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments(BTreeMap<String, Value>);

impl Arguments {
    pub fn new(arguments: BTreeMap<String, Value>) -> Self {
        Arguments(arguments)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn required<T: TryFromValue>(&self, name: &str) -> Result<T, QueryExecutionError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Err(QueryExecutionError::MissingArgument(name.to_owned())),
            Some(value) => T::try_from_value(value).map_err(|e| {
                QueryExecutionError::InvalidArgument(name.to_owned(), format!("{:#}", e))
            }),
        }
    }

    pub fn optional<T: TryFromValue>(&self, name: &str) -> Result<Option<T>, QueryExecutionError> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.required(name).map(Some),
        }
    }
}

impl From<BTreeMap<String, Value>> for Arguments {
    fn from(arguments: BTreeMap<String, Value>) -> Self {
        Arguments(arguments)
    }
}

/// Resolves a field directly, without batching. Used for root fields and
/// for fields whose value is computed from the parent alone.
///
/// Any async closure `Fn(Value, Arguments) -> Result<Value, anyhow::Error>`
/// is a resolver; `parent` is `Value::Null` for root fields.
#[async_trait]
pub trait Resolve: Send + Sync + 'static {
    async fn resolve(&self, parent: Value, arguments: Arguments) -> Result<Value, anyhow::Error>;
}

#[async_trait]
impl<F, Fut> Resolve for F
where
    F: Fn(Value, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, anyhow::Error>> + Send,
{
    async fn resolve(&self, parent: Value, arguments: Arguments) -> Result<Value, anyhow::Error> {
        (self)(parent, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn required_arguments() {
        let args = Arguments::new(btreemap! {
            "postId".to_owned() => Value::String("p1".to_owned()),
            "first".to_owned() => Value::Int(3),
            "nothing".to_owned() => Value::Null,
        });

        assert_eq!(Ok("p1".to_owned()), args.required::<String>("postId"));
        assert_eq!(Ok(None), args.optional::<String>("nothing"));
        assert_eq!(
            Err(QueryExecutionError::MissingArgument("title".to_owned())),
            args.required::<String>("title")
        );
        assert!(matches!(
            args.required::<String>("first"),
            Err(QueryExecutionError::InvalidArgument(name, _)) if name == "first"
        ));
    }
}
