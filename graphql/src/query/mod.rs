//! The operations the engine executes, parsed from GraphQL query text.
//! Fields carry their arguments with variables already substituted, and
//! `@skip`/`@include` have been applied.

use graphql_parser::query as q;
use std::collections::BTreeMap;
use std::fmt;

use graph::prelude::{Object, QueryExecutionError, Value};

use crate::execution::Arguments;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
            OperationKind::Subscription => write!(f, "subscription"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: Arguments,
    pub selection_set: Vec<Field>,
}

impl Field {
    /// Returns the response key of a field, which is either its name or its
    /// alias (if there is one).
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub name: Option<String>,
    pub selection_set: Vec<Field>,
}

/// A GraphQL request: the query text, its variables and, for documents
/// with several operations, the name of the one to run.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub text: String,
    pub variables: Object,
    pub operation_name: Option<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Query {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_variables(mut self, variables: Object) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name(mut self, name: Option<String>) -> Self {
        self.operation_name = name;
        self
    }

    /// Parse the query text and select the operation to run.
    pub fn operation(&self) -> Result<Operation, QueryExecutionError> {
        let document = q::parse_query::<String>(&self.text)
            .map_err(|e| QueryExecutionError::ParseError(e.to_string()))?;
        let operation = get_operation(&document, self.operation_name.as_deref())?;

        let (kind, name, variable_definitions, selection_set) = match operation {
            q::OperationDefinition::SelectionSet(set) => (OperationKind::Query, None, None, set),
            q::OperationDefinition::Query(query) => (
                OperationKind::Query,
                query.name.clone(),
                Some(&query.variable_definitions),
                &query.selection_set,
            ),
            q::OperationDefinition::Mutation(mutation) => (
                OperationKind::Mutation,
                mutation.name.clone(),
                Some(&mutation.variable_definitions),
                &mutation.selection_set,
            ),
            q::OperationDefinition::Subscription(subscription) => (
                OperationKind::Subscription,
                subscription.name.clone(),
                Some(&subscription.variable_definitions),
                &subscription.selection_set,
            ),
        };

        let mut variables = self.variables.clone();
        for def in variable_definitions.into_iter().flatten() {
            if variables.contains_key(&def.name) {
                continue;
            }
            if let Some(default) = &def.default_value {
                let default = convert_value(default, &Object::new());
                variables.insert(def.name.clone(), default);
            }
        }

        Ok(Operation {
            kind,
            name,
            selection_set: convert_selection_set(selection_set, &variables)?,
        })
    }
}

/// Returns the operation for the given name (or the only operation if no
/// name is given).
fn get_operation<'a, 'd>(
    document: &'d q::Document<'a, String>,
    name: Option<&str>,
) -> Result<&'d q::OperationDefinition<'a, String>, QueryExecutionError> {
    let operations: Vec<_> = document
        .definitions
        .iter()
        .filter_map(|d| match d {
            q::Definition::Operation(op) => Some(op),
            q::Definition::Fragment(_) => None,
        })
        .collect();

    match (name, operations.len()) {
        (None, 1) => Ok(operations[0]),
        (None, _) => Err(QueryExecutionError::OperationNameRequired),
        (Some(s), _) => operations
            .into_iter()
            .find(|op| operation_name(op) == Some(s))
            .ok_or_else(|| QueryExecutionError::OperationNotFound(s.to_owned())),
    }
}

fn operation_name<'d>(operation: &'d q::OperationDefinition<'_, String>) -> Option<&'d str> {
    match operation {
        q::OperationDefinition::SelectionSet(_) => None,
        q::OperationDefinition::Query(query) => query.name.as_deref(),
        q::OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        q::OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}

fn convert_selection_set(
    selection_set: &q::SelectionSet<'_, String>,
    variables: &Object,
) -> Result<Vec<Field>, QueryExecutionError> {
    let mut fields: Vec<Field> = Vec::with_capacity(selection_set.items.len());

    for selection in &selection_set.items {
        let field = match selection {
            q::Selection::Field(field) => field,
            q::Selection::FragmentSpread(spread) => {
                return Err(QueryExecutionError::NotSupported(format!(
                    "fragment spread `...{}`",
                    spread.fragment_name
                )))
            }
            q::Selection::InlineFragment(_) => {
                return Err(QueryExecutionError::NotSupported(
                    "inline fragments".to_owned(),
                ))
            }
        };

        if !is_included(&field.directives, variables) {
            continue;
        }

        let arguments: BTreeMap<_, _> = field
            .arguments
            .iter()
            .map(|(name, value)| (name.clone(), convert_value(value, variables)))
            .collect();
        let converted = Field {
            name: field.name.clone(),
            alias: field.alias.clone(),
            arguments: Arguments::new(arguments),
            selection_set: convert_selection_set(&field.selection_set, variables)?,
        };

        // Fields with the same response key are merged
        match fields
            .iter_mut()
            .find(|f| f.response_key() == converted.response_key())
        {
            Some(existing) => existing.selection_set.extend(converted.selection_set),
            None => fields.push(converted),
        }
    }

    Ok(fields)
}

/// Applies `@skip(if:)` and `@include(if:)`.
fn is_included(directives: &[q::Directive<'_, String>], variables: &Object) -> bool {
    let flag = |name: &str| -> Option<bool> {
        let directive = directives.iter().find(|d| d.name == name)?;
        let value = directive
            .arguments
            .iter()
            .find(|(arg, _)| arg == "if")
            .map(|(_, value)| convert_value(value, variables).as_bool().unwrap_or(false))
            .unwrap_or(true);
        Some(value)
    };

    !flag("skip").unwrap_or(false) && flag("include").unwrap_or(true)
}

fn convert_value(value: &q::Value<'_, String>, variables: &Object) -> Value {
    match value {
        q::Value::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
        q::Value::Int(n) => n.as_i64().map(Value::Int).unwrap_or(Value::Null),
        q::Value::Float(f) => Value::Float(*f),
        q::Value::String(s) => Value::String(s.clone()),
        q::Value::Boolean(b) => Value::Boolean(*b),
        q::Value::Null => Value::Null,
        q::Value::Enum(e) => Value::Enum(e.clone()),
        q::Value::List(values) => Value::List(
            values
                .iter()
                .map(|v| convert_value(v, variables))
                .collect(),
        ),
        q::Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), convert_value(v, variables)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::object;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(Field::response_key).collect()
    }

    #[test]
    fn parses_arguments_aliases_and_variables() {
        let query = Query::new(
            r#"query Post($id: ID!, $withComments: Boolean = true) {
                  first: postById(postId: $id) {
                    title
                    comments @include(if: $withComments) { content }
                    status @skip(if: true)
                  }
                }"#,
        )
        .with_variables(btreemap! { "id".to_owned() => Value::String("p1".to_owned()) });

        let op = query.operation().unwrap();
        assert_eq!(OperationKind::Query, op.kind);
        assert_eq!(Some("Post".to_owned()), op.name);

        let post = &op.selection_set[0];
        assert_eq!("first", post.response_key());
        assert_eq!("postById", post.name);
        assert_eq!(
            Some(&Value::String("p1".to_owned())),
            post.arguments.get("postId")
        );
        assert_eq!(vec!["title", "comments"], names(&post.selection_set));
    }

    #[test]
    fn parses_input_objects() {
        let op = Query::new(
            r#"mutation { addComment(commentInput: { postId: "p1", content: "hi" }) { id } }"#,
        )
        .operation()
        .unwrap();

        assert_eq!(OperationKind::Mutation, op.kind);
        assert_eq!(
            Some(&object! { postId: "p1", content: "hi" }),
            op.selection_set[0].arguments.get("commentInput")
        );
    }

    #[test]
    fn selects_operations_by_name() {
        let text = "query A { allPosts { id } } query B { allPosts { title } }";

        assert_eq!(
            Err(QueryExecutionError::OperationNameRequired),
            Query::new(text).operation()
        );
        assert_eq!(
            Err(QueryExecutionError::OperationNotFound("C".to_owned())),
            Query::new(text)
                .with_operation_name(Some("C".to_owned()))
                .operation()
        );

        let op = Query::new(text)
            .with_operation_name(Some("B".to_owned()))
            .operation()
            .unwrap();
        assert_eq!(vec!["title"], names(&op.selection_set[0].selection_set));
    }

    #[test]
    fn rejects_fragments_and_garbage() {
        let err = Query::new("{ allPosts { ...PostFields } } fragment PostFields on Post { id }")
            .operation()
            .unwrap_err();
        assert!(matches!(err, QueryExecutionError::NotSupported(_)));

        let err = Query::new("{ allPosts { ").operation().unwrap_err();
        assert!(matches!(err, QueryExecutionError::ParseError(_)));
    }
}
