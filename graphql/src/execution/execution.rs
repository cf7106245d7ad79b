use graph::prelude::*;

use crate::execution::OperationScope;
use crate::loader::LoadHandle;
use crate::query::{Field, Operation, OperationKind};
use crate::schema::{FieldDef, FieldKind, ObjectType, Schema};

/// An object whose selection set still needs to be resolved, and where its
/// result goes in the response.
struct WorkItem<'q> {
    path: Vec<PathSegment>,
    type_name: String,
    source: Value,
    selection_set: &'q [Field],
}

/// A batched field waiting for the dispatch of its phase.
struct Waiting<'q, 's> {
    path: Vec<PathSegment>,
    def: &'s FieldDef,
    field: &'q Field,
    handle: LoadHandle,
}

/// Executes `operation` against `schema`, with `root_value` as the parent
/// of the root fields.
///
/// The response is built one depth level at a time: all fields of a level
/// register the keys they need, then the level's batches are dispatched
/// together, so every batched field causes at most one loader call per
/// level no matter how many parents it has.
///
/// Errors do not abort execution. The field that failed is set to `null`
/// and the error is reported with the field's path. Only cancelation and
/// timeouts stop the operation.
pub async fn execute_operation(
    scope: &mut OperationScope,
    schema: &Schema,
    operation: &Operation,
    root_value: Value,
) -> QueryResult {
    let root_type = match schema.root_type(operation.kind) {
        Ok(root_type) => root_type,
        Err(e) => return QueryResult::from(e),
    };

    let mut data = Value::Object(Object::new());
    let mut errors = Vec::new();

    if operation.kind == OperationKind::Mutation {
        // Root fields of a mutation run one after the other, each one
        // including all of its subfields
        for field in &operation.selection_set {
            let root = root_item(root_type, &root_value, std::slice::from_ref(field));
            if !execute_levels(scope, schema, vec![root], &mut data, &mut errors).await {
                break;
            }
        }
    } else {
        let root = root_item(root_type, &root_value, &operation.selection_set);
        execute_levels(scope, schema, vec![root], &mut data, &mut errors).await;
    }

    QueryResult {
        data: Some(data),
        errors,
    }
}

fn root_item<'q>(
    root_type: &ObjectType,
    root_value: &Value,
    selection_set: &'q [Field],
) -> WorkItem<'q> {
    WorkItem {
        path: vec![],
        type_name: root_type.name.clone(),
        source: root_value.clone(),
        selection_set,
    }
}

/// Resolves `work` and everything below it. Returns `false` if the
/// operation was canceled or timed out.
async fn execute_levels<'q>(
    scope: &mut OperationScope,
    schema: &Schema,
    mut work: Vec<WorkItem<'q>>,
    data: &mut Value,
    errors: &mut Vec<QueryError>,
) -> bool {
    while !work.is_empty() {
        if let Err(e) = scope.check() {
            errors.push(e.into());
            return false;
        }

        let mut next = Vec::new();
        let mut waiting = Vec::new();

        for item in &work {
            let object_type = match schema.object_type(&item.type_name) {
                Some(object_type) => object_type,
                None => {
                    let e = QueryExecutionError::UnknownType(item.type_name.clone());
                    errors.push(QueryError::new(e, item.path.clone()));
                    continue;
                }
            };

            for field in item.selection_set {
                let key = PathSegment::Field(field.response_key().to_owned());
                let path = child_path(&item.path, key);

                if field.name == "__typename" {
                    set_value(data, &path, Value::String(object_type.name.clone()));
                    continue;
                }

                let def = match object_type.field(&field.name) {
                    Some(def) => def,
                    None => {
                        set_value(data, &path, Value::Null);
                        let e = QueryExecutionError::UnknownField(
                            object_type.name.clone(),
                            field.name.clone(),
                        );
                        errors.push(QueryError::new(e, path));
                        continue;
                    }
                };

                match &def.kind {
                    FieldKind::Property | FieldKind::Subscribe { .. } => {
                        let value = item.source.get(&def.name).cloned().unwrap_or(Value::Null);
                        complete_value(data, path, def, field, value, &mut next);
                    }
                    FieldKind::Resolve(resolver) => {
                        let arguments = field.arguments.clone();
                        match resolver.resolve(item.source.clone(), arguments).await {
                            Ok(value) => complete_value(data, path, def, field, value, &mut next),
                            Err(e) => {
                                let e = resolve_error(def, e);
                                debug!(scope.logger(), "Failed to resolve field";
                                       "field" => &def.qualified_name,
                                       "error" => e.to_string());
                                set_value(data, &path, Value::Null);
                                errors.push(QueryError::new(e, path));
                            }
                        }
                    }
                    FieldKind::Batched { key_of, loader } => match key_of(&item.source) {
                        Some(key) => waiting.push(Waiting {
                            handle: scope.get_or_load(&def.qualified_name, key, loader),
                            path,
                            def,
                            field,
                        }),
                        None => {
                            let missing = def.field_type.missing();
                            complete_value(data, path, def, field, missing, &mut next)
                        }
                    },
                }
            }
        }

        if !waiting.is_empty() {
            // Every field of this level has registered its keys
            if let Err(e) = scope.dispatch().await {
                for Waiting { path, .. } in waiting {
                    set_value(data, &path, Value::Null);
                }
                errors.push(e.into());
                return false;
            }

            for Waiting {
                path,
                def,
                field,
                handle,
            } in waiting
            {
                match handle.wait().await {
                    Ok(value) => complete_value(data, path, def, field, value, &mut next),
                    Err(e) => {
                        set_value(data, &path, Value::Null);
                        errors.push(QueryError::new(e, path));
                    }
                }
            }
        }

        work = next;
    }
    true
}

/// Errors a resolver raised deliberately, like a missing argument, are
/// reported as they are; everything else is wrapped.
fn resolve_error(def: &FieldDef, e: anyhow::Error) -> QueryExecutionError {
    match e.downcast::<QueryExecutionError>() {
        Ok(e) => e,
        Err(e) => QueryExecutionError::resolve_failure(&def.qualified_name, &e),
    }
}

/// Writes `value` to `path`. Objects are written as empty placeholders and
/// queued so that their selection set is resolved in the next level.
fn complete_value<'q>(
    data: &mut Value,
    path: Vec<PathSegment>,
    def: &FieldDef,
    field: &'q Field,
    value: Value,
    next: &mut Vec<WorkItem<'q>>,
) {
    let type_name = match def.field_type.object_type() {
        Some(type_name) => type_name,
        None => {
            set_value(data, &path, value);
            return;
        }
    };

    match value {
        Value::Object(_) => {
            set_value(data, &path, Value::Object(Object::new()));
            next.push(WorkItem {
                path,
                type_name: type_name.to_owned(),
                source: value,
                selection_set: &field.selection_set,
            });
        }
        Value::List(items) => {
            let placeholders = items
                .iter()
                .map(|item| match item {
                    Value::Object(_) => Value::Object(Object::new()),
                    other => other.clone(),
                })
                .collect();
            set_value(data, &path, Value::List(placeholders));

            for (index, item) in items.into_iter().enumerate() {
                if let Value::Object(_) = item {
                    next.push(WorkItem {
                        path: child_path(&path, PathSegment::Index(index)),
                        type_name: type_name.to_owned(),
                        source: item,
                        selection_set: &field.selection_set,
                    });
                }
            }
        }
        other => set_value(data, &path, other),
    }
}

fn child_path(path: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut child = Vec::with_capacity(path.len() + 1);
    child.extend_from_slice(path);
    child.push(segment);
    child
}

fn set_value(data: &mut Value, path: &[PathSegment], value: Value) {
    let (last, parents) = match path.split_last() {
        Some(split) => split,
        None => {
            *data = value;
            return;
        }
    };

    let mut target = data;
    for segment in parents {
        target = match (target, segment) {
            (Value::Object(map), PathSegment::Field(name)) => match map.get_mut(name) {
                Some(child) => child,
                None => return,
            },
            (Value::List(list), PathSegment::Index(index)) => match list.get_mut(*index) {
                Some(child) => child,
                None => return,
            },
            _ => return,
        };
    }

    match (target, last) {
        (Value::Object(map), PathSegment::Field(name)) => {
            map.insert(name.clone(), value);
        }
        (Value::List(list), PathSegment::Index(index)) => {
            if let Some(slot) = list.get_mut(*index) {
                *slot = value;
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_value_follows_paths() {
        let mut data = object! {
            allPosts: vec![object! { id: "p1" }, object! { id: "p2" }],
        };
        let path = vec![
            PathSegment::Field("allPosts".to_owned()),
            PathSegment::Index(1),
            PathSegment::Field("author".to_owned()),
        ];
        set_value(&mut data, &path, object! { name: "Ann" });

        assert_eq!(
            object! {
                allPosts: vec![
                    object! { id: "p1" },
                    object! { author: object! { name: "Ann" }, id: "p2" },
                ],
            },
            data
        );
    }
}
