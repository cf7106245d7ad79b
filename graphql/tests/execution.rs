use async_trait::async_trait;
use futures03::StreamExt;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashMap};

use graph::log;
use graph::prelude::*;
use postgraph_graphql::prelude::*;

#[derive(Clone, Default)]
struct Calls(Arc<Mutex<Vec<Vec<Key>>>>);

impl Calls {
    fn record(&self, keys: &BTreeSet<Key>) {
        self.0.lock().push(keys.iter().cloned().collect());
    }

    fn get(&self) -> Vec<Vec<Key>> {
        self.0.lock().clone()
    }
}

struct Authors(Calls);

#[async_trait]
impl BatchLoader for Authors {
    type Value = Option<Value>;

    async fn load(&self, keys: &BTreeSet<Key>) -> Result<HashMap<Key, Option<Value>>, anyhow::Error> {
        self.0.record(keys);
        Ok(keys
            .iter()
            .map(|key| (key.clone(), Some(object! { id: key.clone(), name: key.to_uppercase() })))
            .collect())
    }
}

struct Comments(Calls);

#[async_trait]
impl BatchLoader for Comments {
    type Value = Vec<Value>;

    async fn load(&self, keys: &BTreeSet<Key>) -> Result<HashMap<Key, Vec<Value>>, anyhow::Error> {
        self.0.record(keys);
        Ok(keys
            .iter()
            .filter(|key| key.as_str() != "p3")
            .map(|key| {
                let comment = object! { id: format!("{}-c1", key), authorId: "a9" };
                (key.clone(), vec![comment])
            })
            .collect())
    }
}

fn posts() -> Value {
    Value::List(vec![
        object! { id: "p1", title: "One", authorId: "a1" },
        object! { id: "p2", title: "Two", authorId: "a2" },
        object! { id: "p3", title: "Three", authorId: "a1" },
        object! { id: "p4", title: "Four", authorId: Value::Null },
    ])
}

struct Fixture {
    authors: Calls,
    comments: Calls,
    appended: Arc<Mutex<Vec<String>>>,
    hub: Arc<SubscriptionHub>,
    schema: Arc<Schema>,
}

impl Fixture {
    fn new() -> Self {
        let authors = Calls::default();
        let comments = Calls::default();
        let appended = Arc::new(Mutex::new(Vec::new()));
        let hub = Arc::new(SubscriptionHub::with_config(
            &log::discard(),
            8,
            ReplayPolicy::None,
        ));

        let mut builder = SchemaBuilder::new();
        builder
            .query()
            .resolve("posts", FieldType::list("Post"), |_: Value, _: Arguments| async {
                Ok::<_, anyhow::Error>(posts())
            })
            .resolve("post", FieldType::object("Post"), |_: Value, args: Arguments| async move {
                let id: String = args.required("id")?;
                let post = posts()
                    .as_list()
                    .into_iter()
                    .flatten()
                    .find(|post| post.get("id").and_then(Value::as_str) == Some(id.as_str()))
                    .cloned()
                    .unwrap_or(Value::Null);
                Ok::<_, anyhow::Error>(post)
            })
            .resolve("broken", FieldType::Scalar, |_: Value, _: Arguments| async {
                Err::<Value, _>(anyhow!("kaboom"))
            });

        let log = appended.cheap_clone();
        builder.mutation().resolve(
            "append",
            FieldType::Scalar,
            move |_: Value, args: Arguments| {
                let log = log.cheap_clone();
                async move {
                    let value: String = args.required("value")?;
                    // Later fields finish faster, so only serial execution
                    // keeps the order
                    let delay = 30 - 10 * log.lock().len() as u64;
                    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                    log.lock().push(value.clone());
                    Ok::<_, anyhow::Error>(Value::String(value))
                }
            },
        );

        builder
            .subscription()
            .subscribe("postAdded", FieldType::object("Post"), "postAdded");

        builder
            .object("Post")
            .scalars(&["id", "title", "authorId"])
            .batched(
                "author",
                FieldType::object("Author"),
                key_field("authorId"),
                Authors(authors.clone()),
            )
            .batched(
                "comments",
                FieldType::list("Comment"),
                key_field("id"),
                Comments(comments.clone()),
            );
        builder.object("Comment").scalars(&["id"]).batched(
            "author",
            FieldType::object("Author"),
            key_field("authorId"),
            Authors(authors.clone()),
        );
        builder.object("Author").scalars(&["id", "name"]);

        Fixture {
            authors,
            comments,
            appended,
            hub,
            schema: Arc::new(builder.build().unwrap()),
        }
    }

    fn runner(&self) -> GraphQlRunner {
        GraphQlRunner::new(&log::discard(), self.schema.cheap_clone(), self.hub.cheap_clone())
    }

    async fn execute(&self, query: &str) -> (QueryResult, OperationScope) {
        let operation = Query::new(query).operation().unwrap();
        let mut scope = OperationScope::detached(&log::discard());
        let result = execute_operation(&mut scope, &self.schema, &operation, Value::Null).await;
        (result, scope)
    }
}

fn keys(keys: &[&str]) -> Vec<Key> {
    keys.iter().map(|key| key.to_string()).collect()
}

#[tokio::test]
async fn each_level_loads_each_field_once() {
    let fixture = Fixture::new();
    let (result, scope) = fixture
        .execute("{ posts { id author { name } comments { id author { id } } } }")
        .await;

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(2, scope.phases());
    assert_eq!(vec![keys(&["a1", "a2"]), keys(&["a9"])], fixture.authors.get());
    assert_eq!(vec![keys(&["p1", "p2", "p3", "p4"])], fixture.comments.get());

    assert_eq!(
        Some(&Value::String("A2".to_owned())),
        result.pointer("posts.1.author.name")
    );
    assert_eq!(
        Some(&Value::String("A1".to_owned())),
        result.pointer("posts.2.author.name")
    );
    // A post without an author id references nothing
    assert_eq!(Some(&Value::Null), result.pointer("posts.3.author"));
    assert_eq!(Some(&Value::List(vec![])), result.pointer("posts.2.comments"));
    assert_eq!(
        Some(&Value::String("a9".to_owned())),
        result.pointer("posts.0.comments.0.author.id")
    );
}

#[tokio::test]
async fn aliases_and_typename() {
    let fixture = Fixture::new();
    let (result, _) = fixture
        .execute(r#"{ first: post(id: "p1") { title } second: post(id: "p2") { __typename title } }"#)
        .await;

    assert_eq!(
        Some(object! {
            first: object! { title: "One" },
            second: object! { __typename: "Post", title: "Two" },
        }),
        result.data
    );
}

#[tokio::test]
async fn errors_are_attributed_to_their_field() {
    let fixture = Fixture::new();
    let (result, _) = fixture.execute("{ broken post(id: \"p1\") { id nope } }").await;

    let errors: Vec<_> = result
        .errors
        .iter()
        .map(|e| (e.path_string(), e.error.to_string()))
        .collect();
    assert_eq!(
        vec![
            (
                "broken".to_owned(),
                "Failed to resolve field `Query.broken`: kaboom".to_owned()
            ),
            (
                "post.nope".to_owned(),
                "Type \"Post\" has no field \"nope\"".to_owned()
            ),
        ],
        errors
    );
    assert_eq!(Some(&Value::Null), result.pointer("broken"));
    assert_eq!(Some(&Value::String("p1".to_owned())), result.pointer("post.id"));
}

#[tokio::test]
async fn mutation_fields_run_in_order() {
    let fixture = Fixture::new();
    let result = fixture
        .runner()
        .run_query(Query::new(
            r#"mutation { c: append(value: "one") b: append(value: "two") a: append(value: "three") }"#,
        ))
        .await;

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(vec!["one", "two", "three"], *fixture.appended.lock());
    assert_eq!(Some(&Value::String("three".to_owned())), result.pointer("a"));
}

#[tokio::test]
async fn canceled_operations_stop() {
    let fixture = Fixture::new();
    let guard = CancelGuard::new();
    let handle = guard.handle();
    drop(guard);

    let result = fixture
        .runner()
        .run_query_with_cancel(Query::new("{ posts { author { id } } }"), handle)
        .await;

    assert_eq!(
        vec![QueryExecutionError::Canceled],
        result.errors.into_iter().map(|e| e.error).collect::<Vec<_>>()
    );
    assert!(fixture.authors.get().is_empty());
}

#[tokio::test]
async fn fields_waiting_on_a_canceled_dispatch_are_null() {
    let guard = Arc::new(Mutex::new(Some(CancelGuard::new())));
    let handle = guard.lock().as_ref().map(CancelGuard::handle).unwrap();
    let calls = Calls::default();

    let mut builder = SchemaBuilder::new();
    let cancel = guard.cheap_clone();
    builder
        .query()
        .batched(
            "author",
            FieldType::object("Author"),
            key_field("authorId"),
            Authors(calls.clone()),
        )
        .resolve("cancel", FieldType::Scalar, move |_: Value, _: Arguments| {
            let guard = cancel.lock().take();
            async move {
                drop(guard);
                Ok::<_, anyhow::Error>(Value::Boolean(true))
            }
        });
    builder.object("Author").scalars(&["id", "name"]);
    let schema = builder.build().unwrap();

    let operation = Query::new("{ author { id } cancel }").operation().unwrap();
    let mut scope = OperationScope::new(&log::discard(), handle);
    let root = object! { authorId: "a1" };
    let result = execute_operation(&mut scope, &schema, &operation, root).await;

    assert_eq!(Some(object! { author: Value::Null, cancel: true }), result.data);
    assert_eq!(
        vec![QueryExecutionError::Canceled],
        result.errors.into_iter().map(|e| e.error).collect::<Vec<_>>()
    );
    assert!(calls.get().is_empty());
}

#[tokio::test]
async fn subscriptions_resolve_each_event() {
    let fixture = Fixture::new();
    let runner = fixture.runner();
    let mut responses = runner
        .run_subscription(Query::new("subscription { postAdded { title author { name } } }"))
        .unwrap();

    for post in posts().as_list().unwrap().iter().take(2) {
        fixture.hub.publish("postAdded", post.clone()).unwrap();
    }

    let first = responses.next().await.unwrap();
    let second = responses.next().await.unwrap();
    assert_eq!(Some(&Value::String("A1".to_owned())), first.pointer("postAdded.author.name"));
    assert_eq!(Some(&Value::String("Two".to_owned())), second.pointer("postAdded.title"));
    // Every event is resolved in its own scope
    assert_eq!(vec![keys(&["a1"]), keys(&["a2"])], fixture.authors.get());

    fixture.hub.shutdown();
    assert!(responses.next().await.is_none());
}

#[tokio::test]
async fn subscriptions_need_a_single_subscription_field() {
    let fixture = Fixture::new();
    let runner = fixture.runner();

    let err = runner
        .run_subscription(Query::new("subscription { postAdded { id } other: postAdded { id } }"))
        .err()
        .unwrap();
    assert_eq!(
        SubscriptionError::from(QueryExecutionError::MultipleSubscriptionFields),
        err
    );

    let err = runner
        .run_subscription(Query::new("{ posts { id } }"))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        SubscriptionError::GraphQLError(errors) if matches!(errors[0], QueryExecutionError::NotSupported(_))
    ));

    let result = runner
        .run_query(Query::new("subscription { postAdded { id } }"))
        .await;
    assert!(matches!(
        result.errors[0].error,
        QueryExecutionError::NotSupported(_)
    ));
}
