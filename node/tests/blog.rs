use pretty_assertions::assert_eq;
use std::sync::Arc;

use graph::futures03::StreamExt;
use graph::log;
use graph::prelude::*;
use postgraph_graphql::prelude::{GraphQlRunner, Query, SubscriptionHub};
use postgraph_store_memory::{MemoryStore, StoreCall};
use postgraph_node::{blog, seed};

fn setup() -> (Arc<MemoryStore>, GraphQlRunner) {
    let logger = log::discard();
    let store = Arc::new(MemoryStore::new(&logger));
    seed::demo(&store);
    let hub = Arc::new(SubscriptionHub::with_config(&logger, 16, ReplayPolicy::None));
    let schema = blog::schema(store.cheap_clone(), hub.cheap_clone()).unwrap();
    let runner = GraphQlRunner::new(&logger, Arc::new(schema), hub);
    (store, runner)
}

fn call(method: &'static str, ids: &[&str]) -> StoreCall {
    StoreCall {
        method,
        ids: ids.iter().map(|id| id.to_string()).collect(),
    }
}

fn string(s: &str) -> Value {
    Value::String(s.to_owned())
}

#[tokio::test]
async fn authors_of_all_posts_load_in_one_call() {
    let (store, runner) = setup();

    let result = runner
        .run_query(Query::new("{ allPosts { id title author { name } } }"))
        .await;

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(
        vec![call("authors_by_ids", &["author-1", "author-2"])],
        store.calls_to("authors_by_ids")
    );
    assert_eq!(Some(&string("Ada Lovelace")), result.pointer("allPosts.0.author.name"));
    assert_eq!(Some(&string("Alan Turing")), result.pointer("allPosts.1.author.name"));
    assert_eq!(Some(&string("Ada Lovelace")), result.pointer("allPosts.2.author.name"));
}

#[tokio::test]
async fn comments_of_all_posts_load_in_one_call() {
    let (store, runner) = setup();

    let result = runner
        .run_query(Query::new("{ allPosts { id comments { id content } } }"))
        .await;

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(
        vec![call("comments_by_post_ids", &["post-1", "post-2", "post-3"])],
        store.calls_to("comments_by_post_ids")
    );

    let comment_ids = |post: usize| -> Vec<Value> {
        result
            .pointer(&format!("allPosts.{}.comments", post))
            .and_then(Value::as_list)
            .unwrap()
            .iter()
            .map(|comment| comment.get("id").cloned().unwrap())
            .collect()
    };
    assert_eq!(vec![string("comment-1"), string("comment-2")], comment_ids(0));
    assert_eq!(vec![string("comment-3")], comment_ids(1));
    assert!(comment_ids(2).is_empty());
}

#[tokio::test]
async fn a_failing_loader_only_nulls_its_own_field() {
    let (store, runner) = setup();
    store.fail_next("authors_by_ids", "backend down");

    let result = runner
        .run_query(Query::new(
            "{ allPosts { title author { name } comments { id } } }",
        ))
        .await;

    assert_eq!(3, result.errors.len());
    for (n, error) in result.errors.iter().enumerate() {
        assert_eq!(format!("allPosts.{}.author", n), error.path_string());
        assert_eq!(
            "Failed to batch load field `Post.author`: store is unavailable: backend down",
            error.error.to_string()
        );
    }

    assert_eq!(Some(&Value::Null), result.pointer("allPosts.0.author"));
    assert_eq!(
        Some(&string("Notes on the engine")),
        result.pointer("allPosts.0.title")
    );
    assert_eq!(
        Some(&string("comment-3")),
        result.pointer("allPosts.1.comments.0.id")
    );
}

#[tokio::test]
async fn nested_references_share_one_operation_cache() {
    let (store, runner) = setup();

    let result = runner
        .run_query(Query::new(
            r#"{
                postById(postId: "post-1") {
                    author { name }
                    comments { content post { title author { email } } }
                }
            }"#,
        ))
        .await;

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(
        vec![call("posts_by_ids", &["post-1"])],
        store.calls_to("posts_by_ids")
    );
    // `author-1` is needed on two levels but only loaded on the first
    assert_eq!(
        vec![call("authors_by_ids", &["author-1"])],
        store.calls_to("authors_by_ids")
    );
    assert_eq!(
        Some(&string("ada@example.com")),
        result.pointer("postById.comments.1.post.author.email")
    );
}

#[tokio::test]
async fn operations_do_not_share_caches() {
    let (store, runner) = setup();
    let query = "{ allPosts { author { id } } }";

    runner.run_query(Query::new(query)).await;
    runner.run_query(Query::new(query)).await;

    assert_eq!(2, store.calls_to("authors_by_ids").len());
}

#[tokio::test]
async fn post_by_id_arguments() {
    let (_, runner) = setup();

    let result = runner
        .run_query(
            Query::new("query Post($id: ID!) { postById(postId: $id) { title } }")
                .with_variables(Object::from_iter(vec![("id".to_owned(), string("nope"))])),
        )
        .await;
    assert!(!result.has_errors());
    assert_eq!(Some(&Value::Null), result.pointer("postById"));

    let result = runner
        .run_query(Query::new("{ postById { title } }"))
        .await;
    assert_eq!(1, result.errors.len());
    assert_eq!(
        "No value provided for required argument: postId",
        result.errors[0].error.to_string()
    );
    assert_eq!("postById", result.errors[0].path_string());
}

#[tokio::test]
async fn create_post_returns_the_new_post() {
    let (store, runner) = setup();

    let result = runner
        .run_query(Query::new(
            r#"mutation {
                createPost(createPostInput: { title: "New", content: "Fresh", authorId: "author-2" }) {
                    title status author { name }
                }
            }"#,
        ))
        .await;

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(Some(&string("New")), result.pointer("createPost.title"));
    assert_eq!(
        Some(&Value::Enum("DRAFT".to_owned())),
        result.pointer("createPost.status")
    );
    assert_eq!(
        Some(&string("Alan Turing")),
        result.pointer("createPost.author.name")
    );
    assert_eq!(4, store.all_posts().await.unwrap().len());
}

#[tokio::test]
async fn added_comments_reach_subscribers() {
    let (_, runner) = setup();

    let mut events = runner
        .run_subscription(Query::new(
            "subscription { commentAdded { content post { title } } }",
        ))
        .unwrap();

    let result = runner
        .run_query(Query::new(
            r#"mutation { addComment(commentInput: { postId: "post-2", content: "Yes" }) { id } }"#,
        ))
        .await;
    assert!(!result.has_errors(), "{:?}", result.errors);

    let event = events.next().await.unwrap();
    assert!(!event.has_errors(), "{:?}", event.errors);
    assert_eq!(Some(&string("Yes")), event.pointer("commentAdded.content"));
    assert_eq!(
        Some(&string("Computing machinery")),
        event.pointer("commentAdded.post.title")
    );
}

#[tokio::test]
async fn comments_on_unknown_posts_are_rejected() {
    let (_, runner) = setup();

    let result = runner
        .run_query(Query::new(
            r#"mutation { addComment(commentInput: { postId: "post-9", content: "?" }) { id } }"#,
        ))
        .await;

    assert_eq!(Some(&Value::Null), result.pointer("addComment"));
    assert_eq!(
        "Failed to resolve field `Mutation.addComment`: unknown post `post-9`",
        result.errors[0].error.to_string()
    );
}

#[tokio::test]
async fn comments_are_stored_after_the_hub_shuts_down() {
    let (store, runner) = setup();
    runner.hub().shutdown();

    let result = runner
        .run_query(Query::new(
            r#"mutation { addComment(commentInput: { postId: "post-3", content: "Late" }) { id content } }"#,
        ))
        .await;

    assert!(!result.has_errors(), "{:?}", result.errors);
    assert_eq!(Some(&string("Late")), result.pointer("addComment.content"));

    let stored = store
        .comments_by_post_ids(&["post-3".to_owned()])
        .await
        .unwrap();
    assert_eq!(
        vec!["Late"],
        stored.iter().map(|comment| comment.content.as_str()).collect::<Vec<_>>()
    );
}
