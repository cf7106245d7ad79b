use chrono::Utc;
use pretty_assertions::assert_eq;

use graph::log;
use graph::prelude::*;
use postgraph_store_memory::{MemoryStore, StoreCall};

fn store() -> MemoryStore {
    let store = MemoryStore::new(&log::discard());
    store.insert_author(Author {
        id: "a1".to_owned(),
        name: "Ann".to_owned(),
        email: "ann@example.com".to_owned(),
    });
    store
}

#[tokio::test]
async fn created_posts_keep_insertion_order() {
    let store = store();
    let mut ids = Vec::new();
    for title in &["first", "second", "third"] {
        let input = CreatePostInput {
            title: title.to_string(),
            content: "content".to_owned(),
            author_id: "a1".to_owned(),
        };
        ids.push(store.create_post(input).await.unwrap());
    }

    let posts = store.all_posts().await.unwrap();
    assert_eq!(ids, posts.iter().map(|p| p.id.clone()).collect::<Vec<_>>());
    assert!(posts.iter().all(|p| p.status == PostStatus::Draft));
}

#[tokio::test]
async fn create_post_requires_an_existing_author() {
    let store = store();
    let input = CreatePostInput {
        title: "title".to_owned(),
        content: "content".to_owned(),
        author_id: "nobody".to_owned(),
    };
    let err = store.create_post(input).await.unwrap_err();
    assert_eq!("unknown author `nobody`", err.to_string());
}

#[tokio::test]
async fn comments_are_found_by_post() {
    let store = store();
    store.insert_comment(Comment {
        id: "c1".to_owned(),
        content: "hello".to_owned(),
        post_id: "p1".to_owned(),
        created_at: Utc::now(),
    });

    let comments = store
        .comments_by_post_ids(&["p1".to_owned(), "p2".to_owned()])
        .await
        .unwrap();
    assert_eq!(vec!["c1"], comments.iter().map(|c| c.id.as_str()).collect::<Vec<_>>());

    let err = store
        .add_comment(CommentInput {
            post_id: "p2".to_owned(),
            content: "hi".to_owned(),
        })
        .await
        .unwrap_err();
    assert_eq!("unknown post `p2`", err.to_string());
}

#[tokio::test]
async fn calls_are_recorded_and_failures_injected() {
    let store = store();
    store.fail_next("authors_by_ids", "backend down");

    let ids = vec!["a1".to_owned(), "a2".to_owned()];
    let err = store.authors_by_ids(&ids).await.unwrap_err();
    assert_eq!("store is unavailable: backend down", err.to_string());

    let authors = store.authors_by_ids(&ids).await.unwrap();
    assert_eq!(vec!["Ann"], authors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>());

    assert_eq!(
        vec![
            StoreCall {
                method: "authors_by_ids",
                ids: ids.clone()
            },
            StoreCall {
                method: "authors_by_ids",
                ids
            }
        ],
        store.calls()
    );
    assert!(store.calls_to("all_posts").is_empty());
}
