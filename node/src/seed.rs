use chrono::{DateTime, Duration};

use graph::prelude::{Author, Comment, Post, PostStatus};
use postgraph_store_memory::MemoryStore;

/// Fill `store` with a few authors, posts and comments.
pub fn demo(store: &MemoryStore) {
    let authors = [
        ("author-1", "Ada Lovelace", "ada@example.com"),
        ("author-2", "Alan Turing", "alan@example.com"),
    ];
    for (id, name, email) in authors {
        store.insert_author(Author {
            id: id.to_owned(),
            name: name.to_owned(),
            email: email.to_owned(),
        });
    }

    // 2024-01-01T09:00:00Z
    let start = DateTime::from_timestamp(1_704_099_600, 0).unwrap_or_default();
    let posts = [
        ("post-1", "Notes on the engine", PostStatus::Published, "author-1"),
        ("post-2", "Computing machinery", PostStatus::Published, "author-2"),
        ("post-3", "Untitled draft", PostStatus::Draft, "author-1"),
    ];
    for (n, (id, title, status, author_id)) in posts.into_iter().enumerate() {
        store.insert_post(Post {
            id: id.to_owned(),
            title: title.to_owned(),
            content: format!("The content of {}", title.to_lowercase()),
            status,
            author_id: author_id.to_owned(),
            created_at: start + Duration::days(n as i64),
        });
    }

    let comments = [
        ("comment-1", "post-1", "A fine read"),
        ("comment-2", "post-1", "Looking forward to the next one"),
        ("comment-3", "post-2", "Can machines think?"),
    ];
    for (n, (id, post_id, content)) in comments.into_iter().enumerate() {
        store.insert_comment(Comment {
            id: id.to_owned(),
            content: content.to_owned(),
            post_id: post_id.to_owned(),
            created_at: start + Duration::hours(n as i64 + 1),
        });
    }
}
