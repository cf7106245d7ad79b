use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use uuid::Uuid;

use graph::prelude::*;

/// One call the store received, with the ids it was asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreCall {
    pub method: &'static str,
    pub ids: Vec<String>,
}

#[derive(Default)]
struct State {
    // Kept in insertion order
    posts: Vec<Post>,
    comments: Vec<Comment>,
    authors: Vec<Author>,
}

/// A `PostStore` and `AuthorStore` that keeps everything in memory.
///
/// Every call is recorded and can be inspected with `calls`, and a call can
/// be made to fail with `fail_next`, which makes the store useful as a
/// service double in tests.
pub struct MemoryStore {
    logger: Logger,
    state: RwLock<State>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<HashMap<&'static str, String>>,
}

impl MemoryStore {
    pub fn new(logger: &Logger) -> Self {
        MemoryStore {
            logger: logger.new(o!("component" => "MemoryStore")),
            state: RwLock::new(State::default()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert_author(&self, author: Author) {
        self.state.write().authors.push(author);
    }

    pub fn insert_post(&self, post: Post) {
        self.state.write().posts.push(post);
    }

    pub fn insert_comment(&self, comment: Comment) {
        self.state.write().comments.push(comment);
    }

    /// All calls received so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// The calls to `method` received so far
    pub fn calls_to(&self, method: &str) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Make the next call to `method` fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, method: &'static str, message: &str) {
        self.failures.lock().insert(method, message.to_owned());
    }

    async fn enter(&self, method: &'static str, ids: &[String]) -> Result<(), StoreError> {
        trace!(self.logger, "Store call"; "method" => method, "ids" => ids.len());
        self.calls.lock().push(StoreCall {
            method,
            ids: ids.to_vec(),
        });

        match self.failures.lock().remove(method) {
            Some(message) => Err(StoreError::Unavailable(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn all_posts(&self) -> Result<Vec<Post>, StoreError> {
        self.enter("all_posts", &[]).await?;
        Ok(self.state.read().posts.clone())
    }

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>, StoreError> {
        self.enter("post_by_id", &[id.to_owned()]).await?;
        let state = self.state.read();
        Ok(state.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>, StoreError> {
        self.enter("posts_by_ids", ids).await?;
        let state = self.state.read();
        Ok(state
            .posts
            .iter()
            .filter(|post| ids.contains(&post.id))
            .cloned()
            .collect())
    }

    async fn comments_by_post_ids(&self, post_ids: &[String]) -> Result<Vec<Comment>, StoreError> {
        self.enter("comments_by_post_ids", post_ids).await?;
        let state = self.state.read();
        Ok(state
            .comments
            .iter()
            .filter(|comment| post_ids.contains(&comment.post_id))
            .cloned()
            .collect())
    }

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, StoreError> {
        self.enter("comment_by_id", &[id.to_owned()]).await?;
        let state = self.state.read();
        Ok(state.comments.iter().find(|comment| comment.id == id).cloned())
    }

    async fn create_post(&self, input: CreatePostInput) -> Result<String, StoreError> {
        self.enter("create_post", &[input.author_id.clone()]).await?;
        let mut state = self.state.write();
        if !state.authors.iter().any(|author| author.id == input.author_id) {
            return Err(StoreError::NotFound("author", input.author_id));
        }

        let id = Uuid::new_v4().to_string();
        state.posts.push(Post {
            id: id.clone(),
            title: input.title,
            content: input.content,
            status: PostStatus::Draft,
            author_id: input.author_id,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn add_comment(&self, input: CommentInput) -> Result<String, StoreError> {
        self.enter("add_comment", &[input.post_id.clone()]).await?;
        let mut state = self.state.write();
        if !state.posts.iter().any(|post| post.id == input.post_id) {
            return Err(StoreError::NotFound("post", input.post_id));
        }

        let id = Uuid::new_v4().to_string();
        state.comments.push(Comment {
            id: id.clone(),
            content: input.content,
            post_id: input.post_id,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn authors_by_ids(&self, ids: &[String]) -> Result<Vec<Author>, StoreError> {
        self.enter("authors_by_ids", ids).await?;
        let state = self.state.read();
        Ok(state
            .authors
            .iter()
            .filter(|author| ids.contains(&author.id))
            .cloned()
            .collect())
    }
}
