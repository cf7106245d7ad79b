use async_trait::async_trait;
use thiserror::Error;

use crate::data::blog::{Author, Comment, CommentInput, CreatePostInput, Post};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unknown {0} `{1}`")]
    NotFound(&'static str, String),
    #[error("store is unavailable: {0}")]
    Unavailable(String),
}

/// Posts and their comments. Fetches by a list of ids return the matching
/// records in no particular order; ids without a record are skipped.
#[async_trait]
pub trait PostStore: Send + Sync + 'static {
    async fn all_posts(&self) -> Result<Vec<Post>, StoreError>;

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>, StoreError>;

    async fn posts_by_ids(&self, ids: &[String]) -> Result<Vec<Post>, StoreError>;

    async fn comments_by_post_ids(&self, post_ids: &[String]) -> Result<Vec<Comment>, StoreError>;

    async fn comment_by_id(&self, id: &str) -> Result<Option<Comment>, StoreError>;

    /// Create a post and return its id
    async fn create_post(&self, input: CreatePostInput) -> Result<String, StoreError>;

    /// Add a comment to an existing post and return the new comment's id
    async fn add_comment(&self, input: CommentInput) -> Result<String, StoreError>;
}

#[async_trait]
pub trait AuthorStore: Send + Sync + 'static {
    async fn authors_by_ids(&self, ids: &[String]) -> Result<Vec<Author>, StoreError>;
}
