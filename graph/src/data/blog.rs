//! The entities of the blog domain. The execution engine treats them as
//! opaque payloads; it only needs their conversion into `Value` and the
//! identifiers that link them.

use chrono::{DateTime, Utc};
use serde_derive::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::data::value::{IntoValue, TryFromValue, Value};
use crate::object;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    Draft,
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "DRAFT"),
            PostStatus::Published => write!(f, "PUBLISHED"),
        }
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(PostStatus::Draft),
            "PUBLISHED" => Ok(PostStatus::Published),
            _ => Err(anyhow::anyhow!("invalid post status `{}`", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl IntoValue for Post {
    fn into_value(self) -> Value {
        object! {
            __typename: "Post",
            id: self.id,
            title: self.title,
            content: self.content,
            status: Value::Enum(self.status.to_string()),
            authorId: self.author_id,
            createdAt: self.created_at,
        }
    }
}

impl IntoValue for Author {
    fn into_value(self) -> Value {
        object! {
            __typename: "Author",
            id: self.id,
            name: self.name,
            email: self.email,
        }
    }
}

impl IntoValue for Comment {
    fn into_value(self) -> Value {
        object! {
            __typename: "Comment",
            id: self.id,
            content: self.content,
            postId: self.post_id,
            createdAt: self.created_at,
        }
    }
}

fn required<T: TryFromValue>(value: &Value, field: &str) -> Result<T, anyhow::Error> {
    match value.get(field) {
        None | Some(Value::Null) => Err(anyhow::anyhow!("missing input field `{}`", field)),
        Some(v) => T::try_from_value(v)
            .map_err(|e| anyhow::anyhow!("invalid input field `{}`: {}", field, e)),
    }
}

/// Input of the `createPost` mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub author_id: String,
}

impl TryFromValue for CreatePostInput {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error> {
        Ok(CreatePostInput {
            title: required(value, "title")?,
            content: required(value, "content")?,
            author_id: required(value, "authorId")?,
        })
    }
}

/// Input of the `addComment` mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommentInput {
    pub post_id: String,
    pub content: String,
}

impl TryFromValue for CommentInput {
    fn try_from_value(value: &Value) -> Result<Self, anyhow::Error> {
        Ok(CommentInput {
            post_id: required(value, "postId")?,
            content: required(value, "content")?,
        })
    }
}
