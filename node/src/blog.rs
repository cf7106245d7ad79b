//! The blog API: posts, their authors and comments, and a subscription to
//! new comments.

use graph::prelude::*;
use postgraph_graphql::prelude::*;

/// The topic new comments are published to
pub const COMMENT_ADDED: &str = "commentAdded";

/// Builds the blog schema on top of `store`. Mutations that add comments
/// publish them to `hub`.
pub fn schema<S>(store: Arc<S>, hub: Arc<SubscriptionHub>) -> Result<Schema, SchemaError>
where
    S: PostStore + AuthorStore,
{
    let mut builder = SchemaBuilder::new();

    {
        let (all, by_id) = (store.cheap_clone(), store.cheap_clone());
        builder
            .query()
            .resolve("allPosts", FieldType::list("Post"), move |_: Value, _: Arguments| {
                all_posts(all.cheap_clone())
            })
            .resolve("postById", FieldType::object("Post"), move |_: Value, args: Arguments| {
                post_by_id(by_id.cheap_clone(), args)
            });
    }

    {
        let (posts, comments) = (store.cheap_clone(), store.cheap_clone());
        builder
            .mutation()
            .resolve("createPost", FieldType::object("Post"), move |_: Value, args: Arguments| {
                create_post(posts.cheap_clone(), args)
            })
            .resolve("addComment", FieldType::object("Comment"), move |_: Value, args: Arguments| {
                add_comment(comments.cheap_clone(), hub.cheap_clone(), args)
            });
    }

    builder
        .subscription()
        .subscribe(COMMENT_ADDED, FieldType::object("Comment"), COMMENT_ADDED);

    let (authors, comments) = (store.cheap_clone(), store.cheap_clone());
    builder
        .object("Post")
        .scalars(&["id", "title", "content", "status", "authorId", "createdAt"])
        .batched(
            "author",
            FieldType::object("Author"),
            key_field("authorId"),
            OneToOne::new(
                move |ids: Vec<Key>| {
                    let store = authors.cheap_clone();
                    async move { store.authors_by_ids(&ids).await }
                },
                |author: &Author| author.id.clone(),
            ),
        )
        .batched(
            "comments",
            FieldType::list("Comment"),
            key_field("id"),
            OneToMany::new(
                move |post_ids: Vec<Key>| {
                    let store = comments.cheap_clone();
                    async move { store.comments_by_post_ids(&post_ids).await }
                },
                |comment: &Comment| comment.post_id.clone(),
            ),
        );

    let posts = store;
    builder
        .object("Comment")
        .scalars(&["id", "content", "postId", "createdAt"])
        .batched(
            "post",
            FieldType::object("Post"),
            key_field("postId"),
            OneToOne::new(
                move |ids: Vec<Key>| {
                    let store = posts.cheap_clone();
                    async move { store.posts_by_ids(&ids).await }
                },
                |post: &Post| post.id.clone(),
            ),
        );

    builder.object("Author").scalars(&["id", "name", "email"]);

    builder.build()
}

async fn all_posts<S: PostStore>(store: Arc<S>) -> Result<Value, anyhow::Error> {
    Ok(store.all_posts().await?.into_value())
}

async fn post_by_id<S: PostStore>(store: Arc<S>, args: Arguments) -> Result<Value, anyhow::Error> {
    let id: String = args.required("postId")?;
    Ok(store.post_by_id(&id).await?.into_value())
}

async fn create_post<S: PostStore>(store: Arc<S>, args: Arguments) -> Result<Value, anyhow::Error> {
    let input: CreatePostInput = args.required("createPostInput")?;
    let id = store.create_post(input).await?;
    let post = store
        .post_by_id(&id)
        .await?
        .ok_or_else(|| anyhow!("post `{}` disappeared after it was created", id))?;
    Ok(post.into_value())
}

async fn add_comment<S: PostStore>(
    store: Arc<S>,
    hub: Arc<SubscriptionHub>,
    args: Arguments,
) -> Result<Value, anyhow::Error> {
    let input: CommentInput = args.required("commentInput")?;
    let id = store.add_comment(input).await?;
    let comment = store
        .comment_by_id(&id)
        .await?
        .ok_or_else(|| anyhow!("comment `{}` disappeared after it was added", id))?
        .into_value();

    // Subscribers are notified on a best-effort basis; the comment was
    // added either way
    hub.publish_or_log(COMMENT_ADDED, comment.clone());
    Ok(comment)
}
