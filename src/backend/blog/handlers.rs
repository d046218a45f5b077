//! Blog HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use super::db;
use crate::backend::error::{created, ok, ok_with, ApiResult, BackendError, CreatedResult};
use crate::backend::gamification::rules::{COMMENT_POINTS, POST_PUBLISHED_POINTS};
use crate::backend::gamification::{record_activity, ActivityRecord};
use crate::backend::middleware::{AuthUser, AuthenticatedUser};
use crate::backend::notifications::notify;
use crate::backend::server::state::AppState;
use crate::shared::api::{Page, Paginated};
use crate::shared::blog::{
    normalize_tags, BlogPost, Comment, CreateCommentRequest, CreatePostRequest, LikeState,
    PostListQuery, PostStatus, UpdateCommentRequest, UpdatePostRequest, MAX_COMMENT_LENGTH,
    MAX_POST_LENGTH, MAX_TAGS, MAX_TAG_LENGTH, MAX_TITLE_LENGTH,
};
use crate::shared::notifications::NotificationKind;
use crate::shared::validation::{clean_required, sanitize_text};

fn clean_tags(tags: &[String]) -> Result<Vec<String>, BackendError> {
    let tags = normalize_tags(tags);
    if tags.len() > MAX_TAGS {
        return Err(BackendError::bad_request(format!("At most {} tags are allowed", MAX_TAGS)));
    }
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LENGTH) {
        return Err(BackendError::bad_request(format!(
            "Tags must be at most {} characters",
            MAX_TAG_LENGTH
        )));
    }
    Ok(tags.iter().map(|t| sanitize_text(t)).collect())
}

async fn load_post(state: &AppState, post_id: Uuid) -> Result<BlogPost, BackendError> {
    db::get_post(&state.db, post_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Post not found"))
}

/// Drafts and archived posts are only visible to the author and moderators
async fn readable_post(
    state: &AppState,
    post_id: Uuid,
    user: &AuthenticatedUser,
) -> Result<BlogPost, BackendError> {
    let post = load_post(state, post_id).await?;
    if post.status != PostStatus::Published && post.author_id != user.user_id && !user.is_moderator() {
        return Err(BackendError::not_found("Post not found"));
    }
    Ok(post)
}

async fn own_post(state: &AppState, post_id: Uuid, user: &AuthenticatedUser) -> Result<BlogPost, BackendError> {
    let post = readable_post(state, post_id, user).await?;
    if post.author_id != user.user_id {
        return Err(BackendError::forbidden("Only the author can change this post"));
    }
    Ok(post)
}

/// Publish a post; points are only awarded on the first publication
async fn publish(state: &AppState, post: &BlogPost) -> Result<(), BackendError> {
    db::set_status(&state.db, post.id, PostStatus::Published).await?;
    if post.published_at.is_none() {
        record_activity(
            state,
            ActivityRecord::new(post.author_id, "post_published")
                .entity("post", post.id)
                .points(POST_PUBLISHED_POINTS)
                .metadata(json!({ "title": post.title })),
        )
        .await?;
    }
    Ok(())
}

/// `GET /api/posts?author_id&tag&page&limit` - published posts, newest first
pub async fn list_posts(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(query): Query<PostListQuery>,
) -> ApiResult<Paginated<BlogPost>> {
    let page = Page::new(query.page, query.limit);
    let tag = query.tag.as_deref().map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty());
    let (posts, total) = db::list_published(&state.db, query.author_id, tag.as_deref(), page).await?;
    ok(Paginated::new(posts, page, total))
}

/// Create a post, as a draft unless `publish` is set
///
/// # Example Request
///
/// ```http
/// POST /api/posts HTTP/1.1
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "title": "Week one", "content": "...", "tags": ["running"], "publish": true }
/// ```
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> CreatedResult<BlogPost> {
    let title = clean_required("title", &request.title, MAX_TITLE_LENGTH)?;
    let content = clean_required("content", &request.content, MAX_POST_LENGTH)?;
    let tags = clean_tags(&request.tags)?;

    let id = db::insert_post(&state.db, user.user_id, &title, &content, &tags).await?;
    let mut post = load_post(&state, id).await?;
    if request.publish {
        publish(&state, &post).await?;
        post = load_post(&state, id).await?;
    }

    tracing::info!("Post {} created by {}", post.id, user.username);
    created("Post created", post)
}

/// `GET /api/posts/{id}` - counts a view unless the author is reading
pub async fn get_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<BlogPost> {
    let mut post = readable_post(&state, post_id, &user).await?;
    if post.author_id != user.user_id {
        db::increment_views(&state.db, post.id).await?;
        post.view_count += 1;
    }
    ok(post)
}

/// `PATCH /api/posts/{id}` - author only
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
    Json(request): Json<UpdatePostRequest>,
) -> ApiResult<BlogPost> {
    let post = own_post(&state, post_id, &user).await?;

    let title = match request.title.as_deref() {
        Some(raw) => clean_required("title", raw, MAX_TITLE_LENGTH)?,
        None => post.title.clone(),
    };
    let content = match request.content.as_deref() {
        Some(raw) => clean_required("content", raw, MAX_POST_LENGTH)?,
        None => post.content.clone(),
    };
    let tags = match request.tags.as_deref() {
        Some(raw) => clean_tags(raw)?,
        None => post.tags.clone(),
    };

    db::update_post(&state.db, post.id, &title, &content, &tags).await?;
    match request.status {
        Some(PostStatus::Published) if post.status != PostStatus::Published => {
            publish(&state, &post).await?
        }
        Some(status) if status != post.status => db::set_status(&state.db, post.id, status).await?,
        _ => {}
    }

    ok_with("Post updated", load_post(&state, post.id).await?)
}

/// `DELETE /api/posts/{id}` - author or moderator; soft delete
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<()> {
    let post = readable_post(&state, post_id, &user).await?;
    if post.author_id != user.user_id && !user.is_moderator() {
        return Err(BackendError::forbidden("Only the author can delete this post"));
    }
    db::soft_delete_post(&state.db, post.id).await?;
    tracing::info!("Post {} deleted by {}", post.id, user.username);
    ok_with("Post deleted", ())
}

/// `POST /api/posts/{id}/publish`
pub async fn publish_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<BlogPost> {
    let post = own_post(&state, post_id, &user).await?;
    if post.status == PostStatus::Published {
        return ok_with("Post already published", post);
    }
    publish(&state, &post).await?;
    tracing::info!("Post {} published by {}", post.id, user.username);
    ok_with("Post published", load_post(&state, post.id).await?)
}

async fn published_post(state: &AppState, post_id: Uuid) -> Result<BlogPost, BackendError> {
    let post = load_post(state, post_id).await?;
    if post.status != PostStatus::Published {
        return Err(BackendError::not_found("Post not found"));
    }
    Ok(post)
}

/// `POST /api/posts/{id}/like` - idempotent
pub async fn like_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<LikeState> {
    let post = published_post(&state, post_id).await?;
    let (added, like_count) = db::like(&state.db, post.id, user.user_id).await?;

    if added && post.author_id != user.user_id {
        notify(
            &state,
            post.author_id,
            NotificationKind::PostLiked,
            &format!("{} liked your post", user.username),
            Some(&post.title),
            json!({ "post_id": post.id, "user_id": user.user_id }),
        )
        .await?;
    }

    ok(LikeState {
        post_id: post.id,
        liked: true,
        like_count,
    })
}

/// `DELETE /api/posts/{id}/like` - idempotent
pub async fn unlike_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<LikeState> {
    let post = published_post(&state, post_id).await?;
    let like_count = db::unlike(&state.db, post.id, user.user_id).await?;
    ok(LikeState {
        post_id: post.id,
        liked: false,
        like_count,
    })
}

/// `GET /api/posts/{id}/comments` - oldest first
pub async fn list_comments(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Vec<Comment>> {
    let post = readable_post(&state, post_id, &user).await?;
    ok(db::list_comments(&state.db, post.id).await?)
}

/// Comment on a published post
///
/// # Errors
///
/// * `400 Bad Request` - post not published, or `parent_id` is on another post
/// * `404 Not Found` - post or parent comment missing
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<Uuid>,
    Json(request): Json<CreateCommentRequest>,
) -> CreatedResult<Comment> {
    let post = readable_post(&state, post_id, &user).await?;
    if post.status != PostStatus::Published {
        return Err(BackendError::bad_request("Comments are only allowed on published posts"));
    }
    let content = clean_required("content", &request.content, MAX_COMMENT_LENGTH)?;

    if let Some(parent_id) = request.parent_id {
        let parent = db::get_comment(&state.db, parent_id)
            .await?
            .ok_or_else(|| BackendError::not_found("Parent comment not found"))?;
        if parent.post_id != post.id {
            return Err(BackendError::bad_request("Parent comment belongs to another post"));
        }
    }

    let id = db::insert_comment(&state.db, post.id, user.user_id, request.parent_id, &content).await?;
    let comment = db::get_comment(&state.db, id)
        .await?
        .ok_or_else(|| BackendError::state("comment vanished after insert"))?;

    record_activity(
        &state,
        ActivityRecord::new(user.user_id, "comment")
            .entity("comment", comment.id)
            .points(COMMENT_POINTS)
            .metadata(json!({ "post_id": post.id })),
    )
    .await?;

    if post.author_id != user.user_id {
        notify(
            &state,
            post.author_id,
            NotificationKind::PostCommented,
            &format!("{} commented on your post", user.username),
            Some(&post.title),
            json!({ "post_id": post.id, "comment_id": comment.id }),
        )
        .await?;
    }

    created("Comment added", comment)
}

async fn load_comment(state: &AppState, comment_id: Uuid) -> Result<Comment, BackendError> {
    db::get_comment(&state.db, comment_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Comment not found"))
}

/// `PATCH /api/comments/{id}` - author only
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(request): Json<UpdateCommentRequest>,
) -> ApiResult<Comment> {
    let comment = load_comment(&state, comment_id).await?;
    if comment.author_id != user.user_id {
        return Err(BackendError::forbidden("Only the author can edit this comment"));
    }
    let content = clean_required("content", &request.content, MAX_COMMENT_LENGTH)?;
    db::update_comment(&state.db, comment.id, &content).await?;
    ok_with("Comment updated", load_comment(&state, comment.id).await?)
}

/// `DELETE /api/comments/{id}` - author or moderator
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<()> {
    let comment = load_comment(&state, comment_id).await?;
    if comment.author_id != user.user_id && !user.is_moderator() {
        return Err(BackendError::forbidden("Only the author can delete this comment"));
    }
    db::soft_delete_comment(&state.db, comment.id).await?;
    ok_with("Comment deleted", ())
}
