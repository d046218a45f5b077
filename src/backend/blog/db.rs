//! Blog queries

use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::api::Page;
use crate::shared::blog::{BlogPost, Comment, PostStatus};

const POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, u.username AS author_username, p.title, p.content, p.tags,
           p.status, p.like_count, p.view_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id AND c.is_deleted = 0) AS comment_count,
           p.published_at, p.created_at, p.updated_at
    FROM blog_posts p
    JOIN users u ON u.id = p.author_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.author_id, u.username AS author_username, c.parent_id,
           c.content, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

pub async fn insert_post(
    pool: &SqlitePool,
    author_id: Uuid,
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO blog_posts (id, author_id, title, content, tags, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'draft', $6, $6)
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(title)
    .bind(content)
    .bind(Json(tags))
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

/// A post that has not been deleted
pub async fn get_post(pool: &SqlitePool, post_id: Uuid) -> Result<Option<BlogPost>, sqlx::Error> {
    sqlx::query_as::<_, BlogPost>(&format!("{} WHERE p.id = $1 AND p.is_deleted = 0", POST_SELECT))
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Published posts, newest first
pub async fn list_published(
    pool: &SqlitePool,
    author_id: Option<Uuid>,
    tag: Option<&str>,
    page: Page,
) -> Result<(Vec<BlogPost>, i64), sqlx::Error> {
    let filter = r#"
        WHERE p.is_deleted = 0 AND p.status = 'published'
          AND ($1 IS NULL OR p.author_id = $1)
          AND ($2 IS NULL OR EXISTS (SELECT 1 FROM json_each(p.tags) t WHERE t.value = $2))
    "#;

    let posts = sqlx::query_as::<_, BlogPost>(&format!(
        "{} {} ORDER BY p.published_at DESC LIMIT $3 OFFSET $4",
        POST_SELECT, filter
    ))
    .bind(author_id)
    .bind(tag)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM blog_posts p {}", filter))
        .bind(author_id)
        .bind(tag)
        .fetch_one(pool)
        .await?;

    Ok((posts, total))
}

pub async fn update_post(
    pool: &SqlitePool,
    post_id: Uuid,
    title: &str,
    content: &str,
    tags: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE blog_posts SET title = $1, content = $2, tags = $3, updated_at = $4 WHERE id = $5",
    )
    .bind(title)
    .bind(content)
    .bind(Json(tags))
    .bind(Utc::now())
    .bind(post_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set the status; publishing stamps `published_at` only if it is still empty
pub async fn set_status(pool: &SqlitePool, post_id: Uuid, status: PostStatus) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE blog_posts
        SET status = $1,
            published_at = CASE WHEN $1 = 'published' THEN COALESCE(published_at, $2) ELSE published_at END,
            updated_at = $2
        WHERE id = $3
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(post_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn increment_views(pool: &SqlitePool, post_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE blog_posts SET view_count = view_count + 1 WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn soft_delete_post(pool: &SqlitePool, post_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE blog_posts SET is_deleted = 1, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn refresh_like_count(pool: &SqlitePool, post_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE blog_posts
        SET like_count = (SELECT COUNT(*) FROM post_likes WHERE post_id = $1)
        WHERE id = $1
        RETURNING like_count
        "#,
    )
    .bind(post_id)
    .fetch_one(pool)
    .await
}

/// Returns whether a like was added, and the new count
pub async fn like(pool: &SqlitePool, post_id: Uuid, user_id: Uuid) -> Result<(bool, i64), sqlx::Error> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO post_likes (post_id, user_id, created_at) VALUES ($1, $2, $3)",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    let count = refresh_like_count(pool, post_id).await?;
    Ok((result.rows_affected() > 0, count))
}

pub async fn unlike(pool: &SqlitePool, post_id: Uuid, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    refresh_like_count(pool, post_id).await
}

pub async fn insert_comment(
    pool: &SqlitePool,
    post_id: Uuid,
    author_id: Uuid,
    parent_id: Option<Uuid>,
    content: &str,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO comments (id, post_id, author_id, parent_id, content, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        "#,
    )
    .bind(id)
    .bind(post_id)
    .bind(author_id)
    .bind(parent_id)
    .bind(content)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

/// A comment that has not been deleted
pub async fn get_comment(pool: &SqlitePool, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!("{} WHERE c.id = $1 AND c.is_deleted = 0", COMMENT_SELECT))
        .bind(comment_id)
        .fetch_optional(pool)
        .await
}

/// Oldest first
pub async fn list_comments(pool: &SqlitePool, post_id: Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "{} WHERE c.post_id = $1 AND c.is_deleted = 0 ORDER BY c.created_at ASC",
        COMMENT_SELECT
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await
}

pub async fn update_comment(pool: &SqlitePool, comment_id: Uuid, content: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE comments SET content = $1, updated_at = $2 WHERE id = $3")
        .bind(content)
        .bind(Utc::now())
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn soft_delete_comment(pool: &SqlitePool, comment_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE comments SET is_deleted = 1, updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(())
}
