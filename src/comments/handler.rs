use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::{
    auth::jwt,
    comments::{Comment, CommentAuthor, CommentForm, CommentResponse},
    error::AppError,
};

#[derive(FromRow)]
struct CommentFromDb {
    id: i64,
    author_id: i64,
    text: String,
    created: chrono::DateTime<chrono::Utc>,
    updated: chrono::DateTime<chrono::Utc>,
    active: bool,
    // author fields
    username: String,
}

impl From<CommentFromDb> for CommentResponse {
    fn from(c: CommentFromDb) -> Self {
        CommentResponse {
            id: c.id,
            author: CommentAuthor {
                id: c.author_id,
                username: c.username,
            },
            text: c.text,
            created: c.created,
            updated: c.updated,
            active: c.active,
        }
    }
}

/// Comment a post as the requester. Invalid text is rejected with a 422,
/// the same policy every other submission follows.
/// POST /api/posts/:id/comments -> 303 to the post's detail view
pub async fn add_comment(
    State(pool): State<PgPool>,
    claims: jwt::Claims,
    Path(post_id): Path<i64>,
    Json(payload): Json<CommentForm>,
) -> Result<Redirect, AppError> {
    sqlx::query("SELECT 1 FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let comment = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (post_id, author_id, text)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(post_id)
    .bind(claims.sub)
    .bind(&payload.text)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create comment: {:?}", e);
        AppError::InternalServerError
    })?;

    Ok(Redirect::to(&format!("/api/posts/{}", comment.post_id)))
}

/// Comments of one post, newest first, with author info. Used by the post
/// detail handler.
pub async fn comments_for_post(
    pool: &PgPool,
    post_id: i64,
) -> Result<Vec<CommentResponse>, AppError> {
    let rows = sqlx::query_as::<_, CommentFromDb>(
        r#"
        SELECT c.id, c.author_id, c.text, c.created, c.updated, c.active,
               u.username
        FROM comments c
        JOIN users u ON c.author_id = u.id
        WHERE c.post_id = $1
        ORDER BY c.created DESC, c.id DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch comments: {:?}", e);
        AppError::InternalServerError
    })?;

    Ok(rows.into_iter().map(CommentResponse::from).collect())
}
