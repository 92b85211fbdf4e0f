use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    Json,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    auth::jwt,
    comments,
    error::AppError,
    groups::Group,
    pagination::{PageMeta, PageQuery, PAGE_SIZE},
    posts::{
        GroupPostsResponse, Post, PostDetailResponse, PostForm, PostListResponse, PostResponse,
        PostRow,
    },
    response::ApiResponse,
};

/// Recent posts across the whole site, newest first.
/// GET /api/posts (response cached for 20 seconds)
pub async fn index(
    State(pool): State<PgPool>,
    Query(page_query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
        .fetch_one(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?;

    let page = PageMeta::new(total, &page_query);

    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.text, p.image, p.pub_date, p.author_id,
               u.username, u.first_name, u.last_name,
               g.title AS group_title, g.slug AS group_slug
        FROM posts p
        JOIN users u ON p.author_id = u.id
        LEFT JOIN groups g ON p.group_id = g.id
        ORDER BY p.pub_date DESC, p.id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(PAGE_SIZE)
    .bind(page.offset())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Index error: {:?}", e);
        AppError::InternalServerError
    })?;

    Ok(ApiResponse::success(PostListResponse {
        title: "Latest updates on the site".to_string(),
        posts: rows.into_iter().map(PostResponse::from).collect(),
        page,
    }))
}

/// Posts belonging to one group, resolved by slug.
/// GET /api/groups/:slug/posts
pub async fn group_posts(
    State(pool): State<PgPool>,
    Path(slug): Path<String>,
    Query(page_query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .ok_or(AppError::NotFound("Group not found".to_string()))?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE group_id = $1")
        .bind(group.id)
        .fetch_one(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?;

    let page = PageMeta::new(total, &page_query);

    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.text, p.image, p.pub_date, p.author_id,
               u.username, u.first_name, u.last_name,
               g.title AS group_title, g.slug AS group_slug
        FROM posts p
        JOIN users u ON p.author_id = u.id
        LEFT JOIN groups g ON p.group_id = g.id
        WHERE p.group_id = $1
        ORDER BY p.pub_date DESC, p.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(group.id)
    .bind(PAGE_SIZE)
    .bind(page.offset())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Group posts error: {:?}", e);
        AppError::InternalServerError
    })?;

    let title = format!("{} community posts", group.title);

    Ok(ApiResponse::success(GroupPostsResponse {
        title,
        group,
        posts: rows.into_iter().map(PostResponse::from).collect(),
        page,
    }))
}

/// One post with its comments and the author's total post count.
/// GET /api/posts/:id
pub async fn post_detail(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.text, p.image, p.pub_date, p.author_id,
               u.username, u.first_name, u.last_name,
               g.title AS group_title, g.slug AS group_slug
        FROM posts p
        JOIN users u ON p.author_id = u.id
        LEFT JOIN groups g ON p.group_id = g.id
        WHERE p.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await
    .map_err(|_| AppError::InternalServerError)?
    .ok_or(AppError::NotFound("Post not found".to_string()))?;

    let post_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(row.author_id)
            .fetch_one(&pool)
            .await
            .map_err(|_| AppError::InternalServerError)?;

    let comments = comments::handler::comments_for_post(&pool, id).await?;

    Ok(ApiResponse::success(PostDetailResponse {
        post: PostResponse::from(row),
        post_count,
        comments,
    }))
}

/// Create a post authored by the requester.
/// POST /api/posts -> 303 to the requester's profile
pub async fn post_create(
    State(pool): State<PgPool>,
    claims: jwt::Claims,
    Json(payload): Json<PostForm>,
) -> Result<Redirect, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    ensure_group_exists(&pool, payload.group_id).await?;

    let username = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
        .bind(claims.sub)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    sqlx::query("INSERT INTO posts (text, author_id, group_id, image) VALUES ($1, $2, $3, $4)")
        .bind(&payload.text)
        .bind(claims.sub)
        .bind(payload.group_id)
        .bind(&payload.image)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {:?}", e);
            AppError::InternalServerError
        })?;

    Ok(Redirect::to(&format!("/api/profiles/{}", username)))
}

/// Edit a post in place. Non-authors are bounced back to the detail view
/// without modification (soft-deny); the publication timestamp never changes.
/// PUT /api/posts/:id -> 303 to the post's detail view
pub async fn post_edit(
    State(pool): State<PgPool>,
    claims: jwt::Claims,
    Path(id): Path<i64>,
    Json(payload): Json<PostForm>,
) -> Result<Redirect, AppError> {
    let author_id = sqlx::query_scalar::<_, i64>("SELECT author_id FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if author_id != claims.sub {
        // Soft-deny: non-authors are sent to the detail view unchanged.
        return Ok(Redirect::to(&format!("/api/posts/{}", id)));
    }

    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    ensure_group_exists(&pool, payload.group_id).await?;

    // pub_date is not in the SET list; it stays as set at creation
    let post = sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts SET text = $1, group_id = $2, image = $3
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&payload.text)
    .bind(payload.group_id)
    .bind(&payload.image)
    .bind(id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update post: {:?}", e);
        AppError::InternalServerError
    })?;

    Ok(Redirect::to(&format!("/api/posts/{}", post.id)))
}

/// A group reference in a submission must point at an existing group,
/// mirroring the choice-field validation of the submission form.
async fn ensure_group_exists(pool: &PgPool, group_id: Option<i64>) -> Result<(), AppError> {
    if let Some(group_id) = group_id {
        sqlx::query("SELECT 1 FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(pool)
            .await
            .map_err(|_| AppError::InternalServerError)?
            .ok_or(AppError::UnprocessableEntity("Unknown group".to_string()))?;
    }
    Ok(())
}
