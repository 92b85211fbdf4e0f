use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use sqlx::PgPool;

use crate::{
    auth::{jwt, User},
    error::AppError,
    follows::{Follow, ProfileResponse},
    pagination::{PageMeta, PageQuery, PAGE_SIZE},
    posts::{AuthorResponse, PostListResponse, PostResponse, PostRow},
    response::ApiResponse,
};

/// An author's profile with their posts. Follow state is only computed for
/// authenticated requesters.
/// GET /api/profiles/:username
pub async fn profile(
    State(pool): State<PgPool>,
    claims: Option<jwt::Claims>,
    Path(username): Path<String>,
    Query(page_query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let author = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let post_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author.id)
            .fetch_one(&pool)
            .await
            .map_err(|_| AppError::InternalServerError)?;

    let page = PageMeta::new(post_count, &page_query);

    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        SELECT p.id, p.text, p.image, p.pub_date, p.author_id,
               u.username, u.first_name, u.last_name,
               g.title AS group_title, g.slug AS group_slug
        FROM posts p
        JOIN users u ON p.author_id = u.id
        LEFT JOIN groups g ON p.group_id = g.id
        WHERE p.author_id = $1
        ORDER BY p.pub_date DESC, p.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(author.id)
    .bind(PAGE_SIZE)
    .bind(page.offset())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Profile posts error: {:?}", e);
        AppError::InternalServerError
    })?;

    let following = if let Some(claims) = claims {
        sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE user_id = $1 AND author_id = $2",
        )
        .bind(claims.sub)
        .bind(author.id)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .is_some()
    } else {
        false
    };

    let title = format!("Profile of {}", author.full_name());

    Ok(ApiResponse::success(ProfileResponse {
        title,
        author: AuthorResponse::new(
            author.id,
            author.username,
            &author.first_name,
            &author.last_name,
        ),
        post_count,
        following,
        posts: rows.into_iter().map(PostResponse::from).collect(),
        page,
    }))
}

/// Posts authored by people the requester follows, newest first.
/// GET /api/feed
pub async fn follow_index(
    State(pool): State<PgPool>,
    claims: jwt::Claims,
    Query(page_query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM posts p
        JOIN follows f ON p.author_id = f.author_id
        WHERE f.user_id = $1
        "#,
    )
    .bind(claims.sub)
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
        JOIN follows f ON p.author_id = f.author_id AND f.user_id = $1
        LEFT JOIN groups g ON p.group_id = g.id
        ORDER BY p.pub_date DESC, p.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(claims.sub)
    .bind(PAGE_SIZE)
    .bind(page.offset())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Follow feed error: {:?}", e);
        AppError::InternalServerError
    })?;

    Ok(ApiResponse::success(PostListResponse {
        title: "My subscriptions".to_string(),
        posts: rows.into_iter().map(PostResponse::from).collect(),
        page,
    }))
}

/// Follow an author. Following yourself is a no-op, following twice keeps a
/// single edge.
/// POST /api/profiles/:username/follow -> 303 to the author's profile
pub async fn profile_follow(
    State(pool): State<PgPool>,
    claims: jwt::Claims,
    Path(username): Path<String>,
) -> Result<Redirect, AppError> {
    let author_id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1")
        .bind(&username)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if author_id != claims.sub {
        sqlx::query(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, author_id) DO NOTHING
            "#,
        )
        .bind(claims.sub)
        .bind(author_id)
        .execute(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?;
    }

    Ok(Redirect::to(&format!("/api/profiles/{}", username)))
}

/// Drop the follow edge requester -> author. Missing edges are a 404 and
/// change nothing.
/// POST /api/profiles/:username/unfollow -> 303 to the author's profile
pub async fn profile_unfollow(
    State(pool): State<PgPool>,
    claims: jwt::Claims,
    Path(username): Path<String>,
) -> Result<Redirect, AppError> {
    let deleted = sqlx::query(
        r#"
        DELETE FROM follows
        WHERE user_id = $1
          AND author_id = (SELECT id FROM users WHERE username = $2)
        "#,
    )
    .bind(claims.sub)
    .bind(&username)
    .execute(&pool)
    .await
    .map_err(|_| AppError::InternalServerError)?
    .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Follow not found".to_string()));
    }

    Ok(Redirect::to(&format!("/api/profiles/{}", username)))
}
