use axum::{extract::State, response::IntoResponse, Json};
use slug::slugify;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    auth::jwt,
    error::AppError,
    groups::{CreateGroup, Group},
    response::ApiResponse,
};

pub async fn list_groups(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let groups = sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY title ASC")
        .fetch_all(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?;

    Ok(ApiResponse::success(groups))
}

pub async fn create_group(
    State(pool): State<PgPool>,
    _claims: jwt::Claims,
    Json(payload): Json<CreateGroup>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let slug_base = slugify(&payload.title);
    let mut slug = slug_base.clone();
    let mut suffix = 1;

    // Simple slug uniqueness check
    while sqlx::query("SELECT 1 FROM groups WHERE slug = $1")
        .bind(&slug)
        .fetch_optional(&pool)
        .await
        .map_err(|_| AppError::InternalServerError)?
        .is_some()
    {
        slug = format!("{}-{}", slug_base, suffix);
        suffix += 1;
    }

    let group = sqlx::query_as::<_, Group>(
        r#"
        INSERT INTO groups (title, slug, description)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&payload.title)
    .bind(&slug)
    .bind(&payload.description)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create group: {:?}", e);
        AppError::InternalServerError
    })?;

    Ok(ApiResponse::success(group).created())
}
