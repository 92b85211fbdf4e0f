use serde::{Deserialize, Serialize};

use crate::pagination::PageMeta;
use crate::posts::{AuthorResponse, PostResponse};

pub mod handler;

/// Database model for a follow edge: `user_id` follows `author_id`. The
/// pair is unique at the storage layer; self-follows are prevented in the
/// handler only.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// An author's profile: their posts plus follow state for the requester.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub title: String,
    pub author: AuthorResponse,
    pub post_count: i64,
    /// Whether the requester follows this author; always false for
    /// unauthenticated requests.
    pub following: bool,
    pub posts: Vec<PostResponse>,
    pub page: PageMeta,
}
