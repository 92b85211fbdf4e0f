use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::comments::CommentResponse;
use crate::groups::Group;
use crate::pagination::PageMeta;

pub mod handler;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: chrono::DateTime<chrono::Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Submission payload shared by post_create and post_edit; editing rebinds
/// every field, the publication timestamp stays untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct PostForm {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Text must be between 1 and 5000 characters"
    ))]
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl AuthorResponse {
    pub fn new(id: i64, username: String, first_name: &str, last_name: &str) -> Self {
        let full = format!("{} {}", first_name, last_name);
        let full = full.trim();
        let full_name = if full.is_empty() {
            username.clone()
        } else {
            full.to_string()
        };
        AuthorResponse {
            id,
            username,
            full_name,
        }
    }
}

/// Group info embedded in a post response.
#[derive(Debug, Serialize)]
pub struct GroupRef {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: chrono::DateTime<chrono::Utc>,
    pub author: AuthorResponse,
    pub group: Option<GroupRef>,
}

/// Row shape for the post + author + group join used by every listing.
#[derive(FromRow)]
pub(crate) struct PostRow {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: chrono::DateTime<chrono::Utc>,
    // author fields
    pub author_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    // group fields, absent when the post has no group
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

impl From<PostRow> for PostResponse {
    fn from(p: PostRow) -> Self {
        let group = match (p.group_title, p.group_slug) {
            (Some(title), Some(slug)) => Some(GroupRef { title, slug }),
            _ => None,
        };
        PostResponse {
            id: p.id,
            text: p.text,
            image: p.image,
            pub_date: p.pub_date,
            author: AuthorResponse::new(p.author_id, p.username, &p.first_name, &p.last_name),
            group,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub title: String,
    pub posts: Vec<PostResponse>,
    pub page: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct GroupPostsResponse {
    pub title: String,
    pub group: Group,
    pub posts: Vec<PostResponse>,
    pub page: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub post_count: i64,
    pub comments: Vec<CommentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(text: String) -> PostForm {
        PostForm {
            text,
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn text_length_bounds() {
        assert!(form("a".repeat(5000)).validate().is_ok());
        assert!(form("a".repeat(5001)).validate().is_err());
        assert!(form(String::new()).validate().is_err());
    }

    #[test]
    fn row_without_group_maps_to_none() {
        let row = PostRow {
            id: 1,
            text: "hello".to_string(),
            image: None,
            pub_date: chrono::Utc::now(),
            author_id: 7,
            username: "leo".to_string(),
            first_name: "Leo".to_string(),
            last_name: "Tolstoy".to_string(),
            group_title: None,
            group_slug: None,
        };
        let response = PostResponse::from(row);
        assert!(response.group.is_none());
        assert_eq!(response.author.full_name, "Leo Tolstoy");
    }
}
