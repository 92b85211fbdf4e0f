use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod handler;

/// Database model for a comment. `updated` and `active` are carried in the
/// schema but no endpoint drives them yet: comments cannot be edited or
/// soft-deleted through the API.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: chrono::DateTime<chrono::Utc>,
    pub updated: chrono::DateTime<chrono::Utc>,
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Text must be between 1 and 5000 characters"
    ))]
    pub text: String,
}

/// Author info embedded in a comment response.
#[derive(Debug, Serialize)]
pub struct CommentAuthor {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub author: CommentAuthor,
    pub text: String,
    pub created: chrono::DateTime<chrono::Utc>,
    pub updated: chrono::DateTime<chrono::Utc>,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_length_bounds() {
        let ok = CommentForm {
            text: "a".repeat(5000),
        };
        assert!(ok.validate().is_ok());

        let too_long = CommentForm {
            text: "a".repeat(5001),
        };
        assert!(too_long.validate().is_err());

        let empty = CommentForm {
            text: String::new(),
        };
        assert!(empty.validate().is_err());
    }
}
