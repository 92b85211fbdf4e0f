use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod handler;

/// A named category posts can optionally belong to. The slug is the
/// external identifier used in URLs.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroup {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title must be between 1 and 200 characters"
    ))]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_length_bounds() {
        let ok = CreateGroup {
            title: "a".repeat(200),
            description: String::new(),
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateGroup {
            title: "a".repeat(201),
            description: String::new(),
        };
        assert!(too_long.validate().is_err());

        let empty = CreateGroup {
            title: String::new(),
            description: String::new(),
        };
        assert!(empty.validate().is_err());
    }
}
