use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub full_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub is_hidden: bool,
    pub author_id: Option<String>,
    /// Joined from the author's profile
    pub author_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Post {
    pub fn author_display_name(&self) -> &str {
        self.author_name.as_deref().unwrap_or("Anonymous")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_name: String,
    pub author_id: Option<String>,
    pub content: String,
    pub created_at: String,
}

/// A profile with its number of visible posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub user_id: String,
    pub full_name: String,
    pub post_count: i64,
}
