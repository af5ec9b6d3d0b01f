use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::blog::ValidationError;
use crate::db::models::Comment;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_CONTENT_CHARS: usize = 1000;

/// A validated commenter name and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub author_name: String,
    pub content: String,
}

impl CommentDraft {
    pub fn new(author_name: &str, content: &str) -> Result<Self, ValidationError> {
        let author_name = author_name.trim();
        let content = content.trim();

        if author_name.is_empty() || content.is_empty() {
            return Err(ValidationError::MissingCommentFields);
        }
        if author_name.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::NameTooLong(MAX_NAME_CHARS));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(ValidationError::CommentTooLong(MAX_CONTENT_CHARS));
        }

        Ok(Self {
            author_name: author_name.to_string(),
            content: content.to_string(),
        })
    }
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_name: row.get(2)?,
        author_id: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Oldest first.
pub fn list_comments(conn: &Connection, post_id: &str) -> Result<Vec<Comment>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, author_name, author_id, content, created_at
         FROM comments WHERE post_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], map_comment)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn count_comments(conn: &Connection, post_id: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(
        "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )
}

pub fn insert_comment(
    conn: &Connection,
    post_id: &str,
    author_id: Option<&str>,
    draft: &CommentDraft,
) -> Result<Comment, rusqlite::Error> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.query_row(
        "INSERT INTO comments (id, post_id, author_name, author_id, content)
         VALUES (?1, ?2, ?3, ?4, ?5)
         RETURNING id, post_id, author_name, author_id, content, created_at",
        params![id, post_id, draft.author_name, author_id, draft.content],
        map_comment,
    )
}

pub fn get_comment(conn: &Connection, id: &str) -> Result<Option<Comment>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, post_id, author_name, author_id, content, created_at
         FROM comments WHERE id = ?1",
        params![id],
        map_comment,
    )
    .optional()
}

pub fn delete_comment(conn: &Connection, id: &str) -> Result<bool, rusqlite::Error> {
    let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
