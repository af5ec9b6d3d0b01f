use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::blog::{ValidationError, Viewer};
use crate::db::models::Post;

/// How many of the newest posts the index carousel shows.
pub const FEATURED_COUNT: usize = 5;

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.image_url, p.is_hidden, p.author_id,
        pr.full_name, p.created_at, p.updated_at
     FROM posts p
     LEFT JOIN profiles pr ON pr.user_id = p.author_id";

/// A validated title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostDraft {
    pub fn new(title: &str, content: &str) -> Result<Self, ValidationError> {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(ValidationError::MissingPostFields);
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        is_hidden: row.get(4)?,
        author_id: row.get(5)?,
        author_name: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn insert_post(
    conn: &Connection,
    author_id: &str,
    draft: &PostDraft,
    image_url: Option<&str>,
) -> Result<String, rusqlite::Error> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO posts (id, title, content, image_url, author_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![id, draft.title, draft.content, image_url, author_id],
    )?;
    Ok(id)
}

pub fn get_post(conn: &Connection, id: &str) -> Result<Option<Post>, rusqlite::Error> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", POST_SELECT),
        params![id],
        map_post,
    )
    .optional()
}

/// A post as `viewer` may see it: hidden posts only for their author or an admin.
pub fn visible_post(
    conn: &Connection,
    id: &str,
    viewer: &Viewer,
) -> Result<Option<Post>, rusqlite::Error> {
    Ok(get_post(conn, id)?
        .filter(|post| !post.is_hidden || viewer.can_manage(post.author_id.as_deref())))
}

/// Newest first, filtered to what `viewer` may see, optionally searched.
pub fn list_posts(
    conn: &Connection,
    viewer: &Viewer,
    search: Option<&str>,
) -> Result<Vec<Post>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE p.is_hidden = 0 OR ?1 OR p.author_id = ?2
         ORDER BY p.created_at DESC, p.rowid DESC",
        POST_SELECT
    ))?;

    let posts = stmt
        .query_map(params![viewer.is_admin, viewer.user_id], map_post)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match search.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => posts
            .into_iter()
            .filter(|post| matches_search(post, query))
            .collect(),
        None => posts,
    })
}

/// Case-insensitive substring match on title or content.
pub fn matches_search(post: &Post, query: &str) -> bool {
    let query = query.to_lowercase();
    post.title.to_lowercase().contains(&query) || post.content.to_lowercase().contains(&query)
}

/// The carousel picks from the front of the visible list.
pub fn featured(posts: &[Post]) -> &[Post] {
    &posts[..posts.len().min(FEATURED_COUNT)]
}

/// Non-hidden posts by one author, newest first.
pub fn list_by_author(conn: &Connection, author_id: &str) -> Result<Vec<Post>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE p.author_id = ?1 AND p.is_hidden = 0
         ORDER BY p.created_at DESC, p.rowid DESC",
        POST_SELECT
    ))?;

    let posts = stmt
        .query_map(params![author_id], map_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Replace title, content and image URL. Returns false if the post is gone.
pub fn update_post(
    conn: &Connection,
    id: &str,
    draft: &PostDraft,
    image_url: Option<&str>,
) -> Result<bool, rusqlite::Error> {
    let updated = conn.execute(
        "UPDATE posts SET title = ?1, content = ?2, image_url = ?3, updated_at = datetime('now')
         WHERE id = ?4",
        params![draft.title, draft.content, image_url, id],
    )?;
    Ok(updated > 0)
}

/// Flip the hidden flag, returning the new value.
pub fn toggle_hidden(conn: &Connection, id: &str) -> Result<Option<bool>, rusqlite::Error> {
    conn.query_row(
        "UPDATE posts SET is_hidden = NOT is_hidden, updated_at = datetime('now')
         WHERE id = ?1 RETURNING is_hidden",
        params![id],
        |row| row.get(0),
    )
    .optional()
}

pub fn delete_post(conn: &Connection, id: &str) -> Result<bool, rusqlite::Error> {
    let deleted = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::profiles;
    use crate::db;

    fn setup() -> Connection {
        let conn = db::open_in_memory().unwrap();
        profiles::upsert_profile(&conn, "u1", "Ada").unwrap();
        profiles::upsert_profile(&conn, "u2", "Grace").unwrap();
        conn
    }

    fn draft(title: &str) -> PostDraft {
        PostDraft::new(title, "Some content").unwrap()
    }

    #[test]
    fn draft_requires_title_and_content() {
        assert_eq!(
            PostDraft::new("   ", "body"),
            Err(ValidationError::MissingPostFields)
        );
        assert_eq!(
            PostDraft::new("title", "\n"),
            Err(ValidationError::MissingPostFields)
        );
        let ok = PostDraft::new("  Hello ", " world ").unwrap();
        assert_eq!(ok.title, "Hello");
        assert_eq!(ok.content, "world");
    }

    #[test]
    fn insert_and_fetch_with_author_name() {
        let conn = setup();
        let id = insert_post(&conn, "u1", &draft("First"), Some("https://cdn/x.png")).unwrap();

        let post = get_post(&conn, &id).unwrap().unwrap();
        assert_eq!(post.title, "First");
        assert_eq!(post.author_name.as_deref(), Some("Ada"));
        assert_eq!(post.image_url.as_deref(), Some("https://cdn/x.png"));
        assert!(!post.is_hidden);
    }

    #[test]
    fn list_is_newest_first() {
        let conn = setup();
        let a = insert_post(&conn, "u1", &draft("A"), None).unwrap();
        let b = insert_post(&conn, "u1", &draft("B"), None).unwrap();

        let ids: Vec<String> = list_posts(&conn, &Viewer::anonymous(), None)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![b, a]);
    }

    #[test]
    fn hidden_posts_visible_to_author_and_admin_only() {
        let conn = setup();
        let id = insert_post(&conn, "u1", &draft("Secret"), None).unwrap();
        assert_eq!(toggle_hidden(&conn, &id).unwrap(), Some(true));

        let count = |viewer: &Viewer| list_posts(&conn, viewer, None).unwrap().len();
        assert_eq!(count(&Viewer::anonymous()), 0);
        assert_eq!(count(&Viewer::user("u2", false)), 0);
        assert_eq!(count(&Viewer::user("u1", false)), 1);
        assert_eq!(count(&Viewer::user("u2", true)), 1);

        assert!(visible_post(&conn, &id, &Viewer::anonymous()).unwrap().is_none());
        assert!(visible_post(&conn, &id, &Viewer::user("u1", false)).unwrap().is_some());

        assert_eq!(toggle_hidden(&conn, &id).unwrap(), Some(false));
        assert_eq!(count(&Viewer::anonymous()), 1);
    }

    #[test]
    fn toggle_hidden_on_missing_post_is_none() {
        let conn = setup();
        assert_eq!(toggle_hidden(&conn, "nope").unwrap(), None);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_content() {
        let conn = setup();
        insert_post(&conn, "u1", &PostDraft::new("Rust Tips", "borrowing").unwrap(), None).unwrap();
        insert_post(&conn, "u1", &PostDraft::new("Gardening", "Tomatoes & RUST mites").unwrap(), None)
            .unwrap();
        insert_post(&conn, "u1", &draft("Cooking"), None).unwrap();

        let found = list_posts(&conn, &Viewer::anonymous(), Some("rust")).unwrap();
        assert_eq!(found.len(), 2);
        let all = list_posts(&conn, &Viewer::anonymous(), Some("   ")).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn featured_takes_first_five() {
        let conn = setup();
        for i in 0..7 {
            insert_post(&conn, "u1", &draft(&format!("Post {}", i)), None).unwrap();
        }
        let posts = list_posts(&conn, &Viewer::anonymous(), None).unwrap();
        assert_eq!(featured(&posts).len(), 5);
        assert_eq!(featured(&posts[..2]).len(), 2);
    }

    #[test]
    fn author_listing_skips_hidden_and_others() {
        let conn = setup();
        insert_post(&conn, "u1", &draft("Mine"), None).unwrap();
        let hidden = insert_post(&conn, "u1", &draft("Hidden"), None).unwrap();
        toggle_hidden(&conn, &hidden).unwrap();
        insert_post(&conn, "u2", &draft("Theirs"), None).unwrap();

        let titles: Vec<String> = list_by_author(&conn, "u1")
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Mine".to_string()]);
    }

    #[test]
    fn update_and_delete() {
        let conn = setup();
        let id = insert_post(&conn, "u1", &draft("Old"), Some("https://cdn/old.png")).unwrap();

        assert!(update_post(&conn, &id, &draft("New"), None).unwrap());
        let post = get_post(&conn, &id).unwrap().unwrap();
        assert_eq!(post.title, "New");
        assert!(post.image_url.is_none());

        assert!(delete_post(&conn, &id).unwrap());
        assert!(!delete_post(&conn, &id).unwrap());
        assert!(get_post(&conn, &id).unwrap().is_none());
    }

    #[test]
    fn deleting_author_keeps_post_anonymous() {
        let conn = setup();
        let id = insert_post(&conn, "u1", &draft("Orphan"), None).unwrap();
        conn.execute("DELETE FROM profiles WHERE user_id = 'u1'", [])
            .unwrap();

        let post = get_post(&conn, &id).unwrap().unwrap();
        assert!(post.author_id.is_none());
        assert_eq!(post.author_display_name(), "Anonymous");
    }
}
