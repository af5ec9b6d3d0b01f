//! Deduplicated post views.
//!
//! A view is the existence of a `(post, visitor)` row. The unique index on
//! that pair is what keeps repeat page loads, and concurrent duplicate loads,
//! from counting twice.

use rusqlite::{params, Connection};

use crate::visitor::VisitorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    Recorded,
    AlreadyViewed,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("post does not exist")]
    UnknownPost,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Record that `visitor` has seen `post_id`. A repeat is a no-op.
pub fn record_view(
    conn: &Connection,
    post_id: &str,
    visitor: &VisitorId,
) -> Result<ViewOutcome, ViewError> {
    let id = uuid::Uuid::now_v7().to_string();
    let inserted = conn.execute(
        "INSERT INTO post_views (id, post_id, visitor_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(post_id, visitor_id) DO NOTHING",
        params![id, post_id, visitor.as_str()],
    );

    match inserted {
        Ok(0) => Ok(ViewOutcome::AlreadyViewed),
        Ok(_) => Ok(ViewOutcome::Recorded),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Err(ViewError::UnknownPost)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn count_views(conn: &Connection, post_id: &str) -> Result<i64, rusqlite::Error> {
    conn.query_row(
        "SELECT COUNT(*) FROM post_views WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn conn_with_post() -> Connection {
        let conn = db::open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO posts (id, title, content) VALUES ('p1', 'Title', 'Body')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn repeat_view_counts_once() {
        let conn = conn_with_post();
        let visitor = VisitorId::generate();

        assert_eq!(
            record_view(&conn, "p1", &visitor).unwrap(),
            ViewOutcome::Recorded
        );
        assert_eq!(
            record_view(&conn, "p1", &visitor).unwrap(),
            ViewOutcome::AlreadyViewed
        );
        assert_eq!(count_views(&conn, "p1").unwrap(), 1);
    }

    #[test]
    fn distinct_visitors_count_separately() {
        let conn = conn_with_post();
        record_view(&conn, "p1", &VisitorId::generate()).unwrap();
        record_view(&conn, "p1", &VisitorId::generate()).unwrap();
        assert_eq!(count_views(&conn, "p1").unwrap(), 2);
    }

    #[test]
    fn unknown_post_is_not_swallowed() {
        let conn = conn_with_post();
        let result = record_view(&conn, "missing", &VisitorId::generate());
        assert!(matches!(result, Err(ViewError::UnknownPost)));
        assert_eq!(count_views(&conn, "missing").unwrap(), 0);
    }

    #[test]
    fn count_is_zero_without_views() {
        let conn = conn_with_post();
        assert_eq!(count_views(&conn, "p1").unwrap(), 0);
    }
}
