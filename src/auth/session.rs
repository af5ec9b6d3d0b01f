use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

/// The user a live session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub full_name: String,
    pub is_admin: bool,
}

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: &str, hours: u64) -> Result<String, rusqlite::Error> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Resolve an unexpired session token to its user.
pub fn lookup_session(conn: &Connection, token: &str) -> Result<Option<SessionUser>, rusqlite::Error> {
    conn.query_row(
        "SELECT p.user_id, p.full_name,
                EXISTS(SELECT 1 FROM user_roles r WHERE r.user_id = p.user_id AND r.role = 'admin')
         FROM sessions s
         JOIN profiles p ON p.user_id = s.user_id
         WHERE s.token = ?1 AND s.expires_at > datetime('now')",
        params![token],
        |row| {
            Ok(SessionUser {
                id: row.get(0)?,
                full_name: row.get(1)?,
                is_admin: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> Result<(), rusqlite::Error> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Drop every expired session. Returns how many were removed.
pub fn purge_expired(conn: &Connection) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::profiles;
    use crate::db;

    fn conn_with_user() -> Connection {
        let conn = db::open_in_memory().unwrap();
        profiles::upsert_profile(&conn, "user_1", "Ada").unwrap();
        conn
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn session_round_trip_resolves_user() {
        let conn = conn_with_user();
        let token = create_session(&conn, "user_1", 1).unwrap();

        let user = lookup_session(&conn, &token).unwrap().unwrap();
        assert_eq!(user.id, "user_1");
        assert_eq!(user.full_name, "Ada");
        assert!(!user.is_admin);
    }

    #[test]
    fn session_reports_admin_role() {
        let conn = conn_with_user();
        profiles::grant_role(&conn, "user_1", profiles::ADMIN_ROLE).unwrap();
        let token = create_session(&conn, "user_1", 1).unwrap();

        assert!(lookup_session(&conn, &token).unwrap().unwrap().is_admin);
    }

    #[test]
    fn deleted_session_no_longer_resolves() {
        let conn = conn_with_user();
        let token = create_session(&conn, "user_1", 1).unwrap();
        delete_session(&conn, &token).unwrap();
        assert!(lookup_session(&conn, &token).unwrap().is_none());
    }

    #[test]
    fn expired_sessions_are_ignored_and_purged() {
        let conn = conn_with_user();
        conn.execute(
            "INSERT INTO sessions (id, user_id, token, expires_at)
             VALUES ('s1', 'user_1', 'stale', datetime('now', '-1 hours'))",
            [],
        )
        .unwrap();

        assert!(lookup_session(&conn, "stale").unwrap().is_none());
        assert_eq!(purge_expired(&conn).unwrap(), 1);
    }
}
