use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Author, Profile};

pub const ADMIN_ROLE: &str = "admin";

/// Create or rename a profile. Called on every sign-in.
pub fn upsert_profile(conn: &Connection, user_id: &str, full_name: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO profiles (user_id, full_name) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET full_name = excluded.full_name",
        params![user_id, full_name],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, user_id: &str) -> Result<Option<Profile>, rusqlite::Error> {
    conn.query_row(
        "SELECT user_id, full_name, created_at FROM profiles WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(Profile {
                user_id: row.get(0)?,
                full_name: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn is_admin(conn: &Connection, user_id: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = ?1 AND role = ?2)",
        params![user_id, ADMIN_ROLE],
        |row| row.get(0),
    )
}

/// Grant a role. Returns false when the user already had it.
pub fn grant_role(conn: &Connection, user_id: &str, role: &str) -> Result<bool, rusqlite::Error> {
    let id = uuid::Uuid::now_v7().to_string();
    let inserted = conn.execute(
        "INSERT INTO user_roles (id, user_id, role) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, role) DO NOTHING",
        params![id, user_id, role],
    )?;
    Ok(inserted > 0)
}

/// Revoke a role. Returns false when the user did not have it.
pub fn revoke_role(conn: &Connection, user_id: &str, role: &str) -> Result<bool, rusqlite::Error> {
    let removed = conn.execute(
        "DELETE FROM user_roles WHERE user_id = ?1 AND role = ?2",
        params![user_id, role],
    )?;
    Ok(removed > 0)
}

/// Profiles with at least one visible post, most prolific first.
pub fn list_authors(conn: &Connection) -> Result<Vec<Author>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT pr.user_id, pr.full_name, COUNT(p.id) AS post_count
         FROM profiles pr
         JOIN posts p ON p.author_id = pr.user_id AND p.is_hidden = 0
         GROUP BY pr.user_id, pr.full_name
         ORDER BY post_count DESC, pr.full_name ASC",
    )?;

    let authors = stmt
        .query_map([], |row| {
            Ok(Author {
                user_id: row.get(0)?,
                full_name: row.get(1)?,
                post_count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(authors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn insert_post(conn: &Connection, id: &str, author: &str, hidden: bool) {
        conn.execute(
            "INSERT INTO posts (id, title, content, author_id, is_hidden) VALUES (?1, 't', 'c', ?2, ?3)",
            params![id, author, hidden],
        )
        .unwrap();
    }

    #[test]
    fn upsert_creates_then_renames() {
        let conn = db::open_in_memory().unwrap();
        upsert_profile(&conn, "u1", "Ada").unwrap();
        upsert_profile(&conn, "u1", "Ada Lovelace").unwrap();

        let profile = get_profile(&conn, "u1").unwrap().unwrap();
        assert_eq!(profile.full_name, "Ada Lovelace");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn missing_profile_is_none() {
        let conn = db::open_in_memory().unwrap();
        assert!(get_profile(&conn, "ghost").unwrap().is_none());
    }

    #[test]
    fn admin_role_grant_and_revoke() {
        let conn = db::open_in_memory().unwrap();
        upsert_profile(&conn, "u1", "Ada").unwrap();
        assert!(!is_admin(&conn, "u1").unwrap());

        assert!(grant_role(&conn, "u1", ADMIN_ROLE).unwrap());
        assert!(!grant_role(&conn, "u1", ADMIN_ROLE).unwrap());
        assert!(is_admin(&conn, "u1").unwrap());

        assert!(revoke_role(&conn, "u1", ADMIN_ROLE).unwrap());
        assert!(!is_admin(&conn, "u1").unwrap());
    }

    #[test]
    fn non_admin_roles_do_not_grant_admin() {
        let conn = db::open_in_memory().unwrap();
        upsert_profile(&conn, "u1", "Ada").unwrap();
        grant_role(&conn, "u1", "editor").unwrap();
        assert!(!is_admin(&conn, "u1").unwrap());
    }

    #[test]
    fn authors_ranked_by_visible_posts() {
        let conn = db::open_in_memory().unwrap();
        upsert_profile(&conn, "u1", "Ada").unwrap();
        upsert_profile(&conn, "u2", "Grace").unwrap();
        upsert_profile(&conn, "u3", "Lurker").unwrap();
        insert_post(&conn, "p1", "u1", false);
        insert_post(&conn, "p2", "u2", false);
        insert_post(&conn, "p3", "u2", false);
        insert_post(&conn, "p4", "u1", true);

        let authors = list_authors(&conn).unwrap();
        let summary: Vec<(&str, i64)> = authors
            .iter()
            .map(|a| (a.full_name.as_str(), a.post_count))
            .collect();
        assert_eq!(summary, vec![("Grace", 2), ("Ada", 1)]);
    }
}
