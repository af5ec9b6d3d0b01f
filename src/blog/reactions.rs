//! Emoji reactions on posts.
//!
//! Each (post, visitor) pair holds at most one reaction. Picking a kind moves
//! the pair through a small state machine:
//!
//! - none -> K: insert
//! - K -> J (J != K): update the kind
//! - K -> K: delete (toggle off)

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionKind {
    /// Display order for pickers and summaries.
    pub const ALL: [ReactionKind; 6] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Haha,
        ReactionKind::Wow,
        ReactionKind::Sad,
        ReactionKind::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Haha => "haha",
            ReactionKind::Wow => "wow",
            ReactionKind::Sad => "sad",
            ReactionKind::Angry => "angry",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ReactionKind::Like => "👍",
            ReactionKind::Love => "❤️",
            ReactionKind::Haha => "😂",
            ReactionKind::Wow => "😮",
            ReactionKind::Sad => "😢",
            ReactionKind::Angry => "😠",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionKind::Like => "Like",
            ReactionKind::Love => "Love",
            ReactionKind::Haha => "Haha",
            ReactionKind::Wow => "Wow",
            ReactionKind::Sad => "Sad",
            ReactionKind::Angry => "Angry",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown reaction kind: {0}")]
pub struct UnknownReaction(pub String);

impl FromStr for ReactionKind {
    type Err = UnknownReaction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ReactionKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownReaction(trimmed.to_string()))
    }
}

impl FromSql for ReactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTransition {
    Added(ReactionKind),
    Changed {
        from: ReactionKind,
        to: ReactionKind,
    },
    Removed(ReactionKind),
}

impl ReactionTransition {
    pub fn plan(current: Option<ReactionKind>, selected: ReactionKind) -> Self {
        match current {
            None => ReactionTransition::Added(selected),
            Some(existing) if existing == selected => ReactionTransition::Removed(existing),
            Some(existing) => ReactionTransition::Changed {
                from: existing,
                to: selected,
            },
        }
    }

    /// The visitor's reaction after this transition.
    pub fn resulting(&self) -> Option<ReactionKind> {
        match self {
            ReactionTransition::Added(kind) => Some(*kind),
            ReactionTransition::Changed { to, .. } => Some(*to),
            ReactionTransition::Removed(_) => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ReactionTransition::Added(_) => "Reaction added",
            ReactionTransition::Changed { .. } => "Reaction updated",
            ReactionTransition::Removed(_) => "Reaction removed",
        }
    }
}

pub fn current_reaction(
    conn: &Connection,
    post_id: &str,
    visitor_id: &str,
) -> Result<Option<ReactionKind>, rusqlite::Error> {
    conn.query_row(
        "SELECT reaction_type FROM post_reactions WHERE post_id = ?1 AND visitor_id = ?2",
        params![post_id, visitor_id],
        |row| row.get(0),
    )
    .optional()
}

/// Apply `selected` for the visitor and report which transition happened.
pub fn toggle_reaction(
    conn: &mut Connection,
    post_id: &str,
    visitor_id: &str,
    selected: ReactionKind,
) -> Result<ReactionTransition, rusqlite::Error> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let transition = ReactionTransition::plan(current_reaction(&tx, post_id, visitor_id)?, selected);

    match transition.resulting() {
        Some(kind) => {
            // Upsert so a racing insert for the same pair resolves to last writer wins.
            tx.execute(
                "INSERT INTO post_reactions (id, post_id, visitor_id, reaction_type)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(post_id, visitor_id) DO UPDATE SET reaction_type = excluded.reaction_type",
                params![
                    uuid::Uuid::now_v7().to_string(),
                    post_id,
                    visitor_id,
                    kind.as_str()
                ],
            )?;
        }
        None => {
            tx.execute(
                "DELETE FROM post_reactions WHERE post_id = ?1 AND visitor_id = ?2",
                params![post_id, visitor_id],
            )?;
        }
    }

    tx.commit()?;
    Ok(transition)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactionCount {
    pub kind: ReactionKind,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReactionSummary {
    /// Non-zero counts only, in `ReactionKind::ALL` order
    pub counts: Vec<ReactionCount>,
    pub total: i64,
    pub mine: Option<ReactionKind>,
}

impl ReactionSummary {
    /// The first few kinds, for the compact emoji stack.
    pub fn preview(&self) -> Vec<ReactionKind> {
        self.counts.iter().take(3).map(|c| c.kind).collect()
    }
}

pub fn summarize(
    conn: &Connection,
    post_id: &str,
    visitor_id: Option<&str>,
) -> Result<ReactionSummary, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT reaction_type, COUNT(*) FROM post_reactions WHERE post_id = ?1 GROUP BY reaction_type",
    )?;
    let rows = stmt
        .query_map(params![post_id], |row| {
            Ok((row.get::<_, ReactionKind>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let counts: Vec<ReactionCount> = ReactionKind::ALL
        .into_iter()
        .filter_map(|kind| {
            rows.iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, count)| ReactionCount {
                    kind,
                    count: *count,
                })
        })
        .filter(|c| c.count > 0)
        .collect();

    let total = counts.iter().map(|c| c.count).sum();

    let mine = match visitor_id {
        Some(visitor) => current_reaction(conn, post_id, visitor)?,
        None => None,
    };

    Ok(ReactionSummary {
        counts,
        total,
        mine,
    })
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

    fn active_reactions(conn: &Connection, visitor: &str) -> Vec<ReactionKind> {
        let mut stmt = conn
            .prepare("SELECT reaction_type FROM post_reactions WHERE post_id = 'p1' AND visitor_id = ?1")
            .unwrap();
        stmt.query_map(params![visitor], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn parses_known_kinds() {
        assert_eq!("love".parse::<ReactionKind>().unwrap(), ReactionKind::Love);
        assert_eq!(" Angry ".parse::<ReactionKind>().unwrap(), ReactionKind::Angry);
        assert!("heart".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn plan_covers_every_transition() {
        use ReactionKind::*;
        assert_eq!(ReactionTransition::plan(None, Wow), ReactionTransition::Added(Wow));
        assert_eq!(
            ReactionTransition::plan(Some(Wow), Wow),
            ReactionTransition::Removed(Wow)
        );
        assert_eq!(
            ReactionTransition::plan(Some(Wow), Sad),
            ReactionTransition::Changed { from: Wow, to: Sad }
        );
    }

    #[test]
    fn same_kind_twice_toggles_off() {
        let mut conn = conn_with_post();
        let first = toggle_reaction(&mut conn, "p1", "u1", ReactionKind::Like).unwrap();
        let second = toggle_reaction(&mut conn, "p1", "u1", ReactionKind::Like).unwrap();

        assert_eq!(first, ReactionTransition::Added(ReactionKind::Like));
        assert_eq!(second, ReactionTransition::Removed(ReactionKind::Like));
        assert!(active_reactions(&conn, "u1").is_empty());
    }

    #[test]
    fn different_kind_replaces_reaction() {
        let mut conn = conn_with_post();
        toggle_reaction(&mut conn, "p1", "u1", ReactionKind::Like).unwrap();
        let changed = toggle_reaction(&mut conn, "p1", "u1", ReactionKind::Haha).unwrap();

        assert_eq!(
            changed,
            ReactionTransition::Changed {
                from: ReactionKind::Like,
                to: ReactionKind::Haha
            }
        );
        assert_eq!(active_reactions(&conn, "u1"), vec![ReactionKind::Haha]);
    }

    #[test]
    fn summary_counts_in_display_order() {
        let mut conn = conn_with_post();
        toggle_reaction(&mut conn, "p1", "u1", ReactionKind::Sad).unwrap();
        toggle_reaction(&mut conn, "p1", "u2", ReactionKind::Like).unwrap();
        toggle_reaction(&mut conn, "p1", "u3", ReactionKind::Like).unwrap();

        let summary = summarize(&conn, "p1", Some("u1")).unwrap();
        assert_eq!(
            summary.counts,
            vec![
                ReactionCount {
                    kind: ReactionKind::Like,
                    count: 2
                },
                ReactionCount {
                    kind: ReactionKind::Sad,
                    count: 1
                },
            ]
        );
        assert_eq!(summary.total, 3);
        assert_eq!(summary.mine, Some(ReactionKind::Sad));
        assert_eq!(summary.preview(), vec![ReactionKind::Like, ReactionKind::Sad]);
    }

    #[test]
    fn anonymous_summary_has_no_own_reaction() {
        let mut conn = conn_with_post();
        toggle_reaction(&mut conn, "p1", "u1", ReactionKind::Wow).unwrap();
        let summary = summarize(&conn, "p1", None).unwrap();
        assert_eq!(summary.mine, None);
        assert_eq!(summary.total, 1);
    }
}
