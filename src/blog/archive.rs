use serde::Serialize;

use crate::blog::text::parse_db_time;
use crate::db::models::Post;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub id: String,
    pub title: String,
    /// e.g. "Mar 4"
    pub day: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveMonth {
    /// e.g. "March 2026"
    pub label: String,
    pub entries: Vec<ArchiveEntry>,
}

/// Group posts under their month, keeping the order months first appear in.
pub fn group_by_month(posts: &[Post]) -> Vec<ArchiveMonth> {
    let mut months: Vec<ArchiveMonth> = Vec::new();

    for post in posts {
        let (label, day) = match parse_db_time(&post.created_at) {
            Some(dt) => (dt.format("%B %Y").to_string(), dt.format("%b %-d").to_string()),
            None => ("Undated".to_string(), String::new()),
        };

        let entry = ArchiveEntry {
            id: post.id.clone(),
            title: post.title.clone(),
            day,
        };

        match months.iter_mut().find(|m| m.label == label) {
            Some(month) => month.entries.push(entry),
            None => months.push(ArchiveMonth {
                label,
                entries: vec![entry],
            }),
        }
    }

    months
}
