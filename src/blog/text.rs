use chrono::{NaiveDateTime, Utc};

const EXCERPT_CHARS: usize = 200;
const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The first 200 characters of `content`, with "..." when cut.
pub fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Newline-delimited paragraphs, blank lines dropped.
pub fn paragraphs(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Up to two uppercase initials, e.g. "Ada King Lovelace" -> "AK".
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect()
}

pub fn parse_db_time(db_time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(db_time, DB_TIME_FORMAT).ok()
}

pub fn parse_and_format_time(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|| db_time.to_string())
}

/// "5 minutes ago", "about 3 hours ago", "over 1 year ago".
pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let elapsed = Utc::now().naive_utc().signed_duration_since(*dt);
    format!("{} ago", distance_in_words(elapsed.num_seconds().max(0)))
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Coarse, rounded distance for an elapsed number of seconds.
pub fn distance_in_words(seconds: i64) -> String {
    const MINUTES_PER_DAY: i64 = 24 * 60;
    const MINUTES_PER_MONTH: i64 = 30 * MINUTES_PER_DAY;
    const DAYS_PER_YEAR: i64 = 365;

    let round_div = |n: i64, d: i64| (n + d / 2) / d;
    let minutes = round_div(seconds, 60);

    match minutes {
        0 => "less than a minute".to_string(),
        1..=44 => plural(minutes, "minute"),
        45..=89 => "about 1 hour".to_string(),
        90..=1439 => format!("about {}", plural(round_div(minutes, 60), "hour")),
        1440..=2519 => "1 day".to_string(),
        2520..=43199 => plural(round_div(minutes, MINUTES_PER_DAY), "day"),
        43200..=86399 => format!("about {}", plural(round_div(minutes, MINUTES_PER_MONTH), "month")),
        86400..=525599 => plural(round_div(minutes, MINUTES_PER_MONTH), "month"),
        _ => {
            let days = minutes / MINUTES_PER_DAY;
            let years = days / DAYS_PER_YEAR;
            let months_over = (days % DAYS_PER_YEAR) / 30;
            match months_over {
                0..=2 => format!("about {}", plural(years, "year")),
                3..=8 => format!("over {}", plural(years, "year")),
                _ => format!("almost {}", plural(years + 1, "year")),
            }
        }
    }
}
