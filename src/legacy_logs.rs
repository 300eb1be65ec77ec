//! Adapter for the old plaintext `/logs` body
//!
//! Older backends return the raw log files, one line per record:
//! `2024-05-01 10:00:00 [ERROR] [SYSTEM] message` or `2024-05-01 10:00:00 [TRADE] message`.
//! Lines are mapped onto [`LogEntry`] so the rest of the pipeline sees one contract.

use chrono::NaiveDateTime;

use crate::types::{LogCategory, LogEntry};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_LEN: usize = 19;

const LEVEL_TAGS: [(&str, u32); 5] = [
    ("[CRITICAL]", 50),
    ("[ERROR]", 40),
    ("[WARNING]", 30),
    ("[INFO]", 20),
    ("[DEBUG]", 10),
];

const CATEGORY_TAGS: [(&str, LogCategory); 3] = [
    ("[TRADE]", LogCategory::Trade),
    ("[BALANCE]", LogCategory::Balance),
    ("[SYSTEM]", LogCategory::System),
];

/// Parse a plaintext log body, keeping line order and skipping blank lines
pub fn parse_tagged_lines(body: &str) -> Vec<LogEntry> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> LogEntry {
    let (timestamp, rest) = split_timestamp(line);

    let level = LEVEL_TAGS
        .iter()
        .find(|(tag, _)| rest.contains(tag))
        .map_or(20, |(_, level)| *level);

    let category = CATEGORY_TAGS
        .iter()
        .find(|(tag, _)| rest.contains(tag))
        .map_or(LogCategory::System, |(_, category)| *category);

    let mut message = rest.to_string();
    for tag in LEVEL_TAGS.iter().map(|(t, _)| *t).chain(CATEGORY_TAGS.iter().map(|(t, _)| *t)) {
        message = message.replacen(tag, "", 1);
    }

    LogEntry {
        timestamp,
        category,
        level,
        message: message.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// Split off a leading `YYYY-MM-DD HH:MM:SS` (and optional `,mmm`) if present
fn split_timestamp(line: &str) -> (String, &str) {
    let Some(head) = line.get(..TIMESTAMP_LEN) else {
        return (String::new(), line);
    };
    if NaiveDateTime::parse_from_str(head, TIMESTAMP_FORMAT).is_err() {
        return (String::new(), line);
    }
    let mut rest = &line[TIMESTAMP_LEN..];
    if let Some(millis) = rest.strip_prefix(',') {
        rest = millis.trim_start_matches(|c: char| c.is_ascii_digit());
    }
    (head.to_string(), rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_lines() {
        let body = "\
2024-05-01 10:00:00 [TRADE] Long XRPUSDT 100 @ 0.51
2024-05-01 10:00:01,123 [ERROR] [SYSTEM] websocket closed

2024-05-01 10:00:02 [WARNING] [SYSTEM] reconnecting
2024-05-01 10:00:03 [BALANCE] wallet 1000.00
free text without tags
";
        let entries = parse_tagged_lines(body);
        assert_eq!(entries.len(), 5);

        assert_eq!(entries[0].category, LogCategory::Trade);
        assert_eq!(entries[0].level, 20);
        assert_eq!(entries[0].timestamp, "2024-05-01 10:00:00");
        assert_eq!(entries[0].message, "Long XRPUSDT 100 @ 0.51");

        assert_eq!(entries[1].level, 40);
        assert_eq!(entries[1].category, LogCategory::System);
        assert_eq!(entries[1].message, "websocket closed");

        assert_eq!(entries[2].level, 30);
        assert_eq!(entries[3].category, LogCategory::Balance);

        assert_eq!(entries[4].timestamp, "");
        assert_eq!(entries[4].message, "free text without tags");
    }

    #[test]
    fn test_short_and_multibyte_lines() {
        let entries = parse_tagged_lines("짧은 로그\n[ERROR] boom");
        assert_eq!(entries[0].message, "짧은 로그");
        assert_eq!(entries[1].level, 40);
        assert_eq!(entries[1].message, "boom");
    }
}
