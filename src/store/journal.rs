use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::model::item::TimelineItem;

/// Maximum size of the journal before inline trimming (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Self-documenting header written at the top of a new journal.
const FILE_HEADER: &str = "\
<!-- drift journal — append-only record of writes that went wrong
     This file captures data drift could not save or remove cleanly.
     If something went missing, check here.
     View with: dr journal
     Prune old entries: dr journal prune
     Safe to delete if empty or stale. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Category of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalCategory {
    /// A board.json write failed; the entry carries the unsaved document
    Write,
    /// An item was deleted; the entry carries its JSON for recovery
    Delete,
    /// Some occurrences of a recurring placement could not be created
    Batch,
    /// An external change replaced in-memory state that was not yet saved
    Conflict,
}

impl fmt::Display for JournalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalCategory::Write => write!(f, "write"),
            JournalCategory::Delete => write!(f, "delete"),
            JournalCategory::Batch => write!(f, "batch"),
            JournalCategory::Conflict => write!(f, "conflict"),
        }
    }
}

impl JournalCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "write" => Some(JournalCategory::Write),
            "delete" => Some(JournalCategory::Delete),
            "batch" => Some(JournalCategory::Batch),
            "conflict" => Some(JournalCategory::Conflict),
            _ => None,
        }
    }
}

/// A single entry in the journal.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub category: JournalCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

/// Summary info about the journal.
#[derive(Debug, Clone)]
pub struct JournalSummary {
    pub entry_count: usize,
    pub oldest: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Path helper
// ---------------------------------------------------------------------------

/// Return the path to the journal file.
pub fn journal_path(drift_dir: &Path) -> PathBuf {
    drift_dir.join(".journal.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry formatting
// ---------------------------------------------------------------------------

impl JournalEntry {
    /// Format this entry as a markdown block for the journal.
    fn to_markdown(&self) -> String {
        let mut out = String::new();

        // Header line
        out.push_str(&format!(
            "## {} — {}: {}\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        ));
        out.push('\n');

        // Key: value fields
        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        // Body as fenced code block
        if !self.body.is_empty() {
            out.push('\n');
            out.push_str("```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }

        out.push('\n');
        out.push_str("---\n");
        out
    }

    /// Serialize to JSON value for `dr journal --json`.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }

    /// Format as human-readable raw markdown for display.
    pub fn to_display_markdown(&self) -> String {
        self.to_markdown()
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append a journal entry. Errors are swallowed and printed to stderr; a
/// journal failure must never take down the write that triggered it.
pub fn log_journal(drift_dir: &Path, entry: JournalEntry) {
    if let Err(e) = log_journal_inner(drift_dir, entry) {
        eprintln!("warning: could not write to journal: {}", e);
    }
}

fn log_journal_inner(drift_dir: &Path, entry: JournalEntry) -> io::Result<()> {
    let path = journal_path(drift_dir);

    // Check size and try inline trim (non-blocking)
    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > MAX_LOG_SIZE
    {
        try_inline_trim(&path);
    }

    let needs_header = !path.exists() || std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }

    let markdown = entry.to_markdown();
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Try to trim old entries when the journal exceeds MAX_LOG_SIZE.
/// Uses a non-blocking try-lock on the file itself.
fn try_inline_trim(path: &Path) {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    if !try_flock_nb(&file) {
        return; // Couldn't get lock, skip trim
    }

    let mut content = String::new();
    let mut reader = io::BufReader::new(&file);
    if reader.read_to_string(&mut content).is_err() {
        return;
    }

    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = prune_entries_before(&content, &cutoff);

    if trimmed.len() < content.len() {
        if let Ok(mut f) = File::create(path) {
            let _ = f.write_all(trimmed.as_bytes());
        }
    }

    // Lock released on drop
}

#[cfg(unix)]
fn try_flock_nb(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    ret == 0
}

#[cfg(not(unix))]
fn try_flock_nb(_file: &File) -> bool {
    true
}

/// Journal a deleted item with its full JSON so it can be reconstructed.
pub fn log_item_deletion(drift_dir: &Path, item: &TimelineItem) {
    let body = serde_json::to_string_pretty(item).unwrap_or_default();
    log_journal(
        drift_dir,
        JournalEntry {
            timestamp: Utc::now(),
            category: JournalCategory::Delete,
            description: format!("item {} deleted", item.id),
            fields: vec![
                ("Item".to_string(), item.id.clone()),
                ("Title".to_string(), item.title.clone()),
                ("Layer".to_string(), item.layer_id.clone()),
            ],
            body,
        },
    );
}

/// Journal the occurrences a recurring placement could not create.
pub fn log_batch_failure(
    drift_dir: &Path,
    series_id: &str,
    title: &str,
    failed_indices: &[u32],
    last_error: &str,
) {
    let indices = failed_indices
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    log_journal(
        drift_dir,
        JournalEntry {
            timestamp: Utc::now(),
            category: JournalCategory::Batch,
            description: format!("{} occurrences skipped", failed_indices.len()),
            fields: vec![
                ("Series".to_string(), series_id.to_string()),
                ("Task".to_string(), title.to_string()),
                ("Indices".to_string(), indices),
                ("Error".to_string(), last_error.to_string()),
            ],
            body: String::new(),
        },
    );
}

/// Journal a failed board write, carrying the document that did not land.
pub fn log_write_failure(drift_dir: &Path, error: &str, unsaved: &str) {
    log_journal(
        drift_dir,
        JournalEntry {
            timestamp: Utc::now(),
            category: JournalCategory::Write,
            description: "board write failed".to_string(),
            fields: vec![("Error".to_string(), error.to_string())],
            body: unsaved.to_string(),
        },
    );
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read journal entries, most recent first.
pub fn read_journal_entries(
    drift_dir: &Path,
    limit: Option<usize>,
    since: Option<DateTime<Utc>>,
) -> Vec<JournalEntry> {
    let path = journal_path(drift_dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries = parse_entries(&content);

    if let Some(since_dt) = since {
        entries.retain(|e| e.timestamp >= since_dt);
    }

    // Entries are parsed oldest-first; keep the most recent `limit`
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries = entries.into_iter().skip(skip).collect();
    }

    entries.reverse();
    entries
}

/// Get a summary of the journal.
pub fn journal_summary(drift_dir: &Path) -> Option<JournalSummary> {
    let path = journal_path(drift_dir);
    let content = std::fs::read_to_string(&path).ok()?;
    let entries = parse_entries(&content);
    if entries.is_empty() {
        return None;
    }
    let oldest = entries.first().map(|e| e.timestamp);
    Some(JournalSummary {
        entry_count: entries.len(),
        oldest,
    })
}

/// Parse all entries from the journal content string.
fn parse_entries(content: &str) -> Vec<JournalEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        // Entry headers look like: ## <timestamp> — <category>: <description>
        let Some(header) = line.strip_prefix("## ") else {
            continue;
        };
        let Some((timestamp, category, description)) = parse_entry_header(header) else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body = String::new();
        let mut in_code_block = false;

        for line in lines.by_ref() {
            if line == "---" && !in_code_block {
                break;
            }
            if line.starts_with("## ") && !in_code_block {
                // Next entry reached without a separator; stop here
                break;
            }

            if in_code_block {
                if line.trim_end() == "```" {
                    in_code_block = false;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }

            if line.starts_with("```") {
                in_code_block = true;
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(colon) = trimmed.find(": ") {
                fields.push((trimmed[..colon].to_string(), trimmed[colon + 2..].to_string()));
            }
        }

        entries.push(JournalEntry {
            timestamp,
            category,
            description,
            fields,
            body,
        });
    }

    entries
}

/// Parse an entry header: `<timestamp> — <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, JournalCategory, String)> {
    let dash_pos = header.find(" — ")?;
    let timestamp_str = &header[..dash_pos];
    let rest = &header[dash_pos + " — ".len()..];

    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);

    let colon_pos = rest.find(": ")?;
    let category = JournalCategory::parse_category(&rest[..colon_pos])?;
    let description = rest[colon_pos + 2..].to_string();

    Some((timestamp, category, description))
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Prune entries from the journal. Returns the number of entries removed.
pub fn prune_journal(
    drift_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = journal_path(drift_dir);
    if !path.exists() {
        return Ok(0);
    }

    let file = OpenOptions::new().read(true).write(true).open(&path)?;

    // ~1s lock timeout: non-blocking attempts with sleep-retry
    let mut locked = false;
    for _ in 0..10 {
        if try_flock_nb(&file) {
            locked = true;
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    if !locked {
        return Err(io::Error::new(
            io::ErrorKind::WouldBlock,
            "journal is in use, try again later",
        ));
    }

    let content = std::fs::read_to_string(&path)?;

    if all {
        let count = parse_entries(&content).len();
        std::fs::write(&path, FILE_HEADER)?;
        return Ok(count);
    }

    let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
    let original_count = parse_entries(&content).len();

    let trimmed = prune_entries_before(&content, &cutoff);
    let new_count = parse_entries(&trimmed).len();

    std::fs::write(&path, &trimmed)?;
    Ok(original_count - new_count)

    // Lock released on drop
}

/// Remove entries with timestamps before `cutoff` from the raw content.
/// Preserves the file header.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> String {
    let mut result = String::new();
    let mut current_entry = String::new();
    let mut current_timestamp: Option<DateTime<Utc>> = None;
    let mut in_header = true;

    for line in content.lines() {
        // End of file header is the first --- after the comment block
        if in_header {
            result.push_str(line);
            result.push('\n');
            if line == "---" {
                in_header = false;
            }
            continue;
        }

        if let Some(stripped) = line.strip_prefix("## ") {
            // Flush previous entry if it passes the cutoff
            if let Some(ts) = current_timestamp
                && ts >= *cutoff
            {
                result.push_str(&current_entry);
            }
            current_entry.clear();
            current_timestamp = parse_entry_header(stripped).map(|(ts, _, _)| ts);
            current_entry.push_str(line);
            current_entry.push('\n');
        } else {
            current_entry.push_str(line);
            current_entry.push('\n');
        }
    }

    if let Some(ts) = current_timestamp
        && ts >= *cutoff
    {
        result.push_str(&current_entry);
    }

    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::NewItem;
    use chrono::{Datelike, TimeZone};
    use tempfile::TempDir;

    fn drift_dir(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("drift");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_entry(category: JournalCategory, desc: &str, body: &str) -> JournalEntry {
        JournalEntry {
            timestamp: Utc::now(),
            category,
            description: desc.to_string(),
            fields: vec![
                ("Item".to_string(), "i-004".to_string()),
                ("Layer".to_string(), "l-001".to_string()),
            ],
            body: body.to_string(),
        }
    }

    #[test]
    fn entry_formatting() {
        let entry = make_entry(JournalCategory::Batch, "2 occurrences skipped", "payload");
        let md = entry.to_markdown();
        assert!(md.contains("## "));
        assert!(md.contains("batch: 2 occurrences skipped"));
        assert!(md.contains("Item: i-004"));
        assert!(md.contains("```text"));
        assert!(md.ends_with("---\n"));
    }

    #[test]
    fn log_and_read_most_recent_first() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        log_journal(&dir, make_entry(JournalCategory::Write, "first", "a"));
        log_journal(&dir, make_entry(JournalCategory::Delete, "second", "b"));

        let entries = read_journal_entries(&dir, None, None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "second");
        assert_eq!(entries[1].description, "first");
    }

    #[test]
    fn read_with_limit_keeps_newest() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        for i in 0..5 {
            log_journal(
                &dir,
                make_entry(JournalCategory::Write, &format!("entry{}", i), ""),
            );
        }

        let entries = read_journal_entries(&dir, Some(2), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "entry4");
        assert_eq!(entries[1].description, "entry3");
    }

    #[test]
    fn header_written_once() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        log_journal(&dir, make_entry(JournalCategory::Write, "one", ""));
        log_journal(&dir, make_entry(JournalCategory::Write, "two", ""));

        let content = std::fs::read_to_string(journal_path(&dir)).unwrap();
        assert!(content.starts_with("<!-- drift journal"));
        assert_eq!(content.matches("drift journal").count(), 1);
    }

    #[test]
    fn deleted_item_round_trips_through_the_body() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let item = NewItem::block("Write report", "l-001", start, 60).into_item("i-009".into());
        log_item_deletion(&dir, &item);

        let entries = read_journal_entries(&dir, None, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, JournalCategory::Delete);
        let recovered: TimelineItem = serde_json::from_str(&entries[0].body).unwrap();
        assert_eq!(recovered, item);
    }

    #[test]
    fn batch_failure_records_the_indices() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        log_batch_failure(&dir, "s-001", "Daily standup", &[2, 5], "disk full");

        let entries = read_journal_entries(&dir, None, None);
        assert_eq!(entries.len(), 1);
        let indices = entries[0]
            .fields
            .iter()
            .find(|(k, _)| k == "Indices")
            .map(|(_, v)| v.as_str());
        assert_eq!(indices, Some("2, 5"));
        assert_eq!(entries[0].description, "2 occurrences skipped");
    }

    #[test]
    fn prune_all_leaves_only_the_header() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        log_journal(&dir, make_entry(JournalCategory::Write, "gone", ""));
        let count = prune_journal(&dir, None, true).unwrap();
        assert_eq!(count, 1);

        assert!(read_journal_entries(&dir, None, None).is_empty());
        let content = std::fs::read_to_string(journal_path(&dir)).unwrap();
        assert!(content.contains("drift journal"));
    }

    #[test]
    fn prune_before_cutoff_keeps_recent_entries() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        let mut old = make_entry(JournalCategory::Write, "old entry", "x");
        old.timestamp = Utc::now() - chrono::Duration::days(60);
        log_journal(&dir, old);
        log_journal(&dir, make_entry(JournalCategory::Write, "new entry", "y"));

        let cutoff = Utc::now() - chrono::Duration::days(30);
        let removed = prune_journal(&dir, Some(cutoff), false).unwrap();
        assert_eq!(removed, 1);

        let entries = read_journal_entries(&dir, None, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "new entry");

        // Header survives the rewrite
        let content = std::fs::read_to_string(journal_path(&dir)).unwrap();
        assert!(content.starts_with("<!-- drift journal"));
    }

    #[test]
    fn prune_without_log_file_is_zero() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);
        assert_eq!(prune_journal(&dir, None, true).unwrap(), 0);
    }

    #[test]
    fn summary_counts_and_oldest() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);
        assert!(journal_summary(&dir).is_none());

        log_journal(&dir, make_entry(JournalCategory::Conflict, "clash", ""));
        let summary = journal_summary(&dir).unwrap();
        assert_eq!(summary.entry_count, 1);
        assert!(summary.oldest.is_some());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("board.json");

        atomic_write(&path, b"{\"a\":1}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
        atomic_write(&path, b"{\"a\":2}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":2}");
    }

    #[test]
    fn parse_header_accepts_known_categories_only() {
        let parsed = parse_entry_header("2026-02-10T14:32:05Z — batch: 3 occurrences skipped");
        let (ts, cat, desc) = parsed.unwrap();
        assert_eq!(cat, JournalCategory::Batch);
        assert_eq!(desc, "3 occurrences skipped");
        assert_eq!(ts.year(), 2026);

        assert!(parse_entry_header("not a valid header").is_none());
        assert!(parse_entry_header("2026-02-10T14:32:05Z — parser: nope").is_none());
    }

    #[test]
    fn since_filter_drops_older_entries() {
        let tmp = TempDir::new().unwrap();
        let dir = drift_dir(&tmp);

        let mut old = make_entry(JournalCategory::Write, "older", "");
        old.timestamp = Utc::now() - chrono::Duration::days(10);
        log_journal(&dir, old);
        log_journal(&dir, make_entry(JournalCategory::Write, "newer", ""));

        let since = Utc::now() - chrono::Duration::days(5);
        let entries = read_journal_entries(&dir, None, Some(since));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "newer");
    }

    #[test]
    fn entry_to_json_shape() {
        let entry = make_entry(JournalCategory::Delete, "item i-004 deleted", "{}");
        let json = entry.to_json();
        assert_eq!(json["category"], "delete");
        assert_eq!(json["description"], "item i-004 deleted");
        assert!(json["fields"]["Item"].as_str().is_some());
    }
}
