//! Session file storage and display helpers.
//!
//! A `Session` is the persisted form of a [`crate::store::TrackingStore`]:
//! enrolled protocols, the current-protocol id and the notification slot.
//! It lives in a single JSON file that is replaced atomically on save.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enrollment::EnrolledProtocol;
use crate::error::{Result, TrackerError};
use crate::fields::format_frequency;
use crate::notification::Notifier;
use crate::task::TaskInstance;

/// Persisted session state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub enrolled_protocols: Vec<EnrolledProtocol>,
    #[serde(default)]
    pub current_protocol_id: Option<String>,
    #[serde(default)]
    pub notification: Notifier,
}

impl Session {
    /// Empty session for `user_id`.
    pub fn for_user(user_id: &str) -> Self {
        Session { user_id: user_id.to_string(), ..Session::default() }
    }

    /// Load a session from JSON. A missing file yields an empty session for
    /// `user_id`; an unreadable or malformed file is an error.
    pub fn load(path: &Path, user_id: &str) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no session file, starting fresh");
            return Ok(Session::for_user(user_id));
        }
        let buf = fs::read_to_string(path).map_err(|e| TrackerError::io(path, e))?;
        let mut session: Session = serde_json::from_str(&buf).map_err(|e| TrackerError::parse(path, e))?;
        if session.user_id.is_empty() {
            session.user_id = user_id.to_string();
        }
        Ok(session)
    }

    /// Save to JSON using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TrackerError::io(parent, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let write = || -> std::io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(data.as_bytes())?;
            f.flush()?;
            fs::rename(&tmp, path)
        };
        write().map_err(|e| TrackerError::io(path, e))?;
        tracing::debug!(path = %path.display(), protocols = self.enrolled_protocols.len(), "session saved");
        Ok(())
    }
}

/// Resolve a task identifier (id or title) within `tasks` to a task id.
/// Titles match case-insensitively; an ambiguous title is an error listing
/// the candidates.
pub fn resolve_task_identifier(identifier: &str, tasks: &[TaskInstance]) -> std::result::Result<String, String> {
    if let Some(t) = tasks.iter().find(|t| t.id == identifier) {
        return Ok(t.id.clone());
    }

    let matches: Vec<&TaskInstance> = tasks
        .iter()
        .filter(|t| t.title.to_lowercase() == identifier.to_lowercase())
        .collect();

    match matches.len() {
        0 => Err(format!("No task found with id or title '{}'", identifier)),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut error_msg = format!("Multiple tasks found with title '{}':\n", identifier);
            for task in matches {
                error_msg.push_str(&format!("  {}: {}\n", task.id, task.title));
            }
            error_msg.push_str("Please use the specific ID instead.");
            Err(error_msg)
        }
    }
}

/// Resolve an enrolled protocol identifier (id or title).
pub fn resolve_protocol_identifier(
    identifier: &str,
    protocols: &[EnrolledProtocol],
) -> std::result::Result<String, String> {
    if let Some(p) = protocols.iter().find(|p| p.id == identifier) {
        return Ok(p.id.clone());
    }

    let matches: Vec<&EnrolledProtocol> = protocols
        .iter()
        .filter(|p| p.title.to_lowercase() == identifier.to_lowercase())
        .collect();

    match matches.len() {
        0 => Err(format!("No enrolled protocol with id or title '{}'", identifier)),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut error_msg = format!("Multiple enrollments found for '{}':\n", identifier);
            for p in matches {
                error_msg.push_str(&format!("  {}: started {}, {}%\n", p.id, p.start_date, p.progress));
            }
            error_msg.push_str("Please use the specific ID instead.");
            Err(error_msg)
        }
    }
}

/// Text progress bar, e.g. `[#####-----]` for 50%.
pub fn progress_bar(progress: u8, width: usize) -> String {
    let filled = (usize::from(progress.min(100)) * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Format a completion date for display.
pub fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())
}

/// Print enrolled protocols as a table, marking the current one.
pub fn print_protocol_table(protocols: &[&EnrolledProtocol], current: Option<&str>) {
    println!(
        "{:<2} {:<8} {:<26} {:<11} {:<5} {}",
        "", "ID", "Protocol", "Started", "Done", "Progress"
    );
    for p in protocols {
        let marker = if current == Some(p.id.as_str()) { "*" } else { "" };
        println!(
            "{:<2} {:<8} {:<26} {:<11} {:<5} {} {:>3}%",
            marker,
            truncate(&p.id, 8),
            truncate(&p.title, 26),
            p.start_date,
            format!("{}/{}", p.completed_count(), p.tasks.len()),
            progress_bar(p.progress, 20),
            p.progress
        );
    }
}

/// Print task instances as a checklist table.
pub fn print_task_table(tasks: &[&TaskInstance]) {
    println!("{:<4} {:<16} {:<10} {:<11} {}", "", "ID", "Freq", "Completed", "Title");
    for t in tasks {
        let check = if t.completed { "[x]" } else { "[ ]" };
        println!(
            "{:<4} {:<16} {:<10} {:<11} {}",
            check,
            truncate(&t.id, 16),
            format_frequency(t.frequency),
            format_date(t.completed_date),
            t.title
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn protocol(id: &str, template: &str) -> EnrolledProtocol {
        let catalog = Catalog::seed();
        let start = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let seq = id.trim_start_matches("up").parse().unwrap();
        EnrolledProtocol::from_template(id.into(), seq, "user1", catalog.get(template).unwrap(), start)
    }

    #[test]
    fn test_missing_file_gives_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let s = Session::load(&dir.path().join("session.json"), "user7").unwrap();
        assert_eq!(s.user_id, "user7");
        assert!(s.enrolled_protocols.is_empty());
        assert!(s.current_protocol_id.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let mut session = Session::for_user("user1");
        session.enrolled_protocols.push(protocol("up1", "1"));
        session.current_protocol_id = Some("up1".into());
        session.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = Session::load(&path, "someone-else").unwrap();
        assert_eq!(loaded.user_id, "user1");
        assert_eq!(loaded.enrolled_protocols, session.enrolled_protocols);
        assert_eq!(loaded.current_protocol_id.as_deref(), Some("up1"));
    }

    #[test]
    fn test_malformed_session_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(Session::load(&path, "user1"), Err(TrackerError::Parse { .. })));
    }

    #[test]
    fn test_resolve_task_identifier() {
        let p = protocol("up1", "1");
        assert_eq!(resolve_task_identifier("ut1-t2", &p.tasks).unwrap(), "ut1-t2");
        assert_eq!(resolve_task_identifier("morning run", &p.tasks).unwrap(), "ut1-t1");
        assert!(resolve_task_identifier("Swimming", &p.tasks).is_err());

        let mut tasks = p.tasks.clone();
        tasks[1].title = "Morning Run".into();
        let err = resolve_task_identifier("Morning Run", &tasks).unwrap_err();
        assert!(err.contains("ut1-t1") && err.contains("ut1-t2"));
    }

    #[test]
    fn test_resolve_protocol_identifier() {
        let protocols = vec![protocol("up1", "1"), protocol("up2", "2"), protocol("up3", "2")];
        assert_eq!(resolve_protocol_identifier("up1", &protocols).unwrap(), "up1");
        assert_eq!(resolve_protocol_identifier("30-day fitness challenge", &protocols).unwrap(), "up1");
        assert!(resolve_protocol_identifier("Morning Routine", &protocols).is_err());
        assert!(resolve_protocol_identifier("up9", &protocols).is_err());
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 10), "[----------]");
        assert_eq!(progress_bar(50, 10), "[#####-----]");
        assert_eq!(progress_bar(100, 10), "[##########]");
        assert_eq!(progress_bar(33, 10), "[###-------]");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 8), "short");
        assert_eq!(truncate("30-Day Fitness Challenge", 8), "30-Day …");
    }
}
