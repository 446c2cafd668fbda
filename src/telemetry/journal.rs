use super::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    urlshort_logs: Vec<JournalEntry>,
}

/// Local append-only log, persisted as a whole-snapshot JSON document.
///
/// Appends never fail the caller: any I/O or parse problem is traced at
/// debug level and dropped, matching how the rest of telemetry behaves.
pub struct Journal {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn append(&self, level: Level, message: &str) {
        let entry = JournalEntry {
            timestamp: Utc::now(),
            level: level.as_str().to_string(),
            message: message.to_string(),
        };

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut document = self.load();
        document.urlshort_logs.push(entry);
        if let Err(err) = self.save(&document) {
            tracing::debug!("journal write failed: {err}");
        }
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.load().urlshort_logs
    }

    fn load(&self) -> Document {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                tracing::debug!("journal unreadable, starting fresh: {err}");
                Document::default()
            }),
            Err(_) => Document::default(),
        }
    }

    fn save(&self, document: &Document) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        std::fs::write(&self.path, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_in_order_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("urlshort_logs.json");

        {
            let journal = Journal::new(&path);
            journal.append(Level::Info, "shortened https://example.com as /abc123");
            journal.append(Level::Warn, "redirection failed: shortcode promo expired");
        }

        let reopened = Journal::new(&path);
        let entries = reopened.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, "info");
        assert_eq!(entries[1].level, "warn");
        assert!(entries[0].message.contains("abc123"));
    }

    #[test]
    fn append_to_unwritable_path_is_swallowed() {
        let journal = Journal::new("/nonexistent-dir/urlshort_logs.json");
        journal.append(Level::Info, "dropped on the floor");
        assert!(journal.entries().is_empty());
    }
}
