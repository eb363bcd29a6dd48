use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};

use super::event::Event;

/// Where events live between sessions.
pub trait Storage {
    /// Everything previously saved. Missing or unreadable data is an empty list.
    fn load(&self) -> Vec<Event>;

    /// Replace the stored collection with `events`.
    fn save(&self, events: &[Event]) -> Result<()>;
}

/// Events kept as one JSON array in a file.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the last file that did not load cleanly.
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }

    fn back_up(&self) {
        let backup = self.backup_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => tracing::warn!(backup = %backup.display(), "kept a copy of the event file"),
            Err(e) => {
                tracing::error!(backup = %backup.display(), error = %e, "failed to back up event file")
            }
        }
    }
}

impl Storage for JsonStore {
    fn load(&self) -> Vec<Event> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no event file yet");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read event file");
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            return Vec::new();
        }

        let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unparseable event file");
                self.back_up();
                return Vec::new();
            }
        };

        let total = entries.len();
        let events: Vec<Event> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                serde_json::from_value::<Event>(entry)
                    .inspect_err(|e| tracing::warn!(index, error = %e, "skipping unreadable event"))
                    .ok()
            })
            .collect();

        // The next save drops whatever was skipped.
        if events.len() < total {
            self.back_up();
        }

        tracing::debug!(path = %self.path.display(), count = events.len(), "loaded events");
        events
    }

    fn save(&self, events: &[Event]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(events).wrap_err("failed to serialize events")?;

        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).wrap_err_with(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .wrap_err_with(|| format!("failed to write {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), count = events.len(), "saved events");
        Ok(())
    }
}
