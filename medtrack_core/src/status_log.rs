//! Append-only audit log of status updates.
//!
//! Every applied update is appended to a JSONL (JSON Lines) file with
//! file locking to ensure safe concurrent access.

use crate::status::StatusUpdate;
use crate::{Result, TimeSlot};
use chrono::{DateTime, NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One recorded status update
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEvent {
    pub user_id: String,
    pub medicine_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub is_taken: bool,
    pub recorded_at: DateTime<Utc>,
}

impl StatusEvent {
    pub fn from_update(update: &StatusUpdate, recorded_at: DateTime<Utc>) -> Self {
        Self {
            user_id: update.user_id.clone(),
            medicine_id: update.medicine_id,
            date: update.date,
            time_slot: update.time_slot,
            is_taken: update.is_taken,
            recorded_at,
        }
    }
}

/// Status sink trait for recording updates
pub trait StatusSink {
    fn append(&mut self, event: &StatusEvent) -> Result<()>;
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn append(&mut self, _event: &StatusEvent) -> Result<()> {
        Ok(())
    }
}

/// JSONL-based status sink with file locking
pub struct JsonlStatusSink {
    path: PathBuf,
}

impl JsonlStatusSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl StatusSink for JsonlStatusSink {
    fn append(&mut self, event: &StatusEvent) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(event)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!(
            "Logged {} {} {} for {}",
            event.medicine_id,
            event.date,
            event.time_slot,
            event.user_id
        );
        Ok(())
    }
}

/// Read all events from a status log
pub fn read_events(path: &Path) -> Result<Vec<StatusEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut events = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<StatusEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!("Failed to parse status event at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} status events", events.len());
    Ok(events)
}
