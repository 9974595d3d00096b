//! Schedule persistence.
//!
//! The engine itself never does I/O; it works on a [`Schedule`] snapshot.
//! Repositories here provide the storage side: find-or-create per user,
//! serialized appends, and single-field status writes that re-read the
//! latest document under lock so concurrent writers to different fields
//! never clobber each other.

use crate::status::StatusChange;
use crate::{Error, MedicineEntry, Result, Schedule};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Storage collaborator for per-user schedules
pub trait ScheduleRepository {
    /// Load the user's schedule, if one exists
    fn find(&self, user_id: &str) -> Result<Option<Schedule>>;

    /// Load the user's schedule, creating an empty one if needed
    fn get_or_create(&self, user_id: &str) -> Result<Schedule>;

    /// Append validated entries to the user's schedule, creating it if needed
    fn append_entries(&self, user_id: &str, entries: Vec<MedicineEntry>) -> Result<Schedule>;

    /// Persist one validated status change
    fn set_taken(&self, change: &StatusChange) -> Result<()>;
}

fn not_found(user_id: &str) -> Error {
    Error::NotFound(format!("no schedule for user {}", user_id))
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local repository, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    schedules: Mutex<HashMap<String, Schedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_schedules<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Schedule>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self
            .schedules
            .lock()
            .map_err(|_| Error::Storage("schedule store lock poisoned".into()))?;
        f(&mut guard)
    }
}

impl ScheduleRepository for MemoryScheduleStore {
    fn find(&self, user_id: &str) -> Result<Option<Schedule>> {
        self.with_schedules(|s| Ok(s.get(user_id).cloned()))
    }

    fn get_or_create(&self, user_id: &str) -> Result<Schedule> {
        self.with_schedules(|s| {
            Ok(s.entry(user_id.to_string())
                .or_insert_with(|| Schedule::new(user_id))
                .clone())
        })
    }

    fn append_entries(&self, user_id: &str, entries: Vec<MedicineEntry>) -> Result<Schedule> {
        self.with_schedules(|s| {
            let schedule = s
                .entry(user_id.to_string())
                .or_insert_with(|| Schedule::new(user_id));
            schedule.medicines.extend(entries);
            Ok(schedule.clone())
        })
    }

    fn set_taken(&self, change: &StatusChange) -> Result<()> {
        self.with_schedules(|s| {
            let schedule = s
                .get_mut(&change.user_id)
                .ok_or_else(|| not_found(&change.user_id))?;
            change.apply(schedule)
        })
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// One JSON document per user, guarded by a per-user lock file
///
/// Layout: `<root>/<user_id>.json` and `<root>/<user_id>.lock`.
#[derive(Clone, Debug)]
pub struct JsonScheduleStore {
    root: PathBuf,
}

impl JsonScheduleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `<data_dir>/schedules`
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("schedules"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the user's schedule document
    pub fn document_path(&self, user_id: &str) -> Result<PathBuf> {
        check_user_id(user_id)?;
        Ok(self.root.join(format!("{}.json", user_id)))
    }

    fn lock_file(&self, user_id: &str) -> Result<File> {
        check_user_id(user_id)?;
        std::fs::create_dir_all(&self.root)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.root.join(format!("{}.lock", user_id)))?;
        Ok(file)
    }

    /// Run `f` on the current document while holding the user's exclusive lock
    ///
    /// `f` returns its value plus a dirty flag; the document is saved
    /// only when dirty.
    fn update<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut Option<Schedule>) -> Result<(T, bool)>,
    ) -> Result<T> {
        let path = self.document_path(user_id)?;
        let lock = self.lock_file(user_id)?;
        lock.lock_exclusive()?;

        let result = load_document(&path).and_then(|mut doc| {
            let (value, dirty) = f(&mut doc)?;
            if let (true, Some(schedule)) = (dirty, doc.as_ref()) {
                save_document(&path, schedule)?;
            }
            Ok(value)
        });

        lock.unlock()?;
        result
    }
}

impl ScheduleRepository for JsonScheduleStore {
    fn find(&self, user_id: &str) -> Result<Option<Schedule>> {
        let path = self.document_path(user_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.lock_file(user_id)?;
        lock.lock_shared()?;
        let result = load_document(&path);
        lock.unlock()?;
        result
    }

    fn get_or_create(&self, user_id: &str) -> Result<Schedule> {
        self.update(user_id, |doc| {
            if let Some(schedule) = doc.as_ref() {
                return Ok((schedule.clone(), false));
            }
            tracing::info!("Creating schedule for user {}", user_id);
            let schedule = Schedule::new(user_id);
            *doc = Some(schedule.clone());
            Ok((schedule, true))
        })
    }

    fn append_entries(&self, user_id: &str, entries: Vec<MedicineEntry>) -> Result<Schedule> {
        let count = entries.len();
        let schedule = self.update(user_id, |doc| {
            let schedule = doc.get_or_insert_with(|| Schedule::new(user_id));
            schedule.medicines.extend(entries);
            Ok((schedule.clone(), true))
        })?;
        tracing::info!(
            "Appended {} medicines to schedule of {} ({} total)",
            count,
            user_id,
            schedule.medicines.len()
        );
        Ok(schedule)
    }

    fn set_taken(&self, change: &StatusChange) -> Result<()> {
        self.update(&change.user_id, |doc| {
            let schedule = doc.as_mut().ok_or_else(|| not_found(&change.user_id))?;
            change.apply(schedule)?;
            Ok(((), true))
        })?;
        tracing::debug!(
            "Persisted {} {} offset {} = {}",
            change.medicine_id,
            change.time_slot,
            change.day_offset,
            change.is_taken
        );
        Ok(())
    }
}

/// User ids become file names, so only `[A-Za-z0-9_-]` is allowed
fn check_user_id(user_id: &str) -> Result<()> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("invalid user id '{}'", user_id)))
    }
}

fn load_document(path: &Path) -> Result<Option<Schedule>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;

    // Corrupted documents are left in place for manual recovery.
    let schedule = serde_json::from_str::<Schedule>(&contents).map_err(|e| {
        tracing::warn!("Failed to parse schedule {:?}: {}", path, e);
        Error::Storage(format!("corrupted schedule document {:?}: {}", path, e))
    })?;

    tracing::debug!("Loaded schedule from {:?}", path);
    Ok(Some(schedule))
}

/// Atomically write the document via temp file + rename
fn save_document(path: &Path, schedule: &Schedule) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "schedule path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(schedule)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved schedule to {:?}", path);
    Ok(())
}
