//! Snapshot repository contract and file-backed implementation.
//!
//! # Responsibility
//! - Persist the store's four values (meetings, contacts, meeting counter,
//!   contact counter) in that fixed order.
//! - Create the backing file on first use.
//!
//! # Invariants
//! - An absent or empty file means "no snapshot", never an error.
//! - Saves replace the file through a sibling temp file and a rename, so a
//!   failed write leaves the previous snapshot intact.
//! - Decoded snapshots pass `StoreSnapshot::validate()` before being returned.

use crate::model::contact::{Contact, ContactId};
use crate::model::meeting::{Meeting, MeetingId};
use crate::model::ModelValidationError;
use log::{error, info};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for snapshot load/save.
#[derive(Debug)]
pub enum RepoError {
    Io { path: PathBuf, source: io::Error },
    Decode(serde_json::Error),
    Encode(serde_json::Error),
    Validation(ModelValidationError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Decode(err) => write!(f, "failed to decode snapshot: {err}"),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::Validation(err) => write!(f, "invalid persisted record: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted snapshot: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Wire shape: the four persisted values in fixed order, encoded as a JSON array.
type SnapshotWire = (Vec<Meeting>, BTreeSet<Contact>, MeetingId, ContactId);

/// Whole-store state as persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Meetings in insertion order.
    pub meetings: Vec<Meeting>,
    pub contacts: BTreeSet<Contact>,
    /// Last assigned meeting id (`0` when none was assigned).
    pub meeting_id_counter: MeetingId,
    /// Last assigned contact id (`0` when none was assigned).
    pub contact_id_counter: ContactId,
}

impl StoreSnapshot {
    /// Checks cross-record invariants of a decoded snapshot.
    ///
    /// # Errors
    /// - Any record failing its own `validate()`.
    /// - Duplicate contact or meeting ids.
    /// - Ids above the persisted counters.
    /// - Meetings referencing contacts missing from the contact set.
    pub fn validate(&self) -> RepoResult<()> {
        let mut contact_ids = HashSet::with_capacity(self.contacts.len());
        for contact in &self.contacts {
            contact.validate()?;
            if !contact_ids.insert(contact.id()) {
                return Err(RepoError::InvalidData(format!(
                    "duplicate contact id {}",
                    contact.id()
                )));
            }
            if contact.id() > self.contact_id_counter {
                return Err(RepoError::InvalidData(format!(
                    "contact id {} exceeds counter {}",
                    contact.id(),
                    self.contact_id_counter
                )));
            }
        }

        let mut meeting_ids = HashSet::with_capacity(self.meetings.len());
        for meeting in &self.meetings {
            meeting.validate()?;
            if !meeting_ids.insert(meeting.id()) {
                return Err(RepoError::InvalidData(format!(
                    "duplicate meeting id {}",
                    meeting.id()
                )));
            }
            if meeting.id() > self.meeting_id_counter {
                return Err(RepoError::InvalidData(format!(
                    "meeting id {} exceeds counter {}",
                    meeting.id(),
                    self.meeting_id_counter
                )));
            }
            if let Some(unknown) = meeting
                .contacts()
                .iter()
                .find(|contact| !self.contacts.contains(*contact))
            {
                return Err(RepoError::InvalidData(format!(
                    "meeting {} references unknown contact {}",
                    meeting.id(),
                    unknown.id()
                )));
            }
        }

        Ok(())
    }

    fn from_wire(wire: SnapshotWire) -> Self {
        let (meetings, contacts, meeting_id_counter, contact_id_counter) = wire;
        Self {
            meetings,
            contacts,
            meeting_id_counter,
            contact_id_counter,
        }
    }
}

/// Repository interface for whole-store snapshots.
pub trait SnapshotRepository {
    /// Loads the persisted snapshot, or `None` when nothing was persisted yet.
    fn load(&self) -> RepoResult<Option<StoreSnapshot>>;
    /// Replaces the persisted snapshot.
    fn save(&self, snapshot: &StoreSnapshot) -> RepoResult<()>;
}

/// Snapshot repository backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    path: PathBuf,
}

impl FileSnapshotRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> RepoError {
        RepoError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn create_empty_file(&self) -> RepoResult<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        fs::File::create(&self.path).map_err(|err| self.io_error(err))?;
        info!("event=snapshot_file_create module=repo status=ok");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn read_snapshot(&self) -> RepoResult<StoreSnapshot> {
        let bytes = fs::read(&self.path).map_err(|err| self.io_error(err))?;
        let wire: SnapshotWire = serde_json::from_slice(&bytes).map_err(RepoError::Decode)?;
        let snapshot = StoreSnapshot::from_wire(wire);
        snapshot.validate()?;
        Ok(snapshot)
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn load(&self) -> RepoResult<Option<StoreSnapshot>> {
        let started_at = Instant::now();
        info!("event=snapshot_load module=repo status=start");

        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                self.create_empty_file()?;
                info!(
                    "event=snapshot_load module=repo status=ok source=created duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Ok(None);
            }
            Err(err) => return Err(self.io_error(err)),
        };

        if metadata.len() == 0 {
            info!(
                "event=snapshot_load module=repo status=ok source=empty duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Ok(None);
        }

        match self.read_snapshot() {
            Ok(snapshot) => {
                info!(
                    "event=snapshot_load module=repo status=ok source=file meetings={} contacts={} duration_ms={}",
                    snapshot.meetings.len(),
                    snapshot.contacts.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(Some(snapshot))
            }
            Err(err) => {
                error!(
                    "event=snapshot_load module=repo status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn save(&self, snapshot: &StoreSnapshot) -> RepoResult<()> {
        let started_at = Instant::now();
        let wire = (
            &snapshot.meetings,
            &snapshot.contacts,
            snapshot.meeting_id_counter,
            snapshot.contact_id_counter,
        );
        let bytes = serde_json::to_vec_pretty(&wire).map_err(RepoError::Encode)?;

        let temp_path = self.temp_path();
        let written = fs::write(&temp_path, &bytes).and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(err) = written {
            let _ = fs::remove_file(&temp_path);
            error!(
                "event=snapshot_save module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(self.io_error(err));
        }

        info!(
            "event=snapshot_save module=repo status=ok meetings={} contacts={} bytes={} duration_ms={}",
            snapshot.meetings.len(),
            snapshot.contacts.len(),
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
