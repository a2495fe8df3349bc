//! Contact and meeting register.
//!
//! # Responsibility
//! - Own every contact, meeting, id counter and the reference "now".
//! - Validate all inputs before any mutation.
//! - Answer past/future meeting queries relative to the reference date.
//! - Load from and flush to a `SnapshotRepository`.
//!
//! # Invariants
//! - Ids are assigned by incrementing the counter first; `0` is never assigned
//!   and ids are never reused.
//! - A failed operation leaves collections and counters untouched.
//! - Absent arguments are reported before any other validation.
//! - List queries classify meetings by date; the stored variant tag is ignored.
//! - Meeting lists are sorted ascending by date and hold each id once.

use crate::config::StoreConfig;
use crate::model::contact::{Contact, ContactId};
use crate::model::meeting::{Meeting, MeetingId};
use crate::repo::snapshot_repo::{
    FileSnapshotRepository, RepoError, SnapshotRepository, StoreSnapshot,
};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Coarse classification of [`ManagerError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was absent.
    NullReference,
    /// An argument was present but semantically invalid.
    InvalidArgument,
    /// The referenced meeting is in the wrong temporal bucket for the call.
    InvalidState,
    /// Snapshot load or save failed.
    Storage,
}

/// Error returned by register operations.
#[derive(Debug)]
pub enum ManagerError {
    /// Names the absent argument.
    MissingArgument(&'static str),
    InvalidArgument(String),
    InvalidState(String),
    Storage(RepoError),
}

impl ManagerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingArgument(_) => ErrorKind::NullReference,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArgument(argument) => write!(f, "required argument `{argument}` is absent"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::InvalidState(message) => write!(f, "invalid state: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ManagerError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

fn required<T>(value: Option<T>, argument: &'static str) -> ManagerResult<T> {
    value.ok_or(ManagerError::MissingArgument(argument))
}

/// Personal register of contacts and meetings.
///
/// Arguments that may be absent are taken as `impl Into<Option<_>>`: pass the
/// value directly, or `None` to model an absent argument.
///
/// Mutating operations take `&mut self`; the register does no locking of its
/// own.
#[derive(Debug)]
pub struct ContactManager<R: SnapshotRepository = FileSnapshotRepository> {
    repo: R,
    reference_date: DateTime<Utc>,
    meetings: Vec<Meeting>,
    contacts: BTreeMap<ContactId, Contact>,
    meeting_id_counter: MeetingId,
    contact_id_counter: ContactId,
}

impl ContactManager<FileSnapshotRepository> {
    /// Opens the register stored at `config.storage_path`.
    ///
    /// An absent file is created and an empty file yields an empty register.
    ///
    /// # Errors
    /// - `ManagerError::Storage` when the file cannot be read, decoded, or
    ///   holds an inconsistent snapshot.
    pub fn open(config: &StoreConfig) -> ManagerResult<Self> {
        Self::with_repository(
            FileSnapshotRepository::new(&config.storage_path),
            config.resolve_reference_date(),
        )
    }

    /// Opens the register, falling back to an empty one when loading fails.
    ///
    /// The failure is logged, not returned. The unreadable file is left in
    /// place until the next `flush` overwrites it.
    pub fn open_lenient(config: &StoreConfig) -> Self {
        Self::with_repository_lenient(
            FileSnapshotRepository::new(&config.storage_path),
            config.resolve_reference_date(),
        )
    }

    pub fn storage_path(&self) -> &Path {
        self.repo.path()
    }
}

impl<R: SnapshotRepository> ContactManager<R> {
    /// Builds a register over `repo`, loading any persisted snapshot.
    pub fn with_repository(repo: R, reference_date: DateTime<Utc>) -> ManagerResult<Self> {
        let snapshot = repo.load()?.unwrap_or_default();
        let manager = Self::from_snapshot(repo, reference_date, snapshot);
        info!(
            "event=store_open module=service status=ok meetings={} contacts={}",
            manager.meetings.len(),
            manager.contacts.len()
        );
        Ok(manager)
    }

    /// Like [`ContactManager::with_repository`], but load failures are logged
    /// and replaced by an empty register.
    pub fn with_repository_lenient(repo: R, reference_date: DateTime<Utc>) -> Self {
        let snapshot = match repo.load() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(err) => {
                error!(
                    "event=store_open module=service status=error fallback=empty error={}",
                    err
                );
                StoreSnapshot::default()
            }
        };
        Self::from_snapshot(repo, reference_date, snapshot)
    }

    fn from_snapshot(repo: R, reference_date: DateTime<Utc>, snapshot: StoreSnapshot) -> Self {
        let contacts = snapshot
            .contacts
            .into_iter()
            .map(|contact| (contact.id(), contact))
            .collect();
        Self {
            repo,
            reference_date,
            meetings: snapshot.meetings,
            contacts,
            meeting_id_counter: snapshot.meeting_id_counter,
            contact_id_counter: snapshot.contact_id_counter,
        }
    }

    /// The instant treated as "now" for every past/future comparison.
    pub fn reference_date(&self) -> DateTime<Utc> {
        self.reference_date
    }

    /// All meetings in insertion order.
    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    /// All contacts, ascending by id.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    /// Last assigned meeting id, `0` if none.
    pub fn meeting_id_counter(&self) -> MeetingId {
        self.meeting_id_counter
    }

    /// Last assigned contact id, `0` if none.
    pub fn contact_id_counter(&self) -> ContactId {
        self.contact_id_counter
    }

    /// Schedules a meeting after the reference date and returns its id.
    ///
    /// An empty contact set is accepted.
    ///
    /// # Errors
    /// - `MissingArgument` when `contacts` or `date` is absent.
    /// - `InvalidArgument` when `date` is not strictly after the reference
    ///   date, or a contact is not held by this register.
    pub fn add_future_meeting<'a>(
        &mut self,
        contacts: impl Into<Option<&'a BTreeSet<Contact>>>,
        date: impl Into<Option<DateTime<Utc>>>,
    ) -> ManagerResult<MeetingId> {
        let contacts = required(contacts.into(), "contacts")?;
        let date = required(date.into(), "date")?;
        if date <= self.reference_date {
            return Err(ManagerError::InvalidArgument(
                "a future meeting must be dated after the reference date".to_string(),
            ));
        }
        self.ensure_known_contacts(contacts)?;

        let id = self.allocate_meeting_id()?;
        self.meetings.push(Meeting::future(id, date, contacts.clone()));
        self.meeting_id_counter = id;
        info!(
            "event=meeting_add module=service status=ok kind=future meeting_id={} contacts={}",
            id,
            contacts.len()
        );
        Ok(id)
    }

    /// Records a meeting that already took place, with its notes.
    ///
    /// # Errors
    /// - `MissingArgument` when `contacts`, `date` or `text` is absent.
    /// - `InvalidArgument` when `date` is after the reference date, the
    ///   contact set is empty, or a contact is unknown (checked in that order).
    pub fn add_new_past_meeting<'a>(
        &mut self,
        contacts: impl Into<Option<&'a BTreeSet<Contact>>>,
        date: impl Into<Option<DateTime<Utc>>>,
        text: impl Into<Option<&'a str>>,
    ) -> ManagerResult<()> {
        let contacts = required(contacts.into(), "contacts")?;
        let date = required(date.into(), "date")?;
        let text = required(text.into(), "text")?;
        if date > self.reference_date {
            return Err(ManagerError::InvalidArgument(
                "a past meeting cannot be dated after the reference date".to_string(),
            ));
        }
        if contacts.is_empty() {
            return Err(ManagerError::InvalidArgument(
                "a past meeting needs at least one contact".to_string(),
            ));
        }
        self.ensure_known_contacts(contacts)?;

        let id = self.allocate_meeting_id()?;
        self.meetings
            .push(Meeting::past(id, date, contacts.clone(), text));
        self.meeting_id_counter = id;
        info!(
            "event=meeting_add module=service status=ok kind=past meeting_id={} contacts={}",
            id,
            contacts.len()
        );
        Ok(())
    }

    /// Returns the meeting with `id` if it lies strictly before the reference date.
    ///
    /// # Errors
    /// - `InvalidState` when the meeting exists but is not in the past.
    pub fn get_past_meeting(&self, id: MeetingId) -> ManagerResult<Option<Meeting>> {
        let Some(meeting) = self.find_meeting(id) else {
            return Ok(None);
        };
        if meeting.date() >= self.reference_date {
            return Err(ManagerError::InvalidState(format!(
                "meeting {id} has not taken place yet"
            )));
        }
        Ok(Some(meeting.clone()))
    }

    /// Returns the meeting with `id` if it lies strictly after the reference date.
    ///
    /// # Errors
    /// - `InvalidArgument` (not `InvalidState`) when the meeting exists but is
    ///   not in the future.
    pub fn get_future_meeting(&self, id: MeetingId) -> ManagerResult<Option<Meeting>> {
        let Some(meeting) = self.find_meeting(id) else {
            return Ok(None);
        };
        if meeting.date() <= self.reference_date {
            return Err(ManagerError::InvalidArgument(format!(
                "meeting {id} has already happened"
            )));
        }
        Ok(Some(meeting.clone()))
    }

    /// Returns the latest record stored under `id`, past or future.
    pub fn get_meeting(&self, id: MeetingId) -> Option<Meeting> {
        self.find_meeting(id).cloned()
    }

    /// Meetings after the reference date attended by `contact`.
    ///
    /// # Errors
    /// - `MissingArgument` when `contact` is absent.
    /// - `InvalidArgument` when no contact with this id is held.
    pub fn get_future_meeting_list<'a>(
        &self,
        contact: impl Into<Option<&'a Contact>>,
    ) -> ManagerResult<Vec<Meeting>> {
        let contact = self.known_contact_argument(contact.into())?;
        Ok(sorted_unique(self.meetings.iter().filter(|meeting| {
            meeting.date() > self.reference_date && meeting.includes_contact(contact.id())
        })))
    }

    /// Every meeting dated exactly `date`.
    ///
    /// # Errors
    /// - `MissingArgument` when `date` is absent.
    pub fn get_meeting_list_on(
        &self,
        date: impl Into<Option<DateTime<Utc>>>,
    ) -> ManagerResult<Vec<Meeting>> {
        let date = required(date.into(), "date")?;
        Ok(sorted_unique(
            self.meetings.iter().filter(|meeting| meeting.date() == date),
        ))
    }

    /// Meetings not after the reference date attended by `contact`.
    ///
    /// # Errors
    /// - `MissingArgument` when `contact` is absent.
    /// - `InvalidArgument` when no contact with this id is held.
    pub fn get_past_meeting_list_for<'a>(
        &self,
        contact: impl Into<Option<&'a Contact>>,
    ) -> ManagerResult<Vec<Meeting>> {
        let contact = self.known_contact_argument(contact.into())?;
        Ok(sorted_unique(self.meetings.iter().filter(|meeting| {
            meeting.date() <= self.reference_date && meeting.includes_contact(contact.id())
        })))
    }

    /// Appends `text` to a past meeting's notes and returns the replacement record.
    ///
    /// The old record is removed and the new Past record, with the same id,
    /// date and contacts, is appended.
    ///
    /// # Errors
    /// - `MissingArgument` when `text` is absent.
    /// - `InvalidArgument` when no meeting has this id.
    /// - `InvalidState` when the meeting is not strictly before the reference date.
    pub fn add_meeting_notes<'a>(
        &mut self,
        id: MeetingId,
        text: impl Into<Option<&'a str>>,
    ) -> ManagerResult<Meeting> {
        let text = required(text.into(), "text")?;
        let date = self
            .find_meeting(id)
            .map(Meeting::date)
            .ok_or_else(|| ManagerError::InvalidArgument(format!("no meeting with id {id}")))?;
        if date > self.reference_date {
            return Err(ManagerError::InvalidState(format!(
                "meeting {id} has not taken place yet"
            )));
        }

        let current = self
            .get_past_meeting(id)?
            .ok_or_else(|| ManagerError::InvalidArgument(format!("no meeting with id {id}")))?;
        let replacement = current.with_appended_notes(text);
        self.replace_meeting(replacement.clone());
        info!(
            "event=meeting_notes_add module=service status=ok meeting_id={} appended_chars={}",
            id,
            text.chars().count()
        );
        Ok(replacement)
    }

    /// Adds a contact and returns its id.
    ///
    /// # Errors
    /// - `MissingArgument` when `name` or `notes` is absent.
    /// - `InvalidArgument` when either is empty.
    pub fn add_new_contact<'a>(
        &mut self,
        name: impl Into<Option<&'a str>>,
        notes: impl Into<Option<&'a str>>,
    ) -> ManagerResult<ContactId> {
        let name = required(name.into(), "name")?;
        let notes = required(notes.into(), "notes")?;
        if name.is_empty() || notes.is_empty() {
            return Err(ManagerError::InvalidArgument(
                "contact name and notes must not be empty".to_string(),
            ));
        }

        let id = self.contact_id_counter.checked_add(1).ok_or_else(|| {
            ManagerError::InvalidState("contact id space exhausted".to_string())
        })?;
        self.contacts.insert(id, Contact::new(id, name, notes));
        self.contact_id_counter = id;
        info!("event=contact_add module=service status=ok contact_id={}", id);
        Ok(id)
    }

    /// Contacts whose name contains `name` (case-sensitive).
    ///
    /// The empty string matches every contact.
    ///
    /// # Errors
    /// - `MissingArgument` when `name` is absent.
    pub fn get_contacts_by_name<'a>(
        &self,
        name: impl Into<Option<&'a str>>,
    ) -> ManagerResult<BTreeSet<Contact>> {
        let name = required(name.into(), "name")?;
        if name.is_empty() {
            return Ok(self.contacts.values().cloned().collect());
        }
        Ok(self
            .contacts
            .values()
            .filter(|contact| contact.name().contains(name))
            .cloned()
            .collect())
    }

    /// Contacts with the given ids. Repeated ids are allowed.
    ///
    /// # Errors
    /// - `InvalidArgument` when `ids` is empty or any id is unknown.
    pub fn get_contacts_by_ids(&self, ids: &[ContactId]) -> ManagerResult<BTreeSet<Contact>> {
        if ids.is_empty() {
            return Err(ManagerError::InvalidArgument(
                "at least one contact id is required".to_string(),
            ));
        }
        ids.iter()
            .map(|id| {
                self.contacts.get(id).cloned().ok_or_else(|| {
                    ManagerError::InvalidArgument(format!("no contact with id {id}"))
                })
            })
            .collect()
    }

    /// Returns whether any meeting has this id.
    pub fn is_known_meeting_id(&self, id: MeetingId) -> bool {
        self.meetings.iter().any(|meeting| meeting.id() == id)
    }

    /// Returns whether a contact with the same id is held.
    pub fn is_known_contact(&self, contact: &Contact) -> bool {
        self.contacts.contains_key(&contact.id())
    }

    /// Copies the current state into a persistable snapshot.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            meetings: self.meetings.clone(),
            contacts: self.contacts.values().cloned().collect(),
            meeting_id_counter: self.meeting_id_counter,
            contact_id_counter: self.contact_id_counter,
        }
    }

    /// Writes the whole register through the repository.
    pub fn flush(&self) -> ManagerResult<()> {
        self.repo.save(&self.snapshot())?;
        info!(
            "event=store_flush module=service status=ok meetings={} contacts={}",
            self.meetings.len(),
            self.contacts.len()
        );
        Ok(())
    }

    fn find_meeting(&self, id: MeetingId) -> Option<&Meeting> {
        self.meetings.iter().rev().find(|meeting| meeting.id() == id)
    }

    fn replace_meeting(&mut self, meeting: Meeting) {
        self.meetings.retain(|existing| existing.id() != meeting.id());
        self.meetings.push(meeting);
    }

    fn allocate_meeting_id(&self) -> ManagerResult<MeetingId> {
        self.meeting_id_counter
            .checked_add(1)
            .ok_or_else(|| ManagerError::InvalidState("meeting id space exhausted".to_string()))
    }

    /// Every contact must match a held record exactly, not just by id.
    fn ensure_known_contacts(&self, contacts: &BTreeSet<Contact>) -> ManagerResult<()> {
        match contacts
            .iter()
            .find(|contact| self.contacts.get(&contact.id()) != Some(*contact))
        {
            Some(unknown) => {
                debug!(
                    "event=contact_check module=service status=rejected contact_id={}",
                    unknown.id()
                );
                Err(ManagerError::InvalidArgument(format!(
                    "contact {} is not held by this register",
                    unknown.id()
                )))
            }
            None => Ok(()),
        }
    }

    fn known_contact_argument<'a>(&self, contact: Option<&'a Contact>) -> ManagerResult<&'a Contact> {
        let contact = required(contact, "contact")?;
        if !self.is_known_contact(contact) {
            return Err(ManagerError::InvalidArgument(format!(
                "contact {} is not held by this register",
                contact.id()
            )));
        }
        Ok(contact)
    }
}

/// Keeps the latest record per id, then orders by date (id breaks ties).
fn sorted_unique<'a>(meetings: impl DoubleEndedIterator<Item = &'a Meeting>) -> Vec<Meeting> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Meeting> = meetings
        .rev()
        .filter(|meeting| seen.insert(meeting.id()))
        .cloned()
        .collect();
    unique.sort_by_key(|meeting| (meeting.date(), meeting.id()));
    unique
}
