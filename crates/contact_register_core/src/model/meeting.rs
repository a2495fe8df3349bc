//! Meeting record with a Future/Past variant tag.
//!
//! # Responsibility
//! - Hold the immutable `{id, date, contacts}` shape shared by both variants.
//! - Carry notes only on the Past variant.
//! - Build the replacement record used when notes are appended.
//!
//! # Invariants
//! - `id`, `date` and `contacts` never change for a given record.
//! - Appending notes returns a new Past record with the same id.

use super::contact::{Contact, ContactId};
use super::ModelValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Store-assigned meeting identifier. `0` is never assigned.
pub type MeetingId = u32;

/// Variant tag recorded when a meeting is created or replaced.
///
/// The tag records how the meeting entered the store. Whether a meeting is
/// past or future for list queries is decided from its date, not this tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeetingKind {
    /// Scheduled meeting; carries no notes.
    Future,
    /// Meeting that has taken place, with free-text notes (may be empty).
    Past { notes: String },
}

/// A meeting tied to a date and a set of contacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    id: MeetingId,
    date: DateTime<Utc>,
    contacts: BTreeSet<Contact>,
    #[serde(flatten)]
    kind: MeetingKind,
}

impl Meeting {
    /// Creates a Future-tagged meeting record.
    pub fn future(id: MeetingId, date: DateTime<Utc>, contacts: BTreeSet<Contact>) -> Self {
        Self {
            id,
            date,
            contacts,
            kind: MeetingKind::Future,
        }
    }

    /// Creates a Past-tagged meeting record with notes.
    pub fn past(
        id: MeetingId,
        date: DateTime<Utc>,
        contacts: BTreeSet<Contact>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date,
            contacts,
            kind: MeetingKind::Past {
                notes: notes.into(),
            },
        }
    }

    pub fn id(&self) -> MeetingId {
        self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn contacts(&self) -> &BTreeSet<Contact> {
        &self.contacts
    }

    pub fn kind(&self) -> &MeetingKind {
        &self.kind
    }

    /// Returns the notes of a Past-tagged record, or `None` for Future ones.
    pub fn notes(&self) -> Option<&str> {
        match &self.kind {
            MeetingKind::Future => None,
            MeetingKind::Past { notes } => Some(notes.as_str()),
        }
    }

    /// Returns whether any attendee has the given contact id.
    pub fn includes_contact(&self, contact_id: ContactId) -> bool {
        self.contacts.iter().any(|contact| contact.id() == contact_id)
    }

    /// Builds the Past record that replaces this one after appending `text`.
    ///
    /// A Future-tagged record contributes empty prior notes. The receiver is
    /// left untouched.
    pub fn with_appended_notes(&self, text: &str) -> Self {
        let mut notes = self.notes().unwrap_or_default().to_string();
        notes.push_str(text);
        Self::past(self.id, self.date, self.contacts.clone(), notes)
    }

    /// Checks the record-level invariants applied to persisted meetings.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.id == 0 {
            return Err(ModelValidationError::ZeroId("meeting"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Meeting, MeetingKind};
    use crate::model::contact::Contact;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn attendees() -> BTreeSet<Contact> {
        [Contact::new(1, "Alice", "intro")].into_iter().collect()
    }

    #[test]
    fn appending_notes_to_future_record_yields_past_record() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let future = Meeting::future(7, date, attendees());
        assert_eq!(future.notes(), None);

        let replaced = future.with_appended_notes("agreed budget");
        assert_eq!(replaced.id(), 7);
        assert_eq!(replaced.date(), date);
        assert_eq!(replaced.contacts(), future.contacts());
        assert_eq!(
            replaced.kind(),
            &MeetingKind::Past {
                notes: "agreed budget".to_string()
            }
        );
        assert_eq!(future.kind(), &MeetingKind::Future);
    }

    #[test]
    fn appending_notes_concatenates_without_separator() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let past = Meeting::past(2, date, attendees(), "first.");
        assert_eq!(past.with_appended_notes("second.").notes(), Some("first.second."));
    }

    #[test]
    fn serde_keeps_notes_only_on_past_variant() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let future = serde_json::to_value(Meeting::future(1, date, attendees())).unwrap();
        assert_eq!(future["kind"], "future");
        assert!(future.get("notes").is_none());

        let past = Meeting::past(2, date, attendees(), "done");
        let value = serde_json::to_value(&past).unwrap();
        assert_eq!(value["kind"], "past");
        assert_eq!(value["notes"], "done");
        let decoded: Meeting = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, past);
    }

    #[test]
    fn includes_contact_matches_by_id() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let meeting = Meeting::future(1, date, attendees());
        assert!(meeting.includes_contact(1));
        assert!(!meeting.includes_contact(2));
    }
}
