//! Contact record.
//!
//! # Invariants
//! - `id` is unique within one store and never reused.
//! - Fields are private; a contact cannot change after creation.

use super::ModelValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned contact identifier. `0` is never assigned.
pub type ContactId = u32;

/// A named person with free-text notes.
///
/// Ordering is by `id` first, so ordered sets of contacts iterate in id order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Contact {
    id: ContactId,
    name: String,
    notes: String,
}

impl Contact {
    /// Creates a contact record.
    ///
    /// The store is responsible for id assignment and input validation; this
    /// constructor only builds the shape.
    pub fn new(id: ContactId, name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            notes: notes.into(),
        }
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Checks the record-level invariants applied to persisted contacts.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.id == 0 {
            return Err(ModelValidationError::ZeroId("contact"));
        }
        if self.name.is_empty() {
            return Err(ModelValidationError::EmptyName(self.id));
        }
        Ok(())
    }
}
