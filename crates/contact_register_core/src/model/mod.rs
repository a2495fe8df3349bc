//! Domain model for the contact register.
//!
//! # Responsibility
//! - Define the immutable record shapes the manager store composes.
//! - Keep the Future/Past meeting distinction as a tagged variant.
//!
//! # Invariants
//! - Every record is identified by a positive integer id.
//! - Records are never mutated in place; edits produce replacement records.

pub mod contact;
pub mod meeting;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for a single model record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Ids start at 1; 0 is reserved as the "nothing assigned yet" counter value.
    ZeroId(&'static str),
    EmptyName(u32),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroId(record) => write!(f, "{record} id must be positive"),
            Self::EmptyName(id) => write!(f, "contact {id} has an empty name"),
        }
    }
}

impl Error for ModelValidationError {}
