//! Store construction settings.
//!
//! # Responsibility
//! - Name the backing file explicitly instead of relying on a process-wide default.
//! - Allow pinning the reference "now" used for past/future classification.
//!
//! # Invariants
//! - When no reference date is configured, the store samples the clock once at
//!   construction and never re-samples it.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// File name used by [`StoreConfig::in_dir`].
pub const DEFAULT_STORAGE_FILE_NAME: &str = "contacts.txt";

/// Settings for opening a [`crate::ContactManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Snapshot file read at open and written on flush.
    pub storage_path: PathBuf,
    /// Fixed reference date; `None` means "clock at construction time".
    pub reference_date: Option<DateTime<Utc>>,
}

impl StoreConfig {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            reference_date: None,
        }
    }

    /// Uses [`DEFAULT_STORAGE_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_STORAGE_FILE_NAME))
    }

    pub fn with_reference_date(mut self, reference_date: DateTime<Utc>) -> Self {
        self.reference_date = Some(reference_date);
        self
    }

    /// Resolves the reference date, sampling the clock when none is pinned.
    pub fn resolve_reference_date(&self) -> DateTime<Utc> {
        self.reference_date.unwrap_or_else(Utc::now)
    }
}
