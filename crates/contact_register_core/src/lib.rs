//! Core of the personal contact and meeting register.
//! This crate owns the data model, its validation rules and persistence.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{StoreConfig, DEFAULT_STORAGE_FILE_NAME};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::contact::{Contact, ContactId};
pub use model::meeting::{Meeting, MeetingId, MeetingKind};
pub use model::ModelValidationError;
pub use repo::snapshot_repo::{
    FileSnapshotRepository, RepoError, RepoResult, SnapshotRepository, StoreSnapshot,
};
pub use service::contact_manager::{ContactManager, ErrorKind, ManagerError, ManagerResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
