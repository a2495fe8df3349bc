//! Repository layer for store persistence.
//!
//! # Responsibility
//! - Define the load/save contract the manager store persists through.
//! - Keep file layout and encoding details out of the service layer.
//!
//! # Invariants
//! - A snapshot is always read and written as one unit.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod snapshot_repo;
