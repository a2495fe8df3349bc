//! Core use-case services.
//!
//! # Responsibility
//! - Own the authoritative in-memory register and enforce its invariants.
//! - Keep callers decoupled from snapshot storage details.

pub mod contact_manager;
