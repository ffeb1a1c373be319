//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record shared by every storage backend.
//! - Own field normalization and validation rules.
//!
//! # Invariants
//! - Every persisted contact has passed `Contact::validate()`.
//! - Identity (`ContactId`) is assigned by storage, never by callers.

pub mod contact;
