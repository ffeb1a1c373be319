//! Contact record, creation draft and field rules.
//!
//! # Responsibility
//! - Define the persisted contact shape and its JSON wire names.
//! - Normalize user input (trim, lower-case email) before writes.
//! - Validate name/email/phone rules in one place for all backends.
//!
//! # Invariants
//! - `id` is assigned once by storage and never changes afterwards.
//! - `created_at` is set once; `updated_at` moves on every successful write.
//! - Stored emails are trimmed and lower-cased.
//! - A non-empty phone starts with one of `MOBILE_PHONE_PREFIXES`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned contact identifier. Starts at 1, never reused.
pub type ContactId = u64;

/// Accepted leading digits for a local mobile number.
pub const MOBILE_PHONE_PREFIXES: [&str; 2] = ["06", "07"];

/// Field-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// Name is empty after trimming.
    EmptyName,
    /// Email is empty after trimming.
    EmptyEmail,
    /// Email does not contain `@`.
    InvalidEmail(String),
    /// Non-empty phone with an unsupported prefix.
    InvalidPhonePrefix(String),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name cannot be empty"),
            Self::EmptyEmail => write!(f, "email cannot be empty"),
            Self::InvalidEmail(value) => write!(f, "invalid email format: `{value}`"),
            Self::InvalidPhonePrefix(value) => write!(
                f,
                "phone number `{value}` must start with '{}' or '{}'",
                MOBILE_PHONE_PREFIXES[0], MOBILE_PHONE_PREFIXES[1]
            ),
        }
    }
}

impl Error for ContactValidationError {}

/// Caller-provided fields for a contact that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ContactDraft {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Trims every field and lower-cases the email.
    pub fn normalize(&mut self) {
        normalize_fields(&mut self.name, &mut self.email, &mut self.phone);
    }

    pub fn validate(&self) -> Result<(), ContactValidationError> {
        validate_fields(&self.name, &self.email, &self.phone)
    }

    /// Normalizes then validates; the pre-write step for inserts.
    pub fn prepare_for_write(&mut self) -> Result<(), ContactValidationError> {
        self.normalize();
        self.validate()
    }

    /// Materializes a stored record with storage-assigned identity.
    ///
    /// `created_at == updated_at` for a freshly created contact.
    pub fn into_contact(self, id: ContactId, now: DateTime<Utc>) -> Contact {
        Contact {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
    /// Optional; serialized only when non-empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Trims every field and lower-cases the email.
    pub fn normalize(&mut self) {
        normalize_fields(&mut self.name, &mut self.email, &mut self.phone);
    }

    pub fn validate(&self) -> Result<(), ContactValidationError> {
        validate_fields(&self.name, &self.email, &self.phone)
    }

    /// Normalizes then validates; the pre-write step for updates.
    pub fn prepare_for_write(&mut self) -> Result<(), ContactValidationError> {
        self.normalize();
        self.validate()
    }

    /// Replaces all mutable fields. Identity and timestamps are untouched.
    pub fn replace_fields(&mut self, draft: ContactDraft) {
        self.name = draft.name;
        self.email = draft.email;
        self.phone = draft.phone;
    }
}

/// Canonical form of an email used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns whether `phone` is empty or carries a supported mobile prefix.
pub fn is_valid_phone(phone: &str) -> bool {
    let phone = phone.trim();
    phone.is_empty()
        || MOBILE_PHONE_PREFIXES
            .iter()
            .any(|prefix| phone.starts_with(prefix))
}

fn normalize_fields(name: &mut String, email: &mut String, phone: &mut String) {
    *name = name.trim().to_string();
    *email = normalize_email(email);
    *phone = phone.trim().to_string();
}

fn validate_fields(name: &str, email: &str, phone: &str) -> Result<(), ContactValidationError> {
    if name.trim().is_empty() {
        return Err(ContactValidationError::EmptyName);
    }

    let email = email.trim();
    if email.is_empty() {
        return Err(ContactValidationError::EmptyEmail);
    }
    if !email.contains('@') {
        return Err(ContactValidationError::InvalidEmail(email.to_string()));
    }

    if !is_valid_phone(phone) {
        return Err(ContactValidationError::InvalidPhonePrefix(
            phone.trim().to_string(),
        ));
    }

    Ok(())
}
