//! Repository contract and storage backends.
//!
//! # Responsibility
//! - Define the uniform CRUD contract every backend satisfies.
//! - Provide in-memory, JSON-file and SQLite implementations.
//! - Translate backend-specific failures into `RepoError`.
//!
//! # Invariants
//! - Every write path normalizes and validates before mutating state.
//! - Not-found conditions surface as `RepoError::NotFound`, never as
//!   transport errors.
//! - `get_all` returns contacts in ascending id order on every backend.

use crate::db::DbError;
use crate::model::contact::{Contact, ContactDraft, ContactId, ContactValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod json_repo;
pub mod memory_repo;
pub mod sqlite_repo;
mod table;

pub type RepoResult<T> = Result<T, RepoError>;

/// Key used by a failed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactLookup {
    Id(ContactId),
    Email(String),
}

impl Display for ContactLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Email(email) => write!(f, "email `{email}`"),
        }
    }
}

/// Persistence failure below the contract level.
#[derive(Debug)]
pub enum StorageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    Db(DbError),
    /// Persisted state exists but breaks record invariants.
    InvalidData(String),
    /// Operation attempted after `close()`.
    Closed,
    /// A writer panicked while holding the store lock.
    Poisoned,
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "malformed contact file `{}`: {source}", path.display())
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::Closed => write!(f, "contact store is closed"),
            Self::Poisoned => write!(f, "contact store lock poisoned"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Closed | Self::Poisoned => None,
        }
    }
}

/// Repository error shared by all backends.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    NotFound(ContactLookup),
    DuplicateEmail(String),
    Storage(StorageError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(lookup) => write!(f, "contact not found: {lookup}"),
            Self::DuplicateEmail(email) => {
                write!(f, "a contact with email `{email}` already exists")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateEmail(_) => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Storage(StorageError::Db(value))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Db(DbError::Sqlite(value)))
    }
}

/// Uniform CRUD contract over one contact store.
pub trait ContactRepository: Send + Sync {
    /// Short backend tag used in log events.
    fn backend_name(&self) -> &'static str;
    /// Assigns id and timestamps, persists, and returns the stored record.
    fn create(&self, draft: ContactDraft) -> RepoResult<Contact>;
    fn get_by_id(&self, id: ContactId) -> RepoResult<Contact>;
    fn get_all(&self) -> RepoResult<Vec<Contact>>;
    /// Replaces all fields of an existing contact and refreshes `updated_at`.
    fn update(&self, contact: Contact) -> RepoResult<Contact>;
    fn delete(&self, id: ContactId) -> RepoResult<()>;
    /// Exact match on the stored (normalized) email.
    fn get_by_email(&self, email: &str) -> RepoResult<Contact>;
    /// Releases held resources. No-op for backends holding none.
    fn close(&self) -> RepoResult<()>;
}

impl<R: ContactRepository + ?Sized> ContactRepository for Box<R> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn create(&self, draft: ContactDraft) -> RepoResult<Contact> {
        (**self).create(draft)
    }

    fn get_by_id(&self, id: ContactId) -> RepoResult<Contact> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> RepoResult<Vec<Contact>> {
        (**self).get_all()
    }

    fn update(&self, contact: Contact) -> RepoResult<Contact> {
        (**self).update(contact)
    }

    fn delete(&self, id: ContactId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Contact> {
        (**self).get_by_email(email)
    }

    fn close(&self) -> RepoResult<()> {
        (**self).close()
    }
}

impl<R: ContactRepository + ?Sized> ContactRepository for Arc<R> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn create(&self, draft: ContactDraft) -> RepoResult<Contact> {
        (**self).create(draft)
    }

    fn get_by_id(&self, id: ContactId) -> RepoResult<Contact> {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> RepoResult<Vec<Contact>> {
        (**self).get_all()
    }

    fn update(&self, contact: Contact) -> RepoResult<Contact> {
        (**self).update(contact)
    }

    fn delete(&self, id: ContactId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Contact> {
        (**self).get_by_email(email)
    }

    fn close(&self) -> RepoResult<()> {
        (**self).close()
    }
}

/// Creates the parent directory of a store file when it is missing.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
