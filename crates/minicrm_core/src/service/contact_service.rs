//! Contact use-case service.
//!
//! # Responsibility
//! - Apply business rules above raw persistence: email uniqueness and
//!   existence checks before mutations.
//! - Attach operation context to not-found and storage failures.
//!
//! # Invariants
//! - The service owns exactly one repository and no other state.
//! - Emails are normalized before every duplicate check or lookup.
//! - Updates are full-field replacements; there is no partial merge.

use crate::model::contact::{
    normalize_email, Contact, ContactDraft, ContactId, ContactValidationError,
};
use crate::repo::{ContactLookup, ContactRepository, RepoError, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse classification of service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    DuplicateEmail,
    Storage,
}

/// Error returned by `ContactService` operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Field rules violated.
    Validation(ContactValidationError),
    /// Create/update would break email uniqueness.
    DuplicateEmail(String),
    /// Target contact does not exist.
    NotFound {
        operation: &'static str,
        lookup: ContactLookup,
    },
    /// Persistence-layer failure.
    Storage {
        operation: &'static str,
        source: StorageError,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::DuplicateEmail(_) => ErrorKind::DuplicateEmail,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }

    fn from_repo(operation: &'static str, err: RepoError) -> Self {
        match err {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            RepoError::NotFound(lookup) => Self::NotFound { operation, lookup },
            RepoError::Storage(source) => Self::Storage { operation, source },
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid contact: {err}"),
            Self::DuplicateEmail(email) => {
                write!(f, "another contact with email `{email}` already exists")
            }
            Self::NotFound { operation, lookup } => {
                write!(f, "{operation}: contact not found: {lookup}")
            }
            Self::Storage { operation, source } => write!(f, "{operation}: {source}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage { source, .. } => Some(source),
            Self::DuplicateEmail(_) | Self::NotFound { .. } => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Contact service over one repository implementation.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates a contact after checking that no other contact owns the email.
    pub fn create_contact(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> ServiceResult<Contact> {
        const OP: &str = "create contact";

        let mut draft = ContactDraft::new(name, email, phone);
        draft.prepare_for_write().map_err(ServiceError::Validation)?;
        self.ensure_email_available(OP, &draft.email, None)?;

        let contact = self
            .repo
            .create(draft)
            .map_err(|err| ServiceError::from_repo(OP, err))?;
        info!(
            "event=contact_created module=service backend={} id={}",
            self.repo.backend_name(),
            contact.id
        );
        Ok(contact)
    }

    pub fn list_contacts(&self) -> ServiceResult<Vec<Contact>> {
        self.repo
            .get_all()
            .map_err(|err| ServiceError::from_repo("list contacts", err))
    }

    pub fn get_contact(&self, id: ContactId) -> ServiceResult<Contact> {
        self.repo
            .get_by_id(id)
            .map_err(|err| ServiceError::from_repo("get contact", err))
    }

    /// Replaces every field of contact `id`.
    ///
    /// Keeping the contact's own email is never a conflict.
    pub fn update_contact(
        &self,
        id: ContactId,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> ServiceResult<Contact> {
        const OP: &str = "update contact";

        let mut contact = self
            .repo
            .get_by_id(id)
            .map_err(|err| ServiceError::from_repo(OP, err))?;

        let mut draft = ContactDraft::new(name, email, phone);
        draft.normalize();
        if draft.email != contact.email {
            self.ensure_email_available(OP, &draft.email, Some(id))?;
        }

        contact.replace_fields(draft);
        let updated = self
            .repo
            .update(contact)
            .map_err(|err| ServiceError::from_repo(OP, err))?;
        info!(
            "event=contact_updated module=service backend={} id={}",
            self.repo.backend_name(),
            updated.id
        );
        Ok(updated)
    }

    pub fn delete_contact(&self, id: ContactId) -> ServiceResult<()> {
        const OP: &str = "delete contact";

        self.repo
            .get_by_id(id)
            .map_err(|err| ServiceError::from_repo(OP, err))?;
        self.repo
            .delete(id)
            .map_err(|err| ServiceError::from_repo(OP, err))?;
        info!(
            "event=contact_deleted module=service backend={} id={id}",
            self.repo.backend_name()
        );
        Ok(())
    }

    pub fn search_by_email(&self, email: &str) -> ServiceResult<Contact> {
        self.repo
            .get_by_email(&normalize_email(email))
            .map_err(|err| ServiceError::from_repo("search by email", err))
    }

    /// Closes the underlying repository.
    pub fn close(&self) -> ServiceResult<()> {
        self.repo
            .close()
            .map_err(|err| ServiceError::from_repo("close store", err))
    }

    fn ensure_email_available(
        &self,
        operation: &'static str,
        email: &str,
        owner: Option<ContactId>,
    ) -> ServiceResult<()> {
        match self.repo.get_by_email(email) {
            Ok(existing) if Some(existing.id) == owner => Ok(()),
            Ok(_) => {
                warn!(
                    "event=duplicate_email module=service status=rejected operation={}",
                    operation.replace(' ', "_")
                );
                Err(ServiceError::DuplicateEmail(email.to_string()))
            }
            Err(RepoError::NotFound(_)) => Ok(()),
            Err(err) => Err(ServiceError::from_repo(operation, err)),
        }
    }
}
