//! Id-keyed contact map shared by the in-memory and JSON backends.
//!
//! # Invariants
//! - `next_id` is strictly greater than every key ever handed out by this
//!   table instance; deletes never lower it.
//! - `next_id` never wraps: an exhausted id space fails the insert without
//!   touching the table.
//! - Emails are unique across rows.
//! - Callers hold the surrounding `RwLock` for the whole read-modify-write.

use super::{ContactLookup, RepoError, RepoResult, StorageError};
use crate::model::contact::{Contact, ContactDraft, ContactId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
pub(crate) struct ContactTable {
    contacts: BTreeMap<ContactId, Contact>,
    next_id: ContactId,
}

impl ContactTable {
    pub(crate) fn new() -> Self {
        Self {
            contacts: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuilds a table from persisted rows.
    ///
    /// Rows are normalized and re-validated; duplicate ids or emails are
    /// rejected. `next_id` becomes one past the highest loaded id.
    pub(crate) fn from_records(records: Vec<Contact>) -> Result<Self, StorageError> {
        let mut table = Self::new();
        let mut emails = HashSet::new();

        for mut contact in records {
            contact.normalize();
            if contact.id == 0 {
                return Err(StorageError::InvalidData(
                    "contact id must be positive".to_string(),
                ));
            }
            contact.validate().map_err(|err| {
                StorageError::InvalidData(format!("contact {}: {err}", contact.id))
            })?;
            if !emails.insert(contact.email.clone()) {
                return Err(StorageError::InvalidData(format!(
                    "contact {}: duplicate email",
                    contact.id
                )));
            }

            let id = contact.id;
            let after = id.checked_add(1).ok_or_else(|| {
                StorageError::InvalidData(format!("contact id {id} leaves no id to assign"))
            })?;
            if table.contacts.insert(id, contact).is_some() {
                return Err(StorageError::InvalidData(format!("duplicate contact id {id}")));
            }
            table.next_id = table.next_id.max(after);
        }

        Ok(table)
    }

    pub(crate) fn len(&self) -> usize {
        self.contacts.len()
    }

    pub(crate) fn next_id(&self) -> ContactId {
        self.next_id
    }

    pub(crate) fn get(&self, id: ContactId) -> RepoResult<Contact> {
        self.contacts
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound(ContactLookup::Id(id)))
    }

    /// All rows in ascending id order.
    pub(crate) fn all(&self) -> Vec<Contact> {
        self.contacts.values().cloned().collect()
    }

    pub(crate) fn find_by_email(&self, email: &str) -> RepoResult<Contact> {
        self.contacts
            .values()
            .find(|contact| contact.email == email)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(ContactLookup::Email(email.to_string())))
    }

    pub(crate) fn insert(
        &mut self,
        mut draft: ContactDraft,
        now: DateTime<Utc>,
    ) -> RepoResult<Contact> {
        draft.prepare_for_write()?;
        self.ensure_email_free(&draft.email, None)?;

        let id = self.next_id;
        let next_id = id.checked_add(1).ok_or_else(|| {
            StorageError::InvalidData("contact id space exhausted".to_string())
        })?;
        let contact = draft.into_contact(id, now);
        self.contacts.insert(id, contact.clone());
        self.next_id = next_id;
        Ok(contact)
    }

    /// Replaces the mutable fields of an existing row.
    ///
    /// `created_at` is always taken from the stored row.
    pub(crate) fn replace(
        &mut self,
        mut contact: Contact,
        now: DateTime<Utc>,
    ) -> RepoResult<Contact> {
        let stored_created_at = self.get(contact.id)?.created_at;
        contact.prepare_for_write()?;
        self.ensure_email_free(&contact.email, Some(contact.id))?;

        contact.created_at = stored_created_at;
        contact.updated_at = now;
        self.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    pub(crate) fn remove(&mut self, id: ContactId) -> RepoResult<Contact> {
        self.contacts
            .remove(&id)
            .ok_or(RepoError::NotFound(ContactLookup::Id(id)))
    }

    fn ensure_email_free(&self, email: &str, owner: Option<ContactId>) -> RepoResult<()> {
        let taken = self
            .contacts
            .values()
            .any(|contact| contact.email == email && Some(contact.id) != owner);
        if taken {
            return Err(RepoError::DuplicateEmail(email.to_string()));
        }
        Ok(())
    }
}

/// Reader/writer lock around a `ContactTable` with poison mapped to
/// `StorageError::Poisoned`.
#[derive(Debug)]
pub(crate) struct LockedTable(RwLock<ContactTable>);

impl LockedTable {
    pub(crate) fn new(table: ContactTable) -> Self {
        Self(RwLock::new(table))
    }

    pub(crate) fn read(&self) -> RepoResult<RwLockReadGuard<'_, ContactTable>> {
        self.0
            .read()
            .map_err(|_| RepoError::Storage(StorageError::Poisoned))
    }

    pub(crate) fn write(&self) -> RepoResult<RwLockWriteGuard<'_, ContactTable>> {
        self.0
            .write()
            .map_err(|_| RepoError::Storage(StorageError::Poisoned))
    }
}
