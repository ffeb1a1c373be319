//! In-memory contact repository.
//!
//! # Responsibility
//! - Reference implementation of `ContactRepository` with no durability.
//!
//! # Invariants
//! - Reads take the shared lock, mutations the exclusive lock, each held for
//!   the full operation.
//! - State is dropped with the repository.

use super::table::{ContactTable, LockedTable};
use super::{ContactRepository, RepoResult};
use crate::model::contact::{Contact, ContactDraft, ContactId};
use chrono::Utc;
use log::info;

const BACKEND: &str = "memory";

/// Map-backed repository guarded by one reader/writer lock.
#[derive(Debug)]
pub struct MemoryContactRepository {
    table: LockedTable,
}

impl Default for MemoryContactRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContactRepository {
    pub fn new() -> Self {
        Self {
            table: LockedTable::new(ContactTable::new()),
        }
    }

    /// Number of stored contacts.
    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.table.read()?.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl ContactRepository for MemoryContactRepository {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn create(&self, draft: ContactDraft) -> RepoResult<Contact> {
        let contact = self.table.write()?.insert(draft, Utc::now())?;
        info!(
            "event=contact_create module=repo backend={BACKEND} status=ok id={}",
            contact.id
        );
        Ok(contact)
    }

    fn get_by_id(&self, id: ContactId) -> RepoResult<Contact> {
        self.table.read()?.get(id)
    }

    fn get_all(&self) -> RepoResult<Vec<Contact>> {
        Ok(self.table.read()?.all())
    }

    fn update(&self, contact: Contact) -> RepoResult<Contact> {
        let contact = self.table.write()?.replace(contact, Utc::now())?;
        info!(
            "event=contact_update module=repo backend={BACKEND} status=ok id={}",
            contact.id
        );
        Ok(contact)
    }

    fn delete(&self, id: ContactId) -> RepoResult<()> {
        self.table.write()?.remove(id)?;
        info!("event=contact_delete module=repo backend={BACKEND} status=ok id={id}");
        Ok(())
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Contact> {
        self.table.read()?.find_by_email(email)
    }

    fn close(&self) -> RepoResult<()> {
        Ok(())
    }
}
