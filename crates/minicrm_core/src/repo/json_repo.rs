//! JSON-file contact repository.
//!
//! # Responsibility
//! - Keep the in-memory table and lock discipline of the memory backend.
//! - Rewrite the whole contact file after every successful mutation.
//!
//! # Invariants
//! - The file holds one JSON array of contacts in ascending id order.
//! - Mutations are staged on a copy of the table; the live table is only
//!   replaced after the new file has been fully written and renamed into
//!   place. A failed write leaves both the file and the table untouched.
//! - A missing file means an empty store; an unreadable or malformed file
//!   fails construction.

use super::table::{ContactTable, LockedTable};
use super::{ensure_parent_dir, ContactRepository, RepoResult, StorageError};
use crate::model::contact::{Contact, ContactDraft, ContactId};
use chrono::Utc;
use log::{error, info};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

const BACKEND: &str = "json";

/// File-backed repository that persists the full record set on every write.
#[derive(Debug)]
pub struct JsonContactRepository {
    path: PathBuf,
    table: LockedTable,
}

impl JsonContactRepository {
    /// Opens the store at `path`, loading existing records when the file
    /// exists.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let started_at = Instant::now();

        let table = match load_table(&path) {
            Ok(table) => table,
            Err(err) => {
                error!(
                    "event=store_open module=repo backend={BACKEND} status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        info!(
            "event=store_open module=repo backend={BACKEND} status=ok records={} next_id={} duration_ms={}",
            table.len(),
            table.next_id(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            path,
            table: LockedTable::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Id the next created contact will receive.
    pub fn next_id(&self) -> RepoResult<ContactId> {
        Ok(self.table.read()?.next_id())
    }

    fn mutate<T>(
        &self,
        event: &'static str,
        apply: impl FnOnce(&mut ContactTable) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut live = self.table.write()?;
        let mut staged = (*live).clone();
        let output = apply(&mut staged)?;

        if let Err(err) = save_table(&self.path, &staged) {
            error!("event={event} module=repo backend={BACKEND} status=error error={err}");
            return Err(err.into());
        }

        *live = staged;
        Ok(output)
    }
}

impl ContactRepository for JsonContactRepository {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn create(&self, draft: ContactDraft) -> RepoResult<Contact> {
        let contact = self.mutate("contact_create", |table| table.insert(draft, Utc::now()))?;
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
        let contact = self.mutate("contact_update", |table| {
            table.replace(contact, Utc::now())
        })?;
        info!(
            "event=contact_update module=repo backend={BACKEND} status=ok id={}",
            contact.id
        );
        Ok(contact)
    }

    fn delete(&self, id: ContactId) -> RepoResult<()> {
        self.mutate("contact_delete", |table| table.remove(id))?;
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

fn load_table(path: &Path) -> Result<ContactTable, StorageError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ContactTable::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ContactTable::new());
    }

    let records: Vec<Contact> =
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    ContactTable::from_records(records)
}

fn save_table(path: &Path, table: &ContactTable) -> Result<(), StorageError> {
    let io_error = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    ensure_parent_dir(path)?;
    let mut data = serde_json::to_vec_pretty(&table.all()).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    data.push(b'\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(&data).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}
