//! SQLite-backed contact repository.
//!
//! # Responsibility
//! - Persist contacts as rows of the `contacts` table.
//! - Map engine constraint/not-found outcomes to contract errors.
//!
//! # Invariants
//! - `prepare_for_write` runs at the start of every insert and update path.
//! - Email uniqueness is also enforced by `idx_contacts_email`.
//! - `AUTOINCREMENT` keeps ids from being reused after deletes.
//! - Read paths reject invalid persisted rows instead of masking them.

use super::{
    ensure_parent_dir, ContactLookup, ContactRepository, RepoError, RepoResult, StorageError,
};
use crate::db::{open_db, open_db_in_memory};
use crate::model::contact::{Contact, ContactDraft, ContactId};
use chrono::Utc;
use log::{error, info};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

const BACKEND: &str = "sqlite";

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    phone,
    created_at,
    updated_at
FROM contacts";

/// Repository over one SQLite connection.
///
/// The mutex makes the `!Sync` connection handle shareable. Every call,
/// reads included, holds it for the whole statement, so operations on one
/// repository run one at a time; unlike the `RwLock` backends there are no
/// concurrent readers.
pub struct SqliteContactRepository {
    conn: Mutex<Option<Connection>>,
}

impl SqliteContactRepository {
    /// Opens (creating if absent) the database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
        }
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        let guard = self
            .conn
            .lock()
            .map_err(|_| RepoError::Storage(StorageError::Poisoned))?;
        let conn = guard
            .as_ref()
            .ok_or(RepoError::Storage(StorageError::Closed))?;
        op(conn)
    }
}

impl ContactRepository for SqliteContactRepository {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    fn create(&self, mut draft: ContactDraft) -> RepoResult<Contact> {
        draft.prepare_for_write()?;
        let now = Utc::now();

        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (name, email, phone, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4);",
                params![draft.name, draft.email, draft.phone, now],
            )
            .map_err(|err| map_write_error(err, &draft.email))?;
            from_sql_id(conn.last_insert_rowid())
        })?;

        info!("event=contact_create module=repo backend={BACKEND} status=ok id={id}");
        Ok(draft.into_contact(id, now))
    }

    fn get_by_id(&self, id: ContactId) -> RepoResult<Contact> {
        let not_found = || RepoError::NotFound(ContactLookup::Id(id));
        let Some(sql_id) = to_sql_id(id) else {
            return Err(not_found());
        };

        self.with_conn(|conn| select_by_id(conn, sql_id))?
            .ok_or_else(not_found)
    }

    fn get_all(&self) -> RepoResult<Vec<Contact>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut contacts = Vec::new();
            while let Some(row) = rows.next()? {
                contacts.push(parse_contact_row(row)?);
            }
            Ok(contacts)
        })
    }

    fn update(&self, mut contact: Contact) -> RepoResult<Contact> {
        let not_found = RepoError::NotFound(ContactLookup::Id(contact.id));
        let Some(sql_id) = to_sql_id(contact.id) else {
            return Err(not_found);
        };

        let updated = self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM contacts WHERE id = ?1);",
                [sql_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(not_found);
            }

            contact.prepare_for_write()?;
            let changed = conn
                .execute(
                    "UPDATE contacts
                     SET
                        name = ?1,
                        email = ?2,
                        phone = ?3,
                        updated_at = ?4
                     WHERE id = ?5;",
                    params![contact.name, contact.email, contact.phone, Utc::now(), sql_id],
                )
                .map_err(|err| map_write_error(err, &contact.email))?;
            if changed == 0 {
                return Err(RepoError::NotFound(ContactLookup::Id(contact.id)));
            }

            select_by_id(conn, sql_id)?.ok_or(RepoError::Storage(StorageError::InvalidData(
                format!("contact {} missing after update", contact.id),
            )))
        })?;

        info!(
            "event=contact_update module=repo backend={BACKEND} status=ok id={}",
            updated.id
        );
        Ok(updated)
    }

    fn delete(&self, id: ContactId) -> RepoResult<()> {
        let Some(sql_id) = to_sql_id(id) else {
            return Err(RepoError::NotFound(ContactLookup::Id(id)));
        };

        let changed =
            self.with_conn(|conn| Ok(conn.execute("DELETE FROM contacts WHERE id = ?1;", [sql_id])?))?;
        if changed == 0 {
            return Err(RepoError::NotFound(ContactLookup::Id(id)));
        }

        info!("event=contact_delete module=repo backend={BACKEND} status=ok id={id}");
        Ok(())
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Contact> {
        let found = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{CONTACT_SELECT_SQL} WHERE email = ?1;"))?;
            let mut rows = stmt.query([email])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_contact_row(row)?)),
                None => Ok(None),
            }
        })?;

        found.ok_or_else(|| RepoError::NotFound(ContactLookup::Email(email.to_string())))
    }

    fn close(&self) -> RepoResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| RepoError::Storage(StorageError::Poisoned))?;
        let Some(conn) = guard.take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=store_close module=repo backend={BACKEND} status=ok");
                Ok(())
            }
            Err((conn, err)) => {
                error!("event=store_close module=repo backend={BACKEND} status=error error={err}");
                *guard = Some(conn);
                Err(err.into())
            }
        }
    }
}

fn select_by_id(conn: &Connection, sql_id: i64) -> RepoResult<Option<Contact>> {
    let row = conn
        .query_row(
            &format!("{CONTACT_SELECT_SQL} WHERE id = ?1;"),
            [sql_id],
            |row| Ok(parse_contact_row(row)),
        )
        .optional()?;
    row.transpose()
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let contact = Contact {
        id: from_sql_id(row.get("id")?)?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    contact.validate().map_err(|err| {
        RepoError::Storage(StorageError::InvalidData(format!(
            "contacts row {}: {err}",
            contact.id
        )))
    })?;
    Ok(contact)
}

fn map_write_error(err: rusqlite::Error, email: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateEmail(email.to_string())
        }
        _ => err.into(),
    }
}

fn to_sql_id(id: ContactId) -> Option<i64> {
    i64::try_from(id).ok()
}

fn from_sql_id(value: i64) -> RepoResult<ContactId> {
    ContactId::try_from(value)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            RepoError::Storage(StorageError::InvalidData(format!(
                "invalid contact id `{value}` in contacts.id"
            )))
        })
}
