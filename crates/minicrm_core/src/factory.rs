//! Backend selection from a configuration tag.
//!
//! # Responsibility
//! - Map a storage type tag to one concrete `ContactRepository`.
//! - Keep construction details out of callers.
//!
//! # Invariants
//! - Unknown tags fail with `FactoryError::UnsupportedType`; no fallback.
//! - `gorm` is accepted as an alias of `sqlite`; `supported_types` lists
//!   canonical tags only.
//! - The path argument is ignored for the memory backend.

use crate::repo::json_repo::JsonContactRepository;
use crate::repo::memory_repo::MemoryContactRepository;
use crate::repo::sqlite_repo::SqliteContactRepository;
use crate::repo::{ContactRepository, RepoError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::str::FromStr;

/// Recognized storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Json,
    Sqlite,
}

const SUPPORTED_TYPES: &[&str] = &["memory", "json", "sqlite"];

/// Returns the recognized backend tags.
pub fn supported_types() -> &'static [&'static str] {
    SUPPORTED_TYPES
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }

    /// Store file used when configuration leaves the path empty.
    pub fn default_file_name(self) -> Option<&'static str> {
        match self {
            Self::Memory => None,
            Self::Json => Some("contacts.json"),
            Self::Sqlite => Some("contacts.db"),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = FactoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "json" => Ok(Self::Json),
            // Legacy tag from configs written for the ORM-backed store.
            "sqlite" | "gorm" => Ok(Self::Sqlite),
            _ => Err(FactoryError::UnsupportedType(value.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum FactoryError {
    UnsupportedType(String),
    Open {
        kind: BackendKind,
        source: RepoError,
    },
}

impl Display for FactoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedType(value) => write!(
                f,
                "unsupported storage type `{value}`; expected {}",
                SUPPORTED_TYPES.join("|")
            ),
            Self::Open { kind, source } => write!(f, "failed to open {kind} store: {source}"),
        }
    }
}

impl Error for FactoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnsupportedType(_) => None,
            Self::Open { source, .. } => Some(source),
        }
    }
}

/// Constructs the backend named by `storage_type`.
pub fn create_repository(
    storage_type: &str,
    file_path: impl AsRef<Path>,
) -> Result<Box<dyn ContactRepository>, FactoryError> {
    let kind = storage_type.parse::<BackendKind>()?;
    open_backend(kind, file_path.as_ref())
}

/// Constructs a backend from an already parsed kind.
pub fn open_backend(
    kind: BackendKind,
    file_path: &Path,
) -> Result<Box<dyn ContactRepository>, FactoryError> {
    let opened: Result<Box<dyn ContactRepository>, RepoError> = match kind {
        BackendKind::Memory => Ok(Box::new(MemoryContactRepository::new())),
        BackendKind::Json => JsonContactRepository::open(file_path)
            .map(|repo| Box::new(repo) as Box<dyn ContactRepository>),
        BackendKind::Sqlite => SqliteContactRepository::open(file_path)
            .map(|repo| Box::new(repo) as Box<dyn ContactRepository>),
    };

    match opened {
        Ok(repo) => {
            info!("event=backend_select module=factory status=ok backend={kind}");
            Ok(repo)
        }
        Err(source) => {
            error!(
                "event=backend_select module=factory status=error backend={kind} error={source}"
            );
            Err(FactoryError::Open { kind, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{supported_types, BackendKind, FactoryError};

    #[test]
    fn parses_known_tags_case_insensitively() {
        assert_eq!(" JSON ".parse::<BackendKind>().unwrap(), BackendKind::Json);
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!("Sqlite".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
    }

    #[test]
    fn gorm_is_an_alias_for_sqlite() {
        assert_eq!("gorm".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert_eq!(" GORM".parse::<BackendKind>().unwrap().as_str(), "sqlite");
        assert!(!supported_types().contains(&"gorm"));
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "postgres".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, FactoryError::UnsupportedType(tag) if tag == "postgres"));
    }

    #[test]
    fn every_supported_tag_round_trips_through_as_str() {
        for tag in supported_types() {
            assert_eq!(tag.parse::<BackendKind>().unwrap().as_str(), *tag);
        }
    }
}
