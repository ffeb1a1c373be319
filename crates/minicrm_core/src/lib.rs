//! Core contact-management logic for Mini CRM.
//! This crate owns every contact invariant; callers only see the service
//! and repository contracts.

pub mod config;
pub mod db;
pub mod factory;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use factory::{create_repository, open_backend, supported_types, BackendKind, FactoryError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::contact::{Contact, ContactDraft, ContactId, ContactValidationError};
pub use repo::json_repo::JsonContactRepository;
pub use repo::memory_repo::MemoryContactRepository;
pub use repo::sqlite_repo::SqliteContactRepository;
pub use repo::{ContactLookup, ContactRepository, RepoError, RepoResult, StorageError};
pub use service::contact_service::{ContactService, ErrorKind, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
