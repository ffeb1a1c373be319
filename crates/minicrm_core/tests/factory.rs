use minicrm_core::{
    create_repository, open_backend, supported_types, BackendKind, ContactDraft,
    ContactRepository, FactoryError, RepoError, StorageError,
};

#[test]
fn unsupported_type_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let Err(err) = create_repository("postgres", dir.path().join("contacts.db")) else {
        panic!("postgres should not be a supported storage type");
    };

    assert!(matches!(err, FactoryError::UnsupportedType(ref tag) if tag == "postgres"));
    assert!(err.to_string().contains("memory|json|sqlite"));
}

#[test]
fn every_supported_type_opens_a_working_store() {
    let dir = tempfile::tempdir().unwrap();

    for tag in supported_types() {
        let kind: BackendKind = tag.parse().unwrap();
        let file = kind.default_file_name().unwrap_or("unused");
        let repo = create_repository(tag, dir.path().join(file)).unwrap();

        assert_eq!(repo.backend_name(), *tag);
        let created = repo
            .create(ContactDraft::new("Ada", "ada@x.com", ""))
            .unwrap();
        assert_eq!(repo.get_by_id(created.id).unwrap().email, "ada@x.com");
        repo.close().unwrap();
    }
}

#[test]
fn memory_backend_ignores_path() {
    let repo = open_backend(
        BackendKind::Memory,
        std::path::Path::new("/nonexistent/dir/contacts.json"),
    )
    .unwrap();
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn open_failure_is_wrapped_with_backend_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.json");
    std::fs::write(&path, "not json").unwrap();

    let Err(err) = create_repository("json", &path) else {
        panic!("malformed store file should fail to open");
    };
    match err {
        FactoryError::Open { kind, source } => {
            assert_eq!(kind, BackendKind::Json);
            assert!(matches!(
                source,
                RepoError::Storage(StorageError::Json { .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn legacy_gorm_tag_opens_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.db");

    let repo = create_repository("gorm", &path).unwrap();
    assert_eq!(repo.backend_name(), "sqlite");
    repo.create(ContactDraft::new("Ada", "ada@x.com", "")).unwrap();
    repo.close().unwrap();

    let reopened = create_repository("sqlite", &path).unwrap();
    assert_eq!(reopened.get_all().unwrap().len(), 1);
}
