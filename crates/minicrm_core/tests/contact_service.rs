use minicrm_core::{
    create_repository, ContactLookup, ContactRepository, ContactService, ErrorKind,
    JsonContactRepository, MemoryContactRepository, ServiceError, SqliteContactRepository,
};
use tempfile::TempDir;

fn for_each_backend(check: impl Fn(ContactService<Box<dyn ContactRepository>>)) {
    let dir = TempDir::new().unwrap();
    let backends: Vec<Box<dyn ContactRepository>> = vec![
        Box::new(MemoryContactRepository::new()),
        Box::new(JsonContactRepository::open(dir.path().join("contacts.json")).unwrap()),
        Box::new(SqliteContactRepository::open(dir.path().join("contacts.db")).unwrap()),
    ];

    for repo in backends {
        let service = ContactService::new(repo);
        check(service);
    }
}

#[test]
fn full_lifecycle_on_every_backend() {
    for_each_backend(|service| {
        let backend = service.repository().backend_name();

        let ada = service
            .create_contact("Ada Lovelace", "ada@example.com", "0612345678")
            .unwrap();
        assert_eq!(ada.id, 1, "backend {backend}");

        let listed = service.list_contacts().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "ada@example.com");

        let found = service.search_by_email(" ADA@Example.com ").unwrap();
        assert_eq!(found.id, ada.id);

        let updated = service
            .update_contact(ada.id, "Ada King", "ada@example.com", "0712345678")
            .unwrap();
        assert_eq!(updated.name, "Ada King");
        assert_eq!(updated.phone, "0712345678");
        assert_eq!(updated.created_at, ada.created_at);
        assert_eq!(service.get_contact(ada.id).unwrap().name, "Ada King");

        service.delete_contact(ada.id).unwrap();
        assert!(service.list_contacts().unwrap().is_empty());

        let err = service.get_contact(ada.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "backend {backend}");

        service.close().unwrap();
    });
}

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    for_each_backend(|service| {
        service
            .create_contact("Ada", "ada@example.com", "")
            .unwrap();

        let err = service
            .create_contact("Imposter", "  ADA@EXAMPLE.COM", "")
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail(ref email) if email == "ada@example.com"));
        assert_eq!(err.kind(), ErrorKind::DuplicateEmail);
        assert_eq!(service.list_contacts().unwrap().len(), 1);
    });
}

#[test]
fn update_may_keep_own_email_but_not_take_another() {
    for_each_backend(|service| {
        let ada = service.create_contact("Ada", "ada@x.com", "").unwrap();
        let grace = service.create_contact("Grace", "grace@x.com", "").unwrap();

        service
            .update_contact(ada.id, "Ada Lovelace", "ADA@x.com", "")
            .unwrap();

        let err = service
            .update_contact(grace.id, "Grace", "ada@x.com", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateEmail);
        assert_eq!(service.get_contact(grace.id).unwrap().email, "grace@x.com");
    });
}

#[test]
fn missing_targets_report_operation_context() {
    for_each_backend(|service| {
        service.create_contact("Ada", "ada@x.com", "").unwrap();

        let err = service
            .update_contact(999, "Nobody", "nobody@x.com", "")
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                operation: "update contact",
                lookup: ContactLookup::Id(999),
            }
        ));
        assert!(err.to_string().contains("update contact"));

        let err = service.delete_contact(999).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                operation: "delete contact",
                ..
            }
        ));

        let err = service.search_by_email("nobody@x.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(service.list_contacts().unwrap().len(), 1);
    });
}

#[test]
fn validation_errors_surface_before_storage() {
    for_each_backend(|service| {
        for (name, email, phone) in [
            ("", "a@x.com", ""),
            ("Ada", "", ""),
            ("Ada", "not-an-email", ""),
            ("Ada", "ada@x.com", "0123"),
        ] {
            let err = service.create_contact(name, email, phone).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        let ada = service.create_contact("Ada", "ada@x.com", "").unwrap();
        let err = service
            .update_contact(ada.id, "Ada", "ada@x.com", "+33612345678")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(service.list_contacts().unwrap().len() == 1);
    });
}

#[test]
fn factory_built_repository_drives_the_service() {
    let dir = TempDir::new().unwrap();
    let repo = create_repository("JSON", dir.path().join("crm").join("contacts.json")).unwrap();
    let service = ContactService::new(repo);

    service.create_contact("Ada", "ada@x.com", "").unwrap();
    service.close().unwrap();

    let reopened = ContactService::new(
        create_repository("json", dir.path().join("crm").join("contacts.json")).unwrap(),
    );
    assert_eq!(reopened.list_contacts().unwrap().len(), 1);
}

#[test]
fn uppercase_email_is_stored_normalized_and_self_update_is_allowed() {
    for_each_backend(|service| {
        let ada = service
            .create_contact("Ada Lovelace", "ADA@X.COM", "")
            .unwrap();
        assert_eq!(ada.email, "ada@x.com");
        assert_eq!(ada.created_at, ada.updated_at);

        service
            .update_contact(ada.id, "Ada Lovelace", "ada@x.com", "")
            .unwrap();

        let grace = service
            .create_contact("Grace Hopper", "grace@x.com", "")
            .unwrap();
        let err = service
            .update_contact(ada.id, "Ada Lovelace", "GRACE@x.com", "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateEmail);
        assert_eq!(service.search_by_email("grace@x.com").unwrap().id, grace.id);
    });
}
