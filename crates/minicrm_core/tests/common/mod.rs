//! Shared contract checks run against every `ContactRepository` backend.
//!
//! Each function expects a fresh, empty repository.

#![allow(dead_code)]

use minicrm_core::{
    ContactDraft, ContactLookup, ContactRepository, ContactValidationError, RepoError,
};

pub fn draft(name: &str, email: &str, phone: &str) -> ContactDraft {
    ContactDraft::new(name, email, phone)
}

pub fn create_assigns_sequential_ids<R: ContactRepository>(repo: &R) {
    let first = repo.create(draft("Ada", "ada@x.com", "")).unwrap();
    let second = repo.create(draft("Grace", "grace@x.com", "")).unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.created_at, first.updated_at);
}

pub fn create_normalizes_fields<R: ContactRepository>(repo: &R) {
    let created = repo
        .create(draft("  Ada Lovelace ", " ADA@Example.COM ", " 0612345678 "))
        .unwrap();

    assert_eq!(created.name, "Ada Lovelace");
    assert_eq!(created.email, "ada@example.com");
    assert_eq!(created.phone, "0612345678");

    let loaded = repo.get_by_id(created.id).unwrap();
    assert_eq!(loaded.name, created.name);
    assert_eq!(loaded.email, created.email);
    assert_eq!(loaded.phone, created.phone);
}

pub fn create_rejects_invalid_fields<R: ContactRepository>(repo: &R) {
    let cases = [
        (draft("  ", "a@x.com", ""), ContactValidationError::EmptyName),
        (draft("Ada", " ", ""), ContactValidationError::EmptyEmail),
        (
            draft("Ada", "ada.x.com", ""),
            ContactValidationError::InvalidEmail("ada.x.com".to_string()),
        ),
        (
            draft("Ada", "ada@x.com", "0512345678"),
            ContactValidationError::InvalidPhonePrefix("0512345678".to_string()),
        ),
    ];

    for (input, expected) in cases {
        match repo.create(input) {
            Err(RepoError::Validation(err)) => assert_eq!(err, expected),
            other => panic!("expected validation error {expected:?}, got {other:?}"),
        }
    }
    assert!(repo.get_all().unwrap().is_empty());
}

pub fn get_by_id_missing_is_not_found<R: ContactRepository>(repo: &R) {
    let err = repo.get_by_id(42).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(ContactLookup::Id(42))));
}

pub fn get_all_returns_ascending_ids<R: ContactRepository>(repo: &R) {
    for index in 0..5 {
        repo.create(draft(
            &format!("Contact {index}"),
            &format!("c{index}@x.com"),
            "",
        ))
        .unwrap();
    }
    repo.delete(3).unwrap();

    let ids: Vec<_> = repo.get_all().unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);
}

pub fn update_replaces_fields_and_keeps_identity<R: ContactRepository>(repo: &R) {
    let created = repo.create(draft("Ada", "ada@x.com", "")).unwrap();

    let mut changed = created.clone();
    changed.name = " Ada King ".to_string();
    changed.email = "ADA.KING@x.com".to_string();
    changed.phone = "0711111111".to_string();
    let updated = repo.update(changed).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Ada King");
    assert_eq!(updated.email, "ada.king@x.com");
    assert_eq!(updated.phone, "0711111111");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let loaded = repo.get_by_id(created.id).unwrap();
    assert_eq!(loaded.email, "ada.king@x.com");
    assert!(matches!(
        repo.get_by_email("ada@x.com"),
        Err(RepoError::NotFound(_))
    ));
}

pub fn update_missing_is_not_found<R: ContactRepository>(repo: &R) {
    let ghost = draft("Ghost", "ghost@x.com", "").into_contact(99, chrono::Utc::now());
    let err = repo.update(ghost).unwrap_err();

    assert!(matches!(err, RepoError::NotFound(ContactLookup::Id(99))));
    assert!(repo.get_all().unwrap().is_empty());
}

pub fn update_rejects_invalid_fields<R: ContactRepository>(repo: &R) {
    let created = repo.create(draft("Ada", "ada@x.com", "")).unwrap();

    let mut changed = created.clone();
    changed.phone = "0812345678".to_string();
    assert!(matches!(
        repo.update(changed),
        Err(RepoError::Validation(ContactValidationError::InvalidPhonePrefix(_)))
    ));

    assert_eq!(repo.get_by_id(created.id).unwrap().phone, "");
}

pub fn delete_removes_record<R: ContactRepository>(repo: &R) {
    let created = repo.create(draft("Ada", "ada@x.com", "")).unwrap();

    repo.delete(created.id).unwrap();

    assert!(matches!(
        repo.get_by_id(created.id),
        Err(RepoError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete(created.id),
        Err(RepoError::NotFound(ContactLookup::Id(_)))
    ));
}

pub fn ids_are_not_reused_after_delete<R: ContactRepository>(repo: &R) {
    repo.create(draft("Ada", "ada@x.com", "")).unwrap();
    let second = repo.create(draft("Grace", "grace@x.com", "")).unwrap();
    repo.delete(second.id).unwrap();

    let third = repo.create(draft("Alan", "alan@x.com", "")).unwrap();
    assert_eq!(third.id, 3);
}

pub fn get_by_email_matches_stored_email<R: ContactRepository>(repo: &R) {
    let created = repo.create(draft("Ada", "Ada@X.com", "")).unwrap();

    assert_eq!(repo.get_by_email("ada@x.com").unwrap().id, created.id);
    assert!(matches!(
        repo.get_by_email("nobody@x.com"),
        Err(RepoError::NotFound(ContactLookup::Email(email))) if email == "nobody@x.com"
    ));
}

pub fn duplicate_email_is_rejected<R: ContactRepository>(repo: &R) {
    let first = repo.create(draft("Ada", "ada@x.com", "")).unwrap();
    let second = repo.create(draft("Grace", "grace@x.com", "")).unwrap();

    assert!(matches!(
        repo.create(draft("Other Ada", " ADA@x.com", "")),
        Err(RepoError::DuplicateEmail(email)) if email == "ada@x.com"
    ));

    let mut stolen = second.clone();
    stolen.email = first.email.clone();
    assert!(matches!(
        repo.update(stolen),
        Err(RepoError::DuplicateEmail(_))
    ));

    assert_eq!(repo.get_all().unwrap().len(), 2);
    assert_eq!(repo.get_by_id(second.id).unwrap().email, "grace@x.com");
}

/// Runs every contract check, each on a repository from `fresh`.
pub fn run_all<R: ContactRepository>(mut fresh: impl FnMut() -> R) {
    let checks: [fn(&R); 12] = [
        create_assigns_sequential_ids::<R>,
        create_normalizes_fields::<R>,
        create_rejects_invalid_fields::<R>,
        get_by_id_missing_is_not_found::<R>,
        get_all_returns_ascending_ids::<R>,
        update_replaces_fields_and_keeps_identity::<R>,
        update_missing_is_not_found::<R>,
        update_rejects_invalid_fields::<R>,
        delete_removes_record::<R>,
        ids_are_not_reused_after_delete::<R>,
        get_by_email_matches_stored_email::<R>,
        duplicate_email_is_rejected::<R>,
    ];

    for check in checks {
        let repo = fresh();
        check(&repo);
        repo.close().unwrap();
    }
}
