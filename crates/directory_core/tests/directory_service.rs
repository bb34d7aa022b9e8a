use directory_core::db::open_db_in_memory;
use directory_core::{
    ClientData, ClientFilter, ConstraintKind, DirectoryService, ServiceError,
    SqliteClientRepository,
};

#[test]
fn service_wraps_repository_calls() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&mut conn).unwrap();
    let mut service = DirectoryService::new(repo);

    let id = service
        .add_client(&ClientData::new("Anna", "Ivanova", "a@x.com"), ["111", "222"])
        .unwrap();
    assert_eq!(service.add_phone(id, "333").unwrap(), 1);
    assert_eq!(service.add_phone(id, None::<&str>).unwrap(), 0);

    let phones = service.list_phones(id).unwrap();
    assert_eq!(phones.len(), 3);

    let rows = service
        .find_clients(&ClientFilter::new().email("a@x.com"))
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[test]
fn update_client_reports_missing_client() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&mut conn).unwrap();
    let mut service = DirectoryService::new(repo);
    let id = service
        .add_client(&ClientData::new("Petr", "Petrov", "p@x.com"), None::<&str>)
        .unwrap();

    service
        .update_client(id, &ClientData::new("Petr", "Sidorov", "p@x.com"))
        .unwrap();
    assert_eq!(
        service.get_client(id).unwrap().unwrap().last_name.as_deref(),
        Some("Sidorov")
    );

    let err = service
        .update_client(id + 100, &ClientData::new("X", "Y", "z@x.com"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::ClientNotFound(missing) if missing == id + 100));
}

#[test]
fn remove_operations_report_whether_anything_matched() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&mut conn).unwrap();
    let mut service = DirectoryService::new(repo);
    let id = service
        .add_client(&ClientData::new("Anna", "Ivanova", "a@x.com"), "111")
        .unwrap();

    assert!(service.remove_phone(id, "111").unwrap());
    assert!(!service.remove_phone(id, "111").unwrap());
    assert!(service.remove_client(id).unwrap());
    assert!(!service.remove_client(id).unwrap());
    assert!(service.get_client(id).unwrap().is_none());
}

#[test]
fn constraint_violations_pass_through_the_service() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&mut conn).unwrap();
    let mut service = DirectoryService::new(repo);

    let err = service.add_phone(99, "00000").unwrap_err();
    match err {
        ServiceError::Repo(repo_err) => {
            assert_eq!(repo_err.constraint_kind(), Some(ConstraintKind::ForeignKey));
        }
        other => panic!("unexpected error: {other}"),
    }
}
