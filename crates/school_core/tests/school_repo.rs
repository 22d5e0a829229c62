use rusqlite::Connection;
use school_core::{
    ensure_schema, MemorySchoolStore, NewSchool, RepoError, SchoolRepository,
    SqliteSchoolRepository,
};

fn open() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_schema(&mut conn).unwrap();
    conn
}

fn school(name: &str) -> NewSchool {
    NewSchool::new(
        name,
        "12 Pine Rd",
        "Springfield",
        "IL",
        5_551_234_567,
        "info@oak.edu",
    )
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open();
    let repo = SqliteSchoolRepository::new(&conn);

    let input = school("Oak Elementary").with_image("/schoolImages/oak.png");
    let id = repo.create_school(&input).unwrap();

    let loaded = repo.get_school(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.name, "Oak Elementary");
    assert_eq!(loaded.contact, 5_551_234_567);
    assert_eq!(loaded.image.as_deref(), Some("/schoolImages/oak.png"));
    assert!(loaded.created_at > 0);
}

#[test]
fn get_missing_returns_none() {
    let conn = open();
    let repo = SqliteSchoolRepository::new(&conn);
    assert!(repo.get_school(42).unwrap().is_none());
}

#[test]
fn list_is_newest_first() {
    let conn = open();
    let repo = SqliteSchoolRepository::new(&conn);

    let a = repo.create_school(&school("A")).unwrap();
    let b = repo.create_school(&school("B")).unwrap();
    let c = repo.create_school(&school("C")).unwrap();
    assert!(a < b && b < c);

    let ids: Vec<i64> = repo
        .list_schools()
        .unwrap()
        .iter()
        .map(|school| school.id)
        .collect();
    assert_eq!(ids, vec![c, b, a]);
}

#[test]
fn list_orders_by_created_at_before_id() {
    let conn = open();
    let repo = SqliteSchoolRepository::new(&conn);

    let older = repo.create_school(&school("Older")).unwrap();
    let newer = repo.create_school(&school("Newer")).unwrap();
    conn.execute("UPDATE schools SET created_at = 1000 WHERE id = ?1;", [newer])
        .unwrap();
    conn.execute("UPDATE schools SET created_at = 2000 WHERE id = ?1;", [older])
        .unwrap();

    let names: Vec<String> = repo
        .list_schools()
        .unwrap()
        .into_iter()
        .map(|school| school.name)
        .collect();
    assert_eq!(names, vec!["Older", "Newer"]);
}

#[test]
fn deleted_ids_are_not_reused() {
    let conn = open();
    let repo = SqliteSchoolRepository::new(&conn);

    repo.create_school(&school("A")).unwrap();
    let b = repo.create_school(&school("B")).unwrap();
    assert!(repo.delete_school(b).unwrap());
    assert!(!repo.delete_school(b).unwrap());

    let c = repo.create_school(&school("C")).unwrap();
    assert!(c > b);
}

#[test]
fn validation_failure_blocks_create() {
    let conn = open();
    let repo = SqliteSchoolRepository::new(&conn);

    let mut bad = school("A");
    bad.contact = -1;
    let err = repo.create_school(&bad).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.list_schools().unwrap().is_empty());
}

#[test]
fn invalid_persisted_row_is_reported() {
    let conn = open();
    conn.execute(
        "INSERT INTO schools (name, address, city, state, contact, email_id)
         VALUES ('', 'x', 'y', 'z', 5551234567, 'a@b.co');",
        [],
    )
    .unwrap();

    let repo = SqliteSchoolRepository::new(&conn);
    let err = repo.list_schools().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
    assert!(!err.is_connectivity());
}

#[test]
fn both_backends_share_one_crud_surface() {
    let conn = open();
    let sqlite = SqliteSchoolRepository::new(&conn);
    let memory = MemorySchoolStore::new();
    let backends: [&dyn SchoolRepository; 2] = [&sqlite, &memory];

    for repo in backends {
        let id = repo.create_school(&school("Shared")).unwrap();
        assert_eq!(repo.get_school(id).unwrap().unwrap().name, "Shared");
        assert_eq!(repo.list_schools().unwrap().len(), 1);
        assert!(repo.delete_school(id).unwrap());
        assert!(repo.list_schools().unwrap().is_empty());
    }
}
