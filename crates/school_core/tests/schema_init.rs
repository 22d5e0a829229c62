use rusqlite::Connection;
use school_core::{ensure_schema, SchemaError};
use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn ensure_schema_creates_table_and_index() {
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_schema(&mut conn).unwrap();

    assert_eq!(object_count(&conn, "table", "schools"), 1);
    assert_eq!(object_count(&conn, "index", "idx_schools_created_at"), 1);
}

#[test]
fn ensure_schema_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school_management.sqlite3");

    let mut conn = Connection::open(&path).unwrap();
    ensure_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO schools (name, address, city, state, contact, email_id)
         VALUES ('Oak', '12 Pine Rd', 'Springfield', 'IL', 5551234567, 'info@oak.edu');",
        [],
    )
    .unwrap();
    ensure_schema(&mut conn).unwrap();
    drop(conn);

    let mut reopened = Connection::open(&path).unwrap();
    ensure_schema(&mut reopened).unwrap();
    assert_eq!(object_count(&reopened, "table", "schools"), 1);
    let rows: i64 = reopened
        .query_row("SELECT count(*) FROM schools;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1, "re-running the initializer must keep existing rows");
}

#[test]
fn created_at_defaults_to_insert_time_in_millis() {
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO schools (name, address, city, state, contact, email_id)
         VALUES ('Oak', '12 Pine Rd', 'Springfield', 'IL', 5551234567, 'info@oak.edu');",
        [],
    )
    .unwrap();

    let created_at: i64 = conn
        .query_row("SELECT created_at FROM schools;", [], |row| row.get(0))
        .unwrap();
    // 2020-01-01T00:00:00Z in epoch milliseconds.
    assert!(created_at > 1_577_836_800_000);
}

#[test]
fn created_at_default_matches_host_clock_to_the_millisecond() {
    let mut conn = Connection::open_in_memory().unwrap();
    ensure_schema(&mut conn).unwrap();

    for _ in 0..500 {
        let before = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        conn.execute(
            "INSERT INTO schools (name, address, city, state, contact, email_id)
             VALUES ('Oak', '12 Pine Rd', 'Springfield', 'IL', 5551234567, 'info@oak.edu');",
            [],
        )
        .unwrap();
        let created_at: i64 = conn
            .query_row(
                "SELECT created_at FROM schools WHERE id = last_insert_rowid();",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(created_at >= before, "created_at {created_at} < {before}");
    }
}

#[test]
fn conflicting_object_named_schools_is_a_schema_error() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE VIEW schools AS SELECT 1 AS id, 0 AS created_at;")
        .unwrap();

    let err = ensure_schema(&mut conn).unwrap_err();
    assert!(matches!(err, SchemaError::Sqlite(_)));
    assert!(!err.is_connectivity());
    assert_eq!(object_count(&conn, "index", "idx_schools_created_at"), 0);
}

fn object_count(conn: &Connection, kind: &str, name: &str) -> i64 {
    conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = ?1 AND name = ?2;",
        [kind, name],
        |row| row.get(0),
    )
    .unwrap()
}
