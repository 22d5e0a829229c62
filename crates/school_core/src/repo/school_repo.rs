//! SQLite implementation of the school repository.
//!
//! # Responsibility
//! - Map `SchoolRepository` calls onto the `schools` table.
//!
//! # Invariants
//! - `created_at` always comes from the column default, never from callers.
//! - Read paths reject invalid persisted rows instead of masking them.

use super::{RepoError, RepoResult, SchoolRepository};
use crate::model::school::{normalize_image, NewSchool, School, SchoolId, MAX_CONTACT};
use rusqlite::{params, Connection, Row};

const SCHOOL_SELECT_SQL: &str = "SELECT
    id,
    name,
    address,
    city,
    state,
    contact,
    image,
    email_id,
    created_at
FROM schools";

/// SQLite-backed school repository.
pub struct SqliteSchoolRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSchoolRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SchoolRepository for SqliteSchoolRepository<'_> {
    fn create_school(&self, school: &NewSchool) -> RepoResult<SchoolId> {
        school.validate()?;

        self.conn.execute(
            "INSERT INTO schools (
                name,
                address,
                city,
                state,
                contact,
                image,
                email_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                school.name.as_str(),
                school.address.as_str(),
                school.city.as_str(),
                school.state.as_str(),
                school.contact,
                normalize_image(school.image.clone()),
                school.email_id.as_str(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_schools(&self) -> RepoResult<Vec<School>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SCHOOL_SELECT_SQL} ORDER BY created_at DESC, id DESC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut schools = Vec::new();
        while let Some(row) = rows.next()? {
            schools.push(parse_school_row(row)?);
        }

        Ok(schools)
    }

    fn get_school(&self, id: SchoolId) -> RepoResult<Option<School>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SCHOOL_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_school_row(row)?));
        }

        Ok(None)
    }

    fn delete_school(&self, id: SchoolId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM schools WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn parse_school_row(row: &Row<'_>) -> RepoResult<School> {
    let id: SchoolId = row.get("id")?;

    let contact: i64 = row.get("contact")?;
    if !(0..=MAX_CONTACT).contains(&contact) {
        return Err(RepoError::InvalidData(format!(
            "invalid contact `{contact}` in schools.contact for id {id}"
        )));
    }

    let school = School {
        id,
        name: required_text(row, "name", id)?,
        address: required_text(row, "address", id)?,
        city: required_text(row, "city", id)?,
        state: required_text(row, "state", id)?,
        contact,
        email_id: required_text(row, "email_id", id)?,
        image: normalize_image(row.get("image")?),
        created_at: row.get("created_at")?,
    };
    Ok(school)
}

fn required_text(row: &Row<'_>, column: &str, id: SchoolId) -> RepoResult<String> {
    let value: String = row.get(column)?;
    if value.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty value in schools.{column} for id {id}"
        )));
    }
    Ok(value)
}
