//! Defines the core data model and database queries for registered patients.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Patient search requires at least this many characters so a lookup never
/// scans the whole directory.
const MIN_SEARCH_LENGTH: usize = 3;

/// The maximum number of rows a patient search returns.
const SEARCH_LIMIT: u32 = 10;

// ============================================================================
// MODELS
// ============================================================================

/// A national identity number (NIK): the 16 character primary key of a
/// patient record, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nik(String);

impl Nik {
    /// Create a NIK.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidNik] if `nik` is not exactly 16 characters.
    pub fn new(nik: &str) -> Result<Self, Error> {
        let nik = nik.trim();

        if nik.chars().count() != 16 {
            Err(Error::InvalidNik(nik.to_string()))
        } else {
            Ok(Self(nik.to_string()))
        }
    }

    /// Create a NIK without validation.
    ///
    /// The caller should ensure that the string is exactly 16 characters.
    /// This function has `_unchecked` in the name but is not `unsafe`: if the
    /// length invariant is violated the record will not join against
    /// registered patients, but memory safety is unaffected.
    pub fn new_unchecked(nik: &str) -> Self {
        Self(nik.to_string())
    }

    /// The NIK as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Nik {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Nik {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Nik::new(&value)
    }
}

impl From<Nik> for String {
    fn from(value: Nik) -> Self {
        value.0
    }
}

impl ToSql for Nik {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Nik {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Nik)
    }
}

/// A registered patient record keyed by national identity number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pasien {
    /// The patient's NIK.
    pub nik: Nik,
    /// The patient's full name.
    pub nama: String,
    /// The patient's home address.
    pub alamat: String,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Register a new patient.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateNik] if the NIK is already registered,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_pasien(pasien: &Pasien, connection: &Connection) -> Result<Pasien, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(
            "INSERT INTO pasien (nik, nama, alamat, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING nik, nama, alamat",
        )?
        .query_one(
            (&pasien.nik, &pasien.nama, &pasien.alamat, now),
            map_pasien_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
                },
                _,
            ) => Error::DuplicateNik(pasien.nik.to_string()),
            error => error.into(),
        })
}

/// Retrieve a patient from the database by their NIK.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `nik` does not refer to a registered patient,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_pasien(nik: &Nik, connection: &Connection) -> Result<Pasien, Error> {
    let pasien = connection
        .prepare("SELECT nik, nama, alamat FROM pasien WHERE nik = :nik")?
        .query_one(&[(":nik", nik)], map_pasien_row)?;

    Ok(pasien)
}

/// Search registered patients with a substring match against NIK or name.
///
/// Queries shorter than three characters return an empty result set, and at
/// most ten rows are returned.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn search_pasien(query: &str, connection: &Connection) -> Result<Vec<Pasien>, Error> {
    let query = query.trim();

    if query.chars().count() < MIN_SEARCH_LENGTH {
        return Ok(Vec::new());
    }

    let pattern = format!("%{query}%");

    connection
        .prepare(
            "SELECT nik, nama, alamat FROM pasien
             WHERE nik LIKE :pattern OR nama LIKE :pattern
             ORDER BY nama
             LIMIT :limit",
        )?
        .query_map(
            rusqlite::named_params! {":pattern": pattern, ":limit": SEARCH_LIMIT},
            map_pasien_row,
        )?
        .map(|maybe_pasien| maybe_pasien.map_err(Error::from))
        .collect()
}

/// Create the pasien table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn create_pasien_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS pasien (
                nik TEXT PRIMARY KEY CHECK (length(nik) = 16),
                nama TEXT NOT NULL,
                alamat TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Pasien].
pub fn map_pasien_row(row: &Row) -> Result<Pasien, rusqlite::Error> {
    Ok(Pasien {
        nik: row.get(0)?,
        nama: row.get(1)?,
        alamat: row.get(2)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{Nik, Pasien, create_pasien, get_pasien, search_pasien};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn test_pasien(nik: &str, nama: &str) -> Pasien {
        Pasien {
            nik: Nik::new_unchecked(nik),
            nama: nama.to_owned(),
            alamat: "Jl. Merdeka No. 1".to_owned(),
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let conn = get_test_connection();
        let pasien = test_pasien("3201234567890001", "Budi Santoso");

        create_pasien(&pasien, &conn).unwrap();
        let selected = get_pasien(&pasien.nik, &conn).unwrap();

        assert_eq!(selected, pasien);
    }

    #[test]
    fn create_fails_on_duplicate_nik() {
        let conn = get_test_connection();
        let pasien = test_pasien("3201234567890001", "Budi Santoso");
        create_pasien(&pasien, &conn).unwrap();

        let duplicate = create_pasien(&test_pasien("3201234567890001", "Siti Aminah"), &conn);

        assert_eq!(
            duplicate,
            Err(Error::DuplicateNik("3201234567890001".to_owned()))
        );
    }

    #[test]
    fn search_requires_three_characters() {
        let conn = get_test_connection();
        create_pasien(&test_pasien("3201234567890001", "Budi Santoso"), &conn).unwrap();

        assert_eq!(search_pasien("Bu", &conn).unwrap(), Vec::new());
        assert_eq!(search_pasien("", &conn).unwrap(), Vec::new());
        assert_eq!(search_pasien("Bud", &conn).unwrap().len(), 1);
    }

    #[test]
    fn search_matches_nik_substring() {
        let conn = get_test_connection();
        create_pasien(&test_pasien("3201234567890001", "Budi Santoso"), &conn).unwrap();
        create_pasien(&test_pasien("3579876543210002", "Siti Aminah"), &conn).unwrap();

        let results = search_pasien("357987", &conn).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].nama, "Siti Aminah");
    }

    #[test]
    fn search_caps_result_size() {
        let conn = get_test_connection();
        for i in 0..15 {
            let nik = format!("32012345678900{i:02}");
            create_pasien(&test_pasien(&nik, "Budi Santoso"), &conn).unwrap();
        }

        let results = search_pasien("Budi", &conn).unwrap();

        assert_eq!(results.len(), 10);
    }
}
