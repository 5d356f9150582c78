//! Translation of SQLite failures into [`hacksteader_common::Error`].

use hacksteader_common::Error;
use rusqlite::ffi;

/// Sort a rusqlite error into the constraint kinds callers care about.
///
/// Primary-key and unique violations become [`Error::Conflict`], dangling
/// references [`Error::ForeignKey`], and CHECK/NOT NULL failures or values
/// that cannot be decoded [`Error::Validation`]. Everything else is a plain
/// database error.
pub fn from_sqlite(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, msg) = &e {
        let detail = msg.clone().unwrap_or_else(|| failure.to_string());
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                return Error::Conflict(detail)
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Error::ForeignKey(detail),
            ffi::SQLITE_CONSTRAINT_CHECK
            | ffi::SQLITE_CONSTRAINT_NOTNULL
            | ffi::SQLITE_CONSTRAINT_DATATYPE
            | ffi::SQLITE_MISMATCH => return Error::Validation(detail),
            _ => {}
        }
    }

    match e {
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::ToSqlConversionFailure(_) => Error::Validation(e.to_string()),
        other => Error::database(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY NOT NULL);
             CREATE TABLE child (
                 id     TEXT PRIMARY KEY NOT NULL,
                 parent TEXT REFERENCES parent(id),
                 n      INTEGER NOT NULL CHECK (n >= 0)
             );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn primary_key_is_conflict() {
        let conn = conn();
        conn.execute("INSERT INTO parent (id) VALUES ('a')", []).unwrap();
        let err = conn
            .execute("INSERT INTO parent (id) VALUES ('a')", [])
            .map_err(from_sqlite)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "{err}");
    }

    #[test]
    fn dangling_reference_is_foreign_key() {
        let conn = conn();
        let err = conn
            .execute("INSERT INTO child (id, parent, n) VALUES ('c', 'missing', 1)", [])
            .map_err(from_sqlite)
            .unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)), "{err}");
    }

    #[test]
    fn check_failure_is_validation() {
        let conn = conn();
        let err = conn
            .execute("INSERT INTO child (id, parent, n) VALUES ('c', NULL, -1)", [])
            .map_err(from_sqlite)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    #[test]
    fn other_failures_are_database_errors() {
        let conn = conn();
        let err = conn
            .execute("INSERT INTO nowhere (id) VALUES ('x')", [])
            .map_err(from_sqlite)
            .unwrap_err();
        assert!(matches!(err, Error::Database { .. }), "{err}");
    }
}
