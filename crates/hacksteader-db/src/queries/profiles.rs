//! Profile CRUD operations and progression updates.

use chrono::{DateTime, Utc};
use hacksteader_common::{Error, Result};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::{to_sql_int, to_sql_time, Profile};

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (joined, last_active, last_farm, id, xp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            to_sql_time(&profile.joined),
            to_sql_time(&profile.last_active),
            to_sql_time(&profile.last_farm),
            profile.id,
            to_sql_int(profile.xp, "profile xp")?,
        ],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    let result = conn.query_row(
        "SELECT joined, last_active, last_farm, id, xp FROM profiles WHERE id = ?1",
        [id],
        Profile::from_row,
    );
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(from_sqlite(e)),
    }
}

/// All profiles, most experienced first.
pub fn list_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn
        .prepare("SELECT joined, last_active, last_farm, id, xp FROM profiles ORDER BY xp DESC, id")
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([], Profile::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

pub fn update_profile(conn: &Connection, profile: &Profile) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE profiles SET joined = ?1, last_active = ?2, last_farm = ?3, xp = ?4
             WHERE id = ?5",
            rusqlite::params![
                to_sql_time(&profile.joined),
                to_sql_time(&profile.last_active),
                to_sql_time(&profile.last_farm),
                to_sql_int(profile.xp, "profile xp")?,
                profile.id,
            ],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Add `amount` xp to a profile and return the new total.
///
/// A gain that would push the total past `i64::MAX` is refused and the row
/// is left as it was.
pub fn add_xp(conn: &Connection, id: &str, amount: u64) -> Result<u64> {
    let result = conn.query_row(
        "UPDATE profiles SET xp = xp + ?1
         WHERE id = ?2 AND xp <= 9223372036854775807 - ?1
         RETURNING xp",
        rusqlite::params![to_sql_int(amount, "xp gain")?, id],
        |row| row.get::<_, i64>(0),
    );
    match result {
        Ok(xp) => u64::try_from(xp).map_err(|_| Error::validation(format!("xp {xp} is negative"))),
        Err(rusqlite::Error::QueryReturnedNoRows) => match get_profile(conn, id)? {
            Some(profile) => Err(Error::validation(format!(
                "xp {} plus {} is out of range for profile {}",
                profile.xp, amount, id
            ))),
            None => Err(Error::not_found("profile", id)),
        },
        Err(e) => Err(from_sqlite(e)),
    }
}

/// Mark a profile active at `now`; `farmed` also moves `last_farm`.
pub fn touch(conn: &Connection, id: &str, now: DateTime<Utc>, farmed: bool) -> Result<bool> {
    let sql = if farmed {
        "UPDATE profiles SET last_active = ?1, last_farm = ?1 WHERE id = ?2"
    } else {
        "UPDATE profiles SET last_active = ?1 WHERE id = ?2"
    };
    let n = conn
        .execute(sql, rusqlite::params![to_sql_time(&now), id])
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Delete a profile. Fails with a foreign key error while a hacksteader
/// still points at it.
pub fn delete_profile(conn: &Connection, id: &str) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM profiles WHERE id = ?1", [id])
        .map_err(from_sqlite)?;
    Ok(n > 0)
}
