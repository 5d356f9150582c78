//! Craft CRUD operations.

use hacksteader_common::{CraftId, Result};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::Craft;

/// Insert a craft row.
pub fn insert_craft(conn: &Connection, craft: &Craft) -> Result<()> {
    conn.execute(
        "INSERT INTO crafts (id, until_finish, total_cycles, destroys_plant, makes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            craft.id.to_string(),
            craft.until_finish,
            craft.total_cycles,
            craft.destroys_plant,
            craft.makes,
        ],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

pub fn get_craft(conn: &Connection, id: CraftId) -> Result<Option<Craft>> {
    let result = conn.query_row(
        "SELECT id, until_finish, total_cycles, destroys_plant, makes FROM crafts WHERE id = ?1",
        [id.to_string()],
        Craft::from_row,
    );
    match result {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(from_sqlite(e)),
    }
}

pub fn list_crafts(conn: &Connection) -> Result<Vec<Craft>> {
    let mut stmt = conn
        .prepare("SELECT id, until_finish, total_cycles, destroys_plant, makes FROM crafts ORDER BY id")
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([], Craft::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Overwrite every column of an existing craft. Returns false if it is gone.
pub fn update_craft(conn: &Connection, craft: &Craft) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE crafts
             SET until_finish = ?1, total_cycles = ?2, destroys_plant = ?3, makes = ?4
             WHERE id = ?5",
            rusqlite::params![
                craft.until_finish,
                craft.total_cycles,
                craft.destroys_plant,
                craft.makes,
                craft.id.to_string(),
            ],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Delete a craft. Fails with a foreign key error while a plant still
/// points at it.
pub fn delete_craft(conn: &Connection, id: CraftId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM crafts WHERE id = ?1", [id.to_string()])
        .map_err(from_sqlite)?;
    Ok(n > 0)
}
