//! Tile CRUD operations.
//!
//! `tiles.steader` is plain text with no foreign key; ownership that the
//! database enforces lives in `tiles_steaders`.

use hacksteader_common::{PlantId, Result, TileId};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::{to_sql_time, Tile};

pub fn insert_tile(conn: &Connection, tile: &Tile) -> Result<()> {
    conn.execute(
        "INSERT INTO tiles (id, acquired, plant, steader) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            tile.id.to_string(),
            to_sql_time(&tile.acquired),
            tile.plant.map(|p| p.to_string()),
            tile.steader,
        ],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

pub fn get_tile(conn: &Connection, id: TileId) -> Result<Option<Tile>> {
    let result = conn.query_row(
        "SELECT id, acquired, plant, steader FROM tiles WHERE id = ?1",
        [id.to_string()],
        Tile::from_row,
    );
    match result {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(from_sqlite(e)),
    }
}

pub fn list_tiles(conn: &Connection) -> Result<Vec<Tile>> {
    let mut stmt = conn
        .prepare("SELECT id, acquired, plant, steader FROM tiles ORDER BY acquired, id")
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([], Tile::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Tiles whose `steader` column names `steader`, oldest first.
pub fn list_for_steader(conn: &Connection, steader: &str) -> Result<Vec<Tile>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, acquired, plant, steader FROM tiles
             WHERE steader = ?1 ORDER BY acquired, id",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([steader], Tile::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Rewrite every column of an existing tile. Returns false if it is missing.
pub fn update_tile(conn: &Connection, tile: &Tile) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE tiles SET acquired = ?1, plant = ?2, steader = ?3 WHERE id = ?4",
            rusqlite::params![
                to_sql_time(&tile.acquired),
                tile.plant.map(|p| p.to_string()),
                tile.steader,
                tile.id.to_string(),
            ],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// The tile currently holding `plant`, if any.
pub fn find_by_plant(conn: &Connection, plant: PlantId) -> Result<Option<Tile>> {
    let result = conn.query_row(
        "SELECT id, acquired, plant, steader FROM tiles WHERE plant = ?1",
        [plant.to_string()],
        Tile::from_row,
    );
    match result {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(from_sqlite(e)),
    }
}

/// Put an existing plant on a tile.
pub fn assign_plant(conn: &Connection, id: TileId, plant: PlantId) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE tiles SET plant = ?1 WHERE id = ?2",
            rusqlite::params![plant.to_string(), id.to_string()],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Empty a tile. The plant row itself is left alone.
pub fn clear_plant(conn: &Connection, id: TileId) -> Result<bool> {
    let n = conn
        .execute("UPDATE tiles SET plant = NULL WHERE id = ?1", [id.to_string()])
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Change the owner recorded on the tile row.
pub fn set_steader(conn: &Connection, id: TileId, steader: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE tiles SET steader = ?1 WHERE id = ?2",
            rusqlite::params![steader, id.to_string()],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Delete a tile. Fails with a foreign key error while join rows remain.
pub fn delete_tile(conn: &Connection, id: TileId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM tiles WHERE id = ?1", [id.to_string()])
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Plant;
    use crate::pool::init_memory_pool;
    use crate::queries::plants;
    use hacksteader_common::Error;

    #[test]
    fn create_and_list() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let first = Tile::new("U1");
        let mut second = Tile::new("U1");
        second.acquired = first.acquired + chrono::Duration::seconds(5);
        let other = Tile::new("U2");
        for tile in [&second, &first, &other] {
            insert_tile(&conn, tile).unwrap();
        }

        assert_eq!(get_tile(&conn, first.id).unwrap().unwrap(), first);
        assert_eq!(list_tiles(&conn).unwrap().len(), 3);
        assert_eq!(
            list_for_steader(&conn, "U1").unwrap(),
            vec![first.clone(), second.clone()]
        );
    }

    #[test]
    fn missing_plant_is_foreign_key_violation() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut tile = Tile::new("U1");
        tile.plant = Some(PlantId::new());
        let err = insert_tile(&conn, &tile).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)), "{err}");
    }

    #[test]
    fn assign_and_clear_plant() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let tile = Tile::new("U1");
        insert_tile(&conn, &tile).unwrap();
        let plant = Plant::new(0, 3.0, vec![]);
        plants::insert_plant(&conn, &plant).unwrap();

        assert!(assign_plant(&conn, tile.id, plant.id).unwrap());
        assert_eq!(find_by_plant(&conn, plant.id).unwrap().unwrap().id, tile.id);

        // the plant cannot go while the tile holds it
        let err = plants::delete_plant(&conn, plant.id).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)));

        assert!(clear_plant(&conn, tile.id).unwrap());
        assert!(find_by_plant(&conn, plant.id).unwrap().is_none());
        assert!(plants::delete_plant(&conn, plant.id).unwrap());
    }

    #[test]
    fn update_rewrites_plant_and_keeps_owner_column() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut tile = Tile::new("U1");
        insert_tile(&conn, &tile).unwrap();
        let plant = Plant::new(2, 6.0, vec![]);
        plants::insert_plant(&conn, &plant).unwrap();

        tile.plant = Some(plant.id);
        assert!(update_tile(&conn, &tile).unwrap());
        let stored = get_tile(&conn, tile.id).unwrap().unwrap();
        assert_eq!(stored, tile);
        assert_eq!(stored.steader, "U1");

        assert!(!update_tile(&conn, &Tile::new("U1")).unwrap());
    }

    #[test]
    fn set_steader_and_delete() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let tile = Tile::new("U1");
        insert_tile(&conn, &tile).unwrap();
        assert!(set_steader(&conn, tile.id, "U2").unwrap());
        assert_eq!(get_tile(&conn, tile.id).unwrap().unwrap().steader, "U2");

        assert!(delete_tile(&conn, tile.id).unwrap());
        assert!(get_tile(&conn, tile.id).unwrap().is_none());
        assert!(!clear_plant(&conn, tile.id).unwrap());
    }
}
