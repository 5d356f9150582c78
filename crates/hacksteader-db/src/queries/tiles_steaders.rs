//! The `tiles_steaders` join table.

use hacksteader_common::{Result, TileId};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::TileSteader;

/// Link a steader to a tile. Both rows must exist.
pub fn link(conn: &Connection, steader_id: &str, tile_id: TileId) -> Result<()> {
    conn.execute(
        "INSERT INTO tiles_steaders (steader_id, tile_id) VALUES (?1, ?2)",
        rusqlite::params![steader_id, tile_id.to_string()],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

pub fn unlink(conn: &Connection, steader_id: &str, tile_id: TileId) -> Result<bool> {
    let n = conn
        .execute(
            "DELETE FROM tiles_steaders WHERE steader_id = ?1 AND tile_id = ?2",
            rusqlite::params![steader_id, tile_id.to_string()],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Drop every link of a steader; returns how many went.
pub fn unlink_all(conn: &Connection, steader_id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM tiles_steaders WHERE steader_id = ?1",
        [steader_id],
    )
    .map_err(from_sqlite)
}

pub fn tiles_of(conn: &Connection, steader_id: &str) -> Result<Vec<TileId>> {
    Ok(list_for_steader(conn, steader_id)?
        .into_iter()
        .map(|row| row.tile_id)
        .collect())
}

pub fn list_for_steader(conn: &Connection, steader_id: &str) -> Result<Vec<TileSteader>> {
    let mut stmt = conn
        .prepare(
            "SELECT steader_id, tile_id FROM tiles_steaders
             WHERE steader_id = ?1 ORDER BY tile_id",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([steader_id], TileSteader::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

pub fn steaders_of(conn: &Connection, tile_id: TileId) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT steader_id FROM tiles_steaders WHERE tile_id = ?1 ORDER BY steader_id")
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([tile_id.to_string()], |row| row.get(0))
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Tile};
    use crate::pool::init_memory_pool;
    use crate::queries::{hacksteaders, profiles, tiles};
    use hacksteader_common::Error;

    fn steader(conn: &Connection, user_id: &str) {
        profiles::insert_profile(conn, &Profile::new(user_id)).unwrap();
        hacksteaders::insert_row(conn, user_id, user_id).unwrap();
    }

    #[test]
    fn link_and_unlink() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        steader(&conn, "U1");
        steader(&conn, "U2");

        let tile = Tile::new("U1");
        tiles::insert_tile(&conn, &tile).unwrap();
        link(&conn, "U1", tile.id).unwrap();
        link(&conn, "U2", tile.id).unwrap();

        assert_eq!(tiles_of(&conn, "U1").unwrap(), vec![tile.id]);
        assert_eq!(steaders_of(&conn, tile.id).unwrap(), vec!["U1", "U2"]);

        assert!(unlink(&conn, "U2", tile.id).unwrap());
        assert!(!unlink(&conn, "U2", tile.id).unwrap());
        assert_eq!(unlink_all(&conn, "U1").unwrap(), 1);
        assert!(steaders_of(&conn, tile.id).unwrap().is_empty());
    }

    #[test]
    fn links_require_existing_rows() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        steader(&conn, "U1");

        let err = link(&conn, "U1", TileId::new()).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)), "{err}");

        let tile = Tile::new("ghost");
        tiles::insert_tile(&conn, &tile).unwrap();
        let err = link(&conn, "ghost", tile.id).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)), "{err}");
    }

    #[test]
    fn duplicate_link_conflicts() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        steader(&conn, "U1");

        let tile = Tile::new("U1");
        tiles::insert_tile(&conn, &tile).unwrap();
        link(&conn, "U1", tile.id).unwrap();
        let err = link(&conn, "U1", tile.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)), "{err}");
    }

    #[test]
    fn linked_tile_cannot_be_deleted() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        steader(&conn, "U1");

        let tile = Tile::new("U1");
        tiles::insert_tile(&conn, &tile).unwrap();
        link(&conn, "U1", tile.id).unwrap();

        let err = tiles::delete_tile(&conn, tile.id).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)));
    }
}
