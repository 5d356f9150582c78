//! Hacksteader rows and whole-steader aggregate operations.
//!
//! The aggregate functions read and write a steader's profile, land and
//! inventory together, each inside a single transaction. Tiles are written
//! with both their `steader` column and a `tiles_steaders` link. A tile
//! that already exists, because another steader shares it, is rewritten in
//! place and keeps whatever `steader` value the aggregate carries.

use hacksteader_common::{Error, Result};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::{Hacksteader, HacksteaderRow, Land, PlantedCrop, Tile};
use crate::queries::{crafts, plants, possessions, profiles, tiles, tiles_steaders};

// ---------------------------------------------------------------------------
// Row operations
// ---------------------------------------------------------------------------

/// Insert a bare `hacksteaders` row. The profile must already exist.
pub fn insert_row(conn: &Connection, user_id: &str, profile: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO hacksteaders (user_id, profile) VALUES (?1, ?2)",
        rusqlite::params![user_id, profile],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

pub fn get_row(conn: &Connection, user_id: &str) -> Result<Option<HacksteaderRow>> {
    let result = conn.query_row(
        "SELECT user_id, profile FROM hacksteaders WHERE user_id = ?1",
        [user_id],
        HacksteaderRow::from_row,
    );
    match result {
        Ok(row) => Ok(Some(row)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(from_sqlite(e)),
    }
}

pub fn list_user_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT user_id FROM hacksteaders ORDER BY user_id")
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Aggregate operations
// ---------------------------------------------------------------------------

fn write_crop(conn: &Connection, crop: &PlantedCrop) -> Result<()> {
    if let Some(craft) = &crop.craft {
        crafts::insert_craft(conn, craft)?;
    }
    plants::insert_plant(conn, &crop.plant)
}

fn write_land(conn: &Connection, user_id: &str, land: &Land) -> Result<()> {
    let tile = &land.tile;
    match tiles::get_tile(conn, tile.id)? {
        Some(existing) => {
            // Shared tile: swap the old crop for the new one.
            if let Some(old_plant) = existing.plant {
                tiles::clear_plant(conn, tile.id)?;
                plants::delete_plant_rows(conn, old_plant)?;
            }
            if let Some(crop) = &land.crop {
                write_crop(conn, crop)?;
            }
            tiles::update_tile(conn, tile)?;
        }
        None => {
            if tile.steader != user_id {
                return Err(Error::validation(format!(
                    "new tile {} names {} as its steader, not {}",
                    tile.id, tile.steader, user_id
                )));
            }
            if let Some(crop) = &land.crop {
                write_crop(conn, crop)?;
            }
            tiles::insert_tile(conn, tile)?;
        }
    }
    tiles_steaders::link(conn, user_id, tile.id)
}

fn write_holdings(conn: &Connection, steader: &Hacksteader) -> Result<()> {
    for land in &steader.land {
        write_land(conn, &steader.user_id, land)?;
    }

    for possession in &steader.inventory {
        possessions::write_possession(conn, possession)?;
    }
    Ok(())
}

/// Remove everything a steader holds, leaving the profile and row in place.
///
/// Tiles still linked to another steader survive with their plants.
fn purge_holdings(conn: &Connection, user_id: &str) -> Result<()> {
    let tile_ids = tiles_steaders::tiles_of(conn, user_id)?;
    tiles_steaders::unlink_all(conn, user_id)?;

    for tile_id in tile_ids {
        if !tiles_steaders::steaders_of(conn, tile_id)?.is_empty() {
            continue;
        }
        let Some(tile) = tiles::get_tile(conn, tile_id)? else {
            continue;
        };
        tiles::delete_tile(conn, tile_id)?;
        if let Some(plant) = tile.plant {
            plants::delete_plant_rows(conn, plant)?;
        }
    }

    for possession in possessions::list_for_steader(conn, user_id)? {
        possessions::delete_possession_rows(conn, possession.id)?;
    }
    Ok(())
}

fn land_for_steader(conn: &Connection, user_id: &str) -> Result<Vec<Land>> {
    let mut stmt = conn
        .prepare(
            "SELECT t.id, t.acquired, t.plant, t.steader
             FROM tiles t
             JOIN tiles_steaders ts ON ts.tile_id = t.id
             WHERE ts.steader_id = ?1
             ORDER BY t.acquired, t.id",
        )
        .map_err(from_sqlite)?;
    let tiles = stmt
        .query_map([user_id], Tile::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;

    let mut land = Vec::with_capacity(tiles.len());
    for tile in tiles {
        let crop = match tile.plant {
            Some(plant_id) => {
                let plant = plants::get_plant(conn, plant_id)?
                    .ok_or_else(|| Error::not_found("plant", plant_id))?;
                let craft = match plant.craft {
                    Some(craft_id) => Some(
                        crafts::get_craft(conn, craft_id)?
                            .ok_or_else(|| Error::not_found("craft", craft_id))?,
                    ),
                    None => None,
                };
                Some(PlantedCrop { plant, craft })
            }
            None => None,
        };
        land.push(Land { tile, crop });
    }
    Ok(land)
}

/// Store a whole steader: profile, row, land and inventory.
///
/// Nothing is written unless every row goes in.
pub fn insert_hacksteader(conn: &Connection, steader: &Hacksteader) -> Result<()> {
    steader.check_consistency()?;

    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    profiles::insert_profile(&tx, &steader.profile)?;
    insert_row(&tx, &steader.user_id, &steader.profile.id)?;
    write_holdings(&tx, steader)?;
    tx.commit().map_err(from_sqlite)?;

    tracing::debug!(
        user_id = %steader.user_id,
        tiles = steader.land.len(),
        possessions = steader.inventory.len(),
        "Inserted hacksteader"
    );
    Ok(())
}

/// Load a steader with everything linked to them.
pub fn get_hacksteader(conn: &Connection, user_id: &str) -> Result<Option<Hacksteader>> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;

    let Some(row) = get_row(&tx, user_id)? else {
        return Ok(None);
    };
    let profile = profiles::get_profile(&tx, &row.profile)?
        .ok_or_else(|| Error::not_found("profile", &row.profile))?;
    let land = land_for_steader(&tx, user_id)?;
    let inventory = possessions::list_for_steader(&tx, user_id)?;
    tx.commit().map_err(from_sqlite)?;

    Ok(Some(Hacksteader {
        user_id: row.user_id,
        profile,
        land,
        inventory,
    }))
}

/// Replace a stored steader's profile and holdings with `steader`.
pub fn update_hacksteader(conn: &Connection, steader: &Hacksteader) -> Result<()> {
    steader.check_consistency()?;

    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    if get_row(&tx, &steader.user_id)?.is_none() {
        return Err(Error::not_found("hacksteader", &steader.user_id));
    }
    profiles::update_profile(&tx, &steader.profile)?;
    purge_holdings(&tx, &steader.user_id)?;
    write_holdings(&tx, steader)?;
    tx.commit().map_err(from_sqlite)?;

    tracing::debug!(user_id = %steader.user_id, "Updated hacksteader");
    Ok(())
}

/// Delete a steader, their holdings and their profile.
pub fn delete_hacksteader(conn: &Connection, user_id: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    let Some(row) = get_row(&tx, user_id)? else {
        return Ok(false);
    };
    purge_holdings(&tx, user_id)?;
    tx.execute("DELETE FROM hacksteaders WHERE user_id = ?1", [user_id])
        .map_err(from_sqlite)?;
    profiles::delete_profile(&tx, &row.profile)?;
    tx.commit().map_err(from_sqlite)?;

    tracing::debug!(user_id, "Deleted hacksteader");
    Ok(true)
}

/// Create and store a fresh steader with `tiles` empty tiles.
pub fn new_hacksteader(conn: &Connection, user_id: &str, tiles: usize) -> Result<Hacksteader> {
    let steader = Hacksteader::new(user_id, tiles);
    insert_hacksteader(conn, &steader)?;
    Ok(steader)
}
