//! Plant CRUD operations, including the pedigree column.
//!
//! Pedigrees are stored as a JSON array of `seed_grower` objects. The table
//! refuses anything that is not an array; element shape is checked when a
//! row is read back.

use hacksteader_common::{descend, CraftId, Error, PlantId, Result, SeedGrower};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::{to_sql_int, Plant};

/// Insert a plant row. Its craft, if any, must already exist.
pub fn insert_plant(conn: &Connection, plant: &Plant) -> Result<()> {
    let pedigree = serde_json::to_string(&plant.pedigree)?;
    conn.execute(
        "INSERT INTO plants (id, xp, until_yield, craft, pedigree, archetype_handle, on_market)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            plant.id.to_string(),
            to_sql_int(plant.xp, "plant xp")?,
            plant.until_yield,
            plant.craft.map(|c| c.to_string()),
            pedigree,
            plant.archetype_handle,
            plant.on_market,
        ],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

pub fn get_plant(conn: &Connection, id: PlantId) -> Result<Option<Plant>> {
    let result = conn.query_row(
        "SELECT id, xp, until_yield, craft, pedigree, archetype_handle, on_market
         FROM plants WHERE id = ?1",
        [id.to_string()],
        Plant::from_row,
    );
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(from_sqlite(e)),
    }
}

pub fn list_plants(conn: &Connection) -> Result<Vec<Plant>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, xp, until_yield, craft, pedigree, archetype_handle, on_market
             FROM plants ORDER BY id",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([], Plant::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Overwrite every column of an existing plant.
pub fn update_plant(conn: &Connection, plant: &Plant) -> Result<bool> {
    let pedigree = serde_json::to_string(&plant.pedigree)?;
    let n = conn
        .execute(
            "UPDATE plants
             SET xp = ?1, until_yield = ?2, craft = ?3, pedigree = ?4,
                 archetype_handle = ?5, on_market = ?6
             WHERE id = ?7",
            rusqlite::params![
                to_sql_int(plant.xp, "plant xp")?,
                plant.until_yield,
                plant.craft.map(|c| c.to_string()),
                pedigree,
                plant.archetype_handle,
                plant.on_market,
                plant.id.to_string(),
            ],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Point a plant at a craft, or clear it with `None`.
pub fn set_craft(conn: &Connection, id: PlantId, craft: Option<CraftId>) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE plants SET craft = ?1 WHERE id = ?2",
            rusqlite::params![craft.map(|c| c.to_string()), id.to_string()],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

pub fn set_on_market(conn: &Connection, id: PlantId, on_market: bool) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE plants SET on_market = ?1 WHERE id = ?2",
            rusqlite::params![on_market, id.to_string()],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Record `grower` as the newest generation of a plant's pedigree.
///
/// Existing entries are aged by one generation. Returns the new pedigree.
pub fn push_grower(conn: &Connection, id: PlantId, grower: &str) -> Result<Vec<SeedGrower>> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;

    let plant = get_plant(&tx, id)?.ok_or_else(|| Error::not_found("plant", id))?;
    let pedigree = descend(&plant.pedigree, grower);
    tx.execute(
        "UPDATE plants SET pedigree = ?1 WHERE id = ?2",
        rusqlite::params![serde_json::to_string(&pedigree)?, id.to_string()],
    )
    .map_err(from_sqlite)?;

    tx.commit().map_err(from_sqlite)?;
    Ok(pedigree)
}

/// Delete a plant row, then its craft if it had one.
///
/// Fails with a foreign key error while a tile still holds the plant.
pub(crate) fn delete_plant_rows(conn: &Connection, id: PlantId) -> Result<bool> {
    let craft: Option<Option<String>> = match conn.query_row(
        "SELECT craft FROM plants WHERE id = ?1",
        [id.to_string()],
        |row| row.get(0),
    ) {
        Ok(c) => Some(c),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(from_sqlite(e)),
    };
    let Some(craft) = craft else {
        return Ok(false);
    };

    conn.execute("DELETE FROM plants WHERE id = ?1", [id.to_string()])
        .map_err(from_sqlite)?;
    if let Some(craft) = craft {
        conn.execute("DELETE FROM crafts WHERE id = ?1", [craft])
            .map_err(from_sqlite)?;
    }
    Ok(true)
}

/// Delete a plant and the craft it owns in one transaction.
pub fn delete_plant(conn: &Connection, id: PlantId) -> Result<bool> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    let deleted = delete_plant_rows(&tx, id)?;
    tx.commit().map_err(from_sqlite)?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Craft;
    use crate::pool::init_memory_pool;
    use crate::queries::crafts;

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut plant = Plant::new(2, 30.0, vec![SeedGrower::new("U1", 0), SeedGrower::new("U2", 4)]);
        plant.xp = 120;
        insert_plant(&conn, &plant).unwrap();

        assert_eq!(get_plant(&conn, plant.id).unwrap().unwrap(), plant);
        assert!(get_plant(&conn, PlantId::new()).unwrap().is_none());
    }

    #[test]
    fn out_of_range_xp_is_not_written() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut plant = Plant::new(3, 4.0, vec![]);
        plant.xp = u64::MAX;
        let err = insert_plant(&conn, &plant).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
        assert!(list_plants(&conn).unwrap().is_empty());

        plant.xp = 9;
        insert_plant(&conn, &plant).unwrap();
        plant.xp = i64::MAX as u64 + 1;
        let err = update_plant(&conn, &plant).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
        assert_eq!(get_plant(&conn, plant.id).unwrap().unwrap().xp, 9);
    }

    #[test]
    fn missing_craft_is_foreign_key_violation() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut plant = Plant::new(0, 1.0, vec![]);
        plant.craft = Some(CraftId::new());
        let err = insert_plant(&conn, &plant).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)), "{err}");
        assert!(list_plants(&conn).unwrap().is_empty());
    }

    #[test]
    fn craft_and_market_flags() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let plant = Plant::new(1, 5.0, vec![]);
        insert_plant(&conn, &plant).unwrap();
        let craft = Craft::new(2.0, false, 4);
        crafts::insert_craft(&conn, &craft).unwrap();

        assert!(set_craft(&conn, plant.id, Some(craft.id)).unwrap());
        assert!(set_on_market(&conn, plant.id, true).unwrap());
        let stored = get_plant(&conn, plant.id).unwrap().unwrap();
        assert_eq!(stored.craft, Some(craft.id));
        assert!(stored.on_market);

        let err = set_craft(&conn, plant.id, Some(CraftId::new())).unwrap_err();
        assert!(matches!(err, Error::ForeignKey(_)));
        assert!(!set_on_market(&conn, PlantId::new(), true).unwrap());
    }

    #[test]
    fn push_grower_ages_lineage() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let plant = Plant::new(0, 1.0, vec![SeedGrower::new("U1", 0)]);
        insert_plant(&conn, &plant).unwrap();

        let pedigree = push_grower(&conn, plant.id, "U2").unwrap();
        assert_eq!(
            pedigree,
            vec![SeedGrower::new("U2", 0), SeedGrower::new("U1", 1)]
        );
        assert_eq!(get_plant(&conn, plant.id).unwrap().unwrap().pedigree, pedigree);

        let err = push_grower(&conn, PlantId::new(), "U3").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn malformed_pedigree_element_fails_to_decode() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let plant = Plant::new(0, 1.0, vec![]);
        insert_plant(&conn, &plant).unwrap();
        conn.execute(
            r#"UPDATE plants SET pedigree = '[{"id": 7}]' WHERE id = ?1"#,
            [plant.id.to_string()],
        )
        .unwrap();

        let err = get_plant(&conn, plant.id).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    #[test]
    fn delete_takes_craft_along() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let craft = Craft::new(2.0, true, 6);
        crafts::insert_craft(&conn, &craft).unwrap();
        let mut plant = Plant::new(0, 1.0, vec![]);
        plant.craft = Some(craft.id);
        insert_plant(&conn, &plant).unwrap();

        assert!(delete_plant(&conn, plant.id).unwrap());
        assert!(crafts::get_craft(&conn, craft.id).unwrap().is_none());
        assert!(!delete_plant(&conn, plant.id).unwrap());
    }
}
