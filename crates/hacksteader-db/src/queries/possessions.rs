//! Possession rows and the `possess_steaders` join table.
//!
//! A possession's `steader` column and its join row always name the same
//! owner; every write here touches both.

use hacksteader_common::{PossessionId, Result};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::{to_sql_int, Possession};

fn sale_columns(p: &Possession) -> Result<(Option<i64>, Option<&str>)> {
    match &p.sale {
        Some(sale) => Ok((
            Some(to_sql_int(sale.price, "sale price")?),
            Some(sale.market_name.as_str()),
        )),
        None => Ok((None, None)),
    }
}

/// Insert the row and its owner link without opening a transaction.
pub(crate) fn write_possession(conn: &Connection, p: &Possession) -> Result<()> {
    let (sale_price, market_name) = sale_columns(p)?;
    conn.execute(
        "INSERT INTO possessions
             (id, archetype_handle, kind, steader, ownership_log, sale_price, market_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            p.id.to_string(),
            p.archetype_handle,
            serde_json::to_string(&p.kind)?,
            p.steader,
            serde_json::to_string(&p.ownership_log)?,
            sale_price,
            market_name,
        ],
    )
    .map_err(from_sqlite)?;

    conn.execute(
        "INSERT INTO possess_steaders (steader_id, possession_id) VALUES (?1, ?2)",
        rusqlite::params![p.steader, p.id.to_string()],
    )
    .map_err(from_sqlite)?;
    Ok(())
}

/// Insert a possession owned by `p.steader`, who must be a hacksteader.
pub fn insert_possession(conn: &Connection, p: &Possession) -> Result<()> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    write_possession(&tx, p)?;
    tx.commit().map_err(from_sqlite)
}

pub fn get_possession(conn: &Connection, id: PossessionId) -> Result<Option<Possession>> {
    let result = conn.query_row(
        "SELECT id, archetype_handle, kind, steader, ownership_log, sale_price, market_name
         FROM possessions WHERE id = ?1",
        [id.to_string()],
        Possession::from_row,
    );
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(from_sqlite(e)),
    }
}

pub fn list_possessions(conn: &Connection) -> Result<Vec<Possession>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, archetype_handle, kind, steader, ownership_log, sale_price, market_name
             FROM possessions ORDER BY steader, archetype_handle, id",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([], Possession::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Possessions linked to `steader` through the join table.
pub fn list_for_steader(conn: &Connection, steader: &str) -> Result<Vec<Possession>> {
    let mut stmt = conn
        .prepare(
            "SELECT p.id, p.archetype_handle, p.kind, p.steader, p.ownership_log,
                    p.sale_price, p.market_name
             FROM possessions p
             JOIN possess_steaders ps ON ps.possession_id = p.id
             WHERE ps.steader_id = ?1
             ORDER BY p.archetype_handle, p.id",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([steader], Possession::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Overwrite a possession, moving its owner link if `steader` changed.
pub fn update_possession(conn: &Connection, p: &Possession) -> Result<bool> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    let updated = rewrite_possession(&tx, p)?;
    tx.commit().map_err(from_sqlite)?;
    Ok(updated)
}

pub(crate) fn rewrite_possession(conn: &Connection, p: &Possession) -> Result<bool> {
    let (sale_price, market_name) = sale_columns(p)?;
    let n = conn
        .execute(
            "UPDATE possessions
             SET archetype_handle = ?1, kind = ?2, steader = ?3, ownership_log = ?4,
                 sale_price = ?5, market_name = ?6
             WHERE id = ?7",
            rusqlite::params![
                p.archetype_handle,
                serde_json::to_string(&p.kind)?,
                p.steader,
                serde_json::to_string(&p.ownership_log)?,
                sale_price,
                market_name,
                p.id.to_string(),
            ],
        )
        .map_err(from_sqlite)?;
    if n == 0 {
        return Ok(false);
    }

    conn.execute(
        "UPDATE possess_steaders SET steader_id = ?1 WHERE possession_id = ?2",
        rusqlite::params![p.steader, p.id.to_string()],
    )
    .map_err(from_sqlite)?;
    Ok(true)
}

pub(crate) fn delete_possession_rows(conn: &Connection, id: PossessionId) -> Result<bool> {
    conn.execute(
        "DELETE FROM possess_steaders WHERE possession_id = ?1",
        [id.to_string()],
    )
    .map_err(from_sqlite)?;
    let n = conn
        .execute("DELETE FROM possessions WHERE id = ?1", [id.to_string()])
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

pub fn delete_possession(conn: &Connection, id: PossessionId) -> Result<bool> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    let deleted = delete_possession_rows(&tx, id)?;
    tx.commit().map_err(from_sqlite)?;
    Ok(deleted)
}
