//! Marketplace listings and ownership transfers.

use hacksteader_common::{Acquisition, Error, Owner, PossessionId, Result, Sale};
use rusqlite::Connection;

use crate::from_sqlite;
use crate::models::{Plant, Possession};
use crate::queries::possessions::{get_possession, rewrite_possession};

/// Plants flagged for the market.
pub fn plants_on_market(conn: &Connection) -> Result<Vec<Plant>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, xp, until_yield, craft, pedigree, archetype_handle, on_market
             FROM plants WHERE on_market = 1 ORDER BY archetype_handle, id",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([], Plant::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Possessions with a sale attached, cheapest first. `market` narrows the
/// listing to one market name.
pub fn possessions_for_sale(conn: &Connection, market: Option<&str>) -> Result<Vec<Possession>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, archetype_handle, kind, steader, ownership_log, sale_price, market_name
             FROM possessions
             WHERE sale_price IS NOT NULL AND (?1 IS NULL OR market_name = ?1)
             ORDER BY sale_price, id",
        )
        .map_err(from_sqlite)?;
    let rows = stmt
        .query_map([market], Possession::from_row)
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(rows)
}

/// Put a possession up for sale, replacing any earlier listing.
pub fn list_possession(conn: &Connection, id: PossessionId, sale: &Sale) -> Result<()> {
    let price = crate::models::to_sql_int(sale.price, "sale price")?;
    let n = conn
        .execute(
            "UPDATE possessions SET sale_price = ?1, market_name = ?2 WHERE id = ?3",
            rusqlite::params![price, sale.market_name, id.to_string()],
        )
        .map_err(from_sqlite)?;
    if n == 0 {
        return Err(Error::not_found("possession", id));
    }
    tracing::debug!(%id, price = sale.price, market = %sale.market_name, "Listed possession");
    Ok(())
}

/// Take a possession off the market. Returns false if it was not listed.
pub fn delist_possession(conn: &Connection, id: PossessionId) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE possessions SET sale_price = NULL, market_name = NULL
             WHERE id = ?1 AND sale_price IS NOT NULL",
            [id.to_string()],
        )
        .map_err(from_sqlite)?;
    Ok(n > 0)
}

/// Hand a possession to `to`, logging how they got it.
///
/// Any listing is cleared. The new owner must be a hacksteader.
pub fn transfer_possession(
    conn: &Connection,
    id: PossessionId,
    to: &str,
    acquisition: Acquisition,
) -> Result<Possession> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    let possession = transfer_in(&tx, id, to, acquisition)?;
    tx.commit().map_err(from_sqlite)?;
    Ok(possession)
}

fn transfer_in(
    conn: &Connection,
    id: PossessionId,
    to: &str,
    acquisition: Acquisition,
) -> Result<Possession> {
    let mut possession =
        get_possession(conn, id)?.ok_or_else(|| Error::not_found("possession", id))?;

    tracing::debug!(%id, from = %possession.steader, to, %acquisition, "Transferring possession");
    possession.ownership_log.push(Owner::new(to, acquisition));
    possession.steader = to.to_string();
    possession.sale = None;
    rewrite_possession(conn, &possession)?;
    Ok(possession)
}

/// Buy a listed possession at its asking price.
pub fn purchase(conn: &Connection, id: PossessionId, buyer: &str) -> Result<Possession> {
    let tx = conn.unchecked_transaction().map_err(from_sqlite)?;
    let possession =
        get_possession(&tx, id)?.ok_or_else(|| Error::not_found("possession", id))?;

    let Some(sale) = possession.sale else {
        return Err(Error::validation(format!("possession {id} is not for sale")));
    };
    if possession.steader == buyer {
        return Err(Error::validation(format!(
            "{buyer} already owns possession {id}"
        )));
    }

    let bought = transfer_in(&tx, id, buyer, Acquisition::Purchase { price: sale.price })?;
    tx.commit().map_err(from_sqlite)?;
    Ok(bought)
}
