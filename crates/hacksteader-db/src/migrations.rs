//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order. A
//! `schema_migrations` table tracks which versions have been applied, and
//! every `CREATE` is guarded with `IF NOT EXISTS` so a migration body can be
//! replayed against a database that already has it.

use hacksteader_common::{Error, Result};
use rusqlite::Connection;

/// V1: the six core relations.
///
/// The pedigree column holds the `seed_grower` composite as a JSON array;
/// see [`crate::schema::composite_types`].
const V1_INITIAL: &str = r#"
CREATE TABLE IF NOT EXISTS crafts (
    id             TEXT PRIMARY KEY NOT NULL,
    until_finish   REAL NOT NULL,
    total_cycles   REAL NOT NULL,
    destroys_plant INTEGER NOT NULL DEFAULT 0 CHECK (destroys_plant IN (0, 1)),
    makes          INTEGER NOT NULL CHECK (makes >= 0)
);

CREATE TABLE IF NOT EXISTS plants (
    id               TEXT PRIMARY KEY NOT NULL,
    xp               INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
    until_yield      REAL NOT NULL,
    craft            TEXT REFERENCES crafts(id),
    pedigree         TEXT NOT NULL DEFAULT '[]' CHECK (
        CASE WHEN json_valid(pedigree) THEN json_type(pedigree) = 'array' ELSE 0 END
    ),
    archetype_handle INTEGER NOT NULL CHECK (archetype_handle >= 0),
    on_market        INTEGER NOT NULL DEFAULT 0 CHECK (on_market IN (0, 1))
);

CREATE TABLE IF NOT EXISTS tiles (
    id       TEXT PRIMARY KEY NOT NULL,
    acquired TEXT NOT NULL,
    plant    TEXT REFERENCES plants(id),
    steader  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    joined      TEXT NOT NULL,
    last_active TEXT NOT NULL,
    last_farm   TEXT NOT NULL,
    id          TEXT PRIMARY KEY NOT NULL,
    xp          INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0)
);

CREATE TABLE IF NOT EXISTS hacksteaders (
    user_id TEXT PRIMARY KEY NOT NULL,
    profile TEXT NOT NULL UNIQUE REFERENCES profiles(id)
);

CREATE TABLE IF NOT EXISTS tiles_steaders (
    steader_id TEXT NOT NULL REFERENCES hacksteaders(user_id),
    tile_id    TEXT NOT NULL REFERENCES tiles(id),
    PRIMARY KEY (steader_id, tile_id)
);
"#;

/// V2: inventory possessions and their owner join table.
const V2_POSSESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS possessions (
    id               TEXT PRIMARY KEY NOT NULL,
    archetype_handle INTEGER NOT NULL CHECK (archetype_handle >= 0),
    kind             TEXT NOT NULL CHECK (json_valid(kind)),
    steader          TEXT NOT NULL,
    ownership_log    TEXT NOT NULL DEFAULT '[]' CHECK (
        CASE WHEN json_valid(ownership_log) THEN json_type(ownership_log) = 'array' ELSE 0 END
    ),
    sale_price       INTEGER CHECK (sale_price IS NULL OR sale_price >= 0),
    market_name      TEXT,
    CHECK ((sale_price IS NULL) = (market_name IS NULL))
);

CREATE TABLE IF NOT EXISTS possess_steaders (
    steader_id    TEXT NOT NULL REFERENCES hacksteaders(user_id),
    possession_id TEXT NOT NULL REFERENCES possessions(id),
    PRIMARY KEY (steader_id, possession_id)
);
"#;

/// V3: lookup indexes for the reference columns and the market.
const V3_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_plants_craft      ON plants(craft);
CREATE INDEX IF NOT EXISTS idx_plants_on_market  ON plants(on_market) WHERE on_market = 1;
CREATE INDEX IF NOT EXISTS idx_tiles_plant       ON tiles(plant);
CREATE INDEX IF NOT EXISTS idx_tiles_steader     ON tiles(steader);
CREATE INDEX IF NOT EXISTS idx_tiles_steaders_tile ON tiles_steaders(tile_id);
CREATE INDEX IF NOT EXISTS idx_possessions_steader ON possessions(steader);
CREATE INDEX IF NOT EXISTS idx_possess_steaders_possession ON possess_steaders(possession_id);
"#;

/// A single migration with its SQL content.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: usize,
    pub name: &'static str,
    pub sql: &'static str,
}

/// All available migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial",
        sql: V1_INITIAL,
    },
    Migration {
        version: 2,
        name: "possessions",
        sql: V2_POSSESSIONS,
    },
    Migration {
        version: 3,
        name: "indexes",
        sql: V3_INDEXES,
    },
];

fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY NOT NULL,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))
}

fn get_current_version(conn: &Connection) -> Result<usize> {
    let version: Option<i64> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .map_err(|e| Error::database(e.to_string()))?;
    let version = version.unwrap_or_default();
    usize::try_from(version)
        .map_err(|_| Error::Internal(format!("invalid schema version {version}")))
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute_batch(migration.sql).map_err(|e| {
        Error::database(format!("Migration V{} failed: {e}", migration.version))
    })?;

    tx.execute(
        "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![migration.version as i64, migration.name],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))
}

/// Run all pending migrations on `conn`.
///
/// Returns the number of migrations applied; zero when the database is
/// already current.
pub fn run_migrations(conn: &Connection) -> Result<usize> {
    run_migrations_to(conn, latest_version())
}

/// Run pending migrations up to and including version `target`.
pub fn run_migrations_to(conn: &Connection, target: usize) -> Result<usize> {
    if target > latest_version() {
        return Err(Error::validation(format!(
            "no migration V{target}; latest is V{}",
            latest_version()
        )));
    }

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| Error::database(e.to_string()))?;
    init_migrations_table(conn)?;

    let current = get_current_version(conn)?;
    let mut applied = 0;
    for migration in MIGRATIONS
        .iter()
        .filter(|m| m.version > current && m.version <= target)
    {
        apply_migration(conn, migration)?;
        applied += 1;
        tracing::info!(
            "Applied migration {}: {}",
            migration.version,
            migration.name
        );
    }

    if applied == 0 {
        tracing::debug!("Schema already at V{current}");
    }
    Ok(applied)
}

/// Get the current schema version without applying migrations.
pub fn current_version(conn: &Connection) -> Result<usize> {
    init_migrations_table(conn)?;
    get_current_version(conn)
}

/// Get the latest available migration version.
pub fn latest_version() -> usize {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Migrations not yet applied to `conn`.
pub fn pending(conn: &Connection) -> Result<Vec<&'static Migration>> {
    let current = current_version(conn)?;
    Ok(MIGRATIONS.iter().filter(|m| m.version > current).collect())
}
