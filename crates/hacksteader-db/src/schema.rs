//! Expected schema description and live-database verification.
//!
//! [`expected_tables`] mirrors what the migrations create, tagged with the
//! migration version that introduced each table. [`describe`] reads the
//! live layout back out of SQLite and [`verify`] diffs the two.

use std::fmt;

use hacksteader_common::{Error, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::from_sqlite;
use crate::migrations;

/// A column as the migrations declare it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
}

const fn col(name: &'static str, sql_type: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type,
        nullable: false,
        primary_key: false,
    }
}

const fn nullable(name: &'static str, sql_type: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type,
        nullable: true,
        primary_key: false,
    }
}

const fn pk(name: &'static str) -> ColumnDef {
    ColumnDef {
        name,
        sql_type: "TEXT",
        nullable: false,
        primary_key: true,
    }
}

/// A `REFERENCES` clause on one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForeignKeyDef {
    pub column: &'static str,
    pub table: &'static str,
    pub references: &'static str,
}

const fn fk(column: &'static str, table: &'static str, references: &'static str) -> ForeignKeyDef {
    ForeignKeyDef {
        column,
        table,
        references,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableDef {
    pub name: &'static str,
    /// Migration version that creates the table.
    pub since: usize,
    pub columns: &'static [ColumnDef],
    pub foreign_keys: &'static [ForeignKeyDef],
}

/// A named row type stored as JSON inside a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompositeDef {
    pub name: &'static str,
    pub fields: &'static [(&'static str, &'static str)],
    /// `(table, column)` pairs holding an array of this type.
    pub array_columns: &'static [(&'static str, &'static str)],
}

const TABLES: &[TableDef] = &[
    TableDef {
        name: "crafts",
        since: 1,
        columns: &[
            pk("id"),
            col("until_finish", "REAL"),
            col("total_cycles", "REAL"),
            col("destroys_plant", "INTEGER"),
            col("makes", "INTEGER"),
        ],
        foreign_keys: &[],
    },
    TableDef {
        name: "plants",
        since: 1,
        columns: &[
            pk("id"),
            col("xp", "INTEGER"),
            col("until_yield", "REAL"),
            nullable("craft", "TEXT"),
            col("pedigree", "TEXT"),
            col("archetype_handle", "INTEGER"),
            col("on_market", "INTEGER"),
        ],
        foreign_keys: &[fk("craft", "crafts", "id")],
    },
    TableDef {
        name: "tiles",
        since: 1,
        columns: &[
            pk("id"),
            col("acquired", "TEXT"),
            nullable("plant", "TEXT"),
            col("steader", "TEXT"),
        ],
        foreign_keys: &[fk("plant", "plants", "id")],
    },
    TableDef {
        name: "profiles",
        since: 1,
        columns: &[
            col("joined", "TEXT"),
            col("last_active", "TEXT"),
            col("last_farm", "TEXT"),
            pk("id"),
            col("xp", "INTEGER"),
        ],
        foreign_keys: &[],
    },
    TableDef {
        name: "hacksteaders",
        since: 1,
        columns: &[pk("user_id"), col("profile", "TEXT")],
        foreign_keys: &[fk("profile", "profiles", "id")],
    },
    TableDef {
        name: "tiles_steaders",
        since: 1,
        columns: &[pk("steader_id"), pk("tile_id")],
        foreign_keys: &[
            fk("steader_id", "hacksteaders", "user_id"),
            fk("tile_id", "tiles", "id"),
        ],
    },
    TableDef {
        name: "possessions",
        since: 2,
        columns: &[
            pk("id"),
            col("archetype_handle", "INTEGER"),
            col("kind", "TEXT"),
            col("steader", "TEXT"),
            col("ownership_log", "TEXT"),
            nullable("sale_price", "INTEGER"),
            nullable("market_name", "TEXT"),
        ],
        foreign_keys: &[],
    },
    TableDef {
        name: "possess_steaders",
        since: 2,
        columns: &[pk("steader_id"), pk("possession_id")],
        foreign_keys: &[
            fk("steader_id", "hacksteaders", "user_id"),
            fk("possession_id", "possessions", "id"),
        ],
    },
];

const COMPOSITES: &[CompositeDef] = &[CompositeDef {
    name: "seed_grower",
    fields: &[("id", "TEXT"), ("generations", "INTEGER")],
    array_columns: &[("plants", "pedigree")],
}];

/// Every table the migrations create, in creation order.
pub fn expected_tables() -> &'static [TableDef] {
    TABLES
}

/// Tables that should exist once migrations up to `version` are applied.
pub fn expected_tables_at(version: usize) -> impl Iterator<Item = &'static TableDef> {
    TABLES.iter().filter(move |t| t.since <= version)
}

/// Composite row types stored in JSON columns.
pub fn composite_types() -> &'static [CompositeDef] {
    COMPOSITES
}

// ---------------------------------------------------------------------------
// Introspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub table: String,
    pub references: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn
        .prepare(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#)
        .map_err(from_sqlite)?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                sql_type: row.get::<_, String>(1)?.to_uppercase(),
                not_null: row.get(2)?,
                primary_key: row.get::<_, i64>(3)? > 0,
            })
        })
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(columns)
}

fn table_foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKeyInfo>> {
    let mut stmt = conn
        .prepare(r#"SELECT "from", "table", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#)
        .map_err(from_sqlite)?;
    let keys = stmt
        .query_map([table], |row| {
            Ok(ForeignKeyInfo {
                column: row.get(0)?,
                table: row.get(1)?,
                references: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;
    Ok(keys)
}

/// Read the layout of every user table, skipping SQLite internals and the
/// migration ledger.
pub fn describe(conn: &Connection) -> Result<Vec<TableInfo>> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != 'schema_migrations'
             ORDER BY name",
        )
        .map_err(from_sqlite)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(from_sqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_sqlite)?;

    names
        .into_iter()
        .map(|name| {
            Ok(TableInfo {
                columns: table_columns(conn, &name)?,
                foreign_keys: table_foreign_keys(conn, &name)?,
                name,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// One way the live schema differs from the expected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum SchemaIssue {
    MissingTable {
        table: String,
    },
    UnexpectedTable {
        table: String,
    },
    MissingColumn {
        table: String,
        column: String,
    },
    UnexpectedColumn {
        table: String,
        column: String,
    },
    ColumnType {
        table: String,
        column: String,
        expected: String,
        found: String,
    },
    Nullability {
        table: String,
        column: String,
        expected_nullable: bool,
    },
    PrimaryKey {
        table: String,
        column: String,
        expected_primary_key: bool,
    },
    MissingForeignKey {
        table: String,
        column: String,
        references: String,
    },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTable { table } => write!(f, "table {table} is missing"),
            Self::UnexpectedTable { table } => write!(f, "table {table} is not part of the schema"),
            Self::MissingColumn { table, column } => {
                write!(f, "column {table}.{column} is missing")
            }
            Self::UnexpectedColumn { table, column } => {
                write!(f, "column {table}.{column} is not part of the schema")
            }
            Self::ColumnType {
                table,
                column,
                expected,
                found,
            } => write!(f, "column {table}.{column} has type {found}, expected {expected}"),
            Self::Nullability {
                table,
                column,
                expected_nullable,
            } => {
                let want = if *expected_nullable { "nullable" } else { "NOT NULL" };
                write!(f, "column {table}.{column} should be {want}")
            }
            Self::PrimaryKey {
                table,
                column,
                expected_primary_key,
            } => {
                let want = if *expected_primary_key {
                    "part of"
                } else {
                    "outside"
                };
                write!(f, "column {table}.{column} should be {want} the primary key")
            }
            Self::MissingForeignKey {
                table,
                column,
                references,
            } => write!(f, "{table}.{column} should reference {references}"),
        }
    }
}

fn verify_table(def: &TableDef, live: &TableInfo, issues: &mut Vec<SchemaIssue>) {
    let table = def.name.to_string();

    for expected in def.columns {
        let Some(found) = live.column(expected.name) else {
            issues.push(SchemaIssue::MissingColumn {
                table: table.clone(),
                column: expected.name.to_string(),
            });
            continue;
        };

        if found.sql_type != expected.sql_type {
            issues.push(SchemaIssue::ColumnType {
                table: table.clone(),
                column: expected.name.to_string(),
                expected: expected.sql_type.to_string(),
                found: found.sql_type.clone(),
            });
        }
        if found.not_null == expected.nullable {
            issues.push(SchemaIssue::Nullability {
                table: table.clone(),
                column: expected.name.to_string(),
                expected_nullable: expected.nullable,
            });
        }
        if found.primary_key != expected.primary_key {
            issues.push(SchemaIssue::PrimaryKey {
                table: table.clone(),
                column: expected.name.to_string(),
                expected_primary_key: expected.primary_key,
            });
        }
    }

    for found in &live.columns {
        if !def.columns.iter().any(|c| c.name == found.name) {
            issues.push(SchemaIssue::UnexpectedColumn {
                table: table.clone(),
                column: found.name.clone(),
            });
        }
    }

    for key in def.foreign_keys {
        let present = live.foreign_keys.iter().any(|k| {
            k.column == key.column && k.table == key.table && k.references == key.references
        });
        if !present {
            issues.push(SchemaIssue::MissingForeignKey {
                table: table.clone(),
                column: key.column.to_string(),
                references: format!("{}({})", key.table, key.references),
            });
        }
    }
}

/// Compare the live schema with what the applied migrations should have
/// produced. An empty result means the database matches.
pub fn verify(conn: &Connection) -> Result<Vec<SchemaIssue>> {
    let version = migrations::current_version(conn)?;
    let live = describe(conn)?;
    let expected: Vec<&TableDef> = expected_tables_at(version).collect();

    let mut issues = Vec::new();
    for def in &expected {
        match live.iter().find(|t| t.name == def.name) {
            Some(info) => verify_table(def, info, &mut issues),
            None => issues.push(SchemaIssue::MissingTable {
                table: def.name.to_string(),
            }),
        }
    }
    for info in &live {
        if !expected.iter().any(|d| d.name == info.name) {
            issues.push(SchemaIssue::UnexpectedTable {
                table: info.name.clone(),
            });
        }
    }

    if issues.is_empty() {
        tracing::debug!(version, "schema verified");
    } else {
        tracing::warn!(version, issues = issues.len(), "schema drift detected");
    }
    Ok(issues)
}

/// Like [`verify`], but fail with the first issue.
pub fn ensure_valid(conn: &Connection) -> Result<()> {
    match verify(conn)?.into_iter().next() {
        None => Ok(()),
        Some(issue) => Err(Error::Internal(format!("schema drift: {issue}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{run_migrations, run_migrations_to};

    #[test]
    fn fresh_database_verifies() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(verify(&conn).unwrap(), vec![]);
        ensure_valid(&conn).unwrap();
    }

    #[test]
    fn describe_matches_definitions() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let live = describe(&conn).unwrap();
        assert_eq!(live.len(), expected_tables().len());

        let plants = live.iter().find(|t| t.name == "plants").unwrap();
        let craft = plants.column("craft").unwrap();
        assert_eq!(craft.sql_type, "TEXT");
        assert!(!craft.not_null);
        assert_eq!(
            plants.foreign_keys,
            vec![ForeignKeyInfo {
                column: "craft".into(),
                table: "crafts".into(),
                references: "id".into(),
            }]
        );

        let join = live.iter().find(|t| t.name == "tiles_steaders").unwrap();
        assert!(join.columns.iter().all(|c| c.primary_key));
    }

    #[test]
    fn one_composite_type() {
        let composites = composite_types();
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0].name, "seed_grower");
        assert_eq!(composites[0].array_columns, &[("plants", "pedigree")]);
    }

    #[test]
    fn partial_migration_verifies_at_its_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations_to(&conn, 1).unwrap();
        assert_eq!(expected_tables_at(1).count(), 6);
        assert!(verify(&conn).unwrap().is_empty());
    }

    #[test]
    fn reports_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch("PRAGMA foreign_keys = OFF; DROP TABLE possess_steaders;")
            .unwrap();

        assert_eq!(
            verify(&conn).unwrap(),
            vec![SchemaIssue::MissingTable {
                table: "possess_steaders".into()
            }]
        );
        assert!(ensure_valid(&conn).is_err());
    }

    #[test]
    fn reports_missing_column_and_stray_table() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "DROP INDEX idx_plants_on_market;
             ALTER TABLE plants DROP COLUMN on_market;
             CREATE TABLE scratch (x INTEGER);",
        )
        .unwrap();

        let issues = verify(&conn).unwrap();
        assert!(issues.contains(&SchemaIssue::MissingColumn {
            table: "plants".into(),
            column: "on_market".into(),
        }));
        assert!(issues.contains(&SchemaIssue::UnexpectedTable {
            table: "scratch".into(),
        }));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn issue_display() {
        let issue = SchemaIssue::MissingForeignKey {
            table: "tiles".into(),
            column: "plant".into(),
            references: "plants(id)".into(),
        };
        assert_eq!(issue.to_string(), "tiles.plant should reference plants(id)");
    }
}
