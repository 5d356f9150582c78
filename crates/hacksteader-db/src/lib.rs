//! Hacksteader-DB: schema, migrations and query operations
//!
//! This crate stores hacksteads in SQLite using rusqlite and r2d2 connection
//! pooling.
//!
//! # Modules
//!
//! - `migrations` - Embedded, versioned schema migrations
//! - `pool` - Connection pool management
//! - `schema` - Expected schema description and live verification
//! - `models` - Rust models matching the database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use hacksteader_db::pool::{get_conn, init_pool, PoolOptions};
//! use hacksteader_db::queries::hacksteaders;
//!
//! let pool = init_pool("/var/lib/hacksteader/db.sqlite", &PoolOptions::default()).unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let steader = hacksteaders::new_hacksteader(&conn, "U012ABCDEF", 1).unwrap();
//! println!("{} owns {} tiles", steader.user_id, steader.land.len());
//! ```

mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod schema;

pub use error::from_sqlite;
