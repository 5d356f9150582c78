//! Database query modules.
//!
//! One module per relation, plus two that span several:
//! - crafts, plants, tiles, profiles: row CRUD
//! - tiles_steaders: the tile ownership join table
//! - possessions: inventory rows and their owner join table
//! - hacksteaders: the whole-steader aggregate, written in one transaction
//! - market: listings and transfers

pub mod crafts;
pub mod hacksteaders;
pub mod market;
pub mod plants;
pub mod possessions;
pub mod profiles;
pub mod tiles;
pub mod tiles_steaders;
