//! Hacksteader-Common: shared types used by the storage layer and the CLI.
//!
//! - **Typed IDs**: UUID wrappers for crafts, plants, tiles and possessions
//! - **Game types**: seed lineage, ownership records and market sales
//! - **Error Handling**: one error enum and a result alias
//!
//! # Examples
//!
//! ```
//! use hacksteader_common::{Error, PlantId, Result, SeedGrower};
//!
//! let plant_id = PlantId::new();
//! let grower = SeedGrower::new("U012ABCDEF", 0);
//! assert_eq!(grower.generations, 0);
//!
//! fn lookup(id: PlantId) -> Result<()> {
//!     Err(Error::not_found("plant", id))
//! }
//! assert!(lookup(plant_id).is_err());
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
