//! Typed ID wrappers for the UUID-keyed relations.
//!
//! Steaders are keyed by their chat user id (plain text), so only crafts,
//! plants, tiles and possessions get a newtype here. Each is stored as the
//! hyphenated UUID text in its table's primary key and in every column that
//! points back at it:
//!
//! | ID             | Primary key      | Referenced by                      |
//! |----------------|------------------|------------------------------------|
//! | `CraftId`      | `crafts.id`      | `plants.craft`                     |
//! | `PlantId`      | `plants.id`      | `tiles.plant`                      |
//! | `TileId`       | `tiles.id`       | `tiles_steaders.tile_id`           |
//! | `PossessionId` | `possessions.id` | `possess_steaders.possession_id`   |
//!
//! The user id text is `profiles.id`, `hacksteaders.user_id` and
//! `hacksteaders.profile`, and appears again as `tiles.steader`,
//! `possessions.steader` and the `steader_id` column of both join tables.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a newtype ID wrapper over `Uuid`.
///
/// The macro produces a struct with:
/// - `new()` to create a random v4 UUID
/// - `Display` and `FromStr` delegating to the inner UUID
/// - `From<Uuid>` and `Into<Uuid>` conversions
/// - `Default` that generates a new random ID
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                /// Create a new random ID.
                #[must_use]
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }

                /// Return the inner UUID value.
                #[must_use]
                pub fn as_uuid(&self) -> &Uuid {
                    &self.0
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = uuid::Error;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    Uuid::parse_str(s).map(Self)
                }
            }

            impl From<Uuid> for $name {
                fn from(uuid: Uuid) -> Self {
                    Self(uuid)
                }
            }

            impl From<$name> for Uuid {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Unique identifier for a crafting action.
    CraftId,
    /// Unique identifier for a plant.
    PlantId,
    /// Unique identifier for a tile of land.
    TileId,
    /// Unique identifier for an inventory possession.
    PossessionId,
}
