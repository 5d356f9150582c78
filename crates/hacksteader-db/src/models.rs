//! Rust structs mapping to database tables.
//!
//! Row models implement `from_row` for constructing themselves from a
//! `rusqlite::Row` selected in table column order. The aggregate
//! [`Hacksteader`] ties a steader's profile, land and inventory together.

use chrono::{DateTime, SecondsFormat, Utc};
use hacksteader_common::{
    ArchetypeHandle, CraftId, Error, Owner, PlantId, PossessionId, PossessionKind, Result, Sale,
    SeedGrower, TileId,
};
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn conversion_failure(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Parse a UUID-based ID from a text column.
pub(crate) fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_failure(idx, e))?;
    Ok(T::from(uuid))
}

pub(crate) fn parse_opt_id<T: From<Uuid>>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|v| {
        Uuid::parse_str(&v)
            .map(T::from)
            .map_err(|e| conversion_failure(idx, e))
    })
    .transpose()
}

fn parse_time(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_failure(idx, e))
}

fn parse_json<T: DeserializeOwned>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conversion_failure(idx, e))
}

fn get_u64(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<u64> {
    let v: i64 = row.get(idx)?;
    u64::try_from(v).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, v))
}

/// Convert an unsigned counter into SQLite's signed integer range.
pub(crate) fn to_sql_int(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::validation(format!("{what} {value} is out of range")))
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub(crate) fn to_sql_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// ---------------------------------------------------------------------------
// Craft
// ---------------------------------------------------------------------------

/// An in-progress or completed crafting action on a plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Craft {
    pub id: CraftId,
    pub until_finish: f32,
    pub total_cycles: f32,
    pub destroys_plant: bool,
    /// Archetype of the item the craft yields.
    pub makes: ArchetypeHandle,
}

impl Craft {
    pub fn new(total_cycles: f32, destroys_plant: bool, makes: ArchetypeHandle) -> Self {
        Self {
            id: CraftId::new(),
            until_finish: total_cycles,
            total_cycles,
            destroys_plant,
            makes,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.until_finish <= 0.0
    }

    /// Fraction of the craft completed, clamped to `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.total_cycles <= 0.0 {
            return 1.0;
        }
        (1.0 - self.until_finish / self.total_cycles).clamp(0.0, 1.0)
    }

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            until_finish: row.get(1)?,
            total_cycles: row.get(2)?,
            destroys_plant: row.get(3)?,
            makes: row.get(4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Plant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    pub xp: u64,
    pub until_yield: f32,
    pub craft: Option<CraftId>,
    pub pedigree: Vec<SeedGrower>,
    pub archetype_handle: ArchetypeHandle,
    pub on_market: bool,
}

impl Plant {
    pub fn new(archetype_handle: ArchetypeHandle, until_yield: f32, pedigree: Vec<SeedGrower>) -> Self {
        Self {
            id: PlantId::new(),
            xp: 0,
            until_yield,
            craft: None,
            pedigree,
            archetype_handle,
            on_market: false,
        }
    }

    pub fn is_crafting(&self) -> bool {
        self.craft.is_some()
    }

    /// Build from a row selected as:
    /// id, xp, until_yield, craft, pedigree, archetype_handle, on_market
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            xp: get_u64(row, 1)?,
            until_yield: row.get(2)?,
            craft: parse_opt_id(row, 3)?,
            pedigree: parse_json(row, 4)?,
            archetype_handle: row.get(5)?,
            on_market: row.get(6)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub acquired: DateTime<Utc>,
    pub plant: Option<PlantId>,
    pub steader: String,
}

impl Tile {
    pub fn new(steader: impl Into<String>) -> Self {
        Self {
            id: TileId::new(),
            acquired: Utc::now(),
            plant: None,
            steader: steader.into(),
        }
    }

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            acquired: parse_time(row, 1)?,
            plant: parse_opt_id(row, 2)?,
            steader: row.get(3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// When this steader first joined.
    pub joined: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub last_farm: DateTime<Utc>,
    /// Not a UUID: this is the user id of the steader who owns the profile.
    pub id: String,
    pub xp: u64,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            joined: now,
            last_active: now,
            last_farm: now,
            id: id.into(),
            xp: 0,
        }
    }

    /// Record activity at `now`; a farm action also moves `last_farm`.
    pub fn touch(&mut self, now: DateTime<Utc>, farmed: bool) {
        self.last_active = now;
        if farmed {
            self.last_farm = now;
        }
    }

    /// Build from a row selected as: joined, last_active, last_farm, id, xp
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            joined: parse_time(row, 0)?,
            last_active: parse_time(row, 1)?,
            last_farm: parse_time(row, 2)?,
            id: row.get(3)?,
            xp: get_u64(row, 4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Join rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HacksteaderRow {
    pub user_id: String,
    pub profile: String,
}

impl HacksteaderRow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            profile: row.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSteader {
    pub steader_id: String,
    pub tile_id: TileId,
}

impl TileSteader {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            steader_id: row.get(0)?,
            tile_id: parse_id(row, 1)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Possession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Possession {
    pub id: PossessionId,
    pub archetype_handle: ArchetypeHandle,
    pub kind: PossessionKind,
    pub steader: String,
    pub ownership_log: Vec<Owner>,
    pub sale: Option<Sale>,
}

impl Possession {
    pub fn new(archetype_handle: ArchetypeHandle, kind: PossessionKind, owner: Owner) -> Self {
        Self {
            id: PossessionId::new(),
            archetype_handle,
            kind,
            steader: owner.id.clone(),
            ownership_log: vec![owner],
            sale: None,
        }
    }

    pub fn is_for_sale(&self) -> bool {
        self.sale.is_some()
    }

    /// Build from a row selected as:
    /// id, archetype_handle, kind, steader, ownership_log, sale_price, market_name
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let sale_price: Option<i64> = row.get(5)?;
        let market_name: Option<String> = row.get(6)?;
        let sale = match (sale_price, market_name) {
            (Some(price), Some(market_name)) => Some(Sale {
                price: u64::try_from(price)
                    .map_err(|_| rusqlite::Error::IntegralValueOutOfRange(5, price))?,
                market_name,
            }),
            _ => None,
        };

        Ok(Self {
            id: parse_id(row, 0)?,
            archetype_handle: row.get(1)?,
            kind: parse_json(row, 2)?,
            steader: row.get(3)?,
            ownership_log: parse_json(row, 4)?,
            sale,
        })
    }
}

// ---------------------------------------------------------------------------
// Hacksteader aggregate
// ---------------------------------------------------------------------------

/// A plant together with the craft it is working on, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantedCrop {
    pub plant: Plant,
    pub craft: Option<Craft>,
}

/// One tile of a steader's land and whatever grows on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Land {
    pub tile: Tile,
    pub crop: Option<PlantedCrop>,
}

impl Land {
    pub fn empty(tile: Tile) -> Self {
        Self { tile, crop: None }
    }

    /// Put `plant` (and its craft) on `tile`, wiring up both references.
    pub fn planted(mut tile: Tile, mut plant: Plant, craft: Option<Craft>) -> Self {
        tile.plant = Some(plant.id);
        plant.craft = craft.as_ref().map(|c| c.id);
        Self {
            tile,
            crop: Some(PlantedCrop { plant, craft }),
        }
    }
}

/// Everything a steader owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hacksteader {
    pub user_id: String,
    pub profile: Profile,
    pub land: Vec<Land>,
    pub inventory: Vec<Possession>,
}

impl Hacksteader {
    /// A fresh steader with `tiles` empty tiles and nothing in their pockets.
    pub fn new(user_id: impl Into<String>, tiles: usize) -> Self {
        let user_id = user_id.into();
        Self {
            profile: Profile::new(user_id.clone()),
            land: (0..tiles).map(|_| Land::empty(Tile::new(user_id.clone()))).collect(),
            inventory: Vec::new(),
            user_id,
        }
    }

    /// Tiles not occupied by plants.
    pub fn open_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.land
            .iter()
            .filter(|l| l.crop.is_none())
            .map(|l| &l.tile)
    }

    pub fn plants(&self) -> impl Iterator<Item = &Plant> {
        self.land
            .iter()
            .filter_map(|l| l.crop.as_ref())
            .map(|c| &c.plant)
    }

    /// Possessions whose kind is a gotchi.
    pub fn gotchis(&self) -> impl Iterator<Item = &Possession> {
        self.inventory
            .iter()
            .filter(|p| matches!(p.kind, PossessionKind::Gotchi { .. }))
    }

    /// Check that every row in the aggregate points where the tables expect.
    ///
    /// Possessions must belong to this steader, a tile's plant reference
    /// must match the crop on it, and a plant's craft reference must match
    /// its craft. Tiles may name another steader in their `steader` column:
    /// a shared tile keeps the owner that first planted it.
    pub fn check_consistency(&self) -> Result<()> {
        if self.profile.id != self.user_id {
            return Err(Error::validation(format!(
                "profile {} does not belong to steader {}",
                self.profile.id, self.user_id
            )));
        }

        for land in &self.land {
            let tile = &land.tile;
            let crop_plant = land.crop.as_ref().map(|c| c.plant.id);
            if tile.plant != crop_plant {
                return Err(Error::validation(format!(
                    "tile {} plant reference does not match its crop",
                    tile.id
                )));
            }

            if let Some(crop) = &land.crop {
                if crop.plant.craft != crop.craft.as_ref().map(|c| c.id) {
                    return Err(Error::validation(format!(
                        "plant {} craft reference does not match its craft",
                        crop.plant.id
                    )));
                }
            }
        }

        if let Some(p) = self.inventory.iter().find(|p| p.steader != self.user_id) {
            return Err(Error::validation(format!(
                "possession {} belongs to {}, not {}",
                p.id, p.steader, self.user_id
            )));
        }

        Ok(())
    }
}
