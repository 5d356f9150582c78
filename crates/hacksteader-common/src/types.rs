//! Game value types stored inside rows.
//!
//! These are never tables of their own: lineage, ownership history and
//! possession payloads live in JSON columns, so every type here round-trips
//! through serde.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an archetype (plant species, item template) in the game config.
pub type ArchetypeHandle = u32;

/// One entry of a pedigree: who grew the seed, and how many generations ago.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedGrower {
    pub id: String,
    pub generations: u64,
}

impl SeedGrower {
    pub fn new(id: impl Into<String>, generations: u64) -> Self {
        Self {
            id: id.into(),
            generations,
        }
    }

    /// The same grower one generation further back.
    #[must_use]
    pub fn aged(&self) -> Self {
        Self {
            id: self.id.clone(),
            generations: self.generations.saturating_add(1),
        }
    }
}

/// Age every entry of `pedigree` by one generation and put `grower` first.
///
/// This is how a seed harvested from a plant inherits the plant's lineage.
pub fn descend(pedigree: &[SeedGrower], grower: impl Into<String>) -> Vec<SeedGrower> {
    let mut next = Vec::with_capacity(pedigree.len() + 1);
    next.push(SeedGrower::new(grower, 0));
    next.extend(pedigree.iter().map(SeedGrower::aged));
    next
}

/// How a possession came into someone's hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acquisition {
    Trade,
    Purchase { price: u64 },
    Farmed,
    Crafted,
    Hatched,
}

impl Acquisition {
    /// Items conjured by an admin or a welcome gift are recorded as trades.
    pub fn spawned() -> Self {
        Acquisition::Trade
    }
}

impl fmt::Display for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trade => write!(f, "Trade"),
            Self::Purchase { price } => write!(f, "Purchase({price}gp)"),
            Self::Farmed => write!(f, "Farmed"),
            Self::Crafted => write!(f, "Crafted"),
            Self::Hatched => write!(f, "Hatched"),
        }
    }
}

/// An entry in a possession's ownership log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub acquisition: Acquisition,
}

impl Owner {
    pub fn new(id: impl Into<String>, acquisition: Acquisition) -> Self {
        Self {
            id: id.into(),
            acquisition,
        }
    }

    pub fn farmer(id: impl Into<String>) -> Self {
        Self::new(id, Acquisition::Farmed)
    }

    pub fn crafter(id: impl Into<String>) -> Self {
        Self::new(id, Acquisition::Crafted)
    }

    pub fn hatcher(id: impl Into<String>) -> Self {
        Self::new(id, Acquisition::Hatched)
    }
}

/// Something put up for sale on the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// How much currency must be paid to acquire this item.
    pub price: u64,
    /// The name this item assumes for marketing purposes.
    pub market_name: String,
}

/// A record of how much a steader harvested from a gotchi.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GotchiHarvestOwner {
    pub id: String,
    pub harvested: u64,
}

/// Variant-specific payload of a possession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PossessionKind {
    Gotchi {
        nickname: String,
        harvest_log: Vec<GotchiHarvestOwner>,
    },
    Seed {
        pedigree: Vec<SeedGrower>,
    },
    Keepsake,
}

impl PossessionKind {
    /// A fresh gotchi, with its first owner on the harvest log.
    pub fn gotchi(nickname: impl Into<String>, owner_id: &str) -> Self {
        PossessionKind::Gotchi {
            nickname: nickname.into(),
            harvest_log: vec![GotchiHarvestOwner {
                id: owner_id.to_string(),
                harvested: 0,
            }],
        }
    }

    /// A fresh seed, grown by `owner_id`.
    pub fn seed(owner_id: &str) -> Self {
        PossessionKind::Seed {
            pedigree: vec![SeedGrower::new(owner_id, 0)],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gotchi { .. } => "gotchi",
            Self::Seed { .. } => "seed",
            Self::Keepsake => "keepsake",
        }
    }

    pub fn pedigree(&self) -> Option<&[SeedGrower]> {
        match self {
            Self::Seed { pedigree } => Some(pedigree),
            _ => None,
        }
    }
}
