//! Token catalog: types, rarity weights and point values
//!
//! The catalog is process-wide configuration. It is built once and shared
//! read-only; sessions hold an `Arc` to it.

use std::fmt;
use std::sync::{Arc, LazyLock};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, ValidationError};

/// Player identity as reported by the wallet/login collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyPlayer);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token type id, always within 1..=MAX_TOKEN_TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TokenTypeId(u8);

impl TokenTypeId {
    pub fn new(id: i64) -> Result<Self, ValidationError> {
        if (1..=MAX_TOKEN_TYPE as i64).contains(&id) {
            Ok(Self(id as u8))
        } else {
            Err(ValidationError::TokenTypeOutOfRange(id))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TokenTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rarity tier drives both spawn weight and point value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RarityTier {
    Common,
    Rare,
    Epic,
}

impl RarityTier {
    /// Points awarded for collecting a token of this tier
    pub fn points(self) -> u64 {
        match self {
            RarityTier::Common => COMMON_POINTS,
            RarityTier::Rare => RARE_POINTS,
            RarityTier::Epic => EPIC_POINTS,
        }
    }

    /// Default spawn weight for this tier
    pub fn default_weight(self) -> u32 {
        match self {
            RarityTier::Common => 50,
            RarityTier::Rare => 20,
            RarityTier::Epic => 5,
        }
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenType {
    pub id: TokenTypeId,
    pub tier: RarityTier,
    pub weight: u32,
}

impl TokenType {
    pub fn points(&self) -> u64 {
        self.tier.points()
    }
}

static STANDARD: LazyLock<Arc<Catalog>> = LazyLock::new(|| Arc::new(Catalog::build_standard()));

/// Ordered set of token types with weighted selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    types: Vec<TokenType>,
}

impl Catalog {
    /// Build a catalog from explicit entries (order is selection order)
    pub fn new(types: Vec<TokenType>) -> Result<Self, ConfigError> {
        if types.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for (i, t) in types.iter().enumerate() {
            if types[..i].iter().any(|other| other.id == t.id) {
                return Err(ConfigError::DuplicateTokenType(t.id.get()));
            }
        }
        Ok(Self { types })
    }

    /// The shared 15-type catalog: 1-10 Common, 11-13 Rare, 14-15 Epic
    pub fn standard() -> Arc<Catalog> {
        Arc::clone(&STANDARD)
    }

    fn build_standard() -> Self {
        let types = (1..=MAX_TOKEN_TYPE)
            .map(|id| {
                let tier = match id {
                    1..=10 => RarityTier::Common,
                    11..=13 => RarityTier::Rare,
                    _ => RarityTier::Epic,
                };
                TokenType {
                    id: TokenTypeId(id),
                    tier,
                    weight: tier.default_weight(),
                }
            })
            .collect();
        Self { types }
    }

    pub fn types(&self) -> &[TokenType] {
        &self.types
    }

    pub fn get(&self, id: TokenTypeId) -> Option<&TokenType> {
        self.types.iter().find(|t| t.id == id)
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> u64 {
        self.types.iter().map(|t| t.weight as u64).sum()
    }

    /// Map a draw in [0, total_weight) to a type id.
    ///
    /// Returns the first type whose cumulative weight exceeds the draw.
    /// Out-of-range draws and all-zero weights fall back to the first entry.
    pub fn select_by_draw(&self, draw: u64) -> TokenTypeId {
        let mut cumulative = 0u64;
        for t in &self.types {
            cumulative += t.weight as u64;
            if cumulative > draw {
                return t.id;
            }
        }
        self.types[0].id
    }

    /// Pick a token type with probability proportional to its weight
    pub fn select<R: Rng>(&self, rng: &mut R) -> TokenTypeId {
        let total = self.total_weight();
        if total == 0 {
            log::warn!("All catalog weights are zero, falling back to first type");
            return self.types[0].id;
        }
        self.select_by_draw(rng.random_range(0..total))
    }

    /// Score Accumulator mapping: points for a collected type
    pub fn points_for(&self, id: TokenTypeId) -> u64 {
        self.get(id).map_or(0, TokenType::points)
    }
}
