//! Terrain surface types
//!
//! A terrain tag rides on every sub-section of the track and drives the
//! friction/drag coefficients the rider sees.

use serde::{Deserialize, Serialize};

/// Surface type of a stretch of track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainType {
    #[default]
    Snow,
    Powder,
    Ice,
    Dirt,
}

impl TerrainType {
    /// Every terrain, in unlock order
    pub const ALL: [TerrainType; 4] = [
        TerrainType::Snow,
        TerrainType::Powder,
        TerrainType::Ice,
        TerrainType::Dirt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerrainType::Snow => "Snow",
            TerrainType::Powder => "Powder",
            TerrainType::Ice => "Ice",
            TerrainType::Dirt => "Dirt",
        }
    }

    /// Quadratic air/snow drag coefficient before vehicle modifiers
    pub fn base_drag(&self) -> f32 {
        match self {
            TerrainType::Snow => 0.0004,
            TerrainType::Powder => 0.0006,
            TerrainType::Ice => 0.0003,
            TerrainType::Dirt => 0.0005,
        }
    }

    /// Constant rolling resistance (pixels/s²) before vehicle modifiers
    pub fn base_rolling_resistance(&self) -> f32 {
        match self {
            TerrainType::Snow => 8.0,
            TerrainType::Powder => 14.0,
            TerrainType::Ice => 3.0,
            TerrainType::Dirt => 22.0,
        }
    }

    /// Difficulty tier at which this terrain starts appearing
    pub fn unlock_tier(&self) -> u8 {
        match self {
            TerrainType::Snow | TerrainType::Powder => 1,
            TerrainType::Ice => 2,
            TerrainType::Dirt => 3,
        }
    }

    /// Terrains available at a difficulty tier
    pub fn unlocked(tier: u8) -> impl Iterator<Item = TerrainType> {
        Self::ALL.into_iter().filter(move |t| t.unlock_tier() <= tier)
    }
}

/// Per-terrain lookup table of one scalar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainTable {
    pub snow: f32,
    pub powder: f32,
    pub ice: f32,
    pub dirt: f32,
}

impl TerrainTable {
    /// Same value for every terrain
    pub const fn uniform(value: f32) -> Self {
        Self {
            snow: value,
            powder: value,
            ice: value,
            dirt: value,
        }
    }

    #[inline]
    pub fn get(&self, terrain: TerrainType) -> f32 {
        match terrain {
            TerrainType::Snow => self.snow,
            TerrainType::Powder => self.powder,
            TerrainType::Ice => self.ice,
            TerrainType::Dirt => self.dirt,
        }
    }
}
