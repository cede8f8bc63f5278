//! Vehicle profiles
//!
//! Vehicles are plain data: a set of coefficients plus per-terrain tables.
//! Swapping vehicles selects a different profile from the roster; profiles are
//! never mutated during a run.

use serde::{Deserialize, Serialize};

use super::terrain::{TerrainTable, TerrainType};
use crate::consts::TERMINAL_VELOCITY;

/// Vehicle identifiers, in swap order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VehicleId {
    #[default]
    Snowboard,
    Skis,
    Sled,
}

impl VehicleId {
    pub const ALL: [VehicleId; 3] = [VehicleId::Snowboard, VehicleId::Skis, VehicleId::Sled];

    /// Next vehicle in the swap cycle
    pub fn next(&self) -> VehicleId {
        match self {
            VehicleId::Snowboard => VehicleId::Skis,
            VehicleId::Skis => VehicleId::Sled,
            VehicleId::Sled => VehicleId::Snowboard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleId::Snowboard => "Snowboard",
            VehicleId::Skis => "Skis",
            VehicleId::Sled => "Sled",
        }
    }
}

/// Per-vehicle physics coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub id: VehicleId,
    /// Scales the terrain drag coefficient
    pub drag_modifier: f32,
    /// Scales the terrain rolling resistance
    pub rolling_resistance_modifier: f32,
    /// Scales gravity while airborne
    pub gravity_multiplier: f32,
    /// Scales flip angular rate
    pub flip_speed_modifier: f32,
    /// Ground speed cap (never above the global terminal velocity)
    pub max_speed: f32,
    /// Flat acceleration bonus on each terrain (pixels/s²)
    pub terrain_bonus: TerrainTable,
    /// Extra friction multiplier on each terrain
    pub terrain_friction: TerrainTable,
    /// Extra drag multiplier on each terrain
    pub terrain_drag: TerrainTable,
}

impl VehicleProfile {
    pub fn snowboard() -> Self {
        Self {
            id: VehicleId::Snowboard,
            drag_modifier: 1.0,
            rolling_resistance_modifier: 1.0,
            gravity_multiplier: 1.0,
            flip_speed_modifier: 1.15,
            max_speed: 1500.0,
            terrain_bonus: TerrainTable {
                snow: 0.0,
                powder: 6.0,
                ice: -4.0,
                dirt: 0.0,
            },
            terrain_friction: TerrainTable {
                snow: 1.0,
                powder: 0.8,
                ice: 1.0,
                dirt: 1.3,
            },
            terrain_drag: TerrainTable::uniform(1.0),
        }
    }

    pub fn skis() -> Self {
        Self {
            id: VehicleId::Skis,
            drag_modifier: 0.9,
            rolling_resistance_modifier: 0.85,
            gravity_multiplier: 1.05,
            flip_speed_modifier: 0.9,
            max_speed: 1650.0,
            terrain_bonus: TerrainTable {
                snow: 4.0,
                powder: -2.0,
                ice: 8.0,
                dirt: -6.0,
            },
            terrain_friction: TerrainTable {
                snow: 1.0,
                powder: 1.25,
                ice: 0.7,
                dirt: 1.5,
            },
            terrain_drag: TerrainTable {
                snow: 1.0,
                powder: 1.1,
                ice: 0.9,
                dirt: 1.2,
            },
        }
    }

    pub fn sled() -> Self {
        Self {
            id: VehicleId::Sled,
            drag_modifier: 1.2,
            rolling_resistance_modifier: 0.7,
            gravity_multiplier: 1.2,
            flip_speed_modifier: 0.7,
            max_speed: 1350.0,
            terrain_bonus: TerrainTable {
                snow: 0.0,
                powder: 0.0,
                ice: 2.0,
                dirt: 10.0,
            },
            terrain_friction: TerrainTable {
                snow: 1.0,
                powder: 1.0,
                ice: 0.9,
                dirt: 0.6,
            },
            terrain_drag: TerrainTable {
                snow: 1.0,
                powder: 1.2,
                ice: 1.0,
                dirt: 0.8,
            },
        }
    }

    /// Built-in profile for an id
    pub fn for_id(id: VehicleId) -> Self {
        match id {
            VehicleId::Snowboard => Self::snowboard(),
            VehicleId::Skis => Self::skis(),
            VehicleId::Sled => Self::sled(),
        }
    }

    /// Effective quadratic drag on a terrain
    #[inline]
    pub fn drag_coefficient(&self, terrain: TerrainType) -> f32 {
        terrain.base_drag() * self.drag_modifier * self.terrain_drag.get(terrain)
    }

    /// Effective rolling resistance on a terrain
    #[inline]
    pub fn rolling_resistance(&self, terrain: TerrainType) -> f32 {
        terrain.base_rolling_resistance()
            * self.rolling_resistance_modifier
            * self.terrain_friction.get(terrain)
    }

    #[inline]
    pub fn terrain_bonus(&self, terrain: TerrainType) -> f32 {
        self.terrain_bonus.get(terrain)
    }

    /// Ground speed cap for this vehicle
    #[inline]
    pub fn speed_cap(&self) -> f32 {
        self.max_speed.min(TERMINAL_VELOCITY)
    }
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self::snowboard()
    }
}

/// The set of vehicles a run can swap between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRoster {
    pub profiles: Vec<VehicleProfile>,
}

impl Default for VehicleRoster {
    fn default() -> Self {
        Self {
            profiles: VehicleId::ALL.iter().map(|&id| VehicleProfile::for_id(id)).collect(),
        }
    }
}

impl VehicleRoster {
    /// Profile for an id, falling back to the built-in one if the roster lacks it
    pub fn get(&self, id: VehicleId) -> VehicleProfile {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap_or_else(|| VehicleProfile::for_id(id))
    }
}
