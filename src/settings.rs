//! Run settings
//!
//! Everything a run needs besides the compile-time constants. Stored as JSON;
//! missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::difficulty::DifficultyProfile;
use crate::sim::factory::SegmentFactory;
use crate::sim::track::TrackConfig;
use crate::sim::vehicle::VehicleId;

/// Run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Track seed; same seed, same track
    pub seed: u64,

    // === Track window ===
    /// Segments kept generated ahead of the rider
    pub lookahead_segments: usize,
    /// Segments this far behind the rider are dropped
    pub trim_distance: f32,
    /// Start with the fixed intro run
    pub intro: bool,

    // === Rider ===
    pub starting_vehicle: VehicleId,

    // === Difficulty ===
    pub difficulty: DifficultyProfile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0,
            lookahead_segments: LOOKAHEAD_SEGMENTS,
            trim_distance: TRIM_DISTANCE,
            intro: true,
            starting_vehicle: VehicleId::default(),
            difficulty: DifficultyProfile::default(),
        }
    }
}

impl Settings {
    /// Default settings with a seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read settings from a JSON file, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("Cannot read {}: {err}; using default settings", path.display());
                return Self::default();
            }
        };
        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Invalid settings in {}: {err}; using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Track window configuration
    pub fn track_config(&self) -> TrackConfig {
        TrackConfig {
            lookahead_segments: self.lookahead_segments,
            trim_distance: self.trim_distance,
            intro: self.intro,
        }
    }

    /// Segment factory driven by this run's difficulty schedule
    pub fn factory(&self) -> SegmentFactory {
        SegmentFactory::new(self.difficulty.clone())
    }
}
