//! Difficulty schedule
//!
//! Every value is a pure function of distance travelled. The profile itself is
//! fixed for a run; only the distance argument changes.

use serde::{Deserialize, Serialize};

use crate::lerp;

/// Distance-driven difficulty parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Distance over which the continuous parameters ramp from start to end values
    pub ramp_distance: f32,
    /// Distance per difficulty tier
    pub tier_distance: f32,
    pub max_tier: u8,

    /// Guidance slope angle (radians) at the start and end of the ramp
    pub guidance_angle_start: f32,
    pub guidance_angle_end: f32,

    pub drop_multiplier_start: f32,
    pub drop_multiplier_end: f32,
    pub gap_multiplier_start: f32,
    pub gap_multiplier_end: f32,

    /// Longest run of same-terrain segments allowed, at the start and at the end
    pub max_terrain_run_start: u32,
    pub max_terrain_run_end: u32,

    /// Chance to switch terrain before the run bound forces it
    pub terrain_switch_chance_start: f32,
    pub terrain_switch_chance_end: f32,

    /// Chance a segment rolls a technical (bumpy) flavor
    pub technical_chance_start: f32,
    pub technical_chance_end: f32,
    /// Chance a segment rolls a steep flavor (tier 3+)
    pub steep_chance_start: f32,
    pub steep_chance_end: f32,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self {
            ramp_distance: 60_000.0,
            tier_distance: 12_000.0,
            max_tier: 5,

            guidance_angle_start: 12.0_f32.to_radians(),
            guidance_angle_end: 26.0_f32.to_radians(),

            drop_multiplier_start: 1.0,
            drop_multiplier_end: 1.5,
            gap_multiplier_start: 1.0,
            gap_multiplier_end: 1.6,

            max_terrain_run_start: 6,
            max_terrain_run_end: 2,

            terrain_switch_chance_start: 0.15,
            terrain_switch_chance_end: 0.45,

            technical_chance_start: 0.15,
            technical_chance_end: 0.45,
            steep_chance_start: 0.05,
            steep_chance_end: 0.3,
        }
    }
}

impl DifficultyProfile {
    /// Normalized progress through the ramp, in [0, 1]
    #[inline]
    pub fn progress(&self, distance: f32) -> f32 {
        if self.ramp_distance <= 0.0 {
            return 1.0;
        }
        (distance.max(0.0) / self.ramp_distance).min(1.0)
    }

    #[inline]
    fn ramp(&self, start: f32, end: f32, distance: f32) -> f32 {
        lerp(start, end, self.progress(distance))
    }

    /// Highest difficulty tier unlocked at a distance (1-based)
    pub fn max_tier(&self, distance: f32) -> u8 {
        let max = self.max_tier.max(1);
        if self.tier_distance <= 0.0 {
            return max;
        }
        let tier = 1 + (distance.max(0.0) / self.tier_distance).floor() as u32;
        tier.min(max as u32) as u8
    }

    /// Longest allowed run of same-terrain segments starting at a distance
    pub fn max_same_terrain_run(&self, distance: f32) -> u32 {
        let start = self.max_terrain_run_start as f32;
        let end = self.max_terrain_run_end as f32;
        (self.ramp(start, end, distance).round() as u32).max(1)
    }

    pub fn drop_multiplier(&self, distance: f32) -> f32 {
        self.ramp(self.drop_multiplier_start, self.drop_multiplier_end, distance)
    }

    pub fn gap_multiplier(&self, distance: f32) -> f32 {
        self.ramp(self.gap_multiplier_start, self.gap_multiplier_end, distance)
    }

    /// Macro downhill angle the terrain trends toward (radians)
    pub fn guidance_angle(&self, distance: f32) -> f32 {
        self.ramp(self.guidance_angle_start, self.guidance_angle_end, distance)
    }

    /// `tan(guidance_angle)`: the guidance slope as dy/dx
    pub fn guidance_slope(&self, distance: f32) -> f32 {
        self.guidance_angle(distance).tan()
    }

    pub fn terrain_switch_chance(&self, distance: f32) -> f32 {
        self.ramp(
            self.terrain_switch_chance_start,
            self.terrain_switch_chance_end,
            distance,
        )
        .clamp(0.0, 1.0)
    }

    pub fn technical_chance(&self, distance: f32) -> f32 {
        self.ramp(self.technical_chance_start, self.technical_chance_end, distance)
            .clamp(0.0, 1.0)
    }

    pub fn steep_chance(&self, distance: f32) -> f32 {
        self.ramp(self.steep_chance_start, self.steep_chance_end, distance)
            .clamp(0.0, 1.0)
    }
}
