//! Slope Runner - simulation core of a side-scrolling downhill momentum runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (momentum physics, procedural track, rider state machine)
//! - `settings`: Run configuration (seed, lookahead window, difficulty schedule)
//!
//! Coordinates are screen-space: +x is forward, +y is down. A "height" is a y value,
//! so going downhill means y increases.

pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Tuning constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    // --- Momentum ---

    /// Gravity (pixels/s², +y is down)
    pub const GRAVITY: f32 = 980.0;
    /// The rider never stalls: ground speed and horizontal air speed are floored here
    pub const MIN_FORWARD_SPEED: f32 = 80.0;
    /// Hard cap on ground speed
    pub const TERMINAL_VELOCITY: f32 = 1800.0;
    /// Quadratic drag applied to horizontal air velocity
    pub const AIR_DRAG: f32 = 0.00005;
    /// Ground speed when a run starts
    pub const INITIAL_SPEED: f32 = 250.0;
    /// Scale on the curvature launch threshold (`speed²·κ > g·scale`)
    pub const LAUNCH_SCALE: f32 = 1.0;

    // --- Tuck / dive ---

    /// Drag multiplier while tucking on the ground
    pub const TUCK_DRAG_MULTIPLIER: f32 = 0.55;
    /// Curvature launch threshold multiplier while tucking (downforce)
    pub const TUCK_LAUNCH_RESISTANCE: f32 = 1.6;
    /// Gravity multiplier while diving (airborne tuck)
    pub const DIVE_GRAVITY_MULTIPLIER: f32 = 1.8;
    /// Upward speed cap while diving (pixels/s)
    pub const DIVE_MAX_UPWARD_SPEED: f32 = 120.0;

    // --- Flips ---

    /// Flip angular rate at the reference speed (rad/s)
    pub const FLIP_BASE_RATE: f32 = 7.0;
    /// Ground speed at which the flip rate equals the base rate
    pub const FLIP_REFERENCE_SPEED: f32 = 400.0;
    /// Upper bound on flip angular rate (rad/s)
    pub const FLIP_MAX_RATE: f32 = 12.0;
    /// Allowed deviation from upright when landing a flip (35°)
    pub const FLIP_LANDING_TOLERANCE: f32 = 35.0 * std::f32::consts::PI / 180.0;
    /// Speed boost per completed flip (multiplicative, additive per flip)
    pub const FLIP_BOOST_PER_FLIP: f32 = 0.08;
    /// Drag-reduction window after a landed flip (seconds)
    pub const FLIP_BONUS_DURATION: f32 = 1.5;
    /// Drag multiplier inside the post-flip window
    pub const FLIP_BONUS_DRAG_MULTIPLIER: f32 = 0.5;
    /// Points for one full flip
    pub const FLIP_POINTS: u32 = 100;

    // --- Rider timers and contact ---

    /// Cooldown between vehicle swaps (seconds)
    pub const SWAP_COOLDOWN: f32 = 1.0;
    /// Grace period after losing floor contact before going airborne (seconds)
    pub const COYOTE_TIME: f32 = 0.1;
    /// Max gap between rider and floor that still counts as contact
    pub const SNAP_DISTANCE: f32 = 8.0;
    /// Falling this far below the local terrain height is a crash
    pub const FALL_DEATH_DEPTH: f32 = 600.0;
    /// Reaching the far side of a gap this far below the edge is a crash
    pub const WALL_STRIKE_DEPTH: f32 = 40.0;
    /// Rider collider radius (hazard overlap)
    pub const RIDER_RADIUS: f32 = 12.0;
    /// Where the rider starts on a fresh run
    pub const RIDER_START_X: f32 = 120.0;

    // --- Sampling ---

    /// Horizontal spacing of the three curvature samples
    pub const CURVATURE_SAMPLE_DX: f32 = 8.0;
    /// Half-width of the finite difference used for surface normals
    pub const NORMAL_SAMPLE_DX: f32 = 2.0;

    // --- Gap clearance ---

    /// Fraction of a gap that must be crossed to count as cleared
    pub const GAP_CLEARANCE_RATIO: f32 = 0.85;
    /// Vertical tolerance when the predicted path meets the landing height
    pub const PREDICTION_LANDING_TOLERANCE: f32 = 4.0;
    /// Prediction stops once past the far edge by this margin
    pub const PREDICTION_FORGIVENESS: f32 = 60.0;
    /// Hard bound on prediction sub-steps
    pub const PREDICTION_MAX_STEPS: u32 = 1200;
    /// A launch this close to a gap lip runs a clearance prediction
    pub const GAP_PREDICTION_RANGE: f32 = 160.0;

    // --- Track window ---

    /// Height reported when no segment has been placed at all
    pub const FALLBACK_FLOOR_Y: f32 = 0.0;
    /// Segments kept generated ahead of the rider
    pub const LOOKAHEAD_SEGMENTS: usize = 4;
    /// Segments whose landing edge is this far behind the rider are evicted
    pub const TRIM_DISTANCE: f32 = 2500.0;
    /// Pilot riders stop this far short of the newest lip (covers one tick of sampling)
    pub const PILOT_REACH: f32 = 32.0;
    /// Tick budget for a pilot crossing one segment
    pub const PILOT_MAX_TICKS: u32 = 20_000;

    // --- Curve blending ---

    /// Upper bound on the Hermite-to-shape blend zone at a sub-section boundary
    pub const BLEND_MAX_WIDTH: f32 = 120.0;
    /// Blend zone as a fraction of sub-section length
    pub const BLEND_FRACTION: f32 = 0.3;
    /// Sub-sections shorter than this are stretched at construction
    pub const MIN_SECTION_LENGTH: f32 = 40.0;

    // --- Gaps ---

    /// Gap width before drop ratio and difficulty scaling
    pub const BASE_GAP_WIDTH: f32 = 220.0;
    pub const MIN_GAP_WIDTH: f32 = 80.0;
    pub const MAX_GAP_WIDTH: f32 = 520.0;
    /// Each failed fairness ride narrows the gap by this factor
    pub const GAP_SHRINK_FACTOR: f32 = 0.9;
    /// Landing side sits lower than the lip by `width·tan(guidance)·ratio`
    pub const GAP_LANDING_DROP_RATIO: f32 = 0.35;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Tangent of a surface from its normal, rotated 90° so a flat floor `(0, -1)` gives `(1, 0)`
#[inline]
pub fn tangent_from_normal(normal: Vec2) -> Vec2 {
    Vec2::new(-normal.y, normal.x)
}

/// Normal of a surface from its tangent (inverse of [`tangent_from_normal`])
#[inline]
pub fn normal_from_tangent(tangent: Vec2) -> Vec2 {
    Vec2::new(tangent.y, -tangent.x)
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-5);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((normalize_angle(-2.5 * PI) - (-0.5 * PI)).abs() < 1e-5);
    }

    #[test]
    fn test_tangent_normal_round_trip() {
        let floor = Vec2::new(0.0, -1.0);
        assert_eq!(tangent_from_normal(floor), Vec2::new(1.0, 0.0));
        assert_eq!(normal_from_tangent(Vec2::new(1.0, 0.0)), floor);
    }
}
