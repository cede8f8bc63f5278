//! Momentum physics
//!
//! Pure functions only. The rider controller and the trajectory predictor call
//! the same functions with the same inputs, so a predicted jump and the real
//! jump produce bit-identical paths.
//!
//! Sign conventions: +y is down, slope angles are positive downhill.

use glam::Vec2;

use crate::consts::*;
use crate::{normalize_angle, tangent_from_normal};

/// Signed slope angle of a surface from its normal (positive = downhill)
#[inline]
pub fn signed_slope_angle(normal: Vec2) -> f32 {
    let tangent = tangent_from_normal(normal);
    tangent.y.atan2(tangent.x)
}

/// Along-surface acceleration on the ground
///
/// `g·sin(slope) - drag·speed² - rolling_resistance + terrain_bonus`
#[inline]
pub fn ground_acceleration(
    speed: f32,
    signed_slope: f32,
    drag_coeff: f32,
    rolling_resistance: f32,
    vehicle_terrain_bonus: f32,
) -> f32 {
    GRAVITY * signed_slope.sin() - drag_coeff * speed * speed - rolling_resistance
        + vehicle_terrain_bonus
}

/// Advance ground speed, clamped to `[MIN_FORWARD_SPEED, terminal_velocity]`
#[inline]
pub fn integrate_speed(speed: f32, accel: f32, dt: f32, terminal_velocity: f32) -> f32 {
    let max = terminal_velocity.max(MIN_FORWARD_SPEED);
    (speed + accel * dt).clamp(MIN_FORWARD_SPEED, max)
}

/// Advance an airborne velocity by one step
///
/// Gravity on the vertical component, light quadratic drag on the horizontal
/// component, horizontal speed floored so the rider always drifts forward.
#[inline]
pub fn integrate_airborne(velocity: Vec2, dt: f32, gravity_multiplier: f32) -> Vec2 {
    let vy = velocity.y + GRAVITY * gravity_multiplier * dt;
    let vx = velocity.x - AIR_DRAG * velocity.x * velocity.x.abs() * dt;
    Vec2::new(vx.max(MIN_FORWARD_SPEED), vy)
}

/// One semi-implicit Euler flight step: velocity first, then position
///
/// Live flight and [`predict_gap_clearance`] both go through here.
#[inline]
pub fn step_airborne(pos: Vec2, velocity: Vec2, dt: f32, gravity_multiplier: f32) -> (Vec2, Vec2) {
    let velocity = integrate_airborne(velocity, dt, gravity_multiplier);
    (pos + velocity * dt, velocity)
}

/// Surface tangent pointing in the direction of travel (+x)
#[inline]
pub fn forward_tangent(surface_normal: Vec2) -> Vec2 {
    let tangent = tangent_from_normal(surface_normal.normalize_or(Vec2::NEG_Y));
    if tangent.x < 0.0 { -tangent } else { tangent }
}

/// Convert ground speed into an airborne velocity along the launch tangent
#[inline]
pub fn compute_launch_velocity(speed: f32, surface_normal: Vec2) -> Vec2 {
    forward_tangent(surface_normal) * speed
}

/// Ground speed recovered on landing: air velocity projected onto the surface tangent
#[inline]
pub fn landing_speed(velocity: Vec2, surface_normal: Vec2) -> f32 {
    velocity.dot(forward_tangent(surface_normal)).max(MIN_FORWARD_SPEED)
}

/// Flip angular velocity, scaling with speed, capped at `FLIP_MAX_RATE`
#[inline]
pub fn flip_angular_velocity(speed: f32, vehicle_flip_modifier: f32) -> f32 {
    (FLIP_BASE_RATE * (speed / FLIP_REFERENCE_SPEED) * vehicle_flip_modifier)
        .clamp(0.0, FLIP_MAX_RATE)
}

/// Rotation integrates linearly in time
#[inline]
pub fn integrate_rotation(rotation: f32, angular_velocity: f32, dt: f32) -> f32 {
    rotation + angular_velocity * dt
}

/// Number of full turns contained in an accumulated rotation
#[inline]
pub fn completed_flips(rotation: f32) -> u32 {
    (rotation.abs() / std::f32::consts::TAU).floor() as u32
}

/// Angular distance from the nearest upright orientation (multiple of a full turn)
#[inline]
pub fn upright_deviation(rotation: f32) -> f32 {
    normalize_angle(rotation).abs()
}

/// Whether a rotation lands within `tolerance` of upright
#[inline]
pub fn is_safe_landing(rotation: f32, tolerance: f32) -> bool {
    upright_deviation(rotation) <= tolerance
}

/// Signed curvature from three equally spaced height samples
///
/// `κ = h'' / (1 + h'²)^1.5`. With +y down, a crest (surface falling away)
/// has positive curvature.
#[inline]
pub fn curvature_from_heights(h_prev: f32, h_mid: f32, h_next: f32, dx: f32) -> f32 {
    if dx <= 0.0 {
        return 0.0;
    }
    let d1 = (h_next - h_prev) / (2.0 * dx);
    let d2 = (h_next - 2.0 * h_mid + h_prev) / (dx * dx);
    d2 / (1.0 + d1 * d1).powf(1.5)
}

/// `speed²·κ` above which the rider leaves the surface
#[inline]
pub fn launch_threshold(gravity_multiplier: f32, tucking: bool) -> f32 {
    let base = GRAVITY * gravity_multiplier * LAUNCH_SCALE;
    if tucking { base * TUCK_LAUNCH_RESISTANCE } else { base }
}

/// Curvature-triggered detachment. Only convex (positive) curvature launches.
#[inline]
pub fn should_detach(speed: f32, curvature: f32, gravity_multiplier: f32, tucking: bool) -> bool {
    curvature > 0.0 && speed * speed * curvature > launch_threshold(gravity_multiplier, tucking)
}

/// The part of a gap a prediction is evaluated against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapTarget {
    pub start_x: f32,
    pub width: f32,
    pub landing_y: f32,
}

/// Outcome of a simulated jump
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapPrediction {
    pub clears: bool,
    pub landing_x: f32,
    pub landing_y: f32,
    /// Flight steps simulated (replaying this many `step_airborne` calls reproduces the landing)
    pub steps: u32,
}

/// Pass/fail rule for a landing x against a gap
#[inline]
pub fn clears_gap(landing_x: f32, gap_start: f32, width: f32, clearance_ratio: f32) -> bool {
    landing_x >= gap_start + width * clearance_ratio - 1e-3
}

/// Simulate a launch forward with [`step_airborne`] until the path meets the
/// landing height or passes the far edge plus the forgiveness margin
pub fn predict_gap_clearance(
    launch_pos: Vec2,
    launch_vel: Vec2,
    gap: GapTarget,
    gravity_multiplier: f32,
    dt: f32,
    clearance_ratio: f32,
) -> GapPrediction {
    let far_limit = gap.start_x + gap.width + PREDICTION_FORGIVENESS;
    let mut pos = launch_pos;
    let mut vel = launch_vel;
    let mut steps = 0;

    while steps < PREDICTION_MAX_STEPS {
        (pos, vel) = step_airborne(pos, vel, dt, gravity_multiplier);
        steps += 1;

        let descending = vel.y > 0.0;
        if descending && pos.y >= gap.landing_y - PREDICTION_LANDING_TOLERANCE {
            break;
        }
        if pos.x > far_limit {
            break;
        }
    }

    GapPrediction {
        clears: clears_gap(pos.x, gap.start_x, gap.width, clearance_ratio),
        landing_x: pos.x,
        landing_y: pos.y,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, TAU};

    #[test]
    fn test_flat_floor_slope_is_zero() {
        assert_eq!(signed_slope_angle(Vec2::new(0.0, -1.0)), 0.0);
    }

    #[test]
    fn test_downhill_slope_is_positive() {
        // Surface falling to the right: normal leans forward
        let normal = Vec2::new(0.3, -1.0).normalize();
        assert!(signed_slope_angle(normal) > 0.0);
        let uphill = Vec2::new(-0.3, -1.0).normalize();
        assert!(signed_slope_angle(uphill) < 0.0);
    }

    #[test]
    fn test_flat_ground_acceleration() {
        let slope = signed_slope_angle(Vec2::new(0.0, -1.0));
        let accel = ground_acceleration(300.0, slope, 0.0004, 8.0, 0.0);
        assert!((accel - (-44.0)).abs() < 1e-3, "accel = {accel}");
    }

    #[test]
    fn test_speed_floor_and_cap() {
        assert_eq!(integrate_speed(100.0, -1.0e6, SIM_DT, 1000.0), MIN_FORWARD_SPEED);
        assert_eq!(integrate_speed(990.0, 1.0e6, SIM_DT, 1000.0), 1000.0);
        let v = integrate_speed(300.0, 120.0, 0.5, 1000.0);
        assert!((v - 360.0).abs() < 1e-4);
    }

    #[test]
    fn test_airborne_gravity_and_forward_floor() {
        let v = integrate_airborne(Vec2::new(0.0, 0.0), 0.1, 1.0);
        assert!((v.y - GRAVITY * 0.1).abs() < 1e-3);
        assert_eq!(v.x, MIN_FORWARD_SPEED);

        let fast = integrate_airborne(Vec2::new(1000.0, 0.0), 0.1, 1.0);
        assert!(fast.x < 1000.0);
    }

    #[test]
    fn test_launch_velocity_points_forward() {
        let v = compute_launch_velocity(400.0, Vec2::new(0.0, -1.0));
        assert!((v - Vec2::new(400.0, 0.0)).length() < 1e-4);

        // An upside-down normal must still launch forward
        let v = compute_launch_velocity(400.0, Vec2::new(0.0, 1.0));
        assert!(v.x > 0.0);

        // Ramp lip tilted upward launches up (negative y)
        let ramp = Vec2::new(-0.35, -1.0).normalize();
        assert!(compute_launch_velocity(400.0, ramp).y < 0.0);
    }

    #[test]
    fn test_landing_speed_projects_onto_tangent() {
        let speed = landing_speed(Vec2::new(300.0, 400.0), Vec2::new(0.0, -1.0));
        assert!((speed - 300.0).abs() < 1e-4);
    }

    #[test]
    fn test_flip_rate_scales_and_caps() {
        let at_ref = flip_angular_velocity(FLIP_REFERENCE_SPEED, 1.0);
        assert!((at_ref - FLIP_BASE_RATE).abs() < 1e-5);
        assert_eq!(flip_angular_velocity(10_000.0, 1.0), FLIP_MAX_RATE);
    }

    #[test]
    fn test_flip_counting_and_landing_window() {
        assert_eq!(completed_flips(TAU * 0.9), 0);
        assert_eq!(completed_flips(TAU * 2.1), 2);
        assert!(is_safe_landing(TAU + 0.2, FLIP_LANDING_TOLERANCE));
        assert!(is_safe_landing(TAU - 0.2, FLIP_LANDING_TOLERANCE));
        assert!(!is_safe_landing(TAU + FRAC_PI_2, FLIP_LANDING_TOLERANCE));
    }

    #[test]
    fn test_curvature_sign() {
        // Crest: heights rise toward the middle (smaller y), surface falls away
        let crest = curvature_from_heights(10.0, 0.0, 10.0, 8.0);
        assert!(crest > 0.0);
        let dip = curvature_from_heights(-10.0, 0.0, -10.0, 8.0);
        assert!(dip < 0.0);
        assert_eq!(curvature_from_heights(1.0, 2.0, 3.0, 8.0), 0.0);
    }

    #[test]
    fn test_detach_only_on_convex() {
        assert!(should_detach(800.0, 0.01, 1.0, false));
        assert!(!should_detach(800.0, -0.01, 1.0, false));
        assert!(!should_detach(100.0, 0.01, 1.0, false));
    }

    #[test]
    fn test_tuck_raises_launch_threshold() {
        // speed²·κ = 1200: above the base threshold, below the tucked one
        let speed = 400.0;
        let kappa = 1200.0 / (speed * speed);
        assert!(should_detach(speed, kappa, 1.0, false));
        assert!(!should_detach(speed, kappa, 1.0, true));
    }

    #[test]
    fn test_clearance_ratio_boundary() {
        let gap_start = 1000.0;
        assert!(clears_gap(gap_start + 255.0, gap_start, 300.0, 0.85));
        assert!(!clears_gap(gap_start + 200.0, gap_start, 300.0, 0.85));
    }

    #[test]
    fn test_prediction_fast_rider_clears() {
        let gap = GapTarget {
            start_x: 0.0,
            width: 300.0,
            landing_y: 40.0,
        };
        let vel = compute_launch_velocity(650.0, Vec2::new(-0.3, -1.0).normalize());
        let p = predict_gap_clearance(Vec2::ZERO, vel, gap, 1.0, SIM_DT, 0.85);
        assert!(p.clears, "{p:?}");
        assert!(p.landing_x >= 255.0);
    }

    #[test]
    fn test_prediction_slow_rider_falls_short() {
        let gap = GapTarget {
            start_x: 0.0,
            width: 300.0,
            landing_y: 40.0,
        };
        let vel = compute_launch_velocity(120.0, Vec2::new(0.0, -1.0));
        let p = predict_gap_clearance(Vec2::ZERO, vel, gap, 1.0, SIM_DT, 0.85);
        assert!(!p.clears, "{p:?}");
    }

    #[test]
    fn test_prediction_matches_replayed_flight() {
        let gap = GapTarget {
            start_x: 0.0,
            width: 260.0,
            landing_y: 60.0,
        };
        let launch_pos = Vec2::new(-2.0, -1.0);
        let launch_vel = compute_launch_velocity(520.0, Vec2::new(-0.25, -1.0).normalize());
        let p = predict_gap_clearance(launch_pos, launch_vel, gap, 1.2, SIM_DT, 0.85);

        let (mut pos, mut vel) = (launch_pos, launch_vel);
        for _ in 0..p.steps {
            (pos, vel) = step_airborne(pos, vel, SIM_DT, 1.2);
        }
        assert_eq!(pos.x, p.landing_x);
        assert_eq!(pos.y, p.landing_y);
    }
}
