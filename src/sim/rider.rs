//! Rider movement state machine
//!
//! Per tick: timers, input edges, state dispatch, post-move checks, telemetry.
//! Crashes are ordinary transitions: transient state is cleared and a
//! `Crashed` event is queued for the game state to act on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hazard::{Hazard, first_overlap};
use super::physics::{
    GapPrediction, clears_gap, compute_launch_velocity, completed_flips, flip_angular_velocity,
    forward_tangent, ground_acceleration, integrate_rotation, integrate_speed, is_safe_landing,
    landing_speed, predict_gap_clearance, should_detach, signed_slope_angle, step_airborne,
};
use super::state::GameEvent;
use super::terrain::TerrainType;
use super::tick::TickInput;
use super::track::{GapInfo, TerrainQuery};
use super::vehicle::{VehicleProfile, VehicleRoster};
use crate::consts::*;

/// Discrete movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveState {
    #[default]
    Grounded,
    /// Grounded with reduced drag and extra downforce
    Tucking,
    Airborne,
    /// Dive: boosted gravity, upward speed clamped
    AirborneTucking,
    Flipping,
}

impl MoveState {
    #[inline]
    pub fn is_grounded(&self) -> bool {
        matches!(self, MoveState::Grounded | MoveState::Tucking)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoveState::Grounded => "Grounded",
            MoveState::Tucking => "Tucking",
            MoveState::Airborne => "Airborne",
            MoveState::AirborneTucking => "AirborneTucking",
            MoveState::Flipping => "Flipping",
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrashCause {
    FellIntoGap,
    HazardCollision,
    FailedGapClearance,
    BadLandingAngle,
    IncompleteRotation,
}

/// Read-only per-tick snapshot for debug overlays
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Telemetry {
    pub move_state: MoveState,
    pub slope_angle: f32,
    pub forward_velocity: f32,
    pub vertical_velocity: f32,
    pub over_gap: bool,
    pub last_prediction: Option<GapPrediction>,
}

/// The rider and its physics state
#[derive(Debug, Clone)]
pub struct Rider {
    /// Contact point (bottom of the rider)
    pub pos: Vec2,
    /// Ground speed along the surface
    pub speed: f32,
    pub air_velocity: Vec2,
    /// Accumulated flip rotation (radians)
    pub rotation: f32,
    pub state: MoveState,
    pub profile: VehicleProfile,
    pub swap_cooldown: f32,
    /// Post-flip drag-reduction window remaining (seconds)
    pub bonus_timer: f32,
    pub coyote_timer: f32,
    tuck_held: bool,
    flip_held: bool,
    terrain: TerrainType,
    crashed: Option<CrashCause>,
    telemetry: Telemetry,
}

impl Rider {
    /// Rider standing on the surface at `x`
    pub fn new<T: TerrainQuery>(profile: VehicleProfile, track: &T, x: f32) -> Self {
        let mut rider = Self {
            pos: Vec2::new(x, track.height_at(x)),
            speed: INITIAL_SPEED,
            air_velocity: Vec2::ZERO,
            rotation: 0.0,
            state: MoveState::Grounded,
            profile,
            swap_cooldown: 0.0,
            bonus_timer: 0.0,
            coyote_timer: 0.0,
            tuck_held: false,
            flip_held: false,
            terrain: track.terrain_type_at(x),
            crashed: None,
            telemetry: Telemetry::default(),
        };
        rider.record_telemetry(track);
        rider
    }

    pub fn crashed(&self) -> Option<CrashCause> {
        self.crashed
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Terrain under the rider as of the last tick
    pub fn terrain(&self) -> TerrainType {
        self.terrain
    }

    pub fn tuck_held(&self) -> bool {
        self.tuck_held
    }

    /// Center of the rider's collider
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::new(0.0, -RIDER_RADIUS)
    }

    /// Gravity multiplier for the current state
    pub fn gravity_multiplier(&self) -> f32 {
        if self.state == MoveState::AirborneTucking {
            self.profile.gravity_multiplier * DIVE_GRAVITY_MULTIPLIER
        } else {
            self.profile.gravity_multiplier
        }
    }

    /// Advance one fixed step
    pub fn update<T: TerrainQuery>(
        &mut self,
        input: &TickInput,
        track: &T,
        roster: &VehicleRoster,
        hazards: &[Hazard],
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) {
        if self.crashed.is_some() {
            return;
        }

        self.update_timers(dt);
        self.apply_input(input, roster, events);

        match self.state {
            MoveState::Grounded | MoveState::Tucking => self.update_grounded(track, dt, events),
            MoveState::Airborne | MoveState::AirborneTucking | MoveState::Flipping => {
                self.update_airborne(track, dt, events)
            }
        }

        if self.crashed.is_none() {
            self.post_move_checks(track, hazards, events);
        }
        if self.crashed.is_none() {
            self.track_terrain(track, events);
        }
        self.record_telemetry(track);
    }

    fn update_timers(&mut self, dt: f32) {
        self.swap_cooldown = (self.swap_cooldown - dt).max(0.0);
        self.bonus_timer = (self.bonus_timer - dt).max(0.0);
    }

    fn apply_input(&mut self, input: &TickInput, roster: &VehicleRoster, events: &mut Vec<GameEvent>) {
        if input.tuck_pressed {
            self.tuck_held = true;
        }
        if input.tuck_released {
            self.tuck_held = false;
        }

        if input.jump_pressed
            && matches!(self.state, MoveState::Airborne | MoveState::AirborneTucking)
        {
            self.state = MoveState::Flipping;
            self.flip_held = true;
        }
        if input.jump_released {
            self.flip_held = false;
        }

        if input.swap_pressed {
            self.try_swap(roster, events);
        }

        // Tuck only selects modifiers; Flipping ignores it until contact
        self.state = match self.state {
            MoveState::Grounded | MoveState::Tucking if self.tuck_held => MoveState::Tucking,
            MoveState::Grounded | MoveState::Tucking => MoveState::Grounded,
            MoveState::Airborne | MoveState::AirborneTucking if self.tuck_held => {
                MoveState::AirborneTucking
            }
            MoveState::Airborne | MoveState::AirborneTucking => MoveState::Airborne,
            MoveState::Flipping => MoveState::Flipping,
        };
    }

    /// Cycle to the next vehicle in the roster, if the cooldown allows
    pub fn try_swap(&mut self, roster: &VehicleRoster, events: &mut Vec<GameEvent>) -> bool {
        if self.swap_cooldown > 0.0 {
            return false;
        }
        let next = self.profile.id.next();
        self.profile = roster.get(next);
        self.swap_cooldown = SWAP_COOLDOWN;
        events.push(GameEvent::VehicleSwapped(next));
        log::debug!("Swapped to {}", next.as_str());
        true
    }

    fn ground_drag(&self, terrain: TerrainType) -> f32 {
        let mut drag = self.profile.drag_coefficient(terrain);
        if self.state == MoveState::Tucking {
            drag *= TUCK_DRAG_MULTIPLIER;
        }
        if self.bonus_timer > 0.0 {
            drag *= FLIP_BONUS_DRAG_MULTIPLIER;
        }
        drag
    }

    fn update_grounded<T: TerrainQuery>(&mut self, track: &T, dt: f32, events: &mut Vec<GameEvent>) {
        let normal = track.normal_at(self.pos.x);
        let terrain = track.terrain_type_at(self.pos.x);
        let accel = ground_acceleration(
            self.speed,
            signed_slope_angle(normal),
            self.ground_drag(terrain),
            self.profile.rolling_resistance(terrain),
            self.profile.terrain_bonus(terrain),
        );
        self.speed = integrate_speed(self.speed, accel, dt, self.profile.speed_cap());

        let tangent = forward_tangent(normal);
        let candidate = self.pos + tangent * self.speed * dt;

        // Ramp lip: the next step would be over a gap
        if track.is_over_gap(candidate.x) {
            let gap = track.next_or_current_gap(candidate.x);
            self.launch(normal, Some(gap), true, dt, events);
            return;
        }

        let tucking = self.state == MoveState::Tucking;
        let curvature = track.curvature_at(self.pos.x);
        if should_detach(self.speed, curvature, self.profile.gravity_multiplier, tucking) {
            let gap = track.next_or_current_gap(self.pos.x);
            let ahead = gap.start_x - self.pos.x;
            let nearby = gap.found && (0.0..=GAP_PREDICTION_RANGE).contains(&ahead);
            self.launch(normal, nearby.then_some(gap), false, dt, events);
            return;
        }

        let surface = track.height_at(candidate.x);
        if candidate.y >= surface - SNAP_DISTANCE {
            self.coyote_timer = 0.0;
        } else {
            self.coyote_timer += dt;
            if self.coyote_timer > COYOTE_TIME {
                self.pos = candidate;
                self.launch(normal, None, false, dt, events);
                return;
            }
        }
        self.pos = Vec2::new(candidate.x, surface);
    }

    /// Leave the surface along its tangent
    ///
    /// With a gap, the flight is predicted first; at a ramp lip a failed
    /// prediction is a crash. The prediction uses the vehicle's plain gravity:
    /// a rider diving off the lip can still release the tuck in the air.
    fn launch(
        &mut self,
        normal: Vec2,
        gap: Option<GapInfo>,
        at_lip: bool,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) {
        self.state = if self.tuck_held {
            MoveState::AirborneTucking
        } else {
            MoveState::Airborne
        };
        self.air_velocity = self.clamp_dive(compute_launch_velocity(self.speed, normal));
        self.rotation = 0.0;
        self.coyote_timer = 0.0;

        let Some(gap) = gap else {
            return;
        };
        let prediction = predict_gap_clearance(
            self.pos,
            self.air_velocity,
            gap.target(),
            self.profile.gravity_multiplier,
            dt,
            GAP_CLEARANCE_RATIO,
        );
        self.telemetry.last_prediction = Some(prediction);
        log::debug!(
            "Launch at x={:.0} speed={:.0}: gap {:.0} wide, predicted landing x={:.0} ({})",
            self.pos.x,
            self.speed,
            gap.width,
            prediction.landing_x,
            if prediction.clears { "clears" } else { "short" }
        );
        if at_lip && !prediction.clears {
            self.crash(CrashCause::FailedGapClearance, events);
        }
    }

    fn clamp_dive(&self, velocity: Vec2) -> Vec2 {
        if self.state == MoveState::AirborneTucking {
            Vec2::new(velocity.x, velocity.y.max(-DIVE_MAX_UPWARD_SPEED))
        } else {
            velocity
        }
    }

    fn update_airborne<T: TerrainQuery>(&mut self, track: &T, dt: f32, events: &mut Vec<GameEvent>) {
        let was_over_gap = track.is_over_gap(self.pos.x);
        let (pos, velocity) = step_airborne(self.pos, self.air_velocity, dt, self.gravity_multiplier());
        self.pos = pos;
        self.air_velocity = self.clamp_dive(velocity);

        if self.state == MoveState::Flipping && self.flip_held {
            let rate = flip_angular_velocity(self.air_velocity.length(), self.profile.flip_speed_modifier);
            self.rotation = integrate_rotation(self.rotation, rate, dt);
        }

        if track.is_over_gap(pos.x) {
            let gap = track.next_or_current_gap(pos.x);
            // Forgiving landing: far enough across, at the far edge's height
            let across = clears_gap(pos.x, gap.start_x, gap.width, GAP_CLEARANCE_RATIO);
            let at_edge = pos.y >= gap.landing_y && pos.y <= gap.landing_y + WALL_STRIKE_DEPTH;
            if self.air_velocity.y > 0.0 && across && at_edge {
                self.pos = Vec2::new(gap.end_x, track.height_at(gap.end_x));
                self.land(track, events);
            }
            return;
        }

        let surface = track.height_at(pos.x);
        if was_over_gap && pos.y > surface + WALL_STRIKE_DEPTH {
            self.crash(CrashCause::FellIntoGap, events);
            return;
        }
        if pos.y >= surface {
            self.pos.y = surface;
            self.land(track, events);
        }
    }

    fn land<T: TerrainQuery>(&mut self, track: &T, events: &mut Vec<GameEvent>) {
        let normal = track.normal_at(self.pos.x);
        let speed = landing_speed(self.air_velocity, normal).min(self.profile.speed_cap());
        let was_flipping = self.state == MoveState::Flipping;
        let rotation = self.rotation;

        self.air_velocity = Vec2::ZERO;
        self.rotation = 0.0;
        self.coyote_timer = 0.0;
        self.flip_held = false;
        self.speed = speed;

        if !was_flipping {
            self.state = if self.tuck_held {
                MoveState::Tucking
            } else {
                MoveState::Grounded
            };
            return;
        }

        let flips = completed_flips(rotation);
        if !is_safe_landing(rotation, FLIP_LANDING_TOLERANCE) {
            events.push(GameEvent::FlipFailed);
            let cause = if flips == 0 {
                CrashCause::IncompleteRotation
            } else {
                CrashCause::BadLandingAngle
            };
            self.crash(cause, events);
            return;
        }

        self.state = MoveState::Grounded;
        if flips > 0 {
            let boost = 1.0 + FLIP_BOOST_PER_FLIP * flips as f32;
            self.speed = (speed * boost).min(self.profile.speed_cap());
            self.bonus_timer = FLIP_BONUS_DURATION;
            events.push(GameEvent::FlipCompleted {
                points: FLIP_POINTS * flips,
                flips,
            });
            log::debug!("Landed {flips} flip(s), speed {:.0}", self.speed);
        }
    }

    fn post_move_checks<T: TerrainQuery>(&mut self, track: &T, hazards: &[Hazard], events: &mut Vec<GameEvent>) {
        if self.pos.y > track.height_at(self.pos.x) + FALL_DEATH_DEPTH {
            self.crash(CrashCause::FellIntoGap, events);
            return;
        }
        if first_overlap(hazards, self.center(), RIDER_RADIUS).is_some() {
            self.crash(CrashCause::HazardCollision, events);
        }
    }

    fn track_terrain<T: TerrainQuery>(&mut self, track: &T, events: &mut Vec<GameEvent>) {
        let terrain = track.terrain_type_at(self.pos.x);
        if terrain != self.terrain {
            self.terrain = terrain;
            events.push(GameEvent::TerrainChanged(terrain));
        }
    }

    /// End the run: clear transient motion and queue the event
    pub fn crash(&mut self, cause: CrashCause, events: &mut Vec<GameEvent>) {
        self.rotation = 0.0;
        self.air_velocity = Vec2::ZERO;
        self.tuck_held = false;
        self.flip_held = false;
        self.coyote_timer = 0.0;
        self.bonus_timer = 0.0;
        self.state = MoveState::Grounded;
        self.crashed = Some(cause);
        events.push(GameEvent::Crashed(cause));
        log::debug!("Crashed ({cause:?}) at x={:.0}", self.pos.x);
    }

    fn record_telemetry<T: TerrainQuery>(&mut self, track: &T) {
        let normal = track.normal_at(self.pos.x);
        let velocity = if self.state.is_grounded() {
            forward_tangent(normal) * self.speed
        } else {
            self.air_velocity
        };
        self.telemetry.move_state = self.state;
        self.telemetry.slope_angle = signed_slope_angle(normal);
        self.telemetry.forward_velocity = velocity.x;
        self.telemetry.vertical_velocity = velocity.y;
        self.telemetry.over_gap = track.is_over_gap(self.pos.x);
    }
}
