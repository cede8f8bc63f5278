//! Game state and events
//!
//! Owns one rider, one track generator and the event queue. Everything is
//! rebuilt from the settings on reset, so a seed fully determines a run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::hazard::Hazard;
use super::rider::{CrashCause, Rider};
use super::terrain::TerrainType;
use super::track::TrackGenerator;
use super::vehicle::{VehicleId, VehicleRoster};
use crate::Settings;
use crate::consts::*;

/// Whether the simulation advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Playing,
    Paused,
    /// Run ended; frozen until reset
    Crashed,
}

/// Notifications for the surrounding game, queued in emission order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    VehicleSwapped(VehicleId),
    Crashed(CrashCause),
    FlipCompleted { points: u32, flips: u32 },
    FlipFailed,
    TerrainChanged(TerrainType),
}

/// Complete simulation state of a run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub settings: Settings,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Flip points
    pub score: u64,
    pub rider: Rider,
    pub track: TrackGenerator,
    pub roster: VehicleRoster,
    /// Hazards, sorted by id
    pub hazards: Vec<Hazard>,
    /// Pending events (drained by the caller)
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed and default settings
    pub fn new(seed: u64) -> Self {
        Self::with_settings(Settings::with_seed(seed))
    }

    pub fn with_settings(settings: Settings) -> Self {
        let roster = VehicleRoster::default();
        let mut track =
            TrackGenerator::with_seed(settings.seed, settings.factory(), settings.track_config());
        track.update(RIDER_START_X);
        let rider = Rider::new(roster.get(settings.starting_vehicle), &track, RIDER_START_X);

        log::info!(
            "New run: seed={} vehicle={} intro={}",
            settings.seed,
            settings.starting_vehicle.as_str(),
            settings.intro
        );

        Self {
            seed: settings.seed,
            settings,
            phase: GamePhase::Playing,
            time_ticks: 0,
            score: 0,
            rider,
            track,
            roster,
            hazards: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Discard everything and start over from the same settings
    pub fn reset(&mut self) {
        log::info!("Reset at tick {}", self.time_ticks);
        *self = Self::with_settings(self.settings.clone());
    }

    /// Take all pending events, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Horizontal distance covered since the start
    pub fn distance(&self) -> f32 {
        (self.rider.pos.x - RIDER_START_X).max(0.0)
    }

    /// Register a circular hazard; returns its id
    pub fn add_hazard(&mut self, pos: Vec2, radius: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.hazards.push(Hazard {
            id,
            pos,
            radius: radius.max(0.0),
        });
        id
    }

    /// Drop hazards that fell behind the track window
    pub fn trim_hazards(&mut self) {
        let limit = self.rider.pos.x - self.settings.trim_distance;
        self.hazards.retain(|h| h.pos.x + h.radius >= limit);
    }

    /// Fold freshly queued events (from `from` on) into score and phase
    pub(crate) fn apply_events(&mut self, from: usize) {
        for event in &self.events[from..] {
            match *event {
                GameEvent::FlipCompleted { points, .. } => self.score += points as u64,
                GameEvent::Crashed(cause) => {
                    self.phase = GamePhase::Crashed;
                    log::info!(
                        "Run over ({cause:?}): distance {:.0}, score {}",
                        (self.rider.pos.x - RIDER_START_X).max(0.0),
                        self.score
                    );
                }
                GameEvent::TerrainChanged(terrain) => {
                    log::debug!("Terrain: {}", terrain.as_str());
                }
                GameEvent::VehicleSwapped(_) | GameEvent::FlipFailed => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_playing_on_the_track() {
        let state = GameState::new(12345);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.rider.pos.x, RIDER_START_X);
        assert!(state.track.segments_ahead(RIDER_START_X) >= LOOKAHEAD_SEGMENTS);
        assert_eq!(state.distance(), 0.0);
    }

    #[test]
    fn test_starting_vehicle_from_settings() {
        let state = GameState::with_settings(Settings {
            starting_vehicle: VehicleId::Skis,
            ..Settings::with_seed(3)
        });
        assert_eq!(state.rider.profile.id, VehicleId::Skis);
    }

    #[test]
    fn test_hazard_ids_increase() {
        let mut state = GameState::new(1);
        let a = state.add_hazard(Vec2::new(500.0, 0.0), 10.0);
        let b = state.add_hazard(Vec2::new(900.0, 0.0), 10.0);
        assert!(b > a);
        assert_eq!(state.hazards.len(), 2);
    }

    #[test]
    fn test_hazards_behind_trim_line_are_dropped() {
        let mut state = GameState::new(1);
        state.add_hazard(Vec2::new(-5000.0, 0.0), 10.0);
        state.add_hazard(Vec2::new(500.0, 0.0), 10.0);
        state.trim_hazards();
        assert_eq!(state.hazards.len(), 1);
        assert_eq!(state.hazards[0].pos.x, 500.0);
    }

    #[test]
    fn test_events_update_score_and_phase() {
        let mut state = GameState::new(1);
        state.events.push(GameEvent::FlipCompleted {
            points: 200,
            flips: 2,
        });
        state.events.push(GameEvent::Crashed(CrashCause::HazardCollision));
        state.apply_events(0);
        assert_eq!(state.score, 200);
        assert_eq!(state.phase, GamePhase::Crashed);
        assert_eq!(state.drain_events().len(), 2);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_reset_rebuilds_from_seed() {
        let mut state = GameState::new(9);
        let fresh = GameState::new(9);
        state.rider.pos.x += 500.0;
        state.score = 300;
        state.phase = GamePhase::Crashed;
        state.reset();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.rider.pos, fresh.rider.pos);
        let a: Vec<_> = state.track.modules().cloned().collect();
        let b: Vec<_> = fresh.track.modules().cloned().collect();
        assert_eq!(a, b);
    }
}
