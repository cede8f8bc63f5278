//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order
//! - No rendering or platform dependencies

pub mod curve;
pub mod difficulty;
pub mod factory;
pub mod hazard;
pub mod physics;
pub mod rider;
pub mod state;
pub mod terrain;
pub mod tick;
pub mod track;
pub mod vehicle;

pub use curve::{CompoundBuilder, CompoundModule, ShapeParams, SubSection, SubSectionKind};
pub use difficulty::DifficultyProfile;
pub use factory::{Flavor, SegmentFactory, SegmentRequest};
pub use hazard::Hazard;
pub use physics::{GapPrediction, GapTarget, predict_gap_clearance};
pub use rider::{CrashCause, MoveState, Rider, Telemetry};
pub use state::{GameEvent, GamePhase, GameState};
pub use terrain::TerrainType;
pub use tick::{TickInput, advance, tick};
pub use track::{
    GapInfo, LegacyKind, LegacyModule, ModuleShape, PlacedModule, TerrainQuery, TrackConfig,
    TrackGenerator,
};
pub use vehicle::{VehicleId, VehicleProfile, VehicleRoster};
