//! Track generator
//!
//! Keeps an ordered window of placed segments around the rider: extends it
//! ahead, trims it behind, and answers point queries against it. Queries
//! outside the window never fail; they extrapolate deterministically.
//!
//! Every gap is ridden before it is kept. One pilot rider per vehicle follows
//! the track without input, parking just short of the newest lip; a gap any
//! pilot cannot clear is narrowed, and dropped below `MIN_GAP_WIDTH`. Pilots
//! run the same rider code over the same geometry, so a real rider without
//! input retraces a pilot exactly.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::curve::{CompoundModule, hermite};
use super::factory::{IntroPiece, SegmentFactory, SegmentRequest};
use super::physics::{GapTarget, curvature_from_heights};
use super::rider::Rider;
use super::terrain::TerrainType;
use super::tick::TickInput;
use super::vehicle::VehicleRoster;
use crate::consts::*;
use crate::{lerp, normal_from_tangent};

/// Result of a gap query (computed on demand, never stored)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapInfo {
    pub found: bool,
    pub start_x: f32,
    pub end_x: f32,
    /// Height of the takeoff edge
    pub lip_y: f32,
    /// Height of the far edge
    pub landing_y: f32,
    pub width: f32,
    pub exit_terrain: TerrainType,
}

impl GapInfo {
    pub fn none() -> Self {
        Self {
            found: false,
            start_x: 0.0,
            end_x: 0.0,
            lip_y: 0.0,
            landing_y: 0.0,
            width: 0.0,
            exit_terrain: TerrainType::default(),
        }
    }

    /// Gap geometry for a clearance prediction
    pub fn target(&self) -> GapTarget {
        GapTarget {
            start_x: self.start_x,
            width: self.width,
            landing_y: self.landing_y,
        }
    }
}

/// Read-only terrain queries the rider consumes
pub trait TerrainQuery {
    fn height_at(&self, x: f32) -> f32;
    fn terrain_type_at(&self, x: f32) -> TerrainType;
    fn is_over_gap(&self, x: f32) -> bool;
    fn next_or_current_gap(&self, x: f32) -> GapInfo;

    /// Unit surface normal from a finite-difference tangent (points up, -y)
    fn normal_at(&self, x: f32) -> Vec2 {
        let h0 = self.height_at(x - NORMAL_SAMPLE_DX);
        let h1 = self.height_at(x + NORMAL_SAMPLE_DX);
        let tangent = Vec2::new(2.0 * NORMAL_SAMPLE_DX, h1 - h0).normalize_or(Vec2::X);
        normal_from_tangent(tangent)
    }

    /// Signed surface curvature around `x` (positive on crests)
    fn curvature_at(&self, x: f32) -> f32 {
        let dx = CURVATURE_SAMPLE_DX;
        curvature_from_heights(
            self.height_at(x - dx),
            self.height_at(x),
            self.height_at(x + dx),
            dx,
        )
    }
}

/// Pieces of the fixed intro run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyKind {
    Descent,
    Approach,
    Ramp,
}

/// Single-shape module used only by the intro: one Hermite span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyModule {
    pub kind: LegacyKind,
    pub length: f32,
    /// Height change across the module (positive = descends)
    pub drop: f32,
    pub entry_slope: f32,
    pub exit_slope: f32,
    pub terrain: TerrainType,
    pub gap_width: f32,
    pub gap_drop: f32,
}

impl LegacyModule {
    pub fn from_piece(kind: LegacyKind, piece: &IntroPiece, terrain: TerrainType) -> Self {
        Self {
            kind,
            length: piece.length.max(MIN_SECTION_LENGTH),
            drop: piece.drop,
            entry_slope: piece.entry_slope,
            exit_slope: piece.exit_slope,
            terrain,
            gap_width: piece.gap_width.max(0.0),
            gap_drop: piece.gap_drop,
        }
    }

    pub fn sample_height(&self, x: f32) -> f32 {
        let t = (x / self.length).clamp(0.0, 1.0);
        hermite(0.0, self.entry_slope, self.drop, self.exit_slope, self.length, t)
    }
}

/// Geometry of a placed module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModuleShape {
    Legacy(LegacyModule),
    Compound(CompoundModule),
}

impl ModuleShape {
    pub fn length(&self) -> f32 {
        match self {
            ModuleShape::Legacy(m) => m.length,
            ModuleShape::Compound(m) => m.length(),
        }
    }

    pub fn sample_height(&self, x: f32) -> f32 {
        match self {
            ModuleShape::Legacy(m) => m.sample_height(x),
            ModuleShape::Compound(m) => m.sample_height(x),
        }
    }

    pub fn terrain_at(&self, x: f32) -> TerrainType {
        match self {
            ModuleShape::Legacy(m) => m.terrain,
            ModuleShape::Compound(m) => m.terrain_at(x),
        }
    }

    pub fn entry_slope(&self) -> f32 {
        match self {
            ModuleShape::Legacy(m) => m.entry_slope,
            ModuleShape::Compound(m) => m.entry_slope(),
        }
    }

    pub fn exit_slope(&self) -> f32 {
        match self {
            ModuleShape::Legacy(m) => m.exit_slope,
            ModuleShape::Compound(m) => m.exit_slope(),
        }
    }

    pub fn exit_height(&self) -> f32 {
        match self {
            ModuleShape::Legacy(m) => m.drop,
            ModuleShape::Compound(m) => m.exit_height(),
        }
    }

    pub fn entry_terrain(&self) -> TerrainType {
        match self {
            ModuleShape::Legacy(m) => m.terrain,
            ModuleShape::Compound(m) => m.entry_terrain(),
        }
    }

    pub fn exit_terrain(&self) -> TerrainType {
        match self {
            ModuleShape::Legacy(m) => m.terrain,
            ModuleShape::Compound(m) => m.exit_terrain(),
        }
    }

    pub fn gap_width(&self) -> f32 {
        match self {
            ModuleShape::Legacy(m) => m.gap_width,
            ModuleShape::Compound(m) => m.gap_width,
        }
    }

    pub fn gap_drop(&self) -> f32 {
        match self {
            ModuleShape::Legacy(m) => m.gap_drop,
            ModuleShape::Compound(m) => m.gap_drop,
        }
    }

    /// Change the trailing gap's width, keeping its drop-to-width ratio
    pub fn resize_gap(&mut self, width: f32) {
        let (gap_width, gap_drop) = match self {
            ModuleShape::Legacy(m) => (&mut m.gap_width, &mut m.gap_drop),
            ModuleShape::Compound(m) => (&mut m.gap_width, &mut m.gap_drop),
        };
        let width = width.max(0.0);
        *gap_drop = if *gap_width > 0.0 {
            *gap_drop * width / *gap_width
        } else {
            0.0
        };
        *gap_width = width;
    }
}

/// A module bound to world coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedModule {
    pub shape: ModuleShape,
    pub start_x: f32,
    pub start_y: f32,
    /// Far side of the trailing gap (equals the lip when there is no gap)
    pub landing_x: f32,
    pub landing_y: f32,
}

impl PlacedModule {
    pub fn new(shape: ModuleShape, start_x: f32, start_y: f32) -> Self {
        let lip_x = start_x + shape.length();
        let lip_y = start_y + shape.exit_height();
        let (landing_x, landing_y) = if shape.gap_width() > 0.0 {
            (lip_x + shape.gap_width(), lip_y + shape.gap_drop())
        } else {
            (lip_x, lip_y)
        };
        Self {
            shape,
            start_x,
            start_y,
            landing_x,
            landing_y,
        }
    }

    /// End of the rideable surface
    #[inline]
    pub fn lip_x(&self) -> f32 {
        self.start_x + self.shape.length()
    }

    #[inline]
    pub fn lip_y(&self) -> f32 {
        self.start_y + self.shape.exit_height()
    }

    #[inline]
    pub fn has_gap(&self) -> bool {
        self.shape.gap_width() > 0.0
    }

    #[inline]
    pub fn is_gap(&self, x: f32) -> bool {
        self.has_gap() && x >= self.lip_x() && x < self.landing_x
    }

    /// Surface height, or the straight lip-to-landing line inside the gap
    pub fn height_at(&self, x: f32) -> f32 {
        if self.is_gap(x) {
            let t = (x - self.lip_x()) / self.shape.gap_width();
            lerp(self.lip_y(), self.landing_y, t)
        } else {
            self.start_y + self.shape.sample_height(x - self.start_x)
        }
    }

    pub fn terrain_at(&self, x: f32) -> TerrainType {
        if x >= self.lip_x() {
            self.shape.exit_terrain()
        } else {
            self.shape.terrain_at(x - self.start_x)
        }
    }

    pub fn gap_info(&self) -> GapInfo {
        if !self.has_gap() {
            return GapInfo::none();
        }
        GapInfo {
            found: true,
            start_x: self.lip_x(),
            end_x: self.landing_x,
            lip_y: self.lip_y(),
            landing_y: self.landing_y,
            width: self.shape.gap_width(),
            exit_terrain: self.shape.exit_terrain(),
        }
    }
}

/// Window sizing for the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Segments kept generated ahead of the rider
    pub lookahead_segments: usize,
    /// Segments whose far edge is this far behind the rider are evicted
    pub trim_distance: f32,
    /// Start with the fixed intro sequence
    pub intro: bool,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            lookahead_segments: LOOKAHEAD_SEGMENTS,
            trim_distance: TRIM_DISTANCE,
            intro: true,
        }
    }
}

/// Generator cursor and terrain-run bookkeeping
#[derive(Debug, Clone, PartialEq)]
struct Cursor {
    next_x: f32,
    next_y: f32,
    entry_slope: f32,
    entry_terrain: TerrainType,
    run_terrain: TerrainType,
    run_length: u32,
    run_start_distance: f32,
    generated: u64,
}

/// Everything a preview must put back
#[derive(Debug, Clone)]
struct Snapshot<R> {
    cursor: Cursor,
    rng: R,
    module_count: usize,
    pilots: Vec<Rider>,
}

/// Owns the placed-segment window
#[derive(Debug, Clone)]
pub struct TrackGenerator<R = Pcg32> {
    factory: SegmentFactory,
    config: TrackConfig,
    rng: R,
    origin_x: f32,
    modules: VecDeque<PlacedModule>,
    cursor: Cursor,
    roster: VehicleRoster,
    /// Input-free riders parked just short of the newest lip
    pilots: Vec<Rider>,
}

impl TrackGenerator<Pcg32> {
    /// Generator drawing from a PCG stream seeded with `seed`
    pub fn with_seed(seed: u64, factory: SegmentFactory, config: TrackConfig) -> Self {
        Self::new(factory, config, Pcg32::seed_from_u64(seed), Vec2::ZERO)
    }
}

impl<R: Rng + Clone> TrackGenerator<R> {
    /// New generator with its first module starting at `origin`
    pub fn new(factory: SegmentFactory, config: TrackConfig, rng: R, origin: Vec2) -> Self {
        let entry_slope = factory.difficulty.guidance_slope(0.0);
        let mut track = Self {
            factory,
            config,
            rng,
            origin_x: origin.x,
            modules: VecDeque::new(),
            cursor: Cursor {
                next_x: origin.x,
                next_y: origin.y,
                entry_slope,
                entry_terrain: TerrainType::Snow,
                run_terrain: TerrainType::Snow,
                run_length: 0,
                run_start_distance: 0.0,
                generated: 0,
            },
            roster: VehicleRoster::default(),
            pilots: Vec::new(),
        };
        if track.config.intro {
            track.place_intro();
        }
        track
    }

    pub fn factory(&self) -> &SegmentFactory {
        &self.factory
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn modules(&self) -> impl Iterator<Item = &PlacedModule> {
        self.modules.iter()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Total modules ever placed (trimmed ones included)
    pub fn generated_count(&self) -> u64 {
        self.cursor.generated
    }

    /// Where the next module will start
    pub fn frontier_x(&self) -> f32 {
        self.cursor.next_x
    }

    /// Pilot riders still on the track
    pub fn pilots(&self) -> &[Rider] {
        &self.pilots
    }

    /// Distance from the track origin, as the difficulty schedule sees it
    #[inline]
    pub fn distance_at(&self, x: f32) -> f32 {
        (x - self.origin_x).max(0.0)
    }

    /// The intro stays outside terrain-run bookkeeping; the first segment opens a fresh run
    fn place_intro(&mut self) {
        let pieces = self.factory.intro_pieces();
        let kinds = [LegacyKind::Descent, LegacyKind::Approach, LegacyKind::Ramp];
        for (kind, piece) in kinds.into_iter().zip(pieces.iter()) {
            let module = LegacyModule::from_piece(kind, piece, TerrainType::Snow);
            self.place_ridden(ModuleShape::Legacy(module));
        }
        log::info!(
            "Intro placed: {} modules, first gap at x={:.0}",
            self.modules.len(),
            self.modules.back().map_or(0.0, |m| m.lip_x())
        );
    }

    /// Bookkeeping for a module of `terrain` appended to the current run
    fn count_terrain(&mut self, terrain: TerrainType) {
        if terrain != self.cursor.run_terrain || self.cursor.run_length == 0 {
            self.cursor.run_terrain = terrain;
            self.cursor.run_length = 0;
            self.cursor.run_start_distance = self.distance_at(self.cursor.next_x);
        }
        self.cursor.run_length += 1;
    }

    /// Terrain for the next segment: forced switch once the run hits its bound, else a coin flip
    fn plan_terrain(&mut self) -> TerrainType {
        let distance = self.distance_at(self.cursor.next_x);
        let difficulty = &self.factory.difficulty;
        let max_run = difficulty.max_same_terrain_run(self.cursor.run_start_distance);

        let switch = if self.cursor.run_length >= max_run {
            true
        } else {
            self.rng.random_bool(difficulty.terrain_switch_chance(distance) as f64)
        };

        let terrain = if switch {
            self.factory
                .pick_new_terrain(&mut self.rng, self.cursor.run_terrain, distance)
        } else {
            self.cursor.run_terrain
        };
        self.count_terrain(terrain);
        terrain
    }

    fn place(&mut self, shape: ModuleShape) {
        let placed = PlacedModule::new(shape, self.cursor.next_x, self.cursor.next_y);
        self.cursor.next_x = placed.landing_x;
        self.cursor.next_y = placed.landing_y;
        self.cursor.entry_slope = if placed.has_gap() {
            // Land on a downslope
            self.factory
                .difficulty
                .guidance_slope(self.distance_at(placed.landing_x))
        } else {
            placed.shape.exit_slope()
        };
        self.cursor.entry_terrain = placed.shape.exit_terrain();
        self.cursor.generated += 1;
        self.modules.push_back(placed);
    }

    /// Place a module, then narrow its gap until every pilot clears it
    fn place_ridden(&mut self, mut shape: ModuleShape) {
        let cursor = self.cursor.clone();
        self.place(shape.clone());
        if self.cursor.generated == 1 {
            self.spawn_pilots();
        }
        let Some(lip_x) = self.modules.back().map(PlacedModule::lip_x) else {
            return;
        };
        self.park_pilots(lip_x);

        let raw_width = shape.gap_width();
        while shape.gap_width() > 0.0 && !self.pilots_clear_last_gap() {
            let width = shape.gap_width() * GAP_SHRINK_FACTOR;
            shape.resize_gap(if width < MIN_GAP_WIDTH { 0.0 } else { width });
            self.modules.pop_back();
            self.cursor = cursor.clone();
            self.place(shape.clone());
        }
        if shape.gap_width() < raw_width {
            log::debug!(
                "Gap at x={lip_x:.0} narrowed from {raw_width:.0} to {:.0}",
                shape.gap_width()
            );
        }
    }

    fn spawn_pilots(&mut self) {
        self.pilots = self
            .roster
            .profiles
            .iter()
            .map(|profile| Rider::new(profile.clone(), &*self, RIDER_START_X))
            .collect();
    }

    /// Ride every pilot up to `PILOT_REACH` short of `lip_x`; lost pilots are dropped
    fn park_pilots(&mut self, lip_x: f32) {
        let mut pilots = std::mem::take(&mut self.pilots);
        let input = TickInput::default();
        let mut events = Vec::new();
        pilots.retain_mut(|pilot| {
            let mut ticks = 0;
            while pilot.crashed().is_none() && pilot.pos.x < lip_x - PILOT_REACH {
                if ticks == PILOT_MAX_TICKS {
                    log::warn!("Pilot {} stalled at x={:.0}", pilot.profile.id.as_str(), pilot.pos.x);
                    return false;
                }
                pilot.update(&input, &*self, &self.roster, &[], SIM_DT, &mut events);
                ticks += 1;
            }
            if let Some(cause) = pilot.crashed() {
                log::warn!(
                    "Pilot {} lost at x={:.0} ({cause:?})",
                    pilot.profile.id.as_str(),
                    pilot.pos.x
                );
                return false;
            }
            true
        });
        self.pilots = pilots;
    }

    /// Whether every pilot, riding on from where it is parked, reaches the newest gap's far edge
    fn pilots_clear_last_gap(&self) -> bool {
        let Some(landing_x) = self.modules.back().map(|m| m.landing_x) else {
            return true;
        };
        let input = TickInput::default();
        let mut events = Vec::new();
        self.pilots.iter().all(|pilot| {
            let mut trial = pilot.clone();
            let mut ticks = 0;
            while trial.crashed().is_none() && trial.pos.x < landing_x && ticks < PILOT_MAX_TICKS {
                trial.update(&input, self, &self.roster, &[], SIM_DT, &mut events);
                ticks += 1;
            }
            trial.crashed().is_none() && trial.pos.x >= landing_x
        })
    }

    /// Append one procedural segment
    pub fn extend(&mut self) {
        let distance = self.distance_at(self.cursor.next_x);
        let terrain = self.plan_terrain();
        let flavor = self.factory.pick_flavor(&mut self.rng, distance);
        let request = SegmentRequest {
            distance,
            entry_slope: self.cursor.entry_slope,
            entry_terrain: self.cursor.entry_terrain,
            terrain,
            flavor,
        };
        let module = self.factory.build(&mut self.rng, &request);
        log::debug!(
            "Segment #{} at x={:.0}: {:?} {:?}, {} sub-sections, gap {:.0}",
            self.cursor.generated,
            self.cursor.next_x,
            flavor,
            terrain,
            module.sections().len(),
            module.gap_width
        );
        self.place_ridden(ModuleShape::Compound(module));
    }

    /// Append `count` procedural segments
    pub fn generate_ahead(&mut self, count: usize) {
        for _ in 0..count {
            self.extend();
        }
    }

    /// Modules that start ahead of `x`
    pub fn segments_ahead(&self, x: f32) -> usize {
        self.modules.iter().rev().take_while(|m| m.start_x > x).count()
    }

    /// Evict modules whose far edge is more than the trim distance behind `x`
    pub fn trim(&mut self, x: f32) -> usize {
        let limit = x - self.config.trim_distance;
        let mut removed = 0;
        while self.modules.front().is_some_and(|m| m.landing_x < limit) {
            self.modules.pop_front();
            removed += 1;
        }
        if removed > 0 {
            log::debug!("Trimmed {removed} segments behind x={limit:.0}");
        }
        removed
    }

    /// Per-tick window maintenance around the rider
    pub fn update(&mut self, rider_x: f32) {
        while self.segments_ahead(rider_x) < self.config.lookahead_segments {
            self.extend();
        }
        self.trim(rider_x);
    }

    fn snapshot(&self) -> Snapshot<R> {
        Snapshot {
            cursor: self.cursor.clone(),
            rng: self.rng.clone(),
            module_count: self.modules.len(),
            pilots: self.pilots.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot<R>) {
        self.cursor = snapshot.cursor;
        self.rng = snapshot.rng;
        self.modules.truncate(snapshot.module_count);
        self.pilots = snapshot.pilots;
    }

    /// The next `count` segments the generator would produce, leaving its state untouched
    pub fn preview(&mut self, count: usize) -> Vec<PlacedModule> {
        let snapshot = self.snapshot();
        self.generate_ahead(count);
        let previewed = self
            .modules
            .iter()
            .skip(snapshot.module_count)
            .cloned()
            .collect();
        self.restore(snapshot);
        previewed
    }

    /// Index of the module whose span `[start_x, landing_x)` holds `x`
    pub fn module_index_at(&self, x: f32) -> Option<usize> {
        let idx = self.modules.partition_point(|m| m.landing_x <= x);
        self.modules
            .get(idx)
            .filter(|m| m.start_x <= x)
            .map(|_| idx)
    }

    pub fn module_at(&self, x: f32) -> Option<&PlacedModule> {
        self.module_index_at(x).map(|i| &self.modules[i])
    }
}

impl<R: Rng + Clone> TerrainQuery for TrackGenerator<R> {
    fn height_at(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.modules.front(), self.modules.back()) else {
            return FALLBACK_FLOOR_Y;
        };
        if x < first.start_x {
            return first.start_y + (x - first.start_x) * first.shape.entry_slope();
        }
        match self.module_at(x) {
            Some(module) => module.height_at(x),
            // Past the frontier: continue from the last landing along the next entry slope
            None => last.landing_y + (x - last.landing_x) * self.cursor.entry_slope,
        }
    }

    fn terrain_type_at(&self, x: f32) -> TerrainType {
        let (Some(first), Some(last)) = (self.modules.front(), self.modules.back()) else {
            return TerrainType::default();
        };
        if x < first.start_x {
            return first.shape.entry_terrain();
        }
        match self.module_at(x) {
            Some(module) => module.terrain_at(x),
            None => last.shape.exit_terrain(),
        }
    }

    fn is_over_gap(&self, x: f32) -> bool {
        self.module_at(x).is_some_and(|m| m.is_gap(x))
    }

    fn next_or_current_gap(&self, x: f32) -> GapInfo {
        let from = self.modules.partition_point(|m| m.landing_x <= x);
        self.modules
            .iter()
            .skip(from)
            .find(|m| m.has_gap())
            .map_or_else(GapInfo::none, PlacedModule::gap_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> TrackGenerator {
        TrackGenerator::with_seed(seed, SegmentFactory::default(), TrackConfig::default())
    }

    #[test]
    fn test_intro_is_fixed() {
        let a = generator(1);
        let b = generator(2);
        assert_eq!(a.module_count(), 3);
        let a_modules: Vec<_> = a.modules().cloned().collect();
        let b_modules: Vec<_> = b.modules().cloned().collect();
        assert_eq!(a_modules, b_modules);
        assert!(matches!(a_modules[0].shape, ModuleShape::Legacy(_)));
        assert!(a_modules[2].has_gap());
    }

    #[test]
    fn test_modules_are_contiguous() {
        let mut track = generator(8);
        track.generate_ahead(10);
        let modules: Vec<_> = track.modules().collect();
        for pair in modules.windows(2) {
            assert_eq!(pair[0].landing_x, pair[1].start_x);
            assert_eq!(pair[0].landing_y, pair[1].start_y);
        }
    }

    #[test]
    fn test_update_keeps_lookahead_and_trims() {
        let mut track = generator(3);
        track.update(0.0);
        assert!(track.segments_ahead(0.0) >= LOOKAHEAD_SEGMENTS);

        let far = track.frontier_x();
        track.update(far);
        assert!(track.segments_ahead(far) >= LOOKAHEAD_SEGMENTS);
        let first = track.modules().next().map(|m| m.landing_x).unwrap_or_default();
        assert!(first >= far - TRIM_DISTANCE);
    }

    #[test]
    fn test_no_segments_means_fallback_floor() {
        let config = TrackConfig {
            intro: false,
            ..Default::default()
        };
        let track = TrackGenerator::with_seed(1, SegmentFactory::default(), config);
        assert_eq!(track.height_at(1234.0), FALLBACK_FLOOR_Y);
        assert_eq!(track.terrain_type_at(1234.0), TerrainType::Snow);
        assert!(!track.is_over_gap(1234.0));
        assert!(!track.next_or_current_gap(0.0).found);
    }

    #[test]
    fn test_queries_beyond_window_extrapolate() {
        let track = generator(4);
        let frontier = track.frontier_x();
        let h1 = track.height_at(frontier + 100.0);
        let h2 = track.height_at(frontier + 200.0);
        assert!(h1.is_finite() && h2.is_finite());
        assert!(h2 > h1, "extrapolation should keep going downhill");
    }

    #[test]
    fn test_gap_queries() {
        let track = generator(5);
        let gap = track.next_or_current_gap(0.0);
        assert!(gap.found);
        assert!((gap.end_x - gap.start_x - gap.width).abs() < 1e-2);
        assert!(gap.landing_y > gap.lip_y);

        let mid = (gap.start_x + gap.end_x) * 0.5;
        assert!(track.is_over_gap(mid));
        assert!(!track.is_over_gap(gap.start_x - 1.0));
        assert!(!track.is_over_gap(gap.end_x + 1.0));
        // Still reported while inside it
        assert_eq!(track.next_or_current_gap(mid), gap);
    }

    #[test]
    fn test_intro_stays_out_of_terrain_runs() {
        let mut track = generator(1);
        assert_eq!(track.cursor.run_length, 0);
        track.extend();
        assert_eq!(track.cursor.run_length, 1);
        assert_eq!(track.cursor.run_start_distance, track.distance_at(track.modules[2].landing_x));
    }

    #[test]
    fn test_pilots_park_short_of_the_newest_lip() {
        let mut track = generator(14);
        track.generate_ahead(2);
        let lip_x = track.modules().last().map(|m| m.lip_x()).unwrap_or_default();
        assert_eq!(track.pilots().len(), VehicleRoster::default().profiles.len());
        for pilot in track.pilots() {
            assert!(pilot.crashed().is_none());
            assert!(pilot.pos.x >= lip_x - PILOT_REACH);
            assert!(pilot.pos.x < lip_x);
        }
    }

    #[test]
    fn test_resize_gap_keeps_drop_ratio() {
        let track = generator(2);
        let mut shape = track.modules().last().map(|m| m.shape.clone()).expect("intro ramp");
        let ratio = shape.gap_drop() / shape.gap_width();
        shape.resize_gap(100.0);
        assert_eq!(shape.gap_width(), 100.0);
        assert!((shape.gap_drop() / 100.0 - ratio).abs() < 1e-5);
        shape.resize_gap(0.0);
        assert_eq!((shape.gap_width(), shape.gap_drop()), (0.0, 0.0));
    }

    #[test]
    fn test_flat_normal_points_up() {
        let track = generator(6);
        let normal = track.normal_at(200.0);
        assert!((normal.length() - 1.0).abs() < 1e-4);
        assert!(normal.y < 0.0);
        // Intro descends, so the normal leans forward
        assert!(normal.x > 0.0);
    }

    #[test]
    fn test_preview_restores_state() {
        let mut track = generator(10);
        let before: Vec<_> = track.modules().cloned().collect();
        let first = track.preview(5);
        let second = track.preview(5);
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        let after: Vec<_> = track.modules().cloned().collect();
        assert_eq!(before, after);

        // The real extension produces what the preview showed
        track.generate_ahead(5);
        let real: Vec<_> = track.modules().skip(before.len()).cloned().collect();
        assert_eq!(real, first);
    }

    #[test]
    fn test_same_seed_same_track() {
        let mut a = generator(77);
        let mut b = generator(77);
        a.generate_ahead(12);
        b.generate_ahead(12);
        let a: Vec<_> = a.modules().cloned().collect();
        let b: Vec<_> = b.modules().cloned().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_module_lookup_by_x() {
        let mut track = generator(12);
        track.generate_ahead(3);
        let modules: Vec<_> = track.modules().cloned().collect();
        for (i, m) in modules.iter().enumerate() {
            assert_eq!(track.module_index_at(m.start_x), Some(i));
            assert_eq!(track.module_index_at(m.landing_x - 0.5), Some(i));
        }
        assert_eq!(track.module_index_at(-10.0), None);
    }
}
