//! Procedural segment factory
//!
//! Turns a terrain plan and the current guidance slope into concrete compound
//! segment geometry. All variance is drawn from the caller's RNG so a seed
//! reproduces the same track. Gap widths leave here raw; the track generator
//! narrows them once its pilot riders have tried the lip.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::curve::{CompoundBuilder, CompoundModule, ShapeParams, SubSectionKind};
use super::difficulty::DifficultyProfile;
use super::terrain::TerrainType;
use crate::consts::*;

/// Named style of a generated segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavor {
    Cruise,
    Rollers,
    Technical,
    Steep,
}

impl Flavor {
    /// Sub-section kinds a segment of this flavor draws its body from
    pub fn menu(&self) -> &'static [SubSectionKind] {
        match self {
            Flavor::Cruise => &[
                SubSectionKind::LongCruise,
                SubSectionKind::PowderField,
                SubSectionKind::RollingHills,
            ],
            Flavor::Rollers => &[
                SubSectionKind::RollingHills,
                SubSectionKind::PowderField,
                SubSectionKind::LongCruise,
            ],
            Flavor::Technical => &[
                SubSectionKind::MogulField,
                SubSectionKind::RockGarden,
                SubSectionKind::RollingHills,
            ],
            Flavor::Steep => &[
                SubSectionKind::SteepChute,
                SubSectionKind::LongCruise,
                SubSectionKind::MogulField,
            ],
        }
    }

    pub fn min_tier(&self) -> u8 {
        match self {
            Flavor::Cruise | Flavor::Rollers => 1,
            Flavor::Technical => 2,
            Flavor::Steep => 3,
        }
    }
}

/// What the generator asks the factory for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRequest {
    /// Distance travelled at the segment's start
    pub distance: f32,
    /// Slope the segment must start with
    pub entry_slope: f32,
    /// Terrain of whatever precedes the segment
    pub entry_terrain: TerrainType,
    /// Terrain of the segment body
    pub terrain: TerrainType,
    pub flavor: Flavor,
}

/// Body piece parameters before slopes are assigned
struct BodyPiece {
    kind: SubSectionKind,
    length: f32,
    drop: f32,
    shape: ShapeParams,
}

/// Fixed single-shape pieces of the intro run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntroPiece {
    pub length: f32,
    pub drop: f32,
    pub entry_slope: f32,
    pub exit_slope: f32,
    pub gap_width: f32,
    pub gap_drop: f32,
}

/// Synthesizes segment geometry from the difficulty schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentFactory {
    pub difficulty: DifficultyProfile,
}

impl Default for SegmentFactory {
    fn default() -> Self {
        Self::new(DifficultyProfile::default())
    }
}

impl SegmentFactory {
    pub fn new(difficulty: DifficultyProfile) -> Self {
        Self { difficulty }
    }

    /// Roll a flavor allowed at this distance
    pub fn pick_flavor<R: Rng>(&self, rng: &mut R, distance: f32) -> Flavor {
        let tier = self.difficulty.max_tier(distance);
        let steep = self.difficulty.steep_chance(distance);
        let technical = self.difficulty.technical_chance(distance);
        let roll: f32 = rng.random();

        if tier >= Flavor::Steep.min_tier() && roll < steep {
            Flavor::Steep
        } else if tier >= Flavor::Technical.min_tier() && roll < steep + technical {
            Flavor::Technical
        } else if rng.random_bool(0.5) {
            Flavor::Cruise
        } else {
            Flavor::Rollers
        }
    }

    /// Pick a terrain different from `current` among those unlocked at this distance
    pub fn pick_new_terrain<R: Rng>(
        &self,
        rng: &mut R,
        current: TerrainType,
        distance: f32,
    ) -> TerrainType {
        let tier = self.difficulty.max_tier(distance);
        let options: Vec<TerrainType> = TerrainType::unlocked(tier).filter(|&t| t != current).collect();
        if options.is_empty() {
            return current;
        }
        options[rng.random_range(0..options.len())]
    }

    /// Descent drop: `length · tan(guidance) · variance`, scaled and clamped
    pub fn descent_drop(&self, length: f32, guidance_slope: f32, variance: f32, distance: f32) -> f32 {
        let drop = length * guidance_slope * variance * self.difficulty.drop_multiplier(distance);
        drop.clamp(length * MIN_DROP_RATIO, length * MAX_DROP_RATIO)
    }

    /// Ramp rise as a fraction of the preceding descent's drop
    pub fn ramp_rise(&self, preceding_drop: f32, fraction: f32, ramp_length: f32) -> f32 {
        (preceding_drop.max(0.0) * fraction).clamp(MIN_RAMP_RISE, ramp_length * MAX_RAMP_RISE_RATIO)
    }

    /// Raw gap width: `base · sqrt(drop_ratio) · gap_multiplier`, clamped
    pub fn gap_width(&self, drop_ratio: f32, distance: f32) -> f32 {
        let width =
            BASE_GAP_WIDTH * drop_ratio.max(0.0).sqrt() * self.difficulty.gap_multiplier(distance);
        width.clamp(MIN_GAP_WIDTH, MAX_GAP_WIDTH)
    }

    /// Far side of a gap sits this much lower than the lip
    pub fn gap_drop(&self, width: f32, guidance_slope: f32) -> f32 {
        width * guidance_slope.max(0.0) * GAP_LANDING_DROP_RATIO
    }

    /// Synthesize one compound segment
    pub fn build<R: Rng>(&self, rng: &mut R, request: &SegmentRequest) -> CompoundModule {
        let distance = request.distance;
        let guidance = self.difficulty.guidance_slope(distance);
        let tier = self.difficulty.max_tier(distance);
        let difficulty = self.difficulty.progress(distance);

        // Landing: ease from the entry slope onto the guidance slope
        let landing_len = rng.random_range(280.0..420.0);
        let landing_drop = landing_len * (request.entry_slope + guidance) * 0.5;
        let mut builder = CompoundBuilder::new(request.entry_slope).push(
            SubSectionKind::Landing,
            landing_len,
            landing_drop,
            guidance,
            request.entry_terrain,
            ShapeParams::default(),
        );

        if request.terrain != request.entry_terrain {
            let len = rng.random_range(200.0..320.0);
            let variance = rng.random_range(0.8..1.2);
            let drop = self.descent_drop(len, guidance, variance, distance);
            builder = builder.push(
                SubSectionKind::TerrainTransition,
                len,
                drop,
                guidance,
                request.terrain,
                ShapeParams {
                    difficulty,
                    ..Default::default()
                },
            );
        }

        // Body
        let menu = request.flavor.menu();
        let count = rng.random_range(2..=2 + tier.min(3) as usize);
        let mut pieces: Vec<BodyPiece> = Vec::with_capacity(count);
        for _ in 0..count {
            let kind = menu[rng.random_range(0..menu.len())];
            pieces.push(self.body_piece(rng, kind, guidance, difficulty, distance));
        }

        let mean_slopes: Vec<f32> = pieces.iter().map(|p| p.drop / p.length).collect();
        for (i, piece) in pieces.iter().enumerate() {
            let exit_slope = match mean_slopes.get(i + 1) {
                Some(next) => (mean_slopes[i] + next) * 0.5,
                None => mean_slopes[i],
            };
            builder = builder.push(
                piece.kind,
                piece.length,
                piece.drop,
                exit_slope,
                request.terrain,
                piece.shape,
            );
        }

        // Exit ramp: climbs by a fraction of the last descent, leaves at a controlled angle
        let last_drop = pieces.last().map_or(0.0, |p| p.drop);
        let last_len = pieces.last().map_or(1.0, |p| p.length);
        let ramp_len = rng.random_range(220.0..360.0);
        let rise_fraction = rng.random_range(0.15..0.3);
        let rise = self.ramp_rise(last_drop, rise_fraction, ramp_len);
        let tier_frac = (tier.saturating_sub(1)) as f32 / 4.0;
        let ramp_angle = crate::lerp(0.3, 0.45, tier_frac) + rng.random_range(-0.04..0.04);
        let lip_slope = -ramp_angle.tan();
        builder = builder.push(
            SubSectionKind::ExitRamp,
            ramp_len,
            -rise,
            lip_slope,
            request.terrain,
            ShapeParams {
                difficulty,
                ..Default::default()
            },
        );

        // Gap sized by how hard the last descent dropped relative to nominal
        let nominal = (last_len * guidance).max(1.0);
        let gap_width = self.gap_width(last_drop / nominal, distance);

        builder.finish(gap_width, self.gap_drop(gap_width, guidance))
    }

    fn body_piece<R: Rng>(
        &self,
        rng: &mut R,
        kind: SubSectionKind,
        guidance: f32,
        difficulty: f32,
        distance: f32,
    ) -> BodyPiece {
        let (len_range, drop_factor, amp_base, periods) = match kind {
            SubSectionKind::LongCruise => (600.0..1000.0, 1.0, 0.0, 1..=1),
            SubSectionKind::RollingHills => (500.0..800.0, 0.9, 30.0, 1..=3),
            SubSectionKind::MogulField => (350.0..550.0, 0.9, 10.0, 4..=8),
            SubSectionKind::RockGarden => (300.0..500.0, 0.9, 16.0, 3..=6),
            SubSectionKind::SteepChute => (400.0..700.0, 1.8, 0.0, 1..=1),
            SubSectionKind::PowderField => (500.0..800.0, 0.9, 12.0, 1..=2),
            _ => (300.0..500.0, 1.0, 0.0, 1..=1),
        };
        let length: f32 = rng.random_range(len_range);
        let variance = rng.random_range(0.75..1.25);
        let drop = self.descent_drop(length, guidance * drop_factor, variance, distance);
        let amplitude = amp_base * (0.7 + 0.6 * difficulty);
        let periods = rng.random_range(periods);

        BodyPiece {
            kind,
            length,
            drop,
            shape: ShapeParams {
                net_drop: drop,
                amplitude,
                periods,
                difficulty,
            },
        }
    }

    /// The fixed intro: one long descent, an approach, then a first ramp and gap
    pub fn intro_pieces(&self) -> [IntroPiece; 3] {
        let guidance = self.difficulty.guidance_slope(0.0);

        let descent = IntroPiece {
            length: INTRO_DESCENT_LENGTH,
            drop: INTRO_DESCENT_LENGTH * guidance * 1.1,
            entry_slope: 0.05,
            exit_slope: guidance,
            gap_width: 0.0,
            gap_drop: 0.0,
        };

        let approach_exit = guidance * 0.4;
        let approach = IntroPiece {
            length: INTRO_APPROACH_LENGTH,
            drop: INTRO_APPROACH_LENGTH * (guidance + approach_exit) * 0.5,
            entry_slope: guidance,
            exit_slope: approach_exit,
            gap_width: 0.0,
            gap_drop: 0.0,
        };

        let gap_width = BASE_GAP_WIDTH * INTRO_GAP_SCALE;
        let ramp = IntroPiece {
            length: INTRO_RAMP_LENGTH,
            drop: -INTRO_RAMP_RISE,
            entry_slope: approach_exit,
            exit_slope: -INTRO_RAMP_ANGLE.tan(),
            gap_width,
            gap_drop: self.gap_drop(gap_width, guidance),
        };

        [descent, approach, ramp]
    }
}

/// Descents never drop less than this fraction of their length
const MIN_DROP_RATIO: f32 = 0.02;
/// ... nor more than this
const MAX_DROP_RATIO: f32 = 1.0;
const MIN_RAMP_RISE: f32 = 12.0;
const MAX_RAMP_RISE_RATIO: f32 = 0.3;

const INTRO_DESCENT_LENGTH: f32 = 2600.0;
const INTRO_APPROACH_LENGTH: f32 = 700.0;
const INTRO_RAMP_LENGTH: f32 = 200.0;
const INTRO_RAMP_RISE: f32 = 20.0;
const INTRO_RAMP_ANGLE: f32 = 0.3;
const INTRO_GAP_SCALE: f32 = 0.8;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn request(distance: f32) -> SegmentRequest {
        SegmentRequest {
            distance,
            entry_slope: 0.2,
            entry_terrain: TerrainType::Snow,
            terrain: TerrainType::Snow,
            flavor: Flavor::Rollers,
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let factory = SegmentFactory::default();
        let a = factory.build(&mut Pcg32::seed_from_u64(7), &request(1000.0));
        let b = factory.build(&mut Pcg32::seed_from_u64(7), &request(1000.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_shape_bookends() {
        let factory = SegmentFactory::default();
        let mut rng = Pcg32::seed_from_u64(42);
        let module = factory.build(&mut rng, &request(5000.0));
        let sections = module.sections();
        assert_eq!(sections[0].kind, SubSectionKind::Landing);
        assert_eq!(sections[sections.len() - 1].kind, SubSectionKind::ExitRamp);
        assert_eq!(module.entry_slope(), 0.2);
        assert!(module.exit_slope() < 0.0, "ramp must exit upward");
        assert!(module.gap_width >= MIN_GAP_WIDTH && module.gap_width <= MAX_GAP_WIDTH);
    }

    #[test]
    fn test_net_trend_stays_downhill() {
        let factory = SegmentFactory::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for i in 0..20 {
            let module = factory.build(&mut rng, &request(i as f32 * 3000.0));
            assert!(module.exit_height() > 0.0, "segment {i} climbed overall");
        }
    }

    #[test]
    fn test_terrain_switch_inserts_transition() {
        let factory = SegmentFactory::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let module = factory.build(
            &mut rng,
            &SegmentRequest {
                terrain: TerrainType::Powder,
                ..request(0.0)
            },
        );
        let sections = module.sections();
        assert_eq!(sections[0].terrain, TerrainType::Snow);
        assert_eq!(sections[1].kind, SubSectionKind::TerrainTransition);
        assert_eq!(sections[1].terrain, TerrainType::Powder);
        assert_eq!(module.exit_terrain(), TerrainType::Powder);
    }

    #[test]
    fn test_gap_width_scaling() {
        let factory = SegmentFactory::default();
        let nominal = factory.gap_width(1.0, 0.0);
        assert!((nominal - BASE_GAP_WIDTH).abs() < 1e-3);
        assert!(factory.gap_width(4.0, 0.0) > nominal);
        assert_eq!(factory.gap_width(100.0, 1.0e9), MAX_GAP_WIDTH);
        assert_eq!(factory.gap_width(0.0, 0.0), MIN_GAP_WIDTH);
    }

    #[test]
    fn test_gap_drop_follows_guidance() {
        let factory = SegmentFactory::default();
        let drop = factory.gap_drop(200.0, 0.3);
        assert!((drop - 200.0 * 0.3 * GAP_LANDING_DROP_RATIO).abs() < 1e-4);
        assert_eq!(factory.gap_drop(200.0, -0.1), 0.0);

        let module = factory.build(&mut Pcg32::seed_from_u64(21), &request(0.0));
        let guidance = factory.difficulty.guidance_slope(0.0);
        assert!((module.gap_drop - factory.gap_drop(module.gap_width, guidance)).abs() < 1e-4);
    }

    #[test]
    fn test_flavor_gating_by_tier() {
        let factory = SegmentFactory::default();
        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..200 {
            let flavor = factory.pick_flavor(&mut rng, 0.0);
            assert!(matches!(flavor, Flavor::Cruise | Flavor::Rollers));
        }
    }

    #[test]
    fn test_new_terrain_differs() {
        let factory = SegmentFactory::default();
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            let t = factory.pick_new_terrain(&mut rng, TerrainType::Snow, 1.0e9);
            assert_ne!(t, TerrainType::Snow);
        }
        // Tier 1 only has Snow and Powder
        assert_eq!(
            factory.pick_new_terrain(&mut rng, TerrainType::Snow, 0.0),
            TerrainType::Powder
        );
    }

    #[test]
    fn test_intro_connects_and_ends_in_gap() {
        let factory = SegmentFactory::default();
        let [descent, approach, ramp] = factory.intro_pieces();
        assert_eq!(descent.exit_slope, approach.entry_slope);
        assert_eq!(approach.exit_slope, ramp.entry_slope);
        assert_eq!(descent.gap_width, 0.0);
        assert!(ramp.gap_width >= MIN_GAP_WIDTH);
        assert!(ramp.exit_slope < 0.0);
    }
}
