//! Compound segment geometry
//!
//! A compound segment is a chain of sub-sections laid end to end in local
//! coordinates (x from 0, heights relative to the segment's start). Adjacent
//! sub-sections share their boundary height and slope, so the chain is C1.
//!
//! Sampling a sub-section:
//! - `Landing` and `ExitRamp` are pure cubic Hermite between their end conditions.
//! - Interior kinds compute their raw parametric shape and the Hermite estimate,
//!   then blend from Hermite at the boundaries to the raw shape inside, using a
//!   smooth-step weight over `min(BLEND_MAX_WIDTH, BLEND_FRACTION·length)`.

use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use super::terrain::TerrainType;
use crate::consts::{BLEND_FRACTION, BLEND_MAX_WIDTH, MIN_SECTION_LENGTH};
use crate::lerp;

/// Cubic Hermite between `(p0, m0)` and `(p1, m1)` over a span of `length`
///
/// Slopes are dy/dx, so they are scaled by the span.
#[inline]
pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, length: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * p0 + h10 * length * m0 + h01 * p1 + h11 * length * m1
}

/// Smooth-step weight: 0 at `edge0`, 1 at `edge1`, zero slope at both ends
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Shape of a sub-section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubSectionKind {
    Landing,
    RollingHills,
    RockGarden,
    LongCruise,
    MogulField,
    TerrainTransition,
    SteepChute,
    PowderField,
    ExitRamp,
}

impl SubSectionKind {
    /// Sampled with Hermite only (no raw shape, no blending)
    pub fn is_hermite_only(&self) -> bool {
        matches!(self, SubSectionKind::Landing | SubSectionKind::ExitRamp)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubSectionKind::Landing => "Landing",
            SubSectionKind::RollingHills => "RollingHills",
            SubSectionKind::RockGarden => "RockGarden",
            SubSectionKind::LongCruise => "LongCruise",
            SubSectionKind::MogulField => "MogulField",
            SubSectionKind::TerrainTransition => "TerrainTransition",
            SubSectionKind::SteepChute => "SteepChute",
            SubSectionKind::PowderField => "PowderField",
            SubSectionKind::ExitRamp => "ExitRamp",
        }
    }
}

/// Shape parameters of a sub-section
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeParams {
    /// Height change across the sub-section (positive = descends)
    pub net_drop: f32,
    /// Oscillation amplitude for bumpy kinds
    pub amplitude: f32,
    /// Oscillation count for bumpy kinds
    pub periods: u32,
    /// Difficulty in [0, 1] the shape was generated at
    pub difficulty: f32,
}

/// One shape piece inside a compound segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSection {
    pub kind: SubSectionKind,
    /// Local start offset
    pub start: f32,
    /// Local end offset
    pub end: f32,
    pub entry_height: f32,
    pub exit_height: f32,
    pub entry_slope: f32,
    pub exit_slope: f32,
    pub terrain: TerrainType,
    pub shape: ShapeParams,
}

impl SubSection {
    #[inline]
    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// Normalized position of local offset `x` in this sub-section
    #[inline]
    pub fn local_t(&self, x: f32) -> f32 {
        let length = self.length();
        if length <= 0.0 {
            return 0.0;
        }
        ((x - self.start) / length).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn hermite_height(&self, t: f32) -> f32 {
        hermite(
            self.entry_height,
            self.entry_slope,
            self.exit_height,
            self.exit_slope,
            self.length(),
            t,
        )
    }

    /// Raw parametric shape at `t`
    pub fn raw_height(&self, t: f32) -> f32 {
        let p0 = self.entry_height;
        let drop = self.exit_height - self.entry_height;
        let linear = p0 + drop * t;
        let amp = self.shape.amplitude;
        let n = self.shape.periods.max(1) as f32;
        let ease = (1.0 - (PI * t).cos()) * 0.5;

        // Negative offsets raise the surface (+y is down)
        match self.kind {
            SubSectionKind::Landing | SubSectionKind::ExitRamp => self.hermite_height(t),
            SubSectionKind::RollingHills => linear + amp * (TAU * n * t).sin(),
            SubSectionKind::MogulField => linear - amp * (PI * n * t).sin().powi(2),
            SubSectionKind::RockGarden => {
                let jitter = 0.6 + 0.4 * (TAU * 3.0 * t).sin();
                linear - amp * (PI * n * t).sin().powi(2) * jitter
            }
            SubSectionKind::PowderField => linear + amp * (TAU * n * t).sin() * (PI * t).sin(),
            SubSectionKind::LongCruise
            | SubSectionKind::SteepChute
            | SubSectionKind::TerrainTransition => p0 + drop * ease,
        }
    }

    /// Height at local offset `x` (segment-local, not sub-section-local)
    pub fn sample_height(&self, x: f32) -> f32 {
        let t = self.local_t(x);
        let hermite = self.hermite_height(t);
        if self.kind.is_hermite_only() {
            return hermite;
        }

        let length = self.length();
        let zone = BLEND_MAX_WIDTH.min(BLEND_FRACTION * length);
        let offset = t * length;
        let edge_distance = offset.min(length - offset);
        let weight = smoothstep(0.0, zone, edge_distance);
        lerp(hermite, self.raw_height(t), weight)
    }
}

/// A chain of C1-continuous sub-sections followed by a gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundModule {
    sections: Vec<SubSection>,
    /// Gap after the last sub-section (0 = no gap)
    pub gap_width: f32,
    /// How much lower the far side of the gap sits than the lip
    pub gap_drop: f32,
}

impl CompoundModule {
    /// Build from sub-sections, re-stitching them so the chain is contiguous
    ///
    /// Each sub-section starts where the previous ended and inherits its exit
    /// height and slope; degenerate lengths are stretched to `MIN_SECTION_LENGTH`.
    pub fn new(mut sections: Vec<SubSection>, gap_width: f32, gap_drop: f32) -> Self {
        if sections.is_empty() {
            sections.push(SubSection {
                kind: SubSectionKind::Landing,
                start: 0.0,
                end: MIN_SECTION_LENGTH,
                entry_height: 0.0,
                exit_height: 0.0,
                entry_slope: 0.0,
                exit_slope: 0.0,
                terrain: TerrainType::default(),
                shape: ShapeParams::default(),
            });
        }

        let mut cursor = 0.0;
        let mut prev: Option<(f32, f32)> = None;
        for section in &mut sections {
            let length = section.length().max(MIN_SECTION_LENGTH);
            section.start = cursor;
            section.end = cursor + length;
            match prev {
                Some((height, slope)) => {
                    section.entry_height = height;
                    section.entry_slope = slope;
                }
                // The chain is anchored at local height 0
                None => {
                    section.exit_height -= section.entry_height;
                    section.entry_height = 0.0;
                }
            }
            section.shape.net_drop = section.exit_height - section.entry_height;
            prev = Some((section.exit_height, section.exit_slope));
            cursor = section.end;
        }
        debug_assert!(sections.windows(2).all(|w| w[0].end == w[1].start));

        Self {
            sections,
            gap_width: gap_width.max(0.0),
            gap_drop,
        }
    }

    pub fn sections(&self) -> &[SubSection] {
        &self.sections
    }

    /// Surface length (excluding the gap)
    pub fn length(&self) -> f32 {
        self.sections.last().map_or(0.0, |s| s.end)
    }

    /// Index of the sub-section owning local offset `x` (boundaries belong to the right side)
    pub fn section_index(&self, x: f32) -> usize {
        let idx = self.sections.partition_point(|s| s.end <= x);
        idx.min(self.sections.len().saturating_sub(1))
    }

    pub fn section_at(&self, x: f32) -> &SubSection {
        &self.sections[self.section_index(x)]
    }

    /// Local height at local offset `x`, clamped to the surface extent
    pub fn sample_height(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, self.length());
        self.section_at(x).sample_height(x)
    }

    pub fn terrain_at(&self, x: f32) -> TerrainType {
        self.section_at(x).terrain
    }

    pub fn entry_slope(&self) -> f32 {
        self.sections[0].entry_slope
    }

    pub fn exit_slope(&self) -> f32 {
        self.sections[self.sections.len() - 1].exit_slope
    }

    pub fn exit_height(&self) -> f32 {
        self.sections[self.sections.len() - 1].exit_height
    }

    pub fn entry_terrain(&self) -> TerrainType {
        self.sections[0].terrain
    }

    pub fn exit_terrain(&self) -> TerrainType {
        self.sections[self.sections.len() - 1].terrain
    }
}

/// Appends sub-sections to a chain, carrying height and slope across boundaries
#[derive(Debug, Clone)]
pub struct CompoundBuilder {
    sections: Vec<SubSection>,
    cursor_x: f32,
    cursor_height: f32,
    cursor_slope: f32,
}

impl CompoundBuilder {
    pub fn new(entry_slope: f32) -> Self {
        Self {
            sections: Vec::new(),
            cursor_x: 0.0,
            cursor_height: 0.0,
            cursor_slope: entry_slope,
        }
    }

    /// Append a sub-section descending by `drop` (negative climbs) and leaving at `exit_slope`
    pub fn push(
        mut self,
        kind: SubSectionKind,
        length: f32,
        drop: f32,
        exit_slope: f32,
        terrain: TerrainType,
        shape: ShapeParams,
    ) -> Self {
        let length = length.max(MIN_SECTION_LENGTH);
        let exit_height = self.cursor_height + drop;
        self.sections.push(SubSection {
            kind,
            start: self.cursor_x,
            end: self.cursor_x + length,
            entry_height: self.cursor_height,
            exit_height,
            entry_slope: self.cursor_slope,
            exit_slope,
            terrain,
            shape: ShapeParams {
                net_drop: drop,
                ..shape
            },
        });
        self.cursor_x += length;
        self.cursor_height = exit_height;
        self.cursor_slope = exit_slope;
        self
    }

    pub fn cursor_slope(&self) -> f32 {
        self.cursor_slope
    }

    pub fn finish(self, gap_width: f32, gap_drop: f32) -> CompoundModule {
        CompoundModule::new(self.sections, gap_width, gap_drop)
    }
}
