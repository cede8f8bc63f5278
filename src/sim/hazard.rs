//! Hazard colliders
//!
//! Circular obstacles placed by the surrounding game. The rider crashes on
//! overlap; nothing else interacts with them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Signed distance to a circle
#[inline]
pub fn sd_circle(p: Vec2, center: Vec2, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// A circular hazard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
}

impl Hazard {
    /// Whether a circle of `radius` at `p` touches this hazard
    #[inline]
    pub fn overlaps(&self, p: Vec2, radius: f32) -> bool {
        sd_circle(p, self.pos, self.radius) < radius
    }
}

/// First hazard (lowest id) a circle touches
pub fn first_overlap(hazards: &[Hazard], p: Vec2, radius: f32) -> Option<&Hazard> {
    hazards
        .iter()
        .filter(|h| h.overlaps(p, radius))
        .min_by_key(|h| h.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sd_circle() {
        assert_eq!(sd_circle(Vec2::new(10.0, 0.0), Vec2::ZERO, 4.0), 6.0);
        assert!(sd_circle(Vec2::ZERO, Vec2::ZERO, 4.0) < 0.0);
    }

    #[test]
    fn test_overlap_uses_both_radii() {
        let hazard = Hazard {
            id: 1,
            pos: Vec2::new(100.0, 0.0),
            radius: 10.0,
        };
        assert!(hazard.overlaps(Vec2::new(85.0, 0.0), 6.0));
        assert!(!hazard.overlaps(Vec2::new(80.0, 0.0), 6.0));
    }

    #[test]
    fn test_first_overlap_is_stable() {
        let hazards = [
            Hazard {
                id: 7,
                pos: Vec2::ZERO,
                radius: 5.0,
            },
            Hazard {
                id: 3,
                pos: Vec2::new(2.0, 0.0),
                radius: 5.0,
            },
        ];
        assert_eq!(first_overlap(&hazards, Vec2::new(1.0, 0.0), 1.0).map(|h| h.id), Some(3));
        assert!(first_overlap(&hazards, Vec2::new(50.0, 0.0), 1.0).is_none());
    }
}
