// pelagos_core/src/filter.rs

//! Spatial downsampling of submap clouds.
//!
//! Bounds memory and transmission cost independent of input density. The
//! filter is lossy and irreversible: no provenance of discarded points is
//! kept.

use std::collections::HashMap;

use nalgebra::Point3;

/// Error constructing a [`UniformSampler`]. Fatal at startup; an invalid
/// radius is never silently skipped.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("downsampling radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
}

/// Uniform spatial sampler over cubic cells of edge `radius`.
///
/// Every occupied cell keeps exactly one point, the one nearest the cell
/// center. Re-applying the same radius to an already-filtered cloud changes
/// nothing: each survivor is alone in its cell.
///
/// A radius larger than the cloud's extent collapses the cloud to the few
/// cells it straddles (a single point when the cloud sits inside one cell,
/// at most eight for a cube crossing cell boundaries).
#[derive(Clone, Debug)]
pub struct UniformSampler {
    radius: f64,
}

impl UniformSampler {
    pub fn new(radius: f64) -> Result<Self, FilterError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(FilterError::InvalidRadius(radius));
        }
        Ok(Self { radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Replaces `cloud` with its downsampled subset, preserving the input
    /// order of the retained points. Empty clouds are a no-op.
    pub fn filter_in_place(&self, cloud: &mut Vec<Point3<f64>>) {
        if cloud.is_empty() {
            return;
        }

        let r = self.radius;
        // Cell key -> (index of best point so far, its squared distance to
        // the cell center). Ties keep the earlier point, so the outcome
        // does not depend on hash iteration order.
        let mut best: HashMap<(i64, i64, i64), (usize, f64)> = HashMap::new();
        for (idx, p) in cloud.iter().enumerate() {
            let key = (
                (p.x / r).floor() as i64,
                (p.y / r).floor() as i64,
                (p.z / r).floor() as i64,
            );
            let center = Point3::new(
                (key.0 as f64 + 0.5) * r,
                (key.1 as f64 + 0.5) * r,
                (key.2 as f64 + 0.5) * r,
            );
            let d2 = (p - center).norm_squared();
            match best.get_mut(&key) {
                Some(entry) if d2 >= entry.1 => {}
                Some(entry) => *entry = (idx, d2),
                None => {
                    best.insert(key, (idx, d2));
                }
            }
        }

        let mut keep: Vec<usize> = best.into_values().map(|(idx, _)| idx).collect();
        keep.sort_unstable();
        let filtered: Vec<Point3<f64>> = keep.into_iter().map(|idx| cloud[idx]).collect();
        *cloud = filtered;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random points in the unit cube (splitmix64).
    fn unit_cube_cloud(n: usize, mut seed: u64) -> Vec<Point3<f64>> {
        let mut next = move || {
            seed = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = seed;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z = z ^ (z >> 31);
            (z >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..n)
            .map(|_| Point3::new(next(), next(), next()))
            .collect()
    }

    #[test]
    fn test_invalid_radius_is_rejected() {
        assert!(matches!(
            UniformSampler::new(0.0),
            Err(FilterError::InvalidRadius(_))
        ));
        assert!(matches!(
            UniformSampler::new(-2.0),
            Err(FilterError::InvalidRadius(_))
        ));
        assert!(matches!(
            UniformSampler::new(f64::NAN),
            Err(FilterError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_empty_cloud_is_a_noop() {
        let sampler = UniformSampler::new(2.0).unwrap();
        let mut cloud: Vec<Point3<f64>> = Vec::new();
        sampler.filter_in_place(&mut cloud);
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_never_increases_and_never_empties() {
        let sampler = UniformSampler::new(0.25).unwrap();
        let mut cloud = unit_cube_cloud(1_000, 7);
        let dense = cloud.len();
        sampler.filter_in_place(&mut cloud);
        assert!(cloud.len() <= dense);
        assert!(!cloud.is_empty());
    }

    #[test]
    fn test_idempotent_at_same_radius() {
        let sampler = UniformSampler::new(0.2).unwrap();
        let mut cloud = unit_cube_cloud(10_000, 42);
        sampler.filter_in_place(&mut cloud);
        let once = cloud.clone();
        sampler.filter_in_place(&mut cloud);
        assert_eq!(cloud.len(), once.len());
        assert_eq!(cloud, once);
    }

    #[test]
    fn test_radius_exceeding_extent_degrades_to_minimal_set() {
        // 10k points in a 1x1x1 cube, radius 2: pairwise separation >= 2 is
        // impossible, so the filter must collapse to at most one point per
        // straddled cell.
        let sampler = UniformSampler::new(2.0).unwrap();
        let mut cloud = unit_cube_cloud(10_000, 1);
        sampler.filter_in_place(&mut cloud);
        assert!(cloud.len() < 10_000);
        assert!(cloud.len() <= 8);
    }

    #[test]
    fn test_retained_points_come_from_the_input() {
        let sampler = UniformSampler::new(1.0).unwrap();
        let original = unit_cube_cloud(500, 3);
        let mut cloud = original.clone();
        sampler.filter_in_place(&mut cloud);
        for p in &cloud {
            assert!(original.contains(p));
        }
    }

    #[test]
    fn test_well_separated_points_all_survive() {
        let sampler = UniformSampler::new(2.0).unwrap();
        let mut cloud = vec![
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(10.5, 0.5, 0.5),
            Point3::new(0.5, 10.5, 0.5),
        ];
        let expected = cloud.clone();
        sampler.filter_in_place(&mut cloud);
        assert_eq!(cloud, expected);
    }
}
