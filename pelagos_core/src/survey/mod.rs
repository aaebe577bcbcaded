// pelagos_core/src/survey/mod.rs

//! The canonical in-memory model of a bathymetric survey: an ordered
//! sequence of submaps, each a rigid 3-D point cloud tagged with the pose
//! it was acquired at.

use nalgebra::{Isometry3, Point3};

use crate::filter::UniformSampler;

pub mod archive;
pub mod load;
pub mod raw;
mod records;

pub use records::SubmapRecord;

/// Rigid transform relating a raw ground-truth frame to the map frame.
/// Extracted once per run and consumed when the submap is re-expressed.
pub type MapTransform = Isometry3<f64>;

/// One localized point cloud captured at a single vehicle pose.
///
/// The pose is fixed at acquisition; the cloud content is replaced when the
/// submap is downsampled.
#[derive(Clone, Debug)]
pub struct Submap {
    pub pose: Isometry3<f64>,
    pub cloud: Vec<Point3<f64>>,
}

impl Submap {
    pub fn new(pose: Isometry3<f64>, cloud: Vec<Point3<f64>>) -> Self {
        Self { pose, cloud }
    }

    pub fn point_count(&self) -> usize {
        self.cloud.len()
    }
}

/// Ordered set of submaps forming (part of) a survey, in acquisition order.
///
/// The collection is the sole owner of its submaps. It is populated exactly
/// once by a loader and then only mutated by the one-time downsampling pass.
#[derive(Clone, Debug, Default)]
pub struct SubmapCollection {
    submaps: Vec<Submap>,
}

impl SubmapCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, submap: Submap) {
        self.submaps.push(submap);
    }

    pub fn len(&self) -> usize {
        self.submaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submaps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Submap> {
        self.submaps.iter()
    }

    /// The submap whose cloud the publish loop emits: the most recently
    /// acquired one.
    pub fn active(&self) -> Option<&Submap> {
        self.submaps.last()
    }

    /// Total number of points across all submaps.
    pub fn total_points(&self) -> usize {
        self.submaps.iter().map(Submap::point_count).sum()
    }

    /// Replaces every submap's cloud with its spatially downsampled subset.
    /// Runs once, before the publish loop starts; the publish loop never
    /// re-filters.
    pub fn downsample(&mut self, sampler: &UniformSampler) {
        for submap in &mut self.submaps {
            sampler.filter_in_place(&mut submap.cloud);
        }
    }
}

impl FromIterator<Submap> for SubmapCollection {
    fn from_iter<I: IntoIterator<Item = Submap>>(iter: I) -> Self {
        Self {
            submaps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_submap(n: usize, spacing: f64) -> Submap {
        let mut cloud = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                cloud.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
            }
        }
        Submap::new(Isometry3::identity(), cloud)
    }

    #[test]
    fn test_active_is_last_submap() {
        let mut collection = SubmapCollection::new();
        assert!(collection.active().is_none());

        collection.push(grid_submap(2, 1.0));
        let last = Submap::new(Isometry3::translation(5.0, 0.0, -10.0), vec![]);
        collection.push(last);

        assert_eq!(collection.len(), 2);
        let active = collection.active().unwrap();
        assert_eq!(active.pose.translation.vector.x, 5.0);
    }

    #[test]
    fn test_downsample_touches_every_submap() {
        let mut collection: SubmapCollection =
            (0..3).map(|_| grid_submap(10, 0.5)).collect();
        let dense = collection.total_points();

        let sampler = UniformSampler::new(2.0).unwrap();
        collection.downsample(&sampler);

        assert!(collection.total_points() < dense);
        for submap in collection.iter() {
            assert!(!submap.cloud.is_empty());
        }
    }
}
