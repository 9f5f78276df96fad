use nalgebra::Point3;

use super::{line_plane_collision, Axis, Crossing};
use crate::error::{ensure_finite, Result};
use crate::ray::FiniteRay;

#[cfg(test)]
mod tests {
    use super::*;

    fn slab() -> SemiInfiniteSlab {
        SemiInfiniteSlab::new(Axis::X, 10.0, 20.0).unwrap()
    }

    fn length(start: [f64; 3], end: [f64; 3]) -> f64 {
        let ray = FiniteRay::from_slices(&start, &end).unwrap();
        slab().crossing_length(&ray).unwrap()
    }

    #[test]
    fn diagonal_through_both_faces() {
        let full = 10.0 * 3f64.sqrt();
        assert!((length([0.0; 3], [30.0; 3]) - full).abs() < 1e-9);
        assert!((length([15.0; 3], [30.0; 3]) - full / 2.0).abs() < 1e-9);
        assert!((length([30.0; 3], [15.0; 3]) - full / 2.0).abs() < 1e-9);
        assert!((length([0.0; 3], [15.0; 3]) - full / 2.0).abs() < 1e-9);
        assert!((length([11.0; 3], [16.0; 3]) - 75f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn misses() {
        assert_eq!(length([0.0; 3], [5.0; 3]), 0.0);
        assert_eq!(length([25.0; 3], [40.0; 3]), 0.0);
    }

    #[test]
    fn parallel_rays() {
        assert_eq!(length([5.0, 0.0, 0.0], [5.0, 50.0, 0.0]), 0.0);
        assert!((length([15.0, 0.0, 0.0], [15.0, 50.0, 0.0]) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn other_axes() {
        let slab = SemiInfiniteSlab::new(Axis::Z, -5.0, 5.0).unwrap();
        let ray = FiniteRay::from_slices(&[0.0, 0.0, -20.0], &[0.0, 3.0, 20.0]).unwrap();
        let expected = ray.length() * 10.0 / 40.0;
        assert!((slab.crossing_length(&ray).unwrap() - expected).abs() < 1e-9);
        assert!(slab.contains(&Point3::new(100.0, -100.0, 0.0)));
    }

    #[test]
    fn bounds_in_either_order() {
        let slab = SemiInfiniteSlab::new(Axis::Y, 3.0, 1.0).unwrap();
        assert_eq!(slab.bounds(), (1.0, 3.0));
        assert!(SemiInfiniteSlab::new(Axis::Y, f64::INFINITY, 1.0).is_err());
    }
}

/// The region between two planes perpendicular to a coordinate axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SemiInfiniteSlab {
    axis: Axis,
    lower: f64,
    upper: f64,
}

impl SemiInfiniteSlab {
    /// Creates a slab between `start` and `end` along `axis`.
    pub fn new(axis: Axis, start: f64, end: f64) -> Result<Self> {
        ensure_finite(start, "slab start")?;
        ensure_finite(end, "slab end")?;
        Ok(Self {
            axis,
            lower: start.min(end),
            upper: start.max(end),
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

impl Crossing for SemiInfiniteSlab {
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        let length = ray.length();
        let normal = self.axis.unit();
        let mut plane = Point3::origin();

        plane[self.axis.index()] = self.lower;
        let near = line_plane_collision(&normal, &plane, &ray.origin(), &ray.direction());
        plane[self.axis.index()] = self.upper;
        let far = line_plane_collision(&normal, &plane, &ray.origin(), &ray.direction());

        let (Some(a), Some(b)) = (near, far) else {
            // parallel to the faces: either wholly inside or wholly outside
            return Ok(if self.contains(&ray.start()) { length } else { 0.0 });
        };
        let (t0, t1) = (a.min(b), a.max(b));

        if t1 < 0.0 || t0 > length {
            Ok(0.0)
        } else if t0 <= 0.0 && t1 >= length {
            Ok(length)
        } else if t0 <= 0.0 {
            Ok(t1)
        } else if t1 >= length {
            Ok(length - t0)
        } else {
            Ok(t1 - t0)
        }
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        let v = point[self.axis.index()];
        v >= self.lower && v <= self.upper
    }
}
