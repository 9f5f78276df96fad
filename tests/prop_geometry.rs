//! Property-based tests for ray crossing lengths.
//!
//! Covers: crossing lengths bounded by the ray, independence from ray
//! direction, fully contained rays, slab projections.

use nalgebra::{Point3, Vector3};
use pointkernel::{Axis, CappedCylinder, Crossing, Cuboid, FiniteRay, Geometry, SemiInfiniteSlab, Sphere};
use proptest::prelude::*;

fn bodies() -> Vec<Geometry> {
    vec![
        Sphere::new(Point3::new(1.0, -2.0, 0.5), 10.0).unwrap().into(),
        Cuboid::new(Point3::new(0.0, 3.0, -1.0), Vector3::new(20.0, 12.0, 8.0))
            .unwrap()
            .into(),
        CappedCylinder::aligned(Axis::Z, Point3::origin(), 20.0, 6.0).unwrap().into(),
        CappedCylinder::new(Point3::new(-8.0, -8.0, -8.0), Point3::new(8.0, 6.0, 4.0), 5.0)
            .unwrap()
            .into(),
        SemiInfiniteSlab::new(Axis::X, 5.0, 15.0).unwrap().into(),
    ]
}

fn point(range: f64) -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-range..range)
}

// ── Bounds ───────────────────────────────────────────────────────────

proptest! {
    /// A ray never travels further inside a body than its own length.
    #[test]
    fn crossing_is_within_the_ray(a in point(30.0), b in point(30.0)) {
        let ray = FiniteRay::from_slices(&a, &b).unwrap();
        for body in bodies() {
            let length = body.crossing_length(&ray).unwrap();
            prop_assert!(length >= 0.0, "{}: {}", body.kind(), length);
            prop_assert!(length <= ray.length() * (1.0 + 1e-12), "{}: {} > {}", body.kind(), length, ray.length());
        }
    }

    /// Swapping the ends of a ray leaves the crossing length unchanged.
    #[test]
    fn crossing_is_symmetric(a in point(30.0), b in point(30.0)) {
        let forward = FiniteRay::from_slices(&a, &b).unwrap();
        let backward = FiniteRay::from_slices(&b, &a).unwrap();
        for body in bodies() {
            let there = body.crossing_length(&forward).unwrap();
            let back = body.crossing_length(&backward).unwrap();
            prop_assert!((there - back).abs() <= 1e-9 * forward.length().max(1.0), "{}: {} vs {}", body.kind(), there, back);
        }
    }
}

// ── Contained rays ───────────────────────────────────────────────────

proptest! {
    /// A ray between two points inside a sphere lies wholly inside it.
    #[test]
    fn rays_inside_a_sphere(a in point(5.0), b in point(5.0)) {
        let sphere = Sphere::new(Point3::origin(), 10.0).unwrap();
        let ray = FiniteRay::from_slices(&a, &b).unwrap();
        prop_assert!((sphere.crossing_length(&ray).unwrap() - ray.length()).abs() < 1e-9);
    }

    /// A ray between two points inside a box lies wholly inside it.
    #[test]
    fn rays_inside_a_box(a in point(3.9), b in point(3.9)) {
        let cuboid = Cuboid::new(Point3::origin(), Vector3::new(8.0, 8.0, 8.0)).unwrap();
        let ray = FiniteRay::from_slices(&a, &b).unwrap();
        prop_assert!((cuboid.crossing_length(&ray).unwrap() - ray.length()).abs() < 1e-9);
    }
}

// ── Slabs ────────────────────────────────────────────────────────────

proptest! {
    /// The crossing through a slab is the share of the ray's projection on
    /// the slab axis that overlaps the slab.
    #[test]
    fn slab_crossing_follows_the_projection(a in point(30.0), b in point(30.0)) {
        prop_assume!((b[0] - a[0]).abs() > 1e-3);
        let slab = SemiInfiniteSlab::new(Axis::X, 5.0, 15.0).unwrap();
        let ray = FiniteRay::from_slices(&a, &b).unwrap();

        let (lo, hi) = (a[0].min(b[0]), a[0].max(b[0]));
        let overlap = (hi.min(15.0) - lo.max(5.0)).max(0.0);
        let expected = ray.length() * overlap / (hi - lo);
        prop_assert!((slab.crossing_length(&ray).unwrap() - expected).abs() < 1e-9 * ray.length().max(1.0));
    }
}
