use nalgebra::{Point3, Vector3};

use super::{line_plane_collision, on_segment, perpendicular, quadratic_roots, resolve_convex, Axis, Crossing};
use crate::error::{ensure_finite, Result, ShieldingError};
use crate::ray::FiniteRay;

#[cfg(test)]
mod tests {
    use super::*;

    fn cylinder() -> CappedCylinder {
        CappedCylinder::new(Point3::new(0.0, 0.0, -50.0), Point3::new(0.0, 0.0, 50.0), 10.0).unwrap()
    }

    fn length(start: [f64; 3], end: [f64; 3]) -> f64 {
        let ray = FiniteRay::from_slices(&start, &end).unwrap();
        cylinder().crossing_length(&ray).unwrap()
    }

    #[test]
    fn miss() {
        assert_eq!(length([15.0, 0.0, -60.0], [15.0, 0.0, 60.0]), 0.0);
    }

    #[test]
    fn fully_inside() {
        assert!((length([0.0, 0.0, -8.0], [0.0, 0.0, 8.0]) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn side_to_side() {
        assert!((length([-20.0, 0.0, 0.0], [20.0, 0.0, 0.0]) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn end_to_end() {
        assert!((length([0.0, 0.0, -60.0], [0.0, 0.0, 60.0]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rays_ending_on_the_surface() {
        // side
        assert!((length([0.0, 0.0, 0.0], [10.0, 0.0, 0.0]) - 10.0).abs() < 1e-9);
        assert!((length([0.0, 10.0, 0.0], [0.0, 0.0, 0.0]) - 10.0).abs() < 1e-9);
        // caps
        assert!((length([0.0, 0.0, 0.0], [0.0, 0.0, 50.0]) - 50.0).abs() < 1e-9);
        assert!((length([0.0, 0.0, -50.0], [0.0, 0.0, 0.0]) - 50.0).abs() < 1e-9);
        assert!((length([0.0, 0.0, -50.0], [0.0, 0.0, 50.0]) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn one_end_inside() {
        assert!((length([-20.0, 0.0, 0.0], [-5.0, 0.0, 0.0]) - 5.0).abs() < 1e-9);
        assert!((length([1.0, 1.0, 55.0], [1.0, 1.0, 45.0]) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn cap_to_side() {
        // enters the top cap at (5,0,50) and leaves the side at (10,0,40)
        let l = length([0.0, 0.0, 60.0], [20.0, 0.0, 20.0]);
        let expected = 125f64.sqrt();
        assert!((l - expected).abs() < 1e-9, "l: {}", l);
    }

    #[test]
    fn aligned_variants() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let cyl = CappedCylinder::aligned(axis, Point3::new(1.0, 1.0, 1.0), 100.0, 10.0).unwrap();
            let mut start = Point3::new(1.0, 1.0, 1.0);
            let mut end = start;
            start[axis.index()] -= 60.0;
            end[axis.index()] += 60.0;
            let ray = FiniteRay::new(start, end).unwrap();
            assert!((cyl.crossing_length(&ray).unwrap() - 100.0).abs() < 1e-9);
            assert!((cyl.length() - 100.0).abs() < 1e-12);
        }
    }

    #[test]
    fn containment() {
        let cyl = cylinder();
        assert!(cyl.contains(&Point3::new(10.0, 0.0, 50.0)));
        assert!(!cyl.contains(&Point3::new(0.0, 0.0, 50.1)));
        assert!(!cyl.contains(&Point3::new(7.1, 7.1, 0.0)));
    }

    #[test]
    fn degenerate_cylinders_are_rejected() {
        assert!(CappedCylinder::new(Point3::origin(), Point3::origin(), 1.0).is_err());
        assert!(CappedCylinder::new(Point3::origin(), Point3::new(0.0, 0.0, 1.0), -1.0).is_err());
    }
}

/// A finite right circular cylinder closed by two flat caps.
#[derive(Debug, Clone, PartialEq)]
pub struct CappedCylinder {
    start: Point3<f64>,
    end: Point3<f64>,
    radius: f64,
    /// Unit vector from `start` to `end`.
    axis: Vector3<f64>,
    length: f64,
}

impl CappedCylinder {
    /// A cylinder whose axis runs from the centre of one cap to the other.
    pub fn new(start: Point3<f64>, end: Point3<f64>, radius: f64) -> Result<Self> {
        for c in start.iter().chain(end.iter()) {
            ensure_finite(*c, "cylinder end points")?;
        }
        ensure_finite(radius, "cylinder radius")?;
        let v = end - start;
        let length = v.norm();
        if length == 0.0 {
            return Err(ShieldingError::InvalidArgument(
                "cylinder end points must differ".into(),
            ));
        }
        if radius < 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "cylinder radius must be non-negative, got {}",
                radius
            )));
        }
        Ok(Self {
            start,
            end,
            radius,
            axis: v / length,
            length,
        })
    }

    /// A cylinder along a coordinate axis, centred on `center`.
    pub fn aligned(axis: Axis, center: Point3<f64>, length: f64, radius: f64) -> Result<Self> {
        let half = axis.unit() * (length / 2.0);
        Self::new(center - half, center + half, radius)
    }

    pub fn start(&self) -> Point3<f64> {
        self.start
    }

    pub fn end(&self) -> Point3<f64> {
        self.end
    }

    pub fn center(&self) -> Point3<f64> {
        self.start + self.axis * (self.length / 2.0)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn axis(&self) -> Vector3<f64> {
        self.axis
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn volume(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius * self.length
    }

    /// Position of `point` along the axis, measured from `start`.
    fn axial(&self, point: &Point3<f64>) -> f64 {
        (point - self.start).dot(&self.axis)
    }

    fn radial_squared(&self, point: &Point3<f64>, from: &Point3<f64>) -> f64 {
        perpendicular(&(point - from), &self.axis).norm_squared()
    }
}

impl Crossing for CappedCylinder {
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        if ray.length() == 0.0 {
            return Ok(0.0);
        }
        let r2 = self.radius * self.radius;
        let mut hits = Vec::with_capacity(4);

        // lateral surface
        let part1 = perpendicular(&ray.direction(), &self.axis);
        let part2 = perpendicular(&(ray.origin() - self.start), &self.axis);
        let a = part1.dot(&part1);
        let b = 2.0 * part1.dot(&part2);
        let c = part2.dot(&part2) - r2;
        if let Some((t0, t1)) = quadratic_roots(a, b, c) {
            for t in [t0, t1] {
                if on_segment(ray, t) {
                    let loc = self.axial(&ray.at(t));
                    if loc >= 0.0 && loc < self.length {
                        hits.push(t);
                    }
                }
            }
        }

        // end caps
        for cap in [self.start, self.end] {
            if let Some(t) = line_plane_collision(&self.axis, &cap, &ray.origin(), &ray.direction()) {
                if on_segment(ray, t) && self.radial_squared(&ray.at(t), &cap) < r2 {
                    hits.push(t);
                }
            }
        }

        resolve_convex("capped cylinder", self, ray, hits)
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        let loc = self.axial(point);
        loc >= 0.0 && loc <= self.length && self.radial_squared(point, &self.start) <= self.radius * self.radius
    }
}
