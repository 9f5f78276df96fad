use nalgebra::{Point3, Vector3};

use super::{merge_coincident, on_segment, perpendicular, quadratic_roots, Axis, Crossing};
use crate::error::{ensure_finite, Result, ShieldingError};
use crate::ray::FiniteRay;


/// The wall between two coaxial infinite cylinders.
#[derive(Debug, Clone, PartialEq)]
pub struct InfiniteAnnulus {
    origin: Point3<f64>,
    axis: Vector3<f64>,
    inner_radius: f64,
    outer_radius: f64,
}

impl InfiniteAnnulus {
    /// An annulus about the line through `origin` along `axis`. The axis is
    /// normalized.
    pub fn new(
        origin: Point3<f64>,
        axis: Vector3<f64>,
        inner_radius: f64,
        outer_radius: f64,
    ) -> Result<Self> {
        for c in origin.iter().chain(axis.iter()) {
            ensure_finite(*c, "annulus origin and axis")?;
        }
        ensure_finite(inner_radius, "inner radius")?;
        ensure_finite(outer_radius, "outer radius")?;
        if axis.norm() == 0.0 {
            return Err(ShieldingError::InvalidArgument(
                "annulus axis must be non-zero".into(),
            ));
        }
        if inner_radius < 0.0 || outer_radius <= inner_radius {
            return Err(ShieldingError::InvalidArgument(format!(
                "annulus radii must satisfy 0 <= inner < outer, got {} and {}",
                inner_radius, outer_radius
            )));
        }
        Ok(Self {
            origin,
            axis: axis.normalize(),
            inner_radius,
            outer_radius,
        })
    }

    pub fn aligned(axis: Axis, origin: Point3<f64>, inner_radius: f64, outer_radius: f64) -> Result<Self> {
        Self::new(origin, axis.unit(), inner_radius, outer_radius)
    }

    pub fn axis(&self) -> Vector3<f64> {
        self.axis
    }

    pub fn radii(&self) -> (f64, f64) {
        (self.inner_radius, self.outer_radius)
    }
}

impl Crossing for InfiniteAnnulus {
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        if ray.length() == 0.0 {
            return Ok(0.0);
        }
        let part1 = perpendicular(&ray.direction(), &self.axis);
        let part2 = perpendicular(&(ray.origin() - self.origin), &self.axis);
        let a = part1.dot(&part1);
        let b = 2.0 * part1.dot(&part2);

        let mut hits = Vec::with_capacity(6);
        for radius in [self.inner_radius, self.outer_radius] {
            let c = part2.dot(&part2) - radius * radius;
            if let Some((t0, t1)) = quadratic_roots(a, b, c) {
                hits.extend([t0, t1].into_iter().filter(|t| on_segment(ray, *t)));
            }
        }

        // The wall hits split the ray into pieces that lie wholly inside or
        // wholly outside the wall.
        hits.push(0.0);
        hits.push(ray.length());
        merge_coincident(ray, &mut hits);
        Ok(hits
            .windows(2)
            .filter(|w| self.contains(&ray.at(0.5 * (w[0] + w[1]))))
            .map(|w| w[1] - w[0])
            .sum())
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        let r2 = perpendicular(&(point - self.origin), &self.axis).norm_squared();
        r2 >= self.inner_radius * self.inner_radius && r2 <= self.outer_radius * self.outer_radius
    }
}
