use nalgebra::Point3;

use super::{on_segment, quadratic_roots, resolve_convex, Crossing};
use crate::error::{ensure_finite, Result, ShieldingError};
use crate::ray::FiniteRay;


/// A solid sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Point3<f64>,
    radius: f64,
}

impl Sphere {
    pub fn new(center: Point3<f64>, radius: f64) -> Result<Self> {
        for c in center.iter() {
            ensure_finite(*c, "sphere center")?;
        }
        ensure_finite(radius, "sphere radius")?;
        if radius < 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "sphere radius must be non-negative, got {}",
                radius
            )));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn volume(&self) -> f64 {
        4.0 / 3.0 * std::f64::consts::PI * self.radius.powi(3)
    }
}

impl Crossing for Sphere {
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        if ray.length() == 0.0 {
            return Ok(0.0);
        }
        let oc = ray.origin() - self.center;
        let d = ray.direction();
        let a = d.dot(&d);
        let b = 2.0 * d.dot(&oc);
        let c = oc.dot(&oc) - self.radius * self.radius;
        let Some((t0, t1)) = quadratic_roots(a, b, c) else {
            return Ok(0.0);
        };
        let hits = [t0, t1]
            .into_iter()
            .filter(|t| on_segment(ray, *t))
            .collect();
        resolve_convex("sphere", self, ray, hits)
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }
}

/// A hollow sphere of uniform wall thickness.
#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    inner: Sphere,
    outer: Sphere,
}

impl Shell {
    /// A shell whose hollow has radius `inner_radius` and whose wall is
    /// `thickness` thick.
    pub fn new(center: Point3<f64>, inner_radius: f64, thickness: f64) -> Result<Self> {
        ensure_finite(thickness, "shell thickness")?;
        if thickness <= 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "shell thickness must be positive, got {}",
                thickness
            )));
        }
        let inner = Sphere::new(center, inner_radius)?;
        let outer = Sphere::new(center, inner_radius + thickness)?;
        Ok(Self { inner, outer })
    }

    pub fn inner(&self) -> &Sphere {
        &self.inner
    }

    pub fn outer(&self) -> &Sphere {
        &self.outer
    }

    pub fn thickness(&self) -> f64 {
        self.outer.radius - self.inner.radius
    }
}

impl Crossing for Shell {
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        let outer = self.outer.crossing_length(ray)?;
        let inner = self.inner.crossing_length(ray)?;
        Ok((outer - inner).max(0.0))
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        self.outer.contains(point) && !self.inner.contains(point)
    }
}
