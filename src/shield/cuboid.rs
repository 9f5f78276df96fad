use nalgebra::{Point3, Vector3};

use super::{on_segment, resolve_convex, Crossing};
use crate::error::{ensure_finite, Result, ShieldingError};
use crate::ray::FiniteRay;


/// An axis-aligned rectangular box.
#[derive(Debug, Clone, PartialEq)]
pub struct Cuboid {
    center: Point3<f64>,
    dimensions: Vector3<f64>,
    /// Minimum and maximum corners.
    bounds: [Point3<f64>; 2],
}

impl Cuboid {
    /// A box centred on `center` with full edge lengths `dimensions`.
    pub fn new(center: Point3<f64>, dimensions: Vector3<f64>) -> Result<Self> {
        for c in center.iter().chain(dimensions.iter()) {
            ensure_finite(*c, "box center and dimensions")?;
        }
        if dimensions.iter().any(|d| *d < 0.0) {
            return Err(ShieldingError::InvalidArgument(format!(
                "box dimensions must be non-negative, got {:?}",
                dimensions.as_slice()
            )));
        }
        let half = dimensions / 2.0;
        Ok(Self {
            center,
            dimensions,
            bounds: [center - half, center + half],
        })
    }

    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn dimensions(&self) -> Vector3<f64> {
        self.dimensions
    }

    pub fn min_corner(&self) -> Point3<f64> {
        self.bounds[0]
    }

    pub fn volume(&self) -> f64 {
        self.dimensions.product()
    }

    /// Entry and exit parameters of the infinite line through `ray`, or
    /// `None` if the line misses the box.
    fn slab_intersections(&self, ray: &FiniteRay) -> Option<(f64, f64)> {
        let o = ray.origin();
        let inv = ray.inv_direction();
        let sign = ray.sign();
        let b = &self.bounds;

        let mut tmin = (b[sign[0]].x - o.x) * inv.x;
        let mut tmax = (b[1 - sign[0]].x - o.x) * inv.x;
        let tymin = (b[sign[1]].y - o.y) * inv.y;
        let tymax = (b[1 - sign[1]].y - o.y) * inv.y;
        if tmin > tymax || tymin > tmax {
            return None;
        }
        if tymin > tmin {
            tmin = tymin;
        }
        if tymax < tmax {
            tmax = tymax;
        }

        let tzmin = (b[sign[2]].z - o.z) * inv.z;
        let tzmax = (b[1 - sign[2]].z - o.z) * inv.z;
        if tmin > tzmax || tzmin > tmax {
            return None;
        }
        if tzmin > tmin {
            tmin = tzmin;
        }
        if tzmax < tmax {
            tmax = tzmax;
        }
        Some((tmin, tmax))
    }
}

impl Crossing for Cuboid {
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        if ray.length() == 0.0 {
            return Ok(0.0);
        }
        let Some((tmin, tmax)) = self.slab_intersections(ray) else {
            return Ok(0.0);
        };
        let hits = [tmin, tmax]
            .into_iter()
            .filter(|t| on_segment(ray, *t))
            .collect();
        resolve_convex("box", self, ray, hits)
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.bounds[0][i] && point[i] <= self.bounds[1][i])
    }
}
