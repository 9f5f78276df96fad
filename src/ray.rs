//! Finite-length rays between a source point and a detector.
//!
//! A [`FiniteRay`] caches everything the shape intersection routines need so
//! that no shape repeats the same division for every query:
//! - the unit direction and the segment length
//! - the component-wise inverse direction (may be infinite)
//! - the per-axis sign bits used by the slab method

use nalgebra::{Point3, Vector3};

use crate::error::{ensure_finite, Result, ShieldingError};


/// A line segment from `start` to `end` with cached helper quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteRay {
    start: Point3<f64>,
    end: Point3<f64>,
    direction: Vector3<f64>,
    inv_direction: Vector3<f64>,
    length: f64,
    sign: [usize; 3],
}

impl FiniteRay {
    /// Creates a ray between two points. Fails if any component is not finite.
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Result<Self> {
        let mut ray = Self {
            start: check_point(start, "ray start")?,
            end: check_point(end, "ray end")?,
            direction: Vector3::zeros(),
            inv_direction: Vector3::zeros(),
            length: 0.0,
            sign: [0; 3],
        };
        ray.update();
        Ok(ray)
    }

    /// Creates a ray from two coordinate slices, each of which must hold
    /// exactly three values.
    pub fn from_slices(start: &[f64], end: &[f64]) -> Result<Self> {
        Self::new(point_from_slice(start)?, point_from_slice(end)?)
    }

    pub fn set_start(&mut self, start: Point3<f64>) -> Result<()> {
        self.start = check_point(start, "ray start")?;
        self.update();
        Ok(())
    }

    pub fn set_end(&mut self, end: Point3<f64>) -> Result<()> {
        self.end = check_point(end, "ray end")?;
        self.update();
        Ok(())
    }

    /// Recomputes the derived fields after an endpoint changes.
    fn update(&mut self) {
        let v = self.end - self.start;
        self.length = v.norm();
        self.direction = if self.length > 0.0 {
            v / self.length
        } else {
            Vector3::zeros()
        };
        self.inv_direction = self.direction.map(|d| 1.0 / d);
        for i in 0..3 {
            self.sign[i] = (self.inv_direction[i] < 0.0) as usize;
        }
    }

    /// The ray origin, identical to its start point.
    pub fn origin(&self) -> Point3<f64> {
        self.start
    }

    pub fn start(&self) -> Point3<f64> {
        self.start
    }

    pub fn end(&self) -> Point3<f64> {
        self.end
    }

    /// Unit direction, or the zero vector for a zero-length ray.
    pub fn direction(&self) -> Vector3<f64> {
        self.direction
    }

    pub fn inv_direction(&self) -> Vector3<f64> {
        self.inv_direction
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Index of the near bound of an axis-aligned interval on each axis.
    pub fn sign(&self) -> [usize; 3] {
        self.sign
    }

    /// The point at parametric distance `t` from the origin.
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.start + self.direction * t
    }
}

fn check_point(p: Point3<f64>, what: &str) -> Result<Point3<f64>> {
    for c in p.iter() {
        ensure_finite(*c, what)?;
    }
    Ok(p)
}

/// Converts a coordinate slice into a point, requiring exactly three values.
pub fn point_from_slice(values: &[f64]) -> Result<Point3<f64>> {
    match values {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(ShieldingError::InvalidArgument(format!(
            "expected a 3-component vector, got {} components",
            values.len()
        ))),
    }
}
