use nalgebra::Point3;

use crate::error::{ensure_finite, Result};


/// A point at which exposure is calculated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detector {
    location: Point3<f64>,
}

impl Detector {
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self> {
        Ok(Self {
            location: Point3::new(
                ensure_finite(x, "detector x")?,
                ensure_finite(y, "detector y")?,
                ensure_finite(z, "detector z")?,
            ),
        })
    }

    pub fn location(&self) -> Point3<f64> {
        self.location
    }
}
