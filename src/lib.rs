//! Point-kernel gamma-ray shielding.
//!
//! Computes the exposure rate at a detector from a gamma source behind one or
//! more shields. Source volumes are discretized into weighted points, a ray is
//! traced from every point to the detector, and each shield reports how far
//! the ray travels inside it. Crossing lengths become mean free paths through
//! tabulated attenuation data, and geometric-progression buildup factors
//! account for scattered photons. The bundled library has no buildup tables;
//! load one that does with [`Library::from_file`] to apply buildup.
//!
//! ```no_run
//! use nalgebra::Point3;
//! use pointkernel::{Axis, Detector, Library, Model, SemiInfiniteSlab, Shield, Source};
//!
//! # fn main() -> pointkernel::Result<()> {
//! let library = Library::bundled()?;
//! let mut source = Source::point(Point3::origin());
//! source.add_isotope_curies(&library, "Co-60", 1.0)?;
//!
//! let mut model = Model::new(&library)?;
//! model.set_source(source);
//! model.add_shield(Shield::new(
//!     library.material("iron")?,
//!     SemiInfiniteSlab::new(Axis::X, 10.0, 20.0)?,
//! ));
//! model.set_detector(Detector::new(100.0, 0.0, 0.0)?);
//! println!("{} mR/hr", model.calculate_exposure()?);
//! # Ok(())
//! # }
//! ```

pub mod detector;
pub mod error;
pub mod interp;
pub mod isotope;
pub mod library;
pub mod material;
pub mod model;
pub mod output;
pub mod quadrature;
pub mod ray;
pub mod settings;
pub mod shield;
pub mod source;

pub use detector::Detector;
pub use error::{Result, ShieldingError};
pub use isotope::Isotope;
pub use library::Library;
pub use material::{BuildupFormula, Material};
pub use model::{EnergyContribution, ExposureReport, Model};
pub use ray::FiniteRay;
pub use shield::{
    Axis, CappedCylinder, Crossing, Cuboid, Geometry, InfiniteAnnulus, SemiInfiniteSlab, Shell,
    Shield, Sphere,
};
pub use source::{GroupOption, Source};
