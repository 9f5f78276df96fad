//! Solid shielding bodies and ray crossing lengths.
//!
//! Each geometry implements [`Crossing`], which reports how far a
//! [`FiniteRay`] travels inside the body. A [`Shield`] pairs one geometry with
//! one [`Material`] and turns crossing lengths into mean free paths.
//!
//! All shapes share the same treatment of rays that start or end inside the
//! body: the endpoint counts as a crossing point, so a ray fully inside a body
//! crosses its whole length. A shape that still ends up with an impossible
//! number of crossing points reports [`ShieldingError::InconsistentGeometry`].

pub mod annulus;
pub mod cuboid;
pub mod cylinder;
pub mod slab;
pub mod sphere;

pub use annulus::InfiniteAnnulus;
pub use cuboid::Cuboid;
pub use cylinder::CappedCylinder;
pub use slab::SemiInfiniteSlab;
pub use sphere::{Shell, Sphere};

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShieldingError};
use crate::material::Material;
use crate::ray::FiniteRay;


/// Rays whose direction has a smaller projection than this on a plane normal
/// are treated as parallel to the plane.
pub const PARALLEL_EPSILON: f64 = 1e-6;

/// Coordinate axes for axis-aligned bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(&self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

/// Ray/body intersection capability shared by every geometry.
pub trait Crossing {
    /// Distance travelled inside the body, in `[0, ray.length()]`.
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64>;

    /// Whether `point` lies inside the body or on its surface.
    fn contains(&self, point: &Point3<f64>) -> bool;
}

/// Parametric distance along `direction` from `origin` to the plane through
/// `point` with normal `normal`, or `None` if the line is parallel to it.
pub fn line_plane_collision(
    normal: &Vector3<f64>,
    point: &Point3<f64>,
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
) -> Option<f64> {
    let ndotu = normal.dot(direction);
    if ndotu.abs() < PARALLEL_EPSILON {
        return None;
    }
    Some((point - origin).dot(normal) / ndotu)
}

/// Whether `t` lies on the ray segment.
pub(crate) fn on_segment(ray: &FiniteRay, t: f64) -> bool {
    t >= 0.0 && t <= ray.length()
}

/// Roots of `a t² + b t + c` for a strictly positive discriminant.
pub(crate) fn quadratic_roots(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if a == 0.0 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc <= 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    Some(((-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)))
}

/// Component of `v` perpendicular to the unit vector `axis`.
pub(crate) fn perpendicular(v: &Vector3<f64>, axis: &Vector3<f64>) -> Vector3<f64> {
    v - axis * v.dot(axis)
}

/// Hits closer than this fraction of the ray length (or of 1 cm for short
/// rays) are the same surface point.
pub const COINCIDENT_EPSILON: f64 = 1e-9;

/// Sorts `hits` and merges parameters that name the same point, such as a
/// surface hit at a ray endpoint that was also added as a contained endpoint.
pub(crate) fn merge_coincident(ray: &FiniteRay, hits: &mut Vec<f64>) {
    let tolerance = COINCIDENT_EPSILON * ray.length().max(1.0);
    hits.sort_by(|a, b| a.total_cmp(b));
    hits.dedup_by(|a, b| (*a - *b).abs() <= tolerance);
}

/// Turns the surface hits of a convex body into a crossing length.
///
/// If the hits do not already form an entry/exit pair, ray endpoints inside
/// the body are added. Coincident points are merged. Zero points is a miss
/// and a single point only touches the surface. Anything other than two
/// points after that is an error.
pub(crate) fn resolve_convex<B: Crossing + ?Sized>(
    shape: &'static str,
    body: &B,
    ray: &FiniteRay,
    mut hits: Vec<f64>,
) -> Result<f64> {
    if hits.len() != 2 {
        if body.contains(&ray.start()) {
            hits.push(0.0);
        }
        if body.contains(&ray.end()) {
            hits.push(ray.length());
        }
    }
    merge_coincident(ray, &mut hits);
    match hits.as_slice() {
        [] | [_] => Ok(0.0),
        [t0, t1] => Ok(t1 - t0),
        _ => Err(ShieldingError::InconsistentGeometry {
            shape,
            points: hits.len(),
        }),
    }
}

/// The geometries a shield can take.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Slab(SemiInfiniteSlab),
    Sphere(Sphere),
    Shell(Shell),
    Box(Cuboid),
    Annulus(InfiniteAnnulus),
    Cylinder(CappedCylinder),
}

impl Geometry {
    /// Short name of the geometry kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Slab(_) => "semi-infinite slab",
            Geometry::Sphere(_) => "sphere",
            Geometry::Shell(_) => "shell",
            Geometry::Box(_) => "box",
            Geometry::Annulus(_) => "infinite annulus",
            Geometry::Cylinder(_) => "capped cylinder",
        }
    }

    fn as_crossing(&self) -> &dyn Crossing {
        match self {
            Geometry::Slab(g) => g,
            Geometry::Sphere(g) => g,
            Geometry::Shell(g) => g,
            Geometry::Box(g) => g,
            Geometry::Annulus(g) => g,
            Geometry::Cylinder(g) => g,
        }
    }
}

impl Crossing for Geometry {
    fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        self.as_crossing().crossing_length(ray)
    }

    fn contains(&self, point: &Point3<f64>) -> bool {
        self.as_crossing().contains(point)
    }
}

macro_rules! geometry_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for Geometry {
            fn from(g: $ty) -> Self {
                Geometry::$variant(g)
            }
        })*
    };
}

geometry_from!(
    Slab => SemiInfiniteSlab,
    Sphere => Sphere,
    Shell => Shell,
    Box => Cuboid,
    Annulus => InfiniteAnnulus,
    Cylinder => CappedCylinder,
);

/// A body of a given material.
#[derive(Debug, Clone)]
pub struct Shield {
    label: Option<String>,
    material: Material,
    geometry: Geometry,
}

impl Shield {
    pub fn new(material: Material, geometry: impl Into<Geometry>) -> Self {
        Self {
            label: None,
            material,
            geometry: geometry.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The user label, or the geometry kind and material name.
    pub fn label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{} ({})", self.geometry.kind(), self.material.name()),
        }
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn crossing_length(&self, ray: &FiniteRay) -> Result<f64> {
        self.geometry.crossing_length(ray)
    }

    /// Mean free paths along the part of `ray` inside this shield.
    pub fn crossing_mfp(&self, ray: &FiniteRay, energy: f64) -> Result<f64> {
        self.material.mfp(energy, self.crossing_length(ray)?)
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        self.geometry.contains(point)
    }
}
