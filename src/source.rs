//! Photon sources: what they emit and where.
//!
//! A [`Source`] aggregates isotopes and individual photon lines into a list of
//! `(energy, emission rate)` pairs and discretizes its body into weighted
//! points. Volume sources also act as a shield for their own photons.

use itertools::Itertools;
use log::debug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Result, ShieldingError};
use crate::isotope::Isotope;
use crate::library::Library;
use crate::material::Material;
use crate::quadrature::{box_points, cylinder_points, line_points, sphere_points, WeightedPoints};
use crate::shield::{CappedCylinder, Cuboid, Geometry, Shield, Sphere};


/// Photon energies above which a hybrid source is grouped.
pub const MAX_PHOTON_ENERGIES: usize = 30;
/// Becquerels per curie.
pub const BQ_PER_CURIE: f64 = 3.7e10;

/// How photon lines are reduced before integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOption {
    /// Always group into [`MAX_PHOTON_ENERGIES`] energy groups.
    Group,
    /// Group only when there are more than [`MAX_PHOTON_ENERGIES`] lines.
    #[default]
    Hybrid,
    /// Never group.
    Discrete,
}

/// The region a source emits from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceBody {
    Point(Point3<f64>),
    Line(Point3<f64>, Point3<f64>),
    Box(Cuboid),
    Sphere(Sphere),
    Cylinder(CappedCylinder),
}

impl SourceBody {
    /// Number of entries in the points-per-dimension setting.
    fn dimensions(&self) -> usize {
        match self {
            SourceBody::Point(_) | SourceBody::Line(..) => 1,
            _ => 3,
        }
    }

    fn default_points(&self) -> Vec<usize> {
        match self {
            SourceBody::Point(_) => vec![1],
            SourceBody::Line(..) => vec![10],
            _ => vec![10, 10, 10],
        }
    }

    fn geometry(&self) -> Option<Geometry> {
        match self {
            SourceBody::Point(_) | SourceBody::Line(..) => None,
            SourceBody::Box(g) => Some(g.clone().into()),
            SourceBody::Sphere(g) => Some(g.clone().into()),
            SourceBody::Cylinder(g) => Some(g.clone().into()),
        }
    }
}

/// An isotope with its activity and resolved key progeny.
#[derive(Debug, Clone)]
struct SourceIsotope {
    isotope: Isotope,
    becquerels: f64,
    progeny: Vec<(Isotope, f64)>,
}

/// A gamma source.
#[derive(Debug, Clone)]
pub struct Source {
    body: SourceBody,
    material: Option<Material>,
    isotopes: Vec<SourceIsotope>,
    photons: Vec<(f64, f64)>,
    grouping: GroupOption,
    include_key_progeny: bool,
    points_per_dimension: Vec<usize>,
}

impl Source {
    fn from_body(body: SourceBody, material: Option<Material>) -> Self {
        let points_per_dimension = body.default_points();
        Self {
            body,
            material,
            isotopes: Vec::new(),
            photons: Vec::new(),
            grouping: GroupOption::default(),
            include_key_progeny: false,
            points_per_dimension,
        }
    }

    pub fn point(location: Point3<f64>) -> Self {
        Self::from_body(SourceBody::Point(location), None)
    }

    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self::from_body(SourceBody::Line(start, end), None)
    }

    /// A uniform box source made of `material`.
    pub fn cuboid(material: Material, cuboid: Cuboid) -> Self {
        Self::from_body(SourceBody::Box(cuboid), Some(material))
    }

    pub fn sphere(material: Material, sphere: Sphere) -> Self {
        Self::from_body(SourceBody::Sphere(sphere), Some(material))
    }

    pub fn cylinder(material: Material, cylinder: CappedCylinder) -> Self {
        Self::from_body(SourceBody::Cylinder(cylinder), Some(material))
    }

    pub fn body(&self) -> &SourceBody {
        &self.body
    }

    pub fn material(&self) -> Option<&Material> {
        self.material.as_ref()
    }

    /// Overrides the density of the source material.
    pub fn set_material_density(&mut self, density: f64) -> Result<()> {
        match self.material.as_mut() {
            Some(material) => material.set_density(density),
            None => Err(ShieldingError::InvalidArgument(
                "point and line sources have no material".into(),
            )),
        }
    }

    /// The shield formed by the source body itself, if it has a volume.
    pub fn shield(&self) -> Option<Shield> {
        let geometry = self.body.geometry()?;
        let material = self.material.clone()?;
        let label = format!("source {} ({})", geometry.kind(), material.name());
        Some(Shield::new(material, geometry).with_label(label))
    }

    pub fn add_isotope_curies(&mut self, library: &Library, name: &str, curies: f64) -> Result<()> {
        ensure_finite(curies, "activity")?;
        self.add_isotope_bq(library, name, curies * BQ_PER_CURIE)
    }

    /// Adds an isotope by name with an activity in becquerels.
    pub fn add_isotope_bq(&mut self, library: &Library, name: &str, becquerels: f64) -> Result<()> {
        ensure_finite(becquerels, "activity")?;
        if becquerels < 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "activity of {} must be non-negative, got {}",
                name, becquerels
            )));
        }
        let isotope = library.isotope(name)?;
        let progeny = isotope
            .key_progeny()
            .iter()
            .map(|(child, ratio)| Ok((library.isotope(child)?, *ratio)))
            .collect::<Result<Vec<_>>>()?;
        self.isotopes.push(SourceIsotope {
            isotope,
            becquerels,
            progeny,
        });
        Ok(())
    }

    /// Adds a single photon line. `rate` is in photons per second.
    pub fn add_photon(&mut self, energy: f64, rate: f64) -> Result<()> {
        ensure_finite(energy, "photon energy")?;
        ensure_finite(rate, "photon emission rate")?;
        if energy <= 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "photon energy must be positive, got {}",
                energy
            )));
        }
        if rate < 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "photon emission rate must be non-negative, got {}",
                rate
            )));
        }
        self.photons.push((energy, rate));
        Ok(())
    }

    /// Isotope names and activities in Bq, in the order they were added.
    pub fn list_isotopes(&self) -> Vec<(&str, f64)> {
        self.isotopes
            .iter()
            .map(|s| (s.isotope.name(), s.becquerels))
            .collect()
    }

    /// Photons added individually, excluding isotope lines.
    pub fn list_discrete_photons(&self) -> &[(f64, f64)] {
        &self.photons
    }

    pub fn grouping(&self) -> GroupOption {
        self.grouping
    }

    pub fn set_grouping(&mut self, grouping: GroupOption) {
        self.grouping = grouping;
    }

    pub fn include_key_progeny(&self) -> bool {
        self.include_key_progeny
    }

    pub fn set_include_key_progeny(&mut self, include: bool) {
        self.include_key_progeny = include;
    }

    pub fn points_per_dimension(&self) -> &[usize] {
        &self.points_per_dimension
    }

    /// Sets the quadrature resolution: one entry for point and line sources,
    /// three for volumes. Every entry must be positive.
    pub fn set_points_per_dimension(&mut self, points: &[usize]) -> Result<()> {
        let expected = self.body.dimensions();
        if points.len() != expected {
            return Err(ShieldingError::InvalidArgument(format!(
                "expected {} points-per-dimension values, got {}",
                expected,
                points.len()
            )));
        }
        if points.contains(&0) {
            return Err(ShieldingError::InvalidArgument(
                "source points per dimension must be positive".into(),
            ));
        }
        self.points_per_dimension = points.to_vec();
        Ok(())
    }

    /// Emission lines `(energy MeV, photons/s)` summed over the whole
    /// source, sorted by energy and grouped according to the grouping option.
    pub fn photon_source_list(&self) -> Vec<(f64, f64)> {
        let mut lines = Vec::new();
        for entry in &self.isotopes {
            push_lines(&mut lines, &entry.isotope, entry.becquerels);
            if self.include_key_progeny {
                for (child, ratio) in &entry.progeny {
                    push_lines(&mut lines, child, entry.becquerels * ratio);
                }
            }
        }
        lines.extend_from_slice(&self.photons);

        let merged: Vec<(f64, f64)> = lines
            .into_iter()
            .sorted_by(|a, b| a.0.total_cmp(&b.0))
            .coalesce(|a, b| {
                if a.0 == b.0 {
                    Ok((a.0, a.1 + b.1))
                } else {
                    Err((a, b))
                }
            })
            .collect();

        let group = match self.grouping {
            GroupOption::Group => true,
            GroupOption::Hybrid => merged.len() > MAX_PHOTON_ENERGIES,
            GroupOption::Discrete => false,
        };
        if group {
            let grouped = group_photons(&merged, MAX_PHOTON_ENERGIES);
            debug!("grouped {} photon lines into {}", merged.len(), grouped.len());
            grouped
        } else {
            merged
        }
    }

    /// Quadrature points and weights for the source body.
    pub fn weighted_points(&self) -> WeightedPoints {
        let n = &self.points_per_dimension;
        match &self.body {
            SourceBody::Point(p) => WeightedPoints {
                points: vec![*p],
                weights: vec![1.0],
            },
            SourceBody::Line(start, end) => line_points(start, end, n[0]),
            SourceBody::Box(cuboid) => box_points(cuboid, [n[0], n[1], n[2]]),
            SourceBody::Sphere(sphere) => sphere_points(sphere, [n[0], n[1], n[2]]),
            SourceBody::Cylinder(cylinder) => cylinder_points(cylinder, [n[0], n[1], n[2]]),
        }
    }

    pub fn source_points(&self) -> Vec<Point3<f64>> {
        self.weighted_points().points
    }

    /// Fraction of the source carried by each point. Sums to one.
    pub fn source_point_weights(&self) -> Vec<f64> {
        self.weighted_points().weights
    }
}

fn push_lines(lines: &mut Vec<(f64, f64)>, isotope: &Isotope, becquerels: f64) {
    lines.extend(
        isotope
            .photons()
            .iter()
            .map(|(energy, intensity)| (*energy, intensity * becquerels)),
    );
}

/// Collapses sorted lines into `groups` equal-width energy groups between the
/// lowest and highest energy. Each non-empty group reports its rate-weighted
/// mean energy and total rate.
fn group_photons(lines: &[(f64, f64)], groups: usize) -> Vec<(f64, f64)> {
    let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
        return Vec::new();
    };
    let (min, max) = (first.0, last.0);
    if min == max || groups < 2 {
        return lines.to_vec();
    }
    let step = (max - min) / (groups - 1) as f64;

    // lower edge of group i is edges[i], upper edge edges[i + 1]
    let mut edges = Vec::with_capacity(groups + 1);
    edges.push(min - step / 2.0);
    edges.extend((0..groups).map(|i| min + step * i as f64 + step / 2.0));

    let mut sums = vec![(0.0, 0.0); groups];
    for (energy, rate) in lines {
        let bin = edges.partition_point(|edge| edge <= energy);
        if (1..=groups).contains(&bin) {
            let (weighted, total) = &mut sums[bin - 1];
            *weighted += energy * rate;
            *total += rate;
        }
    }
    sums.into_iter()
        .filter(|(_, total)| *total != 0.0)
        .map(|(weighted, total)| (weighted / total, total))
        .collect()
}
