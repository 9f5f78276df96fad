//! The point-kernel exposure integrator.
//!
//! A [`Model`] ties a [`Source`], its shields, an optional filler material and
//! an optional buildup material to a [`Detector`]. For every source point it
//! traces a ray to the detector, and for every photon energy it sums the
//! attenuated, buildup-corrected flux over the points before converting the
//! flux to an exposure rate in mR/hr.

use std::f64::consts::PI;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use nalgebra::Point3;
use ndarray::Array1;
use rayon::prelude::*;
use serde::Serialize;

use crate::detector::Detector;
use crate::error::{Result, ShieldingError};
use crate::library::Library;
use crate::material::{BuildupFormula, Material};
use crate::quadrature::WeightedPoints;
use crate::ray::FiniteRay;
use crate::shield::Shield;
use crate::source::Source;


/// Converts `MeV·cm²/g` of energy flux absorbed in air to roentgen.
pub const CONVERSION_FACTOR: f64 = 1.835e-8;
/// Roentgen per second to milliroentgen per hour.
const MR_PER_HR: f64 = 1000.0 * 3600.0;

/// Exposure rate contribution of a single photon energy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyContribution {
    /// Photon energy in MeV.
    pub energy: f64,
    /// Photons per second.
    pub emission_rate: f64,
    /// Flux at the detector without buildup, photons/cm²/s.
    pub uncollided_flux: f64,
    /// Flux at the detector including buildup, photons/cm²/s.
    pub total_flux: f64,
    /// Exposure rate in mR/hr.
    pub exposure: f64,
}

/// Per-energy breakdown of a calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureReport {
    pub rows: Vec<EnergyContribution>,
    /// Exposure rate in mR/hr.
    pub total_exposure: f64,
}

/// Path from one source point to the detector.
#[derive(Debug)]
struct RayPath {
    length: f64,
    /// Crossing length through each shield, in shield order.
    crossings: Vec<f64>,
    /// Distance not inside any shield.
    gap: f64,
}

impl RayPath {
    /// Mean free paths along the path given the macroscopic cross section of
    /// each shield and of the filler.
    fn mfp(&self, xsecs: &[f64], filler_xsec: Option<f64>) -> f64 {
        let shields: f64 = self.crossings.iter().zip(xsecs).map(|(l, x)| l * x).sum();
        shields + filler_xsec.map_or(0.0, |x| x * self.gap)
    }
}

/// A point-kernel shielding model.
#[derive(Debug, Clone)]
pub struct Model {
    source: Option<Source>,
    /// Index of the source's own shield in `shields`.
    source_shield: Option<usize>,
    shields: Vec<Shield>,
    filler: Option<Material>,
    buildup: Option<Material>,
    formula: BuildupFormula,
    detector: Option<Detector>,
    air: Material,
    progress: bool,
}

impl Model {
    /// An empty model. The library must provide `air` with absorption data
    /// for the flux to exposure conversion.
    pub fn new(library: &Library) -> Result<Self> {
        Ok(Self {
            source: None,
            source_shield: None,
            shields: Vec::new(),
            filler: None,
            buildup: None,
            formula: BuildupFormula::default(),
            detector: None,
            air: library.material("air")?,
            progress: false,
        })
    }

    /// Sets the source, replacing any previous one. A volume source is also
    /// registered as a shield.
    pub fn set_source(&mut self, source: Source) {
        if let Some(index) = self.source_shield.take() {
            self.shields.remove(index);
        }
        if let Some(shield) = source.shield() {
            self.source_shield = Some(self.shields.len());
            self.shields.push(shield);
        }
        self.source = Some(source);
    }

    pub fn add_shield(&mut self, shield: Shield) {
        self.shields.push(shield);
    }

    /// Material filling the space not occupied by shields.
    pub fn set_filler_material(&mut self, material: Material) {
        self.filler = Some(material);
    }

    /// Material whose buildup factors are applied to the total path.
    pub fn set_buildup_factor_material(&mut self, material: Material) {
        self.buildup = Some(material);
    }

    pub fn set_buildup_formula(&mut self, formula: BuildupFormula) {
        self.formula = formula;
    }

    pub fn set_detector(&mut self, detector: Detector) {
        self.detector = Some(detector);
    }

    /// Show a progress bar over photon energies while calculating.
    pub fn set_progress(&mut self, progress: bool) {
        self.progress = progress;
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    /// All shields in evaluation order, including the source's own.
    pub fn shields(&self) -> &[Shield] {
        &self.shields
    }

    pub fn filler_material(&self) -> Option<&Material> {
        self.filler.as_ref()
    }

    pub fn buildup_factor_material(&self) -> Option<&Material> {
        self.buildup.as_ref()
    }

    pub fn detector(&self) -> Option<&Detector> {
        self.detector.as_ref()
    }

    /// Exposure rate at the detector in mR/hr.
    pub fn calculate_exposure(&self) -> Result<f64> {
        Ok(self.calculate_exposure_detail()?.total_exposure)
    }

    /// Exposure rate at the detector with a per-energy breakdown.
    ///
    /// **Context**: Crossing lengths depend only on geometry, so they are
    /// traced once per source point. Each photon energy then only needs the
    /// macroscopic cross sections of the shields to turn lengths into mean
    /// free paths.
    ///
    /// **How it Works**: The crossing length matrix is built in parallel over
    /// source points. For each energy, the mfp of every path and its buildup
    /// factor are evaluated, the weighted flux is reduced over the points in
    /// parallel, and the total flux is converted to exposure with the air
    /// energy-absorption coefficient.
    pub fn calculate_exposure_detail(&self) -> Result<ExposureReport> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ShieldingError::InvalidArgument("model has no source".into()))?;
        let detector = self
            .detector
            .as_ref()
            .ok_or_else(|| ShieldingError::InvalidArgument("model has no detector".into()))?;

        let spectrum = source.photon_source_list();
        let points = source.weighted_points();
        info!(
            "calculating exposure: {} photon energies, {} source points, {} shields",
            spectrum.len(),
            points.len(),
            self.shields.len()
        );
        if spectrum.is_empty() {
            warn!("source emits no photons");
        }

        let paths = self.trace_paths(&points, detector.location())?;

        let pb = self.progress_bar(spectrum.len());
        let mut rows = Vec::with_capacity(spectrum.len());
        for (energy, rate) in &spectrum {
            rows.push(self.energy_contribution(*energy, *rate, &paths, &points.weights)?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        let total_exposure = rows.iter().map(|row| row.exposure).sum();
        info!("total exposure: {:.6e} mR/hr", total_exposure);
        Ok(ExposureReport {
            rows,
            total_exposure,
        })
    }

    fn trace_paths(&self, points: &WeightedPoints, detector: Point3<f64>) -> Result<Vec<RayPath>> {
        points
            .points
            .par_iter()
            .map(|point| {
                let ray = FiniteRay::new(*point, detector)?;
                if ray.length() == 0.0 {
                    return Err(ShieldingError::InvalidArgument(format!(
                        "source point {:?} coincides with the detector",
                        point.coords.as_slice()
                    )));
                }
                let crossings = self
                    .shields
                    .iter()
                    .enumerate()
                    .map(|(index, shield)| {
                        shield
                            .crossing_length(&ray)
                            .map_err(|e| shield_failure(index, shield, e))
                    })
                    .collect::<Result<Vec<f64>>>()?;
                let gap = (ray.length() - crossings.iter().sum::<f64>()).max(0.0);
                Ok(RayPath {
                    length: ray.length(),
                    crossings,
                    gap,
                })
            })
            .collect()
    }

    fn energy_contribution(
        &self,
        energy: f64,
        rate: f64,
        paths: &[RayPath],
        weights: &[f64],
    ) -> Result<EnergyContribution> {
        let xsecs = self
            .shields
            .iter()
            .enumerate()
            .map(|(index, shield)| {
                shield
                    .material()
                    .mfp(energy, 1.0)
                    .map_err(|e| shield_failure(index, shield, e))
            })
            .collect::<Result<Vec<f64>>>()?;
        let filler_xsec = self
            .filler
            .as_ref()
            .map(|filler| filler.mfp(energy, 1.0))
            .transpose()?;

        let mfps: Array1<f64> = paths
            .par_iter()
            .map(|path| path.mfp(&xsecs, filler_xsec))
            .collect::<Vec<f64>>()
            .into();
        let buildup = match &self.buildup {
            Some(material) => material.buildup_factors(energy, &mfps, self.formula)?,
            None => Array1::ones(mfps.len()),
        };

        let (uncollided_flux, total_flux) = (0..paths.len())
            .into_par_iter()
            .map(|i| {
                let length = paths[i].length;
                let uncollided = rate * weights[i] * (-mfps[i]).exp() / (4.0 * PI * length * length);
                (uncollided, uncollided * buildup[i])
            })
            .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));

        let absorption = self.air.mass_energy_absorption(energy)?;
        let exposure = total_flux * energy * CONVERSION_FACTOR * absorption * MR_PER_HR;
        debug!(
            "E = {} MeV: uncollided {:.6e}, total {:.6e}, exposure {:.6e} mR/hr",
            energy, uncollided_flux, total_flux, exposure
        );
        Ok(EnergyContribution {
            energy,
            emission_rate: rate,
            uncollided_flux,
            total_flux,
            exposure,
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
        ) {
            pb.set_style(style.progress_chars("█▇▆▅▄▃▂▁"));
        }
        pb.set_message("photon energies".to_string());
        pb
    }
}

fn shield_failure(index: usize, shield: &Shield, source: ShieldingError) -> ShieldingError {
    ShieldingError::ShieldFailure {
        index,
        label: shield.label(),
        source: Box::new(source),
    }
}
