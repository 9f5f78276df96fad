//! Shielding materials and their photon interaction data.
//!
//! A [`Material`] is a named set of tables plus a density. The tables are
//! shared behind an [`Arc`] so that every copy handed out by the
//! [`Library`](crate::library::Library) costs nothing beyond the density, which
//! is the only per-instance value.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::Array1;

use crate::error::{ensure_finite, Result, ShieldingError};
use crate::interp::{AkimaSpline, LogLogTable};


/// Offset of the hyperbolic tangent term in the GP `K(x)` function.
fn tanh_m2() -> f64 {
    (-2.0f64).tanh()
}

/// Largest mfp the GP formula is evaluated at. Larger values are clamped.
pub const GP_MAX_MFP: f64 = 80.0;
/// Largest mfp covered by the fitted GP coefficients.
const GP_FIT_LIMIT: f64 = 40.0;

/// Buildup factor formulas a material can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildupFormula {
    /// Geometric-progression fit of ANSI/ANS-6.4.3 style.
    #[default]
    GeometricProgression,
}

impl FromStr for BuildupFormula {
    type Err = ShieldingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "GP" => Ok(BuildupFormula::GeometricProgression),
            other => Err(ShieldingError::UnsupportedFormula(other.to_string())),
        }
    }
}

impl fmt::Display for BuildupFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuildupFormula::GeometricProgression => write!(f, "GP"),
        }
    }
}

/// The five GP coefficients at a single energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpParams {
    pub b: f64,
    pub c: f64,
    pub a: f64,
    pub xk: f64,
    pub d: f64,
}

impl GpParams {
    /// The GP `K(x)` function inside the fitted range.
    fn k(&self, mfp: f64) -> f64 {
        let t2 = tanh_m2();
        self.c * mfp.powf(self.a) + self.d * ((mfp / self.xk - 2.0).tanh() - t2) / (1.0 - t2)
    }

    /// `K(x)` beyond the fitted range, extrapolated from `K(35)` and `K(40)`.
    fn k_extrapolated(&self, mfp: f64) -> f64 {
        let k35 = self.k(35.0);
        let k40 = self.k(GP_FIT_LIMIT);
        if (k40 - k35).abs() < 1e-4 {
            return k40;
        }
        let xi = ((mfp / 35.0).powf(0.1) - 1.0) / ((GP_FIT_LIMIT / 35.0).powf(0.1) - 1.0);
        let ratio = if (k35 - 1.0).abs() < 1e-4 {
            1e4
        } else {
            (k40 - 1.0) / (k35 - 1.0)
        };
        if (0.0..=1.0).contains(&ratio) {
            1.0 + (k35 - 1.0) * ratio.powf(xi)
        } else {
            k35 * (k40 / k35).powf(xi.powf(0.8))
        }
    }
}

/// GP buildup factor for one set of coefficients.
///
/// **Context**: The GP fit is only defined up to 40 mean free paths. Beyond
/// that, `K` is extrapolated from its values at 35 and 40 mfp, which keeps the
/// factor continuous at the seam. Values above 80 mfp are clamped.
pub fn gp_buildup(params: &GpParams, mfp: f64) -> f64 {
    let x = mfp.clamp(0.0, GP_MAX_MFP);
    let k = if x <= 0.0 {
        0.0
    } else if x <= GP_FIT_LIMIT {
        params.k(x)
    } else {
        params.k_extrapolated(x)
    };
    if k == 1.0 {
        1.0 + (params.b - 1.0) * x
    } else {
        1.0 + (params.b - 1.0) * (k.powf(x) - 1.0) / (k - 1.0)
    }
}

/// GP coefficients tabulated over energy, with one Akima interpolant per
/// coefficient over `ln(E)`.
#[derive(Debug, Clone)]
pub struct GpTable {
    energies: Array1<f64>,
    /// In table order: b, c, a, X, d.
    splines: [AkimaSpline; 5],
}

impl GpTable {
    /// Builds the interpolants. Each row holds `[b, c, a, X, d]`.
    pub fn new(energies: Array1<f64>, rows: &[[f64; 5]]) -> Result<Self> {
        if rows.len() != energies.len() {
            return Err(ShieldingError::Library(format!(
                "buildup table has {} energies but {} coefficient rows",
                energies.len(),
                rows.len()
            )));
        }
        if energies.iter().any(|e| *e <= 0.0) {
            return Err(ShieldingError::Library(
                "buildup energies must be positive".into(),
            ));
        }
        let log_e = energies.mapv(f64::ln);
        let column = |j: usize| -> Result<AkimaSpline> {
            let values: Array1<f64> = rows.iter().map(|row| row[j]).collect();
            AkimaSpline::new(log_e.clone(), values)
        };
        let splines = [column(0)?, column(1)?, column(2)?, column(3)?, column(4)?];
        Ok(Self { energies, splines })
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.energies[0], self.energies[self.energies.len() - 1])
    }

    /// Coefficients at `energy`. The caller checks the range.
    fn params(&self, energy: f64) -> GpParams {
        let le = energy.ln();
        let [b, c, a, xk, d] = &self.splines;
        GpParams {
            b: b.eval(le),
            c: c.eval(le),
            a: a.eval(le),
            xk: xk.eval(le),
            d: d.eval(le),
        }
    }
}

/// Immutable tables shared between copies of a material.
#[derive(Debug)]
struct MaterialTables {
    attenuation: LogLogTable,
    absorption: Option<LogLogTable>,
    buildup: Option<GpTable>,
}

/// A shielding material with a density override.
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    density: f64,
    tables: Arc<MaterialTables>,
}

impl Material {
    /// Builds a material from prepared tables. The name is stored lowercase.
    pub fn from_tables(
        name: &str,
        density: f64,
        attenuation: LogLogTable,
        absorption: Option<LogLogTable>,
        buildup: Option<GpTable>,
    ) -> Result<Self> {
        let mut material = Self {
            name: name.to_lowercase(),
            density: 0.0,
            tables: Arc::new(MaterialTables {
                attenuation,
                absorption,
                buildup,
            }),
        };
        material.set_density(density)?;
        Ok(material)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Density in g/cm³.
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn set_density(&mut self, density: f64) -> Result<()> {
        ensure_finite(density, "density")?;
        if density < 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "density of '{}' must be non-negative, got {}",
                self.name, density
            )));
        }
        self.density = density;
        Ok(())
    }

    /// A copy of this material at another density.
    pub fn with_density(&self, density: f64) -> Result<Self> {
        let mut material = self.clone();
        material.set_density(density)?;
        Ok(material)
    }

    pub fn has_buildup_data(&self) -> bool {
        self.tables.buildup.is_some()
    }

    /// Mass attenuation coefficient (cm²/g).
    pub fn mass_attenuation(&self, energy: f64) -> Result<f64> {
        ensure_finite(energy, "photon energy")?;
        self.lookup(&self.tables.attenuation, energy)
    }

    /// Mass energy-absorption coefficient (cm²/g).
    pub fn mass_energy_absorption(&self, energy: f64) -> Result<f64> {
        ensure_finite(energy, "photon energy")?;
        let table = self
            .tables
            .absorption
            .as_ref()
            .ok_or_else(|| ShieldingError::NoData {
                material: self.name.clone(),
                table: "mass energy-absorption",
            })?;
        self.lookup(table, energy)
    }

    fn lookup(&self, table: &LogLogTable, energy: f64) -> Result<f64> {
        table.eval(energy).ok_or_else(|| {
            let (min, max) = table.bounds();
            ShieldingError::OutOfRange {
                quantity: format!("photon energy (MeV) for '{}'", self.name),
                value: energy,
                min,
                max,
            }
        })
    }

    /// Number of mean free paths in `distance` cm of this material.
    pub fn mfp(&self, energy: f64, distance: f64) -> Result<f64> {
        ensure_finite(energy, "photon energy")?;
        ensure_finite(distance, "distance")?;
        if distance < 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "distance must be non-negative, got {}",
                distance
            )));
        }
        if distance == 0.0 {
            return Ok(0.0);
        }
        Ok(distance * self.density * self.mass_attenuation(energy)?)
    }

    fn gp_table(&self) -> Result<&GpTable> {
        self.tables
            .buildup
            .as_ref()
            .ok_or_else(|| ShieldingError::NoData {
                material: self.name.clone(),
                table: "buildup factor",
            })
    }

    /// GP coefficients at `energy`, checking the table and its range.
    pub fn gp_params(&self, energy: f64) -> Result<GpParams> {
        let table = self.gp_table()?;
        ensure_finite(energy, "photon energy")?;
        let (min, max) = table.bounds();
        if energy < min || energy > max {
            return Err(ShieldingError::OutOfRange {
                quantity: format!("buildup photon energy (MeV) for '{}'", self.name),
                value: energy,
                min,
                max,
            });
        }
        Ok(table.params(energy))
    }

    /// Buildup factor at `energy` after `mfp` mean free paths.
    pub fn buildup_factor(&self, energy: f64, mfp: f64, formula: BuildupFormula) -> Result<f64> {
        match formula {
            BuildupFormula::GeometricProgression => {
                self.gp_table()?;
                check_mfp(mfp)?;
                let params = self.gp_params(energy)?;
                Ok(gp_buildup(&params, mfp))
            }
        }
    }

    /// Elementwise [`Material::buildup_factor`] over an array of mfp values.
    pub fn buildup_factors(
        &self,
        energy: f64,
        mfps: &Array1<f64>,
        formula: BuildupFormula,
    ) -> Result<Array1<f64>> {
        match formula {
            BuildupFormula::GeometricProgression => {
                self.gp_table()?;
                for mfp in mfps.iter() {
                    check_mfp(*mfp)?;
                }
                let params = self.gp_params(energy)?;
                Ok(mfps.mapv(|mfp| gp_buildup(&params, mfp)))
            }
        }
    }
}

fn check_mfp(mfp: f64) -> Result<()> {
    ensure_finite(mfp, "mfp")?;
    if mfp < 0.0 {
        return Err(ShieldingError::InvalidArgument(format!(
            "mfp must be non-negative, got {}",
            mfp
        )));
    }
    Ok(())
}
