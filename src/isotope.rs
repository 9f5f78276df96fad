//! Radioactive isotopes and their photon emissions.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{ensure_finite, Result, ShieldingError};


/// Units a half-life may be tabulated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HalfLifeUnit {
    #[serde(rename = "usecond")]
    Microsecond,
    #[serde(rename = "msecond")]
    Millisecond,
    #[serde(rename = "second")]
    Second,
    #[serde(rename = "minute")]
    Minute,
    #[serde(rename = "hour")]
    Hour,
    #[serde(rename = "day")]
    Day,
    /// A Julian year of 365.25 days.
    #[serde(rename = "year")]
    Year,
}

impl HalfLifeUnit {
    pub fn to_seconds(&self, value: f64) -> f64 {
        let factor = match self {
            HalfLifeUnit::Microsecond => 1e-6,
            HalfLifeUnit::Millisecond => 1e-3,
            HalfLifeUnit::Second => 1.0,
            HalfLifeUnit::Minute => 60.0,
            HalfLifeUnit::Hour => 3600.0,
            HalfLifeUnit::Day => 86400.0,
            HalfLifeUnit::Year => 365.25 * 86400.0,
        };
        value * factor
    }
}

/// Canonical isotope spelling: first letter upper case, the rest lower case.
pub fn normalize_isotope_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// An isotope with its gamma lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Isotope {
    name: String,
    half_life: f64,
    /// (energy in MeV, photons per decay)
    photons: Vec<(f64, f64)>,
    /// Progeny in secular equilibrium and their branching ratios.
    key_progeny: BTreeMap<String, f64>,
}

impl Isotope {
    /// Creates an isotope. `half_life` is in seconds.
    pub fn new(
        name: &str,
        half_life: f64,
        photons: Vec<(f64, f64)>,
        key_progeny: BTreeMap<String, f64>,
    ) -> Result<Self> {
        let name = normalize_isotope_name(name);
        ensure_finite(half_life, "half-life")?;
        if half_life <= 0.0 {
            return Err(ShieldingError::InvalidArgument(format!(
                "half-life of {} must be positive, got {}",
                name, half_life
            )));
        }
        for (energy, intensity) in &photons {
            ensure_finite(*energy, "photon energy")?;
            ensure_finite(*intensity, "photon intensity")?;
            if *energy <= 0.0 || *intensity < 0.0 {
                return Err(ShieldingError::InvalidArgument(format!(
                    "{} has an invalid photon line ({}, {})",
                    name, energy, intensity
                )));
            }
        }
        let key_progeny = key_progeny
            .into_iter()
            .map(|(k, v)| (normalize_isotope_name(&k), v))
            .collect();
        Ok(Self {
            name,
            half_life,
            photons,
            key_progeny,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Half-life in seconds.
    pub fn half_life(&self) -> f64 {
        self.half_life
    }

    pub fn photons(&self) -> &[(f64, f64)] {
        &self.photons
    }

    pub fn key_progeny(&self) -> &BTreeMap<String, f64> {
        &self.key_progeny
    }
}
