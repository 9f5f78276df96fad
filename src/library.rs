//! Read-only catalog of materials and isotopes.
//!
//! A [`Library`] is built once, typically at startup, and then shared by
//! reference. Lookups hand out owned [`Material`] and [`Isotope`] values whose
//! heavy tables are shared with the catalog, so a model can override a
//! material density without touching the library.
//!
//! The on-disk format is TOML:
//! - `[materials.<name>]` with `density`, an `attenuation` table and optional
//!   `absorption` and `buildup` tables
//! - `[isotopes."<Name>"]` with `half_life`, `half_life_units`, optional
//!   `photons` and optional `key_progeny`

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use ndarray::Array1;
use serde::Deserialize;

use crate::error::{Result, ShieldingError};
use crate::interp::LogLogTable;
use crate::isotope::{normalize_isotope_name, HalfLifeUnit, Isotope};
use crate::material::{GpTable, Material};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::BuildupFormula;

    const SMALL: &str = r#"
        [materials.Steel]
        density = 7.8
        attenuation = { energies = [0.1, 1.0, 10.0], coefficients = [0.37, 0.06, 0.03] }
        buildup = { energies = [0.1, 10.0], coefficients = [[1.5, 1.0, 0.0, 14.0, 0.0], [1.3, 1.0, 0.0, 14.0, 0.0]] }

        [isotopes."cs-137"]
        half_life = 30.08
        half_life_units = "year"
        key_progeny = { "Ba-137m" = 0.944 }

        [isotopes."Ba-137m"]
        half_life = 153.12
        half_life_units = "second"
        photons = [[0.661657, 0.8998]]
    "#;

    #[test]
    fn parses_a_small_library() {
        let lib = Library::from_toml_str(SMALL).unwrap();
        let steel = lib.material("STEEL").unwrap();
        assert_eq!(steel.name(), "steel");
        assert_eq!(steel.density(), 7.8);
        assert!(steel.has_buildup_data());
        let cs = lib.isotope("CS-137").unwrap();
        assert_eq!(cs.name(), "Cs-137");
        assert_eq!(cs.key_progeny().get("Ba-137m"), Some(&0.944));
        assert!((cs.half_life() - 30.08 * 365.25 * 86400.0).abs() < 1.0);
        assert_eq!(lib.material_names(), vec!["steel"]);
        assert_eq!(lib.isotope_names(), vec!["Ba-137m", "Cs-137"]);
    }

    #[test]
    fn unknown_names() {
        let lib = Library::from_toml_str(SMALL).unwrap();
        assert!(matches!(lib.material("unobtainium"), Err(ShieldingError::UnknownName { .. })));
        assert!(matches!(lib.isotope("Xx-1"), Err(ShieldingError::UnknownName { .. })));
    }

    #[test]
    fn rejects_dangling_progeny() {
        let text = r#"
            [isotopes."Cs-137"]
            half_life = 30.08
            half_life_units = "year"
            key_progeny = { "Ba-137m" = 0.944 }
        "#;
        assert!(matches!(Library::from_toml_str(text), Err(ShieldingError::UnknownName { .. })));
    }

    #[test]
    fn rejects_malformed_tables() {
        let short_row = r#"
            [materials.bad]
            density = 1.0
            attenuation = { energies = [0.1, 1.0], coefficients = [0.2, 0.1] }
            buildup = { energies = [0.1, 1.0], coefficients = [[1.5, 1.0, 0.0, 14.0], [1.3, 1.0, 0.0, 14.0]] }
        "#;
        assert!(matches!(Library::from_toml_str(short_row), Err(ShieldingError::Library(_))));

        let unsorted = r#"
            [materials.bad]
            density = 1.0
            attenuation = { energies = [1.0, 0.1], coefficients = [0.2, 0.1] }
        "#;
        assert!(matches!(Library::from_toml_str(unsorted), Err(ShieldingError::Library(_))));

        assert!(Library::from_toml_str("materials = 3").is_err());
    }

    #[test]
    fn bundled_library_loads() {
        let lib = Library::bundled().unwrap();
        for name in ["air", "water", "iron", "lead", "concrete"] {
            assert!(lib.material(name).is_ok(), "missing {}", name);
        }
        let air = lib.material("air").unwrap();
        assert!(air.mass_energy_absorption(1.0).is_ok());
        let iron = lib.material("iron").unwrap();
        assert!((iron.mass_attenuation(1.0).unwrap() - 5.995e-2).abs() < 1e-12);
        let co = lib.isotope("co-60").unwrap();
        assert_eq!(co.photons().len(), 2);
    }

    #[test]
    fn bundled_coefficients_match_reference_values() {
        let lib = Library::bundled().unwrap();
        let air = lib.material("air").unwrap();
        let mu = air.mass_attenuation(0.66).unwrap();
        assert!((mu - 0.0770356).abs() / 0.0770356 < 3e-3, "mu: {}", mu);
        assert!((air.mass_energy_absorption(1.0).unwrap() - 2.789e-2).abs() < 1e-12);
        let lead = lib.material("lead").unwrap();
        assert!((lead.mass_attenuation(0.6).unwrap() - 0.1248).abs() < 1e-12);
    }

    #[test]
    fn bundled_library_has_no_buildup_tables() {
        let lib = Library::bundled().unwrap();
        for name in lib.material_names() {
            let material = lib.material(name).unwrap();
            assert!(!material.has_buildup_data(), "{}", name);
            assert!(matches!(
                material.buildup_factor(1.0, 1.0, BuildupFormula::GeometricProgression),
                Err(ShieldingError::NoData { .. })
            ));
        }
    }
}

/// The library compiled into the crate.
const BUNDLED_LIBRARY: &str = include_str!("../data/library.toml");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LibraryFile {
    #[serde(default)]
    materials: BTreeMap<String, MaterialRecord>,
    #[serde(default)]
    isotopes: BTreeMap<String, IsotopeRecord>,
}

#[derive(Debug, Deserialize)]
struct TableRecord {
    energies: Vec<f64>,
    coefficients: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct BuildupRecord {
    energies: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct MaterialRecord {
    density: f64,
    attenuation: TableRecord,
    absorption: Option<TableRecord>,
    buildup: Option<BuildupRecord>,
}

#[derive(Debug, Deserialize)]
struct IsotopeRecord {
    half_life: f64,
    half_life_units: HalfLifeUnit,
    #[serde(default)]
    photons: Vec<[f64; 2]>,
    #[serde(default)]
    key_progeny: BTreeMap<String, f64>,
}

impl TableRecord {
    fn build(self) -> Result<LogLogTable> {
        LogLogTable::new(Array1::from(self.energies), Array1::from(self.coefficients))
    }
}

impl BuildupRecord {
    fn build(self) -> Result<GpTable> {
        let rows = self
            .coefficients
            .iter()
            .map(|row| {
                <[f64; 5]>::try_from(row.as_slice()).map_err(|_| {
                    ShieldingError::Library(format!(
                        "buildup rows need 5 coefficients [b, c, a, X, d], got {}",
                        row.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        GpTable::new(Array1::from(self.energies), &rows)
    }
}

impl MaterialRecord {
    fn build(self, name: &str) -> Result<Material> {
        let attenuation = self.attenuation.build()?;
        let absorption = self.absorption.map(TableRecord::build).transpose()?;
        let buildup = self.buildup.map(BuildupRecord::build).transpose()?;
        Material::from_tables(name, self.density, attenuation, absorption, buildup)
    }
}

/// Catalog of materials and isotopes keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct Library {
    materials: BTreeMap<String, Material>,
    isotopes: BTreeMap<String, Isotope>,
}

impl Library {
    /// Parses a library from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: LibraryFile = toml::from_str(text)?;

        let mut materials = BTreeMap::new();
        for (name, record) in file.materials {
            let material = record
                .build(&name)
                .map_err(|e| ShieldingError::Library(format!("material '{}': {}", name, e)))?;
            materials.insert(material.name().to_string(), material);
        }

        let mut isotopes = BTreeMap::new();
        for (name, record) in file.isotopes {
            let photons = record.photons.iter().map(|[e, i]| (*e, *i)).collect();
            let half_life = record.half_life_units.to_seconds(record.half_life);
            let isotope = Isotope::new(&name, half_life, photons, record.key_progeny)?;
            isotopes.insert(isotope.name().to_string(), isotope);
        }

        for isotope in isotopes.values() {
            for progeny in isotope.key_progeny().keys() {
                if !isotopes.contains_key(progeny) {
                    return Err(ShieldingError::UnknownName {
                        kind: "isotope",
                        name: format!("{} (key progeny of {})", progeny, isotope.name()),
                    });
                }
            }
        }

        debug!(
            "library loaded: {} materials, {} isotopes",
            materials.len(),
            isotopes.len()
        );
        Ok(Self {
            materials,
            isotopes,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading library from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The library shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_LIBRARY)
    }

    /// Looks up a material by case-insensitive name.
    pub fn material(&self, name: &str) -> Result<Material> {
        self.materials
            .get(&name.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| ShieldingError::UnknownName {
                kind: "material",
                name: name.to_string(),
            })
    }

    pub fn isotope(&self, name: &str) -> Result<Isotope> {
        self.isotopes
            .get(&normalize_isotope_name(name))
            .cloned()
            .ok_or_else(|| ShieldingError::UnknownName {
                kind: "isotope",
                name: name.to_string(),
            })
    }

    pub fn material_names(&self) -> Vec<&str> {
        self.materials.keys().map(String::as_str).collect()
    }

    pub fn isotope_names(&self) -> Vec<&str> {
        self.isotopes.keys().map(String::as_str).collect()
    }
}
