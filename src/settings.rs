use anyhow::{anyhow, bail, ensure, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::info;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::detector::Detector;
use crate::library::Library;
use crate::material::BuildupFormula;
use crate::model::Model;
use crate::shield::{
    Axis, CappedCylinder, Cuboid, InfiniteAnnulus, SemiInfiniteSlab, Shell, Shield, Sphere,
};
use crate::source::{GroupOption, Source};


/// Runtime configuration: a shielding scenario plus run options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Detector location in cm.
    pub detector: [f64; 3],
    /// Material whose buildup factors are applied.
    pub buildup_material: Option<String>,
    /// Buildup factor formula. Only "GP" is supported.
    pub buildup_formula: Option<String>,
    /// Material filling the space between shields.
    pub filler: Option<FillerSettings>,
    /// Library file. The bundled library is used when absent.
    pub library: Option<PathBuf>,
    /// Directory to write the JSON report to.
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub progress: bool,
    pub source: SourceSettings,
    #[serde(default)]
    pub shields: Vec<ShieldSettings>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FillerSettings {
    pub material: String,
    pub density: Option<f64>,
}

/// Source body. Lengths are in cm.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceShape {
    Point { location: [f64; 3] },
    Line { start: [f64; 3], end: [f64; 3] },
    Box { center: [f64; 3], dimensions: [f64; 3] },
    Sphere { center: [f64; 3], radius: f64 },
    XCylinder { center: [f64; 3], length: f64, radius: f64 },
    YCylinder { center: [f64; 3], length: f64, radius: f64 },
    ZCylinder { center: [f64; 3], length: f64, radius: f64 },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SourceSettings {
    #[serde(flatten)]
    pub shape: SourceShape,
    /// Source material, required for volume sources.
    pub material: Option<String>,
    pub density: Option<f64>,
    #[serde(default)]
    pub grouping: GroupOption,
    #[serde(default)]
    pub include_key_progeny: bool,
    pub points_per_dimension: Option<Vec<usize>>,
    #[serde(default)]
    pub isotopes: Vec<IsotopeActivity>,
    #[serde(default)]
    pub photons: Vec<PhotonLine>,
}

/// An isotope with its activity in exactly one unit.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct IsotopeActivity {
    pub name: String,
    pub curies: Option<f64>,
    pub becquerels: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PhotonLine {
    /// Energy in MeV.
    pub energy: f64,
    /// Photons per second.
    pub intensity: f64,
}

/// Shield body. Lengths are in cm.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShieldShape {
    Slab { axis: Axis, start: f64, end: f64 },
    Sphere { center: [f64; 3], radius: f64 },
    Shell { center: [f64; 3], inner_radius: f64, thickness: f64 },
    Box { center: [f64; 3], dimensions: [f64; 3] },
    Annulus { origin: [f64; 3], axis: [f64; 3], inner_radius: f64, outer_radius: f64 },
    Cylinder { start: [f64; 3], end: [f64; 3], radius: f64 },
    XCylinder { center: [f64; 3], length: f64, radius: f64 },
    YCylinder { center: [f64; 3], length: f64, radius: f64 },
    ZCylinder { center: [f64; 3], length: f64, radius: f64 },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ShieldSettings {
    #[serde(flatten)]
    pub shape: ShieldShape,
    pub material: String,
    pub density: Option<f64>,
    pub label: Option<String>,
}

impl SourceShape {
    fn is_volume(&self) -> bool {
        !matches!(self, SourceShape::Point { .. } | SourceShape::Line { .. })
    }
}

impl SourceSettings {
    fn build(&self, library: &Library) -> Result<Source> {
        let volume_material = match &self.material {
            Some(name) if self.shape.is_volume() => Some(library.material(name)?),
            _ => None,
        };
        let material = || {
            volume_material
                .clone()
                .ok_or_else(|| anyhow!("volume sources need a material"))
        };
        let mut source = match &self.shape {
            SourceShape::Point { location } => Source::point(Point3::from(*location)),
            SourceShape::Line { start, end } => Source::line(Point3::from(*start), Point3::from(*end)),
            SourceShape::Box { center, dimensions } => Source::cuboid(
                material()?,
                Cuboid::new(Point3::from(*center), Vector3::from(*dimensions))?,
            ),
            SourceShape::Sphere { center, radius } => {
                Source::sphere(material()?, Sphere::new(Point3::from(*center), *radius)?)
            }
            SourceShape::XCylinder { center, length, radius } => Source::cylinder(
                material()?,
                CappedCylinder::aligned(Axis::X, Point3::from(*center), *length, *radius)?,
            ),
            SourceShape::YCylinder { center, length, radius } => Source::cylinder(
                material()?,
                CappedCylinder::aligned(Axis::Y, Point3::from(*center), *length, *radius)?,
            ),
            SourceShape::ZCylinder { center, length, radius } => Source::cylinder(
                material()?,
                CappedCylinder::aligned(Axis::Z, Point3::from(*center), *length, *radius)?,
            ),
        };

        if let Some(density) = self.density {
            source.set_material_density(density)?;
        }
        source.set_grouping(self.grouping);
        source.set_include_key_progeny(self.include_key_progeny);
        if let Some(points) = &self.points_per_dimension {
            source.set_points_per_dimension(points)?;
        }
        for isotope in &self.isotopes {
            match (isotope.curies, isotope.becquerels) {
                (Some(ci), None) => source.add_isotope_curies(library, &isotope.name, ci)?,
                (None, Some(bq)) => source.add_isotope_bq(library, &isotope.name, bq)?,
                _ => bail!("isotope {} needs exactly one of curies or becquerels", isotope.name),
            }
        }
        for photon in &self.photons {
            source.add_photon(photon.energy, photon.intensity)?;
        }
        Ok(source)
    }
}

impl ShieldSettings {
    fn build(&self, library: &Library) -> Result<Shield> {
        let mut material = library.material(&self.material)?;
        if let Some(density) = self.density {
            material.set_density(density)?;
        }
        let shield = match &self.shape {
            ShieldShape::Slab { axis, start, end } => {
                Shield::new(material, SemiInfiniteSlab::new(*axis, *start, *end)?)
            }
            ShieldShape::Sphere { center, radius } => {
                Shield::new(material, Sphere::new(Point3::from(*center), *radius)?)
            }
            ShieldShape::Shell { center, inner_radius, thickness } => Shield::new(
                material,
                Shell::new(Point3::from(*center), *inner_radius, *thickness)?,
            ),
            ShieldShape::Box { center, dimensions } => Shield::new(
                material,
                Cuboid::new(Point3::from(*center), Vector3::from(*dimensions))?,
            ),
            ShieldShape::Annulus { origin, axis, inner_radius, outer_radius } => Shield::new(
                material,
                InfiniteAnnulus::new(
                    Point3::from(*origin),
                    Vector3::from(*axis),
                    *inner_radius,
                    *outer_radius,
                )?,
            ),
            ShieldShape::Cylinder { start, end, radius } => Shield::new(
                material,
                CappedCylinder::new(Point3::from(*start), Point3::from(*end), *radius)?,
            ),
            ShieldShape::XCylinder { center, length, radius } => Shield::new(
                material,
                CappedCylinder::aligned(Axis::X, Point3::from(*center), *length, *radius)?,
            ),
            ShieldShape::YCylinder { center, length, radius } => Shield::new(
                material,
                CappedCylinder::aligned(Axis::Y, Point3::from(*center), *length, *radius)?,
            ),
            ShieldShape::ZCylinder { center, length, radius } => Shield::new(
                material,
                CappedCylinder::aligned(Axis::Z, Point3::from(*center), *length, *radius)?,
            ),
        };
        Ok(match &self.label {
            Some(label) => shield.with_label(label.clone()),
            None => shield,
        })
    }
}

impl Settings {
    /// Loads the configured library, or the bundled one.
    pub fn load_library(&self) -> Result<Library> {
        match &self.library {
            Some(path) => Library::from_file(path)
                .with_context(|| format!("failed to load library {:?}", path)),
            None => Library::bundled().context("failed to load the bundled library"),
        }
    }

    /// Builds a ready-to-run model from the scenario.
    pub fn build_model(&self, library: &Library) -> Result<Model> {
        let mut model = Model::new(library)?;
        model.set_source(self.source.build(library).context("invalid source")?);
        for (i, shield) in self.shields.iter().enumerate() {
            model.add_shield(
                shield
                    .build(library)
                    .with_context(|| format!("invalid shield {}", i))?,
            );
        }
        let [x, y, z] = self.detector;
        model.set_detector(Detector::new(x, y, z)?);
        if let Some(filler) = &self.filler {
            let mut material = library.material(&filler.material)?;
            if let Some(density) = filler.density {
                material.set_density(density)?;
            }
            model.set_filler_material(material);
        }
        if let Some(name) = &self.buildup_material {
            let material = library.material(name)?;
            ensure!(
                material.has_buildup_data(),
                "buildup material '{}' has no buildup factor data in this library",
                name
            );
            model.set_buildup_factor_material(material);
        }
        if let Some(formula) = &self.buildup_formula {
            model.set_buildup_formula(formula.parse::<BuildupFormula>()?);
        }
        model.set_progress(self.progress);
        Ok(model)
    }
}

pub fn load_default_config() -> Result<Settings> {
    let root_dir = retrieve_project_root()?;
    let default_config_file = root_dir.join("config/default.toml");

    let settings: Settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("failed to load the default configuration")?
        .try_deserialize()
        .context("failed to deserialize the default configuration")?;

    validate_config(&settings)?;

    Ok(settings)
}

pub fn load_config() -> Result<Settings> {
    let args = CliArgs::parse();

    let config_file = match &args.config {
        Some(path) => path.clone(),
        None => {
            // Try to find the project directory in different ways
            let root_dir = retrieve_project_root()?;
            let default_config_file = root_dir.join("config/default.toml");
            let local_config = root_dir.join("config/local.toml");
            if local_config.exists() {
                local_config
            } else {
                default_config_file
            }
        }
    };
    info!("Using configuration: {:?}", config_file);

    let mut config: Settings = Config::builder()
        .add_source(File::from(config_file.clone()).required(true))
        .add_source(Environment::with_prefix("pointkernel"))
        .build()
        .with_context(|| format!("failed to load configuration {:?}", config_file))?
        .try_deserialize()
        .with_context(|| format!("failed to deserialize configuration {:?}", config_file))?;

    // Parse command-line arguments and override values
    if let Some(detector) = args.detector {
        config.detector = <[f64; 3]>::try_from(detector.as_slice())
            .map_err(|_| anyhow!("--detector takes exactly three coordinates"))?;
    }
    if let Some(buildup) = args.buildup {
        config.buildup_material = Some(buildup);
    }
    if let Some(filler) = args.filler {
        config.filler = Some(FillerSettings {
            material: filler,
            density: None,
        });
    }
    if let Some(library) = args.library {
        config.library = Some(library);
    }
    if let Some(output) = args.output {
        config.output = Some(output);
    }
    if args.progress {
        config.progress = true;
    }

    validate_config(&config)?;

    info!("{}", config);

    Ok(config)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the POINTKERNEL_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("POINTKERNEL_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }
    // Walk upward from the executable directory
    let exe_path = env::current_exe().context("failed to get the current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(|dir| dir.to_path_buf())
        .ok_or_else(|| anyhow!("could not find the project root directory"))
}

fn validate_config(config: &Settings) -> Result<()> {
    ensure!(
        config.detector.iter().all(|c| c.is_finite()),
        "Detector coordinates must be finite"
    );
    let source = &config.source;
    ensure!(
        !source.shape.is_volume() || source.material.is_some(),
        "Volume sources need a material"
    );
    if let Some(points) = &source.points_per_dimension {
        ensure!(
            points.iter().all(|n| *n > 0),
            "Source points per dimension must be positive"
        );
    }
    for isotope in &source.isotopes {
        ensure!(
            isotope.curies.is_some() != isotope.becquerels.is_some(),
            "Isotope {} needs exactly one of curies or becquerels",
            isotope.name
        );
    }
    if let Some(density) = config.filler.as_ref().and_then(|f| f.density) {
        ensure!(density >= 0.0, "Filler density must be non-negative");
    }
    for shield in &config.shields {
        if let Some(density) = shield.density {
            ensure!(density >= 0.0, "Shield density must be non-negative");
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "pointkernel - point-kernel gamma-ray shielding")]
pub struct CliArgs {
    /// Scenario file. Defaults to config/local.toml if present, else config/default.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detector location in cm, separated by spaces.
    #[arg(long, num_args = 3, value_delimiter = ' ', allow_negative_numbers = true)]
    detector: Option<Vec<f64>>,

    /// Material whose buildup factors are applied to the total path.
    #[arg(short, long)]
    buildup: Option<String>,

    /// Material filling the space between shields, at its library density.
    #[arg(short, long)]
    filler: Option<String>,

    /// Material and isotope library in TOML format.
    #[arg(short, long)]
    library: Option<PathBuf>,

    /// Directory to write the JSON report to.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source_kind = match self.source.shape {
            SourceShape::Point { .. } => "point",
            SourceShape::Line { .. } => "line",
            SourceShape::Box { .. } => "box",
            SourceShape::Sphere { .. } => "sphere",
            SourceShape::XCylinder { .. } => "x cylinder",
            SourceShape::YCylinder { .. } => "y cylinder",
            SourceShape::ZCylinder { .. } => "z cylinder",
        };
        write!(
            f,
            "Settings:
  - Detector: {:?}
  - Source: {} ({} isotopes, {} photon lines)
  - Shields: {}
  - Filler: {}
  - Buildup Material: {} ({})
  ",
            self.detector,
            source_kind,
            self.source.isotopes.len(),
            self.source.photons.len(),
            self.shields.len(),
            self.filler.as_ref().map_or("none", |f| f.material.as_str()),
            self.buildup_material.as_deref().unwrap_or("none"),
            self.buildup_formula.as_deref().unwrap_or("GP"),
        )
    }
}
