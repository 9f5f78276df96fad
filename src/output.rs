use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::model::ExposureReport;
use crate::settings::Settings;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EnergyContribution;

    fn report() -> ExposureReport {
        ExposureReport {
            rows: vec![
                EnergyContribution {
                    energy: 0.5,
                    emission_rate: 1e9,
                    uncollided_flux: 2.0,
                    total_flux: 3.0,
                    exposure: 0.25,
                },
                EnergyContribution {
                    energy: 1.25,
                    emission_rate: 4e9,
                    uncollided_flux: 5.0,
                    total_flux: 8.0,
                    exposure: 0.75,
                },
            ],
            total_exposure: 1.0,
        }
    }

    #[test]
    fn summary_lists_every_energy() {
        let text = format_summary(&report());
        assert_eq!(text.lines().count(), 2 + 2 + 1);
        assert!(text.contains("1.2500"));
        assert!(text.contains("Total exposure: 1.0000e0 mR/hr"));
        assert_eq!(text, report().to_string());
    }

    #[test]
    fn writes_a_json_report() {
        let settings = crate::settings::load_default_config().unwrap();
        let dir = std::env::temp_dir().join(format!("pointkernel-output-{}", std::process::id()));
        let path = write_report(&dir, &settings, &report()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["report"]["total_exposure"], 1.0);
        assert_eq!(json["report"]["rows"].as_array().unwrap().len(), 2);
        assert!(json["generated"].is_string());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

/// The JSON document written for a run.
#[derive(Serialize)]
struct ReportFile<'a> {
    generated: String,
    scenario: &'a Settings,
    report: &'a ExposureReport,
}

/// Human-readable table of the per-energy contributions.
impl fmt::Display for ExposureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>14} {:>14} {:>14} {:>14}",
            "Energy", "Emission", "Uncollided", "Total flux", "Exposure"
        )?;
        writeln!(
            f,
            "{:>12} {:>14} {:>14} {:>14} {:>14}",
            "(MeV)", "(photons/s)", "(/cm2/s)", "(/cm2/s)", "(mR/hr)"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>12.4} {:>14.4e} {:>14.4e} {:>14.4e} {:>14.4e}",
                row.energy, row.emission_rate, row.uncollided_flux, row.total_flux, row.exposure
            )?;
        }
        writeln!(f, "Total exposure: {:.4e} mR/hr", self.total_exposure)
    }
}

pub fn format_summary(report: &ExposureReport) -> String {
    report.to_string()
}

/// Writes the scenario and its results to a timestamped JSON file in `dir`.
pub fn write_report(dir: &Path, settings: &Settings, report: &ExposureReport) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {:?}", dir))?;
    let now = Local::now();
    let path = dir.join(format!("exposure_{}.json", now.format("%Y%m%d_%H%M%S")));

    let file = File::create(&path).with_context(|| format!("failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    let document = ReportFile {
        generated: now.to_rfc3339(),
        scenario: settings,
        report,
    };
    serde_json::to_writer_pretty(&mut writer, &document)
        .with_context(|| format!("failed to write {:?}", path))?;
    writer.flush()?;

    Ok(path)
}
