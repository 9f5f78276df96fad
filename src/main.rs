use anyhow::{Context, Result};
use log::info;
use pointkernel::output;
use pointkernel::settings;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = settings::load_config()?;
    let library = settings.load_library()?;
    let model = settings.build_model(&library)?;

    let report = model
        .calculate_exposure_detail()
        .context("exposure calculation failed")?;
    print!("{}", output::format_summary(&report));

    if let Some(dir) = &settings.output {
        let path = output::write_report(dir, &settings, &report)?;
        info!("Report written to {:?}", path);
    }

    Ok(())
}
