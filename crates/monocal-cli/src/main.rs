use std::{fs, path::Path};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use monocal_pipeline::{
    calibrate_with_colinear_groups, CalibrationInput, CalibrationReport, ColinearCalibrationConfig,
};

/// Calibrate one camera from a single photo: surveyed control points plus
/// groups of image points known to lie on straight lines.
#[derive(Debug, Parser)]
#[command(author, version, about = "Single-photo calibration with colinear refinement")]
struct Args {
    /// Path to a JSON CalibrationInput.
    #[arg(long)]
    input: String,

    /// Optional path to a JSON ColinearCalibrationConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<String>,

    /// Write the calibration record (imageSize, cmat, dvec, rvec, tvec, R44,
    /// CamPosition) to this path.
    #[arg(long)]
    output: Option<String>,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("{} is not valid input JSON", path.display()))
}

fn calibrate_from_files(input_path: &str, config_path: Option<&str>) -> Result<CalibrationReport> {
    let input: CalibrationInput = load_json_file(Path::new(input_path))?;
    let config = match config_path {
        Some(path) => load_json_file::<ColinearCalibrationConfig>(Path::new(path))?,
        None => ColinearCalibrationConfig::default(),
    };
    Ok(calibrate_with_colinear_groups(&input, &config)?)
}

fn write_record(report: &CalibrationReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.to_record())?;
    fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    info!("calibration record written to {}", path.display());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let report = calibrate_from_files(&args.input, args.config.as_deref())?;
    if let Some(out) = args.output.as_deref() {
        write_record(&report, Path::new(out))?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
