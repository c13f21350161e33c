use std::{error::Error, fs, path::Path};

use calib_obsdb::{IngestReport, ObsDbConfig, ObservationInput, build_database};
use clap::Parser;

/// Synchronise multi-camera target observations and shape the view set.
#[derive(Debug, Parser)]
#[command(author, version, about = "Multi-camera observation database")]
struct Args {
    /// Path to JSON file containing ObservationInput.
    #[arg(long)]
    input: String,

    /// Optional path to JSON ObsDbConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<String>,

    /// Print the view table before the report.
    #[arg(long)]
    table: bool,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

/// Returns the rendered view table (if requested) and the report as JSON.
fn run_from_files(
    input_path: &str,
    config_path: Option<&str>,
    with_table: bool,
) -> Result<(Option<String>, String), Box<dyn Error>> {
    let input: ObservationInput = load_json_file(Path::new(input_path))?;

    let config = if let Some(cfg_path) = config_path {
        load_json_file::<ObsDbConfig>(Path::new(cfg_path))?
    } else {
        ObsDbConfig::default()
    };

    let (db, report) = build_database(input, &config)?;
    let table = with_table.then(|| db.table_dump().to_string());
    Ok((table, write_report_json(&report)?))
}

fn write_report_json(report: &IngestReport) -> Result<String, Box<dyn Error>> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let (table, json) = run_from_files(&args.input, args.config.as_deref(), args.table)?;
    if let Some(table) = table {
        print!("{table}");
    }
    println!("{}", json);
    Ok(())
}
