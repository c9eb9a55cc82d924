use clap::{Parser, Subcommand};
use cli::{load_kc_config, load_observations, FieldSpec, KcOverrides, RunConfig};
use color_eyre::eyre::{eyre, Result};
use evapotranspiration::{
    crop_evapotranspiration, et0_series, read_weather_csv, write_et0_csv, write_etc_csv,
    RadiationConfig,
};
use kc_curve::{
    io::{write_breakpoints_csv_file, write_curve_csv_file},
    process_batch, FieldInput, KcConfig, KcOutput, Pipeline,
};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a daily crop coefficient curve from NDVI observations
    Kc {
        /// NDVI CSV file or directory of scene JSON files
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the daily Kc CSV
        #[arg(short, long)]
        output: PathBuf,
        /// Pipeline configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Also write the leveled breakpoints
        #[arg(long)]
        breakpoints: Option<PathBuf>,
        /// Also write the full JSON report
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        overrides: KcOverrides,
    },
    /// Compute daily reference evapotranspiration from a weather table
    Et0 {
        #[arg(short, long)]
        weather: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compute crop evapotranspiration from NDVI and weather
    Etc {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        weather: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(flatten)]
        overrides: KcOverrides,
    },
    /// Process every field listed in a run configuration
    Batch {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the JSON schema of the run configuration
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Kc { input, output, config, breakpoints, report, overrides } => {
            let pipeline = build_pipeline(config.as_deref(), overrides)?;
            info!("{}", pipeline.info());
            let result = pipeline.process(&load_observations(input)?)?;

            write_curve_csv_file(&result.kc_curve, "kc", output)?;
            if let Some(path) = breakpoints {
                write_breakpoints_csv_file(&result.leveled, path)?;
            }
            if let Some(path) = report {
                result.save_json(path)?;
            }
            info!("Kc curve written to {:?}", output);
        }
        Commands::Et0 { weather, output } => {
            let series = et0_series(&read_weather_csv(weather)?, &RadiationConfig::default());
            write_et0_csv(&series, File::create(output)?)?;
            info!("ET0 for {} days written to {:?}", series.len(), output);
        }
        Commands::Etc { input, weather, output, config, overrides } => {
            let pipeline = build_pipeline(config.as_deref(), overrides)?;
            let result = pipeline.process(&load_observations(input)?)?;
            write_etc(&result, weather, &RadiationConfig::default(), output)?;
        }
        Commands::Batch { config } => run_batch(config)?,
        Commands::Schema => println!("{}", RunConfig::schema()?),
    }

    Ok(())
}

fn build_pipeline(config_path: Option<&Path>, overrides: &KcOverrides) -> Result<Pipeline> {
    let mut config = match config_path {
        Some(path) => load_kc_config(path)?,
        None => KcConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(Pipeline::from_config(config)?)
}

fn write_etc(result: &KcOutput, weather: &Path, radiation: &RadiationConfig, output: &Path) -> Result<()> {
    let et0 = et0_series(&read_weather_csv(weather)?, radiation);
    let records = crop_evapotranspiration(&et0, &result.kc_curve);
    if records.is_empty() {
        return Err(eyre!(
            "no weather days fall inside the Kc curve (days {}-{})",
            result.kc_curve.start_doy(),
            result.kc_curve.end_doy()
        ));
    }
    write_etc_csv(&records, File::create(output)?)?;
    info!("ETc for {} days written to {:?}", records.len(), output);
    Ok(())
}

fn run_batch(config_path: &Path) -> Result<()> {
    let run = RunConfig::from_file(config_path)?;
    fs::create_dir_all(&run.output_dir)?;
    let pipeline = Pipeline::from_config(run.pipeline.clone())?;
    info!("{}", pipeline.info());

    let mut failures = Vec::new();
    let mut inputs = Vec::new();
    for field in &run.fields {
        match load_observations(&field.ndvi) {
            Ok(observations) => inputs.push(FieldInput::new(field.name.clone(), observations)),
            Err(err) => {
                error!("Could not read field '{}': {}", field.name, err);
                failures.push(field.name.clone());
            }
        }
    }

    let report = process_batch(&pipeline, inputs);
    for (name, err) in report.failed() {
        error!("Field '{}' failed: {}", name, err);
        failures.push(name.to_string());
    }

    for (name, result) in report.succeeded() {
        let Some(field) = run.fields.iter().find(|f| f.name == name) else {
            continue;
        };
        if let Err(err) = write_field_outputs(&run, field, result) {
            error!("Could not write outputs for '{}': {}", name, err);
            failures.push(name.to_string());
        }
    }

    let total = run.fields.len();
    info!("Processed {} of {} fields", total - failures.len(), total);
    if !failures.is_empty() {
        return Err(eyre!("{} of {} fields failed: {}", failures.len(), total, failures.join(", ")));
    }
    Ok(())
}

fn write_field_outputs(run: &RunConfig, field: &FieldSpec, result: &KcOutput) -> Result<()> {
    write_curve_csv_file(&result.kc_curve, "kc", run.output_path(&field.name, "kc.csv"))?;
    write_curve_csv_file(&result.ndvi_curve, "ndvi", run.output_path(&field.name, "ndvi.csv"))?;
    write_breakpoints_csv_file(&result.leveled, run.output_path(&field.name, "breakpoints.csv"))?;
    result.save_json(run.output_path(&field.name, "report.json"))?;
    if let Some(weather) = &field.weather {
        write_etc(result, Path::new(weather), &run.radiation, &run.output_path(&field.name, "etc.csv"))?;
    }
    Ok(())
}
