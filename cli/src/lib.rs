use evapotranspiration::{EtError, RadiationConfig};
use kc_curve::{io, FitMethod, KcConfig, KcError, ObservationSet};

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Kc(#[from] KcError),
    #[error(transparent)]
    Et(#[from] EtError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// One field to process in a batch run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    /// NDVI CSV file or directory of per-scene JSON statistics
    pub ndvi: String,
    /// Weather CSV; when present ETc is written as well
    #[serde(default)]
    pub weather: Option<String>,
}

/// Batch run configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RunConfig {
    pub output_dir: String,
    #[serde(default)]
    pub pipeline: KcConfig,
    #[serde(default)]
    pub radiation: RadiationConfig,
    pub fields: Vec<FieldSpec>,
}

impl RunConfig {
    /// Load RunConfig from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load RunConfig from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        read_by_extension(path.as_ref())
    }

    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the configuration file
    pub fn schema() -> Result<String, CliError> {
        let schema = schemars::schema_for!(RunConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Per-field output file
    pub fn output_path(&self, field: &str, suffix: &str) -> PathBuf {
        Path::new(&self.output_dir).join(format!("{}_{}", field, suffix))
    }
}

/// Load a pipeline configuration from `.toml` or `.json`
pub fn load_kc_config<P: AsRef<Path>>(path: P) -> Result<KcConfig, CliError> {
    read_by_extension(path.as_ref())
}

fn read_by_extension<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(toml::from_str(&fs::read_to_string(path)?)?),
        Some("json") => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        _ => Err(CliError::UnsupportedFileFormat),
    }
}

/// Read NDVI from a scene directory or a CSV table
pub fn load_observations<P: AsRef<Path>>(path: P) -> Result<ObservationSet, CliError> {
    let path = path.as_ref();
    let observations = if path.is_dir() {
        io::read_scene_dir(path)?
    } else {
        io::read_observations_csv(path)?
    };
    Ok(observations)
}

/// Command line overrides for individual pipeline settings
#[derive(Debug, Clone, Default, clap::Args)]
pub struct KcOverrides {
    /// Number of piecewise-linear segments
    #[arg(long)]
    pub segments: Option<usize>,
    /// Days kept before the peak
    #[arg(long)]
    pub pre: Option<u16>,
    /// Days kept after the peak
    #[arg(long)]
    pub post: Option<u16>,
    /// Smoothing window length
    #[arg(long)]
    pub window_length: Option<usize>,
    /// Slope of kc = a * ndvi + b
    #[arg(long)]
    pub a: Option<f64>,
    /// Intercept of kc = a * ndvi + b
    #[arg(long)]
    pub b: Option<f64>,
    #[arg(long)]
    pub fit_method: Option<FitMethod>,
}

impl KcOverrides {
    pub fn apply(&self, config: &mut KcConfig) {
        if let Some(segments) = self.segments {
            config.fit.segments = segments;
        }
        if let Some(pre) = self.pre {
            config.window.pre_days = pre;
        }
        if let Some(post) = self.post {
            config.window.post_days = post;
        }
        if let Some(window_length) = self.window_length {
            config.smoothing.window_length = window_length;
        }
        if let Some(a) = self.a {
            config.transform.a = a;
        }
        if let Some(b) = self.b {
            config.transform.b = b;
        }
        if let Some(method) = self.fit_method {
            config.fit.method = method;
        }
    }
}
