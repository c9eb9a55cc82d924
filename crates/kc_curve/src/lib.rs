//! # Crop Coefficient Curve Library
//!
//! Turns a noisy, irregularly sampled NDVI series for one field into a daily
//! crop coefficient (Kc) curve.
//!
//! ## Stages
//!
//! - **Noise filter**: drop cloud and shadow contaminated samples
//! - **Growth window**: keep the days around the seasonal peak and split there
//! - **Drop removal**: hold transient drops on the ascending flank, replay
//!   confirmed decline on the descending flank
//! - **Smoothing and interpolation**: local polynomial smoothing, then daily values
//! - **Breakpoint fit**: piecewise-linear regression with a fixed segment count
//! - **Kc mapping**: affine NDVI to Kc, pairwise leveling, daily Kc
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kc_curve::{Pipeline, io::read_observations_csv};
//!
//! let observations = read_observations_csv("field_ndvi.csv")?;
//! let pipeline = Pipeline::builder()
//!     .with_segments(4)
//!     .build()?;
//!
//! let output = pipeline.process(&observations)?;
//! println!("Kc on day 180: {:?}", output.kc_at(180));
//! output.save_json("field_kc.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod batch;
pub mod io;

pub use error::{KcError, Result};
pub use types::*;
pub use config::*;
pub use traits::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use batch::{process_batch, BatchReport, FieldInput, FieldOutcome};
