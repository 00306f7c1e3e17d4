//! Visible-band snow surface emissivity coefficients.
//!
//! A [`SnowVisCoeff`] owns the categorized emissivity table for the life of
//! a model run:
//!
//! ```no_run
//! use snowvis_coeff::{LoadOptions, SnowVisCoeff};
//!
//! let mut coeff = SnowVisCoeff::new();
//! coeff.load("snow_vis.bin", &LoadOptions::new().with_file_path("/data/"))?;
//! assert!(coeff.is_loaded());
//! coeff.destroy(None)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
mod store;

pub use config::LoadOptions;
pub use data::FileFormat;
pub use data::model::CategoryTable;
pub use error::{DestroyError, LoadError, ProcessNote};
pub use store::SnowVisCoeff;
