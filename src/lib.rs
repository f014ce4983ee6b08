//! Loss Factors Model (MLFM) normalization of measured PV module IV data.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
/// Operating-condition filtering.
pub mod filter;
pub mod io;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod runner;
/// Plot-ready series selection and export.
pub mod series;
pub mod summary;

pub use error::{MlfmError, Result};
pub use normalize::{ErrorPolicy, Normalization, meas_to_norm, normalize_table};
