//! District RCA dashboard core.
//!
//! Loads a table of precomputed Revealed Comparative Advantage values per
//! district, filters and ranks it, and renders the filtered table as a PDF
//! report. Everything here is a pure function over immutable values except
//! [`session::Session`], which holds the one table a dashboard session works
//! on.

pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod pdf;
pub mod ranking;
pub mod report;
pub mod session;
pub mod types;
pub mod util;

pub use error::{ConfigError, CriteriaError, DataFormatError, ExportError};
pub use filter::{apply, select_metric};
pub use report::render;
pub use types::{FilterCriteria, FilteredView, ObservationTable, RegionSelection, Threshold};
