//! One dashboard session: the loaded table plus the per-interaction
//! recomputation the presentation layer calls.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::DataFormatError;
use crate::filter::apply;
use crate::loader::{self, LoadOptions, LoadReport};
use crate::output::write_bytes;
use crate::ranking::{self, DEFAULT_TOP_K};
use crate::report;
use crate::types::{
    ChartPoint, DistrictOverview, FilterCriteria, FilteredView, ObservationTable, RegionSelection,
    TopActivityRow, ViewRow,
};

/// Empty-but-valid states shown to the user instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    NoDataLoaded,
    NoRegionSelected,
    NoDistrictsForRegion(String),
    NoMatchingRows,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::NoDataLoaded => write!(f, "No data loaded. Load a dataset first."),
            Note::NoRegionSelected => write!(f, "No region selected; showing all regions."),
            Note::NoDistrictsForRegion(state) => {
                write!(f, "No districts available for {}.", state)
            }
            Note::NoMatchingRows => write!(f, "No rows match the current filters."),
        }
    }
}

/// Everything the presentation layer draws for one interaction.
#[derive(Debug, Clone, Default)]
pub struct DashboardOutputs {
    pub view: Option<FilteredView>,
    pub rows: Vec<ViewRow>,
    pub chart: Vec<ChartPoint>,
    pub top_activities: Vec<TopActivityRow>,
    pub overview: Option<DistrictOverview>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Written { path: PathBuf, bytes: usize },
    /// Non-fatal; the session stays usable.
    Failed { notice: String },
}

#[derive(Debug, Clone)]
pub struct Session {
    table: Option<Arc<ObservationTable>>,
    load_options: LoadOptions,
    top_k: usize,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(LoadOptions::default(), DEFAULT_TOP_K)
    }
}

impl Session {
    pub fn new(load_options: LoadOptions, top_k: usize) -> Self {
        Session {
            table: None,
            load_options,
            top_k,
        }
    }

    pub fn set_top_k(&mut self, top_k: usize) {
        self.top_k = top_k;
    }

    pub fn table(&self) -> Option<Arc<ObservationTable>> {
        self.table.clone()
    }

    /// Swap in a new table. The previous one is dropped, never edited.
    pub fn replace_table(&mut self, table: ObservationTable) {
        self.table = Some(Arc::new(table));
    }

    /// Load from disk. On failure the current table, if any, stays in place.
    pub fn load_path(&mut self, path: &Path) -> Result<LoadReport, DataFormatError> {
        let (table, report) = loader::load_path(path, &self.load_options)?;
        self.replace_table(table);
        Ok(report)
    }

    /// Load an uploaded file.
    pub fn load_reader<R: Read>(&mut self, reader: R) -> Result<LoadReport, DataFormatError> {
        let (table, report) = loader::load_reader(reader, &self.load_options)?;
        self.replace_table(table);
        Ok(report)
    }

    pub fn states(&self) -> Vec<String> {
        self.table
            .as_deref()
            .map(ranking::states)
            .unwrap_or_default()
    }

    pub fn districts(&self, state: &str) -> Vec<String> {
        self.table
            .as_deref()
            .map(|t| ranking::districts(t, state))
            .unwrap_or_default()
    }

    /// Full recomputation for one interaction.
    pub fn recompute(&self, criteria: &FilterCriteria) -> DashboardOutputs {
        let Some(table) = self.table.as_deref() else {
            return DashboardOutputs {
                notes: vec![Note::NoDataLoaded],
                ..Default::default()
            };
        };

        let mut notes = Vec::new();
        match &criteria.regions {
            RegionSelection::All => notes.push(Note::NoRegionSelected),
            RegionSelection::One(state) => {
                if ranking::districts(table, state).is_empty() {
                    notes.push(Note::NoDistrictsForRegion(state.clone()));
                }
            }
            RegionSelection::Many(_) => {}
        }

        let Some(view) = apply(table, criteria) else {
            // Loaded tables always carry a metric column.
            notes.push(Note::NoMatchingRows);
            return DashboardOutputs {
                notes,
                ..Default::default()
            };
        };
        if view.is_empty() {
            notes.push(Note::NoMatchingRows);
        }

        DashboardOutputs {
            rows: ranking::view_rows(&view),
            chart: ranking::top_k(&view, self.top_k),
            top_activities: ranking::top_activity_summary(&view),
            overview: Self::overview(table, criteria),
            view: Some(view),
            notes,
        }
    }

    /// Overview of the selected district. The threshold only narrows the
    /// ranking, so it is ignored here; with no district chosen there is
    /// nothing to describe.
    fn overview(table: &ObservationTable, criteria: &FilterCriteria) -> Option<DistrictOverview> {
        criteria.district.as_ref()?;
        let scope = FilterCriteria {
            threshold: None,
            ..criteria.clone()
        };
        apply(table, &scope).and_then(|view| ranking::district_overview(&view))
    }

    /// Render the current view and write it to `path`.
    pub fn export(&self, criteria: &FilterCriteria, path: &Path, title: &str) -> ExportOutcome {
        let Some(view) = self.table.as_deref().and_then(|t| apply(t, criteria)) else {
            return ExportOutcome::Failed {
                notice: Note::NoDataLoaded.to_string(),
            };
        };
        let bytes = report::render(&view, title);
        match write_bytes(path, &bytes) {
            Ok(()) => {
                info!(rows = view.len(), "Exported report to {}", path.display());
                ExportOutcome::Written {
                    path: path.to_path_buf(),
                    bytes: bytes.len(),
                }
            }
            Err(e) => {
                warn!("Report export failed: {}", e);
                ExportOutcome::Failed {
                    notice: format!("Could not export report: {}", e),
                }
            }
        }
    }
}
