use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tabled::Tabled;

use crate::error::CriteriaError;

pub const COL_STATE: &str = "State";
pub const COL_DISTRICT: &str = "District";
pub const COL_SUB_SECTOR: &str = "Sub-Sector";
pub const COL_ACTIVITY: &str = "Occupation/Activity";
pub const COL_COMBINED_INDEX: &str = "Combined Index";
pub const COL_OUTSTANDING_CREDIT: &str = "Outstanding Credit";

pub const REQUIRED_COLUMNS: [&str; 4] = [COL_STATE, COL_DISTRICT, COL_SUB_SECTOR, COL_ACTIVITY];

/// A dated observation column, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesColumn {
    pub header: String,
    pub date: NaiveDate,
}

/// One row of the input file after coercion.
///
/// `observations` is aligned with `ObservationTable::series`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub state: String,
    pub district: String,
    pub sub_sector: String,
    pub activity: String,
    pub combined_index: Option<f64>,
    pub outstanding_credit: Option<f64>,
    pub observations: Vec<Option<f64>>,
}

impl ObservationRecord {
    pub fn metric(&self, metric: &MetricColumn) -> Option<f64> {
        match metric {
            MetricColumn::CombinedIndex => self.combined_index,
            MetricColumn::Observation { position, .. } => {
                self.observations.get(*position).copied().flatten()
            }
        }
    }
}

/// The loaded dataset. Never mutated once built; a reload builds a new one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservationTable {
    pub series: Vec<SeriesColumn>,
    pub has_combined_index: bool,
    pub has_outstanding_credit: bool,
    pub records: Vec<ObservationRecord>,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Same columns, different rows. Used by every filter stage.
    pub fn with_records(&self, records: Vec<ObservationRecord>) -> ObservationTable {
        ObservationTable {
            series: self.series.clone(),
            has_combined_index: self.has_combined_index,
            has_outstanding_credit: self.has_outstanding_credit,
            records,
        }
    }
}

/// The single numeric column used for thresholding and ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricColumn {
    CombinedIndex,
    Observation {
        position: usize,
        header: String,
        date: NaiveDate,
    },
}

impl MetricColumn {
    pub fn label(&self) -> &str {
        match self {
            MetricColumn::CombinedIndex => COL_COMBINED_INDEX,
            MetricColumn::Observation { header, .. } => header,
        }
    }
}

/// Minimum metric value, bounded to the slider range [0.0, 10.0] with 0.1
/// steps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f64);

impl Threshold {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 10.0;
    pub const DEFAULT: f64 = 4.0;

    pub fn new(value: f64) -> Result<Self, CriteriaError> {
        if !value.is_finite() {
            return Err(CriteriaError::ThresholdNotFinite);
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(CriteriaError::ThresholdOutOfRange(value));
        }
        // Snap to the 0.1 grid.
        Ok(Threshold((value * 10.0).round() / 10.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(Self::DEFAULT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionSelection {
    /// No region chosen: the open filter.
    #[default]
    All,
    One(String),
    Many(BTreeSet<String>),
}

impl RegionSelection {
    /// Build from selector values; zero values is the open filter.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        match set.len() {
            0 => RegionSelection::All,
            1 => match set.pop_first() {
                Some(only) => RegionSelection::One(only),
                None => RegionSelection::All,
            },
            _ => RegionSelection::Many(set),
        }
    }

    pub fn matches(&self, state: &str) -> bool {
        match self {
            RegionSelection::All => true,
            RegionSelection::One(s) => s == state,
            RegionSelection::Many(set) => set.contains(state),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, RegionSelection::All)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterCriteria {
    pub regions: RegionSelection,
    pub district: Option<String>,
    pub threshold: Option<Threshold>,
}

/// Rows that passed every criterion, in original order, plus their ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub table: ObservationTable,
    pub metric: MetricColumn,
    /// Indices into `table.records`, metric descending, stable.
    pub ranking: Vec<usize>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Rows in original (pre-sort) order.
    pub fn rows(&self) -> &[ObservationRecord] {
        &self.table.records
    }

    /// Rows in ranked order.
    pub fn ranked(&self) -> impl Iterator<Item = &ObservationRecord> + '_ {
        self.ranking.iter().map(move |&i| &self.table.records[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ViewRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Sub-Sector")]
    #[tabled(rename = "Sub-Sector")]
    pub sub_sector: String,
    #[serde(rename = "Occupation/Activity")]
    #[tabled(rename = "Occupation/Activity")]
    pub activity: String,
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
}

/// One bar of the top-K chart; `state` is the colour/grouping key.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ChartPoint {
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Occupation/Activity")]
    #[tabled(rename = "Occupation/Activity")]
    pub activity: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value", display_with = "display_value")]
    pub value: Option<f64>,
}

fn display_value(v: &Option<f64>) -> String {
    crate::util::format_metric(*v)
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TopActivityRow {
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Occupation/Activity")]
    #[tabled(rename = "Occupation/Activity")]
    pub activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TrendPoint {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "RCA")]
    #[tabled(rename = "RCA")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictOverview {
    pub state: String,
    pub district: String,
    pub sub_sector: String,
    pub activity: String,
    pub metric_label: String,
    pub latest_value: Option<f64>,
    pub trend: Vec<TrendPoint>,
}
