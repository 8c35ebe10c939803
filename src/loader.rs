use crate::error::DataFormatError;
use crate::filter::select_metric;
use crate::types::{
    ObservationRecord, ObservationTable, SeriesColumn, COL_ACTIVITY, COL_COMBINED_INDEX,
    COL_DISTRICT, COL_OUTSTANDING_CREDIT, COL_STATE, COL_SUB_SECTOR, REQUIRED_COLUMNS,
};
use crate::util::{parse_metric_cell, parse_series_date, MetricCell};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub missing_sentinel: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: b',',
            missing_sentinel: "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub series_columns: usize,
    pub missing_cells: usize,
    pub metric: String,
}

/// Header positions resolved once, before any row is read.
struct Layout {
    state: usize,
    district: usize,
    sub_sector: usize,
    activity: usize,
    combined_index: Option<usize>,
    outstanding_credit: Option<usize>,
    series: Vec<(usize, SeriesColumn)>,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Layout, DataFormatError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|&&c| find(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataFormatError::MissingColumns(missing));
        }

        let series: Vec<(usize, SeriesColumn)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| {
                parse_series_date(h).map(|date| {
                    (
                        i,
                        SeriesColumn {
                            header: h.trim().to_string(),
                            date,
                        },
                    )
                })
            })
            .collect();
        let combined_index = find(COL_COMBINED_INDEX);
        if series.is_empty() && combined_index.is_none() {
            return Err(DataFormatError::NoMetricColumns);
        }

        // Presence was checked above; `?` keeps this total.
        let require = |name: &str| {
            find(name).ok_or_else(|| DataFormatError::MissingColumns(vec![name.to_string()]))
        };
        Ok(Layout {
            state: require(COL_STATE)?,
            district: require(COL_DISTRICT)?,
            sub_sector: require(COL_SUB_SECTOR)?,
            activity: require(COL_ACTIVITY)?,
            combined_index,
            outstanding_credit: find(COL_OUTSTANDING_CREDIT),
            series,
        })
    }
}

pub fn load_path(
    path: impl AsRef<Path>,
    opts: &LoadOptions,
) -> Result<(ObservationTable, LoadReport), DataFormatError> {
    let path = path.as_ref();
    info!("Loading dataset from {}", path.display());
    let file = File::open(path)?;
    load_reader(file, opts)
}

/// Parse delimited text into an observation table.
///
/// Any ragged row, missing required column, or metric cell that is neither a
/// number nor the sentinel fails the whole load.
pub fn load_reader<R: Read>(
    reader: R,
    opts: &LoadOptions,
) -> Result<(ObservationTable, LoadReport), DataFormatError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .flexible(false)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let layout = Layout::from_headers(&headers)?;
    debug!(
        series = layout.series.len(),
        combined_index = layout.combined_index.is_some(),
        "Resolved column layout"
    );

    let mut missing_cells = 0usize;
    let mut records = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let row = result?;
        // 1-based, counting the header line.
        let row_no = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        let text = |i: usize| row.get(i).unwrap_or("").trim().to_string();
        let mut metric = |i: usize| -> Result<Option<f64>, DataFormatError> {
            let raw = row.get(i).unwrap_or("");
            match parse_metric_cell(raw, &opts.missing_sentinel) {
                MetricCell::Value(v) => Ok(Some(v)),
                MetricCell::Missing => {
                    missing_cells += 1;
                    Ok(None)
                }
                MetricCell::Invalid => Err(DataFormatError::InvalidNumber {
                    row: row_no,
                    column: headers.get(i).unwrap_or("").trim().to_string(),
                    value: raw.to_string(),
                }),
            }
        };

        let combined_index = layout.combined_index.map(&mut metric).transpose()?.flatten();
        let outstanding_credit = layout
            .outstanding_credit
            .map(&mut metric)
            .transpose()?
            .flatten();
        let observations = layout
            .series
            .iter()
            .map(|(i, _)| metric(*i))
            .collect::<Result<Vec<_>, _>>()?;

        records.push(ObservationRecord {
            state: text(layout.state),
            district: text(layout.district),
            sub_sector: text(layout.sub_sector),
            activity: text(layout.activity),
            combined_index,
            outstanding_credit,
            observations,
        });
    }

    let table = ObservationTable {
        series: layout.series.into_iter().map(|(_, c)| c).collect(),
        has_combined_index: layout.combined_index.is_some(),
        has_outstanding_credit: layout.outstanding_credit.is_some(),
        records,
    };
    let metric = select_metric(&table).ok_or(DataFormatError::NoMetricColumns)?;

    let report = LoadReport {
        total_rows: table.len(),
        series_columns: table.series.len(),
        missing_cells,
        metric: metric.label().to_string(),
    };
    info!(
        rows = report.total_rows,
        series = report.series_columns,
        missing = report.missing_cells,
        metric = %report.metric,
        "Dataset loaded"
    );
    Ok((table, report))
}
