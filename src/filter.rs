//! Filter engine.
//!
//! `apply` is the one recomputation entry point: it never touches the source
//! table and always builds a fresh view. The individual stages are public so
//! they can be composed (and tested) in any order.

use crate::ranking::rank;
use crate::types::{
    FilterCriteria, FilteredView, MetricColumn, ObservationTable, RegionSelection, Threshold,
};
use tracing::debug;

/// Pick the column used for thresholding and ranking.
///
/// A precomputed Combined Index wins. Otherwise the series column with the
/// greatest header date is used, regardless of its position in the file; on
/// equal dates the later column wins.
pub fn select_metric(table: &ObservationTable) -> Option<MetricColumn> {
    if table.has_combined_index {
        return Some(MetricColumn::CombinedIndex);
    }
    table
        .series
        .iter()
        .enumerate()
        .max_by_key(|(_, col)| col.date)
        .map(|(position, col)| MetricColumn::Observation {
            position,
            header: col.header.clone(),
            date: col.date,
        })
}

pub fn by_region(table: &ObservationTable, regions: &RegionSelection) -> ObservationTable {
    if regions.is_open() {
        return table.clone();
    }
    table.with_records(
        table
            .records
            .iter()
            .filter(|r| regions.matches(&r.state))
            .cloned()
            .collect(),
    )
}

pub fn by_district(table: &ObservationTable, district: Option<&str>) -> ObservationTable {
    let Some(district) = district else {
        return table.clone();
    };
    table.with_records(
        table
            .records
            .iter()
            .filter(|r| r.district == district)
            .cloned()
            .collect(),
    )
}

/// Keep rows whose metric is present and at least the threshold. Missing
/// values never pass, not even at 0.0.
pub fn by_threshold(
    table: &ObservationTable,
    metric: &MetricColumn,
    threshold: Option<Threshold>,
) -> ObservationTable {
    let Some(threshold) = threshold else {
        return table.clone();
    };
    let min = threshold.value();
    table.with_records(
        table
            .records
            .iter()
            .filter(|r| matches!(r.metric(metric), Some(v) if v >= min))
            .cloned()
            .collect(),
    )
}

/// Apply every active criterion (logical AND) and rank the survivors.
///
/// Returns `None` only when the table has no metric column at all, which a
/// loaded table never does.
pub fn apply(table: &ObservationTable, criteria: &FilterCriteria) -> Option<FilteredView> {
    let metric = select_metric(table)?;

    let subset = by_region(table, &criteria.regions);
    let subset = by_district(&subset, criteria.district.as_deref());
    let subset = by_threshold(&subset, &metric, criteria.threshold);

    let ranking = rank(&subset.records, &metric);
    debug!(
        source_rows = table.len(),
        kept = subset.len(),
        metric = metric.label(),
        "Applied filter criteria"
    );
    Some(FilteredView {
        table: subset,
        metric,
        ranking,
    })
}
