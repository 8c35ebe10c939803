use crate::types::{
    ChartPoint, DistrictOverview, FilteredView, MetricColumn, ObservationRecord,
    ObservationTable, TopActivityRow, TrendPoint, ViewRow,
};
use crate::util::format_metric;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Default number of bars in the ranking chart.
pub const DEFAULT_TOP_K: usize = 20;

/// Indices of `rows` ordered by metric, highest first.
///
/// The sort is stable so equal values keep file order; rows without a value
/// go last.
pub fn rank(rows: &[ObservationRecord], metric: &MetricColumn) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| {
        match (rows[a].metric(metric), rows[b].metric(metric)) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    order
}

/// First `k` ranked rows as chart points; fewer if the view is smaller.
pub fn top_k(view: &FilteredView, k: usize) -> Vec<ChartPoint> {
    view.ranked()
        .take(k)
        .map(|r| ChartPoint {
            state: r.state.clone(),
            district: r.district.clone(),
            activity: r.activity.clone(),
            value: r.metric(&view.metric),
        })
        .collect()
}

/// One row per district with the activity of its first row.
///
/// Grouping runs over the view in original file order, before ranking, so the
/// choice of "first" does not depend on metric ties. Output follows the order
/// in which districts first appear.
pub fn top_activity_summary(view: &FilteredView) -> Vec<TopActivityRow> {
    let mut seen: HashSet<&str> = HashSet::new();
    view.rows()
        .iter()
        .filter(|r| seen.insert(r.district.as_str()))
        .map(|r| TopActivityRow {
            district: r.district.clone(),
            activity: r.activity.clone(),
        })
        .collect()
}

/// Headline figures and RCA trend for the first row of the view.
pub fn district_overview(view: &FilteredView) -> Option<DistrictOverview> {
    let first = view.rows().first()?;
    let mut trend: Vec<TrendPoint> = view
        .table
        .series
        .iter()
        .zip(first.observations.iter())
        .filter_map(|(col, value)| {
            value.map(|value| TrendPoint {
                date: col.date,
                value,
            })
        })
        .collect();
    trend.sort_by_key(|p| p.date);

    Some(DistrictOverview {
        state: first.state.clone(),
        district: first.district.clone(),
        sub_sector: first.sub_sector.clone(),
        activity: first.activity.clone(),
        metric_label: view.metric.label().to_string(),
        latest_value: first.metric(&view.metric),
        trend,
    })
}

/// Ranked view as display rows (1-based rank).
pub fn view_rows(view: &FilteredView) -> Vec<ViewRow> {
    view.ranked()
        .enumerate()
        .map(|(idx, r)| ViewRow {
            rank: idx + 1,
            state: r.state.clone(),
            district: r.district.clone(),
            sub_sector: r.sub_sector.clone(),
            activity: r.activity.clone(),
            metric: format_metric(r.metric(&view.metric)),
        })
        .collect()
}

/// Distinct non-blank states, sorted, for the region selector.
pub fn states(table: &ObservationTable) -> Vec<String> {
    table
        .records
        .iter()
        .map(|r| r.state.as_str())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct non-blank districts of one state, sorted.
pub fn districts(table: &ObservationTable, state: &str) -> Vec<String> {
    table
        .records
        .iter()
        .filter(|r| r.state == state)
        .map(|r| r.district.as_str())
        .filter(|d| !d.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply;
    use crate::types::{FilterCriteria, SeriesColumn};
    use chrono::NaiveDate;

    fn rec(state: &str, district: &str, activity: &str, values: &[Option<f64>]) -> ObservationRecord {
        ObservationRecord {
            state: state.into(),
            district: district.into(),
            sub_sector: "Dairy".into(),
            activity: activity.into(),
            combined_index: None,
            outstanding_credit: None,
            observations: values.to_vec(),
        }
    }

    fn table(series: &[&str], records: Vec<ObservationRecord>) -> ObservationTable {
        ObservationTable {
            series: series
                .iter()
                .map(|h| SeriesColumn {
                    header: h.to_string(),
                    date: NaiveDate::parse_from_str(h, "%d-%m-%Y").unwrap(),
                })
                .collect(),
            has_combined_index: false,
            has_outstanding_credit: false,
            records,
        }
    }

    fn view(t: &ObservationTable) -> FilteredView {
        apply(t, &FilterCriteria::default()).unwrap()
    }

    #[test]
    fn equal_values_keep_file_order() {
        let t = table(
            &["31-03-2024"],
            vec![
                rec("S", "A", "a", &[Some(5.0)]),
                rec("S", "B", "b", &[Some(5.0)]),
                rec("S", "C", "c", &[Some(5.0)]),
            ],
        );
        let v = view(&t);
        let order: Vec<&str> = v.ranked().map(|r| r.district.as_str()).collect();
        assert_eq!(order, ["A", "B", "C"]);
    }

    #[test]
    fn ranks_descending_with_missing_last() {
        let t = table(
            &["31-03-2024"],
            vec![
                rec("S", "A", "a", &[None]),
                rec("S", "B", "b", &[Some(1.0)]),
                rec("S", "C", "c", &[Some(7.5)]),
                rec("S", "D", "d", &[Some(3.0)]),
            ],
        );
        let v = view(&t);
        let order: Vec<&str> = v.ranked().map(|r| r.district.as_str()).collect();
        assert_eq!(order, ["C", "D", "B", "A"]);
        let rows = view_rows(&v);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].metric, "7.50");
        assert_eq!(rows[3].metric, "-");
    }

    #[test]
    fn top_k_bounds() {
        let records: Vec<_> = (0..30)
            .map(|i| rec("S", &format!("D{i}"), "a", &[Some(i as f64)]))
            .collect();
        let t = table(&["31-03-2024"], records);
        let v = view(&t);
        let chart = top_k(&v, DEFAULT_TOP_K);
        assert_eq!(chart.len(), 20);
        let expected: Vec<String> = v.ranked().take(20).map(|r| r.district.clone()).collect();
        let got: Vec<String> = chart.iter().map(|p| p.district.clone()).collect();
        assert_eq!(got, expected);
        assert_eq!(chart[0].value, Some(29.0));

        let small = table(&["31-03-2024"], vec![rec("S", "A", "a", &[Some(1.0)])]);
        assert_eq!(top_k(&view(&small), DEFAULT_TOP_K).len(), 1);
    }

    #[test]
    fn top_activity_uses_pre_sort_order() {
        // D1's first row has the lower value; ranking would pick "Ghee".
        let t = table(
            &["31-03-2024"],
            vec![
                rec("S", "D1", "Milk", &[Some(2.0)]),
                rec("S", "D2", "Cheese", &[Some(4.0)]),
                rec("S", "D1", "Ghee", &[Some(9.0)]),
            ],
        );
        let summary = top_activity_summary(&view(&t));
        assert_eq!(
            summary,
            vec![
                TopActivityRow {
                    district: "D1".into(),
                    activity: "Milk".into()
                },
                TopActivityRow {
                    district: "D2".into(),
                    activity: "Cheese".into()
                },
            ]
        );
    }

    #[test]
    fn overview_trend_is_chronological() {
        let t = table(
            &["31-12-2023", "31-03-2023", "30-06-2023"],
            vec![rec("S", "D1", "Milk", &[Some(3.0), Some(1.0), None])],
        );
        let v = view(&t);
        let overview = district_overview(&v).unwrap();
        assert_eq!(overview.latest_value, Some(3.0));
        assert_eq!(overview.metric_label, "31-12-2023");
        let values: Vec<f64> = overview.trend.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn overview_of_empty_view_is_none() {
        let t = table(&["31-03-2024"], vec![]);
        assert!(district_overview(&view(&t)).is_none());
    }

    #[test]
    fn selector_options() {
        let t = table(
            &["31-03-2024"],
            vec![
                rec("Punjab", "Ludhiana", "a", &[None]),
                rec("Kerala", "Wayanad", "a", &[None]),
                rec("Kerala", "Idukki", "a", &[None]),
                rec("Kerala", "", "a", &[None]),
                rec("", "Nowhere", "a", &[None]),
            ],
        );
        assert_eq!(states(&t), vec!["Kerala", "Punjab"]);
        assert_eq!(districts(&t, "Kerala"), vec!["Idukki", "Wayanad"]);
        assert!(districts(&t, "Goa").is_empty());
    }
}
