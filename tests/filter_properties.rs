use chrono::NaiveDate;
use proptest::prelude::*;

use rca_dashboard::filter::{apply, by_district, by_region, by_threshold, select_metric};
use rca_dashboard::types::{
    FilterCriteria, ObservationRecord, ObservationTable, RegionSelection, SeriesColumn, Threshold,
};

const STATES: [&str; 3] = ["Gujarat", "Kerala", "Punjab"];
const DISTRICTS: [&str; 4] = ["Anand", "Idukki", "Ludhiana", "Moga"];

fn series() -> Vec<SeriesColumn> {
    // Deliberately out of chronological order.
    ["31-12-2023", "31-03-2023"]
        .iter()
        .map(|h| SeriesColumn {
            header: h.to_string(),
            date: NaiveDate::parse_from_str(h, "%d-%m-%Y").unwrap(),
        })
        .collect()
}

fn value() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        4 => (0u32..=100).prop_map(|v| Some(v as f64 / 10.0)),
    ]
}

fn record() -> impl Strategy<Value = ObservationRecord> {
    (0..STATES.len(), 0..DISTRICTS.len(), value(), value()).prop_map(|(s, d, latest, older)| {
        ObservationRecord {
            state: STATES[s].to_string(),
            district: DISTRICTS[d].to_string(),
            sub_sector: "Dairy".to_string(),
            activity: format!("Activity {s}{d}"),
            combined_index: None,
            outstanding_credit: None,
            observations: vec![latest, older],
        }
    })
}

fn table() -> impl Strategy<Value = ObservationTable> {
    prop::collection::vec(record(), 0..40).prop_map(|records| ObservationTable {
        series: series(),
        has_combined_index: false,
        has_outstanding_credit: false,
        records,
    })
}

fn regions() -> impl Strategy<Value = RegionSelection> {
    prop::collection::vec(0..STATES.len(), 0..3)
        .prop_map(|picked| RegionSelection::from_values(picked.into_iter().map(|i| STATES[i])))
}

fn threshold() -> impl Strategy<Value = Option<Threshold>> {
    prop_oneof![
        1 => Just(None),
        4 => (0u32..=100).prop_map(|v| Threshold::new(v as f64 / 10.0).ok()),
    ]
}

fn criteria() -> impl Strategy<Value = FilterCriteria> {
    (
        regions(),
        prop::option::of(0..DISTRICTS.len()),
        threshold(),
    )
        .prop_map(|(regions, district, threshold)| FilterCriteria {
            regions,
            district: district.map(|d| DISTRICTS[d].to_string()),
            threshold,
        })
}

proptest! {
    #[test]
    fn apply_is_idempotent(t in table(), c in criteria()) {
        let once = apply(&t, &c).unwrap();
        let twice = apply(&once.table, &c).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn region_and_threshold_commute(t in table(), r in regions(), th in threshold()) {
        let metric = select_metric(&t).unwrap();
        let a = by_threshold(&by_region(&t, &r), &metric, th);
        let b = by_region(&by_threshold(&t, &metric, th), &r);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn all_stages_commute(t in table(), c in criteria()) {
        let metric = select_metric(&t).unwrap();
        let d = c.district.as_deref();
        let forward = by_threshold(&by_district(&by_region(&t, &c.regions), d), &metric, c.threshold);
        let backward = by_region(&by_district(&by_threshold(&t, &metric, c.threshold), d), &c.regions);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn raising_threshold_never_adds_rows(t in table(), r in regions(), lo in 0u32..=100, step in 0u32..=100) {
        let hi = (lo + step).min(100);
        let low = FilterCriteria {
            regions: r.clone(),
            district: None,
            threshold: Threshold::new(lo as f64 / 10.0).ok(),
        };
        let high = FilterCriteria {
            threshold: Threshold::new(hi as f64 / 10.0).ok(),
            ..low.clone()
        };
        prop_assert!(apply(&t, &high).unwrap().len() <= apply(&t, &low).unwrap().len());
    }

    #[test]
    fn missing_metric_never_passes(t in table(), th in 0u32..=100) {
        let c = FilterCriteria {
            threshold: Threshold::new(th as f64 / 10.0).ok(),
            ..Default::default()
        };
        let view = apply(&t, &c).unwrap();
        prop_assert!(view.rows().iter().all(|r| r.observations[0].is_some()));
    }

    #[test]
    fn ranking_is_descending_and_stable(t in table(), c in criteria()) {
        let view = apply(&t, &c).unwrap();
        let ranked: Vec<usize> = view.ranking.clone();
        for pair in ranked.windows(2) {
            let a = view.rows()[pair[0]].observations[0];
            let b = view.rows()[pair[1]].observations[0];
            match (a, b) {
                (Some(x), Some(y)) => {
                    prop_assert!(x >= y);
                    if x == y {
                        prop_assert!(pair[0] < pair[1]);
                    }
                }
                (None, Some(_)) => prop_assert!(false, "missing value ranked above a present one"),
                (None, None) => prop_assert!(pair[0] < pair[1]),
                (Some(_), None) => {}
            }
        }
    }
}
