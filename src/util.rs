// Parsing and formatting helpers.
//
// All the "dirty" cell handling lives here so the loader and the rest of the
// crate only ever see typed values: a metric cell is `Option<f64>`, a series
// header is a `NaiveDate`.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Header format of dated observation columns, e.g. `31-03-2024`.
pub const SERIES_DATE_FORMAT: &str = "%d-%m-%Y";

/// Outcome of reading one metric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricCell {
    Value(f64),
    Missing,
    Invalid,
}

/// Coerce a raw metric cell.
///
/// - Trims whitespace.
/// - The sentinel (and an empty cell) become `Missing`.
/// - Thousands separators (`","`) are stripped before parsing.
/// - Anything else that does not parse as a finite `f64` is `Invalid`.
pub fn parse_metric_cell(raw: &str, sentinel: &str) -> MetricCell {
    let s = raw.trim();
    if s.is_empty() || s == sentinel {
        return MetricCell::Missing;
    }
    let s = s.replace(',', "");
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => MetricCell::Value(v),
        _ => MetricCell::Invalid,
    }
}

/// Parse a series column header. Returns `None` for non-date headers, which
/// is how attribute columns are told apart from observations.
pub fn parse_series_date(header: &str) -> Option<NaiveDate> {
    let s = header.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, SERIES_DATE_FORMAT).ok()
}

/// Render an optional metric for tables and documents.
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_becomes_missing() {
        assert_eq!(parse_metric_cell("-", "-"), MetricCell::Missing);
        assert_eq!(parse_metric_cell("  - ", "-"), MetricCell::Missing);
        assert_eq!(parse_metric_cell("", "-"), MetricCell::Missing);
    }

    #[test]
    fn numbers_parse_with_separators() {
        assert_eq!(parse_metric_cell("4.25", "-"), MetricCell::Value(4.25));
        assert_eq!(parse_metric_cell("1,234.5", "-"), MetricCell::Value(1234.5));
        assert_eq!(parse_metric_cell("-0.5", "-"), MetricCell::Value(-0.5));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(parse_metric_cell("n/a", "-"), MetricCell::Invalid);
        assert_eq!(parse_metric_cell("NaN", "-"), MetricCell::Invalid);
        assert_eq!(parse_metric_cell("inf", "-"), MetricCell::Invalid);
    }

    #[test]
    fn custom_sentinel() {
        assert_eq!(parse_metric_cell("NA", "NA"), MetricCell::Missing);
        assert_eq!(parse_metric_cell("-", "NA"), MetricCell::Invalid);
    }

    #[test]
    fn series_headers() {
        assert_eq!(
            parse_series_date("31-03-2024"),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
        assert_eq!(parse_series_date("District"), None);
        assert_eq!(parse_series_date("2024-03-31"), None);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_int(9855), "9,855");
        assert_eq!(format_metric(Some(4.0)), "4.00");
        assert_eq!(format_metric(None), "-");
    }
}
