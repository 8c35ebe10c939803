//! PDF rendering of a filtered view.
//!
//! The document is a bold title followed by a grid table. The header row is
//! bold on a grey band and repeats at the top of every page; body rows follow
//! the view's ranking. Rendering does no I/O.

use crate::pdf::{fit_text, text_width, Canvas, Font, PdfDocument, PAGE_HEIGHT, PAGE_WIDTH};
use crate::types::{FilteredView, COL_ACTIVITY, COL_DISTRICT, COL_STATE, COL_SUB_SECTOR};
use crate::util::format_metric;
use tracing::debug;

/// Default file name offered for the downloaded report.
pub const DEFAULT_REPORT_FILE: &str = "RCA_District_Report.pdf";
pub const DEFAULT_REPORT_TITLE: &str = "RCA District Report";

const MARGIN: f64 = 36.0;
const TITLE_SIZE: f64 = 16.0;
const TITLE_GAP: f64 = 14.0;
const CELL_SIZE: f64 = 9.0;
const ROW_HEIGHT: f64 = 16.0;
const CELL_PAD: f64 = 4.0;
const HEADER_SHADE: f64 = 0.82;
const GRID_SHADE: f64 = 0.55;
const MIN_COL_CHARS: usize = 6;
const MAX_COL_CHARS: usize = 40;

struct TableLayout {
    header: Vec<String>,
    body: Vec<Vec<String>>,
    widths: Vec<f64>,
}

impl TableLayout {
    fn build(view: &FilteredView) -> TableLayout {
        let header: Vec<String> = [COL_STATE, COL_DISTRICT, COL_SUB_SECTOR, COL_ACTIVITY]
            .iter()
            .map(|h| h.to_string())
            .chain(std::iter::once(view.metric.label().to_string()))
            .collect();
        let body: Vec<Vec<String>> = view
            .ranked()
            .map(|r| {
                vec![
                    r.state.clone(),
                    r.district.clone(),
                    r.sub_sector.clone(),
                    r.activity.clone(),
                    format_metric(r.metric(&view.metric)),
                ]
            })
            .collect();

        // Column share follows the widest cell, within bounds.
        let chars: Vec<usize> = (0..header.len())
            .map(|c| {
                body.iter()
                    .map(|row| row[c].chars().count())
                    .chain(std::iter::once(header[c].chars().count()))
                    .max()
                    .unwrap_or(0)
                    .clamp(MIN_COL_CHARS, MAX_COL_CHARS)
            })
            .collect();
        let total: usize = chars.iter().sum();
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        let widths = chars
            .iter()
            .map(|&c| usable * c as f64 / total as f64)
            .collect();

        TableLayout {
            header,
            body,
            widths,
        }
    }

    fn draw_row(&self, canvas: &mut Canvas, top: f64, cells: &[String], header: bool) {
        let y = top - ROW_HEIGHT;
        let mut x = MARGIN;
        let font = if header { Font::Bold } else { Font::Regular };
        for (cell, &w) in cells.iter().zip(self.widths.iter()) {
            if header {
                canvas.fill_rect(x, y, w, ROW_HEIGHT, HEADER_SHADE);
            }
            canvas.stroke_rect(x, y, w, ROW_HEIGHT, GRID_SHADE, 0.5);
            let text = fit_text(cell, CELL_SIZE, w - 2.0 * CELL_PAD);
            canvas.text(x + CELL_PAD, y + 4.5, font, CELL_SIZE, &text);
            x += w;
        }
    }
}

/// Rows that fit below `top` after the header row.
fn rows_per_page(top: f64) -> usize {
    let slots = ((top - MARGIN) / ROW_HEIGHT).floor() as usize;
    slots.saturating_sub(1).max(1)
}

/// Render the view (in ranked order) as a PDF document.
///
/// An empty view gives a single page with the title and header row only.
pub fn render(view: &FilteredView, title: &str) -> Vec<u8> {
    let layout = TableLayout::build(view);
    let mut doc = PdfDocument::new(title);

    let title_top = PAGE_HEIGHT - MARGIN;
    let first_top = title_top - TITLE_SIZE - TITLE_GAP;
    let later_top = PAGE_HEIGHT - MARGIN;

    let mut remaining: &[Vec<String>] = &layout.body;
    let mut first = true;
    loop {
        let mut canvas = Canvas::new();
        let top = if first {
            let heading = fit_text(title, TITLE_SIZE, PAGE_WIDTH - 2.0 * MARGIN);
            let title_x = MARGIN.max((PAGE_WIDTH - text_width(&heading, TITLE_SIZE)) / 2.0);
            canvas.text(title_x, title_top - TITLE_SIZE, Font::Bold, TITLE_SIZE, &heading);
            first_top
        } else {
            later_top
        };

        layout.draw_row(&mut canvas, top, &layout.header, true);
        let take = rows_per_page(top).min(remaining.len());
        let (page_rows, rest) = remaining.split_at(take);
        for (i, row) in page_rows.iter().enumerate() {
            let row_top = top - ROW_HEIGHT * (i as f64 + 1.0);
            layout.draw_row(&mut canvas, row_top, row, false);
        }
        doc.add_page(canvas);

        remaining = rest;
        first = false;
        if remaining.is_empty() {
            break;
        }
    }

    debug!(
        rows = layout.body.len(),
        pages = doc.page_count(),
        "Rendered report"
    );
    doc.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply;
    use crate::types::{FilterCriteria, ObservationRecord, ObservationTable, SeriesColumn};
    use chrono::NaiveDate;

    fn table(n: usize) -> ObservationTable {
        ObservationTable {
            series: vec![SeriesColumn {
                header: "31-03-2024".into(),
                date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            }],
            has_combined_index: false,
            has_outstanding_credit: false,
            records: (0..n)
                .map(|i| ObservationRecord {
                    state: "Kerala".into(),
                    district: format!("District {i}"),
                    sub_sector: "Dairy".into(),
                    activity: "Milk (processing)".into(),
                    combined_index: None,
                    outstanding_credit: None,
                    observations: vec![Some(i as f64 / 2.0)],
                })
                .collect(),
        }
    }

    fn render_text(n: usize) -> String {
        let t = table(n);
        let view = apply(&t, &FilterCriteria::default()).unwrap();
        String::from_utf8_lossy(&render(&view, DEFAULT_REPORT_TITLE)).into_owned()
    }

    #[test]
    fn empty_view_renders_header_only() {
        let text = render_text(0);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("(RCA District Report) Tj"));
        for h in ["State", "District", "Sub-Sector", "Occupation/Activity", "31-03-2024"] {
            assert!(text.contains(&format!("({h}) Tj")), "missing header {h}");
        }
        // Title plus five header cells.
        assert_eq!(text.matches(" Tj ET").count(), 6);
        assert_eq!(text.matches("/Type /Page /Parent").count(), 1);
    }

    #[test]
    fn body_rows_follow_ranking() {
        let text = render_text(3);
        let top = text.find("(District 2) Tj").unwrap();
        let bottom = text.find("(District 0) Tj").unwrap();
        assert!(top < bottom);
        assert!(text.contains("(1.00) Tj"));
        assert!(text.contains("(Milk \\(processing\\)) Tj"));
        // Header is shaded.
        assert!(text.contains(" re f Q"));
    }

    #[test]
    fn long_title_is_cut_to_page_width() {
        let t = table(1);
        let view = apply(&t, &FilterCriteria::default()).unwrap();
        let long = "X".repeat(300);
        let text = String::from_utf8_lossy(&render(&view, &long)).into_owned();
        assert!(!text.contains(&format!("({long}) Tj")));
        // 770pt of usable width at 16pt Helvetica.
        assert!(text.contains(&format!("({}...) Tj", "X".repeat(89))));
    }

    #[test]
    fn long_views_paginate_with_repeated_header() {
        let text = render_text(120);
        let pages = text.matches("/Type /Page /Parent").count();
        assert!(pages >= 4, "expected several pages, got {pages}");
        assert_eq!(text.matches("(Sub-Sector) Tj").count(), pages);
        assert_eq!(text.matches("(Kerala) Tj").count(), 120);
    }
}
