use crate::error::ExportError;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(|e| io_error(path, e))?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s).map_err(|e| io_error(path, e))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Write an already-rendered document.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes).map_err(|e| io_error(path, e))?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Markdown table of at most `max_rows` rows, or `(no rows)`.
pub fn table_string<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", table_string(rows, max_rows));
    if rows.len() > max_rows {
        println!("({} more rows not shown)\n", rows.len() - max_rows);
    }
}

/// Footer shown under the ranking table.
pub const RCA_DEFINITION: &str = "\
RCA Definition:
  RCA = (Dairy Credit in District / Total Credit in District) / (Total Dairy Credit across India / Total Food & Beverage Sector Credit across India)
  RCA > 1 implies above-average specialization; RCA > 4 is considered strong comparative advantage.";

pub fn print_rca_definition() {
    println!("---");
    println!("{}\n", RCA_DEFINITION);
}
