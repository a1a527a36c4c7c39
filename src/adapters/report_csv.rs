use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::domain::report::{Report, ReportError, ReportSink};

const HEADER: [&str; 7] = [
    "No of Charging Process",
    "Start",
    "End",
    "RFID tag",
    "kWh",
    "cent/kWh",
    "total costs",
];

/// Spreadsheet-friendly CSV rendering of a cost report.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportSink;

impl ReportSink for CsvReportSink {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn file_name(&self) -> &'static str {
        "charging_sessions.csv"
    }

    fn render(&self, report: &Report) -> Result<Vec<u8>, ReportError> {
        let mut out = String::new();
        push_line(&mut out, HEADER.iter().map(|cell| cell.to_string()))?;

        for row in &report.rows {
            push_line(
                &mut out,
                [
                    row.index.to_string(),
                    format_cell_time(row.start_time),
                    format_cell_time(row.end_time),
                    row.rfid.clone(),
                    row.kwh.to_string(),
                    row.price_per_kwh_cents.to_string(),
                    format!("{:.2}", row.cost),
                ],
            )?;
        }

        let mut summary = vec![String::new(); 5];
        summary.push("Total Costs".to_string());
        summary.push(format!("{:.2}", report.total_cost));
        push_line(&mut out, summary)?;

        Ok(out.into_bytes())
    }
}

fn format_cell_time(value: Option<NaiveDateTime>) -> String {
    value
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn push_line(
    out: &mut String,
    cells: impl IntoIterator<Item = String>,
) -> Result<(), ReportError> {
    let line = cells
        .into_iter()
        .map(|cell| escape_cell(&cell))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}").map_err(|error| ReportError::Render(error.to_string()))
}

fn escape_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
