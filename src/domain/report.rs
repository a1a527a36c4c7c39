use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::domain::models::ChargingSession;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub index: usize,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub rfid: String,
    pub kwh: f64,
    pub price_per_kwh_cents: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub total_cost: f64,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render report: {0}")]
    Render(String),
}

/// Renders a finished report into a downloadable artifact.
pub trait ReportSink {
    fn content_type(&self) -> &'static str;
    fn file_name(&self) -> &'static str;
    fn render(&self, report: &Report) -> Result<Vec<u8>, ReportError>;
}

/// Price is in cents per kWh, the cost is in the currency unit.
pub fn session_cost(kwh: f64, price_per_kwh_cents: f64) -> f64 {
    kwh * price_per_kwh_cents / 100.0
}

pub fn assemble_report(sessions: &[ChargingSession], price_per_kwh_cents: f64) -> Report {
    let rows: Vec<ReportRow> = sessions
        .iter()
        .enumerate()
        .map(|(position, session)| ReportRow {
            index: position + 1,
            start_time: session.start_time,
            end_time: session.end_time,
            rfid: session.rfid.clone(),
            kwh: session.total_consumption_kwh,
            price_per_kwh_cents,
            cost: session_cost(session.total_consumption_kwh, price_per_kwh_cents),
        })
        .collect();
    let total_cost = rows.iter().map(|row| row.cost).sum();

    Report { rows, total_cost }
}
