use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::adapters::client_session::ClientSession;
use crate::adapters::report_csv::CsvReportSink;
use crate::app::AppError;
use crate::app::config::AppConfig;
use crate::app::reports::{ReportRequest, WorkflowError, rfid_report, rfid_tags};
use crate::domain::report::ReportSink;

#[derive(Debug, Parser)]
#[command(
    name = "chargeamps_cli",
    about = "Charging cost reports from the Charge Amps cloud"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List RFID tags seen on the first owned charge point.
    Tags,
    /// Write a CSV cost report for one RFID tag.
    Report {
        #[arg(long, env = "CHARGEAMPS_RFID")]
        rfid: String,
        /// First day of the window (YYYY-MM-DD).
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Day the window ends at midnight (YYYY-MM-DD).
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

pub async fn execute<W: Write>(
    config: &AppConfig,
    command: Command,
    out: &mut W,
) -> Result<(), AppError> {
    let session = ClientSession::open(&config.client_settings())
        .await
        .map_err(WorkflowError::from)?;

    match command {
        Command::Tags => {
            let tags = rfid_tags(&session).await?;
            session.close().await;
            for tag in tags {
                writeln!(out, "{tag}")?;
            }
        }
        Command::Report {
            rfid,
            from,
            to,
            output,
        } => {
            let request = ReportRequest {
                rfid,
                start_date: from,
                end_date: to,
            };
            let report = rfid_report(&session, &config.report_settings(), &request).await?;
            session.close().await;

            let sink = CsvReportSink;
            let body = sink
                .render(&report)
                .map_err(WorkflowError::from)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, body)?;
                    tracing::info!(path = %path.display(), rows = report.rows.len(), "report written");
                }
                None => out.write_all(&body)?,
            }
        }
    }

    Ok(())
}
