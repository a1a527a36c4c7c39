use chrono::NaiveDate;
use thiserror::Error;

use crate::adapters::auth::Authenticator;
use crate::adapters::client_session::ClientSession;
use crate::adapters::http::ClientError;
use crate::domain::models::ChargePoint;
use crate::domain::report::{Report, ReportError, assemble_report};
use crate::domain::session_filter::SessionWindow;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("No charge points found.")]
    NoChargePoints,
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSettings {
    pub connector_id: u32,
    pub price_per_kwh_cents: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub rfid: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Cost report for one RFID tag on the first owned charge point.
pub async fn rfid_report<A: Authenticator>(
    session: &ClientSession<A>,
    settings: &ReportSettings,
    request: &ReportRequest,
) -> Result<Report, WorkflowError> {
    let charge_point = first_charge_point(session).await?;
    let window = SessionWindow::from_dates(request.start_date, request.end_date);

    let sessions = session
        .sessions()
        .sessions_by_rfid(
            &charge_point.id,
            settings.connector_id,
            &request.rfid,
            &window,
        )
        .await?;
    let report = assemble_report(&sessions, settings.price_per_kwh_cents);

    tracing::info!(
        charge_point_id = %charge_point.id,
        rows = report.rows.len(),
        total_cost = report.total_cost,
        "rfid report assembled"
    );
    Ok(report)
}

pub async fn rfid_tags<A: Authenticator>(
    session: &ClientSession<A>,
) -> Result<Vec<String>, WorkflowError> {
    let charge_point = first_charge_point(session).await?;
    Ok(session
        .sessions()
        .registered_rfid_tags(&charge_point.id)
        .await?)
}

async fn first_charge_point<A: Authenticator>(
    session: &ClientSession<A>,
) -> Result<ChargePoint, WorkflowError> {
    session
        .gateway()
        .owned_charge_points()
        .await?
        .into_iter()
        .next()
        .ok_or(WorkflowError::NoChargePoints)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{ReportRequest, ReportSettings, WorkflowError, rfid_report, rfid_tags};
    use crate::adapters::client_session::ClientSession;
    use crate::test_support::{FakeUpstream, sample_charge_point, sample_session};

    const SETTINGS: ReportSettings = ReportSettings {
        connector_id: 1,
        price_per_kwh_cents: 30.0,
    };

    #[actix_web::test]
    async fn report_uses_first_charge_point_and_date_window() {
        let upstream = FakeUpstream::start().await;
        upstream.respond(
            "GET",
            "/chargepoints/owned",
            200,
            json!([sample_charge_point("cp-1"), sample_charge_point("cp-2")]),
        );
        upstream.respond(
            "GET",
            "/chargepoints/cp-1/connectors/1/chargingsessions",
            200,
            json!([
                sample_session(1, "AAAA", 10.0, Some("2025-03-01T18:00:00"), Some("2025-03-01T22:00:00")),
                sample_session(2, "BBBB", 7.0, Some("2025-03-02T18:00:00"), None),
                sample_session(3, "AAAA", 5.0, None, None),
            ]),
        );
        let session = ClientSession::open(&upstream.client_settings())
            .await
            .expect("session should open");

        let report = rfid_report(
            &session,
            &SETTINGS,
            &ReportRequest {
                rfid: "AAAA".to_string(),
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
                end_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            },
        )
        .await
        .expect("report should assemble");

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[1].start_time, None);
        assert_eq!(report.total_cost, 4.5);
        let request = upstream
            .last_request_to("/api/v5/chargepoints/cp-1/connectors/1/chargingsessions")
            .expect("sessions should be requested");
        assert_eq!(
            request.query,
            "startTime=2025-03-01T00%3A00%3A00&endTime=2025-04-01T00%3A00%3A00"
        );

        session.close().await;
        upstream.stop().await;
    }

    #[actix_web::test]
    async fn tags_without_charge_points_is_a_workflow_error() {
        let upstream = FakeUpstream::start().await;
        upstream.respond("GET", "/chargepoints/owned", 200, json!([]));
        let session = ClientSession::open(&upstream.client_settings())
            .await
            .expect("session should open");

        let result = rfid_tags(&session).await;

        assert!(matches!(result, Err(WorkflowError::NoChargePoints)));
        session.close().await;
        upstream.stop().await;
    }

    #[actix_web::test]
    async fn tags_come_from_the_unbounded_charge_point_listing() {
        let upstream = FakeUpstream::start().await;
        upstream.respond("GET", "/chargepoints/owned", 200, json!([sample_charge_point("cp-7")]));
        upstream.respond(
            "GET",
            "/chargepoints/cp-7/chargingsessions",
            200,
            json!([
                sample_session(1, "00000000000000", 1.0, None, None),
                sample_session(2, "CCCC", 1.0, None, None),
                sample_session(3, "AAAA", 1.0, None, None),
                sample_session(4, "CCCC", 1.0, None, None),
            ]),
        );
        let session = ClientSession::open(&upstream.client_settings())
            .await
            .expect("session should open");

        let tags = rfid_tags(&session).await.expect("tags should load");

        assert_eq!(tags, vec!["CCCC", "AAAA"]);
        session.close().await;
        upstream.stop().await;
    }
}
