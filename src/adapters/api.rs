use actix_web::http::header;
use actix_web::{Either, HttpResponse, Responder, get, post, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::adapters::client_session::ClientSession;
use crate::adapters::http::ClientError;
use crate::adapters::report_csv::CsvReportSink;
use crate::app::config::AppConfig;
use crate::app::reports::{ReportRequest, WorkflowError, rfid_report, rfid_tags};
use crate::domain::report::ReportSink;

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
}

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    pub rfid: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl ReportForm {
    fn into_request(self) -> Result<ReportRequest, String> {
        if self.rfid.trim().is_empty() {
            return Err("rfid is required".to_string());
        }

        Ok(ReportRequest {
            rfid: self.rfid,
            start_date: parse_form_date("start_date", self.start_date.as_deref())?,
            end_date: parse_form_date("end_date", self.end_date.as_deref())?,
        })
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(report_endpoint)
        .service(rfid_tags_endpoint);
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/report")]
async fn report_endpoint(
    state: web::Data<ApiState>,
    form: Either<web::Form<ReportForm>, web::Json<ReportForm>>,
) -> HttpResponse {
    let form = match form {
        Either::Left(form) => form.into_inner(),
        Either::Right(json) => json.into_inner(),
    };
    let request = match form.into_request() {
        Ok(request) => request,
        Err(message) => {
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": message }));
        }
    };

    let sink = CsvReportSink;
    let rendered = async {
        let session = ClientSession::open(&state.config.client_settings()).await?;
        let report = rfid_report(&session, &state.config.report_settings(), &request).await?;
        session.close().await;
        Ok::<_, WorkflowError>(sink.render(&report)?)
    }
    .await;

    match rendered {
        Ok(body) => HttpResponse::Ok()
            .content_type(sink.content_type())
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", sink.file_name()),
            ))
            .body(body),
        Err(error) => workflow_error_response(error),
    }
}

#[post("/rfid-tags")]
async fn rfid_tags_endpoint(state: web::Data<ApiState>) -> HttpResponse {
    let tags = async {
        let session = ClientSession::open(&state.config.client_settings()).await?;
        let tags = rfid_tags(&session).await?;
        session.close().await;
        Ok::<_, WorkflowError>(tags)
    }
    .await;

    match tags {
        Ok(tags) => HttpResponse::Ok().json(TagsResponse { tags }),
        Err(error) => workflow_error_response(error),
    }
}

fn parse_form_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("{field} must be a date in YYYY-MM-DD format")),
        None => Ok(None),
    }
}

fn workflow_error_response(error: WorkflowError) -> HttpResponse {
    let body = serde_json::json!({ "error": error.to_string() });
    match &error {
        WorkflowError::NoChargePoints => HttpResponse::NotFound().json(body),
        WorkflowError::Client(ClientError::Auth(_)) => {
            tracing::warn!(error = %error, "upstream authentication failed");
            HttpResponse::Unauthorized().json(body)
        }
        WorkflowError::Client(ClientError::Api { .. } | ClientError::Decode(_)) => {
            tracing::warn!(error = %error, "upstream api call failed");
            HttpResponse::BadGateway().json(body)
        }
        WorkflowError::Client(ClientError::Network(_)) => {
            tracing::warn!(error = %error, "upstream api unreachable");
            HttpResponse::GatewayTimeout().json(body)
        }
        WorkflowError::Report(_) => {
            tracing::error!(error = %error, "report rendering failed");
            HttpResponse::InternalServerError().json(body)
        }
    }
}
