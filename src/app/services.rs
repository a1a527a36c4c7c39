use std::future::Future;

use crate::adapters::http::ClientError;
use crate::domain::models::ChargingSession;
use crate::domain::session_filter::{SessionWindow, distinct_rfid_tags, retain_rfid};

/// Anything that can list charging sessions for a charge point.
pub trait SessionSource: Send + Sync {
    fn connector_sessions(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        window: &SessionWindow,
    ) -> impl Future<Output = Result<Vec<ChargingSession>, ClientError>> + Send;

    fn charge_point_sessions(
        &self,
        charge_point_id: &str,
        window: &SessionWindow,
    ) -> impl Future<Output = Result<Vec<ChargingSession>, ClientError>> + Send;
}

/// Fetch-then-filter queries over a session source. Every query scans the full listing.
pub struct SessionFilterEngine<'a, S> {
    source: &'a S,
}

impl<'a, S: SessionSource> SessionFilterEngine<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub async fn sessions_by_rfid(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        rfid: &str,
        window: &SessionWindow,
    ) -> Result<Vec<ChargingSession>, ClientError> {
        let sessions = self
            .source
            .connector_sessions(charge_point_id, connector_id, window)
            .await?;
        let fetched = sessions.len();
        let matched = retain_rfid(sessions, rfid);

        tracing::debug!(
            charge_point_id,
            connector_id,
            fetched,
            matched = matched.len(),
            "filtered connector sessions by rfid"
        );
        Ok(matched)
    }

    pub async fn registered_rfid_tags(
        &self,
        charge_point_id: &str,
    ) -> Result<Vec<String>, ClientError> {
        let sessions = self
            .source
            .charge_point_sessions(charge_point_id, &SessionWindow::unbounded())
            .await?;
        Ok(distinct_rfid_tags(&sessions))
    }
}
