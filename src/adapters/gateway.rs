use serde_json::json;

use crate::adapters::auth::{Authenticator, HttpAuthenticator};
use crate::adapters::http::{ClientError, HttpDispatcher};
use crate::app::services::SessionSource;
use crate::domain::decode::{decode_list, decode_record};
use crate::domain::models::{
    ChargeAmpsUser, ChargePoint, ChargePointAuth, ChargePointConnectorSettings, ChargePointIds,
    ChargePointPartner, ChargePointSchedule, ChargePointScheduleOverrideStatus,
    ChargePointSettings, ChargePointStatus, ChargingSession, StartAuth,
};
use crate::domain::session_filter::SessionWindow;

/// Typed operations of the Charge Amps external API.
pub struct ChargePointGateway<A = HttpAuthenticator> {
    dispatcher: HttpDispatcher<A>,
}

impl<A: Authenticator> ChargePointGateway<A> {
    pub fn new(dispatcher: HttpDispatcher<A>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &HttpDispatcher<A> {
        &self.dispatcher
    }

    pub async fn owned_charge_points(&self) -> Result<Vec<ChargePoint>, ClientError> {
        let payload = self.dispatcher.get("/chargepoints/owned", &[]).await?;
        Ok(decode_list(payload)?)
    }

    pub async fn charge_point_status(
        &self,
        charge_point_id: &str,
    ) -> Result<ChargePointStatus, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/status");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }

    pub async fn charge_point_settings(
        &self,
        charge_point_id: &str,
    ) -> Result<ChargePointSettings, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/settings");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }

    pub async fn set_charge_point_settings(
        &self,
        settings: &ChargePointSettings,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{}/settings", settings.id);
        self.dispatcher.put(&path, settings).await?;
        Ok(())
    }

    pub async fn connector_settings(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> Result<ChargePointConnectorSettings, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/connectors/{connector_id}/settings");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }

    pub async fn set_connector_settings(
        &self,
        settings: &ChargePointConnectorSettings,
    ) -> Result<(), ClientError> {
        let path = format!(
            "/chargepoints/{}/connectors/{}/settings",
            settings.charge_point_id, settings.connector_id
        );
        self.dispatcher.put(&path, settings).await?;
        Ok(())
    }

    pub async fn connector_sessions(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        window: &SessionWindow,
    ) -> Result<Vec<ChargingSession>, ClientError> {
        let path =
            format!("/chargepoints/{charge_point_id}/connectors/{connector_id}/chargingsessions");
        let payload = self.dispatcher.get(&path, &window.query_params()).await?;
        Ok(decode_list(payload)?)
    }

    pub async fn charge_point_sessions(
        &self,
        charge_point_id: &str,
        window: &SessionWindow,
    ) -> Result<Vec<ChargingSession>, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/chargingsessions");
        let payload = self.dispatcher.get(&path, &window.query_params()).await?;
        Ok(decode_list(payload)?)
    }

    pub async fn charging_session(
        &self,
        charge_point_id: &str,
        session_id: i64,
    ) -> Result<ChargingSession, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/chargingsessions/{session_id}");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }

    pub async fn charge_point_partner(
        &self,
        charge_point_id: &str,
    ) -> Result<ChargePointPartner, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/partner");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }

    pub async fn schedule_override_status(
        &self,
        charge_point_id: &str,
    ) -> Result<ChargePointScheduleOverrideStatus, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/schedule/override/status");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }

    pub async fn set_schedule_override(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> Result<(), ClientError> {
        let path =
            format!("/chargepoints/{charge_point_id}/connectors/{connector_id}/schedule/override");
        self.dispatcher.put(&path, &json!({})).await?;
        Ok(())
    }

    pub async fn schedules(
        &self,
        charge_point_id: &str,
    ) -> Result<Vec<ChargePointSchedule>, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/schedules");
        Ok(decode_list(self.dispatcher.get(&path, &[]).await?)?)
    }

    pub async fn schedule(
        &self,
        charge_point_id: &str,
        schedule_id: i64,
    ) -> Result<ChargePointSchedule, ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/schedules/{schedule_id}");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }

    /// CAPI chargers only.
    pub async fn create_schedule(
        &self,
        charge_point_id: &str,
        schedule: &ChargePointSchedule,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/schedules");
        self.dispatcher.post(&path, schedule).await?;
        Ok(())
    }

    /// CAPI chargers only.
    pub async fn update_schedule(
        &self,
        charge_point_id: &str,
        schedule: &ChargePointSchedule,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/schedules");
        self.dispatcher.put(&path, schedule).await?;
        Ok(())
    }

    pub async fn delete_schedule(
        &self,
        charge_point_id: &str,
        schedule_id: i64,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/schedules/{schedule_id}");
        self.dispatcher.delete(&path).await?;
        Ok(())
    }

    pub async fn remote_start(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        start_auth: &StartAuth,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/connectors/{connector_id}/remotestart");
        self.dispatcher.put(&path, start_auth).await?;
        Ok(())
    }

    pub async fn remote_stop(
        &self,
        charge_point_id: &str,
        connector_id: u32,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/connectors/{connector_id}/remotestop");
        self.dispatcher.put(&path, &json!({})).await?;
        Ok(())
    }

    pub async fn reboot(&self, charge_point_id: &str) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/reboot");
        self.dispatcher.put(&path, &json!({})).await?;
        Ok(())
    }

    pub async fn register(
        &self,
        charge_point_id: &str,
        auth: &ChargePointAuth,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/register");
        self.dispatcher.put(&path, auth).await?;
        Ok(())
    }

    pub async fn unregister(
        &self,
        charge_point_id: &str,
        auth: &ChargePointAuth,
    ) -> Result<(), ClientError> {
        let path = format!("/chargepoints/{charge_point_id}/unregister");
        self.dispatcher.put(&path, auth).await?;
        Ok(())
    }

    pub async fn enable_callbacks(&self, ids: &ChargePointIds) -> Result<(), ClientError> {
        self.dispatcher
            .put("/chargepoints/callbacks/enable", ids)
            .await?;
        Ok(())
    }

    pub async fn disable_callbacks(&self, ids: &ChargePointIds) -> Result<(), ClientError> {
        self.dispatcher
            .put("/chargepoints/callbacks/disable", ids)
            .await?;
        Ok(())
    }

    pub async fn user(&self, user_id: &str) -> Result<ChargeAmpsUser, ClientError> {
        let path = format!("/users/{user_id}");
        Ok(decode_record(self.dispatcher.get(&path, &[]).await?)?)
    }
}

impl<A: Authenticator> SessionSource for ChargePointGateway<A> {
    async fn connector_sessions(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        window: &SessionWindow,
    ) -> Result<Vec<ChargingSession>, ClientError> {
        ChargePointGateway::connector_sessions(self, charge_point_id, connector_id, window).await
    }

    async fn charge_point_sessions(
        &self,
        charge_point_id: &str,
        window: &SessionWindow,
    ) -> Result<Vec<ChargingSession>, ClientError> {
        ChargePointGateway::charge_point_sessions(self, charge_point_id, window).await
    }
}
