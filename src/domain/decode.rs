use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::models::{
    ChargeAmpsUser, ChargePoint, ChargePointConnectorSettings, ChargePointPartner,
    ChargePointSchedule, ChargePointScheduleOverrideStatus, ChargePointSettings,
    ChargePointStatus, ChargingSession,
};
use crate::domain::token::TokenGrant;

/// A record type the API returns. Decoding is strict: missing required fields and
/// values failing `validate` are reported instead of being papered over.
pub trait ApiRecord: DeserializeOwned {
    const NAME: &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{record} payload does not match the expected shape: {source}")]
    Shape {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{record} payload failed validation: {reason}")]
    Invalid {
        record: &'static str,
        reason: String,
    },
    #[error("{record} list payload must be a JSON array")]
    NotAList { record: &'static str },
}

impl DecodeError {
    pub fn record(&self) -> &'static str {
        match self {
            Self::Shape { record, .. } | Self::Invalid { record, .. } | Self::NotAList { record } => {
                record
            }
        }
    }
}

pub fn decode_record<T: ApiRecord>(payload: Value) -> Result<T, DecodeError> {
    let record: T = serde_json::from_value(payload).map_err(|source| DecodeError::Shape {
        record: T::NAME,
        source,
    })?;
    record.validate().map_err(|reason| DecodeError::Invalid {
        record: T::NAME,
        reason,
    })?;
    Ok(record)
}

pub fn decode_list<T: ApiRecord>(payload: Value) -> Result<Vec<T>, DecodeError> {
    match payload {
        Value::Array(items) => items.into_iter().map(decode_record).collect(),
        _ => Err(DecodeError::NotAList { record: T::NAME }),
    }
}

fn non_negative_kwh(value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("totalConsumptionKwh must be a non-negative number, got {value}"))
    }
}

impl ApiRecord for ChargePoint {
    const NAME: &'static str = "charge point";
}

impl ApiRecord for ChargingSession {
    const NAME: &'static str = "charging session";

    fn validate(&self) -> Result<(), String> {
        non_negative_kwh(self.total_consumption_kwh)
    }
}

impl ApiRecord for ChargePointStatus {
    const NAME: &'static str = "charge point status";

    fn validate(&self) -> Result<(), String> {
        self.connector_statuses
            .iter()
            .try_for_each(|status| non_negative_kwh(status.total_consumption_kwh))
    }
}

impl ApiRecord for ChargePointSettings {
    const NAME: &'static str = "charge point settings";
}

impl ApiRecord for ChargePointConnectorSettings {
    const NAME: &'static str = "connector settings";
}

impl ApiRecord for ChargePointPartner {
    const NAME: &'static str = "charge point partner";
}

impl ApiRecord for ChargePointScheduleOverrideStatus {
    const NAME: &'static str = "schedule override status";
}

impl ApiRecord for ChargePointSchedule {
    const NAME: &'static str = "charge point schedule";

    fn validate(&self) -> Result<(), String> {
        if self.start_hours > 23 || self.end_hours > 23 {
            return Err("schedule hours must be within 0..=23".to_string());
        }
        if self.start_minutes > 59 || self.end_minutes > 59 {
            return Err("schedule minutes must be within 0..=59".to_string());
        }
        Ok(())
    }
}

impl ApiRecord for ChargeAmpsUser {
    const NAME: &'static str = "user";
}

impl ApiRecord for TokenGrant {
    const NAME: &'static str = "token grant";

    fn validate(&self) -> Result<(), String> {
        if self.token.trim().is_empty() {
            return Err("token must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DecodeError, decode_list, decode_record};
    use crate::domain::models::{ChargePoint, ChargingSession};

    fn session_payload(kwh: serde_json::Value) -> serde_json::Value {
        json!({
            "id": 1,
            "chargePointId": "cp-1",
            "connectorId": 1,
            "rfid": "9C8BE8DF",
            "sessionType": "RFID",
            "totalConsumptionKwh": kwh
        })
    }

    #[test]
    fn decodes_charge_point_with_connectors() {
        let payload = json!({
            "id": "cp-1",
            "name": "Garage",
            "password": "secret",
            "type": "HALO",
            "isLoadbalanced": false,
            "firmwareVersion": "1.2.3",
            "hardwareVersion": "A",
            "connectors": [
                {"chargePointId": "cp-1", "connectorId": 1, "type": "Type2"},
                {"chargePointId": "cp-1", "connectorId": 2, "type": "Schuko"}
            ]
        });

        let charge_point: ChargePoint = decode_record(payload).expect("charge point decodes");

        assert_eq!(charge_point.connectors.len(), 2);
        assert_eq!(charge_point.connectors[1].kind, "Schuko");
    }

    #[test]
    fn missing_required_field_is_a_shape_error_naming_the_record() {
        let result = decode_record::<ChargingSession>(json!({ "id": 1 }));

        let error = result.expect_err("decode should fail");
        assert!(matches!(error, DecodeError::Shape { .. }));
        assert_eq!(error.record(), "charging session");
    }

    #[test]
    fn negative_consumption_fails_validation() {
        let result = decode_record::<ChargingSession>(session_payload(json!(-1.5)));

        assert!(matches!(
            result,
            Err(DecodeError::Invalid {
                record: "charging session",
                ..
            })
        ));
    }

    #[test]
    fn list_decode_requires_an_array() {
        let result = decode_list::<ChargingSession>(json!({ "items": [] }));
        assert!(matches!(result, Err(DecodeError::NotAList { .. })));

        let sessions = decode_list::<ChargingSession>(json!([
            session_payload(json!(1.0)),
            session_payload(json!(0.0))
        ]))
        .expect("list decodes");
        assert_eq!(sessions.len(), 2);
    }
}
