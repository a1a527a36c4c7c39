use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::models::ChargingSession;
use crate::domain::timestamp::format_api_timestamp;

/// RFID value the backend reports for an unused tag slot.
pub const UNUSED_RFID_SLOT: &str = "00000000000000";

/// Optional time bounds passed to the session listing endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl SessionWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Calendar dates become midnight bounds, so the end date itself is excluded.
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start: start.map(|date| date.and_time(chrono::NaiveTime::MIN)),
            end: end.map(|date| date.and_time(chrono::NaiveTime::MIN)),
        }
    }

    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = &self.start {
            params.push(("startTime", format_api_timestamp(start)));
        }
        if let Some(end) = &self.end {
            params.push(("endTime", format_api_timestamp(end)));
        }
        params
    }
}

pub fn retain_rfid(sessions: Vec<ChargingSession>, rfid: &str) -> Vec<ChargingSession> {
    sessions
        .into_iter()
        .filter(|session| session.rfid == rfid)
        .collect()
}

/// Distinct tags in first-seen order, without the unused-slot sentinel.
pub fn distinct_rfid_tags(sessions: &[ChargingSession]) -> Vec<String> {
    let mut seen = HashSet::new();
    sessions
        .iter()
        .map(|session| session.rfid.as_str())
        .filter(|rfid| *rfid != UNUSED_RFID_SLOT)
        .filter(|rfid| seen.insert(*rfid))
        .map(str::to_string)
        .collect()
}
