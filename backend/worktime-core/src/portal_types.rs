// src/portal_types.rs
//
// Wire shapes of the HR portal and their conversion into the engine's
// typed records. The portal is loose about numbers and booleans, so the
// fields the engine relies on go through the lenient helpers below.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::attendance::{DayRecord, PendingRequestRecord, RegEntry};
use crate::time_format::{format_portal_date, parse_clock, parse_portal_date};

/// Acknowledgement code of an accepted leave request.
pub const LEAVE_SUCCESS_CODE: i64 = 7000;

// --- Lenient field helpers ---

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn value_as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        other => value_as_bool(other),
    }
}

/// Integer from a number or a numeric string; anything else is 0.
pub fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_i64(&value).unwrap_or(0))
}

pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_bool(&value))
}

/// Seconds from a number or numeric string. Missing or unreadable is `None`.
pub fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_i64(&value))
}

/// Non-empty string, numbers rendered as text.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// --- Session ---

/// Identifiers needed on every portal call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    #[serde(rename = "hrId")]
    pub hr_id: String,
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
    #[serde(rename = "userId")]
    pub user_id: String,
}

// --- Week list ---

#[derive(Debug, Clone, Default, Deserialize)]
struct FirstInLastOut {
    #[serde(default, deserialize_with = "lenient_string")]
    ftime: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WeekDay {
    #[serde(rename = "isToday", default, deserialize_with = "lenient_bool")]
    is_today: bool,
    #[serde(default)]
    filo: Option<FirstInLastOut>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekListResponse {
    #[serde(rename = "dayList", default)]
    pub day_list: Map<String, Value>,
}

impl WeekListResponse {
    /// First check-in of the day flagged `isToday`, if any.
    pub fn today_check_in(&self) -> Option<NaiveTime> {
        let today = self
            .day_list
            .values()
            .filter_map(|value| serde_json::from_value::<WeekDay>(value.clone()).ok())
            .find(|day| day.is_today)?;
        today
            .filo
            .and_then(|filo| filo.ftime)
            .and_then(|ftime| parse_clock(&ftime))
    }
}

// --- Range detail ---

#[derive(Debug, Clone, Default, Deserialize)]
struct RawRegDetail {
    #[serde(default, deserialize_with = "lenient_string")]
    fromdate: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    todate: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    totalhrs: Option<i64>,
    #[serde(rename = "isHoliday", default, deserialize_with = "lenient_bool")]
    is_holiday: bool,
    #[serde(rename = "isWeekend", default, deserialize_with = "lenient_bool")]
    is_weekend: bool,
    #[serde(rename = "isPaidLeave", default, deserialize_with = "lenient_bool")]
    is_paid_leave: bool,
}

impl RawRegDetail {
    fn into_day(self, date: NaiveDate) -> DayRecord {
        DayRecord {
            date,
            check_in: self.fromdate.as_deref().and_then(parse_clock),
            check_out: self.todate.as_deref().and_then(parse_clock),
            total_seconds: self.totalhrs,
            is_holiday: self.is_holiday,
            is_weekend: self.is_weekend,
            is_paid_leave: self.is_paid_leave,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeDetailResponse {
    #[serde(rename = "regDetails", default)]
    pub reg_details: Map<String, Value>,
}

impl RangeDetailResponse {
    /// Map entries in source order. Keys that are not portal dates, or
    /// values that are not objects, become aggregates.
    pub fn entries(&self) -> Vec<RegEntry> {
        self.reg_details
            .iter()
            .map(|(key, value)| {
                let date = parse_portal_date(key);
                match (date, value) {
                    (Some(date), Value::Object(_)) => {
                        match serde_json::from_value::<RawRegDetail>(value.clone()) {
                            Ok(raw) => RegEntry::Day(raw.into_day(date)),
                            Err(e) => {
                                debug!("Unreadable day entry '{}': {}", key, e);
                                RegEntry::Aggregate { key: key.clone() }
                            }
                        }
                    }
                    _ => RegEntry::Aggregate { key: key.clone() },
                }
            })
            .collect()
    }
}

// --- Pending requests ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingRequestsResponse {
    #[serde(default)]
    pub list: Vec<PendingRequestRecord>,
}

// --- Day record ack ---

#[derive(Debug, Clone, Deserialize)]
struct ServiceMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    message: Option<String>,
}

/// Raw acknowledgement of a corrective day record. The portal does not
/// document its shape; a list of `{message}` objects or a truthy `error`
/// field means the record was refused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayRecordAck(pub Value);

impl DayRecordAck {
    pub fn rejection(&self) -> Option<String> {
        match &self.0 {
            Value::Array(items) if !items.is_empty() => {
                let messages: Vec<String> = items
                    .iter()
                    .filter_map(|item| serde_json::from_value::<ServiceMessage>(item.clone()).ok())
                    .filter_map(|item| item.message)
                    .collect();
                if messages.is_empty() {
                    Some("Request refused".to_string())
                } else {
                    Some(messages.join("; "))
                }
            }
            Value::Object(fields) => match fields.get("error") {
                Some(error) if is_truthy(error) => {
                    let text = match error {
                        Value::String(s) => s.clone(),
                        other => fields
                            .get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| other.to_string()),
                    };
                    Some(text)
                }
                _ => None,
            },
            _ => None,
        }
    }
}

// --- Leave ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTypeOption {
    #[serde(rename = "Id", default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveData {
    #[serde(rename = "Options", default)]
    pub options: Vec<LeaveTypeOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTypesResponse {
    #[serde(default)]
    pub leave_data: LeaveData,
}

impl LeaveTypesResponse {
    /// `(id, name)` pairs; options without an id are dropped.
    pub fn types(&self) -> Vec<(String, String)> {
        self.leave_data
            .options
            .iter()
            .filter_map(|option| option.id.clone().map(|id| (id, option.value.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveAck {
    #[serde(default, deserialize_with = "lenient_int")]
    pub code: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeaveSubmitResponse {
    Errors(Vec<LeaveError>),
    Ack(LeaveAck),
}

impl LeaveSubmitResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, LeaveSubmitResponse::Ack(LeaveAck { code }) if *code == LEAVE_SUCCESS_CODE)
    }

    pub fn failure_message(&self) -> Option<String> {
        match self {
            _ if self.is_success() => None,
            LeaveSubmitResponse::Ack(ack) => Some(format!("Unexpected response code {}", ack.code)),
            LeaveSubmitResponse::Errors(errors) => Some(
                errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum LeaveSession {
    FullDay,
    FirstHalf,
    SecondHalf,
}

impl LeaveSession {
    pub fn code(&self) -> u8 {
        match self {
            LeaveSession::FullDay => 0,
            LeaveSession::FirstHalf => 1,
            LeaveSession::SecondHalf => 2,
        }
    }

    pub fn days_taken(&self) -> f64 {
        match self {
            LeaveSession::FullDay => 1.0,
            LeaveSession::FirstHalf | LeaveSession::SecondHalf => 0.5,
        }
    }
}

/// A single-day leave application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub date: NaiveDate,
    pub leave_type_id: String,
    pub session: LeaveSession,
}

impl LeaveRequest {
    pub fn portal_date(&self) -> String {
        format_portal_date(self.date)
    }

    /// `{"<date>": {"LeaveCount": .., "Session": ..}}`
    pub fn day_details(&self) -> Value {
        let mut details = Map::new();
        details.insert(
            self.portal_date(),
            serde_json::json!({
                "LeaveCount": self.session.days_taken(),
                "Session": self.session.code(),
            }),
        );
        Value::Object(details)
    }
}
