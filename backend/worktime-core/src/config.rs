// src/config.rs
//
// Environment-driven settings. `.env` is loaded first; portal/session values
// use the `WORKTIME_` prefix, schedule overrides `WORKTIME_POLICY_`.

use chrono::NaiveTime;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::auth_manager::CSRF_COOKIE_NAME;
use crate::browser_host::{parse_cookie_header, SessionHostSettings};
use crate::policy::{PolicyError, WorkSchedulePolicy};
use crate::portal_client::{
    PortalConfig, DEFAULT_LEAVE_FORM_ID, DEFAULT_PORTAL_BASE_URL, DEFAULT_SIGN_IN_URL,
};
use crate::time_format::parse_clock;

pub const SESSION_ENV_PREFIX: &str = "WORKTIME_";
pub const POLICY_ENV_PREFIX: &str = "WORKTIME_POLICY_";
pub const DEFAULT_STORE_PATH: &str = "./worktime_state.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment configuration error")]
    Env(#[from] envy::Error),

    #[error("Invalid work schedule")]
    Policy(#[from] PolicyError),
}

fn default_base_url() -> String {
    DEFAULT_PORTAL_BASE_URL.to_string()
}

fn default_sign_in_url() -> String {
    DEFAULT_SIGN_IN_URL.to_string()
}

fn default_leave_form_id() -> String {
    DEFAULT_LEAVE_FORM_ID.to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Session values exported from the signed-in browser.
#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    #[serde(default = "default_base_url")]
    pub portal_base_url: String,
    #[serde(default = "default_sign_in_url")]
    pub sign_in_url: String,
    /// URL of the portal page the user has open.
    pub page_url: Option<String>,
    pub cookie_header: Option<String>,
    /// Value of the CSRF cookie when it is not part of `cookie_header`.
    pub csrf_token: Option<String>,
    pub employee_id: Option<String>,
    pub login_user_zuid: Option<String>,
    #[serde(default = "default_leave_form_id")]
    pub leave_form_id: String,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    pub request_timeout_secs: Option<u64>,
}

impl SessionSettings {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::prefixed(SESSION_ENV_PREFIX).from_env::<SessionSettings>()
    }

    /// Cookie header with the CSRF cookie added when it was given separately.
    pub fn effective_cookie_header(&self) -> Option<String> {
        let header = self.cookie_header.clone().filter(|h| !h.trim().is_empty());
        let has_csrf = header
            .as_deref()
            .map(|h| parse_cookie_header(h).iter().any(|c| c.name == CSRF_COOKIE_NAME))
            .unwrap_or(false);
        match (&self.csrf_token, header) {
            (Some(token), Some(header)) if !has_csrf => {
                Some(format!("{}; {}={}", header, CSRF_COOKIE_NAME, token))
            }
            (Some(token), None) => Some(format!("{}={}", CSRF_COOKIE_NAME, token)),
            (_, header) => header,
        }
    }

    pub fn portal_origin(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.portal_base_url)
    }

    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig {
            base_url: self.portal_base_url.clone(),
            sign_in_url: self.sign_in_url.clone(),
            cookie_header: self.effective_cookie_header(),
            leave_form_id: self.leave_form_id.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }

    pub fn host_settings(&self) -> SessionHostSettings {
        SessionHostSettings {
            page_url: self.page_url.clone(),
            cookie_header: self.effective_cookie_header(),
            employee_id: self.employee_id.clone(),
            login_user_zuid: self.login_user_zuid.clone(),
        }
    }
}

/// Optional schedule overrides. Times are `HH:MM`, durations seconds.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct PolicyOverrides {
    pub shift_start: Option<String>,
    pub shift_end: Option<String>,
    pub lunch_start: Option<String>,
    pub lunch_end: Option<String>,
    pub late_start_threshold: Option<String>,
    pub correction_check_in: Option<String>,
    pub correction_check_out: Option<String>,
    pub standard_work_seconds: Option<i64>,
    pub limited_work_seconds: Option<i64>,
    pub full_day_threshold_seconds: Option<i64>,
    pub partial_day_threshold_seconds: Option<i64>,
    pub auto_remediation_count: Option<usize>,
    pub monthly_request_limit: Option<usize>,
}

fn override_clock(
    field: &'static str,
    value: &Option<String>,
    target: &mut NaiveTime,
) -> Result<(), PolicyError> {
    if let Some(raw) = value {
        *target = parse_clock(raw).ok_or_else(|| PolicyError::InvalidClock {
            field,
            value: raw.clone(),
        })?;
    }
    Ok(())
}

impl PolicyOverrides {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed(POLICY_ENV_PREFIX).from_env::<PolicyOverrides>()
    }

    /// Applies the overrides on top of `base` and validates the result.
    pub fn apply(&self, base: WorkSchedulePolicy) -> Result<WorkSchedulePolicy, PolicyError> {
        let mut policy = base;
        override_clock("shift_start", &self.shift_start, &mut policy.shift_start)?;
        override_clock("shift_end", &self.shift_end, &mut policy.shift_end)?;
        override_clock("lunch_start", &self.lunch_start, &mut policy.lunch_start)?;
        override_clock("lunch_end", &self.lunch_end, &mut policy.lunch_end)?;
        override_clock(
            "late_start_threshold",
            &self.late_start_threshold,
            &mut policy.late_start_threshold,
        )?;
        override_clock(
            "correction_check_in",
            &self.correction_check_in,
            &mut policy.correction_check_in,
        )?;
        override_clock(
            "correction_check_out",
            &self.correction_check_out,
            &mut policy.correction_check_out,
        )?;

        if let Some(v) = self.standard_work_seconds {
            policy.standard_work_seconds = v;
        }
        if let Some(v) = self.limited_work_seconds {
            policy.limited_work_seconds = v;
        }
        if let Some(v) = self.full_day_threshold_seconds {
            policy.full_day_threshold_seconds = v;
        }
        if let Some(v) = self.partial_day_threshold_seconds {
            policy.partial_day_threshold_seconds = v;
        }
        if let Some(v) = self.auto_remediation_count {
            policy.auto_remediation_count = v;
        }
        if let Some(v) = self.monthly_request_limit {
            policy.monthly_request_limit = v;
        }

        policy.validate()?;
        Ok(policy)
    }
}

/// Default schedule with any `WORKTIME_POLICY_*` overrides applied.
pub fn load_policy() -> Result<WorkSchedulePolicy, ConfigError> {
    dotenv::dotenv().ok();
    let overrides = PolicyOverrides::from_env()?;
    let policy = overrides.apply(WorkSchedulePolicy::default())?;
    info!(
        "Work schedule: shift {}-{}, lunch {}-{}, late start after {}",
        policy.shift_start.format("%H:%M"),
        policy.shift_end.format("%H:%M"),
        policy.lunch_start.format("%H:%M"),
        policy.lunch_end.format("%H:%M"),
        policy.late_start_threshold.format("%H:%M")
    );
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_format::clock;

    fn settings() -> SessionSettings {
        SessionSettings {
            portal_base_url: default_base_url(),
            sign_in_url: default_sign_in_url(),
            page_url: None,
            cookie_header: None,
            csrf_token: None,
            employee_id: None,
            login_user_zuid: None,
            leave_form_id: default_leave_form_id(),
            store_path: default_store_path(),
            request_timeout_secs: None,
        }
    }

    #[test]
    fn session_settings_from_prefixed_vars() {
        let vars = vec![
            ("WORKTIME_PAGE_URL".to_string(), "https://people.zoho.com/hrportal1/zp".to_string()),
            ("WORKTIME_EMPLOYEE_ID".to_string(), "4711".to_string()),
            ("WORKTIME_REQUEST_TIMEOUT_SECS".to_string(), "15".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ];
        let parsed: SessionSettings = envy::prefixed(SESSION_ENV_PREFIX)
            .from_iter(vars)
            .unwrap();

        assert_eq!(parsed.portal_base_url, DEFAULT_PORTAL_BASE_URL);
        assert_eq!(parsed.employee_id.as_deref(), Some("4711"));
        assert_eq!(parsed.request_timeout_secs, Some(15));
        assert_eq!(parsed.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    }

    #[test]
    fn csrf_token_is_merged_into_cookie_header() {
        let mut s = settings();
        assert_eq!(s.effective_cookie_header(), None);

        s.csrf_token = Some("abc".to_string());
        assert_eq!(s.effective_cookie_header().as_deref(), Some("CSRF_TOKEN=abc"));

        s.cookie_header = Some("JSESSIONID=1".to_string());
        assert_eq!(
            s.effective_cookie_header().as_deref(),
            Some("JSESSIONID=1; CSRF_TOKEN=abc")
        );

        s.cookie_header = Some("CSRF_TOKEN=xyz; JSESSIONID=1".to_string());
        assert_eq!(
            s.effective_cookie_header().as_deref(),
            Some("CSRF_TOKEN=xyz; JSESSIONID=1")
        );
    }

    #[test]
    fn policy_overrides_apply_and_validate() {
        let vars = vec![
            ("WORKTIME_POLICY_SHIFT_END".to_string(), "20:00".to_string()),
            ("WORKTIME_POLICY_MONTHLY_REQUEST_LIMIT".to_string(), "5".to_string()),
        ];
        let overrides: PolicyOverrides = envy::prefixed(POLICY_ENV_PREFIX)
            .from_iter(vars)
            .unwrap();
        let policy = overrides.apply(WorkSchedulePolicy::default()).unwrap();

        assert_eq!(policy.shift_end, clock(20, 0));
        assert_eq!(policy.monthly_request_limit, 5);
        assert_eq!(policy.lunch_start, clock(12, 0));
    }

    #[test]
    fn malformed_override_is_reported() {
        let overrides = PolicyOverrides {
            lunch_end: Some("quarter past one".to_string()),
            ..Default::default()
        };
        match overrides.apply(WorkSchedulePolicy::default()) {
            Err(PolicyError::InvalidClock { field, .. }) => assert_eq!(field, "lunch_end"),
            other => panic!("Expected InvalidClock but got: {:?}", other),
        }
    }

    #[test]
    fn overrides_that_break_ordering_are_rejected() {
        let overrides = PolicyOverrides {
            lunch_start: Some("14:00".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            overrides.apply(WorkSchedulePolicy::default()),
            Err(PolicyError::OutOfOrder { .. })
        ));
    }
}
