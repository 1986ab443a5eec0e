// src/portal_client.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::{form_urlencoded, Url};

use crate::pay_cycle::DateRange;
use crate::policy::CorrectionWindow;
use crate::portal_types::{
    DayRecordAck, LeaveRequest, LeaveSubmitResponse, LeaveTypesResponse, PendingRequestsResponse,
    RangeDetailResponse, SessionCredentials, WeekListResponse,
};
use crate::time_format::format_portal_date;

pub const DEFAULT_PORTAL_BASE_URL: &str = "https://people.zoho.com";
pub const DEFAULT_SIGN_IN_URL: &str = "https://accounts.zoho.com/signin?servicename=zohopeople&signupurl=https://www.zoho.com/people/signup.html";
pub const DEFAULT_LEAVE_FORM_ID: &str = "leaveForm";

pub const ATTENDANCE_VIEW_ACTION: &str = "AttendanceViewAction.zp";
pub const ATTENDANCE_ACTION: &str = "AttendanceAction.zp";
pub const LEAVE_TYPES_ACTION: &str = "AutoSuggestAction.zp";
pub const LEAVE_SUBMIT_ACTION: &str = "LeaveAction.zp";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

// --- Error Type ---

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    #[error("JSON processing error")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error")]
    UrlParse(#[from] url::ParseError),

    #[error("Portal API error: Status={status}, Message='{message}'")]
    ApiError { status: StatusCode, message: String },
}

// --- Capability ---

/// The HR portal as seen by the orchestration layer. Every call is an
/// authenticated form POST scoped to the session's tenant and employee.
#[async_trait]
pub trait AttendanceService: Send + Sync {
    async fn fetch_week_list(
        &self,
        session: &SessionCredentials,
    ) -> Result<WeekListResponse, PortalError>;

    async fn fetch_range_detail(
        &self,
        session: &SessionCredentials,
        range: &DateRange,
    ) -> Result<RangeDetailResponse, PortalError>;

    async fn fetch_pending_requests(
        &self,
        session: &SessionCredentials,
        range: &DateRange,
    ) -> Result<PendingRequestsResponse, PortalError>;

    async fn submit_day_record(
        &self,
        session: &SessionCredentials,
        date: NaiveDate,
        window: CorrectionWindow,
    ) -> Result<DayRecordAck, PortalError>;

    async fn fetch_leave_types(
        &self,
        session: &SessionCredentials,
    ) -> Result<LeaveTypesResponse, PortalError>;

    async fn submit_leave_request(
        &self,
        session: &SessionCredentials,
        request: &LeaveRequest,
    ) -> Result<LeaveSubmitResponse, PortalError>;
}

// --- Configuration ---

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base_url: String,
    pub sign_in_url: String,
    /// Raw `Cookie` header of the signed-in browser session.
    pub cookie_header: Option<String>,
    pub leave_form_id: String,
    /// No timeout unless configured.
    pub request_timeout_secs: Option<u64>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PORTAL_BASE_URL.to_string(),
            sign_in_url: DEFAULT_SIGN_IN_URL.to_string(),
            cookie_header: None,
            leave_form_id: DEFAULT_LEAVE_FORM_ID.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl PortalConfig {
    pub fn action_url(&self, hr_id: &str, action: &str) -> Result<Url, PortalError> {
        let url = format!("{}/{}/{}", self.base_url.trim_end_matches('/'), hr_id, action);
        Ok(Url::parse(&url)?)
    }

    /// Page listing the user's regularization requests.
    pub fn regularization_url(&self, hr_id: &str) -> String {
        format!(
            "{}/{}/zp#attendance/entry/regularization",
            self.base_url.trim_end_matches('/'),
            hr_id
        )
    }
}

// --- Form parameters ---

pub type FormParams = Vec<(&'static str, String)>;

/// `application/x-www-form-urlencoded` body for `params`, in order.
pub fn encode_form(params: &FormParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())))
        .finish()
}

pub fn week_list_params(session: &SessionCredentials) -> FormParams {
    vec![
        ("mode", "getAttList".to_string()),
        ("conreqcsr", session.csrf_token.clone()),
        ("loadToday", "false".to_string()),
        ("view", "week".to_string()),
        ("preMonth", "0".to_string()),
        ("weekStarts", "1".to_string()),
    ]
}

pub fn range_detail_params(session: &SessionCredentials, range: &DateRange) -> FormParams {
    vec![
        ("mode", "getAttFiloInfo".to_string()),
        ("conreqcsr", session.csrf_token.clone()),
        ("isAddRegRequest", "true".to_string()),
        ("fromDate", range.portal_from()),
        ("toDate", range.portal_to()),
        ("erecno", session.user_id.clone()),
    ]
}

pub fn pending_requests_params(session: &SessionCredentials, range: &DateRange) -> FormParams {
    vec![
        ("mode", "getMyRequest".to_string()),
        ("conreqcsr", session.csrf_token.clone()),
        ("sDate", range.portal_from()),
        ("eDate", range.portal_to()),
        ("erecno", serde_json::json!([session.user_id]).to_string()),
    ]
}

pub fn day_record_params(
    session: &SessionCredentials,
    date: NaiveDate,
    window: CorrectionWindow,
) -> FormParams {
    let day = format_portal_date(date);
    let mut data = serde_json::Map::new();
    data.insert(
        day.clone(),
        serde_json::json!({
            "fromDate": day,
            "toDate": day,
            "ftime": window.from_minutes,
            "ttime": window.to_minutes,
        }),
    );
    vec![
        ("mode", "bulkAttendReg".to_string()),
        ("conreqcsr", session.csrf_token.clone()),
        ("fdate", day),
        ("dataObj", serde_json::Value::Object(data).to_string()),
        ("erecno", session.user_id.clone()),
    ]
}

pub fn leave_types_params(session: &SessionCredentials) -> FormParams {
    vec![
        ("key", "leavetype_appl".to_string()),
        ("conreqcsr", session.csrf_token.clone()),
        ("erecno", session.user_id.clone()),
    ]
}

pub fn leave_submit_params(
    session: &SessionCredentials,
    form_id: &str,
    request: &LeaveRequest,
) -> FormParams {
    let day = request.portal_date();
    vec![
        ("zp_formId", form_id.to_string()),
        ("conreqcsr", session.csrf_token.clone()),
        ("erecno", session.user_id.clone()),
        ("Leavetype", request.leave_type_id.clone()),
        ("From", day.clone()),
        ("To", day),
        ("Daystaken", request.session.days_taken().to_string()),
        ("dayDetails", request.day_details().to_string()),
    ]
}

// --- Client ---

#[derive(Clone)]
pub struct PortalClient {
    config: Arc<PortalConfig>,
    http_client: Client,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self, PortalError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn build_form_request(
        &self,
        session: &SessionCredentials,
        action: &str,
        params: &FormParams,
    ) -> Result<RequestBuilder, PortalError> {
        let url = self.config.action_url(&session.hr_id, action)?;

        let mut request = self
            .http_client
            .post(url)
            .body(encode_form(params))
            .header(ACCEPT, "*/*")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "same-origin");
        if let Some(cookie) = &self.config.cookie_header {
            request = request.header(COOKIE, cookie);
        }
        Ok(request)
    }

    pub async fn send_and_deserialize<T: DeserializeOwned>(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<T, PortalError> {
        let request = request_builder.build().map_err(|e| {
            error!("Request build failed for '{}': {}", context_msg, e);
            PortalError::Request(e)
        })?;
        let request_url = request.url().to_string();
        debug!("Sending request for '{}' to URL: {}", context_msg, request_url);

        let resp = self.http_client.execute(request).await.map_err(|e| {
            error!(
                "HTTP execution failed before receiving response for '{}' (URL: {}): {}",
                context_msg, request_url, e
            );
            PortalError::Request(e)
        })?;

        let status = resp.status();
        info!(
            "Received response for '{}' (URL: {}): Status={}",
            context_msg, request_url, status
        );

        if !status.is_success() {
            let message = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
            error!(
                "API Error Response: Status={}, Body='{}' for URL: {}",
                status, message, request_url
            );
            return Err(PortalError::ApiError { status, message });
        }

        let bytes = resp.bytes().await.map_err(|e| {
            error!("Failed to read response body bytes for '{}': {}", context_msg, e);
            PortalError::Request(e)
        })?;

        match std::str::from_utf8(&bytes) {
            Ok(text) => debug!("Raw Success Response Body for '{}': {}", context_msg, text),
            Err(_) => {
                warn!(
                    "Response body for '{}' is not valid UTF-8. Logging hex.",
                    context_msg
                );
                debug!(
                    "Raw Success Response Body (Hex) for '{}': {}",
                    context_msg,
                    hex::encode(&bytes)
                );
            }
        }

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            error!(
                "JSON deserialization failed for '{}' (URL: {}): {}",
                context_msg, request_url, e
            );
            PortalError::Json(e)
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        session: &SessionCredentials,
        action: &str,
        params: FormParams,
        context_msg: &str,
    ) -> Result<T, PortalError> {
        let request = self.build_form_request(session, action, &params)?;
        self.send_and_deserialize(request, context_msg).await
    }
}

#[async_trait]
impl AttendanceService for PortalClient {
    async fn fetch_week_list(
        &self,
        session: &SessionCredentials,
    ) -> Result<WeekListResponse, PortalError> {
        self.post_form(
            session,
            ATTENDANCE_VIEW_ACTION,
            week_list_params(session),
            "week list",
        )
        .await
    }

    async fn fetch_range_detail(
        &self,
        session: &SessionCredentials,
        range: &DateRange,
    ) -> Result<RangeDetailResponse, PortalError> {
        self.post_form(
            session,
            ATTENDANCE_ACTION,
            range_detail_params(session, range),
            "range detail",
        )
        .await
    }

    async fn fetch_pending_requests(
        &self,
        session: &SessionCredentials,
        range: &DateRange,
    ) -> Result<PendingRequestsResponse, PortalError> {
        self.post_form(
            session,
            ATTENDANCE_ACTION,
            pending_requests_params(session, range),
            "pending requests",
        )
        .await
    }

    async fn submit_day_record(
        &self,
        session: &SessionCredentials,
        date: NaiveDate,
        window: CorrectionWindow,
    ) -> Result<DayRecordAck, PortalError> {
        let context = format!("day record {}", format_portal_date(date));
        self.post_form(
            session,
            ATTENDANCE_ACTION,
            day_record_params(session, date, window),
            &context,
        )
        .await
    }

    async fn fetch_leave_types(
        &self,
        session: &SessionCredentials,
    ) -> Result<LeaveTypesResponse, PortalError> {
        self.post_form(
            session,
            LEAVE_TYPES_ACTION,
            leave_types_params(session),
            "leave types",
        )
        .await
    }

    async fn submit_leave_request(
        &self,
        session: &SessionCredentials,
        request: &LeaveRequest,
    ) -> Result<LeaveSubmitResponse, PortalError> {
        let params = leave_submit_params(session, &self.config.leave_form_id, request);
        self.post_form(session, LEAVE_SUBMIT_ACTION, params, "leave request")
            .await
    }
}
