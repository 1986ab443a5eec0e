// src/controller.rs
//
// Orchestration of one user session: fetch, analyse, persist, and submit.
// Calls are issued one after another; nothing is retried.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::attendance::RegEntry;
use crate::attendance_analysis::{AttendanceAnalyzer, DeficiencySummary, RemediationCandidate};
use crate::auth_manager::AuthManager;
use crate::browser_host::BrowserHost;
use crate::clock::Clock;
use crate::error::{describe, AppError};
use crate::live_projection::{project_remaining_time, LiveProjection};
use crate::pay_cycle::{analysis_range, report_date, shows_month_transition_note, DateRange};
use crate::policy::{CorrectionWindow, WorkSchedulePolicy};
use crate::portal_client::{AttendanceService, PortalConfig, PortalError};
use crate::portal_types::{
    LeaveRequest, PendingRequestsResponse, RangeDetailResponse, SessionCredentials,
};
use crate::request_limit::RequestLimitGuard;
use crate::storage::{get_typed, keys, set_typed, KeyValueStore};
use crate::time_format::format_portal_date;

pub const TIME_NOT_FOUND: &str = "Time not found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatus {
    Projection(LiveProjection),
    /// No check-in recorded for today.
    TimeNotFound,
}

/// Outcome of one analysis cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub range: DateRange,
    pub summary: DeficiencySummary,
    pub outstanding_requests: usize,
    pub request_limit: usize,
    pub limit_reached: bool,
    pub top_dates: Vec<NaiveDate>,
    pub live: LiveStatus,
    pub report_date: NaiveDate,
    pub month_transition_note: bool,
    pub regularization_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationPlan {
    /// No deficient day left to correct.
    NothingToLog,
    Ready(Vec<RemediationCandidate>),
}

#[derive(Debug)]
pub struct SubmissionOutcome {
    pub date: NaiveDate,
    pub result: Result<(), AppError>,
}

impl SubmissionOutcome {
    pub fn is_logged(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct AppController {
    service: Arc<dyn AttendanceService>,
    host: Arc<dyn BrowserHost>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    auth: AuthManager,
    policy: WorkSchedulePolicy,
    portal: PortalConfig,
}

impl AppController {
    pub fn new(
        service: Arc<dyn AttendanceService>,
        host: Arc<dyn BrowserHost>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: WorkSchedulePolicy,
        portal: PortalConfig,
    ) -> Result<Self, AppError> {
        let portal_origin = Url::parse(&portal.base_url).map_err(PortalError::from)?;
        let auth = AuthManager::new(host.clone(), store.clone(), portal_origin);
        Ok(Self {
            service,
            host,
            store,
            clock,
            auth,
            policy,
            portal,
        })
    }

    pub fn policy(&self) -> &WorkSchedulePolicy {
        &self.policy
    }

    fn guard(&self) -> RequestLimitGuard {
        RequestLimitGuard::from_policy(&self.policy)
    }

    // --- Analysis cycle ---

    /// Runs the full analysis. Any failure is taken as an expired session:
    /// the store is cleared, the tab reloaded and `CredentialsMissing`
    /// returned.
    pub async fn calculate_time(&self) -> Result<CycleReport, AppError> {
        match self.run_cycle().await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Error calculating time: {:?}", e);
                if let Err(reset_err) = self.reset_session().await {
                    error!("Session reset failed: {:?}", reset_err);
                }
                Err(match e {
                    AppError::CredentialsMissing(reason) => AppError::CredentialsMissing(reason),
                    other => AppError::CredentialsMissing(describe(&other)),
                })
            }
        }
    }

    async fn run_cycle(&self) -> Result<CycleReport, AppError> {
        let session = self.auth.get_credentials().await?;

        let week = self.service.fetch_week_list(&session).await?;

        let today = self.clock.today();
        let range = analysis_range(today);
        info!(
            "Analysing {} to {} for employee {}",
            range.portal_from(),
            range.portal_to(),
            session.user_id
        );

        let detail = self.service.fetch_range_detail(&session, &range).await?;
        set_typed(self.store.as_ref(), keys::RANGE_DETAIL, &detail).await?;

        let pending = self.service.fetch_pending_requests(&session, &range).await?;
        set_typed(self.store.as_ref(), keys::PENDING_REQUESTS, &pending).await?;

        let entries = detail.entries();
        let analyzer = AttendanceAnalyzer::new(&self.policy, today);
        let summary = analyzer.summarize(&entries);
        let outstanding_requests = RequestLimitGuard::count_outstanding(&pending.list);

        let top_dates = analyzer.top_remediation_dates(
            &entries,
            &pending.list,
            self.policy.auto_remediation_count,
        );
        let top_keys: Vec<String> = top_dates.iter().copied().map(format_portal_date).collect();
        set_typed(self.store.as_ref(), keys::TOP_REMEDIATION_DATES, &top_keys).await?;

        let limit_reached = self.guard().check_and_handle_request_limit(&pending.list);
        let regularization_url = self.portal.regularization_url(&session.hr_id);
        if limit_reached {
            warn!("See {} for the requests already filed", regularization_url);
        }

        let live = match week.today_check_in() {
            Some(check_in) => LiveStatus::Projection(project_remaining_time(
                check_in,
                self.clock.time_of_day(),
                &self.policy,
            )),
            None => {
                debug!("No check-in found for today");
                LiveStatus::TimeNotFound
            }
        };

        Ok(CycleReport {
            range,
            summary,
            outstanding_requests,
            request_limit: self.guard().limit(),
            limit_reached,
            top_dates,
            live,
            report_date: report_date(today),
            month_transition_note: shows_month_transition_note(today),
            regularization_url,
        })
    }

    // --- Remediation ---

    async fn stored_pending(&self) -> Result<PendingRequestsResponse, AppError> {
        Ok(get_typed(self.store.as_ref(), keys::PENDING_REQUESTS)
            .await?
            .unwrap_or_default())
    }

    async fn stored_entries(&self) -> Result<Vec<RegEntry>, AppError> {
        let detail: Option<RangeDetailResponse> =
            get_typed(self.store.as_ref(), keys::RANGE_DETAIL).await?;
        match detail {
            Some(detail) => Ok(detail.entries()),
            None => {
                info!("No attendance data available. Please calculate time first.");
                Err(AppError::AnalysisUnavailable)
            }
        }
    }

    /// Quota first, then the candidate list from the last stored snapshot.
    async fn plan(&self, limit: Option<usize>) -> Result<RemediationPlan, AppError> {
        let pending = self.stored_pending().await?;
        self.guard().ensure_available(&pending.list)?;

        let entries = self.stored_entries().await?;
        let analyzer = AttendanceAnalyzer::new(&self.policy, self.clock.today());
        let mut candidates = analyzer.remediation_candidates(&entries, &pending.list);
        if let Some(n) = limit {
            candidates.truncate(n);
        }

        if candidates.is_empty() {
            info!("No dates to log attendance for");
            Ok(RemediationPlan::NothingToLog)
        } else {
            Ok(RemediationPlan::Ready(candidates))
        }
    }

    /// The `auto_remediation_count` shortest days.
    pub async fn plan_auto_remediation(&self) -> Result<RemediationPlan, AppError> {
        self.plan(Some(self.policy.auto_remediation_count)).await
    }

    /// Every day below a full day.
    pub async fn plan_manual_remediation(&self) -> Result<RemediationPlan, AppError> {
        self.plan(None).await
    }

    /// Submits one correction per date. A failed date does not stop the
    /// others; each outcome is reported on its own.
    pub async fn log_attendance_for_dates(
        &self,
        dates: &[NaiveDate],
    ) -> Result<Vec<SubmissionOutcome>, AppError> {
        let pending = self.stored_pending().await?;
        self.guard().ensure_available(&pending.list)?;
        let session = self.auth.get_credentials().await?;
        let window = self.policy.correction_window();

        let mut outcomes = Vec::with_capacity(dates.len());
        for &date in dates {
            let result = self.submit_one(&session, date, window).await;
            match &result {
                Ok(()) => info!("Attendance logged for {}", format_portal_date(date)),
                Err(e) => warn!(
                    "Attendance for {} not logged: {}",
                    format_portal_date(date),
                    describe(e)
                ),
            }
            outcomes.push(SubmissionOutcome { date, result });
        }
        Ok(outcomes)
    }

    async fn submit_one(
        &self,
        session: &SessionCredentials,
        date: NaiveDate,
        window: CorrectionWindow,
    ) -> Result<(), AppError> {
        let ack = self.service.submit_day_record(session, date, window).await?;
        debug!("Day record ack for {}: {:?}", format_portal_date(date), ack);
        match ack.rejection() {
            Some(message) => Err(AppError::RemoteRejected {
                item: format_portal_date(date),
                message,
            }),
            None => Ok(()),
        }
    }

    // --- Leave ---

    /// `(id, name)` of the leave types the employee may apply for.
    pub async fn leave_types(&self) -> Result<Vec<(String, String)>, AppError> {
        let session = self.auth.get_credentials().await?;
        let response = self.service.fetch_leave_types(&session).await?;
        Ok(response.types())
    }

    pub async fn apply_leave(&self, request: &LeaveRequest) -> Result<(), AppError> {
        let session = self.auth.get_credentials().await?;
        let response = self.service.submit_leave_request(&session, request).await?;
        match response.failure_message() {
            None => {
                info!("Leave applied for {}", request.portal_date());
                Ok(())
            }
            Some(message) => Err(AppError::RemoteRejected {
                item: format!("leave on {}", request.portal_date()),
                message,
            }),
        }
    }

    // --- Session ---

    pub async fn go_to_portal(&self) -> Result<(), AppError> {
        self.host.navigate_active_tab(&self.portal.sign_in_url).await?;
        Ok(())
    }

    /// Wipes all persisted state and reloads the active tab.
    pub async fn reset_session(&self) -> Result<(), AppError> {
        self.store.clear().await?;
        self.host.reload_active_tab().await?;
        info!("Page refreshed due to authentication issues");
        Ok(())
    }
}
