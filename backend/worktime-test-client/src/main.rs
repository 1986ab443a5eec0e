// src/main.rs
//
// Runs the read-only portal calls against the session exported in the
// environment and prints what comes back. Nothing is submitted.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;

use worktime_core::auth_manager::AuthManager;
use worktime_core::browser_host::SessionHost;
use worktime_core::clock::{Clock, SystemClock};
use worktime_core::config::SessionSettings;
use worktime_core::pay_cycle::analysis_range;
use worktime_core::portal_client::{
    leave_types_params, pending_requests_params, range_detail_params, week_list_params,
    FormParams, PortalClient, ATTENDANCE_ACTION, ATTENDANCE_VIEW_ACTION, LEAVE_TYPES_ACTION,
};
use worktime_core::portal_types::{
    LeaveTypesResponse, PendingRequestsResponse, RangeDetailResponse, SessionCredentials,
    WeekListResponse,
};
use worktime_core::storage::MemoryStore;

#[derive(Debug, Serialize)]
struct CallSummary {
    call: &'static str,
    status: u16,
    bytes: usize,
    parsed: bool,
    detail: String,
}

async fn run_call<T: DeserializeOwned>(
    client: &PortalClient,
    session: &SessionCredentials,
    call: &'static str,
    action: &str,
    params: FormParams,
    describe: impl Fn(&T) -> String,
) -> Result<CallSummary, Box<dyn Error>> {
    println!("\n🔍 {} ({})", call, action);
    let response = client.build_form_request(session, action, &params)?.send().await?;
    let status = response.status();
    let body = response.text().await?;

    println!("Status: {}", status);
    println!("Body: {}", body);

    let (parsed, detail) = match serde_json::from_str::<T>(&body) {
        Ok(value) => (true, describe(&value)),
        Err(e) => (false, e.to_string()),
    };
    Ok(CallSummary {
        call,
        status: status.as_u16(),
        bytes: body.len(),
        parsed,
        detail,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    let settings = SessionSettings::from_env()?;

    let host = Arc::new(SessionHost::new(settings.host_settings()));
    let auth = AuthManager::new(host, Arc::new(MemoryStore::new()), settings.portal_origin()?);
    let session = auth.fetch_credentials().await?;
    println!("Session: tenant {} employee {}", session.hr_id, session.user_id);

    let client = PortalClient::new(settings.portal_config())?;
    let range = analysis_range(SystemClock.today());
    println!("Range: {} to {}", range.portal_from(), range.portal_to());

    let summaries = vec![
        run_call::<WeekListResponse>(
            &client,
            &session,
            "week list",
            ATTENDANCE_VIEW_ACTION,
            week_list_params(&session),
            |week| match week.today_check_in() {
                Some(time) => format!("today's check-in {}", time.format("%H:%M")),
                None => "no check-in today".to_string(),
            },
        )
        .await?,
        run_call::<RangeDetailResponse>(
            &client,
            &session,
            "range detail",
            ATTENDANCE_ACTION,
            range_detail_params(&session, &range),
            |detail| format!("{} entries", detail.entries().len()),
        )
        .await?,
        run_call::<PendingRequestsResponse>(
            &client,
            &session,
            "pending requests",
            ATTENDANCE_ACTION,
            pending_requests_params(&session, &range),
            |pending| format!("{} requests", pending.list.len()),
        )
        .await?,
        run_call::<LeaveTypesResponse>(
            &client,
            &session,
            "leave types",
            LEAVE_TYPES_ACTION,
            leave_types_params(&session),
            |types| format!("{} leave types", types.types().len()),
        )
        .await?,
    ];

    println!("\nSummary:");
    println!("{}", serde_json::to_string_pretty(&summaries)?);

    let failures = summaries.iter().filter(|s| !s.parsed).count();
    if failures > 0 {
        println!("\n⚠️ {} of {} responses did not match the expected shape", failures, summaries.len());
    } else {
        println!("\n✅ Smoke test complete!");
    }
    Ok(())
}
