// src/main.rs
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use worktime_core::browser_host::SessionHost;
use worktime_core::clock::SystemClock;
use worktime_core::config::{load_policy, SessionSettings};
use worktime_core::controller::TIME_NOT_FOUND;
use worktime_core::error::describe;
use worktime_core::portal_client::PortalClient;
use worktime_core::portal_types::{LeaveRequest, LeaveSession};
use worktime_core::report::write_candidates_csv;
use worktime_core::storage::JsonFileStore;
use worktime_core::time_format::{format_portal_date, parse_portal_date};
use worktime_core::{AppController, AppError, CycleReport, LiveStatus, RemediationPlan, SubmissionOutcome};

#[derive(Parser, Debug)]
#[command(name = "worktime", version, about = "HR portal attendance assistant")]
struct Cli {
    /// Log filter, e.g. `debug` or `worktime_core=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse the pay cycle and project today's end time
    Status,
    /// File corrections for the shortest uncovered days
    AutoLog {
        /// Submit without asking for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// List days below a full day, or file corrections for the given dates
    ManualLog {
        /// Date to correct (YYYY-MM-DD or dd-Mon-YYYY); repeatable
        #[arg(long = "date", value_parser = parse_cli_date)]
        dates: Vec<NaiveDate>,
    },
    /// Write the manual correction list as CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// List the leave types that can be applied for
    LeaveTypes,
    /// Apply for a single day of leave
    ApplyLeave {
        #[arg(long, value_parser = parse_cli_date)]
        date: NaiveDate,
        #[arg(long)]
        leave_type: String,
        #[arg(long, value_enum, default_value_t = LeaveSession::FullDay)]
        session: LeaveSession,
    },
    /// Open the portal sign-in page
    SignIn,
    /// Forget the stored session and analysis
    Reset,
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_portal_date(value))
        .ok_or_else(|| format!("'{}' is not a date (use YYYY-MM-DD or dd-Mon-YYYY)", value))
}

fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid --log-level filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting tracing subscriber failed")?;
    Ok(())
}

fn build_controller(settings: &SessionSettings) -> Result<AppController> {
    let policy = load_policy().context("Failed to load work schedule")?;
    let portal = settings.portal_config();

    let client = PortalClient::new(portal.clone()).context("Failed to build portal client")?;
    let host = SessionHost::new(settings.host_settings());
    let store = JsonFileStore::open(&settings.store_path).with_context(|| {
        format!("Failed to open state file {}", settings.store_path.display())
    })?;
    info!("State file: {}", store.path().display());

    AppController::new(
        Arc::new(client),
        Arc::new(host),
        Arc::new(store),
        Arc::new(SystemClock),
        policy,
        portal,
    )
    .context("Failed to set up controller")
}

// --- Output ---

fn print_report(report: &CycleReport) {
    println!(
        "Pay cycle {} to {} (as of {})",
        report.range.portal_from(),
        report.range.portal_to(),
        format_portal_date(report.report_date)
    );
    if report.month_transition_note {
        println!("Note: the new pay cycle starts on the 23rd; figures still cover the previous one.");
    }
    println!("  Working days:         {}", report.summary.working_days);
    println!("  Severely short days:  {}", report.summary.severe_days);
    println!("  Moderately short:     {}", report.summary.moderate_days);
    println!("  Below a full day:     {}", report.summary.below_full_day_days);
    println!(
        "  Requests this month:  {}/{}",
        report.outstanding_requests, report.request_limit
    );
    if report.limit_reached {
        println!("  Request limit reached. Review: {}", report.regularization_url);
    }
    if !report.top_dates.is_empty() {
        let dates: Vec<String> = report.top_dates.iter().copied().map(format_portal_date).collect();
        println!("  Shortest days:        {}", dates.join(", "));
    }

    match &report.live {
        LiveStatus::Projection(projection) => {
            let (status, start, end) = projection.display_triple();
            println!("Today: worked {}, started {}, end {}", status, start, end);
        }
        LiveStatus::TimeNotFound => println!("Today: {}", TIME_NOT_FOUND),
    }
}

fn print_outcomes(outcomes: &[SubmissionOutcome]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => println!("  {}  logged", format_portal_date(outcome.date)),
            Err(e) => {
                failed += 1;
                println!("  {}  failed: {}", format_portal_date(outcome.date), describe(e));
            }
        }
    }
    failed
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

// --- Commands ---

async fn submit(controller: &AppController, dates: &[NaiveDate]) -> Result<()> {
    let outcomes = controller.log_attendance_for_dates(dates).await?;
    let failed = print_outcomes(&outcomes);
    if failed > 0 {
        bail!("{} of {} corrections were not logged", failed, outcomes.len());
    }
    println!("Attendance logged successfully. Run `worktime status` to refresh.");
    Ok(())
}

async fn auto_log(controller: &AppController, yes: bool) -> Result<()> {
    let candidates = match controller.plan_auto_remediation().await? {
        RemediationPlan::NothingToLog => {
            println!("No dates to log attendance for.");
            return Ok(());
        }
        RemediationPlan::Ready(candidates) => candidates,
    };

    println!("Corrections to file:");
    for candidate in &candidates {
        println!("  {}  {}", candidate.portal_date(), candidate.formatted_hours);
    }
    if !yes && !confirm("Log attendance for these dates?")? {
        println!("Cancelled.");
        return Ok(());
    }

    let dates: Vec<NaiveDate> = candidates.iter().map(|c| c.date).collect();
    submit(controller, &dates).await
}

async fn manual_log(controller: &AppController, dates: Vec<NaiveDate>) -> Result<()> {
    let candidates = match controller.plan_manual_remediation().await? {
        RemediationPlan::NothingToLog => {
            println!("No dates to log attendance for.");
            return Ok(());
        }
        RemediationPlan::Ready(candidates) => candidates,
    };

    if dates.is_empty() {
        println!("Days below a full day (pass --date to file corrections):");
        for candidate in &candidates {
            let note = if candidate.is_absent { "  absent" } else { "" };
            println!(
                "  {}  {}{}",
                candidate.portal_date(),
                candidate.formatted_hours,
                note
            );
        }
        return Ok(());
    }

    let (selected, unknown): (Vec<NaiveDate>, Vec<NaiveDate>) = dates
        .into_iter()
        .partition(|date| candidates.iter().any(|c| c.date == *date));
    for date in &unknown {
        warn!("{} is not a day below a full day; skipped", format_portal_date(*date));
    }
    if selected.is_empty() {
        bail!("None of the given dates can be corrected");
    }
    submit(controller, &selected).await
}

async fn export(controller: &AppController, out: PathBuf) -> Result<()> {
    let candidates = match controller.plan_manual_remediation().await? {
        RemediationPlan::NothingToLog => Vec::new(),
        RemediationPlan::Ready(candidates) => candidates,
    };
    let file =
        File::create(&out).with_context(|| format!("Failed to create {}", out.display()))?;
    write_candidates_csv(file, &candidates)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Wrote {} rows to {}", candidates.len(), out.display());
    Ok(())
}

async fn run(controller: &AppController, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            let report = controller.calculate_time().await?;
            print_report(&report);
        }
        Command::AutoLog { yes } => auto_log(controller, yes).await?,
        Command::ManualLog { dates } => manual_log(controller, dates).await?,
        Command::Export { out } => export(controller, out).await?,
        Command::LeaveTypes => {
            for (id, name) in controller.leave_types().await? {
                println!("  {:>8}  {}", id, name);
            }
        }
        Command::ApplyLeave {
            date,
            leave_type,
            session,
        } => {
            let request = LeaveRequest {
                date,
                leave_type_id: leave_type,
                session,
            };
            controller.apply_leave(&request).await?;
            println!("Leave applied for {}.", request.portal_date());
        }
        Command::SignIn => controller.go_to_portal().await?,
        Command::Reset => {
            controller.reset_session().await?;
            println!("Session cleared.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let settings = SessionSettings::from_env().context("Failed to read WORKTIME_* settings")?;
    let controller = build_controller(&settings)?;

    if let Err(e) = run(&controller, cli.command).await {
        match e.downcast_ref::<AppError>() {
            Some(app_error) => {
                error!("{}", describe(app_error));
                if matches!(app_error, AppError::CredentialsMissing(_)) {
                    println!(
                        "Sign in to the portal (`worktime sign-in`), export the session and retry."
                    );
                }
            }
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}
