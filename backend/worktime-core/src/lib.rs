// src/lib.rs
//
// Attendance assistant for the HR portal: reads the pay cycle's records,
// finds short workdays, projects today's leave time and files corrections.

pub mod attendance;
pub mod attendance_analysis;
pub mod auth_manager;
pub mod browser_host;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod live_projection;
pub mod pay_cycle;
pub mod policy;
pub mod portal_client;
pub mod portal_types;
pub mod report;
pub mod request_limit;
pub mod storage;
pub mod time_format;
pub mod work_hours;

mod attendance_analysis_tests;

pub use controller::{AppController, CycleReport, LiveStatus, RemediationPlan, SubmissionOutcome};
pub use error::AppError;
pub use policy::WorkSchedulePolicy;
