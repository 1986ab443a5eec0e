// src/error.rs
use thiserror::Error;

use crate::browser_host::HostError;
use crate::policy::PolicyError;
use crate::portal_client::PortalError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Session identifiers could not be found on the host page.
    #[error("Session credentials not found: {0}. Sign in to the portal and try again")]
    CredentialsMissing(String),

    #[error("You have used up all your attendance requests for this month ({used}/{limit})")]
    QuotaExceeded { used: usize, limit: usize },

    #[error("Portal rejected {item}: {message}")]
    RemoteRejected { item: String, message: String },

    #[error("No attendance data available. Run the analysis first")]
    AnalysisUnavailable,

    #[error("Portal error")]
    Portal(#[from] PortalError),

    #[error("Browser host error")]
    Host(#[from] HostError),

    #[error("Storage error")]
    Storage(#[from] StorageError),

    #[error("Invalid work schedule")]
    Policy(#[from] PolicyError),
}

/// The error and its sources joined with `": "`.
pub fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_walks_the_source_chain() {
        let err = AppError::Policy(PolicyError::NonPositive {
            field: "standard_work_seconds",
            value: 0,
        });
        assert_eq!(
            describe(&err),
            "Invalid work schedule: standard_work_seconds must be positive, got 0"
        );
    }

    #[test]
    fn quota_message_names_usage() {
        let err = AppError::QuotaExceeded { used: 3, limit: 3 };
        assert!(err.to_string().contains("(3/3)"));
    }
}
