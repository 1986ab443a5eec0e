// src/request_limit.rs
use serde::Serialize;
use tracing::{info, warn};

use crate::attendance::PendingRequestRecord;
use crate::error::AppError;
use crate::policy::WorkSchedulePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuotaStatus {
    Available { used: usize, remaining: usize },
    Exceeded { used: usize, limit: usize },
}

impl QuotaStatus {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, QuotaStatus::Exceeded { .. })
    }

    pub fn used(&self) -> usize {
        match self {
            QuotaStatus::Available { used, .. } | QuotaStatus::Exceeded { used, .. } => *used,
        }
    }
}

/// Monthly cap on outstanding attendance requests. Recomputed from the
/// latest pending-request list every time, never cached.
#[derive(Debug, Clone, Copy)]
pub struct RequestLimitGuard {
    limit: usize,
}

impl RequestLimitGuard {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn from_policy(policy: &WorkSchedulePolicy) -> Self {
        Self::new(policy.monthly_request_limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn count_outstanding(pending: &[PendingRequestRecord]) -> usize {
        pending.iter().filter(|request| request.is_outstanding()).count()
    }

    pub fn check(&self, pending: &[PendingRequestRecord]) -> QuotaStatus {
        let used = Self::count_outstanding(pending);
        if used >= self.limit {
            QuotaStatus::Exceeded {
                used,
                limit: self.limit,
            }
        } else {
            QuotaStatus::Available {
                used,
                remaining: self.limit - used,
            }
        }
    }

    /// `true` when further submissions are blocked.
    pub fn check_and_handle_request_limit(&self, pending: &[PendingRequestRecord]) -> bool {
        let status = self.check(pending);
        match status {
            QuotaStatus::Exceeded { used, limit } => {
                warn!(
                    "Attendance request limit reached for this month ({}/{})",
                    used, limit
                );
                true
            }
            QuotaStatus::Available { used, remaining } => {
                info!(
                    "{} attendance request(s) used, {} remaining this month",
                    used, remaining
                );
                false
            }
        }
    }

    /// Remaining slots, or `QuotaExceeded`.
    pub fn ensure_available(&self, pending: &[PendingRequestRecord]) -> Result<usize, AppError> {
        match self.check(pending) {
            QuotaStatus::Available { remaining, .. } => Ok(remaining),
            QuotaStatus::Exceeded { used, limit } => Err(AppError::QuotaExceeded { used, limit }),
        }
    }
}
