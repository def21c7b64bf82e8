//! Periodic reminder sweep for requests awaiting supplemental documentation.
//!
//! Each run is a pure function of `now` plus persisted state: the sweep
//! re-reads `last_reminder_at` from the record store and only advances it
//! through a conditional write after a successful send. A crashed or
//! overlapping sweep therefore cannot double-send, and a failed send is
//! retried naturally on the next run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::notify::{NotificationSender, NotifyError, ReminderNotice};
use crate::plans::repository::{DependentRepository, PlanRepository};
use crate::reimbursements::domain::ReimbursementRequest;
use crate::reimbursements::repository::RequestRepository;
use crate::store::RepositoryError;

pub struct ReminderSweep {
    requests: Arc<dyn RequestRepository>,
    plans: Arc<dyn PlanRepository>,
    dependents: Arc<dyn DependentRepository>,
    notifier: Arc<dyn NotificationSender>,
}

/// Outcome counters for one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub examined: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ReminderSweep {
    pub fn new(
        requests: Arc<dyn RequestRepository>,
        plans: Arc<dyn PlanRepository>,
        dependents: Arc<dyn DependentRepository>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            requests,
            plans,
            dependents,
            notifier,
        }
    }

    pub fn run(&self, now: DateTime<Utc>) -> SweepSummary {
        let pending = match self.requests.pending_supplemental() {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "reminder sweep could not read pending requests");
                return SweepSummary::default();
            }
        };

        let mut summary = SweepSummary::default();
        for request in pending {
            summary.examined += 1;

            let Some(last_reminder_at) = request.last_reminder_at else {
                summary.skipped += 1;
                continue;
            };

            let days_since = (now - last_reminder_at).num_days();
            if days_since < request.reminder_interval_days {
                summary.skipped += 1;
                continue;
            }

            match self.remind(&request, last_reminder_at, now) {
                Ok(true) => summary.sent += 1,
                Ok(false) => {
                    debug!(request_id = %request.id, "reminder already advanced by a concurrent sweep");
                    summary.skipped += 1;
                }
                Err(err) => {
                    warn!(request_id = %request.id, error = %err, "reminder delivery failed; will retry next sweep");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    fn remind(
        &self,
        request: &ReimbursementRequest,
        expected: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, SweepItemError> {
        let plan = self
            .plans
            .fetch(request.plan_id)?
            .ok_or(SweepItemError::MissingPlan)?;
        let dependent = self
            .dependents
            .fetch(request.dependent_id)?
            .ok_or(SweepItemError::MissingDependent)?;

        self.notifier.send_reminder(
            plan.owner,
            ReminderNotice {
                request_id: request.id,
                protocol_number: request.protocol_number.clone(),
                attendance_type: request.attendance_type,
                attendance_date: request.attendance_date,
                dependent_name: dependent.name,
                pending_docs_description: request.pending_docs_description.clone(),
            },
        )?;

        Ok(self.requests.advance_reminder(request.id, expected, now)?)
    }
}

#[derive(Debug, thiserror::Error)]
enum SweepItemError {
    #[error("owning plan record is missing")]
    MissingPlan,
    #[error("dependent record is missing")]
    MissingDependent,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}
