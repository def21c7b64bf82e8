use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::AttendanceType;
use crate::domain::{DependentId, PlanId, RequestId};

/// Workflow status of a reimbursement request.
///
/// `ordered()` reflects the typical progression toward insurer payout; the
/// progression is advisory, not enforced — any explicit user-directed status
/// change is accepted (mirroring the reference behavior; see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Started,
    AwaitingDocuments,
    ReadyToSend,
    ProtocolOpen,
    AwaitingSupplementalDocs,
    Finalized,
}

impl RequestStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Started,
            Self::AwaitingDocuments,
            Self::ReadyToSend,
            Self::ProtocolOpen,
            Self::AwaitingSupplementalDocs,
            Self::Finalized,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::AwaitingDocuments => "awaiting_documents",
            Self::ReadyToSend => "ready_to_send",
            Self::ProtocolOpen => "protocol_open",
            Self::AwaitingSupplementalDocs => "awaiting_supplemental_docs",
            Self::Finalized => "finalized",
        }
    }

    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Finalized)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One claim for a single medical/therapy attendance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReimbursementRequest {
    pub id: RequestId,
    pub plan_id: PlanId,
    pub dependent_id: DependentId,
    pub attendance_type: AttendanceType,
    pub specialty: Option<String>,
    pub physician: Option<String>,
    pub facility: Option<String>,
    pub attendance_date: NaiveDate,
    /// End of the covered period for recurring therapies.
    pub attendance_end_date: Option<NaiveDate>,
    pub amount_paid: Option<Decimal>,
    pub amount_reimbursed: Option<Decimal>,
    pub protocol_number: Option<String>,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub pending_docs_description: Option<String>,
    pub reminder_interval_days: i64,
    pub last_reminder_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation payload; the request always starts in `started`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRequest {
    pub plan_id: PlanId,
    pub dependent_id: DependentId,
    pub attendance_type: AttendanceType,
    pub attendance_date: NaiveDate,
    pub attendance_end_date: Option<NaiveDate>,
    pub specialty: Option<String>,
    pub physician: Option<String>,
    pub facility: Option<String>,
    pub amount_paid: Option<Decimal>,
    pub notes: Option<String>,
}

/// Field-wise edit; absent fields stay untouched. A present `status` routes
/// through the lifecycle transition rules; everything else is a plain field
/// write independent of the status machine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestUpdate {
    pub attendance_type: Option<AttendanceType>,
    pub attendance_date: Option<NaiveDate>,
    pub attendance_end_date: Option<NaiveDate>,
    pub specialty: Option<String>,
    pub physician: Option<String>,
    pub facility: Option<String>,
    pub amount_paid: Option<Decimal>,
    pub amount_reimbursed: Option<Decimal>,
    pub protocol_number: Option<String>,
    pub status: Option<RequestStatus>,
    pub notes: Option<String>,
    pub pending_docs_description: Option<String>,
    pub reminder_interval_days: Option<i64>,
}

/// Listing/report filter; all criteria are conjunctive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub plan_id: Option<PlanId>,
    pub dependent_id: Option<DependentId>,
    pub attendance_type: Option<AttendanceType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl RequestFilter {
    pub fn matches(&self, request: &ReimbursementRequest) -> bool {
        if let Some(status) = self.status {
            if request.status != status {
                return false;
            }
        }
        if let Some(plan_id) = self.plan_id {
            if request.plan_id != plan_id {
                return false;
            }
        }
        if let Some(dependent_id) = self.dependent_id {
            if request.dependent_id != dependent_id {
                return false;
            }
        }
        if let Some(attendance_type) = self.attendance_type {
            if request.attendance_type != attendance_type {
                return false;
            }
        }
        if let Some(from) = self.from {
            if request.attendance_date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if request.attendance_date > to {
                return false;
            }
        }
        true
    }
}
