//! Outbound notification boundary.
//!
//! Sends are fire-and-forget toward an external mail/notification service:
//! a failure is reported to the caller but never allowed to propagate
//! across the sweep boundary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::AttendanceType;
use crate::domain::{RequestId, UserId};

/// Payload for the pending-supplemental-documentation reminder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderNotice {
    pub request_id: RequestId,
    pub protocol_number: Option<String>,
    pub attendance_type: AttendanceType,
    pub attendance_date: NaiveDate,
    pub dependent_name: String,
    pub pending_docs_description: Option<String>,
}

/// Payload for the "send documents to the insurer" package e-mail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPackageNotice {
    pub request_id: RequestId,
    pub protocol_number: Option<String>,
    pub attendance_type: AttendanceType,
    pub attendance_date: NaiveDate,
    pub dependent_name: String,
    pub physician: Option<String>,
    pub facility: Option<String>,
    pub amount_paid: Option<Decimal>,
    pub insurer_email: Option<String>,
}

pub trait NotificationSender: Send + Sync {
    fn send_reminder(&self, user: UserId, notice: ReminderNotice) -> Result<(), NotifyError>;
    fn send_document_package(
        &self,
        user: UserId,
        notice: DocumentPackageNotice,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
