//! Status transition rules for reimbursement requests.
//!
//! The status set is closed but the transition graph is deliberately open:
//! any explicit user-directed change between states is accepted, and only
//! two transitions carry side effects — entering
//! `awaiting_supplemental_docs` seeds the reminder clock, and entering
//! `finalized` clears it along with the pending-docs description.

use chrono::{DateTime, Utc};

use super::domain::{ReimbursementRequest, RequestStatus, RequestUpdate};

/// Apply an explicit status change, running the side-effecting rules.
///
/// Re-entering `awaiting_supplemental_docs` re-seeds the reminder clock even
/// when the request was already in that state.
pub fn apply_status(
    request: &mut ReimbursementRequest,
    status: RequestStatus,
    pending_docs_description: Option<String>,
    now: DateTime<Utc>,
) {
    match status {
        RequestStatus::AwaitingSupplementalDocs => {
            request.last_reminder_at = Some(now);
            if let Some(description) = pending_docs_description {
                request.pending_docs_description = Some(description);
            }
        }
        RequestStatus::Finalized => {
            request.last_reminder_at = None;
            request.pending_docs_description = None;
        }
        _ => {}
    }

    request.status = status;
    request.updated_at = now;
}

/// Apply a field-wise edit. Field writes are independent of the status
/// machine; only a present `status` routes through [`apply_status`].
pub fn apply_update(request: &mut ReimbursementRequest, update: RequestUpdate, now: DateTime<Utc>) {
    if let Some(attendance_type) = update.attendance_type {
        request.attendance_type = attendance_type;
    }
    if let Some(attendance_date) = update.attendance_date {
        request.attendance_date = attendance_date;
    }
    if let Some(attendance_end_date) = update.attendance_end_date {
        request.attendance_end_date = Some(attendance_end_date);
    }
    if let Some(specialty) = update.specialty {
        request.specialty = Some(specialty);
    }
    if let Some(physician) = update.physician {
        request.physician = Some(physician);
    }
    if let Some(facility) = update.facility {
        request.facility = Some(facility);
    }
    if let Some(amount_paid) = update.amount_paid {
        request.amount_paid = Some(amount_paid);
    }
    if let Some(amount_reimbursed) = update.amount_reimbursed {
        request.amount_reimbursed = Some(amount_reimbursed);
    }
    if let Some(protocol_number) = update.protocol_number {
        request.protocol_number = Some(protocol_number);
    }
    if let Some(notes) = update.notes {
        request.notes = Some(notes);
    }
    if let Some(reminder_interval_days) = update.reminder_interval_days {
        request.reminder_interval_days = reminder_interval_days;
    }

    match update.status {
        Some(status) => apply_status(request, status, update.pending_docs_description, now),
        None => {
            if let Some(description) = update.pending_docs_description {
                request.pending_docs_description = Some(description);
            }
            request.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttendanceType;
    use crate::domain::{DependentId, PlanId, RequestId};
    use chrono::{NaiveDate, TimeZone};

    fn request() -> ReimbursementRequest {
        let created = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        ReimbursementRequest {
            id: RequestId::generate(),
            plan_id: PlanId::generate(),
            dependent_id: DependentId::generate(),
            attendance_type: AttendanceType::Consulta,
            specialty: None,
            physician: None,
            facility: None,
            attendance_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            attendance_end_date: None,
            amount_paid: None,
            amount_reimbursed: None,
            protocol_number: None,
            status: RequestStatus::Started,
            notes: None,
            pending_docs_description: None,
            reminder_interval_days: 3,
            last_reminder_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn entering_supplemental_docs_seeds_the_reminder_clock() {
        let mut request = request();
        let before = Utc::now();
        apply_status(
            &mut request,
            RequestStatus::AwaitingSupplementalDocs,
            Some("insurer asked for a therapist report".to_string()),
            Utc::now(),
        );
        let after = Utc::now();

        let seeded = request.last_reminder_at.expect("clock seeded");
        assert!(seeded >= before && seeded <= after);
        assert_eq!(
            request.pending_docs_description.as_deref(),
            Some("insurer asked for a therapist report")
        );
        assert_eq!(request.status, RequestStatus::AwaitingSupplementalDocs);
    }

    #[test]
    fn reentering_supplemental_docs_reseeds_the_clock() {
        let mut request = request();
        let first = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        apply_status(
            &mut request,
            RequestStatus::AwaitingSupplementalDocs,
            None,
            first,
        );
        let second = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
        apply_status(
            &mut request,
            RequestStatus::AwaitingSupplementalDocs,
            None,
            second,
        );
        assert_eq!(request.last_reminder_at, Some(second));
    }

    #[test]
    fn finalizing_clears_reminder_state() {
        let mut request = request();
        apply_status(
            &mut request,
            RequestStatus::AwaitingSupplementalDocs,
            Some("missing invoice".to_string()),
            Utc::now(),
        );
        apply_status(&mut request, RequestStatus::Finalized, None, Utc::now());

        assert_eq!(request.status, RequestStatus::Finalized);
        assert_eq!(request.last_reminder_at, None);
        assert_eq!(request.pending_docs_description, None);
    }

    #[test]
    fn backward_transition_is_accepted_and_reseeds_on_reentry() {
        let mut request = request();
        apply_status(&mut request, RequestStatus::Finalized, None, Utc::now());

        let reentry = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        apply_status(
            &mut request,
            RequestStatus::AwaitingSupplementalDocs,
            None,
            reentry,
        );
        assert_eq!(request.status, RequestStatus::AwaitingSupplementalDocs);
        assert_eq!(request.last_reminder_at, Some(reentry));
    }

    #[test]
    fn field_edits_do_not_touch_the_status() {
        let mut request = request();
        let now = Utc::now();
        apply_update(
            &mut request,
            RequestUpdate {
                physician: Some("Dra. Helena Costa".to_string()),
                protocol_number: Some("BR-2024-0042".to_string()),
                ..RequestUpdate::default()
            },
            now,
        );

        assert_eq!(request.status, RequestStatus::Started);
        assert_eq!(request.physician.as_deref(), Some("Dra. Helena Costa"));
        assert_eq!(request.protocol_number.as_deref(), Some("BR-2024-0042"));
        assert_eq!(request.updated_at, now);
        assert_eq!(request.last_reminder_at, None);
    }

    #[test]
    fn update_with_status_runs_transition_rules() {
        let mut request = request();
        let now = Utc::now();
        apply_update(
            &mut request,
            RequestUpdate {
                status: Some(RequestStatus::AwaitingSupplementalDocs),
                pending_docs_description: Some("resend payment proof".to_string()),
                reminder_interval_days: Some(5),
                ..RequestUpdate::default()
            },
            now,
        );

        assert_eq!(request.status, RequestStatus::AwaitingSupplementalDocs);
        assert_eq!(request.last_reminder_at, Some(now));
        assert_eq!(request.reminder_interval_days, 5);
        assert_eq!(
            request.pending_docs_description.as_deref(),
            Some("resend payment proof")
        );
    }
}
