//! Platform-wide aggregates for the admin surface.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::documents::domain::Document;
use crate::plans::domain::Plan;
use crate::reimbursements::domain::ReimbursementRequest;
use crate::users::UserProfile;

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub users: UserTotals,
    pub plans: PlanTotals,
    pub requests: RequestTotals,
    pub documents: DocumentTotals,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserTotals {
    pub total: usize,
    pub admins: usize,
    pub new_last_30_days: usize,
    pub new_last_7_days: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanTotals {
    pub total: usize,
    pub new_last_30_days: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestTotals {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub total_paid: Decimal,
    pub total_reimbursed: Decimal,
    pub new_last_30_days: usize,
    pub new_last_7_days: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentTotals {
    pub total: usize,
    pub total_compressed_bytes: u64,
    pub new_last_30_days: usize,
}

pub fn admin_dashboard(
    users: &[UserProfile],
    plans: &[Plan],
    requests: &[ReimbursementRequest],
    documents: &[Document],
    now: DateTime<Utc>,
) -> AdminDashboard {
    let thirty_days_ago = now - Duration::days(30);
    let seven_days_ago = now - Duration::days(7);

    let user_totals = UserTotals {
        total: users.len(),
        admins: users.iter().filter(|user| user.is_admin).count(),
        new_last_30_days: users
            .iter()
            .filter(|user| user.created_at >= thirty_days_ago)
            .count(),
        new_last_7_days: users
            .iter()
            .filter(|user| user.created_at >= seven_days_ago)
            .count(),
    };

    let plan_totals = PlanTotals {
        total: plans.len(),
        new_last_30_days: plans
            .iter()
            .filter(|plan| plan.created_at >= thirty_days_ago)
            .count(),
    };

    let mut request_totals = RequestTotals {
        total: requests.len(),
        ..RequestTotals::default()
    };
    for request in requests {
        *request_totals
            .by_status
            .entry(request.status.code())
            .or_default() += 1;
        request_totals.total_paid += request.amount_paid.unwrap_or(Decimal::ZERO);
        request_totals.total_reimbursed += request.amount_reimbursed.unwrap_or(Decimal::ZERO);
        if request.created_at >= thirty_days_ago {
            request_totals.new_last_30_days += 1;
        }
        if request.created_at >= seven_days_ago {
            request_totals.new_last_7_days += 1;
        }
    }

    let document_totals = DocumentTotals {
        total: documents.len(),
        total_compressed_bytes: documents
            .iter()
            .map(|document| document.compressed_bytes)
            .sum(),
        new_last_30_days: documents
            .iter()
            .filter(|document| document.created_at >= thirty_days_ago)
            .count(),
    };

    AdminDashboard {
        users: user_totals,
        plans: plan_totals,
        requests: request_totals,
        documents: document_totals,
    }
}
