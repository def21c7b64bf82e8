//! Pure aggregation over caller-owned request slices.
//!
//! Nothing here mutates stored data, and every builder is a plain fold over
//! its input, so results are invariant under reordering or pagination of the
//! record set. Null financial fields count as zero in sums; calculations
//! that need both amounts exclude requests missing either.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::DocumentKind;
use crate::domain::{DependentId, PlanId};
use crate::reimbursements::completeness;
use crate::reimbursements::domain::{ReimbursementRequest, RequestStatus};

/// Count plus monetary sums for one grouping bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoneyBreakdown {
    pub count: usize,
    pub amount_paid: Decimal,
    pub amount_reimbursed: Decimal,
    pub out_of_pocket: Decimal,
}

impl MoneyBreakdown {
    fn add(&mut self, request: &ReimbursementRequest) {
        self.count += 1;
        self.amount_paid += request.amount_paid.unwrap_or(Decimal::ZERO);
        self.amount_reimbursed += request.amount_reimbursed.unwrap_or(Decimal::ZERO);
        self.out_of_pocket = self.amount_paid - self.amount_reimbursed;
    }
}

/// User-facing dashboard aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub totals: MoneyBreakdown,
    pub current_year: MoneyBreakdown,
    pub current_month: MoneyBreakdown,
    pub by_status: BTreeMap<&'static str, usize>,
    pub by_type: BTreeMap<&'static str, MoneyBreakdown>,
    pub by_plan: BTreeMap<PlanId, MoneyBreakdown>,
    pub by_dependent: BTreeMap<DependentId, MoneyBreakdown>,
    pub monthly: BTreeMap<String, MoneyBreakdown>,
}

pub fn dashboard(requests: &[ReimbursementRequest], now: DateTime<Utc>) -> DashboardSummary {
    let today = now.date_naive();
    let mut summary = DashboardSummary {
        totals: MoneyBreakdown::default(),
        current_year: MoneyBreakdown::default(),
        current_month: MoneyBreakdown::default(),
        by_status: BTreeMap::new(),
        by_type: BTreeMap::new(),
        by_plan: BTreeMap::new(),
        by_dependent: BTreeMap::new(),
        monthly: BTreeMap::new(),
    };

    for request in requests {
        summary.totals.add(request);

        if request.attendance_date.year() == today.year() {
            summary.current_year.add(request);
            if request.attendance_date.month() == today.month() {
                summary.current_month.add(request);
            }
        }

        *summary.by_status.entry(request.status.code()).or_default() += 1;
        summary
            .by_type
            .entry(request.attendance_type.code())
            .or_default()
            .add(request);
        summary.by_plan.entry(request.plan_id).or_default().add(request);
        summary
            .by_dependent
            .entry(request.dependent_id)
            .or_default()
            .add(request);

        let bucket = format!(
            "{:04}-{:02}",
            request.attendance_date.year(),
            request.attendance_date.month()
        );
        summary.monthly.entry(bucket).or_default().add(request);
    }

    summary
}

/// Reimbursed-over-paid ratio for one grouping bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EfficiencyStats {
    pub count: usize,
    pub total_paid: Decimal,
    pub total_reimbursed: Decimal,
    pub efficiency_pct: Decimal,
}

impl EfficiencyStats {
    fn add(&mut self, request: &ReimbursementRequest) {
        self.count += 1;
        self.total_paid += request.amount_paid.unwrap_or(Decimal::ZERO);
        self.total_reimbursed += request.amount_reimbursed.unwrap_or(Decimal::ZERO);
        self.efficiency_pct = ratio_pct(self.total_reimbursed, self.total_paid);
    }
}

fn ratio_pct(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    (numerator / denominator * Decimal::from(100)).round_dp(2)
}

/// Efficiency report: ratios are computed over null-as-zero sums, while
/// `analyzed` and the turnaround mean cover only requests carrying both
/// amounts.
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencySummary {
    pub per_plan: BTreeMap<PlanId, EfficiencyStats>,
    pub per_type: BTreeMap<&'static str, EfficiencyStats>,
    pub mean_turnaround_days: i64,
    pub analyzed: usize,
}

pub fn efficiency(requests: &[ReimbursementRequest]) -> EfficiencySummary {
    let mut per_plan: BTreeMap<PlanId, EfficiencyStats> = BTreeMap::new();
    let mut per_type: BTreeMap<&'static str, EfficiencyStats> = BTreeMap::new();
    let mut analyzed = 0usize;
    let mut turnaround_seconds = 0i64;
    let mut finalized = 0usize;

    for request in requests {
        per_plan.entry(request.plan_id).or_default().add(request);
        per_type
            .entry(request.attendance_type.code())
            .or_default()
            .add(request);

        if request.amount_paid.is_none() || request.amount_reimbursed.is_none() {
            continue;
        }
        analyzed += 1;

        if request.status == RequestStatus::Finalized {
            finalized += 1;
            turnaround_seconds += (request.updated_at - request.created_at).num_seconds();
        }
    }

    let mean_turnaround_days = if finalized == 0 {
        0
    } else {
        (turnaround_seconds as f64 / finalized as f64 / 86_400.0).round() as i64
    };

    EfficiencySummary {
        per_plan,
        per_type,
        mean_turnaround_days,
        analyzed,
    }
}

/// One request's outstanding-documentation picture.
#[derive(Debug, Clone, Serialize)]
pub struct PendingDocItem {
    pub request_id: crate::domain::RequestId,
    pub plan_id: PlanId,
    pub dependent_id: DependentId,
    pub attendance_type: &'static str,
    pub attendance_date: chrono::NaiveDate,
    pub status: RequestStatus,
    pub required: Vec<DocumentKind>,
    pub present: Vec<DocumentKind>,
    pub missing: Vec<DocumentKind>,
    pub completeness_pct: f64,
    pub days_pending: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PendingDocsTotals {
    pub total: usize,
    pub complete: usize,
    pub partial: usize,
    pub undocumented: usize,
    pub mean_days_pending: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingDocumentsReport {
    pub summary: PendingDocsTotals,
    pub items: Vec<PendingDocItem>,
}

const PENDING_STATUSES: [RequestStatus; 3] = [
    RequestStatus::Started,
    RequestStatus::AwaitingDocuments,
    RequestStatus::AwaitingSupplementalDocs,
];

/// Outstanding-documentation report over `(request, attached kinds)` pairs.
pub fn pending_documents(
    entries: Vec<(ReimbursementRequest, Vec<DocumentKind>)>,
    now: DateTime<Utc>,
) -> PendingDocumentsReport {
    let mut items = Vec::new();
    let mut summary = PendingDocsTotals::default();
    let mut days_total = 0i64;

    for (request, attached) in entries {
        if !PENDING_STATUSES.contains(&request.status) {
            continue;
        }

        let evaluation = completeness::evaluate(request.attendance_type, &attached);
        let days_pending = (now - request.created_at).num_days();

        summary.total += 1;
        days_total += days_pending;
        if evaluation.is_complete() {
            summary.complete += 1;
        } else if attached.is_empty() {
            summary.undocumented += 1;
        } else {
            summary.partial += 1;
        }

        items.push(PendingDocItem {
            request_id: request.id,
            plan_id: request.plan_id,
            dependent_id: request.dependent_id,
            attendance_type: request.attendance_type.code(),
            attendance_date: request.attendance_date,
            status: request.status,
            required: crate::catalog::required_kinds(request.attendance_type).to_vec(),
            present: attached,
            missing: evaluation.missing.clone(),
            completeness_pct: evaluation.ratio() * 100.0,
            days_pending,
        });
    }

    summary.mean_days_pending = if summary.total == 0 {
        0
    } else {
        (days_total as f64 / summary.total as f64).round() as i64
    };

    PendingDocumentsReport { summary, items }
}

/// Trello-style board: every status column in progression order.
#[derive(Debug, Clone, Serialize)]
pub struct KanbanColumn {
    pub status: RequestStatus,
    pub requests: Vec<ReimbursementRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanBoard {
    pub columns: Vec<KanbanColumn>,
}

pub fn kanban(requests: Vec<ReimbursementRequest>) -> KanbanBoard {
    let mut columns: Vec<KanbanColumn> = RequestStatus::ordered()
        .into_iter()
        .map(|status| KanbanColumn {
            status,
            requests: Vec::new(),
        })
        .collect();

    for request in requests {
        let slot = columns
            .iter_mut()
            .find(|column| column.status == request.status)
            .expect("every status has a column");
        slot.requests.push(request);
    }

    KanbanBoard { columns }
}

/// Per-plan or per-dependent usage statistics.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStats {
    pub total: usize,
    pub finalized: usize,
    pub open: usize,
    pub totals: MoneyBreakdown,
    pub by_type: BTreeMap<&'static str, usize>,
    pub by_status: BTreeMap<&'static str, usize>,
}

pub fn entity_stats(requests: &[ReimbursementRequest]) -> EntityStats {
    let mut stats = EntityStats {
        total: requests.len(),
        finalized: 0,
        open: 0,
        totals: MoneyBreakdown::default(),
        by_type: BTreeMap::new(),
        by_status: BTreeMap::new(),
    };

    for request in requests {
        if request.status == RequestStatus::Finalized {
            stats.finalized += 1;
        } else {
            stats.open += 1;
        }
        stats.totals.add(request);
        *stats
            .by_type
            .entry(request.attendance_type.code())
            .or_default() += 1;
        *stats.by_status.entry(request.status.code()).or_default() += 1;
    }

    stats
}
