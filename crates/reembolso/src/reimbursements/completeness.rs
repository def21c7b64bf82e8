//! Document completeness evaluation.
//!
//! Side-effect free and callable at any point in the lifecycle, including
//! for finalized requests (audit/reporting reads).

use serde::Serialize;

use crate::catalog::{self, AttendanceType, DocumentKind};

/// Which required kinds are satisfied for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentCompleteness {
    pub missing: Vec<DocumentKind>,
    pub present_required: usize,
    pub total_required: usize,
}

impl DocumentCompleteness {
    /// Fraction of required kinds satisfied, in `[0, 1]`. A type with no
    /// required kinds counts as fully complete by convention.
    pub fn ratio(&self) -> f64 {
        if self.total_required == 0 {
            return 1.0;
        }
        self.present_required as f64 / self.total_required as f64
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn view(&self) -> CompletenessView {
        CompletenessView {
            missing_kinds: self.missing.clone(),
            present_required: self.present_required,
            total_required: self.total_required,
            ratio: self.ratio(),
        }
    }
}

/// Serializable snapshot for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessView {
    pub missing_kinds: Vec<DocumentKind>,
    pub present_required: usize,
    pub total_required: usize,
    pub ratio: f64,
}

/// Evaluate the attached (non-expired) kinds against the catalog.
pub fn evaluate(
    attendance_type: AttendanceType,
    attached: &[DocumentKind],
) -> DocumentCompleteness {
    let required = catalog::required_kinds(attendance_type);
    let missing: Vec<DocumentKind> = required
        .iter()
        .copied()
        .filter(|kind| !attached.contains(kind))
        .collect();

    DocumentCompleteness {
        present_required: required.len() - missing.len(),
        total_required: required.len(),
        missing,
    }
}
