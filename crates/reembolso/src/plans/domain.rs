use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DependentId, PlanId, UserId};

/// A health-insurance policy owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub owner: UserId,
    pub name: String,
    pub icon_url: Option<String>,
    pub insurer_email: Option<String>,
    pub insurer_phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub icon_url: Option<String>,
    pub insurer_email: Option<String>,
    pub insurer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Field-wise edit; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanUpdate {
    pub name: Option<String>,
    pub icon_url: Option<String>,
    pub insurer_email: Option<String>,
    pub insurer_phone: Option<String>,
    pub notes: Option<String>,
}

/// Relationship of a dependent to the plan holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Titular,
    Conjuge,
    Filho,
    Pai,
    Mae,
    Irmao,
    Sogro,
    Genro,
    Neto,
    Outro,
}

impl Relation {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Titular,
            Self::Conjuge,
            Self::Filho,
            Self::Pai,
            Self::Mae,
            Self::Irmao,
            Self::Sogro,
            Self::Genro,
            Self::Neto,
            Self::Outro,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Titular => "titular",
            Self::Conjuge => "conjuge",
            Self::Filho => "filho",
            Self::Pai => "pai",
            Self::Mae => "mae",
            Self::Irmao => "irmao",
            Self::Sogro => "sogro",
            Self::Genro => "genro",
            Self::Neto => "neto",
            Self::Outro => "outro",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Titular => "Titular",
            Self::Conjuge => "Cônjuge",
            Self::Filho => "Filho(a)",
            Self::Pai => "Pai",
            Self::Mae => "Mãe",
            Self::Irmao => "Irmão(ã)",
            Self::Sogro => "Sogro(a)",
            Self::Genro => "Genro/Nora",
            Self::Neto => "Neto(a)",
            Self::Outro => "Outro",
        }
    }
}

/// A person covered by a plan and eligible for reimbursement requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: DependentId,
    pub plan_id: PlanId,
    pub name: String,
    pub relation: Relation,
    pub birth_date: Option<NaiveDate>,
    pub national_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDependent {
    pub plan_id: PlanId,
    pub name: String,
    pub relation: Relation,
    pub birth_date: Option<NaiveDate>,
    pub national_id: Option<String>,
    pub notes: Option<String>,
}

/// Field-wise edit; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependentUpdate {
    pub name: Option<String>,
    pub relation: Option<Relation>,
    pub birth_date: Option<NaiveDate>,
    pub national_id: Option<String>,
    pub notes: Option<String>,
}
