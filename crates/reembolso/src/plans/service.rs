use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Caller, DependentId, PlanId};
use crate::reimbursements::repository::RequestRepository;
use crate::store::RepositoryError;

use super::domain::{Dependent, DependentUpdate, NewDependent, NewPlan, Plan, PlanUpdate};
use super::repository::{DependentRepository, PlanRepository};

/// Service owning plan/dependent CRUD, ownership checks, and delete guards.
///
/// Ownership verification and the no-cascade delete policy live here rather
/// than in each route handler; a plan or dependent that still has children
/// refuses deletion instead of cascading.
pub struct PlanService {
    plans: Arc<dyn PlanRepository>,
    dependents: Arc<dyn DependentRepository>,
    requests: Arc<dyn RequestRepository>,
}

impl PlanService {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        dependents: Arc<dyn DependentRepository>,
        requests: Arc<dyn RequestRepository>,
    ) -> Self {
        Self {
            plans,
            dependents,
            requests,
        }
    }

    pub fn create_plan(
        &self,
        caller: Caller,
        new_plan: NewPlan,
        now: DateTime<Utc>,
    ) -> Result<Plan, PlanServiceError> {
        let name = require_name(&new_plan.name, "plan name is required")?;

        let plan = Plan {
            id: PlanId::generate(),
            owner: caller.user_id,
            name,
            icon_url: new_plan.icon_url,
            insurer_email: new_plan.insurer_email,
            insurer_phone: new_plan.insurer_phone,
            notes: new_plan.notes,
            created_at: now,
            updated_at: now,
        };

        Ok(self.plans.insert(plan)?)
    }

    pub fn list_plans(&self, caller: Caller) -> Result<Vec<Plan>, PlanServiceError> {
        Ok(self.plans.list_by_owner(caller.user_id)?)
    }

    pub fn get_plan(&self, caller: Caller, id: PlanId) -> Result<Plan, PlanServiceError> {
        self.owned_plan(caller, id)
    }

    pub fn update_plan(
        &self,
        caller: Caller,
        id: PlanId,
        update: PlanUpdate,
        now: DateTime<Utc>,
    ) -> Result<Plan, PlanServiceError> {
        let mut plan = self.owned_plan(caller, id)?;

        if let Some(name) = update.name {
            plan.name = require_name(&name, "plan name is required")?;
        }
        if let Some(icon_url) = update.icon_url {
            plan.icon_url = Some(icon_url);
        }
        if let Some(insurer_email) = update.insurer_email {
            plan.insurer_email = Some(insurer_email);
        }
        if let Some(insurer_phone) = update.insurer_phone {
            plan.insurer_phone = Some(insurer_phone);
        }
        if let Some(notes) = update.notes {
            plan.notes = Some(notes);
        }
        plan.updated_at = now;

        self.plans.update(plan.clone())?;
        Ok(plan)
    }

    pub fn delete_plan(&self, caller: Caller, id: PlanId) -> Result<(), PlanServiceError> {
        let plan = self.owned_plan(caller, id)?;

        if self.dependents.exists_for_plan(plan.id)? {
            return Err(PlanServiceError::HasDependentRecords(
                "plan still has dependents registered",
            ));
        }
        if self.requests.exists_for_plan(plan.id)? {
            return Err(PlanServiceError::HasDependentRecords(
                "plan still has reimbursement requests",
            ));
        }

        self.plans.delete(plan.id)?;
        Ok(())
    }

    pub fn create_dependent(
        &self,
        caller: Caller,
        new_dependent: NewDependent,
        now: DateTime<Utc>,
    ) -> Result<Dependent, PlanServiceError> {
        let plan = self.owned_plan(caller, new_dependent.plan_id)?;
        let name = require_name(&new_dependent.name, "dependent name is required")?;

        let dependent = Dependent {
            id: DependentId::generate(),
            plan_id: plan.id,
            name,
            relation: new_dependent.relation,
            birth_date: new_dependent.birth_date,
            national_id: new_dependent.national_id,
            notes: new_dependent.notes,
            created_at: now,
            updated_at: now,
        };

        Ok(self.dependents.insert(dependent)?)
    }

    pub fn list_dependents(
        &self,
        caller: Caller,
        plan_filter: Option<PlanId>,
    ) -> Result<Vec<Dependent>, PlanServiceError> {
        let plan_ids = match plan_filter {
            Some(id) => vec![self.owned_plan(caller, id)?.id],
            None => self
                .plans
                .list_by_owner(caller.user_id)?
                .into_iter()
                .map(|plan| plan.id)
                .collect(),
        };
        Ok(self.dependents.list_by_plans(&plan_ids)?)
    }

    pub fn get_dependent(
        &self,
        caller: Caller,
        id: DependentId,
    ) -> Result<Dependent, PlanServiceError> {
        self.owned_dependent(caller, id)
    }

    pub fn update_dependent(
        &self,
        caller: Caller,
        id: DependentId,
        update: DependentUpdate,
        now: DateTime<Utc>,
    ) -> Result<Dependent, PlanServiceError> {
        let mut dependent = self.owned_dependent(caller, id)?;

        if let Some(name) = update.name {
            dependent.name = require_name(&name, "dependent name is required")?;
        }
        if let Some(relation) = update.relation {
            dependent.relation = relation;
        }
        if let Some(birth_date) = update.birth_date {
            dependent.birth_date = Some(birth_date);
        }
        if let Some(national_id) = update.national_id {
            dependent.national_id = Some(national_id);
        }
        if let Some(notes) = update.notes {
            dependent.notes = Some(notes);
        }
        dependent.updated_at = now;

        self.dependents.update(dependent.clone())?;
        Ok(dependent)
    }

    pub fn delete_dependent(&self, caller: Caller, id: DependentId) -> Result<(), PlanServiceError> {
        let dependent = self.owned_dependent(caller, id)?;

        if self.requests.exists_for_dependent(dependent.id)? {
            return Err(PlanServiceError::HasDependentRecords(
                "dependent still has reimbursement requests",
            ));
        }

        self.dependents.delete(dependent.id)?;
        Ok(())
    }

    /// Plan ids owned by the caller; shared with the reporting surface.
    pub fn owned_plan_ids(&self, caller: Caller) -> Result<Vec<PlanId>, PlanServiceError> {
        Ok(self
            .plans
            .list_by_owner(caller.user_id)?
            .into_iter()
            .map(|plan| plan.id)
            .collect())
    }

    fn owned_plan(&self, caller: Caller, id: PlanId) -> Result<Plan, PlanServiceError> {
        match self.plans.fetch(id)? {
            Some(plan) if plan.owner == caller.user_id => Ok(plan),
            // Existence of other tenants' records must not leak.
            _ => Err(PlanServiceError::NotFound),
        }
    }

    fn owned_dependent(
        &self,
        caller: Caller,
        id: DependentId,
    ) -> Result<Dependent, PlanServiceError> {
        let dependent = self
            .dependents
            .fetch(id)?
            .ok_or(PlanServiceError::NotFound)?;
        self.owned_plan(caller, dependent.plan_id)
            .map_err(|_| PlanServiceError::NotFound)?;
        Ok(dependent)
    }
}

fn require_name(raw: &str, message: &'static str) -> Result<String, PlanServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PlanServiceError::Validation(message.to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum PlanServiceError {
    #[error("record not found")]
    NotFound,
    #[error("deletion blocked: {0}")]
    HasDependentRecords(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PlanServiceError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::HasDependentRecords(_) => "has_dependent_records",
            Self::Validation(_) => "validation_error",
            Self::Repository(_) => "repository_error",
        }
    }
}
