use crate::domain::{DependentId, PlanId, UserId};
use crate::store::RepositoryError;

use super::domain::{Dependent, Plan};

pub trait PlanRepository: Send + Sync {
    fn insert(&self, plan: Plan) -> Result<Plan, RepositoryError>;
    fn update(&self, plan: Plan) -> Result<(), RepositoryError>;
    fn fetch(&self, id: PlanId) -> Result<Option<Plan>, RepositoryError>;
    /// Newest-first plans owned by the given user.
    fn list_by_owner(&self, owner: UserId) -> Result<Vec<Plan>, RepositoryError>;
    fn delete(&self, id: PlanId) -> Result<(), RepositoryError>;
    fn all(&self) -> Result<Vec<Plan>, RepositoryError>;
}

pub trait DependentRepository: Send + Sync {
    fn insert(&self, dependent: Dependent) -> Result<Dependent, RepositoryError>;
    fn update(&self, dependent: Dependent) -> Result<(), RepositoryError>;
    fn fetch(&self, id: DependentId) -> Result<Option<Dependent>, RepositoryError>;
    /// Newest-first dependents across the given plans.
    fn list_by_plans(&self, plans: &[PlanId]) -> Result<Vec<Dependent>, RepositoryError>;
    fn exists_for_plan(&self, plan: PlanId) -> Result<bool, RepositoryError>;
    fn delete(&self, id: DependentId) -> Result<(), RepositoryError>;
}
