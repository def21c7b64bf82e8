//! Health plans and the dependents covered by them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Dependent, DependentUpdate, NewDependent, NewPlan, Plan, PlanUpdate, Relation};
pub use repository::{DependentRepository, PlanRepository};
pub use router::{plan_router, PlanRoutes};
pub use service::{PlanService, PlanServiceError};
