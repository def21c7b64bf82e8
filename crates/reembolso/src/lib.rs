//! Core library for a multi-tenant health-insurance reimbursement tracker.
//!
//! Users register health plans, dependents, and reimbursement requests,
//! attach supporting documents, and track each request through a fixed
//! workflow of statuses until insurer payout. Persistence, identity, file
//! storage, mail delivery, and image re-encoding sit behind collaborator
//! traits so the domain logic is testable with in-memory doubles.

pub mod admin;
pub mod catalog;
pub mod config;
pub mod documents;
pub mod domain;
pub mod error;
pub mod identity;
pub mod notify;
pub mod plans;
pub mod reimbursements;
pub mod reports;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod users;
