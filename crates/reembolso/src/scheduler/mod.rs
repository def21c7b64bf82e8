//! Periodic background sweeps.
//!
//! The sweeps share no in-memory state with each other or with request
//! mutation; they communicate only through the record store, so they may run
//! concurrently. The periodic drivers live in the API service; each sweep
//! here is a synchronous function of an injected `now`.

pub mod housekeeping;
pub mod reminders;

pub use housekeeping::{AccountPurge, PurgeSummary};
pub use reminders::{ReminderSweep, SweepSummary};
