//! Vault to Anki synchronization
//!
//! `preflight` checks the Anki side is ready, `reconcile` holds the
//! create / skip / replace policy and `pipeline` drives a full pass over the
//! vault.

mod pipeline;
mod preflight;
mod reconcile;

pub use pipeline::{sync_vault, SyncError, SyncSummary};
pub use preflight::{run_preflight, PreflightError, PreflightReport};
pub use reconcile::{decide, Decision, DocumentOutcome, Reconciler};
