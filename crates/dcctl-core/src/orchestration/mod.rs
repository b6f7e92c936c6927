//! Desired-state reconciliation.

pub mod desired;
pub mod reconcile;

pub use desired::{AbsentSpec, DeploymentSpec, DesiredState, TeamGrantSpec, TeamSpec, UserSpec};
pub use reconcile::{Outcome, ReconcileReport, Reconciler, Step};
