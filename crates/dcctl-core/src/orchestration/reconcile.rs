//! Converge the remote platform towards a [`DesiredState`].
//!
//! Each `ensure_*` step reads the live entity, compares, and mutates only on
//! a difference. `remove_*` steps treat a missing entity as already removed.
//! Steps run sequentially in declaration order and stop at the first error.

use std::fmt;

use crate::client::DagsterClient;
use crate::error::{OptionalExt, Result};
use crate::orchestration::desired::{DeploymentSpec, DesiredState, TeamGrantSpec, TeamSpec, UserSpec};
use crate::types::{CodeLocation, DeploymentGrant, LocationGrant, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Changed,
    NoOp,
}

impl Outcome {
    fn or(self, other: Outcome) -> Outcome {
        if self == Outcome::Changed || other == Outcome::Changed {
            Outcome::Changed
        } else {
            Outcome::NoOp
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed => write!(f, "changed"),
            Self::NoOp => write!(f, "unchanged"),
        }
    }
}

/// One converged entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: &'static str,
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub steps: Vec<Step>,
}

impl ReconcileReport {
    fn record(&mut self, kind: &'static str, name: &str, outcome: Outcome) {
        if outcome == Outcome::Changed {
            tracing::info!(kind, name, "converged");
        }
        self.steps.push(Step {
            kind,
            name: name.to_string(),
            outcome,
        });
    }

    pub fn changed(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.outcome == Outcome::Changed)
            .count()
    }
}

pub struct Reconciler<'a> {
    client: &'a DagsterClient,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a DagsterClient) -> Self {
        Self { client }
    }

    /// Converge every entity in `state`.
    ///
    /// Order: deployments, users, code locations, teams, then removals, so
    /// that teams can reference the users and deployments declared alongside.
    pub async fn apply(&self, state: &DesiredState) -> Result<ReconcileReport> {
        state.validate()?;
        let mut report = ReconcileReport::default();

        for deployment in &state.deployments {
            let outcome = self.ensure_deployment(deployment).await?;
            report.record("deployment", &deployment.name, outcome);
        }
        for user in &state.users {
            let outcome = self.ensure_user(user).await?;
            report.record("user", &user.email, outcome);
        }
        for location in &state.code_locations {
            let outcome = self.ensure_code_location(location).await?;
            report.record("code_location", &location.name, outcome);
        }
        for team in &state.teams {
            let outcome = self.ensure_team(team).await?;
            report.record("team", &team.name, outcome);
        }

        for name in &state.absent.teams {
            let outcome = self.remove_team(name).await?;
            report.record("team", name, outcome);
        }
        for email in &state.absent.users {
            let outcome = self.remove_user(email).await?;
            report.record("user", email, outcome);
        }
        for name in &state.absent.code_locations {
            let outcome = self.remove_code_location(name).await?;
            report.record("code_location", name, outcome);
        }

        Ok(report)
    }

    pub async fn ensure_deployment(&self, spec: &DeploymentSpec) -> Result<Outcome> {
        let deployments = self.client.deployments();

        let (deployment, created) = match deployments.get_by_name(&spec.name).await.optional()? {
            Some(existing) => (existing, false),
            None => (deployments.create(&spec.name).await?, true),
        };

        let settings_outcome = match &spec.settings {
            Some(settings) if *settings != deployment.settings => {
                deployments.set_settings(deployment.id, settings.clone()).await?;
                Outcome::Changed
            }
            _ => Outcome::NoOp,
        };

        Ok(changed_if(created).or(settings_outcome))
    }

    pub async fn ensure_user(&self, spec: &UserSpec) -> Result<Outcome> {
        let users = self.client.users();
        if users.get_by_email(&spec.email).await.optional()?.is_some() {
            return Ok(Outcome::NoOp);
        }

        users.create(&spec.email).await?;
        if spec.remove_default_permissions {
            self.client.remove_all_user_permissions(&spec.email).await?;
        }
        Ok(Outcome::Changed)
    }

    pub async fn ensure_code_location(&self, desired: &CodeLocation) -> Result<Outcome> {
        let locations = self.client.code_locations();
        match locations.get_by_name(&desired.name).await.optional()? {
            None => {
                locations.create(desired).await?;
                Ok(Outcome::Changed)
            }
            Some(existing) if existing.normalized() == desired.normalized() => Ok(Outcome::NoOp),
            Some(_) => {
                locations.update(desired).await?;
                Ok(Outcome::Changed)
            }
        }
    }

    pub async fn ensure_team(&self, spec: &TeamSpec) -> Result<Outcome> {
        let teams = self.client.teams();

        let (team, mut outcome) = match teams.get_by_name(&spec.name).await.optional()? {
            Some(existing) => (existing, Outcome::NoOp),
            None => (teams.create(&spec.name).await?, Outcome::Changed),
        };

        for email in &spec.members {
            let user = self.client.users().get_by_email(email).await?;
            if !teams.is_member(&team.id, user.id).await? {
                teams.add_member(&team.id, user.id).await?;
                outcome = Outcome::Changed;
            }
        }

        for grant in &spec.grants {
            outcome = outcome.or(self.ensure_team_grant(&team, grant).await?);
        }

        Ok(outcome)
    }

    async fn ensure_team_grant(&self, team: &Team, spec: &TeamGrantSpec) -> Result<Outcome> {
        let deployment = self.client.deployments().get_by_name(&spec.deployment).await?;
        let teams = self.client.teams();

        let existing = teams
            .get_deployment_grant(&team.id, deployment.id)
            .await
            .optional()?;
        if existing.is_some_and(|current| grant_matches(&current, spec)) {
            return Ok(Outcome::NoOp);
        }

        teams
            .create_or_update_deployment_grant(
                &team.id,
                deployment.id,
                spec.grant,
                &spec.location_grants,
            )
            .await?;
        Ok(Outcome::Changed)
    }

    pub async fn remove_team(&self, name: &str) -> Result<Outcome> {
        let teams = self.client.teams();
        let Some(team) = teams.get_by_name(name).await.optional()? else {
            tracing::warn!(name, "team already absent");
            return Ok(Outcome::NoOp);
        };
        absorb_not_found(teams.delete(&team.id).await, "team", name)
    }

    pub async fn remove_user(&self, email: &str) -> Result<Outcome> {
        absorb_not_found(self.client.users().delete(email).await, "user", email)
    }

    pub async fn remove_code_location(&self, name: &str) -> Result<Outcome> {
        absorb_not_found(
            self.client.code_locations().delete(name).await,
            "code location",
            name,
        )
    }
}

fn changed_if(changed: bool) -> Outcome {
    if changed { Outcome::Changed } else { Outcome::NoOp }
}

fn absorb_not_found(result: Result<()>, kind: &str, name: &str) -> Result<Outcome> {
    match result.optional()? {
        Some(()) => Ok(Outcome::Changed),
        None => {
            tracing::warn!(kind, name, "already absent");
            Ok(Outcome::NoOp)
        }
    }
}

fn grant_matches(current: &DeploymentGrant, spec: &TeamGrantSpec) -> bool {
    fn sorted(grants: &[LocationGrant]) -> Vec<&LocationGrant> {
        let mut grants: Vec<_> = grants.iter().collect();
        grants.sort_by(|a, b| a.location_name.cmp(&b.location_name));
        grants
    }

    current.grant == spec.grant
        && sorted(&current.location_grants) == sorted(&spec.location_grants)
}
