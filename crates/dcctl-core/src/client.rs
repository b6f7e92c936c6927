//! Client facade over the entity services.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::graphql::QueryExecutor;
use crate::services::{
    CodeLocationService, DeploymentService, InstanceService, TeamService, UserService,
};
use crate::transport::{self, HttpExecutor};
use crate::types::PermissionDeploymentScope;

/// One organization/deployment connection with every entity service bound
/// to the same executor.
pub struct DagsterClient {
    deployment: String,
    instance: InstanceService,
    deployments: DeploymentService,
    teams: TeamService,
    code_locations: CodeLocationService,
    users: UserService,
}

impl DagsterClient {
    /// Connect over HTTP using `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let endpoint = transport::endpoint_url(&config.organization, &config.deployment)?;
        tracing::debug!(%endpoint, "connecting");
        let executor = HttpExecutor::new(endpoint, &config.auth_headers(), config.timeout())?;
        Ok(Self::with_executor(Arc::new(executor), &config.deployment))
    }

    /// Bind the services to an arbitrary executor scoped to `deployment`.
    pub fn with_executor(executor: Arc<dyn QueryExecutor>, deployment: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
            instance: InstanceService::new(executor.clone()),
            deployments: DeploymentService::new(executor.clone()),
            teams: TeamService::new(executor.clone()),
            code_locations: CodeLocationService::new(executor.clone()),
            users: UserService::new(executor),
        }
    }

    /// Name of the deployment this client is scoped to.
    pub fn deployment_name(&self) -> &str {
        &self.deployment
    }

    pub fn instance(&self) -> &InstanceService {
        &self.instance
    }

    pub fn deployments(&self) -> &DeploymentService {
        &self.deployments
    }

    pub fn teams(&self) -> &TeamService {
        &self.teams
    }

    pub fn code_locations(&self) -> &CodeLocationService {
        &self.code_locations
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    /// Delete deployment `name`.
    ///
    /// Only the deployment this client is scoped to can be destroyed, since
    /// code locations are listed through that scope. With locations still
    /// present the call is refused unless `force` is set.
    pub async fn destroy_deployment(&self, name: &str, force: bool) -> Result<()> {
        if name != self.deployment {
            return Err(Error::invalid(
                "Deployment",
                format!(
                    "can't delete deployment {name} with a client configured for deployment {}",
                    self.deployment
                ),
            ));
        }

        let deployment = self.deployments.get_by_name(name).await?;
        let locations = self.code_locations.list().await?;
        if !force && !locations.is_empty() {
            return Err(Error::invalid(
                "Deployment",
                format!(
                    "deployment {name} still contains {} code location(s), use force to delete it anyway",
                    locations.len()
                ),
            ));
        }

        if !locations.is_empty() {
            tracing::warn!(name, locations = locations.len(), "force-deleting deployment with code locations");
        }
        self.deployments.delete(deployment.id).await
    }

    /// Strip the default grants a newly added user receives: one per
    /// deployment plus the branch-deployment wildcard.
    pub async fn remove_all_user_permissions(&self, email: &str) -> Result<()> {
        for deployment in self.deployments.list().await? {
            self.users
                .remove_permission(email, Some(deployment.id), PermissionDeploymentScope::Deployment)
                .await?;
        }

        self.users
            .remove_permission(email, None, PermissionDeploymentScope::AllBranchDeployments)
            .await
    }
}
