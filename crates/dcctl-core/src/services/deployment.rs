//! Deployment lifecycle and settings.

use std::sync::Arc;

use serde_json::{Value, json};

use super::ensure_absent;
use crate::error::{Error, Result};
use crate::graphql::model::{
    CreateDeploymentData, CreateDeploymentResult, CurrentDeploymentData, DeleteDeploymentData,
    DeleteDeploymentResult, DeploymentsData, SetDeploymentSettingsData,
    SetDeploymentSettingsResult,
};
use crate::graphql::{self, QueryExecutor, operations};
use crate::types::Deployment;

const WHAT: &str = "Deployment";

/// Deployment names are restricted to `^[a-zA-Z0-9-]+$`.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid(
            WHAT,
            format!("name {name:?} must match ^[a-zA-Z0-9-]+$"),
        ))
    }
}

pub struct DeploymentService {
    executor: Arc<dyn QueryExecutor>,
}

impl DeploymentService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// The deployment the executor's endpoint is scoped to.
    pub async fn current(&self) -> Result<Deployment> {
        let data: CurrentDeploymentData = graphql::execute(
            &*self.executor,
            &operations::GET_CURRENT_DEPLOYMENT,
            json!({}),
        )
        .await?;
        Ok(data.current_deployment.into())
    }

    pub async fn list(&self) -> Result<Vec<Deployment>> {
        let data: DeploymentsData =
            graphql::execute(&*self.executor, &operations::LIST_DEPLOYMENTS, json!({})).await?;
        Ok(data.deployments.into_iter().map(Deployment::from).collect())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Deployment> {
        self.list()
            .await?
            .into_iter()
            .find(|deployment| deployment.name == name)
            .ok_or_else(|| Error::not_found(WHAT, "name", name))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Deployment> {
        self.list()
            .await?
            .into_iter()
            .find(|deployment| deployment.id == id)
            .ok_or_else(|| Error::not_found(WHAT, "id", id))
    }

    pub async fn create(&self, name: &str) -> Result<Deployment> {
        validate_name(name)?;
        ensure_absent(self.get_by_name(name).await, WHAT, "name", name)?;

        let data: CreateDeploymentData = graphql::execute(
            &*self.executor,
            &operations::CREATE_DEPLOYMENT,
            json!({ "deploymentName": name }),
        )
        .await?;

        match data.create_deployment {
            CreateDeploymentResult::Deployment(node) => {
                tracing::debug!(name, id = node.deployment_id, "created deployment");
                Ok(node.into())
            }
            CreateDeploymentResult::Duplicate(_) => Err(Error::already_exists(WHAT, "name", name)),
            CreateDeploymentResult::DeploymentLimit(e)
            | CreateDeploymentResult::DeploymentNotFound(e)
            | CreateDeploymentResult::Python(e)
            | CreateDeploymentResult::Unauthorized(e) => Err(e.into_error()),
            CreateDeploymentResult::Unrecognized(typename) => Err(Error::unexpected(
                operations::CREATE_DEPLOYMENT.name,
                typename,
            )),
        }
    }

    /// Replace the settings of the deployment called `name`.
    ///
    /// A missing deployment is `NotFound`; this never creates one.
    pub async fn update_settings(&self, name: &str, settings: Value) -> Result<Deployment> {
        let mut deployment = self.get_by_name(name).await?;
        deployment.settings = self.set_settings(deployment.id, settings).await?;
        Ok(deployment)
    }

    /// Replace the settings of deployment `id`, returning the stored settings.
    pub async fn set_settings(&self, id: i64, settings: Value) -> Result<Value> {
        let data: SetDeploymentSettingsData = graphql::execute(
            &*self.executor,
            &operations::SET_DEPLOYMENT_SETTINGS,
            json!({
                "deploymentId": id,
                "deploymentSettings": { "settings": settings },
            }),
        )
        .await?;

        match data.set_deployment_settings {
            SetDeploymentSettingsResult::Settings(node) => Ok(node.settings),
            SetDeploymentSettingsResult::DeploymentNotFound(_) => {
                Err(Error::not_found(WHAT, "id", id))
            }
            SetDeploymentSettingsResult::DeleteFinalDeployment(e)
            | SetDeploymentSettingsResult::Duplicate(e)
            | SetDeploymentSettingsResult::Python(e)
            | SetDeploymentSettingsResult::Unauthorized(e) => Err(e.into_error()),
            SetDeploymentSettingsResult::Unrecognized(typename) => Err(Error::unexpected(
                operations::SET_DEPLOYMENT_SETTINGS.name,
                typename,
            )),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.get_by_id(id).await?;

        let data: DeleteDeploymentData = graphql::execute(
            &*self.executor,
            &operations::DELETE_DEPLOYMENT,
            json!({ "deploymentId": id }),
        )
        .await?;

        match data.delete_deployment {
            DeleteDeploymentResult::Deleted(_) => {
                tracing::debug!(id, "deleted deployment");
                Ok(())
            }
            DeleteDeploymentResult::DeploymentNotFound(_) => Err(Error::not_found(WHAT, "id", id)),
            DeleteDeploymentResult::DeleteFinalDeployment(e)
            | DeleteDeploymentResult::Python(e)
            | DeleteDeploymentResult::Unauthorized(e) => Err(e.into_error()),
            DeleteDeploymentResult::Unrecognized(typename) => Err(Error::unexpected(
                operations::DELETE_DEPLOYMENT.name,
                typename,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_pattern() {
        assert!(validate_name("prod").is_ok());
        assert!(validate_name("branch-42-Feature").is_ok());

        for bad in ["", "with space", "under_score", "dot.name", "ünï"] {
            let err = validate_name(bad).unwrap_err();
            assert!(err.to_string().contains("must match"), "{bad}");
        }
    }
}
