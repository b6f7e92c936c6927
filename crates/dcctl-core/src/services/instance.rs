//! Organization-wide queries.

use std::sync::Arc;

use serde_json::json;

use crate::error::Result;
use crate::graphql::model::{OrganizationData, VersionData};
use crate::graphql::{self, QueryExecutor, operations};
use crate::types::Organization;

pub struct InstanceService {
    executor: Arc<dyn QueryExecutor>,
}

impl InstanceService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    /// Platform version string.
    pub async fn version(&self) -> Result<String> {
        let data: VersionData =
            graphql::execute(&*self.executor, &operations::GET_VERSION, json!({})).await?;
        Ok(data.version)
    }

    pub async fn organization(&self) -> Result<Organization> {
        let data: OrganizationData =
            graphql::execute(&*self.executor, &operations::GET_ORGANIZATION, json!({})).await?;
        Ok(data.organization.into())
    }
}
