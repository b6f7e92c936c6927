//! Domain types for remote platform entities.

pub mod code_location;
pub mod grant;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use code_location::{CodeLocation, CodeSource, GitRef};
pub use grant::{DeploymentGrant, LocationGrant, PermissionDeploymentScope, PermissionGrant};

/// Lifecycle state of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Active,
    PendingDeletion,
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::PendingDeletion => write!(f, "PENDING_DELETION"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentType {
    Production,
    Dev,
    Branch,
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "PRODUCTION"),
            Self::Dev => write!(f, "DEV"),
            Self::Branch => write!(f, "BRANCH"),
        }
    }
}

/// A named execution environment hosted by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: i64,
    pub name: String,
    pub status: DeploymentStatus,
    #[serde(rename = "type")]
    pub deployment_type: DeploymentType,
    /// Opaque settings document.
    #[serde(default)]
    pub settings: Value,
}

/// A team. The id survives renames, the name does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default)]
    pub is_scim_provisioned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub status: String,
    pub account_review_status: String,
}
