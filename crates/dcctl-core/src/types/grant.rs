//! Permission grants and their fixed hierarchy.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A permission level.
///
/// `Agent` exists on the platform but sits outside the user-facing
/// hierarchy; it is never valid for team grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionGrant {
    Viewer,
    Launcher,
    Editor,
    Admin,
    Agent,
}

static GRANTS_BY_NAME: LazyLock<HashMap<&'static str, PermissionGrant>> = LazyLock::new(|| {
    HashMap::from([
        ("VIEWER", PermissionGrant::Viewer),
        ("LAUNCHER", PermissionGrant::Launcher),
        ("EDITOR", PermissionGrant::Editor),
        ("ADMIN", PermissionGrant::Admin),
        ("AGENT", PermissionGrant::Agent),
    ])
});

/// Deployment-scope levels, least to most permissive.
const DEPLOYMENT_GRANTS: [PermissionGrant; 4] = [
    PermissionGrant::Viewer,
    PermissionGrant::Launcher,
    PermissionGrant::Editor,
    PermissionGrant::Admin,
];

/// Levels allowed as a location-scope override.
const LOCATION_GRANTS: [PermissionGrant; 3] = [
    PermissionGrant::Launcher,
    PermissionGrant::Editor,
    PermissionGrant::Admin,
];

impl PermissionGrant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "VIEWER",
            Self::Launcher => "LAUNCHER",
            Self::Editor => "EDITOR",
            Self::Admin => "ADMIN",
            Self::Agent => "AGENT",
        }
    }

    /// Position in the deployment hierarchy; `None` for `Agent`.
    pub fn rank(self) -> Option<usize> {
        DEPLOYMENT_GRANTS.iter().position(|grant| *grant == self)
    }

    pub fn is_location_grant(self) -> bool {
        LOCATION_GRANTS.contains(&self)
    }

    /// All grant names accepted by [`FromStr`], sorted.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<_> = GRANTS_BY_NAME.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn deployment_grants() -> &'static [PermissionGrant] {
        &DEPLOYMENT_GRANTS
    }

    pub fn location_grants() -> &'static [PermissionGrant] {
        &LOCATION_GRANTS
    }
}

impl fmt::Display for PermissionGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionGrant {
    type Err = Error;

    /// Case-insensitive lookup.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GRANTS_BY_NAME
            .get(s.to_uppercase().as_str())
            .copied()
            .ok_or_else(|| {
                Error::invalid(
                    "PermissionGrant",
                    format!("could not convert ({s}) to grant enum"),
                )
            })
    }
}

/// Which deployments a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionDeploymentScope {
    Deployment,
    AllBranchDeployments,
}

/// A location-scope override within a deployment grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationGrant {
    #[serde(alias = "location")]
    pub location_name: String,
    pub grant: PermissionGrant,
}

impl LocationGrant {
    pub fn new(location_name: impl Into<String>, grant: PermissionGrant) -> Self {
        Self {
            location_name: location_name.into(),
            grant,
        }
    }
}

/// A team's grant on one deployment.
///
/// The id changes on every update; look grants up by (team, deployment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentGrant {
    pub id: i64,
    pub deployment_id: i64,
    pub grant: PermissionGrant,
    #[serde(default)]
    pub location_grants: Vec<LocationGrant>,
}
