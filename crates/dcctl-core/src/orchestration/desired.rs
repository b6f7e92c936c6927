//! Desired-state description read from TOML.
//!
//! ```toml
//! [[deployments]]
//! name = "staging"
//! settings = { run_queue = { max_concurrent_runs = 5 } }
//!
//! [[users]]
//! email = "ada@example.com"
//! remove_default_permissions = true
//!
//! [[code_locations]]
//! location_name = "etl"
//! image = "registry.example.com/etl:1.4"
//! code_source = { module_name = "etl.definitions" }
//!
//! [[teams]]
//! name = "data"
//! members = ["ada@example.com"]
//!
//! [[teams.grants]]
//! deployment = "staging"
//! grant = "VIEWER"
//! location_grants = [{ location_name = "etl", grant = "EDITOR" }]
//!
//! [absent]
//! teams = ["legacy"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::parser;
use crate::error::{Error, Result};
use crate::grant::validate_location_grants;
use crate::services::deployment::validate_name;
use crate::types::{CodeLocation, LocationGrant, PermissionGrant};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredState {
    #[serde(default)]
    pub deployments: Vec<DeploymentSpec>,

    #[serde(default)]
    pub users: Vec<UserSpec>,

    /// Locations in the client's own deployment
    #[serde(default)]
    pub code_locations: Vec<CodeLocation>,

    #[serde(default)]
    pub teams: Vec<TeamSpec>,

    /// Entities that must not exist
    #[serde(default)]
    pub absent: AbsentSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub name: String,
    /// Replaces the stored settings when set; left alone otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub email: String,
    /// Strip the grants a new user receives by default. Only applied on creation.
    #[serde(default)]
    pub remove_default_permissions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSpec {
    pub name: String,
    /// Member emails. Members not listed here are left in place.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub grants: Vec<TeamGrantSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamGrantSpec {
    /// Deployment name
    pub deployment: String,
    pub grant: PermissionGrant,
    #[serde(default)]
    pub location_grants: Vec<LocationGrant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsentSpec {
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub code_locations: Vec<String>,
}

impl DesiredState {
    /// Read and locally validate a desired-state file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let state: Self = parser::parse_toml_file(path)?;
        state
            .validate()
            .with_context(|| format!("Invalid desired state: {}", path.display()))?;
        Ok(state)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let state: Self = parser::parse_toml_str(content)?;
        state.validate()?;
        Ok(state)
    }

    /// Checks that need no remote round-trip.
    pub fn validate(&self) -> Result<()> {
        unique("deployment", self.deployments.iter().map(|d| d.name.as_str()))?;
        unique("user", self.users.iter().map(|u| u.email.as_str()))?;
        unique(
            "code location",
            self.code_locations.iter().map(|l| l.name.as_str()),
        )?;
        unique("team", self.teams.iter().map(|t| t.name.as_str()))?;

        for deployment in &self.deployments {
            validate_name(&deployment.name)?;
        }
        for location in &self.code_locations {
            location.validate()?;
        }
        for team in &self.teams {
            if team.name.trim().is_empty() {
                return Err(Error::invalid("Team", "name is required"));
            }
            unique(
                &format!("grant deployment in team {}", team.name),
                team.grants.iter().map(|g| g.deployment.as_str()),
            )?;
            for grant in &team.grants {
                validate_location_grants(grant.grant, &grant.location_grants)?;
            }
        }

        for team in &self.absent.teams {
            if self.teams.iter().any(|t| &t.name == team) {
                return Err(Error::invalid(
                    "DesiredState",
                    format!("team {team} is both desired and absent"),
                ));
            }
        }
        for user in &self.absent.users {
            if self.users.iter().any(|u| &u.email == user) {
                return Err(Error::invalid(
                    "DesiredState",
                    format!("user {user} is both desired and absent"),
                ));
            }
        }
        for location in &self.absent.code_locations {
            if self.code_locations.iter().any(|l| &l.name == location) {
                return Err(Error::invalid(
                    "DesiredState",
                    format!("code location {location} is both desired and absent"),
                ));
            }
        }

        Ok(())
    }
}

fn unique<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::invalid(
                "DesiredState",
                format!("duplicate {what} {name}"),
            ));
        }
    }
    Ok(())
}
