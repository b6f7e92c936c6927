//! dcctl Core Library
//!
//! Declarative management of Dagster Cloud deployments, teams, code
//! locations, users and permission grants through the platform's GraphQL API.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod grant;
pub mod graphql;
pub mod orchestration;
pub mod services;
pub mod transport;
pub mod types;

pub use client::DagsterClient;
pub use error::{Error, ErrorKind, OptionalExt, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Client
    pub use crate::client::DagsterClient;
    pub use crate::config::{ClientConfig, ConfigStore};

    // Errors
    pub use crate::error::{Error, ErrorKind, OptionalExt, Result};

    // Entities
    pub use crate::types::{
        CodeLocation, CodeSource, Deployment, DeploymentGrant, DeploymentStatus, DeploymentType,
        GitRef, LocationGrant, Organization, PermissionDeploymentScope, PermissionGrant, Team,
        User,
    };

    // Remote execution
    pub use crate::graphql::{GraphQlRequest, QueryExecutor};
    pub use crate::transport::{HttpExecutor, TransportError};

    // Reconciliation
    pub use crate::orchestration::{DesiredState, Outcome, Reconciler};
}
