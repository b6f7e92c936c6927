//! Permission hierarchy checks for team deployment grants.
//!
//! A location-scope override only makes sense when it grants more than the
//! deployment-scope level it refines. These checks run before any remote
//! mutation is issued.

use crate::error::{Error, Result};
use crate::types::{LocationGrant, PermissionGrant};

const WHAT: &str = "TeamDeploymentGrant";

/// Validate `locations` against the deployment-scope `deployment` grant.
pub fn validate_location_grants(
    deployment: PermissionGrant,
    locations: &[LocationGrant],
) -> Result<()> {
    let Some(deployment_rank) = deployment.rank() else {
        return Err(Error::invalid(
            WHAT,
            format!(
                "DeploymentGrant must be one of {}",
                join(PermissionGrant::deployment_grants())
            ),
        ));
    };

    for location in locations {
        if !location.grant.is_location_grant() {
            return Err(Error::invalid(
                WHAT,
                format!(
                    "LocationGrant for {} is {}, must be one of {}",
                    location.location_name,
                    location.grant,
                    join(PermissionGrant::location_grants())
                ),
            ));
        }

        // is_location_grant() implies a rank
        let location_rank = location.grant.rank().unwrap_or_default();
        if location_rank <= deployment_rank {
            return Err(Error::invalid(
                WHAT,
                format!(
                    "LocationGrant {} for {} can't be less permissive than or equal to DeploymentGrant {}",
                    location.grant, location.location_name, deployment
                ),
            ));
        }
    }

    Ok(())
}

fn join(grants: &[PermissionGrant]) -> String {
    grants
        .iter()
        .map(|grant| grant.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
