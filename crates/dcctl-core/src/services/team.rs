//! Teams, their members and their per-deployment grants.
//!
//! Every read goes through the team-permissions listing, which returns each
//! team together with its members and grants.

use std::sync::Arc;

use serde_json::json;

use super::{compile_pattern, ensure_absent};
use crate::error::{Error, Result};
use crate::grant::validate_location_grants;
use crate::graphql::model::{
    AddTeamMemberData, AddTeamMemberResult, CreateTeamData, CreateTeamResult, DeleteTeamData,
    DeleteTeamResult, RemoveTeamMemberData, RemoveTeamMemberResult, RemoveTeamPermissionData,
    RemoveTeamPermissionResult, RenameTeamData, RenameTeamResult, TeamPermissionData,
    TeamPermissionNode, TeamPermissionResult, TeamPermissionsData,
};
use crate::graphql::{self, QueryExecutor, operations};
use crate::types::{
    DeploymentGrant, LocationGrant, PermissionDeploymentScope, PermissionGrant, Team,
};

const WHAT: &str = "Team";
const GRANT: &str = "TeamDeploymentGrant";

pub struct TeamService {
    executor: Arc<dyn QueryExecutor>,
}

impl TeamService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    async fn permissions(&self) -> Result<Vec<TeamPermissionNode>> {
        let data: TeamPermissionsData = graphql::execute(
            &*self.executor,
            &operations::LIST_TEAM_PERMISSIONS,
            json!({}),
        )
        .await?;
        Ok(data.team_permissions)
    }

    async fn permission_for(&self, team_id: &str) -> Result<TeamPermissionNode> {
        self.permissions()
            .await?
            .into_iter()
            .find(|node| node.team.id == team_id)
            .ok_or_else(|| Error::not_found(WHAT, "id", team_id))
    }

    pub async fn list(&self) -> Result<Vec<Team>> {
        Ok(self
            .permissions()
            .await?
            .into_iter()
            .map(|node| Team::from(node.team))
            .collect())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Team> {
        self.list()
            .await?
            .into_iter()
            .find(|team| team.name == name)
            .ok_or_else(|| Error::not_found(WHAT, "name", name))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Team> {
        self.permission_for(id).await.map(|node| node.team.into())
    }

    /// Teams whose name matches `pattern`. No match is an empty list.
    pub async fn get_by_regex(&self, pattern: &str) -> Result<Vec<Team>> {
        let regex = compile_pattern(WHAT, pattern)?;
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|team| regex.is_match(&team.name))
            .collect())
    }

    pub async fn create(&self, name: &str) -> Result<Team> {
        ensure_absent(self.get_by_name(name).await, WHAT, "name", name)?;

        let data: CreateTeamData = graphql::execute(
            &*self.executor,
            &operations::CREATE_TEAM,
            json!({ "name": name }),
        )
        .await?;

        match data.create_or_update_team {
            CreateTeamResult::Success(success) => {
                let team = Team::from(success.team);
                tracing::debug!(name, id = %team.id, "created team");
                Ok(team)
            }
            CreateTeamResult::Python(e) | CreateTeamResult::Unauthorized(e) => {
                Err(e.into_error())
            }
            CreateTeamResult::Unrecognized(typename) => {
                Err(Error::unexpected(operations::CREATE_TEAM.name, typename))
            }
        }
    }

    /// Rename team `id` to `name`. The id is unchanged.
    pub async fn rename(&self, name: &str, id: &str) -> Result<Team> {
        self.get_by_id(id).await?;

        let data: RenameTeamData = graphql::execute(
            &*self.executor,
            &operations::RENAME_TEAM,
            json!({ "name": name, "teamId": id }),
        )
        .await?;

        match data.rename_team {
            RenameTeamResult::Team(node) => Ok(node.into()),
            RenameTeamResult::Python(e) | RenameTeamResult::Unauthorized(e) => {
                Err(e.into_error())
            }
            RenameTeamResult::Unrecognized(typename) => {
                Err(Error::unexpected(operations::RENAME_TEAM.name, typename))
            }
        }
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.get_by_id(id).await?;

        let data: DeleteTeamData = graphql::execute(
            &*self.executor,
            &operations::DELETE_TEAM,
            json!({ "teamId": id }),
        )
        .await?;

        match data.delete_team {
            DeleteTeamResult::Success(_) => {
                tracing::debug!(id, "deleted team");
                Ok(())
            }
            DeleteTeamResult::Python(e) | DeleteTeamResult::Unauthorized(e) => {
                Err(e.into_error())
            }
            DeleteTeamResult::Unrecognized(typename) => {
                Err(Error::unexpected(operations::DELETE_TEAM.name, typename))
            }
        }
    }

    // -- membership ---------------------------------------------------------

    pub async fn is_member(&self, team_id: &str, user_id: i64) -> Result<bool> {
        let node = self.permission_for(team_id).await?;
        Ok(node.team.members.iter().any(|member| member.user_id == user_id))
    }

    pub async fn add_member(&self, team_id: &str, user_id: i64) -> Result<()> {
        self.get_by_id(team_id).await?;

        let data: AddTeamMemberData = graphql::execute(
            &*self.executor,
            &operations::ADD_TEAM_MEMBER,
            json!({ "memberId": user_id, "teamId": team_id }),
        )
        .await?;

        match data.add_member_to_team {
            AddTeamMemberResult::Success(_) => Ok(()),
            AddTeamMemberResult::Python(e)
            | AddTeamMemberResult::Unauthorized(e)
            | AddTeamMemberResult::UserLimit(e) => Err(e.into_error()),
            AddTeamMemberResult::Unrecognized(typename) => {
                Err(Error::unexpected(operations::ADD_TEAM_MEMBER.name, typename))
            }
        }
    }

    pub async fn remove_member(&self, team_id: &str, user_id: i64) -> Result<()> {
        if !self.is_member(team_id, user_id).await? {
            return Err(Error::not_found(
                "TeamMember",
                "team_id/user_id",
                format!("{team_id}/{user_id}"),
            ));
        }

        let data: RemoveTeamMemberData = graphql::execute(
            &*self.executor,
            &operations::REMOVE_TEAM_MEMBER,
            json!({ "memberId": user_id, "teamId": team_id }),
        )
        .await?;

        match data.remove_member_from_team {
            RemoveTeamMemberResult::Success(_) => Ok(()),
            RemoveTeamMemberResult::Python(e) | RemoveTeamMemberResult::Unauthorized(e) => {
                Err(e.into_error())
            }
            RemoveTeamMemberResult::Unrecognized(typename) => Err(Error::unexpected(
                operations::REMOVE_TEAM_MEMBER.name,
                typename,
            )),
        }
    }

    // -- grants -------------------------------------------------------------

    /// The team's grant on `deployment_id`.
    pub async fn get_deployment_grant(
        &self,
        team_id: &str,
        deployment_id: i64,
    ) -> Result<DeploymentGrant> {
        self.permission_for(team_id)
            .await?
            .deployment_permission_grants
            .into_iter()
            .filter_map(|node| node.into_deployment_grant())
            .find(|grant| grant.deployment_id == deployment_id)
            .ok_or_else(|| grant_not_found(team_id, deployment_id))
    }

    /// Set the team's grant on `deployment_id`, replacing any existing one.
    ///
    /// The grant id changes on every write, so the stored grant is re-read
    /// by (team, deployment) before returning.
    pub async fn create_or_update_deployment_grant(
        &self,
        team_id: &str,
        deployment_id: i64,
        grant: PermissionGrant,
        location_grants: &[LocationGrant],
    ) -> Result<DeploymentGrant> {
        validate_location_grants(grant, location_grants)?;

        let location_grants: Vec<_> = location_grants
            .iter()
            .map(|lg| json!({ "locationName": lg.location_name, "grant": lg.grant }))
            .collect();

        let data: TeamPermissionData = graphql::execute(
            &*self.executor,
            &operations::CREATE_OR_UPDATE_TEAM_PERMISSION,
            json!({
                "deploymentId": deployment_id,
                "deploymentScope": PermissionDeploymentScope::Deployment,
                "grant": grant,
                "locationGrants": location_grants,
                "teamId": team_id,
            }),
        )
        .await?;

        match data.create_or_update_team_permission {
            TeamPermissionResult::Success(_) => {
                tracing::debug!(team_id, deployment_id, %grant, "wrote team grant");
            }
            TeamPermissionResult::Python(e)
            | TeamPermissionResult::Unauthorized(e)
            | TeamPermissionResult::UserLimit(e) => return Err(e.into_error()),
            TeamPermissionResult::Unrecognized(typename) => {
                return Err(Error::unexpected(
                    operations::CREATE_OR_UPDATE_TEAM_PERMISSION.name,
                    typename,
                ));
            }
        }

        self.get_deployment_grant(team_id, deployment_id).await
    }

    pub async fn remove_deployment_grant(&self, team_id: &str, deployment_id: i64) -> Result<()> {
        self.get_deployment_grant(team_id, deployment_id).await?;

        let data: RemoveTeamPermissionData = graphql::execute(
            &*self.executor,
            &operations::REMOVE_TEAM_PERMISSION,
            json!({
                "deploymentId": deployment_id,
                "deploymentScope": PermissionDeploymentScope::Deployment,
                "teamId": team_id,
            }),
        )
        .await?;

        match data.remove_team_permission {
            RemoveTeamPermissionResult::Success(_) => Ok(()),
            RemoveTeamPermissionResult::CantRemoveAllAdmins(e)
            | RemoveTeamPermissionResult::Python(e)
            | RemoveTeamPermissionResult::Unauthorized(e) => Err(e.into_error()),
            RemoveTeamPermissionResult::Unrecognized(typename) => Err(Error::unexpected(
                operations::REMOVE_TEAM_PERMISSION.name,
                typename,
            )),
        }
    }
}

fn grant_not_found(team_id: &str, deployment_id: i64) -> Error {
    Error::not_found(
        GRANT,
        "team_id/deployment_id",
        format!("{team_id}/{deployment_id}"),
    )
}
