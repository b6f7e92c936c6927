//! Wire shapes of remote responses and their conversion into domain types.

use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;

use super::result::{ErrorPayload, discriminated};
use crate::types::{
    Deployment, DeploymentGrant, DeploymentStatus, DeploymentType, LocationGrant, Organization,
    PermissionGrant, Team, User,
};

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VersionData {
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationData {
    pub organization: OrganizationNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationNode {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub account_review: Option<AccountReviewNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountReviewNode {
    pub status: String,
}

impl From<OrganizationNode> for Organization {
    fn from(node: OrganizationNode) -> Self {
        Self {
            id: node.id,
            public_id: node.public_id,
            name: node.name,
            status: node.status,
            account_review_status: node
                .account_review
                .map(|review| review.status)
                .unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Deployments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentNode {
    pub deployment_id: i64,
    pub deployment_name: String,
    pub deployment_status: DeploymentStatus,
    pub deployment_type: DeploymentType,
    #[serde(default)]
    pub deployment_settings: Option<SettingsNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsNode {
    #[serde(default)]
    pub settings: Value,
}

impl From<DeploymentNode> for Deployment {
    fn from(node: DeploymentNode) -> Self {
        Self {
            id: node.deployment_id,
            name: node.deployment_name,
            status: node.deployment_status,
            deployment_type: node.deployment_type,
            settings: node
                .deployment_settings
                .map(|s| s.settings)
                .unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDeploymentData {
    pub current_deployment: DeploymentNode,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentsData {
    pub deployments: Vec<DeploymentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentData {
    pub create_deployment: CreateDeploymentResult,
}

discriminated! {
    pub enum CreateDeploymentResult {
        Deployment("DagsterCloudDeployment") => DeploymentNode,
        DeploymentLimit("DeploymentLimitError") => ErrorPayload,
        DeploymentNotFound("DeploymentNotFoundError") => ErrorPayload,
        Duplicate("DuplicateDeploymentError") => ErrorPayload,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDeploymentData {
    pub delete_deployment: DeleteDeploymentResult,
}

discriminated! {
    pub enum DeleteDeploymentResult {
        Deleted("DagsterCloudDeployment") => IgnoredAny,
        DeleteFinalDeployment("DeleteFinalDeploymentError") => ErrorPayload,
        DeploymentNotFound("DeploymentNotFoundError") => ErrorPayload,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDeploymentSettingsData {
    pub set_deployment_settings: SetDeploymentSettingsResult,
}

discriminated! {
    pub enum SetDeploymentSettingsResult {
        Settings("DeploymentSettings") => SettingsNode,
        DeleteFinalDeployment("DeleteFinalDeploymentError") => ErrorPayload,
        DeploymentNotFound("DeploymentNotFoundError") => ErrorPayload,
        Duplicate("DuplicateDeploymentError") => ErrorPayload,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPermissionsData {
    pub team_permissions: Vec<TeamPermissionNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPermissionNode {
    pub id: String,
    pub team: TeamNode,
    #[serde(default)]
    pub deployment_permission_grants: Vec<GrantNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberNode>,
}

impl From<TeamNode> for Team {
    fn from(node: TeamNode) -> Self {
        Self {
            id: node.id,
            name: node.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberNode {
    pub user_id: i64,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantNode {
    pub id: i64,
    /// Absent for organization-scoped grants.
    #[serde(default)]
    pub deployment_id: Option<i64>,
    pub grant: PermissionGrant,
    #[serde(default)]
    pub location_grants: Vec<LocationGrantNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationGrantNode {
    pub location_name: String,
    pub grant: PermissionGrant,
}

impl GrantNode {
    pub fn into_deployment_grant(self) -> Option<DeploymentGrant> {
        let deployment_id = self.deployment_id?;
        Some(DeploymentGrant {
            id: self.id,
            deployment_id,
            grant: self.grant,
            location_grants: self
                .location_grants
                .into_iter()
                .map(|node| LocationGrant::new(node.location_name, node.grant))
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamData {
    pub create_or_update_team: CreateTeamResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamSuccess {
    pub team: TeamNode,
}

discriminated! {
    pub enum CreateTeamResult {
        Success("CreateOrUpdateTeamSuccess") => CreateTeamSuccess,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTeamData {
    pub rename_team: RenameTeamResult,
}

discriminated! {
    pub enum RenameTeamResult {
        Team("DagsterCloudTeam") => TeamNode,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTeamData {
    pub delete_team: DeleteTeamResult,
}

discriminated! {
    pub enum DeleteTeamResult {
        Success("DeleteTeamSuccess") => IgnoredAny,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTeamMemberData {
    pub add_member_to_team: AddTeamMemberResult,
}

discriminated! {
    pub enum AddTeamMemberResult {
        Success("AddMemberToTeamSuccess") => IgnoredAny,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
        UserLimit("UserLimitError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTeamMemberData {
    pub remove_member_from_team: RemoveTeamMemberResult,
}

discriminated! {
    pub enum RemoveTeamMemberResult {
        Success("RemoveMemberFromTeamSuccess") => IgnoredAny,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPermissionData {
    pub create_or_update_team_permission: TeamPermissionResult,
}

discriminated! {
    pub enum TeamPermissionResult {
        Success("CreateOrUpdateTeamPermissionSuccess") => IgnoredAny,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
        UserLimit("UserLimitError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTeamPermissionData {
    pub remove_team_permission: RemoveTeamPermissionResult,
}

discriminated! {
    pub enum RemoveTeamPermissionResult {
        Success("RemoveTeamPermissionSuccess") => IgnoredAny,
        CantRemoveAllAdmins("CantRemoveAllAdminsError") => ErrorPayload,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNode {
    pub user_id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub is_scim_provisioned: bool,
}

impl From<UserNode> for User {
    fn from(node: UserNode) -> Self {
        Self {
            id: node.user_id,
            name: node.name.unwrap_or_default(),
            email: node.email,
            picture: node.picture.filter(|p| !p.is_empty()),
            is_scim_provisioned: node.is_scim_provisioned,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserWithGrantsNode {
    pub user: UserNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserList {
    pub users: Vec<UserWithGrantsNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersData {
    pub users_or_error: UsersResult,
}

discriminated! {
    pub enum UsersResult {
        Users("DagsterCloudUsersWithScopedPermissionGrants") => UserList,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserData {
    pub add_user_to_organization: AddUserResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserSuccess {
    pub user_with_grants: UserWithGrantsNode,
}

discriminated! {
    pub enum AddUserResult {
        Success("AddUserToOrganizationSuccess") => AddUserSuccess,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
        UserLimit("UserLimitError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUserData {
    pub remove_user_from_organization: RemoveUserResult,
}

discriminated! {
    pub enum RemoveUserResult {
        Success("RemoveUserFromOrganizationSuccess") => IgnoredAny,
        CantRemoveAllAdmins("CantRemoveAllAdminsError") => ErrorPayload,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUserPermissionsData {
    pub remove_user_permissions: RemoveUserPermissionsResult,
}

discriminated! {
    pub enum RemoveUserPermissionsResult {
        Success("DagsterCloudUserWithScopedPermissionGrants") => IgnoredAny,
        CantRemoveAllAdmins("CantRemoveAllAdminsError") => ErrorPayload,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
        UserLimit("UserLimitError") => ErrorPayload,
        UserNotFound("UserNotFoundError") => ErrorPayload,
    }
}

// ---------------------------------------------------------------------------
// Code locations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsDocumentData {
    pub locations_as_document: LocationsDocumentNode,
}

#[derive(Debug, Deserialize)]
pub struct LocationsDocumentNode {
    #[serde(default)]
    pub document: Value,
}

/// The workspace document: one raw entry per code location.
#[derive(Debug, Default, Deserialize)]
pub struct LocationsDocument {
    #[serde(default)]
    pub locations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOrUpdateLocationData {
    pub add_or_update_location: AddOrUpdateLocationResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOrUpdateLocationFromDocumentData {
    pub add_or_update_location_from_document: AddOrUpdateLocationResult,
}

discriminated! {
    pub enum AddOrUpdateLocationResult {
        WorkspaceEntry("WorkspaceEntry") => IgnoredAny,
        InvalidLocation("InvalidLocationError") => ErrorPayload,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLocationData {
    pub delete_location: DeleteLocationResult,
}

discriminated! {
    pub enum DeleteLocationResult {
        Success("DeleteLocationSuccess") => IgnoredAny,
        Python("PythonError") => ErrorPayload,
        Unauthorized("UnauthorizedError") => ErrorPayload,
    }
}
