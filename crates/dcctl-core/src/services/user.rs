//! Organization users and their permissions.

use std::sync::Arc;

use serde_json::json;

use super::{compile_pattern, ensure_absent};
use crate::error::{Error, Result};
use crate::graphql::model::{
    AddUserData, AddUserResult, RemoveUserData, RemoveUserPermissionsData,
    RemoveUserPermissionsResult, RemoveUserResult, UsersData, UsersResult,
};
use crate::graphql::{self, QueryExecutor, operations};
use crate::types::{PermissionDeploymentScope, User};

const WHAT: &str = "User";

pub struct UserService {
    executor: Arc<dyn QueryExecutor>,
}

impl UserService {
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self { executor }
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let data: UsersData =
            graphql::execute(&*self.executor, &operations::LIST_USERS, json!({})).await?;

        match data.users_or_error {
            UsersResult::Users(list) => Ok(list
                .users
                .into_iter()
                .map(|entry| User::from(entry.user))
                .collect()),
            UsersResult::Python(e) | UsersResult::Unauthorized(e) => Err(e.into_error()),
            UsersResult::Unrecognized(typename) => {
                Err(Error::unexpected(operations::LIST_USERS.name, typename))
            }
        }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User> {
        self.list()
            .await?
            .into_iter()
            .find(|user| user.email == email)
            .ok_or_else(|| Error::not_found(WHAT, "email", email))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User> {
        self.list()
            .await?
            .into_iter()
            .find(|user| user.id == id)
            .ok_or_else(|| Error::not_found(WHAT, "id", id))
    }

    /// Users whose email matches `pattern`. No match is an empty list.
    pub async fn get_by_regex(&self, pattern: &str) -> Result<Vec<User>> {
        let regex = compile_pattern(WHAT, pattern)?;
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|user| regex.is_match(&user.email))
            .collect())
    }

    /// Invite `email` into the organization.
    pub async fn create(&self, email: &str) -> Result<User> {
        ensure_absent(self.get_by_email(email).await, WHAT, "email", email)?;

        let data: AddUserData = graphql::execute(
            &*self.executor,
            &operations::ADD_USER,
            json!({ "email": email }),
        )
        .await?;

        match data.add_user_to_organization {
            AddUserResult::Success(success) => {
                let user = User::from(success.user_with_grants.user);
                tracing::debug!(email, id = user.id, "added user");
                Ok(user)
            }
            AddUserResult::Python(e)
            | AddUserResult::Unauthorized(e)
            | AddUserResult::UserLimit(e) => Err(e.into_error()),
            AddUserResult::Unrecognized(typename) => {
                Err(Error::unexpected(operations::ADD_USER.name, typename))
            }
        }
    }

    pub async fn delete(&self, email: &str) -> Result<()> {
        self.get_by_email(email).await?;

        let data: RemoveUserData = graphql::execute(
            &*self.executor,
            &operations::REMOVE_USER,
            json!({ "email": email }),
        )
        .await?;

        match data.remove_user_from_organization {
            RemoveUserResult::Success(_) => {
                tracing::debug!(email, "removed user");
                Ok(())
            }
            RemoveUserResult::CantRemoveAllAdmins(e)
            | RemoveUserResult::Python(e)
            | RemoveUserResult::Unauthorized(e) => Err(e.into_error()),
            RemoveUserResult::Unrecognized(typename) => {
                Err(Error::unexpected(operations::REMOVE_USER.name, typename))
            }
        }
    }

    /// Drop the user's grant for one deployment scope.
    ///
    /// `deployment_id` is only meaningful for [`PermissionDeploymentScope::Deployment`];
    /// branch-wide grants are not tied to a deployment.
    pub async fn remove_permission(
        &self,
        email: &str,
        deployment_id: Option<i64>,
        scope: PermissionDeploymentScope,
    ) -> Result<()> {
        let data: RemoveUserPermissionsData = graphql::execute(
            &*self.executor,
            &operations::REMOVE_USER_PERMISSIONS,
            json!({
                "userEmail": email,
                "deploymentId": deployment_id,
                "deploymentScope": scope,
            }),
        )
        .await?;

        match data.remove_user_permissions {
            RemoveUserPermissionsResult::Success(_) => Ok(()),
            RemoveUserPermissionsResult::UserNotFound(_) => {
                Err(Error::not_found(WHAT, "email", email))
            }
            RemoveUserPermissionsResult::CantRemoveAllAdmins(e)
            | RemoveUserPermissionsResult::Python(e)
            | RemoveUserPermissionsResult::Unauthorized(e)
            | RemoveUserPermissionsResult::UserLimit(e) => Err(e.into_error()),
            RemoveUserPermissionsResult::Unrecognized(typename) => Err(Error::unexpected(
                operations::REMOVE_USER_PERMISSIONS.name,
                typename,
            )),
        }
    }
}
