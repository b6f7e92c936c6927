mod support;

use serde_json::json;

use dcctl_core::ErrorKind;
use dcctl_core::types::PermissionDeploymentScope;
use support::{FakePlatform, client};

#[tokio::test]
async fn create_then_lookup_by_email_and_id() {
    let platform = FakePlatform::new();
    let client = client(&platform);

    let user = client.users().create("ada@example.com").await.unwrap();

    assert_eq!(user.email, "ada@example.com");
    assert_eq!(client.users().get_by_email("ada@example.com").await.unwrap(), user);
    assert_eq!(client.users().get_by_id(user.id).await.unwrap(), user);
}

#[tokio::test]
async fn create_twice_is_already_exists() {
    let platform = FakePlatform::new();
    platform.add_user("ada@example.com");
    let client = client(&platform);

    let err = client.users().create("ada@example.com").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(err.to_string(), "User email=ada@example.com already exists");
}

#[tokio::test]
async fn user_limit_is_api_error() {
    let platform = FakePlatform::new();
    platform.respond_with(
        "AddUser",
        json!({ "addUserToOrganization": { "__typename": "UserLimitError", "message": "no seats" } }),
    );
    let client = client(&platform);

    let err = client.users().create("ada@example.com").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test]
async fn list_errors_are_api_errors() {
    let platform = FakePlatform::new();
    platform.respond_with(
        "GetUsers",
        json!({ "usersOrError": { "__typename": "PythonError", "message": "boom" } }),
    );
    let client = client(&platform);

    let err = client.users().get_by_email("ada@example.com").await.unwrap_err();

    assert_eq!(err.to_string(), "typename(PythonError): boom");
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let platform = FakePlatform::new();
    platform.add_user("ada@example.com");
    let client = client(&platform);

    client.users().delete("ada@example.com").await.unwrap();

    let err = client.users().get_by_email("ada@example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = client.users().delete("ada@example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn cant_remove_last_admin_is_api_error() {
    let platform = FakePlatform::new();
    platform.add_user("root@example.com");
    platform.respond_with(
        "RemoveUser",
        json!({ "removeUserFromOrganization": { "__typename": "CantRemoveAllAdminsError", "message": "last admin" } }),
    );
    let client = client(&platform);

    let err = client.users().delete("root@example.com").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
}

#[tokio::test]
async fn regex_lookup_matches_email() {
    let platform = FakePlatform::new();
    platform.add_user("ada@example.com");
    platform.add_user("grace@example.com");
    platform.add_user("linus@other.org");
    let client = client(&platform);

    let users = client.users().get_by_regex(r"@example\.com$").await.unwrap();

    assert_eq!(users.len(), 2);
    let err = client.users().get_by_regex("[").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[tokio::test]
async fn remove_permission_sends_scope() {
    let platform = FakePlatform::new();
    platform.add_user("ada@example.com");
    let client = client(&platform);

    client
        .users()
        .remove_permission("ada@example.com", Some(1), PermissionDeploymentScope::Deployment)
        .await
        .unwrap();
    client
        .users()
        .remove_permission(
            "ada@example.com",
            None,
            PermissionDeploymentScope::AllBranchDeployments,
        )
        .await
        .unwrap();

    let removed = platform.state().removed_permissions.clone();
    assert_eq!(
        removed,
        vec![
            ("ada@example.com".to_string(), Some(1), "DEPLOYMENT".to_string()),
            (
                "ada@example.com".to_string(),
                None,
                "ALL_BRANCH_DEPLOYMENTS".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn remove_permission_for_unknown_user_is_not_found() {
    let platform = FakePlatform::new();
    let client = client(&platform);

    let err = client
        .users()
        .remove_permission("ghost@example.com", Some(1), PermissionDeploymentScope::Deployment)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}
