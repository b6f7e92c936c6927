mod support;

use serde_json::json;

use dcctl_core::orchestration::{DesiredState, Outcome, Reconciler};
use dcctl_core::types::PermissionGrant;
use dcctl_core::ErrorKind;
use support::{FakePlatform, client};

const STATE: &str = r#"
[[deployments]]
name = "staging"
settings = { run_queue = { max_concurrent_runs = 5 } }

[[users]]
email = "ada@example.com"
remove_default_permissions = true

[[code_locations]]
location_name = "etl"
image = "registry.example.com/etl:1.4"
code_source = { module_name = "etl.definitions" }

[[teams]]
name = "data"
members = ["ada@example.com"]

[[teams.grants]]
deployment = "staging"
grant = "VIEWER"
location_grants = [{ location_name = "etl", grant = "EDITOR" }]
"#;

#[tokio::test]
async fn apply_creates_everything_then_is_idempotent() {
    let platform = FakePlatform::new();
    let client = client(&platform);
    let reconciler = Reconciler::new(&client);
    let state = DesiredState::from_toml_str(STATE).unwrap();

    let first = reconciler.apply(&state).await.unwrap();
    assert_eq!(first.changed(), 4);

    let staging = client.deployments().get_by_name("staging").await.unwrap();
    assert_eq!(staging.settings["run_queue"]["max_concurrent_runs"], 5);

    let team = client.teams().get_by_name("data").await.unwrap();
    let ada = client.users().get_by_email("ada@example.com").await.unwrap();
    assert!(client.teams().is_member(&team.id, ada.id).await.unwrap());
    let grant = client
        .teams()
        .get_deployment_grant(&team.id, staging.id)
        .await
        .unwrap();
    assert_eq!(grant.grant, PermissionGrant::Viewer);

    // New user had default grants stripped: two deployments plus branches
    assert_eq!(platform.state().removed_permissions.len(), 3);

    let second = reconciler.apply(&state).await.unwrap();
    assert_eq!(second.changed(), 0);
    assert!(second.steps.iter().all(|step| step.outcome == Outcome::NoOp));
}

#[tokio::test]
async fn changed_settings_and_grant_are_updated() {
    let platform = FakePlatform::new();
    let client = client(&platform);
    let reconciler = Reconciler::new(&client);
    let mut state = DesiredState::from_toml_str(STATE).unwrap();
    reconciler.apply(&state).await.unwrap();

    state.deployments[0].settings = Some(json!({ "run_queue": { "max_concurrent_runs": 8 } }));
    state.teams[0].grants[0].grant = PermissionGrant::Launcher;
    let report = reconciler.apply(&state).await.unwrap();

    let changed: Vec<_> = report
        .steps
        .iter()
        .filter(|step| step.outcome == Outcome::Changed)
        .map(|step| (step.kind, step.name.as_str()))
        .collect();
    assert_eq!(changed, vec![("deployment", "staging"), ("team", "data")]);
}

#[tokio::test]
async fn drifted_code_location_is_updated() {
    let platform = FakePlatform::new();
    platform.add_location(json!({
        "location_name": "etl",
        "image": "registry.example.com/etl:1.3",
        "code_source": { "module_name": "etl.definitions" }
    }));
    let client = client(&platform);
    let state = DesiredState::from_toml_str(
        r#"
[[code_locations]]
location_name = "etl"
image = "registry.example.com/etl:1.4"
code_source = { module_name = "etl.definitions" }
"#,
    )
    .unwrap();

    let report = Reconciler::new(&client).apply(&state).await.unwrap();

    assert_eq!(report.changed(), 1);
    let stored = client.code_locations().get_by_name("etl").await.unwrap();
    assert_eq!(stored.image.as_deref(), Some("registry.example.com/etl:1.4"));
}

#[tokio::test]
async fn absent_entities_are_removed_and_missing_ones_ignored() {
    let platform = FakePlatform::new();
    platform.add_user("old@example.com");
    let client = client(&platform);
    client.teams().create("legacy").await.unwrap();
    let state = DesiredState::from_toml_str(
        r#"
[absent]
teams = ["legacy", "never-existed"]
users = ["old@example.com", "ghost@example.com"]
code_locations = ["gone"]
"#,
    )
    .unwrap();

    let report = Reconciler::new(&client).apply(&state).await.unwrap();

    let outcomes: Vec<_> = report.steps.iter().map(|step| step.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Changed,
            Outcome::NoOp,
            Outcome::Changed,
            Outcome::NoOp,
            Outcome::NoOp,
        ]
    );
    assert!(platform.state().teams.is_empty());
    assert!(platform.state().users.is_empty());
}

#[tokio::test]
async fn member_must_exist() {
    let platform = FakePlatform::new();
    let client = client(&platform);
    let state = DesiredState::from_toml_str(
        r#"
[[teams]]
name = "data"
members = ["ghost@example.com"]
"#,
    )
    .unwrap();

    let err = Reconciler::new(&client).apply(&state).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "User email=ghost@example.com not found");
}

#[tokio::test]
async fn remote_errors_stop_the_run() {
    let platform = FakePlatform::new();
    platform.respond_with(
        "CreateTeam",
        json!({ "createOrUpdateTeam": { "__typename": "UnauthorizedError", "message": "no" } }),
    );
    let client = client(&platform);
    let state = DesiredState::from_toml_str(
        r#"
[[teams]]
name = "data"

[[teams]]
name = "ops"
"#,
    )
    .unwrap();

    let err = Reconciler::new(&client).apply(&state).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    let creates = platform
        .operations()
        .into_iter()
        .filter(|op| op == "CreateTeam")
        .count();
    assert_eq!(creates, 1);
}
