//! In-memory stand-in for the remote platform.
//!
//! Answers each operation by name with the same response shapes the real
//! API produces, mutating a small in-memory model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use dcctl_core::graphql::{GraphQlRequest, QueryExecutor};
use dcctl_core::transport::TransportError;

#[derive(Debug, Clone)]
pub struct FakeDeployment {
    pub id: i64,
    pub name: String,
    pub deployment_type: &'static str,
    pub settings: Value,
}

#[derive(Debug, Clone)]
pub struct FakeGrant {
    pub id: i64,
    pub deployment_id: i64,
    pub grant: String,
    pub location_grants: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct FakeTeam {
    pub id: String,
    pub name: String,
    pub members: Vec<i64>,
    pub grants: Vec<FakeGrant>,
}

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct PlatformState {
    pub current_deployment: String,
    pub deployments: Vec<FakeDeployment>,
    pub teams: Vec<FakeTeam>,
    pub users: Vec<FakeUser>,
    /// Raw workspace entries
    pub locations: Vec<Value>,
    /// (email, deployment id, scope) for every permission removal
    pub removed_permissions: Vec<(String, Option<i64>, String)>,
    /// Every request, in order
    pub requests: Vec<(String, Value)>,
    /// Canned `data` returned instead of the simulated one
    pub overrides: HashMap<String, Value>,
    /// Operations that fail at the protocol level
    pub failures: HashMap<String, String>,
    next_id: i64,
}

impl PlatformState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<PlatformState>>,
    delay: Option<Duration>,
}

impl FakePlatform {
    /// Platform with a single production deployment `prod` (id 1) as the
    /// current deployment.
    pub fn new() -> Self {
        let platform = Self::default();
        {
            let mut state = platform.state();
            state.current_deployment = "prod".to_string();
            let id = state.next_id();
            state.deployments.push(FakeDeployment {
                id,
                name: "prod".to_string(),
                deployment_type: "PRODUCTION",
                settings: json!({}),
            });
        }
        platform
    }

    /// Every request sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn executor(&self) -> Arc<dyn QueryExecutor> {
        Arc::new(self.clone())
    }

    pub fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap()
    }

    pub fn respond_with(&self, operation: &str, data: Value) {
        self.state().overrides.insert(operation.to_string(), data);
    }

    pub fn fail_with(&self, operation: &str, message: &str) {
        self.state()
            .failures
            .insert(operation.to_string(), message.to_string());
    }

    pub fn operations(&self) -> Vec<String> {
        self.state()
            .requests
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn last_variables(&self, operation: &str) -> Option<Value> {
        self.state()
            .requests
            .iter()
            .rev()
            .find(|(name, _)| name == operation)
            .map(|(_, variables)| variables.clone())
    }

    pub fn add_user(&self, email: &str) -> i64 {
        let mut state = self.state();
        let id = state.next_id();
        state.users.push(FakeUser {
            id,
            email: email.to_string(),
            name: email.split('@').next().unwrap_or_default().to_string(),
        });
        id
    }

    pub fn add_location(&self, entry: Value) {
        self.state().locations.push(entry);
    }
}

#[async_trait]
impl QueryExecutor for FakePlatform {
    async fn execute(&self, request: GraphQlRequest) -> Result<Value, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let operation = request.operation_name.to_string();
        let vars = request.variables;
        state.requests.push((operation.clone(), vars.clone()));

        if let Some(message) = state.failures.get(&operation) {
            return Err(TransportError::GraphQl {
                operation,
                messages: vec![message.clone()],
            });
        }
        if let Some(data) = state.overrides.get(&operation) {
            return Ok(data.clone());
        }

        Ok(simulate(&mut state, &operation, &vars))
    }
}

fn simulate(state: &mut PlatformState, operation: &str, vars: &Value) -> Value {
    match operation {
        "GetDagsterCloudVersion" => json!({ "version": "1.9.3" }),
        "GetOrganization" => json!({
            "organization": {
                "id": 1,
                "publicId": "acme-public",
                "name": "Acme",
                "status": "ACTIVE",
                "accountReview": { "status": "APPROVED" }
            }
        }),
        "GetCurrentDeployment" => {
            let current = state
                .deployments
                .iter()
                .find(|d| d.name == state.current_deployment)
                .map(deployment_json)
                .unwrap_or(Value::Null);
            json!({ "currentDeployment": current })
        }
        "ListDeployments" => {
            json!({ "deployments": state.deployments.iter().map(deployment_json).collect::<Vec<_>>() })
        }
        "CreateHybridDeployment" => {
            let name = str_var(vars, "deploymentName");
            let result = if state.deployments.iter().any(|d| d.name == name) {
                error("DuplicateDeploymentError", "deployment already exists")
            } else {
                let id = state.next_id();
                let deployment = FakeDeployment {
                    id,
                    name,
                    deployment_type: "DEV",
                    settings: json!({}),
                };
                let mut body = deployment_json(&deployment);
                body["__typename"] = json!("DagsterCloudDeployment");
                state.deployments.push(deployment);
                body
            };
            json!({ "createDeployment": result })
        }
        "DeleteDeployment" => {
            let id = int_var(vars, "deploymentId");
            let before = state.deployments.len();
            state.deployments.retain(|d| d.id != id);
            let result = if state.deployments.len() == before {
                error("DeploymentNotFoundError", "no such deployment")
            } else {
                json!({ "__typename": "DagsterCloudDeployment", "deploymentId": id })
            };
            json!({ "deleteDeployment": result })
        }
        "SetDeploymentSettings" => {
            let id = int_var(vars, "deploymentId");
            let settings = vars["deploymentSettings"]["settings"].clone();
            let result = match state.deployments.iter_mut().find(|d| d.id == id) {
                Some(deployment) => {
                    deployment.settings = settings.clone();
                    json!({ "__typename": "DeploymentSettings", "settings": settings })
                }
                None => error("DeploymentNotFoundError", "no such deployment"),
            };
            json!({ "setDeploymentSettings": result })
        }
        "ListTeamPermissions" => {
            let permissions: Vec<_> = state
                .teams
                .iter()
                .map(|team| team_permission_json(team, &state.users))
                .collect();
            json!({ "teamPermissions": permissions })
        }
        "CreateTeam" => {
            let name = str_var(vars, "name");
            let id = format!("team-{}", state.next_id());
            state.teams.push(FakeTeam {
                id: id.clone(),
                name: name.clone(),
                members: Vec::new(),
                grants: Vec::new(),
            });
            json!({
                "createOrUpdateTeam": {
                    "__typename": "CreateOrUpdateTeamSuccess",
                    "team": { "id": id, "name": name }
                }
            })
        }
        "RenameTeam" => {
            let id = str_var(vars, "teamId");
            let name = str_var(vars, "name");
            let result = match state.teams.iter_mut().find(|t| t.id == id) {
                Some(team) => {
                    team.name = name.clone();
                    json!({ "__typename": "DagsterCloudTeam", "id": id, "name": name })
                }
                None => error("PythonError", "team not found"),
            };
            json!({ "renameTeam": result })
        }
        "DeleteTeam" => {
            let id = str_var(vars, "teamId");
            state.teams.retain(|t| t.id != id);
            json!({ "deleteTeam": { "__typename": "DeleteTeamSuccess", "teamId": id } })
        }
        "AddMemberToTeam" => {
            let team_id = str_var(vars, "teamId");
            let member = int_var(vars, "memberId");
            if let Some(team) = state.teams.iter_mut().find(|t| t.id == team_id)
                && !team.members.contains(&member)
            {
                team.members.push(member);
            }
            json!({ "addMemberToTeam": { "__typename": "AddMemberToTeamSuccess", "team": { "id": team_id } } })
        }
        "RemoveMemberFromTeam" => {
            let team_id = str_var(vars, "teamId");
            let member = int_var(vars, "memberId");
            if let Some(team) = state.teams.iter_mut().find(|t| t.id == team_id) {
                team.members.retain(|m| *m != member);
            }
            json!({ "removeMemberFromTeam": { "__typename": "RemoveMemberFromTeamSuccess", "team": { "id": team_id } } })
        }
        "CreateOrUpdateTeamPermission" => {
            let team_id = str_var(vars, "teamId");
            let deployment_id = int_var(vars, "deploymentId");
            let grant_id = state.next_id();
            let grant = FakeGrant {
                id: grant_id,
                deployment_id,
                grant: str_var(vars, "grant"),
                location_grants: vars["locationGrants"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|lg| {
                        (
                            lg["locationName"].as_str().unwrap_or_default().to_string(),
                            lg["grant"].as_str().unwrap_or_default().to_string(),
                        )
                    })
                    .collect(),
            };
            if let Some(team) = state.teams.iter_mut().find(|t| t.id == team_id) {
                team.grants.retain(|g| g.deployment_id != deployment_id);
                team.grants.push(grant);
            }
            json!({
                "createOrUpdateTeamPermission": {
                    "__typename": "CreateOrUpdateTeamPermissionSuccess",
                    "teamPermission": { "id": grant_id }
                }
            })
        }
        "RemoveTeamPermission" => {
            let team_id = str_var(vars, "teamId");
            let deployment_id = int_var(vars, "deploymentId");
            if let Some(team) = state.teams.iter_mut().find(|t| t.id == team_id) {
                team.grants.retain(|g| g.deployment_id != deployment_id);
            }
            json!({ "removeTeamPermission": { "__typename": "RemoveTeamPermissionSuccess" } })
        }
        "GetUsers" => {
            let users: Vec<_> = state
                .users
                .iter()
                .map(|u| json!({ "user": user_json(u) }))
                .collect();
            json!({
                "usersOrError": {
                    "__typename": "DagsterCloudUsersWithScopedPermissionGrants",
                    "users": users
                }
            })
        }
        "AddUser" => {
            let email = str_var(vars, "email");
            let id = state.next_id();
            let user = FakeUser {
                id,
                name: String::new(),
                email,
            };
            let body = user_json(&user);
            state.users.push(user);
            json!({
                "addUserToOrganization": {
                    "__typename": "AddUserToOrganizationSuccess",
                    "userWithGrants": { "user": body }
                }
            })
        }
        "RemoveUser" => {
            let email = str_var(vars, "email");
            state.users.retain(|u| u.email != email);
            json!({ "removeUserFromOrganization": { "__typename": "RemoveUserFromOrganizationSuccess", "email": email } })
        }
        "RemoveUserPermission" => {
            let email = str_var(vars, "userEmail");
            let result = if state.users.iter().any(|u| u.email == email) {
                state.removed_permissions.push((
                    email,
                    vars["deploymentId"].as_i64(),
                    str_var(vars, "deploymentScope"),
                ));
                json!({ "__typename": "DagsterCloudUserWithScopedPermissionGrants", "id": "x" })
            } else {
                error("UserNotFoundError", "user not found")
            };
            json!({ "removeUserPermissions": result })
        }
        "ListCodeLocations" => {
            json!({ "locationsAsDocument": { "document": { "locations": state.locations.clone() } } })
        }
        "AddOrUpdateCodeLocation" => {
            upsert_location(state, selector_to_document(&vars["location"]));
            json!({ "addOrUpdateLocation": { "__typename": "WorkspaceEntry", "locationName": vars["location"]["name"] } })
        }
        "AddOrUpdateLocationFromDocument" => {
            let doc = vars["document"].clone();
            let name = doc["location_name"].clone();
            upsert_location(state, doc);
            json!({ "addOrUpdateLocationFromDocument": { "__typename": "WorkspaceEntry", "locationName": name } })
        }
        "DeleteCodeLocation" => {
            let name = str_var(vars, "locationName");
            state.locations.retain(|l| l["location_name"] != name.as_str());
            json!({ "deleteLocation": { "__typename": "DeleteLocationSuccess", "locationName": name } })
        }
        other => panic!("fake platform does not know operation {other}"),
    }
}

fn error(typename: &str, message: &str) -> Value {
    json!({ "__typename": typename, "message": message })
}

fn str_var(vars: &Value, name: &str) -> String {
    vars[name].as_str().unwrap_or_default().to_string()
}

fn int_var(vars: &Value, name: &str) -> i64 {
    vars[name].as_i64().unwrap_or_default()
}

fn deployment_json(deployment: &FakeDeployment) -> Value {
    json!({
        "deploymentId": deployment.id,
        "deploymentName": deployment.name,
        "deploymentStatus": "ACTIVE",
        "deploymentType": deployment.deployment_type,
        "deploymentSettings": { "settings": deployment.settings }
    })
}

fn user_json(user: &FakeUser) -> Value {
    json!({
        "userId": user.id,
        "email": user.email,
        "name": user.name,
        "picture": null,
        "isScimProvisioned": false
    })
}

fn team_permission_json(team: &FakeTeam, users: &[FakeUser]) -> Value {
    let members: Vec<_> = team
        .members
        .iter()
        .map(|id| {
            let email = users.iter().find(|u| u.id == *id).map(|u| u.email.clone());
            json!({ "userId": id, "email": email })
        })
        .collect();
    let grants: Vec<_> = team
        .grants
        .iter()
        .map(|g| {
            json!({
                "id": g.id,
                "deploymentId": g.deployment_id,
                "grant": g.grant,
                "locationGrants": g.location_grants.iter().map(|(location, grant)| {
                    json!({ "locationName": location, "grant": grant })
                }).collect::<Vec<_>>()
            })
        })
        .collect();
    json!({
        "id": format!("perm-{}", team.id),
        "team": { "id": team.id, "name": team.name, "members": members },
        "deploymentPermissionGrants": grants
    })
}

fn upsert_location(state: &mut PlatformState, doc: Value) {
    let name = doc["location_name"].clone();
    state.locations.retain(|l| l["location_name"] != name);
    state.locations.push(doc);
}

/// Typed selector input back into the document form the platform stores.
fn selector_to_document(selector: &Value) -> Value {
    let mut doc = Map::new();
    let mut code_source = Map::new();
    let copy = |target: &mut Map<String, Value>, from: &str, to: &str| {
        if let Some(value) = selector.get(from).filter(|v| !v.is_null()) {
            target.insert(to.to_string(), value.clone());
        }
    };

    copy(&mut doc, "name", "location_name");
    copy(&mut doc, "image", "image");
    copy(&mut code_source, "moduleName", "module_name");
    copy(&mut code_source, "packageName", "package_name");
    copy(&mut code_source, "pythonFile", "python_file");
    copy(&mut doc, "workingDirectory", "working_directory");
    copy(&mut doc, "executablePath", "executable_path");
    copy(&mut doc, "attribute", "attribute");
    copy(&mut doc, "agentQueue", "agent_queue");
    doc.insert("code_source".to_string(), Value::Object(code_source));

    if !selector["commitHash"].is_null() {
        doc.insert(
            "git".to_string(),
            json!({ "commit_hash": selector["commitHash"], "url": selector["url"] }),
        );
    }
    Value::Object(doc)
}
