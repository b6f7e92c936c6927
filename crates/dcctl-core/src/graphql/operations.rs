//! GraphQL documents for every remote operation the services issue.

/// A named GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub query: &'static str,
}

macro_rules! operation {
    ($ident:ident, $name:literal, $query:expr) => {
        pub const $ident: Operation = Operation {
            name: $name,
            query: $query,
        };
    };
}

macro_rules! with_deployment_fragment {
    ($query:literal) => {
        concat!(
            $query,
            "
fragment Deployment on DagsterCloudDeployment {
    deploymentId
    deploymentName
    deploymentStatus
    deploymentType
    deploymentSettings {
        settings
    }
}
"
        )
    };
}

macro_rules! with_user_fragment {
    ($query:literal) => {
        concat!(
            $query,
            "
fragment User on DagsterCloudUser {
    userId
    email
    name
    picture
    isScimProvisioned
}
"
        )
    };
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

operation!(
    GET_VERSION,
    "GetDagsterCloudVersion",
    "query GetDagsterCloudVersion { version }"
);

operation!(
    GET_ORGANIZATION,
    "GetOrganization",
    "
query GetOrganization {
    organization {
        id
        publicId
        name
        status
        accountReview {
            status
        }
    }
}
"
);

// ---------------------------------------------------------------------------
// Deployments
// ---------------------------------------------------------------------------

operation!(
    GET_CURRENT_DEPLOYMENT,
    "GetCurrentDeployment",
    with_deployment_fragment!(
        "
query GetCurrentDeployment {
    currentDeployment {
        ...Deployment
    }
}
"
    )
);

operation!(
    LIST_DEPLOYMENTS,
    "ListDeployments",
    with_deployment_fragment!(
        "
query ListDeployments {
    deployments {
        ...Deployment
    }
}
"
    )
);

operation!(
    CREATE_DEPLOYMENT,
    "CreateHybridDeployment",
    with_deployment_fragment!(
        "
mutation CreateHybridDeployment($deploymentName: String!) {
    createDeployment(deploymentName: $deploymentName) {
        __typename
        ... on DagsterCloudDeployment { ...Deployment }
        ... on DeploymentLimitError { message }
        ... on DeploymentNotFoundError { message }
        ... on DuplicateDeploymentError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
    )
);

operation!(
    DELETE_DEPLOYMENT,
    "DeleteDeployment",
    "
mutation DeleteDeployment($deploymentId: Int!) {
    deleteDeployment(deploymentId: $deploymentId) {
        __typename
        ... on DagsterCloudDeployment { deploymentId }
        ... on DeleteFinalDeploymentError { message }
        ... on DeploymentNotFoundError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    SET_DEPLOYMENT_SETTINGS,
    "SetDeploymentSettings",
    "
mutation SetDeploymentSettings($deploymentId: Int!, $deploymentSettings: DeploymentSettingsInput!) {
    setDeploymentSettings(deploymentId: $deploymentId, deploymentSettings: $deploymentSettings) {
        __typename
        ... on DeploymentSettings { settings }
        ... on DeleteFinalDeploymentError { message }
        ... on DeploymentNotFoundError { message }
        ... on DuplicateDeploymentError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

operation!(
    LIST_TEAM_PERMISSIONS,
    "ListTeamPermissions",
    "
query ListTeamPermissions {
    teamPermissions {
        id
        team {
            id
            name
            members {
                userId
                email
            }
        }
        deploymentPermissionGrants {
            id
            deploymentId
            grant
            locationGrants {
                locationName
                grant
            }
        }
    }
}
"
);

operation!(
    CREATE_TEAM,
    "CreateTeam",
    "
mutation CreateTeam($name: String!) {
    createOrUpdateTeam(name: $name) {
        __typename
        ... on CreateOrUpdateTeamSuccess { team { id name } }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    RENAME_TEAM,
    "RenameTeam",
    "
mutation RenameTeam($name: String!, $teamId: String!) {
    renameTeam(name: $name, teamId: $teamId) {
        __typename
        ... on DagsterCloudTeam { id name }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    DELETE_TEAM,
    "DeleteTeam",
    "
mutation DeleteTeam($teamId: String!) {
    deleteTeam(teamId: $teamId) {
        __typename
        ... on DeleteTeamSuccess { teamId }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    ADD_TEAM_MEMBER,
    "AddMemberToTeam",
    "
mutation AddMemberToTeam($memberId: Int!, $teamId: String!) {
    addMemberToTeam(memberId: $memberId, teamId: $teamId) {
        __typename
        ... on AddMemberToTeamSuccess { team { id } }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
        ... on UserLimitError { message }
    }
}
"
);

operation!(
    REMOVE_TEAM_MEMBER,
    "RemoveMemberFromTeam",
    "
mutation RemoveMemberFromTeam($memberId: Int!, $teamId: String!) {
    removeMemberFromTeam(memberId: $memberId, teamId: $teamId) {
        __typename
        ... on RemoveMemberFromTeamSuccess { team { id } }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    CREATE_OR_UPDATE_TEAM_PERMISSION,
    "CreateOrUpdateTeamPermission",
    "
mutation CreateOrUpdateTeamPermission(
    $deploymentId: Int
    $deploymentScope: PermissionDeploymentScope!
    $grant: PermissionGrant!
    $locationGrants: [LocationScopedGrantInput]
    $teamId: String!
) {
    createOrUpdateTeamPermission(
        deploymentId: $deploymentId
        deploymentScope: $deploymentScope
        grant: $grant
        locationGrants: $locationGrants
        teamId: $teamId
    ) {
        __typename
        ... on CreateOrUpdateTeamPermissionSuccess { teamPermission { id } }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
        ... on UserLimitError { message }
    }
}
"
);

operation!(
    REMOVE_TEAM_PERMISSION,
    "RemoveTeamPermission",
    "
mutation RemoveTeamPermission(
    $deploymentId: Int
    $deploymentScope: PermissionDeploymentScope!
    $teamId: String!
) {
    removeTeamPermission(
        deploymentId: $deploymentId
        deploymentScope: $deploymentScope
        teamId: $teamId
    ) {
        __typename
        ... on RemoveTeamPermissionSuccess { teamPermission { id } }
        ... on CantRemoveAllAdminsError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

operation!(
    LIST_USERS,
    "GetUsers",
    with_user_fragment!(
        "
query GetUsers {
    usersOrError {
        __typename
        ... on DagsterCloudUsersWithScopedPermissionGrants {
            users {
                user { ...User }
            }
        }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
    )
);

operation!(
    ADD_USER,
    "AddUser",
    with_user_fragment!(
        "
mutation AddUser($email: String!) {
    addUserToOrganization(email: $email) {
        __typename
        ... on AddUserToOrganizationSuccess {
            userWithGrants {
                user { ...User }
            }
        }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
        ... on UserLimitError { message }
    }
}
"
    )
);

operation!(
    REMOVE_USER,
    "RemoveUser",
    "
mutation RemoveUser($email: String!) {
    removeUserFromOrganization(email: $email) {
        __typename
        ... on RemoveUserFromOrganizationSuccess { email }
        ... on CantRemoveAllAdminsError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    REMOVE_USER_PERMISSIONS,
    "RemoveUserPermission",
    "
mutation RemoveUserPermission(
    $userEmail: String!
    $deploymentId: Int
    $deploymentScope: PermissionDeploymentScope!
) {
    removeUserPermissions(
        userEmail: $userEmail
        deploymentId: $deploymentId
        deploymentScope: $deploymentScope
    ) {
        __typename
        ... on DagsterCloudUserWithScopedPermissionGrants { id }
        ... on CantRemoveAllAdminsError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
        ... on UserLimitError { message }
        ... on UserNotFoundError { message }
    }
}
"
);

// ---------------------------------------------------------------------------
// Code locations
// ---------------------------------------------------------------------------

operation!(
    LIST_CODE_LOCATIONS,
    "ListCodeLocations",
    "
query ListCodeLocations {
    locationsAsDocument {
        document
    }
}
"
);

operation!(
    ADD_OR_UPDATE_CODE_LOCATION,
    "AddOrUpdateCodeLocation",
    "
mutation AddOrUpdateCodeLocation($location: LocationSelector!) {
    addOrUpdateLocation(location: $location) {
        __typename
        ... on WorkspaceEntry { locationName }
        ... on InvalidLocationError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    ADD_OR_UPDATE_CODE_LOCATION_FROM_DOCUMENT,
    "AddOrUpdateLocationFromDocument",
    "
mutation AddOrUpdateLocationFromDocument($document: GenericScalar!) {
    addOrUpdateLocationFromDocument(document: $document) {
        __typename
        ... on WorkspaceEntry { locationName }
        ... on InvalidLocationError { message }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);

operation!(
    DELETE_CODE_LOCATION,
    "DeleteCodeLocation",
    "
mutation DeleteCodeLocation($locationName: String!) {
    deleteLocation(locationName: $locationName) {
        __typename
        ... on DeleteLocationSuccess { locationName }
        ... on PythonError { message }
        ... on UnauthorizedError { message }
    }
}
"
);
