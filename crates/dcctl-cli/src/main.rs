//! dcctl - declarative management of a Dagster Cloud organization
//!
//! Usage:
//!   dcctl apply state.toml        # Converge the organization to a state file
//!   dcctl deployment list         # Inspect or change single entities
//!   dcctl --organization acme --deployment prod configure

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dcctl_core::config::{ClientConfig, ConfigStore, env};
use dcctl_core::orchestration::{DesiredState, ReconcileReport, Reconciler};
use dcctl_core::types::{CodeLocation, Deployment, LocationGrant, PermissionGrant, Team, User};
use dcctl_core::DagsterClient;

#[derive(Parser)]
#[command(name = "dcctl")]
#[command(about = "Declarative Dagster Cloud management", long_about = None)]
struct Cli {
    /// Config file (defaults to <config_dir>/dcctl/config.toml)
    #[arg(long, global = true, env = "DCCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    connection: ConnectionArgs,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Per-invocation overrides; they win over the environment and the file.
#[derive(Args)]
struct ConnectionArgs {
    /// Organization name
    #[arg(long, global = true)]
    organization: Option<String>,

    /// Deployment the client is scoped to
    #[arg(long, global = true)]
    deployment: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

impl ConnectionArgs {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(organization) = &self.organization {
            config.organization = organization.clone();
        }
        if let Some(deployment) = &self.deployment {
            config.deployment = deployment.clone();
        }
        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Converge the organization to a desired-state file
    Apply {
        /// TOML desired-state file
        file: PathBuf,
        /// Only load and validate the file
        #[arg(long)]
        dry_run: bool,
    },

    /// Write --organization, --deployment and --timeout to the config file
    Configure {
        /// API token; prefer DAGSTER_CLOUD_API_TOKEN over storing it
        #[arg(long)]
        api_token: Option<String>,
    },

    /// Show the platform version
    Version,

    /// Show the organization
    Organization,

    /// Manage deployments
    #[command(subcommand)]
    Deployment(DeploymentCommand),

    /// Manage teams, membership and grants
    #[command(subcommand)]
    Team(TeamCommand),

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage code locations
    #[command(subcommand, alias = "cl")]
    CodeLocation(CodeLocationCommand),
}

#[derive(Subcommand)]
enum DeploymentCommand {
    /// Show the deployment the client is scoped to
    Current,
    List,
    Get { name: String },
    Create { name: String },
    /// Replace a deployment's settings document
    Settings {
        name: String,
        /// Settings as a JSON object
        settings: String,
    },
    /// Delete the deployment the client is scoped to
    Delete {
        name: String,
        /// Delete even if code locations remain
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum TeamCommand {
    List {
        /// Only teams whose name matches this regex
        #[arg(long)]
        matching: Option<String>,
    },
    Get { name: String },
    Create { name: String },
    Rename { id: String, name: String },
    Delete { name: String },
    AddMember { team: String, email: String },
    #[command(alias = "rm-member")]
    RemoveMember { team: String, email: String },
    /// Set a team's grant on a deployment
    Grant {
        team: String,
        #[arg(value_name = "DEPLOYMENT")]
        target: String,
        #[arg(value_parser = parse_grant)]
        grant: PermissionGrant,
        /// Location override as NAME=GRANT (repeatable)
        #[arg(long = "location", value_parser = parse_location_grant)]
        locations: Vec<LocationGrant>,
    },
    /// Remove a team's grant on a deployment
    Revoke {
        team: String,
        #[arg(value_name = "DEPLOYMENT")]
        target: String,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    List {
        /// Only users whose email matches this regex
        #[arg(long)]
        matching: Option<String>,
    },
    Get { email: String },
    Create {
        email: String,
        /// Strip the grants the platform hands out by default
        #[arg(long)]
        remove_default_permissions: bool,
    },
    Delete { email: String },
}

#[derive(Subcommand)]
enum CodeLocationCommand {
    List,
    /// Print a location's stored JSON document
    Get { name: String },
    /// Create or update a location from a JSON document file
    Apply { file: PathBuf },
    Delete { name: String },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn parse_grant(value: &str) -> Result<PermissionGrant, String> {
    value.parse().map_err(|e: dcctl_core::Error| e.to_string())
}

fn parse_location_grant(value: &str) -> Result<LocationGrant, String> {
    let (name, grant) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=GRANT, got {value:?}"))?;
    Ok(LocationGrant::new(name, parse_grant(grant)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dcctl=info,dcctl_core=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let store = match &cli.config {
        Some(path) => ConfigStore::from_path(path.clone()),
        None => ConfigStore::from_default_dir()?,
    };

    match cli.command {
        Commands::Apply { file, dry_run } => {
            run_apply(&store, &cli.connection, &file, dry_run, cli.format).await
        }
        Commands::Configure { api_token } => run_configure(&store, &cli.connection, api_token),
        command => {
            let client = connect(&store, &cli.connection)?;
            run_remote(&client, command, cli.format).await
        }
    }
}

/// File, then environment, then flags.
fn load_config(store: &ConfigStore, connection: &ConnectionArgs) -> Result<ClientConfig> {
    let mut config = store.load()?;
    env::apply_overrides(&mut config, |name| std::env::var(name).ok());
    connection.apply(&mut config);
    config.validate().with_context(|| {
        format!(
            "Invalid client config (file: {})",
            store.config_path().display()
        )
    })?;
    Ok(config)
}

fn connect(store: &ConfigStore, connection: &ConnectionArgs) -> Result<DagsterClient> {
    let config = load_config(store, connection)?;
    Ok(DagsterClient::from_config(&config)?)
}

fn run_configure(
    store: &ConfigStore,
    connection: &ConnectionArgs,
    api_token: Option<String>,
) -> Result<()> {
    let mut config = store.load()?;
    connection.apply(&mut config);
    if let Some(token) = api_token {
        config.api_token = token;
    }
    store.save(&config)?;
    println!("Wrote {}", store.config_path().display());
    Ok(())
}

async fn run_apply(
    store: &ConfigStore,
    connection: &ConnectionArgs,
    file: &Path,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let state = DesiredState::load(file)?;
    state
        .validate()
        .with_context(|| format!("Invalid desired state: {}", file.display()))?;
    if dry_run {
        println!("{} is valid", file.display());
        return Ok(());
    }

    let client = connect(store, connection)?;
    let report = Reconciler::new(&client).apply(&state).await?;
    print_report(&report, format)
}

async fn run_remote(client: &DagsterClient, command: Commands, format: OutputFormat) -> Result<()> {
    match command {
        Commands::Version => {
            let version = client.instance().version().await?;
            println!("{version}");
        }
        Commands::Organization => {
            let organization = client.instance().organization().await?;
            match format {
                OutputFormat::Json => print_json(&organization)?,
                OutputFormat::Table => {
                    println!("{} ({})", organization.name, organization.public_id);
                    println!("  status: {}", organization.status);
                    println!("  review: {}", organization.account_review_status);
                }
            }
        }
        Commands::Deployment(command) => run_deployment(client, command, format).await?,
        Commands::Team(command) => run_team(client, command, format).await?,
        Commands::User(command) => run_user(client, command, format).await?,
        Commands::CodeLocation(command) => run_code_location(client, command, format).await?,
        Commands::Apply { .. } | Commands::Configure { .. } => unreachable!("handled in main"),
    }
    Ok(())
}

async fn run_deployment(
    client: &DagsterClient,
    command: DeploymentCommand,
    format: OutputFormat,
) -> Result<()> {
    let deployments = client.deployments();
    match command {
        DeploymentCommand::Current => {
            print_deployments(&[deployments.current().await?], format)?;
        }
        DeploymentCommand::List => print_deployments(&deployments.list().await?, format)?,
        DeploymentCommand::Get { name } => {
            let deployment = deployments.get_by_name(&name).await?;
            match format {
                OutputFormat::Json => print_json(&deployment)?,
                OutputFormat::Table => {
                    print_deployments(std::slice::from_ref(&deployment), format)?;
                    println!();
                    println!("{}", serde_json::to_string_pretty(&deployment.settings)?);
                }
            }
        }
        DeploymentCommand::Create { name } => {
            let deployment = deployments.create(&name).await?;
            println!("Created deployment {} (id {})", deployment.name, deployment.id);
        }
        DeploymentCommand::Settings { name, settings } => {
            let settings: serde_json::Value =
                serde_json::from_str(&settings).context("Settings must be valid JSON")?;
            let deployment = deployments.update_settings(&name, settings).await?;
            println!("Updated settings of {}", deployment.name);
        }
        DeploymentCommand::Delete { name, force } => {
            client.destroy_deployment(&name, force).await?;
            println!("Deleted deployment {name}");
        }
    }
    Ok(())
}

async fn run_team(client: &DagsterClient, command: TeamCommand, format: OutputFormat) -> Result<()> {
    let teams = client.teams();
    match command {
        TeamCommand::List { matching } => {
            let list = match matching {
                Some(pattern) => teams.get_by_regex(&pattern).await?,
                None => teams.list().await?,
            };
            print_teams(&list, format)?;
        }
        TeamCommand::Get { name } => print_teams(&[teams.get_by_name(&name).await?], format)?,
        TeamCommand::Create { name } => {
            let team = teams.create(&name).await?;
            println!("Created team {} (id {})", team.name, team.id);
        }
        TeamCommand::Rename { id, name } => {
            let team = teams.rename(&name, &id).await?;
            println!("Renamed team {} to {}", team.id, team.name);
        }
        TeamCommand::Delete { name } => {
            let team = teams.get_by_name(&name).await?;
            teams.delete(&team.id).await?;
            println!("Deleted team {name}");
        }
        TeamCommand::AddMember { team, email } => {
            let team = teams.get_by_name(&team).await?;
            let user = client.users().get_by_email(&email).await?;
            teams.add_member(&team.id, user.id).await?;
            println!("Added {} to {}", user.email, team.name);
        }
        TeamCommand::RemoveMember { team, email } => {
            let team = teams.get_by_name(&team).await?;
            let user = client.users().get_by_email(&email).await?;
            teams.remove_member(&team.id, user.id).await?;
            println!("Removed {} from {}", user.email, team.name);
        }
        TeamCommand::Grant {
            team,
            target,
            grant,
            locations,
        } => {
            let team = teams.get_by_name(&team).await?;
            let deployment = client.deployments().get_by_name(&target).await?;
            let stored = teams
                .create_or_update_deployment_grant(&team.id, deployment.id, grant, &locations)
                .await?;
            match format {
                OutputFormat::Json => print_json(&stored)?,
                OutputFormat::Table => {
                    println!("{} on {}: {}", team.name, deployment.name, stored.grant);
                    for location in &stored.location_grants {
                        println!("  {:<30} {}", location.location_name, location.grant);
                    }
                }
            }
        }
        TeamCommand::Revoke { team, target } => {
            let team = teams.get_by_name(&team).await?;
            let deployment = client.deployments().get_by_name(&target).await?;
            teams.remove_deployment_grant(&team.id, deployment.id).await?;
            println!("Revoked {} on {}", team.name, deployment.name);
        }
    }
    Ok(())
}

async fn run_user(client: &DagsterClient, command: UserCommand, format: OutputFormat) -> Result<()> {
    let users = client.users();
    match command {
        UserCommand::List { matching } => {
            let list = match matching {
                Some(pattern) => users.get_by_regex(&pattern).await?,
                None => users.list().await?,
            };
            print_users(&list, format)?;
        }
        UserCommand::Get { email } => print_users(&[users.get_by_email(&email).await?], format)?,
        UserCommand::Create {
            email,
            remove_default_permissions,
        } => {
            let user = users.create(&email).await?;
            if remove_default_permissions {
                client.remove_all_user_permissions(&user.email).await?;
            }
            println!("Created user {} (id {})", user.email, user.id);
        }
        UserCommand::Delete { email } => {
            users.delete(&email).await?;
            println!("Deleted user {email}");
        }
    }
    Ok(())
}

async fn run_code_location(
    client: &DagsterClient,
    command: CodeLocationCommand,
    format: OutputFormat,
) -> Result<()> {
    let locations = client.code_locations();
    match command {
        CodeLocationCommand::List => print_code_locations(&locations.list().await?, format)?,
        CodeLocationCommand::Get { name } => {
            println!("{}", locations.get_document_by_name(&name).await?);
        }
        CodeLocationCommand::Apply { file } => {
            let doc = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let name = dcctl_core::document::extract_identity(&doc)?;
            let stored = match locations.get_by_name(&name).await {
                Ok(_) => locations.update_from_document(&doc).await?,
                Err(e) if e.kind() == dcctl_core::ErrorKind::NotFound => {
                    locations.create_from_document(&doc).await?
                }
                Err(e) => return Err(e.into()),
            };
            println!("{stored}");
        }
        CodeLocationCommand::Delete { name } => {
            locations.delete(&name).await?;
            println!("Deleted code location {name}");
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &ReconcileReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let steps: Vec<_> = report
                .steps
                .iter()
                .map(|step| {
                    serde_json::json!({
                        "kind": step.kind,
                        "name": step.name,
                        "outcome": step.outcome.to_string(),
                    })
                })
                .collect();
            print_json(&serde_json::json!({ "changed": report.changed(), "steps": steps }))?;
        }
        OutputFormat::Table => {
            if report.steps.is_empty() {
                println!("Nothing to do.");
                return Ok(());
            }
            println!("{:<16} {:<40} {:<10}", "KIND", "NAME", "OUTCOME");
            println!("{}", "-".repeat(66));
            for step in &report.steps {
                println!("{:<16} {:<40} {:<10}", step.kind, step.name, step.outcome);
            }
            println!();
            println!("{} of {} step(s) changed", report.changed(), report.steps.len());
        }
    }
    Ok(())
}

fn print_deployments(deployments: &[Deployment], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(deployments);
    }
    if deployments.is_empty() {
        println!("No deployments.");
        return Ok(());
    }
    println!("{:<8} {:<30} {:<12} {:<18}", "ID", "NAME", "TYPE", "STATUS");
    println!("{}", "-".repeat(70));
    for d in deployments {
        println!(
            "{:<8} {:<30} {:<12} {:<18}",
            d.id, d.name, d.deployment_type, d.status
        );
    }
    Ok(())
}

fn print_teams(teams: &[Team], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(teams);
    }
    if teams.is_empty() {
        println!("No teams.");
        return Ok(());
    }
    println!("{:<40} {:<30}", "ID", "NAME");
    println!("{}", "-".repeat(70));
    for team in teams {
        println!("{:<40} {:<30}", team.id, team.name);
    }
    Ok(())
}

fn print_users(users: &[User], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(users);
    }
    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }
    println!("{:<8} {:<36} {:<24} {:<5}", "ID", "EMAIL", "NAME", "SCIM");
    println!("{}", "-".repeat(76));
    for user in users {
        let scim = if user.is_scim_provisioned { "yes" } else { "" };
        println!(
            "{:<8} {:<36} {:<24} {:<5}",
            user.id, user.email, user.name, scim
        );
    }
    Ok(())
}

fn print_code_locations(locations: &[CodeLocation], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(locations);
    }
    if locations.is_empty() {
        println!("No code locations.");
        return Ok(());
    }
    println!("{:<24} {:<40} {:<30}", "NAME", "IMAGE", "SOURCE");
    println!("{}", "-".repeat(94));
    for location in locations {
        let source = &location.code_source;
        let source = source
            .module_name
            .as_deref()
            .or(source.package_name.as_deref())
            .or(source.python_file.as_deref())
            .unwrap_or("-");
        println!(
            "{:<24} {:<40} {:<30}",
            location.name,
            location.image.as_deref().unwrap_or("-"),
            source
        );
    }
    Ok(())
}
