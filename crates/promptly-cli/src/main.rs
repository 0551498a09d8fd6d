//! Promptly CLI
//!
//! Command-line front end for the Promptly API: sign in, pick a profile and
//! browse or generate prompts within it.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use promptly_client::{ActivityTracker, ApiClient, SelectedProfileStore, SessionStore};
use promptly_core::activity::{ActivityType, ActivityUser};
use promptly_core::models::{GeneratePromptRequest, Profile};
use promptly_core::{ClientConfig, KeyValueStore, Navigator};
use promptly_storage::FileKeyValueStore;

/// Promptly - prompt templates, personas and profiles from the terminal
#[derive(Parser)]
#[command(name = "promptly")]
#[command(about = "Promptly command-line client", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "PROMPTLY_CONFIG",
        global = true
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL of the login page
    Login,
    /// Store the token obtained from the login page
    SetToken { token: String },
    /// Show the signed-in user
    Whoami,
    /// Sign out locally and on the server
    Logout,
    /// Manage profiles
    Profiles {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Personas in the selected profile
    Personas {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Templates in the selected profile
    Templates {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Prompts in the selected profile
    Prompts {
        #[command(subcommand)]
        command: PromptCommands,
    },
    /// List available intents
    Intents,
}

#[derive(Subcommand)]
enum ProfileCommands {
    List,
    /// Make a profile the scope for list commands
    Select { id: String },
    /// Show the selected profile
    Current,
}

#[derive(Subcommand)]
enum ListCommands {
    List,
}

#[derive(Subcommand)]
enum PromptCommands {
    List,
    /// Generate a prompt from a template
    Generate {
        /// Template id
        #[arg(long)]
        template: String,

        /// Name of the new prompt
        #[arg(long)]
        name: String,

        /// Template variable, repeatable
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

/// Navigator for a terminal: the user opens the URL themselves
struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn navigate(&self, url: &str) -> promptly_core::Result<()> {
        println!("Open {} in your browser to sign in", url);
        Ok(())
    }
}

struct App {
    api: Arc<ApiClient>,
    session: SessionStore,
    tracker: Arc<ActivityTracker>,
    profiles: SelectedProfileStore,
}

impl App {
    fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let storage_path = config.storage_path()?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(
            FileKeyValueStore::open(&storage_path)
                .with_context(|| format!("Failed to open {}", storage_path.display()))?,
        );

        let api = Arc::new(ApiClient::from_config(
            config,
            storage.clone(),
            Arc::new(StdoutNavigator),
        )?);

        let tracker = Arc::new(ActivityTracker::new(api.clone()));
        tracker.set_enabled(config.activity_tracking.enabled);

        Ok(Self {
            session: SessionStore::new(api.clone()).with_activity_tracker(tracker.clone()),
            profiles: SelectedProfileStore::new(storage),
            api,
            tracker,
        })
    }

    async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Login => self.session.login()?,
            Commands::SetToken { token } => self.set_token(&token).await?,
            Commands::Whoami => {
                self.session.init().await;
                match self.session.user() {
                    Some(user) => print_json(&user)?,
                    None => println!("Not signed in. Run `promptly login`."),
                }
            }
            Commands::Logout => {
                self.session.init().await;
                if self.session.state().is_authenticated {
                    self.session.logout().await;
                    println!("Signed out");
                } else {
                    println!("Not signed in");
                }
            }
            Commands::Profiles { command } => self.profiles_command(command).await?,
            Commands::Personas {
                command: ListCommands::List,
            } => print_json(&self.api.list_personas(self.scope().as_deref()).await?)?,
            Commands::Templates {
                command: ListCommands::List,
            } => print_json(&self.api.list_templates(self.scope().as_deref()).await?)?,
            Commands::Prompts {
                command: PromptCommands::List,
            } => print_json(&self.api.list_prompts(self.scope().as_deref()).await?)?,
            Commands::Prompts {
                command:
                    PromptCommands::Generate {
                        template,
                        name,
                        vars,
                    },
            } => self.generate_prompt(template, name, vars).await?,
            Commands::Intents => print_json(&self.api.list_intents().await?)?,
        }

        Ok(())
    }

    async fn set_token(&self, token: &str) -> anyhow::Result<()> {
        self.session.store_token(token)?;
        self.session.validate_token().await;

        match self.session.user() {
            Some(user) => {
                self.tracker.track_login(&ActivityUser::from(&user)).await;
                println!("Signed in as {} <{}>", user.name, user.email);
                Ok(())
            }
            None => bail!("The server rejected this token"),
        }
    }

    async fn profiles_command(&self, command: ProfileCommands) -> anyhow::Result<()> {
        match command {
            ProfileCommands::List => print_json(&self.api.list_profiles().await?)?,
            ProfileCommands::Select { id } => {
                let Some(profile) = self.find_profile(&id).await? else {
                    bail!("No profile with id {}", id);
                };
                println!("Selected profile {} ({})", profile.name, profile.id);
                self.profiles.set(Some(profile));
            }
            ProfileCommands::Current => match self.profiles.stored_id() {
                None => println!("No profile selected"),
                Some(id) => match self.find_profile(&id).await? {
                    Some(profile) => {
                        print_json(&profile)?;
                        self.profiles.set(Some(profile));
                    }
                    None => println!("Selected profile {} no longer exists", id),
                },
            },
        }

        Ok(())
    }

    async fn generate_prompt(
        &self,
        template_id: String,
        name: String,
        vars: Vec<(String, String)>,
    ) -> anyhow::Result<()> {
        // Resolve the user up front so the outcome can be attributed
        self.session.init().await;
        let user = self.session.user().map(|u| ActivityUser::from(&u));
        let profile_id = self.scope();

        let request = GeneratePromptRequest {
            template_id: template_id.clone(),
            name,
            variable_values: vars.into_iter().collect(),
            profile_id: profile_id.clone(),
        };

        match self.api.generate_prompt(&request).await {
            Ok(prompt) => {
                if let Some(user) = &user {
                    self.tracker
                        .track_prompt_created(user, Some(&prompt.id), profile_id.as_deref())
                        .await;
                }
                print_json(&prompt)
            }
            Err(e) => {
                if let Some(user) = &user {
                    let extra = BTreeMap::from([("template_id".to_string(), template_id)]);
                    self.tracker
                        .track_error(user, ActivityType::PromptCreated, &e.to_string(), extra)
                        .await;
                }
                Err(e.into())
            }
        }
    }

    async fn find_profile(&self, id: &str) -> anyhow::Result<Option<Profile>> {
        let profiles = self.api.list_profiles().await?;
        Ok(profiles.into_iter().find(|p| p.id == id))
    }

    /// Profile id list commands are scoped to
    fn scope(&self) -> Option<String> {
        let scope = self.profiles.stored_id();
        debug!(profile_id = ?scope, "Resolved list scope");
        scope
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    // Environment variables override the file
    config.merge_env();
    config.validate()?;
    Ok(config)
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging.level)?;
    info!(api = %config.base_url(), "Promptly CLI starting");

    let app = App::new(&config)?;
    app.run(cli.command).await
}
