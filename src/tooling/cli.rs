//! CLI Tooling
//!
//! Command-line interface for running the exchange worker, managing the
//! agent card, memory and registry listing, and querying the registry.

use crate::card::AgentProfile;
use crate::config::{AgentConfig, ConfigLoader};
use crate::error::ApiError;
use crate::handler::HandlerRegistry;
use crate::memory::MemoryStore;
use crate::registration::{validate_for_registration, Registrar};
use crate::registry::{RegistryClient, SearchQuery};
use crate::tooling::format::{
    card_summary_json, format_card_text, format_domains_text, format_memory_text,
    format_outcomes_text, format_search_text, format_trust_text,
};
use crate::worker::ExchangeWorker;
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;

/// ClawPrint agent - bid on and fulfil exchange requests
#[derive(Parser)]
#[command(name = "clawprint-agent")]
#[command(about = "Agent-side worker for the ClawPrint brokered exchange")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Write logging flags over the loaded config.
    pub fn apply_logging_overrides(&self, config: &mut AgentConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the exchange and fulfil matching requests
    Run {
        /// Process at most one new request, then exit
        #[arg(long)]
        once: bool,
        /// Handler name (overrides worker.handler)
        #[arg(long)]
        handler: Option<String>,
        /// Agent card path (overrides worker.card_path)
        #[arg(long)]
        card: Option<PathBuf>,
    },
    /// Agent card commands (validate, show)
    Card {
        #[command(subcommand)]
        command: CardCommands,
    },
    /// Agent memory commands (get, set, rm, list)
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },
    /// Register the agent card with the registry
    Register {
        /// Agent card path (overrides worker.card_path)
        #[arg(long)]
        card: Option<PathBuf>,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Patch fields of the agent's registry listing (requires an API key)
    Update {
        /// Agent card path, for the handle (overrides worker.card_path)
        #[arg(long)]
        card: Option<PathBuf>,
        /// Field to set, as KEY=VALUE; VALUE is parsed as JSON, otherwise a string
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        set: Vec<String>,
    },
    /// Search the agent registry
    Search {
        #[command(flatten)]
        filters: SearchArgs,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show an agent's registry card
    Agent { handle: String },
    /// Evaluate trust for an agent
    Trust {
        handle: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List capability domains
    Domains {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the API discovery document
    Discover,
    /// Scan text for security threats (requires an API key)
    Scan { content: String },
    /// Requester-side exchange requests (require an API key)
    Request {
        #[command(subcommand)]
        command: RequestCommands,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Registry search filters; unset filters are not sent.
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Free-text query
    #[arg(long)]
    pub q: Option<String>,
    #[arg(long)]
    pub domain: Option<String>,
    #[arg(long)]
    pub protocol: Option<String>,
    #[arg(long)]
    pub max_cost: Option<f64>,
    #[arg(long)]
    pub min_verification: Option<String>,
    /// Sort order, e.g. trust_score
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub offset: Option<u32>,
}

impl From<&SearchArgs> for SearchQuery {
    fn from(args: &SearchArgs) -> Self {
        SearchQuery {
            q: args.q.clone(),
            domain: args.domain.clone(),
            protocol: args.protocol.clone(),
            max_cost: args.max_cost,
            min_verification: args.min_verification.clone(),
            sort: args.sort.clone(),
            limit: args.limit,
            offset: args.offset,
        }
    }
}

#[derive(Subcommand)]
pub enum RequestCommands {
    /// Post a new exchange request
    Create {
        /// Domain to route the request to (repeatable)
        #[arg(long = "domain", required = true)]
        domains: Vec<String>,
        /// Task description
        #[arg(long)]
        task: String,
        /// Requirements as a JSON object
        #[arg(long)]
        requirements: Option<String>,
    },
    /// Show an exchange request's status
    Get { id: String },
}

#[derive(Subcommand)]
pub enum CardCommands {
    /// Parse the card and report its handle, services and domains
    Validate {
        #[arg(long)]
        card: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the parsed card as JSON
    Show {
        #[arg(long)]
        card: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum MemoryCommands {
    /// Print the value stored under a key
    Get { key: String },
    /// Store a value; parsed as JSON, otherwise stored as a string
    Set { key: String, value: String },
    /// Remove a key
    Rm { key: String },
    /// List all entries
    List {
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration (API key redacted)
    Show,
}

/// CLI context for executing commands
pub struct CliContext {
    config: AgentConfig,
    registry: HandlerRegistry,
}

impl CliContext {
    /// Load configuration and register the built-in handlers.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_with(config_path.as_deref())?;
        Ok(Self::with_config(config, HandlerRegistry::with_builtins()))
    }

    /// Context over an already-built config and handler set.
    pub fn with_config(config: AgentConfig, registry: HandlerRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AgentConfig {
        &mut self.config
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Run {
                once,
                handler,
                card,
            } => self.handle_run(*once, handler.as_deref(), card.as_deref()),
            Commands::Card { command } => self.handle_card(command),
            Commands::Memory { command } => self.handle_memory(command),
            Commands::Register { card, yes } => self.handle_register(card.as_deref(), *yes),
            Commands::Update { card, set } => self.handle_update(card.as_deref(), set),
            Commands::Search { filters, format } => {
                let response = self.block_on_registry(|r| async move {
                    r.search(&SearchQuery::from(filters)).await
                })?;
                render(&response, format, format_search_text)
            }
            Commands::Agent { handle } => {
                let response = self.block_on_registry(|r| async move { r.get_agent(handle).await })?;
                to_pretty_json(&response)
            }
            Commands::Trust { handle, format } => {
                let response = self.block_on_registry(|r| async move { r.trust(handle).await })?;
                render(&response, format, format_trust_text)
            }
            Commands::Domains { format } => {
                let response = self.block_on_registry(|r| async move { r.domains().await })?;
                render(&response, format, format_domains_text)
            }
            Commands::Discover => {
                let response = self.block_on_registry(|r| async move { r.discover().await })?;
                to_pretty_json(&response)
            }
            Commands::Scan { content } => {
                let response = self.block_on_registry(|r| async move { r.scan(content).await })?;
                to_pretty_json(&response)
            }
            Commands::Request { command } => self.handle_request(command),
            Commands::Config { command } => match command {
                ConfigCommands::Show => self.config.to_redacted_toml(),
            },
        }
    }

    fn card_path<'a>(&'a self, card: Option<&'a Path>) -> &'a Path {
        card.unwrap_or(self.config.worker.card_path.as_path())
    }

    fn runtime() -> Result<tokio::runtime::Runtime, ApiError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create async runtime: {}", e)))
    }

    fn handle_run(
        &self,
        once: bool,
        handler: Option<&str>,
        card: Option<&Path>,
    ) -> Result<String, ApiError> {
        let mut config = self.config.clone();
        if once {
            config.worker.run_once = true;
        }
        if let Some(handler) = handler {
            config.worker.handler = handler.to_string();
        }
        if let Some(card) = card {
            config.worker.card_path = card.to_path_buf();
        }

        let mut worker = ExchangeWorker::from_config(&config, &self.registry)?;
        let outcomes = Self::runtime()?.block_on(worker.run())?;
        Ok(format_outcomes_text(&outcomes))
    }

    fn handle_card(&self, command: &CardCommands) -> Result<String, ApiError> {
        match command {
            CardCommands::Validate { card, format } => {
                let profile = AgentProfile::load(self.card_path(card.as_deref()))?;
                match format.as_str() {
                    "json" => to_pretty_json(&card_summary_json(&profile)),
                    "text" => Ok(format_card_text(&profile)),
                    other => Err(invalid_format(other)),
                }
            }
            CardCommands::Show { card } => {
                let profile = AgentProfile::load(self.card_path(card.as_deref()))?;
                to_pretty_json(&profile.card_json())
            }
        }
    }

    fn handle_memory(&self, command: &MemoryCommands) -> Result<String, ApiError> {
        let store = MemoryStore::open(&self.config.worker.memory_path)?;
        match command {
            MemoryCommands::Get { key } => match store.get(key) {
                Some(value) => to_pretty_json(&value),
                None => Err(ApiError::Validation(format!("Key '{}' not found", key))),
            },
            MemoryCommands::Set { key, value } => {
                store.set(key, parse_value(value))?;
                Ok(format!("Stored '{}'", key))
            }
            MemoryCommands::Rm { key } => match store.remove(key)? {
                Some(_) => Ok(format!("Removed '{}'", key)),
                None => Ok(format!("Key '{}' was not set", key)),
            },
            MemoryCommands::List { format } => {
                let entries = store.get_all();
                match format.as_str() {
                    "json" => to_pretty_json(&Value::Object(entries)),
                    "text" => Ok(format_memory_text(&entries)),
                    other => Err(invalid_format(other)),
                }
            }
        }
    }

    /// Run one registry call on a fresh runtime.
    fn block_on_registry<F, Fut>(&self, call: F) -> Result<Value, ApiError>
    where
        F: FnOnce(RegistryClient) -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        let registry = RegistryClient::from_config(&self.config.exchange)?;
        Self::runtime()?.block_on(call(registry))
    }

    fn handle_register(&self, card: Option<&Path>, yes: bool) -> Result<String, ApiError> {
        let profile = AgentProfile::load(self.card_path(card))?;
        validate_for_registration(&profile)?;

        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Register agent '{}' with {}?",
                    profile.handle, self.config.exchange.base_url
                ))
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Registration cancelled".to_string());
            }
        }

        let registrar = Registrar::new(
            RegistryClient::from_config(&self.config.exchange)?,
            profile.handle.clone(),
        );
        let response = Self::runtime()?.block_on(registrar.register(&profile))?;
        info!(handle = %profile.handle, "Agent registered");
        to_pretty_json(&response)
    }

    fn handle_update(&self, card: Option<&Path>, set: &[String]) -> Result<String, ApiError> {
        let profile = AgentProfile::load(self.card_path(card))?;
        let mut fields = Map::new();
        for pair in set {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ApiError::Validation(format!("Invalid field '{}': expected KEY=VALUE", pair))
            })?;
            fields.insert(key.trim().to_string(), parse_value(value));
        }

        let registrar = Registrar::new(
            RegistryClient::from_config(&self.config.exchange)?,
            profile.handle.clone(),
        );
        let response = Self::runtime()?.block_on(registrar.update(fields))?;
        info!(handle = %profile.handle, "Agent listing updated");
        to_pretty_json(&response)
    }

    fn handle_request(&self, command: &RequestCommands) -> Result<String, ApiError> {
        let response = match command {
            RequestCommands::Create {
                domains,
                task,
                requirements,
            } => {
                let requirements = requirements
                    .as_deref()
                    .map(|text| {
                        serde_json::from_str::<Value>(text).map_err(|e| {
                            ApiError::Validation(format!("Invalid requirements JSON: {}", e))
                        })
                    })
                    .transpose()?;
                self.block_on_registry(|r| async move {
                    r.create_exchange_request(domains, task, requirements).await
                })?
            }
            RequestCommands::Get { id } => {
                self.block_on_registry(|r| async move { r.get_exchange_request(id).await })?
            }
        };
        to_pretty_json(&response)
    }
}

/// JSON if it parses, otherwise the text as a string.
fn parse_value(text: &str) -> Value {
    serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn render(value: &Value, format: &str, text: fn(&Value) -> String) -> Result<String, ApiError> {
    match format {
        "json" => to_pretty_json(value),
        "text" => Ok(text(value)),
        other => Err(invalid_format(other)),
    }
}

fn to_pretty_json(value: &Value) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)))
}

fn invalid_format(format: &str) -> ApiError {
    ApiError::Validation(format!(
        "Invalid format: {} (must be 'text' or 'json')",
        format
    ))
}
