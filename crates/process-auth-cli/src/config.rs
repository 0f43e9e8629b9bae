//! Command line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PROCESS_AUTH_LOG_LEVEL` | warn | Log level |
//! | `PROCESS_AUTH_OUTPUT` | text | Output format (`text` or `json`) |
//!
//! `RUST_LOG`, if set, replaces the log filter entirely.
//!
//! # Example
//!
//! ```rust
//! use clap::Parser;
//! use helios_process_auth_cli::{CliConfig, Command};
//!
//! let config = CliConfig::try_parse_from([
//!     "process-auth",
//!     "validate",
//!     "--resource",
//!     "ping.json",
//!     "--known-organization-role",
//!     "http://dsf.dev/fhir/CodeSystem/organization-role|DIC",
//! ])
//! .unwrap();
//!
//! assert!(matches!(config.command, Command::Validate(_)));
//! assert!(config.validate().is_ok());
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use helios_process_auth::ExistencePredicates;
use helios_process_auth::fhir::{Coding, Identifier};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration of the `process-auth` tool.
#[derive(Debug, Clone, Parser)]
#[command(name = "process-auth")]
#[command(about = "Validate, query and evaluate process authorization rules")]
#[command(version)]
pub struct CliConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "PROCESS_AUTH_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Output format.
    #[arg(
        long,
        env = "PROCESS_AUTH_OUTPUT",
        value_enum,
        default_value_t = OutputFormat::Text,
        global = true
    )]
    pub output: OutputFormat,

    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Output format of command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per result.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Commands of the `process-auth` tool.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate the authorization rules of a process definition.
    Validate(ValidateArgs),
    /// List the subjects allowed to send a message.
    Requesters(QueryArgs),
    /// List the subjects allowed to receive a message.
    Recipients(QueryArgs),
    /// Check whether an identity may send or receive a message.
    Check(CheckArgs),
}

/// Arguments of the `validate` command.
///
/// Each `--known-*` list, when given, restricts the corresponding existence
/// check to its members. Without it, every reference is accepted.
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// ActivityDefinition JSON file.
    #[arg(long)]
    pub resource: PathBuf,

    /// Known task profile canonical URL, with or without `|version`.
    #[arg(long = "known-profile")]
    pub known_profiles: Vec<String>,

    /// Known organization identifier value.
    #[arg(long = "known-organization")]
    pub known_organizations: Vec<String>,

    /// Known organization role as `system|code`.
    #[arg(long = "known-organization-role")]
    pub known_organization_roles: Vec<String>,

    /// Known practitioner role as `system|code`.
    #[arg(long = "known-practitioner-role")]
    pub known_practitioner_roles: Vec<String>,
}

/// Arguments selecting one message of a process definition.
#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// ActivityDefinition JSON file.
    #[arg(long)]
    pub resource: PathBuf,

    /// Canonical URL of the process.
    #[arg(long)]
    pub process_url: String,

    /// Version of the process.
    #[arg(long)]
    pub process_version: String,

    /// Message name.
    #[arg(long)]
    pub message_name: String,

    /// Task profile of the message; may be repeated.
    #[arg(long = "task-profile", required = true)]
    pub task_profiles: Vec<String>,
}

/// Which side of the message exchange to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// The sender.
    Requester,
    /// The receiver.
    Recipient,
}

/// Arguments of the `check` command.
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// The message to check.
    #[command(flatten)]
    pub query: QueryArgs,

    /// Identity JSON file.
    #[arg(long)]
    pub identity: PathBuf,

    /// OrganizationAffiliation JSON file: an array, a single resource, or a Bundle.
    #[arg(long)]
    pub affiliations: Option<PathBuf>,

    /// Check the identity as sender or receiver.
    #[arg(long = "as", value_enum)]
    pub direction: Direction,
}

/// Parses a `system|code` pair.
pub fn parse_coding(value: &str) -> Result<Coding, String> {
    match value.split_once('|') {
        Some((system, code)) if !system.trim().is_empty() && !code.trim().is_empty() => {
            Ok(Coding::new(system, code))
        }
        _ => Err(format!("Expected system|code, found '{}'", value)),
    }
}

fn parse_codings(values: &[String]) -> Result<Vec<Coding>, String> {
    values.iter().map(|v| parse_coding(v)).collect()
}

impl ValidateArgs {
    /// Builds existence predicates from the `--known-*` lists.
    pub fn predicates(&self) -> Result<ExistencePredicates, String> {
        let mut predicates = ExistencePredicates::allow_all();

        if !self.known_profiles.is_empty() {
            let known: HashSet<String> = self.known_profiles.iter().cloned().collect();
            predicates = predicates.with_profile_exists(move |profile: &str| {
                let base = profile.split_once('|').map_or(profile, |(base, _)| base);
                known.contains(profile) || known.contains(base)
            });
        }

        if !self.known_organizations.is_empty() {
            let known: HashSet<String> = self.known_organizations.iter().cloned().collect();
            predicates = predicates.with_organization_with_identifier_exists(
                move |identifier: &Identifier| {
                    identifier.value().is_some_and(|v| known.contains(v))
                },
            );
        }

        if !self.known_organization_roles.is_empty() {
            let known = parse_codings(&self.known_organization_roles)?;
            predicates = predicates.with_organization_role_exists(move |role: &Coding| {
                known.iter().any(|k| role.same_concept(k))
            });
        }

        if !self.known_practitioner_roles.is_empty() {
            let known = parse_codings(&self.known_practitioner_roles)?;
            predicates = predicates.with_practitioner_role_exists(move |role: &Coding| {
                known.iter().any(|k| role.same_concept(k))
            });
        }

        Ok(predicates)
    }
}

impl QueryArgs {
    fn validate(&self, errors: &mut Vec<String>) {
        if self.process_url.trim().is_empty() {
            errors.push("Process URL cannot be blank".to_string());
        }
        if self.process_version.trim().is_empty() {
            errors.push("Process version cannot be blank".to_string());
        }
        if self.message_name.trim().is_empty() {
            errors.push("Message name cannot be blank".to_string());
        }
        if self.task_profiles.iter().all(|p| p.trim().is_empty()) {
            errors.push("At least one non-blank task profile is required".to_string());
        }
    }
}

impl CliConfig {
    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        match &self.command {
            Command::Validate(args) => {
                for value in args
                    .known_organization_roles
                    .iter()
                    .chain(&args.known_practitioner_roles)
                {
                    if let Err(e) = parse_coding(value) {
                        errors.push(e);
                    }
                }
            }
            Command::Requesters(args) | Command::Recipients(args) => args.validate(&mut errors),
            Command::Check(args) => args.query.validate(&mut errors),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
