//! Helios Process Authorization CLI
//!
//! Library backing the `process-auth` tool, which validates, queries and
//! evaluates the process authorization rules of an `ActivityDefinition`:
//!
//! ```text
//! process-auth validate --resource ping.json --known-organization Test_DIC
//! process-auth requesters --resource ping.json --process-url http://dsf.dev/bpe/Process/ping \
//!     --process-version 1.0 --message-name ping --task-profile http://dsf.dev/fhir/StructureDefinition/task-ping
//! process-auth check --resource ping.json ... --identity identity.json --affiliations affiliations.json --as requester
//! ```

#![warn(missing_docs)]

pub mod commands;
pub mod config;

pub use commands::run;
pub use config::{CliConfig, Command, Direction, OutputFormat};

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise both process authorization crates
/// log at `level`. Log output goes to stderr so that command results on stdout
/// stay machine readable.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "helios_process_auth={},helios_process_auth_cli={}",
            level, level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
