//! classdesk CLI - API server and maintenance jobs for the classdesk platform
//!
//! - `serve`: run the HTTP API
//! - `heartbeat`: write liveness rows to the `logs` table
//! - `migrate`: apply schema migrations
//! - `completions`: shell completion scripts

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "classdesk",
    author,
    version,
    about = "Class scheduling, enrollment and payments API",
    long_about = "Runs the classdesk HTTP API and its background jobs. Provider credentials \
                  (Stripe, QuickBooks, Webflow) are read from the environment or a .env file."
)]
struct Cli {
    /// Debug logging unless RUST_LOG is set
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Write heartbeat rows (once, or on an interval)
    Heartbeat(commands::heartbeat::HeartbeatArgs),
    /// Apply pending database migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(clap::Args, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Heartbeat(args) => commands::run_heartbeat(args).await,
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Completions(args) => run_completions(args),
    };

    tracing_setup::shutdown_otel();
    result
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn heartbeat_defaults_to_five_minutes() {
        let cli = Cli::try_parse_from(["classdesk", "heartbeat"]).unwrap();
        match cli.command {
            Commands::Heartbeat(args) => {
                assert_eq!(args.interval_secs, 300);
                assert!(!args.once);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Cli::try_parse_from(["classdesk", "heartbeat", "--interval-secs", "0"]).is_err());
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "classdesk",
            "--debug",
            "serve",
            "--bind",
            "0.0.0.0:8080",
            "--cors-permissive",
            "--migrate",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind.port(), 8080);
                assert!(args.cors_permissive);
                assert!(args.migrate);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
