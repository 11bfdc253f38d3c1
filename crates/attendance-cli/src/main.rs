// crates/attendance-cli/src/main.rs
// ============================================================================
// Module: Program Attendance CLI Entry Point
// Description: Command dispatcher for serving and maintaining the attendance API.
// Purpose: Start the HTTP server, validate config, and seed catalogs.
// Dependencies: clap, attendance-api, attendance-config, attendance-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! `program-attendance` runs the enrollment API (`serve`), checks configuration
//! files (`config validate`), and loads program and account catalogs
//! (`catalog validate`, `catalog import`). Errors go to stderr with a failure
//! exit code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use attendance_api::AttendanceServer;
use attendance_api::build_store;
use attendance_cli::catalog_file::read_catalog;
use attendance_cli::serve_policy::BindOutcome;
use attendance_cli::serve_policy::enforce_local_only;
use attendance_cli::serve_policy::resolve_allow_non_loopback;
use attendance_config::AttendanceConfig;
use attendance_config::StoreType;
use attendance_core::SystemClock;
use attendance_store_sqlite::SqliteAttendanceStore;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "program-attendance", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the attendance HTTP API.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Program and account catalog utilities.
    Catalog {
        /// Selected catalog subcommand.
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to program-attendance.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Catalog JSON to load into the store before serving.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
    /// Allow binding to non-loopback addresses (requires configured tokens).
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to program-attendance.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Catalog subcommands.
#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Parse a catalog file without writing it anywhere.
    Validate(CatalogValidateCommand),
    /// Upsert a catalog file into the configured SQLite store.
    Import(CatalogImportCommand),
}

/// Arguments for `catalog validate`.
#[derive(Args, Debug)]
struct CatalogValidateCommand {
    /// Catalog JSON file.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
}

/// Arguments for `catalog import`.
#[derive(Args, Debug)]
struct CatalogImportCommand {
    /// Optional config file path (defaults to program-attendance.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Catalog JSON file.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("program-attendance {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Catalog {
            command,
        } => command_catalog(command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = AttendanceConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let allow_non_loopback = resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    let bind_outcome = enforce_local_only(&config, allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    warn_serve_posture(&bind_outcome)?;

    let catalog = command
        .catalog
        .as_deref()
        .map(read_catalog)
        .transpose()
        .map_err(|err| CliError::new(err.to_string()))?;
    let server = tokio::task::spawn_blocking(move || {
        let store = build_store(&config.store, catalog)?;
        AttendanceServer::with_store(config, store, Arc::new(SystemClock))
    })
    .await
    .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
    .map_err(|err| CliError::new(format!("server init failed: {err}")))?;

    let base_path = server.config().server.base_path.clone();
    write_stderr_line(&format!(
        "program-attendance: serving http://{}{base_path}",
        bind_outcome.bind_addr
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;

    Ok(ExitCode::SUCCESS)
}

/// Emits startup warnings for exposed or unaudited servers.
fn warn_serve_posture(outcome: &BindOutcome) -> CliResult<()> {
    if outcome.network_exposed {
        write_stderr_line(&format!(
            "program-attendance: WARNING: listening on non-loopback address {}; terminate TLS \
             in front of this service",
            outcome.bind_addr
        ))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    if !outcome.audit_enabled {
        write_stderr_line("program-attendance: WARNING: request audit logging is disabled")
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = AttendanceConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let store = match config.store.store_type {
        StoreType::Memory => "memory",
        StoreType::Sqlite => "sqlite",
    };
    write_stdout_line(&format!(
        "config ok: bind={} base_path={} store={store} tokens={}",
        config.server.bind,
        config.server.base_path,
        config.server.auth.tokens.len()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Catalog Commands
// ============================================================================

/// Dispatches catalog subcommands.
fn command_catalog(command: CatalogCommand) -> CliResult<ExitCode> {
    match command {
        CatalogCommand::Validate(command) => command_catalog_validate(&command),
        CatalogCommand::Import(command) => command_catalog_import(&command),
    }
}

/// Executes the catalog validation command.
fn command_catalog_validate(command: &CatalogValidateCommand) -> CliResult<ExitCode> {
    let snapshot = read_catalog(&command.file).map_err(|err| CliError::new(err.to_string()))?;
    let disabled = snapshot.programs.iter().filter(|program| program.is_disabled).count();
    write_stdout_line(&format!(
        "catalog ok: programs={} disabled={disabled} accounts={}",
        snapshot.programs.len(),
        snapshot.accounts.len()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the catalog import command.
fn command_catalog_import(command: &CatalogImportCommand) -> CliResult<ExitCode> {
    let config = AttendanceConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let Some(sqlite_config) = config.store.sqlite_config() else {
        return Err(CliError::new(
            "catalog import requires store.type = \"sqlite\"; use serve --catalog for the memory \
             store"
                .to_string(),
        ));
    };
    let snapshot = read_catalog(&command.file).map_err(|err| CliError::new(err.to_string()))?;
    let store = SqliteAttendanceStore::new(sqlite_config)
        .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
    let summary = store
        .import_catalog(&snapshot)
        .map_err(|err| CliError::new(format!("catalog import failed: {err}")))?;
    write_stdout_line(&format!(
        "catalog imported: programs={} accounts={}",
        summary.programs, summary.accounts
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
