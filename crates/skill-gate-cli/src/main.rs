// crates/skill-gate-cli/src/main.rs
// ============================================================================
// Module: Skill Gate CLI Entry Point
// Description: Command dispatcher for intake, evolution, promotion, rollback.
// Purpose: Thin flag-driven adapters over the pipeline components.
// Dependencies: clap, skill-gate-{core,pipeline,registry,sandbox}, thiserror
// ============================================================================

//! ## Overview
//! The Skill Gate CLI exposes the four pipeline surfaces: `day-logger`
//! builds the work queue from day logs, `night-evolver` drives pending
//! items through the trust gates into staging, `promote` runs the
//! evaluation gates and flips staging to prod, and `rollback` restores a
//! previously promoted version. Every failure maps to a non-zero exit.
//!
//! Security posture: all file inputs are untrusted; the pipeline crates
//! validate them fail-closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use skill_gate_core::SkillName;
use skill_gate_core::VersionId;
use skill_gate_pipeline::EvolutionController;
use skill_gate_pipeline::EvolveConfig;
use skill_gate_pipeline::MockGenerator;
use skill_gate_pipeline::Promoter;
use skill_gate_pipeline::PromoterConfig;
use skill_gate_pipeline::PromotionDecision;
use skill_gate_pipeline::QueueStore;
use skill_gate_pipeline::build_queue;
use skill_gate_pipeline::parse_log;
use skill_gate_pipeline::rollback_skill;
use skill_gate_registry::AuditLogger;
use skill_gate_registry::Registry;
use skill_gate_sandbox::InterpreterBackend;
use skill_gate_sandbox::SandboxRunner;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "skill-gate", about = "Trust pipeline for machine-generated skills")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract MISSING capabilities from a day log into the work queue.
    DayLogger(DayLoggerCommand),
    /// Process pending queue items through the trust gates into staging.
    NightEvolver(NightEvolverCommand),
    /// Promote staged skills to production through the evaluation gates.
    Promote(PromoteCommand),
    /// Roll a skill back to a previously promoted version.
    Rollback(RollbackCommand),
}

/// Arguments for the day-logger command.
#[derive(Args, Debug)]
struct DayLoggerCommand {
    /// Path to the input day log file.
    #[arg(long, value_name = "PATH")]
    log: PathBuf,
    /// Path to the output queue JSON file.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
}

/// Arguments for the night-evolver command.
#[derive(Args, Debug)]
struct NightEvolverCommand {
    /// Path to the work queue JSON file.
    #[arg(long, value_name = "PATH")]
    queue: PathBuf,
    /// Path to the staging directory.
    #[arg(long, value_name = "DIR")]
    staging: PathBuf,
    /// Path to the registry JSON file.
    #[arg(long, value_name = "PATH")]
    registry: PathBuf,
    /// Generator provider to use.
    #[arg(long, value_name = "NAME", default_value = "mock")]
    provider: String,
    /// Optional path to the audit log file.
    #[arg(long, value_name = "PATH")]
    audit_log: Option<PathBuf>,
    /// Skip sandbox verification entirely.
    #[arg(long)]
    skip_sandbox: bool,
}

/// Arguments for the promote command.
#[derive(Args, Debug)]
struct PromoteCommand {
    /// Path to the staging skills directory.
    #[arg(long, value_name = "DIR")]
    staging: PathBuf,
    /// Path to the production skills directory.
    #[arg(long, value_name = "DIR")]
    prod: PathBuf,
    /// Path to the registry JSON file.
    #[arg(long, value_name = "PATH")]
    registry: PathBuf,
    /// Path to the evaluation data directory.
    #[arg(long, value_name = "DIR")]
    eval_dir: PathBuf,
    /// Promote a specific skill (promotes all eligible if omitted).
    #[arg(long, value_name = "NAME")]
    skill: Option<String>,
    /// Path to the audit log file.
    #[arg(long, value_name = "PATH", default_value = "data/audit.log")]
    audit_log: PathBuf,
}

/// Arguments for the rollback command.
#[derive(Args, Debug)]
struct RollbackCommand {
    /// Name of the skill to roll back.
    #[arg(long, value_name = "NAME")]
    skill: String,
    /// Target version to roll back to.
    #[arg(long, value_name = "VERSION")]
    to: String,
    /// Path to the registry JSON file.
    #[arg(long, value_name = "PATH")]
    registry: PathBuf,
    /// Path to the audit log file.
    #[arg(long, value_name = "PATH")]
    audit_log: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::DayLogger(command) => command_day_logger(&command),
        Commands::NightEvolver(command) => command_night_evolver(command),
        Commands::Promote(command) => command_promote(command),
        Commands::Rollback(command) => command_rollback(&command),
    }
}

// ============================================================================
// SECTION: Day Logger Command
// ============================================================================

/// Executes the `day-logger` command.
fn command_day_logger(command: &DayLoggerCommand) -> CliResult<ExitCode> {
    let capabilities =
        parse_log(&command.log).map_err(|err| CliError::new(err.to_string()))?;

    let store = QueueStore::new(&command.out);
    let existing = store.load().map_err(|err| CliError::new(err.to_string()))?;
    let mut queue = build_queue(&capabilities, Some(existing));
    store.save(&mut queue).map_err(|err| CliError::new(err.to_string()))?;

    write_stdout_line(&format!(
        "Parsed {} MISSING tags from {}",
        capabilities.len(),
        command.log.display()
    ))?;
    write_stdout_line(&format!(
        "Queue now has {} items ({} pending)",
        queue.items.len(),
        queue.pending_count()
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Night Evolver Command
// ============================================================================

/// Executes the `night-evolver` command.
fn command_night_evolver(command: NightEvolverCommand) -> CliResult<ExitCode> {
    if command.provider != "mock" {
        return Err(CliError::new(format!(
            "Unknown provider: {}. Supported: mock",
            command.provider
        )));
    }
    let generator = MockGenerator::new();
    let sandbox = SandboxRunner::with_defaults();

    let config = EvolveConfig {
        queue_path: command.queue,
        staging_path: command.staging,
        registry_path: command.registry,
        audit_log_path: command.audit_log,
        skip_sandbox: command.skip_sandbox,
    };
    let skip_requested = config.skip_sandbox;

    let controller = EvolutionController::new(config, &generator, &sandbox)
        .map_err(|err| CliError::new(err.to_string()))?;
    let report = controller.run().map_err(|err| CliError::new(err.to_string()))?;

    if !report.sandbox_active && !skip_requested {
        write_stderr_line(
            "Warning: Docker sandbox unavailable - sandbox verification was skipped. \
             Build the sandbox image with: \
             docker build -f docker/Dockerfile.sandbox -t skill-gate-sandbox:latest .",
        )
        .map_err(|err| CliError::new(err.to_string()))?;
    }

    write_stdout_line("Night Evolver completed:")?;
    write_stdout_line(&format!("  Processed: {}", report.summary.processed))?;
    write_stdout_line(&format!("  Succeeded: {}", report.summary.succeeded))?;
    write_stdout_line(&format!("  Failed:    {}", report.summary.failed))?;
    write_stdout_line(&format!("  Skipped:   {}", report.summary.skipped))?;

    if report.summary.failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Promote Command
// ============================================================================

/// Executes the `promote` command.
fn command_promote(command: PromoteCommand) -> CliResult<ExitCode> {
    let config = PromoterConfig {
        staging_path: command.staging,
        prod_path: command.prod,
        registry_path: command.registry,
        eval_dir: command.eval_dir,
        audit_log_path: command.audit_log,
    };
    let promoter = Promoter::new(config, Arc::new(InterpreterBackend::new()));

    if let Some(skill) = command.skill {
        let skill_name = parse_skill_name(&skill)?;
        let decision = promoter
            .promote_skill(&skill_name)
            .map_err(|err| CliError::new(err.to_string()))?;
        return match decision {
            PromotionDecision::Promoted {
                ..
            } => {
                write_stdout_line(&format!("Successfully promoted {skill}"))?;
                Ok(ExitCode::SUCCESS)
            }
            PromotionDecision::Rejected {
                ..
            } => {
                write_stdout_line(&format!("Failed to promote {skill}"))?;
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let report = promoter.promote_all().map_err(|err| CliError::new(err.to_string()))?;
    if !report.promoted.is_empty() {
        write_stdout_line(&format!("Promoted: {}", report.promoted.join(", ")))?;
    }
    if !report.failed.is_empty() {
        write_stdout_line(&format!("Failed: {}", report.failed.join(", ")))?;
    }
    if !report.skipped.is_empty() {
        write_stdout_line(&format!("Skipped (no staging): {}", report.skipped.join(", ")))?;
    }

    if report.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// SECTION: Rollback Command
// ============================================================================

/// Executes the `rollback` command.
fn command_rollback(command: &RollbackCommand) -> CliResult<ExitCode> {
    let skill_name = parse_skill_name(&command.skill)?;
    let target = VersionId::new(command.to.clone())
        .map_err(|err| CliError::new(format!("Error: {err}")))?;

    let registry = Registry::new(&command.registry);
    let audit = AuditLogger::new(&command.audit_log);
    rollback_skill(&registry, &audit, &skill_name, &target)
        .map_err(|err| CliError::new(format!("Error: {err}")))?;

    write_stdout_line(&format!(
        "Successfully rolled back {} to version {}",
        command.skill, command.to
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Parses a validated skill name argument.
fn parse_skill_name(raw: &str) -> CliResult<SkillName> {
    SkillName::new(raw).map_err(|err| CliError::new(format!("Error: {err}")))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
