mod hook;
mod install;
mod status;
mod uninstall;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::installer::{Installer, Outcome, StepReport};
use crate::target::{InstallTarget, Scope};
use crate::templates::Templates;

#[derive(Parser)]
#[command(name = "bmad-mode-changer")]
#[command(about = "Restore the active BMad agent after Claude Code mode switches (Shift+Tab)")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Show debug logs
    #[arg(long, global = true)]
    verbose: bool,

    /// Read templates from this directory instead of the built-in ones
    #[arg(long, global = true, env = "BMAD_MODE_TEMPLATES", value_name = "DIR")]
    templates_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the agent state hook (current project, or --global)
    Install(install::InstallArgs),

    /// Remove the hook, its settings entry and the CLAUDE.md section
    Uninstall(uninstall::UninstallArgs),

    /// Show installation state and the saved agent
    Status(status::StatusArgs),

    /// Handle UserPromptSubmit events (internal, called by Claude Code)
    #[command(hide = true)]
    Hook(hook::HookArgs),
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run(self) -> Result<()> {
        let output = OutputConfig {
            json: self.json,
            quiet: self.quiet,
        };

        let Some(command) = self.command else {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        };

        match command {
            Commands::Install(args) => install::run(args, output, self.templates_dir),
            Commands::Uninstall(args) => uninstall::run(args, output),
            Commands::Status(args) => status::run(args, output),
            Commands::Hook(args) => hook::run(args, output),
        }
    }
}

/// Output configuration passed to all commands
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
}

/// Resolve the target and wire up an installer with config and CLI
/// overrides applied. Only `install` reads templates; other commands pass
/// `None`.
fn build_installer(global: bool, templates_dir: Option<PathBuf>) -> Result<Installer> {
    let target = InstallTarget::resolve(Scope::from_flag(global))?;
    let config = Config::load_or_default(&target.config_path()).with_templates_dir(templates_dir);

    let hook_bin = match config.hook.bin {
        Some(bin) => bin,
        None => std::env::current_exe().context("Failed to locate the running executable")?,
    };

    Ok(Installer::new(
        target,
        Templates::new(config.templates.dir),
        env!("CARGO_PKG_VERSION"),
        hook_bin,
    ))
}

#[derive(Serialize)]
struct StepOutput {
    artifact: &'static str,
    path: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&StepReport> for StepOutput {
    fn from(step: &StepReport) -> Self {
        Self {
            artifact: step.artifact.label(),
            path: step.path.display().to_string(),
            outcome: step.outcome.as_str(),
            error: match &step.outcome {
                Outcome::Failed(msg) => Some(msg.clone()),
                _ => None,
            },
        }
    }
}

fn step_outputs(steps: &[StepReport]) -> Vec<StepOutput> {
    steps.iter().map(StepOutput::from).collect()
}

/// One line per step, e.g. `  ✓ settings hook      created  .claude/settings.local.json`.
fn print_steps(steps: &[StepReport]) {
    for step in steps {
        let (glyph, word) = match &step.outcome {
            Outcome::Created => ("✓".green(), "created".green()),
            Outcome::Updated => ("✓".green(), "updated".green()),
            Outcome::Removed => ("✓".green(), "removed".green()),
            Outcome::Skipped => ("⏭".yellow(), "skipped".yellow()),
            Outcome::NotFound => ("-".dimmed(), "not found".dimmed()),
            Outcome::Failed(_) => ("✗".red(), "failed".red()),
        };
        println!(
            "  {} {:<18} {:<9} {}",
            glyph,
            step.artifact.label(),
            word,
            step.path.display().to_string().dimmed()
        );
        if let Outcome::Failed(msg) = &step.outcome {
            println!("      {}", msg.red());
        }
    }
}

fn failed_count(steps: &[StepReport]) -> usize {
    steps.iter().filter(|s| s.outcome.is_failure()).count()
}
