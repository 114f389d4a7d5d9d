use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::{build_installer, failed_count, print_steps, step_outputs, OutputConfig, StepOutput};
use crate::installer::InstallAction;

#[derive(Args)]
pub struct InstallArgs {
    /// Install globally (~/.claude/) instead of the current project
    #[arg(long, short = 'g')]
    global: bool,

    /// Overwrite existing files and settings
    #[arg(long, short = 'f')]
    force: bool,
}

#[derive(Serialize)]
struct InstallOutput {
    status: &'static str,
    scope: &'static str,
    target: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_version: Option<String>,
    steps: Vec<StepOutput>,
}

pub fn run(args: InstallArgs, output: OutputConfig, templates_dir: Option<PathBuf>) -> Result<()> {
    let installer = build_installer(args.global, templates_dir)?;
    let target = installer.target();
    let report = installer.install(args.force);

    if output.json {
        let json_output = InstallOutput {
            status: if report.has_failures() {
                "failed"
            } else {
                report.action.as_str()
            },
            scope: target.scope().label(),
            target: target.root().display().to_string(),
            version: report.version.clone(),
            previous_version: report.previous_version.clone(),
            steps: step_outputs(&report.steps),
        };
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else if !output.quiet {
        println!(
            "{} BMad Mode Changer install ({})",
            "🎭".bold(),
            target.scope().label().cyan()
        );
        println!("  Target: {}", target.root().display().to_string().dimmed());
        println!();

        match report.action {
            InstallAction::AlreadyCurrent => {
                println!(
                    "{} Version {} is already installed. Use {} to reinstall.",
                    "✓".green(),
                    report.version.cyan(),
                    "--force".cyan()
                );
            }
            InstallAction::Update => {
                println!(
                    "  Updating {} → {}",
                    report.previous_version.as_deref().unwrap_or("?").yellow(),
                    report.version.cyan()
                );
            }
            InstallAction::Reinstall => {
                println!("  Reinstalling {}", report.version.cyan());
            }
            InstallAction::Fresh => {}
        }
        print_steps(&report.steps);

        if !report.has_failures() && report.action != InstallAction::AlreadyCurrent {
            println!();
            println!("{} BMad Mode Changer {} installed", "✨".bold(), report.version.cyan());
            println!();
            println!("Usage:");
            println!("  1. Activate an agent with {}", "/BMad:agents:<name>".cyan());
            println!("  2. Switch modes with {}", "Shift+Tab".cyan());
            println!("  3. The agent is restored on your next message");
        }
    }

    let failed = failed_count(&report.steps);
    if failed > 0 {
        bail!("Install incomplete: {} step(s) failed", failed);
    }
    Ok(())
}
