use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::{build_installer, failed_count, print_steps, step_outputs, OutputConfig, StepOutput};
use crate::installer::Outcome;

#[derive(Args)]
pub struct UninstallArgs {
    /// Uninstall from global settings (~/.claude/) instead of the current project
    #[arg(long, short = 'g')]
    global: bool,
}

#[derive(Serialize)]
struct UninstallOutput {
    status: &'static str,
    scope: &'static str,
    target: String,
    steps: Vec<StepOutput>,
}

pub fn run(args: UninstallArgs, output: OutputConfig) -> Result<()> {
    let installer = build_installer(args.global, None)?;
    let target = installer.target();
    let steps = installer.uninstall();

    let removed_any = steps.iter().any(|s| s.outcome == Outcome::Removed);
    let failed = failed_count(&steps);

    if output.json {
        let status = if failed > 0 {
            "failed"
        } else if removed_any {
            "uninstalled"
        } else {
            "not_installed"
        };
        let json_output = UninstallOutput {
            status,
            scope: target.scope().label(),
            target: target.root().display().to_string(),
            steps: step_outputs(&steps),
        };
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else if !output.quiet {
        println!(
            "{} BMad Mode Changer uninstall ({})",
            "🗑".bold(),
            target.scope().label().cyan()
        );
        println!("  Target: {}", target.root().display().to_string().dimmed());
        println!();
        print_steps(&steps);
        println!();
        if removed_any {
            println!("{} BMad Mode Changer removed", "✓".green());
        } else {
            println!("Nothing to remove ({})", target.root().display());
        }
    }

    if failed > 0 {
        bail!("Uninstall incomplete: {} step(s) failed", failed);
    }
    Ok(())
}
