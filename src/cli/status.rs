use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::{build_installer, OutputConfig};
use crate::document;
use crate::error::InstallError;
use crate::installer::InstallState;
use crate::settings;
use crate::state::{self, AgentContext};
use crate::target::HOOK_EVENT;

#[derive(Args)]
pub struct StatusArgs {
    /// Check the global installation (~/.claude/) instead of the current project
    #[arg(long, short = 'g')]
    global: bool,
}

#[derive(Serialize)]
struct StatusOutput {
    scope: &'static str,
    target: String,
    hook_script_installed: bool,
    settings_configured: bool,
    document_section: bool,
    installed_version: Option<String>,
    installed_at: Option<String>,
    running_version: String,
    update_available: bool,
    context: ContextOutput,
}

#[derive(Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum ContextOutput {
    Missing,
    Invalid,
    Saved {
        active_agent: String,
        saved_at: String,
        command: String,
    },
}

impl From<Result<AgentContext, InstallError>> for ContextOutput {
    fn from(result: Result<AgentContext, InstallError>) -> Self {
        match result {
            Ok(ctx) => Self::Saved {
                active_agent: ctx.active_agent,
                saved_at: ctx.saved_at,
                command: ctx.command,
            },
            Err(InstallError::NotFound { .. }) => Self::Missing,
            Err(e) => {
                tracing::debug!("{}", e);
                Self::Invalid
            }
        }
    }
}

pub fn run(args: StatusArgs, output: OutputConfig) -> Result<()> {
    let installer = build_installer(args.global, None)?;
    let target = installer.target();

    let hook_script_installed = target.hook_script_path().exists();
    let settings_configured = settings::read_settings(&target.settings_path())
        .map(|s| settings::has_managed_hook(&s, HOOK_EVENT))
        .unwrap_or(false);
    let document_section = std::fs::read_to_string(target.document_path())
        .map(|text| document::has_section(&text))
        .unwrap_or(false);

    let install_state = installer.state();
    let update_available = matches!(install_state, InstallState::UpdateAvailable(_));
    let (installed_version, installed_at) = match &install_state {
        InstallState::NoPriorInstall => (None, None),
        InstallState::UpToDate(r) | InstallState::UpdateAvailable(r) => {
            (Some(r.version.clone()), Some(r.installed_at.clone()))
        }
    };
    let context =
        ContextOutput::from(state::read_record::<AgentContext>(&target.context_path()));

    if output.json {
        let status = StatusOutput {
            scope: target.scope().label(),
            target: target.root().display().to_string(),
            hook_script_installed,
            settings_configured,
            document_section,
            installed_version,
            installed_at,
            running_version: installer.version().to_string(),
            update_available,
            context,
        };
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    if output.quiet {
        return Ok(());
    }

    let yes_no = |ok: bool, yes: &str, no: &str| {
        if ok {
            format!("✓ {yes}").green()
        } else {
            format!("✗ {no}").yellow()
        }
    };

    println!(
        "{} BMad Mode Changer status ({})",
        "📊".bold(),
        target.scope().label().cyan()
    );
    println!();
    println!("  Target:           {}", target.root().display().to_string().dimmed());
    println!("  Hook script:      {}", yes_no(hook_script_installed, "installed", "missing"));
    println!("  Settings hook:    {}", yes_no(settings_configured, "configured", "missing"));
    println!("  CLAUDE.md rules:  {}", yes_no(document_section, "present", "missing"));
    match (&installed_version, &installed_at) {
        (Some(version), Some(at)) => {
            println!("  Version:          {} (installed {})", version.cyan(), at.dimmed());
        }
        _ => println!("  Version:          {}", "not installed".dimmed()),
    }
    if update_available {
        println!(
            "  Update available: {} → run {}",
            installer.version().cyan(),
            "bmad-mode-changer install".cyan()
        );
    }

    println!();
    match &context {
        ContextOutput::Saved {
            active_agent,
            saved_at,
            ..
        } => {
            println!("  Saved agent:      {}", active_agent.cyan());
            println!("  Saved at:         {}", saved_at.dimmed());
        }
        ContextOutput::Missing => println!("  Context file:     {}", "not created yet".dimmed()),
        ContextOutput::Invalid => println!("  Context file:     {}", "⚠ parse error".yellow()),
    }

    Ok(())
}
