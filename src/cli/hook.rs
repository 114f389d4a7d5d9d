use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;
use serde::Deserialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::LazyLock;

use super::OutputConfig;
use crate::state::{self, AgentContext};
use crate::target::context_path_in;

static AGENT_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/BMad:agents:([0-9A-Za-z_-]+)").expect("agent command pattern is valid")
});

#[derive(Args)]
pub struct HookArgs {
    /// Context file to write (defaults to ./.claude/.agent-context.json)
    #[arg(long, value_name = "PATH")]
    context_file: Option<PathBuf>,
}

/// Claude Code UserPromptSubmit hook input (subset of fields we need)
#[derive(Deserialize)]
struct HookInput {
    #[serde(default)]
    user_prompt: Option<String>,
    /// Field name used by current Claude Code releases
    #[serde(default)]
    prompt: Option<String>,
}

impl HookInput {
    fn prompt_text(&self) -> &str {
        self.user_prompt
            .as_deref()
            .or(self.prompt.as_deref())
            .unwrap_or("")
    }
}

pub fn run(args: HookArgs, _output: OutputConfig) -> Result<()> {
    // Never block user prompts: errors are swallowed
    let input = std::io::read_to_string(std::io::stdin()).unwrap_or_default();
    if let Err(e) = handle_event(&input, args.context_file) {
        tracing::debug!("bmad-mode-changer hook: {:#}", e);
    }

    // The host expects exactly one JSON object; `{}` leaves the prompt as is
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{{}}");
    let _ = stdout.flush();
    Ok(())
}

/// Parse one hook event and save the agent it activates, if any.
/// Returns the saved agent name.
fn handle_event(input: &str, context_file: Option<PathBuf>) -> Result<Option<String>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let event: HookInput = serde_json::from_str(input).context("Failed to parse stdin JSON")?;

    let Some(agent) = extract_agent(event.prompt_text()) else {
        return Ok(None);
    };

    let path = match context_file {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            context_path_in(&cwd.join(".claude"))
        }
    };
    state::save_agent_context(&path, &AgentContext::now(&agent))?;
    tracing::debug!("saved agent {} to {}", agent, path.display());
    Ok(Some(agent))
}

/// Agent identifier from the first `/BMad:agents:<id>` in the prompt.
fn extract_agent(prompt: &str) -> Option<String> {
    AGENT_COMMAND
        .captures(prompt)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
