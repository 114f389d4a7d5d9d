//! Install and uninstall orchestration.
//!
//! `install` compares the recorded version against the running one and then
//! drives the hook script, settings and CLAUDE.md steps. Every step runs on
//! its own and reports its own outcome; one failing step does not stop the
//! others.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::document::{self, SectionUpsert};
use crate::error::InstallError;
use crate::settings::{self, HookUpsert};
use crate::state::{self, VersionRecord};
use crate::target::{InstallTarget, HOOK_EVENT};
use crate::templates::Templates;
use crate::version::compare_versions;

/// Installation state as seen from the version record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    NoPriorInstall,
    UpToDate(VersionRecord),
    UpdateAvailable(VersionRecord),
}

impl InstallState {
    pub fn detect(record: Option<VersionRecord>, current: &str) -> Self {
        match record {
            None => Self::NoPriorInstall,
            Some(record) => match compare_versions(&record.version, current) {
                Ordering::Less => Self::UpdateAvailable(record),
                _ => Self::UpToDate(record),
            },
        }
    }

    pub fn installed_version(&self) -> Option<&str> {
        match self {
            Self::NoPriorInstall => None,
            Self::UpToDate(r) | Self::UpdateAvailable(r) => Some(&r.version),
        }
    }
}

/// What `install` decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallAction {
    /// Nothing installed yet
    Fresh,
    /// Same (or newer) version installed and no `--force`
    AlreadyCurrent,
    /// Same version installed, `--force` given
    Reinstall,
    /// Older version installed
    Update,
}

impl InstallAction {
    pub fn decide(state: &InstallState, force: bool) -> Self {
        match (state, force) {
            (InstallState::NoPriorInstall, _) => Self::Fresh,
            (InstallState::UpToDate(_), false) => Self::AlreadyCurrent,
            (InstallState::UpToDate(_), true) => Self::Reinstall,
            (InstallState::UpdateAvailable(_), _) => Self::Update,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "installed",
            Self::AlreadyCurrent => "up_to_date",
            Self::Reinstall => "reinstalled",
            Self::Update => "updated",
        }
    }
}

/// Files the installer owns or patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    HookScript,
    Settings,
    Document,
    VersionRecord,
    AgentContext,
}

impl Artifact {
    pub fn label(self) -> &'static str {
        match self {
            Self::HookScript => "hook script",
            Self::Settings => "settings hook",
            Self::Document => "CLAUDE.md section",
            Self::VersionRecord => "version record",
            Self::AgentContext => "agent context",
        }
    }
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Skipped,
    Removed,
    NotFound,
    Failed(String),
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
            Self::Removed => "removed",
            Self::NotFound => "not_found",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<InstallError> for Outcome {
    fn from(err: InstallError) -> Self {
        Self::Failed(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub artifact: Artifact,
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl StepReport {
    fn new(artifact: Artifact, path: PathBuf, result: Result<Outcome, InstallError>) -> Self {
        let outcome = result.unwrap_or_else(|e| {
            tracing::warn!("{} step failed: {}", artifact.label(), e);
            Outcome::from(e)
        });
        tracing::debug!(
            "{}: {} ({})",
            artifact.label(),
            outcome.as_str(),
            path.display()
        );
        Self {
            artifact,
            path,
            outcome,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub action: InstallAction,
    pub previous_version: Option<String>,
    pub version: String,
    pub steps: Vec<StepReport>,
}

impl InstallReport {
    pub fn has_failures(&self) -> bool {
        has_failures(&self.steps)
    }
}

pub fn has_failures(steps: &[StepReport]) -> bool {
    steps.iter().any(|s| s.outcome.is_failure())
}

/// Installs, updates and removes the integration for one target.
pub struct Installer {
    target: InstallTarget,
    templates: Templates,
    /// Version of the running tool, recorded on install
    version: String,
    /// Binary the hook script calls back into
    hook_bin: PathBuf,
}

impl Installer {
    pub fn new(
        target: InstallTarget,
        templates: Templates,
        version: impl Into<String>,
        hook_bin: impl Into<PathBuf>,
    ) -> Self {
        Self {
            target,
            templates,
            version: version.into(),
            hook_bin: hook_bin.into(),
        }
    }

    pub fn target(&self) -> &InstallTarget {
        &self.target
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn state(&self) -> InstallState {
        InstallState::detect(
            state::load_version(&self.target.version_path()),
            &self.version,
        )
    }

    pub fn install(&self, force: bool) -> InstallReport {
        let current = self.state();
        let action = InstallAction::decide(&current, force);
        let previous_version = current.installed_version().map(str::to_string);
        tracing::debug!(
            "install: previous={:?} current={} force={} action={}",
            previous_version,
            self.version,
            force,
            action.as_str()
        );

        let steps = match action {
            InstallAction::AlreadyCurrent => self.skipped_steps(),
            InstallAction::Fresh => self.apply(force),
            InstallAction::Reinstall | InstallAction::Update => self.apply(true),
        };

        InstallReport {
            action,
            previous_version,
            version: self.version.clone(),
            steps,
        }
    }

    fn skipped_steps(&self) -> Vec<StepReport> {
        [
            (Artifact::HookScript, self.target.hook_script_path()),
            (Artifact::Settings, self.target.settings_path()),
            (Artifact::Document, self.target.document_path()),
        ]
        .into_iter()
        .map(|(artifact, path)| StepReport::new(artifact, path, Ok(Outcome::Skipped)))
        .collect()
    }

    fn apply(&self, overwrite: bool) -> Vec<StepReport> {
        let mut steps = vec![
            StepReport::new(
                Artifact::HookScript,
                self.target.hook_script_path(),
                self.write_hook_script(overwrite),
            ),
            StepReport::new(
                Artifact::Settings,
                self.target.settings_path(),
                self.upsert_settings(overwrite),
            ),
            StepReport::new(
                Artifact::Document,
                self.target.document_path(),
                self.upsert_document(overwrite),
            ),
        ];

        // A partial install must not look current on the next run
        let record = if has_failures(&steps) {
            Ok(Outcome::Skipped)
        } else {
            self.write_version()
        };
        steps.push(StepReport::new(
            Artifact::VersionRecord,
            self.target.version_path(),
            record,
        ));
        steps
    }

    fn write_hook_script(&self, overwrite: bool) -> Result<Outcome, InstallError> {
        let path = self.target.hook_script_path();
        let existed = path.exists();
        if existed && !overwrite {
            return Ok(Outcome::Skipped);
        }

        let content = self.templates.hook_script(&self.hook_bin)?;
        write_file(&path, &content)?;
        make_executable(&path)?;

        Ok(if existed {
            Outcome::Updated
        } else {
            Outcome::Created
        })
    }

    fn upsert_settings(&self, overwrite: bool) -> Result<Outcome, InstallError> {
        let path = self.target.settings_path();
        let mut doc = settings::read_settings_lenient(&path)?;
        let registration = settings::managed_registration(&self.target.hook_command());

        match settings::upsert_hook(&mut doc, HOOK_EVENT, registration, overwrite) {
            HookUpsert::SkippedExisting => Ok(Outcome::Skipped),
            HookUpsert::Added => {
                settings::write_settings(&path, &doc)?;
                Ok(Outcome::Created)
            }
            HookUpsert::Replaced => {
                settings::write_settings(&path, &doc)?;
                Ok(Outcome::Updated)
            }
        }
    }

    fn upsert_document(&self, overwrite: bool) -> Result<Outcome, InstallError> {
        let path = self.target.document_path();
        let template = self.templates.document_section()?;
        let text = read_text(&path)?.unwrap_or_default();

        let (updated, action) = document::upsert_section(&text, &template, overwrite);
        let outcome = match action {
            SectionUpsert::SkippedExisting => return Ok(Outcome::Skipped),
            SectionUpsert::Added => Outcome::Created,
            SectionUpsert::Replaced => Outcome::Updated,
        };
        write_file(&path, &updated)?;
        Ok(outcome)
    }

    fn write_version(&self) -> Result<Outcome, InstallError> {
        let path = self.target.version_path();
        let existed = path.exists();
        state::save_version(&path, &VersionRecord::now(&self.version))?;
        Ok(if existed {
            Outcome::Updated
        } else {
            Outcome::Created
        })
    }

    /// Remove every artifact. Missing pieces are reported, never fatal.
    pub fn uninstall(&self) -> Vec<StepReport> {
        vec![
            StepReport::new(
                Artifact::HookScript,
                self.target.hook_script_path(),
                delete_file(&self.target.hook_script_path()),
            ),
            StepReport::new(
                Artifact::AgentContext,
                self.target.context_path(),
                delete_file(&self.target.context_path()),
            ),
            StepReport::new(
                Artifact::VersionRecord,
                self.target.version_path(),
                delete_file(&self.target.version_path()),
            ),
            StepReport::new(
                Artifact::Settings,
                self.target.settings_path(),
                self.remove_settings(),
            ),
            StepReport::new(
                Artifact::Document,
                self.target.document_path(),
                self.remove_document(),
            ),
        ]
    }

    fn remove_settings(&self) -> Result<Outcome, InstallError> {
        let path = self.target.settings_path();
        if !path.exists() {
            return Ok(Outcome::NotFound);
        }
        let mut doc = match settings::read_settings(&path) {
            Ok(doc) => doc,
            Err(e @ InstallError::Parse { .. }) => {
                tracing::warn!("{}; leaving it untouched", e);
                return Ok(Outcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        if settings::remove_hook(&mut doc, HOOK_EVENT) {
            settings::write_settings(&path, &doc)?;
            Ok(Outcome::Removed)
        } else {
            Ok(Outcome::NotFound)
        }
    }

    fn remove_document(&self) -> Result<Outcome, InstallError> {
        let path = self.target.document_path();
        let Some(text) = read_text(&path)? else {
            return Ok(Outcome::NotFound);
        };

        let (updated, removed) = document::remove_section(&text);
        if !removed {
            return Ok(Outcome::NotFound);
        }
        if updated.is_empty() {
            // Nothing but our section was in there
            std::fs::remove_file(&path).map_err(|e| InstallError::write(&path, e))?;
        } else {
            write_file(&path, &updated)?;
        }
        Ok(Outcome::Removed)
    }
}

fn read_text(path: &Path) -> Result<Option<String>, InstallError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(InstallError::read(path, e)),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), InstallError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InstallError::write(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| InstallError::write(path, e))
}

fn delete_file(path: &Path) -> Result<Outcome, InstallError> {
    Ok(if state::remove_record(path)? {
        Outcome::Removed
    } else {
        Outcome::NotFound
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o755);
    std::fs::set_permissions(path, perms).map_err(|e| InstallError::write(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}
