use std::path::{Path, PathBuf};

use crate::error::InstallError;

pub const HOOK_SCRIPT_TEMPLATE: &str = "agent-state-manager.sh";
pub const DOCUMENT_TEMPLATE: &str = "claude-md-rules.md";

const BIN_PLACEHOLDER: &str = "{{BIN}}";

const EMBEDDED: &[(&str, &str)] = &[
    (
        HOOK_SCRIPT_TEMPLATE,
        include_str!("../templates/agent-state-manager.sh"),
    ),
    (
        DOCUMENT_TEMPLATE,
        include_str!("../templates/claude-md-rules.md"),
    ),
];

/// Source of template blobs: built into the binary, or a directory on disk.
#[derive(Debug, Clone)]
pub struct Templates {
    dir: Option<PathBuf>,
}

impl Templates {
    /// `None` selects the templates built into the binary.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Fetch a template by file name.
    pub fn get(&self, name: &str) -> Result<String, InstallError> {
        match &self.dir {
            Some(dir) => read_template(dir, name),
            None => EMBEDDED
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, body)| (*body).to_string())
                .ok_or_else(|| InstallError::TemplateMissing {
                    name: name.to_string(),
                }),
        }
    }

    /// Hook script with the binary path filled in as a single-quoted
    /// shell word.
    pub fn hook_script(&self, bin: &Path) -> Result<String, InstallError> {
        let body = self.get(HOOK_SCRIPT_TEMPLATE)?;
        Ok(body.replace(BIN_PLACEHOLDER, &shell_quote(&bin.display().to_string())))
    }

    pub fn document_section(&self) -> Result<String, InstallError> {
        self.get(DOCUMENT_TEMPLATE)
    }
}

/// Quote `value` for POSIX sh. Nothing expands inside single quotes, so the
/// only character to handle is `'` itself.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn read_template(dir: &Path, name: &str) -> Result<String, InstallError> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(body) => Ok(body),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(InstallError::TemplateMissing {
                name: path.display().to_string(),
            })
        }
        Err(e) => Err(InstallError::read(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{has_section, MANAGED_PHRASE};

    #[test]
    fn test_embedded_templates_present() {
        let templates = Templates::new(None);
        assert!(templates.get(HOOK_SCRIPT_TEMPLATE).is_ok());
        assert!(templates.get(DOCUMENT_TEMPLATE).is_ok());
        assert!(matches!(
            templates.get("nope.txt"),
            Err(InstallError::TemplateMissing { .. })
        ));
    }

    #[test]
    fn test_document_template_is_a_managed_section() {
        let section = Templates::new(None).document_section().unwrap();
        assert!(section.contains(MANAGED_PHRASE));
        assert!(has_section(&section));
    }

    #[test]
    fn test_hook_script_substitutes_binary() {
        let script = Templates::new(None)
            .hook_script(Path::new("/usr/local/bin/bmad-mode-changer"))
            .unwrap();
        assert!(script.starts_with("#!/bin/sh"));
        assert!(script.contains("BIN='/usr/local/bin/bmad-mode-changer'"));
        assert!(!script.contains(BIN_PLACEHOLDER));
        assert!(script.contains("hook --context-file"));
        assert!(script.contains("echo '{}'"));
    }

    #[test]
    fn test_hook_script_quotes_special_characters() {
        let script = Templates::new(None)
            .hook_script(Path::new("/opt/it's $HOME/`id`/\"bin\""))
            .unwrap();
        assert!(script.contains(r#"BIN='/opt/it'\''s $HOME/`id`/"bin"'"#));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/usr/bin/x"), "'/usr/bin/x'");
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_dir_templates_override() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(DOCUMENT_TEMPLATE), "## custom\n").unwrap();

        let templates = Templates::new(Some(tmp.path().to_path_buf()));
        assert_eq!(templates.document_section().unwrap(), "## custom\n");
        let err = templates.hook_script(Path::new("/bin/x")).unwrap_err();
        assert!(matches!(err, InstallError::TemplateMissing { .. }));
        assert!(err.to_string().contains(HOOK_SCRIPT_TEMPLATE));
    }
}
