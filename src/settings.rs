//! Managed hook registration inside Claude Code's settings JSON.
//!
//! The settings file is shared with other tools. Only hook groups whose
//! command contains [`HOOK_MARKER`] belong to us; every other key and entry
//! is carried through untouched and in its original order.

use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::InstallError;
use crate::target::HOOK_MARKER;

/// What `upsert_hook` did to the settings object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookUpsert {
    /// No managed entry existed, one was appended
    Added,
    /// A managed entry existed and was replaced
    Replaced,
    /// A managed entry existed and `force` was off
    SkippedExisting,
}

/// Build the hook group registered for `command`.
pub fn managed_registration(command: &str) -> Value {
    json!({
        "hooks": [
            {
                "type": "command",
                "command": command
            }
        ]
    })
}

/// Check if a hook group entry contains our command.
pub fn is_managed_group(group: &Value) -> bool {
    group
        .get("hooks")
        .and_then(Value::as_array)
        .is_some_and(|hooks| {
            hooks.iter().any(|h| {
                h.get("command")
                    .and_then(Value::as_str)
                    .is_some_and(|c| c.contains(HOOK_MARKER))
            })
        })
}

/// Check whether `settings.hooks.<event>` holds a managed entry.
pub fn has_managed_hook(settings: &Value, event: &str) -> bool {
    settings
        .get("hooks")
        .and_then(|h| h.get(event))
        .and_then(Value::as_array)
        .is_some_and(|arr| arr.iter().any(is_managed_group))
}

/// Insert `registration` under `settings.hooks.<event>`.
///
/// An existing managed entry is left alone unless `force` is set, in which
/// case it is dropped and the new one appended after all foreign entries.
pub fn upsert_hook(settings: &mut Value, event: &str, registration: Value, force: bool) -> HookUpsert {
    let existed = has_managed_hook(settings, event);
    if existed && !force {
        return HookUpsert::SkippedExisting;
    }

    let root = ensure_object(settings);
    let hooks = ensure_object(root.entry("hooks").or_insert_with(|| json!({})));
    let entries = hooks.entry(event).or_insert_with(|| json!([]));
    if !entries.is_array() {
        // Event key exists but isn't an array; replace it
        *entries = json!([]);
    }
    if let Some(arr) = entries.as_array_mut() {
        arr.retain(|entry| !is_managed_group(entry));
        arr.push(registration);
    }

    if existed {
        HookUpsert::Replaced
    } else {
        HookUpsert::Added
    }
}

/// Remove managed entries from `settings.hooks.<event>`.
///
/// Drops the event key when it ends up empty, and the `hooks` key when that
/// ends up empty. Returns true if anything was removed.
pub fn remove_hook(settings: &mut Value, event: &str) -> bool {
    let Some(root) = settings.as_object_mut() else {
        return false;
    };
    let Some(hooks) = root.get_mut("hooks").and_then(Value::as_object_mut) else {
        return false;
    };

    let mut removed = false;
    if let Some(arr) = hooks.get_mut(event).and_then(Value::as_array_mut) {
        let before = arr.len();
        arr.retain(|entry| !is_managed_group(entry));
        removed = arr.len() < before;
        if arr.is_empty() {
            hooks.remove(event);
        }
    }

    if hooks.is_empty() {
        root.remove("hooks");
    }
    removed
}

/// Read a settings file, returning an empty object if missing or blank.
pub fn read_settings(path: &Path) -> Result<Value, InstallError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(json!({})),
        Err(e) => return Err(InstallError::read(path, e)),
    };
    if content.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(&content).map_err(|source| InstallError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read settings for modification. Corrupt content degrades to an empty
/// object so the install can proceed.
pub fn read_settings_lenient(path: &Path) -> Result<Value, InstallError> {
    match read_settings(path) {
        Err(e @ InstallError::Parse { .. }) => {
            tracing::warn!("{}; starting from empty settings", e);
            Ok(json!({}))
        }
        other => other,
    }
}

/// Write settings, creating parent directories as needed.
pub fn write_settings(path: &Path, settings: &Value) -> Result<(), InstallError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| InstallError::write(parent, e))?;
    }
    let mut content = serde_json::to_string_pretty(settings).map_err(|source| {
        InstallError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    content.push('\n');
    std::fs::write(path, content).map_err(|e| InstallError::write(path, e))
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = json!({});
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENT: &str = "UserPromptSubmit";
    const COMMAND: &str = "sh .claude/hooks/agent-state-manager.sh";

    fn upsert(settings: &mut Value, force: bool) -> HookUpsert {
        upsert_hook(settings, EVENT, managed_registration(COMMAND), force)
    }

    fn commands(settings: &Value, event: &str) -> Vec<String> {
        settings["hooks"][event]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["hooks"][0]["command"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_upsert_into_empty_settings() {
        let mut settings = json!({});
        assert_eq!(upsert(&mut settings, false), HookUpsert::Added);

        let ups = settings["hooks"][EVENT].as_array().unwrap();
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0]["hooks"][0]["type"], "command");
        assert_eq!(ups[0]["hooks"][0]["command"], COMMAND);
    }

    #[test]
    fn test_upsert_idempotent_without_force() {
        let mut once = json!({});
        upsert(&mut once, false);
        let mut twice = once.clone();
        assert_eq!(upsert(&mut twice, false), HookUpsert::SkippedExisting);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_upsert_force_replaces_and_moves_last() {
        let mut settings = json!({
            "hooks": {
                "UserPromptSubmit": [
                    { "hooks": [{ "type": "command", "command": "node .claude/hooks/agent-state-manager.js" }] },
                    { "hooks": [{ "type": "command", "command": "other-tool inject" }] }
                ]
            }
        });

        assert_eq!(upsert(&mut settings, true), HookUpsert::Replaced);
        assert_eq!(
            commands(&settings, EVENT),
            vec!["other-tool inject".to_string(), COMMAND.to_string()]
        );
    }

    #[test]
    fn test_upsert_preserves_foreign_entries_in_order() {
        let mut settings = json!({
            "hooks": {
                "UserPromptSubmit": [
                    { "hooks": [{ "type": "command", "command": "gt mail check --inject" }], "matcher": "" },
                    { "hooks": [{ "type": "command", "command": "other-tool inject", "timeout": 5 }] }
                ],
                "Stop": [
                    { "hooks": [{ "type": "command", "command": "gt costs record" }] }
                ]
            },
            "statusLine": { "type": "command", "command": "bash ~/.claude/statusline-command.sh" }
        });
        let before = settings.clone();

        upsert(&mut settings, false);

        let ups = settings["hooks"][EVENT].as_array().unwrap();
        assert_eq!(ups.len(), 3);
        assert_eq!(ups[0], before["hooks"][EVENT][0]);
        assert_eq!(ups[1], before["hooks"][EVENT][1]);
        assert_eq!(settings["hooks"]["Stop"], before["hooks"]["Stop"]);
        assert_eq!(settings["statusLine"], before["statusLine"]);
    }

    #[test]
    fn test_upsert_replaces_non_array_event() {
        let mut settings = json!({ "hooks": { "UserPromptSubmit": "bogus" } });
        upsert(&mut settings, false);
        assert_eq!(commands(&settings, EVENT), vec![COMMAND.to_string()]);
    }

    #[test]
    fn test_upsert_replaces_non_object_root() {
        let mut settings = json!([1, 2, 3]);
        upsert(&mut settings, false);
        assert_eq!(commands(&settings, EVENT), vec![COMMAND.to_string()]);
    }

    #[test]
    fn test_upsert_then_remove_restores_document() {
        let original = json!({
            "model": "opus",
            "hooks": {
                "UserPromptSubmit": [
                    { "hooks": [{ "type": "command", "command": "other-tool inject" }] }
                ],
                "PreToolUse": [
                    { "matcher": "Bash", "hooks": [{ "type": "command", "command": "guard" }] }
                ]
            }
        });
        let mut settings = original.clone();
        upsert(&mut settings, false);
        assert!(remove_hook(&mut settings, EVENT));
        assert_eq!(settings, original);

        let mut empty = json!({ "theme": "dark" });
        upsert(&mut empty, false);
        remove_hook(&mut empty, EVENT);
        assert_eq!(empty, json!({ "theme": "dark" }));
    }

    #[test]
    fn test_remove_leaves_others() {
        let mut settings = json!({
            "hooks": {
                "UserPromptSubmit": [
                    { "hooks": [{ "type": "command", "command": "other-tool inject" }] },
                    { "hooks": [{ "type": "command", "command": COMMAND }] }
                ],
                "Stop": [
                    { "hooks": [{ "type": "command", "command": "gt costs record" }] }
                ]
            }
        });

        assert!(remove_hook(&mut settings, EVENT));
        assert_eq!(commands(&settings, EVENT), vec!["other-tool inject".to_string()]);
        assert_eq!(commands(&settings, "Stop"), vec!["gt costs record".to_string()]);
    }

    #[test]
    fn test_remove_cleans_empty_hooks_object() {
        let mut settings = json!({
            "hooks": {
                "UserPromptSubmit": [
                    { "hooks": [{ "type": "command", "command": COMMAND }] }
                ]
            },
            "other": true
        });

        assert!(remove_hook(&mut settings, EVENT));
        assert!(settings.get("hooks").is_none());
        assert_eq!(settings["other"], true);
    }

    #[test]
    fn test_remove_none_present() {
        let mut settings = json!({
            "hooks": {
                "UserPromptSubmit": [
                    { "hooks": [{ "type": "command", "command": "other-tool inject" }] }
                ]
            }
        });
        let before = settings.clone();
        assert!(!remove_hook(&mut settings, EVENT));
        assert_eq!(settings, before);
    }

    #[test]
    fn test_remove_on_non_object() {
        let mut settings = json!("text");
        assert!(!remove_hook(&mut settings, EVENT));
        assert_eq!(settings, json!("text"));
    }

    #[test]
    fn test_is_managed_group() {
        assert!(is_managed_group(&managed_registration(COMMAND)));
        assert!(is_managed_group(&json!({
            "hooks": [{ "type": "command", "command": "node .claude/hooks/agent-state-manager.js" }]
        })));
        assert!(!is_managed_group(&json!({
            "hooks": [{ "type": "command", "command": "other-tool do-thing" }]
        })));
        assert!(!is_managed_group(&json!({ "matcher": "Bash" })));
    }

    #[test]
    fn test_has_managed_hook() {
        let mut settings = json!({});
        assert!(!has_managed_hook(&settings, EVENT));
        upsert(&mut settings, false);
        assert!(has_managed_hook(&settings, EVENT));
        assert!(!has_managed_hook(&settings, "Stop"));
    }

    #[test]
    fn test_read_settings_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = read_settings(&tmp.path().join("nonexistent.json")).unwrap();
        assert_eq!(settings, json!({}));
    }

    #[test]
    fn test_read_settings_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.json");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(read_settings(&path).unwrap(), json!({}));
    }

    #[test]
    fn test_read_settings_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "{ \"hooks\": ").unwrap();
        assert!(matches!(
            read_settings(&path),
            Err(InstallError::Parse { .. })
        ));
        assert_eq!(read_settings_lenient(&path).unwrap(), json!({}));
    }

    #[test]
    fn test_write_settings_creates_dirs_and_keeps_key_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("deep").join("settings.json");
        let settings: Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "hooks": {}}"#).unwrap();
        write_settings(&path, &settings).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let zeta = content.find("zeta").unwrap();
        let alpha = content.find("alpha").unwrap();
        assert!(zeta < alpha, "key order should survive a rewrite");
        assert!(content.ends_with('\n'));
    }
}
