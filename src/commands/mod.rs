//! Command implementations for the pfe CLI.
//!
//! Each command reads a preference file, optionally mutates the store, and
//! runs the privileged save protocol for anything that changed. Commands
//! return an [`Output`] that renders as JSON (default) or human-readable
//! text; the binary decides which.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::cli::SaveOpts;
use crate::config::Settings;
use crate::models::{PrefKind, PrefValue, PreferenceFile};
use crate::{codec, Error, Result};

/// A command result in both output formats.
#[derive(Debug)]
pub struct Output {
    json: serde_json::Value,
    human: String,
}

impl Output {
    fn new(json: serde_json::Value, human: impl Into<String>) -> Self {
        Self {
            json,
            human: human.into(),
        }
    }

    /// Render for the requested format.
    pub fn render(&self, human: bool) -> String {
        if human {
            self.human.clone()
        } else {
            serde_json::to_string_pretty(&self.json).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// List every entry of a preference file.
pub fn cat(file: &Path) -> Result<Output> {
    let store = load_store(file)?;
    let entries: Vec<serde_json::Value> = store.entries().iter().map(|e| e.to_json()).collect();

    let human = if store.is_empty() {
        "(empty)".to_string()
    } else {
        store
            .entries()
            .iter()
            .map(|e| format!("{} ({}) = {}", e.key, e.value.kind(), e.value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(Output::new(
        serde_json::json!({
            "file": file.display().to_string(),
            "count": store.len(),
            "entries": entries,
        }),
        human,
    ))
}

/// Show one entry.
pub fn get(file: &Path, key: &str) -> Result<Output> {
    let store = load_store(file)?;
    let value = store
        .get(key)
        .ok_or_else(|| Error::NotFound(key.to_string()))?;

    Ok(Output::new(
        serde_json::json!({
            "file": file.display().to_string(),
            "key": key,
            "type": value.kind().as_str(),
            "value": value.to_json(),
        }),
        format!("{} ({}) = {}", key, value.kind(), value),
    ))
}

/// List keys in display order.
pub fn keys(file: &Path) -> Result<Output> {
    let store = load_store(file)?;
    let keys: Vec<&str> = store.entries().iter().map(|e| e.key.as_str()).collect();

    Ok(Output::new(
        serde_json::json!({
            "file": file.display().to_string(),
            "keys": keys,
        }),
        keys.join("\n"),
    ))
}

/// Create, update, or rename an entry and save the file.
pub fn set(
    file: &Path,
    key: &str,
    raw_value: &str,
    kind: PrefKind,
    rename_from: Option<&str>,
    opts: &SaveOpts,
    settings: &Settings,
) -> Result<Output> {
    if key.is_empty() {
        return Err(Error::InvalidInput("key must not be empty".to_string()));
    }
    let value = PrefValue::parse(kind, raw_value)?;

    let previous = read_payload_or_empty(file)?;
    let mut store = PreferenceFile::from_xml(&previous);
    store.add(rename_from, key, value.clone(), rename_from.is_some());

    persist_edit(file, &store, &previous, opts, settings)?;

    let mut json = serde_json::json!({
        "file": file.display().to_string(),
        "saved": true,
        "key": key,
        "type": kind.as_str(),
        "value": value.to_json(),
    });
    if let Some(old) = rename_from {
        json["renamed_from"] = serde_json::Value::from(old);
    }
    let human = match rename_from {
        Some(old) if old != key => {
            format!("Renamed {} -> {} ({}) = {}", old, key, kind, value)
        }
        _ => format!("Set {} ({}) = {}", key, kind, value),
    };
    Ok(Output::new(json, human))
}

/// Remove an entry and save the file.
pub fn rm(file: &Path, key: &str, opts: &SaveOpts, settings: &Settings) -> Result<Output> {
    let previous = read_payload_or_empty(file)?;
    let mut store = PreferenceFile::from_xml(&previous);
    let existed = store.contains_key(key);
    store.remove_value(key);

    persist_edit(file, &store, &previous, opts, settings)?;

    let human = if existed {
        format!("Removed {}", key)
    } else {
        format!("{} was not present", key)
    };
    Ok(Output::new(
        serde_json::json!({
            "file": file.display().to_string(),
            "saved": true,
            "removed": key,
            "existed": existed,
        }),
        human,
    ))
}

/// Validate a raw payload and save it onto the target file.
pub fn save(
    file: &Path,
    from: Option<&Path>,
    opts: &SaveOpts,
    settings: &Settings,
) -> Result<Output> {
    let payload = match from {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let previous = read_payload_or_empty(file)?;
    write_backup_if_wanted(file, &previous, opts, settings)?;
    persist(&payload, file, resolve_consumer(file, opts, settings).as_deref())?;

    Ok(Output::new(
        serde_json::json!({
            "file": file.display().to_string(),
            "saved": true,
            "bytes": payload.len(),
        }),
        format!("Saved {} ({} bytes)", file.display(), payload.len()),
    ))
}

/// Strict decode of a preference file, reporting the entry count.
pub fn validate(file: &Path) -> Result<Output> {
    let payload = std::fs::read_to_string(file)?;
    let map = codec::decode(&payload)?;

    Ok(Output::new(
        serde_json::json!({
            "file": file.display().to_string(),
            "valid": true,
            "entries": map.len(),
        }),
        format!("{} is valid ({} entries)", file.display(), map.len()),
    ))
}

/// Load a store from a file the editor way: unreadable content decodes to
/// an empty store, but the file itself must exist and be readable.
fn load_store(file: &Path) -> Result<PreferenceFile> {
    let payload = std::fs::read_to_string(file)?;
    Ok(PreferenceFile::from_xml(&payload))
}

/// Current content of the target, or "" if it does not exist yet.
fn read_payload_or_empty(file: &Path) -> Result<String> {
    match std::fs::read_to_string(file) {
        Ok(payload) => Ok(payload),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Backup, consumer resolution, and the save protocol for an edited store.
fn persist_edit(
    file: &Path,
    store: &PreferenceFile,
    previous: &str,
    opts: &SaveOpts,
    settings: &Settings,
) -> Result<()> {
    write_backup_if_wanted(file, previous, opts, settings)?;
    persist(
        &store.to_xml(),
        file,
        resolve_consumer(file, opts, settings).as_deref(),
    )
}

/// Which process to terminate after the save, if any.
///
/// Flag beats config: --no-kill suppresses everything, --kill names the
/// process explicitly. Otherwise, with kill-on-save enabled, the owner is
/// inferred from a `.../<owner>/shared_prefs/<file>` path.
fn resolve_consumer(file: &Path, opts: &SaveOpts, settings: &Settings) -> Option<String> {
    if opts.no_kill {
        return None;
    }
    if let Some(process) = &opts.kill {
        return Some(process.clone());
    }
    if settings.kill_on_save {
        infer_consumer(file)
    } else {
        None
    }
}

/// Owner of a preference file laid out as `.../<owner>/shared_prefs/x.xml`.
fn infer_consumer(file: &Path) -> Option<String> {
    let parent = file.parent()?;
    if parent.file_name()? != "shared_prefs" {
        return None;
    }
    parent
        .parent()?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// `<file>.bak` next to the target.
fn backup_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn write_backup_if_wanted(
    file: &Path,
    previous: &str,
    opts: &SaveOpts,
    settings: &Settings,
) -> Result<()> {
    if (opts.backup || settings.backup_on_save) && !previous.is_empty() {
        let path = backup_path(file);
        std::fs::write(&path, previous)?;
        log::debug!("backed up previous content to {}", path.display());
    }
    Ok(())
}

#[cfg(unix)]
fn persist(payload: &str, file: &Path, consumer: Option<&str>) -> Result<()> {
    let service = crate::privileged::NativeFiles::new();
    if crate::privileged::save_payload(&service, payload, file, consumer) {
        Ok(())
    } else {
        Err(Error::SaveFailed(file.to_path_buf()))
    }
}

#[cfg(not(unix))]
fn persist(_payload: &str, _file: &Path, _consumer: Option<&str>) -> Result<()> {
    Err(Error::InvalidInput(
        "the privileged save protocol is only supported on Unix".to_string(),
    ))
}
