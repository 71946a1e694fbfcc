//! Configs panel: save, load, export and import hub configuration files.
//!
//! Every operation is a REST call. Loading or importing replaces the hub's
//! running configuration, so both finish by asking the live channel for a
//! fresh sensor snapshot and both parameter configs.

#[cfg(test)]
#[path = "configs_test.rs"]
mod configs_test;

use serde_json::Value;
use store::{NoticeLevel, Panel, Store};
use wire::rest::{ConfigFile, ConfigName, resolve_config_choice};

use crate::net::api::{Api, ApiError};
use crate::net::transport::Transport;
use crate::util::clock::now_ms;
use crate::util::notice;

/// Name used by the panel's quick-save button.
pub const DEFAULT_CONFIG_NAME: &str = "default";

/// Sections at least one of which a hub config file carries.
const EXPECTED_SECTIONS: [&str; 3] = ["sensors", "world_mask", "filter_config"];

fn fail(store: &Store, what: &str, err: &ApiError) {
    log::warn!("{what} failed: {err}");
    notice::report_failure(store, Panel::Configs, format!("{what} failed: {err}"), now_ms());
}

fn succeed(store: &Store, text: impl Into<String>) {
    let text = text.into();
    notice::panel_message(store, Panel::Configs, text.clone(), false, now_ms());
    notice::notify(store, NoticeLevel::Success, text, now_ms());
}

/// Ask the hub for everything a config swap can change.
pub fn refresh(transport: &Transport) -> bool {
    let sent = transport.request_snapshot() & transport.request_filter_config() & transport.request_dbscan_config();
    if !sent {
        log::warn!("config refresh requested while the live channel is down");
    }
    sent
}

/// Saved files on the hub, or empty on failure. Transient failures are
/// retried.
pub async fn list(api: &Api, store: &Store) -> Vec<ConfigFile> {
    match api.retrying(move || api.list_configs()).await {
        Ok(files) => {
            if files.is_empty() {
                notice::notify(store, NoticeLevel::Warning, "No configuration files found", now_ms());
            }
            files
        }
        Err(err) => {
            fail(store, "List", &err);
            Vec::new()
        }
    }
}

/// Save under `name`; blank means [`DEFAULT_CONFIG_NAME`]. Returns the name
/// the hub stored it under.
pub async fn save(api: &Api, store: &Store, name: &str) -> Option<String> {
    let requested = ConfigName::normalized(name).name;
    match api.save_config(&requested).await {
        Ok(reply) => {
            let saved = reply.get("name").and_then(Value::as_str).map_or(requested, str::to_owned);
            succeed(store, format!("Configuration saved as {saved}"));
            Some(saved)
        }
        Err(err) => {
            fail(store, "Save", &err);
            None
        }
    }
}

/// Save a timestamped copy of the running configuration.
pub async fn backup(api: &Api, store: &Store, now_ms: f64) -> Option<String> {
    save(api, store, &backup_name(now_ms)).await
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn backup_name(now_ms: f64) -> String {
    format!("backup_{}", now_ms.max(0.0) as u64)
}

/// Load a file by name, then refresh.
pub async fn load(api: &Api, transport: &Transport, name: &str) -> bool {
    let store = transport.store();
    match api.load_config(name).await {
        Ok(_) => {
            succeed(store, format!("Configuration loaded: {}", ConfigName::normalized(name).name));
            refresh(transport);
            true
        }
        Err(err) => {
            fail(store, "Load", &err);
            false
        }
    }
}

/// Load the file the user picked from `files` by 1-based number or name.
pub async fn load_choice(api: &Api, transport: &Transport, files: &[ConfigFile], choice: &str) -> bool {
    let Some(file) = resolve_config_choice(files, choice) else {
        notice::report_failure(
            transport.store(),
            Panel::Configs,
            format!("Configuration \"{}\" not found", choice.trim()),
            now_ms(),
        );
        return false;
    };
    load(api, transport, &file.name).await
}

/// Running configuration as YAML text.
pub async fn export(api: &Api, store: &Store) -> Option<String> {
    match api.export_config().await {
        Ok(yaml) => {
            succeed(store, "Configuration exported");
            Some(yaml)
        }
        Err(err) => {
            fail(store, "Export", &err);
            None
        }
    }
}

/// Cheap shape check before uploading. Returns the problems found.
#[must_use]
pub fn validate_yaml(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![String::from("Configuration content cannot be empty")];
    }
    let mut errors = Vec::new();
    let json_ok = trimmed.starts_with('{') && serde_json::from_str::<Value>(trimmed).is_ok();
    if !json_ok && !trimmed.contains(':') {
        errors.push(String::from("Configuration does not appear to be valid YAML format"));
    }
    let has_section = EXPECTED_SECTIONS
        .iter()
        .any(|section| trimmed.contains(section) || trimmed.contains(&section.replace('_', "-")));
    if !has_section {
        errors.push(String::from(
            "Configuration does not contain expected sections (sensors, world_mask, filter_config)",
        ));
    }
    errors
}

/// Upload YAML text read from `source`, then refresh.
pub async fn import(api: &Api, transport: &Transport, yaml: &str, source: &str) -> bool {
    let store = transport.store();
    if let Some(first) = validate_yaml(yaml).into_iter().next() {
        notice::report_failure(store, Panel::Configs, format!("Import failed: {first}"), now_ms());
        return false;
    }
    match api.import_config(yaml).await {
        Ok(_) => {
            succeed(store, format!("Configuration imported from {source}"));
            refresh(transport);
            true
        }
        Err(err) => {
            fail(store, "Import", &err);
            false
        }
    }
}
