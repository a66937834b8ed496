// Storage state: the origin-scoped cookie / local-storage snapshot that the
// authentication setup writes and browser sessions consume at creation.
//
// The JSON layout uses camelCase field names so the file matches what
// browser tooling exchanges for session state.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The whole snapshot: cookies plus per-origin local storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub origins: Vec<OriginState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Unix seconds; `-1.0` marks a session cookie.
    pub expires: f64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: String,
}

/// Local-storage entries belonging to one origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    pub local_storage: Vec<LocalStorageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStorageEntry {
    pub name: String,
    pub value: String,
}

impl StorageState {
    /// Snapshot holding a single local-storage entry for one origin.
    ///
    /// This is the shape the authentication setup produces: the session
    /// token keyed under the name the app reads it back from.
    pub fn single_origin(
        origin: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            cookies: Vec::new(),
            origins: vec![OriginState {
                origin: origin.into(),
                local_storage: vec![LocalStorageEntry {
                    name: name.into(),
                    value: value.into(),
                }],
            }],
        }
    }

    /// Reads a snapshot previously written with [`StorageState::to_file`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes the snapshot as pretty JSON, creating parent directories.
    ///
    /// Overwrites whatever was there; the setup step re-runs this on every
    /// invocation.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Looks up a stored local-storage value for an origin.
    pub fn local_storage_value(&self, origin: &str, name: &str) -> Option<&str> {
        self.origins
            .iter()
            .find(|o| o.origin == origin)
            .and_then(|o| o.local_storage.iter().find(|e| e.name == name))
            .map(|e| e.value.as_str())
    }

    /// JS injected into every new document of a session created from this
    /// snapshot. Entries are applied only when the document's origin matches,
    /// before any page script runs.
    pub(crate) fn seed_script(&self) -> String {
        let mut by_origin: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        for origin in &self.origins {
            let entries = by_origin.entry(origin.origin.as_str()).or_default();
            for entry in &origin.local_storage {
                entries.push((entry.name.as_str(), entry.value.as_str()));
            }
        }
        // Serialization failure is impossible for a string map; fall back to
        // an empty seed rather than panicking inside the browser hook.
        let seeds = serde_json::to_string(&by_origin).unwrap_or_else(|_| "{}".into());
        format!(
            "(() => {{\n  const seeds = {seeds};\n  const entries = seeds[location.origin];\n  if (!entries) return;\n  for (const [name, value] of entries) {{\n    try {{ localStorage.setItem(name, value); }} catch (_) {{}}\n  }}\n}})();"
        )
    }
}
