//! Save-game persistence of a whole line network.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::context::{LineSettings, WorldContext};
use crate::convoy::Convoy;
use crate::handle::RawHandle;
use crate::persist::{JsonArchive, LoadReport};
use crate::registry::Registry;

/// Version written into every save; older readers refuse newer files.
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// Metadata describing a persisted network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEntry {
    /// Absolute path to the save file on disk.
    pub path: PathBuf,
    /// Human readable save name.
    pub name: String,
    /// Simulation month at the time of saving.
    pub current_month: u32,
    /// Timestamp when the save was written.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConvoyRecord {
    id: u64,
    convoy: Convoy,
}

/// Serialized representation of a save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePayload {
    version: u32,
    name: String,
    saved_at: DateTime<Utc>,
    current_month: u32,
    #[serde(default)]
    convoys: Vec<ConvoyRecord>,
    #[serde(default)]
    lines: Vec<Value>,
}

impl SavePayload {
    fn capture(name: Option<&str>, registry: &Registry, ctx: &WorldContext) -> Self {
        let display_name = name
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
            .unwrap_or_else(|| format!("Month {}", ctx.current_month));

        let convoys = registry
            .convoys()
            .map(|(handle, convoy)| ConvoyRecord {
                id: handle.to_raw(),
                convoy: convoy.clone(),
            })
            .collect();
        let mut archive = JsonArchive::new();
        registry.write_lines(&mut archive);

        Self {
            version: SAVE_FORMAT_VERSION,
            name: display_name,
            saved_at: Utc::now(),
            current_month: ctx.current_month,
            convoys,
            lines: archive.into_values(),
        }
    }

    /// Human readable save name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulation month stored in the save.
    pub fn current_month(&self) -> u32 {
        self.current_month
    }

    /// Number of convoys stored in the save.
    pub fn convoy_count(&self) -> usize {
        self.convoys.len()
    }

    /// Rebuild the registry and world context from this payload.
    pub fn restore(self, settings: LineSettings) -> Result<LoadedNetwork> {
        if self.version > SAVE_FORMAT_VERSION {
            bail!(
                "save format version {} is newer than supported version {}",
                self.version,
                SAVE_FORMAT_VERSION
            );
        }
        let ctx = WorldContext::new(self.current_month, settings);
        let convoys = self
            .convoys
            .into_iter()
            .map(|record| (record.id, record.convoy))
            .collect();
        let mut archive = JsonArchive::from_values(self.lines);
        let (registry, report) =
            Registry::restore(convoys, &mut archive, &ctx).context("failed to restore lines")?;
        if !archive.is_exhausted() {
            warn!("save contains trailing line data");
        }
        Ok(LoadedNetwork {
            registry,
            ctx,
            report,
        })
    }
}

/// Result of loading a save.
#[derive(Debug)]
pub struct LoadedNetwork {
    /// Restored lines and convoys.
    pub registry: Registry,
    /// World context at the saved month.
    pub ctx: WorldContext,
    /// Repairs made while restoring.
    pub report: LoadReport,
}

/// Manager responsible for loading and writing save files.
pub struct SaveManager {
    root: PathBuf,
}

impl SaveManager {
    /// Create a new manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory save files are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save the network to a new file and return the resulting entry.
    pub fn create_save(
        &self,
        name: Option<&str>,
        registry: &Registry,
        ctx: &WorldContext,
    ) -> Result<SaveEntry> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let payload = SavePayload::capture(name, registry, ctx);
        let file_name = format!(
            "{}_{}.json",
            sanitize_component(&payload.name),
            payload.saved_at.format("%Y%m%d%H%M%S%3f")
        );
        let path = self.root.join(file_name);
        self.write_payload(&path, &payload)?;
        info!(
            path = %path.display(),
            lines = registry.line_count(),
            convoys = registry.convoy_count(),
            "network saved"
        );

        Ok(SaveEntry {
            path,
            name: payload.name,
            current_month: payload.current_month,
            updated_at: payload.saved_at,
        })
    }

    /// Overwrite an existing save with the current network.
    pub fn update_save(
        &self,
        entry: &SaveEntry,
        registry: &Registry,
        ctx: &WorldContext,
    ) -> Result<SaveEntry> {
        let payload = SavePayload::capture(Some(&entry.name), registry, ctx);
        self.write_payload(&entry.path, &payload)?;
        Ok(SaveEntry {
            path: entry.path.clone(),
            name: payload.name,
            current_month: payload.current_month,
            updated_at: payload.saved_at,
        })
    }

    /// Read the raw payload of a save.
    pub fn read(&self, entry: &SaveEntry) -> Result<SavePayload> {
        self.read_payload(&entry.path)
    }

    /// Load and restore the network stored in a save.
    pub fn load(&self, entry: &SaveEntry, settings: LineSettings) -> Result<LoadedNetwork> {
        let loaded = self
            .read_payload(&entry.path)?
            .restore(settings)
            .with_context(|| format!("failed to load {}", entry.path.display()))?;
        for (line, convoy) in &loaded.report.dropped_convoys {
            warn!(?line, convoy, "stale convoy dropped while loading");
        }
        Ok(loaded)
    }

    fn write_payload(&self, path: &Path, payload: &SavePayload) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised = serde_json::to_vec_pretty(payload)?;
        fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
    }

    fn read_payload(&self, path: impl AsRef<Path>) -> Result<SavePayload> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(payload)
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "save".to_string()
    } else {
        result
    }
}
