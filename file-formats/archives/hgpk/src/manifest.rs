//! Patch manifest (`patches.json`)
//!
//! The manifest lists the patches shipped with a game, their priorities and
//! whether they are enabled. It lives next to the archives and is read by
//! [`PatchRegistry`](crate::PatchRegistry) at load time.

use crate::patch_type::PatchType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default manifest file name
pub const MANIFEST_FILE_NAME: &str = "patches.json";

/// Archive file extension
pub const PATCH_EXTENSION: &str = "hgp";

fn default_enabled() -> bool {
    true
}

/// Registry metadata for one patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchDescriptor {
    /// Patch name, also the key into the password map
    pub name: String,
    /// Archive file name relative to the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Declared content category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,
    /// Declared version
    #[serde(default)]
    pub version: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Higher priorities shadow lower ones
    #[serde(default)]
    pub priority: i32,
    /// Disabled patches are never opened
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl PatchDescriptor {
    /// Enabled descriptor with the given name and priority
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            path: None,
            patch_type: None,
            version: String::new(),
            description: String::new(),
            priority,
            enabled: true,
        }
    }

    /// Set the archive file name
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the declared type
    pub fn with_type(mut self, patch_type: PatchType) -> Self {
        self.patch_type = Some(patch_type);
        self
    }

    /// Set the declared version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Enable or disable the patch
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Archive file name, `<name>.hgp` when none is recorded
    pub fn file_name(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None => format!("{}.{PATCH_EXTENSION}", self.name),
        }
    }
}

/// Game version plus the ordered patch list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Version of the packaged game
    #[serde(default)]
    pub game_version: String,
    /// Patches in declaration order
    #[serde(default)]
    pub patches: Vec<PatchDescriptor>,
}

impl Manifest {
    /// Empty manifest for a game version
    pub fn new(game_version: impl Into<String>) -> Self {
        Self {
            game_version: game_version.into(),
            patches: Vec::new(),
        }
    }

    /// Append a descriptor
    pub fn push(&mut self, descriptor: PatchDescriptor) {
        self.patches.push(descriptor);
    }

    /// Look up a descriptor by name
    pub fn get(&self, name: &str) -> Option<&PatchDescriptor> {
        self.patches.iter().find(|d| d.name == name)
    }

    /// Enabled descriptors, highest priority first
    ///
    /// The sort is stable, so among equal priorities the descriptor declared
    /// first in the manifest comes first and wins.
    pub fn resolution_order(&self) -> Vec<&PatchDescriptor> {
        let mut order: Vec<_> = self.patches.iter().filter(|d| d.enabled).collect();
        order.sort_by(|a, b| b.priority.cmp(&a.priority));
        order
    }

    /// Parse a manifest from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a manifest file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Write a manifest file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for descriptor in &self.patches {
            if descriptor.name.is_empty() {
                return Err(Error::manifest("Patch with empty name"));
            }
            if !seen.insert(descriptor.name.as_str()) {
                return Err(Error::manifest(format!(
                    "Patch {} declared more than once",
                    descriptor.name
                )));
            }
        }
        Ok(())
    }
}
