//! Patch registry: priority overlay over many patches
//!
//! A registry opens every enabled patch named by a [`Manifest`] and answers
//! reads from the highest-priority patch that contains the path. Patches
//! are sorted once at load time and a path → patch map is built the same
//! way for every path, so lookups are a single hash probe.
//!
//! # Examples
//!
//! ```no_run
//! use hgpk::{Passwords, PatchRegistry, RegistryOptions};
//!
//! let passwords = Passwords::new().with("patch2", "hunter2");
//! let registry = PatchRegistry::open_dir("game/data", &passwords, &RegistryOptions::default())?;
//!
//! let script = registry.read("demo.vns")?;
//! # Ok::<(), hgpk::Error>(())
//! ```

use crate::loader::{OpenOptions, PatchLoader};
use crate::manifest::{Manifest, PATCH_EXTENSION, PatchDescriptor};
use crate::path::normalize_patch_path;
use crate::security::SecurityLimits;
use crate::{Error, Result};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Passwords keyed by patch name
///
/// Passed once to [`PatchRegistry::load_all`]; nothing is read from the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct Passwords(HashMap<String, String>);

impl Passwords {
    /// Empty password map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a password and return the map
    pub fn with(mut self, patch: impl Into<String>, password: impl Into<String>) -> Self {
        self.insert(patch, password);
        self
    }

    /// Add or replace a password
    pub fn insert(&mut self, patch: impl Into<String>, password: impl Into<String>) {
        self.0.insert(patch.into(), password.into());
    }

    /// Password for a patch
    pub fn get(&self, patch: &str) -> Option<&str> {
        self.0.get(patch).map(String::as_str)
    }

    /// Number of passwords
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Passwords {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Registry loading options
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Fail on a patch that cannot be authenticated instead of skipping it
    pub strict: bool,
    /// Manifest file name inside the data directory
    pub manifest_name: String,
    /// Parsing limits applied to every patch
    pub limits: SecurityLimits,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            strict: false,
            manifest_name: crate::manifest::MANIFEST_FILE_NAME.to_string(),
            limits: SecurityLimits::default(),
        }
    }
}

impl RegistryOptions {
    /// Default (non-strict) options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the manifest file name
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Set parsing limits
    pub fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// A patch skipped while loading in non-strict mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Patch name from the manifest
    pub patch: String,
    /// Why it was skipped
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "patch {} skipped: {}", self.patch, self.message)
    }
}

#[derive(Debug)]
struct LoadedPatch {
    descriptor: PatchDescriptor,
    loader: PatchLoader,
}

/// Priority-ordered overlay of open patches
///
/// Read-only once loaded; share it by reference between threads. Dropping
/// the registry closes every patch it opened.
#[derive(Debug)]
pub struct PatchRegistry {
    game_version: String,
    /// Loaded patches, highest priority first
    patches: Vec<LoadedPatch>,
    /// Normalized path -> index of the winning patch
    file_map: HashMap<String, usize>,
    warnings: Vec<LoadWarning>,
}

impl PatchRegistry {
    /// Open every enabled patch of `manifest` from `data_dir`
    ///
    /// Patches are opened in parallel and then ordered by descending
    /// priority; equal priorities keep manifest order, so the first-declared
    /// patch wins. A patch with a missing or wrong password is skipped with a
    /// warning unless `options.strict` is set. Format, corruption and I/O
    /// errors always fail the load.
    pub fn load_all<P: AsRef<Path>>(
        manifest: &Manifest,
        data_dir: P,
        passwords: &Passwords,
        options: &RegistryOptions,
    ) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let order = manifest.resolution_order();

        let opened: Vec<(&PatchDescriptor, Result<PatchLoader>)> = order
            .par_iter()
            .map(|descriptor| {
                let result = Self::open_patch(data_dir, descriptor, passwords, options);
                (*descriptor, result)
            })
            .collect();

        let mut patches = Vec::with_capacity(opened.len());
        let mut warnings = Vec::new();

        for (descriptor, result) in opened {
            match result {
                Ok(loader) => patches.push(LoadedPatch {
                    descriptor: descriptor.clone(),
                    loader,
                }),
                Err(e) if e.is_authentication() && !options.strict => {
                    log::warn!("Skipping patch {}: {e}", descriptor.name);
                    warnings.push(LoadWarning {
                        patch: descriptor.name.clone(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        for patch in &patches {
            for required in &patch.loader.metadata().requires {
                if !patches.iter().any(|other| other.descriptor.name == *required) {
                    log::warn!(
                        "Patch {} requires {required}, which is not loaded",
                        patch.descriptor.name
                    );
                }
            }
        }

        let mut registry = Self {
            game_version: manifest.game_version.clone(),
            patches,
            file_map: HashMap::new(),
            warnings,
        };
        registry.rebuild_file_map();

        log::info!(
            "Loaded {} patches ({} files visible, {} skipped)",
            registry.patches.len(),
            registry.file_map.len(),
            registry.warnings.len()
        );

        Ok(registry)
    }

    fn open_patch(
        data_dir: &Path,
        descriptor: &PatchDescriptor,
        passwords: &Passwords,
        options: &RegistryOptions,
    ) -> Result<PatchLoader> {
        let path = data_dir.join(descriptor.file_name());
        let loader = OpenOptions::new()
            .password_opt(passwords.get(&descriptor.name))
            .limits(options.limits.clone())
            .open(&path)?;

        // An encrypted patch without a password would only fail later, per read
        if loader.is_locked() {
            return Err(Error::PasswordRequired(descriptor.name.clone()));
        }

        if loader.name() != descriptor.name {
            log::debug!(
                "Patch {} at {} embeds the name {}",
                descriptor.name,
                path.display(),
                loader.name()
            );
        }

        Ok(loader)
    }

    /// Load from a data directory
    ///
    /// Uses the manifest when present, otherwise every `*.hgp` file in the
    /// directory (see [`PatchRegistry::scan_dir`]).
    pub fn open_dir<P: AsRef<Path>>(
        data_dir: P,
        passwords: &Passwords,
        options: &RegistryOptions,
    ) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let manifest_path = data_dir.join(&options.manifest_name);

        let manifest = if manifest_path.is_file() {
            Manifest::load(&manifest_path)?
        } else {
            log::debug!(
                "No {} in {}, scanning for patches",
                options.manifest_name,
                data_dir.display()
            );
            Self::scan_dir(data_dir, &options.limits)?
        };

        Self::load_all(&manifest, data_dir, passwords, options)
    }

    /// Build a manifest from the `*.hgp` files in a directory
    ///
    /// Names, types, versions and priorities come from each patch's embedded
    /// metadata; equal priorities keep file name order. A file that cannot be
    /// parsed is skipped with a warning, as is a second file embedding a name
    /// already seen.
    pub fn scan_dir<P: AsRef<Path>>(data_dir: P, limits: &SecurityLimits) -> Result<Manifest> {
        let data_dir = data_dir.as_ref();
        let mut files: Vec<_> = fs::read_dir(data_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(PATCH_EXTENSION))
            })
            .collect();
        files.sort();

        let mut manifest = Manifest::default();
        let mut seen = HashSet::new();
        for path in files {
            let loader = match OpenOptions::new().limits(limits.clone()).open(&path) {
                Ok(loader) => loader,
                Err(e) => {
                    log::warn!("Skipping unreadable patch {}: {e}", path.display());
                    continue;
                }
            };
            let metadata = loader.metadata();

            if !seen.insert(metadata.name.clone()) {
                log::warn!(
                    "Skipping {}: patch name {} is already used by another file",
                    path.display(),
                    metadata.name
                );
                continue;
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            manifest.push(
                PatchDescriptor::new(metadata.name.clone(), metadata.priority)
                    .with_path(file_name)
                    .with_type(metadata.patch_type)
                    .with_version(metadata.version.clone()),
            );
        }

        Ok(manifest)
    }

    fn rebuild_file_map(&mut self) {
        self.file_map.clear();
        for (idx, patch) in self.patches.iter().enumerate() {
            for path in patch.loader.list_files() {
                // Earlier entries have higher priority
                self.file_map.entry(path.to_string()).or_insert(idx);
            }
        }
    }

    /// Read a file from the highest-priority patch containing it
    pub fn read(&self, path: &str) -> Result<Vec<u8>> {
        let normalized = normalize_patch_path(path)?;
        match self.file_map.get(&normalized) {
            Some(&idx) => {
                let patch = &self.patches[idx];
                log::trace!("Reading {normalized} from patch {}", patch.descriptor.name);
                patch.loader.read(&normalized)
            }
            None => Err(Error::FileNotFound(normalized)),
        }
    }

    /// Whether any loaded patch contains `path`
    pub fn contains(&self, path: &str) -> bool {
        normalize_patch_path(path).is_ok_and(|p| self.file_map.contains_key(&p))
    }

    /// Name of the patch that serves `path`
    pub fn find_patch(&self, path: &str) -> Option<&str> {
        let normalized = normalize_patch_path(path).ok()?;
        self.file_map
            .get(&normalized)
            .map(|&idx| self.patches[idx].descriptor.name.as_str())
    }

    /// Every distinct path visible through the overlay
    pub fn list_files(&self) -> BTreeSet<&str> {
        self.file_map.keys().map(String::as_str).collect()
    }

    /// Descriptors of the loaded patches, highest priority first
    pub fn patches(&self) -> impl Iterator<Item = &PatchDescriptor> {
        self.patches.iter().map(|p| &p.descriptor)
    }

    /// Loader of a loaded patch
    pub fn loader(&self, name: &str) -> Option<&PatchLoader> {
        self.patches
            .iter()
            .find(|p| p.descriptor.name == name)
            .map(|p| &p.loader)
    }

    /// Number of loaded patches
    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    /// Patches skipped while loading
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Game version from the manifest
    pub fn game_version(&self) -> &str {
        &self.game_version
    }
}
