//! Namespace-scoped asset resolution
//!
//! Scripts refer to assets by relative paths such as `bg/park.png`. Several
//! scripts share one asset tree, so each script may override assets in a
//! directory named after it (its namespace). A reference is resolved by
//! probing, in order:
//!
//! 1. `<namespace>/<reference>`
//! 2. `<namespace>/<subdir>/<reference>` for each plausible subdirectory
//! 3. `<subdir>/<reference>` for each plausible subdirectory
//! 4. `<reference>` as given
//!
//! Each candidate is checked as a file under the assets root first and then
//! in the patch registry. The first hit wins; directories never match.

use crate::path::{normalize_patch_path, patch_path_to_system};
use crate::registry::PatchRegistry;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Actor map file name
pub const ACTOR_MAP_FILE: &str = "actors_map.json";

/// Per-script override scope, derived from the script's file stem
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Namespace with the given name
    ///
    /// Returns `None` for names that cannot be a single directory component.
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return None;
        }
        Some(Self(name.to_string()))
    }

    /// Namespace of a script file: `scripts/demo.vns` gives `demo`
    pub fn from_script_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(Self::new)
    }

    /// Namespace name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Known asset subdirectories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Backgrounds (`bg`)
    Background,
    /// Event CG (`cg`)
    Cg,
    /// Character sprites (`ch`)
    Character,
    /// Background music (`bgm`)
    Bgm,
    /// Sound effects (`se`)
    Se,
    /// Voice lines (`voice`)
    Voice,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tga"];
const AUDIO_EXTENSIONS: &[&str] = &["ogg", "mp3", "wav", "flac", "opus", "m4a"];

impl AssetKind {
    /// Every kind, images first
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Background,
        AssetKind::Cg,
        AssetKind::Character,
        AssetKind::Bgm,
        AssetKind::Se,
        AssetKind::Voice,
    ];

    /// Kinds holding images
    pub const IMAGES: [AssetKind; 3] = [AssetKind::Background, AssetKind::Cg, AssetKind::Character];

    /// Kinds holding audio
    pub const AUDIO: [AssetKind; 3] = [AssetKind::Bgm, AssetKind::Se, AssetKind::Voice];

    /// Directory name under the assets root
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetKind::Background => "bg",
            AssetKind::Cg => "cg",
            AssetKind::Character => "ch",
            AssetKind::Bgm => "bgm",
            AssetKind::Se => "se",
            AssetKind::Voice => "voice",
        }
    }

    /// Kinds a reference plausibly belongs to, judged by its extension
    ///
    /// Unknown or missing extensions are plausible for every kind.
    pub fn plausible_for(reference: &str) -> &'static [AssetKind] {
        let extension = Path::new(reference)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => &Self::IMAGES,
            Some(ext) if AUDIO_EXTENSIONS.contains(&ext) => &Self::AUDIO,
            _ => &Self::ALL,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for AssetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bg" | "background" => Ok(AssetKind::Background),
            "cg" => Ok(AssetKind::Cg),
            "ch" | "character" | "char" => Ok(AssetKind::Character),
            "bgm" | "music" => Ok(AssetKind::Bgm),
            "se" | "sfx" | "sound" => Ok(AssetKind::Se),
            "voice" => Ok(AssetKind::Voice),
            _ => Err(Error::InvalidPath(format!("Unknown asset kind: {s}"))),
        }
    }
}

/// Where a reference resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    /// A file on disk
    File(PathBuf),
    /// A path inside the patch registry
    Patch(String),
}

impl fmt::Display for ResolvedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedAsset::File(path) => write!(f, "{}", path.display()),
            ResolvedAsset::Patch(key) => write!(f, "patch:{key}"),
        }
    }
}

/// Mapping from in-script actor names to sprite folders
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ActorMap(BTreeMap<String, String>);

impl ActorMap {
    /// Parse `{"display name": "folder"}` JSON
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Folder for an actor, the name itself when unmapped
    pub fn folder_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.0.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Mapped folder, if any
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of mapped actors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolves script asset references against the assets root and a registry
#[derive(Debug, Clone)]
pub struct AssetResolver<'a> {
    assets_root: PathBuf,
    registry: Option<&'a PatchRegistry>,
}

impl<'a> AssetResolver<'a> {
    /// Resolver over an unpacked assets directory only
    pub fn new<P: AsRef<Path>>(assets_root: P) -> Self {
        Self {
            assets_root: assets_root.as_ref().to_path_buf(),
            registry: None,
        }
    }

    /// Also probe `registry` at every step
    pub fn with_registry(mut self, registry: &'a PatchRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Assets root
    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    /// Ordered probe keys for a reference
    ///
    /// An explicit `kind_hint` limits steps 2 and 3 to that subdirectory;
    /// otherwise the reference's extension decides. A reference that already
    /// starts with a known subdirectory skips steps 2 and 3. A reference that
    /// cannot be normalized yields no candidates.
    pub fn candidates(
        &self,
        namespace: Option<&Namespace>,
        reference: &str,
        kind_hint: Option<AssetKind>,
    ) -> Vec<String> {
        let Ok(reference) = normalize_patch_path(reference) else {
            return Vec::new();
        };

        let hinted;
        let kinds: &[AssetKind] = match kind_hint {
            Some(kind) => {
                hinted = [kind];
                &hinted
            }
            None => AssetKind::plausible_for(&reference),
        };
        let first_component = reference.split('/').next().unwrap_or_default();
        let already_typed = AssetKind::ALL
            .iter()
            .any(|kind| kind.dir_name() == first_component);
        let subdirs: Vec<&str> = if already_typed {
            Vec::new()
        } else {
            kinds.iter().map(|kind| kind.dir_name()).collect()
        };

        let mut candidates = Vec::with_capacity(2 + subdirs.len() * 2);
        let mut push = |key: String| {
            if !candidates.contains(&key) {
                candidates.push(key);
            }
        };

        if let Some(ns) = namespace {
            push(format!("{ns}/{reference}"));
            for dir in &subdirs {
                push(format!("{ns}/{dir}/{reference}"));
            }
        }
        for dir in &subdirs {
            push(format!("{dir}/{reference}"));
        }
        push(reference);

        candidates
    }

    /// Check one key on disk, then in the registry
    fn probe(&self, key: &str) -> Option<ResolvedAsset> {
        let path = self.assets_root.join(patch_path_to_system(key));
        if path.is_file() {
            return Some(ResolvedAsset::File(path));
        }

        match self.registry {
            Some(registry) if registry.contains(key) => Some(ResolvedAsset::Patch(key.to_string())),
            _ => None,
        }
    }

    /// Resolve a reference written in the script with stem `script_stem`
    ///
    /// An empty stem resolves without a namespace.
    pub fn resolve(
        &self,
        script_stem: &str,
        reference: &str,
        kind_hint: Option<AssetKind>,
    ) -> Result<ResolvedAsset> {
        self.resolve_in(Namespace::new(script_stem).as_ref(), reference, kind_hint)
    }

    /// Resolve a reference under an explicit namespace
    pub fn resolve_in(
        &self,
        namespace: Option<&Namespace>,
        reference: &str,
        kind_hint: Option<AssetKind>,
    ) -> Result<ResolvedAsset> {
        let not_found = || Error::AssetNotFound {
            reference: reference.to_string(),
            namespace: namespace.map(|ns| ns.to_string()),
        };

        // Absolute paths bypass the chain
        let literal = Path::new(reference);
        if literal.is_absolute() {
            return if literal.is_file() {
                Ok(ResolvedAsset::File(literal.to_path_buf()))
            } else {
                Err(not_found())
            };
        }

        for key in self.candidates(namespace, reference, kind_hint) {
            if let Some(found) = self.probe(&key) {
                log::trace!("Resolved {reference} to {found}");
                return Ok(found);
            }
        }

        log::debug!(
            "Asset {reference} not found (namespace {})",
            namespace.map_or("<none>", Namespace::as_str)
        );
        Err(not_found())
    }

    /// Read the bytes of a resolved asset
    ///
    /// Corruption inside a patch is reported, never replaced by a lower
    /// candidate.
    pub fn read(&self, asset: &ResolvedAsset) -> Result<Vec<u8>> {
        match asset {
            ResolvedAsset::File(path) => Ok(fs::read(path)?),
            ResolvedAsset::Patch(key) => match self.registry {
                Some(registry) => registry.read(key),
                None => Err(Error::FileNotFound(key.clone())),
            },
        }
    }

    /// Resolve and read in one step
    pub fn resolve_and_read(
        &self,
        script_stem: &str,
        reference: &str,
        kind_hint: Option<AssetKind>,
    ) -> Result<Vec<u8>> {
        let asset = self.resolve(script_stem, reference, kind_hint)?;
        self.read(&asset)
    }

    /// Probe keys for the actor map: namespace config, global config, then
    /// the legacy root location
    pub fn actor_map_candidates(&self, namespace: Option<&Namespace>) -> Vec<String> {
        let mut candidates = Vec::with_capacity(3);
        if let Some(ns) = namespace {
            candidates.push(format!("{ns}/config/{ACTOR_MAP_FILE}"));
        }
        candidates.push(format!("config/{ACTOR_MAP_FILE}"));
        candidates.push(ACTOR_MAP_FILE.to_string());
        candidates
    }

    /// Locate the actor map for a script
    pub fn resolve_actor_map(&self, script_stem: &str) -> Result<ResolvedAsset> {
        let namespace = Namespace::new(script_stem);
        self.actor_map_candidates(namespace.as_ref())
            .iter()
            .find_map(|key| self.probe(key))
            .ok_or_else(|| Error::AssetNotFound {
                reference: format!("config/{ACTOR_MAP_FILE}"),
                namespace: namespace.map(|ns| ns.0),
            })
    }

    /// Load the actor map for a script, empty when none exists
    pub fn load_actor_map(&self, script_stem: &str) -> Result<ActorMap> {
        match self.resolve_actor_map(script_stem) {
            Ok(asset) => ActorMap::from_json(&self.read(&asset)?),
            Err(Error::AssetNotFound { .. }) => Ok(ActorMap::default()),
            Err(e) => Err(e),
        }
    }
}
