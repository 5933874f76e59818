//! Convenience presets over [`PatchBuilder`]
//!
//! Each preset binds a patch type and packs one source directory at the
//! archive root. [`package_game`] splits a whole project into the standard
//! patch set and writes the matching manifest.

use crate::builder::PatchBuilder;
use crate::manifest::{MANIFEST_FILE_NAME, Manifest, PATCH_EXTENSION, PatchDescriptor};
use crate::patch_type::PatchType;
use crate::toc::PatchInfo;
use crate::Result;
use std::fs;
use std::path::Path;

fn preset(
    name: &str,
    patch_type: PatchType,
    source_dir: &Path,
    output: &Path,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    PatchBuilder::new(name, patch_type)
        .password_opt(password)
        .add_directory(source_dir, "")
        .build(output, version, "")
}

/// Pack sprites, backgrounds and CG (deflated)
pub fn create_graphics_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    output: Q,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    preset(
        "graphics",
        PatchType::Graphics,
        source_dir.as_ref(),
        output.as_ref(),
        password,
        version,
    )
}

/// Pack voice lines (stored)
pub fn create_voice_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    output: Q,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    preset(
        "voice",
        PatchType::Voice,
        source_dir.as_ref(),
        output.as_ref(),
        password,
        version,
    )
}

/// Pack BGM and sound effects (stored)
pub fn create_audio_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    output: Q,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    preset(
        "audio",
        PatchType::Audio,
        source_dir.as_ref(),
        output.as_ref(),
        password,
        version,
    )
}

/// Pack scripts (deflated)
pub fn create_script_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    output: Q,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    preset(
        "script",
        PatchType::Script,
        source_dir.as_ref(),
        output.as_ref(),
        password,
        version,
    )
}

/// Pack movies (stored)
pub fn create_video_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    output: Q,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    preset(
        "video",
        PatchType::Video,
        source_dir.as_ref(),
        output.as_ref(),
        password,
        version,
    )
}

/// Pack downloadable content under its own name
pub fn create_dlc_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    name: &str,
    source_dir: P,
    output: Q,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    preset(
        name,
        PatchType::Dlc,
        source_dir.as_ref(),
        output.as_ref(),
        password,
        version,
    )
}

/// Pack an update that overrides earlier content
///
/// The source tree mirrors the archive paths it replaces.
pub fn create_update_patch<P: AsRef<Path>, Q: AsRef<Path>>(
    name: &str,
    source_dir: P,
    output: Q,
    password: Option<&str>,
    version: &str,
) -> Result<PatchInfo> {
    preset(
        name,
        PatchType::Patch,
        source_dir.as_ref(),
        output.as_ref(),
        password,
        version,
    )
}

/// Standard patch set: (patch name, type, source directories relative to the
/// project, archive prefix per directory)
///
/// Prefixes match the subdirectories [`crate::resolver::AssetResolver`]
/// searches, so packaged assets resolve by bare file name.
const GAME_LAYOUT: [(&str, PatchType, &[(&str, &str)]); 4] = [
    (
        "patch1",
        PatchType::Graphics,
        &[
            ("assets/characters", "ch"),
            ("assets/backgrounds", "bg"),
            ("assets/cg", "cg"),
            ("assets/ui", "ui"),
        ],
    ),
    ("patch2", PatchType::Voice, &[("assets/audio/voice", "voice")]),
    (
        "patch3",
        PatchType::Audio,
        &[
            ("assets/audio/bgm", "bgm"),
            ("assets/audio/se", "se"),
            ("assets/audio/ambient", "ambient"),
        ],
    ),
    ("patch4", PatchType::Script, &[("scripts", "")]),
];

/// Directories under `assets/` that [`GAME_LAYOUT`] already maps
const LAYOUT_ASSET_DIRS: [&str; 5] = ["characters", "backgrounds", "cg", "ui", "audio"];

/// Other directories under `assets/` (script namespaces, `config`), sorted
fn extra_asset_dirs(project_dir: &Path) -> Result<Vec<String>> {
    let assets = project_dir.join("assets");
    if !assets.is_dir() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = fs::read_dir(assets)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !LAYOUT_ASSET_DIRS.contains(&name.as_str()))
        .collect();
    names.sort();
    Ok(names)
}

/// Package a whole project into the standard patch set
///
/// Writes `patch1.hgp` (graphics plus every other `assets/<dir>` tree under
/// its own name), `patch2.hgp` (voice), `patch3.hgp` (BGM/SE/ambience) and
/// `patch4.hgp` (scripts) for every group that has files, plus a
/// `patches.json` manifest giving later patches higher priority. The same
/// priority is embedded in each patch so a directory scan ranks them alike.
/// Returns the built patches in that order.
pub fn package_game<P: AsRef<Path>, Q: AsRef<Path>>(
    project_dir: P,
    output_dir: Q,
    password: Option<&str>,
    version: &str,
) -> Result<Vec<PatchInfo>> {
    let project_dir = project_dir.as_ref();
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let mut manifest = Manifest::new(version);
    let mut built = Vec::new();

    for (name, patch_type, sources) in GAME_LAYOUT {
        let priority = built.len() as i32;
        let mut builder = PatchBuilder::new(name, patch_type)
            .password_opt(password)
            .priority(priority);
        for (source, prefix) in sources {
            let dir = project_dir.join(source);
            if dir.is_dir() {
                builder = builder.add_directory(dir, prefix);
            }
        }
        if patch_type == PatchType::Graphics {
            for extra in extra_asset_dirs(project_dir)? {
                builder = builder.add_directory(project_dir.join("assets").join(&extra), &extra);
            }
        }

        if builder.archive_paths()?.is_empty() {
            log::debug!("Skipping {name}: no {patch_type} sources in project");
            continue;
        }

        let file_name = format!("{name}.{PATCH_EXTENSION}");
        let info = builder.build(output_dir.join(&file_name), version, "")?;

        manifest.push(
            PatchDescriptor::new(name, priority)
                .with_path(file_name)
                .with_type(patch_type)
                .with_version(version),
        );
        built.push(info);
    }

    manifest.save(output_dir.join(MANIFEST_FILE_NAME))?;
    log::info!(
        "Packaged {} patches from {} into {}",
        built.len(),
        project_dir.display(),
        output_dir.display()
    );

    Ok(built)
}
