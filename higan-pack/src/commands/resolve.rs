//! Reference resolution diagnostics

use anyhow::{Context, Result};
use clap::Args;
use hgpk::{
    AssetKind, AssetResolver, Manifest, Namespace, Passwords, PatchRegistry, RegistryOptions,
};
use std::path::{Path, PathBuf};

use crate::utils::format_bytes;

#[derive(Args)]
pub struct ResolveArgs {
    /// Reference as written in the script
    pub reference: String,

    /// Script whose stem names the namespace (e.g. scripts/demo.vns)
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Unpacked assets directory
    #[arg(short, long, default_value = "assets")]
    pub assets: PathBuf,

    /// Directory holding the patches (and optionally patches.json)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Restrict the search to one asset kind (bg, cg, ch, bgm, se, voice)
    #[arg(short, long)]
    pub kind: Option<AssetKind>,

    /// Fail if any patch cannot be unlocked
    #[arg(long)]
    pub strict: bool,
}

pub fn execute(args: ResolveArgs, password: Option<&str>) -> Result<()> {
    let registry = match &args.data {
        Some(dir) => Some(load_registry(dir, password, args.strict)?),
        None => None,
    };

    let mut resolver = AssetResolver::new(&args.assets);
    if let Some(registry) = &registry {
        resolver = resolver.with_registry(registry);
    }

    let namespace = args.script.as_deref().and_then(Namespace::from_script_path);

    println!("Candidates:");
    for key in resolver.candidates(namespace.as_ref(), &args.reference, args.kind) {
        println!("  {key}");
    }

    let asset = resolver.resolve_in(namespace.as_ref(), &args.reference, args.kind)?;
    let size = resolver.read(&asset)?.len() as u64;
    println!("Resolved: {asset} ({})", format_bytes(size));
    Ok(())
}

fn load_registry(dir: &Path, password: Option<&str>, strict: bool) -> Result<PatchRegistry> {
    let options = RegistryOptions::new().strict(strict);

    // One password unlocks every patch
    let passwords = match password {
        Some(password) => patch_names(dir, &options)?
            .into_iter()
            .map(|name| (name, password.to_string()))
            .collect(),
        None => Passwords::new(),
    };

    let registry = PatchRegistry::open_dir(dir, &passwords, &options)
        .with_context(|| format!("Failed to load patches from {}", dir.display()))?;
    for warning in registry.warnings() {
        log::warn!("{warning}");
    }
    Ok(registry)
}

/// Names of the patches `open_dir` will consider
fn patch_names(dir: &Path, options: &RegistryOptions) -> Result<Vec<String>> {
    let manifest_path = dir.join(&options.manifest_name);
    let manifest = if manifest_path.is_file() {
        Manifest::load(&manifest_path)?
    } else {
        PatchRegistry::scan_dir(dir, &options.limits)
            .with_context(|| format!("Failed to scan {}", dir.display()))?
    };
    Ok(manifest.patches.into_iter().map(|d| d.name).collect())
}
