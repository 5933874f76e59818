//! Whole-project packaging

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::utils::{add_table_row, create_spinner, create_table, format_bytes, format_compression_ratio};

#[derive(Args)]
pub struct PackageArgs {
    /// Project directory containing `assets/` and `scripts/`
    pub project: PathBuf,

    /// Output directory for the patches and manifest
    #[arg(short, long, default_value = "dist")]
    pub output: PathBuf,

    /// Game version recorded in every patch and the manifest
    #[arg(long = "game-version", default_value = "1.0.0")]
    pub version: String,
}

pub fn execute(args: PackageArgs, password: Option<&str>) -> Result<()> {
    let spinner = create_spinner("Packaging project...");
    let built = hgpk::package_game(&args.project, &args.output, password, &args.version)
        .with_context(|| format!("Failed to package {}", args.project.display()));
    spinner.finish_and_clear();
    let built = built?;

    if built.is_empty() {
        println!("No assets or scripts found in {}", args.project.display());
        return Ok(());
    }

    let mut table = create_table(vec!["Patch", "Type", "Files", "Size", "Stored", "Saved"]);
    for info in &built {
        add_table_row(
            &mut table,
            vec![
                info.metadata.name.clone(),
                info.metadata.patch_type.to_string(),
                info.total_files.to_string(),
                format_bytes(info.total_size),
                format_bytes(info.stored_size),
                format_compression_ratio(info.total_size, info.stored_size),
            ],
        );
    }
    table.printstd();

    println!(
        "Packaged {} patches into {}",
        built.len(),
        args.output.display()
    );
    Ok(())
}
