//! Single-patch command implementations

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use hgpk::crypto::DEFAULT_KDF_ITERATIONS;
use hgpk::path::{normalize_patch_path, patch_path_to_system};
use hgpk::{CompressionMethod, PatchBuilder, PatchLoader, PatchType};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::utils::{
    add_table_row, create_progress_bar, create_spinner, create_table, format_bytes,
    format_compression_ratio, matches_pattern, truncate_path,
};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CompressionArg {
    None,
    Zlib,
}

impl From<CompressionArg> for CompressionMethod {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => CompressionMethod::None,
            CompressionArg::Zlib => CompressionMethod::Zlib,
        }
    }
}

/// A source directory and the archive prefix it is packed under
#[derive(Clone, Debug)]
pub struct SourceArg {
    pub dir: PathBuf,
    pub prefix: String,
}

impl FromStr for SourceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty source".to_string());
        }
        // `dir:prefix`, unless the colon belongs to a Windows drive letter
        match s.rsplit_once(':') {
            Some((dir, prefix)) if dir.len() > 1 => Ok(Self {
                dir: PathBuf::from(dir),
                prefix: prefix.to_string(),
            }),
            _ => Ok(Self {
                dir: PathBuf::from(s),
                prefix: String::new(),
            }),
        }
    }
}

#[derive(Args)]
pub struct BuildArgs {
    /// Path for the new patch archive
    pub output: PathBuf,

    /// Source directory to pack, optionally as `dir:prefix`
    #[arg(short = 'a', long = "add", required = true)]
    pub sources: Vec<SourceArg>,

    /// Patch name embedded in the archive (defaults to the output file stem)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Patch type (graphics, voice, audio, script, video, dlc, patch, system)
    #[arg(short = 't', long = "type", default_value = "patch")]
    pub patch_type: PatchType,

    /// Override the patch type's compression
    #[arg(short, long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// Patch version string
    #[arg(long = "patch-version", default_value = "1.0.0")]
    pub version: String,

    /// Free-form description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Author recorded in the metadata
    #[arg(long)]
    pub author: Option<String>,

    /// Overlay priority used when the data directory has no manifest
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub priority: i32,

    /// Name of a patch this one depends on (repeatable)
    #[arg(long = "requires")]
    pub requires: Vec<String>,

    /// PBKDF2 iterations for protected patches
    #[arg(long, default_value_t = DEFAULT_KDF_ITERATIONS)]
    pub kdf_iterations: u32,
}

#[derive(Args)]
pub struct ListArgs {
    /// Path to the patch archive
    pub archive: PathBuf,

    /// Show detailed information (size, compression ratio)
    #[arg(short, long)]
    pub long: bool,

    /// Filter files by pattern (supports wildcards)
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Path to the patch archive
    pub archive: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Specific files to extract (extracts all if not specified)
    pub files: Vec<String>,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Path to the patch archive
    pub archive: PathBuf,

    /// List every entry with its checksum
    #[arg(long)]
    pub entries: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Path to the patch archive
    pub archive: PathBuf,
}

fn open(path: &Path, password: Option<&str>) -> Result<PatchLoader> {
    let spinner = create_spinner("Opening patch...");
    let loader = PatchLoader::open_with_password(path, password)
        .with_context(|| format!("Failed to open patch {}", path.display()));
    spinner.finish_and_clear();
    loader
}

pub fn build(args: BuildArgs, password: Option<&str>) -> Result<()> {
    let name = match args.name {
        Some(name) => name,
        None => args
            .output
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Cannot derive a patch name from the output path")?
            .to_string(),
    };

    let mut builder = PatchBuilder::new(&name, args.patch_type)
        .password_opt(password)
        .kdf_iterations(args.kdf_iterations)
        .priority(args.priority);
    for required in args.requires {
        builder = builder.requires(required);
    }
    if let Some(author) = args.author {
        builder = builder.author(author);
    }
    for source in &args.sources {
        builder = match args.compression {
            Some(method) => {
                builder.add_directory_with_compression(&source.dir, &source.prefix, method.into())
            }
            None => builder.add_directory(&source.dir, &source.prefix),
        };
    }

    let spinner = create_spinner("Building patch...");
    let info = builder
        .build(&args.output, &args.version, &args.description)
        .with_context(|| format!("Failed to build {}", args.output.display()));
    spinner.finish_and_clear();
    let info = info?;

    println!(
        "Built {} ({}): {} files, {} -> {} ({} saved){}",
        args.output.display(),
        info.metadata.patch_type,
        info.total_files,
        format_bytes(info.total_size),
        format_bytes(info.stored_size),
        format_compression_ratio(info.total_size, info.stored_size),
        if info.encrypted { ", encrypted" } else { "" }
    );
    Ok(())
}

pub fn list(args: ListArgs, password: Option<&str>) -> Result<()> {
    let loader = open(&args.archive, password)?;
    let pattern = args.filter.as_deref().unwrap_or("*");

    let entries: Vec<_> = loader
        .entries()
        .iter()
        .filter(|e| matches_pattern(&e.path, pattern))
        .collect();

    if entries.is_empty() {
        println!("No files found matching pattern: {pattern}");
        return Ok(());
    }

    if args.long {
        let mut table = create_table(vec!["File", "Size", "Stored", "Ratio", "Method"]);
        for entry in entries {
            add_table_row(
                &mut table,
                vec![
                    truncate_path(&entry.path, 50),
                    format_bytes(entry.size),
                    format_bytes(entry.stored_size),
                    format_compression_ratio(entry.size, entry.stored_size),
                    entry.compression.to_string(),
                ],
            );
        }
        table.printstd();
    } else {
        for entry in entries {
            println!("{}", entry.path);
        }
    }

    Ok(())
}

pub fn extract(args: ExtractArgs, password: Option<&str>) -> Result<()> {
    let loader = open(&args.archive, password)?;
    loader.ensure_unlocked()?;

    let files: Vec<String> = if args.files.is_empty() {
        loader.list_files().into_iter().map(str::to_string).collect()
    } else {
        args.files
    };

    fs::create_dir_all(&args.output)?;
    let pb = create_progress_bar(files.len() as u64, "Extracting files");
    let mut failed = 0usize;

    for file in &files {
        pb.set_message(format!("Extracting: {file}"));
        let result = normalize_patch_path(file).and_then(|normalized| {
            let destination = args.output.join(patch_path_to_system(&normalized));
            loader.extract(&normalized, destination)
        });
        if let Err(e) = result {
            log::warn!("Failed to extract {file}: {e}");
            failed += 1;
        }
        pb.inc(1);
    }

    pb.finish_with_message("Extraction complete");

    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed to extract", files.len());
    }
    println!("Extracted {} files to {}", files.len(), args.output.display());
    Ok(())
}

pub fn info(args: InfoArgs, password: Option<&str>) -> Result<()> {
    let loader = open(&args.archive, password)?;
    let info = loader.info();
    let archive_size = fs::metadata(&args.archive)?.len();

    println!("Patch Information");
    println!("=================");
    println!("Path: {}", args.archive.display());
    println!("Name: {}", info.metadata.name);
    println!("Type: {}", info.metadata.patch_type);
    println!("Version: {}", info.metadata.version);
    println!("Priority: {}", info.metadata.priority);
    if !info.metadata.requires.is_empty() {
        println!("Requires: {}", info.metadata.requires.join(", "));
    }
    if !info.metadata.author.is_empty() {
        println!("Author: {}", info.metadata.author);
    }
    if !info.metadata.description.is_empty() {
        println!("Description: {}", info.metadata.description);
    }
    println!("Format version: {}", loader.header().version);
    println!(
        "Encrypted: {}",
        match (info.encrypted, loader.is_locked()) {
            (false, _) => "no",
            (true, true) => "yes (locked)",
            (true, false) => "yes",
        }
    );
    println!("Archive size: {}", format_bytes(archive_size));
    println!("Number of files: {}", info.total_files);
    println!("Content size: {}", format_bytes(info.total_size));
    println!(
        "Stored size: {} ({} saved)",
        format_bytes(info.stored_size),
        format_compression_ratio(info.total_size, info.stored_size)
    );

    if args.entries {
        println!();
        let mut table = create_table(vec!["File", "Offset", "Size", "Method", "MD5"]);
        for entry in &info.entries {
            add_table_row(
                &mut table,
                vec![
                    truncate_path(&entry.path, 40),
                    format!("0x{:08x}", entry.offset),
                    format_bytes(entry.size),
                    entry.compression.to_string(),
                    entry.checksum_hex(),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

pub fn verify(args: VerifyArgs, password: Option<&str>) -> Result<()> {
    let loader = open(&args.archive, password)?;

    let spinner = create_spinner("Verifying entries...");
    let report = loader.verify();
    spinner.finish_and_clear();
    let report = report?;

    for (path, error) in &report.failures {
        println!("✗ {path}: {error}");
    }

    if report.is_ok() {
        println!("✓ Patch verification passed ({} files)", report.verified);
        Ok(())
    } else {
        anyhow::bail!(
            "Patch verification failed: {} of {} files corrupt",
            report.failures.len(),
            report.verified + report.failures.len()
        )
    }
}
