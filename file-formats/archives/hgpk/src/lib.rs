//! # hgpk - HiGan Patch pacK
//!
//! Patch archives and layered asset resolution for HiganVN visual-novel
//! projects.
//!
//! A game ships its assets as a handful of patch archives (`*.hgp`): one for
//! graphics, one for voice, one for music, one for scripts, plus any DLC or
//! update patches. At runtime a [`PatchRegistry`] stacks them by priority so
//! that an update patch can replace individual files without rebuilding the
//! base archives, and an [`AssetResolver`] maps the relative references
//! written in scripts onto that overlay and the unpacked project directory.
//!
//! ## Features
//!
//! - Single-file archive format with an O(1) table of contents
//! - Per-entry zlib compression chosen by patch type
//! - Optional password protection with fail-fast key checking
//! - MD5 content checksums verified on every read
//! - Priority overlay with deterministic tie-breaking
//! - Namespace-scoped asset overrides for multi-script projects
//!
//! ## Examples
//!
//! ### Building a patch
//!
//! ```no_run
//! use hgpk::{PatchBuilder, PatchType};
//!
//! # fn main() -> Result<(), hgpk::Error> {
//! let info = PatchBuilder::new("patch1", PatchType::Graphics)
//!     .add_directory("assets/backgrounds", "bg")
//!     .add_directory("assets/characters", "ch")
//!     .build("dist/patch1.hgp", "1.0.0", "Base graphics")?;
//!
//! println!("{} files, {} bytes stored", info.total_files, info.stored_size);
//! # Ok(())
//! # }
//! ```
//!
//! ### Resolving assets at runtime
//!
//! ```no_run
//! use hgpk::{AssetResolver, Passwords, PatchRegistry, RegistryOptions};
//!
//! # fn main() -> Result<(), hgpk::Error> {
//! let registry = PatchRegistry::open_dir("dist", &Passwords::new(), &RegistryOptions::default())?;
//! let resolver = AssetResolver::new("assets").with_registry(&registry);
//!
//! // `demo/bg/park.png` wins over `bg/park.png` for the script `demo.vns`
//! let asset = resolver.resolve("demo", "bg/park.png", None)?;
//! let bytes = resolver.read(&asset)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builder;
pub mod codec;
pub mod compression;
pub mod crypto;
pub mod error;
pub mod header;
mod io;
pub mod loader;
pub mod manifest;
pub mod patch_type;
pub mod path;
pub mod presets;
pub mod registry;
pub mod resolver;
pub mod security;
pub mod toc;

// Re-export commonly used types
pub use builder::PatchBuilder;
pub use codec::{Encryption, PatchLayout, PatchWriter, decode_entry, decode_header, encode};
pub use compression::CompressionMethod;
pub use error::{Error, ErrorKind, Result};
pub use header::{FORMAT_VERSION, PatchHeader};
pub use loader::{OpenOptions, PatchLoader, VerifyReport};
pub use manifest::{Manifest, PatchDescriptor};
pub use patch_type::PatchType;
pub use presets::{
    create_audio_patch, create_dlc_patch, create_graphics_patch, create_script_patch,
    create_update_patch, create_video_patch, create_voice_patch, package_game,
};
pub use registry::{LoadWarning, Passwords, PatchRegistry, RegistryOptions};
pub use resolver::{ActorMap, AssetKind, AssetResolver, Namespace, ResolvedAsset};
pub use security::SecurityLimits;
pub use toc::{Entry, PatchInfo, PatchMetadata};

/// Patch signature constants
pub mod signatures {
    /// Patch archive signature ('HGPK')
    pub const PATCH_ARCHIVE: [u8; 4] = crate::header::PATCH_MAGIC;
}
