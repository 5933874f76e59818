//! Patch content categories and their compression policy

use crate::compression::CompressionMethod;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content category of a whole patch
///
/// The type decides how every entry added through the convenience builders
/// is compressed; a generic builder may still override it per directory.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchType {
    /// Sprites, backgrounds, CG, UI art
    Graphics = 0,
    /// Character voice lines
    Voice = 1,
    /// BGM, sound effects, ambience
    Audio = 2,
    /// Scripts and text
    Script = 3,
    /// Opening/ending movies
    Video = 4,
    /// Fonts and configuration
    System = 5,
    /// Downloadable content
    Dlc = 6,
    /// Update patch overriding earlier content
    Patch = 7,
}

/// Compression policy, indexed by the type's tag
const COMPRESSION_POLICY: [CompressionMethod; 8] = [
    CompressionMethod::Zlib, // Graphics
    CompressionMethod::None, // Voice
    CompressionMethod::None, // Audio
    CompressionMethod::Zlib, // Script
    CompressionMethod::None, // Video
    CompressionMethod::Zlib, // System
    CompressionMethod::Zlib, // Dlc
    CompressionMethod::Zlib, // Patch
];

impl PatchType {
    /// All patch types in tag order
    pub const ALL: [PatchType; 8] = [
        PatchType::Graphics,
        PatchType::Voice,
        PatchType::Audio,
        PatchType::Script,
        PatchType::Video,
        PatchType::System,
        PatchType::Dlc,
        PatchType::Patch,
    ];

    /// Default compression applied to entries of this patch type
    ///
    /// Voice, audio and video sources are already compressed media, so
    /// they are stored; everything else is deflated.
    pub const fn default_compression(self) -> CompressionMethod {
        COMPRESSION_POLICY[self as usize]
    }

    /// Tag written into the table of contents
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a tag read from the table of contents
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Lowercase name used in manifests and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            PatchType::Graphics => "graphics",
            PatchType::Voice => "voice",
            PatchType::Audio => "audio",
            PatchType::Script => "script",
            PatchType::Video => "video",
            PatchType::System => "system",
            PatchType::Dlc => "dlc",
            PatchType::Patch => "patch",
        }
    }
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatchType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::manifest(format!("Unknown patch type: {s}")))
    }
}
