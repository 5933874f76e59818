//! Path utilities for patch archives
//!
//! Archive paths are stored with forward slashes, case preserved, without a
//! leading separator and without `.` or `..` components. Lookups normalize the
//! requested path the same way, so `bg\park.png`, `./bg/park.png` and
//! `bg//park.png` all name the same entry.

use crate::{Error, Result};
use std::path::Path;

/// Normalize a path for storage in or lookup from a patch archive
///
/// # Examples
///
/// ```
/// use hgpk::path::normalize_patch_path;
///
/// assert_eq!(normalize_patch_path("bg\\park.png").unwrap(), "bg/park.png");
/// assert_eq!(normalize_patch_path("./ch//Alice/base.png").unwrap(), "ch/Alice/base.png");
/// assert!(normalize_patch_path("../secret.txt").is_err());
/// ```
pub fn normalize_patch_path(path: &str) -> Result<String> {
    let mut parts = Vec::new();
    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => continue,
            ".." => {
                return Err(Error::InvalidPath(format!(
                    "{path}: parent directory components are not allowed"
                )));
            }
            part => parts.push(part),
        }
    }

    if parts.is_empty() {
        return Err(Error::InvalidPath(format!("{path:?}: empty path")));
    }

    Ok(parts.join("/"))
}

/// Join an archive prefix and a relative path, normalizing the result
pub fn join_patch_path(prefix: &str, relative: &str) -> Result<String> {
    if prefix.trim_matches(['/', '\\']).is_empty() {
        normalize_patch_path(relative)
    } else {
        normalize_patch_path(&format!("{prefix}/{relative}"))
    }
}

/// Convert a filesystem path relative to some root into an archive path
pub fn relative_to_patch_path(relative: &Path) -> Result<String> {
    let as_str = relative
        .to_str()
        .ok_or_else(|| Error::InvalidPath(format!("{}: not valid UTF-8", relative.display())))?;
    normalize_patch_path(as_str)
}

/// Convert an archive path to a system path for extraction
pub fn patch_path_to_system(path: &str) -> String {
    #[cfg(windows)]
    {
        path.replace('/', "\\")
    }

    #[cfg(not(windows))]
    {
        path.to_string()
    }
}
