//! Shared audio utilities.

use std::path::{Path, PathBuf};

/// Resolve a binary name against `PATH`.
/// Names containing a path separator are checked as-is.
pub(crate) fn get_from_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        let p = PathBuf::from(bin);
        return if p.exists() { Some(p) } else { None };
    }
    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        for candidate in candidates(&dir, bin) {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(windows)]
fn candidates(dir: &Path, bin: &str) -> Vec<PathBuf> {
    vec![dir.join(bin), dir.join(format!("{}.exe", bin))]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, bin: &str) -> Vec<PathBuf> {
    vec![dir.join(bin)]
}
