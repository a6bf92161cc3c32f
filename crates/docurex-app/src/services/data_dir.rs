// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::PathBuf;

/// Return the application data directory, creating it if needed.
///
/// An explicit `override_dir` (from `--data-dir`) wins over the
/// conventional location.
pub fn data_dir(override_dir: Option<PathBuf>) -> PathBuf {
    let dir = override_dir.unwrap_or_else(|| dirs_fallback().join("docurex"));
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(path = %dir.display(), error = %e, "could not create data directory");
    }
    dir
}

fn dirs_fallback() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    PathBuf::from("/tmp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_is_created_and_used() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let wanted = tmp.path().join("nested").join("docurex");
        let dir = data_dir(Some(wanted.clone()));
        assert_eq!(dir, wanted);
        assert!(dir.is_dir());
    }
}
