//! Expansion of command-line paths into a scan scope.

use glob::glob;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Expand directories to the files below them with one of `extensions`.
///
/// Explicit file arguments are kept as given, in order, even when they do
/// not exist (the scan records them as unreadable). Files found under a
/// directory are sorted so that runs are reproducible.
pub fn expand_paths(paths: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
    for path in paths {
        if path.is_dir() {
            for found in files_under(path, extensions) {
                if seen.insert(found.clone()) {
                    out.push(found);
                }
            }
        } else if seen.insert(path.clone()) {
            out.push(path.clone());
        }
    }
    out
}

fn files_under(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();
    for ext in extensions {
        let pattern = dir.join("**").join(format!("*.{}", ext));
        let pattern = pattern.to_string_lossy().to_string();
        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(pattern = %pattern, "bad glob pattern: {}", e);
                continue;
            }
        };
        for entry in entries {
            match entry {
                Ok(p) if p.is_file() => found.push(p),
                Ok(_) => {}
                Err(e) => warn!("cannot read directory entry: {}", e),
            }
        }
    }
    found.sort();
    found.dedup();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_directories_expand_sorted_and_files_kept() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::write(root.join("pkg/b.py"), "").unwrap();
        fs::write(root.join("pkg/a.py"), "").unwrap();
        fs::write(root.join("pkg/sub/c.py"), "").unwrap();
        fs::write(root.join("pkg/notes.txt"), "").unwrap();
        let explicit = root.join("missing.py");

        let out = expand_paths(
            &[explicit.clone(), root.join("pkg"), root.join("pkg/a.py")],
            &["py".to_string()],
        );
        assert_eq!(
            out,
            vec![
                explicit,
                root.join("pkg/a.py"),
                root.join("pkg/b.py"),
                root.join("pkg/sub/c.py"),
            ]
        );
    }
}
