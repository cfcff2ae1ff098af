//! Finding dump files below a capture directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Every file below `root` whose extension names a dump format, in file name order
///
/// Extensions are matched case-insensitively against
/// [`spooltag::detect::dump_extensions`].
pub fn collect_dump_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let is_dump = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                spooltag::detect::dump_extensions().any(|ext| e.eq_ignore_ascii_case(ext))
            });
        if is_dump {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collects_dump_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("flipper")).unwrap();
        fs::write(dir.path().join("b.BIN"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("export.json"), b"").unwrap();
        fs::write(dir.path().join("flipper").join("a.nfc"), b"").unwrap();

        let files = collect_dump_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["b.BIN", "export.json", "a.nfc"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_dump_files(&dir.path().join("absent")).is_err());
    }
}
