//! File discovery and classification.
//!
//! Measurement files are classified by naming convention once, at discovery
//! time: original exports end with the `@_ORI.txt` marker, corrected exports
//! are plain `.txt` files without the marker, and converter-tool dumps carry
//! the `.bin` extension. Discovery walks the configured folders in the order
//! they were supplied and sorts filenames lexicographically within each
//! folder, so downstream label assignment is reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filename marker of original (uncorrected) instrument exports.
pub const ORIGINAL_SUFFIX: &str = "@_ORI.txt";

/// Extension of text exports.
pub const TEXT_EXTENSION: &str = "txt";

/// Extension of binary converter-tool dumps.
pub const BINARY_EXTENSION: &str = "bin";

/// Errors that can occur during file discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No file of the selected kind exists in any searched folder.
    #[error("no {kind} files found under {}", format_roots(.searched))]
    NoFilesFound {
        kind: FileKind,
        searched: Vec<PathBuf>,
    },
}

fn format_roots(roots: &[PathBuf]) -> String {
    let names: Vec<String> = roots.iter().map(|p| p.display().to_string()).collect();
    names.join(", ")
}

/// The closed set of measurement file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Original export: filename ends with the `@_ORI.txt` marker.
    Original,
    /// Corrected export: `.txt` file without the original marker.
    Corrected,
    /// Binary converter dump: `.bin` extension.
    Binary,
}

impl FileKind {
    /// Whether the given path's filename matches this kind.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        match self {
            FileKind::Original => name.ends_with(ORIGINAL_SUFFIX),
            FileKind::Corrected => {
                name.ends_with(&format!(".{}", TEXT_EXTENSION))
                    && !name.ends_with(ORIGINAL_SUFFIX)
            }
            FileKind::Binary => path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case(BINARY_EXTENSION))
                .unwrap_or(false),
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Original => write!(f, "original"),
            FileKind::Corrected => write!(f, "corrected"),
            FileKind::Binary => write!(f, "binary"),
        }
    }
}

/// One discovered measurement file, classified at discovery time.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// Folder name the file was found under, as configured.
    pub folder: String,
    /// Kind resolved from the filename.
    pub kind: FileKind,
}

/// Enumerates candidate files of one kind under the configured folders.
///
/// Folders are visited in the supplied order; within a folder filenames are
/// sorted lexicographically. A folder that is missing or holds no matching
/// files contributes nothing (logged, not fatal). Zero matches across every
/// folder is a `NoFilesFound` error naming the searched roots.
pub fn discover_files(
    base_path: &Path,
    folders: &[String],
    kind: FileKind,
) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
    let mut discovered = Vec::new();
    let mut searched = Vec::with_capacity(folders.len());

    for folder in folders {
        let folder_path = base_path.join(folder);
        searched.push(folder_path.clone());

        let entries = match fs::read_dir(&folder_path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read folder {}: {}", folder_path.display(), e);
                continue;
            }
        };

        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && kind.matches(path))
            .collect();

        // Sort by filename, not full path, so ordering is stable across
        // differently-spelled base paths.
        matches.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        if matches.is_empty() {
            warn!(
                "no {} files in folder {}",
                kind,
                folder_path.display()
            );
        }

        discovered.extend(matches.into_iter().map(|path| DiscoveredFile {
            path,
            folder: folder.clone(),
            kind,
        }));
    }

    if discovered.is_empty() {
        return Err(DiscoveryError::NoFilesFound { kind, searched });
    }

    Ok(discovered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "1.0 2.0").unwrap();
        path
    }

    #[test]
    fn test_classify_original() {
        assert!(FileKind::Original.matches(Path::new("board_a@_ORI.txt")));
        assert!(!FileKind::Original.matches(Path::new("board_a@.txt")));
        assert!(!FileKind::Original.matches(Path::new("board_a.bin")));
    }

    #[test]
    fn test_classify_corrected_excludes_original_marker() {
        assert!(FileKind::Corrected.matches(Path::new("board_a@.txt")));
        assert!(FileKind::Corrected.matches(Path::new("plain.txt")));
        assert!(!FileKind::Corrected.matches(Path::new("board_a@_ORI.txt")));
    }

    #[test]
    fn test_classify_binary() {
        assert!(FileKind::Binary.matches(Path::new("scan.bin")));
        assert!(FileKind::Binary.matches(Path::new("scan.BIN")));
        assert!(!FileKind::Binary.matches(Path::new("scan.txt")));
    }

    #[test]
    fn test_discover_sorted_within_folder() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("20250716");
        fs::create_dir_all(&folder).unwrap();
        create_file(&folder, "b@_ORI.txt");
        create_file(&folder, "a@_ORI.txt");
        create_file(&folder, "c@.txt"); // corrected, must not match

        let found = discover_files(
            temp_dir.path(),
            &["20250716".to_string()],
            FileKind::Original,
        )
        .unwrap();

        let names: Vec<&str> = found
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a@_ORI.txt", "b@_ORI.txt"]);
    }

    #[test]
    fn test_discover_folder_order_preserved() {
        let temp_dir = TempDir::new().unwrap();
        for folder in ["second", "first"] {
            let dir = temp_dir.path().join(folder);
            fs::create_dir_all(&dir).unwrap();
            create_file(&dir, "scan@_ORI.txt");
        }

        // Supplied order wins, not alphabetical order.
        let found = discover_files(
            temp_dir.path(),
            &["second".to_string(), "first".to_string()],
            FileKind::Original,
        )
        .unwrap();

        assert_eq!(found[0].folder, "second");
        assert_eq!(found[1].folder, "first");
    }

    #[test]
    fn test_discover_missing_folder_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("present");
        fs::create_dir_all(&folder).unwrap();
        create_file(&folder, "scan@_ORI.txt");

        let found = discover_files(
            temp_dir.path(),
            &["missing".to_string(), "present".to_string()],
            FileKind::Original,
        )
        .unwrap();

        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_discover_no_matches_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("empty");
        fs::create_dir_all(&folder).unwrap();

        let result = discover_files(temp_dir.path(), &["empty".to_string()], FileKind::Binary);

        match result {
            Err(DiscoveryError::NoFilesFound { kind, searched }) => {
                assert_eq!(kind, FileKind::Binary);
                assert_eq!(searched.len(), 1);
            }
            other => panic!("expected NoFilesFound, got {:?}", other),
        }
    }
}
