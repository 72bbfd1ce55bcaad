//! File scanner for traversing TypeScript project directories.

use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of candidate source files.
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Recursively walks a directory tree collecting TypeScript source files.
///
/// Skips `node_modules`, build output directories and hidden directories.
/// Traversal order is sorted by file name so repeated runs over an unchanged
/// tree visit files in the same order.
///
/// # Example
///
/// ```no_run
/// use openapi_from_typescript::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./src/app/api"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} source files", result.source_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a directory scan.
pub struct ScanResult {
    /// Paths of all discovered `.ts`/`.tsx` files, in traversal order
    pub source_files: Vec<PathBuf>,
    /// Warning messages for inaccessible entries
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` rooted at the given directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all candidate source files.
    ///
    /// Inaccessible entries are recorded as warnings and skipped; the scan
    /// itself only fails if the root cannot be walked at all.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut source_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_ignored = matches!(file_name.as_ref(), "node_modules" | "dist" | "build");

                !is_hidden && !is_ignored
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && is_source_file(path) {
                        source_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            source_files,
            warnings,
        })
    }
}

/// Whether a path has one of the candidate source extensions.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Whether a path is a recognized route-handler file (`route.ts`/`route.tsx`).
pub fn is_route_file(path: &Path) -> bool {
    is_source_file(path)
        && path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map_or(false, |stem| stem == "route")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_collects_ts_and_tsx() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("route.ts"), "export const GET = 1;").unwrap();
        fs::write(root.join("page.tsx"), "export default 1;").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.source_files.len(), 2);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let scanner = FileScanner::new(temp_dir.path().to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.source_files.len(), 0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_nested_directories_in_stable_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("users/[id]")).unwrap();
        fs::create_dir_all(root.join("orders")).unwrap();
        fs::write(root.join("users/route.ts"), "").unwrap();
        fs::write(root.join("users/[id]/route.ts"), "").unwrap();
        fs::write(root.join("orders/route.ts"), "").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let first = scanner.scan().unwrap();
        let second = scanner.scan().unwrap();

        assert_eq!(first.source_files.len(), 3);
        assert_eq!(first.source_files, second.source_files);
        // sorted traversal: orders before users
        assert!(first.source_files[0].ends_with("orders/route.ts"));
    }

    #[test]
    fn test_scan_skips_node_modules_and_hidden() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/index.ts"), "").unwrap();
        fs::create_dir(root.join(".next")).unwrap();
        fs::write(root.join(".next/chunk.ts"), "").unwrap();
        fs::write(root.join("route.ts"), "").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.source_files.len(), 1);
        assert!(result.source_files[0].ends_with("route.ts"));
    }

    #[test]
    fn test_route_file_detection() {
        assert!(is_route_file(Path::new("/app/api/users/route.ts")));
        assert!(is_route_file(Path::new("/app/api/users/route.tsx")));
        assert!(!is_route_file(Path::new("/app/api/users/handler.ts")));
        assert!(!is_route_file(Path::new("/app/api/users/route.js")));
    }
}
