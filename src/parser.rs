//! Source-file parsing for TypeScript route and schema files.
//!
//! The `SourceParser` turns a file's text into the bounded syntax tree defined
//! in [`crate::syntax`], which the resolvers then interpret. Parsing is
//! recovery-oriented: declarations outside the recognized subset are skipped
//! rather than failing the file, so one odd construct never costs the rest of
//! the file's declarations.
//!
//! # Example
//!
//! ```no_run
//! use openapi_from_typescript::parser::SourceParser;
//! use std::path::Path;
//!
//! let parsed = SourceParser::parse_file(Path::new("src/app/api/users/route.ts")).unwrap();
//! println!("Parsed {} declarations", parsed.module.items.len());
//! ```

use crate::syntax::{parse_module, SourceModule};
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parser entry points for single files and batches.
pub struct SourceParser;

/// A successfully parsed source file with its syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed declarations
    pub module: SourceModule,
}

impl SourceParser {
    /// Parses a single source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read. Syntactic constructs the
    /// subset grammar does not recognize are skipped, not reported.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let module = parse_module(&content);

        debug!(
            "Parsed {} declarations from {}",
            module.items.len(),
            path.display()
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            module,
        })
    }

    /// Parses source text directly, for callers that already hold the content.
    pub fn parse_source(path: &Path, content: &str) -> ParsedFile {
        ParsedFile {
            path: path.to_path_buf(),
            module: parse_module(content),
        }
    }

    /// Parses multiple files, continuing past unreadable ones.
    ///
    /// Unreadable files are logged as warnings and reported as `Err` entries;
    /// scanning callers drop them and keep going, so partial documentation can
    /// still be generated.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_parse_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
            export interface User {
                id: number;
                name: string;
            }

            export async function GET(req: Request) {
                return null;
            }
        "#;

        let file_path = create_temp_file(&temp_dir, "route.ts", code);
        let result = SourceParser::parse_file(&file_path);

        assert!(result.is_ok());
        let parsed = result.unwrap();
        assert_eq!(parsed.path, file_path);
        assert_eq!(parsed.module.items.len(), 2);
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = SourceParser::parse_file(Path::new("/nonexistent/route.ts"));

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read file"));
    }

    #[test]
    fn test_parse_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_temp_file(&temp_dir, "empty.ts", "");
        let result = SourceParser::parse_file(&file_path);

        assert!(result.is_ok());
        assert!(result.unwrap().module.items.is_empty());
    }

    #[test]
    fn test_unrecognized_constructs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
            const handler = withMiddleware(async () => {});
            export interface Kept { id: number }
            class Widget { render() {} }
        "#;

        let file_path = create_temp_file(&temp_dir, "mixed.ts", code);
        let parsed = SourceParser::parse_file(&file_path).unwrap();

        let names: Vec<_> = parsed
            .module
            .items
            .iter()
            .map(|i| i.decl.name().to_string())
            .collect();
        assert!(names.contains(&"Kept".to_string()));
    }

    #[test]
    fn test_parse_files_batch() {
        let temp_dir = TempDir::new().unwrap();

        let file1 = create_temp_file(&temp_dir, "a.ts", "export const a = 1;");
        let file2 = create_temp_file(&temp_dir, "b.ts", "export const b = 2;");
        let missing = temp_dir.path().join("missing.ts");

        let paths = vec![file1.clone(), file2, missing];
        let results = SourceParser::parse_files(&paths);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());
        assert_eq!(results[0].as_ref().unwrap().path, file1);
    }
}
