//! Per-run resolution state shared by the resolvers and the route collector.
//!
//! A `ResolutionSession` is constructed fresh for every generation run and
//! dropped afterwards; it owns every cache the run needs, so no state leaks
//! across runs. The session assumes the scanned tree does not change during
//! the run: cache entries are written once and never invalidated.

use crate::parser::{ParsedFile, SourceParser};
use crate::scanner::FileScanner;
use crate::schema::NormalizedSchema;
use indexmap::IndexMap;
use log::error;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Run-scoped caches: the shared schema table, the cycle-detection sets for
/// both resolvers, directory listings, parsed files and the processed
/// route-file set.
#[derive(Default)]
pub struct ResolutionSession {
    /// Resolved name → schema, in first-resolution order. Becomes the
    /// document's `components.schemas` table.
    schemas: IndexMap<String, NormalizedSchema>,
    /// Names currently being resolved as structural types.
    in_progress_types: HashSet<String>,
    /// Names currently being resolved as builder schemas.
    in_progress_builders: HashSet<String>,
    /// Scan root → discovered source files.
    dir_listings: HashMap<PathBuf, Rc<Vec<PathBuf>>>,
    /// Source path → parse result. `None` records a failed read so the
    /// failure is only reported once.
    parsed_files: HashMap<PathBuf, Option<Rc<ParsedFile>>>,
    /// Route files already handled by the collector.
    processed_routes: HashSet<PathBuf>,
}

impl ResolutionSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- schema cache --------------------------------------------------

    pub fn schema(&self, name: &str) -> Option<&NormalizedSchema> {
        self.schemas.get(name)
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// First resolution wins; later writes for the same name are ignored.
    pub fn register_schema(&mut self, name: &str, schema: NormalizedSchema) {
        self.schemas.entry(name.to_string()).or_insert(schema);
    }

    pub fn schemas(&self) -> &IndexMap<String, NormalizedSchema> {
        &self.schemas
    }

    pub fn into_schemas(self) -> IndexMap<String, NormalizedSchema> {
        self.schemas
    }

    // ---- cycle detection -----------------------------------------------

    pub fn type_in_progress(&self, name: &str) -> bool {
        self.in_progress_types.contains(name)
    }

    pub fn begin_type(&mut self, name: &str) {
        self.in_progress_types.insert(name.to_string());
    }

    pub fn finish_type(&mut self, name: &str) {
        self.in_progress_types.remove(name);
    }

    pub fn builder_in_progress(&self, name: &str) -> bool {
        self.in_progress_builders.contains(name)
    }

    pub fn begin_builder(&mut self, name: &str) {
        self.in_progress_builders.insert(name.to_string());
    }

    pub fn finish_builder(&mut self, name: &str) {
        self.in_progress_builders.remove(name);
    }

    // ---- file caches ---------------------------------------------------

    /// The source files under a scan root, scanned at most once per run.
    pub fn source_files(&mut self, root: &Path) -> Rc<Vec<PathBuf>> {
        if let Some(cached) = self.dir_listings.get(root) {
            return Rc::clone(cached);
        }
        let files = match FileScanner::new(root.to_path_buf()).scan() {
            Ok(result) => result.source_files,
            Err(e) => {
                error!("Failed to scan {}: {}", root.display(), e);
                Vec::new()
            }
        };
        let files = Rc::new(files);
        self.dir_listings
            .insert(root.to_path_buf(), Rc::clone(&files));
        files
    }

    /// The parsed form of a source file, parsed at most once per run.
    /// Unreadable files are reported once at error level and skipped.
    pub fn parsed(&mut self, path: &Path) -> Option<Rc<ParsedFile>> {
        if let Some(cached) = self.parsed_files.get(path) {
            return cached.clone();
        }
        let parsed = match SourceParser::parse_file(path) {
            Ok(parsed) => Some(Rc::new(parsed)),
            Err(e) => {
                error!("Skipping {}: {}", path.display(), e);
                None
            }
        };
        self.parsed_files.insert(path.to_path_buf(), parsed.clone());
        parsed
    }

    // ---- route bookkeeping ---------------------------------------------

    /// Marks a route file as processed; returns `false` if it already was.
    pub fn mark_route_processed(&mut self, path: &Path) -> bool {
        self.processed_routes.insert(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn first_schema_registration_wins() {
        let mut session = ResolutionSession::new();
        session.register_schema("User", NormalizedSchema::string());
        session.register_schema("User", NormalizedSchema::number());

        assert_eq!(session.schema("User"), Some(&NormalizedSchema::string()));
    }

    #[test]
    fn schemas_keep_registration_order() {
        let mut session = ResolutionSession::new();
        session.register_schema("Zed", NormalizedSchema::string());
        session.register_schema("Alpha", NormalizedSchema::string());

        let names: Vec<_> = session.schemas().keys().cloned().collect();
        assert_eq!(names, vec!["Zed", "Alpha"]);
    }

    #[test]
    fn directory_listing_is_cached() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.ts"), "").unwrap();

        let mut session = ResolutionSession::new();
        let first = session.source_files(temp_dir.path());
        // a file added mid-run is invisible: the tree is assumed static
        fs::write(temp_dir.path().join("b.ts"), "").unwrap();
        let second = session.source_files(temp_dir.path());

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn parse_failures_are_recorded_once() {
        let mut session = ResolutionSession::new();
        let missing = PathBuf::from("/nonexistent/file.ts");

        assert!(session.parsed(&missing).is_none());
        assert!(session.parsed(&missing).is_none());
    }

    #[test]
    fn route_processing_is_idempotent() {
        let mut session = ResolutionSession::new();
        let path = Path::new("/app/api/users/route.ts");

        assert!(session.mark_route_processed(path));
        assert!(!session.mark_route_processed(path));
    }
}
