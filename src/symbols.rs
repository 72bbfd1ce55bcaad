//! Symbol table construction for one resolution pass.
//!
//! A table maps every declared interface, type alias, enum and exported
//! constant found under a scan root to its declaration. It is built fresh for
//! each top-level lookup (directory and parse results are cached in the
//! session, so rebuilding is cheap) and discarded when the pass ends.

use crate::parser::ParsedFile;
use crate::session::ResolutionSession;
use crate::syntax::{Decl, Item};
use log::debug;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// A named declaration located during a scan.
pub struct Symbol {
    pub file: Rc<ParsedFile>,
    /// Index of the declaring item within the file's module.
    pub index: usize,
}

impl Symbol {
    pub fn item(&self) -> &Item {
        &self.file.module.items[self.index]
    }

    pub fn decl(&self) -> &Decl {
        &self.item().decl
    }
}

/// Name → declaration mapping for a single resolution pass.
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    /// Builds a table from every source file under `root`. The first
    /// declaration of a name wins; later duplicates are ignored.
    pub fn build(root: &Path, session: &mut ResolutionSession) -> SymbolTable {
        let mut symbols = HashMap::new();
        let files = session.source_files(root);
        for path in files.iter() {
            let parsed = match session.parsed(path) {
                Some(parsed) => parsed,
                None => continue,
            };
            for (index, item) in parsed.module.items.iter().enumerate() {
                let record = match &item.decl {
                    Decl::Interface(_) | Decl::TypeAlias(_) | Decl::Enum(_) => true,
                    Decl::Const(_) => item.exported,
                    Decl::Function(_) => false,
                };
                if !record {
                    continue;
                }
                let name = item.decl.name().to_string();
                symbols.entry(name).or_insert(Symbol {
                    file: Rc::clone(&parsed),
                    index,
                });
            }
        }
        debug!(
            "Built symbol table with {} entries under {}",
            symbols.len(),
            root.display()
        );
        SymbolTable { symbols }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
