//! Result of one staging pass

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pyxgen_scan::ImportSite;

/// An import the environment could not resolve, located in its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedImport {
    /// Source file path relative to the target directory.
    pub file: PathBuf,
    pub module: String,
    pub line: usize,
}

/// Staged files and unresolved modules gathered by a single walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Written `.pyx` paths, in walk order.
    pub staged_paths: Vec<PathBuf>,
    pub unresolved_modules: BTreeSet<String>,
    pub unresolved_imports: Vec<UnresolvedImport>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one staged file and the unresolved imports of its source.
    pub fn record(&mut self, staged: PathBuf, source: &Path, sites: Vec<ImportSite>) {
        self.staged_paths.push(staged);
        for site in sites {
            self.unresolved_modules.insert(site.module.clone());
            self.unresolved_imports.push(UnresolvedImport {
                file: source.to_path_buf(),
                module: site.module,
                line: site.line,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.staged_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged_paths.is_empty()
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved_modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(module: &str, line: usize) -> ImportSite {
        ImportSite {
            module: module.to_string(),
            line,
            span: 0..module.len(),
        }
    }

    #[test]
    fn test_record_merges_modules() {
        let mut manifest = Manifest::new();
        manifest.record(PathBuf::from("out/a.pyx"), Path::new("a.py"), vec![site("ghost", 1)]);
        manifest.record(
            PathBuf::from("out/b/c.pyx"),
            Path::new("b/c.py"),
            vec![site("ghost", 3), site("phantom", 4)],
        );
        manifest.record(PathBuf::from("out/d.pyx"), Path::new("d.py"), Vec::new());

        assert_eq!(manifest.len(), 3);
        assert_eq!(
            manifest.staged_paths,
            vec![
                PathBuf::from("out/a.pyx"),
                PathBuf::from("out/b/c.pyx"),
                PathBuf::from("out/d.pyx"),
            ]
        );
        assert_eq!(
            manifest.unresolved_modules.iter().collect::<Vec<_>>(),
            vec!["ghost", "phantom"]
        );
        assert_eq!(manifest.unresolved_imports.len(), 3);
        assert_eq!(manifest.unresolved_imports[1].file, PathBuf::from("b/c.py"));
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::new();
        assert!(manifest.is_empty());
        assert!(!manifest.has_unresolved());
    }
}
