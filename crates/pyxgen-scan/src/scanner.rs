//! Line-based import scanning

use std::cell::Cell;
use std::collections::BTreeSet;
use std::ops::Range;

use tracing::{debug, warn};

use crate::probe::ModuleProbe;
use crate::stdlib::is_stdlib;

/// Root module named by one `import` / `from` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRoot<'a> {
    pub name: &'a str,
    /// 1-based line number.
    pub line: usize,
    /// Byte range of `name` within the scanned text.
    pub span: Range<usize>,
}

/// An import the environment could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    pub module: String,
    pub line: usize,
    pub span: Range<usize>,
}

/// Collect the root module of every import statement, in line order.
///
/// Only the first module token on a line counts. Bare keywords, relative
/// imports and tokens that do not start with an identifier are skipped.
pub fn import_roots(text: &str) -> Vec<ImportRoot<'_>> {
    let mut roots = Vec::new();
    let mut offset = 0;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        if let Some((start, name)) = root_in_line(raw) {
            roots.push(ImportRoot {
                name,
                line: index + 1,
                span: offset + start..offset + start + name.len(),
            });
        }
        offset += raw.len();
    }

    roots
}

/// Find the root module of an import line, with its byte offset in `line`.
fn root_in_line(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix("import")
        .or_else(|| trimmed.strip_prefix("from"))?;

    // `importlib = ...`, `fromage()` or a bare keyword
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let token = rest.trim_start();
    let root_len = token
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(token.len());
    let root = &token[..root_len];

    // Relative imports start with '.', which leaves the root empty
    if !starts_identifier(root) {
        return None;
    }

    let start = line.len() - token.len();
    Some((start, root))
}

fn starts_identifier(word: &str) -> bool {
    word.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
}

/// Reports imports that cannot be resolved in the probed environment.
pub struct ImportScanner<P> {
    probe: P,
    probe_failed: Cell<bool>,
}

impl<P: ModuleProbe> ImportScanner<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            probe_failed: Cell::new(false),
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Set of unresolved root module names in `text`.
    pub fn scan_imports(&self, text: &str) -> BTreeSet<String> {
        self.scan_sites(text)
            .into_iter()
            .map(|site| site.module)
            .collect()
    }

    /// Every unresolved import in `text` with its location.
    pub fn scan_sites(&self, text: &str) -> Vec<ImportSite> {
        import_roots(text)
            .into_iter()
            .filter(|root| !self.is_resolvable(root.name))
            .map(|root| ImportSite {
                module: root.name.to_string(),
                line: root.line,
                span: root.span,
            })
            .collect()
    }

    fn is_resolvable(&self, name: &str) -> bool {
        if is_stdlib(name) {
            return true;
        }

        match self.probe.is_resolvable(name) {
            Ok(found) => {
                debug!(module = name, found, "import resolution");
                found
            }
            Err(e) => {
                // Probe failures count as unresolved; warn once per scanner
                if !self.probe_failed.replace(true) {
                    warn!("module probe failed, treating imports as unresolved: {}", e);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{PythonProbe, StaticProbe};

    fn scanner() -> ImportScanner<StaticProbe> {
        ImportScanner::new(StaticProbe::new(["numpy", "requests"]))
    }

    #[test]
    fn test_unknown_module_reported() {
        let found = scanner().scan_imports("import definitely_not_installed_xyz\n");
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["definitely_not_installed_xyz".to_string()]
        );
    }

    #[test]
    fn test_standard_imports_resolve() {
        let src = "import os\nimport sys\nfrom collections import OrderedDict\nimport os.path\n";
        assert!(scanner().scan_imports(src).is_empty());
    }

    #[test]
    fn test_stdlib_needs_no_interpreter() {
        let scanner = ImportScanner::new(PythonProbe::new("pyxgen-no-such-interpreter-xyz"));
        assert!(scanner.scan_imports("import json\nfrom typing import Any\n").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_other_platform_modules_are_probed() {
        let scanner = ImportScanner::new(StaticProbe::default());
        let found = scanner.scan_imports("import msvcrt\nimport fcntl\nimport tomllib\n");
        assert_eq!(
            found.into_iter().collect::<Vec<_>>(),
            vec!["msvcrt".to_string(), "tomllib".to_string()]
        );
    }

    #[test]
    fn test_probe_failure_counts_as_unresolved() {
        let scanner = ImportScanner::new(PythonProbe::new("pyxgen-no-such-interpreter-xyz"));
        let found = scanner.scan_imports("import numpy\nimport pandas\n");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_dotted_and_from_forms_use_root() {
        let src = "from missing_pkg.sub import thing\nimport other_missing.deep.mod as m\nimport numpy.linalg\n";
        let found: Vec<String> = scanner().scan_imports(src).into_iter().collect();
        assert_eq!(found, vec!["missing_pkg".to_string(), "other_missing".to_string()]);
    }

    #[test]
    fn test_bare_and_relative_imports_ignored() {
        let src = "import\nimport   \nfrom . import sibling\nfrom ..parent import x\nfrom\n";
        assert!(import_roots(src).is_empty());
    }

    #[test]
    fn test_lookalike_lines_ignored() {
        let src = "importlib_thing = 1\nfromage = 'brie'\n# import nothing\n";
        assert!(import_roots(src).is_empty());
    }

    #[test]
    fn test_only_first_module_on_line() {
        let roots = import_roots("import foo, bar\n");
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "foo");
    }

    #[test]
    fn test_sites_carry_line_and_span() {
        let src = "import os\n    import ghost_mod\n";
        let sites = scanner().scan_sites(src);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].line, 2);
        assert_eq!(&src[sites[0].span.clone()], "ghost_mod");
    }

    #[test]
    fn test_duplicates_collapse_in_set() {
        let src = "import ghost\nfrom ghost import a\nimport ghost.b\n";
        assert_eq!(scanner().scan_sites(src).len(), 3);
        assert_eq!(scanner().scan_imports(src).len(), 1);
    }
}
