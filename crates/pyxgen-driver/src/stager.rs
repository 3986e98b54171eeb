//! Tree walker and stager
//!
//! Mirrors a source tree into the staging directory: every `.py` file is
//! annotated and written as `.pyx` under the same relative path, and its
//! original text is scanned for unresolved imports.

use std::fs;
use std::path::Path;

use pyxgen_annotate::Annotator;
use pyxgen_scan::{ImportScanner, ModuleProbe};
use tracing::{debug, info};

use crate::diagnostics;
use crate::error::StageError;
use crate::manifest::Manifest;
use crate::source::{AnnotatedFile, SourceTree};

pub struct Stager<A, P> {
    annotator: A,
    scanner: ImportScanner<P>,
    render_diagnostics: bool,
}

impl<A: Annotator, P: ModuleProbe> Stager<A, P> {
    pub fn new(annotator: A, scanner: ImportScanner<P>) -> Self {
        Self {
            annotator,
            scanner,
            render_diagnostics: false,
        }
    }

    /// Print a source-located warning for every unresolved import found.
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.render_diagnostics = enabled;
        self
    }

    pub fn scanner(&self) -> &ImportScanner<P> {
        &self.scanner
    }

    /// Stage every source file under `source_dir` into `output_dir`.
    ///
    /// Staged paths in the manifest are absolute even when `output_dir` is
    /// relative. The first read or write failure aborts the walk.
    pub fn stage(&self, source_dir: &Path, output_dir: &Path) -> Result<Manifest, StageError> {
        let output_dir = &std::path::absolute(output_dir).map_err(|source| StageError::Absolute {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let tree = SourceTree::discover(source_dir)?;
        let total = tree.len();
        info!("Scanning & annotating {} ({} files)", source_dir.display(), total);

        let mut manifest = Manifest::new();
        for (index, file) in tree.files().iter().enumerate() {
            let code = fs::read_to_string(&file.path).map_err(|source| StageError::Read {
                path: file.path.clone(),
                source,
            })?;

            let annotated = AnnotatedFile::new(&file.relative, self.annotator.annotate(&code));
            let staged = annotated.write_to(output_dir)?;

            let sites = self.scanner.scan_sites(&code);
            if self.render_diagnostics && !sites.is_empty() {
                diagnostics::report_unresolved(&file.relative, &code, &sites);
            }

            info!("[{}/{}] {}", index + 1, total, file.relative.display());
            debug!(staged = %staged.display(), unresolved = sites.len(), "staged file");

            manifest.record(staged, &file.relative, sites);
        }

        Ok(manifest)
    }
}
