//! Build driver: wipe, stage, compile, relocate

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pyxgen_annotate::Annotator;
use pyxgen_scan::ModuleProbe;
use tracing::{debug, info, warn};

use crate::backend::{is_binary_artifact, BuildBackend, CompileOptions};
use crate::error::{BuildError, StageError};
use crate::source::collect_files;
use crate::stager::Stager;
use crate::target::resolve_target;

/// Default staging directory.
pub const DEFAULT_OUTPUT_DIR: &str = "build_lib";
/// Default root of the relocated library layout.
pub const DEFAULT_LIB_ROOT: &str = "lib";
/// Default Cython cache directory; never wiped by a build.
pub const DEFAULT_CACHE_DIR: &str = "cython_cache";

/// Everything one build needs to know.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source directory or installed package name.
    pub target: String,
    pub output_dir: PathBuf,
    pub lib_root: PathBuf,
    pub cache_dir: PathBuf,
    pub options: CompileOptions,
}

impl BuildConfig {
    pub fn new(target: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            output_dir: output_dir.into(),
            lib_root: PathBuf::from(DEFAULT_LIB_ROOT),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            options: CompileOptions::default(),
        }
    }

    pub fn with_lib_root(mut self, lib_root: impl Into<PathBuf>) -> Self {
        self.lib_root = lib_root.into();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }
}

/// A compiled artifact and where it ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub lib_dir: PathBuf,
    pub relocations: Vec<Relocation>,
}

/// Run a full build of `config.target`.
///
/// The staging directory is destroyed and recreated first. Staging or
/// compilation failure stops the build before the library directory is
/// touched; the first failed move stops relocation.
pub fn build<A, P, B>(
    config: &BuildConfig,
    stager: &Stager<A, P>,
    backend: &B,
) -> Result<BuildResult, BuildError>
where
    A: Annotator,
    P: ModuleProbe,
    B: BuildBackend + ?Sized,
{
    let target = resolve_target(&config.target, stager.scanner().probe())?;
    let lib_dir = config.lib_root.join(&target.name);
    ensure_disjoint(&config.output_dir, &target.source_dir)?;
    ensure_disjoint(&lib_dir, &target.source_dir)?;

    info!("Auto-Cythonizer: compiling {}", target.source_dir.display());

    // Phase 1: clean staging directory
    recreate_dir(&config.output_dir)?;

    // Phase 2: annotate into the staging directory
    let manifest = stager.stage(&target.source_dir, &config.output_dir)?;

    // Phase 3: unresolved imports are only a warning
    if manifest.has_unresolved() {
        let names: Vec<&str> = manifest
            .unresolved_modules
            .iter()
            .map(String::as_str)
            .collect();
        warn!("Missing modules detected: {}", names.join(", "));
    }

    // Phase 4-5: cythonize and build_ext
    let produced = backend
        .compile(&manifest.staged_paths, &config.options, &config.cache_dir)
        .map_err(BuildError::Compile)?;
    debug!("backend reported {} artifacts", produced.len());

    // Phase 6: clean library directory
    recreate_dir(&lib_dir)?;

    // Phase 7: move binaries into the library layout
    info!("Moving compiled .{} files into {}", crate::backend::BINARY_EXTENSION, lib_dir.display());
    let relocations = relocate_artifacts(&config.output_dir, &lib_dir)?;

    info!("Build complete! {} extension modules in {}", relocations.len(), lib_dir.display());
    Ok(BuildResult { lib_dir, relocations })
}

/// Remove `dir` if present and create it empty.
fn recreate_dir(dir: &Path) -> Result<(), BuildError> {
    let prepare_error = |source| BuildError::PrepareDir {
        path: dir.to_path_buf(),
        source,
    };

    if dir.exists() {
        fs::remove_dir_all(dir).map_err(prepare_error)?;
    }
    fs::create_dir_all(dir).map_err(prepare_error)
}

/// Refuse to wipe a directory that contains, or is, the sources.
fn ensure_disjoint(output_dir: &Path, source_dir: &Path) -> Result<(), BuildError> {
    let (Ok(output), Ok(source)) = (absolute(output_dir), absolute(source_dir)) else {
        return Ok(());
    };

    if source.starts_with(&output) {
        return Err(BuildError::OutputOverlapsTarget {
            output: output_dir.to_path_buf(),
            target: source_dir.to_path_buf(),
        });
    }
    Ok(())
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(full) => Ok(full),
        // Not created yet: anchor at the current directory
        Err(_) if path.is_relative() => Ok(std::env::current_dir()?.join(path)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Move every compiled artifact under `output_dir` to the same relative
/// location under `lib_dir`.
pub fn relocate_artifacts(output_dir: &Path, lib_dir: &Path) -> Result<Vec<Relocation>, BuildError> {
    let mut artifacts = Vec::new();
    collect_files(output_dir, &is_binary_artifact, &mut artifacts).map_err(|e| match e {
        StageError::ReadDir { path, source } => BuildError::Walk { path, source },
        other => BuildError::Stage(other),
    })?;

    let mut relocations = Vec::with_capacity(artifacts.len());
    for from in artifacts {
        let relative = from.strip_prefix(output_dir).map_err(|_| {
            BuildError::Stage(StageError::OutsideRoot {
                path: from.clone(),
                root: output_dir.to_path_buf(),
            })
        })?;
        let to = lib_dir.join(relative);

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::PrepareDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        move_file(&from, &to).map_err(|source| BuildError::Relocate {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;

        debug!("moved {} -> {}", from.display(), to.display());
        relocations.push(Relocation { from, to });
    }

    Ok(relocations)
}

/// Rename, falling back to copy + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BINARY_EXTENSION;

    #[test]
    fn test_relocation_mirrors_layout() {
        let out = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        fs::create_dir_all(out.path().join("b")).unwrap();
        let top = format!("a.{}", BINARY_EXTENSION);
        let nested = format!("b/c.{}", BINARY_EXTENSION);
        fs::write(out.path().join(&top), "bin").unwrap();
        fs::write(out.path().join(&nested), "bin").unwrap();
        fs::write(out.path().join("b/c.pyx"), "src").unwrap();

        let moved = relocate_artifacts(out.path(), lib.path()).unwrap();

        assert_eq!(moved.len(), 2);
        assert!(lib.path().join(&top).is_file());
        assert!(lib.path().join(&nested).is_file());
        assert!(!out.path().join(&top).exists());
        assert!(out.path().join("b/c.pyx").exists());
        assert!(!lib.path().join("b/c.pyx").exists());
    }

    #[test]
    fn test_recreate_dir_wipes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("stage");
        fs::create_dir_all(target.join("old")).unwrap();
        fs::write(target.join("old/file.pyx"), "").unwrap();

        recreate_dir(&target).unwrap();

        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_output_may_not_contain_sources() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("proj/src");
        fs::create_dir_all(&src).unwrap();

        assert!(ensure_disjoint(&dir.path().join("proj"), &src).is_err());
        assert!(ensure_disjoint(&src, &src).is_err());
        assert!(ensure_disjoint(&dir.path().join("build_lib"), &src).is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let config = BuildConfig::new("pkg", DEFAULT_OUTPUT_DIR);
        assert_eq!(config.output_dir, PathBuf::from("build_lib"));
        assert_eq!(config.lib_root, PathBuf::from("lib"));
        assert_eq!(config.cache_dir, PathBuf::from("cython_cache"));
        assert_eq!(config.options, CompileOptions::default());
    }
}
