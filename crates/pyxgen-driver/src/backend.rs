//! External build tools
//!
//! The pipeline never compiles anything itself. Cython, the wheel builder and
//! pip sit behind [`BuildBackend`] so they can be replaced in tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pyxgen_scan::probe::interpreter_from_env;
use tracing::{debug, info};

use crate::error::BackendError;

/// Number of stderr lines kept when a tool fails.
const STDERR_TAIL_LINES: usize = 20;

/// Extension of compiled extension modules on this platform.
pub const BINARY_EXTENSION: &str = if cfg!(windows) { "pyd" } else { "so" };

/// Check if a path names a compiled extension module.
pub fn is_binary_artifact(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == BINARY_EXTENSION)
}

/// Cython compiler directives and cache switch.
///
/// Every build uses [`CompileOptions::default`]; the fields exist so the
/// backend can render them, not to be tuned per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub boundscheck: bool,
    pub wraparound: bool,
    pub nonecheck: bool,
    pub cdivision: bool,
    pub language_level: u8,
    pub cache: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            boundscheck: false,
            wraparound: false,
            nonecheck: false,
            cdivision: true,
            language_level: 3,
            cache: true,
        }
    }
}

impl CompileOptions {
    /// Directives as a Python dict literal.
    pub fn directives_literal(&self) -> String {
        format!(
            "{{'boundscheck': {}, 'wraparound': {}, 'nonecheck': {}, 'cdivision': {}, 'language_level': {}}}",
            py_bool(self.boundscheck),
            py_bool(self.wraparound),
            py_bool(self.nonecheck),
            py_bool(self.cdivision),
            self.language_level,
        )
    }
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Compiler, packager and installer used by the build and packaging drivers.
pub trait BuildBackend {
    /// Compile staged files into extension modules next to them, using
    /// `cache_dir` for incremental builds. Returns the artifacts produced.
    fn compile(
        &self,
        files: &[PathBuf],
        options: &CompileOptions,
        cache_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError>;

    /// Build a distributable wheel into `dist_dir`.
    fn package(&self, dist_dir: &Path) -> Result<(), BackendError>;

    /// Install a previously built artifact.
    fn install(&self, artifact: &Path) -> Result<(), BackendError>;
}

impl<B: BuildBackend + ?Sized> BuildBackend for &B {
    fn compile(
        &self,
        files: &[PathBuf],
        options: &CompileOptions,
        cache_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        (**self).compile(files, options, cache_dir)
    }

    fn package(&self, dist_dir: &Path) -> Result<(), BackendError> {
        (**self).package(dist_dir)
    }

    fn install(&self, artifact: &Path) -> Result<(), BackendError> {
        (**self).install(artifact)
    }
}

/// Backend driving Cython, setuptools, `build` and pip through one interpreter.
pub struct CythonBackend {
    python: String,
}

impl CythonBackend {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Backend using `PYXGEN_PYTHON` or the platform default interpreter.
    pub fn from_env() -> Self {
        Self::new(interpreter_from_env())
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    /// Script run with `python -c`: argv[1] is the cache dir, the rest are
    /// the staged files.
    fn compile_script(options: &CompileOptions) -> String {
        format!(
            r#"import sys
from Cython.Build import cythonize
from setuptools import setup

cache_dir = sys.argv[1]
ext_modules = cythonize(
    sys.argv[2:],
    compiler_directives={directives},
    build_dir=cache_dir,
    cache={cache},
)
setup(script_args=["build_ext", "--inplace"], ext_modules=ext_modules)
"#,
            directives = options.directives_literal(),
            cache = py_bool(options.cache),
        )
    }

    /// Run a tool with stdout passed through and stderr captured.
    fn run(&self, tool: &str, cmd: &mut Command) -> Result<(), BackendError> {
        debug!("running {:?}", cmd);

        let output = cmd
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| BackendError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            if !stderr.trim().is_empty() {
                debug!("{} stderr:\n{}", tool, stderr.trim_end());
            }
            Ok(())
        } else {
            Err(BackendError::Failed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr: tail_lines(&stderr, STDERR_TAIL_LINES),
            })
        }
    }
}

impl BuildBackend for CythonBackend {
    fn compile(
        &self,
        files: &[PathBuf],
        options: &CompileOptions,
        cache_dir: &Path,
    ) -> Result<Vec<PathBuf>, BackendError> {
        if files.is_empty() {
            info!("No staged files, skipping cythonize");
            return Ok(Vec::new());
        }

        info!(
            "Compiling {} .pyx files into .{} (cache: {})",
            files.len(),
            BINARY_EXTENSION,
            cache_dir.display()
        );

        self.run(
            "cythonize",
            Command::new(&self.python)
                .arg("-c")
                .arg(Self::compile_script(options))
                .arg(cache_dir)
                .args(files),
        )?;

        Ok(artifacts_beside(files))
    }

    fn package(&self, dist_dir: &Path) -> Result<(), BackendError> {
        info!("Building wheel...");
        self.run(
            "python -m build",
            Command::new(&self.python)
                .args(["-m", "build", "--wheel", "--outdir"])
                .arg(dist_dir),
        )
    }

    fn install(&self, artifact: &Path) -> Result<(), BackendError> {
        info!("Installing {} via pip...", artifact.display());
        self.run(
            "pip install",
            Command::new(&self.python)
                .args(["-m", "pip", "install", "--upgrade"])
                .arg(artifact),
        )
    }
}

/// Last `count` lines of `text`, ignoring trailing blank lines.
fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Extension modules `build_ext --inplace` left next to the staged files.
///
/// A module `pkg/m.pyx` builds to `pkg/m.<abi tag>.so` or plain `pkg/m.so`.
fn artifacts_beside(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut artifacts = Vec::new();

    for file in files {
        let (Some(dir), Some(stem)) = (file.parent(), file.file_stem()) else {
            continue;
        };
        let prefix = format!("{}.", stem.to_string_lossy());

        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            if is_binary_artifact(&path) && name.to_string_lossy().starts_with(&prefix) {
                artifacts.push(path);
            }
        }
    }

    artifacts.sort();
    artifacts.dedup();
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(
            CompileOptions::default().directives_literal(),
            "{'boundscheck': False, 'wraparound': False, 'nonecheck': False, 'cdivision': True, 'language_level': 3}"
        );
    }

    #[test]
    fn test_compile_script_embeds_options() {
        let script = CythonBackend::compile_script(&CompileOptions::default());
        assert!(script.contains("'cdivision': True"));
        assert!(script.contains("cache=True"));
        assert!(script.contains(r#"setup(script_args=["build_ext", "--inplace"]"#));
    }

    #[test]
    fn test_artifacts_beside_matches_stem() {
        let dir = tempfile::tempdir().unwrap();
        let staged = dir.path().join("mod.pyx");
        fs::write(&staged, "").unwrap();
        let tagged = dir.path().join(format!("mod.cpython-311-x86_64-linux-gnu.{}", BINARY_EXTENSION));
        fs::write(&tagged, "").unwrap();
        fs::write(dir.path().join(format!("model.{}", BINARY_EXTENSION)), "").unwrap();
        fs::write(dir.path().join("mod.c"), "").unwrap();

        assert_eq!(artifacts_beside(&[staged]), vec![tagged]);
    }

    #[test]
    fn test_missing_interpreter_reports_spawn() {
        let backend = CythonBackend::new("pyxgen-no-such-interpreter-xyz");
        let err = backend
            .compile(&[PathBuf::from("a.pyx")], &CompileOptions::default(), Path::new("cache"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let text = "one\ntwo\nthree\nfour\n\n";
        assert_eq!(tail_lines(text, 2), "three\nfour");
        assert_eq!(tail_lines(text, 10), "one\ntwo\nthree\nfour");
        assert_eq!(tail_lines("", 3), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_carries_stderr_tail() {
        let backend = CythonBackend::new("sh");
        let err = backend
            .run(
                "sh",
                Command::new("sh").args(["-c", "echo early >&2; echo 'Error compiling m.pyx' >&2; exit 3"]),
            )
            .unwrap_err();

        match err {
            BackendError::Failed { tool, status, stderr } => {
                assert_eq!(tool, "sh");
                assert!(status.contains('3'));
                assert_eq!(stderr, "early\nError compiling m.pyx");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_compile_nothing_is_noop() {
        let backend = CythonBackend::new("pyxgen-no-such-interpreter-xyz");
        let artifacts = backend
            .compile(&[], &CompileOptions::default(), Path::new("cache"))
            .unwrap();
        assert!(artifacts.is_empty());
    }
}
