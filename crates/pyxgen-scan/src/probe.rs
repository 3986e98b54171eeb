//! Module probes: answer "can this environment import `name`?"

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::ProbeError;

/// Environment variable naming the Python interpreter to use.
pub const PYTHON_ENV: &str = "PYXGEN_PYTHON";

/// Interpreter used when [`PYTHON_ENV`] is unset.
pub fn default_interpreter() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}

/// Interpreter from the environment, falling back to [`default_interpreter`].
pub fn interpreter_from_env() -> String {
    std::env::var(PYTHON_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(default_interpreter)
}

/// What the environment knows about an importable module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    /// File the module loads from, if any (namespace packages have none).
    pub origin: Option<PathBuf>,
    /// Package directories; empty for plain modules.
    pub search_locations: Vec<PathBuf>,
}

impl ModuleSpec {
    /// Directory holding the package sources, if this module is a package.
    pub fn package_dir(&self) -> Option<&PathBuf> {
        self.search_locations.first()
    }
}

/// Resolves top-level module names against some Python environment.
pub trait ModuleProbe {
    /// Look up a module. `Ok(None)` means the module does not exist.
    fn find_spec(&self, name: &str) -> Result<Option<ModuleSpec>, ProbeError>;

    fn is_resolvable(&self, name: &str) -> Result<bool, ProbeError> {
        Ok(self.find_spec(name)?.is_some())
    }
}

impl<P: ModuleProbe + ?Sized> ModuleProbe for &P {
    fn find_spec(&self, name: &str) -> Result<Option<ModuleSpec>, ProbeError> {
        (**self).find_spec(name)
    }
}

impl<P: ModuleProbe + ?Sized> ModuleProbe for Box<P> {
    fn find_spec(&self, name: &str) -> Result<Option<ModuleSpec>, ProbeError> {
        (**self).find_spec(name)
    }
}

const FIND_SPEC_SCRIPT: &str = r#"import importlib.util, sys
try:
    spec = importlib.util.find_spec(sys.argv[1])
except Exception:
    spec = None
if spec is None:
    print("missing")
else:
    print("found")
    print(spec.origin or "")
    for location in (spec.submodule_search_locations or []):
        print(location)
"#;

/// Probe backed by a real Python interpreter.
///
/// Each distinct name costs one interpreter launch; answers are memoized for
/// the lifetime of the probe.
pub struct PythonProbe {
    interpreter: String,
    cache: RefCell<HashMap<String, Option<ModuleSpec>>>,
}

impl PythonProbe {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Probe using `PYXGEN_PYTHON` or the platform default interpreter.
    pub fn from_env() -> Self {
        Self::new(interpreter_from_env())
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn query(&self, name: &str) -> Result<Option<ModuleSpec>, ProbeError> {
        debug!(module = name, interpreter = %self.interpreter, "probing module");

        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(FIND_SPEC_SCRIPT)
            .arg(name)
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: self.interpreter.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Interpreter {
                program: self.interpreter.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_output(name, &String::from_utf8_lossy(&output.stdout))
    }
}

impl ModuleProbe for PythonProbe {
    fn find_spec(&self, name: &str) -> Result<Option<ModuleSpec>, ProbeError> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(cached.clone());
        }

        let spec = self.query(name)?;
        self.cache
            .borrow_mut()
            .insert(name.to_string(), spec.clone());
        Ok(spec)
    }
}

/// Parse the line protocol printed by [`FIND_SPEC_SCRIPT`].
fn parse_probe_output(name: &str, stdout: &str) -> Result<Option<ModuleSpec>, ProbeError> {
    let mut lines = stdout.lines().map(str::trim_end);

    match lines.next() {
        Some("missing") => Ok(None),
        Some("found") => {
            let origin = lines
                .next()
                .filter(|line| !line.is_empty())
                .map(PathBuf::from);
            let search_locations = lines
                .filter(|line| !line.is_empty())
                .map(PathBuf::from)
                .collect();
            Ok(Some(ModuleSpec {
                name: name.to_string(),
                origin,
                search_locations,
            }))
        }
        _ => Err(ProbeError::Output {
            module: name.to_string(),
            output: stdout.to_string(),
        }),
    }
}

/// In-memory probe with a fixed set of importable names.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    modules: HashSet<String>,
    packages: HashMap<String, PathBuf>,
}

impl StaticProbe {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: modules.into_iter().map(Into::into).collect(),
            packages: HashMap::new(),
        }
    }

    /// Register an importable package living in `dir`.
    pub fn with_package(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        self.modules.insert(name.clone());
        self.packages.insert(name, dir.into());
        self
    }
}

impl ModuleProbe for StaticProbe {
    fn find_spec(&self, name: &str) -> Result<Option<ModuleSpec>, ProbeError> {
        if !self.modules.contains(name) {
            return Ok(None);
        }

        let search_locations = self.packages.get(name).cloned().into_iter().collect::<Vec<_>>();
        Ok(Some(ModuleSpec {
            name: name.to_string(),
            origin: search_locations.first().map(|dir| dir.join("__init__.py")),
            search_locations,
        }))
    }
}
