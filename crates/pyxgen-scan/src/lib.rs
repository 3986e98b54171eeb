//! Pyxgen import scanner
//!
//! Finds the top-level modules a Python file imports and reports the ones
//! the active Python environment cannot resolve. Resolution goes through a
//! [`ModuleProbe`], so tests and offline runs can swap the interpreter out.

pub mod error;
pub mod probe;
pub mod scanner;
pub mod stdlib;

pub use error::ProbeError;
pub use probe::{ModuleProbe, ModuleSpec, PythonProbe, StaticProbe};
pub use scanner::{import_roots, ImportRoot, ImportScanner, ImportSite};
