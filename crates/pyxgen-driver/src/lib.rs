//! Pyxgen Driver Library
//!
//! Stages a Python source tree as annotated Cython files, compiles them
//! through an external backend and relocates the extension modules into a
//! `lib/<target>` layout. Optionally builds and installs a wheel afterwards.

pub mod backend;
pub mod build;
pub mod diagnostics;
pub mod error;
pub mod manifest;
pub mod package;
pub mod source;
pub mod stager;
pub mod target;

pub use backend::{BuildBackend, CompileOptions, CythonBackend, BINARY_EXTENSION};
pub use build::{build, BuildConfig, BuildResult, Relocation};
pub use error::{BackendError, BuildError, StageError};
pub use manifest::{Manifest, UnresolvedImport};
pub use package::{latest_artifact, package_and_install};
pub use source::{AnnotatedFile, SourceFile, SourceTree};
pub use stager::Stager;
pub use target::{resolve_target, ResolvedTarget};
