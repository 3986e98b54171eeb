//! Error types for staging, building and packaging

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while walking the source tree or writing the staging area.
///
/// Any of these aborts the whole stage; no partial manifest is returned.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to list directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to resolve output directory {path}")]
    Absolute {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read source file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create staging directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write staged file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is outside of source directory {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// Failure of an external build tool.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to run {tool}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        tool: String,
        status: String,
        /// Last lines the tool wrote to stderr.
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr)
    }
}

/// Failure of a build or packaging run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("target '{0}' is neither a directory nor an importable package")]
    TargetNotFound(String),

    #[error("refusing to wipe {output}: it overlaps target {target}")]
    OutputOverlapsTarget { output: PathBuf, target: PathBuf },

    #[error("failed to prepare directory {path}")]
    PrepareDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("staging failed")]
    Stage(#[from] StageError),

    #[error("compilation failed")]
    Compile(#[source] BackendError),

    #[error("failed to scan {path} for compiled artifacts")]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {from} to {to}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("wheel build failed")]
    Package(#[source] BackendError),

    #[error("failed to read distribution directory {path}")]
    Dist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("wheel install failed")]
    Install(#[source] BackendError),
}
