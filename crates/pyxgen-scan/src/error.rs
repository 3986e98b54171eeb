//! Errors raised while probing the Python environment

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The interpreter could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The interpreter ran but exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Interpreter {
        program: String,
        status: String,
        stderr: String,
    },

    /// The interpreter printed something the probe does not understand.
    #[error("unexpected probe output for module '{module}': {output:?}")]
    Output { module: String, output: String },
}
