//! Error types for compiler lookup and per-stylesheet compilation
//!
//! `ToolNotFoundError` is fatal: without a compiler nothing else can run.
//! `CompileError` describes a single stylesheet and is recorded in the batch
//! report instead of aborting the batch.

use std::{
    env::JoinPathsError,
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

/// Remediation shown when `lessc` cannot be found.
pub const INSTALL_HINT: &str = "npm install -g less";

/// The compiler executable could not be located.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{program} {}. Install with: {}", lookup_failure(.program), INSTALL_HINT)]
pub struct ToolNotFoundError {
    /// Program name (or path) that was searched for
    pub program: String,
}

/// A bare name is searched for in `PATH`; anything with a directory is
/// checked in place.
fn lookup_failure(program: &str) -> &'static str {
    if Path::new(program).components().count() > 1 {
        "not found or not executable"
    } else {
        "not found in PATH"
    }
}

/// How a compiler process ended when it did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The process could not be spawned or waited on
    NotStarted(String),
    /// The process exited with a non-zero code
    Exited(i32),
    /// The process was terminated without an exit code (e.g. by a signal)
    Terminated,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted(reason) => write!(f, "could not be started ({reason})"),
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Terminated => write!(f, "was terminated without an exit code"),
        }
    }
}

/// Failure to produce one stylesheet
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler could not be started or did not exit successfully
    #[error("{program} {status}\nOutput: {output}")]
    ProcessExecution {
        program: String,
        status: ProcessStatus,
        /// Combined stdout and stderr of the invocation
        output: String,
    },

    /// The compiler ran longer than the configured timeout and was killed
    #[error("{program} did not finish within {}s and was killed\nOutput: {output}", .timeout.as_secs())]
    Timeout {
        program: String,
        timeout: Duration,
        output: String,
    },

    /// The compiler reported success but left no output file behind
    #[error("output file not created: {}", .path.display())]
    OutputMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output file exists but has zero length
    #[error("output file is empty: {}", .path.display())]
    EmptyOutput { path: PathBuf },

    /// An include directory contains the platform path-list separator
    #[error("include paths cannot be joined into a single search path")]
    InvalidIncludePath(#[from] JoinPathsError),
}

impl CompileError {
    /// Captured compiler output, when the failure came from the process itself
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::ProcessExecution { output, .. } | Self::Timeout { output, .. } => Some(output),
            _ => None,
        }
    }
}
