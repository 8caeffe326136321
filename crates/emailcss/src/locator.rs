//! Locating the external LESS compiler
//!
//! The compiler is resolved exactly once, when the [`CompilerHandle`] is built.
//! Every later invocation reuses that path without looking it up again.

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use log::debug;

use crate::error::ToolNotFoundError;

/// Program name searched for when no other compiler is configured
pub const DEFAULT_COMPILER: &str = "lessc";

/// Resolved compiler executable plus the settings the run was started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerHandle {
    executable: PathBuf,
    root: PathBuf,
    verbose: bool,
}

impl CompilerHandle {
    /// Locate `lessc` in the process `PATH`
    pub fn locate(root: impl Into<PathBuf>, verbose: bool) -> Result<Self, ToolNotFoundError> {
        Self::locate_program(DEFAULT_COMPILER, root, verbose)
    }

    /// Locate `program` in the process `PATH`
    pub fn locate_program(
        program: &str,
        root: impl Into<PathBuf>,
        verbose: bool,
    ) -> Result<Self, ToolNotFoundError> {
        let search_path = std::env::var_os("PATH");
        Self::locate_with_search_path(program, search_path.as_deref(), root, verbose)
    }

    /// Locate `program` in an explicit search path instead of the process `PATH`
    pub fn locate_with_search_path(
        program: &str,
        search_path: Option<&OsStr>,
        root: impl Into<PathBuf>,
        verbose: bool,
    ) -> Result<Self, ToolNotFoundError> {
        let executable =
            find_executable(program, search_path).ok_or_else(|| ToolNotFoundError {
                program: program.to_owned(),
            })?;
        debug!("Using {program} at {}", executable.display());

        Ok(Self {
            executable,
            root: root.into(),
            verbose,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Root directory of the theme installation this run works against
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Find `program` in `search_path`.
///
/// A program given with a directory component is checked as-is; a bare name
/// is tried in every search path entry in order, first match wins.
fn find_executable(program: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let program_path = Path::new(program);
    if program_path.components().count() > 1 {
        return candidates(program_path)
            .into_iter()
            .find(|candidate| is_executable(candidate));
    }

    let search_path = search_path?;
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir.join(program_path)))
        .find(|candidate| is_executable(candidate))
}

/// Names a program may be installed under.
///
/// npm installs `lessc.cmd` on Windows, so the `PATHEXT` extensions are tried
/// after the bare name there.
fn candidates(base: &Path) -> Vec<PathBuf> {
    let mut names = vec![base.to_path_buf()];
    if cfg!(windows) && base.extension().is_none() {
        let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".into());
        for ext in pathext.split(';').filter(|ext| !ext.is_empty()) {
            let mut name = OsString::from(base.as_os_str());
            name.push(ext.to_ascii_lowercase());
            names.push(PathBuf::from(name));
        }
    }
    names
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.metadata().is_ok_and(|meta| meta.is_file())
}
