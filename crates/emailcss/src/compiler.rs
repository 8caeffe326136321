//! The stylesheet compiler capability
//!
//! Anything able to turn one LESS file into one CSS file implements
//! [`StylesheetCompiler`]. The batch driver only talks to this trait, so the
//! process-backed [`crate::lessc::LesscCompiler`] can be swapped for an
//! in-memory fake in tests.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use crate::error::CompileError;

/// Compiles a single LESS source into a CSS file.
pub trait StylesheetCompiler: std::fmt::Debug {
    /// Compile `source` into `destination`, resolving imports from `include_paths`.
    ///
    /// Implementations report their own failures. Checking that `destination`
    /// was actually written is left to the caller.
    fn compile(
        &self,
        source: &Path,
        destination: &Path,
        include_paths: &[PathBuf],
    ) -> Result<(), CompileError>;
}

impl<C: StylesheetCompiler + ?Sized> StylesheetCompiler for &C {
    fn compile(
        &self,
        source: &Path,
        destination: &Path,
        include_paths: &[PathBuf],
    ) -> Result<(), CompileError> {
        (**self).compile(source, destination, include_paths)
    }
}

impl<C: StylesheetCompiler + ?Sized> StylesheetCompiler for Box<C> {
    fn compile(
        &self,
        source: &Path,
        destination: &Path,
        include_paths: &[PathBuf],
    ) -> Result<(), CompileError> {
        (**self).compile(source, destination, include_paths)
    }
}

/// Directories searched for `@import`s of a theme staged under `staging_dir`.
///
/// Order matters: the staging root first, then progressively deeper library
/// folders.
pub fn include_paths(staging_dir: &Path) -> Vec<PathBuf> {
    let css = staging_dir.join("css");
    let source = css.join("source");
    let lib = source.join("lib");
    vec![staging_dir.to_path_buf(), css, source, lib]
}

/// Join `paths` into a single `--include-path=` argument using the platform
/// path-list separator.
pub fn include_path_arg(paths: &[PathBuf]) -> Result<OsString, CompileError> {
    let joined = std::env::join_paths(paths)?;
    let mut arg = OsString::from("--include-path=");
    arg.push(joined);
    Ok(arg)
}

/// Confirm that a compile left a non-empty file at `destination`.
pub fn verify_output(destination: &Path) -> Result<(), CompileError> {
    let metadata = fs::metadata(destination).map_err(|source| CompileError::OutputMissing {
        path: destination.to_path_buf(),
        source,
    })?;

    if metadata.len() == 0 {
        return Err(CompileError::EmptyOutput {
            path: destination.to_path_buf(),
        });
    }

    Ok(())
}
