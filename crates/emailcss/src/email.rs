//! Email stylesheet batch
//!
//! Compiles the fixed set of email stylesheets of one staged theme. The batch
//! is best-effort: a missing source is skipped, a failed compile is recorded,
//! and either way the next stylesheet is still attempted.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use log::{Level, debug, log};

use crate::{
    compiler::{StylesheetCompiler, include_paths, verify_output},
    config::Config,
    error::CompileError,
    lessc::LesscCompiler,
    locator::CompilerHandle,
};

/// Email stylesheets compiled for every theme, in compile order
pub const EMAIL_STYLESHEETS: [&str; 3] = ["email.less", "email-inline.less", "email-fonts.less"];

/// Subdirectory holding stylesheets in both the staging and destination trees
const CSS_DIR: &str = "css";

/// What happened to one stylesheet
#[derive(Debug)]
pub enum CompileOutcome {
    /// CSS written and verified
    Compiled,
    /// The LESS source was not staged
    Skipped,
    Failed(CompileError),
}

impl CompileOutcome {
    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Compiled)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn error(&self) -> Option<&CompileError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome for a single stylesheet of the batch
#[derive(Debug)]
pub struct StylesheetReport {
    /// LESS file name, e.g. `email.less`
    pub name: &'static str,
    /// CSS file name, e.g. `email.css`
    pub css_name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: CompileOutcome,
}

/// Per-stylesheet outcomes in [`EMAIL_STYLESHEETS`] order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<StylesheetReport>,
}

impl BatchReport {
    pub fn compiled(&self) -> impl Iterator<Item = &StylesheetReport> {
        self.files.iter().filter(|file| file.outcome.is_compiled())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StylesheetReport> {
        self.files.iter().filter(|file| file.outcome.is_skipped())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&StylesheetReport, &CompileError)> {
        self.files
            .iter()
            .filter_map(|file| file.outcome.error().map(|err| (file, err)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    /// Report entry for `name`, if it is one of the batch's stylesheets
    pub fn get(&self, name: &str) -> Option<&StylesheetReport> {
        self.files.iter().find(|file| file.name == name)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            match &file.outcome {
                CompileOutcome::Compiled => {
                    writeln!(f, "compiled {} -> {CSS_DIR}/{}", file.name, file.css_name)?;
                }
                CompileOutcome::Skipped => writeln!(f, "skipped {} (not found)", file.name)?,
                CompileOutcome::Failed(err) => {
                    // Only the first line; captured compiler output can be long
                    let summary = err.to_string();
                    let summary = summary.lines().next().unwrap_or_default();
                    writeln!(f, "failed {}: {summary}", file.name)?;
                }
            }
        }
        Ok(())
    }
}

/// CSS file name for a LESS file name
pub fn css_file_name(less_name: &str) -> String {
    Path::new(less_name)
        .with_extension("css")
        .to_string_lossy()
        .into_owned()
}

/// Compiles the email stylesheets of staged themes with one compiler.
#[derive(Debug)]
pub struct EmailCssCompiler<C> {
    compiler: C,
    verbose: bool,
}

impl EmailCssCompiler<LesscCompiler> {
    /// Batch compiler backed by the `lessc` the handle resolved
    pub fn from_handle(handle: &CompilerHandle, config: &Config) -> Self {
        Self::new(LesscCompiler::from_handle(handle, config), handle.verbose())
    }
}

impl<C: StylesheetCompiler> EmailCssCompiler<C> {
    pub fn new(compiler: C, verbose: bool) -> Self {
        Self { compiler, verbose }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Compile every email stylesheet found under `staging_dir/css` into
    /// `dest_dir/css`.
    ///
    /// Never fails as a whole; inspect the returned report for per-file
    /// outcomes.
    pub fn compile_email_css(&self, staging_dir: &Path, dest_dir: &Path) -> BatchReport {
        let css_dir = dest_dir.join(CSS_DIR);
        let mut report = BatchReport::default();

        for name in EMAIL_STYLESHEETS {
            let source = staging_dir.join(CSS_DIR).join(name);
            let css_name = css_file_name(name);
            let destination = css_dir.join(&css_name);

            let outcome = if is_missing(&source) {
                log!(self.level(), "    ⊘ {name} not found");
                CompileOutcome::Skipped
            } else {
                // A failure here resurfaces as a compile or output error
                if let Err(e) = fs::create_dir_all(&css_dir) {
                    debug!("Failed to create {}: {e}", css_dir.display());
                }

                match self.compile_one(&source, &destination, staging_dir) {
                    Ok(()) => {
                        log!(self.level(), "    ✓ Compiled {name} → {CSS_DIR}/{css_name}");
                        CompileOutcome::Compiled
                    }
                    Err(err) => {
                        log!(self.failure_level(), "    ✗ Failed to compile {name}: {err}");
                        CompileOutcome::Failed(err)
                    }
                }
            };

            report.files.push(StylesheetReport {
                name,
                css_name,
                source,
                destination,
                outcome,
            });
        }

        report
    }

    /// Compile a single stylesheet and verify it produced a non-empty file.
    pub fn compile_one(
        &self,
        source: &Path,
        destination: &Path,
        staging_dir: &Path,
    ) -> Result<(), CompileError> {
        let include_paths = include_paths(staging_dir);
        self.compiler.compile(source, destination, &include_paths)?;
        verify_output(destination)
    }

    fn level(&self) -> Level {
        if self.verbose { Level::Info } else { Level::Debug }
    }

    fn failure_level(&self) -> Level {
        if self.verbose { Level::Warn } else { Level::Debug }
    }
}

/// Only a definite "not found" skips a stylesheet; other stat errors still
/// let the compiler have a go and report its own failure.
fn is_missing(source: &Path) -> bool {
    matches!(fs::metadata(source), Err(e) if e.kind() == io::ErrorKind::NotFound)
}
