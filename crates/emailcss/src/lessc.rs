//! Process-backed compiler that shells out to `lessc`

use std::{
    path::{Path, PathBuf},
    process::Command,
    time::Duration,
};

use log::trace;

use crate::{
    compiler::{StylesheetCompiler, include_path_arg},
    config::Config,
    error::{CompileError, ProcessStatus},
    locator::CompilerHandle,
    process,
};

/// Flag asking `lessc` for minified output
const COMPRESS_FLAG: &str = "--compress";

/// Invokes an installed `lessc` once per stylesheet.
#[derive(Debug, Clone)]
pub struct LesscCompiler {
    executable: PathBuf,
    compress: bool,
    timeout: Option<Duration>,
}

impl LesscCompiler {
    /// Compiler with minified output and no timeout
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            compress: true,
            timeout: None,
        }
    }

    /// Compiler for an already located executable, configured from `config`
    pub fn from_handle(handle: &CompilerHandle, config: &Config) -> Self {
        Self::new(handle.executable())
            .with_compress(config.compress)
            .with_timeout(config.timeout())
    }

    #[must_use]
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn program_name(&self) -> String {
        self.executable.display().to_string()
    }

    fn command(
        &self,
        source: &Path,
        destination: &Path,
        include_paths: &[PathBuf],
    ) -> Result<Command, CompileError> {
        let mut command = Command::new(&self.executable);
        command
            .arg(source)
            .arg(destination)
            .arg(include_path_arg(include_paths)?);
        if self.compress {
            command.arg(COMPRESS_FLAG);
        }
        Ok(command)
    }
}

impl StylesheetCompiler for LesscCompiler {
    fn compile(
        &self,
        source: &Path,
        destination: &Path,
        include_paths: &[PathBuf],
    ) -> Result<(), CompileError> {
        let mut command = self.command(source, destination, include_paths)?;

        let finished = process::run(&mut command, self.timeout).map_err(|e| {
            CompileError::ProcessExecution {
                program: self.program_name(),
                status: ProcessStatus::NotStarted(e.to_string()),
                output: String::new(),
            }
        })?;
        trace!("lessc output for {}: {}", source.display(), finished.output);

        let Some(status) = finished.status else {
            return Err(CompileError::Timeout {
                program: self.program_name(),
                timeout: self.timeout.unwrap_or_default(),
                output: finished.output,
            });
        };

        if !status.success() {
            let status = status
                .code()
                .map_or(ProcessStatus::Terminated, ProcessStatus::Exited);
            return Err(CompileError::ProcessExecution {
                program: self.program_name(),
                status,
                output: finished.output,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::compiler::include_paths;

    fn args(command: &Command) -> Vec<&OsStr> {
        command.get_args().collect()
    }

    #[test]
    fn test_command_line_layout() -> Result<(), CompileError> {
        let compiler = LesscCompiler::new("/usr/local/bin/lessc");
        let staging = Path::new("/tmp/stageA");
        let command = compiler.command(
            &staging.join("css/email.less"),
            Path::new("/tmp/out/css/email.css"),
            &include_paths(staging),
        )?;

        assert_eq!(command.get_program(), OsStr::new("/usr/local/bin/lessc"));
        let args = args(&command);
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], staging.join("css/email.less").as_os_str());
        assert_eq!(args[1], OsStr::new("/tmp/out/css/email.css"));
        assert!(args[2].to_string_lossy().starts_with("--include-path=/tmp/stageA"));
        assert_eq!(args[3], OsStr::new("--compress"));
        Ok(())
    }

    #[test]
    fn test_compression_can_be_disabled() -> Result<(), CompileError> {
        let compiler = LesscCompiler::new("lessc").with_compress(false);
        let command = compiler.command(
            Path::new("in.less"),
            Path::new("out.css"),
            &include_paths(Path::new("stage")),
        )?;

        assert!(!args(&command).contains(&OsStr::new("--compress")));
        Ok(())
    }

    #[test]
    fn test_from_handle_applies_config() -> anyhow::Result<()> {
        let handle = CompilerHandle::locate_with_search_path(
            &std::env::current_exe()?.to_string_lossy(),
            None,
            ".",
            false,
        )?;
        let config = Config {
            compress: false,
            timeout_secs: 5,
            ..Config::default()
        };

        let compiler = LesscCompiler::from_handle(&handle, &config);

        assert_eq!(compiler.executable(), handle.executable());
        assert!(!compiler.compress);
        assert_eq!(compiler.timeout, Some(Duration::from_secs(5)));
        Ok(())
    }

    #[test]
    fn test_unstartable_program_is_process_execution_error() {
        let compiler = LesscCompiler::new("/nonexistent/emailcss/lessc");
        let err = compiler
            .compile(
                Path::new("in.less"),
                Path::new("out.css"),
                &include_paths(Path::new("stage")),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            CompileError::ProcessExecution {
                status: ProcessStatus::NotStarted(_),
                ..
            }
        ));
    }
}
