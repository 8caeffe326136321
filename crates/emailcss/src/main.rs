use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use emailcss::{BatchReport, CompilerHandle, Config, EmailCssCompiler};
use log::{error, info};

/// Compile the email stylesheets of a staged theme with lessc
#[derive(Debug, Parser)]
#[command(name = "emailcss", version, about)]
struct Cli {
    /// Staging directory holding css/email*.less
    #[arg(long)]
    staging: PathBuf,

    /// Output root; CSS is written to <DEST>/css
    #[arg(long)]
    dest: PathBuf,

    /// Installation root that relative --staging and --dest are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Configuration file (defaults to ./emailcss.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Compiler program name or path, overrides the configuration
    #[arg(long)]
    lessc: Option<String>,

    /// Seconds to wait for each compiler run, 0 waits forever
    #[arg(long)]
    timeout: Option<u64>,

    /// Emit unminified CSS
    #[arg(long)]
    no_compress: bool,

    /// Exit with an error if any stylesheet failed to compile
    #[arg(long)]
    strict: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(lessc) = &self.lessc {
            config.compiler.clone_from(lessc);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.no_compress {
            config.compress = false;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let handle = CompilerHandle::locate_program(&config.compiler, &cli.root, cli.verbose > 0)
        .context("Cannot compile email stylesheets")?;

    let staging = resolve(handle.root(), &cli.staging);
    let dest = resolve(handle.root(), &cli.dest);
    info!(
        "Compiling email stylesheets from {} into {}",
        staging.display(),
        dest.display()
    );

    let report = EmailCssCompiler::from_handle(&handle, &config).compile_email_css(&staging, &dest);

    print_report(&report);

    let status = exit_status(cli.strict, &report);
    if status != 0 {
        error!(
            "{} email stylesheet(s) failed to compile",
            report.failed().count()
        );
    }
    Ok(ExitCode::from(status))
}

/// Partial completion only fails the run under `--strict`
fn exit_status(strict: bool, report: &BatchReport) -> u8 {
    u8::from(strict && report.has_failures())
}

#[allow(clippy::print_stdout)]
fn print_report(report: &BatchReport) {
    print!("{report}");
}

/// `path` as given when absolute, otherwise relative to `root`
fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
