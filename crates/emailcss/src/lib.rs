//! Email stylesheet compilation for staged themes.
//!
//! Locates an installed `lessc` once, then compiles the fixed email
//! stylesheets (`email.less`, `email-inline.less`, `email-fonts.less`) of a
//! staged theme into minified CSS, one file at a time.

pub mod compiler;
pub mod config;
pub mod dirs;
pub mod email;
pub mod error;
pub mod lessc;
pub mod locator;
mod process;

pub use compiler::StylesheetCompiler;
pub use config::Config;
pub use email::{BatchReport, CompileOutcome, EMAIL_STYLESHEETS, EmailCssCompiler, StylesheetReport};
pub use error::{CompileError, ProcessStatus, ToolNotFoundError};
pub use lessc::LesscCompiler;
pub use locator::CompilerHandle;
