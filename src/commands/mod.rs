//! Command dispatch and handlers.

pub mod init;
pub mod run;

use crate::cli::Command;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::RunError;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the selected command
/// handler fails.
pub fn dispatch(command: &Command) -> Result<(), RunError> {
    let config = Config::from_env()?;
    let ctx = ServiceContext::live(&config);
    match command {
        Command::Run { dry_run } => run::run(&ctx, &config, *dry_run),
        Command::Init => init::run(&ctx, &config),
    }
}
