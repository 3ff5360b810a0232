use anyhow::Result;

use super::{
    args::{Arguments, Command},
    commands::{CommandResult, check::check, init::init, merge::merge},
};

/// Dispatches to the command handler.
///
/// # Returns
/// - `Ok(CommandResult)` with issue counts and exit behavior
/// - `Err` if the command fails (invalid config, missing messages directory,
///   unknown locale)
pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Check(cmd)) => check(cmd),
        Some(Command::Merge(cmd)) => merge(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
