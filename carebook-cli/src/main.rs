//! Main entry point for the carebook CLI.
//!
//! Reservation lifecycle commands (`create`, `approve`, `reject`, `cancel`,
//! `annul`, `delete`), queries (`show`, `list`, `slots`, `in-range`), the
//! reconciliation `sweep`, and setup (`init`, `add-user`, `set-role`).

mod cli;
mod commands;
mod error;
mod utils;

use carebook::Transition;
use clap::Parser;
use cli::{Cli, Command};
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    carebook::init_logger(cli.verbose, cli.quiet).install();

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        data_dir: cli.data_dir,
        busy_timeout: cli.busy_timeout,
    };

    let result = match cli.command {
        Command::Init(cmd) => cmd.execute(&global),
        Command::AddUser(cmd) => cmd.execute(&global),
        Command::SetRole(cmd) => cmd.execute(&global),
        Command::Users(cmd) => cmd.execute(&global),
        Command::Create(cmd) => cmd.execute(&global),
        Command::Approve(cmd) => cmd.execute(Transition::Approve, &global),
        Command::Reject(cmd) => cmd.execute(Transition::Reject, &global),
        Command::Cancel(cmd) => cmd.execute(Transition::Cancel, &global),
        Command::Annul(cmd) => cmd.execute(Transition::Annul, &global),
        Command::Delete(cmd) => cmd.execute(Transition::Delete, &global),
        Command::Show(cmd) => cmd.execute(&global),
        Command::List(cmd) => cmd.execute(&global),
        Command::Slots(cmd) => cmd.execute(&global),
        Command::InRange(cmd) => cmd.execute(&global),
        Command::Sweep(cmd) => cmd.execute(&global),
        Command::Validate(cmd) => cmd.execute(&global),
        Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("error[{}]: {e}", e.kind());
            std::process::exit(e.exit_code());
        }
    }
}
