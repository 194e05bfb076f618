//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    AddUserCommand, CompletionsCommand, CreateCommand, InRangeCommand, InitCommand, ListCommand,
    SetRoleCommand, ShowCommand, SlotsCommand, SweepCommand, TransitionCommand, UsersCommand,
    ValidateCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line front end for the carebook reservation engine.
#[derive(Parser)]
#[command(name = "carebook")]
#[command(version, about = "Manage caregiving reservations", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the data directory location
    #[arg(long, value_name = "PATH", global = true, env = "CAREBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the database busy timeout (in seconds)
    #[arg(
        long,
        value_name = "SECONDS",
        global = true,
        env = "CAREBOOK_BUSY_TIMEOUT"
    )]
    pub busy_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize the data directory and state catalog
    Init(InitCommand),

    /// Register a user in the identity store
    AddUser(AddUserCommand),

    /// Change the role of a user
    SetRole(SetRoleCommand),

    /// List registered users
    Users(UsersCommand),

    /// Create a pending reservation
    Create(CreateCommand),

    /// Approve a pending reservation
    Approve(TransitionCommand),

    /// Reject a pending reservation
    Reject(TransitionCommand),

    /// Cancel a pending or approved reservation
    Cancel(TransitionCommand),

    /// Annul an approved reservation
    Annul(TransitionCommand),

    /// Delete a pending reservation
    Delete(TransitionCommand),

    /// Show one reservation
    Show(ShowCommand),

    /// List reservations
    List(ListCommand),

    /// List the slots of a reservation
    Slots(SlotsCommand),

    /// List live reservations of a caregiver intersecting a date range
    InRange(InRangeCommand),

    /// Complete approved reservations whose dates have passed
    Sweep(SweepCommand),

    /// Validate a configuration file
    Validate(ValidateCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
