//! Build script for carebook-cli.
//!
//! Generates the man page at build time using clap_mangen and places it in
//! OUT_DIR for inclusion in release builds.
//!
//! The command structure is declared here by hand since build scripts cannot
//! depend on the crate being built.

use clap::{Arg, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Mirror of the command tree in src/cli.rs.
///
/// Keep in sync when adding or removing subcommands.
fn build_cli() -> Command {
    Command::new("carebook")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage caregiving reservations")
        .long_about(
            "Command-line front end for creating, approving and reconciling caregiving reservations",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the data directory location")
                .value_name("PATH")
                .global(true)
                .env("CAREBOOK_DATA_DIR"),
        )
        .arg(
            Arg::new("busy-timeout")
                .long("busy-timeout")
                .help("Override the database busy timeout (in seconds)")
                .value_name("SECONDS")
                .global(true)
                .env("CAREBOOK_BUSY_TIMEOUT"),
        )
        .subcommands(vec![
            Command::new("init")
                .about("Initialize the data directory and state catalog")
                .long_about("Create the database and seed the default reservation states"),
            Command::new("add-user")
                .about("Register a user in the identity store")
                .long_about("Add a client, caregiver or administrator with an hourly rate"),
            Command::new("set-role")
                .about("Change the role of a user")
                .long_about("Promote or demote a user, e.g. enable a pending caregiver"),
            Command::new("users").about("List registered users"),
            Command::new("create")
                .about("Create a pending reservation")
                .long_about("Create a reservation with its pets and one slot per day"),
            Command::new("approve").about("Approve a pending reservation"),
            Command::new("reject").about("Reject a pending reservation"),
            Command::new("cancel").about("Cancel a pending or approved reservation"),
            Command::new("annul").about("Annul an approved reservation"),
            Command::new("delete").about("Delete a pending reservation"),
            Command::new("show").about("Show one reservation"),
            Command::new("list")
                .about("List reservations")
                .long_about("List reservations as a table, JSON or CSV"),
            Command::new("slots").about("List the slots of a reservation"),
            Command::new("in-range")
                .about("List live reservations of a caregiver intersecting a date range"),
            Command::new("sweep")
                .about("Complete approved reservations whose dates have passed")
                .long_about(
                    "Run one reconciliation pass, or keep running on the configured interval",
                ),
            Command::new("validate")
                .about("Validate a configuration file")
                .long_about("Check a carebook configuration file for errors"),
            Command::new("completions")
                .about("Generate shell completion scripts")
                .long_about("Generate shell completion scripts for bash, zsh, fish, or PowerShell"),
        ])
}

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("carebook.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
