//! Common test utilities for CLI integration tests.
//!
//! Every test runs the `carebook` binary against its own data directory
//! inside a temporary directory, with `CAREBOOK_*` variables cleared.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Variables the binary reads; cleared so the host environment cannot leak in.
const CAREBOOK_VARS: &[&str] = &[
    "CAREBOOK_DATA_DIR",
    "CAREBOOK_BUSY_TIMEOUT",
    "CAREBOOK_LOG_MODE",
    "CAREBOOK_SWEEP_INTERVAL_HOURS",
    "CAREBOOK_SWEEP_ENABLED",
    "CAREBOOK_CATALOG_REFRESH_SECONDS",
    "CAREBOOK_NOTIFICATION_SINK",
    "CAREBOOK_OUTBOX_PATH",
    "CAREBOOK_NOTIFICATION_MODE",
    "CAREBOOK_MAXIMUM_LOCK_WAIT_SECONDS",
    "CAREBOOK_DISPLAY_OFFSET_MINUTES",
    "CAREBOOK_OUTPUT_FORMAT",
];

/// Test environment with an isolated data directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
    /// Path to the carebook data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new environment. The data directory does not exist yet.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let data_dir = temp_path.join("carebook-data");

        Self {
            temp_dir,
            temp_path,
            data_dir,
        }
    }

    /// An environment with `init` already run and three users:
    /// client 1, enabled caregiver 2 (25.00/h), pending caregiver 3.
    pub fn initialized() -> Self {
        let env = Self::new();
        env.command().arg("init").assert().success();
        assert_eq!(env.add_user("Ana", "client", "0"), 1);
        assert_eq!(env.add_user("Bruno", "enabled-caregiver", "25"), 2);
        assert_eq!(env.add_user("Carla", "pending-caregiver", "18"), 3);
        env
    }

    /// The binary without `--data-dir`, run from the temp directory.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("carebook").expect("Failed to find carebook binary");
        for var in CAREBOOK_VARS {
            cmd.env_remove(var);
        }
        cmd.current_dir(&self.temp_path);
        cmd
    }

    /// The binary with `--data-dir` pointing at this environment.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("carebook.db")
    }

    /// Runs `add-user` and returns the printed identifier.
    pub fn add_user(&self, name: &str, role: &str, rate: &str) -> i64 {
        let output = self
            .command()
            .args(["add-user", name, "--role", role, "--rate", rate])
            .output()
            .expect("Failed to run add-user");
        parse_id(&output)
    }

    /// Books caregiver 2 for client 1 with pet 7, daily at 10:00.
    pub fn create(&self, start: &str, end: &str) -> i64 {
        let output = self
            .command()
            .args([
                "create",
                "--client",
                "1",
                "--caregiver",
                "2",
                "--start",
                start,
                "--end",
                end,
                "--pet",
                "7",
                "--hour",
                "10",
            ])
            .output()
            .expect("Failed to run create");
        parse_id(&output)
    }

    /// Runs a transition subcommand and asserts success.
    pub fn transition(&self, name: &str, id: i64) {
        self.command()
            .arg(name)
            .arg(id.to_string())
            .assert()
            .success();
    }

    /// Reads one reservation's status straight from the database.
    pub fn stored_status(&self, id: i64) -> String {
        let conn = rusqlite::Connection::open(self.database_path()).unwrap();
        conn.query_row(
            "SELECT s.name FROM reservations r JOIN states s ON s.id = r.state_id WHERE r.id = ?1",
            [id],
            |row| row.get(0),
        )
        .unwrap()
    }

    /// Counts rows in `table`.
    pub fn count(&self, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(self.database_path()).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }
}

/// Parses the identifier a command printed on stdout.
pub fn parse_id(output: &std::process::Output) -> i64 {
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .expect("Output is not an identifier")
}
