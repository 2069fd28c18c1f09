// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask
//!
//! Project automation for the Tally workspace.
//!
//! - `cargo xtask ci` runs lint, build and the default `SQLite` test suite.
//! - `cargo xtask test-mariadb` runs the ignored backend validation tests of
//!   `tally-persistence` against a throwaway `MariaDB` container.
//! - `cargo xtask verify-migrations` applies both migration trees and fails
//!   if the resulting tables or columns differ.
//!
//! Standard `cargo test` never needs a database server. External databases
//! are opt-in and every container started here is removed when the command
//! finishes, whether it succeeded or not.

#![deny(
    clippy::pedantic,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::collections::BTreeMap;
use std::thread::sleep;
use std::time::Duration;
use std::{io, process::Output};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use diesel::sql_types::{Integer, Text};
use diesel::{Connection, MysqlConnection, QueryableByName, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const SQLITE_MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");
const MYSQL_MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("../crates/persistence/migrations_mysql");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    if let Err(err) = args.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test)
    CI,

    /// Build the workspace
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting and clippy
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the workspace
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check for formatting issues
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Fix formatting issues
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run the default test suite
    #[command(visible_alias = "t")]
    Test,

    /// Run `MariaDB` backend validation tests
    #[command(visible_alias = "tm")]
    TestMariadb,

    /// Verify table and column parity between `SQLite` and `MySQL` migrations
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => run_cargo(&["build", "--all-targets", "--all-features"]),
            Self::Check => run_cargo(&["check", "--all-targets", "--all-features"]),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintFormatting => run_cargo_nightly(&["fmt", "--all", "--check"]),
            Self::FixFormatting => run_cargo_nightly(&["fmt", "--all"]),
            Self::Test => run_cargo(&["test", "--all-targets", "--all-features"]),
            Self::TestMariadb => test_mariadb(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

/// Lint, build and test. Database-backed checks are run separately.
fn ci() -> Result<()> {
    lint()?;
    Command::Build.run()?;
    Command::Test.run()
}

fn lint() -> Result<()> {
    lint_clippy()?;
    run_cargo_nightly(&["fmt", "--all", "--check"])
}

fn lint_clippy() -> Result<()> {
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

fn run_cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

fn run_cargo_nightly(args: &[&str]) -> Result<()> {
    cmd("cargo", args)
        // set by cargo when running a subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// A throwaway `MariaDB` 11 container.
///
/// The container is stopped and removed when the value is dropped.
struct MariadbContainer {
    name: &'static str,
    database: &'static str,
    user: &'static str,
    password: &'static str,
    port: u16,
}

impl MariadbContainer {
    /// Starts the container and waits up to 30 seconds for it to accept
    /// queries.
    fn start(
        name: &'static str,
        database: &'static str,
        password: &'static str,
        port: u16,
    ) -> Result<Self> {
        cmd!("docker", "--version")
            .run_with_trace()
            .wrap_err("Docker is not available. Please install Docker.")?;

        let container = Self {
            name,
            database,
            user: "tally",
            password,
            port,
        };
        container.remove();

        tracing::info!("Starting MariaDB container: {}", name);
        cmd!(
            "docker",
            "run",
            "--name",
            name,
            "-e",
            format!("MARIADB_DATABASE={database}"),
            "-e",
            format!("MARIADB_USER={}", container.user),
            "-e",
            format!("MARIADB_PASSWORD={password}"),
            "-e",
            "MARIADB_ROOT_PASSWORD=root_password",
            "-p",
            format!("{port}:3306"),
            "-d",
            "mariadb:11"
        )
        .run_with_trace()
        .wrap_err("Failed to start MariaDB container")?;

        container.wait_until_ready()?;
        Ok(container)
    }

    fn wait_until_ready(&self) -> Result<()> {
        const MAX_ATTEMPTS: u32 = 30;

        for attempt in 1..=MAX_ATTEMPTS {
            sleep(Duration::from_secs(1));
            tracing::debug!("Connection attempt {}/{}", attempt, MAX_ATTEMPTS);

            let probe = cmd!(
                "docker",
                "exec",
                self.name,
                "mariadb",
                "-u",
                self.user,
                format!("-p{}", self.password),
                "-e",
                "SELECT 1"
            )
            .stdout_null()
            .stderr_null()
            .run();

            if probe.is_ok() {
                tracing::info!("MariaDB is ready");
                return Ok(());
            }
        }

        Err(eyre!("MariaDB did not become ready within timeout"))
    }

    fn url(&self) -> String {
        format!(
            "mysql://{}:{}@127.0.0.1:{}/{}",
            self.user, self.password, self.port, self.database
        )
    }

    fn remove(&self) {
        let _ = cmd!("docker", "stop", self.name)
            .stdout_null()
            .stderr_null()
            .run();
        let _ = cmd!("docker", "rm", self.name)
            .stdout_null()
            .stderr_null()
            .run();
    }
}

impl Drop for MariadbContainer {
    fn drop(&mut self) {
        tracing::info!("Removing MariaDB container: {}", self.name);
        self.remove();
    }
}

/// Runs the ignored `backend_validation_tests` of `tally-persistence`
/// against `MariaDB`.
///
/// The tests read `DATABASE_URL` and only run when `TALLY_TEST_BACKEND` is
/// `mariadb`. Port 3307 must be free.
fn test_mariadb() -> Result<()> {
    tracing::info!("Starting MariaDB backend validation");
    let container = MariadbContainer::start("tally-test-mariadb", "tally_test", "test_password", 3307)?;

    cmd!(
        "cargo",
        "test",
        "--package",
        "tally-persistence",
        "backend_validation_tests",
        "--",
        "--ignored",
        "--test-threads=1"
    )
    .env("DATABASE_URL", container.url())
    .env("TALLY_TEST_BACKEND", "mariadb")
    .run_with_trace()
    .wrap_err("MariaDB backend validation tests failed")?;

    tracing::info!("MariaDB backend validation completed successfully");
    Ok(())
}

/// Column shape compared across backends.
///
/// Types are not compared; `TEXT` and `VARCHAR(n)` are equivalent here.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnShape {
    nullable: bool,
    primary_key: bool,
}

/// Table name to column name to shape.
type SchemaShape = BTreeMap<String, BTreeMap<String, ColumnShape>>;

/// Applies both migration trees and compares the resulting schemas.
///
/// Port 3308 must be free.
fn verify_migrations() -> Result<()> {
    tracing::info!("Starting schema parity verification");

    let mut sqlite_conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    sqlite_conn
        .run_pending_migrations(SQLITE_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply SQLite migrations: {e}"))?;
    let sqlite_shape: SchemaShape = sqlite_schema(&mut sqlite_conn)?;

    let container =
        MariadbContainer::start("tally-verify-migrations", "tally_verify", "verify_password", 3308)?;
    let mut mysql_conn =
        MysqlConnection::establish(&container.url()).wrap_err("Failed to connect to MariaDB")?;
    mysql_conn
        .run_pending_migrations(MYSQL_MIGRATIONS)
        .map_err(|e| eyre!("Failed to apply MySQL migrations: {e}"))?;
    let mysql_shape: SchemaShape = mysql_schema(&mut mysql_conn)?;

    compare_schemas(&sqlite_shape, &mysql_shape)?;
    tracing::info!(
        tables = sqlite_shape.len(),
        "Schema parity check passed"
    );
    Ok(())
}

fn sqlite_schema(conn: &mut SqliteConnection) -> Result<SchemaShape> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations'",
    )
    .load(conn)
    .wrap_err("Failed to list SQLite tables")?;

    let mut shape = SchemaShape::new();
    for table in tables {
        let columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info('{}')", table.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to read SQLite columns of {}", table.name))?;
        shape.insert(
            table.name,
            columns
                .into_iter()
                .map(|c| {
                    (
                        c.name,
                        ColumnShape {
                            nullable: c.notnull == 0 && c.pk == 0,
                            primary_key: c.pk > 0,
                        },
                    )
                })
                .collect(),
        );
    }
    Ok(shape)
}

fn mysql_schema(conn: &mut MysqlConnection) -> Result<SchemaShape> {
    #[derive(QueryableByName)]
    #[allow(clippy::struct_field_names)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        table_name: String,
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        is_nullable: String,
        #[diesel(sql_type = Text)]
        column_key: String,
    }

    let columns: Vec<ColumnInfo> = diesel::sql_query(
        "SELECT TABLE_NAME AS table_name, COLUMN_NAME AS column_name, \
         IS_NULLABLE AS is_nullable, COLUMN_KEY AS column_key \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME != '__diesel_schema_migrations'",
    )
    .load(conn)
    .wrap_err("Failed to read MySQL columns")?;

    let mut shape = SchemaShape::new();
    for c in columns {
        shape.entry(c.table_name).or_default().insert(
            c.column_name,
            ColumnShape {
                nullable: c.is_nullable == "YES",
                primary_key: c.column_key == "PRI",
            },
        );
    }
    Ok(shape)
}

fn compare_schemas(sqlite: &SchemaShape, mysql: &SchemaShape) -> Result<()> {
    let sqlite_tables: Vec<&String> = sqlite.keys().collect();
    let mysql_tables: Vec<&String> = mysql.keys().collect();
    if sqlite_tables != mysql_tables {
        return Err(eyre!(
            "Schema parity check FAILED: table sets differ\n  SQLite: {sqlite_tables:?}\n  MySQL:  {mysql_tables:?}"
        ));
    }

    for (table, sqlite_columns) in sqlite {
        let Some(mysql_columns) = mysql.get(table) else {
            continue;
        };
        for (column, sqlite_shape) in sqlite_columns {
            match mysql_columns.get(column) {
                None => {
                    return Err(eyre!(
                        "Schema parity check FAILED: column '{table}.{column}' missing in MySQL"
                    ));
                }
                Some(mysql_shape) if mysql_shape != sqlite_shape => {
                    return Err(eyre!(
                        "Schema parity check FAILED: column '{table}.{column}' differs\n  SQLite: {sqlite_shape:?}\n  MySQL:  {mysql_shape:?}"
                    ));
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = mysql_columns
            .keys()
            .find(|column| !sqlite_columns.contains_key(*column))
        {
            return Err(eyre!(
                "Schema parity check FAILED: column '{table}.{extra}' missing in SQLite"
            ));
        }
    }

    Ok(())
}

/// An extension trait for `duct::Expression` that logs the command before
/// running it.
trait ExpressionExt {
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
