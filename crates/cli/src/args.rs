use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments for the paramstore CLI.
///
/// Database coordinates come from the `DB_*` environment variables, everything that only matters
/// to this process is a flag.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct DefaultCommandLineArgs {
  #[command(subcommand)]
  pub cmd: Option<SubCommands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommands {
  /// Starts the HTTP server.
  Run(ServerArgs),
  /// Creates a table and inserts rows from a JSON document.
  Seed(SeedArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ServerArgs {
  /// Authority (<host>:<port>) the HTTP server binds to (Default: localhost:4000).
  #[arg(short, long, env, default_value = "localhost:4000")]
  pub address: String,

  /// Table holding the test cases.
  #[arg(long, env, default_value = "parameters")]
  pub table_name: String,

  /// Seconds to wait for the database to become ready before giving up.
  #[arg(long, env, default_value_t = 60)]
  pub ready_timeout: u64,

  /// Don't create the test case table on startup.
  #[arg(long, default_value_t = false)]
  pub no_create_table: bool,

  /// Use permissive CORS and verbose logging.
  #[arg(long)]
  pub dev: bool,

  /// Limit the set of allowed origins the HTTP server will answer to.
  #[arg(long, default_value = "*")]
  pub cors_allowed_origins: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct SeedArgs {
  /// JSON file of the form `{"table": {"name": .., "columns": [..]}, "rows": [..]}`.
  pub file: PathBuf,

  /// Seconds to wait for the database to become ready before giving up.
  #[arg(long, env, default_value_t = 60)]
  pub ready_timeout: u64,
}
