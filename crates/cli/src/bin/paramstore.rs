#![allow(clippy::needless_return)]

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{CommandFactory, Parser};
use paramstore::{DatabaseConfig, DbHandler, Seed, Server, ServerOptions};
use std::time::Duration;

use paramstore_cli::{DefaultCommandLineArgs, SubCommands};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_logger(dev: bool) {
  const DEFAULT: &str = "info,tracing::span=warn";

  env_logger::Builder::from_env(if dev {
    env_logger::Env::new().default_filter_or(format!("{DEFAULT},paramstore=debug"))
  } else {
    env_logger::Env::new().default_filter_or(DEFAULT)
  })
  .format_timestamp_micros()
  .init();
}

async fn async_main() -> Result<(), BoxError> {
  let args = DefaultCommandLineArgs::parse();

  match args.cmd {
    Some(SubCommands::Run(cmd)) => {
      init_logger(cmd.dev);

      let app = Server::init(ServerOptions {
        address: cmd.address,
        database: DatabaseConfig::from_env()?,
        table_name: cmd.table_name,
        ready_timeout: Duration::from_secs(cmd.ready_timeout),
        create_table: !cmd.no_create_table,
        dev: cmd.dev,
        cors_allowed_origins: cmd.cors_allowed_origins,
      })
      .await?;

      app.serve().await?;
    }
    Some(SubCommands::Seed(cmd)) => {
      init_logger(false);

      let contents = tokio::fs::read_to_string(&cmd.file).await?;
      let seed: Seed = serde_json::from_str(&contents)?;

      let db = DbHandler::connect(
        &DatabaseConfig::from_env()?,
        Duration::from_secs(cmd.ready_timeout),
      )
      .await?;
      let inserted = db.init_database(&seed.table, &seed.rows).await?;
      db.close().await?;

      log::info!(
        "Seeded '{}' from {:?}: {inserted} rows",
        seed.table.name,
        cmd.file
      );
    }
    None => {
      let _ = DefaultCommandLineArgs::command().print_help();
    }
  }

  Ok(())
}

fn main() -> Result<(), BoxError> {
  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()?;
  return runtime.block_on(async_main());
}
