use log::*;
use std::time::Duration;
use thiserror::Error;

use crate::app_state::{AppState, AppStateArgs};
use crate::config::{ConfigError, DatabaseConfig};
use crate::db_handler::{DbHandler, HandlerError, InitDbError, TableSpec};
use crate::queries::is_valid_identifier;

#[derive(Debug, Error)]
pub enum InitError {
  #[error("Config error: {0}")]
  Config(#[from] ConfigError),
  #[error("Database error: {0}")]
  Database(#[from] HandlerError),
}

impl From<InitDbError> for InitError {
  fn from(err: InitDbError) -> Self {
    return match err {
      InitDbError::Config(err) => Self::Config(err),
      InitDbError::Handler(err) => Self::Database(err),
    };
  }
}

pub struct InitArgs {
  pub database: DatabaseConfig,
  pub table_name: String,
  pub ready_timeout: Duration,
  pub create_table: bool,
  pub dev: bool,
}

/// Connects to the database, waits for it to become ready and optionally creates the test case
/// table. Fails if the database does not answer within `ready_timeout`.
pub async fn init_app_state(args: InitArgs) -> Result<AppState, InitError> {
  if !is_valid_identifier(&args.table_name) {
    return Err(ConfigError::InvalidIdentifier(args.table_name).into());
  }

  debug!("Connecting to {:?}", args.database);
  let db = DbHandler::connect(&args.database, args.ready_timeout).await?;

  if args.create_table {
    db.create_table(&TableSpec::parameters(
      args.table_name.as_str(),
      args.database.engine,
    ))
    .await?;
  }

  return Ok(AppState::new(AppStateArgs {
    db,
    table_name: args.table_name,
    dev: args.dev,
  }));
}
