use std::sync::Arc;

use crate::db_handler::DbHandler;

/// The app's internal state. AppState needs to be clonable which puts unnecessary constraints on
/// the internals. Thus rather arc once than many times.
struct InternalState {
  db: DbHandler,
  table_name: String,
  dev: bool,
}

pub(crate) struct AppStateArgs {
  pub db: DbHandler,
  pub table_name: String,
  pub dev: bool,
}

#[derive(Clone)]
pub struct AppState {
  state: Arc<InternalState>,
}

impl AppState {
  pub(crate) fn new(args: AppStateArgs) -> Self {
    return AppState {
      state: Arc::new(InternalState {
        db: args.db,
        table_name: args.table_name,
        dev: args.dev,
      }),
    };
  }

  pub fn db(&self) -> &DbHandler {
    return &self.state.db;
  }

  /// Name of the test case table, a validated SQL identifier.
  pub fn table_name(&self) -> &str {
    return &self.state.table_name;
  }

  pub fn dev_mode(&self) -> bool {
    return self.state.dev;
  }
}

#[cfg(test)]
pub async fn test_state() -> anyhow::Result<AppState> {
  use paramstore_sql::Connection;

  use crate::config::DbEngine;
  use crate::constants::DEFAULT_TABLE_NAME;
  use crate::db_handler::TableSpec;

  let _ = env_logger::try_init_from_env(env_logger::Env::new().default_filter_or("info"));

  let db = DbHandler::new(Connection::open_in_memory()?);
  db.create_table(&TableSpec::parameters(DEFAULT_TABLE_NAME, DbEngine::Sqlite))
    .await?;

  return Ok(AppState::new(AppStateArgs {
    db,
    table_name: DEFAULT_TABLE_NAME.to_string(),
    dev: true,
  }));
}
