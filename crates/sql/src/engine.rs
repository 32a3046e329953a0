use log::*;
use rusqlite::types::Value;
use std::sync::Arc;

use crate::connection::{ConnectOptions, Result};
use crate::error::Error;
use crate::params::bind;
use crate::rows::{Row, column_names};

/// A live session with one of the supported engines.
///
/// Statements use positional `?` markers regardless of the engine, engines needing a different
/// notation rewrite them before preparing.
pub enum Engine {
  Sqlite(rusqlite::Connection),
  #[cfg(feature = "pg")]
  Postgres(::postgres::Client),
}

impl Engine {
  pub(crate) fn connect(options: &ConnectOptions) -> Result<Self> {
    return match options {
      ConnectOptions::Sqlite { path, busy_timeout } => {
        let conn = match path {
          Some(path) => rusqlite::Connection::open(path)?,
          None => rusqlite::Connection::open_in_memory()?,
        };
        conn.busy_timeout(*busy_timeout)?;

        debug!(
          "Opened SQLite DB '{}'",
          path
            .as_ref()
            .map_or_else(|| "<in-memory>".to_string(), |p| p.display().to_string())
        );
        Ok(Self::Sqlite(conn))
      }
      #[cfg(feature = "pg")]
      ConnectOptions::Postgres(options) => Ok(Self::Postgres(crate::pg::connect(options)?)),
    };
  }

  pub(crate) fn is_closed(&self) -> bool {
    return match self {
      Self::Sqlite(_) => false,
      #[cfg(feature = "pg")]
      Self::Postgres(client) => client.is_closed(),
    };
  }

  /// Executes a single statement and returns the number of rows the engine reports as changed.
  ///
  /// Both engines run in auto-commit mode, a successful return means the change is committed.
  pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
    return match self {
      Self::Sqlite(conn) => {
        let mut stmt = conn.prepare_cached(sql)?;
        bind(&mut stmt, params)?;

        Ok(stmt.raw_execute()?)
      }
      #[cfg(feature = "pg")]
      Self::Postgres(client) => crate::pg::execute(client, sql, params),
    };
  }

  /// Runs a query and returns its first row. Remaining rows are discarded.
  pub fn query_row(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
    return match self {
      Self::Sqlite(conn) => {
        let mut stmt = conn.prepare_cached(sql)?;
        bind(&mut stmt, params)?;

        let columns = Arc::new(column_names(&stmt));
        let mut rows = stmt.raw_query();
        if let Some(row) = rows.next()? {
          return Ok(Some(Row::from_sqlite(row, columns)?));
        }
        Ok(None)
      }
      #[cfg(feature = "pg")]
      Self::Postgres(client) => crate::pg::query_row(client, sql, params),
    };
  }

  pub(crate) fn close(self) -> Result<()> {
    return match self {
      Self::Sqlite(conn) => conn.close().map_err(|(_conn, err)| Error::Close(err.into())),
      #[cfg(feature = "pg")]
      Self::Postgres(client) => client.close().map_err(|err| Error::Close(err.into())),
    };
  }
}
