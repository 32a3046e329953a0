use log::*;
use paramstore_sql::{Connection, Params, Row, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::{ConfigError, DatabaseConfig, DbEngine};
use crate::constants::{CONNECT_TIMEOUT, READY_POLL_INTERVAL};
use crate::queries::{
  ConsultQuery, ModifyQuery, QueryArgs, TemplateError, is_valid_identifier, placeholders, render,
};

#[derive(Debug, Error)]
pub enum HandlerError {
  #[error("Template: {0}")]
  Template(#[from] TemplateError),
  #[error("Database: {0}")]
  Database(#[from] paramstore_sql::Error),
  #[error("Database not ready after {waited:?}: {source}")]
  NotReady {
    waited: Duration,
    source: paramstore_sql::Error,
  },
  #[error("Table spec: {0}")]
  TableSpec(String),
}

/// Owns the single database connection of the service.
///
/// Cheap to clone, all clones share the connection and the statement counter.
#[derive(Clone)]
pub struct DbHandler {
  conn: Connection,
  executed: Arc<AtomicU64>,
}

impl DbHandler {
  pub fn new(conn: Connection) -> Self {
    return Self {
      conn,
      executed: Arc::new(AtomicU64::new(0)),
    };
  }

  /// Opens the connection described by `config` and blocks until the engine answers or `max_wait`
  /// elapsed.
  pub async fn connect(config: &DatabaseConfig, max_wait: Duration) -> Result<Self, InitDbError> {
    let options = config.connect_options(CONNECT_TIMEOUT)?;
    let handler = Self::new(Connection::open(options).map_err(HandlerError::Database)?);
    handler.wait_until_ready(max_wait).await?;
    return Ok(handler);
  }

  /// Polls with `SELECT 1` once per second until it succeeds.
  ///
  /// Every error is retried, including authentication failures. Once `max_wait` is exceeded the
  /// last error is returned.
  pub async fn wait_until_ready(&self, max_wait: Duration) -> Result<(), HandlerError> {
    let start = Instant::now();
    loop {
      match self.conn.query_row("SELECT 1", Params::new()).await {
        Ok(_) => {
          debug!("Database ready after {:?}", start.elapsed());
          return Ok(());
        }
        Err(err) => {
          let waited = start.elapsed();
          if waited >= max_wait {
            return Err(HandlerError::NotReady {
              waited,
              source: err,
            });
          }
          warn!("Database not ready yet ({waited:?}): {err}");
        }
      }

      tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
  }

  /// Renders and executes a modifying statement, returns the number of affected rows.
  pub async fn modify(
    &self,
    query: ModifyQuery,
    args: &QueryArgs,
    params: Params,
  ) -> Result<usize, HandlerError> {
    let sql = render(query.sql(), args)?;
    self.executed.fetch_add(1, Ordering::Relaxed);
    return Ok(self.conn.execute(sql, params).await?);
  }

  /// Renders and executes a reading statement, returns the first row if any.
  pub async fn consult(
    &self,
    query: ConsultQuery,
    args: &QueryArgs,
    params: Params,
  ) -> Result<Option<Row>, HandlerError> {
    let sql = render(query.sql(), args)?;
    self.executed.fetch_add(1, Ordering::Relaxed);
    return Ok(self.conn.query_row(sql, params).await?);
  }

  pub async fn create_table(&self, table: &TableSpec) -> Result<(), HandlerError> {
    let args = QueryArgs::new()
      .with("table_name", table.name.as_str())
      .with("columns_to_insert", table.column_definitions()?);
    self.modify(ModifyQuery::CreateTable, &args, Params::new()).await?;
    return Ok(());
  }

  /// Inserts one row per object, each with exactly the columns the object carries.
  pub async fn insert_rows(
    &self,
    table: &TableSpec,
    rows: &[serde_json::Map<String, serde_json::Value>],
  ) -> Result<usize, HandlerError> {
    let mut inserted = 0;
    for row in rows {
      let columns: Vec<&str> = row.keys().map(|k| k.as_str()).collect();
      if let Some(invalid) = columns.iter().find(|c| !is_valid_identifier(c)) {
        return Err(HandlerError::TableSpec(format!(
          "invalid column '{invalid}' in row for '{}'",
          table.name
        )));
      }

      let args = QueryArgs::new()
        .with("table_name", table.name.as_str())
        .with("columns", columns.join(", "))
        .with("placeholders", placeholders(columns.len()));
      let params: Params = row.values().map(json_to_value).collect();

      inserted += self.modify(ModifyQuery::Insert, &args, params).await?;
    }
    return Ok(inserted);
  }

  /// Creates the table and fills it with `rows`.
  pub async fn init_database(
    &self,
    table: &TableSpec,
    rows: &[serde_json::Map<String, serde_json::Value>],
  ) -> Result<usize, HandlerError> {
    self.create_table(table).await?;
    let inserted = self.insert_rows(table, rows).await?;
    info!("Initialized table '{}' with {inserted} rows", table.name);
    return Ok(inserted);
  }

  /// Number of statements issued through [`Self::modify`] and [`Self::consult`].
  pub fn executed_statements(&self) -> u64 {
    return self.executed.load(Ordering::Relaxed);
  }

  pub async fn close(self) -> Result<(), HandlerError> {
    return Ok(self.conn.close().await?);
  }
}

#[derive(Debug, Error)]
pub enum InitDbError {
  #[error("Config: {0}")]
  Config(#[from] ConfigError),
  #[error("Handler: {0}")]
  Handler(#[from] HandlerError),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnSpec {
  pub name: String,
  #[serde(rename = "type")]
  pub data_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub length: Option<u32>,
  #[serde(default)]
  pub primary: bool,
}

impl ColumnSpec {
  fn definition(&self) -> String {
    let mut def = format!("{} {}", self.name, self.data_type);
    if self.data_type.eq_ignore_ascii_case("varchar") {
      def.push_str(&format!("({})", self.length.unwrap_or(255)));
    }
    if self.primary {
      def.push_str(" PRIMARY KEY");
    }
    return def;
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSpec {
  pub name: String,
  pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
  /// The test case table: generated `id`, `name` and the JSON `params`.
  pub fn parameters(name: impl Into<String>, engine: DbEngine) -> Self {
    let column = |name: &str, data_type: &str, primary: bool| ColumnSpec {
      name: name.to_string(),
      data_type: data_type.to_string(),
      length: None,
      primary,
    };

    return Self {
      name: name.into(),
      columns: vec![
        match engine {
          DbEngine::Sqlite => column("id", "INTEGER", true),
          DbEngine::Postgres => column("id", "BIGSERIAL", true),
        },
        column("name", "VARCHAR", false),
        column("params", "TEXT", false),
      ],
    };
  }

  pub fn column_definitions(&self) -> Result<String, HandlerError> {
    if !is_valid_identifier(&self.name) {
      return Err(HandlerError::TableSpec(format!(
        "invalid table name '{}'",
        self.name
      )));
    }
    if self.columns.is_empty() {
      return Err(HandlerError::TableSpec(format!(
        "table '{}' has no columns",
        self.name
      )));
    }

    let mut defs = Vec::with_capacity(self.columns.len());
    for col in &self.columns {
      let type_ok = !col.data_type.is_empty()
        && col
          .data_type
          .chars()
          .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ');
      if !is_valid_identifier(&col.name) || !type_ok {
        return Err(HandlerError::TableSpec(format!(
          "invalid column '{} {}'",
          col.name, col.data_type
        )));
      }
      defs.push(col.definition());
    }
    return Ok(defs.join(", "));
  }
}

/// Seed document: `{ "table": {name, columns}, "rows": [...] }`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Seed {
  pub table: TableSpec,
  #[serde(default)]
  pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Nested objects and arrays are stored as their JSON text.
pub(crate) fn json_to_value(value: &serde_json::Value) -> Value {
  use serde_json::Value as J;

  return match value {
    J::Null => Value::Null,
    J::Bool(b) => Value::Integer(*b as i64),
    J::Number(n) => {
      if let Some(i) = n.as_i64() {
        Value::Integer(i)
      } else if let Some(f) = n.as_f64() {
        Value::Real(f)
      } else {
        Value::Text(n.to_string())
      }
    }
    J::String(s) => Value::Text(s.clone()),
    J::Array(_) | J::Object(_) => Value::Text(value.to_string()),
  };
}

#[cfg(test)]
mod tests {
  use super::*;
  use paramstore_sql::params;
  use serde_json::json;

  use crate::constants::DEFAULT_TABLE_NAME;

  fn rows(value: serde_json::Value) -> Vec<serde_json::Map<String, serde_json::Value>> {
    return serde_json::from_value(value).unwrap();
  }

  #[test]
  fn test_column_definitions() {
    let table = TableSpec::parameters("parameters", DbEngine::Sqlite);
    assert_eq!(
      table.column_definitions().unwrap(),
      "id INTEGER PRIMARY KEY, name VARCHAR(255), params TEXT"
    );

    let table: TableSpec = serde_json::from_value(json!({
      "name": "t",
      "columns": [
        {"name": "id", "type": "BIGSERIAL", "primary": true},
        {"name": "label", "type": "varchar", "length": 16},
      ],
    }))
    .unwrap();
    assert_eq!(
      table.column_definitions().unwrap(),
      "id BIGSERIAL PRIMARY KEY, label varchar(16)"
    );

    let bad = TableSpec {
      name: "t; DROP".to_string(),
      columns: table.columns.clone(),
    };
    assert!(matches!(
      bad.column_definitions(),
      Err(HandlerError::TableSpec(_))
    ));
  }

  #[test]
  fn test_json_to_value() {
    assert_eq!(json_to_value(&json!(null)), Value::Null);
    assert_eq!(json_to_value(&json!(3)), Value::Integer(3));
    assert_eq!(json_to_value(&json!(1.5)), Value::Real(1.5));
    assert_eq!(json_to_value(&json!("a")), Value::Text("a".to_string()));
    assert_eq!(
      json_to_value(&json!({"timeout": 2})),
      Value::Text(r#"{"timeout":2}"#.to_string())
    );
  }

  #[tokio::test]
  async fn test_init_and_query() {
    let handler = DbHandler::new(Connection::open_in_memory().unwrap());
    handler.wait_until_ready(Duration::ZERO).await.unwrap();

    let table = TableSpec::parameters(DEFAULT_TABLE_NAME, DbEngine::Sqlite);
    let inserted = handler
      .init_database(
        &table,
        &rows(json!([
          {"id": 1, "name": "t1", "params": {"timeout": 2}},
          {"name": "t2", "params": [1, 2]},
        ])),
      )
      .await
      .unwrap();
    assert_eq!(inserted, 2);

    let args = QueryArgs::new()
      .with("table_name", DEFAULT_TABLE_NAME)
      .with("column", "name");
    let row = handler
      .consult(
        ConsultQuery::SelectParamsWhereColumnEquals,
        &args,
        params!("t2".to_string()),
      )
      .await
      .unwrap()
      .unwrap();
    assert_eq!(row.get(0), Some(&Value::Text("[1,2]".to_string())));

    let missing = handler
      .consult(
        ConsultQuery::SelectParamsWhereColumnEquals,
        &args,
        params!("t3".to_string()),
      )
      .await
      .unwrap();
    assert!(missing.is_none());

    let deleted = handler
      .modify(ModifyQuery::DeleteWhereColumnEquals, &args, params!("t1".to_string()))
      .await
      .unwrap();
    assert_eq!(deleted, 1);

    // create table + two inserts + two selects + one delete.
    assert_eq!(handler.executed_statements(), 6);
  }

  #[tokio::test]
  async fn test_template_error_skips_database() {
    let handler = DbHandler::new(Connection::open_in_memory().unwrap());
    let result = handler
      .modify(
        ModifyQuery::DeleteWhereColumnEquals,
        &QueryArgs::new().with("table_name", "x"),
        params!(1),
      )
      .await;
    assert!(matches!(result, Err(HandlerError::Template(_))));
    assert_eq!(handler.executed_statements(), 0);
  }

  #[tokio::test]
  async fn test_execution_error_propagates() {
    let handler = DbHandler::new(Connection::open_in_memory().unwrap());
    let args = QueryArgs::new()
      .with("table_name", "does_not_exist")
      .with("column", "id");
    let result = handler
      .modify(ModifyQuery::DeleteWhereColumnEquals, &args, params!(1))
      .await;
    assert!(matches!(result, Err(HandlerError::Database(_))));
  }

  #[tokio::test]
  async fn test_not_ready_after_timeout() {
    let dir = temp_dir::TempDir::new().unwrap();
    let config = DatabaseConfig {
      name: dir
        .path()
        .join("missing/nested/db.sqlite")
        .to_string_lossy()
        .to_string(),
      ..Default::default()
    };

    let result = DbHandler::connect(&config, Duration::ZERO).await;
    assert!(matches!(
      result,
      Err(InitDbError::Handler(HandlerError::NotReady { .. }))
    ));
  }

  #[tokio::test]
  async fn test_ready_after_retry() {
    let dir = temp_dir::TempDir::new().unwrap();
    let parent = dir.path().join("late");
    let config = DatabaseConfig {
      name: parent.join("db.sqlite").to_string_lossy().to_string(),
      ..Default::default()
    };

    // The first attempts fail until the directory shows up.
    let create = tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(1200)).await;
      tokio::fs::create_dir_all(parent).await.unwrap();
    });

    let start = Instant::now();
    let handler = DbHandler::connect(&config, Duration::from_secs(10))
      .await
      .unwrap();
    assert!(start.elapsed() >= READY_POLL_INTERVAL);

    create.await.unwrap();
    handler.close().await.unwrap();
  }

  #[tokio::test]
  async fn test_close() {
    let handler = DbHandler::new(Connection::open_in_memory().unwrap());
    let clone = handler.clone();
    handler.close().await.unwrap();

    let result = clone.wait_until_ready(Duration::ZERO).await;
    assert!(matches!(
      result,
      Err(HandlerError::NotReady {
        source: paramstore_sql::Error::ConnectionClosed,
        ..
      })
    ));
  }
}
