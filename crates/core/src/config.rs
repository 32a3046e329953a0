use paramstore_sql::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{LOCAL_DEFAULT_PORT, REMOTE_DEFAULT_PORT};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Missing environment variable: {0}")]
  Missing(&'static str),
  #[error("Invalid port: '{0}'")]
  InvalidPort(String),
  #[error("Unknown database engine: '{0}'")]
  UnknownEngine(String),
  #[error("Database engine not compiled in: {0}")]
  EngineUnavailable(&'static str),
  #[error("Invalid identifier: '{0}'")]
  InvalidIdentifier(String),
}

/// Local mode falls back to development defaults, remote mode insists on explicit credentials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DbMode {
  Local,
  #[default]
  Remote,
}

impl DbMode {
  fn from_env_value(value: &str) -> Self {
    return match value.trim() {
      "remote" => Self::Remote,
      _ => Self::Local,
    };
  }

  fn default_engine(self) -> DbEngine {
    return match self {
      Self::Local => DbEngine::Sqlite,
      Self::Remote => DbEngine::Postgres,
    };
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DbEngine {
  Sqlite,
  Postgres,
}

impl FromStr for DbEngine {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    return match s.trim().to_ascii_lowercase().as_str() {
      "sqlite" => Ok(Self::Sqlite),
      "postgres" | "postgresql" => Ok(Self::Postgres),
      _ => Err(ConfigError::UnknownEngine(s.to_string())),
    };
  }
}

/// Everything needed to reach the database.
///
/// For SQLite only `name` matters: it is either `:memory:` or a file path, `.db` is appended when
/// the path has no extension.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
  pub engine: DbEngine,
  pub host: String,
  pub user: String,
  pub password: String,
  pub name: String,
  pub port: u16,
}

impl Default for DatabaseConfig {
  fn default() -> Self {
    return Self {
      engine: DbEngine::Sqlite,
      host: "db".to_string(),
      user: "root".to_string(),
      password: "root".to_string(),
      name: "ecommerce".to_string(),
      port: LOCAL_DEFAULT_PORT,
    };
  }
}

impl std::fmt::Debug for DatabaseConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DatabaseConfig")
      .field("engine", &self.engine)
      .field("host", &self.host)
      .field("user", &self.user)
      .field("name", &self.name)
      .field("port", &self.port)
      .finish_non_exhaustive()
  }
}

impl DatabaseConfig {
  pub fn in_memory() -> Self {
    return Self {
      engine: DbEngine::Sqlite,
      name: ":memory:".to_string(),
      ..Default::default()
    };
  }

  /// Reads `DB_MODE`, `DB_ENGINE`, `DB_USER`, `DB_PASS`, `DB_HOST`, `DB_PORT` and `DB_NAME`.
  pub fn from_env() -> Result<Self, ConfigError> {
    return Self::from_lookup(|key| std::env::var(key).ok());
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let mode = lookup("DB_MODE").map_or(DbMode::default(), |m| DbMode::from_env_value(&m));
    let engine = match lookup("DB_ENGINE") {
      Some(engine) => engine.parse::<DbEngine>()?,
      None => mode.default_engine(),
    };

    let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
    let port = |default: u16| -> Result<u16, ConfigError> {
      let Some(port) = lookup("DB_PORT") else {
        return Ok(default);
      };
      let parsed = port.trim().parse::<u16>();
      return parsed.map_err(|_| ConfigError::InvalidPort(port));
    };

    return Ok(match mode {
      DbMode::Remote => Self {
        engine,
        user: required("DB_USER")?,
        password: required("DB_PASS")?,
        host: required("DB_HOST")?,
        port: port(REMOTE_DEFAULT_PORT)?,
        name: required("DB_NAME")?,
      },
      DbMode::Local => {
        let defaults = Self::default();
        Self {
          engine,
          user: lookup("DB_USER").unwrap_or(defaults.user),
          password: lookup("DB_PASS").unwrap_or(defaults.password),
          host: lookup("DB_HOST").unwrap_or(defaults.host),
          port: port(defaults.port)?,
          name: lookup("DB_NAME").unwrap_or(defaults.name),
        }
      }
    });
  }

  pub fn connect_options(&self, connect_timeout: Duration) -> Result<ConnectOptions, ConfigError> {
    return match self.engine {
      DbEngine::Sqlite => {
        if self.name == ":memory:" {
          return Ok(ConnectOptions::in_memory());
        }

        Ok(match Path::new(&self.name).extension() {
          Some(_) => ConnectOptions::sqlite(&self.name),
          None => ConnectOptions::sqlite(format!("{}.db", self.name)),
        })
      }
      #[cfg(feature = "pg")]
      DbEngine::Postgres => Ok(ConnectOptions::Postgres(paramstore_sql::PostgresOptions {
        host: self.host.clone(),
        port: self.port,
        user: self.user.clone(),
        password: self.password.clone(),
        dbname: self.name.clone(),
        connect_timeout,
      })),
      #[cfg(not(feature = "pg"))]
      DbEngine::Postgres => {
        let _ = connect_timeout;
        Err(ConfigError::EngineUnavailable("postgres"))
      }
    };
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    return move |key| vars.get(key).cloned();
  }

  #[test]
  fn test_local_mode_defaults() {
    let config = DatabaseConfig::from_lookup(lookup_from(&[("DB_MODE", "local")])).unwrap();
    assert_eq!(config, DatabaseConfig::default());

    let config = DatabaseConfig::from_lookup(lookup_from(&[
      ("DB_MODE", "dev"),
      ("DB_NAME", "other"),
      ("DB_PORT", "6000"),
    ]))
    .unwrap();
    assert_eq!(config.engine, DbEngine::Sqlite);
    assert_eq!(config.name, "other");
    assert_eq!(config.port, 6000);
  }

  #[test]
  fn test_remote_mode_requires_credentials() {
    // Remote is the default mode.
    assert!(matches!(
      DatabaseConfig::from_lookup(lookup_from(&[])),
      Err(ConfigError::Missing("DB_USER"))
    ));

    assert!(matches!(
      DatabaseConfig::from_lookup(lookup_from(&[
        ("DB_USER", "u"),
        ("DB_PASS", "p"),
        ("DB_HOST", "h"),
      ])),
      Err(ConfigError::Missing("DB_NAME"))
    ));

    let config = DatabaseConfig::from_lookup(lookup_from(&[
      ("DB_MODE", "remote"),
      ("DB_USER", "u"),
      ("DB_PASS", "p"),
      ("DB_HOST", "h"),
      ("DB_NAME", "n"),
    ]))
    .unwrap();
    assert_eq!(config.engine, DbEngine::Postgres);
    assert_eq!(config.port, REMOTE_DEFAULT_PORT);
    assert_eq!(config.host, "h");
  }

  #[test]
  fn test_invalid_values() {
    assert!(matches!(
      DatabaseConfig::from_lookup(lookup_from(&[("DB_MODE", "local"), ("DB_PORT", "x")])),
      Err(ConfigError::InvalidPort(port)) if port == "x"
    ));
    assert!(matches!(
      DatabaseConfig::from_lookup(lookup_from(&[("DB_MODE", "local"), ("DB_ENGINE", "mysql")])),
      Err(ConfigError::UnknownEngine(_))
    ));
  }

  #[test]
  fn test_password_is_not_logged() {
    let config = DatabaseConfig {
      password: "hunter2".to_string(),
      ..Default::default()
    };
    assert!(!format!("{config:?}").contains("hunter2"));
  }

  #[test]
  fn test_sqlite_connect_options() {
    let timeout = Duration::from_secs(1);

    let options = DatabaseConfig::in_memory().connect_options(timeout).unwrap();
    assert!(matches!(options, ConnectOptions::Sqlite { path: None, .. }));

    let options = DatabaseConfig::default().connect_options(timeout).unwrap();
    let ConnectOptions::Sqlite {
      path: Some(path), ..
    } = options
    else {
      panic!("expected sqlite file");
    };
    assert_eq!(path, Path::new("ecommerce.db"));

    let config = DatabaseConfig {
      name: "data/main.sqlite".to_string(),
      ..Default::default()
    };
    let ConnectOptions::Sqlite {
      path: Some(path), ..
    } = config.connect_options(timeout).unwrap()
    else {
      panic!("expected sqlite file");
    };
    assert_eq!(path, Path::new("data/main.sqlite"));
  }
}
