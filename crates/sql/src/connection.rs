use kanal::{Receiver, Sender};
use log::*;
use std::fmt::{self, Debug};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::engine::Engine;
use crate::error::Error;
use crate::params::Params;
use crate::rows::Row;

/// The result returned on method calls in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Where and how to reach the database.
#[derive(Clone, Debug)]
pub enum ConnectOptions {
  /// Embedded SQLite. A `path` of `None` opens a private in-memory database.
  Sqlite {
    path: Option<PathBuf>,
    busy_timeout: Duration,
  },
  #[cfg(feature = "pg")]
  Postgres(PostgresOptions),
}

impl ConnectOptions {
  pub fn in_memory() -> Self {
    return Self::Sqlite {
      path: None,
      busy_timeout: Duration::from_secs(5),
    };
  }

  pub fn sqlite(path: impl Into<PathBuf>) -> Self {
    return Self::Sqlite {
      path: Some(path.into()),
      busy_timeout: Duration::from_secs(5),
    };
  }
}

#[cfg(feature = "pg")]
#[derive(Clone)]
pub struct PostgresOptions {
  pub host: String,
  pub port: u16,
  pub user: String,
  pub password: String,
  pub dbname: String,
  pub connect_timeout: Duration,
}

#[cfg(feature = "pg")]
impl Debug for PostgresOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PostgresOptions")
      .field("host", &self.host)
      .field("port", &self.port)
      .field("user", &self.user)
      .field("dbname", &self.dbname)
      .finish_non_exhaustive()
  }
}

enum Message {
  Run(Box<dyn FnOnce(&mut Session) + Send + 'static>),
  Terminate(oneshot::Sender<Result<()>>),
}

/// Owned exclusively by the background thread. Connects lazily and drops sessions the engine
/// reports as closed, so the next call reconnects.
struct Session {
  options: ConnectOptions,
  engine: Option<Engine>,
}

impl Session {
  fn engine(&mut self) -> Result<&mut Engine> {
    if self.engine.as_ref().is_some_and(|engine| engine.is_closed()) {
      warn!("Database session was closed by the engine, reconnecting");
      self.engine = None;
    }

    if self.engine.is_none() {
      self.engine = Some(Engine::connect(&self.options)?);
    }

    return self.engine.as_mut().ok_or(Error::ConnectionClosed);
  }
}

/// A handle to the one database connection living on a background thread.
///
/// All statements are funneled through a single channel and therefore run strictly one after
/// another, regardless of how many handles exist or how many requests are in flight.
#[derive(Clone)]
pub struct Connection {
  sender: Sender<Message>,
}

impl Connection {
  /// Spawns the background thread. Connecting to the engine is deferred to the first call, which
  /// lets callers poll for readiness of engines that come up after us.
  pub fn open(options: ConnectOptions) -> Result<Self> {
    let (sender, receiver) = kanal::unbounded::<Message>();

    debug!("Opening database connection: {options:?}");
    let session = Session {
      options,
      engine: None,
    };

    std::thread::Builder::new()
      .name("paramstore-db".to_string())
      .spawn(move || event_loop(session, receiver))
      .map_err(|err| Error::Other(err.into()))?;

    return Ok(Self { sender });
  }

  /// Open a new connection to a private in-memory SQLite database.
  pub fn open_in_memory() -> Result<Self> {
    return Self::open(ConnectOptions::in_memory());
  }

  /// Call a function in background thread and get the result asynchronously.
  ///
  /// # Failure
  ///
  /// Will return `Err` if the connection has been closed or the engine could not be reached.
  #[inline]
  pub async fn call<F, R>(&self, function: F) -> Result<R>
  where
    F: FnOnce(&mut Engine) -> Result<R> + Send + 'static,
    R: Send + 'static,
  {
    let (sender, receiver) = oneshot::channel::<Result<R>>();

    self
      .sender
      .send(Message::Run(Box::new(move |session| {
        if !sender.is_closed() {
          let _ = sender.send(session.engine().and_then(function));
        }
      })))
      .map_err(|_| Error::ConnectionClosed)?;

    receiver.await.map_err(|_| Error::ConnectionClosed)?
  }

  /// Execute SQL statement and return the number of affected rows.
  pub async fn execute(&self, sql: impl AsRef<str> + Send + 'static, params: Params) -> Result<usize> {
    return self
      .call(move |engine| engine.execute(sql.as_ref(), &params))
      .await;
  }

  /// Query SQL statement and return the first row, if any.
  pub async fn query_row(
    &self,
    sql: impl AsRef<str> + Send + 'static,
    params: Params,
  ) -> Result<Option<Row>> {
    return self
      .call(move |engine| engine.query_row(sql.as_ref(), &params))
      .await;
  }

  /// Close the database connection.
  ///
  /// Stops the background thread and releases the engine session. Any other handle sharing this
  /// connection will fail with [`Error::ConnectionClosed`] afterwards, including a second `close`.
  pub async fn close(self) -> Result<()> {
    let (sender, receiver) = oneshot::channel::<Result<()>>();

    self
      .sender
      .send(Message::Terminate(sender))
      .map_err(|_| Error::ConnectionClosed)?;

    return receiver.await.map_err(|_| Error::ConnectionClosed)?;
  }
}

impl Debug for Connection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Connection").finish()
  }
}

fn event_loop(mut session: Session, receiver: Receiver<Message>) {
  while let Ok(message) = receiver.recv() {
    match message {
      Message::Run(f) => f(&mut session),
      Message::Terminate(reply) => {
        let result = match session.engine.take() {
          Some(engine) => engine.close(),
          None => Ok(()),
        };
        let _ = reply.send(result);
        return;
      }
    };
  }

  debug!("All connection handles dropped, shutting down database thread");
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
