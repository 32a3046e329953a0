#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("Connection closed error")]
  ConnectionClosed,

  /// An error occurred while closing the underlying engine session. The session is gone either
  /// way, there is nothing to retry.
  #[error("Close error: {0}")]
  Close(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

  #[error("Rusqlite error: {0}")]
  Rusqlite(#[from] rusqlite::Error),

  #[cfg(feature = "pg")]
  #[error("Postgres error: {0}")]
  Postgres(#[from] ::postgres::Error),

  #[error("Unsupported column type: {0}")]
  UnsupportedType(String),

  #[error("Other error: {0}")]
  Other(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}
