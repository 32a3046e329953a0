#![forbid(clippy::unwrap_used)]
#![allow(clippy::needless_return)]
#![warn(
  clippy::await_holding_lock,
  clippy::empty_enum,
  clippy::enum_glob_use,
  clippy::inefficient_to_string,
  clippy::mem_forget,
  clippy::needless_continue
)]

pub mod connection;
pub mod engine;
pub mod error;
pub mod params;
#[cfg(feature = "pg")]
pub mod pg;
pub mod rows;

pub use rusqlite::types::Value;

pub use connection::{ConnectOptions, Connection};
#[cfg(feature = "pg")]
pub use connection::PostgresOptions;
pub use engine::Engine;
pub use error::Error;
pub use params::Params;
pub use rows::Row;
