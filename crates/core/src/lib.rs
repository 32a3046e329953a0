#![forbid(unsafe_code, clippy::unwrap_used)]
#![allow(clippy::needless_return)]
#![warn(clippy::await_holding_lock, clippy::inefficient_to_string)]

pub mod app_state;
pub mod config;
pub mod constants;
pub mod db_handler;
pub mod dispatch;
pub mod logging;
pub mod queries;
pub mod test_cases;

mod server;


pub use app_state::AppState;
pub use config::{ConfigError, DatabaseConfig, DbEngine, DbMode};
pub use db_handler::{DbHandler, HandlerError, Seed, TableSpec};
pub use server::{InitError, Server, ServerOptions};

pub mod api {
  pub use crate::db_handler::{ColumnSpec, InitDbError};
  pub use crate::dispatch::{DispatchError, Outcome, execute};
  pub use crate::server::{InitArgs, init_app_state};
}
