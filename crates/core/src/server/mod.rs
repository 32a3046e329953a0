mod init;

use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::time::Duration;
use tokio::signal;
use tower_http::{cors, trace::TraceLayer};

use crate::app_state::AppState;
use crate::config::DatabaseConfig;
use crate::constants::{DEFAULT_READY_TIMEOUT, DEFAULT_TABLE_NAME};
use crate::logging;

pub use init::{InitArgs, InitError, init_app_state};

/// A set of options to configure serving behaviors. Changing any of these options
/// requires a server restart, which makes them a natural fit for being exposed as command line
/// arguments.
#[derive(Debug, Clone)]
pub struct ServerOptions {
  /// Address the HTTP server binds to (Default: localhost:4000).
  pub address: String,

  pub database: DatabaseConfig,

  /// Table holding the test cases.
  pub table_name: String,

  /// How long to wait for the database at startup.
  pub ready_timeout: Duration,

  /// Issue `CREATE TABLE IF NOT EXISTS` for the test case table on startup.
  pub create_table: bool,

  /// Permissive CORS and verbose request tracing.
  pub dev: bool,

  /// Limit the set of allowed origins the HTTP server will answer to.
  pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerOptions {
  fn default() -> Self {
    return Self {
      address: "localhost:4000".to_string(),
      database: DatabaseConfig::default(),
      table_name: DEFAULT_TABLE_NAME.to_string(),
      ready_timeout: DEFAULT_READY_TIMEOUT,
      create_table: true,
      dev: false,
      cors_allowed_origins: vec![],
    };
  }
}

pub struct Server {
  pub state: AppState,

  // Address and router.
  pub main_router: (String, Router),
}

impl Server {
  /// Connects to the database and builds the router. Fails when the database is not ready in time.
  pub async fn init(opts: ServerOptions) -> Result<Self, InitError> {
    let state = init::init_app_state(InitArgs {
      database: opts.database.clone(),
      table_name: opts.table_name.clone(),
      ready_timeout: opts.ready_timeout,
      create_table: opts.create_table,
      dev: opts.dev,
    })
    .await?;

    let main_router = Self::build_main_router(&state, &opts);

    Ok(Self { state, main_router })
  }

  pub fn state(&self) -> &AppState {
    return &self.state;
  }

  pub fn router(&self) -> &Router<()> {
    return &self.main_router.1;
  }

  /// Serves until Ctrl+C or SIGTERM, then closes the database connection.
  pub async fn serve(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    logging::init_tracing(self.state.dev_mode());

    let (addr, router) = self.main_router;
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await.map_err(|err| {
      log::error!("Failed to listen on: {addr}: {err}");
      err
    })?;

    log::info!("listening on http://{addr}");

    axum::serve(listener, router)
      .with_graceful_shutdown(shutdown_signal())
      .await?;

    log::info!("Server stopped, closing database connection");
    self.state.db().clone().close().await?;

    return Ok(());
  }

  fn build_main_router(state: &AppState, opts: &ServerOptions) -> (String, Router<()>) {
    let router = Router::new()
      .merge(crate::test_cases::router())
      .route("/api/healthcheck", get(healthcheck_handler));

    return (
      opts.address.clone(),
      Self::wrap_with_default_layers(state, opts, router),
    );
  }

  fn wrap_with_default_layers(
    state: &AppState,
    opts: &ServerOptions,
    router: Router<AppState>,
  ) -> Router<()> {
    return router
      .layer(build_cors(opts))
      .layer(
        // This declares: **what information** is logged at what level in to events and spans.
        TraceLayer::new_for_http()
          .make_span_with(logging::make_span)
          .on_request(logging::on_request)
          .on_response(logging::on_response),
      )
      .with_state(state.clone());
  }
}

async fn healthcheck_handler() -> Response {
  return (StatusCode::OK, "Ok").into_response();
}

fn build_cors(opts: &ServerOptions) -> cors::CorsLayer {
  if opts.dev {
    return cors::CorsLayer::very_permissive();
  }

  let origin_strs = &opts.cors_allowed_origins;
  let wildcard = origin_strs.iter().any(|s| s == "*");

  let origins = if wildcard {
    log::info!("CORS: allow any origin");
    cors::AllowOrigin::mirror_request()
  } else {
    cors::AllowOrigin::list(origin_strs.iter().filter_map(|o| {
      match HeaderValue::from_str(o.as_str()) {
        Ok(value) => Some(value),
        Err(err) => {
          log::error!("Invalid CORS origin {o}: {err}");
          None
        }
      }
    }))
  };

  return cors::CorsLayer::new()
    .allow_methods(cors::Any)
    .allow_origin(origins);
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(err) = signal::ctrl_c().await {
      log::error!("Failed to install Ctrl+C handler: {err}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut stream) => {
        stream.recv().await;
      }
      Err(err) => {
        log::error!("Failed to install signal handler: {err}");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {
      log::info!("Received Ctrl+C. Shutting down gracefully.");
    },
    _ = terminate => {
      log::info!("Received termination. Shutting down gracefully.");
    },
  }
}
