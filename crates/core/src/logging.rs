use axum::body::Body;
use axum::http::{HeaderMap, Request, header};
use axum::response::Response;
use std::time::Duration;
use tracing::Level;
use tracing::span::Span;
use tracing_subscriber::{filter, prelude::*};

// NOTE: `server/mod.rs` installs `tower_http::trace::TraceLayer` with the hooks below. They define
// *what* goes into a request span and which events get emitted. *Where* events end up is decided
// by the subscriber installed in `init_tracing`.

pub(crate) const EVENT_TARGET: &str = "http_target";
pub(crate) const LEVEL: Level = Level::INFO;

const SPAN_NAME: &str = "request";
const EVENT_NAME: &str = "response";

fn get_header<'a>(headers: &'a HeaderMap, key: impl header::AsHeaderName) -> Option<&'a str> {
  return headers.get(key).and_then(|v| v.to_str().ok());
}

pub(super) fn make_span(request: &Request<Body>) -> Span {
  let headers = request.headers();

  // NOTE: "%" means print using fmt::Display, and "?" means fmt::Debug.
  return tracing::span!(
      target: EVENT_TARGET,
      LEVEL,
      SPAN_NAME,
      method = %request.method(),
      uri = %request.uri(),
      version = ?request.version(),
      user_agent = get_header(headers, header::USER_AGENT),
      // Reserve placeholders that are recorded once the response is known.
      latency_ms = tracing::field::Empty,
      status = tracing::field::Empty,
      length = tracing::field::Empty,
  );
}

pub(super) fn on_request(_req: &Request<Body>, _span: &Span) {
  // Everything of interest was already captured in `make_span`.
}

pub(super) fn on_response(response: &Response<Body>, latency: Duration, span: &Span) {
  span.record("latency_ms", as_millis_f64(&latency));
  span.record("status", response.status().as_u16());

  if let Some(header) = get_header(response.headers(), header::CONTENT_LENGTH) {
    span.record("length", header.parse::<i64>().ok());
  }

  tracing::event!(
    name: EVENT_NAME,
    target: EVENT_TARGET,
    parent: span,
    LEVEL,
    {}
  );
}

/// Declares **where** request traces go: a fmt layer on stderr.
///
/// NOTE: it's ok to fail. Just means someone else already initialized the tracing sub-system.
pub(crate) fn init_tracing(dev: bool) {
  let default_level = if dev {
    filter::LevelFilter::DEBUG
  } else {
    filter::LevelFilter::INFO
  };

  let _ = tracing_subscriber::registry()
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
          filter::Targets::new()
            .with_target(EVENT_TARGET, LEVEL)
            .with_target("tower_http::trace::on_response", filter::LevelFilter::DEBUG)
            .with_target("tower_http::trace::on_request", filter::LevelFilter::DEBUG)
            .with_target("tower_http::trace::make_span", filter::LevelFilter::DEBUG)
            .with_default(default_level),
        ),
    )
    .try_init();
}

#[inline]
fn as_millis_f64(d: &Duration) -> f64 {
  const NANOS_PER_MILLI: f64 = 1_000_000.0;
  const MILLIS_PER_SEC: u64 = 1_000;

  return (d.as_secs() as f64) * (MILLIS_PER_SEC as f64)
    + (d.subsec_nanos() as f64) / (NANOS_PER_MILLI);
}
