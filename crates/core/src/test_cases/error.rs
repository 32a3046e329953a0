use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;
use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::test_cases::MessageResponse;
use crate::test_cases::validate::ValidationError;

/// Publicly visible errors of the test case API.
///
/// Every variant carries the fixed message returned to the client, storage errors are logged and
/// never forwarded.
/// NOTE: Do not use thiserror's #from, all mappings should be explicit.
#[derive(Debug, Error)]
pub enum TestCaseError {
  #[error("Bad request: {0}")]
  BadRequest(&'static str),
  #[error("Not found: {0}")]
  NotFound(&'static str),
}

impl TestCaseError {
  /// Maps any dispatch failure onto the operation's fixed 404 message.
  pub(crate) fn dispatch_failed(message: &'static str, err: DispatchError) -> Self {
    match &err {
      DispatchError::Handler(err) => warn!("{message}: {err}"),
      err => debug!("{message}: {err}"),
    };
    return Self::NotFound(message);
  }
}

impl From<ValidationError> for TestCaseError {
  fn from(err: ValidationError) -> Self {
    return Self::BadRequest(err.message());
  }
}

impl IntoResponse for TestCaseError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
      Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
    };

    return (
      status,
      Json(MessageResponse {
        message: message.to_string(),
      }),
    )
      .into_response();
  }
}
