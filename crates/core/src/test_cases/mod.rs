use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::{Json, Router, routing::get};
use log::*;
use serde::{Deserialize, Serialize};

pub(crate) mod create_test_case;
pub(crate) mod delete_test_case;
pub(crate) mod get_test_case;
pub(crate) mod update_test_case;
pub(crate) mod validate;

mod error;

pub use error::TestCaseError;
pub use validate::{LookupKey, LookupQuery, ValidationError, validate_lookup};

use crate::AppState;
use crate::constants::TEST_CASE_API_PATH;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MessageResponse {
  pub message: String,
}

impl MessageResponse {
  pub(crate) fn new(message: &str) -> Json<Self> {
    return Json(Self {
      message: message.to_string(),
    });
  }
}

/// Validates the `?id=`/`?name=` lookup. A query string that does not even deserialize is a 400
/// with the same JSON body as any other invalid lookup.
pub(crate) fn lookup_key(
  query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<LookupKey, TestCaseError> {
  let query = match query {
    Ok(Query(query)) => query,
    Err(err) => {
      debug!("Rejected query string: {err}");
      return Err(TestCaseError::BadRequest("Invalid query string"));
    }
  };
  return Ok(validate_lookup(&query)?);
}

pub(crate) fn router() -> Router<AppState> {
  return Router::new().route("/", get(home_handler)).route(
    &format!("/{TEST_CASE_API_PATH}"),
    get(get_test_case::get_test_case_handler)
      .post(create_test_case::create_test_case_handler)
      .delete(delete_test_case::delete_test_case_handler)
      .put(update_test_case::update_test_case_handler),
  );
}

pub async fn home_handler() -> Json<MessageResponse> {
  return MessageResponse::new("Base url");
}
