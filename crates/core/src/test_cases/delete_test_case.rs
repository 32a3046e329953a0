use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};

use crate::app_state::AppState;
use crate::dispatch;
use crate::queries::{ModifyQuery, QueryArgs};
use crate::test_cases::validate::LookupQuery;
use crate::test_cases::{MessageResponse, TestCaseError, lookup_key};

const NOT_FOUND: &str = "Unable deleted the desired test case";

pub async fn delete_test_case_handler(
  State(state): State<AppState>,
  query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<MessageResponse>, TestCaseError> {
  let key = lookup_key(query)?;
  let Some(value) = key.value() else {
    return Err(TestCaseError::NotFound(NOT_FOUND));
  };

  let args = QueryArgs::new()
    .with("table_name", state.table_name())
    .with("column", key.column());
  dispatch::execute(
    state.db(),
    ModifyQuery::DeleteWhereColumnEquals,
    &args,
    vec![value],
  )
  .await
  .map_err(|err| TestCaseError::dispatch_failed(NOT_FOUND, err))?;

  return Ok(MessageResponse::new("Test case deleted successfully"));
}
