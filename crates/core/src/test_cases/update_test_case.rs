use axum::Json;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Query, State};
use paramstore_sql::{Params, Value};

use crate::app_state::AppState;
use crate::dispatch;
use crate::queries::{ModifyQuery, QueryArgs};
use crate::test_cases::create_test_case::TestCaseForm;
use crate::test_cases::validate::{LookupQuery, non_empty};
use crate::test_cases::{MessageResponse, TestCaseError, lookup_key};

const NOT_FOUND: &str = "Unable updated the desired test case";

/// Overwrite `name` and/or `params` of the test case selected by the query string.
pub async fn update_test_case_handler(
  State(state): State<AppState>,
  query: Result<Query<LookupQuery>, QueryRejection>,
  form: Result<Form<TestCaseForm>, FormRejection>,
) -> Result<Json<MessageResponse>, TestCaseError> {
  let key = lookup_key(query)?;
  let form = form.map(|Form(f)| f).unwrap_or_default();

  let mut assignments: Vec<&'static str> = Vec::with_capacity(2);
  let mut params = Params::with_capacity(3);
  for (column, value) in [("name", &form.name), ("params", &form.params)] {
    if let Some(value) = non_empty(value.as_ref()) {
      assignments.push(column);
      params.push(Value::Text(value.to_string()));
    }
  }
  if assignments.is_empty() {
    return Err(TestCaseError::BadRequest("Missing arguments"));
  }
  let Some(value) = key.value() else {
    return Err(TestCaseError::NotFound(NOT_FOUND));
  };
  params.push(value);

  let updates = assignments
    .iter()
    .map(|c| format!("{c} = ?"))
    .collect::<Vec<_>>()
    .join(", ");
  let args = QueryArgs::new()
    .with("table_name", state.table_name())
    .with("updates", updates)
    .with("column", key.column());
  dispatch::execute(state.db(), ModifyQuery::UpdateWhereColumnEquals, &args, params)
    .await
    .map_err(|err| TestCaseError::dispatch_failed(NOT_FOUND, err))?;

  return Ok(MessageResponse::new("Test case updated successfully"));
}
