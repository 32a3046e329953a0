use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::dispatch;
use crate::queries::{ModifyQuery, QueryArgs, placeholders};
use crate::test_cases::validate::non_empty;
use crate::test_cases::{MessageResponse, TestCaseError};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TestCaseForm {
  pub name: Option<String>,
  pub params: Option<String>,
}

/// Store a new test case from the form fields `name` and `params`.
pub async fn create_test_case_handler(
  State(state): State<AppState>,
  form: Result<Form<TestCaseForm>, FormRejection>,
) -> Result<Json<MessageResponse>, TestCaseError> {
  const MISSING: TestCaseError = TestCaseError::BadRequest("Missing arguments");

  let Ok(Form(form)) = form else {
    return Err(MISSING);
  };
  let (Some(name), Some(params)) = (non_empty(form.name.as_ref()), non_empty(form.params.as_ref()))
  else {
    return Err(MISSING);
  };

  let args = QueryArgs::new()
    .with("table_name", state.table_name())
    .with("columns", "name, params")
    .with("placeholders", placeholders(2));
  dispatch::execute(
    state.db(),
    ModifyQuery::Insert,
    &args,
    paramstore_sql::params!(name.to_string(), params.to_string()),
  )
  .await
  .map_err(|err| TestCaseError::dispatch_failed("Unable created the new test case", err))?;

  return Ok(MessageResponse::new("New test case added successfully"));
}
