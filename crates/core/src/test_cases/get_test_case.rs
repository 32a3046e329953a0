use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use base64::prelude::*;
use paramstore_sql::{Row, Value};

use crate::app_state::AppState;
use crate::constants::PARAMS_COLUMN;
use crate::dispatch;
use crate::queries::{ConsultQuery, QueryArgs};
use crate::test_cases::validate::LookupQuery;
use crate::test_cases::{TestCaseError, lookup_key};

const NOT_FOUND: &str = "Unable find the desired test case";

/// Read the parameters of a test case, looked up by either `id` or `name`.
pub async fn get_test_case_handler(
  State(state): State<AppState>,
  query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, TestCaseError> {
  let key = lookup_key(query)?;
  let Some(value) = key.value() else {
    return Err(TestCaseError::NotFound(NOT_FOUND));
  };

  let args = QueryArgs::new()
    .with("table_name", state.table_name())
    .with("column", key.column());
  let row = dispatch::execute(
    state.db(),
    ConsultQuery::SelectParamsWhereColumnEquals,
    &args,
    vec![value],
  )
  .await
  .map_err(|err| TestCaseError::dispatch_failed(NOT_FOUND, err))?
  .into_row()
  .ok_or(TestCaseError::NotFound(NOT_FOUND))?;

  return Ok(Json(row_to_json(&row)));
}

/// Converts a row into a JSON object keyed by column name.
///
/// The `params` column holds JSON text and is decoded when it parses. Blobs become url-safe base64.
pub(crate) fn row_to_json(row: &Row) -> serde_json::Value {
  let object = row
    .iter()
    .map(|(column, value)| {
      let json = match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Real(f) => serde_json::Number::from_f64(*f)
          .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Text(text) if column == PARAMS_COLUMN => serde_json::from_str(text)
          .unwrap_or_else(|_| serde_json::Value::String(text.clone())),
        Value::Text(text) => serde_json::Value::String(text.clone()),
        Value::Blob(blob) => serde_json::Value::String(BASE64_URL_SAFE.encode(blob)),
      };
      (column.to_string(), json)
    })
    .collect::<serde_json::Map<_, _>>();

  return serde_json::Value::Object(object);
}
