use paramstore_sql::Value;
use serde::Deserialize;
use thiserror::Error;

/// Raw `?id=` / `?name=` lookup as sent by the client.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LookupQuery {
  pub id: Option<String>,
  pub name: Option<String>,
}

/// Identifies exactly one test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupKey {
  Id(i64),
  /// An integer id outside the `i64` range. Valid input, but no row can have it.
  UnmatchableId,
  Name(String),
}

impl LookupKey {
  pub fn column(&self) -> &'static str {
    return match self {
      Self::Id(_) | Self::UnmatchableId => "id",
      Self::Name(_) => "name",
    };
  }

  /// The value to bind, `None` when the lookup cannot match any row.
  pub fn value(&self) -> Option<Value> {
    return match self {
      Self::Id(id) => Some(Value::Integer(*id)),
      Self::UnmatchableId => None,
      Self::Name(name) => Some(Value::Text(name.clone())),
    };
  }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("Missing id or testcase name")]
  Missing,
  #[error("You just can choose id or name, not both")]
  Ambiguous,
  #[error("ID should be an integer")]
  IdNotInteger,
  #[error("Name should be a string")]
  NameIsInteger,
}

impl ValidationError {
  pub fn message(self) -> &'static str {
    return match self {
      Self::Missing => "Missing id or testcase name",
      Self::Ambiguous => "You just can choose id or name, not both",
      Self::IdNotInteger => "ID should be an integer",
      Self::NameIsInteger => "Name should be a string",
    };
  }
}

/// Empty values count as absent.
pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
  return value.map(|v| v.as_str()).filter(|v| !v.is_empty());
}

/// Optional sign followed by ASCII digits, surrounding whitespace ignored. No size limit.
fn is_integer_like(value: &str) -> bool {
  let value = value.trim();
  let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
  return !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
}

pub fn validate_lookup(query: &LookupQuery) -> Result<LookupKey, ValidationError> {
  return match (non_empty(query.id.as_ref()), non_empty(query.name.as_ref())) {
    (None, None) => Err(ValidationError::Missing),
    (Some(_), Some(_)) => Err(ValidationError::Ambiguous),
    (Some(id), None) => {
      if !is_integer_like(id) {
        return Err(ValidationError::IdNotInteger);
      }
      Ok(
        id.trim()
          .parse::<i64>()
          .map_or(LookupKey::UnmatchableId, LookupKey::Id),
      )
    }
    (None, Some(name)) => {
      if is_integer_like(name) {
        return Err(ValidationError::NameIsInteger);
      }
      Ok(LookupKey::Name(name.to_string()))
    }
  };
}
