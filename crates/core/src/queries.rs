//! Catalog of the SQL statements the service issues.
//!
//! Templates carry named `{placeholder}` slots for identifiers only. Values are never rendered into
//! the statement text, they are bound positionally through `?` markers.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
  #[error("Missing template argument: {0}")]
  MissingArgument(String),
  #[error("Unused template argument: {0}")]
  UnusedArgument(String),
  #[error("Unterminated placeholder in template: {0}")]
  UnterminatedPlaceholder(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
  /// Changes data, yields the number of affected rows.
  Modify,
  /// Reads data, yields at most one row.
  Consult,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifyQuery {
  CreateTable,
  Insert,
  DeleteWhereColumnEquals,
  UpdateWhereColumnEquals,
}

impl ModifyQuery {
  pub const fn sql(self) -> &'static str {
    return match self {
      Self::CreateTable => "CREATE TABLE IF NOT EXISTS {table_name}({columns_to_insert})",
      Self::Insert => "INSERT INTO {table_name} ({columns}) VALUES ({placeholders})",
      Self::DeleteWhereColumnEquals => "DELETE FROM {table_name} WHERE {column} = ?",
      Self::UpdateWhereColumnEquals => "UPDATE {table_name} SET {updates} WHERE {column} = ?",
    };
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsultQuery {
  SelectParamsWhereColumnEquals,
}

impl ConsultQuery {
  pub const fn sql(self) -> &'static str {
    return match self {
      Self::SelectParamsWhereColumnEquals => "SELECT params FROM {table_name} WHERE {column} = ?",
    };
  }
}

/// A catalog entry tagged with its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryTemplate {
  Modify(ModifyQuery),
  Consult(ConsultQuery),
}

impl QueryTemplate {
  pub const fn kind(self) -> QueryKind {
    return match self {
      Self::Modify(_) => QueryKind::Modify,
      Self::Consult(_) => QueryKind::Consult,
    };
  }

  pub const fn sql(self) -> &'static str {
    return match self {
      Self::Modify(q) => q.sql(),
      Self::Consult(q) => q.sql(),
    };
  }
}

impl From<ModifyQuery> for QueryTemplate {
  fn from(query: ModifyQuery) -> Self {
    return Self::Modify(query);
  }
}

impl From<ConsultQuery> for QueryTemplate {
  fn from(query: ConsultQuery) -> Self {
    return Self::Consult(query);
  }
}

/// Named substitutions for a template.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryArgs(Vec<(&'static str, String)>);

impl QueryArgs {
  pub fn new() -> Self {
    return Self::default();
  }

  pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
    let value = value.into();
    match self.0.iter_mut().find(|(k, _)| *k == key) {
      Some(entry) => entry.1 = value,
      None => self.0.push((key, value)),
    }
    return self;
  }

  fn get(&self, key: &str) -> Option<&str> {
    return self
      .0
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, v)| v.as_str());
  }
}

/// Substitutes every `{name}` slot in `template`.
///
/// Every slot must have an argument and every argument must be used.
pub fn render(template: &'static str, args: &QueryArgs) -> Result<String, TemplateError> {
  let mut out = String::with_capacity(template.len() + 32);
  let mut used: Vec<&str> = Vec::with_capacity(args.0.len());

  let mut rest = template;
  while let Some(start) = rest.find('{') {
    out.push_str(&rest[..start]);

    let after = &rest[start + 1..];
    let Some(end) = after.find('}') else {
      return Err(TemplateError::UnterminatedPlaceholder(template));
    };
    let name = &after[..end];
    let Some(value) = args.get(name) else {
      return Err(TemplateError::MissingArgument(name.to_string()));
    };
    out.push_str(value);
    used.push(name);

    rest = &after[end + 1..];
  }
  out.push_str(rest);

  if let Some((unused, _)) = args.0.iter().find(|(k, _)| !used.contains(k)) {
    return Err(TemplateError::UnusedArgument(unused.to_string()));
  }

  return Ok(out);
}

/// `?, ?, ?` for `n` bound values.
pub fn placeholders(n: usize) -> String {
  return vec!["?"; n].join(", ");
}

/// Plain SQL identifier: ASCII letter or underscore first, then alphanumerics or underscores.
pub fn is_valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  return (first.is_ascii_alphabetic() || first == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
}
