use rusqlite::types::Value;
use std::sync::Arc;

/// A single result row detached from the engine that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
  columns: Arc<Vec<String>>,
  values: Vec<Value>,
}

impl Row {
  pub fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Self {
    debug_assert_eq!(columns.len(), values.len());
    return Self { columns, values };
  }

  pub(crate) fn from_sqlite(
    row: &rusqlite::Row<'_>,
    columns: Arc<Vec<String>>,
  ) -> rusqlite::Result<Self> {
    let values = (0..columns.len())
      .map(|idx| row.get::<_, Value>(idx))
      .collect::<rusqlite::Result<Vec<_>>>()?;

    return Ok(Self { columns, values });
  }

  pub fn len(&self) -> usize {
    return self.values.len();
  }

  pub fn is_empty(&self) -> bool {
    return self.values.is_empty();
  }

  pub fn column_name(&self, idx: usize) -> Option<&str> {
    return self.columns.get(idx).map(|c| c.as_str());
  }

  pub fn get(&self, idx: usize) -> Option<&Value> {
    return self.values.get(idx);
  }

  pub fn get_by_name(&self, name: &str) -> Option<&Value> {
    let idx = self.columns.iter().position(|c| c == name)?;
    return self.values.get(idx);
  }

  /// Iterates `(column name, value)` pairs in select order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    return std::iter::zip(self.columns.iter().map(|c| c.as_str()), self.values.iter());
  }
}

pub(crate) fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
  return stmt
    .column_names()
    .into_iter()
    .map(|name| name.to_string())
    .collect();
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_row_accessors() {
    let row = Row::new(
      Arc::new(vec!["id".to_string(), "params".to_string()]),
      vec![Value::Integer(1), Value::Text("{}".to_string())],
    );

    assert_eq!(row.len(), 2);
    assert_eq!(row.column_name(1), Some("params"));
    assert_eq!(row.get_by_name("id"), Some(&Value::Integer(1)));
    assert_eq!(row.get_by_name("missing"), None);
    assert_eq!(
      row.iter().map(|(name, _)| name).collect::<Vec<_>>(),
      ["id", "params"]
    );
  }
}
