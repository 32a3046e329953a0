use rusqlite::Statement;
use rusqlite::types::Value;

/// Positional parameters, bound in order to the statement's `?` markers.
pub type Params = Vec<Value>;

#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($param:expr),+ $(,)?) => {
        vec![$(Into::<$crate::Value>::into($param)),+]
    };
}

/// Binds `params` positionally. The number of values has to match the statement's markers
/// exactly, a mismatch usually means a template and its arguments went out of sync.
pub(crate) fn bind(stmt: &mut Statement<'_>, params: &[Value]) -> rusqlite::Result<()> {
  let expected = stmt.parameter_count();
  if expected != params.len() {
    return Err(rusqlite::Error::InvalidParameterCount(
      params.len(),
      expected,
    ));
  }

  for (idx, value) in params.iter().enumerate() {
    stmt.raw_bind_parameter(idx + 1, value)?;
  }
  return Ok(());
}
