//! PostgreSQL support for networked deployments.
use ::postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use bytes::BytesMut;
use log::*;
use rusqlite::types::Value;
use std::borrow::Cow;
use std::sync::Arc;

use crate::connection::{PostgresOptions, Result};
use crate::error::Error;
use crate::rows::Row;

type BoxError = Box<dyn std::error::Error + Sync + Send>;

pub(crate) fn connect(options: &PostgresOptions) -> Result<::postgres::Client> {
  let client = ::postgres::Config::new()
    .host(&options.host)
    .port(options.port)
    .user(&options.user)
    .password(&options.password)
    .dbname(&options.dbname)
    .connect_timeout(options.connect_timeout)
    .connect(::postgres::NoTls)?;

  debug!(
    "Connected to Postgres {}:{}/{}",
    options.host, options.port, options.dbname
  );
  return Ok(client);
}

pub(crate) fn execute(
  client: &mut ::postgres::Client,
  sql: &str,
  params: &[Value],
) -> Result<usize> {
  let sql = rewrite_placeholders(sql);
  let params: Vec<PgValue> = params.iter().map(PgValue).collect();
  let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

  let n = client.execute(sql.as_ref(), &refs)?;
  return Ok(usize::try_from(n).unwrap_or(usize::MAX));
}

pub(crate) fn query_row(
  client: &mut ::postgres::Client,
  sql: &str,
  params: &[Value],
) -> Result<Option<Row>> {
  let sql = rewrite_placeholders(sql);
  let params: Vec<PgValue> = params.iter().map(PgValue).collect();
  let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

  let Some(row) = client.query(sql.as_ref(), &refs)?.into_iter().next() else {
    return Ok(None);
  };

  let columns: Vec<String> = row
    .columns()
    .iter()
    .map(|c| c.name().to_string())
    .collect();
  let values = (0..row.len())
    .map(|idx| column_value(&row, idx))
    .collect::<Result<Vec<_>>>()?;

  return Ok(Some(Row::new(Arc::new(columns), values)));
}

fn column_value(row: &::postgres::Row, idx: usize) -> Result<Value> {
  let ty = row.columns()[idx].type_();

  let value: Option<Value> = if *ty == Type::BOOL {
    row
      .try_get::<_, Option<bool>>(idx)?
      .map(|v| Value::Integer(i64::from(v)))
  } else if *ty == Type::INT2 {
    row
      .try_get::<_, Option<i16>>(idx)?
      .map(|v| Value::Integer(i64::from(v)))
  } else if *ty == Type::INT4 {
    row
      .try_get::<_, Option<i32>>(idx)?
      .map(|v| Value::Integer(i64::from(v)))
  } else if *ty == Type::INT8 {
    row.try_get::<_, Option<i64>>(idx)?.map(Value::Integer)
  } else if *ty == Type::FLOAT4 {
    row
      .try_get::<_, Option<f32>>(idx)?
      .map(|v| Value::Real(f64::from(v)))
  } else if *ty == Type::FLOAT8 {
    row.try_get::<_, Option<f64>>(idx)?.map(Value::Real)
  } else if *ty == Type::BYTEA {
    row.try_get::<_, Option<Vec<u8>>>(idx)?.map(Value::Blob)
  } else if *ty == Type::JSON || *ty == Type::JSONB {
    row
      .try_get::<_, Option<serde_json::Value>>(idx)?
      .map(|v| Value::Text(v.to_string()))
  } else if <String as FromSql<'_>>::accepts(ty) {
    row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
  } else {
    return Err(Error::UnsupportedType(ty.name().to_string()));
  };

  return Ok(value.unwrap_or(Value::Null));
}

/// Adapts SQLite-style dynamic values to whatever type Postgres inferred for the parameter.
#[derive(Debug)]
struct PgValue<'a>(&'a Value);

impl ToSql for PgValue<'_> {
  fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
    return match self.0 {
      Value::Null => Ok(IsNull::Yes),
      Value::Integer(v) => {
        if *ty == Type::INT2 {
          i16::try_from(*v)?.to_sql(ty, out)
        } else if *ty == Type::INT4 {
          i32::try_from(*v)?.to_sql(ty, out)
        } else if *ty == Type::INT8 {
          v.to_sql(ty, out)
        } else if *ty == Type::BOOL {
          (*v != 0).to_sql(ty, out)
        } else if *ty == Type::FLOAT8 {
          (*v as f64).to_sql(ty, out)
        } else {
          v.to_string().to_sql(ty, out)
        }
      }
      Value::Real(v) => {
        if *ty == Type::FLOAT4 {
          (*v as f32).to_sql(ty, out)
        } else if *ty == Type::FLOAT8 {
          v.to_sql(ty, out)
        } else {
          v.to_string().to_sql(ty, out)
        }
      }
      Value::Text(v) => {
        if *ty == Type::JSON || *ty == Type::JSONB {
          serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out)
        } else {
          v.to_sql(ty, out)
        }
      }
      Value::Blob(v) => v.to_sql(ty, out),
    };
  }

  fn accepts(_ty: &Type) -> bool {
    return true;
  }

  to_sql_checked!();
}

/// Rewrites positional `?` markers into Postgres' numbered `$n` form. Markers inside quoted
/// literals or identifiers are left alone.
pub(crate) fn rewrite_placeholders(sql: &str) -> Cow<'_, str> {
  if !sql.contains('?') {
    return Cow::Borrowed(sql);
  }

  let mut out = String::with_capacity(sql.len() + 8);
  let mut quote: Option<char> = None;
  let mut n = 0;

  for c in sql.chars() {
    match quote {
      Some(q) => {
        if c == q {
          quote = None;
        }
        out.push(c);
      }
      None => match c {
        '\'' | '"' => {
          quote = Some(c);
          out.push(c);
        }
        '?' => {
          n += 1;
          out.push('$');
          out.push_str(&n.to_string());
        }
        c => out.push(c),
      },
    }
  }

  return Cow::Owned(out);
}
