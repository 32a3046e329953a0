use paramstore_sql::{Params, Row};
use thiserror::Error;

use crate::db_handler::{DbHandler, HandlerError};
use crate::queries::{QueryArgs, QueryTemplate};

#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("create/delete failed")]
  NothingModified,
  #[error("execute failed")]
  NothingFound,
  #[error("Handler: {0}")]
  Handler(#[from] HandlerError),
}

#[derive(Debug)]
pub enum Outcome {
  Modified(usize),
  Found(Row),
}

impl Outcome {
  pub fn into_row(self) -> Option<Row> {
    return match self {
      Self::Found(row) => Some(row),
      Self::Modified(_) => None,
    };
  }
}

/// Runs `template` on the handler path matching its kind.
///
/// Statements that touch no rows and selects that find nothing are failures.
pub async fn execute(
  db: &DbHandler,
  template: impl Into<QueryTemplate>,
  args: &QueryArgs,
  params: Params,
) -> Result<Outcome, DispatchError> {
  return match template.into() {
    QueryTemplate::Modify(query) => match db.modify(query, args, params).await? {
      0 => Err(DispatchError::NothingModified),
      n => Ok(Outcome::Modified(n)),
    },
    QueryTemplate::Consult(query) => match db.consult(query, args, params).await? {
      Some(row) => Ok(Outcome::Found(row)),
      None => Err(DispatchError::NothingFound),
    },
  };
}
