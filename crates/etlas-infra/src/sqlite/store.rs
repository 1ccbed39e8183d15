//! SQLite implementation of the [`ProcedureStore`] port.
//!
//! Each procedure in the application catalog is bound to one SQL statement
//! from [`super::procedures`]. The bindings are checked against the catalog
//! when the store is built, so a renamed procedure or a reordered parameter
//! list fails at start-up rather than on the first request that touches it.

use std::collections::HashMap;

use etlas_core::repository::{CatalogError, Params, ProcedureCatalog, ProcedureStore, Record};
use etlas_types::error::RepositoryError;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

use super::pool::DatabasePool;
use super::procedures::{self, Access, ProcedureBinding};

/// Mismatch between the procedure catalog and the SQL bindings.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("procedure '{0}' has no SQL binding")]
    Missing(&'static str),

    #[error("procedure '{name}' takes {declared:?} but its SQL binding takes {bound:?}")]
    Mismatch {
        name: &'static str,
        declared: &'static [&'static str],
        bound: &'static [&'static str],
    },
}

/// Procedure store backed by a [`DatabasePool`].
///
/// Reads run on the reader pool; inserts, updates and deletes run on the
/// single-connection writer.
#[derive(Clone)]
pub struct SqliteProcedureStore {
    pool: DatabasePool,
    bindings: HashMap<&'static str, ProcedureBinding>,
}

impl SqliteProcedureStore {
    /// Build a store serving every procedure in `catalog`.
    pub fn new(pool: DatabasePool, catalog: &ProcedureCatalog) -> Result<Self, BindingError> {
        Self::with_bindings(pool, catalog, procedures::all().copied())
    }

    fn with_bindings(
        pool: DatabasePool,
        catalog: &ProcedureCatalog,
        available: impl IntoIterator<Item = ProcedureBinding>,
    ) -> Result<Self, BindingError> {
        catalog.validate()?;

        let available: HashMap<&'static str, ProcedureBinding> = available
            .into_iter()
            .map(|binding| (binding.name, binding))
            .collect();

        let mut bindings = HashMap::new();
        for procedure in catalog.procedures() {
            let binding = available
                .get(procedure.name)
                .copied()
                .ok_or(BindingError::Missing(procedure.name))?;
            if binding.params != procedure.params {
                return Err(BindingError::Mismatch {
                    name: procedure.name,
                    declared: procedure.params,
                    bound: binding.params,
                });
            }
            bindings.insert(procedure.name, binding);
        }

        for name in available.keys().filter(|name| !bindings.contains_key(*name)) {
            warn!(procedure = %name, "SQL binding not used by any repository");
        }

        debug!(procedures = bindings.len(), "procedure store ready");
        Ok(Self { pool, bindings })
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

impl ProcedureStore for SqliteProcedureStore {
    #[tracing::instrument(skip(self, params))]
    async fn call(
        &self,
        procedure: &'static str,
        params: Params,
    ) -> Result<Vec<Record>, RepositoryError> {
        let binding = self
            .bindings
            .get(procedure)
            .ok_or_else(|| RepositoryError::MissingProcedure(procedure.to_string()))?;

        let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
        if names != binding.params {
            return Err(RepositoryError::Query(format!(
                "procedure '{procedure}' called with {names:?}, expected {:?}",
                binding.params
            )));
        }

        let query = params
            .into_iter()
            .fold(sqlx::query(binding.sql), |query, (_, value)| {
                bind_value(query, value)
            });

        let pool = match binding.access {
            Access::Read => &self.pool.reader,
            Access::Write => &self.pool.writer,
        };
        let rows = query.fetch_all(pool).await.map_err(map_sqlx_error)?;

        rows.iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sqlx_error)
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(flag) => query.bind(flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => query.bind(int),
            None => query.bind(number.as_f64()),
        },
        Value::String(text) => query.bind(text),
        other => query.bind(other.to_string()),
    }
}

/// Convert one result row into a loosely-typed record, keyed by column name.
///
/// Values are typed by their runtime storage class; booleans therefore come
/// back as the integers 0 and 1. The paging order column is dropped.
fn row_to_record(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    let mut record = Record::new();
    for column in row.columns() {
        if column.name() == procedures::PAGE_SEQ {
            continue;
        }
        let index = column.ordinal();
        let storage = {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };

        let value = match storage.as_deref() {
            None => Value::Null,
            Some("INTEGER" | "BOOLEAN") => Value::from(row.try_get_unchecked::<i64, _>(index)?),
            Some("REAL") => {
                serde_json::Number::from_f64(row.try_get_unchecked::<f64, _>(index)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
            Some("BLOB") => Value::Null,
            Some(_) => Value::String(row.try_get_unchecked::<String, _>(index)?),
        };
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        other => RepositoryError::Query(other.to_string()),
    }
}
