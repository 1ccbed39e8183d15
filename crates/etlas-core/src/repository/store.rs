//! Procedure store port and the static procedure catalog.
//!
//! The backing store exposes named operations ("procedures") that take an
//! ordered list of named parameters and return zero or more loosely-typed
//! records. Every operation the repositories may call is declared up front
//! in a [`ProcedureSet`] per entity kind, and the whole catalog is validated
//! once at start-up.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use etlas_types::error::RepositoryError;
use serde_json::Value;

/// A loosely-typed row as returned by the store.
pub type Record = serde_json::Map<String, Value>;

/// Ordered, named arguments for one store call.
pub type Params = Vec<(&'static str, Value)>;

/// Backing store that executes named procedures.
///
/// Implementations live in etlas-infra (e.g., `SqliteProcedureStore`).
/// An operation that yields no rows returns an empty vector; the store
/// never distinguishes "no rows" from "nothing matched".
pub trait ProcedureStore: Send + Sync {
    fn call(
        &self,
        procedure: &'static str,
        params: Params,
    ) -> impl Future<Output = Result<Vec<Record>, RepositoryError>> + Send;
}

impl<T: ProcedureStore> ProcedureStore for Arc<T> {
    fn call(
        &self,
        procedure: &'static str,
        params: Params,
    ) -> impl Future<Output = Result<Vec<Record>, RepositoryError>> + Send {
        (**self).call(procedure, params)
    }
}

impl<T: ProcedureStore> ProcedureStore for &T {
    fn call(
        &self,
        procedure: &'static str,
        params: Params,
    ) -> impl Future<Output = Result<Vec<Record>, RepositoryError>> + Send {
        (**self).call(procedure, params)
    }
}

/// One named store operation and the parameters it takes, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Procedure {
    pub name: &'static str,
    pub params: &'static [&'static str],
}

impl Procedure {
    pub const fn new(name: &'static str, params: &'static [&'static str]) -> Self {
        Self { name, params }
    }

    /// Pick this procedure's parameters out of `source`, in declared order.
    ///
    /// Names missing from `source` are passed as null.
    pub fn bind(&self, source: &Record) -> Params {
        self.params
            .iter()
            .map(|name| (*name, source.get(*name).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

/// The complete set of store operations for one entity kind.
#[derive(Debug, Clone, Copy)]
pub struct ProcedureSet {
    pub entity: &'static str,
    pub get_by_id: Procedure,
    pub list: Procedure,
    pub create: Procedure,
    pub update: Procedure,
    pub delete: Procedure,
    /// Foreign-key scoped and other kind-specific queries.
    pub queries: &'static [Procedure],
}

impl ProcedureSet {
    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        [
            &self.get_by_id,
            &self.list,
            &self.create,
            &self.update,
            &self.delete,
        ]
        .into_iter()
        .chain(self.queries.iter())
    }
}

/// Problems found while validating a [`ProcedureCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("{entity}: procedure with empty name")]
    EmptyName { entity: &'static str },

    #[error("procedure '{0}' is declared more than once")]
    DuplicateName(&'static str),

    #[error("procedure '{procedure}' lists parameter '{param}' more than once")]
    DuplicateParam {
        procedure: &'static str,
        param: &'static str,
    },

    #[error("create procedure '{procedure}' must not take store-assigned field '{param}'")]
    StoreAssignedParam {
        procedure: &'static str,
        param: &'static str,
    },

    #[error("update procedure '{0}' must take 'id' as its first parameter")]
    UpdateWithoutId(&'static str),
}

/// Every procedure set known to the application.
#[derive(Debug, Clone, Default)]
pub struct ProcedureCatalog {
    sets: Vec<ProcedureSet>,
}

impl ProcedureCatalog {
    pub fn new(sets: Vec<ProcedureSet>) -> Self {
        Self { sets }
    }

    pub fn sets(&self) -> &[ProcedureSet] {
        &self.sets
    }

    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        self.sets.iter().flat_map(ProcedureSet::procedures)
    }

    /// Check the catalog's structural rules.
    ///
    /// Called at start-up so that a bad mapping fails before any request.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut names = HashSet::new();

        for set in &self.sets {
            for procedure in set.procedures() {
                if procedure.name.trim().is_empty() {
                    return Err(CatalogError::EmptyName { entity: set.entity });
                }
                if !names.insert(procedure.name) {
                    return Err(CatalogError::DuplicateName(procedure.name));
                }

                let mut seen = HashSet::new();
                for &param in procedure.params {
                    if !seen.insert(param) {
                        return Err(CatalogError::DuplicateParam {
                            procedure: procedure.name,
                            param,
                        });
                    }
                }
            }

            if let Some(param) = set
                .create
                .params
                .iter()
                .copied()
                .find(|param| matches!(*param, "id" | "created_at"))
            {
                return Err(CatalogError::StoreAssignedParam {
                    procedure: set.create.name,
                    param,
                });
            }

            if set.update.params.first() != Some(&"id") {
                return Err(CatalogError::UpdateWithoutId(set.update.name));
            }
        }

        Ok(())
    }
}
