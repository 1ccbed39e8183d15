//! Generic entity repository over a [`ProcedureStore`].
//!
//! One `EntityRepository<K, S>` exists per entity kind `K`. The kind wires
//! its typed shapes and its [`ProcedureSet`] statically; the repository only
//! translates between those shapes and loosely-typed store records.

use std::marker::PhantomData;

use etlas_types::entity::{Deleted, Entity, OrderedParams, Page};
use etlas_types::error::{RepositoryError, ValidationError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use super::store::{Procedure, ProcedureSet, ProcedureStore, Record};

/// Column carried by list procedures holding the unpaged row count.
pub const TOTAL_COUNT: &str = "total_count";

/// Static wiring of one entity kind onto the store.
pub trait EntityKind: Send + Sync + 'static {
    type Entity: Entity + Serialize + DeserializeOwned + Clone + Send;
    type Create: OrderedParams + Serialize + Sync;
    type Update: OrderedParams + Serialize + Sync;

    /// Lower-case singular name used in errors and logs.
    const NAME: &'static str;
    const PROCEDURES: ProcedureSet;
}

/// The five generic operations for entity kind `K`.
///
/// Specialized query variants are added per kind as inherent impls
/// (see `repository::chat` and friends).
pub struct EntityRepository<K: EntityKind, S> {
    store: S,
    _kind: PhantomData<fn() -> K>,
}

impl<K: EntityKind, S: Clone> Clone for EntityRepository<K, S> {
    fn clone(&self) -> Self {
        Self::new(self.store.clone())
    }
}

impl<K: EntityKind, S> EntityRepository<K, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<K: EntityKind, S: ProcedureStore> EntityRepository<K, S> {
    /// Fetch one record. Absence is `Ok(None)`, not an error.
    pub async fn get(&self, id: Uuid) -> Result<Option<K::Entity>, RepositoryError> {
        let rows = self
            .call(&K::PROCEDURES.get_by_id, &args([("id", json!(id))]))
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// Fetch one page, ordered oldest first.
    pub async fn get_multi(
        &self,
        skip: u64,
        limit: u64,
    ) -> Result<Page<K::Entity>, RepositoryError> {
        let rows = self
            .call(
                &K::PROCEDURES.list,
                &args([("limit", window_arg(limit)), ("skip", window_arg(skip))]),
            )
            .await?;
        decode_page(rows, skip, limit)
    }

    /// Create a record from `input`.
    ///
    /// Only the fields named by the input's ordered parameter list reach the
    /// store. The returned entity is the caller's data plus the `id` and
    /// `created_at` the store assigned; it is not re-fetched.
    pub async fn create(&self, input: &K::Create) -> Result<K::Entity, RepositoryError> {
        let mut data = to_record(input)?;
        let rows = self.call(&K::PROCEDURES.create, &data).await?;
        let assigned = rows
            .into_iter()
            .next()
            .ok_or(RepositoryError::CreationFailed { entity: K::NAME })?;

        for key in ["id", "created_at"] {
            let value = assigned.get(key).cloned().ok_or_else(|| {
                ValidationError::Malformed(format!("create_{} returned no '{key}'", K::NAME))
            })?;
            data.insert(key.to_string(), value);
        }

        let entity: K::Entity = decode(data)?;
        debug!(entity = K::NAME, id = %entity.id(), "record created");
        Ok(entity)
    }

    /// Apply a partial update to `existing`.
    ///
    /// Fields named by the update's ordered parameter list and non-null in
    /// `input` override `existing`; every other field passes through. The
    /// merged entity is validated before the store is touched.
    pub async fn update(
        &self,
        existing: &K::Entity,
        input: &K::Update,
    ) -> Result<K::Entity, RepositoryError> {
        let procedure = &K::PROCEDURES.update;
        let changes = to_record(input)?;
        let mut merged = to_record(existing)?;
        let mut params = args([("id", json!(existing.id()))]);

        for name in procedure.params.iter().filter(|name| **name != "id") {
            if let Some(value) = changes.get(*name).filter(|value| !value.is_null()) {
                merged.insert(name.to_string(), value.clone());
                params.insert(name.to_string(), value.clone());
            }
        }

        let updated: K::Entity = decode(merged)?;
        let rows = self.call(procedure, &params).await?;
        if rows.is_empty() {
            return Err(RepositoryError::UpdateFailed {
                entity: K::NAME,
                reason: "store reported no updated record".to_string(),
            });
        }

        debug!(entity = K::NAME, id = %updated.id(), "record updated");
        Ok(updated)
    }

    /// Delete one record, returning only its identifier.
    pub async fn remove(&self, id: Uuid) -> Result<Deleted, RepositoryError> {
        let rows = self
            .call(&K::PROCEDURES.delete, &args([("id", json!(id))]))
            .await?;
        match rows.into_iter().next() {
            Some(_) => {
                debug!(entity = K::NAME, %id, "record deleted");
                Ok(Deleted { id })
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    pub(crate) async fn call(
        &self,
        procedure: &Procedure,
        source: &Record,
    ) -> Result<Vec<Record>, RepositoryError> {
        self.store.call(procedure.name, procedure.bind(source)).await
    }
}

/// Paging bound as a store argument. The store's integers are signed, so
/// anything past `i64::MAX` saturates.
pub(crate) fn window_arg(n: u64) -> Value {
    json!(i64::try_from(n).unwrap_or(i64::MAX))
}

/// Build a named argument record.
pub(crate) fn args<const N: usize>(pairs: [(&str, Value); N]) -> Record {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub(crate) fn to_record<T: Serialize>(value: &T) -> Result<Record, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(ValidationError::Malformed(format!(
            "expected an object, got {other}"
        ))
        .into()),
        Err(e) => Err(ValidationError::Malformed(e.to_string()).into()),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(record: Record) -> Result<T, RepositoryError> {
    serde_json::from_value(Value::Object(record))
        .map_err(|e| ValidationError::Malformed(e.to_string()).into())
}

pub(crate) fn decode_all<T: DeserializeOwned>(rows: Vec<Record>) -> Result<Vec<T>, RepositoryError> {
    rows.into_iter().map(decode).collect()
}

/// Turn list-procedure rows into a page.
///
/// The store reports the unpaged count on every row. A page past the end
/// comes back as a single row with a null `id` that only carries the count.
pub(crate) fn decode_page<T: DeserializeOwned>(
    rows: Vec<Record>,
    skip: u64,
    limit: u64,
) -> Result<Page<T>, RepositoryError> {
    let total = rows
        .first()
        .and_then(|row| row.get(TOTAL_COUNT))
        .and_then(Value::as_u64);

    let data = rows
        .into_iter()
        .filter(|row| row.get("id").is_some_and(|id| !id.is_null()))
        .map(|mut row| {
            row.remove(TOTAL_COUNT);
            decode(row)
        })
        .collect::<Result<Vec<T>, _>>()?;
    let total = total.unwrap_or(data.len() as u64);

    Ok(Page::new(data, total, skip, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::chat::ChatRepository;
    use crate::test_support::{ScriptedStore, stored_chat};
    use etlas_types::chat::{ChatCreate, ChatUpdate};

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = ScriptedStore::new();
        let repo = ChatRepository::new(store.clone());

        let found = repo.get(Uuid::now_v7()).await.unwrap();

        assert!(found.is_none());
        assert_eq!(store.calls()[0].0, "get_chat_by_id");
    }

    #[tokio::test]
    async fn create_uses_store_assigned_id_and_timestamp() {
        let store = ScriptedStore::new();
        let assigned_id = Uuid::now_v7();
        store.reply(
            "create_chat",
            vec![args([
                ("id", json!(assigned_id)),
                ("created_at", json!("2026-03-01T10:00:00Z")),
            ])],
        );
        let repo = ChatRepository::new(store.clone());
        let user_id = Uuid::now_v7();

        let chat = repo.create(&ChatCreate::new(user_id, None)).await.unwrap();

        assert_eq!(chat.id, assigned_id);
        assert_eq!(chat.created_at.to_rfc3339(), "2026-03-01T10:00:00+00:00");
        assert_eq!(chat.user_id, user_id);

        let (name, params) = &store.calls()[0];
        assert_eq!(*name, "create_chat");
        let names: Vec<_> = params.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["user_id", "scheme_id", "name_chat"]);
        assert_eq!(params[0].1, json!(user_id));
        assert!(params[1].1.is_null());
    }

    #[tokio::test]
    async fn create_without_rows_fails() {
        let store = ScriptedStore::new();
        let repo = ChatRepository::new(store);

        let err = repo
            .create(&ChatCreate::new(Uuid::now_v7(), None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::CreationFailed { entity: "chat" }
        ));
    }

    #[tokio::test]
    async fn update_merges_only_named_non_null_fields() {
        let store = ScriptedStore::new();
        let existing = stored_chat(Uuid::now_v7(), Some(Uuid::now_v7()), None);
        store.reply("update_chat", vec![args([("id", json!(existing.id))])]);
        let repo = ChatRepository::new(store.clone());

        let updated = repo
            .update(&existing, &ChatUpdate::rename("Resumen diario"))
            .await
            .unwrap();

        assert_eq!(updated.name_chat.as_deref(), Some("Resumen diario"));
        assert_eq!(updated.user_id, existing.user_id);
        assert_eq!(updated.scheme_id, existing.scheme_id);
        assert_eq!(updated.created_at, existing.created_at);

        let (_, params) = &store.calls()[0];
        assert_eq!(params[0], ("id", json!(existing.id)));
        assert!(params[1].1.is_null());
        assert!(params[2].1.is_null());
        assert_eq!(params[3], ("name_chat", json!("Resumen diario")));
    }

    #[tokio::test]
    async fn update_without_rows_fails() {
        let store = ScriptedStore::new();
        let existing = stored_chat(Uuid::now_v7(), None, None);
        let repo = ChatRepository::new(store);

        let err = repo
            .update(&existing, &ChatUpdate::rename("x"))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::UpdateFailed { entity: "chat", .. }));
    }

    #[tokio::test]
    async fn remove_returns_only_id() {
        let store = ScriptedStore::new();
        let id = Uuid::now_v7();
        store.reply("delete_chat", vec![args([("id", json!(id))])]);
        let repo = ChatRepository::new(store);

        assert_eq!(repo.remove(id).await.unwrap(), Deleted { id });
    }

    #[tokio::test]
    async fn remove_missing_is_not_found() {
        let repo = ChatRepository::new(ScriptedStore::new());
        let err = repo.remove(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn get_multi_reads_total_and_strips_count_column() {
        let store = ScriptedStore::new();
        let mut rows = Vec::new();
        for _ in 0..2 {
            let chat = stored_chat(Uuid::now_v7(), None, None);
            let mut row = to_record(&chat).unwrap();
            row.insert(TOTAL_COUNT.to_string(), json!(5));
            rows.push(row);
        }
        store.reply("get_all_chats", rows);
        let repo = ChatRepository::new(store.clone());

        let page = repo.get_multi(2, 2).await.unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(page.offset, 2);
        assert_eq!(page.data.len(), 2);
        let (_, params) = &store.calls()[0];
        assert_eq!(params, &vec![("limit", json!(2)), ("skip", json!(2))]);
    }

    #[tokio::test]
    async fn get_multi_past_end_keeps_total() {
        let store = ScriptedStore::new();
        let mut count_only = Record::new();
        count_only.insert("id".to_string(), Value::Null);
        count_only.insert("user_id".to_string(), Value::Null);
        count_only.insert(TOTAL_COUNT.to_string(), json!(5));
        store.reply("get_all_chats", vec![count_only]);
        let repo = ChatRepository::new(store);

        let page = repo.get_multi(10, 2).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
    }

    #[tokio::test]
    async fn get_multi_saturates_oversized_window() {
        let store = ScriptedStore::new();
        let repo = ChatRepository::new(store.clone());

        let page = repo.get_multi(u64::MAX, u64::MAX).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(page.limit, u64::MAX);
        let (_, params) = &store.calls()[0];
        assert_eq!(
            params,
            &vec![("limit", json!(i64::MAX)), ("skip", json!(i64::MAX))]
        );
    }

    #[test]
    fn window_arg_passes_small_values_through() {
        assert_eq!(window_arg(0), json!(0));
        assert_eq!(window_arg(20), json!(20));
        assert_eq!(window_arg(i64::MAX as u64), json!(i64::MAX));
        assert_eq!(window_arg(i64::MAX as u64 + 1), json!(i64::MAX));
    }

    #[tokio::test]
    async fn get_multi_empty_is_empty_page() {
        let repo = ChatRepository::new(ScriptedStore::new());
        let page = repo.get_multi(0, 10).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.pages, 0);
    }
}
