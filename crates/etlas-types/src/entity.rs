//! Shapes shared by every persisted entity kind.
//!
//! Every entity carries a store-assigned identifier and creation timestamp.
//! Create and update inputs declare the ordered parameter list that the
//! backing store operation expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted domain record.
///
/// The identifier and creation timestamp are always assigned by the store,
/// never by the caller.
pub trait Entity {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
}

/// An input shape that participates in a create or update store call.
///
/// `ORDERED_PARAMS` names the serialized fields passed to the store, in the
/// order the store operation expects them. Fields not listed are never sent,
/// even when set.
pub trait OrderedParams {
    const ORDERED_PARAMS: &'static [&'static str];
}

/// One page of a listed entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub pages: u64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page, deriving the page count from `total` and `limit`.
    pub fn new(data: Vec<T>, total: u64, offset: u64, limit: u64) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            total,
            limit,
            offset,
            pages,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Transform every item while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            pages: self.pages,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

/// Confirmation returned by a delete operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: Uuid,
}
