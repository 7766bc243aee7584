use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::ids::Id;
use crate::owner::OwnerRef;
use crate::value::MetaValue;
use crate::SemaResult;

/// One persisted key/value pair belonging to exactly one owner. The id is
/// assigned by the store on first write and preserved across updates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetaRecord {
    pub id: Id,
    pub owner_type: String,
    pub owner_id: Id,
    pub key: String,
    pub value: String,
}

/// Single-attribute operations, all scoped to one owning entity.
///
/// Validation failures (empty keys, missing records) come back as `None` /
/// `false` rather than errors; only backing-store faults surface as `Err`.
#[async_trait]
pub trait MetadataApi {
    /// Fetch one record by key. Empty keys and absent keys both read as
    /// not-found.
    async fn get_meta(&self, owner: &OwnerRef, key: &str) -> SemaResult<Option<MetaRecord>>;

    /// Value-only convenience over [`get_meta`](Self::get_meta).
    async fn get_meta_value(&self, owner: &OwnerRef, key: &str) -> SemaResult<Option<String>>;

    /// Upsert: updates the existing record's value in place, or creates a
    /// new one. An empty key is a no-op returning `None`.
    async fn set_meta(
        &self,
        owner: &OwnerRef,
        key: &str,
        value: MetaValue,
    ) -> SemaResult<Option<MetaRecord>>;

    /// Apply [`set_meta`](Self::set_meta) per entry, best-effort. Entries
    /// failing key validation are skipped; only written records come back.
    async fn set_meta_many(
        &self,
        owner: &OwnerRef,
        entries: HashMap<String, MetaValue>,
    ) -> SemaResult<Vec<MetaRecord>>;

    /// Remove one record. `false` when the key was empty or nothing
    /// matched; deleting a missing key is not an error.
    async fn delete_meta(&self, owner: &OwnerRef, key: &str) -> SemaResult<bool>;

    /// Remove every record this owner holds. Used by the deletion cascade;
    /// an empty set is a no-op.
    async fn delete_all_metas(&self, owner: &OwnerRef) -> SemaResult<()>;
}

/// Attribute-filtered retrieval of owners.
#[async_trait]
pub trait MetaQueryApi {
    /// Ids of owners with the given type tag whose attributes satisfy the
    /// filter list under the given relation token. An empty or all-invalid
    /// filter list matches every owner of the type.
    async fn find_owner_ids(
        &self,
        owner_type: &str,
        filters: &[JsonValue],
        relation: &str,
    ) -> SemaResult<Vec<Id>>;
}
