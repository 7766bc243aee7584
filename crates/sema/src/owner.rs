//! Polymorphic owner references and the host-side lifecycle contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{MetaRecord, MetadataApi};
use crate::ids::Id;
use crate::store::SemaStore;
use crate::SemaResult;

/// Loose foreign key to an owning entity: a type discriminator plus the
/// instance id. Never shared between two owners.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_type: String,
    pub owner_id: Id,
}

impl OwnerRef {
    pub fn new(owner_type: impl Into<String>, owner_id: Id) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id,
        }
    }
}

/// Implemented by host entity types that carry metadata. The type tag must
/// be stable across releases; it is persisted with every record.
pub trait AttributeOwner {
    fn type_tag(&self) -> &str;
    fn owner_id(&self) -> Id;

    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new(self.type_tag(), self.owner_id())
    }
}

/// Cascade handle the host wires into its entity-deletion path. Obtained
/// from [`SemaStore::deletion_hook`] at construction time; the host must
/// invoke [`entity_deleted`](Self::entity_deleted) before, or within the
/// same transaction as, the entity's removal so no record outlives its
/// owner.
#[derive(Clone)]
pub struct DeletionHook {
    store: SemaStore,
}

impl DeletionHook {
    pub(crate) fn new(store: SemaStore) -> Self {
        Self { store }
    }

    pub async fn entity_deleted(&self, owner: &OwnerRef) -> SemaResult<()> {
        self.store.delete_all_metas(owner).await
    }
}

/// Host-side lookup used to reverse-resolve a detached record's owner.
#[async_trait]
pub trait OwnerResolver: Send + Sync {
    async fn owner_exists(&self, owner_id: Id) -> SemaResult<bool>;
}

/// Maps type-tag strings to the lookup capability for that entity type.
/// An instance the host composes and passes around; there is no global
/// registry.
#[derive(Clone, Default)]
pub struct OwnerRegistry {
    resolvers: HashMap<String, Arc<dyn OwnerResolver>>,
}

impl OwnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, owner_type: impl Into<String>, resolver: Arc<dyn OwnerResolver>) {
        self.resolvers.insert(owner_type.into(), resolver);
    }

    pub fn resolver(&self, owner_type: &str) -> Option<&Arc<dyn OwnerResolver>> {
        self.resolvers.get(owner_type)
    }

    /// Whether the record's owner still exists in the host store. Records
    /// whose type tag has no registered resolver read as orphaned.
    pub async fn has_valid_owner(&self, record: &MetaRecord) -> SemaResult<bool> {
        match self.resolvers.get(&record.owner_type) {
            Some(resolver) => resolver.owner_exists(record.owner_id).await,
            None => Ok(false),
        }
    }
}
