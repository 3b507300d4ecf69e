//! Core entity types.
//!
//! Entities are the named symbols an ontology talks about: classes,
//! properties and individuals. Every entity is identified by an interned
//! [`EntityId`] and described by [`EntityMeta`]. The [`EntityAllocator`]
//! hands out ids in registration order.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Interned, niche-optimized identifier for an entity.
///
/// `Option<EntityId>` is the same size as `EntityId`, which keeps fact
/// patterns (a handful of optional ids) small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EntityId(NonZeroU32);

impl EntityId {
    /// Create an `EntityId` from a raw `u32`. Returns `None` for zero.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(EntityId)
    }

    /// Get the underlying `u32` value.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ent:{}", self.0)
    }
}

/// The four kinds of entity an ontology can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A category of individuals.
    Class,
    /// A binary relation between two individuals.
    ObjectProperty,
    /// A relation from an individual to a data value.
    DataProperty,
    /// A concrete instance.
    Individual,
}

impl EntityKind {
    /// Whether atoms over this entity take two arguments.
    pub fn is_property(self) -> bool {
        matches!(self, Self::ObjectProperty | Self::DataProperty)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Class => write!(f, "Class"),
            EntityKind::ObjectProperty => write!(f, "ObjectProperty"),
            EntityKind::DataProperty => write!(f, "DataProperty"),
            EntityKind::Individual => write!(f, "Individual"),
        }
    }
}

/// Metadata describing a registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Interned identifier.
    pub id: EntityId,
    /// What kind of entity this is.
    pub kind: EntityKind,
    /// Qualified name, exactly as first registered.
    pub name: String,
}

impl EntityMeta {
    pub fn new(id: EntityId, kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
        }
    }

    /// The short display form of the name: the text after the last `#` or `/`.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

/// Strip an IRI namespace, keeping the local part.
pub fn short_name(name: &str) -> &str {
    match name.rfind(['#', '/']) {
        Some(pos) if pos + 1 < name.len() => &name[pos + 1..],
        _ => name,
    }
}

/// Thread-safe entity id allocator.
///
/// Produces monotonically increasing ids starting from 1.
#[derive(Debug)]
pub struct EntityAllocator {
    next: AtomicU32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Allocate the next entity id.
    pub fn next_id(&self) -> Result<EntityId, RegistryError> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        EntityId::new(raw).ok_or(RegistryError::Exhausted)
    }

    /// Return the id that *would* be allocated next, without consuming it.
    pub fn peek_next(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_niche_optimization() {
        assert_eq!(
            std::mem::size_of::<Option<EntityId>>(),
            std::mem::size_of::<EntityId>()
        );
    }

    #[test]
    fn entity_id_zero_is_none() {
        assert!(EntityId::new(0).is_none());
        assert_eq!(EntityId::new(7).unwrap().get(), 7);
    }

    #[test]
    fn allocator_produces_sequential_ids() {
        let alloc = EntityAllocator::new();
        assert_eq!(alloc.next_id().unwrap().get(), 1);
        assert_eq!(alloc.next_id().unwrap().get(), 2);
        assert_eq!(alloc.peek_next(), 3);
    }

    #[test]
    fn short_name_strips_namespace() {
        assert_eq!(short_name("http://example.org/onto#John"), "John");
        assert_eq!(short_name("http://example.org/onto/Person"), "Person");
        assert_eq!(short_name("John"), "John");
        assert_eq!(short_name("weird#"), "weird#");
    }

    #[test]
    fn kind_display() {
        assert_eq!(EntityKind::ObjectProperty.to_string(), "ObjectProperty");
        assert!(EntityKind::DataProperty.is_property());
        assert!(!EntityKind::Class.is_property());
    }
}
