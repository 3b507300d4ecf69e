//! Entity registry: name ↔ id interning.
//!
//! The [`EntityRegistry`] provides O(1) lookups in both directions using two
//! `DashMap`s. Names are qualified names (IRIs or prefixed names) and are
//! compared exactly; no case folding is applied. A third map indexes local
//! names so rule text can write `Man` for `http://example.org/onto#Man`.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::entity::{EntityAllocator, EntityId, EntityKind, EntityMeta, short_name};
use crate::error::RegistryError;

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Interning registry for classes, properties and individuals.
pub struct EntityRegistry {
    /// Forward map: EntityId → EntityMeta (source of truth).
    id_to_meta: DashMap<EntityId, EntityMeta>,
    /// Reverse map: qualified name → EntityId.
    name_to_id: DashMap<String, EntityId>,
    /// Local name → every entity sharing it.
    short_to_ids: DashMap<String, Vec<EntityId>>,
    allocator: EntityAllocator,
}

impl EntityRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            id_to_meta: DashMap::new(),
            name_to_id: DashMap::new(),
            short_to_ids: DashMap::new(),
            allocator: EntityAllocator::new(),
        }
    }

    /// Intern `name` as an entity of `kind`.
    ///
    /// Idempotent: re-interning with the same kind returns the existing id.
    /// Interning an existing name with a different kind fails with
    /// [`RegistryError::KindConflict`] and leaves the registry untouched.
    pub fn intern(&self, name: &str, kind: EntityKind) -> RegistryResult<EntityId> {
        // Holding the entry guard makes check-then-insert atomic per name.
        match self.name_to_id.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let id = *entry.get();
                let existing = self.kind_of(id)?;
                if existing != kind {
                    return Err(RegistryError::KindConflict {
                        name: name.to_string(),
                        existing,
                        requested: kind,
                    });
                }
                Ok(id)
            }
            Entry::Vacant(entry) => {
                let id = self.allocator.next_id()?;
                self.id_to_meta.insert(id, EntityMeta::new(id, kind, name));
                self.short_to_ids
                    .entry(short_name(name).to_string())
                    .or_default()
                    .push(id);
                entry.insert(id);
                tracing::trace!(%id, name, %kind, "interned entity");
                Ok(id)
            }
        }
    }

    /// Look up an entity id by qualified name.
    pub fn lookup(&self, name: &str) -> RegistryResult<EntityId> {
        self.name_to_id
            .get(name)
            .map(|r| *r.value())
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Resolve a name as written in rule text.
    ///
    /// The exact qualified name wins; otherwise a local name shared by
    /// exactly one entity resolves to it. A local name shared by several
    /// entities is [`RegistryError::Ambiguous`].
    pub fn resolve(&self, name: &str) -> RegistryResult<EntityId> {
        if let Ok(id) = self.lookup(name) {
            return Ok(id);
        }
        let candidates = self
            .short_to_ids
            .get(name)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        match candidates.as_slice() {
            [id] => Ok(*id),
            [] => Err(RegistryError::NotFound {
                name: name.to_string(),
            }),
            _ => Err(RegistryError::Ambiguous {
                name: name.to_string(),
                candidates: candidates.iter().map(|id| self.name(*id)).collect(),
            }),
        }
    }

    /// Look up entity metadata by id.
    pub fn get(&self, id: EntityId) -> Option<EntityMeta> {
        self.id_to_meta.get(&id).map(|r| r.value().clone())
    }

    /// Kind of a registered entity.
    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.id_to_meta.get(&id).map(|r| r.value().kind)
    }

    fn kind_of(&self, id: EntityId) -> RegistryResult<EntityKind> {
        self.kind(id).ok_or_else(|| RegistryError::NotFound {
            name: id.to_string(),
        })
    }

    /// Qualified name of an entity, falling back to `ent:{id}` for unknown ids.
    pub fn name(&self, id: EntityId) -> String {
        self.id_to_meta
            .get(&id)
            .map(|r| r.value().name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// All registered entities in registration order.
    pub fn all(&self) -> Vec<EntityMeta> {
        let mut all: Vec<EntityMeta> = self.id_to_meta.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|m| m.id);
        all
    }

    /// All entities of one kind, in registration order.
    pub fn of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.all()
            .into_iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.id)
            .collect()
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.id_to_meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_meta.is_empty()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_lookup() {
        let reg = EntityRegistry::new();
        let john = reg.intern("John", EntityKind::Individual).unwrap();
        assert_eq!(reg.lookup("John").unwrap(), john);

        let meta = reg.get(john).unwrap();
        assert_eq!(meta.name, "John");
        assert_eq!(meta.kind, EntityKind::Individual);
    }

    #[test]
    fn intern_is_idempotent() {
        let reg = EntityRegistry::new();
        let a = reg.intern("Person", EntityKind::Class).unwrap();
        let b = reg.intern("Person", EntityKind::Class).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn kind_conflict_leaves_registry_untouched() {
        let reg = EntityRegistry::new();
        let person = reg.intern("Person", EntityKind::Class).unwrap();

        let err = reg.intern("Person", EntityKind::Individual).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::KindConflict {
                existing: EntityKind::Class,
                requested: EntityKind::Individual,
                ..
            }
        ));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.kind(person), Some(EntityKind::Class));
    }

    #[test]
    fn names_are_case_sensitive() {
        let reg = EntityRegistry::new();
        reg.intern("English", EntityKind::Individual).unwrap();
        assert!(matches!(
            reg.lookup("english"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn all_is_in_registration_order() {
        let reg = EntityRegistry::new();
        reg.intern("Person", EntityKind::Class).unwrap();
        reg.intern("speaksLanguage", EntityKind::ObjectProperty).unwrap();
        reg.intern("John", EntityKind::Individual).unwrap();
        reg.intern("Man", EntityKind::Class).unwrap();

        let names: Vec<String> = reg.all().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Person", "speaksLanguage", "John", "Man"]);
        assert_eq!(reg.of_kind(EntityKind::Class).len(), 2);
    }

    #[test]
    fn name_falls_back_to_id() {
        let reg = EntityRegistry::new();
        let id = EntityId::new(99).unwrap();
        assert_eq!(reg.name(id), "ent:99");
    }

    #[test]
    fn resolve_prefers_exact_then_unique_local_name() {
        let reg = EntityRegistry::new();
        let man = reg.intern("http://example.org/onto#Man", EntityKind::Class).unwrap();
        assert_eq!(reg.resolve("http://example.org/onto#Man").unwrap(), man);
        assert_eq!(reg.resolve("Man").unwrap(), man);
        assert!(matches!(
            reg.resolve("Woman"),
            Err(RegistryError::NotFound { .. })
        ));

        let other = reg.intern("http://other.org/onto#Man", EntityKind::Class).unwrap();
        assert!(matches!(
            reg.resolve("Man"),
            Err(RegistryError::Ambiguous { ref candidates, .. }) if candidates.len() == 2
        ));
        assert_eq!(reg.resolve("http://other.org/onto#Man").unwrap(), other);

        let plain = reg.intern("Man", EntityKind::Class).unwrap();
        assert_eq!(reg.resolve("Man").unwrap(), plain);
    }
}
