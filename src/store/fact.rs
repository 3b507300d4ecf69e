//! Ground facts and partially-bound fact patterns.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A ground assertion about individuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "fact", rename_all = "snake_case")]
pub enum Fact {
    /// `class(individual)`.
    ClassMembership {
        individual: EntityId,
        class: EntityId,
    },
    /// `property(subject, object)`.
    PropertyLink {
        property: EntityId,
        subject: EntityId,
        object: EntityId,
    },
}

impl Fact {
    pub fn membership(individual: EntityId, class: EntityId) -> Self {
        Self::ClassMembership { individual, class }
    }

    pub fn link(property: EntityId, subject: EntityId, object: EntityId) -> Self {
        Self::PropertyLink {
            property,
            subject,
            object,
        }
    }

    /// The class or property this fact is about.
    pub fn predicate(&self) -> EntityId {
        match *self {
            Fact::ClassMembership { class, .. } => class,
            Fact::PropertyLink { property, .. } => property,
        }
    }
}

/// A fact with some slots left open.
///
/// `None` slots are wildcards. This is the only lookup primitive the
/// matcher, the classifier and the query engine use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactPattern {
    Class {
        class: Option<EntityId>,
        individual: Option<EntityId>,
    },
    Property {
        property: Option<EntityId>,
        subject: Option<EntityId>,
        object: Option<EntityId>,
    },
}

impl FactPattern {
    /// Every class membership.
    pub fn any_membership() -> Self {
        Self::Class {
            class: None,
            individual: None,
        }
    }

    /// Every property link.
    pub fn any_link() -> Self {
        Self::Property {
            property: None,
            subject: None,
            object: None,
        }
    }

    pub fn membership(class: Option<EntityId>, individual: Option<EntityId>) -> Self {
        Self::Class { class, individual }
    }

    pub fn link(
        property: Option<EntityId>,
        subject: Option<EntityId>,
        object: Option<EntityId>,
    ) -> Self {
        Self::Property {
            property,
            subject,
            object,
        }
    }

    /// Whether a ground fact fits this pattern.
    pub fn matches(&self, fact: &Fact) -> bool {
        fn slot(pattern: Option<EntityId>, value: EntityId) -> bool {
            pattern.is_none_or(|p| p == value)
        }

        match (*self, *fact) {
            (
                FactPattern::Class { class, individual },
                Fact::ClassMembership {
                    individual: fi,
                    class: fc,
                },
            ) => slot(class, fc) && slot(individual, fi),
            (
                FactPattern::Property {
                    property,
                    subject,
                    object,
                },
                Fact::PropertyLink {
                    property: fp,
                    subject: fs,
                    object: fo,
                },
            ) => slot(property, fp) && slot(subject, fs) && slot(object, fo),
            _ => false,
        }
    }
}

impl From<Fact> for FactPattern {
    /// The fully-bound pattern that matches exactly `fact`.
    fn from(fact: Fact) -> Self {
        match fact {
            Fact::ClassMembership { individual, class } => {
                FactPattern::membership(Some(class), Some(individual))
            }
            Fact::PropertyLink {
                property,
                subject,
                object,
            } => FactPattern::link(Some(property), Some(subject), Some(object)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn wildcards_match_anything_of_the_same_shape() {
        let f = Fact::membership(id(1), id(2));
        assert!(FactPattern::any_membership().matches(&f));
        assert!(!FactPattern::any_link().matches(&f));
    }

    #[test]
    fn bound_slots_must_agree() {
        let f = Fact::link(id(3), id(1), id(4));
        assert!(FactPattern::link(Some(id(3)), Some(id(1)), None).matches(&f));
        assert!(!FactPattern::link(Some(id(3)), Some(id(4)), None).matches(&f));
        assert!(FactPattern::from(f).matches(&f));
    }

    #[test]
    fn predicate_is_class_or_property() {
        assert_eq!(Fact::membership(id(1), id(2)).predicate(), id(2));
        assert_eq!(Fact::link(id(3), id(1), id(4)).predicate(), id(3));
    }
}
