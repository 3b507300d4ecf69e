//! Schema axioms and class expressions.
//!
//! Axioms describe how classes relate to each other, not which individuals
//! belong to them, so they are kept apart from the fact store.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A class expression.
///
/// Only [`ClassExpr::Named`] takes part in closure reasoning; every other
/// variant is an opaque node to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassExpr {
    Named(EntityId),
    /// `C1 ⊓ C2 ⊓ ...`
    Intersection(Vec<ClassExpr>),
    /// `∃ property.{value}`
    HasValue { property: EntityId, value: EntityId },
}

impl ClassExpr {
    /// The named class, if this expression is atomic.
    pub fn as_named(&self) -> Option<EntityId> {
        match self {
            ClassExpr::Named(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<EntityId> for ClassExpr {
    fn from(id: EntityId) -> Self {
        ClassExpr::Named(id)
    }
}

/// A schema-level statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axiom {
    Declaration(EntityId),
    SubClassOf { sub: ClassExpr, sup: ClassExpr },
    EquivalentClasses(Vec<ClassExpr>),
    DisjointClasses(Vec<EntityId>),
}

/// The ontology's axioms, in load order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AxiomSet {
    axioms: Vec<Axiom>,
}

impl AxiomSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, axiom: Axiom) {
        self.axioms.push(axiom);
    }

    pub fn sub_class_of(&mut self, sub: impl Into<ClassExpr>, sup: impl Into<ClassExpr>) {
        self.add(Axiom::SubClassOf {
            sub: sub.into(),
            sup: sup.into(),
        });
    }

    pub fn equivalent(&mut self, classes: Vec<ClassExpr>) {
        self.add(Axiom::EquivalentClasses(classes));
    }

    pub fn disjoint(&mut self, classes: Vec<EntityId>) {
        self.add(Axiom::DisjointClasses(classes));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Axiom> + '_ {
        self.axioms.iter()
    }

    /// Every unordered pair of classes declared disjoint.
    pub fn disjoint_pairs(&self) -> Vec<(EntityId, EntityId)> {
        let mut pairs = Vec::new();
        for axiom in &self.axioms {
            if let Axiom::DisjointClasses(classes) = axiom {
                for (i, a) in classes.iter().enumerate() {
                    for b in &classes[i + 1..] {
                        pairs.push((*a, *b));
                    }
                }
            }
        }
        pairs
    }

    pub fn len(&self) -> usize {
        self.axioms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axioms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[test]
    fn disjoint_pairs_are_pairwise() {
        let mut axioms = AxiomSet::new();
        axioms.disjoint(vec![id(1), id(2), id(3)]);
        assert_eq!(
            axioms.disjoint_pairs(),
            vec![(id(1), id(2)), (id(1), id(3)), (id(2), id(3))]
        );
    }

    #[test]
    fn named_expressions() {
        assert_eq!(ClassExpr::from(id(4)).as_named(), Some(id(4)));
        assert_eq!(ClassExpr::Intersection(vec![id(1).into()]).as_named(), None);
    }
}
