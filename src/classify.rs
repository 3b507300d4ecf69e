//! Structural classification and consistency checking.
//!
//! Classes and opaque class expressions become nodes of a petgraph digraph.
//! `SubClassOf` adds an edge, `EquivalentClasses` adds edges both ways, and
//! the strongly connected components are collapsed so that equivalent
//! classes share one node and one closure.
//!
//! Unsatisfiability is derived in three steps:
//!
//! 1. a class whose closure contains both members of a disjoint pair;
//! 2. both members of a disjoint pair that some individual's membership
//!    closure contains (an instance-level clash);
//! 3. any class whose closure reaches a class marked by 1 or 2.
//!
//! The ontology is inconsistent iff some individual's membership closure
//! contains an unsatisfiable class. This is a structural approximation, not
//! a description-logic decision procedure: intersections and value
//! restrictions are opaque nodes.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::condensation;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use crate::axiom::{Axiom, AxiomSet, ClassExpr};
use crate::entity::{EntityId, EntityKind};
use crate::registry::EntityRegistry;
use crate::store::{Fact, FactPattern, FactStore};

/// A node of the class graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ClassNode {
    Named(EntityId),
    Opaque(ClassExpr),
}

impl From<&ClassExpr> for ClassNode {
    fn from(expr: &ClassExpr) -> Self {
        match expr {
            ClassExpr::Named(id) => ClassNode::Named(*id),
            other => ClassNode::Opaque(other.clone()),
        }
    }
}

/// The subsumption hierarchy over named classes.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    /// Reflexive-transitive closure of named superclasses.
    closure: HashMap<EntityId, BTreeSet<EntityId>>,
    /// Named classes sharing a collapsed component.
    equivalents: HashMap<EntityId, BTreeSet<EntityId>>,
}

impl Hierarchy {
    /// Build the closure from the registry's classes and the axioms.
    pub fn build(registry: &EntityRegistry, axioms: &AxiomSet) -> Self {
        let mut graph: DiGraph<ClassNode, ()> = DiGraph::new();
        let mut nodes: HashMap<ClassNode, NodeIndex> = HashMap::new();
        let mut node = |graph: &mut DiGraph<ClassNode, ()>, key: ClassNode| {
            *nodes
                .entry(key.clone())
                .or_insert_with(|| graph.add_node(key))
        };

        for class in registry.of_kind(EntityKind::Class) {
            node(&mut graph, ClassNode::Named(class));
        }
        for axiom in axioms.iter() {
            match axiom {
                Axiom::SubClassOf { sub, sup } => {
                    let a = node(&mut graph, sub.into());
                    let b = node(&mut graph, sup.into());
                    graph.add_edge(a, b, ());
                }
                Axiom::EquivalentClasses(classes) => {
                    let members: Vec<NodeIndex> =
                        classes.iter().map(|c| node(&mut graph, c.into())).collect();
                    for pair in members.windows(2) {
                        graph.add_edge(pair[0], pair[1], ());
                        graph.add_edge(pair[1], pair[0], ());
                    }
                }
                Axiom::DisjointClasses(classes) => {
                    for class in classes {
                        node(&mut graph, ClassNode::Named(*class));
                    }
                }
                Axiom::Declaration(_) => {}
            }
        }

        let condensed = condensation(graph, true);
        let named = |idx: NodeIndex| {
            condensed[idx].iter().filter_map(|n| match n {
                ClassNode::Named(id) => Some(*id),
                ClassNode::Opaque(_) => None,
            })
        };

        let mut hierarchy = Hierarchy::default();
        for component in condensed.node_indices() {
            let members: BTreeSet<EntityId> = named(component).collect();
            if members.is_empty() {
                continue;
            }

            let mut reachable = BTreeSet::new();
            let mut dfs = Dfs::new(&condensed, component);
            while let Some(next) = dfs.next(&condensed) {
                reachable.extend(named(next));
            }

            for class in &members {
                hierarchy.closure.insert(*class, reachable.clone());
                hierarchy.equivalents.insert(*class, members.clone());
            }
        }

        tracing::debug!(
            classes = hierarchy.closure.len(),
            components = condensed.node_count(),
            "class hierarchy built"
        );
        hierarchy
    }

    /// Every named class `class` is subsumed by, including itself.
    pub fn closure(&self, class: EntityId) -> BTreeSet<EntityId> {
        self.closure
            .get(&class)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([class]))
    }

    /// Strict named superclasses (equivalents included, `class` excluded).
    pub fn superclasses(&self, class: EntityId) -> BTreeSet<EntityId> {
        let mut supers = self.closure(class);
        supers.remove(&class);
        supers
    }

    /// Named classes subsumed by `class`, excluding itself.
    pub fn subclasses(&self, class: EntityId) -> BTreeSet<EntityId> {
        self.closure
            .iter()
            .filter(|(sub, supers)| **sub != class && supers.contains(&class))
            .map(|(sub, _)| *sub)
            .collect()
    }

    /// Named classes equivalent to `class`, excluding itself.
    pub fn equivalents(&self, class: EntityId) -> BTreeSet<EntityId> {
        let mut eq = self.equivalents.get(&class).cloned().unwrap_or_default();
        eq.remove(&class);
        eq
    }

    pub fn is_subclass_of(&self, sub: EntityId, sup: EntityId) -> bool {
        sub == sup
            || self
                .closure
                .get(&sub)
                .is_some_and(|supers| supers.contains(&sup))
    }

    /// Closure of a set of classes.
    pub fn closure_of(&self, classes: impl IntoIterator<Item = EntityId>) -> BTreeSet<EntityId> {
        classes.into_iter().flat_map(|c| self.closure(c)).collect()
    }

    /// Every strict subsumption `(sub, sup)` between distinct named classes.
    pub fn subsumptions(&self) -> Vec<(EntityId, EntityId)> {
        let mut pairs: Vec<(EntityId, EntityId)> = self
            .closure
            .iter()
            .flat_map(|(sub, supers)| {
                supers
                    .iter()
                    .filter(move |sup| *sup != sub)
                    .map(move |sup| (*sub, *sup))
            })
            .collect();
        pairs.sort();
        pairs
    }

    fn classes(&self) -> impl Iterator<Item = (&EntityId, &BTreeSet<EntityId>)> + '_ {
        self.closure.iter()
    }
}

/// An individual whose memberships reach two disjoint classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clash {
    pub individual: EntityId,
    pub disjoint: (EntityId, EntityId),
}

/// Outcome of classification.
#[derive(Debug, Clone)]
pub struct Classification {
    pub consistent: bool,
    pub unsatisfiable: BTreeSet<EntityId>,
    pub clashes: Vec<Clash>,
    pub hierarchy: Hierarchy,
}

impl Classification {
    pub fn is_unsatisfiable(&self, class: EntityId) -> bool {
        self.unsatisfiable.contains(&class)
    }

    /// Every class `individual` belongs to once the hierarchy is applied.
    pub fn inferred_types(&self, individual: EntityId, store: &FactStore) -> BTreeSet<EntityId> {
        self.hierarchy.closure_of(store.types_of(individual))
    }

    /// Individuals entailed to be members of `class`, in store order.
    pub fn instances_of(&self, class: EntityId, store: &FactStore) -> Vec<EntityId> {
        let mut seen = BTreeSet::new();
        store
            .iterate(FactPattern::any_membership())
            .filter_map(|fact| match *fact {
                Fact::ClassMembership {
                    individual,
                    class: asserted,
                } if self.hierarchy.is_subclass_of(asserted, class) => Some(individual),
                _ => None,
            })
            .filter(|individual| seen.insert(*individual))
            .collect()
    }
}

/// Compute the class hierarchy, unsatisfiable classes and consistency.
pub fn classify(registry: &EntityRegistry, axioms: &AxiomSet, store: &FactStore) -> Classification {
    let hierarchy = Hierarchy::build(registry, axioms);
    let pairs = axioms.disjoint_pairs();
    let clashing = |closure: &BTreeSet<EntityId>| {
        pairs
            .iter()
            .filter(|(a, b)| closure.contains(a) && closure.contains(b))
            .copied()
            .collect::<Vec<_>>()
    };

    let mut unsatisfiable: BTreeSet<EntityId> = hierarchy
        .classes()
        .filter(|(_, closure)| !clashing(closure).is_empty())
        .map(|(class, _)| *class)
        .collect();

    // Individuals in first-membership order, each with its closed type set.
    let mut individuals: Vec<(EntityId, BTreeSet<EntityId>)> = Vec::new();
    let mut position: HashMap<EntityId, usize> = HashMap::new();
    for fact in store.iterate(FactPattern::any_membership()) {
        if let Fact::ClassMembership { individual, class } = *fact {
            let idx = *position.entry(individual).or_insert_with(|| {
                individuals.push((individual, BTreeSet::new()));
                individuals.len() - 1
            });
            individuals[idx].1.extend(hierarchy.closure(class));
        }
    }

    let mut clashes = Vec::new();
    for (individual, types) in &individuals {
        for (a, b) in clashing(types) {
            unsatisfiable.insert(a);
            unsatisfiable.insert(b);
            clashes.push(Clash {
                individual: *individual,
                disjoint: (a, b),
            });
        }
    }

    let reaching: Vec<EntityId> = hierarchy
        .classes()
        .filter(|(_, closure)| closure.iter().any(|c| unsatisfiable.contains(c)))
        .map(|(class, _)| *class)
        .collect();
    unsatisfiable.extend(reaching);

    let consistent = !individuals
        .iter()
        .any(|(_, types)| types.iter().any(|c| unsatisfiable.contains(c)));

    tracing::info!(
        consistent,
        unsatisfiable = unsatisfiable.len(),
        clashes = clashes.len(),
        "classification finished"
    );

    Classification {
        consistent,
        unsatisfiable,
        clashes,
        hierarchy,
    }
}
