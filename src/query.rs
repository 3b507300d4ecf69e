//! Query engine: conjunctive pattern evaluation with projection.
//!
//! A query is solved exactly like a rule body; instead of asserting head
//! facts, each solution is projected onto the selected variables. Rows come
//! out in the order the matcher discovers them. Duplicates are kept unless
//! the query asks for distinct results.

use std::collections::HashSet;

use crate::entity::EntityId;
use crate::error::EngineError;
use crate::infer::{Binding, Matcher};
use crate::registry::EntityRegistry;
use crate::rules::{Query, Variable};
use crate::store::FactStore;

/// The projected result of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    name: String,
    columns: Vec<Variable>,
    rows: Vec<Vec<EntityId>>,
}

impl QueryResult {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Variable] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<EntityId>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, var: &str) -> Option<usize> {
        let var = var.strip_prefix('?').unwrap_or(var);
        self.columns.iter().position(|c| c.name() == var)
    }

    /// Every value of one column, in row order.
    pub fn column(&self, var: &str) -> Option<Vec<EntityId>> {
        let idx = self.column_index(var)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// The value of `var` in row `row`.
    pub fn value(&self, row: usize, var: &str) -> Option<EntityId> {
        let idx = self.column_index(var)?;
        self.rows.get(row).map(|r| r[idx])
    }
}

/// Evaluate `query` against a (typically saturated) store.
pub fn run(query: &Query, store: &FactStore, registry: &EntityRegistry) -> QueryResult {
    let mut seen = HashSet::new();
    let rows: Vec<Vec<EntityId>> = Matcher::new(store, registry)
        .solve(query.plan(), Binding::new())
        .filter_map(|binding| {
            query
                .projection()
                .iter()
                .map(|var| binding.get(var))
                .collect::<Option<Vec<_>>>()
        })
        .filter(|row| !query.is_distinct() || seen.insert(row.clone()))
        .collect();

    tracing::debug!(query = query.name(), rows = rows.len(), "query evaluated");
    QueryResult {
        name: query.name().to_string(),
        columns: query.projection().to_vec(),
        rows,
    }
}

/// Named queries, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    queries: Vec<Query>,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a query. A query with the same name is replaced.
    pub fn register(&mut self, query: Query) {
        match self.queries.iter_mut().find(|q| q.name() == query.name()) {
            Some(existing) => {
                tracing::debug!(query = query.name(), "replacing registered query");
                *existing = query;
            }
            None => self.queries.push(query),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Query> {
        self.queries.iter().find(|q| q.name() == name)
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn run_named(
        &self,
        name: &str,
        store: &FactStore,
        registry: &EntityRegistry,
    ) -> Result<QueryResult, EngineError> {
        let query = self.get(name).ok_or_else(|| EngineError::QueryNotFound {
            name: name.to_string(),
        })?;
        Ok(run(query, store, registry))
    }

    /// Run every registered query, in registration order.
    pub fn run_all(&self, store: &FactStore, registry: &EntityRegistry) -> Vec<QueryResult> {
        self.queries
            .iter()
            .map(|q| run(q, store, registry))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::infer::BuiltinOp;
    use crate::rules::{Atom, Term};
    use crate::store::Fact;

    struct Kb {
        registry: EntityRegistry,
        store: FactStore,
        person: EntityId,
        speaks: EntityId,
        john: EntityId,
        mary: EntityId,
        english: EntityId,
        french: EntityId,
    }

    fn kb() -> Kb {
        let registry = EntityRegistry::new();
        let person = registry.intern("Person", EntityKind::Class).unwrap();
        let speaks = registry.intern("speaksLanguage", EntityKind::ObjectProperty).unwrap();
        let john = registry.intern("John", EntityKind::Individual).unwrap();
        let mary = registry.intern("Mary", EntityKind::Individual).unwrap();
        let english = registry.intern("English", EntityKind::Individual).unwrap();
        let french = registry.intern("French", EntityKind::Individual).unwrap();
        let mut store = FactStore::new();
        store.assert(Fact::membership(john, person));
        store.assert(Fact::link(speaks, john, english));
        Kb {
            registry,
            store,
            person,
            speaks,
            john,
            mary,
            english,
            french,
        }
    }

    fn languages_query(kb: &Kb) -> Query {
        Query::new(
            "languages",
            vec![
                Atom::class(kb.person, Term::var("x")),
                Atom::property(kb.speaks, Term::var("x"), Term::var("y")),
            ],
            vec![Variable::new("y")],
        )
        .unwrap()
    }

    #[test]
    fn projects_selected_variable() {
        let kb = kb();
        let result = run(&languages_query(&kb), &kb.store, &kb.registry);
        assert_eq!(result.rows(), &[vec![kb.english]]);
        assert_eq!(result.column("y"), Some(vec![kb.english]));
        assert_eq!(result.value(0, "?y"), Some(kb.english));
        assert_eq!(result.column("x"), None);
    }

    #[test]
    fn duplicates_kept_unless_distinct() {
        let mut kb = kb();
        kb.store.assert(Fact::membership(kb.mary, kb.person));
        kb.store.assert(Fact::link(kb.speaks, kb.mary, kb.english));
        kb.store.assert(Fact::link(kb.speaks, kb.mary, kb.french));

        let query = languages_query(&kb);
        let all = run(&query, &kb.store, &kb.registry);
        assert_eq!(all.column("y"), Some(vec![kb.english, kb.english, kb.french]));

        let distinct = run(&query.distinct(), &kb.store, &kb.registry);
        assert_eq!(distinct.column("y"), Some(vec![kb.english, kb.french]));
    }

    #[test]
    fn multi_column_projection_follows_projection_order() {
        let kb = kb();
        let query = Query::new(
            "pairs",
            vec![Atom::property(kb.speaks, Term::var("x"), Term::var("y"))],
            vec![Variable::new("y"), Variable::new("x")],
        )
        .unwrap();
        let result = run(&query, &kb.store, &kb.registry);
        assert_eq!(result.rows(), &[vec![kb.english, kb.john]]);
    }

    #[test]
    fn builtin_before_its_bindings_still_filters() {
        let mut kb = kb();
        kb.store.assert(Fact::link(kb.speaks, kb.john, kb.french));
        let query = Query::new(
            "not-english",
            vec![
                Atom::builtin(BuiltinOp::NotEqual, vec![Term::var("y"), Term::from(kb.english)]),
                Atom::property(kb.speaks, Term::var("x"), Term::var("y")),
            ],
            vec![Variable::new("y")],
        )
        .unwrap();
        let result = run(&query, &kb.store, &kb.registry);
        assert_eq!(result.column("y"), Some(vec![kb.french]));
    }

    #[test]
    fn named_queries() {
        let kb = kb();
        let mut engine = QueryEngine::new();
        engine.register(languages_query(&kb));
        engine.register(languages_query(&kb));
        assert_eq!(engine.len(), 1);

        let result = engine.run_named("languages", &kb.store, &kb.registry).unwrap();
        assert_eq!(result.name(), "languages");
        assert!(matches!(
            engine.run_named("missing", &kb.store, &kb.registry),
            Err(EngineError::QueryNotFound { .. })
        ));
        assert_eq!(engine.run_all(&kb.store, &kb.registry).len(), 1);
    }
}
