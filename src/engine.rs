//! Engine facade: top-level API for ontorule.
//!
//! The `Engine` owns the entity registry, the axioms, the fact store, the
//! rules and the named queries, and wires them into the batch pipeline
//! load → classify → saturate → query. Query-vs-saturate ordering is left
//! to the caller: a query run before `saturate` sees only asserted facts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::axiom::{Axiom, AxiomSet, ClassExpr};
use crate::classify::{Classification, Hierarchy, classify};
use crate::document::{AxiomDoc, ClassExprDoc, Document, FactDoc};
use crate::entity::{EntityId, EntityKind};
use crate::error::{DocumentError, EngineError, OntoResult, RegistryError};
use crate::infer::{RuleEngine, RuleEngineConfig, SaturationResult, subsumption_rules};
use crate::query::{QueryEngine, QueryResult};
use crate::registry::EntityRegistry;
use crate::rules::{Query, Rule, parse_query, parse_rule};
use crate::store::{Fact, FactPattern, FactStore};

/// Configuration for the ontorule engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Only re-run rules whose body inputs changed (default: true).
    pub semi_naive: bool,
    /// Evaluate rule bodies in parallel (default: false).
    pub parallel: bool,
    /// Pass cap for saturation. `None` runs to the fixpoint.
    pub max_passes: Option<usize>,
    /// Also derive memberships entailed by the class hierarchy (default: false).
    pub materialize_hierarchy: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            semi_naive: true,
            parallel: false,
            max_passes: None,
            materialize_hierarchy: false,
        }
    }
}

impl EngineConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> OntoResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| DocumentError::Toml {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_passes == Some(0) {
            return Err(EngineError::InvalidConfig {
                message: "max_passes must be at least 1".into(),
            });
        }
        Ok(())
    }

    fn rule_engine(&self) -> RuleEngineConfig {
        RuleEngineConfig {
            semi_naive: self.semi_naive,
            parallel: self.parallel,
            max_passes: self.max_passes,
        }
    }
}

/// What a document load added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub axioms: usize,
    /// Newly asserted facts; duplicates are not counted.
    pub facts: usize,
    pub rules: usize,
    pub queries: usize,
}

/// The ontorule inference and query engine.
pub struct Engine {
    config: EngineConfig,
    registry: EntityRegistry,
    axioms: AxiomSet,
    store: FactStore,
    rules: Vec<Rule>,
    queries: QueryEngine,
}

impl Engine {
    /// Create an empty engine with the given configuration.
    pub fn new(config: EngineConfig) -> OntoResult<Self> {
        config.validate()?;
        tracing::info!(
            semi_naive = config.semi_naive,
            parallel = config.parallel,
            materialize_hierarchy = config.materialize_hierarchy,
            "initializing ontorule engine"
        );
        Ok(Self {
            config,
            registry: EntityRegistry::new(),
            axioms: AxiomSet::new(),
            store: FactStore::new(),
            rules: Vec::new(),
            queries: QueryEngine::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn axioms(&self) -> &AxiomSet {
        &self.axioms
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn queries(&self) -> &[Query] {
        self.queries.queries()
    }

    // -----------------------------------------------------------------------
    // Building the knowledge base
    // -----------------------------------------------------------------------

    /// Intern `name` as `kind`, recording a declaration axiom.
    pub fn declare(&mut self, name: &str, kind: EntityKind) -> OntoResult<EntityId> {
        let id = self.registry.intern(name, kind)?;
        self.axioms.add(Axiom::Declaration(id));
        Ok(id)
    }

    /// Assert a ground fact. Returns whether it was new.
    pub fn assert_fact(&mut self, fact: Fact) -> bool {
        self.store.assert(fact)
    }

    pub fn add_axiom(&mut self, axiom: Axiom) {
        self.axioms.add(axiom);
    }

    /// Add a rule. A rule with the same name is replaced.
    pub fn add_rule(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|r| r.name() == rule.name()) {
            Some(existing) => {
                tracing::debug!(rule = rule.name(), "replacing rule");
                *existing = rule;
            }
            None => self.rules.push(rule),
        }
    }

    pub fn add_query(&mut self, query: Query) {
        self.queries.register(query);
    }

    pub fn add_rule_text(&mut self, name: &str, text: &str) -> OntoResult<()> {
        let rule = parse_rule(name, text, &self.registry)?;
        self.add_rule(rule);
        Ok(())
    }

    pub fn add_query_text(&mut self, name: &str, text: &str) -> OntoResult<()> {
        let query = parse_query(name, text, &self.registry)?;
        self.add_query(query);
        Ok(())
    }

    /// Intern everything in `doc` and add it to the knowledge base.
    ///
    /// Declarations are processed first, then axioms, facts, rules and
    /// queries, so rule text may reference any entity the document names.
    pub fn load_document(&mut self, doc: &Document) -> OntoResult<LoadSummary> {
        let mut summary = LoadSummary::default();
        let decls = &doc.declarations;
        for (names, kind) in [
            (&decls.classes, EntityKind::Class),
            (&decls.object_properties, EntityKind::ObjectProperty),
            (&decls.data_properties, EntityKind::DataProperty),
            (&decls.individuals, EntityKind::Individual),
        ] {
            for name in names {
                self.declare(name, kind)?;
                summary.axioms += 1;
            }
        }

        for axiom in &doc.axioms {
            let axiom = match axiom {
                AxiomDoc::SubClassOf { sub, sup } => Axiom::SubClassOf {
                    sub: self.class_expr(sub)?,
                    sup: self.class_expr(sup)?,
                },
                AxiomDoc::EquivalentClasses { classes } => Axiom::EquivalentClasses(
                    classes
                        .iter()
                        .map(|c| self.class_expr(c))
                        .collect::<OntoResult<_>>()?,
                ),
                AxiomDoc::DisjointClasses { classes } => Axiom::DisjointClasses(
                    classes
                        .iter()
                        .map(|c| self.registry.intern(c, EntityKind::Class))
                        .collect::<Result<_, _>>()?,
                ),
            };
            self.axioms.add(axiom);
            summary.axioms += 1;
        }

        for fact in &doc.facts {
            let fact = match fact {
                FactDoc::Membership { individual, class } => Fact::membership(
                    self.registry.intern(individual, EntityKind::Individual)?,
                    self.registry.intern(class, EntityKind::Class)?,
                ),
                FactDoc::Link {
                    subject,
                    property,
                    object,
                } => Fact::link(
                    self.property(property)?,
                    self.registry.intern(subject, EntityKind::Individual)?,
                    self.registry.intern(object, EntityKind::Individual)?,
                ),
            };
            if self.store.assert(fact) {
                summary.facts += 1;
            }
        }

        for rule in &doc.rules {
            self.add_rule_text(&rule.name, &rule.text)?;
            summary.rules += 1;
        }
        for query in &doc.queries {
            self.add_query_text(&query.name, &query.text)?;
            summary.queries += 1;
        }

        tracing::info!(
            axioms = summary.axioms,
            facts = summary.facts,
            rules = summary.rules,
            queries = summary.queries,
            entities = self.registry.len(),
            "document loaded"
        );
        Ok(summary)
    }

    /// Read a `.json` or `.toml` document and load it.
    pub fn load_path(&mut self, path: &Path) -> OntoResult<LoadSummary> {
        let doc = Document::from_path(path)?;
        self.load_document(&doc)
    }

    fn class_expr(&self, doc: &ClassExprDoc) -> OntoResult<ClassExpr> {
        Ok(match doc {
            ClassExprDoc::Named(name) => {
                ClassExpr::Named(self.registry.intern(name, EntityKind::Class)?)
            }
            ClassExprDoc::Intersection { intersection_of } => ClassExpr::Intersection(
                intersection_of
                    .iter()
                    .map(|c| self.class_expr(c))
                    .collect::<OntoResult<_>>()?,
            ),
            ClassExprDoc::HasValue {
                property,
                has_value,
            } => ClassExpr::HasValue {
                property: self.property(property)?,
                value: self.registry.intern(has_value, EntityKind::Individual)?,
            },
        })
    }

    /// An existing object or data property, or a new object property.
    fn property(&self, name: &str) -> Result<EntityId, RegistryError> {
        let existing = self
            .registry
            .lookup(name)
            .ok()
            .filter(|id| self.registry.kind(*id).is_some_and(EntityKind::is_property));
        match existing {
            Some(id) => Ok(id),
            None => self.registry.intern(name, EntityKind::ObjectProperty),
        }
    }

    // -----------------------------------------------------------------------
    // Reasoning
    // -----------------------------------------------------------------------

    /// Classify the current axioms and facts.
    pub fn classify(&self) -> Classification {
        classify(&self.registry, &self.axioms, &self.store)
    }

    /// Run every rule to a fixpoint.
    pub fn saturate(&mut self) -> OntoResult<SaturationResult> {
        let mut rules = self.rules.clone();
        if self.config.materialize_hierarchy {
            let hierarchy = Hierarchy::build(&self.registry, &self.axioms);
            rules.extend(subsumption_rules(&hierarchy)?);
        }
        let engine = RuleEngine::new(self.config.rule_engine()).with_rules(rules);
        Ok(engine.saturate(&mut self.store, &self.registry))
    }

    /// Run a registered query by name.
    pub fn run_query(&self, name: &str) -> OntoResult<QueryResult> {
        Ok(self.queries.run_named(name, &self.store, &self.registry)?)
    }

    pub fn run(&self, query: &Query) -> QueryResult {
        crate::query::run(query, &self.store, &self.registry)
    }

    /// Every registered query, in registration order.
    pub fn run_all(&self) -> Vec<QueryResult> {
        self.queries.run_all(&self.store, &self.registry)
    }

    pub fn iterate(&self, pattern: FactPattern) -> impl Iterator<Item = &Fact> + '_ {
        self.store.iterate(pattern)
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            classes: self.registry.of_kind(EntityKind::Class).len(),
            object_properties: self.registry.of_kind(EntityKind::ObjectProperty).len(),
            data_properties: self.registry.of_kind(EntityKind::DataProperty).len(),
            individuals: self.registry.of_kind(EntityKind::Individual).len(),
            axioms: self.axioms.len(),
            facts: self.store.len(),
            rules: self.rules.len(),
            queries: self.queries.len(),
        }
    }
}

/// Summary counts of the engine's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub classes: usize,
    pub object_properties: usize,
    pub data_properties: usize,
    pub individuals: usize,
    pub axioms: usize,
    pub facts: usize,
    pub rules: usize,
    pub queries: usize,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ontorule engine info")?;
        writeln!(f, "  classes:           {}", self.classes)?;
        writeln!(f, "  object properties: {}", self.object_properties)?;
        writeln!(f, "  data properties:   {}", self.data_properties)?;
        writeln!(f, "  individuals:       {}", self.individuals)?;
        writeln!(f, "  axioms:            {}", self.axioms)?;
        writeln!(f, "  facts:             {}", self.facts)?;
        writeln!(f, "  rules:             {}", self.rules)?;
        writeln!(f, "  queries:           {}", self.queries)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("facts", &self.store.len())
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OntoError;

    fn english_kb() -> Document {
        Document::from_json_str(
            r#"{
                "declarations": {
                    "classes": ["Person", "EnglishSpeaker"],
                    "object_properties": ["speaksLanguage"]
                },
                "facts": [
                    { "individual": "John", "class": "Person" },
                    { "subject": "John", "property": "speaksLanguage", "object": "English" }
                ],
                "rules": [{
                    "name": "english-speaker",
                    "text": "Person(?x) ^ speaksLanguage(?x, English) -> EnglishSpeaker(?x)"
                }],
                "queries": [{
                    "name": "languages",
                    "text": "Person(?x) ^ speaksLanguage(?x, ?y) -> sqwrl:select(?y)"
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Engine::new(EngineConfig::default()).is_ok());
    }

    #[test]
    fn zero_pass_cap_is_rejected() {
        let err = Engine::new(EngineConfig {
            max_passes: Some(0),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, OntoError::Engine(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn config_loads_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ontorule.toml");
        std::fs::write(&path, "parallel = true\nmax_passes = 10\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(config.parallel);
        assert!(config.semi_naive);
        assert_eq!(config.max_passes, Some(10));
    }

    #[test]
    fn load_saturate_query() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let summary = engine.load_document(&english_kb()).unwrap();
        assert_eq!(summary.facts, 2);
        assert_eq!(summary.rules, 1);

        let result = engine.saturate().unwrap();
        assert_eq!(result.applied, 1);

        let reg = engine.registry();
        let john = reg.lookup("John").unwrap();
        let speaker = reg.lookup("EnglishSpeaker").unwrap();
        assert!(engine.store().contains(&Fact::membership(john, speaker)));

        let rows = engine.run_query("languages").unwrap();
        assert_eq!(rows.column("y"), Some(vec![reg.lookup("English").unwrap()]));
    }

    #[test]
    fn missing_query_is_an_error() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        assert!(matches!(
            engine.run_query("nope"),
            Err(OntoError::Engine(EngineError::QueryNotFound { .. }))
        ));
    }

    #[test]
    fn hierarchy_materialization_is_opt_in() {
        let doc = Document::from_toml_str(
            r#"
            [[axioms]]
            type = "sub_class_of"
            sub = "Man"
            sup = "Person"

            [[facts]]
            individual = "John"
            class = "Man"
            "#,
        )
        .unwrap();

        let mut plain = Engine::new(EngineConfig::default()).unwrap();
        plain.load_document(&doc).unwrap();
        assert_eq!(plain.saturate().unwrap().applied, 0);

        let mut materialized = Engine::new(EngineConfig {
            materialize_hierarchy: true,
            ..Default::default()
        })
        .unwrap();
        materialized.load_document(&doc).unwrap();
        assert_eq!(materialized.saturate().unwrap().applied, 1);
        let person = materialized.registry().lookup("Person").unwrap();
        assert_eq!(materialized.store().class_members(person).len(), 1);
    }

    #[test]
    fn property_used_as_class_conflicts() {
        let doc = Document::from_json_str(
            r#"{
                "facts": [
                    { "subject": "John", "property": "knows", "object": "Mary" },
                    { "individual": "John", "class": "knows" }
                ]
            }"#,
        )
        .unwrap();
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        assert!(matches!(
            engine.load_document(&doc),
            Err(OntoError::Registry(RegistryError::KindConflict { .. }))
        ));
    }

    #[test]
    fn data_properties_are_reused() {
        let doc = Document::from_json_str(
            r#"{
                "declarations": { "data_properties": ["hasAge"] },
                "facts": [ { "subject": "John", "property": "hasAge", "object": "42" } ]
            }"#,
        )
        .unwrap();
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.load_document(&doc).unwrap();
        let age = engine.registry().lookup("hasAge").unwrap();
        assert_eq!(engine.registry().kind(age), Some(EntityKind::DataProperty));
        assert_eq!(engine.iterate(FactPattern::any_link()).count(), 1);
    }

    #[test]
    fn rules_replace_by_name() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.load_document(&english_kb()).unwrap();
        engine
            .add_rule_text("english-speaker", "EnglishSpeaker(?x) -> Person(?x)")
            .unwrap();
        assert_eq!(engine.rules().len(), 1);
    }

    #[test]
    fn info_counts_contents() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.load_document(&english_kb()).unwrap();
        let info = engine.info();
        assert_eq!(info.classes, 2);
        assert_eq!(info.object_properties, 1);
        assert_eq!(info.individuals, 2);
        assert_eq!(info.facts, 2);
        assert_eq!(info.queries, 1);
        assert!(info.to_string().contains("individuals:       2"));
    }
}
