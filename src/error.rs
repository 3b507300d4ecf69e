//! Rich diagnostic error types for the ontorule engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. The top-level [`OntoError`] wraps them
//! all so callers can propagate with `?` and still see the full diagnostic.

use miette::Diagnostic;
use thiserror::Error;

use crate::entity::EntityKind;

/// Top-level error type for the ontorule engine.
#[derive(Debug, Error, Diagnostic)]
pub enum OntoError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("entity '{name}' is already registered as {existing}, cannot re-register as {requested}")]
    #[diagnostic(
        code(ontorule::registry::kind_conflict),
        help(
            "An entity name identifies exactly one entity. Rename one of the \
             entities, or use the kind it was first declared with."
        )
    )]
    KindConflict {
        name: String,
        existing: EntityKind,
        requested: EntityKind,
    },

    #[error("entity not found: {name}")]
    #[diagnostic(
        code(ontorule::registry::not_found),
        help("Declare the entity, or reference it in a fact, before looking it up.")
    )]
    NotFound { name: String },

    #[error("'{name}' is ambiguous: it could be any of {candidates:?}")]
    #[diagnostic(
        code(ontorule::registry::ambiguous),
        help("Write the full qualified name to pick one.")
    )]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("entity id space exhausted: cannot allocate more than u32::MAX entities")]
    #[diagnostic(
        code(ontorule::registry::exhausted),
        help("A single session cannot hold more than 2^32 - 1 entities.")
    )]
    Exhausted,
}

// ---------------------------------------------------------------------------
// Rule / query construction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RuleError {
    #[error("malformed rule '{rule}': head variable ?{variable} does not occur in the body")]
    #[diagnostic(
        code(ontorule::rule::malformed_rule),
        help(
            "Every variable used in a rule head must be bound by a class or \
             property atom in the body."
        )
    )]
    MalformedRule { rule: String, variable: String },

    #[error("malformed query '{query}': projected variable ?{variable} does not occur in the body")]
    #[diagnostic(
        code(ontorule::rule::malformed_query),
        help("Only variables bound by a class or property atom in the body can be selected.")
    )]
    MalformedQuery { query: String, variable: String },

    #[error("'{name}' has an empty body")]
    #[diagnostic(
        code(ontorule::rule::empty_body),
        help("Rules and queries need at least one body atom to match against.")
    )]
    EmptyBody { name: String },

    #[error("builtin {builtin} in '{name}' takes {expected} arguments, got {actual}")]
    #[diagnostic(
        code(ontorule::rule::builtin_arity),
        help("Comparison builtins are binary: swrlb:lessThan(?a, ?b).")
    )]
    BuiltinArity {
        name: String,
        builtin: String,
        expected: usize,
        actual: usize,
    },

    #[error("builtin {builtin} cannot appear in the head of rule '{rule}'")]
    #[diagnostic(
        code(ontorule::rule::builtin_in_head),
        help("Builtins are filters; rule heads may only contain class and property atoms.")
    )]
    BuiltinInHead { rule: String, builtin: String },
}

// ---------------------------------------------------------------------------
// Matching errors
// ---------------------------------------------------------------------------

/// Errors raised while evaluating a single atom against a binding.
///
/// These never escape `solve`: a failing builtin only prunes its branch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MatchError {
    #[error("builtin {builtin} argument ?{variable} is unbound")]
    #[diagnostic(
        code(ontorule::matching::unbound_builtin_argument),
        help("Place the builtin after the atoms that bind its arguments.")
    )]
    UnboundBuiltinArgument { builtin: String, variable: String },
}

// ---------------------------------------------------------------------------
// Text parser errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("syntax error in '{input}': {message}")]
    #[diagnostic(
        code(ontorule::parse::syntax),
        help(
            "Rules look like `Person(?x) ^ speaksLanguage(?x, English) -> EnglishSpeaker(?x)`; \
             queries end in `-> sqwrl:select(?x)`."
        )
    )]
    Syntax { input: String, message: String },

    #[error("unknown predicate '{name}'")]
    #[diagnostic(
        code(ontorule::parse::unknown_predicate),
        help("Atom names must be declared classes or properties.")
    )]
    UnknownPredicate { name: String },

    #[error("unknown builtin '{name}'")]
    #[diagnostic(
        code(ontorule::parse::unknown_builtin),
        help(
            "Supported builtins: swrlb:equal, swrlb:notEqual, swrlb:lessThan, \
             swrlb:lessThanOrEqual, swrlb:greaterThan, swrlb:greaterThanOrEqual."
        )
    )]
    UnknownBuiltin { name: String },

    #[error("'{name}' is a {kind} and takes {expected} argument(s), got {actual}")]
    #[diagnostic(
        code(ontorule::parse::arity),
        help("Class atoms take one argument, property atoms take two.")
    )]
    Arity {
        name: String,
        kind: EntityKind,
        expected: usize,
        actual: usize,
    },
}

// ---------------------------------------------------------------------------
// Document errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    #[error("failed to read {path}")]
    #[diagnostic(
        code(ontorule::document::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON knowledge base: {message}")]
    #[diagnostic(
        code(ontorule::document::json),
        help("The document must be an object with declarations, axioms, facts, rules and queries.")
    )]
    Json { message: String },

    #[error("invalid TOML: {message}")]
    #[diagnostic(
        code(ontorule::document::toml),
        help("Check the TOML syntax and the field names.")
    )]
    Toml { message: String },

    #[error("unsupported document format: {path}")]
    #[diagnostic(
        code(ontorule::document::format),
        help("Use a .json or .toml file.")
    )]
    UnsupportedFormat { path: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("no query named '{name}'")]
    #[diagnostic(
        code(ontorule::engine::query_not_found),
        help("Register the query with `Engine::add_query_text` or in the document first.")
    )]
    QueryNotFound { name: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(ontorule::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },
}

/// Convenience alias for functions returning ontorule results.
pub type OntoResult<T> = std::result::Result<T, OntoError>;
