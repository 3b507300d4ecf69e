//! Knowledge-base documents in JSON or TOML.
//!
//! A document names entities as strings; [`crate::engine::Engine::load_document`]
//! interns them. Entities referenced without a declaration get the kind
//! implied by where they appear.
//!
//! ```toml
//! [declarations]
//! classes = ["Person", "EnglishSpeaker"]
//! object_properties = ["speaksLanguage"]
//!
//! [[axioms]]
//! type = "sub_class_of"
//! sub = "EnglishSpeaker"
//! sup = "Person"
//!
//! [[facts]]
//! individual = "John"
//! class = "Person"
//!
//! [[facts]]
//! subject = "John"
//! property = "speaksLanguage"
//! object = "English"
//!
//! [[rules]]
//! name = "english"
//! text = "Person(?x) ^ speaksLanguage(?x, English) -> EnglishSpeaker(?x)"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub declarations: Declarations,
    pub axioms: Vec<AxiomDoc>,
    pub facts: Vec<FactDoc>,
    pub rules: Vec<RuleDoc>,
    pub queries: Vec<QueryDoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Declarations {
    pub classes: Vec<String>,
    pub object_properties: Vec<String>,
    pub data_properties: Vec<String>,
    pub individuals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxiomDoc {
    SubClassOf { sub: ClassExprDoc, sup: ClassExprDoc },
    EquivalentClasses { classes: Vec<ClassExprDoc> },
    DisjointClasses { classes: Vec<String> },
}

/// A class name, `{ intersection_of = [...] }` or
/// `{ property = "...", has_value = "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassExprDoc {
    Named(String),
    Intersection {
        intersection_of: Vec<ClassExprDoc>,
    },
    HasValue {
        property: String,
        has_value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactDoc {
    Membership {
        individual: String,
        class: String,
    },
    Link {
        subject: String,
        property: String,
        object: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDoc {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDoc {
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn from_json_str(input: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(input).map_err(|e| DocumentError::Json {
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(input: &str) -> Result<Self, DocumentError> {
        toml::from_str(input).map_err(|e| DocumentError::Toml {
            message: e.to_string(),
        })
    }

    /// Read a `.json` or `.toml` document, chosen by extension.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, DocumentError> = match extension.as_deref() {
            Some("json") => Self::from_json_str,
            Some("toml") => Self::from_toml_str,
            _ => {
                return Err(DocumentError::UnsupportedFormat {
                    path: path.display().to_string(),
                });
            }
        };

        let content = std::fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let document = parse(&content)?;
        tracing::debug!(
            path = %path.display(),
            axioms = document.axioms.len(),
            facts = document.facts.len(),
            rules = document.rules.len(),
            queries = document.queries.len(),
            "document read"
        );
        Ok(document)
    }
}
