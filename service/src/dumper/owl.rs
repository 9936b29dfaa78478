//! OWL functional syntax output
//!
//! Classes annotated `owl: Class` (or `owl: NamedIndividual`) turn each of
//! their identified instances into an OWL entity. Slot annotations choose
//! the axiom a slot value becomes:
//!
//! | `owl` annotation                    | axiom                                          |
//! |-------------------------------------|------------------------------------------------|
//! | `AnnotationAssertion`               | `AnnotationAssertion(p s v)`                   |
//! | `SubClassOf`                        | `SubClassOf(s v)`                              |
//! | `SubClassOf, ObjectSomeValuesFrom`  | `SubClassOf(s ObjectSomeValuesFrom(p v))`      |
//! | `ClassAssertion`                    | `ClassAssertion(v s)`                          |
//! | `ObjectPropertyAssertion`           | `ObjectPropertyAssertion(p s v)`               |
//! | `DataPropertyAssertion`             | `DataPropertyAssertion(p s v)`                 |

use cas_linkml_core::{
    error::Result,
    prefixes::{BASE_PREFIX, PrefixMap},
    types::SlotDefinition,
};
use indexmap::IndexSet;
use std::fmt;

use super::is_prefix_name;
use crate::decorator::OWL_ANNOTATION;
use crate::instance::{InstanceObject, InstanceValue};
use crate::schema_view::{BuiltinType, SchemaView};

const STANDARD_PREFIXES: [(&str, &str); 5] = [
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("xml", "http://www.w3.org/XML/1998/namespace"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
];

/// OWL entity kinds that can be declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// `Class`
    Class,
    /// `NamedIndividual`
    NamedIndividual,
    /// `ObjectProperty`
    ObjectProperty,
    /// `DataProperty`
    DataProperty,
    /// `AnnotationProperty`
    AnnotationProperty,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Class => "Class",
            Self::NamedIndividual => "NamedIndividual",
            Self::ObjectProperty => "ObjectProperty",
            Self::DataProperty => "DataProperty",
            Self::AnnotationProperty => "AnnotationProperty",
        })
    }
}

/// A literal with an optional datatype IRI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwlLiteral {
    /// Lexical form
    pub lexical: String,
    /// Datatype IRI; plain string when absent
    pub datatype: Option<String>,
}

impl fmt::Display for OwlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape(&self.lexical))?;
        if let Some(datatype) = &self.datatype {
            write!(f, "^^<{datatype}>")?;
        }
        Ok(())
    }
}

/// Annotation value: an IRI or a literal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationTarget {
    /// IRI
    Iri(String),
    /// Literal
    Literal(OwlLiteral),
}

impl fmt::Display for AnnotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::Literal(literal) => literal.fmt(f),
        }
    }
}

/// Class expression used as a superclass
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassExpression {
    /// Named class
    Class(String),
    /// `ObjectSomeValuesFrom(property filler)`
    ObjectSomeValuesFrom {
        /// Object property IRI
        property: String,
        /// Filler class IRI
        filler: String,
    },
}

impl fmt::Display for ClassExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(iri) => write!(f, "<{iri}>"),
            Self::ObjectSomeValuesFrom { property, filler } => {
                write!(f, "ObjectSomeValuesFrom(<{property}> <{filler}>)")
            }
        }
    }
}

/// OWL axiom
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Axiom {
    /// `Declaration(Kind(iri))`
    Declaration {
        /// Entity kind
        kind: EntityKind,
        /// Entity IRI
        iri: String,
    },
    /// `AnnotationAssertion(property subject value)`
    AnnotationAssertion {
        /// Annotation property IRI
        property: String,
        /// Subject IRI
        subject: String,
        /// Value
        value: AnnotationTarget,
    },
    /// `SubClassOf(sub super)`
    SubClassOf {
        /// Subclass IRI
        sub: String,
        /// Superclass expression
        sup: ClassExpression,
    },
    /// `ClassAssertion(class individual)`
    ClassAssertion {
        /// Class IRI
        class: String,
        /// Individual IRI
        individual: String,
    },
    /// `ObjectPropertyAssertion(property subject object)`
    ObjectPropertyAssertion {
        /// Property IRI
        property: String,
        /// Subject IRI
        subject: String,
        /// Object IRI
        object: String,
    },
    /// `DataPropertyAssertion(property subject literal)`
    DataPropertyAssertion {
        /// Property IRI
        property: String,
        /// Subject IRI
        subject: String,
        /// Value
        value: OwlLiteral,
    },
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration { kind, iri } => write!(f, "Declaration({kind}(<{iri}>))"),
            Self::AnnotationAssertion {
                property,
                subject,
                value,
            } => write!(f, "AnnotationAssertion(<{property}> <{subject}> {value})"),
            Self::SubClassOf { sub, sup } => write!(f, "SubClassOf(<{sub}> {sup})"),
            Self::ClassAssertion { class, individual } => {
                write!(f, "ClassAssertion(<{class}> <{individual}>)")
            }
            Self::ObjectPropertyAssertion {
                property,
                subject,
                object,
            } => write!(f, "ObjectPropertyAssertion(<{property}> <{subject}> <{object}>)"),
            Self::DataPropertyAssertion {
                property,
                subject,
                value,
            } => write!(f, "DataPropertyAssertion(<{property}> <{subject}> {value})"),
        }
    }
}

/// An ontology ready to be written as functional syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyDocument {
    /// Ontology IRI
    pub iri: String,
    /// Declared prefixes, standard OWL prefixes first
    pub prefixes: Vec<(String, String)>,
    /// Axioms in insertion order, without duplicates
    pub axioms: IndexSet<Axiom>,
}

impl OntologyDocument {
    /// Empty ontology with the standard prefixes and those of `prefixes`
    #[must_use]
    pub fn new(iri: impl Into<String>, prefixes: &PrefixMap) -> Self {
        let mut declared: Vec<(String, String)> = STANDARD_PREFIXES
            .iter()
            .map(|(p, ns)| ((*p).to_string(), (*ns).to_string()))
            .collect();
        for (prefix, namespace) in prefixes.iter() {
            if prefix != BASE_PREFIX
                && is_prefix_name(prefix)
                && !declared.iter().any(|(p, _)| p == prefix)
            {
                declared.push((prefix.to_string(), namespace.to_string()));
            }
        }
        Self {
            iri: iri.into(),
            prefixes: declared,
            axioms: IndexSet::new(),
        }
    }

    /// Add an axiom; returns false when it was already present
    pub fn add(&mut self, axiom: Axiom) -> bool {
        self.axioms.insert(axiom)
    }
}

impl fmt::Display for OntologyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, namespace) in &self.prefixes {
            writeln!(f, "Prefix({prefix}:=<{namespace}>)")?;
        }
        writeln!(f)?;
        writeln!(f, "Ontology(<{}>", self.iri)?;
        for axiom in &self.axioms {
            writeln!(f, "{axiom}")?;
        }
        writeln!(f, ")")
    }
}

/// Builds OWL axioms from instance trees
pub struct OwlDumper<'a> {
    view: &'a SchemaView,
}

impl<'a> OwlDumper<'a> {
    /// Dumper driven by the `owl` annotations of `view`'s schema
    #[must_use]
    pub fn new(view: &'a SchemaView) -> Self {
        Self { view }
    }

    /// Translate an instance tree into an ontology document
    ///
    /// # Errors
    ///
    /// Returns `LinkMLError::UnknownPrefix` for identifiers or meanings no
    /// prefix expands, and schema errors for unresolvable slots.
    pub fn to_ontology_document(
        &self,
        instance: &InstanceObject,
        ontology_iri: &str,
    ) -> Result<OntologyDocument> {
        let mut document = OntologyDocument::new(ontology_iri, self.view.prefix_map());

        for object in instance.walk() {
            let Some(kind) = self.entity_kind(&object.class_name)? else {
                continue;
            };
            let Some(identifier) = &object.identifier else {
                tracing::debug!(class = %object.class_name, "skipping object without identifier");
                continue;
            };
            let subject = self.expand(identifier)?;
            document.add(Axiom::Declaration {
                kind,
                iri: subject.clone(),
            });
            if kind == EntityKind::NamedIndividual {
                document.add(Axiom::ClassAssertion {
                    class: self.expand(&self.view.class_uri(&object.class_name)?)?,
                    individual: subject.clone(),
                });
            }

            for (slot_name, value) in &object.fields {
                let slot = self.view.induced_slot(slot_name, &object.class_name)?;
                let template = slot
                    .annotations
                    .get(OWL_ANNOTATION)
                    .map(|a| a.items())
                    .unwrap_or_default();
                if template.is_empty() {
                    continue;
                }
                for item in value.items() {
                    self.slot_axioms(&mut document, &subject, &slot, &template, item)?;
                }
            }
        }

        for axiom in &document.axioms {
            tracing::debug!(%axiom, "AXIOM");
        }
        tracing::info!(
            ontology = ontology_iri,
            axioms = document.axioms.len(),
            "built OWL ontology"
        );
        Ok(document)
    }

    /// OWL entity kind of a class, from its own or an inherited annotation
    fn entity_kind(&self, class_name: &str) -> Result<Option<EntityKind>> {
        for ancestor in self.view.class_ancestors(class_name)? {
            let class = self.view.get_class(&ancestor)?;
            let Some(annotation) = class.annotations.get(OWL_ANNOTATION) else {
                continue;
            };
            for item in annotation.items() {
                match item.as_str() {
                    "Class" => return Ok(Some(EntityKind::Class)),
                    "NamedIndividual" | "Individual" => {
                        return Ok(Some(EntityKind::NamedIndividual));
                    }
                    _ => {}
                }
            }
        }
        Ok(None)
    }

    fn slot_axioms(
        &self,
        document: &mut OntologyDocument,
        subject: &str,
        slot: &SlotDefinition,
        template: &[String],
        value: &InstanceValue,
    ) -> Result<()> {
        let property = self.expand(&self.view.slot_uri(slot))?;
        let builtin = self.view.range_builtin(slot)?;
        let has = |name: &str| template.iter().any(|t| t == name);

        if has("SubClassOf") {
            let Some(target) = self.value_iri(value)? else {
                tracing::warn!(slot = %slot.name, "SubClassOf value is not an entity; skipped");
                return Ok(());
            };
            let sup = if has("ObjectSomeValuesFrom") {
                document.add(Axiom::Declaration {
                    kind: EntityKind::ObjectProperty,
                    iri: property.clone(),
                });
                ClassExpression::ObjectSomeValuesFrom {
                    property,
                    filler: target,
                }
            } else {
                ClassExpression::Class(target)
            };
            document.add(Axiom::SubClassOf {
                sub: subject.to_string(),
                sup,
            });
            return Ok(());
        }

        if has("AnnotationAssertion") {
            let target = match self.value_iri(value)? {
                Some(iri) if !matches!(value, InstanceValue::String(_)) => {
                    AnnotationTarget::Iri(iri)
                }
                _ => match literal(value, builtin) {
                    Some(literal) => AnnotationTarget::Literal(literal),
                    None => return Ok(()),
                },
            };
            document.add(Axiom::Declaration {
                kind: EntityKind::AnnotationProperty,
                iri: property.clone(),
            });
            document.add(Axiom::AnnotationAssertion {
                property,
                subject: subject.to_string(),
                value: target,
            });
            return Ok(());
        }

        if has("ClassAssertion") {
            if let Some(class) = self.value_iri(value)? {
                document.add(Axiom::ClassAssertion {
                    class,
                    individual: subject.to_string(),
                });
            }
            return Ok(());
        }

        if has("ObjectPropertyAssertion") {
            if let Some(object) = self.value_iri(value)? {
                document.add(Axiom::Declaration {
                    kind: EntityKind::ObjectProperty,
                    iri: property.clone(),
                });
                document.add(Axiom::ObjectPropertyAssertion {
                    property,
                    subject: subject.to_string(),
                    object,
                });
            }
            return Ok(());
        }

        if has("DataPropertyAssertion") {
            if let Some(value) = literal(value, builtin) {
                document.add(Axiom::Declaration {
                    kind: EntityKind::DataProperty,
                    iri: property.clone(),
                });
                document.add(Axiom::DataPropertyAssertion {
                    property,
                    subject: subject.to_string(),
                    value,
                });
            }
            return Ok(());
        }

        tracing::warn!(slot = %slot.name, template = ?template, "unsupported owl annotation");
        Ok(())
    }

    /// IRI a value denotes, if it denotes an entity
    fn value_iri(&self, value: &InstanceValue) -> Result<Option<String>> {
        match value {
            InstanceValue::Reference { id, .. } => self.expand(id).map(Some),
            InstanceValue::Object(object) => object
                .identifier
                .as_deref()
                .map(|id| self.expand(id))
                .transpose(),
            InstanceValue::Enum {
                meaning: Some(meaning),
                ..
            } => self.expand(meaning).map(Some),
            InstanceValue::Uri(uri) => self.expand(uri).map(Some),
            // bare strings in a class position are read as identifiers
            InstanceValue::String(s) if s.contains(':') => Ok(self.expand(s).ok()),
            _ => Ok(None),
        }
    }

    fn expand(&self, curie: &str) -> Result<String> {
        self.view.expand_curie(curie)
    }
}

/// Literal for a value; `builtin` is the type the slot range ends in
fn literal(value: &InstanceValue, builtin: Option<BuiltinType>) -> Option<OwlLiteral> {
    let (lexical, datatype) = match value {
        InstanceValue::String(s) => (s.clone(), None),
        InstanceValue::Enum { text, .. } => (text.clone(), None),
        InstanceValue::Integer(i) => (i.to_string(), Some(BuiltinType::Integer)),
        InstanceValue::Float(x) => (
            x.to_string(),
            Some(builtin.filter(|b| *b == BuiltinType::Float).unwrap_or(BuiltinType::Double)),
        ),
        InstanceValue::Boolean(b) => (b.to_string(), Some(BuiltinType::Boolean)),
        InstanceValue::Date(d) => (d.clone(), Some(BuiltinType::Date)),
        InstanceValue::Datetime(d) => (d.clone(), Some(BuiltinType::Datetime)),
        InstanceValue::Uri(u) => (u.clone(), Some(BuiltinType::Uri)),
        InstanceValue::Reference { id, .. } => (id.clone(), None),
        InstanceValue::Object(_) | InstanceValue::List(_) | InstanceValue::Opaque(_) => {
            return None;
        }
    };
    Some(OwlLiteral {
        lexical,
        datatype: datatype.map(|t| t.xsd_iri().to_string()),
    })
}

fn escape(lexical: &str) -> String {
    lexical.replace('\\', "\\\\").replace('"', "\\\"")
}
