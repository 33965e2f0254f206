//! [RDF/JSON](https://www.w3.org/TR/rdf-json/) reader.

use crate::collection::Collection;
use crate::error::{ErrorLocation, RdfSyntaxError, TextPosition};
use crate::format::RdfFormat;
use crate::iri::sanitize_uri;
use crate::literal::Literal;
use crate::node::ResourceReference;
use oxiri::{Iri, IriParseError};
use serde_json::{Map, Value};

/// A [RDF/JSON](https://www.w3.org/TR/rdf-json/) parser writing into a [`Collection`].
///
/// Subjects starting with `_:` and `"bnode"` objects become blank nodes.
///
/// ```
/// use rdfobjects::{Collection, JsonParser, NamespaceRegistry};
///
/// let file = br#"{
///   "http://example.com/foo": {
///     "http://schema.org/name": [{"type": "literal", "value": "Foo", "lang": "en"}],
///     "http://schema.org/knows": [{"type": "uri", "value": "http://example.com/bar"}]
///   }
/// }"#;
///
/// let mut collection = Collection::with_registry(NamespaceRegistry::new());
/// JsonParser::new().parse_slice(file, &mut collection)?;
/// assert_eq!(collection.uris(), ["http://example.com/foo", "http://example.com/bar"]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct JsonParser {
    base: Option<Iri<String>>,
}

impl JsonParser {
    /// Builds a new [`JsonParser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    #[inline]
    pub(crate) fn with_base(mut self, base: Option<Iri<String>>) -> Self {
        self.base = base;
        self
    }

    pub fn parse_slice(
        &self,
        data: &[u8],
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        let value = serde_json::from_slice::<Value>(data).map_err(|e| {
            let position = TextPosition {
                line: (e.line().saturating_sub(1)) as u64,
                column: (e.column().saturating_sub(1)) as u64,
                offset: 0,
            };
            RdfSyntaxError::new(RdfFormat::Json, e.into()).at(ErrorLocation::Text(position))
        })?;
        self.parse_value(value, collection)
    }

    /// Adds the content of an already decoded RDF/JSON document.
    pub fn parse_value(
        &self,
        value: Value,
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        let Value::Object(subjects) = value else {
            return Err(msg("An RDF/JSON document must be a JSON object"));
        };
        for (subject, predicates) in subjects {
            let subject = self.reference(&subject, false);
            collection.find_or_create_reference(subject.clone());
            let Value::Object(predicates) = predicates else {
                return Err(msg(format!(
                    "The value of the subject {subject} must be a JSON object"
                )));
            };
            for (predicate, objects) in predicates {
                let Value::Array(objects) = objects else {
                    return Err(msg(format!(
                        "The value of the predicate {predicate} must be a JSON array"
                    )));
                };
                for object in objects {
                    let Value::Object(object) = object else {
                        return Err(msg(format!(
                            "The objects of the predicate {predicate} must be JSON objects"
                        )));
                    };
                    self.assert_object(&subject, &predicate, &object, collection)?;
                }
            }
        }
        Ok(())
    }

    fn assert_object(
        &self,
        subject: &ResourceReference,
        predicate: &str,
        object: &Map<String, Value>,
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        let value = string_entry(object, "value")?
            .ok_or_else(|| msg(format!("An object of {predicate} has no value")))?;
        match string_entry(object, "type")? {
            Some("uri") => {
                let object = self.reference(value, false);
                collection
                    .assert_link(subject, predicate, &object)
                    .map_err(|e| RdfSyntaxError::new(RdfFormat::Json, e.into()))
            }
            Some("bnode") => {
                let object = self.reference(value, true);
                collection
                    .assert_link(subject, predicate, &object)
                    .map_err(|e| RdfSyntaxError::new(RdfFormat::Json, e.into()))
            }
            Some("literal") => {
                let literal = Literal::new(
                    value,
                    string_entry(object, "datatype")?,
                    string_entry(object, "lang")?,
                )
                .map_err(|e| RdfSyntaxError::new(RdfFormat::Json, e.into()))?;
                collection
                    .assert_literal(subject, predicate, literal)
                    .map_err(|e| RdfSyntaxError::new(RdfFormat::Json, e.into()))
            }
            Some(kind) => Err(msg(format!("Unknown RDF/JSON object type '{kind}'"))),
            None => Err(msg(format!("An object of {predicate} has no type"))),
        }
    }

    fn reference(&self, value: &str, blank: bool) -> ResourceReference {
        if let Some(id) = value.strip_prefix("_:") {
            ResourceReference::blank_node(id)
        } else if blank {
            ResourceReference::blank_node(value)
        } else {
            ResourceReference::from_key(&sanitize_uri(value, self.base.as_ref()))
        }
    }
}

fn string_entry<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, RdfSyntaxError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(msg(format!("The '{key}' entry must be a string"))),
    }
}

fn msg(message: impl Into<String>) -> RdfSyntaxError {
    RdfSyntaxError::msg(RdfFormat::Json, message)
}
