use crate::collection::Collection;
use crate::node::{Node, Object};
use crate::rdfxml::utils::{is_nc_name, split_iri};
use crate::vocab::rdf;
use indexmap::IndexMap;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// `rdf:Description` elements waiting to be wrapped into an RDF/XML document, together with the
/// namespace declarations they need.
///
/// ```
/// use rdfobjects::{NamespaceRegistry, Node};
///
/// let mut node = Node::resource("http://example.com#me", &NamespaceRegistry::new());
/// node.relate("[rdf:type]", "http://schema.org/Person")?;
/// let block = node.to_xml_description_block(0);
/// assert_eq!(
///     block.namespaces().collect::<Vec<_>>(),
///     [("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")]
/// );
/// assert_eq!(
///     block.into_document(),
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n\t<rdf:Description rdf:about=\"http://example.com#me\">\n\t\t<rdf:type rdf:resource=\"http://schema.org/Person\"/>\n\t</rdf:Description>\n</rdf:RDF>"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct XmlBlock {
    namespaces: IndexMap<String, String>,
    events: Vec<Event<'static>>,
}

impl XmlBlock {
    /// The `(prefix, namespace)` declarations used by the descriptions.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    /// The descriptions alone, without the `rdf:RDF` wrapper.
    pub fn body(&self) -> String {
        render(self.events.iter().cloned())
    }

    /// Wraps the descriptions into a standalone document.
    pub fn into_document(self) -> String {
        let mut root = BytesStart::new("rdf:RDF");
        root.push_attribute(("xmlns:rdf", rdf::NAMESPACE));
        for (prefix, namespace) in &self.namespaces {
            if prefix != "rdf" {
                root.push_attribute((format!("xmlns:{prefix}").as_str(), namespace.as_str()));
            }
        }
        render(
            [
                Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
                Event::Start(root),
            ]
            .into_iter()
            .chain(self.events)
            .chain([Event::End(BytesEnd::new("rdf:RDF"))]),
        )
    }

    /// Appends the description of `node`.
    ///
    /// Linked nodes found in `collection` are described inline up to `depth` levels.
    pub(crate) fn write_description(
        &mut self,
        node: &Node,
        depth: usize,
        collection: Option<&Collection>,
    ) {
        self.declare("rdf", rdf::NAMESPACE);
        let mut open = BytesStart::new("rdf:Description");
        if node.is_blank_node() {
            open.push_attribute(("rdf:nodeID", node.id()));
        } else {
            open.push_attribute(("rdf:about", node.id()));
        }
        if node.is_empty_graph() {
            self.events.push(Event::Empty(open));
            return;
        }
        self.events.push(Event::Start(open));
        for (prefix, slot) in node.namespaces() {
            let prefix = if slot.namespace() == rdf::NAMESPACE {
                "rdf"
            } else {
                prefix
            };
            for (local_name, value) in slot.predicates() {
                let Some(name) = self.property_name(prefix, slot.namespace(), local_name) else {
                    tracing::warn!(
                        node = %node.key(),
                        predicate = %format!("{}{local_name}", slot.namespace()),
                        "predicate cannot be written as an RDF/XML element, skipping it"
                    );
                    continue;
                };
                for object in value {
                    self.write_property(&name, object, depth, collection);
                }
            }
        }
        self.events
            .push(Event::End(BytesEnd::new("rdf:Description")));
    }

    fn write_property(
        &mut self,
        name: &PropertyName,
        object: &Object,
        depth: usize,
        collection: Option<&Collection>,
    ) {
        let mut open = BytesStart::new(name.qname.clone());
        if let Some(namespace) = &name.xmlns {
            open.push_attribute(("xmlns", namespace.as_str()));
        }
        match object {
            Object::Literal(literal) => {
                if literal.datatype() == Some(rdf::XML_LITERAL) {
                    open.push_attribute(("rdf:parseType", "Literal"));
                    self.events.push(Event::Start(open));
                    self.events
                        .push(Event::Text(BytesText::from_escaped(literal.value().to_owned())));
                } else {
                    if let Some(language) = literal.language() {
                        open.push_attribute(("xml:lang", language));
                    } else if let Some(datatype) = literal.datatype() {
                        open.push_attribute(("rdf:datatype", datatype));
                    }
                    self.events.push(Event::Start(open));
                    // an empty text keeps the end tag on the same line
                    self.events
                        .push(Event::Text(BytesText::new(literal.value()).into_owned()));
                }
                self.events
                    .push(Event::End(BytesEnd::new(name.qname.clone())));
            }
            Object::Reference(reference) => {
                let inline = depth
                    .checked_sub(1)
                    .zip(collection.and_then(|c| c.resolve(reference)))
                    .filter(|(_, target)| !target.is_empty_graph());
                if let Some((depth, target)) = inline {
                    self.events.push(Event::Start(open));
                    self.write_description(target, depth, collection);
                    self.events
                        .push(Event::End(BytesEnd::new(name.qname.clone())));
                } else {
                    if reference.is_blank_node() {
                        open.push_attribute(("rdf:nodeID", reference.id()));
                    } else {
                        open.push_attribute(("rdf:resource", reference.id()));
                    }
                    self.events.push(Event::Empty(open));
                }
            }
        }
    }

    /// The element name of a predicate, declaring its prefix if possible.
    ///
    /// Falls back to a default namespace declaration on the element itself.
    fn property_name(
        &mut self,
        prefix: &str,
        namespace: &str,
        local_name: &str,
    ) -> Option<PropertyName> {
        if is_nc_name(prefix) && is_nc_name(local_name) && self.declare(prefix, namespace) {
            return Some(PropertyName {
                qname: format!("{prefix}:{local_name}"),
                xmlns: None,
            });
        }
        let predicate = format!("{namespace}{local_name}");
        let (namespace, local_name) = split_iri(&predicate);
        if local_name.is_empty() {
            return None;
        }
        Some(PropertyName {
            qname: local_name.to_owned(),
            xmlns: Some(namespace.to_owned()),
        })
    }

    /// Returns `false` if `prefix` is already bound to another namespace.
    fn declare(&mut self, prefix: &str, namespace: &str) -> bool {
        match self.namespaces.get(prefix) {
            Some(existing) => existing == namespace,
            None => {
                self.namespaces
                    .insert(prefix.to_owned(), namespace.to_owned());
                true
            }
        }
    }
}

struct PropertyName {
    qname: String,
    xmlns: Option<String>,
}

fn render<'a>(events: impl IntoIterator<Item = Event<'a>>) -> String {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    for event in events {
        if let Err(error) = writer.write_event(event) {
            tracing::warn!(%error, "failed to write an RDF/XML event");
        }
    }
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use crate::literal::Literal;
    use crate::namespace::{NamespaceError, NamespaceRegistry};
    use std::error::Error;

    #[test]
    fn literals_carry_language_and_datatype() -> Result<(), Box<dyn Error>> {
        let mut node = Node::blank_node("b0", &NamespaceRegistry::new());
        node.assert(
            "[foaf:name]",
            Literal::new_language_tagged_literal("Alice & Bob", "en")?,
        )?;
        node.assert(
            "http://example.com/vocab#age",
            Literal::new_typed_literal("42", crate::vocab::xsd::INTEGER)?,
        )?;
        let body = node.to_xml_description_block(0).body();
        assert!(body.contains("<rdf:Description rdf:nodeID=\"b0\">"));
        assert!(body.contains("<foaf:name xml:lang=\"en\">Alice &amp; Bob</foaf:name>"));
        assert!(body.contains(
            "rdf:datatype=\"http://www.w3.org/2001/XMLSchema#integer\">42</"
        ));
        Ok(())
    }

    #[test]
    fn empty_literals_stay_empty() -> Result<(), Box<dyn Error>> {
        let mut collection = Collection::with_registry(NamespaceRegistry::new());
        collection.assert("http://ex/s", "http://ex/p", "")?;
        collection.assert(
            "http://ex/s",
            "http://ex/q",
            Literal::new_typed_literal("", crate::vocab::xsd::STRING)?,
        )?;
        let xml = collection.to_xml(0);
        // the end tag stays on the line of its start tag
        assert!(!xml.contains(">\n\t\t</"), "{xml}");
        let mut reparsed = Collection::with_registry(NamespaceRegistry::new());
        crate::rdfxml::RdfXmlParser::new().parse_slice(xml.as_bytes(), &mut reparsed)?;
        assert_eq!(reparsed, collection);
        assert_eq!(
            reparsed
                .get("http://ex/s")
                .and_then(|node| node.literal("http://ex/p"))
                .map(Literal::value),
            Some("")
        );
        Ok(())
    }

    #[test]
    fn non_name_predicates_use_a_default_namespace() -> Result<(), NamespaceError> {
        let registry = NamespaceRegistry::empty();
        registry.register("ex", "http://example.com/")?;
        let mut node = Node::resource("http://example.com/s", &registry);
        node.assert("http://example.com/1p", "x")?;
        let block = node.to_xml_description_block(0);
        assert!(block.namespaces().all(|(prefix, _)| prefix != "ex"));
        assert!(block.body().contains("<p xmlns=\"http://example.com/1\">x</p>"));
        Ok(())
    }

    #[test]
    fn nested_descriptions_are_bounded_by_depth() -> Result<(), NamespaceError> {
        let mut collection = Collection::with_registry(NamespaceRegistry::new());
        collection.relate("http://ex/a", "[foaf:knows]", "http://ex/b")?;
        collection.relate("http://ex/b", "[foaf:knows]", "http://ex/a")?;
        let flat = collection.to_xml(0);
        assert_eq!(flat.matches("<rdf:Description").count(), 2);
        let nested = collection.to_xml(1);
        assert_eq!(nested.matches("<rdf:Description").count(), 4);
        assert_eq!(nested.matches("rdf:resource=").count(), 2);
        assert_eq!(nested.matches("xmlns:rdf=").count(), 1);
        Ok(())
    }
}
