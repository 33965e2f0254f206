use crate::error::RdfParseError;
use crate::literal::Literal;
use crate::namespace::{NamespaceError, NamespaceRegistry};
use crate::node::{Node, Object, ResourceReference};
use crate::parser::RdfParser;
use crate::rdfxml::XmlBlock;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_json::{Map, Value};
use std::io::Read;

/// An identity map of graph [nodes](Node), keyed by URI or `_:`-prefixed blank node id.
///
/// Every parser writes through [`Collection::find_or_create`], so a URI always maps to one node
/// for the whole lifetime of the collection. Nodes keep their insertion order, which is the order
/// the serializers use.
///
/// ```
/// use rdfobjects::{Collection, NamespaceRegistry, RdfParser};
///
/// let mut collection = Collection::with_registry(NamespaceRegistry::new());
/// collection.parse(
///     b"<http://ex/1> <http://ex/p> \"hi\"@en .\n<http://ex/1> <http://ex/p> \"bye\"@en .",
///     &RdfParser::new(),
/// )?;
/// assert_eq!(collection.len(), 1);
/// let node = collection.get("http://ex/1").unwrap();
/// assert_eq!(node.objects("http://ex/p").map(|v| v.len()), Some(2));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    nodes: IndexMap<String, Node>,
    registry: NamespaceRegistry,
    blank_node_counter: u64,
}

impl Collection {
    /// An empty collection using the process-wide [`NamespaceRegistry::shared`].
    pub fn new() -> Self {
        Self::with_registry(NamespaceRegistry::shared())
    }

    pub fn with_registry(registry: NamespaceRegistry) -> Self {
        Self {
            nodes: IndexMap::new(),
            registry,
            blank_node_counter: 0,
        }
    }

    /// Parses `data` with `parser` and adds its content to this collection.
    pub fn parse(&mut self, data: &[u8], parser: &RdfParser) -> Result<(), RdfParseError> {
        parser.parse_slice(data, self)
    }

    /// Reads `reader` to the end, then parses the content like [`Collection::parse`].
    pub fn parse_read(&mut self, reader: impl Read, parser: &RdfParser) -> Result<(), RdfParseError> {
        parser.parse_read(reader, self)
    }

    #[inline]
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Returns the node for `key`, creating it if needed.
    ///
    /// `key` is an absolute URI, a blank node id (`_:` prefixed or not an absolute URI) or a safe CURIE.
    pub fn find_or_create(&mut self, key: &str) -> Result<&mut Node, NamespaceError> {
        let reference = ResourceReference::from_key(&self.registry.expand(key)?);
        Ok(self.find_or_create_reference(reference))
    }

    pub(crate) fn find_or_create_reference(&mut self, reference: ResourceReference) -> &mut Node {
        match self.nodes.entry(reference.key()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(Node::from_reference(reference, &self.registry)),
        }
    }

    /// A new blank node with a `genid<n>` label unused in this collection.
    pub fn fresh_blank_node(&mut self) -> &mut Node {
        let reference = loop {
            let candidate = ResourceReference::blank_node(format!("genid{}", self.blank_node_counter));
            self.blank_node_counter += 1;
            if !self.nodes.contains_key(&candidate.key()) {
                break candidate;
            }
        };
        self.find_or_create_reference(reference)
    }

    /// The node for `key`, without creating it.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.get(&self.normalize_key(key)?)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        let key = self.normalize_key(key)?;
        self.nodes.get_mut(&key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The node a reference points to.
    pub fn resolve(&self, reference: &ResourceReference) -> Option<&Node> {
        self.nodes.get(&reference.key())
    }

    /// Removes a node, keeping the order of the other ones.
    ///
    /// Assertions of other nodes pointing to it are kept.
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        let key = self.normalize_key(key)?;
        self.nodes.shift_remove(&key)
    }

    /// The node keys, in insertion order.
    pub fn uris(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Forgets every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.blank_node_counter = 0;
    }

    /// Asserts `(predicate, object)` on the node `subject`, creating it if needed.
    pub fn assert(
        &mut self,
        subject: &str,
        predicate: &str,
        object: impl Into<Object>,
    ) -> Result<bool, NamespaceError> {
        self.find_or_create(subject)?.assert(predicate, object)
    }

    /// Links the node `subject` to the node `target`, creating both if needed.
    pub fn relate(
        &mut self,
        subject: &str,
        predicate: &str,
        target: &str,
    ) -> Result<ResourceReference, NamespaceError> {
        let subject = ResourceReference::from_key(&self.registry.expand(subject)?);
        let target = ResourceReference::from_key(&self.registry.expand(target)?);
        self.find_or_create_reference(subject)
            .assert(predicate, target.clone())?;
        self.find_or_create_reference(target.clone());
        Ok(target)
    }

    /// The nodes having at least one value for `predicate`.
    pub fn find_by_predicate(&self, predicate: &str) -> Vec<&Node> {
        self.iter()
            .filter(|node| node.has_predicate(predicate))
            .collect()
    }

    /// The nodes having `object` among the values of `predicate`.
    pub fn find_by_predicate_and_object(
        &self,
        predicate: &str,
        object: &Object,
    ) -> Vec<&Node> {
        self.iter()
            .filter(|node| {
                node.objects(predicate)
                    .is_some_and(|values| values.contains(object))
            })
            .collect()
    }

    /// Serializes every node to N-Triples.
    pub fn to_ntriples(&self) -> String {
        let mut buffer = String::new();
        for node in self.iter() {
            node.write_ntriples(&mut buffer);
        }
        buffer
    }

    /// Serializes the collection to RDF/XML.
    ///
    /// Up to `depth` levels of linked nodes are written inline inside the description of the node linking to them.
    pub fn to_xml(&self, depth: usize) -> String {
        let mut block = XmlBlock::default();
        for node in self.iter() {
            node.write_xml_description(&mut block, depth, Some(self));
        }
        block.into_document()
    }

    /// The RDF/JSON representation of the collection.
    ///
    /// Nodes without assertions are left out.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .filter(|node| !node.is_empty_graph())
                .map(|node| (node.key(), node.to_json()))
                .collect::<Map<_, _>>(),
        )
    }

    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    pub(crate) fn assert_literal(
        &mut self,
        subject: &ResourceReference,
        predicate: &str,
        literal: Literal,
    ) -> Result<(), NamespaceError> {
        self.find_or_create_reference(subject.clone())
            .assert(predicate, literal)?;
        Ok(())
    }

    /// Asserts `subject predicate object` and makes sure `object` has a node of its own.
    ///
    /// The subject node is inserted before the object node.
    pub(crate) fn assert_link(
        &mut self,
        subject: &ResourceReference,
        predicate: &str,
        object: &ResourceReference,
    ) -> Result<(), NamespaceError> {
        self.find_or_create_reference(subject.clone())
            .assert(predicate, object.clone())?;
        self.find_or_create_reference(object.clone());
        Ok(())
    }

    fn normalize_key(&self, key: &str) -> Option<String> {
        Some(ResourceReference::from_key(&self.registry.expand(key).ok()?).key())
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

/// Collections are equal if they hold the same keys mapped to equal nodes.
impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .nodes
                .iter()
                .all(|(key, node)| other.nodes.get(key).is_some_and(|o| o == node))
    }
}

impl Eq for Collection {}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Node;
    type IntoIter = indexmap::map::Values<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.values()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use crate::vocab::rdf;

    fn collection() -> Collection {
        Collection::with_registry(NamespaceRegistry::new())
    }

    #[test]
    fn find_or_create_is_an_identity_map() -> Result<(), NamespaceError> {
        let mut collection = collection();
        let first: *const Node = collection.find_or_create("http://xmlns.com/foaf/0.1/Person")?;
        let second: *const Node = collection.find_or_create("[foaf:Person]")?;
        assert_eq!(first, second);
        assert_eq!(collection.len(), 1);
        Ok(())
    }

    #[test]
    fn blank_node_keys() -> Result<(), NamespaceError> {
        let mut collection = collection();
        assert!(collection.find_or_create("_:genid18")?.is_blank_node());
        assert!(collection.find_or_create("not a uri")?.is_blank_node());
        assert_eq!(collection.uris(), ["_:genid18", "_:not a uri"]);
        let fresh = collection.fresh_blank_node().key();
        assert_eq!(fresh, "_:genid0");
        Ok(())
    }

    #[test]
    fn fresh_blank_nodes_skip_used_labels() -> Result<(), NamespaceError> {
        let mut collection = collection();
        collection.find_or_create("_:genid0")?;
        assert_eq!(collection.fresh_blank_node().key(), "_:genid1");
        Ok(())
    }

    #[test]
    fn remove_keeps_order() -> Result<(), NamespaceError> {
        let mut collection = collection();
        for key in ["http://ex/1", "http://ex/2", "http://ex/3"] {
            collection.find_or_create(key)?;
        }
        assert!(collection.remove("http://ex/2").is_some());
        assert!(collection.remove("http://ex/2").is_none());
        assert_eq!(collection.uris(), ["http://ex/1", "http://ex/3"]);
        Ok(())
    }

    #[test]
    fn subjects_come_before_their_objects() -> Result<(), NamespaceError> {
        let mut collection = collection();
        collection.relate("http://ex/1", "http://ex/p", "http://ex/2")?;
        collection.assert_link(
            &ResourceReference::resource("http://ex/3"),
            "http://ex/p",
            &ResourceReference::blank_node("b"),
        )?;
        assert_eq!(
            collection.uris(),
            ["http://ex/1", "http://ex/2", "http://ex/3", "_:b"]
        );
        let xml = collection.to_xml(0);
        let first = xml.find("rdf:about=\"http://ex/1\"");
        let second = xml.find("rdf:about=\"http://ex/2\"");
        assert!(first.is_some() && first < second, "{xml}");
        Ok(())
    }

    #[test]
    fn find_by_predicate_and_object() -> Result<(), NamespaceError> {
        let mut collection = collection();
        collection.relate("http://ex/alice", "[rdf:type]", "[foaf:Person]")?;
        collection.relate("http://ex/bob", "[rdf:type]", "[foaf:Person]")?;
        collection.assert("http://ex/bob", "[foaf:name]", "Bob")?;
        assert_eq!(collection.find_by_predicate(rdf::TYPE).len(), 2);
        assert_eq!(collection.find_by_predicate("[foaf:name]").len(), 1);
        let person = Object::Reference(ResourceReference::resource(
            "http://xmlns.com/foaf/0.1/Person",
        ));
        assert_eq!(
            collection
                .find_by_predicate_and_object(rdf::TYPE, &person)
                .len(),
            2
        );
        assert!(collection.contains("[foaf:Person]"));
        Ok(())
    }

    #[test]
    fn json_skips_empty_nodes() -> Result<(), NamespaceError> {
        let mut collection = collection();
        collection.relate("http://ex/1", "http://ex/p", "http://ex/2")?;
        assert_eq!(
            collection.to_json(),
            serde_json::json!({
                "http://ex/1": {"http://ex/p": [{"type": "uri", "value": "http://ex/2"}]}
            })
        );
        Ok(())
    }
}
