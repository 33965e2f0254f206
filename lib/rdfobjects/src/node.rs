use crate::collection::Collection;
use crate::iri::is_blank_node_id;
use crate::literal::Literal;
use crate::namespace::{Curie, NamespaceError, NamespaceRegistry};
use crate::rdfxml::XmlBlock;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::{fmt, mem, slice};

/// The two kinds of graph nodes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum NodeKind {
    /// A node identified by an absolute URI.
    Resource,
    /// A node with a document-local identifier.
    BlankNode,
}

/// An edge endpoint: the identity of a [`Node`] without its content.
///
/// References are what node values store. They are resolved back to nodes through
/// [`Collection::resolve`](crate::Collection::resolve), so cycles never make equality or
/// serialization recurse without bound.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ResourceReference {
    kind: NodeKind,
    id: String,
}

impl ResourceReference {
    /// A reference to the resource with the given absolute URI.
    #[inline]
    pub fn resource(uri: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Resource,
            id: uri.into(),
        }
    }

    /// A reference to a blank node, with or without its `_:` prefix.
    #[inline]
    pub fn blank_node(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            kind: NodeKind::BlankNode,
            id: match id.strip_prefix("_:") {
                Some(stripped) => stripped.to_owned(),
                None => id,
            },
        }
    }

    /// Classifies a node key: `_:` prefixed or non absolute values are blank nodes.
    pub fn from_key(key: &str) -> Self {
        if is_blank_node_id(key) {
            Self::blank_node(key)
        } else {
            Self::resource(key)
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The URI of a resource or the label of a blank node (without `_:`).
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn is_blank_node(&self) -> bool {
        self.kind == NodeKind::BlankNode
    }

    /// The key of the node in a [`Collection`]: the URI, or `_:` and the blank node label.
    pub fn key(&self) -> String {
        match self.kind {
            NodeKind::Resource => self.id.clone(),
            NodeKind::BlankNode => format!("_:{}", self.id),
        }
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Resource => write!(f, "<{}>", self.id),
            NodeKind::BlankNode => write!(f, "_:{}", self.id),
        }
    }
}

/// The value side of an assertion.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Object {
    Literal(Literal),
    Reference(ResourceReference),
}

impl Object {
    pub fn as_literal(&self) -> Option<&Literal> {
        if let Self::Literal(literal) = self {
            Some(literal)
        } else {
            None
        }
    }

    pub fn as_reference(&self) -> Option<&ResourceReference> {
        if let Self::Reference(reference) = self {
            Some(reference)
        } else {
            None
        }
    }

    fn to_json(&self) -> Value {
        let mut object = Map::new();
        match self {
            Self::Reference(reference) => {
                object.insert(
                    "type".into(),
                    if reference.is_blank_node() {
                        "bnode"
                    } else {
                        "uri"
                    }
                    .into(),
                );
                object.insert("value".into(), reference.key().into());
            }
            Self::Literal(literal) => {
                object.insert("type".into(), "literal".into());
                object.insert("value".into(), literal.value().into());
                if let Some(language) = literal.language() {
                    object.insert("lang".into(), language.into());
                }
                if let Some(datatype) = literal.datatype() {
                    object.insert("datatype".into(), datatype.into());
                }
            }
        }
        Value::Object(object)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(literal) => literal.fmt(f),
            Self::Reference(reference) => reference.fmt(f),
        }
    }
}

impl From<Literal> for Object {
    #[inline]
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<ResourceReference> for Object {
    #[inline]
    fn from(reference: ResourceReference) -> Self {
        Self::Reference(reference)
    }
}

impl From<&Node> for Object {
    #[inline]
    fn from(node: &Node) -> Self {
        Self::Reference(node.reference())
    }
}

impl From<&str> for Object {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<String> for Object {
    #[inline]
    fn from(value: String) -> Self {
        Self::Literal(value.into())
    }
}

/// The value(s) of one predicate on one node.
///
/// A predicate starts with a single value and becomes a list once a second, different value is asserted.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PredicateValue {
    Single(Object),
    Many(Vec<Object>),
}

impl PredicateValue {
    #[inline]
    pub fn as_slice(&self) -> &[Object] {
        match self {
            Self::Single(object) => slice::from_ref(object),
            Self::Many(objects) => objects,
        }
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Object> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    #[inline]
    pub fn first(&self) -> Option<&Object> {
        self.as_slice().first()
    }

    #[inline]
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn contains(&self, object: &Object) -> bool {
        self.as_slice().contains(object)
    }

    fn push(&mut self, object: Object) {
        match self {
            Self::Many(objects) => objects.push(object),
            Self::Single(_) => {
                if let Self::Single(first) = mem::replace(self, Self::Many(Vec::new())) {
                    *self = Self::Many(vec![first, object]);
                }
            }
        }
    }

    /// Same objects, whatever their order.
    fn same_objects(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|o| other.contains(o))
    }
}

impl<'a> IntoIterator for &'a PredicateValue {
    type Item = &'a Object;
    type IntoIter = slice::Iter<'a, Object>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The predicates a node has in one namespace.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NamespaceSlot {
    namespace: String,
    predicates: IndexMap<String, PredicateValue>,
}

impl NamespaceSlot {
    /// The namespace URI.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The values keyed by local name.
    #[inline]
    pub fn predicates(&self) -> &IndexMap<String, PredicateValue> {
        &self.predicates
    }

    #[inline]
    pub fn get(&self, local_name: &str) -> Option<&PredicateValue> {
        self.predicates.get(local_name)
    }
}

/// What [`Node::get`] found.
#[derive(Debug, Clone, Copy)]
pub enum NodeLookup<'a> {
    /// All the predicates of a namespace.
    Namespace(&'a NamespaceSlot),
    /// The values of a predicate.
    Objects(&'a PredicateValue),
}

impl<'a> NodeLookup<'a> {
    pub fn as_namespace(self) -> Option<&'a NamespaceSlot> {
        if let Self::Namespace(slot) = self {
            Some(slot)
        } else {
            None
        }
    }

    pub fn as_objects(self) -> Option<&'a PredicateValue> {
        if let Self::Objects(objects) = self {
            Some(objects)
        } else {
            None
        }
    }
}

/// A graph node, either a [resource](NodeKind::Resource) or a [blank node](NodeKind::BlankNode).
///
/// Assertions are stored per namespace prefix, then per local name, using the node's [`NamespaceRegistry`]
/// to fold predicate URIs.
///
/// ```
/// use rdfobjects::{NamespaceRegistry, Node, Literal};
///
/// let mut node = Node::resource("http://example.com/me", &NamespaceRegistry::new());
/// node.assert("http://xmlns.com/foaf/0.1/name", Literal::new_simple_literal("Me"))?;
/// node.relate("[rdf:type]", "[foaf:Person]")?;
///
/// let name = node.first("[foaf:name]").and_then(|o| o.as_literal());
/// assert_eq!(name.map(Literal::value), Some("Me"));
/// assert!(node.get("http://xmlns.com/foaf/0.1/").is_some());
/// # Result::<_, rdfobjects::NamespaceError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    id: String,
    registry: NamespaceRegistry,
    namespaces: IndexMap<String, NamespaceSlot>,
}

impl Node {
    /// A resource identified by `uri`.
    pub fn resource(uri: impl Into<String>, registry: &NamespaceRegistry) -> Self {
        Self::from_reference(ResourceReference::resource(uri), registry)
    }

    /// A blank node labelled `id` (a leading `_:` is stripped).
    pub fn blank_node(id: impl Into<String>, registry: &NamespaceRegistry) -> Self {
        Self::from_reference(ResourceReference::blank_node(id), registry)
    }

    pub(crate) fn from_reference(reference: ResourceReference, registry: &NamespaceRegistry) -> Self {
        Self {
            kind: reference.kind,
            id: reference.id,
            registry: registry.clone(),
            namespaces: IndexMap::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The URI of a resource or the label of a blank node.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn is_blank_node(&self) -> bool {
        self.kind == NodeKind::BlankNode
    }

    /// The key of this node in a [`Collection`].
    pub fn key(&self) -> String {
        self.reference().key()
    }

    pub fn reference(&self) -> ResourceReference {
        ResourceReference {
            kind: self.kind,
            id: self.id.clone(),
        }
    }

    #[inline]
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Adds the `(predicate, object)` pair to the node.
    ///
    /// `predicate` is a full URI or a safe CURIE. Unknown namespaces are registered on the fly.
    /// Returns `false` if the pair was already there.
    pub fn assert(
        &mut self,
        predicate: &str,
        object: impl Into<Object>,
    ) -> Result<bool, NamespaceError> {
        let predicate = self.registry.expand(predicate)?;
        let object = object.into();
        if let Some((prefix, local_name)) = self.locate(&predicate) {
            let (prefix, local_name) = (prefix.to_owned(), local_name.to_owned());
            let Some(value) = self
                .namespaces
                .get_mut(&prefix)
                .and_then(|slot| slot.predicates.get_mut(&local_name))
            else {
                return Ok(false);
            };
            if value.contains(&object) {
                return Ok(false);
            }
            value.push(object);
            return Ok(true);
        }
        let curie = self.registry.derive_from(&predicate)?;
        let namespace = &predicate[..predicate.len() - curie.reference().len()];
        self.namespaces
            .entry(curie.prefix().to_owned())
            .or_insert_with(|| NamespaceSlot {
                namespace: namespace.to_owned(),
                predicates: IndexMap::new(),
            })
            .predicates
            .insert(curie.reference().to_owned(), PredicateValue::Single(object));
        Ok(true)
    }

    /// Asserts a link to the node named by `target`.
    ///
    /// `target` is a safe CURIE, an absolute URI, or a blank node id.
    pub fn relate(
        &mut self,
        predicate: &str,
        target: &str,
    ) -> Result<ResourceReference, NamespaceError> {
        let target = ResourceReference::from_key(&self.registry.expand(target)?);
        self.assert(predicate, target.clone())?;
        Ok(target)
    }

    /// Looks up a namespace or a predicate.
    ///
    /// `key` is a namespace URI or a bare-prefix safe CURIE (`[dc:]`) to get the whole namespace,
    /// or a predicate URI or safe CURIE (`[dc:title]`) to get its values.
    pub fn get(&self, key: &str) -> Option<NodeLookup<'_>> {
        if let Some(curie) = Curie::parse_safe(key) {
            if curie.reference().is_empty() {
                let namespace = self.registry.namespace(curie.prefix())?;
                return self.namespace_slot(&namespace).map(NodeLookup::Namespace);
            }
            return self
                .objects(&self.registry.resolve(&curie).ok()?)
                .map(NodeLookup::Objects);
        }
        if let Some(slot) = self.namespace_slot(key) {
            return Some(NodeLookup::Namespace(slot));
        }
        self.objects(key).map(NodeLookup::Objects)
    }

    /// The values of a predicate given as a full URI or a safe CURIE.
    pub fn objects(&self, predicate: &str) -> Option<&PredicateValue> {
        let predicate = self.registry.expand(predicate).ok()?;
        let (prefix, local_name) = self.locate(&predicate)?;
        self.namespaces.get(prefix)?.predicates.get(local_name)
    }

    pub fn first(&self, predicate: &str) -> Option<&Object> {
        self.objects(predicate)?.first()
    }

    /// The first literal value of a predicate.
    pub fn literal(&self, predicate: &str) -> Option<&Literal> {
        self.objects(predicate)?.iter().find_map(Object::as_literal)
    }

    pub fn has_predicate(&self, predicate: &str) -> bool {
        self.objects(predicate).is_some()
    }

    /// The namespace slots keyed by prefix, in the order they were first used.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &NamespaceSlot)> {
        self.namespaces
            .iter()
            .map(|(prefix, slot)| (prefix.as_str(), slot))
    }

    /// The values keyed by full predicate URI.
    pub fn assertions(&self) -> IndexMap<String, &PredicateValue> {
        self.namespaces
            .values()
            .flat_map(|slot| {
                slot.predicates
                    .iter()
                    .map(|(local_name, value)| (format!("{}{local_name}", slot.namespace), value))
            })
            .collect()
    }

    /// Every `(predicate URI, object)` pair.
    pub fn triples(&self) -> impl Iterator<Item = (String, &Object)> {
        self.namespaces.values().flat_map(|slot| {
            slot.predicates.iter().flat_map(move |(local_name, value)| {
                let predicate = format!("{}{local_name}", slot.namespace);
                value.iter().map(move |object| (predicate.clone(), object))
            })
        })
    }

    /// Checks if nothing has been asserted on the node.
    #[inline]
    pub fn is_empty_graph(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Serializes the node assertions to N-Triples, one line per triple.
    pub fn to_ntriples(&self) -> String {
        let mut buffer = String::new();
        self.write_ntriples(&mut buffer);
        buffer
    }

    pub(crate) fn write_ntriples(&self, buffer: &mut String) {
        let subject = self.reference().to_string();
        for (predicate, object) in self.triples() {
            buffer.push_str(&subject);
            buffer.push_str(" <");
            buffer.push_str(&predicate);
            buffer.push_str("> ");
            buffer.push_str(&object.to_string());
            buffer.push_str(" .\n");
        }
    }

    /// The RDF/JSON object of this node: predicate URIs mapped to arrays of values.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.assertions()
                .into_iter()
                .map(|(predicate, value)| {
                    (
                        predicate,
                        Value::Array(value.iter().map(Object::to_json).collect()),
                    )
                })
                .collect(),
        )
    }

    /// An `rdf:Description` element for this node and the namespaces it needs.
    ///
    /// Without a collection to resolve references, linked nodes are never inlined.
    pub fn to_xml_description_block(&self, depth: usize) -> XmlBlock {
        let mut block = XmlBlock::default();
        block.write_description(self, depth, None);
        block
    }

    /// A standalone RDF/XML document holding this node.
    pub fn to_xml(&self) -> String {
        self.to_xml_description_block(0).into_document()
    }

    pub(crate) fn write_xml_description(
        &self,
        block: &mut XmlBlock,
        depth: usize,
        collection: Option<&Collection>,
    ) {
        block.write_description(self, depth, collection);
    }

    fn namespace_slot(&self, namespace: &str) -> Option<&NamespaceSlot> {
        self.namespaces
            .values()
            .find(|slot| slot.namespace == namespace)
    }

    /// Finds the slot holding `predicate`, whatever prefix was used when it was first asserted.
    fn locate<'a>(&'a self, predicate: &'a str) -> Option<(&'a str, &'a str)> {
        self.namespaces.iter().find_map(|(prefix, slot)| {
            let local_name = predicate.strip_prefix(slot.namespace.as_str())?;
            slot.predicates
                .contains_key(local_name)
                .then_some((prefix.as_str(), local_name))
        })
    }
}

/// Nodes are equal if they have the same identity and the same assertions.
///
/// Linked nodes are compared by identity only.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.id != other.id {
            return false;
        }
        let theirs = other.assertions();
        let mine = self.assertions();
        mine.len() == theirs.len()
            && mine.iter().all(|(predicate, value)| {
                theirs
                    .get(predicate)
                    .is_some_and(|other_value| value.same_objects(other_value))
            })
    }
}

impl Eq for Node {}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use crate::vocab::rdf;
    use std::error::Error;

    fn person(registry: &NamespaceRegistry) -> Node {
        Node::resource("http://example.com/people/alice", registry)
    }

    #[test]
    fn assert_promotes_to_list_and_deduplicates() -> Result<(), NamespaceError> {
        let mut node = person(&NamespaceRegistry::new());
        assert!(node.assert("http://example.com/p", "hi")?);
        assert!(!node.assert("http://example.com/p", "hi")?);
        assert!(matches!(
            node.objects("http://example.com/p"),
            Some(PredicateValue::Single(_))
        ));
        assert!(node.assert("http://example.com/p", "bye")?);
        let values = node.objects("http://example.com/p").unwrap();
        assert!(values.is_many());
        assert_eq!(
            values.as_slice(),
            [Object::from("hi"), Object::from("bye")]
        );
        assert!(!node.assert("http://example.com/p", "bye")?);
        assert_eq!(node.objects("http://example.com/p").map(PredicateValue::len), Some(2));
        Ok(())
    }

    #[test]
    fn relate_classifies_targets() -> Result<(), NamespaceError> {
        let mut node = person(&NamespaceRegistry::new());
        let target = node.relate("[rdf:type]", "[foaf:Person]")?;
        assert_eq!(target, ResourceReference::resource("http://xmlns.com/foaf/0.1/Person"));
        let target = node.relate("http://xmlns.com/foaf/0.1/knows", "_:genid18")?;
        assert!(target.is_blank_node());
        assert_eq!(target.key(), "_:genid18");
        assert_eq!(
            node.first(rdf::TYPE),
            Some(&Object::Reference(ResourceReference::resource(
                "http://xmlns.com/foaf/0.1/Person"
            )))
        );
        Ok(())
    }

    #[test]
    fn lookup_by_namespace_curie_and_uri() -> Result<(), Box<dyn Error>> {
        let mut node = person(&NamespaceRegistry::new());
        node.assert("[dcterms:title]", "A title")?;
        node.assert("[dc:creator]", "Someone")?;
        let Some(NodeLookup::Namespace(slot)) = node.get("http://purl.org/dc/terms/") else {
            return Err("the namespace should be found".into());
        };
        assert_eq!(slot.predicates().len(), 1);
        assert!(node.get("[dc:]").and_then(NodeLookup::as_namespace).is_some());
        assert!(node
            .get("http://purl.org/dc/elements/1.1/creator")
            .and_then(NodeLookup::as_objects)
            .is_some());
        assert!(node.get("[dc:title]").is_none());
        assert!(node.get("[foaf:]").is_none());
        Ok(())
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let mut node = person(&NamespaceRegistry::new());
        assert!(matches!(
            node.assert("[nope:p]", "x"),
            Err(NamespaceError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn empty_graph_and_assertions() -> Result<(), NamespaceError> {
        let mut node = person(&NamespaceRegistry::new());
        assert!(node.is_empty_graph());
        node.assert("http://example.com/vocab#a", "1")?;
        node.assert("http://example.com/vocab#b", "2")?;
        assert!(!node.is_empty_graph());
        let assertions = node.assertions();
        assert_eq!(
            assertions.keys().collect::<Vec<_>>(),
            ["http://example.com/vocab#a", "http://example.com/vocab#b"]
        );
        Ok(())
    }

    #[test]
    fn equality_is_order_independent() -> Result<(), NamespaceError> {
        let registry = NamespaceRegistry::new();
        let mut a = person(&registry);
        let mut b = person(&registry);
        a.assert("http://example.com/p", "1")?;
        a.assert("http://example.com/p", "2")?;
        b.assert("http://example.com/p", "2")?;
        assert_ne!(a, b);
        b.assert("http://example.com/p", "1")?;
        assert_eq!(a, b);
        assert_ne!(a, Node::resource("http://example.com/other", &registry));
        Ok(())
    }

    #[test]
    fn ntriples_and_json_output() -> Result<(), Box<dyn Error>> {
        let mut node = Node::blank_node("_:b0", &NamespaceRegistry::new());
        node.assert(
            "http://example.com/p",
            Literal::new_language_tagged_literal("hi", "en")?,
        )?;
        node.relate("http://example.com/q", "http://example.com/o")?;
        assert_eq!(
            node.to_ntriples(),
            "_:b0 <http://example.com/p> \"hi\"@en .\n_:b0 <http://example.com/q> <http://example.com/o> .\n"
        );
        assert_eq!(
            node.to_json(),
            serde_json::json!({
                "http://example.com/p": [{"type": "literal", "value": "hi", "lang": "en"}],
                "http://example.com/q": [{"type": "uri", "value": "http://example.com/o"}]
            })
        );
        Ok(())
    }
}
