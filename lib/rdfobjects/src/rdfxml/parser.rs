use crate::collection::Collection;
use crate::error::{ErrorLocation, RdfSyntaxError, RdfSyntaxErrorKind};
use crate::format::{RdfFormat, sniff};
use crate::iri::sanitize_uri;
use crate::literal::Literal;
use crate::node::ResourceReference;
use crate::rdfxml::utils::{is_nc_name, is_utf8, is_whitespace};
use crate::vocab::{rdf, rss};
use oxiri::{Iri, IriParseError};
use quick_xml::escape::{resolve_xml_entity, unescape_with};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{LocalName, PrefixDeclaration, QName, ResolveResult};
use quick_xml::{NsReader, Writer};
use regex::bytes::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::str;
use std::sync::LazyLock;

/// An [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/) parser writing into a [`Collection`].
///
/// ```
/// use rdfobjects::{Collection, NamespaceRegistry, RdfXmlParser};
///
/// let file = r#"<?xml version="1.0"?>
/// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:schema="http://schema.org/">
///  <rdf:Description rdf:about="http://example.com/foo">
///    <rdf:type rdf:resource="http://schema.org/Person" />
///    <schema:name>Foo</schema:name>
///  </rdf:Description>
///  <schema:Person rdf:about="http://example.com/bar" schema:name="Bar" />
/// </rdf:RDF>"#;
///
/// let mut collection = Collection::with_registry(NamespaceRegistry::new());
/// RdfXmlParser::new().parse_slice(file.as_bytes(), &mut collection)?;
/// let people = collection.find_by_predicate("http://schema.org/name");
/// assert_eq!(people.len(), 2);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct RdfXmlParser {
    base: Option<Iri<String>>,
}

impl RdfXmlParser {
    /// Builds a new [`RdfXmlParser`].
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

    /// Parses a whole document and adds its content to `collection`.
    ///
    /// RSS 1.0 feeds using bare `resource` attributes on their `li` elements are accepted.
    pub fn parse_slice(
        &self,
        data: &[u8],
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        let data = rewrite_rss_item_resources(data);
        let mut reader = NsReader::from_reader(data.as_ref());
        reader.config_mut().expand_empty_elements = true;
        let mut walker = RdfXmlWalker {
            reader,
            layers: vec![Layer {
                kind: LayerKind::Document,
                tag: String::new(),
                language: None,
                base_iri: self.base.clone(),
            }],
            custom_entities: HashMap::new(),
            in_literal_depth: 0,
        };
        loop {
            let event = walker
                .reader
                .read_event()
                .map_err(|error| syntax_error(error).or_at(|| walker.location()))?;
            if matches!(event, Event::Eof) {
                break;
            }
            walker
                .parse_event(event, collection)
                .map_err(|error| error.or_at(|| walker.location()))?;
        }
        if walker.layers.len() > 1 {
            return Err(
                RdfSyntaxError::msg(RdfFormat::RdfXml, "unexpected end of document")
                    .or_at(|| walker.location()),
            );
        }
        Ok(())
    }
}

const RDF_ABOUT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#about";
const RDF_ABOUT_EACH: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEach";
const RDF_ABOUT_EACH_PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEachPrefix";
const RDF_BAG_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#bagID";
const RDF_DATATYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#datatype";
const RDF_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#ID";
const RDF_NODE_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nodeID";
const RDF_PARSE_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#parseType";
const RDF_RESOURCE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#resource";

const RESERVED_RDF_ELEMENTS: [&str; 11] = [
    RDF_ABOUT,
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    RDF_BAG_ID,
    RDF_DATATYPE,
    RDF_ID,
    rdf::LI,
    RDF_NODE_ID,
    RDF_PARSE_TYPE,
    rdf::RDF,
    RDF_RESOURCE,
];
const RESERVED_RDF_ATTRIBUTES: [&str; 5] = [
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    rdf::LI,
    rdf::RDF,
    RDF_RESOURCE,
];

/// Unprefixed attributes read as their `rdf:` counterparts.
const LEGACY_ATTRIBUTES: [(&[u8], &str); 6] = [
    (b"about", RDF_ABOUT),
    (b"datatype", RDF_DATATYPE),
    (b"ID", RDF_ID),
    (b"nodeID", RDF_NODE_ID),
    (b"parseType", RDF_PARSE_TYPE),
    (b"resource", RDF_RESOURCE),
];

static RSS_ITEM_RESOURCE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(<(?:[A-Za-z_][\w.-]*:)?li\s(?:[^>]*?\s)?)resource=").ok()
});

/// Rewrites `<rdf:li resource="...">` of RSS 1.0 feeds into `<rdf:li rdf:resource="...">`.
fn rewrite_rss_item_resources(data: &[u8]) -> Cow<'_, [u8]> {
    if memchr::memmem::find(data, rss::NAMESPACE.as_bytes()).is_none() {
        return Cow::Borrowed(data);
    }
    let sniffed = sniff(data);
    let Some(outline) = sniffed.outline().filter(|outline| outline.declares(rss::NAMESPACE))
    else {
        return Cow::Borrowed(data);
    };
    let Some(prefix) = outline.prefix_of(rdf::NAMESPACE).filter(|p| !p.is_empty()) else {
        return Cow::Borrowed(data);
    };
    let Some(regex) = RSS_ITEM_RESOURCE.as_ref() else {
        return Cow::Borrowed(data);
    };
    tracing::debug!(rdf_prefix = prefix, "rewriting RSS 1.0 item resources");
    regex.replace_all(data, format!("${{1}}{prefix}:resource=").as_bytes())
}

#[derive(PartialEq, Eq)]
enum ParseType {
    Collection,
    Literal,
    Resource,
}

enum PropertyObject {
    Node(ResourceReference),
    Text(String),
}

impl PropertyObject {
    fn is_defined(object: Option<&Self>) -> bool {
        match object {
            Some(Self::Node(_)) => true,
            Some(Self::Text(text)) => !text.bytes().all(is_whitespace),
            None => false,
        }
    }
}

enum LayerKind {
    Document,
    Wrapper,
    Node {
        subject: ResourceReference,
        li_counter: u64,
    },
    Property {
        subject: ResourceReference,
        predicate: String,
        object: Option<PropertyObject>,
        datatype: Option<String>,
    },
    LiteralProperty {
        subject: ResourceReference,
        predicate: String,
        writer: Writer<Vec<u8>>,
    },
    CollectionProperty {
        subject: ResourceReference,
        predicate: String,
        items: Vec<ResourceReference>,
    },
}

/// One open element.
struct Layer {
    kind: LayerKind,
    tag: String,
    /// `Some("")` when `xml:lang=""` resets the inherited language.
    language: Option<String>,
    base_iri: Option<Iri<String>>,
}

#[derive(Default)]
struct Attributes {
    language: Option<String>,
    base_iri: Option<Iri<String>>,
    id: Option<String>,
    node_id: Option<String>,
    about: Option<String>,
    resource: Option<String>,
    datatype: Option<String>,
    type_uri: Option<String>,
    parse_type: Option<ParseType>,
    properties: Vec<(String, String)>,
}

struct RdfXmlWalker<'a> {
    reader: NsReader<&'a [u8]>,
    layers: Vec<Layer>,
    custom_entities: HashMap<String, String>,
    in_literal_depth: usize,
}

impl RdfXmlWalker<'_> {
    fn parse_event(
        &mut self,
        event: Event<'_>,
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        match event {
            Event::Start(event) => self.parse_start_event(&event, collection),
            Event::End(event) => self.parse_end_event(&event, collection),
            Event::Empty(_) => Err(RdfSyntaxError::msg(
                RdfFormat::RdfXml,
                "The expand_empty_elements option must be enabled",
            )),
            Event::Text(event) => {
                let text = event
                    .unescape_with(|e| self.resolve_entity(e))
                    .map_err(syntax_error)?
                    .into_owned();
                self.parse_text(text)
            }
            Event::CData(event) => {
                let text = event
                    .decode()
                    .map_err(|e| syntax_error(quick_xml::Error::from(e)))?
                    .into_owned();
                self.parse_text(text)
            }
            Event::Comment(_) | Event::PI(_) | Event::Eof => Ok(()),
            Event::Decl(decl) => {
                if let Some(encoding) = decl.encoding() {
                    let encoding = encoding.map_err(|e| syntax_error(quick_xml::Error::from(e)))?;
                    if !is_utf8(&encoding) {
                        return Err(RdfSyntaxError::msg(
                            RdfFormat::RdfXml,
                            "Only UTF-8 is supported by the RDF/XML parser",
                        ));
                    }
                }
                Ok(())
            }
            Event::DocType(doctype) => self.parse_doctype(&doctype),
        }
    }

    /// Collects the `<!ENTITY>` declarations of the DOCTYPE.
    fn parse_doctype(&mut self, doctype: &BytesText<'_>) -> Result<(), RdfSyntaxError> {
        let doctype = self
            .reader
            .decoder()
            .decode(doctype)
            .map_err(|e| syntax_error(quick_xml::Error::from(e)))?
            .into_owned();
        for input in doctype.split('<').skip(1) {
            let Some(input) = input.strip_prefix("!ENTITY") else {
                continue;
            };
            let input = input.trim_start().strip_prefix('%').unwrap_or(input);
            let (entity_name, input) = input
                .trim_start()
                .split_once(|c: char| c.is_ascii_whitespace())
                .ok_or_else(|| {
                    msg("<!ENTITY declarations should contain both an entity name and an entity value")
                })?;
            let input = input
                .trim_start()
                .strip_prefix('"')
                .ok_or_else(|| msg("<!ENTITY values should be enclosed in double quotes"))?;
            let (entity_value, input) = input.split_once('"').ok_or_else(|| {
                msg("<!ENTITY declarations values should be enclosed in double quotes")
            })?;
            input
                .trim_start()
                .strip_prefix('>')
                .ok_or_else(|| msg("<!ENTITY declarations values should end with >"))?;
            let entity_value = unescape_with(entity_value, |e| self.resolve_entity(e))
                .map_err(|e| syntax_error(quick_xml::Error::from(e)))?
                .into_owned();
            self.custom_entities
                .insert(entity_name.to_owned(), entity_value);
        }
        Ok(())
    }

    fn parse_start_event(
        &mut self,
        event: &BytesStart<'_>,
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        if let Some(LayerKind::LiteralProperty { writer, .. }) =
            self.layers.last_mut().map(|layer| &mut layer.kind)
        {
            let name = self
                .reader
                .decoder()
                .decode(event.name().as_ref())
                .map_err(|e| syntax_error(quick_xml::Error::from(e)))?
                .into_owned();
            let mut clean_event = BytesStart::new(name);
            let mut declared = Vec::new();
            for attribute in event.attributes() {
                let attribute =
                    attribute.map_err(|e| syntax_error(quick_xml::Error::InvalidAttr(e)))?;
                if attribute.key.as_namespace_binding().is_some() {
                    declared.push(attribute.key.as_ref().to_vec());
                }
                clean_event.push_attribute(attribute);
            }
            if self.in_literal_depth == 0 {
                // the root of the literal carries every namespace in scope, once
                for (prefix, namespace) in self.reader.prefixes() {
                    let key = match prefix {
                        PrefixDeclaration::Default => b"xmlns".to_vec(),
                        PrefixDeclaration::Named(name) => [b"xmlns:".as_slice(), name].concat(),
                    };
                    if !declared.contains(&key) {
                        clean_event.push_attribute((key.as_slice(), namespace.into_inner()));
                    }
                }
            }
            writer
                .write_event(Event::Start(clean_event))
                .map_err(|e| syntax_error(quick_xml::Error::from(e)))?;
            self.in_literal_depth += 1;
            return Ok(());
        }

        let tag = self.resolve_tag_name(event.name())?;
        let attributes = self.read_attributes(event)?;

        let parent = match self.layers.last().map(|layer| &layer.kind) {
            Some(LayerKind::Document) => {
                if tag == rdf::RDF {
                    self.layers.push(Layer {
                        kind: LayerKind::Wrapper,
                        tag,
                        language: attributes.language,
                        base_iri: attributes.base_iri,
                    });
                    return Ok(());
                }
                None
            }
            Some(
                LayerKind::Wrapper
                | LayerKind::Property { .. }
                | LayerKind::CollectionProperty { .. },
            ) => None,
            Some(LayerKind::Node { subject, .. }) => Some(subject.clone()),
            Some(LayerKind::LiteralProperty { .. }) | None => {
                return Err(msg("No layer in the stack: the XML is not balanced"));
            }
        };
        let layer = match parent {
            None => self.open_node_element(tag, attributes, collection)?,
            Some(subject) => self.open_property_element(tag, subject, attributes, collection)?,
        };
        self.layers.push(layer);
        Ok(())
    }

    fn read_attributes(&self, event: &BytesStart<'_>) -> Result<Attributes, RdfSyntaxError> {
        let mut attributes = Attributes::default();
        for attribute in event.attributes() {
            let attribute =
                attribute.map_err(|e| syntax_error(quick_xml::Error::InvalidAttr(e)))?;
            let key = attribute.key.as_ref();
            if key.starts_with(b"xml") {
                if key == b"xml:lang" {
                    attributes.language =
                        Some(self.convert_attribute(&attribute)?.to_ascii_lowercase());
                } else if key == b"xml:base" {
                    let iri = self.convert_attribute(&attribute)?;
                    let resolved = match self.current_base_iri() {
                        Some(base) => base.resolve(&iri),
                        None => Iri::parse(iri.clone()),
                    };
                    attributes.base_iri = Some(resolved.map_err(|error| {
                        RdfSyntaxError::new(
                            RdfFormat::RdfXml,
                            RdfSyntaxErrorKind::InvalidIri { iri, error },
                        )
                    })?);
                }
                continue;
            }
            let Some(name) = self.resolve_attribute_name(attribute.key)? else {
                tracing::debug!(
                    attribute = %String::from_utf8_lossy(key),
                    "skipping attribute without namespace"
                );
                continue;
            };
            match name.as_str() {
                RDF_ID => {
                    let id = self.convert_attribute(&attribute)?;
                    if !is_nc_name(&id) {
                        return Err(msg(format!("{id} is not a valid rdf:ID value")));
                    }
                    attributes.id = Some(id);
                }
                RDF_BAG_ID => (),
                RDF_NODE_ID => {
                    let id = self.convert_attribute(&attribute)?;
                    if !is_nc_name(&id) {
                        return Err(msg(format!("{id} is not a valid rdf:nodeID value")));
                    }
                    attributes.node_id = Some(id);
                }
                RDF_ABOUT => attributes.about = Some(self.convert_attribute(&attribute)?),
                RDF_RESOURCE => attributes.resource = Some(self.convert_attribute(&attribute)?),
                RDF_DATATYPE => attributes.datatype = Some(self.convert_attribute(&attribute)?),
                RDF_PARSE_TYPE => {
                    attributes.parse_type = Some(match attribute.value.as_ref() {
                        b"Collection" => ParseType::Collection,
                        b"Resource" => ParseType::Resource,
                        _ => ParseType::Literal,
                    });
                }
                rdf::TYPE => attributes.type_uri = Some(self.convert_attribute(&attribute)?),
                name if RESERVED_RDF_ATTRIBUTES.contains(&name) => {
                    return Err(msg(format!("{name} is not a valid attribute")));
                }
                _ => {
                    let value = self.convert_attribute(&attribute)?;
                    attributes.properties.push((name, value));
                }
            }
        }
        Ok(attributes)
    }

    fn open_node_element(
        &mut self,
        tag: String,
        attributes: Attributes,
        collection: &mut Collection,
    ) -> Result<Layer, RdfSyntaxError> {
        if RESERVED_RDF_ELEMENTS.contains(&tag.as_str()) {
            return Err(msg(format!("Invalid node element tag name: {tag}")));
        }
        let base_iri = attributes.base_iri.as_ref();
        let subject = match (&attributes.id, &attributes.node_id, &attributes.about) {
            (Some(id), None, None) => {
                ResourceReference::from_key(&self.resolve_uri(base_iri, &format!("#{id}")))
            }
            (None, Some(node_id), None) => ResourceReference::blank_node(node_id.as_str()),
            (None, None, Some(about)) => {
                ResourceReference::from_key(&self.resolve_uri(base_iri, about))
            }
            (None, None, None) => collection.fresh_blank_node().reference(),
            (Some(_), Some(_), _) => {
                return Err(msg(
                    "Not both rdf:ID and rdf:nodeID could be set at the same time",
                ));
            }
            (_, Some(_), Some(_)) => {
                return Err(msg(
                    "Not both rdf:nodeID and rdf:about could be set at the same time",
                ));
            }
            (Some(_), _, Some(_)) => {
                return Err(msg(
                    "Not both rdf:ID and rdf:about could be set at the same time",
                ));
            }
        };
        collection.find_or_create_reference(subject.clone());

        match self.layers.last_mut().map(|layer| &mut layer.kind) {
            Some(LayerKind::Property {
                subject: parent,
                predicate,
                object,
                ..
            }) => {
                if PropertyObject::is_defined(object.as_ref()) {
                    return Err(msg("Unexpected node, a text value is already present"));
                }
                *object = Some(PropertyObject::Node(subject.clone()));
                collection
                    .assert_link(parent, predicate, &subject)
                    .map_err(syntax_error)?;
            }
            Some(LayerKind::CollectionProperty { items, .. }) => items.push(subject.clone()),
            _ => (),
        }

        if tag != rdf::DESCRIPTION {
            collection
                .assert_link(&subject, rdf::TYPE, &ResourceReference::resource(tag.as_str()))
                .map_err(syntax_error)?;
        }
        self.assert_attributes(&subject, &attributes, collection)?;
        Ok(Layer {
            kind: LayerKind::Node {
                subject,
                li_counter: 0,
            },
            tag,
            language: attributes.language,
            base_iri: attributes.base_iri,
        })
    }

    fn open_property_element(
        &mut self,
        tag: String,
        subject: ResourceReference,
        attributes: Attributes,
        collection: &mut Collection,
    ) -> Result<Layer, RdfSyntaxError> {
        let predicate = if tag == rdf::LI {
            let Some(LayerKind::Node { li_counter, .. }) =
                self.layers.last_mut().map(|layer| &mut layer.kind)
            else {
                return Err(msg(format!("Invalid property element tag name: {tag}")));
            };
            *li_counter += 1;
            rdf::member(*li_counter)
        } else if RESERVED_RDF_ELEMENTS.contains(&tag.as_str()) || tag == rdf::DESCRIPTION {
            return Err(msg(format!("Invalid property element tag name: {tag}")));
        } else {
            tag.clone()
        };
        if attributes.about.is_some() {
            return Err(msg(format!(
                "rdf:about is not allowed on the property element {tag}"
            )));
        }
        if attributes.id.is_some() {
            tracing::debug!(predicate = %predicate, "ignoring rdf:ID on a property element");
        }

        let base_iri = attributes.base_iri.as_ref();
        let kind = match attributes.parse_type.as_ref() {
            None => {
                if attributes.resource.is_some()
                    || attributes.node_id.is_some()
                    || attributes.type_uri.is_some()
                    || !attributes.properties.is_empty()
                {
                    let object = match (&attributes.resource, &attributes.node_id) {
                        (Some(resource), None) => {
                            ResourceReference::from_key(&self.resolve_uri(base_iri, resource))
                        }
                        (None, Some(node_id)) => ResourceReference::blank_node(node_id.as_str()),
                        (None, None) => collection.fresh_blank_node().reference(),
                        (Some(_), Some(_)) => {
                            return Err(msg(
                                "Not both rdf:resource and rdf:nodeID could be set at the same time",
                            ));
                        }
                    };
                    collection
                        .assert_link(&subject, &predicate, &object)
                        .map_err(syntax_error)?;
                    self.assert_attributes(&object, &attributes, collection)?;
                    LayerKind::Property {
                        subject,
                        predicate,
                        object: Some(PropertyObject::Node(object)),
                        datatype: None,
                    }
                } else {
                    LayerKind::Property {
                        subject,
                        predicate,
                        object: None,
                        datatype: attributes
                            .datatype
                            .as_deref()
                            .map(|datatype| self.resolve_uri(base_iri, datatype)),
                    }
                }
            }
            Some(ParseType::Literal) => LayerKind::LiteralProperty {
                subject,
                predicate,
                writer: Writer::new(Vec::new()),
            },
            Some(ParseType::Resource) => {
                let object = collection.fresh_blank_node().reference();
                collection
                    .assert_link(&subject, &predicate, &object)
                    .map_err(syntax_error)?;
                LayerKind::Node {
                    subject: object,
                    li_counter: 0,
                }
            }
            Some(ParseType::Collection) => LayerKind::CollectionProperty {
                subject,
                predicate,
                items: Vec::new(),
            },
        };
        Ok(Layer {
            kind,
            tag,
            language: attributes.language,
            base_iri: attributes.base_iri,
        })
    }

    /// Asserts `rdf:type` and the property attributes of an element on `subject`.
    fn assert_attributes(
        &self,
        subject: &ResourceReference,
        attributes: &Attributes,
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        if let Some(type_uri) = &attributes.type_uri {
            let type_uri = self.resolve_uri(attributes.base_iri.as_ref(), type_uri);
            collection
                .assert_link(subject, rdf::TYPE, &ResourceReference::from_key(&type_uri))
                .map_err(syntax_error)?;
        }
        let language = attributes
            .language
            .as_deref()
            .or_else(|| self.current_language())
            .filter(|language| !language.is_empty());
        for (predicate, value) in &attributes.properties {
            let literal = Literal::new(value.as_str(), None, language).map_err(syntax_error)?;
            collection
                .assert_literal(subject, predicate, literal)
                .map_err(syntax_error)?;
        }
        Ok(())
    }

    fn parse_end_event(
        &mut self,
        event: &BytesEnd<'_>,
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        if self.in_literal_depth > 0 {
            if let Some(LayerKind::LiteralProperty { writer, .. }) =
                self.layers.last_mut().map(|layer| &mut layer.kind)
            {
                let name = self
                    .reader
                    .decoder()
                    .decode(event.name().as_ref())
                    .map_err(|e| syntax_error(quick_xml::Error::from(e)))?
                    .into_owned();
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(|e| syntax_error(quick_xml::Error::from(e)))?;
                self.in_literal_depth -= 1;
                return Ok(());
            }
        }
        if self.layers.len() <= 1 {
            return Err(msg("Unexpected end tag: the XML is not balanced"));
        }
        if let Some(layer) = self.layers.pop() {
            self.close_layer(layer, collection)?;
        }
        Ok(())
    }

    fn parse_text(&mut self, text: String) -> Result<(), RdfSyntaxError> {
        match self.layers.last_mut().map(|layer| &mut layer.kind) {
            Some(LayerKind::Property { object, .. }) => match object {
                Some(PropertyObject::Node(node)) => {
                    if text.bytes().all(is_whitespace) {
                        Ok(())
                    } else {
                        Err(msg(format!(
                            "Unexpected text event: '{text}', the object is already {node}"
                        )))
                    }
                }
                Some(PropertyObject::Text(current)) => {
                    current.push_str(&text);
                    Ok(())
                }
                None => {
                    *object = Some(PropertyObject::Text(text));
                    Ok(())
                }
            },
            Some(LayerKind::LiteralProperty { writer, .. }) => writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(|e| syntax_error(quick_xml::Error::from(e))),
            _ => {
                if text.bytes().all(is_whitespace) {
                    Ok(())
                } else {
                    Err(msg(format!("Unexpected text event: '{text}'")))
                }
            }
        }
    }

    fn close_layer(
        &self,
        layer: Layer,
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        match layer.kind {
            LayerKind::Property {
                subject,
                predicate,
                object,
                datatype,
            } => {
                let text = match object {
                    Some(PropertyObject::Node(_)) => return Ok(()),
                    Some(PropertyObject::Text(text)) => text,
                    None => String::new(),
                };
                let language = layer
                    .language
                    .as_deref()
                    .or_else(|| self.current_language())
                    .filter(|language| !language.is_empty());
                let literal =
                    Literal::new(text, datatype.as_deref(), language).map_err(syntax_error)?;
                collection
                    .assert_literal(&subject, &predicate, literal)
                    .map_err(syntax_error)?;
            }
            LayerKind::LiteralProperty {
                subject,
                predicate,
                writer,
            } => {
                let value = String::from_utf8(writer.into_inner())
                    .map_err(|_| msg("The XML literal is not in valid UTF-8"))?;
                let literal =
                    Literal::new_typed_literal(value, rdf::XML_LITERAL).map_err(syntax_error)?;
                collection
                    .assert_literal(&subject, &predicate, literal)
                    .map_err(syntax_error)?;
            }
            LayerKind::CollectionProperty {
                subject,
                predicate,
                items,
            } => {
                let mut current = ResourceReference::resource(rdf::NIL);
                for item in items.into_iter().rev() {
                    let cell = collection.fresh_blank_node().reference();
                    collection
                        .assert_link(&cell, rdf::FIRST, &item)
                        .map_err(syntax_error)?;
                    collection
                        .assert_link(&cell, rdf::REST, &current)
                        .map_err(syntax_error)?;
                    current = cell;
                }
                collection
                    .assert_link(&subject, &predicate, &current)
                    .map_err(syntax_error)?;
            }
            LayerKind::Document | LayerKind::Wrapper | LayerKind::Node { .. } => (),
        }
        Ok(())
    }

    fn resolve_tag_name(&self, qname: QName<'_>) -> Result<String, RdfSyntaxError> {
        let (namespace, local_name) = self.reader.resolve_element(qname);
        self.resolve_ns_name(namespace, local_name)?
            .ok_or_else(|| msg("XML namespaces are required in RDF/XML"))
    }

    /// The full URI of an attribute, `None` for unqualified attributes with no `rdf:` meaning.
    fn resolve_attribute_name(&self, qname: QName<'_>) -> Result<Option<String>, RdfSyntaxError> {
        let (namespace, local_name) = self.reader.resolve_attribute(qname);
        if matches!(namespace, ResolveResult::Unbound) {
            return Ok(LEGACY_ATTRIBUTES
                .iter()
                .find(|(name, _)| *name == local_name.as_ref())
                .map(|(_, uri)| (*uri).to_owned()));
        }
        self.resolve_ns_name(namespace, local_name)
    }

    fn resolve_ns_name(
        &self,
        namespace: ResolveResult<'_>,
        local_name: LocalName<'_>,
    ) -> Result<Option<String>, RdfSyntaxError> {
        match namespace {
            ResolveResult::Bound(ns) => {
                let mut value = Vec::with_capacity(ns.as_ref().len() + local_name.as_ref().len());
                value.extend_from_slice(ns.as_ref());
                value.extend_from_slice(local_name.as_ref());
                let value = self
                    .reader
                    .decoder()
                    .decode(&value)
                    .map_err(|e| syntax_error(quick_xml::Error::from(e)))?;
                Ok(Some(
                    unescape_with(&value, |e| self.resolve_entity(e))
                        .map_err(|e| syntax_error(quick_xml::Error::from(e)))?
                        .into_owned(),
                ))
            }
            ResolveResult::Unbound => Ok(None),
            ResolveResult::Unknown(prefix) => Err(msg(format!(
                "Unknown prefix {}:",
                String::from_utf8_lossy(&prefix)
            ))),
        }
    }

    fn convert_attribute(&self, attribute: &Attribute<'_>) -> Result<String, RdfSyntaxError> {
        Ok(attribute
            .decode_and_unescape_value_with(self.reader.decoder(), |e| self.resolve_entity(e))
            .map_err(syntax_error)?
            .into_owned())
    }

    fn resolve_uri(&self, base_iri: Option<&Iri<String>>, uri: &str) -> String {
        sanitize_uri(uri, base_iri.or_else(|| self.current_base_iri()))
    }

    fn current_language(&self) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.language.as_deref())
    }

    fn current_base_iri(&self) -> Option<&Iri<String>> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.base_iri.as_ref())
    }

    fn resolve_entity(&self, e: &str) -> Option<&str> {
        resolve_xml_entity(e).or_else(|| self.custom_entities.get(e).map(String::as_str))
    }

    fn location(&self) -> ErrorLocation {
        ErrorLocation::Element {
            name: self
                .layers
                .last()
                .map(|layer| layer.tag.clone())
                .unwrap_or_default(),
            offset: self.reader.buffer_position(),
        }
    }
}

fn msg(message: impl Into<String>) -> RdfSyntaxError {
    RdfSyntaxError::msg(RdfFormat::RdfXml, message)
}

fn syntax_error(kind: impl Into<RdfSyntaxErrorKind>) -> RdfSyntaxError {
    RdfSyntaxError::new(RdfFormat::RdfXml, kind.into())
}
