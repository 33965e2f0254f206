//! URIs of the vocabularies the parsers and serializers rely on.

pub mod rdf {
    //! [RDF](https://www.w3.org/TR/rdf11-concepts/) vocabulary.

    /// The RDF namespace.
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// The generic node element of RDF/XML.
    pub const DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";
    /// The first item in the subject RDF list.
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    /// Container membership shortcut of RDF/XML.
    pub const LI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#li";
    /// The empty list.
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
    /// The root element of RDF/XML documents.
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#RDF";
    /// The rest of the subject RDF list after the first item.
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    /// The subject is an instance of a class.
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    /// The class of XML literal values.
    pub const XML_LITERAL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral";

    /// Returns the `rdf:_n` container membership property.
    pub fn member(n: u64) -> String {
        format!("{NAMESPACE}_{n}")
    }
}

pub mod rdfs {
    //! [RDFS](https://www.w3.org/TR/rdf-schema/) vocabulary.

    pub const NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";
}

pub mod xsd {
    //! [XML Schema](https://www.w3.org/TR/xmlschema11-2/) datatypes.

    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
    /// True or false.
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    /// Dates (yyyy-mm-dd) with or without timezone.
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    /// Date and time with or without timezone.
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    /// 64-bit floating point numbers incl. ±Inf, ±0, NaN.
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    /// 32-bit floating point numbers incl. ±Inf, ±0, NaN.
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    /// 2147483647 ≥ integer ≥ -2147483648.
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    /// Arbitrary-size integer numbers.
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    /// Character strings.
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

pub mod rss {
    //! [RSS 1.0](https://web.resource.org/rss/1.0/spec) vocabulary.

    pub const NAMESPACE: &str = "http://purl.org/rss/1.0/";
}

pub mod xhtml {
    //! XHTML namespaces, used to recognize RDFa documents.

    pub const NAMESPACE: &str = "http://www.w3.org/1999/xhtml";
    pub const VOCAB: &str = "http://www.w3.org/1999/xhtml/vocab#";
}

pub mod xml {
    //! The reserved `xml` namespace.

    pub const NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
}
