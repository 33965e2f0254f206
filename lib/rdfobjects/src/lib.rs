#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod collection;
mod error;
mod fetch;
mod format;
mod iri;
mod json;
mod literal;
mod namespace;
mod node;
mod ntriples;
mod parser;
mod rdfa;
mod rdfxml;
pub mod vocab;

pub use crate::collection::Collection;
pub use crate::error::{ErrorLocation, RdfParseError, RdfSyntaxError, TextPosition};
#[cfg(feature = "http-client")]
pub use crate::fetch::HttpFetcher;
pub use crate::fetch::{
    FetchError, FetchedDocument, Fetcher, FormatProxy, ProxyRegistry, QueryProxy, negotiate_format,
};
pub use crate::format::{RdfFormat, Sniffed, XmlOutline, sniff};
pub use crate::iri::{is_absolute_uri, is_blank_node_id, is_network_uri, sanitize_uri};
pub use crate::json::JsonParser;
pub use crate::literal::{Literal, LiteralFormatError, LiteralValue, print_quoted_str};
pub use crate::namespace::{
    Curie, DEFAULT_PREFIXES, NamespaceError, NamespaceRegistry, is_safe_curie,
};
pub use crate::node::{
    NamespaceSlot, Node, NodeKind, NodeLookup, Object, PredicateValue, ResourceReference,
};
pub use crate::ntriples::NTriplesParser;
pub use crate::parser::RdfParser;
pub use crate::rdfa::{RdfaExtractor, RdfaOutput};
pub use crate::rdfxml::{RdfXmlParser, XmlBlock};
