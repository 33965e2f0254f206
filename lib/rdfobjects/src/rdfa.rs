//! Glue for RDFa documents.
//!
//! RDFa is not parsed here: an [`RdfaExtractor`] turns the (X)HTML page into N-Triples or RDF/XML,
//! which is then read by [`NTriplesParser`] or [`RdfXmlParser`].

use crate::collection::Collection;
use crate::error::{RdfSyntaxError, RdfSyntaxErrorKind};
use crate::format::RdfFormat;
use crate::ntriples::NTriplesParser;
use crate::rdfxml::RdfXmlParser;
use oxiri::Iri;
use std::error::Error;

/// What an [`RdfaExtractor`] produced.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RdfaOutput {
    /// An N-Triples document.
    NTriples(String),
    /// An RDF/XML document.
    RdfXml(Vec<u8>),
}

/// Extracts the triples embedded in an (X)HTML page, for example with an XSLT transform.
///
/// ```
/// use rdfobjects::{Collection, NamespaceRegistry, RdfFormat, RdfParser, RdfaExtractor, RdfaOutput};
///
/// struct Fixed;
///
/// impl RdfaExtractor for Fixed {
///     fn extract(
///         &self,
///         _document: &[u8],
///         base_iri: Option<&str>,
///     ) -> Result<RdfaOutput, Box<dyn std::error::Error + Send + Sync>> {
///         Ok(RdfaOutput::NTriples(format!(
///             "<{}> <http://purl.org/dc/terms/title> \"Home\" .",
///             base_iri.unwrap_or("http://example.com/")
///         )))
///     }
/// }
///
/// let parser = RdfParser::from_format(RdfFormat::Rdfa)
///     .with_base_iri("http://example.com/home")?
///     .with_rdfa_extractor(Fixed);
/// let mut collection = Collection::with_registry(NamespaceRegistry::new());
/// collection.parse(b"<html xmlns='http://www.w3.org/1999/xhtml'/>", &parser)?;
/// assert!(collection.contains("http://example.com/home"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub trait RdfaExtractor: Send + Sync {
    fn extract(
        &self,
        document: &[u8],
        base_iri: Option<&str>,
    ) -> Result<RdfaOutput, Box<dyn Error + Send + Sync>>;
}

pub(crate) fn parse_rdfa(
    extractor: Option<&dyn RdfaExtractor>,
    data: &[u8],
    base: Option<&Iri<String>>,
    collection: &mut Collection,
) -> Result<(), RdfSyntaxError> {
    let Some(extractor) = extractor else {
        return Err(RdfSyntaxError::msg(
            RdfFormat::Rdfa,
            "No RDFa extractor is configured, the document can't be read",
        ));
    };
    let output = extractor
        .extract(data, base.map(Iri::as_str))
        .map_err(|e| RdfSyntaxError::new(RdfFormat::Rdfa, RdfSyntaxErrorKind::Extractor(e)))?;
    match output {
        RdfaOutput::NTriples(triples) => NTriplesParser::new()
            .with_base(base.cloned())
            .parse_slice(triples.as_bytes(), collection),
        RdfaOutput::RdfXml(document) => RdfXmlParser::new()
            .with_base(base.cloned())
            .parse_slice(&document, collection),
    }
}
