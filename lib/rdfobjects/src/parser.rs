use crate::collection::Collection;
use crate::error::RdfParseError;
use crate::fetch::{FetchError, Fetcher};
use crate::format::{RdfFormat, sniff};
use crate::iri::is_network_uri;
use crate::json::JsonParser;
use crate::ntriples::NTriplesParser;
use crate::rdfa::{RdfaExtractor, parse_rdfa};
use crate::rdfxml::RdfXmlParser;
use oxiri::{Iri, IriParseError};
use std::io::Read;
use std::str;
use std::sync::Arc;

/// Parses any of the supported formats into a [`Collection`].
///
/// Without an explicit [format](RdfParser::from_format) the format is guessed with [`sniff`]:
/// XML documents are RDF/XML (or RDFa for (X)HTML), JSON objects are RDF/JSON and anything else
/// is read as N-Triples.
/// An input made of a single `http(s)` URI is fetched with the configured [`Fetcher`] first.
///
/// ```
/// use rdfobjects::{NamespaceRegistry, Collection, RdfParser};
///
/// let parser = RdfParser::new();
/// let mut collection = Collection::with_registry(NamespaceRegistry::new());
/// parser.parse_slice(br#"{"http://example.com/s": {"http://example.com/p": [{"type": "literal", "value": "o"}]}}"#, &mut collection)?;
/// parser.parse_slice(b"<http://example.com/s> <http://example.com/p> \"o2\" .", &mut collection)?;
/// assert_eq!(collection.get("http://example.com/s").and_then(|s| s.objects("http://example.com/p")).map(|v| v.len()), Some(2));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Default)]
#[must_use]
pub struct RdfParser {
    format: Option<RdfFormat>,
    base: Option<Iri<String>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    rdfa_extractor: Option<Arc<dyn RdfaExtractor>>,
}

impl RdfParser {
    /// Builds a parser guessing the format of its input.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a parser for the given format, skipping detection.
    ///
    /// ```
    /// use rdfobjects::{RdfFormat, RdfParser};
    ///
    /// let parser = RdfParser::from_format(RdfFormat::NTriples);
    /// assert_eq!(parser.format(), Some(RdfFormat::NTriples));
    /// ```
    #[inline]
    pub fn from_format(format: RdfFormat) -> Self {
        Self {
            format: Some(format),
            ..Self::default()
        }
    }

    /// The forced format, if any.
    #[inline]
    pub fn format(&self) -> Option<RdfFormat> {
        self.format
    }

    /// Provides the base URI relative URIs are resolved against.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Sets how network URIs are retrieved.
    #[inline]
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Sets how triples are extracted from RDFa documents.
    #[inline]
    pub fn with_rdfa_extractor(mut self, extractor: impl RdfaExtractor + 'static) -> Self {
        self.rdfa_extractor = Some(Arc::new(extractor));
        self
    }

    /// Parses `data` into a new [`Collection`] using the [shared registry](crate::NamespaceRegistry::shared).
    pub fn parse(&self, data: &[u8]) -> Result<Collection, RdfParseError> {
        let mut collection = Collection::new();
        self.parse_slice(data, &mut collection)?;
        Ok(collection)
    }

    /// Parses `data` and adds its content to `collection`.
    pub fn parse_slice(
        &self,
        data: &[u8],
        collection: &mut Collection,
    ) -> Result<(), RdfParseError> {
        if self.format.is_none() {
            if let Some(uri) = single_network_uri(data) {
                return self.describe(uri, collection);
            }
        }
        self.parse_document(data, self.base.clone(), collection)
    }

    /// Reads `reader` to the end and parses its content like [`RdfParser::parse_slice`].
    pub fn parse_read(
        &self,
        mut reader: impl Read,
        collection: &mut Collection,
    ) -> Result<(), RdfParseError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.parse_slice(&data, collection)
    }

    /// Fetches `uri` and adds the retrieved graph to `collection`.
    ///
    /// The URI the document was finally retrieved from is used as base URI.
    ///
    /// ```
    /// use rdfobjects::{Collection, FetchError, FetchedDocument, NamespaceRegistry, RdfParser};
    ///
    /// let parser = RdfParser::new().with_fetcher(|uri: &str| -> Result<FetchedDocument, FetchError> {
    ///     Ok(FetchedDocument {
    ///         content: b"<> <http://purl.org/dc/terms/title> \"Home\" .".to_vec(),
    ///         uri: format!("{uri}/index"),
    ///     })
    /// });
    /// let mut collection = Collection::with_registry(NamespaceRegistry::new());
    /// parser.describe("http://example.com", &mut collection)?;
    /// assert!(collection.contains("http://example.com/index"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn describe(&self, uri: &str, collection: &mut Collection) -> Result<(), RdfParseError> {
        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| FetchError::NoFetcher { uri: uri.to_owned() })?;
        let document = fetcher.fetch(uri)?;
        tracing::debug!(
            %uri,
            retrieved_from = %document.uri,
            bytes = document.content.len(),
            "parsing fetched document"
        );
        let base = Iri::parse(document.uri).ok().or_else(|| self.base.clone());
        self.parse_document(&document.content, base, collection)
    }

    fn parse_document(
        &self,
        data: &[u8],
        base: Option<Iri<String>>,
        collection: &mut Collection,
    ) -> Result<(), RdfParseError> {
        let format = if let Some(format) = self.format {
            format
        } else {
            let format = sniff(data).format();
            tracing::debug!(%format, "detected format");
            format
        };
        match format {
            RdfFormat::RdfXml => RdfXmlParser::new()
                .with_base(base)
                .parse_slice(data, collection)?,
            RdfFormat::NTriples => NTriplesParser::new()
                .with_base(base)
                .parse_slice(data, collection)?,
            RdfFormat::Json => JsonParser::new()
                .with_base(base)
                .parse_slice(data, collection)?,
            RdfFormat::Rdfa => parse_rdfa(
                self.rdfa_extractor.as_deref(),
                data,
                base.as_ref(),
                collection,
            )?,
        }
        Ok(())
    }
}

/// The input if it is nothing but an `http(s)` URI.
fn single_network_uri(data: &[u8]) -> Option<&str> {
    let uri = str::from_utf8(data).ok()?.trim();
    (!uri.contains(char::is_whitespace) && is_network_uri(uri)).then_some(uri)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use crate::fetch::FetchedDocument;
    use crate::namespace::NamespaceRegistry;
    use std::error::Error;
    use std::io::Cursor;

    fn collection() -> Collection {
        Collection::with_registry(NamespaceRegistry::new())
    }

    #[test]
    fn sniffed_formats() -> Result<(), Box<dyn Error>> {
        let parser = RdfParser::new();
        let mut collection = collection();
        parser.parse_slice(
            br#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="http://ex/xml"/></rdf:RDF>"#,
            &mut collection,
        )?;
        parser.parse_slice(br#"{"http://ex/json": {}}"#, &mut collection)?;
        parser.parse_slice(b"<http://ex/nt> <http://ex/p> \"o\" .", &mut collection)?;
        assert_eq!(collection.uris(), ["http://ex/xml", "http://ex/json", "http://ex/nt"]);
        Ok(())
    }

    #[test]
    fn forced_format_skips_detection() {
        let error = RdfParser::from_format(RdfFormat::Json)
            .parse_slice(b"<http://ex/nt> <http://ex/p> \"o\" .", &mut collection())
            .unwrap_err();
        assert_eq!(
            error.as_syntax_error().map(crate::RdfSyntaxError::format),
            Some(RdfFormat::Json)
        );
    }

    #[test]
    fn html_needs_an_extractor() {
        let error = RdfParser::new()
            .parse_slice(
                b"<html xmlns=\"http://www.w3.org/1999/xhtml\"><body/></html>",
                &mut collection(),
            )
            .unwrap_err();
        assert_eq!(
            error.as_syntax_error().map(crate::RdfSyntaxError::format),
            Some(RdfFormat::Rdfa)
        );
    }

    #[test]
    fn single_uris_are_fetched() -> Result<(), Box<dyn Error>> {
        let parser = RdfParser::new().with_fetcher(|uri: &str| -> Result<FetchedDocument, FetchError> {
            assert_eq!(uri, "http://example.com/doc");
            Ok(FetchedDocument {
                content: br##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="#me"/></rdf:RDF>"##.to_vec(),
                uri: "http://example.com/final".into(),
            })
        });
        let mut collection = collection();
        parser.parse_read(Cursor::new(" http://example.com/doc\n"), &mut collection)?;
        assert_eq!(collection.uris(), ["http://example.com/final#me"]);
        Ok(())
    }

    #[test]
    fn fetching_needs_a_fetcher() {
        let error = RdfParser::new()
            .parse_slice(b"http://example.com/doc", &mut collection())
            .unwrap_err();
        assert!(matches!(
            error,
            RdfParseError::Fetch(FetchError::NoFetcher { .. })
        ));
        // with a forced format the URI is data
        assert!(RdfParser::from_format(RdfFormat::NTriples)
            .parse_slice(b"http://example.com/doc", &mut collection())
            .is_err());
    }

    #[test]
    fn fetch_errors_are_propagated() {
        let parser = RdfParser::new().with_fetcher(|uri: &str| -> Result<FetchedDocument, FetchError> {
            Err(FetchError::Status {
                uri: uri.into(),
                status: 404,
                message: "Not Found".into(),
            })
        });
        let error = parser.describe("http://example.com/missing", &mut collection()).unwrap_err();
        assert!(matches!(
            error,
            RdfParseError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }
}
