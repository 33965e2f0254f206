use crate::vocab::xhtml;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::{fmt, str};

/// The wire formats this crate reads.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RdfFormat {
    /// [N-Triples](https://www.w3.org/TR/n-triples/)
    NTriples,
    /// [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/)
    RdfXml,
    /// [RDFa](https://www.w3.org/TR/rdfa-core/) embedded in (X)HTML, read through an external extractor
    Rdfa,
    /// [RDF/JSON](https://www.w3.org/TR/rdf-json/)
    Json,
}

impl RdfFormat {
    /// The format [IANA media type](https://tools.ietf.org/html/rfc2046).
    ///
    /// ```
    /// use rdfobjects::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::NTriples.media_type(), "application/n-triples")
    /// ```
    #[inline]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::NTriples => "application/n-triples",
            Self::RdfXml => "application/rdf+xml",
            Self::Rdfa => "application/xhtml+xml",
            Self::Json => "application/rdf+json",
        }
    }

    /// The format [IANA-registered](https://tools.ietf.org/html/rfc2046) file extension.
    #[inline]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::NTriples => "nt",
            Self::RdfXml => "rdf",
            Self::Rdfa => "xhtml",
            Self::Json => "rj",
        }
    }

    /// The format name.
    ///
    /// ```
    /// use rdfobjects::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::RdfXml.name(), "RDF/XML")
    /// ```
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NTriples => "N-Triples",
            Self::RdfXml => "RDF/XML",
            Self::Rdfa => "RDFa",
            Self::Json => "RDF/JSON",
        }
    }

    /// The short tag used to force a format: `rdfxml`, `rdfa`, `ntriples` or `json`.
    #[inline]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::NTriples => "ntriples",
            Self::RdfXml => "rdfxml",
            Self::Rdfa => "rdfa",
            Self::Json => "json",
        }
    }

    /// Looks for a format from its short tag.
    ///
    /// ```
    /// use rdfobjects::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::from_name("ntriples"), Some(RdfFormat::NTriples));
    /// assert_eq!(RdfFormat::from_name("turtle"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, RdfFormat); 4] = [
            ("json", RdfFormat::Json),
            ("ntriples", RdfFormat::NTriples),
            ("rdfa", RdfFormat::Rdfa),
            ("rdfxml", RdfFormat::RdfXml),
        ];
        NAMES
            .into_iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
            .map(|(_, format)| format)
    }

    /// Looks for a format from a media type, ignoring parameters.
    ///
    /// ```
    /// use rdfobjects::RdfFormat;
    ///
    /// assert_eq!(
    ///     RdfFormat::from_media_type("application/rdf+xml; charset=utf-8"),
    ///     Some(RdfFormat::RdfXml)
    /// );
    /// ```
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        const MEDIA_SUBTYPES: [(&str, RdfFormat); 9] = [
            ("html", RdfFormat::Rdfa),
            ("json", RdfFormat::Json),
            ("n-triples", RdfFormat::NTriples),
            ("ntriples", RdfFormat::NTriples),
            ("plain", RdfFormat::NTriples),
            ("rdf+json", RdfFormat::Json),
            ("rdf+xml", RdfFormat::RdfXml),
            ("xhtml+xml", RdfFormat::Rdfa),
            ("xml", RdfFormat::RdfXml),
        ];
        let type_subtype = media_type.split(';').next().unwrap_or(media_type);
        let (r#type, subtype) = type_subtype.split_once('/')?;
        let r#type = r#type.trim();
        if !r#type.eq_ignore_ascii_case("application") && !r#type.eq_ignore_ascii_case("text") {
            return None;
        }
        let subtype = subtype.trim();
        let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);
        MEDIA_SUBTYPES
            .into_iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(subtype))
            .map(|(_, format)| format)
    }

    /// Looks for a format from a file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        const EXTENSIONS: [(&str, RdfFormat); 8] = [
            ("html", RdfFormat::Rdfa),
            ("json", RdfFormat::Json),
            ("nt", RdfFormat::NTriples),
            ("rdf", RdfFormat::RdfXml),
            ("rj", RdfFormat::Json),
            ("txt", RdfFormat::NTriples),
            ("xhtml", RdfFormat::Rdfa),
            ("xml", RdfFormat::RdfXml),
        ];
        EXTENSIONS
            .into_iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(extension))
            .map(|(_, format)| format)
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The root element and namespace declarations found by the XML pre-scan.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct XmlOutline {
    root: String,
    namespaces: Vec<(String, String)>,
}

impl XmlOutline {
    /// The qualified name of the root element.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The `(prefix, namespace)` declarations, the default namespace having an empty prefix.
    pub fn namespaces(&self) -> &[(String, String)] {
        &self.namespaces
    }

    /// The first prefix bound to `namespace`.
    pub fn prefix_of(&self, namespace: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(_, ns)| ns == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    pub fn declares(&self, namespace: &str) -> bool {
        self.prefix_of(namespace).is_some()
    }

    fn looks_like_html(&self) -> bool {
        self.declares(xhtml::NAMESPACE) || self.root.to_ascii_lowercase().contains("html")
    }
}

/// The outcome of format sniffing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Sniffed {
    format: RdfFormat,
    outline: Option<XmlOutline>,
}

impl Sniffed {
    #[inline]
    pub fn format(&self) -> RdfFormat {
        self.format
    }

    /// The XML outline if the input is a well-formed XML document.
    #[inline]
    pub fn outline(&self) -> Option<&XmlOutline> {
        self.outline.as_ref()
    }
}

/// Guesses the format of `data`.
///
/// A well-formed XML document with a single root is RDFa if it looks like (X)HTML and RDF/XML otherwise.
/// Anything else is RDF/JSON if it is a JSON object and N-Triples as a last resort.
///
/// ```
/// use rdfobjects::{RdfFormat, sniff};
///
/// assert_eq!(sniff(b"<rdf:RDF xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'/>").format(), RdfFormat::RdfXml);
/// assert_eq!(sniff(br#"{"http://example.com/s": {}}"#).format(), RdfFormat::Json);
/// assert_eq!(sniff(b"<http://example.com/s> <http://example.com/p> \"o\" .").format(), RdfFormat::NTriples);
/// ```
pub fn sniff(data: &[u8]) -> Sniffed {
    if let Some(outline) = scan_xml(data) {
        let format = if outline.looks_like_html() {
            RdfFormat::Rdfa
        } else {
            RdfFormat::RdfXml
        };
        return Sniffed {
            format,
            outline: Some(outline),
        };
    }
    let format = if is_json_object(data) {
        RdfFormat::Json
    } else {
        RdfFormat::NTriples
    };
    Sniffed {
        format,
        outline: None,
    }
}

fn is_json_object(data: &[u8]) -> bool {
    let data = skip_bom(data);
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
        && serde_json::from_slice::<serde_json::Value>(data).is_ok_and(|v| v.is_object())
}

fn scan_xml(data: &[u8]) -> Option<XmlOutline> {
    let data = skip_bom(data);
    if *data.iter().find(|b| !b.is_ascii_whitespace())? != b'<' {
        return None;
    }
    let mut reader = Reader::from_reader(data);
    let mut depth = 0_usize;
    let mut root = None;
    let mut namespaces = Vec::new();
    loop {
        match reader.read_event().ok()? {
            Event::Start(element) => {
                if depth == 0 {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(element_name(&element)?);
                }
                collect_namespaces(&element, &mut namespaces)?;
                depth += 1;
            }
            Event::Empty(element) => {
                if depth == 0 {
                    if root.is_some() {
                        return None;
                    }
                    root = Some(element_name(&element)?);
                }
                collect_namespaces(&element, &mut namespaces)?;
            }
            Event::End(_) => depth = depth.checked_sub(1)?,
            Event::Text(text) => {
                if depth == 0 && !text.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            Event::CData(_) => {
                if depth == 0 {
                    return None;
                }
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => (),
        }
    }
    if depth != 0 {
        return None;
    }
    Some(XmlOutline {
        root: root?,
        namespaces,
    })
}

fn element_name(element: &BytesStart<'_>) -> Option<String> {
    str::from_utf8(element.name().as_ref())
        .ok()
        .map(ToOwned::to_owned)
}

fn collect_namespaces(
    element: &BytesStart<'_>,
    namespaces: &mut Vec<(String, String)>,
) -> Option<()> {
    for attribute in element.attributes() {
        let attribute = attribute.ok()?;
        let key = attribute.key.as_ref();
        let prefix = if key == b"xmlns" {
            ""
        } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
            str::from_utf8(prefix).ok()?
        } else {
            continue;
        };
        let raw = String::from_utf8_lossy(&attribute.value);
        // references to DOCTYPE entities are kept as written
        let value = unescape(&raw).map_or_else(|_| raw.to_string(), |value| value.into_owned());
        namespaces.push((prefix.to_owned(), value));
    }
    Some(())
}

fn skip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(RdfFormat::from_name("rdfxml"), Some(RdfFormat::RdfXml));
        assert_eq!(RdfFormat::from_name("RDFA"), Some(RdfFormat::Rdfa));
        assert_eq!(RdfFormat::from_name("json"), Some(RdfFormat::Json));
        assert_eq!(RdfFormat::from_name("n3"), None);
    }

    #[test]
    fn test_from_media_type() {
        assert_eq!(RdfFormat::from_media_type("foo/bar"), None);
        assert_eq!(
            RdfFormat::from_media_type("text/plain"),
            Some(RdfFormat::NTriples)
        );
        assert_eq!(
            RdfFormat::from_media_type("text/html; charset=utf-8"),
            Some(RdfFormat::Rdfa)
        );
    }

    #[test]
    fn sniff_html_documents() {
        let sniffed = sniff(b"<html xmlns='http://www.w3.org/1999/xhtml'><body/></html>");
        assert_eq!(sniffed.format(), RdfFormat::Rdfa);
        let sniffed = sniff(b"<HTML><body></body></HTML>");
        assert_eq!(sniffed.format(), RdfFormat::Rdfa);
    }

    #[test]
    fn sniff_collects_namespaces() {
        let sniffed = sniff(
            br#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="http://example.com/feed"/>
</rdf:RDF>"#,
        );
        assert_eq!(sniffed.format(), RdfFormat::RdfXml);
        let outline = sniffed.outline().unwrap();
        assert_eq!(outline.root(), "rdf:RDF");
        assert_eq!(outline.prefix_of("http://purl.org/rss/1.0/"), Some(""));
    }

    #[test]
    fn sniff_tolerates_entity_namespaces() {
        let sniffed = sniff(
            br#"<?xml version="1.0"?>
<!DOCTYPE rdf:RDF [<!ENTITY ex "http://ex/">]>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="&ex;">
  <rdf:Description rdf:about="&ex;1"/>
</rdf:RDF>"#,
        );
        assert_eq!(sniffed.format(), RdfFormat::RdfXml);
        let outline = sniffed.outline().unwrap();
        assert_eq!(outline.prefix_of("&ex;"), Some("ex"));
    }

    #[test]
    fn malformed_xml_falls_through() {
        assert_eq!(sniff(b"<a><b></a>").format(), RdfFormat::NTriples);
        assert_eq!(sniff(b"<a/><b/>").format(), RdfFormat::NTriples);
        assert_eq!(sniff(b"[1, 2]").format(), RdfFormat::NTriples);
        assert_eq!(sniff(b"").format(), RdfFormat::NTriples);
    }
}
