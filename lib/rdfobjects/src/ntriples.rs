//! A line based [N-Triples](https://www.w3.org/TR/n-triples/) reader.

use crate::collection::Collection;
use crate::error::{ErrorLocation, RdfSyntaxError, RdfSyntaxErrorKind, TextPosition};
use crate::format::RdfFormat;
use crate::iri::sanitize_uri;
use crate::literal::Literal;
use crate::node::ResourceReference;
use memchr::{memchr, memchr2};
use oxiri::{Iri, IriParseError};
use std::str;

/// A [N-Triples](https://www.w3.org/TR/n-triples/) parser writing into a [`Collection`].
///
/// It is lenient in a few ways useful for hand written data:
/// * subjects may be bare tokens (absolute URIs, blank node ids or safe CURIEs) instead of `<...>`,
/// * several triples may share the same line,
/// * relative object URIs are resolved against the base URI.
///
/// ```
/// use rdfobjects::{Collection, NTriplesParser, NamespaceRegistry};
///
/// let file = br#"<http://example.com/foo> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/foo> <http://schema.org/name> "Foo" .
/// <http://example.com/bar> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/bar> <http://schema.org/name> "Bar" ."#;
///
/// let mut collection = Collection::with_registry(NamespaceRegistry::new());
/// NTriplesParser::new().parse_slice(file, &mut collection)?;
/// assert_eq!(collection.find_by_predicate("http://schema.org/name").len(), 2);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NTriplesParser {
    base: Option<Iri<String>>,
}

impl NTriplesParser {
    /// Builds a new [`NTriplesParser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The base URI relative object URIs are resolved against.
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

    /// Parses a whole document and adds its triples to `collection`.
    ///
    /// The first malformed line aborts the parsing, triples of the previous lines are kept.
    pub fn parse_slice(
        &self,
        data: &[u8],
        collection: &mut Collection,
    ) -> Result<(), RdfSyntaxError> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let mut start = 0;
        let mut line = 0;
        while start < data.len() {
            let end = memchr(b'\n', &data[start..]).map_or(data.len(), |i| start + i);
            let content = &data[start..end];
            LineParser {
                data: content.strip_suffix(b"\r").unwrap_or(content),
                position: 0,
                line,
                offset: start,
                base: self.base.as_ref(),
            }
            .parse_triples(collection)?;
            start = end + 1;
            line += 1;
        }
        Ok(())
    }
}

enum Term {
    Reference(ResourceReference),
    Literal(Literal),
}

struct LineParser<'a> {
    data: &'a [u8],
    position: usize,
    line: u64,
    offset: usize,
    base: Option<&'a Iri<String>>,
}

impl<'a> LineParser<'a> {
    fn parse_triples(&mut self, collection: &mut Collection) -> Result<(), RdfSyntaxError> {
        loop {
            self.skip_whitespace();
            if matches!(self.peek(), None | Some(b'#')) {
                return Ok(());
            }
            let start = self.position;
            let subject = self.parse_subject(collection)?;
            self.skip_whitespace();
            let predicate = self.parse_predicate()?;
            self.skip_whitespace();
            match self.parse_object()? {
                Term::Reference(object) => collection.assert_link(&subject, &predicate, &object),
                Term::Literal(literal) => collection.assert_literal(&subject, &predicate, literal),
            }
            .map_err(|e| self.error_at(start, e.into()))?;
            self.skip_whitespace();
            if self.peek() != Some(b'.') {
                return Err(self.msg_at(
                    self.position,
                    "Expected '.' at the end of the triple",
                ));
            }
            self.position += 1;
        }
    }

    fn parse_subject(
        &mut self,
        collection: &Collection,
    ) -> Result<ResourceReference, RdfSyntaxError> {
        match self.peek() {
            Some(b'<') => {
                let iri = self.parse_iri()?;
                Ok(ResourceReference::from_key(&sanitize_uri(&iri, self.base)))
            }
            Some(b'_') if self.data[self.position..].starts_with(b"_:") => {
                self.parse_blank_node()
            }
            _ => {
                let start = self.position;
                let token = self.parse_bare_token()?;
                let key = collection
                    .registry()
                    .expand(token)
                    .map_err(|e| self.error_at(start, e.into()))?;
                Ok(ResourceReference::from_key(&key))
            }
        }
    }

    fn parse_predicate(&mut self) -> Result<String, RdfSyntaxError> {
        match self.peek() {
            Some(b'<') => self.parse_iri(),
            Some(_) => Ok(self.parse_bare_token()?.to_owned()),
            None => Err(self.msg_at(self.position, "Expected a predicate")),
        }
    }

    fn parse_object(&mut self) -> Result<Term, RdfSyntaxError> {
        match self.peek() {
            Some(b'<') => {
                let iri = self.parse_iri()?;
                Ok(Term::Reference(ResourceReference::from_key(&sanitize_uri(
                    &iri, self.base,
                ))))
            }
            Some(b'_') if self.data[self.position..].starts_with(b"_:") => {
                Ok(Term::Reference(self.parse_blank_node()?))
            }
            Some(b'"') => Ok(Term::Literal(self.parse_literal()?)),
            _ => Err(self.msg_at(
                self.position,
                "Expected an object: a <URI>, a _:blank node or a \"literal\"",
            )),
        }
    }

    /// `<...>` with `\u` and `\U` escapes.
    fn parse_iri(&mut self) -> Result<String, RdfSyntaxError> {
        let start = self.position;
        self.position += 1;
        let mut iri = String::new();
        loop {
            let Some(end) = memchr2(b'>', b'\\', &self.data[self.position..]) else {
                return Err(self.msg_at(start, "Unterminated IRI, a '>' is missing"));
            };
            iri.push_str(self.decode(self.position, self.position + end)?);
            self.position += end;
            if self.data[self.position] == b'>' {
                self.position += 1;
                return Ok(iri);
            }
            match self.data.get(self.position + 1) {
                Some(b'u' | b'U') => iri.push(self.parse_escape()?),
                _ => {
                    return Err(self.msg_at(
                        self.position,
                        "Only \\u and \\U escapes are allowed in IRIs",
                    ));
                }
            }
        }
    }

    /// `_:label` where a `.` only belongs to the label if more label characters follow it.
    fn parse_blank_node(&mut self) -> Result<ResourceReference, RdfSyntaxError> {
        let start = self.position;
        self.position += 2;
        let label_start = self.position;
        loop {
            match self.peek() {
                Some(b) if is_label_byte(b) => self.position += 1,
                Some(b'.') if self.data.get(self.position + 1).copied().is_some_and(is_label_byte) => {
                    self.position += 1;
                }
                _ => break,
            }
        }
        if label_start == self.position {
            return Err(self.msg_at(start, "Empty blank node label"));
        }
        Ok(ResourceReference::blank_node(
            self.decode(label_start, self.position)?,
        ))
    }

    fn parse_bare_token(&mut self) -> Result<&'a str, RdfSyntaxError> {
        let start = self.position;
        let end = self.data[start..]
            .iter()
            .position(|b| matches!(b, b' ' | b'\t'))
            .map_or(self.data.len(), |i| start + i);
        self.position = end;
        self.decode(start, end)
    }

    fn parse_literal(&mut self) -> Result<Literal, RdfSyntaxError> {
        let start = self.position;
        self.position += 1;
        let mut value = String::new();
        loop {
            let Some(end) = memchr2(b'"', b'\\', &self.data[self.position..]) else {
                return Err(self.msg_at(start, "Unterminated literal, a '\"' is missing"));
            };
            value.push_str(self.decode(self.position, self.position + end)?);
            self.position += end;
            if self.data[self.position] == b'"' {
                self.position += 1;
                break;
            }
            value.push(self.parse_escape()?);
        }

        let mut language = None;
        let mut datatype = None;
        if self.peek() == Some(b'@') {
            self.position += 1;
            let tag_start = self.position;
            while self
                .peek()
                .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-')
            {
                self.position += 1;
            }
            if tag_start == self.position {
                return Err(self.msg_at(tag_start, "Empty language tag"));
            }
            language = Some(self.decode(tag_start, self.position)?);
        } else if self.data[self.position..].starts_with(b"^^") {
            self.position += 2;
            if self.peek() != Some(b'<') {
                return Err(self.msg_at(self.position, "Expected a datatype <URI> after '^^'"));
            }
            datatype = Some(self.parse_iri()?);
        }
        Literal::new(value, datatype.as_deref(), language)
            .map_err(|e| self.error_at(start, e.into()))
    }

    /// Reads the escape sequence starting at the current `\`.
    fn parse_escape(&mut self) -> Result<char, RdfSyntaxError> {
        let start = self.position;
        let Some(&kind) = self.data.get(start + 1) else {
            return Err(self.msg_at(start, "Unterminated escape sequence"));
        };
        self.position += 2;
        let c = match kind {
            b't' => '\t',
            b'b' => '\x08',
            b'n' => '\n',
            b'r' => '\r',
            b'f' => '\x0C',
            b'"' => '"',
            b'\'' => '\'',
            b'\\' => '\\',
            b'/' => '/',
            b'u' => {
                let high = self.parse_hex(4)?;
                if (0xD800..0xDC00).contains(&high) {
                    // UTF-16 surrogate pair
                    if !self.data[self.position..].starts_with(b"\\u") {
                        return Err(self.msg_at(start, "Unpaired UTF-16 high surrogate"));
                    }
                    self.position += 2;
                    let low = self.parse_hex(4)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.msg_at(start, "Invalid UTF-16 low surrogate"));
                    }
                    return char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
                        .ok_or_else(|| self.msg_at(start, "Invalid UTF-16 surrogate pair"));
                }
                return char::from_u32(high)
                    .ok_or_else(|| self.msg_at(start, format!("Invalid code point U+{high:04X}")));
            }
            b'U' => {
                let codepoint = self.parse_hex(8)?;
                return char::from_u32(codepoint).ok_or_else(|| {
                    self.msg_at(start, format!("Invalid code point U+{codepoint:X}"))
                });
            }
            c => {
                return Err(self.msg_at(
                    start,
                    format!("Unexpected escape character '\\{}'", char::from(c)),
                ));
            }
        };
        Ok(c)
    }

    fn parse_hex(&mut self, len: usize) -> Result<u32, RdfSyntaxError> {
        let start = self.position;
        let Some(digits) = self.data.get(start..start + len) else {
            return Err(self.msg_at(start, "Truncated hexadecimal escape sequence"));
        };
        let mut codepoint = 0;
        for c in digits {
            codepoint = codepoint * 16
                + u32::from(match c {
                    b'0'..=b'9' => c - b'0',
                    b'a'..=b'f' => c - b'a' + 10,
                    b'A'..=b'F' => c - b'A' + 10,
                    _ => {
                        return Err(self.msg_at(
                            start,
                            format!(
                                "The escape sequence '{}' is not a valid hexadecimal string",
                                String::from_utf8_lossy(digits)
                            ),
                        ));
                    }
                });
        }
        self.position += len;
        Ok(codepoint)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.position += 1;
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn decode(&self, start: usize, end: usize) -> Result<&'a str, RdfSyntaxError> {
        let data = self.data;
        str::from_utf8(&data[start..end])
            .map_err(|e| self.msg_at(start + e.valid_up_to(), format!("Invalid UTF-8: {e}")))
    }

    fn msg_at(&self, position: usize, msg: impl Into<String>) -> RdfSyntaxError {
        self.error_at(position, RdfSyntaxErrorKind::Msg(msg.into()))
    }

    fn error_at(&self, position: usize, kind: RdfSyntaxErrorKind) -> RdfSyntaxError {
        let column = self.data[..position.min(self.data.len())]
            .iter()
            .filter(|b| (**b & 0xC0) != 0x80)
            .count();
        RdfSyntaxError::new(RdfFormat::NTriples, kind).at(ErrorLocation::Text(TextPosition {
            line: self.line,
            column: column as u64,
            offset: (self.offset + position) as u64,
        }))
    }
}

fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-') || b >= 0x80
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use crate::namespace::NamespaceRegistry;
    use crate::node::Object;
    use crate::vocab::xsd;
    use std::error::Error;

    fn parse(data: &str) -> Result<Collection, RdfSyntaxError> {
        let mut collection = Collection::with_registry(NamespaceRegistry::new());
        NTriplesParser::new().parse_slice(data.as_bytes(), &mut collection)?;
        Ok(collection)
    }

    #[test]
    fn repeated_assertions_are_merged() -> Result<(), Box<dyn Error>> {
        let collection = parse(
            "<http://ex/1> <http://ex/p> \"hi\"@en .\n<http://ex/1> <http://ex/p> \"bye\"@en .\n<http://ex/1> <http://ex/p> \"hi\"@en .\n",
        )?;
        assert_eq!(collection.uris(), ["http://ex/1"]);
        let values = collection
            .get("http://ex/1")
            .and_then(|node| node.objects("http://ex/p"))
            .ok_or("missing values")?;
        assert_eq!(
            values.as_slice(),
            [
                Object::Literal(Literal::new_language_tagged_literal("hi", "en")?),
                Object::Literal(Literal::new_language_tagged_literal("bye", "en")?),
            ]
        );
        Ok(())
    }

    #[test]
    fn escapes() -> Result<(), Box<dyn Error>> {
        let collection = parse(
            r#"<http://ex/1> <http://ex/p> "a\"b\\c\/d\te\nf\u00E9\uD83D\uDE00\U0001F600" ."#,
        )?;
        let literal = collection
            .get("http://ex/1")
            .and_then(|node| node.literal("http://ex/p"))
            .ok_or("missing literal")?;
        assert_eq!(literal.value(), "a\"b\\c/d\te\nfé😀😀");
        Ok(())
    }

    #[test]
    fn datatypes_blank_nodes_and_comments() -> Result<(), Box<dyn Error>> {
        let collection = parse(
            "# a comment\n\n_:b0 <http://ex/age> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> . # trailing\r\n_:b0 <http://ex/knows> _:b1 .",
        )?;
        assert_eq!(collection.uris(), ["_:b0", "_:b1"]);
        let age = collection
            .get("_:b0")
            .and_then(|node| node.literal("http://ex/age"))
            .ok_or("missing age")?;
        assert_eq!(age.datatype(), Some(xsd::INTEGER));
        assert_eq!(age.decoded().as_i64(), Some(42));
        Ok(())
    }

    #[test]
    fn blank_node_labels_stop_before_the_final_dot() -> Result<(), Box<dyn Error>> {
        let collection = parse("_:a <http://ex/p> _:b1.\n_:a.b <http://ex/p> _:c.d .")?;
        assert_eq!(collection.uris(), ["_:a", "_:b1", "_:a.b", "_:c.d"]);
        assert!(parse("_:a <http://ex/p> _:.").is_err());
        Ok(())
    }

    #[test]
    fn several_triples_on_one_line() -> Result<(), Box<dyn Error>> {
        let collection =
            parse("<http://ex/1> <http://ex/p> <http://ex/2> . <http://ex/2> <http://ex/p> \"x\" .")?;
        assert_eq!(collection.uris(), ["http://ex/1", "http://ex/2"]);
        Ok(())
    }

    #[test]
    fn bare_subjects_and_relative_objects() -> Result<(), Box<dyn Error>> {
        let mut collection = Collection::with_registry(NamespaceRegistry::new());
        NTriplesParser::new()
            .with_base_iri("http://example.com/dir/doc")?
            .parse_slice(
                b"http://ex/1 <http://ex/p> <other> .\n[foaf:me] <http://ex/p> <#frag> .",
                &mut collection,
            )?;
        assert_eq!(
            collection.uris(),
            [
                "http://ex/1",
                "http://example.com/dir/other",
                "http://xmlns.com/foaf/0.1/me",
                "http://example.com/dir/doc#frag"
            ]
        );
        Ok(())
    }

    #[test]
    fn error_positions() {
        let error = parse("<http://ex/1> <http://ex/p> \"ok\" .\n<http://ex/1> <http://ex/p> \"open .")
            .unwrap_err();
        assert_eq!(
            error.location(),
            Some(&ErrorLocation::Text(TextPosition {
                line: 1,
                column: 28,
                offset: 63
            }))
        );
        assert_eq!(error.format(), RdfFormat::NTriples);

        let error = parse("<http://ex/1> <http://ex/p> \"\\q\" .").unwrap_err();
        assert!(error.to_string().contains("Unexpected escape character"));

        let error = parse("<http://ex/1> <http://ex/p> \"\\uD83D\" .").unwrap_err();
        assert!(error.to_string().contains("surrogate"));

        let error = parse("<http://ex/1> <http://ex/p> <http://ex/2>").unwrap_err();
        assert!(error.to_string().contains("Expected '.'"));

        let error = parse("<http://ex/1> <http://ex/p> \"x\"^^<http://www.w3.org/2001/XMLSchema#integer> .")
            .unwrap_err();
        assert!(error.literal_error().is_some());
    }
}
