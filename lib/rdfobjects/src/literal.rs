use crate::vocab::xsd;
use oxilangtag::{LanguageTag, LanguageTagParseError};
use oxsdatatypes::{Boolean, Date, DateTime, Double, Float, Integer};
use std::fmt::{self, Write};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// An RDF [literal](https://www.w3.org/TR/rdf11-concepts/#dfn-literal).
///
/// The lexical form is kept verbatim next to the datatype and the language tag,
/// so serializers always write back what was read.
/// Literals with a known XSD datatype are decoded on construction and rejected
/// if their lexical form does not survive the round trip through the decoded value.
/// Floating point numbers only need to parse.
///
/// The default string formatter returns an N-Triples compatible representation:
/// ```
/// use rdfobjects::Literal;
/// use rdfobjects::vocab::xsd;
///
/// assert_eq!(
///     "\"foo\\nbar\"",
///     Literal::new_simple_literal("foo\nbar").to_string()
/// );
///
/// let answer = Literal::new_typed_literal("42", xsd::INTEGER)?;
/// assert_eq!(
///     "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>",
///     answer.to_string()
/// );
/// assert_eq!(answer.decoded().as_i64(), Some(42));
///
/// assert!(Literal::new_typed_literal("abc", xsd::INTEGER).is_err());
/// # Result::<_, rdfobjects::LiteralFormatError>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct Literal {
    lexical: String,
    datatype: Option<String>,
    language: Option<String>,
    decoded: LiteralValue,
}

impl Literal {
    /// Builds an untyped literal without language.
    #[inline]
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self {
            lexical: value.into(),
            datatype: None,
            language: None,
            decoded: LiteralValue::Plain,
        }
    }

    /// Builds a literal with a datatype, validating the lexical form for the XSD datatypes it knows.
    pub fn new_typed_literal(
        value: impl Into<String>,
        datatype: impl Into<String>,
    ) -> Result<Self, LiteralFormatError> {
        let lexical = value.into();
        let datatype = datatype.into();
        let decoded = LiteralValue::decode(&lexical, &datatype)?;
        Ok(Self {
            lexical,
            datatype: Some(datatype),
            language: None,
            decoded,
        })
    }

    /// Builds a [language-tagged string](https://www.w3.org/TR/rdf11-concepts/#dfn-language-tagged-string).
    ///
    /// The tag is validated against [BCP47](https://tools.ietf.org/html/bcp47) and lowercased.
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, LiteralFormatError> {
        let mut language = language.into();
        language.make_ascii_lowercase();
        let language = LanguageTag::parse(language.clone())
            .map_err(|source| LiteralFormatError::InvalidLanguageTag {
                tag: language,
                source,
            })?
            .into_inner();
        Ok(Self {
            lexical: value.into(),
            datatype: None,
            language: Some(language),
            decoded: LiteralValue::Plain,
        })
    }

    /// Builds a literal from the optional parts found in a document.
    ///
    /// If both a datatype and a language are given the datatype wins.
    pub fn new(
        value: impl Into<String>,
        datatype: Option<&str>,
        language: Option<&str>,
    ) -> Result<Self, LiteralFormatError> {
        match (datatype, language) {
            (Some(datatype), _) => Self::new_typed_literal(value, datatype),
            (None, Some(language)) => Self::new_language_tagged_literal(value, language),
            (None, None) => Ok(Self::new_simple_literal(value)),
        }
    }

    /// The lexical form.
    #[inline]
    pub fn value(&self) -> &str {
        &self.lexical
    }

    #[inline]
    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    #[inline]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The native value decoded from the lexical form.
    #[inline]
    pub fn decoded(&self) -> &LiteralValue {
        &self.decoded
    }

    /// Checks if the literal has neither datatype nor language.
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.datatype.is_none() && self.language.is_none()
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.lexical == other.lexical
            && self.datatype == other.datatype
            && self.language == other.language
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lexical.hash(state);
        self.datatype.hash(state);
        self.language.hash(state);
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_quoted_str(&self.lexical, f)?;
        if let Some(datatype) = &self.datatype {
            write!(f, "^^<{datatype}>")
        } else if let Some(language) = &self.language {
            write!(f, "@{language}")
        } else {
            Ok(())
        }
    }
}

impl From<&str> for Literal {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new_simple_literal(value)
    }
}

impl From<String> for Literal {
    #[inline]
    fn from(value: String) -> Self {
        Self::new_simple_literal(value)
    }
}

impl From<bool> for Literal {
    #[inline]
    fn from(value: bool) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: Some(xsd::BOOLEAN.into()),
            language: None,
            decoded: LiteralValue::Boolean(value.into()),
        }
    }
}

impl From<i64> for Literal {
    #[inline]
    fn from(value: i64) -> Self {
        Self {
            lexical: value.to_string(),
            datatype: Some(xsd::INTEGER.into()),
            language: None,
            decoded: LiteralValue::Integer(value.into()),
        }
    }
}

/// The native value behind a [`Literal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue {
    /// A string, or a datatype without decoder.
    Plain,
    Integer(Integer),
    Float(Float),
    Double(Double),
    Boolean(Boolean),
    Date(Date),
    DateTime(DateTime),
}

impl LiteralValue {
    fn decode(lexical: &str, datatype: &str) -> Result<Self, LiteralFormatError> {
        match datatype {
            xsd::INTEGER | xsd::INT => {
                let value = parse::<Integer>(lexical, datatype)?;
                check_round_trip(lexical, datatype, &value.to_string(), |l, c| l == c)?;
                Ok(Self::Integer(value))
            }
            xsd::FLOAT => {
                // any lexical form that parses is kept as written
                let value = parse::<Float>(lexical, datatype)?;
                Ok(Self::Float(value))
            }
            xsd::DOUBLE => {
                let value = parse::<Double>(lexical, datatype)?;
                Ok(Self::Double(value))
            }
            xsd::BOOLEAN => match lexical.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Self::Boolean(true.into())),
                "false" | "0" => Ok(Self::Boolean(false.into())),
                _ => Err(LiteralFormatError::InvalidLexicalForm {
                    lexical: lexical.into(),
                    datatype: datatype.into(),
                    message: "expecting true, false, 1 or 0".into(),
                }),
            },
            xsd::DATE => {
                let value = parse::<Date>(lexical, datatype)?;
                check_round_trip(lexical, datatype, &value.to_string(), |l, c| l == c)?;
                Ok(Self::Date(value))
            }
            xsd::DATE_TIME => {
                let value = parse::<DateTime>(lexical, datatype)?;
                check_round_trip(lexical, datatype, &value.to_string(), |l, c| {
                    strip_timezone(l).starts_with(strip_timezone(c))
                })?;
                Ok(Self::DateTime(value))
            }
            _ => Ok(Self::Plain),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        if let Self::Integer(value) = self {
            Some((*value).into())
        } else {
            None
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(f32::from(*value).into()),
            Self::Double(value) => Some((*value).into()),
            Self::Integer(value) => Some(i64::from(*value) as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let Self::Boolean(value) = self {
            Some((*value).into())
        } else {
            None
        }
    }
}

fn parse<T: FromStr>(lexical: &str, datatype: &str) -> Result<T, LiteralFormatError>
where
    T::Err: fmt::Display,
{
    lexical
        .parse()
        .map_err(|e: T::Err| LiteralFormatError::InvalidLexicalForm {
            lexical: lexical.into(),
            datatype: datatype.into(),
            message: e.to_string(),
        })
}

fn check_round_trip(
    lexical: &str,
    datatype: &str,
    canonical: &str,
    matches: impl Fn(&str, &str) -> bool,
) -> Result<(), LiteralFormatError> {
    if matches(lexical, canonical) {
        Ok(())
    } else {
        Err(LiteralFormatError::RoundTrip {
            lexical: lexical.into(),
            datatype: datatype.into(),
            canonical: canonical.into(),
        })
    }
}

fn strip_timezone(value: &str) -> &str {
    if let Some(value) = value.strip_suffix('Z') {
        return value;
    }
    let bytes = value.as_bytes();
    if bytes.len() > 6
        && matches!(bytes[bytes.len() - 6], b'+' | b'-')
        && bytes[bytes.len() - 3] == b':'
        && value.contains('T')
    {
        &value[..value.len() - 6]
    } else {
        value
    }
}

/// Writes a string as an N-Triples quoted string.
#[inline]
pub fn print_quoted_str(string: &str, f: &mut impl Write) -> fmt::Result {
    f.write_char('"')?;
    for c in string.chars() {
        match c {
            '\u{08}' => f.write_str("\\b"),
            '\t' => f.write_str("\\t"),
            '\n' => f.write_str("\\n"),
            '\u{0c}' => f.write_str("\\f"),
            '\r' => f.write_str("\\r"),
            '"' => f.write_str("\\\""),
            '\\' => f.write_str("\\\\"),
            '\0'..='\u{1f}' | '\u{7f}' => write!(f, "\\u{:04X}", u32::from(c)),
            c => f.write_char(c),
        }?;
    }
    f.write_char('"')
}

/// A literal whose lexical form does not fit its datatype.
#[derive(Debug, thiserror::Error)]
pub enum LiteralFormatError {
    #[error("'{lexical}' is not a valid {datatype}: {message}")]
    InvalidLexicalForm {
        lexical: String,
        datatype: String,
        message: String,
    },
    #[error("'{lexical}' is read as '{canonical}' for datatype {datatype}, the lexical form is not canonical")]
    RoundTrip {
        lexical: String,
        datatype: String,
        canonical: String,
    },
    #[error("Invalid language tag '{tag}': {source}")]
    InvalidLanguageTag {
        tag: String,
        #[source]
        source: LanguageTagParseError,
    },
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;

    #[test]
    fn integer_round_trip() -> Result<(), LiteralFormatError> {
        let literal = Literal::new_typed_literal("42", xsd::INTEGER)?;
        assert_eq!(literal.decoded().as_i64(), Some(42));
        assert_eq!(literal.value(), "42");
        assert!(matches!(
            Literal::new_typed_literal("abc", xsd::INTEGER),
            Err(LiteralFormatError::InvalidLexicalForm { .. })
        ));
        assert!(matches!(
            Literal::new_typed_literal("042", xsd::INT),
            Err(LiteralFormatError::RoundTrip { .. })
        ));
        Ok(())
    }

    #[test]
    fn float_keeps_original_lexical() -> Result<(), LiteralFormatError> {
        let literal = Literal::new_typed_literal("3.0", xsd::FLOAT)?;
        assert_eq!(literal.value(), "3.0");
        assert_eq!(literal.decoded().as_f64(), Some(3.0));
        Literal::new_typed_literal("0.50", xsd::DOUBLE)?;
        Literal::new_typed_literal("-12.25", xsd::FLOAT)?;
        assert!(Literal::new_typed_literal("3.0.1", xsd::FLOAT).is_err());
        Ok(())
    }

    #[test]
    fn floats_beyond_their_precision_are_accepted() -> Result<(), LiteralFormatError> {
        let literal = Literal::new_typed_literal("0.1234567891", xsd::FLOAT)?;
        assert_eq!(literal.value(), "0.1234567891");
        let decoded = literal.decoded().as_f64().unwrap_or_default();
        assert!((decoded - 0.123_456_789_1).abs() < 1e-6);
        let literal = Literal::new_typed_literal("0.12345678901234567891", xsd::DOUBLE)?;
        assert_eq!(literal.value(), "0.12345678901234567891");
        assert!(Literal::new_typed_literal("1e", xsd::FLOAT).is_err());
        Ok(())
    }

    #[test]
    fn boolean_forms() -> Result<(), LiteralFormatError> {
        assert_eq!(
            Literal::new_typed_literal("TRUE", xsd::BOOLEAN)?
                .decoded()
                .as_bool(),
            Some(true)
        );
        assert_eq!(
            Literal::new_typed_literal("0", xsd::BOOLEAN)?
                .decoded()
                .as_bool(),
            Some(false)
        );
        assert!(Literal::new_typed_literal("yes", xsd::BOOLEAN).is_err());
        Ok(())
    }

    #[test]
    fn date_time_tolerates_timezone_and_fraction() -> Result<(), LiteralFormatError> {
        Literal::new_typed_literal("2008-01-01T12:00:00Z", xsd::DATE_TIME)?;
        Literal::new_typed_literal("2008-01-01T12:00:00.000+01:00", xsd::DATE_TIME)?;
        Literal::new_typed_literal("2008-01-01", xsd::DATE)?;
        assert!(Literal::new_typed_literal("2008-13-01", xsd::DATE).is_err());
        assert!(Literal::new_typed_literal("yesterday", xsd::DATE_TIME).is_err());
        Ok(())
    }

    #[test]
    fn unknown_datatype_is_kept() -> Result<(), LiteralFormatError> {
        let literal = Literal::new_typed_literal("anything", "http://example.com/dt")?;
        assert_eq!(literal.decoded(), &LiteralValue::Plain);
        assert_eq!(literal.datatype(), Some("http://example.com/dt"));
        Ok(())
    }

    #[test]
    fn language_tags_are_validated() -> Result<(), LiteralFormatError> {
        let literal = Literal::new_language_tagged_literal("chat", "FR")?;
        assert_eq!(literal.language(), Some("fr"));
        assert_eq!(literal.to_string(), "\"chat\"@fr");
        assert!(Literal::new_language_tagged_literal("chat", "not a tag").is_err());
        Ok(())
    }

    #[test]
    fn equality_ignores_decoding() -> Result<(), LiteralFormatError> {
        assert_eq!(
            Literal::new(String::from("1"), Some(xsd::INTEGER), None)?,
            Literal::from(1)
        );
        assert_ne!(
            Literal::new_simple_literal("1"),
            Literal::new_typed_literal("1", xsd::INTEGER)?
        );
        Ok(())
    }
}
