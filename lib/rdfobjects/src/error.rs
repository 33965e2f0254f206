use crate::fetch::FetchError;
use crate::format::RdfFormat;
use crate::literal::LiteralFormatError;
use crate::namespace::NamespaceError;
use oxiri::IriParseError;
use std::error::Error;
use std::sync::Arc;
use std::{fmt, io};

/// Error returned while reading a document into a [`Collection`](crate::Collection).
#[derive(Debug, thiserror::Error)]
pub enum RdfParseError {
    /// I/O error while reading the input.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The document could not be retrieved.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// An error in the document syntax.
    #[error(transparent)]
    Syntax(#[from] RdfSyntaxError),
}

impl RdfParseError {
    /// The syntax error, if this is one.
    pub fn as_syntax_error(&self) -> Option<&RdfSyntaxError> {
        if let Self::Syntax(error) = self {
            Some(error)
        } else {
            None
        }
    }
}

impl From<RdfParseError> for io::Error {
    #[inline]
    fn from(error: RdfParseError) -> Self {
        match error {
            RdfParseError::Io(error) => error,
            RdfParseError::Fetch(error) => Self::other(error),
            RdfParseError::Syntax(error) => error.into(),
        }
    }
}

/// A position in a text i.e. a `line` number starting from 0, a `column` number starting from 0 (in number of code points) and a global file `offset` starting from 0 (in number of bytes).
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub struct TextPosition {
    pub line: u64,
    pub column: u64,
    pub offset: u64,
}

/// Where a syntax error happened.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ErrorLocation {
    /// A position in a line based document.
    Text(TextPosition),
    /// An XML element and the byte offset the reader had reached.
    Element { name: String, offset: u64 },
}

/// An error in the syntax of the parsed document.
///
/// It records which format was being read and, when known, where the error happened.
#[derive(Debug)]
pub struct RdfSyntaxError {
    format: RdfFormat,
    location: Option<ErrorLocation>,
    inner: RdfSyntaxErrorKind,
}

#[derive(Debug)]
pub(crate) enum RdfSyntaxErrorKind {
    Msg(String),
    Literal(LiteralFormatError),
    Namespace(NamespaceError),
    Xml(quick_xml::Error),
    Json(serde_json::Error),
    InvalidIri { iri: String, error: IriParseError },
    Extractor(Box<dyn Error + Send + Sync>),
}

impl From<LiteralFormatError> for RdfSyntaxErrorKind {
    fn from(error: LiteralFormatError) -> Self {
        Self::Literal(error)
    }
}

impl From<NamespaceError> for RdfSyntaxErrorKind {
    fn from(error: NamespaceError) -> Self {
        Self::Namespace(error)
    }
}

impl From<quick_xml::Error> for RdfSyntaxErrorKind {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error)
    }
}

impl From<serde_json::Error> for RdfSyntaxErrorKind {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl RdfSyntaxError {
    pub(crate) fn new(format: RdfFormat, inner: RdfSyntaxErrorKind) -> Self {
        Self {
            format,
            location: None,
            inner,
        }
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub(crate) fn msg(format: RdfFormat, msg: impl Into<String>) -> Self {
        Self::new(format, RdfSyntaxErrorKind::Msg(msg.into()))
    }

    #[must_use]
    pub(crate) fn at(mut self, location: ErrorLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Sets the location if none is known yet.
    #[must_use]
    pub(crate) fn or_at(mut self, location: impl FnOnce() -> ErrorLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location());
        }
        self
    }

    /// The format of the document that failed.
    #[inline]
    pub fn format(&self) -> RdfFormat {
        self.format
    }

    /// The location of the error inside of the document.
    #[inline]
    pub fn location(&self) -> Option<&ErrorLocation> {
        self.location.as_ref()
    }

    /// The literal validation error that caused this error, if any.
    pub fn literal_error(&self) -> Option<&LiteralFormatError> {
        if let RdfSyntaxErrorKind::Literal(error) = &self.inner {
            Some(error)
        } else {
            None
        }
    }

    /// The namespace error that caused this error, if any.
    pub fn namespace_error(&self) -> Option<&NamespaceError> {
        if let RdfSyntaxErrorKind::Namespace(error) = &self.inner {
            Some(error)
        } else {
            None
        }
    }
}

impl fmt::Display for RdfSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(ErrorLocation::Text(position)) => write!(
                f,
                "{} syntax error at line {} column {}: ",
                self.format,
                position.line + 1,
                position.column + 1
            )?,
            Some(ErrorLocation::Element { name, offset }) => write!(
                f,
                "{} syntax error in element <{name}> at byte {offset}: ",
                self.format
            )?,
            None => write!(f, "{} syntax error: ", self.format)?,
        }
        match &self.inner {
            RdfSyntaxErrorKind::Msg(msg) => f.write_str(msg),
            RdfSyntaxErrorKind::Literal(error) => error.fmt(f),
            RdfSyntaxErrorKind::Namespace(error) => error.fmt(f),
            RdfSyntaxErrorKind::Xml(error) => error.fmt(f),
            RdfSyntaxErrorKind::Json(error) => error.fmt(f),
            RdfSyntaxErrorKind::InvalidIri { iri, error } => {
                write!(f, "error while parsing IRI '{iri}': {error}")
            }
            RdfSyntaxErrorKind::Extractor(error) => write!(f, "extraction failed: {error}"),
        }
    }
}

impl Error for RdfSyntaxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.inner {
            RdfSyntaxErrorKind::Msg(_) => None,
            RdfSyntaxErrorKind::Literal(error) => Some(error),
            RdfSyntaxErrorKind::Namespace(error) => Some(error),
            RdfSyntaxErrorKind::Xml(error) => Some(error),
            RdfSyntaxErrorKind::Json(error) => Some(error),
            RdfSyntaxErrorKind::InvalidIri { error, .. } => Some(error),
            RdfSyntaxErrorKind::Extractor(error) => Some(error.as_ref()),
        }
    }
}

impl From<RdfSyntaxError> for io::Error {
    #[inline]
    fn from(error: RdfSyntaxError) -> Self {
        match error.inner {
            RdfSyntaxErrorKind::Xml(quick_xml::Error::Io(error)) => {
                Arc::try_unwrap(error).unwrap_or_else(|e| Self::new(e.kind(), e))
            }
            _ => Self::new(io::ErrorKind::InvalidData, error),
        }
    }
}
