//! Retrieval of remote documents.
//!
//! The parsers never do I/O themselves: [`RdfParser`](crate::RdfParser) hands network URIs to a
//! [`Fetcher`]. An HTTP implementation is available behind the `http-client` feature.

#[cfg(feature = "http-client")]
mod http;

#[cfg(feature = "http-client")]
pub use http::HttpFetcher;
use regex::Regex;
use std::error::Error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// A retrieved document.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FetchedDocument {
    /// The body of the response.
    pub content: Vec<u8>,
    /// The URI the document was actually retrieved from, after redirections and proxying.
    pub uri: String,
}

/// Retrieves the document a URI points to.
///
/// Closures with the same signature are fetchers too:
///
/// ```
/// use rdfobjects::{FetchError, FetchedDocument, Fetcher};
///
/// let fetcher = |uri: &str| -> Result<FetchedDocument, FetchError> {
///     Ok(FetchedDocument {
///         content: b"<http://example.com/s> <http://example.com/p> \"o\" .".to_vec(),
///         uri: uri.to_owned(),
///     })
/// };
/// assert_eq!(fetcher.fetch("http://example.com/s")?.uri, "http://example.com/s");
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub trait Fetcher: Send + Sync {
    fn fetch(&self, uri: &str) -> Result<FetchedDocument, FetchError>;
}

impl<F: Fn(&str) -> Result<FetchedDocument, FetchError> + Send + Sync> Fetcher for F {
    fn fetch(&self, uri: &str) -> Result<FetchedDocument, FetchError> {
        self(uri)
    }
}

/// Error returned by a [`Fetcher`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a status that is neither a success nor a redirection.
    #[error("{uri} returned the status {status}: {message}")]
    Status {
        uri: String,
        status: u16,
        message: String,
    },
    #[error("I/O error while fetching {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: io::Error,
    },
    #[error("{uri} is still redirecting after {limit} redirections")]
    TooManyRedirects { uri: String, limit: usize },
    #[error("{uri} answered with a redirection without a Location header")]
    MissingLocation { uri: String },
    #[error("invalid URI {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// None of the requested formats is offered by a proxy.
    #[error("no compatible response format, requested {requested:?} but only {offered:?} are offered")]
    NoCompatibleFormat {
        requested: Vec<String>,
        offered: Vec<String>,
    },
    /// A document had to be fetched but no [`Fetcher`] is configured.
    #[error("no fetcher is configured to retrieve {uri}")]
    NoFetcher { uri: String },
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

/// A service exposing serializations of any resource at its own URIs.
pub trait FormatProxy: Send + Sync {
    /// The format names the service can answer with.
    fn offered_formats(&self) -> &[String];

    /// The URI of the representation of `uri` in `format`.
    fn proxy_uri(&self, uri: &str, format: &str) -> Result<String, FetchError>;
}

/// A proxy passing the resource URI and the format as query parameters of an endpoint.
///
/// ```
/// use rdfobjects::{FormatProxy, QueryProxy};
///
/// let proxy = QueryProxy::new("http://api.talis.com/stores/bbc-backstage/meta");
/// assert_eq!(
///     proxy.proxy_uri("http://example.com/a b", "json")?,
///     "http://api.talis.com/stores/bbc-backstage/meta?about=http%3A%2F%2Fexample.com%2Fa+b&output=json"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct QueryProxy {
    endpoint: String,
    resource_parameter: String,
    format_parameter: String,
    formats: Vec<String>,
}

impl QueryProxy {
    /// A proxy using the `about` and `output` parameters and offering `rdf`, `ntriples`, `turtle` and `json`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            resource_parameter: "about".into(),
            format_parameter: "output".into(),
            formats: ["rdf", "ntriples", "turtle", "json"]
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    #[must_use]
    pub fn with_parameters(
        mut self,
        resource_parameter: impl Into<String>,
        format_parameter: impl Into<String>,
    ) -> Self {
        self.resource_parameter = resource_parameter.into();
        self.format_parameter = format_parameter.into();
        self
    }

    #[must_use]
    pub fn with_offered_formats(
        mut self,
        formats: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }
}

impl FormatProxy for QueryProxy {
    fn offered_formats(&self) -> &[String] {
        &self.formats
    }

    fn proxy_uri(&self, uri: &str, format: &str) -> Result<String, FetchError> {
        let mut endpoint =
            url::Url::parse(&self.endpoint).map_err(|source| FetchError::InvalidUri {
                uri: self.endpoint.clone(),
                source: Box::new(source),
            })?;
        endpoint
            .query_pairs_mut()
            .append_pair(&self.resource_parameter, uri)
            .append_pair(&self.format_parameter, format);
        Ok(endpoint.into())
    }
}

/// Proxies keyed by the pattern of the URIs they serve.
#[derive(Clone, Default)]
pub struct ProxyRegistry {
    proxies: Vec<(Regex, Arc<dyn FormatProxy>)>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes the URIs matching `pattern` through `proxy`.
    ///
    /// Patterns are tried in registration order.
    pub fn register(&mut self, pattern: Regex, proxy: impl FormatProxy + 'static) {
        self.proxies.push((pattern, Arc::new(proxy)));
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// The URI to fetch for `uri`, given the formats the caller can read in order of preference.
    ///
    /// URIs matched by no pattern are returned unchanged.
    pub fn rewrite(&self, uri: &str, requested: &[impl AsRef<str>]) -> Result<String, FetchError> {
        let Some((pattern, proxy)) = self
            .proxies
            .iter()
            .find(|(pattern, _)| pattern.is_match(uri))
        else {
            return Ok(uri.to_owned());
        };
        let format = negotiate_format(requested, proxy.offered_formats())?;
        let proxied = proxy.proxy_uri(uri, format)?;
        tracing::debug!(%uri, %proxied, %pattern, format, "rewriting URI through a proxy");
        Ok(proxied)
    }
}

impl fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.proxies.iter().map(|(pattern, _)| pattern.as_str()))
            .finish()
    }
}

/// The first `requested` format that is also `offered`.
///
/// ```
/// use rdfobjects::negotiate_format;
///
/// assert_eq!(negotiate_format(&["json", "rdf"], &["rdf", "ntriples", "json"])?, "json");
/// assert!(negotiate_format(&["rdfa"], &["rdf"]).is_err());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn negotiate_format<'a>(
    requested: &'a [impl AsRef<str>],
    offered: &[impl AsRef<str>],
) -> Result<&'a str, FetchError> {
    requested
        .iter()
        .map(|format| format.as_ref())
        .find(|format| offered.iter().any(|o| o.as_ref() == *format))
        .ok_or_else(|| FetchError::NoCompatibleFormat {
            requested: requested.iter().map(|f| f.as_ref().to_owned()).collect(),
            offered: offered.iter().map(|f| f.as_ref().to_owned()).collect(),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;

    #[test]
    fn negotiation_follows_the_requested_order() -> Result<(), FetchError> {
        let offered = ["rdf", "ntriples", "turtle", "json"];
        assert_eq!(negotiate_format(&["json", "ntriples", "rdf"], &offered)?, "json");
        assert_eq!(negotiate_format(&["rdfa", "ntriples"], &offered)?, "ntriples");
        let error = negotiate_format(&["rdfa"], &offered).unwrap_err();
        assert!(matches!(error, FetchError::NoCompatibleFormat { .. }));
        Ok(())
    }

    #[test]
    fn registry_rewrites_matching_uris() -> Result<(), Box<dyn Error>> {
        let mut registry = ProxyRegistry::new();
        registry.register(
            Regex::new(r"^http://www\.bbc\.co\.uk/")?,
            QueryProxy::new("http://api.example.com/meta").with_offered_formats(["rdf", "json"]),
        );
        assert_eq!(
            registry.rewrite("http://example.com/a", &["json"])?,
            "http://example.com/a"
        );
        assert_eq!(
            registry.rewrite("http://www.bbc.co.uk/programmes/b006q2x0", &["ntriples", "rdf"])?,
            "http://api.example.com/meta?about=http%3A%2F%2Fwww.bbc.co.uk%2Fprogrammes%2Fb006q2x0&output=rdf"
        );
        assert!(registry
            .rewrite("http://www.bbc.co.uk/x", &["ntriples"])
            .is_err());
        Ok(())
    }

    #[test]
    fn query_proxy_parameters() -> Result<(), FetchError> {
        let proxy = QueryProxy::new("http://example.com/describe?key=1").with_parameters("uri", "format");
        assert_eq!(
            proxy.proxy_uri("urn:isbn:1", "rdf")?,
            "http://example.com/describe?key=1&uri=urn%3Aisbn%3A1&format=rdf"
        );
        assert!(QueryProxy::new("not a uri").proxy_uri("urn:x", "rdf").is_err());
        Ok(())
    }
}
