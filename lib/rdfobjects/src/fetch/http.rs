use crate::fetch::{FetchError, FetchedDocument, Fetcher, FormatProxy, ProxyRegistry};
use oxhttp::Client;
use oxhttp::model::header::{ACCEPT, LOCATION, USER_AGENT};
use oxhttp::model::Request;
use oxiri::Iri;
use regex::Regex;
use std::time::Duration;

const DEFAULT_ACCEPT: &str = "application/rdf+xml, text/plain;q=0.9, application/json;q=0.8";

/// A [`Fetcher`] doing plain HTTP `GET`s, asking for RDF/XML first.
///
/// Redirections are followed up to a limit (10 by default), relative `Location` headers being
/// resolved against the URI that returned them. The URI of the last request is returned along the body.
///
/// ```no_run
/// use regex::Regex;
/// use rdfobjects::{Collection, HttpFetcher, QueryProxy, RdfParser};
///
/// let fetcher = HttpFetcher::new()
///     .with_redirection_limit(5)
///     .with_proxy(
///         Regex::new(r"^http://www\.bbc\.co\.uk/")?,
///         QueryProxy::new("http://api.talis.com/stores/bbc-backstage/meta"),
///     );
/// let parser = RdfParser::new().with_fetcher(fetcher);
/// let mut collection = Collection::new();
/// parser.describe("http://www.bbc.co.uk/programmes/b006q2x0", &mut collection)?;
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct HttpFetcher {
    client: Client,
    user_agent: String,
    redirection_limit: usize,
    requested_formats: Vec<String>,
    proxies: ProxyRegistry,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            user_agent: concat!("rdfobjects/", env!("CARGO_PKG_VERSION")).to_owned(),
            redirection_limit: 10,
            requested_formats: ["json", "ntriples", "rdf"]
                .into_iter()
                .map(Into::into)
                .collect(),
            proxies: ProxyRegistry::new(),
        }
    }

    #[must_use]
    pub fn with_redirection_limit(mut self, limit: usize) -> Self {
        self.redirection_limit = limit;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the timeout of each request (connection, read and write).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_global_timeout(timeout);
        self
    }

    /// The format names negotiated with proxies, in order of preference.
    #[must_use]
    pub fn with_requested_formats(
        mut self,
        formats: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.requested_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Fetches the URIs matching `pattern` through `proxy`.
    #[must_use]
    pub fn with_proxy(mut self, pattern: Regex, proxy: impl FormatProxy + 'static) -> Self {
        self.proxies.register(pattern, proxy);
        self
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, uri: &str) -> Result<FetchedDocument, FetchError> {
        let mut uri = self.proxies.rewrite(uri, &self.requested_formats)?;
        for _ in 0..=self.redirection_limit {
            let request = Request::builder()
                .uri(uri.as_str())
                .header(ACCEPT, DEFAULT_ACCEPT)
                .header(USER_AGENT, self.user_agent.as_str())
                .body(())
                .map_err(|e| FetchError::InvalidUri {
                    uri: uri.clone(),
                    source: Box::new(e),
                })?;
            let response = self
                .client
                .request(request)
                .map_err(|source| FetchError::Io {
                    uri: uri.clone(),
                    source,
                })?;
            let status = response.status();
            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .ok_or_else(|| FetchError::MissingLocation { uri: uri.clone() })?
                    .to_str()
                    .map_err(|e| FetchError::InvalidUri {
                        uri: uri.clone(),
                        source: Box::new(e),
                    })?;
                let target = Iri::parse(uri.as_str())
                    .and_then(|base| base.resolve(location))
                    .map_err(|e| FetchError::InvalidUri {
                        uri: location.to_owned(),
                        source: Box::new(e),
                    })?
                    .into_inner();
                tracing::debug!(from = %uri, to = %target, status = status.as_u16(), "following redirection");
                uri = target;
                continue;
            }
            if !status.is_success() {
                return Err(FetchError::Status {
                    uri,
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or_default().to_owned(),
                });
            }
            let content = response
                .into_body()
                .to_vec()
                .map_err(|source| FetchError::Io {
                    uri: uri.clone(),
                    source,
                })?;
            tracing::trace!(%uri, bytes = content.len(), "fetched document");
            return Ok(FetchedDocument { content, uri });
        }
        Err(FetchError::TooManyRedirects {
            uri,
            limit: self.redirection_limit,
        })
    }
}
