#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use rdfobjects::{
    Collection, FetchError, FetchedDocument, FormatProxy, NamespaceRegistry, ProxyRegistry,
    QueryProxy, RdfFormat, RdfParseError, RdfParser, negotiate_format, sniff,
};
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

fn collection() -> Collection {
    Collection::with_registry(NamespaceRegistry::new())
}

/// Serves canned documents and records the requested URIs.
#[derive(Default, Clone)]
struct StaticWeb {
    documents: HashMap<String, (String, Vec<u8>)>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticWeb {
    fn with(mut self, uri: &str, final_uri: &str, content: &str) -> Self {
        self.documents
            .insert(uri.into(), (final_uri.into(), content.as_bytes().to_vec()));
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl rdfobjects::Fetcher for StaticWeb {
    fn fetch(&self, uri: &str) -> Result<FetchedDocument, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(uri.into());
        }
        let (final_uri, content) = self.documents.get(uri).ok_or_else(|| FetchError::Status {
            uri: uri.into(),
            status: 404,
            message: "Not Found".into(),
        })?;
        Ok(FetchedDocument {
            content: content.clone(),
            uri: final_uri.clone(),
        })
    }
}

#[test]
fn describe_uses_the_final_uri_as_base() -> Result<(), Box<dyn Error>> {
    let web = StaticWeb::default().with(
        "http://example.com/alice",
        "http://example.com/alice.rdf",
        r##"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:foaf="http://xmlns.com/foaf/0.1/">
  <foaf:Person rdf:about="#me"><foaf:name>Alice</foaf:name></foaf:Person>
</rdf:RDF>"##,
    );
    let parser = RdfParser::new().with_fetcher(web.clone());
    let mut collection = collection();
    parser.describe("http://example.com/alice", &mut collection)?;
    assert_eq!(
        collection.uris(),
        ["http://example.com/alice.rdf#me", "http://xmlns.com/foaf/0.1/Person"]
    );
    // a bare URI given as data is fetched too
    collection.parse(b"http://example.com/alice", &parser)?;
    assert_eq!(collection.len(), 2);
    assert_eq!(web.requests(), ["http://example.com/alice", "http://example.com/alice"]);
    Ok(())
}

#[test]
fn fetched_documents_are_sniffed() -> Result<(), Box<dyn Error>> {
    let parser = RdfParser::new().with_fetcher(|uri: &str| -> Result<FetchedDocument, FetchError> {
        let content: &[u8] = if uri.ends_with(".json") {
            br#"{"http://example.com/s": {"http://example.com/p": [{"type": "bnode", "value": "_:o"}]}}"#
        } else {
            b"<http://example.com/s> <http://example.com/q> \"nt\" ."
        };
        Ok(FetchedDocument {
            content: content.to_vec(),
            uri: uri.into(),
        })
    });
    let mut collection = collection();
    parser.describe("http://example.com/doc.json", &mut collection)?;
    parser.describe("http://example.com/doc.nt", &mut collection)?;
    assert_eq!(collection.uris(), ["http://example.com/s", "_:o"]);
    let subject = collection.get("http://example.com/s").ok_or("missing subject")?;
    assert!(subject.has_predicate("http://example.com/p"));
    assert!(subject.has_predicate("http://example.com/q"));
    Ok(())
}

#[test]
fn fetch_failures_are_reported() {
    let error = RdfParser::new()
        .with_fetcher(StaticWeb::default())
        .describe("http://example.com/missing", &mut collection())
        .unwrap_err();
    assert!(matches!(
        error,
        RdfParseError::Fetch(FetchError::Status { status: 404, .. })
    ));
    assert!(error.to_string().contains("http://example.com/missing"));

    let error = RdfParser::new()
        .describe("http://example.com/missing", &mut collection())
        .unwrap_err();
    assert!(matches!(error, RdfParseError::Fetch(FetchError::NoFetcher { .. })));
}

#[test]
fn proxies_negotiate_a_format() -> Result<(), Box<dyn Error>> {
    let mut proxies = ProxyRegistry::new();
    assert!(proxies.is_empty());
    proxies.register(
        Regex::new(r"^http://www\.bbc\.co\.uk/")?,
        QueryProxy::new("http://api.talis.com/stores/bbc-backstage/meta"),
    );
    proxies.register(
        Regex::new(r"^http://")?,
        QueryProxy::new("http://example.org/describe")
            .with_parameters("uri", "format")
            .with_offered_formats(["ntriples"]),
    );
    assert_eq!(
        proxies.rewrite("http://www.bbc.co.uk/programmes/b006q2x0", &["json", "rdf"])?,
        "http://api.talis.com/stores/bbc-backstage/meta?about=http%3A%2F%2Fwww.bbc.co.uk%2Fprogrammes%2Fb006q2x0&output=json"
    );
    assert_eq!(
        proxies.rewrite("http://example.com/x", &["json", "ntriples"])?,
        "http://example.org/describe?uri=http%3A%2F%2Fexample.com%2Fx&format=ntriples"
    );
    assert_eq!(proxies.rewrite("https://example.com/x", &["json"])?, "https://example.com/x");
    assert!(matches!(
        proxies.rewrite("http://example.com/x", &["rdf"]),
        Err(FetchError::NoCompatibleFormat { .. })
    ));

    let proxy = QueryProxy::new("http://example.org/describe");
    assert_eq!(
        negotiate_format(&["rdfa", "turtle", "rdf"], proxy.offered_formats())?,
        "turtle"
    );
    Ok(())
}

#[test]
fn format_detection() {
    assert_eq!(
        sniff(b"<?xml version=\"1.0\"?>\n<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"/>").format(),
        RdfFormat::RdfXml
    );
    assert_eq!(
        sniff(b"<!DOCTYPE html>\n<html><head><title>t</title></head></html>").format(),
        RdfFormat::Rdfa
    );
    assert_eq!(sniff(b"  {\"http://ex/s\": {}}").format(), RdfFormat::Json);
    assert_eq!(sniff(b"<http://ex/s> <http://ex/p> <http://ex/o> .").format(), RdfFormat::NTriples);
    assert_eq!(sniff(b"[1, 2]").format(), RdfFormat::NTriples);
    assert!(sniff(b"{\"truncated\": ").outline().is_none());
}
