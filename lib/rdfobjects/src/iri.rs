//! URI classification and base URI resolution shared by the parsers and the collection.

use oxiri::Iri;

/// Resolves `candidate` against `base`.
///
/// `&#38;` left behind by double-escaping producers is turned back into `&`.
/// Absolute URIs are returned unchanged, and so is anything that can't be resolved.
///
/// ```
/// use oxiri::Iri;
/// use rdfobjects::sanitize_uri;
///
/// let base = Iri::parse("http://example.com/dir/doc".to_owned())?;
/// assert_eq!(sanitize_uri("other#me", Some(&base)), "http://example.com/dir/other#me");
/// assert_eq!(sanitize_uri("http://example.org/", Some(&base)), "http://example.org/");
/// assert_eq!(sanitize_uri("q?a=1&#38;b=2", None), "q?a=1&b=2");
/// # Result::<_, oxiri::IriParseError>::Ok(())
/// ```
pub fn sanitize_uri(candidate: &str, base: Option<&Iri<String>>) -> String {
    let candidate = candidate.replace("&#38;", "&");
    if is_absolute_uri(&candidate) {
        return candidate;
    }
    let Some(base) = base else {
        return candidate;
    };
    match base.resolve(&candidate) {
        Ok(resolved) => resolved.into_inner(),
        Err(error) => {
            tracing::debug!(%candidate, %error, "kept unresolvable relative URI");
            candidate
        }
    }
}

/// Checks if `value` is an absolute URI.
#[inline]
pub fn is_absolute_uri(value: &str) -> bool {
    Iri::parse(value).is_ok()
}

/// Checks if `value` identifies a blank node: it starts with `_:` or is not an absolute URI.
#[inline]
pub fn is_blank_node_id(value: &str) -> bool {
    value.starts_with("_:") || !is_absolute_uri(value)
}

/// Checks if `value` is an absolute `http` or `https` URI.
pub fn is_network_uri(value: &str) -> bool {
    Iri::parse(value).is_ok_and(|iri| {
        iri.scheme().eq_ignore_ascii_case("http") || iri.scheme().eq_ignore_ascii_case("https")
    })
}
