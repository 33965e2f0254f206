use crate::vocab::{rdf, rdfs, rss, xsd};
use indexmap::IndexMap;
use oxiri::Iri;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

/// Prefixes known to every registry built with [`NamespaceRegistry::new`].
///
/// The generic `http` entry is removed again right after registration, see [`NamespaceRegistry::new`].
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", rdf::NAMESPACE),
    ("rdfs", rdfs::NAMESPACE),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", xsd::NAMESPACE),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("geo", "http://www.w3.org/2003/01/geo/wgs84_pos#"),
    ("rss", rss::NAMESPACE),
    ("sioc", "http://rdfs.org/sioc/ns#"),
    ("doap", "http://usefulinc.com/ns/doap#"),
    ("cc", "http://creativecommons.org/ns#"),
    ("bibo", "http://purl.org/ontology/bibo/"),
    ("vcard", "http://www.w3.org/2006/vcard/ns#"),
    ("http", "http:"),
];

static SHARED: LazyLock<NamespaceRegistry> = LazyLock::new(NamespaceRegistry::new);

/// A bijective table between short prefixes and namespace URIs.
///
/// The registry is a cheap handle: clones share the same table, so every
/// [`Collection`](crate::Collection) and [`Node`](crate::Node) built from one handle
/// folds predicates into the same prefixes. All mutations go through a single lock,
/// so concurrent derivations from unrelated parses can't break the bijection.
///
/// ```
/// use rdfobjects::{Curie, NamespaceRegistry};
///
/// let registry = NamespaceRegistry::new();
/// registry.register("ex", "http://example.com/ns#")?;
/// assert_eq!(
///     registry.resolve(&Curie::new("ex", "name"))?,
///     "http://example.com/ns#name"
/// );
/// assert_eq!(registry.prefix_for("http://example.com/ns#age"), Some("ex".into()));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone)]
pub struct NamespaceRegistry {
    inner: Arc<Mutex<RegistryTable>>,
}

#[derive(Default)]
struct RegistryTable {
    namespaces: IndexMap<String, String>,
    synthesized: u64,
}

impl NamespaceRegistry {
    /// Builds a registry holding the [`DEFAULT_PREFIXES`], minus the generic `http` one.
    ///
    /// `http` would otherwise swallow every unregistered `http:` URI and prevent namespace derivation.
    pub fn new() -> Self {
        let registry = Self::empty();
        {
            let mut table = registry.lock();
            for (prefix, namespace) in DEFAULT_PREFIXES {
                table
                    .namespaces
                    .insert((*prefix).into(), (*namespace).into());
            }
        }
        registry.remove_prefixes(&["http"]);
        registry
    }

    /// Builds a registry without any prefix.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryTable::default())),
        }
    }

    /// The process-wide registry used by [`Collection::new`](crate::Collection::new).
    pub fn shared() -> Self {
        SHARED.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryTable> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds `prefix` to `namespace`.
    ///
    /// Registering an existing pair again is a no-op.
    /// Rebinding a prefix or a namespace to another partner fails.
    pub fn register(
        &self,
        prefix: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<(), NamespaceError> {
        let prefix = prefix.into();
        let namespace = namespace.into();
        let mut table = self.lock();
        if let Some(existing) = table.namespaces.get(&prefix) {
            if *existing == namespace {
                return Ok(());
            }
            return Err(NamespaceError::PrefixConflict {
                prefix,
                existing: existing.clone(),
                requested: namespace,
            });
        }
        if let Some((existing, _)) = table.namespaces.iter().find(|(_, ns)| **ns == namespace) {
            return Err(NamespaceError::NamespaceConflict {
                existing: existing.clone(),
                requested: prefix,
                namespace,
            });
        }
        table.namespaces.insert(prefix, namespace);
        Ok(())
    }

    /// Drops the given prefixes and their namespaces.
    pub fn remove_prefixes(&self, prefixes: &[&str]) {
        let mut table = self.lock();
        for prefix in prefixes {
            table.namespaces.shift_remove(*prefix);
        }
    }

    /// The namespace bound to `prefix`.
    pub fn namespace(&self, prefix: &str) -> Option<String> {
        self.lock().namespaces.get(prefix).cloned()
    }

    /// The prefix of the longest registered namespace `uri` starts with.
    pub fn prefix_for(&self, uri: &str) -> Option<String> {
        Self::longest_match(&self.lock(), uri).map(|(prefix, _)| prefix.to_owned())
    }

    /// The prefix bound to exactly `namespace`.
    pub fn prefix_of_namespace(&self, namespace: &str) -> Option<String> {
        self.lock()
            .namespaces
            .iter()
            .find(|(_, ns)| *ns == namespace)
            .map(|(prefix, _)| prefix.clone())
    }

    /// Expands a CURIE to its full URI.
    pub fn resolve(&self, curie: &Curie) -> Result<String, NamespaceError> {
        let table = self.lock();
        let namespace = table
            .namespaces
            .get(&curie.prefix)
            .ok_or_else(|| NamespaceError::UnknownPrefix(curie.prefix.clone()))?;
        Ok(format!("{namespace}{}", curie.reference))
    }

    /// Folds `uri` into a CURIE using the registered namespaces only.
    pub fn curie_from_uri(&self, uri: &str) -> Option<Curie> {
        let table = self.lock();
        let (prefix, namespace) = Self::longest_match(&table, uri)?;
        Some(Curie::new(prefix, &uri[namespace.len()..]))
    }

    /// Folds `uri` into a CURIE, registering a synthesized `n<k>` prefix for its namespace if none is known.
    ///
    /// The namespace is everything up to and including `#` if the URI has a fragment,
    /// else up to and including the last `/`, else up to and including the last `:`.
    pub fn derive_from(&self, uri: &str) -> Result<Curie, NamespaceError> {
        let mut table = self.lock();
        if let Some((prefix, namespace)) = Self::longest_match(&table, uri) {
            return Ok(Curie::new(prefix, &uri[namespace.len()..]));
        }
        let (namespace, reference) =
            split_namespace(uri).ok_or_else(|| NamespaceError::NotDerivable(uri.into()))?;
        let prefix = loop {
            let candidate = format!("n{}", table.synthesized);
            table.synthesized += 1;
            if !table.namespaces.contains_key(&candidate) {
                break candidate;
            }
        };
        tracing::trace!(%prefix, namespace, "synthesized namespace prefix");
        table.namespaces.insert(prefix.clone(), namespace.into());
        Ok(Curie {
            prefix,
            reference: reference.into(),
        })
    }

    /// Expands a safe CURIE (`[prefix:reference]`) or returns any other string unchanged.
    pub fn expand(&self, key: &str) -> Result<String, NamespaceError> {
        match Curie::parse_safe(key) {
            Some(curie) => self.resolve(&curie),
            None => Ok(key.into()),
        }
    }

    /// A snapshot of the `(prefix, namespace)` pairs, in registration order.
    pub fn mappings(&self) -> Vec<(String, String)> {
        self.lock()
            .namespaces
            .iter()
            .map(|(p, n)| (p.clone(), n.clone()))
            .collect()
    }

    fn longest_match<'a>(table: &'a RegistryTable, uri: &str) -> Option<(&'a str, &'a str)> {
        table
            .namespaces
            .iter()
            .filter(|(_, namespace)| !namespace.is_empty() && uri.starts_with(namespace.as_str()))
            .max_by_key(|(_, namespace)| namespace.len())
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NamespaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.mappings()).finish()
    }
}

fn split_namespace(uri: &str) -> Option<(&str, &str)> {
    Iri::parse(uri).ok()?;
    let end = if let Some(hash) = uri.find('#') {
        hash + 1
    } else if let Some(slash) = uri.rfind('/') {
        slash + 1
    } else {
        uri.rfind(':')? + 1
    };
    Some(uri.split_at(end))
}

/// A compact URI: a prefix bound in a [`NamespaceRegistry`] and a reference inside that namespace.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Curie {
    prefix: String,
    reference: String,
}

impl Curie {
    pub fn new(prefix: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            reference: reference.into(),
        }
    }

    /// Parses the safe `[prefix:reference]` form.
    ///
    /// ```
    /// use rdfobjects::Curie;
    ///
    /// assert_eq!(Curie::parse_safe("[foaf:name]"), Some(Curie::new("foaf", "name")));
    /// assert_eq!(Curie::parse_safe("[dc:]"), Some(Curie::new("dc", "")));
    /// assert_eq!(Curie::parse_safe("http://xmlns.com/foaf/0.1/name"), None);
    /// ```
    pub fn parse_safe(value: &str) -> Option<Self> {
        let inner = value.strip_prefix('[')?.strip_suffix(']')?;
        let (prefix, reference) = inner.split_once(':')?;
        if prefix.contains(['[', ']', ' ']) || reference.contains(['[', ']']) {
            return None;
        }
        Some(Self::new(prefix, reference))
    }

    /// Folds a full URI into a CURIE, deriving a namespace if needed.
    pub fn from_uri(uri: &str, registry: &NamespaceRegistry) -> Result<Self, NamespaceError> {
        registry.derive_from(uri)
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn to_safe_string(&self) -> String {
        self.to_string()
    }

    pub fn to_uri(&self, registry: &NamespaceRegistry) -> Result<String, NamespaceError> {
        registry.resolve(self)
    }
}

impl fmt::Display for Curie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.prefix, self.reference)
    }
}

/// Checks if `value` uses the safe `[prefix:reference]` CURIE syntax.
pub fn is_safe_curie(value: &str) -> bool {
    Curie::parse_safe(value).is_some()
}

/// An error raised while manipulating a [`NamespaceRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum NamespaceError {
    #[error("The prefix '{0}' is not registered")]
    UnknownPrefix(String),
    #[error("The prefix '{prefix}' is already bound to <{existing}>, it can't be bound to <{requested}>")]
    PrefixConflict {
        prefix: String,
        existing: String,
        requested: String,
    },
    #[error("The namespace <{namespace}> is already bound to '{existing}', it can't be bound to '{requested}'")]
    NamespaceConflict {
        namespace: String,
        existing: String,
        requested: String,
    },
    #[error("No namespace can be derived from '{0}'")]
    NotDerivable(String),
}
