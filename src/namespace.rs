use crate::casefold::CaseRule;
use crate::error::PathError;
use serde::{Deserialize, Serialize};

/// Stand-in for the default namespace when a dump fails to declare one.
/// It has no case rule, so folding a title through it fails.
static MISSING_DEFAULT: Namespace = Namespace {
    key: None,
    case_rule: CaseRule::Unsupported(String::new()),
    name: String::new(),
};

/// One `<namespace>` declaration from a dump's `<siteinfo>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Numeric id from the dump. Only used to cross-check a page's `<ns>`;
    /// not persisted.
    #[serde(skip)]
    pub key: Option<i32>,
    #[serde(rename = "case")]
    pub case_rule: CaseRule,
    /// Title prefix; empty for the default namespace.
    pub name: String,
}

impl Namespace {
    pub fn new(name: impl Into<String>, case_rule: CaseRule) -> Self {
        Self {
            key: None,
            case_rule,
            name: name.into(),
        }
    }

    pub fn with_key(mut self, key: i32) -> Self {
        self.key = Some(key);
        self
    }

    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

/// A title split into the namespace it belongs to and its bare name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTitle<'a> {
    pub namespace: &'a Namespace,
    pub local_name: &'a str,
}

/// The ordered namespace declarations of one dump. Built once from
/// `<siteinfo>` and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceTable {
    namespaces: Vec<Namespace>,
}

impl NamespaceTable {
    pub fn new(namespaces: Vec<Namespace>) -> Self {
        Self { namespaces }
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn default_namespace(&self) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.is_default())
    }

    /// Reports a table that cannot place unprefixed titles properly. Not fatal:
    /// `resolve` falls back to a bare namespace in that case.
    pub fn check(&self) -> Result<(), PathError> {
        match self.default_namespace() {
            Some(_) => Ok(()),
            None => Err(PathError::MissingDefaultNamespace),
        }
    }

    /// Finds the namespace a title belongs to.
    ///
    /// A named namespace matches only when the title starts with its name
    /// followed by `:` (compared case-insensitively); the first match in table
    /// order wins. Everything else lands in the default namespace with the
    /// whole title as its local name.
    pub fn resolve<'a>(&'a self, title: &'a str) -> ResolvedTitle<'a> {
        for ns in self.namespaces.iter().filter(|ns| !ns.is_default()) {
            if let Some(local_name) = strip_namespace_prefix(title, &ns.name) {
                return ResolvedTitle {
                    namespace: ns,
                    local_name,
                };
            }
        }

        ResolvedTitle {
            namespace: self.default_namespace().unwrap_or(&MISSING_DEFAULT),
            local_name: title,
        }
    }
}

impl From<Vec<Namespace>> for NamespaceTable {
    fn from(namespaces: Vec<Namespace>) -> Self {
        Self::new(namespaces)
    }
}

/// Returns what follows `prefix:` at the very start of `title`, comparing
/// the prefix case-insensitively one code point at a time.
fn strip_namespace_prefix<'t>(title: &'t str, prefix: &str) -> Option<&'t str> {
    let mut title_chars = title.char_indices();

    for expected in prefix.chars() {
        let (_, actual) = title_chars.next()?;
        if actual != expected && !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }

    match title_chars.next() {
        Some((idx, ':')) => Some(&title[idx + 1..]),
        _ => None,
    }
}

/// Allow-list of namespace names whose pages are kept. An empty entry names
/// the default namespace; no list at all keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceFilter {
    names: Option<Vec<String>>,
}

impl NamespaceFilter {
    pub fn all() -> Self {
        Self { names: None }
    }

    /// Parses a comma separated list such as `,Template` (default namespace
    /// plus Template). An empty string keeps everything.
    pub fn parse(list: &str) -> Self {
        if list.is_empty() {
            return Self::all();
        }
        Self {
            names: Some(list.split(',').map(str::to_string).collect()),
        }
    }

    pub fn keeps(&self, namespace: &Namespace) -> bool {
        match &self.names {
            None => true,
            Some(names) => names.iter().any(|n| *n == namespace.name),
        }
    }
}
