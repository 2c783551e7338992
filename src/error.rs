/// Errors produced while deriving a filesystem path from a page title.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty title")]
    EmptyTitle,

    /// The title is nothing but a namespace prefix, e.g. "Template:".
    #[error("empty page name in namespace {namespace:?}")]
    EmptyName { namespace: String },

    #[error("unhandled namespace case: {0:?}")]
    UnsupportedCaseRule(String),

    #[error("namespace table has no default namespace")]
    MissingDefaultNamespace,
}

impl PathError {
    /// True for errors caused by a single bad title rather than by the
    /// namespace table, so skipping the page leaves the rest of the run sound.
    pub fn is_page_local(&self) -> bool {
        matches!(self, PathError::EmptyTitle | PathError::EmptyName { .. })
    }
}
