use crate::namespace::Namespace;

/// The `<siteinfo>` header of a dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteInfo {
    pub sitename: String,
    pub dbname: String,
    pub base: String,
    pub generator: String,
    pub namespaces: Vec<Namespace>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WikiPage {
    pub id: Option<u64>,
    pub title: String,
    /// Namespace id as declared by the page's `<ns>` element
    pub ns: Option<i32>,
    /// Target title when the page is a redirect
    pub redirect: Option<String>,
    pub timestamp: Option<String>,
    pub text: String,
}

impl WikiPage {
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}

/// One top-level record read from a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpItem {
    SiteInfo(SiteInfo),
    Page(WikiPage),
}
