use crate::namespace::NamespaceFilter;
use std::path::PathBuf;

/// Number of single-character directory levels above each page file
/// ("Abcdef" -> "/a/b/c/Abcdef")
pub const PATH_COMPONENTS: usize = 3;

/// Shard level used for anything that is not an ASCII letter or digit
pub const SHARD_PLACEHOLDER: char = '_';

/// Side file holding the namespace table, relative to the target directory
pub const NAMESPACE_FILE: &str = "namespaces.json";

pub const DEFAULT_TARGET_DIR: &str = "./wiki/";

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Runtime options for one undump run.
#[derive(Debug, Clone)]
pub struct UndumpConfig {
    pub target_dir: PathBuf,
    pub symlink_redirects: bool,
    pub keep: NamespaceFilter,
    pub limit: Option<u64>,
    pub dry_run: bool,
    pub keep_going: bool,
    pub check_collisions: bool,
}

impl UndumpConfig {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            symlink_redirects: true,
            keep: NamespaceFilter::all(),
            limit: None,
            dry_run: false,
            keep_going: false,
            check_collisions: false,
        }
    }
}
