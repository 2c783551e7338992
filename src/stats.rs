use serde::Serialize;

/// Counters collected while undumping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UndumpStats {
    pub pages_seen: u64,
    pub pages_written: u64,
    pub redirects_linked: u64,
    pub redirects_skipped: u64,
    pub pages_filtered: u64,
    pub pages_failed: u64,
    pub path_collisions: u64,
}

impl UndumpStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_seen(&mut self) {
        self.pages_seen += 1;
    }

    pub fn inc_written(&mut self) {
        self.pages_written += 1;
    }

    pub fn inc_linked(&mut self) {
        self.redirects_linked += 1;
    }

    pub fn inc_skipped_redirects(&mut self) {
        self.redirects_skipped += 1;
    }

    pub fn inc_filtered(&mut self) {
        self.pages_filtered += 1;
    }

    pub fn inc_failed(&mut self) {
        self.pages_failed += 1;
    }

    pub fn inc_collisions(&mut self) {
        self.path_collisions += 1;
    }

    /// Pages that ended up on disk, as a file or a symlink
    pub fn stored(&self) -> u64 {
        self.pages_written + self.redirects_linked
    }
}
