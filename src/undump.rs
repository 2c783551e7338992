use crate::config::{UndumpConfig, PROGRESS_INTERVAL};
use crate::error::PathError;
use crate::models::{DumpItem, SiteInfo, WikiPage};
use crate::namespace::NamespaceTable;
use crate::parser::WikiReader;
use crate::persist;
use crate::stats::UndumpStats;
use crate::store::{PageStore, StoreOutcome};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rustc_hash::FxHashSet;
use std::fs;
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Drives one or more dumps into a page tree.
pub struct Undumper {
    config: UndumpConfig,
    store: PageStore,
    stats: UndumpStats,
    seen_paths: Option<FxHashSet<String>>,
}

impl Undumper {
    pub fn new(config: UndumpConfig) -> Result<Self> {
        if !config.dry_run {
            fs::create_dir_all(&config.target_dir).with_context(|| {
                format!("Failed to create target directory: {:?}", config.target_dir)
            })?;
        }

        let store = PageStore::new(&config.target_dir, config.symlink_redirects, config.dry_run);
        let seen_paths = config.check_collisions.then(FxHashSet::default);

        Ok(Self {
            config,
            store,
            stats: UndumpStats::new(),
            seen_paths,
        })
    }

    pub fn stats(&self) -> &UndumpStats {
        &self.stats
    }

    pub fn into_stats(self) -> UndumpStats {
        self.stats
    }

    pub fn limit_reached(&self) -> bool {
        self.config
            .limit
            .is_some_and(|limit| self.stats.pages_seen >= limit)
    }

    /// Consumes a whole dump. The namespace table declared in its
    /// `<siteinfo>` applies to every page that follows.
    pub fn process<R: BufRead>(&mut self, reader: WikiReader<R>) -> Result<()> {
        let mut table: Option<NamespaceTable> = None;
        let pb = ProgressBar::new_spinner();

        for item in reader {
            if self.limit_reached() {
                info!(limit = ?self.config.limit, "Page limit reached");
                break;
            }

            match item? {
                DumpItem::SiteInfo(info) => table = Some(self.load_siteinfo(info)?),
                DumpItem::Page(page) => {
                    let table = table.as_ref().with_context(|| {
                        format!("Page {:?} appears before <siteinfo>", page.title)
                    })?;
                    self.stats.inc_seen();
                    self.handle_page(table, &page)?;

                    if self.stats.pages_seen % PROGRESS_INTERVAL == 0 {
                        pb.set_message(format!("{} pages", self.stats.pages_seen));
                        pb.tick();
                    }
                }
            }
        }

        pb.finish_and_clear();
        Ok(())
    }

    fn load_siteinfo(&self, info: SiteInfo) -> Result<NamespaceTable> {
        info!(
            sitename = %info.sitename,
            dbname = %info.dbname,
            namespaces = info.namespaces.len(),
            "Read site info"
        );

        let table = NamespaceTable::new(info.namespaces);
        if let Err(e) = table.check() {
            warn!(error = %e, "Titles without a namespace prefix cannot be placed");
        }

        if !self.config.dry_run {
            persist::save_namespaces(&table, &self.config.target_dir)?;
        }
        Ok(table)
    }

    fn handle_page(&mut self, table: &NamespaceTable, page: &WikiPage) -> Result<()> {
        let resolved = table.resolve(&page.title);
        if !self.config.keep.keeps(resolved.namespace) {
            self.stats.inc_filtered();
            return Ok(());
        }

        if let (Some(hint), Some(key)) = (page.ns, resolved.namespace.key) {
            if hint != key {
                debug!(
                    title = %page.title,
                    ns = hint,
                    resolved = key,
                    "Page namespace id differs from its title prefix"
                );
            }
        }

        debug!(title = %page.title, "page");

        let outcome = match self.store.store_page(table, page) {
            Ok(outcome) => outcome,
            Err(e) if self.config.keep_going && is_page_local(&e) => {
                warn!(title = ?page.title, id = ?page.id, error = %e, "Skipping page");
                self.stats.inc_failed();
                return Ok(());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to store page {:?}", page.title))
            }
        };

        match outcome {
            StoreOutcome::Written { path } => {
                self.stats.inc_written();
                self.note_path(path, &page.title);
            }
            StoreOutcome::Linked { path, .. } => {
                self.stats.inc_linked();
                self.note_path(path, &page.title);
            }
            StoreOutcome::SkippedRedirect => self.stats.inc_skipped_redirects(),
        }
        Ok(())
    }

    fn note_path(&mut self, path: String, title: &str) {
        let Some(seen) = self.seen_paths.as_mut() else {
            return;
        };
        if seen.contains(&path) {
            warn!(path = %path, title = %title, "Path already used by another title");
            self.stats.inc_collisions();
        } else {
            seen.insert(path);
        }
    }
}

fn is_page_local(e: &anyhow::Error) -> bool {
    e.downcast_ref::<PathError>()
        .is_some_and(PathError::is_page_local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::NamespaceFilter;
    use tempfile::TempDir;

    const DUMP: &str = r#"<mediawiki>
  <siteinfo>
    <sitename>Testwiki</sitename>
    <namespaces>
      <namespace key="0" case="first-letter" />
      <namespace key="2" case="first-letter">User</namespace>
      <namespace key="10" case="first-letter">Template</namespace>
    </namespaces>
  </siteinfo>
  <page><title>Accordion</title><ns>0</ns><revision><text>Squeeze box.</text></revision></page>
  <page><title>accordion</title><ns>0</ns><revision><text>Lowercase twin.</text></revision></page>
  <page><title>User:Alice</title><ns>2</ns><revision><text>Hi.</text></revision></page>
  <page><title>Template:AA</title><ns>10</ns><revision><text>{{{1}}}</text></revision></page>
  <page><title>Acc</title><ns>0</ns><redirect title="Accordion" /><revision><text>#REDIRECT</text></revision></page>
</mediawiki>"#;

    fn run(config: UndumpConfig, xml: &str) -> Result<UndumpStats> {
        let mut undumper = Undumper::new(config)?;
        undumper.process(WikiReader::from_reader(xml.as_bytes()))?;
        Ok(undumper.into_stats())
    }

    #[test]
    fn counts_every_outcome() {
        let dir = TempDir::new().unwrap();
        let mut config = UndumpConfig::new(dir.path());
        config.check_collisions = true;

        let stats = run(config, DUMP).unwrap();
        assert_eq!(stats.pages_seen, 5);
        assert_eq!(stats.pages_written, 4);
        assert_eq!(stats.redirects_linked, 1);
        assert_eq!(stats.path_collisions, 1);
    }

    #[test]
    fn keep_filter_applies_to_resolved_namespace() {
        let dir = TempDir::new().unwrap();
        let mut config = UndumpConfig::new(dir.path());
        config.keep = NamespaceFilter::parse("Template");

        let stats = run(config, DUMP).unwrap();
        assert_eq!(stats.pages_written, 1);
        assert_eq!(stats.pages_filtered, 4);
        assert!(dir.path().join("Template/a/a/_/Template:AA").exists());
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn limit_stops_early() {
        let dir = TempDir::new().unwrap();
        let mut config = UndumpConfig::new(dir.path());
        config.limit = Some(2);

        let mut undumper = Undumper::new(config).unwrap();
        undumper
            .process(WikiReader::from_reader(DUMP.as_bytes()))
            .unwrap();
        assert!(undumper.limit_reached());
        assert_eq!(undumper.stats().pages_seen, 2);
    }

    #[test]
    fn page_before_siteinfo_is_error() {
        let dir = TempDir::new().unwrap();
        let xml = "<mediawiki><page><title>Early</title></page></mediawiki>";
        let err = run(UndumpConfig::new(dir.path()), xml).unwrap_err();
        assert!(err.to_string().contains("before <siteinfo>"), "{err}");
    }

    #[test]
    fn empty_title_aborts_by_default() {
        let dir = TempDir::new().unwrap();
        let xml = DUMP.replace("<title>User:Alice</title>", "<title></title>");
        let err = run(UndumpConfig::new(dir.path()), &xml).unwrap_err();
        assert_eq!(err.downcast_ref::<PathError>(), Some(&PathError::EmptyTitle));
    }

    #[test]
    fn keep_going_skips_bad_titles() {
        let dir = TempDir::new().unwrap();
        let mut config = UndumpConfig::new(dir.path());
        config.keep_going = true;
        let xml = DUMP
            .replace("<title>User:Alice</title>", "<title></title>")
            .replace("<title>Template:AA</title>", "<title>Template:</title>");

        let stats = run(config, &xml).unwrap();
        assert_eq!(stats.pages_failed, 2);
        assert_eq!(stats.pages_written, 2);
        assert_eq!(stats.redirects_linked, 1);
    }

    #[test]
    fn keep_going_still_aborts_on_case_rule() {
        let dir = TempDir::new().unwrap();
        let mut config = UndumpConfig::new(dir.path());
        config.keep_going = true;
        let xml = DUMP.replace(
            r#"key="10" case="first-letter""#,
            r#"key="10" case="case-sensitive""#,
        );

        let err = run(config, &xml).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PathError>(),
            Some(PathError::UnsupportedCaseRule(_))
        ));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("wiki");
        let mut config = UndumpConfig::new(&target);
        config.dry_run = true;

        let stats = run(config, DUMP).unwrap();
        assert_eq!(stats.pages_seen, 5);
        assert!(!target.exists());
    }
}
