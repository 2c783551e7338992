use crate::models::WikiPage;
use crate::namespace::NamespaceTable;
use crate::path::{build_path, relative_link};
use anyhow::{bail, Context, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// What happened to a page handed to [`PageStore::store_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Page text written to `path` (relative to the store root).
    Written { path: String },
    /// Symlink created at `path` pointing at `target`.
    Linked { path: String, target: PathBuf },
    /// Redirect dropped because symlinks are disabled.
    SkippedRedirect,
}

/// Places pages under an output root: a file per page, a relative symlink
/// per redirect.
#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
    symlink_redirects: bool,
    dry_run: bool,
}

impl PageStore {
    pub fn new(root: impl Into<PathBuf>, symlink_redirects: bool, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            symlink_redirects,
            dry_run,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins a derived page path onto the root, refusing anything that could
    /// climb out of it.
    pub fn target_path(&self, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            bail!("Refusing to write outside the output directory: {:?}", relative);
        }
        Ok(self.root.join(relative))
    }

    pub fn store_page(&self, table: &NamespaceTable, page: &WikiPage) -> Result<StoreOutcome> {
        let path = build_path(table, &page.title)?;

        if let Some(redirect) = &page.redirect {
            if !self.symlink_redirects {
                return Ok(StoreOutcome::SkippedRedirect);
            }
            let to = build_path(table, redirect)
                .with_context(|| format!("Invalid redirect target {:?}", redirect))?;
            let target = relative_link(&path, &to);
            debug!(from = %path, to = ?target, "symlink redirect");

            if !self.dry_run {
                let full = self.target_path(&path)?;
                create_parent(&full)?;
                replace_symlink(&target, &full)?;
            }
            return Ok(StoreOutcome::Linked { path, target });
        }

        if !self.dry_run {
            let full = self.target_path(&path)?;
            create_parent(&full)?;
            unlink_symlink(&full)?;
            fs::write(&full, page.text.as_bytes())
                .with_context(|| format!("Failed to write page: {:?}", full))?;
        }
        Ok(StoreOutcome::Written { path })
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    Ok(())
}

/// Removes a symlink left at `path` so a later write creates a regular file
/// instead of going through the link into another page.
fn unlink_symlink(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(path)
            .with_context(|| format!("Failed to remove stale redirect: {:?}", path)),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to inspect: {:?}", path)),
    }
}

fn replace_symlink(target: &Path, link: &Path) -> Result<()> {
    match fs::symlink_metadata(link) {
        Ok(meta) if meta.is_dir() => {
            bail!("Cannot create redirect, a directory is in the way: {:?}", link)
        }
        Ok(_) => fs::remove_file(link)
            .with_context(|| format!("Failed to replace existing entry: {:?}", link))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect: {:?}", link)),
    }

    symlink(target, link)
        .with_context(|| format!("Failed to create symlink {:?} -> {:?}", link, target))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
