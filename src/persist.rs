use crate::config::NAMESPACE_FILE;
use crate::namespace::NamespaceTable;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn namespace_file_path(target_dir: &Path) -> PathBuf {
    target_dir.join(NAMESPACE_FILE)
}

/// Writes the table as pretty JSON next to the page tree, so titles can be
/// mapped to paths later without re-reading the dump. Written atomically via
/// rename.
pub fn save_namespaces(table: &NamespaceTable, target_dir: &Path) -> Result<()> {
    let path = namespace_file_path(target_dir);

    fs::create_dir_all(target_dir)
        .with_context(|| format!("Failed to create directory: {:?}", target_dir))?;

    let tmp_path = path.with_extension("json.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp namespace file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, table)
        .context("Failed to serialize namespace table")?;
    writer.write_all(b"\n")?;
    writer
        .flush()
        .with_context(|| format!("Failed to write namespace file: {:?}", tmp_path))?;

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("Failed to rename temp namespace file to: {:?}", path))?;

    info!(namespaces = table.len(), path = ?path, "Namespace table saved");

    Ok(())
}

pub fn load_namespaces(target_dir: &Path) -> Result<NamespaceTable> {
    let path = namespace_file_path(target_dir);
    let file = File::open(&path)
        .with_context(|| format!("Failed to open namespace file: {:?}", path))?;

    let table: NamespaceTable = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse namespace file: {:?}", path))?;

    info!(namespaces = table.len(), "Namespace table loaded");

    Ok(table)
}
