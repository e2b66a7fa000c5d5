//! Filesystem helpers shared by the compilers and the stage runner.
//!
//! Every artifact reaches its final path through a rename so readers never see a half-written
//! file.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::ReelResult;

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write `bytes` to a temporary file next to `path`, then rename it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> ReelResult<()> {
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("failed to create temp file in '{}'", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("failed to write temp file for '{}'", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush temp file for '{}'", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to move temp file onto '{}'", path.display()))?;
    Ok(())
}

/// Short stable tag derived from a unit identity, used to keep scratch paths apart.
pub fn unit_tag(unit_id: &str) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(unit_id.as_bytes()))
}

/// Scratch path a stage writes into before its output is promoted to `final_path`.
///
/// The extension is kept so tools that pick a muxer from the file name still work.
pub fn partial_path(final_path: &Path, unit_id: &str) -> PathBuf {
    let stem = final_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let tag = unit_tag(unit_id);
    let name = match final_path.extension() {
        Some(ext) => format!(".{stem}.{tag}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.{tag}.partial"),
    };
    final_path.with_file_name(name)
}

/// Size of a regular file, or `None` when it does not exist.
pub fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.len())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fs.rs"]
mod tests;
