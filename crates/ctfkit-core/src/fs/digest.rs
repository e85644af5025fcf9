//! Content digests and whole-file writes.
//!
//! Definitions, the project config, and mirrored attachments are always
//! rewritten whole. Attachments are compared by blake3 digest so an
//! unchanged download leaves the file (and its mtime) alone.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

/// Hex blake3 digest of a byte slice.
pub fn digest_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Hex blake3 digest of a file's content.
pub fn digest_file(path: &Path) -> anyhow::Result<String> {
    let content =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(digest_bytes(&content))
}

/// Replace `path` through a temporary sibling and a rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Path has no parent directory: {}", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(content)
        .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    Ok(())
}

/// Write `content` unless the file already holds exactly these bytes.
///
/// Returns `true` when the file was written.
pub fn write_if_changed(path: &Path, content: &[u8]) -> anyhow::Result<bool> {
    if path.is_file() && digest_file(path)? == digest_bytes(content) {
        return Ok(false);
    }
    atomic_write(path, content)?;
    Ok(true)
}
