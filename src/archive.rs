//! Zip archive of a repository tree, filtered by an ignore list.
//!
//! The walk is depth-first pre-order. Every path is checked against the
//! [`IgnoreList`] before anything else happens to it, so an ignored directory is
//! never descended into. Only regular files end up in the archive; directories
//! are implied by the entry names.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::contract::{EntryKind, RepoFs};
use crate::error::{Stage, SyncError};

/// Name of the temporary archive written into the working directory.
pub const ARCHIVE_FILE_NAME: &str = "repo-archive.zip";

/// Fragments every run ignores regardless of user input.
pub const DEFAULT_IGNORE: [&str; 2] = [".git", ARCHIVE_FILE_NAME];

/// Path fragments excluded from the archive.
///
/// Matching is plain substring containment on the full path: `dist` also
/// excludes `redistribute/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreList {
    fragments: Vec<String>,
}

impl IgnoreList {
    /// The fixed fragments followed by the comma-separated user fragments.
    pub fn with_user_fragments(raw: &str) -> Self {
        let mut fragments: Vec<String> = DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect();
        for fragment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !fragments.iter().any(|f| f == fragment) {
                fragments.push(fragment.to_string());
            }
        }
        Self { fragments }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.fragments.iter().any(|f| path.contains(f.as_str()))
    }
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self::with_user_fragments("")
    }
}

/// A file to be stored, addressed inside the archive by directory and base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    /// `/`-separated directory below the archived root; empty for top-level files.
    pub dir: String,
    pub name: String,
}

impl ArchiveEntry {
    pub fn archive_path(&self) -> String {
        if self.dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.dir, self.name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub entries: Vec<ArchiveEntry>,
    pub bytes: usize,
}

/// Archive everything under `source` that the ignore list lets through and
/// write the result to `destination`.
pub fn create_archive(
    fs: &dyn RepoFs,
    source: &Path,
    destination: &Path,
    ignore: &IgnoreList,
) -> Result<ArchiveSummary, SyncError> {
    info!(
        source = %source.display(),
        destination = %destination.display(),
        ignore = ?ignore.fragments(),
        "[ARCHIVE] Creating archive"
    );

    let mut buffer = Vec::new();
    let mut entries = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        visit_dir(fs, source, &[], ignore, &mut zip, options, &mut entries)?;
        zip.finish()?;
    }

    fs.write(destination, &buffer)
        .map_err(|e| e.into_sync_error(Stage::Pipeline))?;

    info!(
        files = entries.len(),
        bytes = buffer.len(),
        destination = %destination.display(),
        "[ARCHIVE] Archive written"
    );
    Ok(ArchiveSummary {
        entries,
        bytes: buffer.len(),
    })
}

fn visit_dir<W: Write + std::io::Seek>(
    fs: &dyn RepoFs,
    dir: &Path,
    prefix: &[String],
    ignore: &IgnoreList,
    zip: &mut ZipWriter<W>,
    options: FileOptions,
    entries: &mut Vec<ArchiveEntry>,
) -> Result<(), SyncError> {
    let children = fs
        .list_dir(dir)
        .map_err(|e| e.into_sync_error(Stage::Pipeline))?;

    for child in children {
        let full_path = dir.join(&child.name);
        if ignore.matches(&full_path) {
            debug!(path = %full_path.display(), "[ARCHIVE] Skipping ignored path");
            continue;
        }

        match child.kind {
            EntryKind::Dir => {
                let mut nested = prefix.to_vec();
                nested.push(child.name);
                visit_dir(fs, &full_path, &nested, ignore, zip, options, entries)?;
            }
            EntryKind::File => {
                let data = fs
                    .read(&full_path)
                    .map_err(|e| e.into_sync_error(Stage::Pipeline))?;
                let entry = ArchiveEntry {
                    source: full_path,
                    dir: prefix.join("/"),
                    name: child.name,
                };
                let archive_path = entry.archive_path();
                zip.start_file(archive_path.as_str(), options)?;
                zip.write_all(&data)?;
                debug!(entry = %archive_path, size = data.len(), "[ARCHIVE] Added file");
                entries.push(entry);
            }
            EntryKind::Other => {
                debug!(path = %full_path.display(), "[ARCHIVE] Skipping non-regular entry");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_fragments_are_trimmed_and_merged_after_defaults() {
        let list = IgnoreList::with_user_fragments(" node_modules , dist,,  ,.git");
        assert_eq!(
            list.fragments(),
            [".git", "repo-archive.zip", "node_modules", "dist"]
        );
    }

    #[test]
    fn matching_is_substring_containment() {
        let list = IgnoreList::with_user_fragments("dist");
        assert!(list.matches(Path::new("/repo/redistribute/a.txt")));
        assert!(list.matches(Path::new("/repo/.github/workflows/ci.yml")));
        assert!(!list.matches(Path::new("/repo/src/main.rs")));
    }

    #[test]
    fn archive_path_joins_dir_and_name() {
        let nested = ArchiveEntry {
            source: PathBuf::from("/src/a/b/c.txt"),
            dir: "a/b".into(),
            name: "c.txt".into(),
        };
        assert_eq!(nested.archive_path(), "a/b/c.txt");
        let top = ArchiveEntry {
            source: PathBuf::from("/src/c.txt"),
            dir: String::new(),
            name: "c.txt".into(),
        };
        assert_eq!(top.archive_path(), "c.txt");
    }
}
