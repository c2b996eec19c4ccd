//! Production [`RepoFs`] backed by `std::fs`.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::contract::{DirEntry, EntryKind, RepoFs};
use crate::error::FsFault;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

impl RepoFs for LocalFs {
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>, FsFault> {
        let mut entries = Vec::new();
        for entry_res in fs::read_dir(dir)? {
            let entry = entry_res?;
            // Such a name cannot round-trip through a String path, so the
            // entry is left out of validation and the archive.
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(
                        dir = %dir.display(),
                        name = %raw.to_string_lossy(),
                        "Skipping entry whose name is not valid UTF-8"
                    );
                    continue;
                }
            };
            // file_type() does not follow symlinks, so links land in Other.
            let file_type = entry.file_type()?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            entries.push(DirEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String, FsFault> {
        Ok(fs::read_to_string(path)?)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, FsFault> {
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsFault> {
        // Stage next to the destination so the final rename stays on one device.
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(contents)?;
        staged.flush()?;
        staged.persist(path).map_err(|e| FsFault::Io(e.error))?;
        debug!(path = %path.display(), size = contents.len(), "Wrote file");
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsFault> {
        Ok(fs::remove_file(path)?)
    }
}
