//! Folder-name uniqueness check for the repository root.
//!
//! Content repositories are consumed on case-insensitive file systems, so two
//! top-level folders such as `Lesson1` and `lesson1` collide once checked out
//! there. This check lists the root one level deep and reports every such
//! collision at once.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info};

use crate::contract::{EntryKind, RepoFs};
use crate::error::{Stage, SyncError};

/// Successful outcomes of [`validate_unique_folders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderCheck {
    /// The root holds no subdirectories at all.
    NoFolders,
    /// All subdirectory names are unique ignoring case.
    Unique { folders: usize },
}

/// Lower-cased folder name → original-case names that share it.
#[derive(Debug, Default)]
pub struct FolderNameIndex {
    by_key: BTreeMap<String, Vec<String>>,
}

impl FolderNameIndex {
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut by_key: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in names {
            let variants = by_key.entry(name.to_lowercase()).or_default();
            if !variants.iter().any(|v| v == name) {
                variants.push(name.to_string());
            }
        }
        Self { by_key }
    }

    /// Every colliding key with its variants, in key order.
    pub fn collisions(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_key
            .iter()
            .filter(|(_, variants)| variants.len() > 1)
            .map(|(key, variants)| (key.as_str(), variants.as_slice()))
    }
}

/// Fail if two immediate subdirectories of `root` differ only by case.
pub fn validate_unique_folders(fs: &dyn RepoFs, root: &Path) -> Result<FolderCheck, SyncError> {
    info!(root = %root.display(), "[CHECK] Validating folder names");

    let entries = fs
        .list_dir(root)
        .map_err(|e| e.into_sync_error(Stage::FolderValidation))?;

    let folders: Vec<&str> = entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Dir)
        .map(|entry| entry.name.as_str())
        .collect();

    if folders.is_empty() {
        info!(root = %root.display(), "[CHECK] No folders to validate");
        return Ok(FolderCheck::NoFolders);
    }

    let index = FolderNameIndex::build(folders.iter().copied());
    let collisions: Vec<String> = index
        .collisions()
        .map(|(key, variants)| format!("{key} (variants: {})", variants.join(", ")))
        .collect();

    if !collisions.is_empty() {
        error!(count = collisions.len(), "[CHECK][ERROR] Duplicate folder names found");
        return Err(SyncError::DuplicateFolders(collisions));
    }

    info!(folders = folders.len(), "[CHECK] No duplicate folder names found");
    Ok(FolderCheck::Unique {
        folders: folders.len(),
    })
}
