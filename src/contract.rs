//! # contract: the seams of the publish pipeline
//!
//! The pipeline touches the outside world in exactly two ways: it reads and
//! writes the local file system, and it calls the PumpRoom API. Each is a trait
//! here so the orchestration in [`crate::synchronise`] can run against the real
//! implementations ([`crate::local_fs::LocalFs`], [`crate::client::PumpRoomClient`])
//! or against `mockall` mocks in tests.
//!
//! ## Mocking & Testing
//! - Both traits are annotated with `automock`; the generated `MockRepoFs` and
//!   `MockPumpRoomApi` are exported under the `test-export-mocks` feature.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{FsFault, SyncError};
use crate::upload::{PumpRoomApiResponse, UploadMetadata};

/// Kind of a directory entry, as far as the pipeline cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Sockets, devices, symbolic links and anything else.
    Other,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Dir,
        }
    }
}

/// Blocking file-system access used by every pipeline stage.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RepoFs: Send + Sync {
    /// List the immediate children of `dir`.
    fn list_dir(&self, dir: &Path) -> Result<Vec<DirEntry>, FsFault>;

    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String, FsFault>;

    fn read(&self, path: &Path) -> Result<Vec<u8>, FsFault>;

    /// Write `contents` to `path` as a single operation, replacing any existing file.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), FsFault>;

    fn remove_file(&self, path: &Path) -> Result<(), FsFault>;
}

/// The two PumpRoom API calls the pipeline makes.
///
/// Implementations classify their own failures into [`SyncError`] so that the
/// orchestrator never needs to know about the transport.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PumpRoomApi: Send + Sync {
    /// Submit the raw repository configuration text for schema validation.
    async fn validate_config(&self, config_yml: &str) -> Result<(), SyncError>;

    /// Upload the archive at `archive` together with its metadata.
    async fn upload_archive(
        &self,
        archive: &Path,
        metadata: &UploadMetadata,
    ) -> Result<PumpRoomApiResponse, SyncError>;
}
