//! High-level pipeline: validate → archive → upload → clean up.
//!
//! [`synchronise`] runs the stages in order against a [`RepoFs`] and a
//! [`PumpRoomApi`]:
//!   1. folder-name uniqueness at the repository root ([`crate::folders`])
//!   2. remote validation of `inzhenerka.yml` ([`crate::config_check`])
//!   3. a zip of the filtered tree in the working directory ([`crate::archive`])
//!   4. the upload of that zip ([`PumpRoomApi::upload_archive`])
//!   5. removal of the temporary zip
//!
//! # Error Handling
//! Stages return [`SyncError`]. The first failure stops the run and is turned
//! into a single [`SyncFailure`] holding the stage it happened in and the
//! message to report. There is no partial success and nothing is retried.
//!
//! # Cleanup
//! The temporary archive is owned by a [`TempArchive`] guard from before it is
//! written, so it is removed on every exit path, not just the successful one.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::archive::create_archive;
use crate::config::SyncConfig;
use crate::config_check::validate_config_file;
use crate::contract::{PumpRoomApi, RepoFs};
use crate::error::SyncError;
use crate::folders::{validate_unique_folders, FolderCheck};
use crate::upload::{format_pumproom_response, PumpRoomApiResponse, UploadMetadata};

/// States of one pipeline run. `Failed` is represented by [`SyncFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    FolderValidation,
    ConfigValidation,
    Archiving,
    Uploading,
    Cleanup,
    Done,
}

impl PipelineStage {
    /// The stage that follows this one on the success path.
    fn next(self) -> Option<PipelineStage> {
        use PipelineStage::*;
        match self {
            Init => Some(FolderValidation),
            FolderValidation => Some(ConfigValidation),
            ConfigValidation => Some(Archiving),
            Archiving => Some(Uploading),
            Uploading => Some(Cleanup),
            Cleanup => Some(Done),
            Done => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Init => "init",
            PipelineStage::FolderValidation => "folder validation",
            PipelineStage::ConfigValidation => "configuration validation",
            PipelineStage::Archiving => "archiving",
            PipelineStage::Uploading => "uploading",
            PipelineStage::Cleanup => "cleanup",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a run: the stage it stopped in and the reported message.
#[derive(Debug)]
pub struct SyncFailure {
    pub stage: PipelineStage,
    pub message: String,
    pub source: SyncError,
}

impl SyncFailure {
    fn new(stage: PipelineStage, source: SyncError) -> Self {
        Self {
            stage,
            message: source.to_string(),
            source,
        }
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SyncFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct SynchroniseReport {
    pub stage: PipelineStage,
    pub folders: FolderCheck,
    pub archived_files: usize,
    pub archive_bytes: usize,
    pub response: PumpRoomApiResponse,
    pub summary: String,
}

/// Result of [`run_checks`].
#[derive(Debug)]
pub struct CheckReport {
    pub stage: PipelineStage,
    pub folders: FolderCheck,
}

/// Temporary archive that is removed when the guard goes out of scope.
pub struct TempArchive<'a> {
    fs: &'a dyn RepoFs,
    path: PathBuf,
    armed: bool,
}

impl<'a> TempArchive<'a> {
    pub fn new(fs: &'a dyn RepoFs, path: PathBuf) -> Self {
        Self {
            fs,
            path,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the archive now, reporting failure instead of swallowing it.
    pub fn remove(mut self) -> Result<(), SyncError> {
        self.armed = false;
        if !self.fs.exists(&self.path) {
            return Ok(());
        }
        self.fs
            .remove_file(&self.path)
            .map_err(|e| e.into_sync_error(crate::error::Stage::Pipeline))
    }
}

impl Drop for TempArchive<'_> {
    fn drop(&mut self) {
        if !self.armed || !self.fs.exists(&self.path) {
            return;
        }
        match self.fs.remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "[SYNC][CLEANUP] Removed temporary archive"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "[SYNC][CLEANUP] Failed to remove temporary archive"),
        }
    }
}

/// Where a run currently is. Failures are attributed to the current stage.
struct Progress {
    stage: PipelineStage,
}

impl Progress {
    fn start() -> Self {
        debug!(stage = %PipelineStage::Init, "[SYNC] Entering stage");
        Self {
            stage: PipelineStage::Init,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            debug!(from = %self.stage, to = %next, "[SYNC] Entering stage");
            self.stage = next;
        }
    }

    /// Checks-only runs stop after configuration validation.
    fn finish(&mut self) {
        debug!(from = %self.stage, to = %PipelineStage::Done, "[SYNC] Entering stage");
        self.stage = PipelineStage::Done;
    }

    fn fail(&self, err: SyncError) -> SyncFailure {
        error!(stage = %self.stage, error = %err, "[SYNC][ERROR] Pipeline failed");
        SyncFailure::new(self.stage, err)
    }
}

async fn checks(
    config: &SyncConfig,
    fs: &dyn RepoFs,
    api: &dyn PumpRoomApi,
    progress: &mut Progress,
) -> Result<FolderCheck, SyncFailure> {
    progress.advance();
    let folders =
        validate_unique_folders(fs, &config.root_dir).map_err(|e| progress.fail(e))?;

    progress.advance();
    validate_config_file(fs, api, &config.root_dir)
        .await
        .map_err(|e| progress.fail(e))?;

    Ok(folders)
}

/// Run only the pre-flight checks (folder names, configuration).
pub async fn run_checks(
    config: &SyncConfig,
    fs: &dyn RepoFs,
    api: &dyn PumpRoomApi,
) -> Result<CheckReport, SyncFailure> {
    info!(root = %config.root_dir.display(), "[SYNC] Running pre-flight checks");

    let mut progress = Progress::start();
    let folders = checks(config, fs, api, &mut progress).await?;
    progress.finish();

    Ok(CheckReport {
        stage: progress.stage,
        folders,
    })
}

/// Entrypoint: validate, archive and upload the repository described by `config`.
pub async fn synchronise(
    config: &SyncConfig,
    fs: &dyn RepoFs,
    api: &dyn PumpRoomApi,
) -> Result<SynchroniseReport, SyncFailure> {
    info!(
        root = %config.root_dir.display(),
        realm = %config.realm,
        repo_name = %config.repo_name,
        "[SYNC] Starting repository synchronisation"
    );

    let mut progress = Progress::start();
    let folders = checks(config, fs, api, &mut progress).await?;

    progress.advance();
    let archive = TempArchive::new(fs, config.archive_path());
    let summary = create_archive(fs, &config.root_dir, archive.path(), &config.ignore)
        .map_err(|e| progress.fail(e))?;
    info!(files = summary.entries.len(), "[SYNC] Archive ready");

    progress.advance();
    let metadata = UploadMetadata::new(
        config.realm.clone(),
        config.repo_name.clone(),
        config.api_key.clone(),
    );
    let response = api
        .upload_archive(archive.path(), &metadata)
        .await
        .map_err(|e| progress.fail(e))?;

    progress.advance();
    if let Err(e) = archive.remove() {
        warn!(error = %e, "[SYNC][CLEANUP] Temporary archive could not be removed");
    }

    progress.advance();
    let rendered = format_pumproom_response(&response);
    info!("[SYNC] Repository synchronisation complete");
    Ok(SynchroniseReport {
        stage: progress.stage,
        folders,
        archived_files: summary.entries.len(),
        archive_bytes: summary.bytes,
        response,
        summary: rendered,
    })
}
