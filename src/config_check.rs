//! Remote schema validation of the repository's `inzhenerka.yml`.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::contract::{PumpRoomApi, RepoFs};
use crate::error::{Stage, SyncError};

/// File every content repository must carry at its root.
pub const CONFIG_FILE_NAME: &str = "inzhenerka.yml";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Read the repository configuration and have the API validate it.
///
/// A missing file fails before any request is made.
pub async fn validate_config_file(
    fs: &dyn RepoFs,
    api: &dyn PumpRoomApi,
    root: &Path,
) -> Result<(), SyncError> {
    let path = config_path(root);
    info!(path = %path.display(), "[CHECK] Validating configuration file");

    if !fs.exists(&path) {
        error!(path = %path.display(), "[CHECK][ERROR] Configuration file not found");
        return Err(SyncError::ConfigNotFound(path));
    }

    let content = fs
        .read_to_string(&path)
        .map_err(|e| e.into_sync_error(Stage::ConfigValidation))?;

    api.validate_config(&content).await?;
    info!(path = %path.display(), "[CHECK] Configuration is valid");
    Ok(())
}
