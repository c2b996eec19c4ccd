// pumproom-sync/src/config.rs

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::archive::{IgnoreList, ARCHIVE_FILE_NAME};

/// PumpRoom API base used when none is configured.
pub const DEFAULT_API_URL: &str = "https://pumproom-api.inzhenerka-cloud.com";

/// Secret API key. Its `Debug` output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Raw run inputs, as handed over by whatever launches the pipeline.
#[derive(Debug, Clone)]
pub struct SyncInputs {
    pub root_dir: Option<PathBuf>,
    pub ignore: String,
    pub realm: String,
    pub repo_name: String,
    pub api_key: ApiKey,
    pub api_url: Option<String>,
}

/// Fully resolved configuration of one pipeline run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub root_dir: PathBuf,
    /// Directory the temporary archive is written to.
    pub working_dir: PathBuf,
    pub ignore: IgnoreList,
    pub realm: String,
    pub repo_name: String,
    pub api_key: ApiKey,
    pub api_url: String,
}

impl SyncConfig {
    /// Resolve inputs against an explicitly supplied working directory.
    pub fn from_inputs(inputs: SyncInputs, working_dir: PathBuf) -> Self {
        let root_dir = inputs
            .root_dir
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| working_dir.clone());
        let api_url = inputs
            .api_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            root_dir,
            working_dir,
            ignore: IgnoreList::with_user_fragments(&inputs.ignore),
            realm: inputs.realm,
            repo_name: inputs.repo_name,
            api_key: inputs.api_key,
            api_url,
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.working_dir.join(ARCHIVE_FILE_NAME)
    }

    pub fn trace_loaded(&self) {
        info!(
            root_dir = %self.root_dir.display(),
            working_dir = %self.working_dir.display(),
            realm = %self.realm,
            repo_name = %self.repo_name,
            api_url = %self.api_url,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> SyncInputs {
        SyncInputs {
            root_dir: None,
            ignore: "drafts, tmp".into(),
            realm: "inzhenerka".into(),
            repo_name: "python-course".into(),
            api_key: ApiKey::new("s3cr3t-key"),
            api_url: None,
        }
    }

    #[test]
    fn root_dir_defaults_to_working_dir() {
        let config = SyncConfig::from_inputs(inputs(), PathBuf::from("/work"));
        assert_eq!(config.root_dir, PathBuf::from("/work"));
        assert_eq!(config.archive_path(), PathBuf::from("/work/repo-archive.zip"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(
            config.ignore.fragments(),
            [".git", "repo-archive.zip", "drafts", "tmp"]
        );
    }

    #[test]
    fn explicit_root_and_api_url_win() {
        let mut raw = inputs();
        raw.root_dir = Some(PathBuf::from("/work/content"));
        raw.api_url = Some("http://127.0.0.1:9000/".into());
        let config = SyncConfig::from_inputs(raw, PathBuf::from("/work"));
        assert_eq!(config.root_dir, PathBuf::from("/work/content"));
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let config = SyncConfig::from_inputs(inputs(), PathBuf::from("/work"));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cr3t-key"));
        assert!(rendered.contains("ApiKey(***)"));
        assert_eq!(config.api_key.expose(), "s3cr3t-key");
    }
}
