#![doc = "HTTP implementation of the PumpRoom API seam."]
//
//! # PumpRoom client
//!
//! [`PumpRoomClient`] implements [`PumpRoomApi`] over `reqwest`:
//!
//! - `POST {base}/inzhenerka_schema` with `{"config_yml": ...}` validates the
//!   repository configuration (60 s timeout).
//! - `POST {base}/repo/upload_tasks` uploads the archive as multipart form data,
//!   authenticated with `X-API-KEY` (10 min timeout; large repositories take
//!   the server a while to import).
//!
//! Outcome classification is the same for both calls: `200` is success, an
//! error status becomes [`SyncError::Transport`] carrying the server's status
//! and body, any other status is a rejection naming the code, and a request
//! that never got a response becomes a `Transport` failure without one. For
//! the upload, that failure reads exactly as the underlying error.

use std::error::Error as _;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde::Serialize;
use tracing::{error, info};

use crate::archive::ARCHIVE_FILE_NAME;
use crate::contract::PumpRoomApi;
use crate::error::{ErrorResponse, RemoteCall, SyncError};
use crate::upload::{PumpRoomApiResponse, UploadMetadata};

pub const SCHEMA_PATH: &str = "/inzhenerka_schema";
pub const UPLOAD_PATH: &str = "/repo/upload_tasks";

const CONFIG_TIMEOUT: Duration = Duration::from_secs(60);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Serialize)]
struct SchemaRequest<'a> {
    config_yml: &'a str,
}

#[derive(Clone, Debug)]
pub struct PumpRoomClient {
    client: Client,
    base_url: String,
}

impl PumpRoomClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SyncError> {
        let client = Client::builder()
            .user_agent(concat!("pumproom-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SyncError::Http)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Initialized PumpRoomClient");
        Ok(Self { client, base_url })
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PumpRoomApi for PumpRoomClient {
    async fn validate_config(&self, config_yml: &str) -> Result<(), SyncError> {
        let call = RemoteCall::ConfigValidation;
        let url = self.build_url(SCHEMA_PATH);
        info!(url = %url, bytes = config_yml.len(), "Submitting configuration for validation");

        let response = self
            .client
            .post(&url)
            .timeout(CONFIG_TIMEOUT)
            .json(&SchemaRequest { config_yml })
            .send()
            .await
            .map_err(|e| network_failure(call, e))?;

        let response = reject_error_status(call, response).await?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(status = status.as_u16(), "Configuration validation returned unexpected status");
            return Err(SyncError::ConfigRejected(status.as_u16()));
        }
        Ok(())
    }

    async fn upload_archive(
        &self,
        archive: &Path,
        metadata: &UploadMetadata,
    ) -> Result<PumpRoomApiResponse, SyncError> {
        let call = RemoteCall::Upload;
        let url = self.build_url(UPLOAD_PATH);

        let file = tokio::fs::File::open(archive).await?;
        let size = file.metadata().await?.len();
        info!(
            url = %url,
            realm = %metadata.realm,
            repo_name = %metadata.repo_name,
            archive = %archive.display(),
            size,
            "Uploading repository archive"
        );

        let archive_part = Part::stream_with_length(Body::from(file), size)
            .file_name(ARCHIVE_FILE_NAME)
            .mime_str("application/zip")
            .map_err(SyncError::Http)?;
        let form = Form::new()
            .text("realm", metadata.realm.clone())
            .text("repo_name", metadata.repo_name.clone())
            .text("force_update", metadata.force_update.to_string())
            .text("retain_deleted", metadata.retain_deleted.to_string())
            .part("archive", archive_part);

        let response = self
            .client
            .post(&url)
            .timeout(UPLOAD_TIMEOUT)
            .header("X-API-KEY", metadata.api_key.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| network_failure(call, e))?;

        let response = reject_error_status(call, response).await?;
        let status = response.status();
        if status != StatusCode::OK {
            error!(status = status.as_u16(), "Upload returned unexpected status");
            return Err(SyncError::UploadRejected(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| network_failure(call, e))?;
        let decoded: PumpRoomApiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, "Failed to decode upload response");
            SyncError::InvalidResponse(e.to_string())
        })?;
        info!(pushed_at = %decoded.pushed_at, "Repository uploaded successfully");
        Ok(decoded)
    }
}

/// Turn a 4xx/5xx response into a transport failure carrying status and body.
async fn reject_error_status(call: RemoteCall, response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    error!(
        call = %call,
        status = status.as_u16(),
        body = %body,
        "PumpRoom API responded with an error status"
    );
    Err(SyncError::Transport {
        call,
        response: Some(ErrorResponse {
            status: status.as_u16(),
            body,
        }),
        message: format!("HTTP status {status}"),
    })
}

/// A request that never produced a response. The message keeps the whole
/// source chain, since reqwest's top-level text omits the cause.
fn network_failure(call: RemoteCall, err: reqwest::Error) -> SyncError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    error!(call = %call, error = %message, "PumpRoom API request failed without a response");
    SyncError::Transport {
        call,
        response: None,
        message,
    }
}
