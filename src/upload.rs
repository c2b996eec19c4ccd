//! Upload request metadata and the PumpRoom response it produces.
//!
//! The HTTP side lives in [`crate::client`]; this module holds the plain data
//! that crosses the [`crate::contract::PumpRoomApi`] seam and the pure
//! formatter that renders a response for CI logs.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::ApiKey;

/// Everything sent alongside the archive.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub realm: String,
    pub repo_name: String,
    pub api_key: ApiKey,
    /// Fixed protocol flag; the service re-imports every task when set.
    pub force_update: bool,
    /// Fixed protocol flag; the service keeps tasks missing from the archive when set.
    pub retain_deleted: bool,
}

impl UploadMetadata {
    pub fn new(realm: impl Into<String>, repo_name: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            realm: realm.into(),
            repo_name: repo_name.into(),
            api_key,
            force_update: false,
            retain_deleted: false,
        }
    }
}

/// Body of a successful `upload_tasks` response.
///
/// Two response shapes are in circulation; every counter is optional and the
/// formatter prints whichever ones are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpRoomApiResponse {
    pub pushed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_updated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_uploaded: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_current: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_created: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_updated: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_deleted: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_retained: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_cached: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_synchronized_with_cms: Option<u64>,
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Render a response as the multi-line summary shown in CI logs.
pub fn format_pumproom_response(response: &PumpRoomApiResponse) -> String {
    let mut lines = vec![
        "📊 PumpRoom Repository Update Summary:".to_string(),
        RULE.to_string(),
        format!("🕒 Pushed At: {}", format_timestamp(&response.pushed_at)),
    ];
    if let Some(updated) = response.repo_updated {
        lines.push(format!(
            "🔄 Repository Updated: {}",
            if updated { "Yes" } else { "No" }
        ));
    }

    lines.push(String::new());
    lines.push("📋 Tasks Summary:".to_string());

    let counters = [
        ("Uploaded", response.tasks_uploaded),
        ("Current", response.tasks_current),
        ("Created", response.tasks_created),
        ("Updated", response.tasks_updated),
        ("Deleted", response.tasks_deleted),
        ("Retained", response.tasks_retained),
        ("Cached", response.tasks_cached),
        ("Synchronized with CMS", response.tasks_synchronized_with_cms),
    ];
    for (label, value) in counters {
        if let Some(n) = value {
            lines.push(format!("  • {label}: {n}"));
        }
    }

    lines.push(RULE.to_string());
    lines.join("\n")
}

/// en-US style `M/D/YYYY, h:mm:ss AM`; unparseable input is returned as is.
fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return with_offset.format(DISPLAY).to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive.format(DISPLAY).to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_shape() -> PumpRoomApiResponse {
        PumpRoomApiResponse {
            pushed_at: "2025-07-30T21:26:10.875969".into(),
            repo_updated: Some(true),
            tasks_current: Some(33),
            tasks_updated: Some(33),
            tasks_created: Some(0),
            tasks_deleted: Some(1),
            tasks_cached: Some(33),
            tasks_synchronized_with_cms: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn formats_current_response_shape() {
        let out = format_pumproom_response(&current_shape());
        for expected in [
            "PumpRoom Repository Update Summary",
            "Repository Updated: Yes",
            "Current: 33",
            "Updated: 33",
            "Created: 0",
            "Deleted: 1",
            "Cached: 33",
            "Synchronized with CMS: 2",
        ] {
            assert!(out.contains(expected), "missing {expected:?} in:\n{out}");
        }
        assert!(!out.contains("Uploaded:"));
        assert!(!out.contains("Retained:"));
    }

    #[test]
    fn formats_legacy_response_shape() {
        let response = PumpRoomApiResponse {
            pushed_at: "2024-01-05T08:03:09Z".into(),
            tasks_uploaded: Some(12),
            tasks_created: Some(2),
            tasks_updated: Some(3),
            tasks_deleted: Some(0),
            tasks_retained: Some(7),
            ..Default::default()
        };
        let out = format_pumproom_response(&response);
        let expected = [
            "📊 PumpRoom Repository Update Summary:",
            RULE,
            "🕒 Pushed At: 1/5/2024, 8:03:09 AM",
            "",
            "📋 Tasks Summary:",
            "  • Uploaded: 12",
            "  • Created: 2",
            "  • Updated: 3",
            "  • Deleted: 0",
            "  • Retained: 7",
            RULE,
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn formatting_is_deterministic() {
        let response = current_shape();
        assert_eq!(
            format_pumproom_response(&response),
            format_pumproom_response(&response)
        );
    }

    #[test]
    fn timestamps_render_in_en_us_style() {
        assert_eq!(
            format_timestamp("2025-07-30T21:26:10.875969"),
            "7/30/2025, 9:26:10 PM"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn repo_not_updated_renders_no() {
        let response = PumpRoomApiResponse {
            pushed_at: "2025-07-30T21:26:10".into(),
            repo_updated: Some(false),
            ..Default::default()
        };
        assert!(format_pumproom_response(&response).contains("Repository Updated: No"));
    }
}
