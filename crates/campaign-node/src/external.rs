// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Wire shapes for the external interface of §6. No HTTP framing lives here
//! (out of scope) — these are the `#[derive(Serialize)]` payloads a future
//! HTTP layer would marshal directly, kept here so the contract is pinned
//! independent of the transport.

use campaign_core::{Attachment, AttachmentKind, BrowserKind, CampaignStatus, TimingMode, WorkflowStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentInput {
    pub filename: String,
    pub content_type: String,
    pub data_base64: String,
}

impl AttachmentInput {
    pub fn into_attachment(self) -> Attachment {
        let kind = AttachmentKind::from_content_type(&self.content_type);
        // base64 is not decoded here — `size_bytes` is derived from the
        // encoded length's 3:4 ratio, good enough for a demo/test surface
        // that never actually renders the bytes.
        let size_bytes = (self.data_base64.len() as u64 * 3) / 4;
        Attachment {
            filename: self.filename,
            content_type: self.content_type,
            size_bytes,
            kind,
            data_base64: self.data_base64,
            caption: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub owner_id: Uuid,
    pub name: Option<String>,
    pub contact_ids: Vec<Uuid>,
    pub message_content: Option<String>,
    pub male_message: Option<String>,
    pub female_message: Option<String>,
    #[serde(default)]
    pub use_gender_templates: bool,
    pub attachment: Option<AttachmentInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCampaignResult {
    pub id: Uuid,
    pub status: CampaignStatus,
    pub contacts_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    pub campaign_id: Uuid,
    pub browser_kind: BrowserKind,
    pub timing_mode: TimingMode,
    pub manual_min_delay: Option<u32>,
    pub manual_max_delay: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSettings {
    pub min_delay_s: f64,
    pub max_delay_s: f64,
    pub break_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartResult {
    pub status: CampaignStatus,
    pub timing_mode: TimingMode,
    pub settings: ResolvedSettings,
    pub pending_contacts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PauseRequest {
    pub campaign_id: Uuid,
    pub current_progress: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PauseResult {
    pub status: CampaignStatus,
    pub current_progress: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeRequest {
    pub campaign_id: Uuid,
    pub browser_kind: BrowserKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeResult {
    pub status: CampaignStatus,
    pub remaining: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopRequest {
    pub campaign_id: Uuid,
    pub current_progress: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopResult {
    pub status: CampaignStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForceCloseAllResult {
    pub processes_killed: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressResult {
    pub campaign_id: Uuid,
    pub status: CampaignStatus,
    pub total: u32,
    pub processed: u32,
    pub sent: u32,
    pub delivered: u32,
    pub failed: u32,
    pub success_rate: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub error_count: u32,
    pub by_status: Vec<(WorkflowStatus, u32)>,
    pub is_on_break: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowEntryView {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub status: WorkflowStatus,
    pub added_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowListResult {
    pub entries: Vec<WorkflowEntryView>,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummaryResult {
    pub counts: Vec<(WorkflowStatus, u32)>,
}

/// Error shape for the external boundary (§6's "Errors" column, collapsed
/// into one enum since this crate has no HTTP status codes of its own).
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("template invalid")]
    TemplateInvalid {
        variables_found: Vec<String>,
        validation_errors: Vec<String>,
    },
    #[error("internal: {0}")]
    Internal(String),
}

impl From<campaign_core::CoreError> for ApiError {
    fn from(e: campaign_core::CoreError) -> Self {
        match e {
            campaign_core::CoreError::NotFound(m) => ApiError::NotFound(m),
            campaign_core::CoreError::InvalidState(m) => ApiError::Conflict(m),
            campaign_core::CoreError::TemplateInvalid {
                variables_found,
                validation_errors,
            } => ApiError::TemplateInvalid {
                variables_found,
                validation_errors,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}
