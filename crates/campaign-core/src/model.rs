// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! The durable data model: [`Campaign`], [`WorkflowEntry`], [`Contact`] and
//! [`SentPhoneRecord`]. Identifiers are opaque `Uuid`s; a `Campaign`
//! exclusively owns its `WorkflowEntry` set and cascades on delete (enforced
//! by the store, not by this crate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Campaign lifecycle status.
///
/// Transitions: `New/Pending → Running → {Paused ↔ Running} →
/// {Stopped | Completed}`. `Stopped` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    New,
    Pending,
    Running,
    Paused,
    Stopped,
    Completed,
}

impl CampaignStatus {
    /// Terminal statuses never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignStatus::Stopped | CampaignStatus::Completed)
    }

    /// `true` while the status is one of the two "alive between Start and
    /// completion" states (invariant 3 in the testable properties).
    pub fn is_active(self) -> bool {
        matches!(self, CampaignStatus::Running | CampaignStatus::Paused)
    }
}

/// Which pacing rule tier the executor resolves its delay from: `Auto`
/// consults the rule tables (per-plan / global default / hard-coded
/// fallback), `Manual` uses a caller-supplied `{min_delay, max_delay}` pair
/// (defaulting to 30s/60s, and never allowing `min_delay < 20`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingMode {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

/// Duplicate-prevention policy selected on the campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePreventionMode {
    /// Reject phones already `Sent` within this campaign.
    PerCampaign,
    /// Reject phones present in `SentPhoneRecord` for the owner, across all
    /// of that owner's campaigns.
    #[default]
    PersistentPerUser,
    Off,
}

/// A unit of work: a message (possibly gender-split, possibly with one
/// attachment) to be delivered to a set of contacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: CampaignStatus,

    pub total_contacts: u32,
    pub messages_sent: u32,
    pub messages_delivered: u32,
    pub messages_failed: u32,
    pub current_progress: u32,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    pub message_content: Option<String>,
    pub male_content: Option<String>,
    pub female_content: Option<String>,
    pub use_gender_templates: bool,

    /// At most one attachment per campaign (§3); cloned per recipient at
    /// render time via [`Attachment::clone_for_recipient`], with the
    /// rendered text as the first recipient's caption.
    pub attachment: Option<Attachment>,

    pub duplicate_prevention_mode: DuplicatePreventionMode,

    pub last_error: Option<String>,
    pub error_count: u32,
}

impl Campaign {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            description: None,
            status: CampaignStatus::New,
            total_contacts: 0,
            messages_sent: 0,
            messages_delivered: 0,
            messages_failed: 0,
            current_progress: 0,
            created_at: now,
            started_at: None,
            paused_at: None,
            stopped_at: None,
            completed_at: None,
            updated_at: now,
            message_content: None,
            male_content: None,
            female_content: None,
            use_gender_templates: false,
            attachment: None,
            duplicate_prevention_mode: DuplicatePreventionMode::default(),
            last_error: None,
            error_count: 0,
        }
    }

    /// Invariant: `messages_sent + messages_failed ≤ total_contacts`.
    pub fn counters_within_bounds(&self) -> bool {
        self.messages_sent + self.messages_failed <= self.total_contacts
    }

    pub fn can_start(&self) -> bool {
        !matches!(
            self.status,
            CampaignStatus::Running | CampaignStatus::Stopped | CampaignStatus::Completed
        )
    }

    pub fn can_pause(&self) -> bool {
        self.status == CampaignStatus::Running
    }

    pub fn can_resume(&self) -> bool {
        self.status == CampaignStatus::Paused
    }

    /// `Stop` is valid from any non-terminal status.
    pub fn can_stop(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Per-recipient workflow status.
///
/// Transitions: `New/Pending → Processing → {Sent | Failed}`;
/// `Sent → {Delivered | Bounced}`; `Delivered → {Opened → Clicked}?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    New,
    Pending,
    Processing,
    Sent,
    Delivered,
    Failed,
    Bounced,
    Opened,
    Clicked,
}

impl WorkflowStatus {
    /// Entries in these statuses are eligible for [`crate::pacing`]-driven
    /// dispatch (§4.2 step 2's "eligible entries").
    pub fn is_dispatchable(self) -> bool {
        matches!(self, WorkflowStatus::New | WorkflowStatus::Pending)
    }

    pub fn is_terminal_outcome(self) -> bool {
        matches!(
            self,
            WorkflowStatus::Sent
                | WorkflowStatus::Delivered
                | WorkflowStatus::Failed
                | WorkflowStatus::Bounced
                | WorkflowStatus::Opened
                | WorkflowStatus::Clicked
        )
    }
}

/// Coarse attachment type, independent of exact MIME subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Video,
    Document,
    Other,
}

impl AttachmentKind {
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            AttachmentKind::Image
        } else if content_type.starts_with("video/") {
            AttachmentKind::Video
        } else if content_type == "application/pdf" || content_type.starts_with("application/") {
            AttachmentKind::Document
        } else {
            AttachmentKind::Other
        }
    }
}

/// An attachment blob snapshotted into a workflow entry at render time (§3).
/// The first attachment in a send carries the rendered caption; subsequent
/// attachments (for multi-attachment sends) carry an empty caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub kind: AttachmentKind,
    /// Base64-encoded blob, cloned per recipient.
    pub data_base64: String,
    pub caption: String,
}

impl Attachment {
    /// Clone this attachment for a new recipient, applying the "first
    /// attachment carries the caption, the rest are blank" rule.
    pub fn clone_for_recipient(&self, caption: String, is_first: bool) -> Self {
        Self {
            filename: self.filename.clone(),
            content_type: self.content_type.clone(),
            size_bytes: self.size_bytes,
            kind: self.kind,
            data_base64: self.data_base64.clone(),
            caption: if is_first { caption } else { String::new() },
        }
    }
}

/// One `(campaign, contact)` slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub contact_id: Uuid,
    pub status: WorkflowStatus,

    pub added_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,

    pub retry_count: u32,
    pub error_message: Option<String>,

    /// Rendered payload snapshot, isolating the entry from later template
    /// edits (§3).
    pub male_message: Option<String>,
    pub female_message: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl WorkflowEntry {
    pub fn new(campaign_id: Uuid, contact_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            contact_id,
            status: WorkflowStatus::New,
            added_at: Utc::now(),
            processed_at: None,
            delivered_at: None,
            opened_at: None,
            clicked_at: None,
            retry_count: 0,
            error_message: None,
            male_message: None,
            female_message: None,
            attachments: Vec::new(),
        }
    }
}

/// Gender as recorded on the contact; `Unknown` routes to the
/// gender-agnostic `message_content` template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

/// Referenced, not owned by the core — ingestion and administration of
/// contacts is out of scope (§1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub first_name: String,
    pub arabic_name: Option<String>,
    pub english_name: Option<String>,
    pub formatted_phone: String,
    pub gender: Gender,
    pub is_selected: bool,
    pub status: WorkflowStatus,
}

/// Per-user phone-deduplication ledger (§3, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentPhoneRecord {
    pub owner_id: Uuid,
    pub phone: String,
    pub first_sent_at: DateTime<Utc>,
    pub last_sent_at: DateTime<Utc>,
    pub send_count: u32,
    pub last_campaign_id: Option<Uuid>,
    pub last_status: WorkflowStatus,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_campaign_starts_in_new_status() {
        let c = Campaign::new(Uuid::new_v4(), "spring promo");
        assert_eq!(c.status, CampaignStatus::New);
        assert!(c.can_start());
        assert!(!c.can_pause());
        assert!(!c.can_resume());
    }

    #[test]
    fn running_campaign_cannot_start_again() {
        let mut c = Campaign::new(Uuid::new_v4(), "x");
        c.status = CampaignStatus::Running;
        assert!(!c.can_start());
        assert!(c.can_pause());
        assert!(c.can_stop());
    }

    #[test]
    fn stopped_campaign_is_terminal_and_rejects_everything() {
        let mut c = Campaign::new(Uuid::new_v4(), "x");
        c.status = CampaignStatus::Stopped;
        assert!(c.status.is_terminal());
        assert!(!c.can_start());
        assert!(!c.can_pause());
        assert!(!c.can_resume());
        assert!(!c.can_stop());
    }

    #[test]
    fn counters_within_bounds_detects_violation() {
        let mut c = Campaign::new(Uuid::new_v4(), "x");
        c.total_contacts = 3;
        c.messages_sent = 2;
        c.messages_failed = 2;
        assert!(!c.counters_within_bounds());
    }

    #[test]
    fn workflow_status_dispatchable_set() {
        assert!(WorkflowStatus::New.is_dispatchable());
        assert!(WorkflowStatus::Pending.is_dispatchable());
        assert!(!WorkflowStatus::Processing.is_dispatchable());
        assert!(!WorkflowStatus::Sent.is_dispatchable());
    }

    #[test]
    fn attachment_kind_from_content_type() {
        assert_eq!(AttachmentKind::from_content_type("image/png"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from_content_type("video/mp4"), AttachmentKind::Video);
        assert_eq!(AttachmentKind::from_content_type("application/pdf"), AttachmentKind::Document);
        assert_eq!(AttachmentKind::from_content_type("text/plain"), AttachmentKind::Other);
    }

    #[test]
    fn clone_for_recipient_blanks_caption_after_first() {
        let a = Attachment {
            filename: "f.png".into(),
            content_type: "image/png".into(),
            size_bytes: 10,
            kind: AttachmentKind::Image,
            data_base64: "AAAA".into(),
            caption: String::new(),
        };
        let first = a.clone_for_recipient("hello".into(), true);
        let second = a.clone_for_recipient("hello".into(), false);
        assert_eq!(first.caption, "hello");
        assert_eq!(second.caption, "");
    }
}
