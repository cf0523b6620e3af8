// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use campaign_core::{Campaign, Contact, CoreError, SentPhoneRecord, WorkflowEntry, WorkflowStatus};
use uuid::Uuid;

/// The outcome a finalized send is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Sent,
    Failed,
}

/// The durable store the executor and control plane consume. All CAS
/// operations must be atomic with any counter bumps they imply — the store
/// is expected to support a multi-statement transaction (§4.7).
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn create_campaign(&self, campaign: Campaign) -> Result<(), CoreError>;
    async fn load_campaign(&self, id: Uuid) -> Result<Campaign, CoreError>;
    async fn get_contact(&self, id: Uuid) -> Result<Contact, CoreError>;
    async fn put_contact(&self, contact: Contact) -> Result<(), CoreError>;

    /// Link the selected `Pending` contacts to the campaign, creating one
    /// `WorkflowEntry` per contact, and set `total_contacts`. Only valid
    /// while the campaign is not yet running.
    async fn link_contacts(&self, campaign_id: Uuid, contact_ids: &[Uuid]) -> Result<u32, CoreError>;

    /// CAS `{New,Pending} → Running`. Fails with `InvalidState` if the
    /// campaign is not in a startable status.
    async fn start_campaign(&self, id: Uuid) -> Result<Campaign, CoreError>;
    /// CAS `Running → Paused`. `current_progress` is advisory: applied to the
    /// snapshot only when `Some(n)` with `n > 0`.
    async fn pause_campaign(&self, id: Uuid, current_progress: Option<u32>) -> Result<Campaign, CoreError>;
    /// CAS `Paused → Running`.
    async fn resume_campaign(&self, id: Uuid) -> Result<Campaign, CoreError>;
    /// CAS any non-terminal status `→ Stopped`. Idempotent: stopping an
    /// already-stopped campaign returns the current row rather than erroring.
    async fn stop_campaign(&self, id: Uuid, current_progress: Option<u32>) -> Result<Campaign, CoreError>;
    /// CAS `Running → Completed`, when no eligible entries remain.
    async fn complete_campaign(&self, id: Uuid) -> Result<Campaign, CoreError>;
    /// Record a per-campaign error without changing status (used for
    /// per-entry failures which bump `error_count`/`last_error` but keep the
    /// campaign running).
    async fn record_campaign_error(&self, id: Uuid, message: &str) -> Result<(), CoreError>;

    /// Entries with `status ∈ {New, Pending}` for the campaign, in
    /// `added_at` order, up to `limit`.
    async fn next_pending_batch(&self, campaign_id: Uuid, limit: usize) -> Result<Vec<WorkflowEntry>, CoreError>;
    /// CAS `{New,Pending} → Processing`.
    async fn claim_entry(&self, entry_id: Uuid) -> Result<WorkflowEntry, CoreError>;
    /// Persist the rendered payload snapshot onto a claimed entry.
    async fn store_rendered_payload(
        &self,
        entry_id: Uuid,
        male_message: Option<String>,
        female_message: Option<String>,
        attachments: Vec<campaign_core::Attachment>,
    ) -> Result<(), CoreError>;
    /// CAS `Processing → {Sent|Failed}` and bump the owning campaign's
    /// counters in the same transaction.
    async fn finalize_entry(
        &self,
        entry_id: Uuid,
        outcome: EntryOutcome,
        error: Option<String>,
    ) -> Result<WorkflowEntry, CoreError>;

    /// On resume: any entries left in `Processing` are treated as `Failed`
    /// with `error_message = "interrupted"` and `retry_count += 1`. Returns
    /// the count recovered.
    async fn recover_orphans(&self, campaign_id: Uuid) -> Result<usize, CoreError>;

    async fn workflow_entries(
        &self,
        campaign_id: Uuid,
        status: Option<WorkflowStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<WorkflowEntry>, CoreError>;
    async fn workflow_summary(&self, campaign_id: Uuid) -> Result<Vec<(WorkflowStatus, u32)>, CoreError>;

    // ── Duplicate guard storage (§4.4, §3 SentPhoneRecord) ──────────────────
    async fn has_sent_in_campaign(&self, campaign_id: Uuid, phone: &str) -> Result<bool, CoreError>;
    async fn has_persistent_record(&self, owner_id: Uuid, phone: &str) -> Result<bool, CoreError>;
    async fn record_sent_phone(
        &self,
        owner_id: Uuid,
        phone: &str,
        campaign_id: Uuid,
        status: WorkflowStatus,
    ) -> Result<(), CoreError>;
    async fn forget_sent_phone(&self, owner_id: Uuid, phone: &str) -> Result<(), CoreError>;
    async fn get_sent_phone_record(&self, owner_id: Uuid, phone: &str) -> Result<Option<SentPhoneRecord>, CoreError>;
}
