// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use campaign_core::{
    Attachment, Campaign, CampaignStatus, Contact, CoreError, SentPhoneRecord, WorkflowEntry,
    WorkflowStatus,
};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::traits::{EntryOutcome, WorkflowStore};

struct State {
    campaigns: HashMap<Uuid, Campaign>,
    contacts: HashMap<Uuid, Contact>,
    entries: HashMap<Uuid, WorkflowEntry>,
    /// Entry ids per campaign, kept in `added_at` insertion order.
    entries_by_campaign: HashMap<Uuid, Vec<Uuid>>,
    sent_phones: HashMap<(Uuid, String), SentPhoneRecord>,
}

/// Single-process, mutex-guarded stand-in for the transactional relational
/// store the spec describes (§1 treats real persistence as out of scope).
/// Every public method takes the same lock for its whole body, which is how
/// this substitute gets the same cross-row atomicity a real transaction
/// would provide.
pub struct InMemoryStore {
    state: Mutex<State>,
    /// Test hook: when non-zero, the next N mutating calls fail with
    /// `StoreUnavailable` instead of succeeding, so callers (the executor's
    /// retry-once-then-stop path) can be exercised deterministically.
    fail_countdown: AtomicU32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                campaigns: HashMap::new(),
                contacts: HashMap::new(),
                entries: HashMap::new(),
                entries_by_campaign: HashMap::new(),
                sent_phones: HashMap::new(),
            }),
            fail_countdown: AtomicU32::new(0),
        }
    }

    /// Arrange for the next `n` mutating calls to fail with
    /// `CoreError::StoreUnavailable`. Test-only.
    pub fn inject_failures(&self, n: u32) {
        self.fail_countdown.store(n, Ordering::SeqCst);
    }

    fn maybe_fail(&self) -> Result<(), CoreError> {
        let current = self.fail_countdown.load(Ordering::SeqCst);
        if current > 0 {
            self.fail_countdown.store(current - 1, Ordering::SeqCst);
            return Err(CoreError::StoreUnavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowStore for InMemoryStore {
    async fn create_campaign(&self, campaign: Campaign) -> Result<(), CoreError> {
        self.maybe_fail()?;
        let mut s = self.state.lock().await;
        s.campaigns.insert(campaign.id, campaign);
        Ok(())
    }

    async fn load_campaign(&self, id: Uuid) -> Result<Campaign, CoreError> {
        let s = self.state.lock().await;
        s.campaigns
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))
    }

    async fn get_contact(&self, id: Uuid) -> Result<Contact, CoreError> {
        let s = self.state.lock().await;
        s.contacts
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("contact {id}")))
    }

    async fn put_contact(&self, contact: Contact) -> Result<(), CoreError> {
        let mut s = self.state.lock().await;
        s.contacts.insert(contact.id, contact);
        Ok(())
    }

    async fn link_contacts(&self, campaign_id: Uuid, contact_ids: &[Uuid]) -> Result<u32, CoreError> {
        self.maybe_fail()?;
        let mut s = self.state.lock().await;
        {
            let campaign = s
                .campaigns
                .get(&campaign_id)
                .ok_or_else(|| CoreError::NotFound(format!("campaign {campaign_id}")))?;
            if !campaign.can_start() {
                return Err(CoreError::InvalidState(format!(
                    "campaign {campaign_id} cannot link contacts in status {:?}",
                    campaign.status
                )));
            }
        }
        let mut linked = 0u32;
        for &contact_id in contact_ids {
            if !s.contacts.contains_key(&contact_id) {
                continue;
            }
            let entry = WorkflowEntry::new(campaign_id, contact_id);
            s.entries_by_campaign.entry(campaign_id).or_default().push(entry.id);
            s.entries.insert(entry.id, entry);
            linked += 1;
        }
        if let Some(c) = s.campaigns.get_mut(&campaign_id) {
            c.total_contacts = linked;
            c.updated_at = Utc::now();
        }
        Ok(linked)
    }

    async fn start_campaign(&self, id: Uuid) -> Result<Campaign, CoreError> {
        self.maybe_fail()?;
        let mut s = self.state.lock().await;
        let campaign = s
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))?;
        if !campaign.can_start() {
            return Err(CoreError::InvalidState(format!(
                "campaign {id} cannot start from {:?}",
                campaign.status
            )));
        }
        campaign.status = CampaignStatus::Running;
        campaign.started_at = Some(Utc::now());
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn pause_campaign(&self, id: Uuid, current_progress: Option<u32>) -> Result<Campaign, CoreError> {
        let mut s = self.state.lock().await;
        let campaign = s
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))?;
        if !campaign.can_pause() {
            return Err(CoreError::InvalidState(format!(
                "campaign {id} cannot pause from {:?}",
                campaign.status
            )));
        }
        campaign.status = CampaignStatus::Paused;
        campaign.paused_at = Some(Utc::now());
        // Advisory only: a client-supplied value applies when > 0; the
        // counters (messages_sent + messages_failed) remain authoritative.
        if let Some(p) = current_progress {
            if p > 0 {
                campaign.current_progress = p;
            }
        }
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn resume_campaign(&self, id: Uuid) -> Result<Campaign, CoreError> {
        let mut s = self.state.lock().await;
        let campaign = s
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))?;
        if !campaign.can_resume() {
            return Err(CoreError::InvalidState(format!(
                "campaign {id} cannot resume from {:?}",
                campaign.status
            )));
        }
        campaign.status = CampaignStatus::Running;
        campaign.paused_at = None;
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn stop_campaign(&self, id: Uuid, current_progress: Option<u32>) -> Result<Campaign, CoreError> {
        let mut s = self.state.lock().await;
        let campaign = s
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))?;
        if campaign.status == CampaignStatus::Stopped {
            return Ok(campaign.clone());
        }
        if !campaign.can_stop() {
            return Err(CoreError::InvalidState(format!(
                "campaign {id} cannot stop from {:?}",
                campaign.status
            )));
        }
        campaign.status = CampaignStatus::Stopped;
        campaign.stopped_at = Some(Utc::now());
        if let Some(p) = current_progress {
            if p > 0 {
                campaign.current_progress = p;
            }
        }
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn complete_campaign(&self, id: Uuid) -> Result<Campaign, CoreError> {
        let mut s = self.state.lock().await;
        let campaign = s
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))?;
        if campaign.status != CampaignStatus::Running {
            return Err(CoreError::InvalidState(format!(
                "campaign {id} cannot complete from {:?}",
                campaign.status
            )));
        }
        campaign.status = CampaignStatus::Completed;
        campaign.completed_at = Some(Utc::now());
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn record_campaign_error(&self, id: Uuid, message: &str) -> Result<(), CoreError> {
        let mut s = self.state.lock().await;
        let campaign = s
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("campaign {id}")))?;
        campaign.last_error = Some(message.to_string());
        campaign.error_count += 1;
        campaign.updated_at = Utc::now();
        Ok(())
    }

    async fn next_pending_batch(&self, campaign_id: Uuid, limit: usize) -> Result<Vec<WorkflowEntry>, CoreError> {
        let s = self.state.lock().await;
        let ids = s.entries_by_campaign.get(&campaign_id).cloned().unwrap_or_default();
        let mut out = Vec::new();
        for id in ids {
            if let Some(e) = s.entries.get(&id) {
                if e.status.is_dispatchable() {
                    out.push(e.clone());
                    if out.len() >= limit {
                        break;
                    }
                }
            }
        }
        Ok(out)
    }

    async fn claim_entry(&self, entry_id: Uuid) -> Result<WorkflowEntry, CoreError> {
        self.maybe_fail()?;
        let mut s = self.state.lock().await;
        let entry = s
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| CoreError::NotFound(format!("entry {entry_id}")))?;
        if !entry.status.is_dispatchable() {
            return Err(CoreError::ConcurrencyConflict(entry_id));
        }
        entry.status = WorkflowStatus::Processing;
        entry.processed_at = Some(Utc::now());
        Ok(entry.clone())
    }

    async fn store_rendered_payload(
        &self,
        entry_id: Uuid,
        male_message: Option<String>,
        female_message: Option<String>,
        attachments: Vec<Attachment>,
    ) -> Result<(), CoreError> {
        let mut s = self.state.lock().await;
        let entry = s
            .entries
            .get_mut(&entry_id)
            .ok_or_else(|| CoreError::NotFound(format!("entry {entry_id}")))?;
        entry.male_message = male_message;
        entry.female_message = female_message;
        entry.attachments = attachments;
        Ok(())
    }

    async fn finalize_entry(
        &self,
        entry_id: Uuid,
        outcome: EntryOutcome,
        error: Option<String>,
    ) -> Result<WorkflowEntry, CoreError> {
        self.maybe_fail()?;
        let mut s = self.state.lock().await;
        let campaign_id = {
            let entry = s
                .entries
                .get_mut(&entry_id)
                .ok_or_else(|| CoreError::NotFound(format!("entry {entry_id}")))?;
            if entry.status != WorkflowStatus::Processing {
                return Err(CoreError::ConcurrencyConflict(entry_id));
            }
            match outcome {
                EntryOutcome::Sent => {
                    entry.status = WorkflowStatus::Sent;
                }
                EntryOutcome::Failed => {
                    entry.status = WorkflowStatus::Failed;
                    entry.retry_count += 1;
                    entry.error_message = error.clone();
                }
            }
            entry.campaign_id
        };
        if let Some(c) = s.campaigns.get_mut(&campaign_id) {
            match outcome {
                EntryOutcome::Sent => c.messages_sent += 1,
                EntryOutcome::Failed => c.messages_failed += 1,
            }
            c.current_progress += 1;
            c.updated_at = Utc::now();
        }
        Ok(s.entries.get(&entry_id).cloned().unwrap())
    }

    async fn recover_orphans(&self, campaign_id: Uuid) -> Result<usize, CoreError> {
        let mut s = self.state.lock().await;
        let ids = s.entries_by_campaign.get(&campaign_id).cloned().unwrap_or_default();
        let mut recovered = 0usize;
        for id in ids {
            if let Some(entry) = s.entries.get_mut(&id) {
                if entry.status == WorkflowStatus::Processing {
                    entry.status = WorkflowStatus::Failed;
                    entry.error_message = Some("interrupted".to_string());
                    entry.retry_count += 1;
                    recovered += 1;
                }
            }
        }
        if recovered > 0 {
            if let Some(c) = s.campaigns.get_mut(&campaign_id) {
                c.messages_failed += recovered as u32;
                c.current_progress += recovered as u32;
            }
            debug!(campaign_id = %campaign_id, recovered, "recovered orphaned Processing entries");
        }
        Ok(recovered)
    }

    async fn workflow_entries(
        &self,
        campaign_id: Uuid,
        status: Option<WorkflowStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<WorkflowEntry>, CoreError> {
        let s = self.state.lock().await;
        let ids = s.entries_by_campaign.get(&campaign_id).cloned().unwrap_or_default();
        let filtered: Vec<WorkflowEntry> = ids
            .into_iter()
            .filter_map(|id| s.entries.get(&id).cloned())
            .filter(|e| status.map(|st| st == e.status).unwrap_or(true))
            .collect();
        Ok(filtered.into_iter().skip(offset).take(limit).collect())
    }

    async fn workflow_summary(&self, campaign_id: Uuid) -> Result<Vec<(WorkflowStatus, u32)>, CoreError> {
        let s = self.state.lock().await;
        let ids = s.entries_by_campaign.get(&campaign_id).cloned().unwrap_or_default();
        let mut counts: HashMap<WorkflowStatus, u32> = HashMap::new();
        for id in ids {
            if let Some(e) = s.entries.get(&id) {
                *counts.entry(e.status).or_insert(0) += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn has_sent_in_campaign(&self, campaign_id: Uuid, phone: &str) -> Result<bool, CoreError> {
        let s = self.state.lock().await;
        let ids = s.entries_by_campaign.get(&campaign_id).cloned().unwrap_or_default();
        for id in ids {
            if let Some(e) = s.entries.get(&id) {
                if e.status.is_terminal_outcome() && e.status != WorkflowStatus::Failed && e.status != WorkflowStatus::Bounced {
                    if let Some(contact) = s.contacts.get(&e.contact_id) {
                        if contact.formatted_phone == phone {
                            return Ok(true);
                        }
                    }
                }
            }
        }
        Ok(false)
    }

    async fn has_persistent_record(&self, owner_id: Uuid, phone: &str) -> Result<bool, CoreError> {
        let s = self.state.lock().await;
        Ok(s.sent_phones.contains_key(&(owner_id, phone.to_string())))
    }

    async fn record_sent_phone(
        &self,
        owner_id: Uuid,
        phone: &str,
        campaign_id: Uuid,
        status: WorkflowStatus,
    ) -> Result<(), CoreError> {
        let mut s = self.state.lock().await;
        let now = Utc::now();
        s.sent_phones
            .entry((owner_id, phone.to_string()))
            .and_modify(|r| {
                r.send_count += 1;
                r.last_sent_at = now;
                r.last_campaign_id = Some(campaign_id);
                r.last_status = status;
            })
            .or_insert(SentPhoneRecord {
                owner_id,
                phone: phone.to_string(),
                first_sent_at: now,
                last_sent_at: now,
                send_count: 1,
                last_campaign_id: Some(campaign_id),
                last_status: status,
            });
        Ok(())
    }

    async fn forget_sent_phone(&self, owner_id: Uuid, phone: &str) -> Result<(), CoreError> {
        let mut s = self.state.lock().await;
        s.sent_phones.remove(&(owner_id, phone.to_string()));
        Ok(())
    }

    async fn get_sent_phone_record(&self, owner_id: Uuid, phone: &str) -> Result<Option<SentPhoneRecord>, CoreError> {
        let s = self.state.lock().await;
        Ok(s.sent_phones.get(&(owner_id, phone.to_string())).cloned())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
