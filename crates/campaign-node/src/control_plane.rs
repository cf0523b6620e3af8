// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! The Control Plane (§4.8): the single process-wide registry mapping
//! `campaign_id → ExecutorHandle` and the only place §6's external interface
//! operations are actually implemented. Everything here is orchestration —
//! the state machine itself lives in [`campaign_store::WorkflowStore`], the
//! work loop in [`campaign_runtime::Executor`].
//!
//! Two synchronous CAS writes are deliberately done here rather than left to
//! the executor: `Pause` and `Stop` flip the campaign row before signalling
//! the executor, so a caller that gets back `PauseResult{status: Paused}`
//! can trust the row already reflects it (§5: "the campaign row is marked
//! Paused synchronously"). The executor's own pause/stop handling then finds
//! the row already transitioned and treats the resulting `InvalidState` as a
//! no-op, not a failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use campaign_config::{AdvancedUserOverrides, Config};
use campaign_core::{resolve_pacing, validate_template, Campaign, CampaignStatus, ResolvedPacing, TimingMode};
use campaign_messenger::{BrowserSessionManager, Messenger, DEFAULT_SEND_TIMEOUT};
use campaign_runtime::{snapshot, BreakState, Executor, ExecutorHandle};
use campaign_store::WorkflowStore;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::external::{
    ApiError, CreateCampaignRequest, CreateCampaignResult, ForceCloseAllResult, PauseRequest,
    PauseResult, ProgressResult, ResolvedSettings, ResumeRequest, ResumeResult, StartRequest,
    StartResult, StopRequest, StopResult, WorkflowEntryView, WorkflowListResult,
    WorkflowSummaryResult,
};

/// Bound on how long `stop()` waits for an executor to drain before giving
/// up on the join and returning anyway — the store row is authoritative
/// either way, this only affects how long the caller blocks.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(DEFAULT_SEND_TIMEOUT.as_secs() + 10);

struct RegistryEntry {
    handle: ExecutorHandle,
    join: JoinHandle<()>,
}

/// Possession token proving a caller authenticated as an admin, required by
/// [`ControlPlane::force_close_all`]. Zero-sized and only constructible via
/// [`ControlPlane::authenticate_admin`] — there is no bypass from outside
/// this crate.
pub struct AdminToken(());

/// The registry and orchestration surface of §4.8. One instance is shared
/// (behind an `Arc`) by every caller of the external interface — the CLI
/// binary owns exactly one.
pub struct ControlPlane {
    store: Arc<dyn WorkflowStore>,
    messenger: Arc<dyn Messenger>,
    sessions: Arc<BrowserSessionManager>,
    config: Arc<Config>,
    admin_token: Option<String>,
    advanced_overrides: Mutex<HashMap<Uuid, AdvancedUserOverrides>>,
    registry: Mutex<HashMap<Uuid, RegistryEntry>>,
}

impl ControlPlane {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        messenger: Arc<dyn Messenger>,
        sessions: Arc<BrowserSessionManager>,
        config: Arc<Config>,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            store,
            messenger,
            sessions,
            config,
            admin_token,
            advanced_overrides: Mutex::new(HashMap::new()),
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Install (or replace) the advanced per-user pacing overrides consulted
    /// by [`Self::start`]/[`Self::resume`]'s pacing resolution (§4.1's
    /// user-advanced tier). There is no per-plan tier modeled here — plans
    /// are outside this crate's data model — so that tier always resolves
    /// to `None`.
    pub async fn set_advanced_overrides(&self, owner_id: Uuid, overrides: AdvancedUserOverrides) {
        self.advanced_overrides.lock().await.insert(owner_id, overrides);
    }

    pub fn authenticate_admin(&self, token: &str) -> Result<AdminToken, ApiError> {
        match &self.admin_token {
            Some(expected) if expected == token => Ok(AdminToken(())),
            _ => Err(ApiError::Unauthorized),
        }
    }

    async fn resolve_pacing_for(
        &self,
        campaign: &Campaign,
        mode: TimingMode,
        manual_overrides: Option<(u32, u32)>,
    ) -> ResolvedPacing {
        let advanced = self.advanced_overrides.lock().await.get(&campaign.owner_id).cloned();
        resolve_pacing(mode, manual_overrides, advanced.as_ref(), None, &self.config.pacing)
    }

    // ── Create ───────────────────────────────────────────────────────────

    pub async fn create_campaign(&self, req: CreateCampaignRequest) -> Result<CreateCampaignResult, ApiError> {
        if req.contact_ids.is_empty() {
            return Err(ApiError::BadRequest("no contacts selected".into()));
        }

        let mut campaign = Campaign::new(req.owner_id, req.name.unwrap_or_else(|| "untitled campaign".into()));
        campaign.message_content = req.message_content;
        campaign.male_content = req.male_message;
        campaign.female_content = req.female_message;
        campaign.use_gender_templates = req.use_gender_templates;
        campaign.attachment = req.attachment.map(|a| a.into_attachment());
        let id = campaign.id;
        let created_at = campaign.created_at;

        self.store.create_campaign(campaign).await?;
        let contacts_count = self.store.link_contacts(id, &req.contact_ids).await?;
        if contacts_count == 0 {
            return Err(ApiError::BadRequest("none of the supplied contact ids are known to the store".into()));
        }

        Ok(CreateCampaignResult { id, status: CampaignStatus::New, contacts_count, created_at })
    }

    // ── Start ────────────────────────────────────────────────────────────

    /// §6 Start: rejects if an executor is already live for this campaign,
    /// if the campaign's status isn't startable, or if the message template
    /// references a variable that cannot be resolved for the sampled
    /// contacts. All three checks happen synchronously, before an executor
    /// is ever spawned.
    pub async fn start(&self, req: StartRequest) -> Result<StartResult, ApiError> {
        let already_live = {
            let registry = self.registry.lock().await;
            registry.get(&req.campaign_id).map(|e| !e.handle.is_stopping()).unwrap_or(false)
        };
        if already_live {
            return Err(ApiError::Conflict("an executor is already running for this campaign".into()));
        }

        let campaign = self.store.load_campaign(req.campaign_id).await?;
        if !matches!(campaign.status, CampaignStatus::New | CampaignStatus::Pending) {
            return Err(ApiError::Conflict(format!("campaign cannot start from {:?}; use resume if paused", campaign.status)));
        }

        let sample = self.sample_contacts(req.campaign_id).await?;
        for template in [
            campaign.message_content.as_deref(),
            campaign.male_content.as_deref(),
            campaign.female_content.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            validate_template(template, &sample)?;
        }

        let manual_overrides = match req.timing_mode {
            TimingMode::Manual => Some((
                req.manual_min_delay.unwrap_or(self.config.manual.min_delay_s),
                req.manual_max_delay.unwrap_or(self.config.manual.max_delay_s),
            )),
            TimingMode::Auto => None,
        };
        let resolved = self.resolve_pacing_for(&campaign, req.timing_mode, manual_overrides).await;

        let (executor, handle) = Executor::new(
            req.campaign_id,
            campaign.owner_id,
            req.browser_kind,
            self.store.clone(),
            self.messenger.clone(),
            self.sessions.clone(),
            resolved,
        );
        let join = tokio::spawn(executor.run());
        self.registry.lock().await.insert(req.campaign_id, RegistryEntry { handle, join });

        Ok(StartResult {
            status: CampaignStatus::Running,
            timing_mode: req.timing_mode,
            settings: ResolvedSettings {
                min_delay_s: resolved.min_delay_s,
                max_delay_s: resolved.max_delay_s,
                break_enabled: resolved.break_enabled,
            },
            pending_contacts: campaign.total_contacts,
        })
    }

    async fn sample_contacts(&self, campaign_id: Uuid) -> Result<Vec<campaign_core::Contact>, ApiError> {
        let entries = self.store.next_pending_batch(campaign_id, 20).await?;
        let mut sample = Vec::with_capacity(entries.len());
        for entry in &entries {
            sample.push(self.store.get_contact(entry.contact_id).await?);
        }
        Ok(sample)
    }

    // ── Pause / Resume ───────────────────────────────────────────────────

    pub async fn pause(&self, req: PauseRequest) -> Result<PauseResult, ApiError> {
        let handle = {
            let registry = self.registry.lock().await;
            registry.get(&req.campaign_id).map(|e| e.handle.clone())
        }
        .ok_or_else(|| ApiError::Conflict("no running executor for this campaign".into()))?;

        if handle.is_stopping() {
            return Err(ApiError::Conflict("campaign is stopping".into()));
        }
        if handle.is_paused() {
            return Err(ApiError::Conflict("campaign is already paused".into()));
        }

        let campaign = self.store.pause_campaign(req.campaign_id, req.current_progress).await?;
        handle.request_pause();
        Ok(PauseResult { status: campaign.status, current_progress: campaign.current_progress })
    }

    /// §6 Resume: if a live (paused) executor is still registered, this just
    /// flips its pause gate. If there is no live entry — the control plane
    /// restarted, or a prior executor crashed and was reaped — a fresh
    /// [`Executor`] is spawned; its own pre-flight recognizes `Paused` and
    /// recovers any orphaned in-flight entry before resuming the batch loop.
    pub async fn resume(&self, req: ResumeRequest) -> Result<ResumeResult, ApiError> {
        let existing = {
            let registry = self.registry.lock().await;
            registry.get(&req.campaign_id).map(|e| e.handle.clone())
        };

        if let Some(handle) = existing {
            if handle.is_stopping() {
                return Err(ApiError::Conflict("campaign is stopping".into()));
            }
            if !handle.is_paused() {
                return Err(ApiError::Conflict("campaign is not paused".into()));
            }
            let campaign = self.store.resume_campaign(req.campaign_id).await?;
            handle.request_resume();
            return Ok(ResumeResult { status: campaign.status, remaining: remaining_of(&campaign) });
        }

        let campaign = self.store.load_campaign(req.campaign_id).await?;
        if campaign.status != CampaignStatus::Paused {
            return Err(ApiError::Conflict(format!("campaign cannot resume from {:?}", campaign.status)));
        }

        let resolved = self.resolve_pacing_for(&campaign, TimingMode::Auto, None).await;
        let (executor, handle) = Executor::new(
            req.campaign_id,
            campaign.owner_id,
            req.browser_kind,
            self.store.clone(),
            self.messenger.clone(),
            self.sessions.clone(),
            resolved,
        );
        let join = tokio::spawn(executor.run());
        self.registry.lock().await.insert(req.campaign_id, RegistryEntry { handle, join });

        Ok(ResumeResult { status: CampaignStatus::Running, remaining: remaining_of(&campaign) })
    }

    // ── Stop ─────────────────────────────────────────────────────────────

    /// §6 Stop: idempotent from any non-terminal status, with or without a
    /// live executor. When an executor is live, its handle is removed from
    /// the registry up front (so a concurrent `Start`/`Resume` can't race a
    /// half-stopped entry) and this call waits — bounded by
    /// [`STOP_JOIN_TIMEOUT`] — for it to drain before reading back the
    /// final row.
    pub async fn stop(&self, req: StopRequest) -> Result<StopResult, ApiError> {
        let entry = { self.registry.lock().await.remove(&req.campaign_id) };
        if let Some(entry) = entry {
            entry.handle.request_stop();
            match tokio::time::timeout(STOP_JOIN_TIMEOUT, entry.join).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!(campaign_id = %req.campaign_id, error = %join_err, "executor task panicked while stopping");
                }
                Err(_) => {
                    warn!(campaign_id = %req.campaign_id, "executor did not drain within the stop timeout");
                }
            }
        }
        let campaign = self.store.stop_campaign(req.campaign_id, req.current_progress).await?;
        Ok(StopResult { status: campaign.status })
    }

    // ── ForceCloseAll ────────────────────────────────────────────────────

    /// §6 ForceCloseAll: requires an authenticated admin caller (enforced by
    /// [`AdminToken`] only being mintable through [`Self::authenticate_admin`]).
    /// Stops every registered executor and force-closes every live browser
    /// session process-wide.
    pub async fn force_close_all(&self, _auth: AdminToken) -> ForceCloseAllResult {
        let handles: Vec<ExecutorHandle> = {
            self.registry.lock().await.values().map(|e| e.handle.clone()).collect()
        };
        for handle in &handles {
            handle.request_stop();
        }
        let reports = self.sessions.force_close_all().await;
        let processes_killed = reports.iter().map(|(_, r)| r.terminated).sum();
        ForceCloseAllResult { processes_killed, timestamp: Utc::now() }
    }

    // ── Health reaping ───────────────────────────────────────────────────

    /// Supplemented feature: periodically sweep the registry for executor
    /// tasks that have finished. A task that finished with `Err` (panicked)
    /// never got to run its own `run()` catch-all, so this forces the
    /// campaign to `Stopped` and force-closes its browser session on its
    /// behalf. A task that finished normally is just dropped from the
    /// registry — it already left the store in a terminal state itself.
    /// Returns the number of entries reaped.
    pub async fn reap_dead(&self) -> usize {
        let dead_ids: Vec<Uuid> = {
            let registry = self.registry.lock().await;
            registry.iter().filter(|(_, e)| e.join.is_finished()).map(|(id, _)| *id).collect()
        };

        let mut reaped = 0usize;
        for id in dead_ids {
            let entry = { self.registry.lock().await.remove(&id) };
            let Some(entry) = entry else { continue };
            if let Err(join_err) = entry.join.await {
                warn!(campaign_id = %id, error = %join_err, "executor task panicked, forcing campaign to Stopped");
                let _ = self.store.record_campaign_error(id, "executor task panicked").await;
                let _ = self.store.stop_campaign(id, None).await;
                if let Ok(campaign) = self.store.load_campaign(id).await {
                    self.sessions.force_close(campaign.owner_id).await;
                }
            }
            reaped += 1;
        }
        reaped
    }

    // ── Progress / workflow introspection ────────────────────────────────

    pub async fn progress(&self, campaign_id: Uuid) -> Result<ProgressResult, ApiError> {
        let campaign = self.store.load_campaign(campaign_id).await?;
        let by_status = self.store.workflow_summary(campaign_id).await?;

        let break_state = {
            let registry = self.registry.lock().await;
            registry.get(&campaign_id).map(|e| e.handle.break_status())
        }
        .map(|b| BreakState {
            is_on_break: b.is_on_break,
            break_ends_at: b.break_ends_at,
            messages_since_last_break: b.messages_since_last_break,
            next_break_after_messages: b.next_break_after_messages,
        });

        let snap = snapshot(&campaign, by_status.clone(), break_state);
        Ok(ProgressResult {
            campaign_id: snap.campaign_id,
            status: snap.status,
            total: snap.total,
            processed: snap.processed,
            sent: snap.sent,
            delivered: snap.delivered,
            failed: snap.failed,
            success_rate: snap.success_rate,
            started_at: snap.started_at,
            updated_at: snap.updated_at,
            estimated_completion: snap.estimated_completion,
            last_error: snap.last_error,
            error_count: snap.error_count,
            by_status,
            is_on_break: snap.break_state.map(|b| b.is_on_break).unwrap_or(false),
        })
    }

    pub async fn workflow_list(
        &self,
        campaign_id: Uuid,
        status: Option<campaign_core::WorkflowStatus>,
        offset: usize,
        limit: usize,
    ) -> Result<WorkflowListResult, ApiError> {
        self.store.load_campaign(campaign_id).await?;
        let entries = self.store.workflow_entries(campaign_id, status, offset, limit).await?;
        let entries = entries
            .into_iter()
            .map(|e| WorkflowEntryView {
                id: e.id,
                contact_id: e.contact_id,
                status: e.status,
                added_at: e.added_at,
                processed_at: e.processed_at,
                retry_count: e.retry_count,
                error_message: e.error_message,
            })
            .collect();
        Ok(WorkflowListResult { entries, offset, limit })
    }

    pub async fn workflow_summary(&self, campaign_id: Uuid) -> Result<WorkflowSummaryResult, ApiError> {
        self.store.load_campaign(campaign_id).await?;
        let counts = self.store.workflow_summary(campaign_id).await?;
        Ok(WorkflowSummaryResult { counts })
    }
}

fn remaining_of(campaign: &Campaign) -> u32 {
    campaign.total_contacts.saturating_sub(campaign.messages_sent + campaign.messages_failed)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::{BrowserKind, Gender, WorkflowStatus};
    use campaign_messenger::MockMessenger;
    use campaign_store::InMemoryStore;

    fn control_plane() -> (ControlPlane, Arc<dyn WorkflowStore>) {
        let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryStore::new());
        let messenger: Arc<dyn Messenger> = Arc::new(MockMessenger::instant());
        let sessions = Arc::new(BrowserSessionManager::new());
        let config = Arc::new(Config { pacing: fast_pacing(), ..Config::default() });
        let control = ControlPlane::new(store.clone(), messenger, sessions, config, Some("secret".into()));
        (control, store)
    }

    fn fast_pacing() -> campaign_config::PacingRules {
        campaign_config::PacingRules {
            min_delay_s: 0,
            max_delay_s: 0,
            break_rule: campaign_config::BreakRule { enabled: false, ..Default::default() },
            priority: 0,
        }
    }

    async fn seed_contacts(store: &Arc<dyn WorkflowStore>, owner: Uuid, n: u32) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(n as usize);
        for i in 0..n {
            let contact = campaign_core::Contact {
                id: Uuid::new_v4(),
                owner_id: owner,
                first_name: "Ali".into(),
                arabic_name: None,
                english_name: None,
                formatted_phone: format!("20100{i}"),
                gender: Gender::Unknown,
                is_selected: true,
                status: WorkflowStatus::New,
            };
            ids.push(contact.id);
            store.put_contact(contact).await.unwrap();
        }
        ids
    }

    fn start_req(campaign_id: Uuid) -> StartRequest {
        StartRequest {
            campaign_id,
            browser_kind: BrowserKind::Chrome,
            timing_mode: TimingMode::Auto,
            manual_min_delay: None,
            manual_max_delay: None,
        }
    }

    #[tokio::test]
    async fn create_and_start_runs_to_completion() {
        let (control, store) = control_plane();
        let owner = Uuid::new_v4();
        let contact_ids = seed_contacts(&store, owner, 3).await;

        let created = control
            .create_campaign(CreateCampaignRequest {
                owner_id: owner,
                name: Some("c1".into()),
                contact_ids,
                message_content: Some("Hi {firstName}".into()),
                male_message: None,
                female_message: None,
                use_gender_templates: false,
                attachment: None,
            })
            .await
            .unwrap();
        assert_eq!(created.contacts_count, 3);

        let started = control.start(start_req(created.id)).await.unwrap();
        assert_eq!(started.status, CampaignStatus::Running);
        assert_eq!(started.pending_contacts, 3);

        for _ in 0..100 {
            let progress = control.progress(created.id).await.unwrap();
            if progress.status == CampaignStatus::Completed {
                assert_eq!(progress.sent, 3);
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("campaign never completed");
    }

    #[tokio::test]
    async fn start_twice_while_running_is_a_conflict() {
        let (control, store) = control_plane();
        let owner = Uuid::new_v4();
        let contact_ids = seed_contacts(&store, owner, 2).await;
        let created = control
            .create_campaign(CreateCampaignRequest {
                owner_id: owner,
                name: None,
                contact_ids,
                message_content: Some("Hi {firstName}".into()),
                male_message: None,
                female_message: None,
                use_gender_templates: false,
                attachment: None,
            })
            .await
            .unwrap();

        control.start(start_req(created.id)).await.unwrap();
        let err = control.start(start_req(created.id)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn start_rejects_unresolvable_template_variable() {
        let (control, store) = control_plane();
        let owner = Uuid::new_v4();
        let contact_ids = seed_contacts(&store, owner, 1).await;
        let created = control
            .create_campaign(CreateCampaignRequest {
                owner_id: owner,
                name: None,
                contact_ids,
                message_content: Some("Hi {arabic_name}".into()),
                male_message: None,
                female_message: None,
                use_gender_templates: false,
                attachment: None,
            })
            .await
            .unwrap();

        let err = control.start(start_req(created.id)).await.unwrap_err();
        assert!(matches!(err, ApiError::TemplateInvalid { .. }));
    }

    #[tokio::test]
    async fn pause_then_resume_on_a_live_executor_completes() {
        let (control, store) = control_plane();
        let owner = Uuid::new_v4();
        let contact_ids = seed_contacts(&store, owner, 3).await;
        let created = control
            .create_campaign(CreateCampaignRequest {
                owner_id: owner,
                name: None,
                contact_ids,
                message_content: Some("Hi {firstName}".into()),
                male_message: None,
                female_message: None,
                use_gender_templates: false,
                attachment: None,
            })
            .await
            .unwrap();
        control.start(start_req(created.id)).await.unwrap();

        let paused = control.pause(PauseRequest { campaign_id: created.id, current_progress: None }).await.unwrap();
        assert_eq!(paused.status, CampaignStatus::Paused);
        let campaign = store.load_campaign(created.id).await.unwrap();
        assert_eq!(campaign.status, CampaignStatus::Paused);

        let resumed = control
            .resume(ResumeRequest { campaign_id: created.id, browser_kind: BrowserKind::Chrome })
            .await
            .unwrap();
        assert_eq!(resumed.status, CampaignStatus::Running);

        for _ in 0..100 {
            let progress = control.progress(created.id).await.unwrap();
            if progress.status == CampaignStatus::Completed {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("campaign never completed after resume");
    }

    #[tokio::test]
    async fn resume_recovers_after_simulated_executor_crash() {
        let (control, store) = control_plane();
        let owner = Uuid::new_v4();
        let contact_ids = seed_contacts(&store, owner, 3).await;
        let created = control
            .create_campaign(CreateCampaignRequest {
                owner_id: owner,
                name: None,
                contact_ids,
                message_content: Some("Hi {firstName}".into()),
                male_message: None,
                female_message: None,
                use_gender_templates: false,
                attachment: None,
            })
            .await
            .unwrap();
        control.start(start_req(created.id)).await.unwrap();
        control.pause(PauseRequest { campaign_id: created.id, current_progress: None }).await.unwrap();

        let entry = control.registry.lock().await.remove(&created.id).unwrap();
        entry.join.abort();
        let _ = entry.join.await;

        let resumed = control
            .resume(ResumeRequest { campaign_id: created.id, browser_kind: BrowserKind::Chrome })
            .await
            .unwrap();
        assert_eq!(resumed.status, CampaignStatus::Running);

        for _ in 0..100 {
            let progress = control.progress(created.id).await.unwrap();
            if progress.status == CampaignStatus::Completed {
                let campaign = store.load_campaign(created.id).await.unwrap();
                assert_eq!(campaign.messages_sent + campaign.messages_failed, campaign.total_contacts);
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("campaign never completed after crash recovery");
    }

    #[tokio::test]
    async fn stop_is_idempotent_with_no_live_executor() {
        let (control, store) = control_plane();
        let owner = Uuid::new_v4();
        let contact_ids = seed_contacts(&store, owner, 1).await;
        let created = control
            .create_campaign(CreateCampaignRequest {
                owner_id: owner,
                name: None,
                contact_ids,
                message_content: Some("Hi {firstName}".into()),
                male_message: None,
                female_message: None,
                use_gender_templates: false,
                attachment: None,
            })
            .await
            .unwrap();

        let stopped = control.stop(StopRequest { campaign_id: created.id, current_progress: None }).await.unwrap();
        assert_eq!(stopped.status, CampaignStatus::Stopped);
        let stopped_again = control.stop(StopRequest { campaign_id: created.id, current_progress: None }).await.unwrap();
        assert_eq!(stopped_again.status, CampaignStatus::Stopped);
    }

    #[tokio::test]
    async fn force_close_all_requires_admin_auth() {
        let (control, _store) = control_plane();
        assert!(matches!(control.authenticate_admin("wrong"), Err(ApiError::Unauthorized)));
        let token = control.authenticate_admin("secret").unwrap();
        let result = control.force_close_all(token).await;
        assert_eq!(result.processes_killed, 0);
    }

    #[tokio::test]
    async fn reap_dead_removes_finished_entries() {
        let (control, store) = control_plane();
        let owner = Uuid::new_v4();
        let contact_ids = seed_contacts(&store, owner, 1).await;
        let created = control
            .create_campaign(CreateCampaignRequest {
                owner_id: owner,
                name: None,
                contact_ids,
                message_content: Some("Hi {firstName}".into()),
                male_message: None,
                female_message: None,
                use_gender_templates: false,
                attachment: None,
            })
            .await
            .unwrap();
        control.start(start_req(created.id)).await.unwrap();

        for _ in 0..100 {
            if store.load_campaign(created.id).await.unwrap().status == CampaignStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let reaped = control.reap_dead().await;
        assert_eq!(reaped, 1);
        assert!(control.registry.lock().await.is_empty());
    }
}
