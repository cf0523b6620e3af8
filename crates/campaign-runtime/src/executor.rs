// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: MIT
//!
//! The Campaign Executor (§4.2): the supervised per-campaign loop. One of
//! these is spawned per live campaign by the control plane and drains its
//! [`WorkflowEntry`] rows in `added_at` order until natural completion or
//! external `Pause`/`Stop`.
//!
//! Cancellation follows the select-over-`(timer, cancel, pause_release)`
//! pattern the agent's cancellable turn loop uses: both signals are
//! `tokio::sync::watch` channels so a single `Stop`/`Pause` call is visible
//! to whichever `select!` arm is currently parked, without needing a
//! oneshot per suspension point.

use std::sync::Arc;
use std::time::Duration;

use campaign_core::{
    check_duplicate, render, Attachment, CoreError, DuplicateDecision, Gender, PacingEngine,
    ResolvedPacing, WorkflowEntry, WorkflowStatus,
};
use campaign_messenger::{BrowserSessionManager, Messenger};
use campaign_store::{EntryOutcome, WorkflowStore};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use campaign_core::BrowserKind;

/// Point-in-time snapshot of the break cadence, published by the running
/// executor so a control plane can report it without reaching into the
/// executor's own `PacingEngine` (§4.9 "break state").
#[derive(Debug, Clone, Copy)]
pub struct BreakStatus {
    pub is_on_break: bool,
    pub break_ends_at: Option<DateTime<Utc>>,
    pub messages_since_last_break: u32,
    pub next_break_after_messages: u32,
}

impl Default for BreakStatus {
    fn default() -> Self {
        Self {
            is_on_break: false,
            break_ends_at: None,
            messages_since_last_break: 0,
            next_break_after_messages: 0,
        }
    }
}

/// Cheap-to-clone handle the control plane keeps in its registry
/// (`campaign_id → ExecutorHandle{owner_id, cancel, pause_gate, started_at}`,
/// §4.8). All three signal methods are fire-and-forget: a dropped receiver
/// (executor task already exited) is not an error for the caller.
#[derive(Clone)]
pub struct ExecutorHandle {
    pub campaign_id: Uuid,
    pub owner_id: Uuid,
    pub started_at: DateTime<Utc>,
    cancel_tx: watch::Sender<bool>,
    pause_tx: watch::Sender<bool>,
    break_rx: watch::Receiver<BreakStatus>,
}

impl ExecutorHandle {
    pub fn request_pause(&self) {
        let _ = self.pause_tx.send(true);
    }

    pub fn request_resume(&self) {
        let _ = self.pause_tx.send(false);
    }

    pub fn request_stop(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_stopping(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    pub fn is_paused(&self) -> bool {
        *self.pause_tx.borrow()
    }

    pub fn break_status(&self) -> BreakStatus {
        *self.break_rx.borrow()
    }
}

enum SleepOutcome {
    Elapsed,
    Cancelled,
    Paused,
}

/// Sleep for `secs`, checking cancel/pause at least once a second (§5's
/// suspension-point contract, testable property 7: a `Stop` during a sleep
/// must be observed within 1s of the next cooperative check).
async fn interruptible_sleep(secs: f64, cancel_rx: &mut watch::Receiver<bool>, pause_rx: &mut watch::Receiver<bool>) -> SleepOutcome {
    let mut remaining = Duration::from_secs_f64(secs.max(0.0));
    loop {
        if *cancel_rx.borrow() {
            return SleepOutcome::Cancelled;
        }
        if *pause_rx.borrow() {
            return SleepOutcome::Paused;
        }
        let tick = remaining.min(Duration::from_secs(1));
        if tick.is_zero() {
            return SleepOutcome::Elapsed;
        }
        tokio::select! {
            _ = tokio::time::sleep(tick) => {
                remaining -= tick;
                if remaining.is_zero() {
                    return SleepOutcome::Elapsed;
                }
            }
            _ = cancel_rx.changed() => {
                if *cancel_rx.borrow() {
                    return SleepOutcome::Cancelled;
                }
            }
            _ = pause_rx.changed() => {
                if *pause_rx.borrow() {
                    return SleepOutcome::Paused;
                }
            }
        }
    }
}

/// The supervised loop itself. Consumed by [`Executor::run`]; the control
/// plane spawns that future and keeps the paired [`ExecutorHandle`].
pub struct Executor {
    campaign_id: Uuid,
    owner_id: Uuid,
    browser_kind: BrowserKind,
    store: Arc<dyn WorkflowStore>,
    messenger: Arc<dyn Messenger>,
    sessions: Arc<BrowserSessionManager>,
    pacing: PacingEngine<StdRng>,
    render_rng: StdRng,
    cancel_rx: watch::Receiver<bool>,
    pause_rx: watch::Receiver<bool>,
    break_tx: watch::Sender<BreakStatus>,
    session_lost_retried: bool,
}

impl Executor {
    pub fn new(
        campaign_id: Uuid,
        owner_id: Uuid,
        browser_kind: BrowserKind,
        store: Arc<dyn WorkflowStore>,
        messenger: Arc<dyn Messenger>,
        sessions: Arc<BrowserSessionManager>,
        resolved_pacing: ResolvedPacing,
    ) -> (Self, ExecutorHandle) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (pause_tx, pause_rx) = watch::channel(false);
        let (break_tx, break_rx) = watch::channel(BreakStatus {
            next_break_after_messages: resolved_pacing.break_after_min,
            ..BreakStatus::default()
        });

        // Seeded per executor (never from a process-global RNG) so a fleet
        // of concurrent campaigns never produces synchronized delay/break
        // cadences (§4.1).
        let seed_bytes: [u8; 8] = campaign_id.as_bytes()[0..8].try_into().expect("uuid has 16 bytes");
        let seed = u64::from_le_bytes(seed_bytes);
        let pacing = PacingEngine::new(StdRng::seed_from_u64(seed), resolved_pacing);
        let render_rng = StdRng::seed_from_u64(seed ^ 0x9E3779B97F4A7C15);

        let handle = ExecutorHandle {
            campaign_id,
            owner_id,
            started_at: Utc::now(),
            cancel_tx,
            pause_tx,
            break_rx,
        };
        let executor = Self {
            campaign_id,
            owner_id,
            browser_kind,
            store,
            messenger,
            sessions,
            pacing,
            render_rng,
            cancel_rx,
            pause_rx,
            break_tx,
            session_lost_retried: false,
        };
        (executor, handle)
    }

    /// Run a store write with one retry on `StoreUnavailable` (§4.2 failure
    /// semantics: "Store-write failure is retried once with fresh
    /// transaction"). Any other error, or a second `StoreUnavailable`, is
    /// returned as-is for the caller to escalate.
    async fn store_op<T, F, Fut>(&self, f: F) -> Result<T, CoreError>
    where
        F: Fn(Arc<dyn WorkflowStore>) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        match f(self.store.clone()).await {
            Err(CoreError::StoreUnavailable(e)) => {
                warn!(campaign_id = %self.campaign_id, error = %e, "store write failed, retrying once");
                f(self.store.clone()).await
            }
            other => other,
        }
    }

    /// Drive the campaign to completion or termination. Never panics on a
    /// normal failure path — unhandled per-entry errors are contained, and
    /// anything that escapes containment is logged and recorded on the
    /// campaign before returning.
    pub async fn run(mut self) {
        if let Err(e) = self.run_inner().await {
            warn!(campaign_id = %self.campaign_id, error = %e, "executor exited with an unrecovered error");
            let _ = self.store.record_campaign_error(self.campaign_id, &e.to_string()).await;
            let _ = self.store.stop_campaign(self.campaign_id, None).await;
            self.sessions.force_close(self.owner_id).await;
        }
    }

    async fn run_inner(&mut self) -> Result<(), CoreError> {
        self.preflight().await?;

        loop {
            if *self.cancel_rx.borrow() {
                return self.handle_stop().await;
            }
            if *self.pause_rx.borrow() {
                if self.handle_pause().await? {
                    return self.handle_stop().await;
                }
                continue;
            }

            let batch = self.store.next_pending_batch(self.campaign_id, 1).await?;
            let Some(entry) = batch.into_iter().next() else {
                let id = self.campaign_id;
                self.store_op(move |s| async move { s.complete_campaign(id).await }).await?;
                info!(campaign_id = %self.campaign_id, "campaign completed: no eligible entries remain");
                return Ok(());
            };

            self.process_entry(entry).await?;

            match interruptible_sleep(self.pacing.next_delay_s(), &mut self.cancel_rx, &mut self.pause_rx).await {
                SleepOutcome::Cancelled => return self.handle_stop().await,
                SleepOutcome::Paused | SleepOutcome::Elapsed => {}
            }

            self.pacing.record_message_sent();
            let _ = self.break_tx.send(BreakStatus {
                is_on_break: false,
                break_ends_at: None,
                messages_since_last_break: self.pacing.messages_since_last_break(),
                next_break_after_messages: self.pacing.next_break_threshold(),
            });

            if self.pacing.break_due() {
                let remaining = self.store.next_pending_batch(self.campaign_id, 1).await?;
                if !remaining.is_empty() {
                    let break_secs = self.pacing.take_break();
                    let break_ends_at = Utc::now() + chrono::Duration::milliseconds((break_secs * 1000.0) as i64);
                    let _ = self.break_tx.send(BreakStatus {
                        is_on_break: true,
                        break_ends_at: Some(break_ends_at),
                        messages_since_last_break: 0,
                        next_break_after_messages: self.pacing.next_break_threshold(),
                    });
                    info!(campaign_id = %self.campaign_id, break_secs, "break started");
                    let outcome = interruptible_sleep(break_secs, &mut self.cancel_rx, &mut self.pause_rx).await;
                    let _ = self.break_tx.send(BreakStatus {
                        is_on_break: false,
                        break_ends_at: None,
                        messages_since_last_break: 0,
                        next_break_after_messages: self.pacing.next_break_threshold(),
                    });
                    info!(campaign_id = %self.campaign_id, "break ended");
                    if let SleepOutcome::Cancelled = outcome {
                        return self.handle_stop().await;
                    }
                }
            }
        }
    }

    /// Pre-flight (§4.2 step 1): reject an unstartable status, validate
    /// templates against a contact sample, acquire the browser session, and
    /// transition the campaign row. Resuming from `Paused` additionally
    /// recovers any entries orphaned by a prior crash.
    async fn preflight(&self) -> Result<(), CoreError> {
        let campaign = self.store.load_campaign(self.campaign_id).await?;
        if !campaign.can_start() {
            return Err(CoreError::InvalidState(format!(
                "campaign {} cannot start from {:?}",
                self.campaign_id, campaign.status
            )));
        }
        let resuming = campaign.status == campaign_core::CampaignStatus::Paused;

        let sample_entries = self.store.next_pending_batch(self.campaign_id, 20).await?;
        let mut sample = Vec::with_capacity(sample_entries.len());
        for e in &sample_entries {
            sample.push(self.store.get_contact(e.contact_id).await?);
        }
        for template in [
            campaign.message_content.as_deref(),
            campaign.male_content.as_deref(),
            campaign.female_content.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            campaign_core::validate_template(template, &sample)?;
        }

        self.sessions
            .acquire(self.owner_id, self.browser_kind)
            .await
            .map_err(|e| CoreError::SessionLost(e.to_string()))?;

        if resuming {
            let recovered = self.store.recover_orphans(self.campaign_id).await?;
            if recovered > 0 {
                info!(campaign_id = %self.campaign_id, recovered, "recovered orphaned in-flight entries on resume");
            }
            self.store.resume_campaign(self.campaign_id).await?;
        } else {
            self.store.start_campaign(self.campaign_id).await?;
        }
        Ok(())
    }

    /// Process one claimed entry end to end: render, duplicate-check, send,
    /// finalize. Any error that escapes here is a per-campaign escalation —
    /// everything recoverable at the entry level is already handled inside.
    async fn process_entry(&mut self, entry: WorkflowEntry) -> Result<(), CoreError> {
        let entry_id = entry.id;
        let claimed = match self.store_op(move |s| async move { s.claim_entry(entry_id).await }).await {
            Ok(e) => e,
            Err(CoreError::ConcurrencyConflict(id)) => {
                debug!(entry_id = %id, "entry already claimed by another worker, skipping");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let contact = self.store.get_contact(claimed.contact_id).await?;
        let campaign = self.store.load_campaign(self.campaign_id).await?;

        let already_sent = self.store.has_sent_in_campaign(self.campaign_id, &contact.formatted_phone).await?;
        let has_persistent = self.store.has_persistent_record(contact.owner_id, &contact.formatted_phone).await?;
        let decision = check_duplicate(campaign.duplicate_prevention_mode, already_sent, has_persistent);
        if decision == DuplicateDecision::Deny {
            let id = claimed.id;
            self.store_op(move |s| async move {
                s.finalize_entry(id, EntryOutcome::Failed, Some("duplicate phone, rejected by duplicate guard".into())).await
            })
            .await?;
            return Ok(());
        }

        // Gender selection happens before random-choice expansion (inside
        // `render`) so per-recipient variation is uncorrelated across
        // contacts, not just across genders.
        let template = if campaign.use_gender_templates {
            match contact.gender {
                Gender::Male => campaign.male_content.as_deref().or(campaign.message_content.as_deref()),
                Gender::Female => campaign.female_content.as_deref().or(campaign.message_content.as_deref()),
                Gender::Unknown => campaign.message_content.as_deref(),
            }
        } else {
            campaign.message_content.as_deref()
        }
        .unwrap_or_default();

        let rendered = render(template, &contact, &mut self.render_rng);

        // Clone the campaign's single attachment for this recipient; the
        // rendered caption rides on the first (only, in v1) attachment slot
        // (§4.2 step 2).
        let attachments: Vec<Attachment> = campaign
            .attachment
            .as_ref()
            .map(|a| vec![a.clone_for_recipient(rendered.clone(), true)])
            .unwrap_or_default();

        let entry_id = claimed.id;
        let (male_message, female_message) = match contact.gender {
            Gender::Female if campaign.use_gender_templates => (None, Some(rendered.clone())),
            _ => (Some(rendered.clone()), None),
        };
        let stored_attachments = attachments.clone();
        self.store_op(move |s| {
            let male_message = male_message.clone();
            let female_message = female_message.clone();
            let stored_attachments = stored_attachments.clone();
            async move { s.store_rendered_payload(entry_id, male_message, female_message, stored_attachments).await }
        })
        .await?;

        let session = match self.sessions.acquire(self.owner_id, self.browser_kind).await {
            Ok(s) => s,
            Err(e) => {
                let id = claimed.id;
                let msg = format!("session unavailable: {e}");
                self.store_op(move |s| {
                    let msg = msg.clone();
                    async move { s.finalize_entry(id, EntryOutcome::Failed, Some(msg)).await }
                })
                .await?;
                return Ok(());
            }
        };

        let send_result = {
            let _permit = session.send_permit().await;
            self.messenger.send(&contact.formatted_phone, &rendered, &attachments).await
        };

        self.apply_send_result(claimed.id, &contact.formatted_phone, contact.owner_id, send_result).await
    }

    async fn apply_send_result(
        &mut self,
        entry_id: Uuid,
        phone: &str,
        owner_id: Uuid,
        result: Result<campaign_messenger::SendOutcome, CoreError>,
    ) -> Result<(), CoreError> {
        match result {
            Ok(_) => {
                self.store_op(move |s| async move { s.finalize_entry(entry_id, EntryOutcome::Sent, None).await })
                    .await?;
                let phone = phone.to_string();
                self.store_op(move |s| {
                    let phone = phone.clone();
                    async move { s.record_sent_phone(owner_id, &phone, self.campaign_id, WorkflowStatus::Sent).await }
                })
                .await?;
                self.session_lost_retried = false;
                Ok(())
            }
            Err(CoreError::SessionLost(reason)) => {
                if self.session_lost_retried {
                    let reason = reason.clone();
                    self.store_op(move |s| {
                        let reason = reason.clone();
                        async move { s.finalize_entry(entry_id, EntryOutcome::Failed, Some(reason)).await }
                    })
                    .await?;
                    return Ok(());
                }
                self.session_lost_retried = true;
                warn!(campaign_id = %self.campaign_id, "browser session lost mid-send, re-acquiring once");
                self.sessions.force_close(self.owner_id).await;
                match self.sessions.acquire(self.owner_id, self.browser_kind).await {
                    Ok(_) => {
                        let reason = reason.clone();
                        self.store_op(move |s| {
                            let reason = reason.clone();
                            async move { s.finalize_entry(entry_id, EntryOutcome::Failed, Some(reason)).await }
                        })
                        .await?;
                        Ok(())
                    }
                    Err(e) => Err(CoreError::SessionLost(format!("re-acquire failed: {e}"))),
                }
            }
            Err(err) if err.is_per_entry() => {
                if let CoreError::MessengerTransient(ref msg) = err {
                    if msg.contains("timed out") {
                        warn!(campaign_id = %self.campaign_id, "messenger call exceeded its timeout, force-closing browser to unblock");
                        self.sessions.force_close(self.owner_id).await;
                    }
                }
                let msg = err.to_string();
                self.store_op(move |s| {
                    let msg = msg.clone();
                    async move { s.finalize_entry(entry_id, EntryOutcome::Failed, Some(msg)).await }
                })
                .await?;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Returns `true` if a `Stop` arrived while parked waiting out the
    /// pause — the caller must then run the stop path instead of resuming
    /// the batch loop.
    ///
    /// The control plane may already have written `Paused`/`Running`
    /// synchronously when it handled the request (§5: "the campaign row is
    /// marked Paused synchronously"), so a CAS rejected with `InvalidState`
    /// here just means that already happened — not a real failure.
    async fn handle_pause(&mut self) -> Result<bool, CoreError> {
        match self.store.pause_campaign(self.campaign_id, None).await {
            Ok(campaign) => {
                info!(campaign_id = %self.campaign_id, current_progress = campaign.current_progress, "paused");
            }
            Err(CoreError::InvalidState(_)) => {
                debug!(campaign_id = %self.campaign_id, "pause: already applied externally");
            }
            Err(e) => return Err(e),
        }
        loop {
            if *self.cancel_rx.borrow() {
                return Ok(true);
            }
            if !*self.pause_rx.borrow() {
                match self.store.resume_campaign(self.campaign_id).await {
                    Ok(_) => {}
                    Err(CoreError::InvalidState(_)) => {
                        debug!(campaign_id = %self.campaign_id, "resume: already applied externally");
                    }
                    Err(e) => return Err(e),
                }
                info!(campaign_id = %self.campaign_id, "resumed");
                return Ok(false);
            }
            tokio::select! {
                _ = self.cancel_rx.changed() => {}
                _ = self.pause_rx.changed() => {}
            }
        }
    }

    async fn handle_stop(&mut self) -> Result<(), CoreError> {
        self.store.stop_campaign(self.campaign_id, None).await?;
        let report = self.sessions.force_close(self.owner_id).await;
        info!(
            campaign_id = %self.campaign_id, tier = report.tier, still_alive = report.still_alive,
            "stop: browser session force-closed"
        );
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::{Campaign, Contact, DuplicatePreventionMode, TimingMode, WorkflowStatus as WS};
    use campaign_messenger::MockMessenger;
    use campaign_store::InMemoryStore;

    fn resolved(min: f64, max: f64) -> ResolvedPacing {
        ResolvedPacing {
            min_delay_s: min,
            max_delay_s: max,
            strong_randomization: false,
            break_enabled: false,
            break_after_min: 1000,
            break_after_max: 1000,
            break_min_minutes: 0.01,
            break_max_minutes: 0.01,
            break_variance_s: 0.0,
        }
    }

    fn contact(owner: Uuid, phone: &str, gender: Gender) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            owner_id: owner,
            first_name: "Ali".into(),
            arabic_name: None,
            english_name: None,
            formatted_phone: phone.into(),
            gender,
            is_selected: true,
            status: WS::New,
        }
    }

    async fn seeded_campaign(store: &Arc<dyn WorkflowStore>, owner: Uuid, template: &str) -> Uuid {
        let mut campaign = Campaign::new(owner, "c1");
        campaign.message_content = Some(template.to_string());
        campaign.duplicate_prevention_mode = DuplicatePreventionMode::Off;
        let id = campaign.id;
        store.create_campaign(campaign).await.unwrap();
        let c1 = contact(owner, "201001", Gender::Male);
        let c2 = contact(owner, "201002", Gender::Female);
        store.put_contact(c1.clone()).await.unwrap();
        store.put_contact(c2.clone()).await.unwrap();
        store.link_contacts(id, &[c1.id, c2.id]).await.unwrap();
        id
    }

    #[tokio::test]
    async fn happy_path_completes_campaign() {
        let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        let campaign_id = seeded_campaign(&store, owner, "Hello {firstName}!").await;

        let messenger: Arc<dyn Messenger> = Arc::new(MockMessenger::instant());
        let sessions = Arc::new(BrowserSessionManager::new());
        let (executor, handle) = Executor::new(
            campaign_id,
            owner,
            BrowserKind::Chrome,
            store.clone(),
            messenger,
            sessions,
            resolved(0.01, 0.01),
        );
        executor.run().await;

        let campaign = store.load_campaign(campaign_id).await.unwrap();
        assert_eq!(campaign.status, campaign_core::CampaignStatus::Completed);
        assert_eq!(campaign.messages_sent, 2);
        assert!(!handle.is_stopping());
    }

    #[tokio::test]
    async fn stop_request_halts_loop_and_marks_stopped() {
        let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        let campaign_id = seeded_campaign(&store, owner, "Hi {firstName}").await;

        let messenger: Arc<dyn Messenger> = Arc::new(MockMessenger::instant());
        let sessions = Arc::new(BrowserSessionManager::new());
        let (executor, handle) = Executor::new(
            campaign_id,
            owner,
            BrowserKind::Chrome,
            store.clone(),
            messenger,
            sessions,
            resolved(5.0, 5.0),
        );
        let run = tokio::spawn(executor.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.request_stop();
        run.await.unwrap();

        let campaign = store.load_campaign(campaign_id).await.unwrap();
        assert_eq!(campaign.status, campaign_core::CampaignStatus::Stopped);
    }

    #[tokio::test]
    async fn invalid_recipient_fails_entry_but_continues() {
        let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        let campaign_id = seeded_campaign(&store, owner, "Hi {firstName}").await;

        let messenger: Arc<dyn Messenger> = Arc::new(MockMessenger::instant().with_refused(["201001".to_string()]));
        let sessions = Arc::new(BrowserSessionManager::new());
        let (executor, _handle) = Executor::new(
            campaign_id,
            owner,
            BrowserKind::Chrome,
            store.clone(),
            messenger,
            sessions,
            resolved(0.01, 0.01),
        );
        executor.run().await;

        let campaign = store.load_campaign(campaign_id).await.unwrap();
        assert_eq!(campaign.status, campaign_core::CampaignStatus::Completed);
        assert_eq!(campaign.messages_sent, 1);
        assert_eq!(campaign.messages_failed, 1);
    }

    #[tokio::test]
    async fn pause_then_resume_completes_campaign() {
        let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryStore::new());
        let owner = Uuid::new_v4();
        let campaign_id = seeded_campaign(&store, owner, "Hi {firstName}").await;

        let messenger: Arc<dyn Messenger> = Arc::new(MockMessenger::instant());
        let sessions = Arc::new(BrowserSessionManager::new());
        let (executor, handle) = Executor::new(
            campaign_id,
            owner,
            BrowserKind::Chrome,
            store.clone(),
            messenger,
            sessions,
            resolved(0.2, 0.2),
        );
        let run = tokio::spawn(executor.run());
        handle.request_pause();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.request_resume();
        run.await.unwrap();

        let campaign = store.load_campaign(campaign_id).await.unwrap();
        assert_eq!(campaign.status, campaign_core::CampaignStatus::Completed);
    }

    #[test]
    fn timing_mode_is_available_to_callers_resolving_pacing() {
        // Sanity: this crate re-exports what the node crate needs to resolve
        // pacing before constructing an Executor.
        let _ = TimingMode::Auto;
    }
}
