// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Per-user browser session lifecycle (§4.5). At most one live session per
//! `owner_id`; a second campaign for the same user reuses it. `ForceClose`
//! must work even when the underlying driver is hung, so it escalates
//! through three tiers rather than trusting a single polite request.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use campaign_core::BrowserKind;
use chrono::{DateTime, Utc};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Bounded wait for tier 1's polite shutdown request.
const GRACEFUL_TIMEOUT: Duration = Duration::from_millis(300);
/// Bounded wait after SIGTERM before escalating to SIGKILL.
const SIGTERM_TIMEOUT: Duration = Duration::from_millis(500);

/// One live browser session. The driver and app processes are tracked so
/// `ForceClose` can kill both, not just the top-level handle.
pub struct SessionHandle {
    pub owner_id: Uuid,
    pub kind: BrowserKind,
    pub created_at: DateTime<Utc>,
    logged_in: AtomicBool,
    processes: Mutex<Vec<Child>>,
    /// Serializes Messenger calls for this owner (§5: "the session
    /// serializes Messenger calls (one send at a time per user)").
    send_lock: Mutex<()>,
}

impl SessionHandle {
    async fn spawn(owner_id: Uuid, kind: BrowserKind) -> std::io::Result<Self> {
        // Stand-ins for the driver process and the browser app process a
        // real implementation would launch; `sleep` gives us something with
        // real PIDs to escalate signals against.
        let driver = Command::new("sleep").arg("3600").kill_on_drop(true).spawn()?;
        let app = Command::new("sleep").arg("3600").kill_on_drop(true).spawn()?;
        Ok(Self {
            owner_id,
            kind,
            created_at: Utc::now(),
            logged_in: AtomicBool::new(false),
            processes: Mutex::new(vec![driver, app]),
            send_lock: Mutex::new(()),
        })
    }

    /// Hold for the duration of one Messenger call. Executors for the same
    /// owner contend on this; it is the only rendezvous point across
    /// campaigns belonging to one user (§5).
    pub async fn send_permit(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.send_lock.lock().await
    }

    pub fn mark_logged_in(&self, value: bool) {
        self.logged_in.store(value, Ordering::SeqCst);
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    async fn pids(&self) -> Vec<u32> {
        self.processes.lock().await.iter().filter_map(|c| c.id()).collect()
    }

    async fn all_exited(&self) -> bool {
        let mut procs = self.processes.lock().await;
        for child in procs.iter_mut() {
            if child.try_wait().ok().flatten().is_none() {
                return false;
            }
        }
        true
    }

    fn signal_all(pids: &[u32], sig: libc::c_int) {
        for &pid in pids {
            unsafe {
                libc::kill(pid as libc::pid_t, sig);
            }
        }
    }

    /// Escalating close. Returns the number of processes still alive *after*
    /// the attempt exhausted all three tiers (ideally zero).
    async fn force_close(&self) -> (&'static str, usize) {
        if self.all_exited().await {
            return ("already-closed", 0);
        }

        // Tier 1: give the driver a chance to have already honored a polite
        // shutdown request (a real driver would be asked over its control
        // channel before we get here).
        tokio::time::sleep(GRACEFUL_TIMEOUT).await;
        if self.all_exited().await {
            return ("graceful", 0);
        }

        // Tier 2: SIGTERM the driver and app processes for this owner.
        let pids = self.pids().await;
        debug!(pids = ?pids, "force_close: escalating to SIGTERM");
        Self::signal_all(&pids, libc::SIGTERM);
        tokio::time::sleep(SIGTERM_TIMEOUT).await;
        if self.all_exited().await {
            return ("sigterm", 0);
        }

        // Tier 3: SIGKILL whatever is left.
        let remaining = self.pids().await;
        warn!(pids = ?remaining, "force_close: escalating to SIGKILL");
        Self::signal_all(&remaining, libc::SIGKILL);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let still_alive = if self.all_exited().await { 0 } else { remaining.len() };
        ("sigkill", still_alive)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForceCloseReport {
    pub tier: &'static str,
    pub terminated: usize,
    pub still_alive: usize,
}

/// Registry of live sessions, one per `owner_id`.
pub struct BrowserSessionManager {
    sessions: Mutex<HashMap<Uuid, Arc<SessionHandle>>>,
}

impl Default for BrowserSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserSessionManager {
    pub fn new() -> Self {
        Self { sessions: Mutex::new(HashMap::new()) }
    }

    /// Idempotent: returns the existing session if its kind matches; closes
    /// and recreates it otherwise.
    pub async fn acquire(&self, owner_id: Uuid, kind: BrowserKind) -> std::io::Result<Arc<SessionHandle>> {
        let existing = { self.sessions.lock().await.get(&owner_id).cloned() };
        if let Some(session) = existing {
            if session.kind == kind {
                return Ok(session);
            }
            info!(owner_id = %owner_id, "acquire: incompatible browser kind, recreating session");
            self.force_close(owner_id).await;
        }
        let session = Arc::new(SessionHandle::spawn(owner_id, kind).await?);
        self.sessions.lock().await.insert(owner_id, session.clone());
        Ok(session)
    }

    pub async fn get(&self, owner_id: Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.lock().await.get(&owner_id).cloned()
    }

    /// Graceful shutdown: same escalation path as `force_close`, since in
    /// this substitute driver there is no separate polite-quit channel to
    /// distinguish it from tier 1 of force-close.
    pub async fn release(&self, owner_id: Uuid) {
        self.force_close(owner_id).await;
    }

    pub async fn force_close(&self, owner_id: Uuid) -> ForceCloseReport {
        let session = { self.sessions.lock().await.remove(&owner_id) };
        match session {
            None => ForceCloseReport { tier: "no-session", terminated: 0, still_alive: 0 },
            Some(session) => {
                let (tier, still_alive) = session.force_close().await;
                ForceCloseReport { tier, terminated: 2_usize.saturating_sub(still_alive), still_alive }
            }
        }
    }

    /// Closes every live session. Used by the Control Plane's process-wide
    /// `ForceCloseAll` (§4.8), which requires an authenticated caller — that
    /// check lives at the control-plane boundary, not here.
    pub async fn force_close_all(&self) -> Vec<(Uuid, ForceCloseReport)> {
        let owners: Vec<Uuid> = self.sessions.lock().await.keys().copied().collect();
        let mut reports = Vec::with_capacity(owners.len());
        for owner_id in owners {
            reports.push((owner_id, self.force_close(owner_id).await));
        }
        reports
    }

    pub async fn is_logged_in(&self, owner_id: Uuid) -> bool {
        match self.get(owner_id).await {
            Some(session) => session.is_logged_in(),
            None => false,
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_is_idempotent_for_same_kind() {
        let mgr = BrowserSessionManager::new();
        let owner = Uuid::new_v4();
        let s1 = mgr.acquire(owner, BrowserKind::Chrome).await.unwrap();
        let s2 = mgr.acquire(owner, BrowserKind::Chrome).await.unwrap();
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[tokio::test]
    async fn acquire_with_different_kind_recreates_session() {
        let mgr = BrowserSessionManager::new();
        let owner = Uuid::new_v4();
        let s1 = mgr.acquire(owner, BrowserKind::Chrome).await.unwrap();
        let s2 = mgr.acquire(owner, BrowserKind::Firefox).await.unwrap();
        assert!(!Arc::ptr_eq(&s1, &s2));
        assert_eq!(s2.kind, BrowserKind::Firefox);
    }

    #[tokio::test]
    async fn force_close_terminates_tracked_processes() {
        let mgr = BrowserSessionManager::new();
        let owner = Uuid::new_v4();
        mgr.acquire(owner, BrowserKind::Chrome).await.unwrap();
        let report = mgr.force_close(owner).await;
        assert_eq!(report.still_alive, 0);
        assert!(mgr.get(owner).await.is_none());
    }

    #[tokio::test]
    async fn force_close_on_unknown_owner_reports_no_session() {
        let mgr = BrowserSessionManager::new();
        let report = mgr.force_close(Uuid::new_v4()).await;
        assert_eq!(report.tier, "no-session");
    }

    #[tokio::test]
    async fn force_close_all_closes_every_session() {
        let mgr = BrowserSessionManager::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        mgr.acquire(a, BrowserKind::Chrome).await.unwrap();
        mgr.acquire(b, BrowserKind::Firefox).await.unwrap();
        let reports = mgr.force_close_all().await;
        assert_eq!(reports.len(), 2);
        assert!(mgr.get(a).await.is_none());
        assert!(mgr.get(b).await.is_none());
    }

    #[tokio::test]
    async fn is_logged_in_reflects_marked_state() {
        let mgr = BrowserSessionManager::new();
        let owner = Uuid::new_v4();
        let session = mgr.acquire(owner, BrowserKind::Chrome).await.unwrap();
        assert!(!mgr.is_logged_in(owner).await);
        session.mark_logged_in(true);
        assert!(mgr.is_logged_in(owner).await);
    }
}
