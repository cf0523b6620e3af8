// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: MIT
//!
//! Reporter (§4.9): pure read-side computations over a loaded [`Campaign`]
//! and its workflow summary. Nothing here touches the store directly — the
//! node crate loads the rows and hands them in, which keeps this testable
//! without a store fixture.

use campaign_core::{Campaign, CampaignStatus, WorkflowStatus};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct BreakState {
    pub is_on_break: bool,
    pub break_ends_at: Option<DateTime<Utc>>,
    pub messages_since_last_break: u32,
    pub next_break_after_messages: u32,
}

#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub campaign_id: uuid::Uuid,
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
    pub break_state: Option<BreakState>,
}

/// Assemble a [`ProgressSnapshot`] from a campaign row and its workflow
/// status breakdown. `break_state` is `None` when the executor isn't
/// running (no live break cadence to report).
pub fn snapshot(
    campaign: &Campaign,
    by_status: Vec<(WorkflowStatus, u32)>,
    break_state: Option<BreakState>,
) -> ProgressSnapshot {
    let processed = campaign.messages_sent + campaign.messages_failed;
    let success_rate = if processed == 0 {
        0.0
    } else {
        (campaign.messages_sent as f64 / processed as f64 * 100.0).clamp(0.0, 100.0)
    };
    let estimated_completion = eta(campaign, processed);
    ProgressSnapshot {
        campaign_id: campaign.id,
        status: campaign.status,
        total: campaign.total_contacts,
        processed: processed.min(campaign.total_contacts),
        sent: campaign.messages_sent,
        delivered: campaign.messages_delivered,
        failed: campaign.messages_failed,
        success_rate,
        started_at: campaign.started_at,
        updated_at: campaign.updated_at,
        estimated_completion,
        last_error: campaign.last_error.clone(),
        error_count: campaign.error_count,
        by_status,
        break_state,
    }
}

/// `avg = elapsed / processed`, `eta = avg * remaining`. Defined only while
/// `Running` and `processed > 0` (§4.9).
fn eta(campaign: &Campaign, processed: u32) -> Option<DateTime<Utc>> {
    if campaign.status != CampaignStatus::Running || processed == 0 {
        return None;
    }
    let started_at = campaign.started_at?;
    let elapsed = (Utc::now() - started_at).num_milliseconds().max(0) as f64 / 1000.0;
    let avg = elapsed / processed as f64;
    let remaining = campaign.total_contacts.saturating_sub(processed);
    if remaining == 0 {
        return Some(Utc::now());
    }
    let eta_secs = avg * remaining as f64;
    Some(Utc::now() + chrono::Duration::milliseconds((eta_secs * 1000.0) as i64))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
