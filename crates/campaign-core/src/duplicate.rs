// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Duplicate Guard policy (§4.4): pure decision logic over facts the store
//! supplies. The store owns the `SentPhoneRecord` table and per-campaign
//! `Sent` lookups; this module only decides `allow`/`deny` given those facts,
//! so the policy itself has no storage dependency and is trivial to test.

use crate::model::DuplicatePreventionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateDecision {
    Allow,
    Deny,
}

/// Decide whether a send to `phone` should proceed.
///
/// - `mode = Off`: always allow.
/// - `mode = PerCampaign`: deny when `already_sent_in_campaign` is true.
/// - `mode = PersistentPerUser`: deny when a `SentPhoneRecord` exists for the
///   owner (`has_persistent_record`), regardless of campaign.
pub fn check(
    mode: DuplicatePreventionMode,
    already_sent_in_campaign: bool,
    has_persistent_record: bool,
) -> DuplicateDecision {
    let deny = match mode {
        DuplicatePreventionMode::Off => false,
        DuplicatePreventionMode::PerCampaign => already_sent_in_campaign,
        DuplicatePreventionMode::PersistentPerUser => has_persistent_record,
    };
    if deny {
        DuplicateDecision::Deny
    } else {
        DuplicateDecision::Allow
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_mode_always_allows() {
        assert_eq!(check(DuplicatePreventionMode::Off, true, true), DuplicateDecision::Allow);
    }

    #[test]
    fn per_campaign_denies_only_within_same_campaign_history() {
        assert_eq!(
            check(DuplicatePreventionMode::PerCampaign, true, false),
            DuplicateDecision::Deny
        );
        assert_eq!(
            check(DuplicatePreventionMode::PerCampaign, false, true),
            DuplicateDecision::Allow
        );
    }

    #[test]
    fn persistent_per_user_denies_on_any_past_send() {
        assert_eq!(
            check(DuplicatePreventionMode::PersistentPerUser, false, true),
            DuplicateDecision::Deny
        );
        assert_eq!(
            check(DuplicatePreventionMode::PersistentPerUser, false, false),
            DuplicateDecision::Allow
        );
    }
}
