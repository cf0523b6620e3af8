// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

fn default_min_delay_s() -> u32 {
    1
}
fn default_max_delay_s() -> u32 {
    3
}
fn default_after_min() -> u32 {
    8
}
fn default_after_max() -> u32 {
    15
}
fn default_break_min_minutes() -> u32 {
    5
}
fn default_break_max_minutes() -> u32 {
    15
}
fn default_true() -> bool {
    true
}
fn default_manual_min() -> u32 {
    30
}
fn default_manual_max() -> u32 {
    60
}
fn default_decimal_precision() -> u32 {
    1
}

/// Root config document, loaded from layered YAML files (see [`crate::load`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pacing: PacingRules,
    #[serde(default)]
    pub manual: ManualTimingDefaults,
}

/// Global default pacing rules. Per-plan and per-user overrides sit on top of
/// these (see [`AdvancedUserOverrides`]); this is the last tier before the
/// hard-coded fallback described in the pacing engine's rule-selection order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingRules {
    #[serde(default = "default_min_delay_s")]
    pub min_delay_s: u32,
    #[serde(default = "default_max_delay_s")]
    pub max_delay_s: u32,
    #[serde(default)]
    pub break_rule: BreakRule,
    /// Priority used when more than one plan-level rule set could apply.
    /// Higher wins.
    #[serde(default)]
    pub priority: i32,
}

impl Default for PacingRules {
    fn default() -> Self {
        Self {
            min_delay_s: default_min_delay_s(),
            max_delay_s: default_max_delay_s(),
            break_rule: BreakRule::default(),
            priority: 0,
        }
    }
}

/// The periodic "break" cadence: after some randomized number of messages,
/// take a long pause designed to make sending patterns less detectable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakRule {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_after_min")]
    pub after_min_messages: u32,
    #[serde(default = "default_after_max")]
    pub after_max_messages: u32,
    #[serde(default = "default_break_min_minutes")]
    pub min_break_minutes: u32,
    #[serde(default = "default_break_max_minutes")]
    pub max_break_minutes: u32,
    /// Additional uniform jitter, in seconds, layered on top of the break
    /// duration draw (on top of the ±10%..+15% multiplicative jitter).
    #[serde(default)]
    pub variance_s: u32,
}

impl Default for BreakRule {
    fn default() -> Self {
        Self {
            enabled: true,
            after_min_messages: default_after_min(),
            after_max_messages: default_after_max(),
            min_break_minutes: default_break_min_minutes(),
            max_break_minutes: default_break_max_minutes(),
            variance_s: 30,
        }
    }
}

/// Per-user advanced overrides. When present, these win over any per-plan or
/// global rule (see the pacing engine's rule-selection priority).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedUserOverrides {
    pub min_delay_s: Option<u32>,
    pub max_delay_s: Option<u32>,
    pub enable_breaks: Option<bool>,
    pub min_messages_before_break: Option<u32>,
    pub max_messages_before_break: Option<u32>,
    pub min_break_minutes: Option<u32>,
    pub max_break_minutes: Option<u32>,
    /// Use decimal (sub-second) randomization for the micro-variation term.
    #[serde(default)]
    pub use_decimal_randomization: bool,
    #[serde(default = "default_decimal_precision")]
    pub decimal_precision: u32,
}

impl Default for AdvancedUserOverrides {
    fn default() -> Self {
        Self {
            min_delay_s: None,
            max_delay_s: None,
            enable_breaks: None,
            min_messages_before_break: None,
            max_messages_before_break: None,
            min_break_minutes: None,
            max_break_minutes: None,
            use_decimal_randomization: false,
            decimal_precision: default_decimal_precision(),
        }
    }
}

/// Defaults applied to `timing_mode = manual` when the caller does not supply
/// an explicit `{min_delay, max_delay}` pair (§6 "Timing mode defaults").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualTimingDefaults {
    #[serde(default = "default_manual_min")]
    pub min_delay_s: u32,
    #[serde(default = "default_manual_max")]
    pub max_delay_s: u32,
}

impl Default for ManualTimingDefaults {
    fn default() -> Self {
        Self {
            min_delay_s: default_manual_min(),
            max_delay_s: default_manual_max(),
        }
    }
}

/// Hard-coded fallback used when every configured tier fails to resolve
/// (last resort in the pacing engine's rule-selection priority).
pub fn hard_coded_fallback() -> PacingRules {
    PacingRules {
        min_delay_s: 1,
        max_delay_s: 3,
        break_rule: BreakRule {
            enabled: true,
            after_min_messages: 8,
            after_max_messages: 15,
            min_break_minutes: 5,
            max_break_minutes: 15,
            variance_s: 30,
        },
        priority: i32::MIN,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
