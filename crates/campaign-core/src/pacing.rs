// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! The pacing engine: emits the per-message delay and break-trigger
//! decisions. Never fails — any rule-lookup gap falls back to the next tier
//! (user-advanced → per-plan → global default → hard-coded fallback) and is
//! logged, not propagated as an error.

use campaign_config::{AdvancedUserOverrides, BreakRule, PacingRules};
use rand::Rng;
use tracing::warn;

use crate::model::TimingMode;

/// A fully-resolved pacing rule set for one executor, after applying the
/// user-advanced > per-plan > global-default > hard-coded priority.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPacing {
    pub min_delay_s: f64,
    pub max_delay_s: f64,
    pub strong_randomization: bool,
    pub break_enabled: bool,
    pub break_after_min: u32,
    pub break_after_max: u32,
    pub break_min_minutes: f64,
    pub break_max_minutes: f64,
    pub break_variance_s: f64,
}

/// Resolve the effective pacing rule for one executor run.
///
/// `manual_overrides`, when `Some`, are the caller-supplied `{min_delay,
/// max_delay}` for `timing_mode = manual` and sit at the "global default"
/// tier — a user-advanced override still wins over them.
pub fn resolve(
    mode: TimingMode,
    manual_overrides: Option<(u32, u32)>,
    advanced: Option<&AdvancedUserOverrides>,
    per_plan: Option<&PacingRules>,
    global_default: &PacingRules,
) -> ResolvedPacing {
    let (mut min_delay_s, mut max_delay_s) = match (mode, manual_overrides) {
        (TimingMode::Manual, Some((mn, mx))) => (mn, mx),
        (TimingMode::Manual, None) => (30, 60),
        (TimingMode::Auto, _) => (global_default.min_delay_s, global_default.max_delay_s),
    };

    if let Some(plan) = per_plan {
        if matches!(mode, TimingMode::Auto) {
            min_delay_s = plan.min_delay_s;
            max_delay_s = plan.max_delay_s;
        }
    }

    let mut break_rule: BreakRule = per_plan
        .map(|p| p.break_rule.clone())
        .unwrap_or_else(|| global_default.break_rule.clone());

    let mut strong_randomization = false;
    if let Some(adv) = advanced {
        if let Some(v) = adv.min_delay_s {
            min_delay_s = v;
        }
        if let Some(v) = adv.max_delay_s {
            max_delay_s = v;
        }
        if let Some(v) = adv.enable_breaks {
            break_rule.enabled = v;
        }
        if let Some(v) = adv.min_messages_before_break {
            break_rule.after_min_messages = v;
        }
        if let Some(v) = adv.max_messages_before_break {
            break_rule.after_max_messages = v;
        }
        if let Some(v) = adv.min_break_minutes {
            break_rule.min_break_minutes = v;
        }
        if let Some(v) = adv.max_break_minutes {
            break_rule.max_break_minutes = v;
        }
        strong_randomization = adv.use_decimal_randomization;
    }

    if max_delay_s < min_delay_s {
        warn!(min_delay_s, max_delay_s, "pacing: max < min, swapping");
        std::mem::swap(&mut min_delay_s, &mut max_delay_s);
    }

    if mode == TimingMode::Manual && min_delay_s < 20 {
        warn!(min_delay_s, "manual mode disallows min_delay_s < 20; clamping");
        min_delay_s = 20;
        if max_delay_s < min_delay_s {
            max_delay_s = min_delay_s;
        }
    }

    ResolvedPacing {
        min_delay_s: min_delay_s as f64,
        max_delay_s: max_delay_s as f64,
        strong_randomization,
        break_enabled: break_rule.enabled,
        break_after_min: break_rule.after_min_messages,
        break_after_max: break_rule.after_max_messages,
        break_min_minutes: break_rule.min_break_minutes as f64,
        break_max_minutes: break_rule.max_break_minutes as f64,
        break_variance_s: break_rule.variance_s as f64,
    }
}

/// Per-executor pacing state: owns its own RNG (seeded uniquely per executor
/// so a fleet of concurrent campaigns never produces synchronized timing)
/// and the rolling "messages since last break" counter.
pub struct PacingEngine<R: Rng> {
    rng: R,
    rule: ResolvedPacing,
    messages_sent_since_last_break: u32,
    next_break_threshold: u32,
}

impl<R: Rng> PacingEngine<R> {
    pub fn new(rng: R, rule: ResolvedPacing) -> Self {
        let mut engine = Self {
            rng,
            rule,
            messages_sent_since_last_break: 0,
            next_break_threshold: 0,
        };
        engine.next_break_threshold = engine.draw_break_threshold();
        engine
    }

    fn draw_break_threshold(&mut self) -> u32 {
        let (lo, hi) = (self.rule.break_after_min, self.rule.break_after_max.max(self.rule.break_after_min));
        if lo == hi {
            lo
        } else {
            self.rng.gen_range(lo..=hi)
        }
    }

    /// Draw the next per-message delay in seconds.
    pub fn next_delay_s(&mut self) -> f64 {
        let base = if self.rule.max_delay_s > self.rule.min_delay_s {
            self.rng.gen_range(self.rule.min_delay_s..=self.rule.max_delay_s)
        } else {
            self.rule.min_delay_s
        };

        let mut delay = base;
        if self.rule.strong_randomization {
            let micro: f64 = self.rng.gen_range(0.1..=1.0);
            let jitter: i32 = self.rng.gen_range(-2..=3);
            delay += micro + jitter as f64;
        }
        delay.max(1.0)
    }

    /// Record that a message was just sent; advances the break counter.
    pub fn record_message_sent(&mut self) {
        self.messages_sent_since_last_break += 1;
    }

    /// `true` when the break threshold has been reached. The caller is
    /// responsible for never honoring this on the last remaining entry.
    pub fn break_due(&self) -> bool {
        self.rule.break_enabled
            && self.messages_sent_since_last_break >= self.next_break_threshold
    }

    /// Take a break: draws its duration, resets the rolling counter, and
    /// re-draws the next threshold from `Uniform[min,max]` — the threshold is
    /// never a fixed modulus (testable property 6).
    pub fn take_break(&mut self) -> f64 {
        let base_minutes = if self.rule.break_max_minutes > self.rule.break_min_minutes {
            self.rng.gen_range(self.rule.break_min_minutes..=self.rule.break_max_minutes)
        } else {
            self.rule.break_min_minutes
        };
        let jitter_factor: f64 = self.rng.gen_range(0.90..=1.15);
        let extra_s: f64 = self.rng.gen_range(0.0..=self.rule.break_variance_s.max(0.0));
        let duration_s = base_minutes * 60.0 * jitter_factor + extra_s;

        self.messages_sent_since_last_break = 0;
        self.next_break_threshold = self.draw_break_threshold();

        duration_s.max(30.0)
    }

    pub fn next_break_threshold(&self) -> u32 {
        self.next_break_threshold
    }

    pub fn messages_since_last_break(&self) -> u32 {
        self.messages_sent_since_last_break
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn engine(seed: u64, rule: ResolvedPacing) -> PacingEngine<rand::rngs::StdRng> {
        PacingEngine::new(rand::rngs::StdRng::seed_from_u64(seed), rule)
    }

    fn fast_rule() -> ResolvedPacing {
        ResolvedPacing {
            min_delay_s: 1.0,
            max_delay_s: 1.0,
            strong_randomization: false,
            break_enabled: true,
            break_after_min: 3,
            break_after_max: 7,
            break_min_minutes: 0.01,
            break_max_minutes: 0.02,
            break_variance_s: 0.0,
        }
    }

    #[test]
    fn delay_never_below_one_second() {
        let rule = ResolvedPacing {
            strong_randomization: true,
            ..fast_rule()
        };
        let mut e = engine(1, rule);
        for _ in 0..200 {
            assert!(e.next_delay_s() >= 1.0);
        }
    }

    #[test]
    fn break_not_due_before_fixed_threshold() {
        let rule = ResolvedPacing {
            break_after_min: 5,
            break_after_max: 5,
            ..fast_rule()
        };
        let mut e = engine(2, rule);
        for _ in 0..4 {
            e.record_message_sent();
            assert!(!e.break_due());
        }
        e.record_message_sent();
        assert!(e.break_due());
    }

    #[test]
    fn break_duration_is_at_least_30s() {
        let mut e = engine(3, fast_rule());
        for _ in 0..50 {
            assert!(e.take_break() >= 30.0);
        }
    }

    #[test]
    fn break_thresholds_are_not_periodic() {
        let mut e = engine(4, fast_rule());
        let mut thresholds = Vec::new();
        for _ in 0..10 {
            thresholds.push(e.next_break_threshold());
            e.take_break();
        }
        let distinct: std::collections::HashSet<_> = thresholds.iter().collect();
        assert!(distinct.len() >= 2, "thresholds never varied: {thresholds:?}");
    }

    #[test]
    fn manual_mode_rejects_min_under_20() {
        let global = PacingRules::default();
        let resolved = resolve(TimingMode::Manual, Some((5, 10)), None, None, &global);
        assert_eq!(resolved.min_delay_s, 20.0);
    }

    #[test]
    fn advanced_overrides_win_over_per_plan_and_global() {
        let global = PacingRules::default();
        let mut plan = PacingRules::default();
        plan.min_delay_s = 10;
        plan.max_delay_s = 20;
        let advanced = AdvancedUserOverrides {
            min_delay_s: Some(2),
            max_delay_s: Some(4),
            ..Default::default()
        };
        let resolved = resolve(TimingMode::Auto, None, Some(&advanced), Some(&plan), &global);
        assert_eq!(resolved.min_delay_s, 2.0);
        assert_eq!(resolved.max_delay_s, 4.0);
    }

    #[test]
    fn per_plan_wins_over_global_default_when_no_advanced() {
        let global = PacingRules::default();
        let mut plan = PacingRules::default();
        plan.min_delay_s = 10;
        plan.max_delay_s = 20;
        let resolved = resolve(TimingMode::Auto, None, None, Some(&plan), &global);
        assert_eq!(resolved.min_delay_s, 10.0);
        assert_eq!(resolved.max_delay_s, 20.0);
    }
}
