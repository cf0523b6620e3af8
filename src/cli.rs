// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "campaignctl", version, about = "Outbound messaging campaign orchestrator")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Respects RUST_LOG if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a self-contained campaign end to end against a mock Messenger:
    /// create it from synthetic contacts, start it, print progress
    /// snapshots until it completes, optionally pausing and resuming
    /// partway through.
    Demo {
        /// Number of synthetic contacts to seed the campaign with.
        #[arg(long, default_value_t = 6)]
        contacts: u32,

        #[arg(long, value_enum, default_value_t = BrowserArg::Chrome)]
        browser: BrowserArg,

        #[arg(long, value_enum, default_value_t = TimingModeArg::Auto)]
        timing_mode: TimingModeArg,

        /// Only consulted when `--timing-mode manual`.
        #[arg(long)]
        manual_min: Option<u32>,
        #[arg(long)]
        manual_max: Option<u32>,

        /// Pause the campaign after this many messages are processed, then
        /// resume it a moment later (0 disables the pause/resume exercise).
        #[arg(long, default_value_t = 0)]
        pause_after: u32,

        /// Explicit config file, merged on top of the usual search path.
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Print the merged pacing/config document and exit.
    ShowConfig {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BrowserArg {
    Chrome,
    Firefox,
}

impl From<BrowserArg> for campaign_core::BrowserKind {
    fn from(b: BrowserArg) -> Self {
        match b {
            BrowserArg::Chrome => campaign_core::BrowserKind::Chrome,
            BrowserArg::Firefox => campaign_core::BrowserKind::Firefox,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TimingModeArg {
    Auto,
    Manual,
}

impl From<TimingModeArg> for campaign_core::TimingMode {
    fn from(t: TimingModeArg) -> Self {
        match t {
            TimingModeArg::Auto => campaign_core::TimingMode::Auto,
            TimingModeArg::Manual => campaign_core::TimingMode::Manual,
        }
    }
}
