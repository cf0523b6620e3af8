// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! The Messenger adapter contract (§4.6) and the per-user browser session
//! manager (§4.5) that backs it. This crate has no real browser automation
//! driver wired in — [`MockMessenger`] stands in for the external UI the
//! executor drives a send through.
mod messenger;
mod session;

pub use messenger::{MockMessenger, Messenger, SendOutcome, DEFAULT_SEND_TIMEOUT};
pub use session::{BrowserSessionManager, ForceCloseReport, SessionHandle};
