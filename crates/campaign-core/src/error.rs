// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// The error taxonomy the core distinguishes (see the error handling design).
///
/// Per-entry variants ([`CoreError::RecipientInvalid`],
/// [`CoreError::MessengerTransient`], [`CoreError::ConcurrencyConflict`]) are
/// local: the caller records them on the workflow entry and continues the
/// loop. [`CoreError::StoreUnavailable`] is global: the caller escalates the
/// campaign to `Stopped`. [`CoreError::SessionLost`] is local on its first
/// occurrence per campaign (the executor re-acquires the session and
/// retries the entry once) but becomes global — campaign escalates to
/// `Stopped` — once that re-acquire also fails.
/// [`CoreError::TemplateInvalid`] only ever surfaces at pre-flight, never
/// mid-run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Non-retryable: the Messenger classified the recipient as unreachable.
    #[error("invalid recipient: {0}")]
    RecipientInvalid(String),

    /// Timeout or transient UI glitch from the Messenger. Treated as a
    /// terminal failure for the entry in v1 (no in-loop retry).
    #[error("transient messenger error: {0}")]
    MessengerTransient(String),

    /// The browser driver died mid-send. The executor re-acquires the
    /// session once per campaign before failing the entry.
    #[error("browser session lost: {0}")]
    SessionLost(String),

    /// A transactional write failed even after one retry with a fresh
    /// transaction. Escalates the owning campaign to `Stopped`.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// CAS failure on a workflow entry: another worker already claimed it.
    /// Not fatal — the caller skips the entry and continues.
    #[error("concurrency conflict on entry {0}")]
    ConcurrencyConflict(uuid::Uuid),

    /// Pre-flight template validation failed; surfaces at `Start` with
    /// structured detail and never mid-run.
    #[error("template invalid: {variables_found:?} could not all be resolved: {validation_errors:?}")]
    TemplateInvalid {
        variables_found: Vec<String>,
        validation_errors: Vec<String>,
    },

    /// A requested campaign/workflow/contact id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested operation is not valid in the entity's current status.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl CoreError {
    /// `true` for errors that should be contained to a single workflow entry
    /// rather than escalated to the owning campaign.
    pub fn is_per_entry(&self) -> bool {
        matches!(
            self,
            CoreError::RecipientInvalid(_)
                | CoreError::MessengerTransient(_)
                | CoreError::ConcurrencyConflict(_)
        )
    }
}
