// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Campaign data model, template renderer, pacing engine and duplicate-guard
//! policy. This crate has no I/O: it is the pure core the store, messenger
//! and runtime crates build on.
mod duplicate;
mod error;
mod model;
mod pacing;
mod template;
mod validate;

pub use duplicate::{check as check_duplicate, DuplicateDecision};
pub use error::CoreError;
pub use model::{
    Attachment, AttachmentKind, BrowserKind, Campaign, CampaignStatus, Contact,
    DuplicatePreventionMode, Gender, SentPhoneRecord, TimingMode, WorkflowEntry, WorkflowStatus,
};
pub use pacing::{resolve as resolve_pacing, PacingEngine, ResolvedPacing};
pub use template::{contains_arabic, render, ContactNameResolution};
pub use validate::{find_referenced_variables, validate as validate_template, VariableFamily};
