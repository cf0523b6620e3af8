// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! The Control Plane (§4.8) and the external interface wire shapes (§6) it
//! speaks. This crate has no HTTP framing of its own (out of scope) — it is
//! the in-process async API a transport layer would sit in front of.
mod control_plane;
mod external;

pub use control_plane::{AdminToken, ControlPlane};
pub use external::*;
