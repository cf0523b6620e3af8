// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: MIT
mod loader;
mod schema;

pub use loader::load;
pub use schema::*;
