// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared test utilities.

pub mod log;
pub mod util;

pub use util::wait::{wait_for, wait_for_condition};
