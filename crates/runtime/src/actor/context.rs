// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Actor execution context.
//!
//! The context provides actors with access to:
//! - Their own name (for logging)
//! - Self-termination via [`Context::stop`]

use std::sync::Arc;

use crate::actor::traits::Flow;

/// Context provided to actors during construction and message handling.
pub struct Context {
	name: Arc<str>,
	flow: Flow,
}

impl Context {
	pub(crate) fn new(name: Arc<str>) -> Self {
		Self {
			name,
			flow: Flow::Continue,
		}
	}

	/// The actor's name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Request a clean shutdown once the current message completes.
	///
	/// The current message's reply is still delivered. Messages still queued
	/// are cancelled and the lifecycle promise resolves successfully.
	pub fn stop(&mut self) {
		self.flow = Flow::Stop;
	}

	/// Check if shutdown was requested.
	pub fn is_stopping(&self) -> bool {
		self.flow == Flow::Stop
	}

	pub(crate) fn flow(&self) -> Flow {
		self.flow
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stop() {
		let mut ctx = Context::new("worker".into());
		assert_eq!(ctx.name(), "worker");
		assert!(!ctx.is_stopping());
		assert_eq!(ctx.flow(), Flow::Continue);

		ctx.stop();
		assert!(ctx.is_stopping());
		assert_eq!(ctx.flow(), Flow::Stop);
	}
}
