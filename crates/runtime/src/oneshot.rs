// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! One-shot workers.
//!
//! Runs a single function on a dedicated OS thread and reports its outcome
//! through a [`Promise`]. Typical use is a consumer loop draining a
//! caller-owned [`Queue`](crate::queue::Queue) until it is closed.

use std::{
	error::Error,
	panic::{AssertUnwindSafe, catch_unwind},
};

use tracing::debug;

use crate::{
	actor::{ActorError, panic_message, spawn_thread},
	promise::Promise,
};

/// Spawn `f` on a thread named `name`.
///
/// Cancelling the returned promise before the thread starts `f` prevents it
/// from running at all.
pub fn spawn<R, E, F>(name: impl Into<String>, f: F) -> Result<Promise<R>, ActorError>
where
	F: FnOnce() -> Result<R, E> + Send + 'static,
	R: Send + 'static,
	E: Error + Send + Sync + 'static,
{
	let name = name.into();
	let promise = Promise::new();
	let resolver = promise.clone();

	let worker = name.clone();
	spawn_thread(&name, move || {
		if !resolver.set_running_or_notify_cancel() {
			debug!(worker = %worker, "one-shot cancelled before start");
			return;
		}
		debug!(worker = %worker, "one-shot starting");
		match catch_unwind(AssertUnwindSafe(f)) {
			Ok(Ok(value)) => resolver.set_result(value),
			Ok(Err(err)) => resolver.fail(err),
			Err(payload) => resolver.fail(ActorError::Panicked(panic_message(&*payload))),
		}
		debug!(worker = %worker, "one-shot exit");
	})?;

	Ok(promise)
}
