// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::any::Any;

use crate::queue::QueueError;

/// Error returned when talking to, or running, an actor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActorError {
	/// The actor's mailbox is closed; it is dead or dying.
	#[error("actor has been killed")]
	Killed,

	/// Non-blocking send to a full mailbox.
	#[error("actor mailbox is full")]
	Full,

	/// Timed send could not enqueue in time.
	#[error("timed out waiting for actor mailbox")]
	Timeout,

	/// Work was cancelled before it could start.
	#[error("{0} has been cancelled")]
	Cancelled(&'static str),

	/// Internal consistency violation.
	#[error("actor protocol violation: {0}")]
	Protocol(&'static str),

	/// The constructor or a handler panicked.
	#[error("actor panicked: {0}")]
	Panicked(String),

	/// The OS refused to start the actor thread.
	#[error("failed to spawn actor thread: {0}")]
	Spawn(String),
}

impl From<QueueError> for ActorError {
	fn from(err: QueueError) -> Self {
		match err {
			QueueError::Full => ActorError::Full,
			QueueError::Timeout => ActorError::Timeout,
			// a put never reports Empty
			QueueError::Closed | QueueError::Empty => ActorError::Killed,
		}
	}
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&str>() {
		msg.to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"unknown panic".to_string()
	}
}
