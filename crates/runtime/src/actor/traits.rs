// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Core actor traits and associated types.
//!
//! This module defines the fundamental abstractions for the actor model:
//! - [`Actor`]: The trait that all actors must implement
//! - [`Handler`]: One implementation per message kind an actor accepts
//! - [`Flow`]: Control flow after a message
//! - [`ActorConfig`]: Configuration for spawning an actor
//! - [`ActorState`]: Where an actor is in its life

use std::sync::atomic::{AtomicU8, Ordering};

use crate::actor::context::Context;

/// What the actor wants to do after handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	/// Keep processing messages.
	Continue,

	/// Stop this actor permanently after the current message.
	///
	/// Queued messages are cancelled and the actor's lifecycle promise
	/// resolves successfully.
	Stop,
}

/// Configuration for spawning an actor.
#[derive(Debug, Clone, Default)]
pub struct ActorConfig {
	/// Thread name, also used in log output.
	///
	/// Default: `actor-<n>`
	pub name: Option<String>,

	/// Mailbox capacity. 0 = unbounded.
	///
	/// Default: 0 (unbounded)
	pub mailbox_capacity: usize,
}

impl ActorConfig {
	/// Create a new config with default values.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the actor name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Set the mailbox capacity. 0 = unbounded.
	pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
		self.mailbox_capacity = capacity;
		self
	}
}

/// Lifecycle state of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActorState {
	/// The thread is up but the constructor has not completed.
	Starting = 0,
	/// Dequeuing and executing messages.
	Running = 1,
	/// Terminal; the actor never runs again.
	Dead = 2,
}

/// Atomic cell holding an [`ActorState`], shared by the runner and its stubs.
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
	pub(crate) fn new() -> Self {
		Self(AtomicU8::new(ActorState::Starting as u8))
	}

	pub(crate) fn load(&self) -> ActorState {
		match self.0.load(Ordering::Acquire) {
			0 => ActorState::Starting,
			1 => ActorState::Running,
			_ => ActorState::Dead,
		}
	}

	pub(crate) fn store(&self, state: ActorState) {
		self.0.store(state as u8, Ordering::Release);
	}
}

/// The core actor abstraction.
///
/// An actor is private state that lives on its own thread and is reached only
/// through messages. The state:
/// - Is constructed on the actor thread from [`Actor::Args`], so it need not be `Send`
/// - Processes messages one at a time (no internal concurrency, no locking)
/// - Dies permanently on the first handler error
///
/// # Lifecycle
///
/// 1. `init()` - Construct the state from the first message
/// 2. Loop: `Handler::handle()` each message in mailbox order
/// 3. `post_stop()` - Cleanup after the last message
///
/// # Example
///
/// ```ignore
/// struct Counter {
///     count: i64,
/// }
///
/// struct Increment(i64);
///
/// impl Actor for Counter {
///     type Args = i64;
///     type Error = std::convert::Infallible;
///
///     fn init(start: i64, _ctx: &mut Context) -> Result<Self, Self::Error> {
///         Ok(Counter { count: start })
///     }
/// }
///
/// impl Handler<Increment> for Counter {
///     type Reply = i64;
///
///     fn handle(&mut self, msg: Increment, _ctx: &mut Context) -> Result<i64, Self::Error> {
///         self.count += msg.0;
///         Ok(self.count)
///     }
/// }
///
/// let counter = Stub::<Counter>::spawn(0)?;
/// assert_eq!(counter.send(Increment(2))?.result()?, 2);
/// ```
pub trait Actor: Sized + 'static {
	/// Constructor arguments, sent to the actor thread as its first message.
	type Args: Send + 'static;

	/// Error returned by the constructor and handlers. Any error kills the actor.
	type Error: std::error::Error + Send + Sync + 'static;

	/// Construct the actor state. Runs on the actor thread.
	fn init(args: Self::Args, ctx: &mut Context) -> Result<Self, Self::Error>;

	/// Called once after the actor stops (always called once `init` succeeded).
	fn post_stop(&mut self) {}
}

/// A message kind accepted by an actor.
///
/// The set of `Handler` implementations is the actor's complete message set;
/// sending anything else does not compile.
pub trait Handler<M: Send + 'static>: Actor {
	type Reply: Send + 'static;

	/// Handle a single message.
	///
	/// Call [`Context::stop`] to terminate the actor cleanly after this message.
	fn handle(&mut self, msg: M, ctx: &mut Context) -> Result<Self::Reply, Self::Error>;
}
