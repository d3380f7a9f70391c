// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Caller-facing actor handles.
//!
//! Each actor runs on its own dedicated OS thread. A [`Stub`] is the only way
//! to reach it: sending enqueues a message and returns the [`Promise`] of its
//! reply. Stubs are reference counted; when the last one is dropped the actor
//! is killed gracefully, finishing whatever is already queued.

use std::{
	fmt,
	sync::{
		Arc, Weak,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use tracing::{debug, trace};

use crate::{
	actor::{
		envelope::Envelope,
		error::ActorError,
		runner::{ActorRunner, spawn_thread},
		traits::{Actor, ActorConfig, ActorState, Handler, StateCell},
	},
	promise::{Promise, PromiseError},
	queue::{ClosableQueue, Queue, QueueError},
};

/// Counter for naming unnamed actors.
static ACTOR_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_actor_name() -> String {
	format!("actor-{}", ACTOR_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

struct Shared<A: Actor> {
	name: Arc<str>,
	mailbox: Queue<Envelope<A>>,
	lifecycle: Promise<()>,
	state: Arc<StateCell>,
}

impl<A: Actor> Drop for Shared<A> {
	fn drop(&mut self) {
		// last stub gone
		if !self.mailbox.is_closed() {
			debug!(actor = %self.name, "no stubs left, killing actor gracefully");
			self.mailbox.close(true);
		}
	}
}

/// Handle to an actor running on a dedicated thread.
///
/// Cloning yields another handle to the same actor.
pub struct Stub<A: Actor> {
	shared: Arc<Shared<A>>,
}

impl<A: Actor> Clone for Stub<A> {
	fn clone(&self) -> Self {
		Self {
			shared: self.shared.clone(),
		}
	}
}

impl<A: Actor> Stub<A> {
	/// Spawn an unnamed actor with an unbounded mailbox.
	///
	/// See [`Stub::spawn_with`].
	pub fn spawn(args: A::Args) -> Result<Self, PromiseError> {
		Self::spawn_with(ActorConfig::default(), args)
	}

	/// Spawn an actor on its own thread and construct it from `args`.
	///
	/// Blocks until the constructor has run; a constructor error is returned
	/// here as [`PromiseError::Failed`].
	pub fn spawn_with(config: ActorConfig, args: A::Args) -> Result<Self, PromiseError> {
		let name: Arc<str> = config.name.unwrap_or_else(next_actor_name).into();
		let mailbox = Queue::new(config.mailbox_capacity);
		let lifecycle = Promise::new();
		let state = Arc::new(StateCell::new());

		let runner = ActorRunner::<A>::new(name.clone(), mailbox.clone(), lifecycle.clone(), state.clone());
		spawn_thread(&name, move || runner.run()).map_err(|err| PromiseError::Failed(Arc::new(err)))?;

		let stub = Stub {
			shared: Arc::new(Shared {
				name,
				mailbox,
				lifecycle,
				state,
			}),
		};

		let init = Promise::new();
		stub.shared
			.mailbox
			.put(Envelope::Init {
				args,
				promise: init.clone(),
			})
			.map_err(|err| PromiseError::Failed(Arc::new(ActorError::from(err))))?;
		init.result()?;

		debug!(actor = %stub.shared.name, "actor started");
		Ok(stub)
	}

	/// Send a message, blocking while the mailbox is full.
	///
	/// Fails with [`ActorError::Killed`] once the actor is dead or being killed.
	pub fn send<M>(&self, message: M) -> Result<Promise<A::Reply>, ActorError>
	where
		A: Handler<M>,
		M: Send + 'static,
	{
		self.enqueue(message, |mailbox, envelope| mailbox.put(envelope))
	}

	/// Send a message, failing with [`ActorError::Full`] instead of blocking.
	pub fn try_send<M>(&self, message: M) -> Result<Promise<A::Reply>, ActorError>
	where
		A: Handler<M>,
		M: Send + 'static,
	{
		self.enqueue(message, |mailbox, envelope| mailbox.try_put(envelope))
	}

	/// Send a message, failing with [`ActorError::Timeout`] if the mailbox
	/// stays full for `timeout`.
	pub fn send_timeout<M>(&self, message: M, timeout: Duration) -> Result<Promise<A::Reply>, ActorError>
	where
		A: Handler<M>,
		M: Send + 'static,
	{
		self.enqueue(message, |mailbox, envelope| mailbox.put_timeout(envelope, timeout))
	}

	fn enqueue<M, F>(&self, message: M, put: F) -> Result<Promise<A::Reply>, ActorError>
	where
		A: Handler<M>,
		M: Send + 'static,
		F: FnOnce(&Queue<Envelope<A>>, Envelope<A>) -> Result<(), QueueError>,
	{
		let promise = Promise::new();
		put(&self.shared.mailbox, Envelope::call(message, promise.clone()))?;
		trace!(actor = %self.shared.name, "message enqueued");
		Ok(promise)
	}

	/// Kill the actor.
	///
	/// If `graceful` is true the actor finishes every message already queued.
	/// Otherwise queued messages are cancelled right away and the actor stops
	/// after the message it is currently handling.
	///
	/// Never blocks, even when the mailbox is full.
	pub fn kill(&self, graceful: bool) {
		let evicted = self.shared.mailbox.close(graceful);
		debug!(actor = %self.shared.name, graceful, evicted = evicted.len(), "killing actor");
		for envelope in evicted {
			envelope.cancel();
		}
	}

	/// The promise that resolves when the actor dies.
	///
	/// It fails with the cause of death if a handler failed. Cancelling it does
	/// not kill the actor; use [`Stub::kill`].
	pub fn lifecycle(&self) -> Promise<()> {
		self.shared.lifecycle.clone()
	}

	pub fn state(&self) -> ActorState {
		self.shared.state.load()
	}

	pub fn is_alive(&self) -> bool {
		self.state() != ActorState::Dead
	}

	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Number of messages waiting in the mailbox.
	pub fn pending(&self) -> usize {
		self.shared.mailbox.len()
	}

	/// Create a handle that does not keep the actor alive.
	pub fn downgrade(&self) -> WeakStub<A> {
		WeakStub {
			shared: Arc::downgrade(&self.shared),
		}
	}
}

impl<A: Actor> fmt::Debug for Stub<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Stub").field("name", &self.shared.name).field("state", &self.state()).finish()
	}
}

/// A non-owning handle to an actor.
///
/// Hand this to the actor itself (or anything it owns) instead of a [`Stub`],
/// otherwise the actor keeps itself alive and is never killed on drop.
pub struct WeakStub<A: Actor> {
	shared: Weak<Shared<A>>,
}

impl<A: Actor> Clone for WeakStub<A> {
	fn clone(&self) -> Self {
		Self {
			shared: self.shared.clone(),
		}
	}
}

impl<A: Actor> WeakStub<A> {
	/// Returns a [`Stub`] if any still exists.
	pub fn upgrade(&self) -> Option<Stub<A>> {
		self.shared.upgrade().map(|shared| Stub {
			shared,
		})
	}
}
