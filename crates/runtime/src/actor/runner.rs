// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Actor runner.
//!
//! Drives actor execution on a dedicated OS thread with blocking mailbox receives.

use std::{
	panic::{AssertUnwindSafe, catch_unwind},
	sync::Arc,
	thread,
};

use tracing::{debug, error, trace, warn};

use crate::{
	actor::{
		context::Context,
		envelope::Envelope,
		error::{ActorError, panic_message},
		traits::{Actor, ActorState, Flow, StateCell},
	},
	promise::{Cause, Promise},
	queue::{ClosableQueue, Queue},
};

/// Spawn `f` on a new OS thread called `name`.
///
/// Thread names may not contain NUL; such a name is an [`ActorError::Spawn`].
pub(crate) fn spawn_thread<F>(name: &str, f: F) -> Result<(), ActorError>
where
	F: FnOnce() + Send + 'static,
{
	if name.contains('\0') {
		return Err(ActorError::Spawn(format!("thread name {name:?} contains a NUL byte")));
	}
	thread::Builder::new().name(name.to_string()).spawn(f).map_err(|err| ActorError::Spawn(err.to_string()))?;
	Ok(())
}

/// Internal runner that drives an actor's execution on a dedicated thread.
///
/// The runner implements a simple blocking run loop:
/// 1. Pass the lifecycle promise's running gate
/// 2. Construct the actor from the first mailbox item
/// 3. Loop: block on mailbox get, skip cancelled messages, handle the rest
/// 4. Call post_stop hook, drop the actor
/// 5. Hard-close the mailbox, cancel leftovers, resolve the lifecycle promise
pub(crate) struct ActorRunner<A: Actor> {
	name: Arc<str>,
	mailbox: Queue<Envelope<A>>,
	lifecycle: Promise<()>,
	state: Arc<StateCell>,
}

impl<A: Actor> ActorRunner<A> {
	pub(crate) fn new(
		name: Arc<str>,
		mailbox: Queue<Envelope<A>>,
		lifecycle: Promise<()>,
		state: Arc<StateCell>,
	) -> Self {
		Self {
			name,
			mailbox,
			lifecycle,
			state,
		}
	}

	/// Run the actor to completion.
	///
	/// This is the main entry point for actor execution.
	pub(crate) fn run(self) {
		debug!(actor = %self.name, "actor starting");

		let exit = self.run_actor();

		let evicted = self.mailbox.close(false);
		if !evicted.is_empty() {
			debug!(actor = %self.name, count = evicted.len(), "cancelling queued messages");
		}
		for envelope in evicted {
			envelope.cancel();
		}
		self.state.store(ActorState::Dead);

		match exit {
			Ok(()) => {
				debug!(actor = %self.name, "actor stopped");
				self.lifecycle.set_result(());
			}
			Err(cause) => {
				error!(actor = %self.name, error = %cause, "actor died");
				self.lifecycle.set_error(cause);
			}
		}
	}

	/// Everything that touches the actor state. The state is dropped on return.
	fn run_actor(&self) -> Result<(), Cause> {
		if !self.lifecycle.set_running_or_notify_cancel() {
			return Err(Arc::new(ActorError::Cancelled("lifecycle of this actor")));
		}

		let mut ctx = Context::new(self.name.clone());
		let mut actor = self.construct(&mut ctx)?;

		let result = self.run_loop(&mut actor, &mut ctx);

		if catch_unwind(AssertUnwindSafe(|| actor.post_stop())).is_err() {
			warn!(actor = %self.name, "post_stop panicked");
		}
		result
	}

	/// Build the actor from the first mailbox item.
	fn construct(&self, ctx: &mut Context) -> Result<A, Cause> {
		let (args, promise) = match self.mailbox.get() {
			Ok(Envelope::Init {
				args,
				promise,
			}) => (args, promise),
			Ok(Envelope::Call(call)) => {
				call.cancel();
				return Err(Arc::new(ActorError::Protocol("first message must construct the actor")));
			}
			Err(_) => return Err(Arc::new(ActorError::Killed)),
		};

		if !promise.set_running_or_notify_cancel() {
			return Err(Arc::new(ActorError::Cancelled("constructor")));
		}

		let cause: Cause = match catch_unwind(AssertUnwindSafe(|| A::init(args, ctx))) {
			Ok(Ok(actor)) => {
				// visible to the spawner before it is released
				self.state.store(ActorState::Running);
				promise.set_result(());
				return Ok(actor);
			}
			Ok(Err(err)) => Arc::new(err) as Cause,
			Err(payload) => Arc::new(ActorError::Panicked(panic_message(&*payload))) as Cause,
		};
		promise.set_error(cause.clone());
		Err(cause)
	}

	/// The main run loop. Returns `Ok` when the mailbox is closed and drained
	/// or the actor asked to stop.
	fn run_loop(&self, actor: &mut A, ctx: &mut Context) -> Result<(), Cause> {
		loop {
			if ctx.flow() == Flow::Stop {
				debug!(actor = %self.name, "actor requested stop");
				return Ok(());
			}

			let envelope = match self.mailbox.get() {
				Ok(envelope) => envelope,
				Err(_) => {
					debug!(actor = %self.name, "actor mailbox closed, stopping");
					return Ok(());
				}
			};

			match envelope {
				Envelope::Init {
					promise,
					..
				} => {
					warn!(actor = %self.name, "dropping repeated constructor message");
					promise.fail(ActorError::Protocol("actor is already constructed"));
				}
				Envelope::Call(call) => {
					if !call.set_running_or_notify_cancel() {
						trace!(actor = %self.name, "skipping cancelled message");
						continue;
					}
					trace!(actor = %self.name, "handling message");
					call.dispatch(actor, ctx)?;
				}
			}
		}
	}
}
