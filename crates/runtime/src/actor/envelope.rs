// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Mailbox items.
//!
//! An [`Envelope`] pairs a message with the promise its sender waits on. The
//! runner only ever sees envelopes, so it can gate, cancel, and resolve every
//! message the same way regardless of its reply type.

use std::{
	panic::{AssertUnwindSafe, catch_unwind},
	sync::Arc,
};

use crate::{
	actor::{
		context::Context,
		error::{ActorError, panic_message},
		traits::{Actor, Handler},
	},
	promise::{Cause, Promise},
};

pub(crate) enum Envelope<A: Actor> {
	/// Constructor call; always the first item in a mailbox.
	Init {
		args: A::Args,
		promise: Promise<()>,
	},
	/// An ordinary message.
	Call(Box<dyn Dispatch<A> + Send>),
}

impl<A: Actor> Envelope<A> {
	pub(crate) fn call<M>(message: M, promise: Promise<<A as Handler<M>>::Reply>) -> Self
	where
		A: Handler<M>,
		M: Send + 'static,
	{
		Envelope::Call(Box::new(Call {
			message,
			promise,
		}))
	}

	/// Cancel the sender's promise; the message will never run.
	pub(crate) fn cancel(&self) -> bool {
		match self {
			Envelope::Init {
				promise,
				..
			} => promise.cancel(),
			Envelope::Call(call) => call.cancel(),
		}
	}
}

/// A message with its reply type erased.
pub(crate) trait Dispatch<A: Actor> {
	fn set_running_or_notify_cancel(&self) -> bool;

	fn cancel(&self) -> bool;

	/// Run the handler and resolve the promise.
	///
	/// On failure the promise already carries the cause, which is returned so
	/// the runner can kill the actor with it.
	fn dispatch(self: Box<Self>, actor: &mut A, ctx: &mut Context) -> Result<(), Cause>;
}

struct Call<M, R> {
	message: M,
	promise: Promise<R>,
}

impl<A, M, R> Dispatch<A> for Call<M, R>
where
	A: Handler<M, Reply = R>,
	M: Send + 'static,
	R: Send + 'static,
{
	fn set_running_or_notify_cancel(&self) -> bool {
		self.promise.set_running_or_notify_cancel()
	}

	fn cancel(&self) -> bool {
		self.promise.cancel()
	}

	fn dispatch(self: Box<Self>, actor: &mut A, ctx: &mut Context) -> Result<(), Cause> {
		let Call {
			message,
			promise,
		} = *self;

		let cause: Cause = match catch_unwind(AssertUnwindSafe(|| actor.handle(message, ctx))) {
			Ok(Ok(reply)) => {
				promise.set_result(reply);
				return Ok(());
			}
			Ok(Err(err)) => Arc::new(err) as Cause,
			Err(payload) => Arc::new(ActorError::Panicked(panic_message(&*payload))) as Cause,
		};
		promise.set_error(cause.clone());
		Err(cause)
	}
}
