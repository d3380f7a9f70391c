// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! A minimal actor runtime.
//!
//! - [`queue`]: closable, optionally bounded FIFO queues
//! - [`promise`]: single-assignment result cells with cooperative cancellation
//! - [`actor`]: actors on dedicated threads, reached through [`Stub`]s
//! - [`oneshot`]: run a single function on its own thread

pub mod actor;
pub mod oneshot;
pub mod promise;
pub mod queue;

pub use actor::{Actor, ActorConfig, ActorError, ActorState, Context, Flow, Handler, Stub, WeakStub};
pub use promise::{Cause, Promise, PromiseError};
pub use queue::{ClosableQueue, Queue, QueueError, ZeroQueue};
