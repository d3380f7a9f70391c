// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Thread-per-actor runtime.
//!
//! Every actor owns a dedicated OS thread and a closable mailbox. Callers hold
//! [`Stub`]s; each send returns a [`Promise`](crate::promise::Promise) for the
//! reply, and the actor's lifecycle promise reports how it died.

mod context;
mod envelope;
mod error;
mod runner;
mod stub;
mod traits;

pub use context::Context;
pub use error::ActorError;
pub(crate) use error::panic_message;
pub(crate) use runner::spawn_thread;
pub use stub::{Stub, WeakStub};
pub use traits::{Actor, ActorConfig, ActorState, Flow, Handler};
