// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Single-assignment result cells.
//!
//! A [`Promise`] is created by whoever will eventually produce a value and
//! handed (as a clone) to whoever wants to observe it. It moves through
//! `Pending -> Running -> Finished`, and finishes exactly once with a value,
//! an error, or a cancellation.
//!
//! Cancellation only wins while the promise is still pending. Producers call
//! [`Promise::set_running_or_notify_cancel`] before starting the work; once that
//! returns `true`, [`Promise::cancel`] is a no-op and the work always completes.

use std::{
	error::Error,
	fmt,
	sync::Arc,
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{trace, warn};

/// A type-erased failure recorded on a promise.
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// Why a promise did not yield a value.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PromiseError {
	/// The promise was cancelled before the work started.
	#[error("promise was cancelled")]
	Cancelled,

	/// The wait expired before the promise finished.
	#[error("timed out waiting for promise")]
	Timeout,

	/// The work finished with an error.
	#[error("{0}")]
	Failed(Cause),

	/// The value was already moved out by [`Promise::take`].
	#[error("promise value was already taken")]
	Taken,
}

impl PromiseError {
	/// Returns the underlying failure if it is of type `E`.
	pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
		match self {
			PromiseError::Failed(cause) => cause.downcast_ref::<E>(),
			_ => None,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		matches!(self, PromiseError::Cancelled)
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, PromiseError::Timeout)
	}
}

enum Outcome<T> {
	Value(T),
	Failed(Cause),
	Cancelled,
	Taken,
}

enum State<T> {
	Pending,
	Running,
	Finished(Outcome<T>),
}

type Callback<T> = Box<dyn FnOnce(&Promise<T>) + Send>;

struct Shared<T> {
	state: State<T>,
	callbacks: Vec<Callback<T>>,
}

impl<T> Shared<T> {
	fn is_finished(&self) -> bool {
		matches!(self.state, State::Finished(_))
	}
}

struct Inner<T> {
	shared: Mutex<Shared<T>>,
	finished: Condvar,
}

/// A clonable handle to a single-assignment result cell.
pub struct Promise<T> {
	inner: Arc<Inner<T>>,
}

impl<T> Clone for Promise<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> Default for Promise<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Promise<T> {
	/// Create a pending promise.
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Inner {
				shared: Mutex::new(Shared {
					state: State::Pending,
					callbacks: Vec::new(),
				}),
				finished: Condvar::new(),
			}),
		}
	}

	/// Cancel the promise.
	///
	/// Returns `true` if the promise is (now or already) cancelled, `false` if
	/// the work is running or has finished.
	pub fn cancel(&self) -> bool {
		let callbacks = {
			let mut shared = self.inner.shared.lock();
			match shared.state {
				State::Pending => shared.state = State::Finished(Outcome::Cancelled),
				State::Finished(Outcome::Cancelled) => return true,
				State::Running | State::Finished(_) => return false,
			}
			std::mem::take(&mut shared.callbacks)
		};
		self.notify(callbacks);
		true
	}

	/// Mark the promise as running.
	///
	/// Returns `false` when the promise was cancelled first, in which case the
	/// work must not be started.
	pub fn set_running_or_notify_cancel(&self) -> bool {
		let mut shared = self.inner.shared.lock();
		match shared.state {
			State::Pending => {
				shared.state = State::Running;
				true
			}
			State::Finished(Outcome::Cancelled) => false,
			State::Running | State::Finished(_) => {
				warn!("promise marked running twice");
				false
			}
		}
	}

	/// Finish the promise with a value.
	pub fn set_result(&self, value: T) {
		self.finish(Outcome::Value(value));
	}

	/// Finish the promise with an error.
	pub fn set_error(&self, cause: Cause) {
		self.finish(Outcome::Failed(cause));
	}

	/// Finish the promise with a concrete error.
	pub fn fail<E: Error + Send + Sync + 'static>(&self, err: E) {
		self.set_error(Arc::new(err));
	}

	pub fn cancelled(&self) -> bool {
		matches!(self.inner.shared.lock().state, State::Finished(Outcome::Cancelled))
	}

	pub fn running(&self) -> bool {
		matches!(self.inner.shared.lock().state, State::Running)
	}

	pub fn done(&self) -> bool {
		self.inner.shared.lock().is_finished()
	}

	/// Block until the promise finishes.
	pub fn wait(&self) {
		let _ = self.wait_until(None);
	}

	/// Block until the promise finishes or `timeout` expires.
	///
	/// Returns whether the promise finished.
	pub fn wait_timeout(&self, timeout: Duration) -> bool {
		self.wait_until(Some(Instant::now() + timeout)).is_some()
	}

	/// Block until the promise finishes and return its failure, if any.
	pub fn error(&self) -> Option<PromiseError> {
		let shared = self.wait_until(None)?;
		Self::failure(&shared.state)
	}

	/// Block until the promise finishes and move its value out.
	///
	/// Unlike [`Promise::result`] this needs no `Clone`. The value can be taken
	/// once; afterwards every handle sees [`PromiseError::Taken`].
	pub fn take(&self) -> Result<T, PromiseError> {
		match self.wait_until(None) {
			Some(mut shared) => Self::take_outcome(&mut shared),
			None => Err(PromiseError::Timeout),
		}
	}

	/// Like [`Promise::take`], but gives up with [`PromiseError::Timeout`]
	/// once `timeout` expires.
	pub fn take_timeout(&self, timeout: Duration) -> Result<T, PromiseError> {
		match self.wait_until(Some(Instant::now() + timeout)) {
			Some(mut shared) => Self::take_outcome(&mut shared),
			None => Err(PromiseError::Timeout),
		}
	}

	fn take_outcome(shared: &mut Shared<T>) -> Result<T, PromiseError> {
		match std::mem::replace(&mut shared.state, State::Finished(Outcome::Taken)) {
			State::Finished(Outcome::Value(value)) => Ok(value),
			previous => {
				shared.state = previous;
				Err(Self::failure(&shared.state).unwrap_or(PromiseError::Taken))
			}
		}
	}

	fn failure(state: &State<T>) -> Option<PromiseError> {
		match state {
			State::Finished(Outcome::Failed(cause)) => Some(PromiseError::Failed(cause.clone())),
			State::Finished(Outcome::Cancelled) => Some(PromiseError::Cancelled),
			_ => None,
		}
	}

	/// Run `callback` once the promise finishes.
	///
	/// If the promise is already finished the callback runs immediately on the
	/// calling thread, otherwise it runs on the thread that finishes it.
	pub fn add_done_callback<F>(&self, callback: F)
	where
		F: FnOnce(&Promise<T>) + Send + 'static,
	{
		{
			let mut shared = self.inner.shared.lock();
			if !shared.is_finished() {
				shared.callbacks.push(Box::new(callback));
				return;
			}
		}
		callback(self);
	}

	fn finish(&self, outcome: Outcome<T>) {
		let callbacks = {
			let mut shared = self.inner.shared.lock();
			if shared.is_finished() {
				trace!("ignoring result for finished promise");
				return;
			}
			shared.state = State::Finished(outcome);
			std::mem::take(&mut shared.callbacks)
		};
		self.notify(callbacks);
	}

	fn notify(&self, callbacks: Vec<Callback<T>>) {
		self.inner.finished.notify_all();
		for callback in callbacks {
			callback(self);
		}
	}

	/// Returns the locked state once finished, or `None` if `deadline` passed first.
	fn wait_until(&self, deadline: Option<Instant>) -> Option<MutexGuard<'_, Shared<T>>> {
		let mut shared = self.inner.shared.lock();
		while !shared.is_finished() {
			match deadline {
				None => self.inner.finished.wait(&mut shared),
				Some(deadline) => {
					if self.inner.finished.wait_until(&mut shared, deadline).timed_out() {
						return shared.is_finished().then_some(shared);
					}
				}
			}
		}
		Some(shared)
	}
}

impl<T: Clone> Promise<T> {
	/// Block until the promise finishes and return its outcome.
	pub fn result(&self) -> Result<T, PromiseError> {
		match self.wait_until(None) {
			Some(shared) => Self::outcome(&shared),
			None => Err(PromiseError::Timeout),
		}
	}

	/// Like [`Promise::result`], but gives up with [`PromiseError::Timeout`]
	/// once `timeout` expires.
	pub fn result_timeout(&self, timeout: Duration) -> Result<T, PromiseError> {
		match self.wait_until(Some(Instant::now() + timeout)) {
			Some(shared) => Self::outcome(&shared),
			None => Err(PromiseError::Timeout),
		}
	}

	fn outcome(shared: &Shared<T>) -> Result<T, PromiseError> {
		match &shared.state {
			State::Finished(Outcome::Value(value)) => Ok(value.clone()),
			state => Err(Self::failure(state).unwrap_or(PromiseError::Taken)),
		}
	}
}

impl<T> fmt::Debug for Promise<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = match self.inner.shared.lock().state {
			State::Pending => "pending",
			State::Running => "running",
			State::Finished(Outcome::Value(_)) => "finished",
			State::Finished(Outcome::Failed(_)) => "failed",
			State::Finished(Outcome::Cancelled) => "cancelled",
			State::Finished(Outcome::Taken) => "taken",
		};
		f.debug_struct("Promise").field("state", &state).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::atomic::{AtomicUsize, Ordering},
		thread,
	};

	use super::*;

	#[derive(Debug, thiserror::Error)]
	#[error("boom")]
	struct Boom;

	#[test]
	fn test_set_result() {
		let promise = Promise::new();
		assert!(!promise.done());
		assert!(promise.set_running_or_notify_cancel());
		assert!(promise.running());

		promise.set_result(42);
		assert!(promise.done());
		assert_eq!(promise.result().unwrap(), 42);
		// results can be read repeatedly
		assert_eq!(promise.result().unwrap(), 42);
		assert!(promise.error().is_none());
	}

	#[test]
	fn test_cancel_before_running() {
		let promise: Promise<i32> = Promise::new();
		assert!(promise.cancel());
		assert!(promise.cancel());
		assert!(promise.cancelled());
		assert!(!promise.set_running_or_notify_cancel());
		assert!(promise.result().unwrap_err().is_cancelled());
	}

	#[test]
	fn test_cancel_after_running_is_noop() {
		let promise = Promise::new();
		assert!(promise.set_running_or_notify_cancel());
		assert!(!promise.cancel());
		assert!(!promise.cancelled());

		promise.set_result("done");
		assert!(!promise.cancel());
		assert_eq!(promise.result().unwrap(), "done");
	}

	#[test]
	fn test_first_outcome_wins() {
		let promise = Promise::new();
		promise.set_result(1);
		promise.set_result(2);
		promise.fail(Boom);
		assert_eq!(promise.result().unwrap(), 1);
	}

	#[test]
	fn test_failure_downcast() {
		let promise: Promise<()> = Promise::new();
		promise.fail(Boom);

		let err = promise.result().unwrap_err();
		assert!(err.downcast_ref::<Boom>().is_some());
		assert_eq!(err.to_string(), "boom");
		assert!(promise.error().unwrap().downcast_ref::<Boom>().is_some());
	}

	#[test]
	fn test_result_timeout() {
		let promise: Promise<i32> = Promise::new();
		let err = promise.result_timeout(Duration::from_millis(10)).unwrap_err();
		assert!(err.is_timeout());
		assert!(!promise.wait_timeout(Duration::from_millis(10)));
		// a timed out wait leaves the promise untouched
		assert!(!promise.done());
	}

	#[test]
	fn test_result_from_other_thread() {
		let promise = Promise::new();
		let producer = promise.clone();

		let handle = thread::spawn(move || {
			thread::sleep(Duration::from_millis(20));
			assert!(producer.set_running_or_notify_cancel());
			producer.set_result(String::from("hello"));
		});

		assert_eq!(promise.result_timeout(Duration::from_secs(5)).unwrap(), "hello");
		handle.join().unwrap();
	}

	#[test]
	fn test_done_callbacks() {
		let promise = Promise::new();
		let counter = Arc::new(AtomicUsize::new(0));

		let counter_clone = counter.clone();
		promise.add_done_callback(move |p: &Promise<i32>| {
			assert_eq!(p.result().unwrap(), 7);
			counter_clone.fetch_add(1, Ordering::SeqCst);
		});
		assert_eq!(counter.load(Ordering::SeqCst), 0);

		promise.set_result(7);
		assert_eq!(counter.load(Ordering::SeqCst), 1);

		// already finished, runs inline
		let counter_clone = counter.clone();
		promise.add_done_callback(move |_| {
			counter_clone.fetch_add(1, Ordering::SeqCst);
		});
		assert_eq!(counter.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_cancel_runs_callbacks() {
		let promise: Promise<()> = Promise::new();
		let counter = Arc::new(AtomicUsize::new(0));

		let counter_clone = counter.clone();
		promise.add_done_callback(move |p| {
			assert!(p.cancelled());
			counter_clone.fetch_add(1, Ordering::SeqCst);
		});

		promise.cancel();
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	/// Not `Clone`, so only reachable through `take`.
	#[derive(Debug, PartialEq)]
	struct Token(u32);

	#[test]
	fn test_take_moves_value_out() {
		let promise = Promise::new();
		let observer = promise.clone();
		promise.set_running_or_notify_cancel();
		promise.set_result(Token(7));

		assert_eq!(observer.take().unwrap(), Token(7));
		assert!(matches!(promise.take(), Err(PromiseError::Taken)));
		assert!(promise.done());
		// the work itself succeeded
		assert!(promise.error().is_none());
		assert_eq!(format!("{promise:?}"), "Promise { state: \"taken\" }");
	}

	#[test]
	fn test_take_reports_failure() {
		let promise: Promise<Token> = Promise::new();
		promise.set_running_or_notify_cancel();
		promise.fail(Boom);

		assert!(promise.take().unwrap_err().downcast_ref::<Boom>().is_some());
		// failures stay readable
		assert!(promise.take().unwrap_err().downcast_ref::<Boom>().is_some());

		let cancelled: Promise<Token> = Promise::new();
		cancelled.cancel();
		assert!(cancelled.take().unwrap_err().is_cancelled());
	}

	#[test]
	fn test_take_timeout() {
		let promise: Promise<Token> = Promise::new();
		assert!(promise.take_timeout(Duration::from_millis(10)).unwrap_err().is_timeout());

		let producer = promise.clone();
		let handle = thread::spawn(move || {
			producer.set_running_or_notify_cancel();
			producer.set_result(Token(1));
		});
		assert_eq!(promise.take_timeout(Duration::from_secs(5)).unwrap(), Token(1));
		handle.join().unwrap();
	}
}
