// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Zero-capacity queue.

use std::{
	fmt,
	marker::PhantomData,
	sync::Arc,
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use super::{ClosableQueue, QueueError};

struct Inner {
	closed: Mutex<bool>,
	signal: Condvar,
}

/// A queue that never holds an item.
///
/// Every blocking `put`/`get` waits until the queue is closed and then fails
/// with [`QueueError::Closed`]; the non-blocking calls fail with
/// [`QueueError::Full`]/[`QueueError::Empty`] while it is open. Useful as a
/// pure backpressure gate.
pub struct ZeroQueue<T> {
	inner: Arc<Inner>,
	_marker: PhantomData<fn(T)>,
}

impl<T> Clone for ZeroQueue<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			_marker: PhantomData,
		}
	}
}

impl<T> Default for ZeroQueue<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> ZeroQueue<T> {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(Inner {
				closed: Mutex::new(false),
				signal: Condvar::new(),
			}),
			_marker: PhantomData,
		}
	}

	/// Block until closed or `deadline`; returns whether the queue is closed.
	fn wait_closed(&self, deadline: Option<Instant>) -> bool {
		let mut closed = self.inner.closed.lock();
		while !*closed {
			match deadline {
				None => self.inner.signal.wait(&mut closed),
				Some(deadline) => {
					if self.inner.signal.wait_until(&mut closed, deadline).timed_out() {
						return *closed;
					}
				}
			}
		}
		true
	}

	fn block(&self, deadline: Option<Instant>) -> QueueError {
		if self.wait_closed(deadline) {
			QueueError::Closed
		} else {
			QueueError::Timeout
		}
	}
}

impl<T> ClosableQueue<T> for ZeroQueue<T> {
	fn put(&self, _item: T) -> Result<(), QueueError> {
		Err(self.block(None))
	}

	fn put_timeout(&self, _item: T, timeout: Duration) -> Result<(), QueueError> {
		Err(self.block(Some(Instant::now() + timeout)))
	}

	fn try_put(&self, _item: T) -> Result<(), QueueError> {
		if self.is_closed() {
			Err(QueueError::Closed)
		} else {
			Err(QueueError::Full)
		}
	}

	fn get(&self) -> Result<T, QueueError> {
		Err(self.block(None))
	}

	fn get_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
		Err(self.block(Some(Instant::now() + timeout)))
	}

	fn try_get(&self) -> Result<T, QueueError> {
		if self.is_closed() {
			Err(QueueError::Closed)
		} else {
			Err(QueueError::Empty)
		}
	}

	fn close(&self, _graceful: bool) -> Vec<T> {
		*self.inner.closed.lock() = true;
		self.inner.signal.notify_all();
		Vec::new()
	}

	fn is_closed(&self) -> bool {
		*self.inner.closed.lock()
	}

	fn len(&self) -> usize {
		0
	}

	fn is_full(&self) -> bool {
		true
	}

	fn until_closed(&self) {
		self.wait_closed(None);
	}

	fn until_closed_timeout(&self, timeout: Duration) -> bool {
		self.wait_closed(Some(Instant::now() + timeout))
	}
}

impl<T> fmt::Debug for ZeroQueue<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ZeroQueue").field("closed", &self.is_closed()).finish()
	}
}
