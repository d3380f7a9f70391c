// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Closable FIFO queues.
//!
//! A queue carries items from any number of producers to a consumer until it
//! is closed. Closing is permanent and distinct from being empty or full, so a
//! caller can tell "try again" ([`QueueError::Empty`], [`QueueError::Full`])
//! apart from "this channel is gone" ([`QueueError::Closed`]).
//!
//! - [`Queue`]: bounded or unbounded FIFO
//! - [`ZeroQueue`]: zero capacity; nothing ever transfers, every blocking call
//!   waits for the close

use std::{
	collections::VecDeque,
	fmt,
	sync::Arc,
	time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};

mod zero;

pub use zero::ZeroQueue;

/// Failure of a queue operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
	/// `put` on a closed queue, or `get` on a queue that is closed and empty.
	#[error("queue is closed")]
	Closed,

	/// Non-blocking `get` on an open, empty queue.
	#[error("queue is empty")]
	Empty,

	/// Non-blocking `put` on an open, full queue.
	#[error("queue is full")]
	Full,

	/// A timed `put`/`get` could not complete in time.
	#[error("timed out waiting on queue")]
	Timeout,
}

/// Operations shared by every closable queue.
pub trait ClosableQueue<T>: Send + Sync {
	/// Append `item`, blocking while the queue is full.
	fn put(&self, item: T) -> Result<(), QueueError>;

	/// Like [`ClosableQueue::put`], failing with [`QueueError::Timeout`] once
	/// `timeout` expires.
	fn put_timeout(&self, item: T, timeout: Duration) -> Result<(), QueueError>;

	/// Append `item` or fail with [`QueueError::Full`] right away.
	fn try_put(&self, item: T) -> Result<(), QueueError>;

	/// Remove the oldest item, blocking while the queue is empty and open.
	///
	/// Items queued before a graceful close are still returned.
	fn get(&self) -> Result<T, QueueError>;

	fn get_timeout(&self, timeout: Duration) -> Result<T, QueueError>;

	/// Remove the oldest item or fail with [`QueueError::Empty`] right away.
	fn try_get(&self) -> Result<T, QueueError>;

	/// Close the queue and wake every blocked caller.
	///
	/// A graceful close keeps queued items for later `get` calls and returns
	/// nothing. A hard close evicts and returns every queued item. Closing an
	/// already closed queue returns nothing.
	fn close(&self, graceful: bool) -> Vec<T>;

	fn is_closed(&self) -> bool;

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn is_full(&self) -> bool;

	/// Block until the queue is closed.
	fn until_closed(&self);

	/// Block until the queue is closed or `timeout` expires; returns whether it
	/// is closed.
	fn until_closed_timeout(&self, timeout: Duration) -> bool;
}

/// Maximum number of queued items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
	Unbounded,
	Bounded(usize),
}

impl Capacity {
	fn is_full(self, len: usize) -> bool {
		match self {
			Capacity::Unbounded => false,
			Capacity::Bounded(capacity) => len >= capacity,
		}
	}
}

struct State<T> {
	items: VecDeque<T>,
	closed: bool,
}

struct Inner<T> {
	capacity: Capacity,
	state: Mutex<State<T>>,
	has_item: Condvar,
	has_vacancy: Condvar,
	closed: Condvar,
}

/// A closable FIFO queue.
///
/// Cloning yields another handle to the same queue.
pub struct Queue<T> {
	inner: Arc<Inner<T>>,
}

impl<T> Clone for Queue<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> Queue<T> {
	/// Create a queue holding at most `capacity` items. 0 = unbounded.
	pub fn new(capacity: usize) -> Self {
		if capacity == 0 {
			Self::unbounded()
		} else {
			Self::bounded(capacity)
		}
	}

	pub fn unbounded() -> Self {
		Self::with_capacity(Capacity::Unbounded)
	}

	/// Create a queue holding at most `capacity` items.
	///
	/// `bounded(0)` never holds an item: `put` blocks until the queue is
	/// closed, and the non-blocking calls fail while it is open.
	pub fn bounded(capacity: usize) -> Self {
		Self::with_capacity(Capacity::Bounded(capacity))
	}

	fn with_capacity(capacity: Capacity) -> Self {
		Self {
			inner: Arc::new(Inner {
				capacity,
				state: Mutex::new(State {
					items: VecDeque::new(),
					closed: false,
				}),
				has_item: Condvar::new(),
				has_vacancy: Condvar::new(),
				closed: Condvar::new(),
			}),
		}
	}

	pub fn capacity(&self) -> Capacity {
		self.inner.capacity
	}

	fn put_until(&self, item: T, deadline: Option<Instant>) -> Result<(), QueueError> {
		let mut state = self.inner.state.lock();
		let mut timed_out = false;
		loop {
			if state.closed {
				return Err(QueueError::Closed);
			}
			if !self.inner.capacity.is_full(state.items.len()) {
				break;
			}
			if timed_out {
				return Err(QueueError::Timeout);
			}
			timed_out = !wait(&self.inner.has_vacancy, &mut state, deadline);
		}
		state.items.push_back(item);
		drop(state);
		self.inner.has_item.notify_one();
		Ok(())
	}

	fn get_until(&self, deadline: Option<Instant>) -> Result<T, QueueError> {
		let mut state = self.inner.state.lock();
		let mut timed_out = false;
		loop {
			if let Some(item) = state.items.pop_front() {
				drop(state);
				self.inner.has_vacancy.notify_one();
				return Ok(item);
			}
			if state.closed {
				return Err(QueueError::Closed);
			}
			if timed_out {
				return Err(QueueError::Timeout);
			}
			timed_out = !wait(&self.inner.has_item, &mut state, deadline);
		}
	}

	fn closed_until(&self, deadline: Option<Instant>) -> bool {
		let mut state = self.inner.state.lock();
		while !state.closed {
			if !wait(&self.inner.closed, &mut state, deadline) {
				return state.closed;
			}
		}
		true
	}
}

/// Wait on `condvar`; returns `false` if `deadline` passed first.
fn wait<T>(condvar: &Condvar, guard: &mut MutexGuard<'_, T>, deadline: Option<Instant>) -> bool {
	match deadline {
		None => {
			condvar.wait(guard);
			true
		}
		Some(deadline) => !condvar.wait_until(guard, deadline).timed_out(),
	}
}

impl<T: Send> ClosableQueue<T> for Queue<T> {
	fn put(&self, item: T) -> Result<(), QueueError> {
		self.put_until(item, None)
	}

	fn put_timeout(&self, item: T, timeout: Duration) -> Result<(), QueueError> {
		self.put_until(item, Some(Instant::now() + timeout))
	}

	fn try_put(&self, item: T) -> Result<(), QueueError> {
		let mut state = self.inner.state.lock();
		if state.closed {
			return Err(QueueError::Closed);
		}
		if self.inner.capacity.is_full(state.items.len()) {
			return Err(QueueError::Full);
		}
		state.items.push_back(item);
		drop(state);
		self.inner.has_item.notify_one();
		Ok(())
	}

	fn get(&self) -> Result<T, QueueError> {
		self.get_until(None)
	}

	fn get_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
		self.get_until(Some(Instant::now() + timeout))
	}

	fn try_get(&self) -> Result<T, QueueError> {
		let mut state = self.inner.state.lock();
		match state.items.pop_front() {
			Some(item) => {
				drop(state);
				self.inner.has_vacancy.notify_one();
				Ok(item)
			}
			None if state.closed => Err(QueueError::Closed),
			None => Err(QueueError::Empty),
		}
	}

	fn close(&self, graceful: bool) -> Vec<T> {
		let mut state = self.inner.state.lock();
		if state.closed {
			return Vec::new();
		}
		state.closed = true;
		let evicted = if graceful {
			Vec::new()
		} else {
			state.items.drain(..).collect()
		};
		drop(state);

		self.inner.has_item.notify_all();
		self.inner.has_vacancy.notify_all();
		self.inner.closed.notify_all();
		evicted
	}

	fn is_closed(&self) -> bool {
		self.inner.state.lock().closed
	}

	fn len(&self) -> usize {
		self.inner.state.lock().items.len()
	}

	fn is_full(&self) -> bool {
		self.inner.capacity.is_full(self.len())
	}

	fn until_closed(&self) {
		self.closed_until(None);
	}

	fn until_closed_timeout(&self, timeout: Duration) -> bool {
		self.closed_until(Some(Instant::now() + timeout))
	}
}

impl<T> fmt::Debug for Queue<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("Queue")
			.field("capacity", &self.inner.capacity)
			.field("len", &state.items.len())
			.field("closed", &state.closed)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::{Arc, Barrier},
		thread,
	};

	use super::*;

	#[test]
	fn test_fifo() {
		let queue = Queue::new(3);
		for i in [1, 2, 3] {
			queue.try_put(i).unwrap();
		}
		assert!(queue.is_full());
		assert_eq!(queue.try_put(999), Err(QueueError::Full));

		for i in [1, 2, 3] {
			assert_eq!(queue.try_get().unwrap(), i);
		}
		assert!(queue.is_empty());
		assert_eq!(queue.try_get(), Err(QueueError::Empty));
	}

	#[test]
	fn test_unbounded() {
		let queue = Queue::new(0);
		assert_eq!(queue.capacity(), Capacity::Unbounded);
		for i in 0..1000 {
			queue.try_put(i).unwrap();
		}
		assert!(!queue.is_full());
		assert_eq!(queue.len(), 1000);
		assert_eq!(queue.get().unwrap(), 0);
	}

	#[test]
	fn test_graceful_close_drains() {
		let queue = Queue::unbounded();
		queue.put(1).unwrap();
		queue.put(2).unwrap();
		queue.put(3).unwrap();

		assert!(queue.close(true).is_empty());
		assert!(queue.is_closed());
		assert_eq!(queue.put(4), Err(QueueError::Closed));
		assert_eq!(queue.try_put(4), Err(QueueError::Closed));

		assert_eq!(queue.get().unwrap(), 1);
		assert_eq!(queue.get().unwrap(), 2);
		assert_eq!(queue.try_get().unwrap(), 3);

		assert_eq!(queue.get(), Err(QueueError::Closed));
		assert_eq!(queue.try_get(), Err(QueueError::Closed));
	}

	#[test]
	fn test_hard_close_evicts() {
		let queue = Queue::unbounded();
		queue.put("a").unwrap();
		queue.put("b").unwrap();

		assert_eq!(queue.close(false), vec!["a", "b"]);
		assert!(queue.is_empty());
		assert_eq!(queue.get(), Err(QueueError::Closed));
	}

	#[test]
	fn test_close_is_idempotent() {
		let queue = Queue::unbounded();
		queue.put(1).unwrap();

		assert!(queue.close(true).is_empty());
		assert!(queue.close(false).is_empty());
		assert!(queue.is_closed());
		// the second close did not evict anything
		assert_eq!(queue.get().unwrap(), 1);
	}

	#[test]
	fn test_close_wakes_blocked_getters() {
		let queue: Queue<i32> = Queue::unbounded();
		let waiters = 4;
		let barrier = Arc::new(Barrier::new(waiters + 1));

		let handles: Vec<_> = (0..waiters)
			.map(|_| {
				let queue = queue.clone();
				let barrier = barrier.clone();
				thread::spawn(move || {
					barrier.wait();
					queue.get()
				})
			})
			.collect();

		barrier.wait();
		thread::sleep(Duration::from_millis(20));
		queue.close(true);

		for handle in handles {
			assert_eq!(handle.join().unwrap(), Err(QueueError::Closed));
		}
	}

	#[test]
	fn test_close_wakes_blocked_putter() {
		let queue = Queue::bounded(1);
		queue.put(1).unwrap();

		let producer = queue.clone();
		let handle = thread::spawn(move || producer.put(2));

		thread::sleep(Duration::from_millis(20));
		assert_eq!(queue.close(false), vec![1]);
		assert_eq!(handle.join().unwrap(), Err(QueueError::Closed));
	}

	#[test]
	fn test_blocked_put_resumes_on_vacancy() {
		let queue = Queue::bounded(1);
		queue.put(1).unwrap();

		let producer = queue.clone();
		let handle = thread::spawn(move || producer.put(2));

		thread::sleep(Duration::from_millis(20));
		assert_eq!(queue.get().unwrap(), 1);
		handle.join().unwrap().unwrap();
		assert_eq!(queue.get().unwrap(), 2);
	}

	#[test]
	fn test_blocked_get_resumes_on_put() {
		let queue = Queue::unbounded();

		let consumer = queue.clone();
		let handle = thread::spawn(move || consumer.get());

		thread::sleep(Duration::from_millis(20));
		queue.put(7).unwrap();
		assert_eq!(handle.join().unwrap(), Ok(7));
	}

	#[test]
	fn test_timeouts() {
		let queue = Queue::bounded(1);
		assert_eq!(queue.get_timeout(Duration::from_millis(10)), Err(QueueError::Timeout));

		queue.put(1).unwrap();
		assert_eq!(queue.put_timeout(2, Duration::from_millis(10)), Err(QueueError::Timeout));
		assert_eq!(queue.get_timeout(Duration::from_millis(10)), Ok(1));

		queue.close(true);
		assert_eq!(queue.put_timeout(3, Duration::from_millis(10)), Err(QueueError::Closed));
		assert_eq!(queue.get_timeout(Duration::from_millis(10)), Err(QueueError::Closed));
	}

	#[test]
	fn test_zero_capacity() {
		let queue = Queue::bounded(0);
		assert!(queue.is_full());
		assert!(queue.is_empty());
		assert_eq!(queue.try_put(1), Err(QueueError::Full));
		assert_eq!(queue.try_get(), Err(QueueError::Empty));
		assert_eq!(queue.put_timeout(1, Duration::from_millis(10)), Err(QueueError::Timeout));

		let producer = queue.clone();
		let handle = thread::spawn(move || producer.put(1));
		thread::sleep(Duration::from_millis(20));
		queue.close(true);

		assert_eq!(handle.join().unwrap(), Err(QueueError::Closed));
		assert_eq!(queue.try_put(1), Err(QueueError::Closed));
		assert_eq!(queue.get(), Err(QueueError::Closed));
	}

	#[test]
	fn test_until_closed() {
		let queue: Queue<()> = Queue::unbounded();
		assert!(!queue.until_closed_timeout(Duration::from_millis(10)));

		let watcher = queue.clone();
		let handle = thread::spawn(move || watcher.until_closed());

		thread::sleep(Duration::from_millis(20));
		queue.close(true);
		handle.join().unwrap();
		assert!(queue.until_closed_timeout(Duration::ZERO));
	}

	#[test]
	fn test_many_producers() {
		let queue = Queue::bounded(4);
		let producers: Vec<_> = (0..4)
			.map(|p| {
				let queue = queue.clone();
				thread::spawn(move || {
					for i in 0..100 {
						queue.put((p, i)).unwrap();
					}
				})
			})
			.collect();

		let mut last = [-1i32; 4];
		for _ in 0..400 {
			let (p, i) = queue.get().unwrap();
			// each producer's items arrive in the order it sent them
			assert!(i > last[p]);
			last[p] = i;
		}
		for producer in producers {
			producer.join().unwrap();
		}
		assert!(queue.is_empty());
	}
}
