//! Blocking single-producer single-consumer ring buffer.
//!
//! Unlike a lock-free ring, this buffer lets the producer and consumer
//! *wait* for space or data to become available, with the same
//! block/non-blocking/timeout semantics the DMA transport and the stream
//! handles use everywhere else (see [`Timeout`]). Two semaphores — one
//! counting free slots, one counting filled slots — replace the
//! acquire/release atomic handshake a lock-free ring would use; slot
//! indices themselves are plain `Relaxed` counters because the semaphores
//! already establish the happens-before edges a reader/writer needs.

use core::{cell::UnsafeCell, mem::MaybeUninit, time::Duration};
#[cfg(not(loom))]
use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicUsize, Ordering},
};

#[cfg(loom)]
use loom::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::error::{Result, StreamError};

/// Wait policy shared by the ring and the DMA transport: block forever,
/// return immediately, or give up after a duration.
///
/// Mirrors the hardware driver's `timeout_us` convention (negative =
/// block, zero = non-blocking, positive = microseconds) without resorting
/// to a sentinel integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    Blocking,
    NonBlocking,
    After(Duration),
}

impl From<i64> for Timeout {
    /// `timeout_us < 0` blocks, `== 0` is non-blocking, `> 0` is a duration in microseconds.
    fn from(timeout_us: i64) -> Self {
        match timeout_us {
            us if us < 0 => Timeout::Blocking,
            0 => Timeout::NonBlocking,
            us => Timeout::After(Duration::from_micros(us as u64)),
        }
    }
}

/// A counting semaphore built from a mutex and a condvar.
///
/// Replaces the `sem_t` a DMA driver would reach for in C: `post`
/// increments the count and wakes one waiter, `wait` blocks (subject to
/// [`Timeout`]) until the count is positive, then decrements it.
struct Semaphore {
    count: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    fn new(initial: usize) -> Self {
        Semaphore {
            count: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }

    fn post(&self) {
        let mut count = self.count.lock().unwrap();
        *count += 1;
        self.cond.notify_one();
    }

    fn wait(&self, timeout: Timeout) -> Result<()> {
        let mut count = self.count.lock().unwrap();
        match timeout {
            Timeout::NonBlocking => {
                if *count == 0 {
                    return Err(StreamError::Timeout);
                }
            }
            Timeout::Blocking => {
                while *count == 0 {
                    count = self.cond.wait(count).unwrap();
                }
            }
            Timeout::After(duration) => {
                let mut remaining = duration;
                while *count == 0 {
                    let started = std::time::Instant::now();
                    let (guard, result) = self.cond.wait_timeout(count, remaining).unwrap();
                    count = guard;
                    if result.timed_out() {
                        return Err(StreamError::Timeout);
                    }
                    remaining = remaining.saturating_sub(started.elapsed());
                }
            }
        }
        *count -= 1;
        Ok(())
    }
}

/// Cache-line padded wrapper to prevent false sharing between the
/// producer's and consumer's index counters.
#[repr(align(64))]
struct CachePadded<T>(T);

impl<T> core::ops::Deref for CachePadded<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

struct Inner<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    capacity: usize,
    mask: usize,
    write_index: CachePadded<AtomicUsize>,
    read_index: CachePadded<AtomicUsize>,
    free_slots: Semaphore,
    filled_slots: Semaphore,
}

// SAFETY: access to `buffer` slots is serialized by the semaphores: a
// slot is only ever written between `producer_wait` and `producer_post`,
// and only ever read between `consumer_wait` and `consumer_post`, and
// those two windows never overlap for the same slot.
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send> Sync for Inner<T> {}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let write = *self.write_index.get_mut();
        let read = *self.read_index.get_mut();
        for i in read..write {
            let index = i & self.mask;
            // SAFETY: slots in [read, write) were written by the producer
            // and never consumed.
            unsafe {
                let ptr = (*self.buffer[index].get()).as_mut_ptr();
                core::ptr::drop_in_place(ptr);
            }
        }
    }
}

/// Creates a producer/consumer pair backed by a ring of `capacity` slots
/// (rounded up to the next power of two).
pub fn ring<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let capacity = capacity.next_power_of_two().max(1);
    let buffer: Vec<UnsafeCell<MaybeUninit<T>>> =
        (0..capacity).map(|_| UnsafeCell::new(MaybeUninit::uninit())).collect();
    let inner = Arc::new(Inner {
        buffer: buffer.into_boxed_slice(),
        capacity,
        mask: capacity - 1,
        write_index: CachePadded(AtomicUsize::new(0)),
        read_index: CachePadded(AtomicUsize::new(0)),
        free_slots: Semaphore::new(capacity),
        filled_slots: Semaphore::new(0),
    });
    (
        Producer {
            inner: Arc::clone(&inner),
        },
        Consumer { inner },
    )
}

/// Producer half of a [`ring`]. `Send` but not `Clone` — exactly one producer exists.
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
}

unsafe impl<T: Send> Send for Producer<T> {}

impl<T> Producer<T> {
    /// Waits (per `timeout`) for a free slot, writes `value` into it, and
    /// wakes the consumer.
    pub fn push(&mut self, value: T, timeout: Timeout) -> Result<()> {
        self.inner.free_slots.wait(timeout)?;
        let index = self.inner.write_index.load(Ordering::Relaxed) & self.inner.mask;
        // SAFETY: free_slots.wait just reserved this slot exclusively for us.
        unsafe {
            (*self.inner.buffer[index].get()).write(value);
        }
        self.inner.write_index.fetch_add(1, Ordering::Relaxed);
        self.inner.filled_slots.post();
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

/// Consumer half of a [`ring`]. `Send` but not `Clone` — exactly one consumer exists.
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
}

unsafe impl<T: Send> Send for Consumer<T> {}

impl<T> Consumer<T> {
    /// Waits (per `timeout`) for a filled slot, reads it out, and wakes the producer.
    pub fn pop(&mut self, timeout: Timeout) -> Result<T> {
        self.inner.filled_slots.wait(timeout)?;
        let index = self.inner.read_index.load(Ordering::Relaxed) & self.inner.mask;
        // SAFETY: filled_slots.wait just reserved this slot exclusively for us.
        let value = unsafe { (*self.inner.buffer[index].get()).assume_init_read() };
        self.inner.read_index.fetch_add(1, Ordering::Relaxed);
        self.inner.free_slots.post();
        Ok(value)
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use std::{rc::Rc, thread};

    use super::*;

    #[test]
    fn push_then_pop_in_order() {
        let (mut producer, mut consumer) = ring::<i32>(4);
        producer.push(1, Timeout::Blocking).unwrap();
        producer.push(2, Timeout::Blocking).unwrap();
        assert_eq!(consumer.pop(Timeout::Blocking).unwrap(), 1);
        assert_eq!(consumer.pop(Timeout::Blocking).unwrap(), 2);
    }

    #[test]
    fn non_blocking_pop_on_empty_times_out() {
        let (_producer, mut consumer) = ring::<i32>(4);
        assert!(matches!(consumer.pop(Timeout::NonBlocking), Err(StreamError::Timeout)));
    }

    #[test]
    fn non_blocking_push_on_full_times_out() {
        let (mut producer, _consumer) = ring::<i32>(2);
        producer.push(1, Timeout::Blocking).unwrap();
        producer.push(2, Timeout::Blocking).unwrap();
        assert!(matches!(producer.push(3, Timeout::NonBlocking), Err(StreamError::Timeout)));
    }

    #[test]
    fn after_timeout_expires_on_empty_ring() {
        let (_producer, mut consumer) = ring::<i32>(4);
        let start = std::time::Instant::now();
        let result = consumer.pop(Timeout::After(Duration::from_millis(20)));
        assert!(matches!(result, Err(StreamError::Timeout)));
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        let (producer, _consumer) = ring::<i32>(3);
        assert_eq!(producer.capacity(), 4);
        let (producer, _consumer) = ring::<i32>(0);
        assert_eq!(producer.capacity(), 1);
    }

    #[test]
    fn blocking_consumer_wakes_on_push() {
        let (mut producer, mut consumer) = ring::<i32>(4);
        let handle = thread::spawn(move || consumer.pop(Timeout::Blocking).unwrap());
        thread::sleep(Duration::from_millis(20));
        producer.push(7, Timeout::Blocking).unwrap();
        assert_eq!(handle.join().unwrap(), 7);
    }

    #[test]
    fn timeout_from_i64_matches_driver_convention() {
        assert_eq!(Timeout::from(-1), Timeout::Blocking);
        assert_eq!(Timeout::from(0), Timeout::NonBlocking);
        assert_eq!(Timeout::from(1_000), Timeout::After(Duration::from_micros(1_000)));
    }

    #[test]
    fn drop_releases_remaining_items() {
        let counter = Rc::new(());
        {
            let (mut producer, _consumer) = ring::<Rc<()>>(4);
            producer.push(Rc::clone(&counter), Timeout::Blocking).unwrap();
            producer.push(Rc::clone(&counter), Timeout::Blocking).unwrap();
            assert_eq!(Rc::strong_count(&counter), 3);
        }
        assert_eq!(Rc::strong_count(&counter), 1);
    }

    #[test]
    fn wraparound_preserves_order() {
        let (mut producer, mut consumer) = ring::<i32>(4);
        for round in 0..10 {
            for i in 0..4 {
                producer.push(round * 10 + i, Timeout::Blocking).unwrap();
            }
            for i in 0..4 {
                assert_eq!(consumer.pop(Timeout::Blocking).unwrap(), round * 10 + i);
            }
        }
    }
}

#[cfg(loom)]
mod loom_tests {
    use loom::thread;

    use super::*;

    #[test]
    fn loom_push_pop_single_slot() {
        loom::model(|| {
            let (mut producer, mut consumer) = ring::<i32>(1);
            let producer_thread = thread::spawn(move || producer.push(42, Timeout::Blocking).unwrap());
            let consumer_thread = thread::spawn(move || consumer.pop(Timeout::Blocking).unwrap());
            producer_thread.join().unwrap();
            assert_eq!(consumer_thread.join().unwrap(), 42);
        });
    }

    #[test]
    fn loom_two_items_in_order() {
        loom::model(|| {
            let (mut producer, mut consumer) = ring::<i32>(2);
            let producer_thread = thread::spawn(move || {
                producer.push(1, Timeout::Blocking).unwrap();
                producer.push(2, Timeout::Blocking).unwrap();
            });
            let consumer_thread = thread::spawn(move || {
                let a = consumer.pop(Timeout::Blocking).unwrap();
                let b = consumer.pop(Timeout::Blocking).unwrap();
                (a, b)
            });
            producer_thread.join().unwrap();
            assert_eq!(consumer_thread.join().unwrap(), (1, 2));
        });
    }
}
