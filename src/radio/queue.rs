//! # Event Queue
//!
//! Fixed-capacity single-producer/single-consumer ring buffer that moves
//! radio events from the library's callback context into the thread that
//! polls the driver.
//!
//! ## Concurrency
//!
//! `EventQueue::with_capacity(n).split()` yields one `Producer` and one
//! `Consumer`. Neither is `Clone`, so there is exactly one side of each.
//! No operation blocks or takes a lock:
//!
//! - `tail` is written only by the producer, `head` only by the consumer
//! - the slot at `tail` belongs to the producer until `tail` is published
//! - the slots in `head..tail` belong to the consumer
//!
//! Both indices are free-running counters and the fill level is
//! `tail - head`, so all `capacity` records are usable. The slot array is
//! rounded up to a power of two and the slot is `index & mask`, which stays
//! continuous when the counters wrap at `usize::MAX`.
//!
//! ## Overflow
//!
//! A push into a full queue hands the item back and bumps an overflow
//! counter. Stored records are never touched, so the oldest are preserved
//! and the newest is dropped.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Error returned by `Producer::push` on a full queue, carrying the item back
pub struct QueueFull<T>(pub T);

impl<T> QueueFull<T> {
    /// Recover the rejected item
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QueueFull(..)")
    }
}

impl<T> fmt::Display for QueueFull<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("event queue full")
    }
}

impl<T> std::error::Error for QueueFull<T> {}

/// Counters of the event queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Records accepted
    pub pushes: u64,
    /// Records rejected because the queue was full
    pub overflows: u64,
    /// Records currently queued
    pub depth: usize,
    /// Highest fill level observed
    pub high_water: usize,
}

struct Ring<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Records the queue may hold; `slots` can be larger
    capacity: usize,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    pushes: AtomicU64,
    overflows: AtomicU64,
    high_water: AtomicUsize,
}

// The index discipline above gives each slot a single owner at a time.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn slot(&self, index: usize) -> *mut MaybeUninit<T> {
        self.slots[index & self.mask].get()
    }

    fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let mut index = head;
        while index != tail {
            // # Safety
            //
            // Both halves are gone, and every slot in head..tail holds an
            // initialized value that has not been moved out.
            unsafe { (*self.slot(index)).assume_init_drop() };
            index = index.wrapping_add(1);
        }
    }
}

/// Owner of a ring buffer before it is split
pub struct EventQueue<T> {
    ring: Arc<Ring<T>>,
}

impl<T: Send> EventQueue<T> {
    /// Create a queue holding at most `capacity` records.
    ///
    /// # Panics
    ///
    /// This function panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "event queue capacity must be non-zero");

        let slot_count = capacity.next_power_of_two();
        let slots = (0..slot_count)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            ring: Arc::new(Ring {
                slots,
                capacity,
                mask: slot_count - 1,
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
                pushes: AtomicU64::new(0),
                overflows: AtomicU64::new(0),
                high_water: AtomicUsize::new(0),
            }),
        }
    }

    /// Split into the callback-side producer and the poll-side consumer
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        (
            Producer {
                ring: Arc::clone(&self.ring),
            },
            Consumer { ring: self.ring },
        )
    }
}

/// Callback-context half of the queue
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Producer<T> {
    /// Append `item`, or hand it back if the queue is full.
    pub fn push(&mut self, item: T) -> Result<(), QueueFull<T>> {
        let ring = &*self.ring;
        let tail = ring.tail.load(Ordering::Relaxed);
        let head = ring.head.load(Ordering::Acquire);
        let len = tail.wrapping_sub(head);

        if len >= ring.capacity() {
            ring.overflows.fetch_add(1, Ordering::Relaxed);
            return Err(QueueFull(item));
        }

        // # Safety
        //
        // `len < capacity`, so the slot at `tail` is outside head..tail and
        // only the producer may write it until `tail` is published below.
        unsafe { (*ring.slot(tail)).write(item) };
        ring.tail.store(tail.wrapping_add(1), Ordering::Release);

        ring.pushes.fetch_add(1, Ordering::Relaxed);
        ring.high_water.fetch_max(len + 1, Ordering::Relaxed);
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.ring.len() >= self.ring.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// Poll-context half of the queue
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Consumer<T> {
    /// Borrow the oldest record without removing it.
    pub fn peek(&self) -> Option<&T> {
        let ring = &*self.ring;
        let head = ring.head.load(Ordering::Relaxed);
        let tail = ring.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        // # Safety
        //
        // The slot at `head` is initialized (head != tail) and owned by the
        // consumer; it cannot be moved out while `&self` is borrowed because
        // `poll` takes `&mut self`.
        Some(unsafe { (*ring.slot(head)).assume_init_ref() })
    }

    /// Borrow every queued record, oldest first, without removing any.
    pub fn iter(&self) -> Iter<'_, T> {
        let ring = &*self.ring;
        Iter {
            ring,
            index: ring.head.load(Ordering::Relaxed),
            tail: ring.tail.load(Ordering::Acquire),
        }
    }

    /// Mutable access to the record `offset` places behind the oldest.
    pub fn get_mut(&mut self, offset: usize) -> Option<&mut T> {
        let ring = &*self.ring;
        let head = ring.head.load(Ordering::Relaxed);
        let tail = ring.tail.load(Ordering::Acquire);

        if offset >= tail.wrapping_sub(head) {
            return None;
        }

        // # Safety
        //
        // The slot lies in head..tail, so it is initialized and only the
        // consumer touches it; `&mut self` rules out any other borrow.
        Some(unsafe { (*ring.slot(head.wrapping_add(offset))).assume_init_mut() })
    }

    /// Remove and return the oldest record.
    pub fn poll(&mut self) -> Option<T> {
        let ring = &*self.ring;
        let head = ring.head.load(Ordering::Relaxed);
        let tail = ring.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        // # Safety
        //
        // As in `peek`; the value is moved out exactly once before `head`
        // is advanced, after which the producer may reuse the slot.
        let item = unsafe { (*ring.slot(head)).assume_init_read() };
        ring.head.store(head.wrapping_add(1), Ordering::Release);
        Some(item)
    }

    /// Remove the oldest record when the caller has no use for its data.
    ///
    /// Returns `false` if the queue was empty.
    pub fn discard(&mut self) -> bool {
        self.poll().is_some()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Number of pushes rejected so far
    pub fn overflows(&self) -> u64 {
        self.ring.overflows.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pushes: self.ring.pushes.load(Ordering::Relaxed),
            overflows: self.overflows(),
            depth: self.len(),
            high_water: self.ring.high_water.load(Ordering::Relaxed),
        }
    }
}

/// Iterator over the records of a `Consumer`, oldest first
pub struct Iter<'a, T> {
    ring: &'a Ring<T>,
    index: usize,
    tail: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.index == self.tail {
            return None;
        }
        let slot = self.ring.slot(self.index);
        self.index = self.index.wrapping_add(1);

        // # Safety
        //
        // `tail` was read with Acquire when the iterator was created, so
        // every slot before it is initialized. The iterator borrows the
        // consumer, which keeps `poll` from moving any of them out.
        Some(unsafe { (*slot).assume_init_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.tail.wrapping_sub(self.index);
        (len, Some(len))
    }
}
