//! Lock-Free Sample FIFOs
//!
//! Single-producer/single-consumer rings used to move audio from the
//! real-time callback to the analysis side without locks. Capacity is
//! fixed at construction; when the ring is full the producer reclaims
//! the oldest unread slot instead of blocking or failing, so the audio
//! thread never waits on the consumer (bounded staleness, never
//! backpressure).
//!
//! # Architecture
//!
//! ```text
//! audio thread            analysis task
//! push(&block) ──slots──▶ pop(&mut block)
//!        head/tail: two atomic counters, no mutex, no allocation
//! ```
//!
//! Overwriting the oldest slot can collide with a consumer that is
//! copying it out; the consumer detects this (its tail claim fails) and
//! discards the copy, so torn data is never observed.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared<T> {
    slots: Box<[UnsafeCell<T>]>,
    /// Next write position (monotonic)
    head: AtomicUsize,
    /// Next read position (monotonic)
    tail: AtomicUsize,
}

// The protocol guarantees a slot is only accessed mutably by one side
// at a time, or the racing copy is discarded; T just has to be Send.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send> Sync for Shared<T> {}

/// Write half of an overwrite-oldest SPSC ring
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

/// Read half of an overwrite-oldest SPSC ring
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

/// Create a ring with `capacity` preallocated slots seeded by `seed`
///
/// Slots are reused for the lifetime of the ring; `push` copies into a
/// slot with `clone_from`, which for equal-size buffers does not
/// allocate. A zero capacity is promoted to one slot.
pub fn channel<T: Clone>(capacity: usize, seed: impl Fn() -> T) -> (Producer<T>, Consumer<T>) {
    let capacity = capacity.max(1);
    let slots: Box<[UnsafeCell<T>]> = (0..capacity).map(|_| UnsafeCell::new(seed())).collect();

    let shared = Arc::new(Shared {
        slots,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });

    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

impl<T: Clone> Producer<T> {
    /// Copy `value` into the ring
    ///
    /// # Real-time Safety
    /// Never blocks, never allocates (after slot warm-up), never fails:
    /// a full ring drops its oldest unread entry.
    #[inline]
    pub fn push(&mut self, value: &T) {
        let shared = &*self.shared;
        let capacity = shared.slots.len();

        let head = shared.head.load(Ordering::Relaxed);
        let tail = shared.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= capacity {
            // Full: reclaim the oldest slot. If the consumer advanced
            // tail in the meantime there is room and the failed claim
            // costs nothing - either way exactly one slot is free now.
            let _ = shared.tail.compare_exchange(
                tail,
                tail.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            );
        }

        let slot = shared.slots[head % capacity].get();
        // Safety: this index is either unwritten space ahead of the
        // consumer or the slot just reclaimed above; a consumer racing
        // on the reclaimed slot discards its copy when its tail claim
        // fails.
        unsafe { (*slot).clone_from(value) };

        shared.head.store(head.wrapping_add(1), Ordering::Release);
    }

    /// Number of unread entries currently in the ring
    pub fn len(&self) -> usize {
        // Tail first: it never passes head, so the difference cannot
        // underflow even against a racing consumer
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }
}

impl<T: Clone> Consumer<T> {
    /// Copy the oldest unread entry into `out`
    ///
    /// Returns `false` without touching `out`'s logical content when
    /// the ring is empty - the consumer keeps using its previous data
    /// rather than waiting.
    pub fn pop(&mut self, out: &mut T) -> bool {
        let shared = &*self.shared;
        let capacity = shared.slots.len();

        loop {
            let tail = shared.tail.load(Ordering::Acquire);
            let head = shared.head.load(Ordering::Acquire);
            if head == tail {
                return false;
            }

            let slot = shared.slots[tail % capacity].get();
            // Safety: the copy may race with the producer reclaiming
            // this slot; the claim below fails in that case and the
            // (possibly torn) copy is redone from the new tail.
            unsafe { out.clone_from(&*slot) };

            if shared
                .tail
                .compare_exchange(
                    tail,
                    tail.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Drain the ring, keeping only the newest entry
    ///
    /// Returns `true` if at least one entry was read.
    pub fn pop_latest(&mut self, out: &mut T) -> bool {
        let mut any = false;
        while self.pop(out) {
            any = true;
        }
        any
    }

    /// Number of unread entries currently in the ring
    pub fn len(&self) -> usize {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }
}

/// Producer-side block accumulator for one audio channel
///
/// The host delivers blocks of varying length; the analysis pipeline
/// wants fixed-size blocks. This type buffers samples until a full
/// block is ready, then pushes it into the ring in one piece.
pub struct ChannelSampleFifo {
    buffer: Vec<f32>,
    fill: usize,
    producer: Producer<Vec<f32>>,
}

impl ChannelSampleFifo {
    /// Create the producer-side accumulator and its consumer half
    ///
    /// `block_len` is the fixed block size delivered to the consumer;
    /// `capacity` is how many blocks the ring holds. Both are fixed for
    /// the lifetime of the FIFO - a new sample rate or block size means
    /// a new FIFO.
    pub fn new(block_len: usize, capacity: usize) -> (Self, Consumer<Vec<f32>>) {
        let block_len = block_len.max(1);
        let (producer, consumer) = channel(capacity, || vec![0.0_f32; block_len]);

        (
            Self {
                buffer: vec![0.0; block_len],
                fill: 0,
                producer,
            },
            consumer,
        )
    }

    /// Append one sample; pushes a block downstream whenever one fills
    ///
    /// # Real-time Safety
    /// No allocations, no locks, O(1) amortized.
    #[inline]
    pub fn push_sample(&mut self, sample: f32) {
        self.buffer[self.fill] = sample;
        self.fill += 1;
        if self.fill == self.buffer.len() {
            self.producer.push(&self.buffer);
            self.fill = 0;
        }
    }

    pub fn block_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard any partially accumulated samples
    pub fn reset(&mut self) {
        self.fill = 0;
    }
}
