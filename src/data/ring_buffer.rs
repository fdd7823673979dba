//! Fixed-capacity ring buffer of the most recent samples.
//!
//! One writer (the consumer loop) and any number of snapshot readers (the
//! dump path) share this structure without a lock. The write cursor is a
//! monotonically increasing `u64` that is never reset; the logical slot of
//! the n-th sample ever written is `n % capacity`. Slots are individual
//! atomics, so a snapshot racing a write observes either the old or the new
//! sample in the contested slot, never a torn value.
//!
//! # Memory ordering
//!
//! The writer publishes a slot with `Release` before bumping the cursor with
//! `Release`; a reader loads the cursor with `Acquire` before reading slots
//! with `Acquire`. A reader that observes cursor value `W` therefore also
//! observes every slot write up to `W`.

use crate::data::Sample;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Shared ring of the `capacity` most recent samples.
pub struct SampleRing {
    slots: Box<[AtomicU32]>,
    /// Total samples ever written. Only the owning writer advances this.
    head: AtomicU64,
}

impl SampleRing {
    /// A ring holding the `capacity` most recent samples.
    ///
    /// Capacity is chosen once at startup; zero is a configuration error
    /// caught before this point.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be at least 1");
        let slots = (0..capacity).map(|_| AtomicU32::new(0)).collect();
        Self {
            slots,
            head: AtomicU64::new(0),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Total samples ever written.
    pub fn head(&self) -> u64 {
        self.head.load(Ordering::Acquire)
    }

    /// Number of valid samples currently held, `min(head, capacity)`.
    pub fn len(&self) -> usize {
        let capacity = self.slots.len() as u64;
        self.head().min(capacity) as usize
    }

    /// True until the first sample is written.
    pub fn is_empty(&self) -> bool {
        self.head() == 0
    }

    /// Store one sample and advance the cursor.
    ///
    /// Single-writer: exactly one owner context calls this. Concurrent
    /// snapshots are fine; concurrent writers are not.
    pub fn push(&self, sample: Sample) {
        // Relaxed is enough here: no other thread writes head.
        let head = self.head.load(Ordering::Relaxed);
        let slot = (head % self.slots.len() as u64) as usize;
        self.slots[slot].store(u32::from(sample.value()), Ordering::Release);
        self.head.store(head + 1, Ordering::Release);
    }

    /// The `min(head, capacity)` most recent samples, oldest first.
    ///
    /// Before the buffer has filled once this returns only the populated
    /// prefix; after that it is always exactly `capacity` samples. Safe to
    /// call while the writer keeps pushing: a slot overwritten mid-snapshot
    /// yields a fresher sample for that slot, never a corrupt one.
    pub fn snapshot_oldest_first(&self) -> Vec<Sample> {
        let head = self.head.load(Ordering::Acquire);
        let capacity = self.slots.len() as u64;
        let count = head.min(capacity);

        let mut samples = Vec::with_capacity(count as usize);
        for n in (head - count)..head {
            let slot = (n % capacity) as usize;
            let raw = self.slots[slot].load(Ordering::Acquire);
            samples.push(Sample::from_adc_word(raw as u16));
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn sample(value: u16) -> Sample {
        Sample::new(value).expect("test value in range")
    }

    #[test]
    fn partial_fill_snapshots_only_the_populated_prefix() {
        let ring = SampleRing::new(10);
        for value in 0..4 {
            ring.push(sample(value));
        }

        assert_eq!(ring.len(), 4);
        let snapshot = ring.snapshot_oldest_first();
        let values: Vec<u16> = snapshot.iter().map(|s| s.value()).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn exact_fill_returns_everything_in_order() {
        let ring = SampleRing::new(8);
        for value in 0..8 {
            ring.push(sample(value));
        }

        let values: Vec<u16> = ring
            .snapshot_oldest_first()
            .iter()
            .map(|s| s.value())
            .collect();
        assert_eq!(values, (0..8).collect::<Vec<u16>>());
    }

    #[test]
    fn overfill_keeps_the_last_capacity_samples() {
        // write C + m samples; the oldest surviving sample is number m
        let ring = SampleRing::new(100);
        for value in 0..130 {
            ring.push(sample(value));
        }

        assert_eq!(ring.len(), 100);
        assert_eq!(ring.head(), 130);
        let values: Vec<u16> = ring
            .snapshot_oldest_first()
            .iter()
            .map(|s| s.value())
            .collect();
        assert_eq!(values, (30..130).collect::<Vec<u16>>());
    }

    #[test]
    fn empty_ring_snapshots_nothing() {
        let ring = SampleRing::new(5);
        assert!(ring.is_empty());
        assert!(ring.snapshot_oldest_first().is_empty());
    }

    #[test]
    fn cursor_is_monotonic_across_many_wraps() {
        let ring = SampleRing::new(3);
        for value in 0..1000u16 {
            ring.push(sample(value & Sample::MAX_VALUE));
        }
        assert_eq!(ring.head(), 1000);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn concurrent_snapshots_never_observe_torn_slots() {
        // Writer pushes n & 0x3ff for n in 0..N over a 1000-slot ring, so
        // slot s only ever holds values congruent to s modulo
        // gcd(1000, 1024) = 8. Any torn read would almost surely break
        // that residue, and always break the 10-bit range.
        const WRITES: u64 = 200_000;
        let ring = Arc::new(SampleRing::new(1000));

        let writer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for n in 0..WRITES {
                    ring.push(Sample::from_adc_word(n as u16));
                }
            })
        };

        let reader = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                while ring.head() < WRITES {
                    let head_before = ring.head();
                    let snapshot = ring.snapshot_oldest_first();
                    assert!(snapshot.len() <= 1000);
                    assert!(snapshot.len() as u64 >= head_before.min(1000));
                    for window in snapshot.windows(2) {
                        assert!(window[0].value() <= Sample::MAX_VALUE);
                        // consecutive elements come from consecutive slots,
                        // so their residues mod 8 advance by exactly one no
                        // matter which lap each slot was written on
                        assert_eq!(
                            (window[0].value() + 1) % 8,
                            window[1].value() % 8,
                            "torn or misplaced slot"
                        );
                    }
                }
            })
        };

        writer.join().expect("writer thread");
        reader.join().expect("reader thread");
    }
}
