//! Parameter hand-off between a control thread and the audio thread.
//!
//! [`SharedParams`] holds the latest parameter struct for one DSP unit. The control side
//! [`publish`](SharedParams::publish)es whole snapshots; the audio side
//! [`poll`](SharedParams::poll)s once per block and gets a copy only when something new
//! was published. The audio side never blocks: if the slot is locked at that moment the
//! poll reports nothing and the next block picks the update up.
//!
//! ```rust
//! use std::sync::Arc;
//! use kinetone_config::SharedParams;
//! use kinetone_core::{FilterAlgorithm, FilterParameters};
//! use kinetone_effects::Filter;
//!
//! let mut filter = Filter::new(48000.0);
//! let shared = Arc::new(SharedParams::new(filter.parameters()));
//!
//! // control thread
//! shared.publish(FilterParameters {
//!     algorithm: FilterAlgorithm::ButterHpf2,
//!     ..shared.snapshot()
//! });
//!
//! // audio thread, once per block
//! let mut seen = 0;
//! if let Some(params) = shared.poll(&mut seen) {
//!     filter.set_parameters(params);
//! }
//! assert_eq!(filter.parameters().algorithm, FilterAlgorithm::ButterHpf2);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Single-writer, single-reader slot for a `Copy` parameter struct.
#[derive(Debug)]
pub struct SharedParams<P> {
    slot: Mutex<P>,
    generation: AtomicU64,
}

impl<P: Copy> SharedParams<P> {
    /// Create a slot holding `initial`. Its generation starts at 0.
    pub fn new(initial: P) -> Self {
        Self {
            slot: Mutex::new(initial),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the stored parameters and bump the generation.
    pub fn publish(&self, params: P) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = params;
        // bumped while the lock is held so a reader that sees the new generation
        // also sees the new value
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Parameters published since generation `seen`, if any.
    ///
    /// On success `seen` is advanced to the generation returned. Returns `None` when
    /// nothing new was published or when the writer holds the lock right now.
    pub fn poll(&self, seen: &mut u64) -> Option<P> {
        if self.generation.load(Ordering::Acquire) == *seen {
            return None;
        }
        let slot = match self.slot.try_lock() {
            Ok(slot) => slot,
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return None,
        };
        *seen = self.generation.load(Ordering::Acquire);
        Some(*slot)
    }

    /// Copy of the current parameters, waiting for the lock if needed.
    pub fn snapshot(&self) -> P {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of publishes so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl<P: Copy + Default> Default for SharedParams<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    struct Params {
        fc: f64,
        q: f64,
    }

    #[test]
    fn test_poll_reports_only_new_values() {
        let shared = SharedParams::new(Params { fc: 1000.0, q: 0.707 });
        let mut seen = shared.generation();
        assert_eq!(shared.poll(&mut seen), None);

        shared.publish(Params { fc: 2000.0, q: 1.0 });
        assert_eq!(shared.poll(&mut seen), Some(Params { fc: 2000.0, q: 1.0 }));
        assert_eq!(seen, 1);
        assert_eq!(shared.poll(&mut seen), None);
    }

    #[test]
    fn test_latest_publish_wins() {
        let shared = SharedParams::<Params>::default();
        for i in 1..=5 {
            shared.publish(Params {
                fc: f64::from(i) * 100.0,
                q: 1.0,
            });
        }
        let mut seen = 0;
        assert_eq!(shared.poll(&mut seen).map(|p| p.fc), Some(500.0));
        assert_eq!(seen, 5);
        assert_eq!(shared.snapshot().fc, 500.0);
    }

    #[test]
    fn test_poll_does_not_block_while_writer_holds_lock() {
        let shared = SharedParams::new(Params::default());
        shared.publish(Params { fc: 1.0, q: 1.0 });
        let mut seen = 0;
        {
            let _guard = shared.slot.lock().unwrap();
            assert_eq!(shared.poll(&mut seen), None);
            assert_eq!(seen, 0);
        }
        assert!(shared.poll(&mut seen).is_some());
    }

    #[test]
    fn test_cross_thread_updates_arrive_in_order() {
        let shared = Arc::new(SharedParams::new(Params::default()));
        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 1..=1000 {
                    let v = f64::from(i);
                    shared.publish(Params { fc: v, q: v });
                }
            })
        };

        let mut seen = 0;
        let mut last = 0.0;
        while last < 1000.0 {
            if let Some(p) = shared.poll(&mut seen) {
                // a snapshot is never torn and never goes backwards
                assert_eq!(p.fc, p.q);
                assert!(p.fc >= last, "went from {last} back to {}", p.fc);
                last = p.fc;
            } else {
                thread::yield_now();
            }
        }
        writer.join().unwrap();
        assert_eq!(seen, 1000);
    }
}
