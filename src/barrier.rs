//! A reusable rendezvous barrier with a shutdown escape hatch.
//!
//! `std::sync::Barrier` rendezvous correctly but has no way to release
//! waiters if a participant never shows up again (e.g. a thread died
//! before its next `wait`). The scheduler in `original_source` crosses
//! both barriers one final time on shutdown specifically to avoid that
//! — but a dead scheduler thread would leave workers parked forever.
//! [`release`](TwoPhaseBarrier::release) lets the shutdown handler force
//! every waiter out regardless of how many threads have actually shown
//! up, as a defensive fallback.

use std::sync::{Condvar, Mutex};

struct BarrierState {
    count: usize,
    generation: u64,
    released: bool,
}

/// A barrier of fixed `width`, reusable across cycles.
pub struct TwoPhaseBarrier {
    width: usize,
    state: Mutex<BarrierState>,
    condvar: Condvar,
}

impl TwoPhaseBarrier {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            state: Mutex::new(BarrierState {
                count: 0,
                generation: 0,
                released: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until `width` threads have called `wait` for the current
    /// generation, or until [`release`](Self::release) is called.
    /// Returns `true` on a normal rendezvous, `false` if released early.
    pub fn wait(&self) -> bool {
        let mut state = self.state.lock().expect("barrier mutex poisoned");
        if state.released {
            return false;
        }
        let generation = state.generation;
        state.count += 1;
        if state.count == self.width {
            state.count = 0;
            state.generation = state.generation.wrapping_add(1);
            self.condvar.notify_all();
            return true;
        }
        while state.generation == generation && !state.released {
            state = self.condvar.wait(state).expect("barrier condvar poisoned");
        }
        !state.released
    }

    /// Forces every current and future waiter to return immediately.
    pub fn release(&self) {
        let mut state = self.state.lock().expect("barrier mutex poisoned");
        state.released = true;
        self.condvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn rendezvous_releases_all_participants() {
        let barrier = Arc::new(TwoPhaseBarrier::new(3));
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let b = Arc::clone(&barrier);
                thread::spawn(move || b.wait())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }

    #[test]
    fn reusable_across_multiple_cycles() {
        let barrier = Arc::new(TwoPhaseBarrier::new(2));
        for _ in 0..5 {
            let b = Arc::clone(&barrier);
            let other = thread::spawn(move || b.wait());
            assert!(barrier.wait());
            assert!(other.join().unwrap());
        }
    }

    #[test]
    fn release_unblocks_a_stuck_waiter() {
        let barrier = Arc::new(TwoPhaseBarrier::new(3));
        let b = Arc::clone(&barrier);
        let handle = thread::spawn(move || b.wait());
        // Only one of three arrives; release should still free it.
        thread::sleep(std::time::Duration::from_millis(20));
        barrier.release();
        assert!(!handle.join().unwrap());
    }
}
