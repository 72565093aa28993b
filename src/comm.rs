//! Global reductions across the processes sharing one grid.
//!
//! Objective assembly and the global error norms end in a blocking collective: every process
//! contributes a partial value and receives the reduced one. The [`Communicator`] trait is the
//! seam through which a caller plugs in its message-passing layer. Two implementations ship
//! with the crate: [`SerialCommunicator`] for a single process and [`ThreadCommunicator`] for a
//! group of threads in one address space.
use crate::Real;
use parking_lot::Mutex;
use std::sync::{Arc, Barrier};

/// A group of processes able to perform collective reductions.
///
/// Every member of the group must call the same collectives in the same order. A member that
/// skips a call leaves the others blocked forever.
pub trait Communicator<T> {
    /// Index of this process within the group.
    fn rank(&self) -> usize;

    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Sum of `local` over all processes, returned on every process.
    fn all_reduce_sum(&self, local: T) -> T;

    /// Maximum of `local` over all processes, returned on every process.
    fn all_reduce_max(&self, local: T) -> T;
}

/// The trivial group consisting of the calling process only.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SerialCommunicator;

impl<T> Communicator<T> for SerialCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, local: T) -> T {
        local
    }

    fn all_reduce_max(&self, local: T) -> T {
        local
    }
}

#[derive(Debug)]
struct SharedSlots<T> {
    slots: Mutex<Vec<T>>,
    barrier: Barrier,
}

/// One member of a group of threads that reduce through shared memory.
///
/// Reductions combine the contributions in rank order, so every member obtains the same value
/// bit for bit and repeated runs are reproducible.
#[derive(Debug, Clone)]
pub struct ThreadCommunicator<T> {
    rank: usize,
    size: usize,
    shared: Arc<SharedSlots<T>>,
}

impl<T: Real> ThreadCommunicator<T> {
    /// Creates the members of a group of `size` threads, ordered by rank.
    ///
    /// Each member is meant to be moved into its own thread.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn group(size: usize) -> Vec<Self> {
        assert!(size > 0, "a communicator group needs at least one member");
        let shared = Arc::new(SharedSlots {
            slots: Mutex::new(vec![T::zero(); size]),
            barrier: Barrier::new(size),
        });
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    fn all_reduce(&self, local: T, combine: impl Fn(T, T) -> T) -> T {
        self.shared.slots.lock()[self.rank] = local;
        self.shared.barrier.wait();
        let result = {
            let slots = self.shared.slots.lock();
            slots[1..].iter().fold(slots[0], |acc, &v| combine(acc, v))
        };
        // Nobody may overwrite a slot before every member has read all of them
        self.shared.barrier.wait();
        result
    }
}

impl<T: Real> Communicator<T> for ThreadCommunicator<T> {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum(&self, local: T) -> T {
        self.all_reduce(local, |a, b| a + b)
    }

    fn all_reduce_max(&self, local: T) -> T {
        self.all_reduce(local, |a, b| a.max(b))
    }
}
