//! Synchronous collective reductions across cooperating partitions.
//!
//! Error norms are computed local-then-reduce: every partition produces a partial integral or
//! partial max over its owned entities and the single global scalar is obtained by a blocking
//! collective reduction in which all partitions participate. The collective is modeled as an
//! explicit call on a [`Communicator`], never as implicit shared state.
use nalgebra::RealField;
use std::sync::{Arc, Barrier, Mutex};

/// The reduction operator applied across partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Sum of local contributions (squared-norm integrals).
    Sum,
    /// Maximum of local contributions (infinity norms).
    Max,
}

impl Reduction {
    fn apply<T: RealField>(&self, contributions: &[T]) -> T {
        match self {
            Reduction::Sum => contributions.iter().fold(T::zero(), |acc, c| acc + c.clone()),
            // No identity element for max over all of T; reduce over the (never empty)
            // contribution set instead.
            Reduction::Max => contributions
                .iter()
                .cloned()
                .reduce(RealField::max)
                .expect("communicator group has at least one partition"),
        }
    }
}

/// A group of cooperating partitions with a synchronous all-reduce primitive.
pub trait Communicator<T: RealField> {
    /// The number of partitions participating in every reduction.
    fn num_partitions(&self) -> usize;

    /// The index of the local partition, in `0 .. num_partitions()`.
    fn partition_index(&self) -> usize;

    /// Combine `local` with the contributions of all other partitions and return the globally
    /// agreed result to every participant.
    ///
    /// The call blocks until all partitions have contributed; no participant may proceed with
    /// a partially reduced value.
    fn all_reduce(&self, local: T, reduction: Reduction) -> T;
}

/// The trivial communicator for a single, unpartitioned computation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl<T: RealField> Communicator<T> for SerialComm {
    fn num_partitions(&self) -> usize {
        1
    }

    fn partition_index(&self) -> usize {
        0
    }

    fn all_reduce(&self, local: T, _reduction: Reduction) -> T {
        local
    }
}

struct BarrierCommShared<T> {
    num_partitions: usize,
    barrier: Barrier,
    contributions: Mutex<Vec<T>>,
    result: Mutex<T>,
}

/// A shared-memory realization of the collective for partitions running as threads.
///
/// [`BarrierComm::create`] hands out one communicator per participant. Handles are reusable:
/// successive reductions on the same group are kept apart by the barrier, since no participant
/// can enter the next reduction before every participant has left the current one.
pub struct BarrierComm<T> {
    shared: Arc<BarrierCommShared<T>>,
    rank: usize,
}

impl<T: RealField> BarrierComm<T> {
    /// Create communicators for a group of `num_partitions` participants.
    ///
    /// # Panics
    ///
    /// Panics if `num_partitions` is zero.
    pub fn create(num_partitions: usize) -> Vec<BarrierComm<T>> {
        assert!(num_partitions > 0, "communicator group must have at least one partition");
        let shared = Arc::new(BarrierCommShared {
            num_partitions,
            barrier: Barrier::new(num_partitions),
            contributions: Mutex::new(vec![T::zero(); num_partitions]),
            result: Mutex::new(T::zero()),
        });
        (0..num_partitions)
            .map(|rank| BarrierComm {
                shared: Arc::clone(&shared),
                rank,
            })
            .collect()
    }
}

impl<T: RealField> Communicator<T> for BarrierComm<T> {
    fn num_partitions(&self) -> usize {
        self.shared.num_partitions
    }

    fn partition_index(&self) -> usize {
        self.rank
    }

    fn all_reduce(&self, local: T, reduction: Reduction) -> T {
        {
            let mut contributions = self.shared.contributions.lock().unwrap();
            contributions[self.rank] = local;
        }
        // All contributions are in place once every participant reaches the barrier. The
        // leader reduces, the second rendezvous publishes the result to everyone.
        if self.shared.barrier.wait().is_leader() {
            let contributions = self.shared.contributions.lock().unwrap();
            let reduced = reduction.apply(&contributions);
            *self.shared.result.lock().unwrap() = reduced;
        }
        self.shared.barrier.wait();
        self.shared.result.lock().unwrap().clone()
    }
}
