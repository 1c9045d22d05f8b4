//! Per-worker scratch buffers for the subcell flux kernels.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Buffers for one line of `n` nodes.
#[derive(Clone, Debug)]
pub struct FluxScratch<const N: usize> {
    /// States along the current line of nodes
    pub line: Vec<[f64; N]>,
    /// `Σ_m Dsplit[i,m] f_vol(u_i, u_m)` per node
    pub flux_temp: Vec<[f64; N]>,
    /// High-order subcell flux per face, `n + 1` entries
    pub fhat: Vec<[f64; N]>,
}

impl<const N: usize> FluxScratch<N> {
    pub fn new(n_nodes_1d: usize) -> Self {
        Self {
            line: vec![[0.0; N]; n_nodes_1d],
            flux_temp: vec![[0.0; N]; n_nodes_1d],
            fhat: vec![[0.0; N]; n_nodes_1d + 1],
        }
    }
}

/// One [`FluxScratch`] per worker thread, sized once at setup.
///
/// A worker picks its slot with [`ScratchArena::slot`]. Slots are behind a
/// mutex so that a worker from a foreign pool (index beyond the arena) shares
/// a slot instead of racing on it.
#[derive(Debug)]
pub struct ScratchArena<const N: usize> {
    slots: Vec<Mutex<FluxScratch<N>>>,
}

impl<const N: usize> ScratchArena<N> {
    /// Arena with one slot per worker of the current rayon pool.
    pub fn new(n_nodes_1d: usize) -> Self {
        Self::with_workers(n_nodes_1d, worker_count())
    }

    /// Arena with an explicit number of slots.
    pub fn with_workers(n_nodes_1d: usize, n_workers: usize) -> Self {
        let slots = (0..n_workers.max(1))
            .map(|_| Mutex::new(FluxScratch::new(n_nodes_1d)))
            .collect();
        Self { slots }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena has no slots (never true after construction).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Scratch of the calling worker.
    pub fn slot(&self) -> MutexGuard<'_, FluxScratch<N>> {
        let index = worker_index() % self.slots.len();
        self.slots[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "parallel")]
fn worker_count() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn worker_count() -> usize {
    1
}

#[cfg(feature = "parallel")]
fn worker_index() -> usize {
    rayon::current_thread_index().unwrap_or(0)
}

#[cfg(not(feature = "parallel"))]
fn worker_index() -> usize {
    0
}
