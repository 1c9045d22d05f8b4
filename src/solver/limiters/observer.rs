//! Optional recording of MCL limiting coefficients.
//!
//! The MCL limiter is generic over a [`LimiterObserver`]. Each element owns
//! one `Record`, so recording needs no synchronization in the element loop.
//! With [`NoObserver`] the record is `()` and every call compiles away.
//!
//! A coefficient is the retained fraction of the antidiffusive flux on a
//! face: 1 means unlimited, 0 means fully low order.

/// Quantity slots of a record for a system of `n_vars` variables:
/// `0..n_vars` per variable, then pressure, then entropy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitedQuantity {
    Variable(usize),
    Pressure,
    Entropy,
}

impl LimitedQuantity {
    #[inline(always)]
    pub fn slot(self, n_vars: usize) -> usize {
        match self {
            LimitedQuantity::Variable(v) => v,
            LimitedQuantity::Pressure => n_vars,
            LimitedQuantity::Entropy => n_vars + 1,
        }
    }

    /// Number of slots for `n_vars` variables.
    pub const fn count(n_vars: usize) -> usize {
        n_vars + 2
    }
}

/// Receiver of per-face limiting coefficients.
pub trait LimiterObserver: Send + Sync + 'static {
    /// Per-element storage.
    type Record: Clone + Send + Sync + std::fmt::Debug;

    fn new_record(n_nodes: usize, n_vars: usize) -> Self::Record;

    /// Called once per element before the faces of a stage are limited.
    fn reset(record: &mut Self::Record);

    /// Record the coefficient of a face at one of its two nodes.
    fn record(record: &mut Self::Record, quantity: LimitedQuantity, node: usize, coefficient: f64);
}

/// Records nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoObserver;

impl LimiterObserver for NoObserver {
    type Record = ();

    #[inline(always)]
    fn new_record(_n_nodes: usize, _n_vars: usize) -> Self::Record {}

    #[inline(always)]
    fn reset(_record: &mut Self::Record) {}

    #[inline(always)]
    fn record(_record: &mut Self::Record, _quantity: LimitedQuantity, _node: usize, _coefficient: f64) {}
}

/// Records the minimum and the mean coefficient per node and quantity.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlphaRecorder;

/// Per-element storage of [`AlphaRecorder`].
#[derive(Clone, Debug, PartialEq)]
pub struct AlphaRecord {
    n_vars: usize,
    n_nodes: usize,
    alpha_min: Vec<f64>,
    alpha_sum: Vec<f64>,
    count: Vec<u32>,
}

impl AlphaRecord {
    #[inline(always)]
    fn index(&self, quantity: LimitedQuantity, node: usize) -> usize {
        quantity.slot(self.n_vars) * self.n_nodes + node
    }

    /// Smallest coefficient seen at `node` since the last reset (1 if none).
    pub fn min(&self, quantity: LimitedQuantity, node: usize) -> f64 {
        self.alpha_min[self.index(quantity, node)]
    }

    /// Mean coefficient at `node` since the last reset (1 if none).
    pub fn mean(&self, quantity: LimitedQuantity, node: usize) -> f64 {
        let i = self.index(quantity, node);
        if self.count[i] == 0 {
            1.0
        } else {
            self.alpha_sum[i] / f64::from(self.count[i])
        }
    }
}

impl LimiterObserver for AlphaRecorder {
    type Record = AlphaRecord;

    fn new_record(n_nodes: usize, n_vars: usize) -> Self::Record {
        let len = LimitedQuantity::count(n_vars) * n_nodes;
        AlphaRecord {
            n_vars,
            n_nodes,
            alpha_min: vec![1.0; len],
            alpha_sum: vec![0.0; len],
            count: vec![0; len],
        }
    }

    fn reset(record: &mut Self::Record) {
        record.alpha_min.fill(1.0);
        record.alpha_sum.fill(0.0);
        record.count.fill(0);
    }

    #[inline]
    fn record(record: &mut Self::Record, quantity: LimitedQuantity, node: usize, coefficient: f64) {
        let i = record.index(quantity, node);
        record.alpha_min[i] = record.alpha_min[i].min(coefficient);
        record.alpha_sum[i] += coefficient;
        record.count[i] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_observer_is_zero_sized() {
        assert_eq!(std::mem::size_of::<NoObserver>(), 0);
        assert_eq!(std::mem::size_of::<<NoObserver as LimiterObserver>::Record>(), 0);
    }

    #[test]
    fn test_alpha_recorder_min_and_mean() {
        let mut rec = AlphaRecorder::new_record(4, 4);
        AlphaRecorder::record(&mut rec, LimitedQuantity::Pressure, 2, 0.5);
        AlphaRecorder::record(&mut rec, LimitedQuantity::Pressure, 2, 1.0);
        assert_eq!(rec.min(LimitedQuantity::Pressure, 2), 0.5);
        assert_eq!(rec.mean(LimitedQuantity::Pressure, 2), 0.75);
        assert_eq!(rec.mean(LimitedQuantity::Variable(0), 2), 1.0);
        AlphaRecorder::reset(&mut rec);
        assert_eq!(rec.min(LimitedQuantity::Pressure, 2), 1.0);
    }
}
