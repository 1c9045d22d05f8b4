//! Local bounds of the limited quantities.
//!
//! Every tracked quantity is identified by a [`BoundKey`]. The set of keys of
//! a limiter is fixed at configuration and resolved once into a dense index
//! ([`BoundsLayout`]), which is also the column order of the deviation log.
//!
//! Bounds are pure functions of the stage data: repeated evaluation on the
//! same input gives bit-identical results.

use crate::equations::Equations2D;
use crate::mesh::{FaceLink, StructuredMesh2D};
use crate::types::{ElementIndex, Side};

use super::containers::ElementSubcellData;
use super::limiters::LimiterContext;
use super::state::SystemSolution2D;

/// A bounded quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundKey {
    /// Local minimum of a conservative variable
    LocalMin(usize),
    /// Local maximum of a conservative variable
    LocalMax(usize),
    /// Local minimum of `u[v] / ρ`
    RatioMin(usize),
    /// Local maximum of `u[v] / ρ`
    RatioMax(usize),
    /// Positivity of a conservative variable, `β · u[v]` of the low-order state
    Positivity(usize),
    /// Positivity of the pressure
    PressurePositivity,
    /// Local minimum of the specific entropy
    SpecEntropyMin,
    /// Local maximum of the mathematical entropy
    MathEntropyMax,
}

/// How a key's bound is formed from the local data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundKind {
    Min,
    Max,
    /// `β_corr · value` of the node itself, acts as a minimum
    Positivity,
}

impl BoundKey {
    pub fn kind(&self) -> BoundKind {
        match self {
            BoundKey::LocalMin(_) | BoundKey::RatioMin(_) | BoundKey::SpecEntropyMin => {
                BoundKind::Min
            }
            BoundKey::LocalMax(_) | BoundKey::RatioMax(_) | BoundKey::MathEntropyMax => {
                BoundKind::Max
            }
            BoundKey::Positivity(_) | BoundKey::PressurePositivity => BoundKind::Positivity,
        }
    }

    /// Whether the bound is a lower bound.
    #[inline]
    pub fn is_lower(&self) -> bool {
        !matches!(self.kind(), BoundKind::Max)
    }

    /// Value of the bounded quantity at state `u`.
    #[inline]
    pub fn quantity<const N: usize, E: Equations2D<N>>(&self, equations: &E, u: &[f64; N]) -> f64 {
        match *self {
            BoundKey::LocalMin(v) | BoundKey::LocalMax(v) | BoundKey::Positivity(v) => u[v],
            BoundKey::RatioMin(v) | BoundKey::RatioMax(v) => u[v] / u[0],
            BoundKey::PressurePositivity => equations.pressure(u),
            BoundKey::SpecEntropyMin => equations.entropy_spec(u),
            BoundKey::MathEntropyMax => equations.entropy_math(u),
        }
    }

    /// Column name in the deviation log.
    pub fn name(&self, varnames: &[&str]) -> String {
        match *self {
            BoundKey::LocalMin(v) => format!("{}_min", varnames[v]),
            BoundKey::LocalMax(v) => format!("{}_max", varnames[v]),
            BoundKey::RatioMin(v) => format!("{}_{}_min", varnames[v], varnames[0]),
            BoundKey::RatioMax(v) => format!("{}_{}_max", varnames[v], varnames[0]),
            BoundKey::Positivity(v) => format!("{}_positivity", varnames[v]),
            BoundKey::PressurePositivity => "p_positivity".to_string(),
            BoundKey::SpecEntropyMin => "s_min".to_string(),
            BoundKey::MathEntropyMax => "S_max".to_string(),
        }
    }
}

/// Where two-sided and one-sided extrema are taken from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundSource {
    /// The node value and the bar states of its incident faces
    #[default]
    BarStates,
    /// The node value and its neighbouring node values
    LowOrderSolution,
}

/// Ordered set of bound keys with their log names.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundsLayout {
    keys: Vec<BoundKey>,
    names: Vec<String>,
}

impl BoundsLayout {
    pub fn new(keys: Vec<BoundKey>, varnames: &[&str]) -> Self {
        let names = keys.iter().map(|k| k.name(varnames)).collect();
        Self { keys, names }
    }

    pub fn keys(&self) -> &[BoundKey] {
        &self.keys
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Dense index of `key`.
    pub fn index_of(&self, key: BoundKey) -> Option<usize> {
        self.keys.iter().position(|&k| k == key)
    }
}

/// Node bounds of all keys, element-major.
///
/// Element `k` owns the chunk `[k * n_keys * n_nodes, (k + 1) * n_keys * n_nodes)`,
/// inside which key `q` occupies `[q * n_nodes, (q + 1) * n_nodes)`.
#[derive(Clone, Debug)]
pub struct VariableBounds {
    pub data: Vec<f64>,
    pub n_keys: usize,
    pub n_nodes: usize,
}

impl VariableBounds {
    pub fn new(n_elements: usize, n_nodes: usize, n_keys: usize) -> Self {
        Self {
            data: vec![0.0; n_elements * n_nodes * n_keys],
            n_keys,
            n_nodes,
        }
    }

    /// Length of one element chunk.
    #[inline]
    pub fn element_len(&self) -> usize {
        self.n_keys * self.n_nodes
    }

    /// Number of elements the bounds are sized for.
    pub fn n_elements(&self) -> usize {
        match self.element_len() {
            0 => 0,
            len => self.data.len() / len,
        }
    }

    /// Bound of key `key` at `node` of element `k`.
    #[inline]
    pub fn get(&self, key: usize, k: ElementIndex, node: usize) -> f64 {
        self.data[k.as_usize() * self.element_len() + key * self.n_nodes + node]
    }

    /// Element chunk of element `k`.
    #[inline]
    pub fn element(&self, k: ElementIndex) -> &[f64] {
        let len = self.element_len();
        &self.data[k.as_usize() * len..(k.as_usize() + 1) * len]
    }
}

/// Computes node bounds from the node values and their neighbourhood.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundsCalculator {
    pub source: BoundSource,
    pub positivity_correction_factor: f64,
}

impl BoundsCalculator {
    pub fn new(source: BoundSource, positivity_correction_factor: f64) -> Self {
        Self {
            source,
            positivity_correction_factor,
        }
    }

    /// Bounds of every key of `layout` for element `k`.
    ///
    /// # Arguments
    /// * `elem` - Subcell data of element `k` (bar states of all its faces)
    /// * `u` - Node values the bounds refer to
    /// * `out` - Element chunk of a [`VariableBounds`]
    pub fn compute_element<const N: usize, E: Equations2D<N>>(
        &self,
        ctx: &LimiterContext<'_, E>,
        layout: &BoundsLayout,
        k: ElementIndex,
        elem: &ElementSubcellData<N>,
        u: &SystemSolution2D<N>,
        out: &mut [f64],
    ) {
        let n = ctx.ops.n_nodes_1d;
        let n_nodes = ctx.ops.n_nodes;
        for (slot, key) in out.chunks_mut(n_nodes).zip(layout.keys()) {
            let kind = key.kind();
            for j in 0..n {
                for i in 0..n {
                    let node = j * n + i;
                    let value = key.quantity(ctx.equations, &u.get(k, node));
                    slot[node] = match kind {
                        BoundKind::Positivity => self.positivity_correction_factor * value,
                        BoundKind::Min | BoundKind::Max => {
                            let combine = |a: f64, b: f64| {
                                if kind == BoundKind::Min { a.min(b) } else { a.max(b) }
                            };
                            match self.source {
                                BoundSource::BarStates => elem
                                    .node_bar_states(i, j)
                                    .iter()
                                    .map(|bar| key.quantity(ctx.equations, bar))
                                    .fold(value, combine),
                                BoundSource::LowOrderSolution => {
                                    neighbour_nodes(ctx.mesh, k, i, j, n)
                                        .into_iter()
                                        .flatten()
                                        .map(|(kn, node_n)| {
                                            key.quantity(ctx.equations, &u.get(kn, node_n))
                                        })
                                        .fold(value, combine)
                                }
                            }
                        }
                    };
                }
            }
        }
    }
}

/// The (up to) four face-adjacent nodes of node `(i, j)` of element `k`.
///
/// Nodes across a mesh interface are included, nodes across a physical
/// boundary are not.
pub fn neighbour_nodes(
    mesh: &StructuredMesh2D,
    k: ElementIndex,
    i: usize,
    j: usize,
    n: usize,
) -> [Option<(ElementIndex, usize)>; 4] {
    let across = |side: Side, t: usize| -> Option<(ElementIndex, usize)> {
        match mesh.face_link(k, side) {
            FaceLink::Boundary(_) => None,
            FaceLink::Interface(id) => {
                let interface = &mesh.interfaces[id.as_usize()];
                let other = if interface.left == k {
                    interface.right
                } else {
                    interface.left
                };
                let node = match side {
                    Side::West => t * n + (n - 1),
                    Side::East => t * n,
                    Side::South => (n - 1) * n + t,
                    Side::North => t,
                };
                Some((other, node))
            }
        }
    };
    [
        if i > 0 { Some((k, j * n + i - 1)) } else { across(Side::West, j) },
        if i + 1 < n { Some((k, j * n + i + 1)) } else { across(Side::East, j) },
        if j > 0 { Some((k, (j - 1) * n + i)) } else { across(Side::South, i) },
        if j + 1 < n { Some((k, (j + 1) * n + i)) } else { across(Side::North, i) },
    ]
}
