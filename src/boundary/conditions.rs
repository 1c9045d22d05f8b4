//! Outer-state boundary conditions.
//!
//! A boundary condition produces the exterior ("ghost") state at a physical
//! boundary node. The engine then treats the boundary face like any other
//! face: the surface flux and the bar state are both built from the pair
//! (interior, outer).

use crate::equations::{CompressibleEuler2D, Equations2D};
use crate::types::{Direction, Side, SideBoundaries};

/// Context for evaluating a boundary condition at one face node.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryContext {
    /// Stage time
    pub time: f64,
    /// Physical position of the face node
    pub position: (f64, f64),
    /// Domain side the face lies on
    pub side: Side,
}

/// Boundary condition for a system of `N` conservation laws.
pub trait BoundaryCondition2D<const N: usize, E: Equations2D<N>>: Send + Sync {
    /// Exterior state seen across the boundary.
    fn outer_state(&self, inner: &[f64; N], ctx: &BoundaryContext, equations: &E) -> [f64; N];

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Prescribed constant exterior state.
#[derive(Clone, Copy, Debug)]
pub struct FixedState2D<const N: usize> {
    pub state: [f64; N],
}

impl<const N: usize> FixedState2D<N> {
    pub fn new(state: [f64; N]) -> Self {
        Self { state }
    }
}

impl<const N: usize, E: Equations2D<N>> BoundaryCondition2D<N, E> for FixedState2D<N> {
    fn outer_state(&self, _inner: &[f64; N], _ctx: &BoundaryContext, _eq: &E) -> [f64; N] {
        self.state
    }

    fn name(&self) -> &'static str {
        "fixed_state"
    }
}

/// Exterior state from a function of position and time.
pub struct Dirichlet2D<F> {
    state_fn: F,
}

impl<F> Dirichlet2D<F> {
    pub fn new(state_fn: F) -> Self {
        Self { state_fn }
    }
}

impl<const N: usize, E, F> BoundaryCondition2D<N, E> for Dirichlet2D<F>
where
    E: Equations2D<N>,
    F: Fn(f64, f64, f64) -> [f64; N] + Send + Sync,
{
    fn outer_state(&self, _inner: &[f64; N], ctx: &BoundaryContext, _eq: &E) -> [f64; N] {
        (self.state_fn)(ctx.position.0, ctx.position.1, ctx.time)
    }

    fn name(&self) -> &'static str {
        "dirichlet"
    }
}

/// Zero-gradient outflow: the exterior state copies the interior one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Extrapolation2D;

impl<const N: usize, E: Equations2D<N>> BoundaryCondition2D<N, E> for Extrapolation2D {
    fn outer_state(&self, inner: &[f64; N], _ctx: &BoundaryContext, _eq: &E) -> [f64; N] {
        *inner
    }

    fn name(&self) -> &'static str {
        "extrapolation"
    }
}

/// Inviscid slip wall for the Euler equations.
///
/// Mirror state with the normal momentum reversed; density, tangential
/// momentum and energy are copied.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlipWall2D;

impl BoundaryCondition2D<4, CompressibleEuler2D> for SlipWall2D {
    fn outer_state(
        &self,
        inner: &[f64; 4],
        ctx: &BoundaryContext,
        _eq: &CompressibleEuler2D,
    ) -> [f64; 4] {
        let mut outer = *inner;
        match ctx.side.direction() {
            Direction::X => outer[1] = -inner[1],
            Direction::Y => outer[2] = -inner[2],
        }
        outer
    }

    fn name(&self) -> &'static str {
        "slip_wall"
    }
}

/// Boxed boundary condition (runtime polymorphism).
pub type BoxedBoundaryCondition2D<const N: usize, E> = Box<dyn BoundaryCondition2D<N, E>>;

/// One boundary condition per domain side.
///
/// Sides that are periodic in the mesh are never queried.
pub struct BoundaryConditions2D<const N: usize, E: Equations2D<N>> {
    sides: SideBoundaries<BoxedBoundaryCondition2D<N, E>>,
}

impl<const N: usize, E: Equations2D<N> + 'static> BoundaryConditions2D<N, E> {
    /// Explicit condition per side.
    pub fn new(sides: SideBoundaries<BoxedBoundaryCondition2D<N, E>>) -> Self {
        Self { sides }
    }

    /// The same condition on every side.
    pub fn all<B>(bc: B) -> Self
    where
        B: BoundaryCondition2D<N, E> + Clone + 'static,
    {
        Self {
            sides: SideBoundaries::new(
                Box::new(bc.clone()),
                Box::new(bc.clone()),
                Box::new(bc.clone()),
                Box::new(bc),
            ),
        }
    }

    /// Conditions for a fully periodic mesh.
    pub fn periodic() -> Self {
        Self::all(Extrapolation2D)
    }

    /// Outer state at a boundary node.
    #[inline]
    pub fn outer_state(&self, inner: &[f64; N], ctx: &BoundaryContext, equations: &E) -> [f64; N] {
        self.sides.get(ctx.side).outer_state(inner, ctx, equations)
    }

    /// Name of the condition on a side.
    pub fn name(&self, side: Side) -> &'static str {
        self.sides.get(side).name()
    }
}

impl<const N: usize, E: Equations2D<N>> std::fmt::Debug for BoundaryConditions2D<N, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryConditions2D")
            .field("west", &self.sides.west.name())
            .field("east", &self.sides.east.name())
            .field("south", &self.sides.south.name())
            .field("north", &self.sides.north.name())
            .finish()
    }
}
