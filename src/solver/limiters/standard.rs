//! Runtime selection between the limiter families.

use crate::equations::Equations2D;
use crate::error::{ConfigError, LimiterError};

use super::super::antidiffusive::FluxSign;
use super::super::bounds::{BoundsLayout, VariableBounds};
use super::super::containers::SubcellData;
use super::super::state::SystemSolution2D;
use super::config::{IdpConfig, MclConfig};
use super::idp::IdpLimiter;
use super::mcl::MclLimiter;
use super::traits::{CorrectionStage, LimiterContext, SubcellLimiter};

/// Limiter family and its configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum LimiterConfig {
    Idp(IdpConfig),
    Mcl(MclConfig),
}

impl Default for LimiterConfig {
    fn default() -> Self {
        LimiterConfig::Idp(IdpConfig::positivity())
    }
}

/// Enum of the available limiters for static dispatch.
///
/// Avoids a boxed trait object when the family is chosen at runtime,
/// e.g. from a configuration file.
#[derive(Clone, Debug)]
pub enum StandardSubcellLimiter {
    Idp(IdpLimiter),
    Mcl(MclLimiter),
}

impl StandardSubcellLimiter {
    /// Build the configured limiter for a mesh of `n_elements` elements.
    pub fn from_config(
        config: LimiterConfig,
        varnames: &[&str],
        n_elements: usize,
        n_nodes_1d: usize,
    ) -> Result<Self, ConfigError> {
        Ok(match config {
            LimiterConfig::Idp(config) => {
                StandardSubcellLimiter::Idp(IdpLimiter::new(config, varnames, n_elements, n_nodes_1d)?)
            }
            LimiterConfig::Mcl(config) => {
                StandardSubcellLimiter::Mcl(MclLimiter::new(config, varnames, n_elements, n_nodes_1d)?)
            }
        })
    }
}

impl From<IdpLimiter> for StandardSubcellLimiter {
    fn from(limiter: IdpLimiter) -> Self {
        StandardSubcellLimiter::Idp(limiter)
    }
}

impl From<MclLimiter> for StandardSubcellLimiter {
    fn from(limiter: MclLimiter) -> Self {
        StandardSubcellLimiter::Mcl(limiter)
    }
}

macro_rules! dispatch {
    ($self:expr, $limiter:ident => $body:expr) => {
        match $self {
            StandardSubcellLimiter::Idp($limiter) => $body,
            StandardSubcellLimiter::Mcl($limiter) => $body,
        }
    };
}

impl<const N: usize, E: Equations2D<N>> SubcellLimiter<N, E> for StandardSubcellLimiter {
    fn name(&self) -> &'static str {
        dispatch!(self, l => SubcellLimiter::<N, E>::name(l))
    }

    fn stage(&self) -> CorrectionStage {
        dispatch!(self, l => SubcellLimiter::<N, E>::stage(l))
    }

    fn flux_sign(&self) -> FluxSign {
        dispatch!(self, l => SubcellLimiter::<N, E>::flux_sign(l))
    }

    fn build_antidiffusive_flux(&self, fhat: &[f64; N], fstar: &[f64; N]) -> [f64; N] {
        dispatch!(self, l => SubcellLimiter::<N, E>::build_antidiffusive_flux(l, fhat, fstar))
    }

    fn bounds_layout(&self) -> &BoundsLayout {
        dispatch!(self, l => SubcellLimiter::<N, E>::bounds_layout(l))
    }

    fn bounds(&self) -> &VariableBounds {
        dispatch!(self, l => SubcellLimiter::<N, E>::bounds(l))
    }

    fn compute_bounds(&mut self, ctx: &LimiterContext<'_, E>, data: &SubcellData<N>, u: &SystemSolution2D<N>) {
        dispatch!(self, l => l.compute_bounds(ctx, data, u))
    }

    fn limit(
        &mut self,
        ctx: &LimiterContext<'_, E>,
        data: &mut SubcellData<N>,
        u: &SystemSolution2D<N>,
        dt: f64,
    ) -> Result<(), LimiterError> {
        dispatch!(self, l => l.limit(ctx, data, u, dt))
    }

    fn correct(
        &self,
        ctx: &LimiterContext<'_, E>,
        data: &SubcellData<N>,
        target: &mut SystemSolution2D<N>,
        dt: f64,
    ) {
        dispatch!(self, l => l.correct(ctx, data, target, dt))
    }

    fn measure_deviations(
        &self,
        ctx: &LimiterContext<'_, E>,
        data: &SubcellData<N>,
        u: &SystemSolution2D<N>,
        deviations: &mut [f64],
    ) {
        dispatch!(self, l => l.measure_deviations(ctx, data, u, deviations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equations::CompressibleEuler2D;

    const VARNAMES: [&str; 4] = ["rho", "rho_v1", "rho_v2", "rho_e"];

    #[test]
    fn test_from_config_selects_family() {
        let idp = StandardSubcellLimiter::from_config(LimiterConfig::default(), &VARNAMES, 2, 3).unwrap();
        assert_eq!(SubcellLimiter::<4, CompressibleEuler2D>::name(&idp), "idp");
        assert_eq!(
            SubcellLimiter::<4, CompressibleEuler2D>::stage(&idp),
            CorrectionStage::APosteriori
        );

        let mcl = StandardSubcellLimiter::from_config(
            LimiterConfig::Mcl(MclConfig::default()),
            &VARNAMES,
            2,
            3,
        )
        .unwrap();
        assert_eq!(SubcellLimiter::<4, CompressibleEuler2D>::name(&mcl), "mcl");
        assert_eq!(
            SubcellLimiter::<4, CompressibleEuler2D>::flux_sign(&mcl),
            FluxSign::LowMinusHigh
        );
    }

    #[test]
    fn test_from_config_propagates_errors() {
        let config = LimiterConfig::Idp(IdpConfig::default().with_spec_entropy(true).with_math_entropy(true));
        assert!(StandardSubcellLimiter::from_config(config, &VARNAMES, 2, 3).is_err());
    }
}
