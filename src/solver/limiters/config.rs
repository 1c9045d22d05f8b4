//! Limiter configuration.
//!
//! Both configurations are validated eagerly when a limiter is constructed;
//! an invalid combination never reaches the time loop.

use crate::error::ConfigError;

use super::super::bounds::{BoundKey, BoundSource};

/// Configuration of the a-posteriori invariant-domain-preserving limiter.
#[derive(Clone, Debug, PartialEq)]
pub struct IdpConfig {
    /// Conservative variables with local two-sided bounds
    pub local_twosided_variables: Vec<usize>,
    /// Conservative variables kept positive
    pub positivity_variables: Vec<usize>,
    /// Keep the pressure positive
    pub positivity_pressure: bool,
    /// Local minimum principle for the specific entropy
    pub spec_entropy: bool,
    /// Local maximum principle for the mathematical entropy
    pub math_entropy: bool,
    /// Source of the two-sided and entropy extrema
    pub bound_source: BoundSource,
    /// β in `value >= β · value(low-order)`
    pub positivity_correction_factor: f64,
    /// Iteration cap of the Newton-bisection solve
    pub max_iterations_newton: usize,
    /// Stop once the step in β falls below this
    pub newton_reltol: f64,
    /// Absolute goal tolerance (scaled by the bound)
    pub newton_abstol: f64,
    /// Splitting constant γ of the node update into per-face updates
    pub gamma_constant_newton: f64,
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            local_twosided_variables: Vec::new(),
            positivity_variables: Vec::new(),
            positivity_pressure: false,
            spec_entropy: false,
            math_entropy: false,
            bound_source: BoundSource::BarStates,
            positivity_correction_factor: 0.1,
            max_iterations_newton: 10,
            newton_reltol: 1.0e-12,
            newton_abstol: 1.0e-14,
            // 2 * ndims
            gamma_constant_newton: 4.0,
        }
    }
}

impl IdpConfig {
    /// Positivity of density (variable 0) and pressure.
    pub fn positivity() -> Self {
        Self {
            positivity_variables: vec![0],
            positivity_pressure: true,
            ..Self::default()
        }
    }

    pub fn with_local_twosided(mut self, variables: Vec<usize>) -> Self {
        self.local_twosided_variables = variables;
        self
    }

    pub fn with_positivity_variables(mut self, variables: Vec<usize>) -> Self {
        self.positivity_variables = variables;
        self
    }

    pub fn with_positivity_pressure(mut self, enabled: bool) -> Self {
        self.positivity_pressure = enabled;
        self
    }

    pub fn with_spec_entropy(mut self, enabled: bool) -> Self {
        self.spec_entropy = enabled;
        self
    }

    pub fn with_math_entropy(mut self, enabled: bool) -> Self {
        self.math_entropy = enabled;
        self
    }

    pub fn with_bound_source(mut self, source: BoundSource) -> Self {
        self.bound_source = source;
        self
    }

    pub fn with_positivity_correction_factor(mut self, factor: f64) -> Self {
        self.positivity_correction_factor = factor;
        self
    }

    pub fn with_newton(mut self, max_iterations: usize, reltol: f64, abstol: f64) -> Self {
        self.max_iterations_newton = max_iterations;
        self.newton_reltol = reltol;
        self.newton_abstol = abstol;
        self
    }

    /// Check the configuration against a system of `n_vars` variables.
    pub fn validate(&self, n_vars: usize) -> Result<(), ConfigError> {
        if self.spec_entropy && self.math_entropy {
            return Err(ConfigError::MutuallyExclusive {
                first: "specific entropy",
                second: "mathematical entropy",
            });
        }
        for &index in self
            .local_twosided_variables
            .iter()
            .chain(&self.positivity_variables)
        {
            if index >= n_vars {
                return Err(ConfigError::VariableIndex { index, n_vars });
            }
        }
        validate_correction_factor(self.positivity_correction_factor)?;
        if self.max_iterations_newton == 0 {
            return Err(ConfigError::NewtonIterations);
        }
        for (name, value) in [
            ("newton_reltol", self.newton_reltol),
            ("newton_abstol", self.newton_abstol),
            ("gamma_constant_newton", self.gamma_constant_newton),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NewtonTolerance { name, value });
            }
        }
        if self.bound_keys().is_empty() {
            return Err(ConfigError::NothingToLimit);
        }
        Ok(())
    }

    /// Bound keys in constraint-pass order.
    pub fn bound_keys(&self) -> Vec<BoundKey> {
        let mut keys = Vec::new();
        for &v in &self.local_twosided_variables {
            keys.push(BoundKey::LocalMin(v));
            keys.push(BoundKey::LocalMax(v));
        }
        for &v in &self.positivity_variables {
            keys.push(BoundKey::Positivity(v));
        }
        if self.positivity_pressure {
            keys.push(BoundKey::PressurePositivity);
        }
        if self.spec_entropy {
            keys.push(BoundKey::SpecEntropyMin);
        }
        if self.math_entropy {
            keys.push(BoundKey::MathEntropyMax);
        }
        keys
    }
}

/// Variant of the MCL pressure positivity limiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PressureLimiter {
    /// Sharp bound from the exact linear term
    #[default]
    Exact,
    /// Algebraic over-estimate of the linear term, more restrictive
    Approximate,
}

/// Configuration of the monolithic convex limiter.
#[derive(Clone, Debug, PartialEq)]
pub struct MclConfig {
    /// Local bounds of the density
    pub density_limiter: bool,
    /// Apply the density coefficient to the whole flux vector
    pub density_coefficient_for_all: bool,
    /// Local bounds of `φ = var / ρ` for the remaining variables
    pub sequential_limiter: bool,
    /// Local bounds of the remaining conservative variables
    pub conservative_limiter: bool,
    /// Limited densities stay above `β · ρ̄`
    pub positivity_limiter_density: bool,
    /// Pressure positivity of the limited bar states
    pub positivity_limiter_pressure: Option<PressureLimiter>,
    /// Semi-discrete entropy inequality per face
    pub entropy_limiter_semidiscrete: bool,
    /// β of the positivity limiters
    pub positivity_correction_factor: f64,
}

impl Default for MclConfig {
    fn default() -> Self {
        Self {
            density_limiter: true,
            density_coefficient_for_all: false,
            sequential_limiter: true,
            conservative_limiter: false,
            positivity_limiter_density: true,
            positivity_limiter_pressure: Some(PressureLimiter::Exact),
            entropy_limiter_semidiscrete: false,
            positivity_correction_factor: 0.1,
        }
    }
}

impl MclConfig {
    pub fn with_density_limiter(mut self, enabled: bool) -> Self {
        self.density_limiter = enabled;
        self
    }

    pub fn with_density_coefficient_for_all(mut self, enabled: bool) -> Self {
        self.density_coefficient_for_all = enabled;
        self
    }

    pub fn with_sequential_limiter(mut self, enabled: bool) -> Self {
        self.sequential_limiter = enabled;
        self
    }

    pub fn with_conservative_limiter(mut self, enabled: bool) -> Self {
        self.conservative_limiter = enabled;
        self
    }

    pub fn with_positivity_limiter_density(mut self, enabled: bool) -> Self {
        self.positivity_limiter_density = enabled;
        self
    }

    pub fn with_positivity_limiter_pressure(mut self, variant: Option<PressureLimiter>) -> Self {
        self.positivity_limiter_pressure = variant;
        self
    }

    pub fn with_entropy_limiter(mut self, enabled: bool) -> Self {
        self.entropy_limiter_semidiscrete = enabled;
        self
    }

    pub fn with_positivity_correction_factor(mut self, factor: f64) -> Self {
        self.positivity_correction_factor = factor;
        self
    }

    /// Check the configuration against a system of `n_vars` variables.
    ///
    /// The pressure limiter needs the Euler layout, at least `[ρ, m, E]`.
    pub fn validate(&self, n_vars: usize) -> Result<(), ConfigError> {
        if self.sequential_limiter && self.conservative_limiter {
            return Err(ConfigError::MutuallyExclusive {
                first: "sequential limiter",
                second: "conservative limiter",
            });
        }
        validate_correction_factor(self.positivity_correction_factor)?;
        if self.positivity_limiter_pressure.is_some() && n_vars < 3 {
            return Err(ConfigError::VariableIndex { index: 2, n_vars });
        }
        if !(self.density_limiter
            || self.sequential_limiter
            || self.conservative_limiter
            || self.positivity_limiter_density
            || self.positivity_limiter_pressure.is_some()
            || self.entropy_limiter_semidiscrete)
        {
            return Err(ConfigError::NothingToLimit);
        }
        Ok(())
    }

    /// Bound keys checked by the bounds check, in log order.
    pub fn bound_keys(&self, n_vars: usize) -> Vec<BoundKey> {
        let mut keys = Vec::new();
        if self.density_limiter {
            keys.push(BoundKey::LocalMin(0));
            keys.push(BoundKey::LocalMax(0));
        }
        if self.sequential_limiter {
            for v in 1..n_vars {
                keys.push(BoundKey::RatioMin(v));
                keys.push(BoundKey::RatioMax(v));
            }
        }
        if self.conservative_limiter {
            for v in 1..n_vars {
                keys.push(BoundKey::LocalMin(v));
                keys.push(BoundKey::LocalMax(v));
            }
        }
        if self.positivity_limiter_density {
            keys.push(BoundKey::Positivity(0));
        }
        if self.positivity_limiter_pressure.is_some() {
            keys.push(BoundKey::PressurePositivity);
        }
        keys
    }
}

fn validate_correction_factor(factor: f64) -> Result<(), ConfigError> {
    if (0.0..1.0).contains(&factor) {
        Ok(())
    } else {
        Err(ConfigError::CorrectionFactor(factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idp_entropies_exclusive() {
        let cfg = IdpConfig::default()
            .with_spec_entropy(true)
            .with_math_entropy(true);
        assert!(matches!(
            cfg.validate(4),
            Err(ConfigError::MutuallyExclusive { .. })
        ));
    }

    #[test]
    fn test_idp_rejects_bad_values() {
        let base = IdpConfig::positivity();
        assert!(base.validate(4).is_ok());
        assert_eq!(
            base.clone().with_positivity_correction_factor(1.0).validate(4),
            Err(ConfigError::CorrectionFactor(1.0))
        );
        assert_eq!(
            base.clone().with_newton(0, 1e-12, 1e-14).validate(4),
            Err(ConfigError::NewtonIterations)
        );
        assert!(matches!(
            base.clone().with_newton(5, -1.0, 1e-14).validate(4),
            Err(ConfigError::NewtonTolerance { name: "newton_reltol", .. })
        ));
        assert_eq!(
            base.with_local_twosided(vec![4]).validate(4),
            Err(ConfigError::VariableIndex { index: 4, n_vars: 4 })
        );
        assert_eq!(IdpConfig::default().validate(4), Err(ConfigError::NothingToLimit));
    }

    #[test]
    fn test_idp_key_order() {
        let cfg = IdpConfig::positivity().with_local_twosided(vec![0]).with_spec_entropy(true);
        assert_eq!(
            cfg.bound_keys(),
            vec![
                BoundKey::LocalMin(0),
                BoundKey::LocalMax(0),
                BoundKey::Positivity(0),
                BoundKey::PressurePositivity,
                BoundKey::SpecEntropyMin,
            ]
        );
    }

    #[test]
    fn test_mcl_sequential_and_conservative_exclusive() {
        let cfg = MclConfig::default().with_conservative_limiter(true);
        assert!(matches!(
            cfg.validate(4),
            Err(ConfigError::MutuallyExclusive { .. })
        ));
        assert!(MclConfig::default().validate(4).is_ok());
    }

    #[test]
    fn test_mcl_keys() {
        let keys = MclConfig::default().bound_keys(4);
        assert_eq!(keys.len(), 2 + 6 + 2);
        assert_eq!(keys[2], BoundKey::RatioMin(1));
        assert_eq!(*keys.last().unwrap(), BoundKey::PressurePositivity);
    }
}
