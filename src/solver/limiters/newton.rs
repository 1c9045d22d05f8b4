//! Damped Newton iteration with bisection fallback for the admissible step β.
//!
//! For a node state `u`, a per-face update direction `s` and a scalar
//! constraint `g`, find the largest `β ∈ [0, β_max]` such that
//! `u + β s` satisfies the constraint. The goal function is
//! `goal(β) = bound − g(u + β s)` with derivative `−∇g(u + β s) · s`.
//!
//! β = 0 (the low-order state) is admissible by construction, so the left end
//! of the bracket always stays admissible and is the fallback result.

/// Direction of a nonlinear constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalCheck {
    /// `g >= bound` within tolerance
    Min,
    /// `g <= bound` within tolerance
    Max,
    /// `g >= bound` strictly for the full step; a converged root may sit
    /// within the scaled tolerance below a positive bound
    NonNegative,
}

impl GoalCheck {
    #[inline(always)]
    fn tolerance(bound: f64, abstol: f64) -> f64 {
        abstol.max(bound.abs() * abstol)
    }

    /// Whether the goal value describes an admissible state.
    #[inline]
    pub fn admissible(self, bound: f64, goal: f64, abstol: f64) -> bool {
        match self {
            GoalCheck::Min => goal <= Self::tolerance(bound, abstol),
            GoalCheck::Max => goal >= -Self::tolerance(bound, abstol),
            GoalCheck::NonNegative => goal <= 0.0,
        }
    }

    /// Whether the goal value is close enough to the root to stop.
    #[inline]
    pub fn converged(self, bound: f64, goal: f64, abstol: f64) -> bool {
        match self {
            GoalCheck::Min | GoalCheck::Max | GoalCheck::NonNegative => {
                goal.abs() < Self::tolerance(bound, abstol)
            }
        }
    }
}

/// Stopping parameters of the solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonSettings {
    pub max_iterations: usize,
    pub reltol: f64,
    pub abstol: f64,
}

/// Result of one solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonOutcome {
    /// Admissible step length
    pub beta: f64,
    /// Iterations spent (0 when the full step was already admissible)
    pub iterations: usize,
}

/// Find the admissible step length.
///
/// `eval(β)` returns `Some((goal, dgoal/dβ))` for a valid state and `None`
/// when `u + β s` leaves the domain where the constraint is defined.
///
/// # Arguments
/// * `beta_max` - Largest step allowed by earlier constraints
/// * `bound` - Bound value, only used to scale tolerances
pub fn solve_beta<F>(
    beta_max: f64,
    bound: f64,
    check: GoalCheck,
    settings: &NewtonSettings,
    eval: F,
) -> NewtonOutcome
where
    F: Fn(f64) -> Option<(f64, f64)>,
{
    let abstol = settings.abstol;
    let mut beta = beta_max;
    let mut current = eval(beta);

    if let Some((goal, _)) = current {
        if check.admissible(bound, goal, abstol) {
            return NewtonOutcome {
                beta,
                iterations: 0,
            };
        }
    }

    let mut beta_l = 0.0;
    let mut beta_r = beta_max;
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        iterations += 1;
        let beta_old = beta;

        let newton = match current {
            Some((goal, dgoal)) if dgoal != 0.0 => Some(beta - goal / dgoal),
            _ => None,
        };
        beta = match newton {
            Some(candidate) if candidate >= beta_l && candidate <= beta_r => candidate,
            // outside the bracket, zero derivative, NaN or invalid state
            _ => 0.5 * (beta_l + beta_r),
        };

        current = eval(beta);
        let Some((goal, _)) = current else {
            beta_r = beta;
            continue;
        };
        if check.admissible(bound, goal, abstol) {
            beta_l = beta;
        } else {
            beta_r = beta;
        }

        if (beta_old - beta).abs() <= settings.reltol || check.converged(bound, goal, abstol) {
            break;
        }
    }

    let accepted = matches!(current, Some((goal, _))
        if check.admissible(bound, goal, abstol) || check.converged(bound, goal, abstol));
    NewtonOutcome {
        beta: if accepted { beta } else { beta_l },
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> NewtonSettings {
        NewtonSettings {
            max_iterations: 50,
            reltol: 1e-14,
            abstol: 1e-14,
        }
    }

    #[test]
    fn test_full_step_admissible_returns_immediately() {
        let out = solve_beta(0.8, 1.0, GoalCheck::Min, &settings(), |beta| {
            Some((-1.0 - beta, -1.0))
        });
        assert_eq!(out.beta, 0.8);
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn test_converges_to_root_of_convex_goal() {
        // g(β) = 1 − β² must stay above 0.19, root at β = 0.9
        let bound = 0.19;
        let out = solve_beta(1.0, bound, GoalCheck::Min, &settings(), |beta| {
            let g = 1.0 - beta * beta;
            Some((bound - g, 2.0 * beta))
        });
        assert!((out.beta - 0.9).abs() < 1e-10, "beta = {}", out.beta);
        assert!(out.iterations > 0);
    }

    #[test]
    fn test_max_constraint() {
        // g(β) = e^β must stay below 2, root at ln 2
        let out = solve_beta(1.0, 2.0, GoalCheck::Max, &settings(), |beta| {
            Some((2.0 - beta.exp(), -beta.exp()))
        });
        assert!((out.beta - 2f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_nonnegative_result_is_admissible() {
        // pressure-like: p(β) = 1 − 2β must stay >= 0.1
        let bound = 0.1;
        let eval = |beta: f64| Some((bound - (1.0 - 2.0 * beta), 2.0));
        let out = solve_beta(1.0, bound, GoalCheck::NonNegative, &settings(), eval);
        let (goal, _) = eval(out.beta).unwrap();
        assert!(goal <= f64::EPSILON);
        assert!((out.beta - 0.45).abs() < 1e-10);
    }

    #[test]
    fn test_pressure_scale_root_from_inadmissible_side() {
        // p(β) = p0 − 200β − 10β² ≥ bound, Newton approaches every root from above
        let defaults = NewtonSettings {
            max_iterations: 10,
            reltol: 1e-12,
            abstol: 1e-14,
        };
        for k in 0..20 {
            let bound = 100.0 + 37.0 * k as f64;
            let root = 0.38 + 0.001 * k as f64;
            let p0 = bound + 200.0 * root + 10.0 * root * root;
            let eval = |beta: f64| Some((bound - (p0 - 200.0 * beta - 10.0 * beta * beta), 200.0 + 20.0 * beta));
            let out = solve_beta(1.0, bound, GoalCheck::NonNegative, &defaults, eval);
            assert!((out.beta - root).abs() < 1e-8, "bound {bound}: beta = {}", out.beta);
            let p = p0 - 200.0 * out.beta - 10.0 * out.beta * out.beta;
            assert!(p > bound * (1.0 - 1e-13), "bound {bound}: p = {p}");
        }
    }

    #[test]
    fn test_admissible_newton_iterates_raise_the_fallback() {
        // linear goal with root 0.5 and a poor derivative: the first Newton step
        // lands admissible at 0.375, the second overshoots back to 1
        let capped = NewtonSettings {
            max_iterations: 2,
            ..settings()
        };
        let eval = |beta: f64| Some((beta - 0.5, if beta > 0.5 { 0.8 } else { 0.2 }));
        let out = solve_beta(1.0, 0.0, GoalCheck::Min, &capped, eval);
        assert!((out.beta - 0.375).abs() < 1e-12, "beta = {}", out.beta);
        assert_eq!(out.iterations, 2);
    }

    #[test]
    fn test_invalid_states_trigger_bisection() {
        // undefined beyond β = 0.5, root at 0.4
        let out = solve_beta(1.0, 0.0, GoalCheck::Min, &settings(), |beta| {
            if beta > 0.5 {
                None
            } else {
                Some((beta - 0.4, 1.0))
            }
        });
        assert!((out.beta - 0.4).abs() < 1e-10);
    }

    #[test]
    fn test_zero_derivative_falls_back_to_bisection() {
        let out = solve_beta(1.0, 0.0, GoalCheck::Min, &settings(), |beta| {
            Some((if beta > 0.3 { 1.0 } else { -1.0 }, 0.0))
        });
        assert!(out.beta <= 0.3 && out.beta > 0.29);
    }

    #[test]
    fn test_iteration_cap_keeps_admissible_end() {
        let capped = NewtonSettings {
            max_iterations: 1,
            ..settings()
        };
        let eval = |beta: f64| Some((if beta > 0.3 { 1.0 } else { -1.0 }, 0.0));
        let out = solve_beta(1.0, 0.0, GoalCheck::Min, &capped, eval);
        // one bisection to 0.5 is not admissible, fall back to 0
        assert_eq!(out.beta, 0.0);
        assert_eq!(out.iterations, 1);
    }
}
