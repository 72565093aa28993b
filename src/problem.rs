//! Manufactured solutions and the matching right-hand sides.
//!
//! Each [`Problem`] pairs a closed-form exact solution `u` with the forcing `f` for which `u`
//! solves
//!
//! ```text
//!     -div((|∇u|² + ε²)^{(p-2)/2} ∇u) + c u = f
//! ```
//!
//! with `c = 1` for [`Formulation::PHelmholtz`] and `c = 0` for [`Formulation::PLaplacian`].
use crate::config::{Error, Formulation, ProblemParameters};
use crate::Real;
use nalgebra::{Point2, Vector2};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The manufactured solution family.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Problem<T> {
    /// `u = 1`.
    Constant,
    /// `u = cos(πx) cos(πy)`.
    Cosines,
    /// `u = ½ (x + α)² (y + α)²`.
    Polynomial { alpha: T },
}

impl<T: Real> FromStr for Problem<T> {
    type Err = Error;

    /// Parses `constant`, `cosines` or `polynomial` (with `α = 1`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Self::Constant),
            "cosines" => Ok(Self::Cosines),
            "polynomial" => Ok(Self::Polynomial { alpha: T::one() }),
            _ => Err(Error::UnsupportedForcingSelector { selector: s.to_string() }),
        }
    }
}

/// How the initial iterate handed to a nonlinear solver is chosen.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum InitialIterate<T> {
    /// The same value at every node.
    Constant(T),
    /// The exact solution.
    Exact,
    /// `(1 - x) u(0, y) + x u(1, y)`, blending the left and right boundary data.
    BoundaryBlend,
}

/// Exact solution and forcing for fixed `(p, ε)` and formulation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ManufacturedSolution<T> {
    problem: Problem<T>,
    formulation: Formulation,
    p: T,
    eps: T,
}

impl<T: Real> ManufacturedSolution<T> {
    pub fn new(problem: Problem<T>, formulation: Formulation, p: T, eps: T) -> Self {
        Self {
            problem,
            formulation,
            p,
            eps,
        }
    }

    pub fn from_parameters(parameters: &ProblemParameters<T>) -> Self {
        Self::new(parameters.problem, parameters.formulation, parameters.p, parameters.eps)
    }

    pub fn problem(&self) -> &Problem<T> {
        &self.problem
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn u_exact(&self, x: &Point2<T>) -> T {
        match self.problem {
            Problem::Constant => 1.0,
            Problem::Cosines => {
                let pi = T::pi();
                (pi * x.x).cos() * (pi * x.y).cos()
            }
            Problem::Polynomial { alpha } => {
                let (a, b) = (x.x + alpha, x.y + alpha);
                0.5 * a * a * b * b
            }
        }
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn u_exact_gradient(&self, x: &Point2<T>) -> Vector2<T> {
        match self.problem {
            Problem::Constant => Vector2::zeros(),
            Problem::Cosines => {
                let pi = T::pi();
                let (cx, sx) = ((pi * x.x).cos(), (pi * x.x).sin());
                let (cy, sy) = ((pi * x.y).cos(), (pi * x.y).sin());
                Vector2::new(-pi * sx * cy, -pi * cx * sy)
            }
            Problem::Polynomial { alpha } => {
                let (a, b) = (x.x + alpha, x.y + alpha);
                Vector2::new(a * b * b, a * a * b)
            }
        }
    }

    /// The right-hand side `f` at `x`.
    pub fn forcing(&self, x: &Point2<T>) -> T {
        let divergence_term = self.negative_flux_divergence(x);
        match self.formulation {
            Formulation::PLaplacian => divergence_term,
            Formulation::PHelmholtz => divergence_term + self.u_exact(x),
        }
    }

    /// `-div((|∇u|² + ε²)^s ∇u)` with `s = (p - 2) / 2`, expanded by the chain rule as
    /// `-s w^{s-1} ⟨∇w, ∇u⟩ - w^s Δu` where `w = |∇u|² + ε²`.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn negative_flux_divergence(&self, x: &Point2<T>) -> T {
        let s = (self.p - 2.0) / 2.0;
        let eps2 = self.eps * self.eps;
        match self.problem {
            Problem::Constant => 0.0,
            Problem::Cosines => {
                let pi = T::pi();
                let pi2 = pi * pi;
                let u = self.u_exact(x);
                let lap_u = -2.0 * pi2 * u;
                // The linear case avoids 0 * w^{-1} at critical points of u when eps = 0
                if self.p == 2.0 {
                    return -lap_u;
                }
                let du = self.u_exact_gradient(x);
                let w = du.norm_squared() + eps2;
                let pi3 = pi2 * pi;
                let dw = Vector2::new(
                    pi3 * (2.0 * pi * x.x).sin() * (2.0 * pi * x.y).cos(),
                    pi3 * (2.0 * pi * x.x).cos() * (2.0 * pi * x.y).sin(),
                );
                chain_rule_term(s, w, dw.dot(&du)) - w.powf(s) * lap_u
            }
            Problem::Polynomial { alpha } => {
                let (a, b) = (x.x + alpha, x.y + alpha);
                let (aa, bb) = (a * a, b * b);
                let w = aa * bb * (aa + bb) + eps2;
                let lap_u = aa + bb;
                // ⟨∇w, ∇u⟩ = 2 a² b² (a⁴ + 4 a² b² + b⁴)
                let dw_dot_du = 2.0 * aa * bb * (aa * aa + 4.0 * aa * bb + bb * bb);
                chain_rule_term(s, w, dw_dot_du) - w.powf(s) * lap_u
            }
        }
    }

    /// Value of the chosen initial iterate at `x`.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn initial_value(&self, initial: &InitialIterate<T>, x: &Point2<T>) -> T {
        match initial {
            InitialIterate::Constant(value) => *value,
            InitialIterate::Exact => self.u_exact(x),
            InitialIterate::BoundaryBlend => {
                let left = self.u_exact(&Point2::new(0.0, x.y));
                let right = self.u_exact(&Point2::new(1.0, x.y));
                (1.0 - x.x) * left + x.x * right
            }
        }
    }
}

/// `-s w^{s-1} ⟨∇w, ∇u⟩`, taken as zero where `⟨∇w, ∇u⟩` vanishes (critical points of `u`).
fn chain_rule_term<T: Real>(s: T, w: T, dw_dot_du: T) -> T {
    if dw_dot_du == T::zero() {
        T::zero()
    } else {
        -s * w.powf(s - T::one()) * dw_dot_du
    }
}
