//! Problem parameters and configuration errors.
use crate::problem::Problem;
use crate::Real;
use log::warn;
use nalgebra::convert;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Quadrature degrees (points per dimension) accepted by the assembly routines.
pub const SUPPORTED_QUADRATURE_DEGREES: std::ops::RangeInclusive<usize> = 1..=3;

/// Errors raised while configuring assembly.
///
/// All of these are detected before any element is visited.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A parameter is outside the range the assembly supports.
    InvalidConfiguration { parameter: &'static str, reason: String },
    /// The problem (forcing family) name is not recognized.
    UnsupportedForcingSelector { selector: String },
}

impl Error {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter,
            reason: reason.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { parameter, reason } => {
                write!(f, "invalid configuration for `{parameter}`: {reason}")
            }
            Self::UnsupportedForcingSelector { selector } => {
                write!(f, "unsupported problem type `{selector}`")
            }
        }
    }
}

impl std::error::Error for Error {}

/// The energy functional being assembled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formulation {
    /// `(1/p) |∇u|^p - f u`, strong form `-div(|∇u|^{p-2} ∇u) = f`.
    PLaplacian,
    /// `(1/p) |∇u|^p + u²/2 - f u`, strong form `-div(|∇u|^{p-2} ∇u) + u = f`.
    PHelmholtz,
}

impl Formulation {
    pub fn has_reaction_term(&self) -> bool {
        matches!(self, Self::PHelmholtz)
    }
}

impl FromStr for Formulation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plap" | "p-laplacian" => Ok(Self::PLaplacian),
            "phelm" | "p-helmholtz" => Ok(Self::PHelmholtz),
            _ => Err(Error::invalid("formulation", format!("unknown formulation `{s}`"))),
        }
    }
}

/// Immutable parameters of one nonlinear solve.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemParameters<T> {
    /// Exponent `p >= 1`.
    pub p: T,
    /// Regularization `eps >= 0`.
    pub eps: T,
    /// Number of Gauss points per dimension.
    pub quadrature_degree: usize,
    pub problem: Problem<T>,
    pub formulation: Formulation,
}

impl<T: Real> ProblemParameters<T> {
    /// The linear p-Helmholtz problem with the cosine manufactured solution.
    pub fn p_helmholtz() -> Self {
        Self {
            p: convert(2.0),
            eps: T::zero(),
            quadrature_degree: 2,
            problem: Problem::Cosines,
            formulation: Formulation::PHelmholtz,
        }
    }

    /// The p-Laplacian with `p = 4` and the polynomial manufactured solution.
    pub fn p_laplacian() -> Self {
        Self {
            p: convert(4.0),
            eps: T::zero(),
            quadrature_degree: 2,
            problem: Problem::Polynomial { alpha: T::one() },
            formulation: Formulation::PLaplacian,
        }
    }

    pub fn with_exponent(self, p: T) -> Self {
        Self { p, ..self }
    }

    pub fn with_regularization(self, eps: T) -> Self {
        Self { eps, ..self }
    }

    pub fn with_quadrature_degree(self, quadrature_degree: usize) -> Self {
        Self {
            quadrature_degree,
            ..self
        }
    }

    pub fn with_problem(self, problem: Problem<T>) -> Self {
        Self { problem, ..self }
    }

    pub fn with_formulation(self, formulation: Formulation) -> Self {
        Self { formulation, ..self }
    }

    /// Checks the parameters, logging warnings for admissible but delicate choices.
    pub fn validate(&self) -> Result<(), Error> {
        if !SUPPORTED_QUADRATURE_DEGREES.contains(&self.quadrature_degree) {
            return Err(Error::invalid(
                "quadrature_degree",
                format!("got {}, only n = 1, 2, 3 are supported", self.quadrature_degree),
            ));
        }
        if !self.p.is_finite() || self.p < T::one() {
            return Err(Error::invalid("p", format!("p >= 1 required, got {}", self.p)));
        }
        if !self.eps.is_finite() || self.eps < T::zero() {
            return Err(Error::invalid("eps", format!("eps >= 0 required, got {}", self.eps)));
        }
        if let Problem::Polynomial { alpha } = self.problem {
            if !alpha.is_finite() {
                return Err(Error::invalid("alpha", format!("alpha must be finite, got {alpha}")));
            }
        }

        let two = T::one() + T::one();
        if self.p == T::one() {
            warn!("well-posedness only known for p > 1");
        }
        if self.eps == T::zero() && self.p < two {
            warn!("eps = 0 with p = {} < 2: zero gradients give non-finite values", self.p);
        }
        Ok(())
    }
}
