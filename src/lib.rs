//! Element-local nonlinear finite element assembly on structured quadrilateral grids.
//!
//! `pfem` evaluates the energy functional
//!
//! ```text
//!     I[u] = ∫ (1/p) (|∇u|² + ε²)^{p/2} + R(u) - f u
//! ```
//!
//! and its gradient (the weak-form residual) for bilinear (Q1) elements on the unit square,
//! where `R(u) = u²/2` for the p-Helmholtz problem and `R(u) = 0` for the p-Laplacian.
//! Nonlinear iteration, distributed vector storage and ghost exchange are left to the caller:
//! an [`Assembler`](assembly::Assembler) consumes a ghosted [`LocalField`](field::LocalField)
//! for the nodes owned by one process and produces either the globally reduced objective or the
//! local part of the residual.

pub mod assembly;
pub mod comm;
pub mod config;
pub mod element;
pub mod error;
pub mod field;
pub mod grid;
pub mod operator;
pub mod problem;
pub mod quadrature;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;

pub use config::{Error, Formulation, ProblemParameters};

use nalgebra::RealField;

/// Scalar types supported by the assembly routines.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
