//! The regularized power-law nonlinearity.
use crate::grid::StructuredGrid;
use crate::Real;
use nalgebra::{convert, Vector2};
use numeric_literals::replace_float_literals;

/// Evaluates `(|∇u|² + ε²)^{P/2}` from reference-element gradients.
///
/// Elements are `hx × hy` rectangles mapped affinely from `[-1, 1]^2`, so a reference gradient
/// `(u_xi, u_eta)` corresponds to the physical gradient `(2 u_xi / hx, 2 u_eta / hy)`.
///
/// With `ε = 0` and a negative power `P` a zero gradient yields a non-finite value. Choosing a
/// positive `ε` is the only protection against this.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RegularizedPowerLaw<T> {
    cx: T,
    cy: T,
    eps: T,
}

impl<T: Real> RegularizedPowerLaw<T> {
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn new(hx: T, hy: T, eps: T) -> Self {
        Self {
            cx: 4.0 / (hx * hx),
            cy: 4.0 / (hy * hy),
            eps,
        }
    }

    pub fn for_grid(grid: &StructuredGrid, eps: T) -> Self {
        Self::new(grid.hx(), grid.hy(), eps)
    }

    pub fn eps(&self) -> T {
        self.eps
    }

    /// Physical inner product `⟨∇u, ∇v⟩` of two reference gradients.
    pub fn grad_inner_product(&self, du: &Vector2<T>, dv: &Vector2<T>) -> T {
        self.cx * du.x * dv.x + self.cy * du.y * dv.y
    }

    /// Squared physical gradient norm `|∇u|²`.
    pub fn squared_gradient_norm(&self, du: &Vector2<T>) -> T {
        self.grad_inner_product(du, du)
    }

    /// `(|∇u|² + ε²)^{P/2}`.
    pub fn grad_pow(&self, du: &Vector2<T>, power: T) -> T {
        let half: T = convert(0.5);
        (self.squared_gradient_norm(du) + self.eps * self.eps).powf(power * half)
    }
}
