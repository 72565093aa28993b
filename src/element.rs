//! The bilinear (Q1) reference element on `[-1, 1]^2`.
//!
//! Local nodes are numbered counter-clockwise starting from the top-right corner, matching
//! the corners `(i, j), (i - 1, j), (i - 1, j - 1), (i, j - 1)` of a grid element identified
//! by its top-right node `(i, j)`.
use crate::Real;
use nalgebra::{Matrix1x4, Matrix2x4, Point2, Vector2, Vector4};
use numeric_literals::replace_float_literals;

/// Reference coordinates `(xi_L, eta_L)` of the four local nodes.
pub const QUAD4_NODE_SIGNS: [(f64, f64); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];

/// Grid index offsets `(di, dj)` of the local nodes relative to the top-right node.
pub const QUAD4_NODE_OFFSETS: [(isize, isize); 4] = [(0, 0), (-1, 0), (-1, -1), (0, -1)];

/// Evaluates the shape function `chi_L` of local node `local_node` at `xi`.
///
/// # Panics
///
/// Panics if `local_node >= 4`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn shape<T: Real>(local_node: usize, xi: &Point2<T>) -> T {
    let (a, b) = QUAD4_NODE_SIGNS[local_node];
    let (a, b) = (T::from_f64(a).unwrap(), T::from_f64(b).unwrap());
    0.25 * (1.0 + a * xi.x) * (1.0 + b * xi.y)
}

/// Evaluates the reference gradient `(d/dxi, d/deta)` of the shape function of `local_node`.
///
/// # Panics
///
/// Panics if `local_node >= 4`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn shape_gradient<T: Real>(local_node: usize, xi: &Point2<T>) -> Vector2<T> {
    let (a, b) = QUAD4_NODE_SIGNS[local_node];
    let (a, b) = (T::from_f64(a).unwrap(), T::from_f64(b).unwrap());
    Vector2::new(0.25 * a * (1.0 + b * xi.y), 0.25 * b * (1.0 + a * xi.x))
}

/// All four shape functions evaluated at `xi`, as a row vector.
pub fn evaluate_basis<T: Real>(xi: &Point2<T>) -> Matrix1x4<T> {
    Matrix1x4::from_fn(|_, l| shape(l, xi))
}

/// All four reference gradients at `xi`, one column per local node.
pub fn gradients<T: Real>(xi: &Point2<T>) -> Matrix2x4<T> {
    Matrix2x4::from_columns(&[
        shape_gradient(0, xi),
        shape_gradient(1, xi),
        shape_gradient(2, xi),
        shape_gradient(3, xi),
    ])
}

/// Interpolates the corner values `u` at `xi`.
pub fn interpolate<T: Real>(u: &Vector4<T>, xi: &Point2<T>) -> T {
    (evaluate_basis(xi) * u)[0]
}

/// Reference gradient of the interpolant of the corner values `u` at `xi`.
pub fn interpolate_gradient<T: Real>(u: &Vector4<T>, xi: &Point2<T>) -> Vector2<T> {
    gradients(xi) * u
}
