//! Gauss-Legendre quadrature on the reference interval and the reference square.
use crate::config::Error;
use crate::Real;
use itertools::iproduct;
use nalgebra::{Point1, Point2};
use numeric_literals::replace_float_literals;
use std::iter::Zip;
use std::slice;

pub type QuadraturePair<T, P> = (Vec<T>, Vec<P>);
pub type QuadraturePair1d<T> = QuadraturePair<T, Point1<T>>;
pub type QuadraturePair2d<T> = QuadraturePair<T, Point2<T>>;

/// A quadrature rule consisting of weights and points.
pub trait Quadrature<T: Real, P> {
    fn weights(&self) -> &[T];
    fn points(&self) -> &[P];

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<Function>(&self, f: Function) -> T
    where
        Function: Fn(&P) -> T,
    {
        let mut integral = T::zero();
        for (w, x) in self.iter() {
            integral += *w * f(x);
        }
        integral
    }

    fn iter(&self) -> Zip<slice::Iter<'_, T>, slice::Iter<'_, P>> {
        self.weights().iter().zip(self.points())
    }
}

impl<T, P, A, B> Quadrature<T, P> for (A, B)
where
    T: Real,
    A: AsRef<[T]>,
    B: AsRef<[P]>,
{
    fn weights(&self) -> &[T] {
        self.0.as_ref()
    }

    fn points(&self) -> &[P] {
        self.1.as_ref()
    }
}

/// Nodes and weights of the `n`-point Gauss-Legendre rule on `[-1, 1]`, in increasing order.
#[replace_float_literals(T::from_f64(literal).unwrap())]
fn gauss_legendre_table<T: Real>(num_points: usize) -> Result<(Vec<T>, Vec<T>), Error> {
    match num_points {
        1 => Ok((Vec::from([2.0]), Vec::from([0.0]))),
        2 => {
            let a = (1.0 / 3.0).sqrt();
            Ok((Vec::from([1.0, 1.0]), Vec::from([-a, a])))
        }
        3 => {
            let a = (3.0 / 5.0).sqrt();
            Ok((Vec::from([5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0]), Vec::from([-a, 0.0, a])))
        }
        _ => Err(Error::invalid(
            "quadrature_degree",
            format!("got {num_points}, only n = 1, 2, 3 are supported"),
        )),
    }
}

/// The `n`-point Gauss-Legendre rule on `[-1, 1]`, exact for polynomials of degree `2n - 1`.
///
/// Only `n = 1, 2, 3` are available.
pub fn gauss_legendre<T: Real>(num_points: usize) -> Result<QuadraturePair1d<T>, Error> {
    let (weights, nodes) = gauss_legendre_table(num_points)?;
    Ok((weights, nodes.into_iter().map(Point1::new).collect()))
}

/// Tensor product of the `n`-point Gauss-Legendre rule on `[-1, 1]^2`.
///
/// Point `r * n + s` is `(xi_r, xi_s)` with weight `w_r * w_s`. Only `n = 1, 2, 3` are
/// available.
pub fn quadrilateral_gauss_legendre<T: Real>(
    num_points_per_dim: usize,
) -> Result<QuadraturePair2d<T>, Error> {
    let (weights, nodes) = gauss_legendre_table::<T>(num_points_per_dim)?;
    let weights_2d = iproduct!(&weights, &weights).map(|(&wr, &ws)| wr * ws).collect();
    let points_2d = iproduct!(&nodes, &nodes)
        .map(|(&xr, &xs)| Point2::new(xr, xs))
        .collect();
    Ok((weights_2d, points_2d))
}
