//! Discretization error of a computed field against the manufactured solution.
use crate::assembly::{Assembler, ElementSelection};
use crate::comm::Communicator;
use crate::element::interpolate;
use crate::field::LocalField;
use crate::quadrature::Quadrature;
use crate::Real;
use nalgebra::{Point2, Vector2};
use numeric_literals::replace_float_literals;

/// Global error norms of a discrete solution.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ErrorNorms<T> {
    /// `max |u_h - u|` over all unknowns.
    pub max: T,
    /// `max |u_h - u| / max |u|` over all unknowns.
    pub relative_max: T,
    /// Quadrature estimate of `‖u_h - u‖_{L²}`.
    pub l2: T,
}

impl<'a, T, C> Assembler<'a, T, C>
where
    T: Real,
    C: Communicator<T> + ?Sized,
{
    /// Largest nodal error `|u_h - u|` over the unknowns of all processes.
    ///
    /// This is a collective call.
    pub fn max_nodal_error(&self, field: &LocalField<T>) -> eyre::Result<T> {
        let local = self.check_owned_nodes(field).map(|()| {
            self.owned_range()
                .nodes()
                .map(|(i, j)| {
                    let (i, j) = (i as isize, j as isize);
                    let exact = self.solution().u_exact(&self.grid().node_coordinates(i, j));
                    (field[(i, j)] - exact).abs()
                })
                .fold(T::zero(), |acc, e| acc.max(e))
        });
        self.reduce_collectively(local, |comm, value| comm.all_reduce_max(value))
    }

    /// Largest exact nodal value `|u|` over the unknowns of all processes.
    ///
    /// This is a collective call.
    pub fn max_exact_value(&self) -> T {
        let local = self
            .owned_range()
            .nodes()
            .map(|(i, j)| {
                self.solution()
                    .u_exact(&self.grid().node_coordinates(i as isize, j as isize))
                    .abs()
            })
            .fold(T::zero(), |acc, u| acc.max(u));
        self.communicator().all_reduce_max(local)
    }

    /// Squared `L²` error on element `(i, j)`, using the assembler's quadrature rule.
    #[allow(non_snake_case)]
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn estimate_element_L2_error_squared(
        &self,
        field: &LocalField<T>,
        i: usize,
        j: usize,
    ) -> T {
        let values = self.element_values(field, i, j);
        let half_size = Vector2::new(self.grid().hx::<T>(), self.grid().hy::<T>()) * 0.5;
        let center = self.grid().node_coordinates::<T>(i as isize, j as isize) - half_size;
        let error_squared = self.quadrature().integrate(|xi: &Point2<T>| {
            let x = center + half_size.component_mul(&xi.coords);
            let error = interpolate(&values.u, xi) - self.solution().u_exact(&x);
            error * error
        });
        error_squared * self.jacobian_determinant()
    }

    /// Quadrature estimate of `‖u_h - u‖_{L²}` over the whole domain.
    ///
    /// Squared element errors are summed over the owned elements of every process before the
    /// square root is taken. This is a collective call.
    #[allow(non_snake_case)]
    pub fn estimate_L2_error(&self, field: &LocalField<T>) -> eyre::Result<T> {
        let local = self.check_field(field).map(|()| {
            self.elements(ElementSelection::Owned)
                .map(|(i, j)| self.estimate_element_L2_error_squared(field, i, j))
                .fold(T::zero(), |acc, e| acc + e)
        });
        let error_squared =
            self.reduce_collectively(local, |comm, value| comm.all_reduce_sum(value))?;
        Ok(error_squared.sqrt())
    }

    /// Maximum, relative maximum and `L²` errors of `field`.
    ///
    /// This is a collective call. Failures are reported on every process, so the processes
    /// stay in step. The relative error is taken as zero when the exact solution vanishes at
    /// every unknown and the absolute error does too.
    pub fn error_norms(&self, field: &LocalField<T>) -> eyre::Result<ErrorNorms<T>> {
        let max = self.max_nodal_error(field)?;
        let scale = self.max_exact_value();
        let l2 = self.estimate_L2_error(field)?;
        let relative_max = if max == T::zero() { T::zero() } else { max / scale };
        Ok(ErrorNorms { max, relative_max, l2 })
    }
}
