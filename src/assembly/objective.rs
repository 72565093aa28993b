use crate::assembly::{Assembler, ElementSelection, ElementValues};
use crate::comm::Communicator;
use crate::element::{interpolate, interpolate_gradient};
use crate::field::LocalField;
use crate::grid::{owns_element, touching_elements};
use crate::quadrature::Quadrature;
use crate::Real;
use nalgebra::Point2;
use numeric_literals::replace_float_literals;
use rayon::prelude::*;

impl<'a, T, C> Assembler<'a, T, C>
where
    T: Real,
    C: Communicator<T> + ?Sized,
{
    /// Integral of the energy density over one element.
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    pub fn element_objective(&self, values: &ElementValues<T>) -> T {
        let p = self.parameters.p;
        let reaction = self.parameters.formulation.has_reaction_term();
        let integral = self.quadrature.integrate(|xi: &Point2<T>| {
            let u = interpolate(&values.u, xi);
            let du = interpolate_gradient(&values.u, xi);
            let f = interpolate(&values.f, xi);
            let mut density = self.operator.grad_pow(&du, p) / p - f * u;
            if reaction {
                density += 0.5 * u * u;
            }
            density
        });
        integral * self.jacobian_determinant
    }

    /// Objective contribution of the elements owned by this process, without reduction.
    pub fn local_objective(&self, field: &LocalField<T>) -> eyre::Result<T> {
        self.check_field(field)?;
        Ok(self
            .elements(ElementSelection::Owned)
            .map(|(i, j)| self.element_objective(&self.element_values(field, i, j)))
            .fold(T::zero(), |acc, value| acc + value))
    }

    /// Evaluates the objective, summed over all processes of the communicator.
    ///
    /// This is a collective call: every process of the group must make it. If the field of any
    /// process is unusable, every process returns an error.
    pub fn assemble_objective(&self, field: &LocalField<T>) -> eyre::Result<T> {
        let local = self.local_objective(field);
        self.reduce_collectively(local, |comm, value| comm.all_reduce_sum(value))
    }
}

impl<'a, T, C> Assembler<'a, T, C>
where
    T: Real,
    C: Communicator<T> + Sync + ?Sized,
{
    /// Same as [`assemble_objective`](Self::assemble_objective), with element rows evaluated in
    /// parallel.
    ///
    /// Row sums are combined in row order, so the result does not depend on the number of
    /// threads. It may differ from the sequential result by rounding.
    pub fn assemble_objective_par(&self, field: &LocalField<T>) -> eyre::Result<T> {
        let local = self.check_field(field).map(|()| {
            let (range_x, range_y) = touching_elements(&self.owned_range, self.grid);
            let row_sums: Vec<T> = range_y
                .into_par_iter()
                .map(|j| {
                    range_x
                        .clone()
                        .filter(|&i| owns_element(i, j, &self.owned_range, self.grid))
                        .map(|i| self.element_objective(&self.element_values(field, i, j)))
                        .fold(T::zero(), |acc, value| acc + value)
                })
                .collect();
            row_sums.into_iter().fold(T::zero(), |acc, value| acc + value)
        });
        self.reduce_collectively(local, |comm, value| comm.all_reduce_sum(value))
    }
}
