use crate::assembly::{Assembler, ElementSelection, ElementValues};
use crate::comm::Communicator;
use crate::element::{evaluate_basis, gradients};
use crate::field::LocalField;
use crate::quadrature::Quadrature;
use crate::Real;
use nalgebra::{Vector2, Vector4};

impl<'a, T, C> Assembler<'a, T, C>
where
    T: Real,
    C: Communicator<T> + ?Sized,
{
    /// Residual contributions of one element to its four corners, in local node order.
    pub fn element_residual(&self, values: &ElementValues<T>) -> Vector4<T> {
        let exponent = self.parameters.p - (T::one() + T::one());
        let reaction = self.parameters.formulation.has_reaction_term();
        let mut residual = Vector4::zeros();
        for (&w, xi) in self.quadrature.iter() {
            let phi = evaluate_basis(xi);
            let phi_grad = gradients(xi);
            let u = (phi * values.u)[0];
            let f = (phi * values.f)[0];
            let du = phi_grad * values.u;
            let flux = self.operator.grad_pow(&du, exponent);
            let source = if reaction { u - f } else { -f };
            for l in 0..4 {
                let dchi: Vector2<T> = phi_grad.column(l).into_owned();
                let diffusion = flux * self.operator.grad_inner_product(&du, &dchi);
                residual[l] += w * (diffusion + source * phi[l]);
            }
        }
        residual * self.jacobian_determinant
    }

    /// Evaluates the residual at the owned nodes, writing it into `output`.
    ///
    /// Owned values of `output` are overwritten; other stored values are left untouched. Every
    /// element touching an owned node contributes, and Dirichlet nodes never receive
    /// contributions. Elements are visited in a fixed order, so repeated calls with the same
    /// field give identical results.
    pub fn assemble_residual_into(
        &self,
        field: &LocalField<T>,
        output: &mut LocalField<T>,
    ) -> eyre::Result<()> {
        self.check_field(field)?;
        self.check_owned_nodes(output)?;
        for (i, j) in self.owned_range.nodes() {
            output[(i as isize, j as isize)] = T::zero();
        }

        for (i, j) in self.elements(ElementSelection::Touching) {
            let values = self.element_values(field, i, j);
            let element_residual = self.element_residual(&values);
            for l in 0..4 {
                let (ni, nj) = values.corner(l);
                if self.owned_range.contains_node(ni, nj) {
                    output[(ni, nj)] += element_residual[l];
                }
            }
        }
        Ok(())
    }

    /// Evaluates the residual at the owned nodes, returned as a field without ghosts.
    pub fn assemble_residual(&self, field: &LocalField<T>) -> eyre::Result<LocalField<T>> {
        let mut output = LocalField::zeros(self.owned_range, 0);
        self.assemble_residual_into(field, &mut output)?;
        Ok(output)
    }
}
