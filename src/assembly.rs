//! The element loop shared by objective and residual assembly.
//!
//! An [`Assembler`] is configured once per solve with the grid, the range of nodes owned by the
//! calling process, the problem parameters and a [`Communicator`]. Configuration errors are
//! reported by [`AssemblerBuilder::build`], before any element is visited. Afterwards the
//! assembler only reads the fields it is handed.
use crate::comm::Communicator;
use crate::config::Error;
use crate::element::QUAD4_NODE_OFFSETS;
use crate::field::LocalField;
use crate::grid::{owns_element, touching_elements, CornerSource, OwnedRange, StructuredGrid};
use crate::operator::RegularizedPowerLaw;
use crate::problem::ManufacturedSolution;
use crate::quadrature::{quadrilateral_gauss_legendre, QuadraturePair2d};
use crate::{ProblemParameters, Real};
use eyre::eyre;
use itertools::iproduct;
use log::debug;
use nalgebra::{convert, Vector4};

mod objective;
mod residual;

/// Which elements an element loop visits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ElementSelection {
    /// Elements owned by the process, see [`owns_element`]. Each element of the grid is visited
    /// by exactly one process.
    Owned,
    /// Every element with a corner in the owned node range. Elements along partition seams are
    /// visited by more than one process.
    Touching,
}

/// Corner data of one element, gathered for a single visit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ElementValues<T> {
    /// Top-right node of the element.
    pub i: usize,
    pub j: usize,
    /// Iterate values at the four corners, in local node order.
    pub u: Vector4<T>,
    /// Forcing values at the four corners, in local node order.
    pub f: Vector4<T>,
}

impl<T> ElementValues<T> {
    /// Grid indices of local node `local_node`.
    pub fn corner(&self, local_node: usize) -> (isize, isize) {
        let (di, dj) = QUAD4_NODE_OFFSETS[local_node];
        (self.i as isize + di, self.j as isize + dj)
    }
}

/// Builder for [`Assembler`].
///
/// The grid, the parameters and the communicator are mandatory. The owned range defaults to the
/// whole grid.
pub struct AssemblerBuilder<GridRef, Params, Comm> {
    grid: GridRef,
    owned_range: Option<OwnedRange>,
    parameters: Params,
    communicator: Comm,
}

impl AssemblerBuilder<(), (), ()> {
    pub fn new() -> Self {
        Self {
            grid: (),
            owned_range: None,
            parameters: (),
            communicator: (),
        }
    }
}

impl Default for AssemblerBuilder<(), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<GridRef, Params, Comm> AssemblerBuilder<GridRef, Params, Comm> {
    pub fn with_owned_range(self, owned_range: OwnedRange) -> Self {
        Self {
            owned_range: Some(owned_range),
            ..self
        }
    }
}

impl<Params, Comm> AssemblerBuilder<(), Params, Comm> {
    pub fn with_grid(
        self,
        grid: &StructuredGrid,
    ) -> AssemblerBuilder<&StructuredGrid, Params, Comm> {
        AssemblerBuilder {
            grid,
            owned_range: self.owned_range,
            parameters: self.parameters,
            communicator: self.communicator,
        }
    }
}

impl<GridRef, Comm> AssemblerBuilder<GridRef, (), Comm> {
    pub fn with_parameters<T>(
        self,
        parameters: ProblemParameters<T>,
    ) -> AssemblerBuilder<GridRef, ProblemParameters<T>, Comm> {
        AssemblerBuilder {
            grid: self.grid,
            owned_range: self.owned_range,
            parameters,
            communicator: self.communicator,
        }
    }
}

impl<GridRef, Params> AssemblerBuilder<GridRef, Params, ()> {
    pub fn with_communicator<C: ?Sized>(
        self,
        communicator: &C,
    ) -> AssemblerBuilder<GridRef, Params, &C> {
        AssemblerBuilder {
            grid: self.grid,
            owned_range: self.owned_range,
            parameters: self.parameters,
            communicator,
        }
    }
}

impl<'a, 'c: 'a, T, C> AssemblerBuilder<&'a StructuredGrid, ProblemParameters<T>, &'c C>
where
    T: Real,
    C: Communicator<T> + ?Sized,
{
    /// Validates the configuration and precomputes the quadrature rule.
    pub fn build(self) -> Result<Assembler<'a, T, C>, Error> {
        let grid = self.grid;
        let parameters = self.parameters;
        parameters.validate()?;
        let owned_range = self.owned_range.unwrap_or_else(|| grid.full_range());
        grid.check_range(&owned_range)?;
        let quadrature = quadrilateral_gauss_legendre(parameters.quadrature_degree)?;

        debug!(
            "Configured {:?} assembler on {:?} grid {} x {} (rank {} of {}, owned {:?})",
            parameters.formulation,
            grid.boundary(),
            grid.mx(),
            grid.my(),
            self.communicator.rank(),
            self.communicator.size(),
            owned_range
        );
        debug!(
            "p = {}, eps = {}, {} quadrature points",
            parameters.p,
            parameters.eps,
            quadrature.0.len()
        );

        let hx: T = grid.hx();
        let hy: T = grid.hy();
        Ok(Assembler {
            grid,
            owned_range,
            parameters,
            quadrature,
            operator: RegularizedPowerLaw::new(hx, hy, parameters.eps),
            solution: ManufacturedSolution::from_parameters(&parameters),
            jacobian_determinant: hx * hy * convert(0.25),
            communicator: self.communicator,
        })
    }
}

/// Evaluates the objective and the residual on the elements of one process.
#[derive(Debug)]
pub struct Assembler<'a, T: Real, C: ?Sized> {
    grid: &'a StructuredGrid,
    owned_range: OwnedRange,
    parameters: ProblemParameters<T>,
    quadrature: QuadraturePair2d<T>,
    operator: RegularizedPowerLaw<T>,
    solution: ManufacturedSolution<T>,
    jacobian_determinant: T,
    communicator: &'a C,
}

impl<'a, T, C> Assembler<'a, T, C>
where
    T: Real,
    C: Communicator<T> + ?Sized,
{
    pub fn grid(&self) -> &StructuredGrid {
        self.grid
    }

    pub fn owned_range(&self) -> &OwnedRange {
        &self.owned_range
    }

    pub fn parameters(&self) -> &ProblemParameters<T> {
        &self.parameters
    }

    pub fn solution(&self) -> &ManufacturedSolution<T> {
        &self.solution
    }

    pub fn operator(&self) -> &RegularizedPowerLaw<T> {
        &self.operator
    }

    pub fn quadrature(&self) -> &QuadraturePair2d<T> {
        &self.quadrature
    }

    pub fn communicator(&self) -> &C {
        self.communicator
    }

    /// Ratio `hx hy / 4` of physical to reference element area.
    pub fn jacobian_determinant(&self) -> T {
        self.jacobian_determinant
    }

    /// Top-right nodes of the selected elements, row by row.
    pub fn elements(
        &self,
        selection: ElementSelection,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (range_x, range_y) = touching_elements(&self.owned_range, self.grid);
        iproduct!(range_y, range_x)
            .map(|(j, i)| (i, j))
            .filter(move |&(i, j)| match selection {
                ElementSelection::Owned => owns_element(i, j, &self.owned_range, self.grid),
                ElementSelection::Touching => true,
            })
    }

    /// Value of the iterate at node `(i, j)`: read from `field` for unknowns, taken from the
    /// exact solution at Dirichlet boundary nodes.
    ///
    /// # Panics
    ///
    /// Panics if the node is an unknown that `field` does not store.
    pub fn corner_value(&self, field: &LocalField<T>, i: isize, j: isize) -> T {
        match self.grid.corner_source(i, j) {
            CornerSource::Field => field[(i, j)],
            CornerSource::Dirichlet => self.solution.u_exact(&self.grid.node_coordinates(i, j)),
        }
    }

    /// Gathers iterate and forcing values at the corners of element `(i, j)`.
    pub fn element_values(&self, field: &LocalField<T>, i: usize, j: usize) -> ElementValues<T> {
        let mut values = ElementValues {
            i,
            j,
            u: Vector4::zeros(),
            f: Vector4::zeros(),
        };
        for local_node in 0..4 {
            let (ci, cj) = values.corner(local_node);
            values.u[local_node] = self.corner_value(field, ci, cj);
            values.f[local_node] = self.solution.forcing(&self.grid.node_coordinates(ci, cj));
        }
        values
    }

    /// Checks that `field` stores every unknown read by an element loop over this range.
    pub(crate) fn check_field(&self, field: &LocalField<T>) -> eyre::Result<()> {
        let (range_x, range_y) = touching_elements(&self.owned_range, self.grid);
        let clip =
            |lo: usize, hi: usize, m: usize| ((lo as isize - 1).max(0), hi.min(m - 1) as isize);
        let (x0, x1) = clip(*range_x.start(), *range_x.end(), self.grid.mx());
        let (y0, y1) = clip(*range_y.start(), *range_y.end(), self.grid.my());
        if field.contains_node(x0, y0) && field.contains_node(x1, y1) {
            Ok(())
        } else {
            Err(eyre!(
                "field over {:?} with ghost width {} misses nodes [{x0}, {x1}] x [{y0}, {y1}]",
                field.range(),
                field.ghost_width()
            ))
        }
    }

    /// Finishes a collective call whose local part produced `local`.
    ///
    /// The number of failed processes is reduced first and every process takes part, including
    /// those whose local part failed. If any process failed, all of them return an error and
    /// `reduce` is not called. Otherwise `reduce` combines the local values.
    pub(crate) fn reduce_collectively(
        &self,
        local: eyre::Result<T>,
        reduce: impl FnOnce(&C, T) -> T,
    ) -> eyre::Result<T> {
        let failed = if local.is_err() { T::one() } else { T::zero() };
        let failures = self.communicator.all_reduce_sum(failed);
        match local {
            Err(error) => Err(error),
            Ok(_) if failures > T::zero() => Err(eyre!(
                "collective call abandoned: the local part failed on {failures} of {} processes",
                self.communicator.size()
            )),
            Ok(value) => Ok(reduce(self.communicator, value)),
        }
    }

    /// Checks that `field` stores every owned node.
    pub(crate) fn check_owned_nodes(&self, field: &LocalField<T>) -> eyre::Result<()> {
        let r = &self.owned_range;
        let (x1, y1) = (r.x_end() as isize - 1, r.y_end() as isize - 1);
        if field.contains_node(r.xs as isize, r.ys as isize) && field.contains_node(x1, y1) {
            Ok(())
        } else {
            Err(eyre!(
                "local field over {:?} does not cover the owned range {:?}",
                field.range(),
                self.owned_range
            ))
        }
    }
}
