//! Local fields: nodal values over an owned range plus a ghost margin.
use crate::grid::{OwnedRange, StructuredGrid};
use crate::problem::{InitialIterate, ManufacturedSolution};
use crate::Real;
use itertools::iproduct;
use nalgebra::{DVector, Point2, Scalar};
use std::ops::{Index, IndexMut};

/// Nodal values over `[xs - g, xs + xm + g) × [ys - g, ys + ym + g)` for ghost width `g`.
///
/// Indices are signed so that ghost nodes below the origin (and Dirichlet boundary nodes at
/// index `-1`) can be addressed directly.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalField<T> {
    range: OwnedRange,
    ghost_width: usize,
    values: Vec<T>,
}

impl<T: Scalar> LocalField<T> {
    pub fn from_element(range: OwnedRange, ghost_width: usize, value: T) -> Self {
        let len = (range.xm + 2 * ghost_width) * (range.ym + 2 * ghost_width);
        Self {
            range,
            ghost_width,
            values: vec![value; len],
        }
    }

    /// Builds a field by evaluating `f(i, j)` at every stored node, ghosts included.
    pub fn from_fn(
        range: OwnedRange,
        ghost_width: usize,
        mut f: impl FnMut(isize, isize) -> T,
    ) -> Self {
        let g = ghost_width as isize;
        let (x0, y0) = (range.xs as isize - g, range.ys as isize - g);
        let (x1, y1) = (range.x_end() as isize + g, range.y_end() as isize + g);
        let values = iproduct!(y0..y1, x0..x1).map(|(j, i)| f(i, j)).collect();
        Self {
            range,
            ghost_width,
            values,
        }
    }

    pub fn range(&self) -> &OwnedRange {
        &self.range
    }

    pub fn ghost_width(&self) -> usize {
        self.ghost_width
    }

    fn stored_width(&self) -> usize {
        self.range.xm + 2 * self.ghost_width
    }

    /// Whether node `(i, j)` is stored, either owned or ghost.
    pub fn contains_node(&self, i: isize, j: isize) -> bool {
        let g = self.ghost_width as isize;
        let r = &self.range;
        let inside_x = r.xs as isize - g <= i && i < r.x_end() as isize + g;
        let inside_y = r.ys as isize - g <= j && j < r.y_end() as isize + g;
        inside_x && inside_y
    }

    fn linear_index(&self, i: isize, j: isize) -> Option<usize> {
        self.contains_node(i, j).then(|| {
            let g = self.ghost_width as isize;
            let di = (i - (self.range.xs as isize - g)) as usize;
            let dj = (j - (self.range.ys as isize - g)) as usize;
            dj * self.stored_width() + di
        })
    }

    pub fn get(&self, i: isize, j: isize) -> Option<&T> {
        self.linear_index(i, j).map(|idx| &self.values[idx])
    }

    pub fn get_mut(&mut self, i: isize, j: isize) -> Option<&mut T> {
        self.linear_index(i, j).map(move |idx| &mut self.values[idx])
    }

    /// Sets every owned value to `value`, leaving ghosts untouched.
    pub fn fill_owned(&mut self, value: T) {
        for (i, j) in self.range.nodes() {
            self[(i as isize, j as isize)] = value.clone();
        }
    }

    /// Owned values in row-major order.
    pub fn owned_values(&self) -> impl Iterator<Item = &T> + '_ {
        self.range.nodes().map(move |(i, j)| &self[(i as isize, j as isize)])
    }

    /// Copies owned values into the row-major global vector `global` (index `j * mx + i`).
    ///
    /// # Panics
    ///
    /// Panics if `global` is not sized for `grid` or the range lies outside the grid.
    pub fn gather_owned_into(&self, grid: &StructuredGrid, global: &mut DVector<T>) {
        assert_eq!(global.len(), grid.num_nodes(), "global vector must hold every grid node");
        for (i, j) in self.range.nodes() {
            global[j * grid.mx() + i] = self[(i as isize, j as isize)].clone();
        }
    }
}

impl<T: Real> LocalField<T> {
    pub fn zeros(range: OwnedRange, ghost_width: usize) -> Self {
        Self::from_element(range, ghost_width, T::zero())
    }

    /// Reads owned and ghost values from the row-major global vector `global`.
    ///
    /// Stored nodes outside the grid are set to zero. This plays the role of the ghost exchange
    /// when all processes share one address space.
    ///
    /// # Panics
    ///
    /// Panics if `global` is not sized for `grid`.
    pub fn from_global(
        grid: &StructuredGrid,
        range: OwnedRange,
        ghost_width: usize,
        global: &DVector<T>,
    ) -> Self {
        assert_eq!(global.len(), grid.num_nodes(), "global vector must hold every grid node");
        Self::from_fn(range, ghost_width, |i, j| {
            if grid.contains_node(i, j) {
                global[j as usize * grid.mx() + i as usize]
            } else {
                T::zero()
            }
        })
    }

    /// Evaluates `f` at the physical coordinates of every stored grid node.
    pub fn from_coordinates(
        grid: &StructuredGrid,
        range: OwnedRange,
        ghost_width: usize,
        f: impl Fn(&Point2<T>) -> T,
    ) -> Self {
        Self::from_fn(range, ghost_width, |i, j| f(&grid.node_coordinates(i, j)))
    }

    /// The initial iterate of a solve, including ghosts.
    pub fn initial_iterate(
        grid: &StructuredGrid,
        range: OwnedRange,
        ghost_width: usize,
        solution: &ManufacturedSolution<T>,
        initial: &InitialIterate<T>,
    ) -> Self {
        Self::from_coordinates(grid, range, ghost_width, |x| solution.initial_value(initial, x))
    }

    /// Largest absolute owned value.
    pub fn owned_max_abs(&self) -> T {
        self.owned_values().fold(T::zero(), |acc, &v| acc.max(v.abs()))
    }
}

impl<T: Scalar> Index<(isize, isize)> for LocalField<T> {
    type Output = T;

    fn index(&self, (i, j): (isize, isize)) -> &T {
        self.get(i, j)
            .unwrap_or_else(|| {
                panic!("node ({i}, {j}) is not stored in local field over {:?}", self.range)
            })
    }
}

impl<T: Scalar> IndexMut<(isize, isize)> for LocalField<T> {
    fn index_mut(&mut self, (i, j): (isize, isize)) -> &mut T {
        let range = self.range;
        self.get_mut(i, j)
            .unwrap_or_else(|| {
                panic!("node ({i}, {j}) is not stored in local field over {range:?}")
            })
    }
}
