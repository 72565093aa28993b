//! Structured grids on the unit square, node ownership and element ownership.
use crate::config::Error;
use crate::Real;
use itertools::iproduct;
use nalgebra::{convert, Point2};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// How the boundary of the unit square is treated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// Only interior nodes are unknowns. Boundary values come from the exact solution.
    Dirichlet,
    /// Boundary nodes are unknowns too (natural boundary condition).
    Neumann,
}

/// Where the value at an element corner comes from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CornerSource {
    /// An unknown, read from the local field.
    Field,
    /// A Dirichlet boundary node, evaluated from the exact solution.
    Dirichlet,
}

/// A uniform grid of `mx × my` unknowns on the unit square.
///
/// For [`BoundaryCondition::Dirichlet`] the unknowns are interior nodes: node `i` sits at
/// `x = (i + 1) hx` with `hx = 1 / (mx + 1)`, and indices `-1` and `mx` denote boundary nodes.
/// For [`BoundaryCondition::Neumann`] the nodes include the boundary: node `i` sits at
/// `x = i hx` with `hx = 1 / (mx - 1)`.
///
/// Elements are identified by their top-right node `(i, j)` and have corners
/// `(i, j), (i - 1, j), (i - 1, j - 1), (i, j - 1)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredGrid {
    mx: usize,
    my: usize,
    boundary: BoundaryCondition,
}

impl StructuredGrid {
    pub fn new(mx: usize, my: usize, boundary: BoundaryCondition) -> Result<Self, Error> {
        let min_nodes = match boundary {
            BoundaryCondition::Dirichlet => 1,
            BoundaryCondition::Neumann => 2,
        };
        if mx < min_nodes || my < min_nodes {
            return Err(Error::invalid(
                "grid",
                format!(
                    "{boundary:?} grids need {min_nodes} or more nodes per direction, got {mx} x {my}"
                ),
            ));
        }
        Ok(Self { mx, my, boundary })
    }

    pub fn dirichlet(mx: usize, my: usize) -> Result<Self, Error> {
        Self::new(mx, my, BoundaryCondition::Dirichlet)
    }

    pub fn neumann(mx: usize, my: usize) -> Result<Self, Error> {
        Self::new(mx, my, BoundaryCondition::Neumann)
    }

    pub fn mx(&self) -> usize {
        self.mx
    }

    pub fn my(&self) -> usize {
        self.my
    }

    pub fn boundary(&self) -> BoundaryCondition {
        self.boundary
    }

    pub fn num_nodes(&self) -> usize {
        self.mx * self.my
    }

    fn num_intervals(&self, m: usize) -> usize {
        match self.boundary {
            BoundaryCondition::Dirichlet => m + 1,
            BoundaryCondition::Neumann => m - 1,
        }
    }

    pub fn hx<T: Real>(&self) -> T {
        T::one() / convert::<f64, T>(self.num_intervals(self.mx) as f64)
    }

    pub fn hy<T: Real>(&self) -> T {
        T::one() / convert::<f64, T>(self.num_intervals(self.my) as f64)
    }

    /// Physical coordinates of node `(i, j)`. Boundary indices `-1`, `mx`, `my` are allowed
    /// on Dirichlet grids.
    pub fn node_coordinates<T: Real>(&self, i: isize, j: isize) -> Point2<T> {
        let shift = match self.boundary {
            BoundaryCondition::Dirichlet => 1,
            BoundaryCondition::Neumann => 0,
        };
        let x = self.hx::<T>() * convert::<f64, T>((i + shift) as f64);
        let y = self.hy::<T>() * convert::<f64, T>((j + shift) as f64);
        Point2::new(x, y)
    }

    pub fn contains_node(&self, i: isize, j: isize) -> bool {
        0 <= i && i < self.mx as isize && 0 <= j && j < self.my as isize
    }

    /// Classifies an element corner as an unknown or as Dirichlet boundary data.
    pub fn corner_source(&self, i: isize, j: isize) -> CornerSource {
        match self.boundary {
            BoundaryCondition::Dirichlet if !self.contains_node(i, j) => CornerSource::Dirichlet,
            _ => CornerSource::Field,
        }
    }

    /// Top-right node indices `i` of all elements in the grid.
    pub fn element_range_x(&self) -> RangeInclusive<usize> {
        Self::element_range(self.boundary, self.mx)
    }

    /// Top-right node indices `j` of all elements in the grid.
    pub fn element_range_y(&self) -> RangeInclusive<usize> {
        Self::element_range(self.boundary, self.my)
    }

    fn element_range(boundary: BoundaryCondition, m: usize) -> RangeInclusive<usize> {
        match boundary {
            BoundaryCondition::Dirichlet => 0..=m,
            BoundaryCondition::Neumann => 1..=m - 1,
        }
    }

    pub fn num_elements(&self) -> usize {
        self.num_intervals(self.mx) * self.num_intervals(self.my)
    }

    pub fn contains_element(&self, i: usize, j: usize) -> bool {
        self.element_range_x().contains(&i) && self.element_range_y().contains(&j)
    }

    pub fn full_range(&self) -> OwnedRange {
        OwnedRange::new(0, self.mx, 0, self.my)
    }

    /// Checks that `range` is a non-empty box of nodes inside the grid.
    pub fn check_range(&self, range: &OwnedRange) -> Result<(), Error> {
        if range.xm == 0 || range.ym == 0 || range.x_end() > self.mx || range.y_end() > self.my {
            return Err(Error::invalid(
                "owned range",
                format!("{range:?} is empty or not inside a {} x {} grid", self.mx, self.my),
            ));
        }
        Ok(())
    }

    /// Splits the nodes into `px × py` boxes, as evenly as possible.
    ///
    /// Ranges are returned row-major: part `(a, b)` is at index `b * px + a`. The first
    /// `m % px` parts along x get one extra node.
    pub fn partition(&self, px: usize, py: usize) -> Result<Vec<OwnedRange>, Error> {
        if px == 0 || py == 0 || px > self.mx || py > self.my {
            return Err(Error::invalid(
                "partition",
                format!("cannot split {} x {} nodes into {px} x {py} parts", self.mx, self.my),
            ));
        }
        let xs = split_evenly(self.mx, px);
        let ys = split_evenly(self.my, py);
        Ok(iproduct!(ys, xs)
            .map(|((ys, ym), (xs, xm))| OwnedRange::new(xs, xm, ys, ym))
            .collect())
    }
}

fn split_evenly(m: usize, parts: usize) -> Vec<(usize, usize)> {
    let mut start = 0;
    (0..parts)
        .map(|k| {
            let len = m / parts + usize::from(k < m % parts);
            let range = (start, len);
            start += len;
            range
        })
        .collect()
}

/// The box of nodes `[xs, xs + xm) × [ys, ys + ym)` owned by one process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnedRange {
    pub xs: usize,
    pub xm: usize,
    pub ys: usize,
    pub ym: usize,
}

impl OwnedRange {
    pub fn new(xs: usize, xm: usize, ys: usize, ym: usize) -> Self {
        Self { xs, xm, ys, ym }
    }

    pub fn x_end(&self) -> usize {
        self.xs + self.xm
    }

    pub fn y_end(&self) -> usize {
        self.ys + self.ym
    }

    pub fn len(&self) -> usize {
        self.xm * self.ym
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_node(&self, i: isize, j: isize) -> bool {
        let (xs, ys) = (self.xs as isize, self.ys as isize);
        xs <= i && i < self.x_end() as isize && ys <= j && j < self.y_end() as isize
    }

    /// Owned nodes in row-major order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, usize)> {
        iproduct!(self.ys..self.y_end(), self.xs..self.x_end()).map(|(j, i)| (i, j))
    }
}

/// Whether the process owning `range` is responsible for element `(i, j)`.
///
/// An element belongs to the owner of its top-right node. On Dirichlet grids the top row and
/// right column of elements have a boundary node as top-right corner; those belong to the
/// process whose range reaches the boundary. Every element of the grid is owned by exactly
/// one range of a partition.
pub fn owns_element(i: usize, j: usize, range: &OwnedRange, grid: &StructuredGrid) -> bool {
    let right_boundary = i == grid.mx() && range.x_end() == grid.mx();
    let top_boundary = j == grid.my() && range.y_end() == grid.my();
    let owns_x = range.xs <= i && (i < range.x_end() || right_boundary);
    let owns_y = range.ys <= j && (j < range.y_end() || top_boundary);
    grid.contains_element(i, j) && owns_x && owns_y
}

/// Top-right indices of all elements with at least one corner in `range`, clipped to the grid.
///
/// The returned ranges may be empty.
pub fn touching_elements(
    range: &OwnedRange,
    grid: &StructuredGrid,
) -> (RangeInclusive<usize>, RangeInclusive<usize>) {
    let clip = |start: usize, end: usize, all: RangeInclusive<usize>| {
        let (lo, hi) = all.into_inner();
        start.max(lo)..=end.min(hi)
    };
    (
        clip(range.xs, range.x_end(), grid.element_range_x()),
        clip(range.ys, range.y_end(), grid.element_range_y()),
    )
}
