//! `proptest` strategies for grids, partitions and reference coordinates.
use crate::grid::{BoundaryCondition, OwnedRange, StructuredGrid};
use ::proptest::prelude::*;
use nalgebra::Point2;

/// Points in the reference square `[-1, 1]^2`.
pub fn reference_point() -> impl Strategy<Value = Point2<f64>> {
    let range = -1.0..=1.0;
    [range.clone(), range].prop_map(|[xi, eta]| Point2::new(xi, eta))
}

pub fn boundary_condition() -> impl Strategy<Value = BoundaryCondition> {
    prop_oneof![Just(BoundaryCondition::Dirichlet), Just(BoundaryCondition::Neumann)]
}

/// Grids with at most `max_nodes_per_dim` nodes in each direction.
///
/// # Panics
///
/// Panics if `max_nodes_per_dim < 2`.
pub fn grid(max_nodes_per_dim: usize) -> impl Strategy<Value = StructuredGrid> {
    assert!(max_nodes_per_dim >= 2);
    let nodes = 2..=max_nodes_per_dim;
    (boundary_condition(), nodes.clone(), nodes).prop_map(|(boundary, mx, my)| {
        StructuredGrid::new(mx, my, boundary)
            .expect("grids with two or more nodes per direction are valid")
    })
}

/// A grid together with a partition into `px × py` ranges, `1 <= px, py <= max_parts_per_dim`.
pub fn partitioned_grid(
    max_nodes_per_dim: usize,
    max_parts_per_dim: usize,
) -> impl Strategy<Value = (StructuredGrid, Vec<OwnedRange>)> {
    grid(max_nodes_per_dim)
        .prop_flat_map(move |grid| {
            let px = 1..=max_parts_per_dim.min(grid.mx());
            let py = 1..=max_parts_per_dim.min(grid.my());
            (Just(grid), px, py)
        })
        .prop_map(|(grid, px, py)| {
            let ranges = grid
                .partition(px, py)
                .expect("part counts never exceed node counts");
            (grid, ranges)
        })
}
