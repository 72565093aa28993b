use matrixcompare::{
    assert_matrix_eq, assert_scalar_eq, prop_assert_matrix_eq, prop_assert_scalar_eq,
};
use pfem::element::{
    evaluate_basis, gradients, interpolate, interpolate_gradient, shape, shape_gradient,
    QUAD4_NODE_SIGNS,
};
use pfem::nalgebra::{Point2, Vector2, Vector4};
use pfem::proptest::reference_point;
use proptest::prelude::*;

/// Values of `a + b xi + c eta + d xi eta` at the four local nodes.
fn bilinear_nodal_values(a: f64, b: f64, c: f64, d: f64) -> Vector4<f64> {
    Vector4::from_fn(|l, _| {
        let (xi, eta) = QUAD4_NODE_SIGNS[l];
        a + b * xi + c * eta + d * xi * eta
    })
}

#[test]
fn shape_gradients_match_finite_differences() {
    let xi = Point2::new(0.3, -0.7);
    let h = 1e-6;
    for l in 0..4 {
        let central =
            |dxi: Vector2<f64>| (shape(l, &(xi + dxi)) - shape(l, &(xi - dxi))) / (2.0 * h);
        let dx = central(Vector2::new(h, 0.0));
        let dy = central(Vector2::new(0.0, h));
        assert_matrix_eq!(shape_gradient(l, &xi), Vector2::new(dx, dy), comp = abs, tol = 1e-9);
    }
}

#[test]
fn basis_matrices_agree_with_individual_functions() {
    let xi = Point2::new(-0.2, 0.45);
    let phi = evaluate_basis(&xi);
    let phi_grad = gradients(&xi);
    for l in 0..4 {
        assert_eq!(phi[l], shape(l, &xi));
        assert_eq!(phi_grad.column(l).into_owned(), shape_gradient(l, &xi));
    }
}

#[test]
fn interpolation_at_nodes_returns_nodal_values() {
    let u = Vector4::new(1.0, -2.0, 3.5, 0.25);
    for (l, &(a, b)) in QUAD4_NODE_SIGNS.iter().enumerate() {
        assert_scalar_eq!(interpolate(&u, &Point2::new(a, b)), u[l], comp = abs, tol = 1e-15);
    }
}

proptest! {
    #[test]
    fn quad4_partition_of_unity(xi in reference_point()) {
        let phi_sum: f64 = evaluate_basis(&xi).sum();
        prop_assert_scalar_eq!(phi_sum, 1.0, comp = abs, tol = 1e-14);
        let grad_sum: Vector2<f64> = gradients(&xi).column_sum();
        prop_assert_matrix_eq!(grad_sum, Vector2::zeros(), comp = abs, tol = 1e-14);
    }

    #[test]
    fn quad4_reproduces_bilinear_functions(
        xi in reference_point(),
        (a, b, c, d) in (-5.0..5.0, -5.0..5.0, -5.0..5.0, -5.0..5.0)
    ) {
        let u = bilinear_nodal_values(a, b, c, d);
        let expected = a + b * xi.x + c * xi.y + d * xi.x * xi.y;
        let expected_gradient = Vector2::new(b + d * xi.y, c + d * xi.x);
        prop_assert_scalar_eq!(interpolate(&u, &xi), expected, comp = abs, tol = 1e-12);
        let gradient = interpolate_gradient(&u, &xi);
        prop_assert_matrix_eq!(gradient, expected_gradient, comp = abs, tol = 1e-12);
    }
}
