use matrixcompare::assert_scalar_eq;
use pfem::grid::StructuredGrid;
use pfem::nalgebra::Vector2;
use pfem::operator::RegularizedPowerLaw;

#[test]
fn reference_gradients_are_scaled_to_physical_element() {
    // hx = 1/2 and hy = 1/4 give cx = 16 and cy = 64
    let operator = RegularizedPowerLaw::new(0.5, 0.25, 1.0);
    let du = Vector2::new(0.5, 0.25);
    assert_scalar_eq!(operator.squared_gradient_norm(&du), 8.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(
        operator.grad_inner_product(&du, &Vector2::new(1.0, -1.0)),
        8.0 - 16.0,
        comp = abs,
        tol = 1e-14
    );

    assert_scalar_eq!(operator.grad_pow(&du, 2.0), 9.0, comp = abs, tol = 1e-13);
    assert_scalar_eq!(operator.grad_pow(&du, 1.0), 3.0, comp = abs, tol = 1e-13);
    assert_scalar_eq!(operator.grad_pow(&du, 0.0), 1.0, comp = abs, tol = 1e-13);
    assert_scalar_eq!(operator.grad_pow(&du, -2.0), 1.0 / 9.0, comp = abs, tol = 1e-13);
}

#[test]
fn regularization_keeps_zero_gradient_finite() {
    let grid = StructuredGrid::dirichlet(7, 7).unwrap();
    let operator = RegularizedPowerLaw::for_grid(&grid, 0.5);
    let value = operator.grad_pow(&Vector2::zeros(), -1.5);
    assert_scalar_eq!(value, 0.25f64.powf(-0.75), comp = abs, tol = 1e-13);
}

#[test]
fn zero_gradient_without_regularization_is_not_finite_for_negative_powers() {
    let grid = StructuredGrid::dirichlet(7, 7).unwrap();
    let operator = RegularizedPowerLaw::for_grid(&grid, 0.0);
    assert!(!operator.grad_pow(&Vector2::<f64>::zeros(), -0.5).is_finite());
    assert_eq!(operator.grad_pow(&Vector2::<f64>::zeros(), 1.0), 0.0);
}
