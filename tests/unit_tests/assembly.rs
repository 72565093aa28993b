use matrixcompare::assert_scalar_eq;
use pfem::assembly::{Assembler, AssemblerBuilder, ElementSelection};
use pfem::comm::SerialCommunicator;
use pfem::field::LocalField;
use pfem::grid::{OwnedRange, StructuredGrid};
use pfem::nalgebra::Point2;
use pfem::problem::Problem;
use pfem::{Error, Formulation, ProblemParameters};

/// The 3 x 3 interior-node scenario: h = 1/4, p = 2, eps = 0, u = f = 1.
fn constant_helmholtz() -> ProblemParameters<f64> {
    ProblemParameters::p_helmholtz().with_problem(Problem::Constant)
}

fn serial_assembler<'a>(
    grid: &'a StructuredGrid,
    parameters: ProblemParameters<f64>,
) -> Assembler<'a, f64, SerialCommunicator> {
    AssemblerBuilder::new()
        .with_grid(grid)
        .with_parameters(parameters)
        .with_communicator(&SerialCommunicator)
        .build()
        .unwrap()
}

/// A smooth, non-symmetric field so that no contribution cancels by accident.
fn wavy_field(grid: &StructuredGrid, range: OwnedRange, ghost_width: usize) -> LocalField<f64> {
    LocalField::from_coordinates(grid, range, ghost_width, |x: &Point2<f64>| {
        1.0 + 0.3 * (3.0 * x.x).sin() * (2.0 * x.y + 0.5).cos() + 0.1 * x.x * x.y
    })
}

#[test]
fn residual_matches_hand_computed_stencil_for_zero_interior() {
    let grid = StructuredGrid::dirichlet(3, 3).unwrap();
    let assembler = serial_assembler(&grid, constant_helmholtz());
    let u = LocalField::zeros(grid.full_range(), 1);
    let r = assembler.assemble_residual(&u).unwrap();

    // Stiffness stencil 8/3 and -1/3, mass stencil h²/36 (16, 4, 1) with h² = 1/16
    let corner = -985.0 / 576.0;
    let edge = -606.0 / 576.0;
    let center = -36.0 / 576.0;
    let expected = [[corner, edge, corner], [edge, center, edge], [corner, edge, corner]];
    for j in 0..3 {
        for i in 0..3 {
            assert_scalar_eq!(r[(i, j)], expected[j as usize][i as usize], comp = abs, tol = 1e-12);
        }
    }
}

#[test]
fn objective_matches_hand_computed_value_for_zero_interior() {
    let grid = StructuredGrid::dirichlet(3, 3).unwrap();
    let assembler = serial_assembler(&grid, constant_helmholtz());
    let u = LocalField::zeros(grid.full_range(), 1);
    // ½ a(u, u) + ½ (u, u) - (1, u) = 16/3 + 23/144 - 7/16
    let objective = assembler.assemble_objective(&u).unwrap();
    assert_scalar_eq!(objective, 91.0 / 18.0, comp = abs, tol = 1e-12);
}

#[test]
fn exact_constant_solution_has_zero_residual() {
    let grid = StructuredGrid::dirichlet(3, 3).unwrap();
    for formulation in [Formulation::PHelmholtz, Formulation::PLaplacian] {
        let parameters = constant_helmholtz().with_formulation(formulation);
        let assembler = serial_assembler(&grid, parameters);
        let u = LocalField::from_element(grid.full_range(), 1, 1.0);
        let r = assembler.assemble_residual(&u).unwrap();
        assert!(r.owned_max_abs() < 1e-12);

        // ½ |Ω| - |Ω| for p-Helmholtz, -|Ω| f with f = 0 for the p-Laplacian
        let expected = if formulation.has_reaction_term() { -0.5 } else { 0.0 };
        let objective = assembler.assemble_objective(&u).unwrap();
        assert_scalar_eq!(objective, expected, comp = abs, tol = 1e-12);
    }
}

#[test]
fn residual_assembly_is_idempotent() {
    let grid = StructuredGrid::neumann(6, 5).unwrap();
    let parameters = ProblemParameters::p_helmholtz().with_exponent(3.0).with_regularization(0.1);
    let assembler = serial_assembler(&grid, parameters);
    let u = wavy_field(&grid, grid.full_range(), 1);
    let first = assembler.assemble_residual(&u).unwrap();
    let second = assembler.assemble_residual(&u).unwrap();
    assert_eq!(first, second);

    let mut output = LocalField::from_element(grid.full_range(), 1, f64::NAN);
    assembler.assemble_residual_into(&u, &mut output).unwrap();
    assembler.assemble_residual_into(&u, &mut output).unwrap();
    let owned: Vec<f64> = output.owned_values().copied().collect();
    let expected: Vec<f64> = first.owned_values().copied().collect();
    assert_eq!(owned, expected);
    // Ghost values of the output are left alone
    assert!(output[(-1, -1)].is_nan());
}

/// The residual is the gradient of the objective, for any exponent and both boundary treatments.
#[test]
fn residual_is_gradient_of_objective() {
    let helmholtz = ProblemParameters::p_helmholtz();
    let laplacian = ProblemParameters::p_laplacian();
    let cases = [
        (
            StructuredGrid::dirichlet(4, 3).unwrap(),
            helmholtz.with_exponent(3.0).with_regularization(0.1),
        ),
        (StructuredGrid::dirichlet(3, 4).unwrap(), laplacian.with_regularization(0.05)),
        (
            StructuredGrid::neumann(4, 4).unwrap(),
            helmholtz.with_exponent(1.5).with_regularization(0.5),
        ),
        (StructuredGrid::neumann(3, 5).unwrap(), laplacian.with_quadrature_degree(3)),
    ];
    for (grid, parameters) in cases {
        let assembler = serial_assembler(&grid, parameters);
        let solution = assembler.solution();
        let u = LocalField::from_coordinates(&grid, grid.full_range(), 1, |x: &Point2<f64>| {
            solution.u_exact(x) + 0.05 * (3.0 * x.x).sin() * (2.0 * x.y + 0.5).cos()
        });
        let r = assembler.assemble_residual(&u).unwrap();

        let h = 1e-5;
        for (i, j) in grid.full_range().nodes() {
            let node = (i as isize, j as isize);
            let mut u_plus = u.clone();
            u_plus[node] += h;
            let mut u_minus = u.clone();
            u_minus[node] -= h;
            let plus = assembler.assemble_objective(&u_plus).unwrap();
            let minus = assembler.assemble_objective(&u_minus).unwrap();
            let derivative = (plus - minus) / (2.0 * h);
            let tol = 1e-6 * (1.0 + derivative.abs());
            assert_scalar_eq!(r[node], derivative, comp = abs, tol = tol);
        }
    }
}

#[test]
fn parallel_objective_agrees_with_sequential_objective() {
    let grid = StructuredGrid::dirichlet(20, 17).unwrap();
    let parameters = ProblemParameters::p_laplacian().with_regularization(0.01);
    let assembler = serial_assembler(&grid, parameters);
    let u = wavy_field(&grid, grid.full_range(), 1);
    let sequential = assembler.assemble_objective(&u).unwrap();
    let parallel = assembler.assemble_objective_par(&u).unwrap();
    assert_scalar_eq!(sequential, parallel, comp = abs, tol = 1e-12 * sequential.abs());
}

#[test]
fn owned_and_touching_elements() {
    let grid = StructuredGrid::dirichlet(4, 4).unwrap();
    let assembler = AssemblerBuilder::new()
        .with_grid(&grid)
        .with_owned_range(OwnedRange::new(0, 2, 0, 2))
        .with_parameters(ProblemParameters::<f64>::p_helmholtz())
        .with_communicator(&SerialCommunicator)
        .build()
        .unwrap();
    let owned: Vec<_> = assembler.elements(ElementSelection::Owned).collect();
    assert_eq!(owned, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    let touching: Vec<_> = assembler.elements(ElementSelection::Touching).collect();
    assert_eq!(touching.len(), 9);
    assert_eq!(touching.last(), Some(&(2, 2)));
}

#[test]
fn dirichlet_corners_are_injected_from_exact_solution() {
    let grid = StructuredGrid::dirichlet(3, 3).unwrap();
    let assembler = serial_assembler(&grid, ProblemParameters::p_helmholtz());
    let u = LocalField::from_element(grid.full_range(), 1, 0.5);
    let values = assembler.element_values(&u, 0, 0);
    // Only the top-right corner (0, 0) is an unknown
    assert_eq!(values.u[0], 0.5);
    for l in 1..4 {
        let (i, j) = values.corner(l);
        let x = grid.node_coordinates(i, j);
        assert_eq!(values.u[l], assembler.solution().u_exact(&x));
    }
    assert_eq!(values.f[2], assembler.solution().forcing(&grid.node_coordinates(-1, -1)));
}

#[test]
fn invalid_configuration_is_reported_before_assembly() {
    let grid = StructuredGrid::dirichlet(3, 3).unwrap();
    let build = |parameters: ProblemParameters<f64>| {
        AssemblerBuilder::new()
            .with_grid(&grid)
            .with_parameters(parameters)
            .with_communicator(&SerialCommunicator)
            .build()
    };
    assert!(matches!(
        build(ProblemParameters::p_helmholtz().with_quadrature_degree(4)),
        Err(Error::InvalidConfiguration { parameter: "quadrature_degree", .. })
    ));
    assert!(matches!(
        build(ProblemParameters::p_helmholtz().with_exponent(0.9)),
        Err(Error::InvalidConfiguration { parameter: "p", .. })
    ));

    let out_of_grid = AssemblerBuilder::new()
        .with_grid(&grid)
        .with_owned_range(OwnedRange::new(2, 2, 0, 3))
        .with_parameters(ProblemParameters::<f64>::p_helmholtz())
        .with_communicator(&SerialCommunicator)
        .build();
    assert!(matches!(
        out_of_grid,
        Err(Error::InvalidConfiguration { parameter: "owned range", .. })
    ));
}

#[test]
fn fields_without_required_ghosts_are_rejected() {
    let grid = StructuredGrid::dirichlet(6, 6).unwrap();
    let range = OwnedRange::new(3, 3, 3, 3);
    let assembler = AssemblerBuilder::new()
        .with_grid(&grid)
        .with_owned_range(range)
        .with_parameters(ProblemParameters::<f64>::p_helmholtz())
        .with_communicator(&SerialCommunicator)
        .build()
        .unwrap();

    let no_ghosts = LocalField::zeros(range, 0);
    assert!(assembler.assemble_objective(&no_ghosts).is_err());
    assert!(assembler.assemble_residual(&no_ghosts).is_err());

    let ghosted = LocalField::zeros(range, 1);
    assert!(assembler.assemble_residual(&ghosted).is_ok());
    let mut too_small_output = LocalField::zeros(OwnedRange::new(3, 2, 3, 3), 0);
    assert!(assembler.assemble_residual_into(&ghosted, &mut too_small_output).is_err());
}
