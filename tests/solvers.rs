use densolve::{
    error::LinAlgError,
    solvers::{
        gauss_jordan, GaussJordan, LinearSolver, LuDecomposition, LuOptions, QrDecomposition,
        SvDecomposition, ZeroPivot,
    },
    tensors::{matrix::Matrix, vector::Vector},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn worked_example() -> (Matrix, Vector) {
    let a = Matrix::from_nested_vec(vec![vec![2., 3., 4.], vec![3., 4., 5.], vec![1., -2., 2.]])
        .unwrap();
    (a, Vector::from(vec![20., 26., 3.]))
}

/// A random matrix that is diagonally dominant enough to be well-conditioned.
fn well_conditioned(n: usize, rng: &mut StdRng) -> Matrix {
    let mut a = Matrix::sample(n, n, rng, (-1., 1.));
    for i in 0..n {
        a[(i, i)] += n as f64;
    }
    a
}

fn random_vector(n: usize, rng: &mut StdRng) -> Vector {
    Vector::from((0..n).map(|_| rng.gen_range(-5.0..5.0)).collect::<Vec<_>>())
}

fn cofactor_determinant(a: &Matrix) -> f64 {
    let n = a.nrows();
    if n == 0 {
        return 1.;
    }

    let mut det = 0.;
    for col in 0..n {
        let mut minor = Matrix::new(n - 1, n - 1);
        for i in 1..n {
            for (jj, j) in (0..n).filter(|&j| j != col).enumerate() {
                minor[(i - 1, jj)] = a[(i, j)];
            }
        }
        let sign = if col % 2 == 0 { 1. } else { -1. };
        det += sign * a[(0, col)] * cofactor_determinant(&minor);
    }
    det
}

#[test]
fn worked_example_all_solvers() {
    let (a, b) = worked_example();
    let expected = Vector::from(vec![1., 2., 3.]);

    let mut solvers: Vec<Box<dyn LinearSolver>> = vec![
        Box::new(GaussJordan::with_matrix(&a).unwrap()),
        Box::new(LuDecomposition::with_matrix(&a).unwrap()),
        Box::new(QrDecomposition::with_matrix(&a).unwrap()),
        Box::new(SvDecomposition::with_matrix(&a).unwrap()),
    ];

    for s in &mut solvers {
        let x = s.solve_vector(&b).unwrap();
        assert!(x.approx_eq(&expected, 1e-12), "{}", x);

        let inv = s.inverse().unwrap();
        assert!((&a * &inv).approx_eq(&Matrix::identity(3), 1e-12));
    }
}

#[test]
fn random_systems() {
    let mut rng = StdRng::seed_from_u64(42);

    for n in 1..=6 {
        let a = well_conditioned(n, &mut rng);
        let x = random_vector(n, &mut rng);
        let b = a.mul_vector(&x).unwrap();

        let (gj, _) = gauss_jordan::solve(&a, &b.clone().into_matrix()).unwrap();
        assert!(gj.into_vector().unwrap().approx_eq(&x, 1e-10));

        let mut lu = LuDecomposition::with_matrix(&a).unwrap();
        assert!(lu.solve_vector(&b).unwrap().approx_eq(&x, 1e-10));

        let mut qr = QrDecomposition::with_matrix(&a).unwrap();
        assert!(qr.solve_vector(&b).unwrap().approx_eq(&x, 1e-10));

        let mut svd = SvDecomposition::with_matrix(&a).unwrap();
        assert!(svd.solve_vector(&b).unwrap().approx_eq(&x, 1e-10));
        assert_eq!(svd.rank().unwrap(), n);
    }
}

#[test]
fn determinants() {
    let mut rng = StdRng::seed_from_u64(3);

    for n in 1..=4 {
        let a = Matrix::sample(n, n, &mut rng, (-2., 2.));
        let expected = cofactor_determinant(&a);

        let mut lu = LuDecomposition::with_matrix(&a).unwrap();
        assert!((lu.determinant().unwrap() - expected).abs() < 1e-10);

        let (log, negative) = lu.log_determinant().unwrap();
        assert_eq!(negative, expected < 0.);
        assert!((log.exp() - expected.abs()).abs() < 1e-10);

        let qr = QrDecomposition::with_matrix(&a).unwrap();
        assert!((qr.determinant().unwrap() - expected).abs() < 1e-10);
    }

    let (a, _) = worked_example();
    let mut lu = LuDecomposition::with_matrix(&a).unwrap();
    assert!((lu.determinant().unwrap() + 7.).abs() < 1e-12);
}

#[test]
fn singular_detection() {
    let a = Matrix::from_nested_vec(vec![vec![1., 2., 4.], vec![1., 2., 4.], vec![4., 2., 8.]])
        .unwrap();
    let b = Matrix::new_column(vec![1., 1., 1.]);

    assert_eq!(
        gauss_jordan::solve(&a, &b).unwrap_err(),
        LinAlgError::SingularMatrix
    );

    let mut lu = LuDecomposition::with_options(LuOptions {
        zero_pivot: ZeroPivot::Fail,
    });
    lu.initialize(&a).unwrap();
    assert!(lu.solve(&b).unwrap_err().is_singular());

    assert!(QrDecomposition::with_matrix(&Matrix::new(3, 3))
        .unwrap_err()
        .is_singular());

    let svd = SvDecomposition::with_matrix(&a).unwrap();
    assert_eq!(svd.rank().unwrap(), 2);
    assert_eq!(svd.nullity().unwrap(), 1);
}

#[test]
fn svd_rectangular() {
    let mut rng = StdRng::seed_from_u64(11);

    for (m, n) in [(5, 3), (3, 5), (4, 4), (1, 3)] {
        let a = Matrix::sample(m, n, &mut rng, (-3., 3.));
        let svd = SvDecomposition::with_matrix(&a).unwrap();

        let u = svd.u().unwrap();
        let v = svd.v().unwrap();
        assert_eq!((u.nrows(), u.ncols()), (m, n));
        assert_eq!((v.nrows(), v.ncols()), (n, n));

        let w = Matrix::eye(svd.singular_values().unwrap());
        assert!((&(&u * &w) * &v.transpose()).approx_eq(&a, 1e-12));

        let mut s = svd.clone();
        let inv = s.inverse().unwrap();
        assert_eq!((inv.nrows(), inv.ncols()), (n, m));
        assert!((&(&a * &inv) * &a).approx_eq(&a, 1e-10));
        assert!((&(&inv * &a) * &inv).approx_eq(&inv, 1e-10));

        assert_eq!(svd.rank().unwrap(), m.min(n));
        assert_eq!(svd.range().unwrap().ncols(), m.min(n));
        assert_eq!(svd.null_space().unwrap().ncols(), n - m.min(n));
    }
}

#[test]
fn svd_outer_product_rank() {
    let u = Vector::from(vec![1., 2., 3.]);
    let v = Vector::from(vec![-1., 0.5, 2.]);
    let a = Matrix::outer(&u, &v);

    let svd = SvDecomposition::with_matrix(&a).unwrap();
    assert_eq!(svd.rank().unwrap(), 1);

    let null = svd.null_space().unwrap();
    assert_eq!(null.ncols(), 2);
    assert!((&a * &null).max_abs() < 1e-12);
}

#[test]
fn qr_update_matches_direct_decomposition() {
    let mut rng = StdRng::seed_from_u64(5);
    let n = 4;
    let a = well_conditioned(n, &mut rng);
    let s = random_vector(n, &mut rng);
    let t = random_vector(n, &mut rng) * 0.1;
    let b = random_vector(n, &mut rng);

    let mut updated = QrDecomposition::with_matrix(&a).unwrap();
    updated.update_matrix(&s, &t).unwrap();

    let a2 = &a + &Matrix::outer(&s, &t);
    let mut lu = LuDecomposition::with_matrix(&a2).unwrap();

    let x = updated.solve_vector(&b).unwrap();
    assert!(x.approx_eq(&lu.solve_vector(&b).unwrap(), 1e-10));
    assert!((updated.determinant().unwrap() - lu.determinant().unwrap()).abs() < 1e-9);

    let q = updated.q_transposed().unwrap().transpose();
    assert!((&q * &updated.r().unwrap()).approx_eq(&a2, 1e-12));
}

#[test]
fn lu_refinement() {
    let mut rng = StdRng::seed_from_u64(9);
    let a = well_conditioned(5, &mut rng);
    let x = random_vector(5, &mut rng).into_matrix();
    let b = &a * &x;

    let mut lu = LuDecomposition::with_matrix(&a).unwrap();
    let mut y = lu.solve(&b).unwrap();
    y[(0, 0)] += 1e-6;
    lu.refine_solution(&a, &b, &mut y).unwrap();
    assert!(y.approx_eq(&x, 1e-10));
}
