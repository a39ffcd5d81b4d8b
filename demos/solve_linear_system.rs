use densolve::{
    printer::{MatrixPrinter, PrintOptions},
    solvers::{gauss_jordan, LinearSolver, LuDecomposition, QrDecomposition},
    tensors::{matrix::Matrix, vector::Vector},
};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt, EnvFilter};

fn main() {
    // set DENSOLVE_LOG=debug to trace the decompositions
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("DENSOLVE_LOG"))
        .init();

    let a = Matrix::from_nested_vec(vec![vec![2., 3., 4.], vec![3., 4., 5.], vec![1., -2., 2.]])
        .unwrap();
    let b = Vector::from(vec![20., 26., 3.]);

    let (x, inv) = gauss_jordan::solve(&a, &b.clone().into_matrix()).unwrap();
    println!("Gauss-Jordan: x = {}", x.into_vector().unwrap());
    println!(
        "inverse:\n{}",
        MatrixPrinter::new_with_options(&inv, PrintOptions::rows().with_precision(4))
    );

    let mut lu = LuDecomposition::with_matrix(&a).unwrap();
    println!("LU: x = {}", lu.solve_vector(&b).unwrap());
    println!("det = {}", lu.determinant().unwrap());

    let mut qr = QrDecomposition::with_matrix(&a).unwrap();
    println!("QR: x = {}", qr.solve_vector(&b).unwrap());

    // change the last row of A to [1, -2, 3] without decomposing again
    qr.update_matrix(&Vector::from(vec![0., 0., 1.]), &Vector::from(vec![0., 0., 1.]))
        .unwrap();
    println!("QR after update: x = {}", qr.solve_vector(&b).unwrap());
}
