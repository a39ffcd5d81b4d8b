use densolve::{
    solvers::{LinearSolver, SvDecomposition},
    tensors::{matrix::Matrix, vector::Vector},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_env("DENSOLVE_LOG"))
        .init();

    // noisy samples of y = 0.5 - 1.5 t + 2 t^2
    let mut rng = StdRng::seed_from_u64(1);
    let ts: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
    let ys: Vec<f64> = ts
        .iter()
        .map(|t| 0.5 - 1.5 * t + 2. * t * t + rng.gen_range(-0.05..0.05))
        .collect();

    let design = Matrix::from_nested_vec(ts.iter().map(|t| vec![1., *t, t * t]).collect()).unwrap();

    let mut svd = SvDecomposition::with_matrix(&design).unwrap();
    let c = svd.solve_vector(&Vector::from(ys)).unwrap();
    println!("fit: y = {:.3} + {:.3} t + {:.3} t^2", c[0], c[1], c[2]);
    println!(
        "rank = {}, 1/cond = {:e}",
        svd.rank().unwrap(),
        svd.inverse_condition().unwrap()
    );

    // a column that duplicates another makes the system rank deficient
    let degenerate =
        Matrix::from_nested_vec(ts.iter().map(|t| vec![1., *t, 2. * t]).collect()).unwrap();
    let svd = SvDecomposition::with_matrix(&degenerate).unwrap();
    println!(
        "degenerate: rank = {}, null space = {}",
        svd.rank().unwrap(),
        svd.null_space().unwrap()
    );
}
