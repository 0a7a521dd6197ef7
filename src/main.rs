//! Command-line driver for the movement-primitive pipeline.
//!
//! Learns a model from training CSVs, writes the generated mean and
//! deviation band, infers the test trajectory's speed, and conditions the
//! model on the observed prefix. Exit codes distinguish input (2),
//! numerical (3), and configuration (4) failures.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use promp::{
    io, ErrorKind, ModelConfig, ProMP, Result, SpeedSearch, TrajectoryGroup, ViaPoint,
};

/// Learn a movement primitive from demonstrations, then re-time and reshape
/// it to follow a partially observed test trajectory.
#[derive(Parser, Debug)]
#[command(name = "promp", version, about)]
struct Args {
    /// Leading timesteps of the test trajectory to treat as observed
    test_steps: usize,

    /// DOF column to analyze
    dof_index: usize,

    /// Test trajectory CSV
    test_trajectory: PathBuf,

    /// Training trajectory CSVs, one demonstration per file
    #[arg(required = true)]
    training: Vec<PathBuf>,

    /// Number of radial basis functions
    #[arg(long, default_value_t = 20)]
    n_rbf: usize,

    /// Directory receiving the output CSVs
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Smallest speed factor candidate
    #[arg(long, default_value_t = 0.75)]
    alpha_min: f64,

    /// Largest speed factor candidate
    #[arg(long, default_value_t = 1.25)]
    alpha_max: f64,

    /// Number of speed factor candidates
    #[arg(long, default_value_t = 2000)]
    alpha_steps: usize,

    /// Standard deviation of the via-point observation noise
    #[arg(long, default_value_t = 1e-2)]
    via_std: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            match err.kind() {
                ErrorKind::Input => ExitCode::from(2),
                ErrorKind::Numerical => ExitCode::from(3),
                ErrorKind::Config => ExitCode::from(4),
            }
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let dofs = [args.dof_index];
    let test = io::read_trajectory(&args.test_trajectory, 1.0)?
        .truncated(args.test_steps)?
        .sub_trajectory(&dofs)?;

    let mut group = TrajectoryGroup::new();
    group.load_csv(&args.training, &dofs)?;
    let normalized_len = group.normalize_length()?;
    info!(
        demonstrations = group.len(),
        normalized_len, "loaded demonstrations"
    );

    let config = ModelConfig::new().with_n_rbf(args.n_rbf);
    let mut model = ProMP::new(&group, &config)?;
    let mean = model.generate_trajectory()?;
    let band = model.std_dev()?;

    std::fs::create_dir_all(&args.out_dir)?;
    io::write_trajectory(&args.out_dir.join("generated.csv"), &mean)?;
    io::write_matrix(&args.out_dir.join("variance.csv"), &band)?;
    for (i, demo) in group.trajectories().iter().enumerate() {
        io::write_trajectory(&args.out_dir.join(format!("traj_{i}.csv")), demo)?;
    }

    let search = SpeedSearch::new(args.alpha_min, args.alpha_max, args.alpha_steps);
    let alpha = test.infer_speed(&mean, &search)?;
    info!(alpha, "inferred test trajectory speed");

    let modulated_len = ((test.timesteps() as f64 / alpha).round() as usize).max(2);
    let modulated = test.modulate(modulated_len)?;
    io::write_trajectory(&args.out_dir.join("modulated.csv"), &modulated)?;

    let variance = args.via_std * args.via_std;
    let via_points: Vec<ViaPoint> = (0..modulated.timesteps())
        .map(|t| ViaPoint::with_uniform_noise(t, modulated.row(t), variance))
        .collect();
    model.condition_via_points(&via_points)?;
    info!(
        via_points = via_points.len(),
        "conditioned on observed prefix"
    );

    let conditioned = model.generate_trajectory_with_speed(1.0 / alpha)?;
    io::write_trajectory(&args.out_dir.join("conditioned.csv"), &conditioned)?;
    info!(out_dir = %args.out_dir.display(), "wrote output files");
    Ok(())
}
