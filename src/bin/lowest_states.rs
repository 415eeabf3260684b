//! Command-line driver: lowest eigenstates of a qubit operator read from a file.
//!
//! The operator file uses the term-per-line format of
//! [`qubit_davidson::utils::data_loader`]. The operator is compiled either
//! serially or, with `--processes`, over a worker pool; the Davidson solver is
//! then run and one CSV row per requested state is written to `--output` (or
//! standard output).

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use qubit_davidson::{
    Davidson, LinearQubitOperatorOptions, generate_linear_qubit_operator,
    get_linear_qubit_operator_diagonal,
    solvers::{DEFAULT_EPS, DEFAULT_MAX_ITERATIONS},
    utils::{data_loader::load_qubit_operator, perf::get_peak_rss_kb},
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::{io, path::PathBuf, time::Instant};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[clap(
    name = "lowest-states",
    about = "Finds the lowest eigenstates of a qubit operator with the Davidson method."
)]
struct Args {
    /// Path to the operator file (one `<re> [<im>] <pauli string>` term per line).
    #[clap(long, value_name = "PATH")]
    operator: PathBuf,
    /// Number of qubits; defaults to the highest qubit index in the operator plus one.
    #[clap(long)]
    n_qubits: Option<usize>,
    /// Number of lowest eigenstates to compute.
    #[clap(long, default_value_t = 1)]
    n_lowest: usize,
    /// Convergence tolerance on residual entries.
    #[clap(long, default_value_t = DEFAULT_EPS)]
    eps: f64,
    /// Maximum number of Davidson iterations.
    #[clap(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Number of worker threads; the serial operator is used when omitted.
    #[clap(long)]
    processes: Option<usize>,
    /// Seed for the random search directions; drawn from the OS when omitted.
    #[clap(long)]
    seed: Option<u64>,
    /// Path to the output CSV file; standard output when omitted.
    #[clap(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// One row of the output CSV, describing a single eigenstate.
#[derive(Debug, Serialize)]
struct StateResult {
    index: usize,
    eigenvalue: f64,
    converged: bool,
    iterations: usize,
    max_residual: f64,
    time_s: f64,
    rss_kb: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = Args::parse();

    let operator = load_qubit_operator(&args.operator)
        .with_context(|| format!("Failed to load operator from {:?}", args.operator))?;
    log::info!(
        "Loaded {} terms acting on {} qubits.",
        operator.len(),
        operator.count_qubits()
    );

    let options = args
        .processes
        .map(LinearQubitOperatorOptions::new)
        .transpose()?;
    let linear_operator = generate_linear_qubit_operator(&operator, args.n_qubits, options)?;
    let n_qubits = linear_operator.n_qubits();
    let diagonal = get_linear_qubit_operator_diagonal(&operator, Some(n_qubits))?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut solver = Davidson::with_rng(linear_operator, diagonal, args.eps, rng)?;

    log::info!(
        "Searching for {} states in a space of dimension 2^{}...",
        args.n_lowest,
        n_qubits
    );
    let start_time = Instant::now();
    let output = solver.get_lowest_n(args.n_lowest, None, args.max_iterations)?;
    let time_s = start_time.elapsed().as_secs_f64();
    let rss_kb = get_peak_rss_kb();

    if !output.converged {
        log::warn!(
            "Results are not converged (max residual {:.3e}); consider a larger --max-iterations.",
            output.max_residual
        );
    }

    let mut writer: csv::Writer<Box<dyn io::Write>> = match &args.output {
        Some(path) => csv::Writer::from_writer(Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file {path:?}"))?,
        )),
        None => csv::Writer::from_writer(Box::new(io::stdout())),
    };
    for (index, &eigenvalue) in output.eigenvalues.iter().enumerate() {
        writer.serialize(StateResult {
            index,
            eigenvalue,
            converged: output.converged,
            iterations: output.iterations,
            max_residual: output.max_residual,
            time_s,
            rss_kb,
        })?;
    }
    writer.flush()?;

    log::info!("Done in {time_s:.3} s.");
    Ok(())
}
