//! Multi-worker matrix-free application of a [`QubitOperator`].
//!
//! Terms contribute additively, so the operator is split into balanced term
//! groups, each group is compiled into its own [`LinearQubitOperator`], and the
//! groups are applied concurrently on a dedicated rayon pool. Partial results are
//! reduced by elementwise addition, which makes the result independent of the
//! order in which workers finish.

use super::linear::{LinearQubitOperator, resolve_n_qubits};
use crate::{
    error::{DavidsonError, DavidsonErrorKind},
    matrix::{LinearOperator, check_len},
    qubit_operator::QubitOperator,
};
use faer::c64;
use rayon::prelude::*;
use std::thread;

/// Default number of worker processes requested when none is configured.
pub const DEFAULT_PROCESSES: usize = 10;

/// Worker-count configuration for [`ParallelLinearQubitOperator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearQubitOperatorOptions {
    processes: usize,
}

impl LinearQubitOperatorOptions {
    /// Requests `processes` workers, clamped to the available hardware concurrency.
    ///
    /// Zero workers is rejected with [`DavidsonErrorKind::InvalidProcesses`].
    pub fn new(processes: usize) -> Result<Self, DavidsonError> {
        if processes == 0 {
            return Err(DavidsonErrorKind::InvalidProcesses(processes).into());
        }

        let available = available_cores();
        if processes > available {
            log::warn!(
                "Requested {processes} processes but only {available} cores are available; clamping."
            );
        }
        Ok(Self {
            processes: processes.min(available),
        })
    }

    /// Configured worker count, already clamped to the available cores.
    pub fn processes(&self) -> usize {
        self.processes
    }

    /// Number of workers to actually use for `num` independent jobs.
    pub fn get_processes(&self, num: usize) -> usize {
        num.min(self.processes).max(1)
    }
}

impl Default for LinearQubitOperatorOptions {
    fn default() -> Self {
        Self {
            processes: DEFAULT_PROCESSES.min(available_cores()),
        }
    }
}

fn available_cores() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// A [`LinearOperator`] implied by a [`QubitOperator`] whose terms are applied
/// by a pool of workers.
#[derive(Debug)]
pub struct ParallelLinearQubitOperator {
    operators: Vec<LinearQubitOperator>,
    n_qubits: usize,
    options: LinearQubitOperatorOptions,
    pool: rayon::ThreadPool,
}

impl ParallelLinearQubitOperator {
    /// Partitions `operator` into at most `options.processes()` groups and
    /// compiles one serial operator per group.
    pub fn new(
        operator: &QubitOperator,
        n_qubits: Option<usize>,
        options: LinearQubitOperatorOptions,
    ) -> Result<Self, DavidsonError> {
        let n_qubits = resolve_n_qubits(operator, n_qubits)?;
        let operators = operator
            .get_operator_groups(options.processes())
            .iter()
            .map(|group| LinearQubitOperator::new(group, Some(n_qubits)))
            .collect::<Result<Vec<_>, _>>()?;

        let num_threads = options.get_processes(operators.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("pauli-worker-{i}"))
            .build()
            .map_err(|e| DavidsonErrorKind::WorkerPool(e.to_string()))?;

        log::debug!(
            "Split {} terms into {} groups over {} workers.",
            operator.len(),
            operators.len(),
            num_threads
        );

        Ok(Self {
            operators,
            n_qubits,
            options,
            pool,
        })
    }

    pub fn n_qubits(&self) -> usize {
        self.n_qubits
    }

    pub fn options(&self) -> LinearQubitOperatorOptions {
        self.options
    }

    /// Number of term groups, one per worker job.
    pub fn num_groups(&self) -> usize {
        self.operators.len()
    }
}

impl LinearOperator for ParallelLinearQubitOperator {
    #[inline]
    fn dimension(&self) -> usize {
        1usize << self.n_qubits
    }

    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError> {
        check_len(self.dimension(), x)?;
        sum_on_pool(&self.pool, &self.operators, x)
    }
}

/// Applies every operator to `x` on `pool` and sums the images.
///
/// The first failing job fails the whole call; no partial sum is returned. With
/// no operators the result is the zero vector.
fn sum_on_pool<O: LinearOperator + Sync>(
    pool: &rayon::ThreadPool,
    operators: &[O],
    x: &[c64],
) -> Result<Vec<c64>, DavidsonError> {
    pool.install(|| {
        operators
            .par_iter()
            .map(|operator| operator.matvec(x))
            .try_reduce(
                || vec![c64::new(0.0, 0.0); x.len()],
                |mut acc, partial| {
                    for (a, p) in acc.iter_mut().zip(partial) {
                        *a += p;
                    }
                    Ok(acc)
                },
            )
    })
}
