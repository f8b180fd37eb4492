//! Execution strategy for per-node work.
//!
//! Every node of a grid is computed independently, so the work is a pure map
//! over the node index range. Indexed rayon collection keeps results in node
//! order, which makes sequential and parallel runs bit-identical.

use rayon::prelude::*;

use crate::error::{PorosityError, PorosityResult};

/// How per-node work is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Plain loop on the calling thread.
    Sequential,
    /// Data-parallel over rayon.
    ///
    /// `threads == 0` uses the current rayon pool (the global one unless
    /// called from [`Execution::install`]); any other value runs the work
    /// inside a dedicated pool of exactly that many workers.
    Parallel {
        /// Worker count, `0` for the rayon default.
        threads: usize,
    },
}

impl Default for Execution {
    fn default() -> Self {
        Self::Parallel { threads: 0 }
    }
}

impl Execution {
    /// Strategy for a user-facing thread count.
    ///
    /// `0` selects the rayon default, `1` runs sequentially, anything else a
    /// dedicated pool.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_porosity::Execution;
    ///
    /// assert_eq!(Execution::from_thread_count(1), Execution::Sequential);
    /// assert_eq!(Execution::from_thread_count(0), Execution::Parallel { threads: 0 });
    /// ```
    #[must_use]
    pub const fn from_thread_count(threads: usize) -> Self {
        match threads {
            1 => Self::Sequential,
            n => Self::Parallel { threads: n },
        }
    }

    /// Number of workers the strategy will use.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        match *self {
            Self::Sequential => 1,
            Self::Parallel { threads: 0 } => rayon::current_num_threads(),
            Self::Parallel { threads } => threads,
        }
    }

    /// Run `job` with the worker pool built once up front.
    ///
    /// A dedicated pool is built only for `Parallel { threads: n }` with
    /// `n > 0`; `job` then runs inside it and receives
    /// `Parallel { threads: 0 }`, so every `map_*` call in `job` shares that
    /// pool. Other strategies are passed through unchanged.
    ///
    /// # Errors
    ///
    /// [`PorosityError::ThreadPool`] if the dedicated pool cannot be built.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_porosity::Execution;
    ///
    /// let sums = Execution::Parallel { threads: 2 }.install(|execution| {
    ///     let a = execution.map_values(&[1.0, 2.0], |v| v + 1.0)?;
    ///     let b = execution.map_values(&a, |v| v * 2.0)?;
    ///     Ok::<_, mesh_porosity::PorosityError>((execution.worker_count(), b))
    /// })??;
    /// assert_eq!(sums, (2, vec![4.0, 6.0]));
    /// # Ok::<(), mesh_porosity::PorosityError>(())
    /// ```
    pub fn install<R, F>(&self, job: F) -> PorosityResult<R>
    where
        R: Send,
        F: FnOnce(Self) -> R + Send,
    {
        match *self {
            Self::Parallel { threads } if threads > 0 => {
                let pool = build_pool(threads)?;
                Ok(pool.install(|| job(Self::Parallel { threads: 0 })))
            }
            other => Ok(job(other)),
        }
    }

    /// Evaluate `f` for every node index in `0..count`, in node order.
    ///
    /// Stops at a failing node. Under parallel execution, which of several
    /// failing nodes is reported is not specified.
    ///
    /// # Errors
    ///
    /// The first error `f` returns, or [`PorosityError::ThreadPool`] if a
    /// dedicated pool cannot be built.
    pub fn map_nodes<F>(&self, count: usize, f: F) -> PorosityResult<Vec<f64>>
    where
        F: Fn(usize) -> PorosityResult<f64> + Sync + Send,
    {
        match *self {
            Self::Sequential => (0..count).map(f).collect(),
            Self::Parallel { threads } => {
                in_pool(threads, || (0..count).into_par_iter().map(f).collect())?
            }
        }
    }

    /// Apply `f` to every value of `input`, in order.
    ///
    /// # Errors
    ///
    /// [`PorosityError::ThreadPool`] if a dedicated pool cannot be built.
    pub fn map_values<F>(&self, input: &[f64], f: F) -> PorosityResult<Vec<f64>>
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        match *self {
            Self::Sequential => Ok(input.iter().map(|&v| f(v)).collect()),
            Self::Parallel { threads } => {
                in_pool(threads, || input.par_iter().map(|&v| f(v)).collect())
            }
        }
    }
}

fn in_pool<R, F>(threads: usize, job: F) -> PorosityResult<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if threads == 0 {
        return Ok(job());
    }
    Ok(build_pool(threads)?.install(job))
}

fn build_pool(threads: usize) -> PorosityResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(PorosityError::ThreadPool)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    const STRATEGIES: [Execution; 4] = [
        Execution::Sequential,
        Execution::Parallel { threads: 0 },
        Execution::Parallel { threads: 1 },
        Execution::Parallel { threads: 3 },
    ];

    #[test]
    fn thread_count_mapping() {
        assert_eq!(Execution::from_thread_count(0), Execution::Parallel { threads: 0 });
        assert_eq!(Execution::from_thread_count(1), Execution::Sequential);
        assert_eq!(Execution::from_thread_count(8), Execution::Parallel { threads: 8 });
        assert_eq!(Execution::default(), Execution::Parallel { threads: 0 });
    }

    #[test]
    fn worker_count() {
        assert_eq!(Execution::Sequential.worker_count(), 1);
        assert_eq!(Execution::Parallel { threads: 5 }.worker_count(), 5);
        assert!(Execution::Parallel { threads: 0 }.worker_count() >= 1);
    }

    #[test]
    fn map_nodes_preserves_order() {
        for exec in STRATEGIES {
            let values = exec.map_nodes(1000, |n| Ok((n as f64).sqrt())).unwrap();
            assert_eq!(values.len(), 1000);
            for (n, v) in values.iter().enumerate() {
                assert_eq!(*v, (n as f64).sqrt());
            }
        }
    }

    #[test]
    fn map_nodes_propagates_failure() {
        for exec in STRATEGIES {
            let result = exec.map_nodes(100, |n| {
                if n == 42 {
                    Err(PorosityError::DuplicateField(n.to_string()))
                } else {
                    Ok(0.0)
                }
            });
            assert!(matches!(result, Err(PorosityError::DuplicateField(ref s)) if s == "42"));
        }
    }

    #[test]
    fn install_shares_one_dedicated_pool() {
        let (inner, pool_index, workers) = Execution::Parallel { threads: 3 }
            .install(|execution| {
                (execution, rayon::current_thread_index(), execution.worker_count())
            })
            .unwrap();
        assert_eq!(inner, Execution::Parallel { threads: 0 });
        assert!(pool_index.is_some());
        assert_eq!(workers, 3);
    }

    #[test]
    fn install_passes_other_strategies_through() {
        for exec in [Execution::Sequential, Execution::Parallel { threads: 0 }] {
            assert_eq!(exec.install(|inner| inner).unwrap(), exec);
        }
    }

    #[test]
    fn map_values_handles_empty_input() {
        for exec in STRATEGIES {
            assert!(exec.map_values(&[], |v| v).unwrap().is_empty());
        }
    }
}
