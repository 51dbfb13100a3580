use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::error::CrnError;
use crate::network::ReactionNetwork;
use crate::ssa::{SimulationOptions, SimulationResult, simulate_with};

const DEFAULT_SEED: u64 = 0xDEADBEEFCAFEBABE;

#[derive(Clone, Debug)]
pub struct EnsembleOptions {
    pub runs: usize,
    /// Base seed; run `i` draws from ChaCha stream `i` of this seed.
    pub seed: Option<u64>,
    /// Worker threads; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub simulation: SimulationOptions,
}

impl Default for EnsembleOptions {
    fn default() -> Self {
        Self {
            runs: 1,
            seed: None,
            threads: None,
            simulation: SimulationOptions::default(),
        }
    }
}

/// Runs independent trajectories over one shared network.
///
/// Results come back in run order and depend only on the seed, not on the
/// thread count.
pub fn simulate_ensemble(
    network: &ReactionNetwork,
    options: &EnsembleOptions,
) -> Result<Vec<SimulationResult>, CrnError> {
    if options.runs == 0 {
        return Err(CrnError::InvalidArgument(
            "number of runs must be greater than zero".into(),
        ));
    }
    if options.threads == Some(0) {
        return Err(CrnError::InvalidArgument(
            "thread count must be greater than zero".into(),
        ));
    }

    let simulate = || -> Vec<SimulationResult> {
        (0..options.runs)
            .into_par_iter()
            .map(|run| {
                let mut rng = run_rng(options.seed, run as u64);
                simulate_with(network, &mut rng, &options.simulation)
            })
            .collect()
    };

    let results = match options.threads {
        Some(n) => ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| CrnError::ThreadPool(e.to_string()))?
            .install(simulate),
        None => simulate(),
    };
    log::debug!("ensemble of {} runs finished", results.len());
    Ok(results)
}

/// Generator for run `run` of an ensemble seeded with `seed`.
///
/// Every run shares the seed's key and gets its own ChaCha stream, so runs
/// are independent and any single run can be replayed on its own.
pub fn run_rng(seed: Option<u64>, run: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.unwrap_or(DEFAULT_SEED));
    rng.set_stream(run);
    rng
}
