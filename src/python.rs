use numpy::{PyArray1, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::ensemble::{EnsembleOptions, run_rng, simulate_ensemble};
use crate::error::CrnError;
use crate::network::{BuildOptions, ReactionNetwork, build_network_with};
use crate::ssa::{RecordMode, SimulationOptions, Termination, simulate_with};

impl From<CrnError> for PyErr {
    fn from(err: CrnError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn termination_label(reason: Termination) -> &'static str {
    match reason {
        Termination::TimeExceeded => "time_exceeded",
        Termination::Blocked => "blocked",
        Termination::EventLimit => "event_limit",
    }
}

fn build(text: &str, strict: bool) -> Result<ReactionNetwork, CrnError> {
    let options = if strict {
        BuildOptions::strict()
    } else {
        BuildOptions::default()
    };
    build_network_with(text, &options)
}

fn matrix<'py>(py: Python<'py>, rows: &[Vec<f64>]) -> PyResult<Bound<'py, PyArray2<f64>>> {
    PyArray2::from_vec2(py, rows).map_err(|e| PyValueError::new_err(e.to_string()))
}

type TrajectoryTuple<'py> = (
    Vec<String>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray2<f64>>,
    &'static str,
);

/// Builds the network in `text` and runs one trajectory.
///
/// Returns `(species, times, concentrations, termination)` where
/// `concentrations` has one row per sample and one column per species.
#[pyfunction(signature = (text, seed=None, strict=false, max_events=None))]
pub fn simulate_text<'py>(
    py: Python<'py>,
    text: &str,
    seed: Option<u64>,
    strict: bool,
    max_events: Option<u64>,
) -> PyResult<TrajectoryTuple<'py>> {
    let network = build(text, strict)?;
    let options = SimulationOptions {
        max_events,
        ..SimulationOptions::default()
    };
    let result = py.detach(|| {
        let mut rng = run_rng(seed, 0);
        simulate_with(&network, &mut rng, &options)
    });
    let times = PyArray1::from_slice(py, result.trajectory.times());
    let states = matrix(py, result.trajectory.states())?;
    Ok((
        network.species().to_vec(),
        times,
        states,
        termination_label(result.termination),
    ))
}

/// Runs `runs` trajectories and returns only their end points.
///
/// Returns `(species, end_times, end_states, terminations)`.
#[pyfunction(signature = (text, runs, seed=None, threads=None, strict=false, max_events=None))]
pub fn simulate_ensemble_text<'py>(
    py: Python<'py>,
    text: &str,
    runs: usize,
    seed: Option<u64>,
    threads: Option<usize>,
    strict: bool,
    max_events: Option<u64>,
) -> PyResult<(
    Vec<String>,
    Bound<'py, PyArray1<f64>>,
    Bound<'py, PyArray2<f64>>,
    Vec<&'static str>,
)> {
    let network = build(text, strict)?;
    let options = EnsembleOptions {
        runs,
        seed,
        threads,
        simulation: SimulationOptions {
            record: RecordMode::FinalOnly,
            max_events,
        },
    };
    let results = py.detach(|| simulate_ensemble(&network, &options))?;
    let end_times: Vec<f64> = results.iter().map(|r| r.time).collect();
    let end_states: Vec<Vec<f64>> = results.iter().map(|r| r.final_state.clone()).collect();
    let reasons = results
        .iter()
        .map(|r| termination_label(r.termination))
        .collect();
    Ok((
        network.species().to_vec(),
        PyArray1::from_vec(py, end_times),
        matrix(py, &end_states)?,
        reasons,
    ))
}

#[pymodule]
fn crnsim(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(simulate_text, module)?)?;
    module.add_function(wrap_pyfunction!(simulate_ensemble_text, module)?)?;
    Ok(())
}
