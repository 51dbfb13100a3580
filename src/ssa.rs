//! Gillespie stochastic simulation, direct method.
//!
//! Each accepted event draws `r2` in `[0, 1)` to pick the reaction and
//! `r1` in `(0, 1]` for the waiting time `tau = ln(1 / r1) / a0`. The run stops
//! at the top of a step once `t >= final_time`, when every reaction lacks
//! reactants, or when the total propensity is zero (which includes networks
//! whose only reactions have no reactant entry). The event that carries
//! `t` past `final_time` is still applied and recorded.

use rand::Rng;

use crate::network::{Reactant, ReactionNetwork};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    TimeExceeded,
    Blocked,
    /// The configured `max_events` budget was used up.
    EventLimit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordMode {
    /// One sample per accepted event.
    #[default]
    Events,
    /// Initial sample plus the final one.
    FinalOnly,
}

#[derive(Clone, Debug, Default)]
pub struct SimulationOptions {
    pub record: RecordMode,
    pub max_events: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    pub time: f64,
    pub concentrations: Vec<f64>,
}

/// Append-only sequence of `(time, concentrations)` samples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
}

impl Trajectory {
    fn starting_at(state: &SimulationState) -> Self {
        let mut trajectory = Self::default();
        trajectory.record(state);
        trajectory
    }

    fn record(&mut self, state: &SimulationState) {
        self.times.push(state.time);
        self.states.push(state.concentrations.clone());
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Concentration snapshots, aligned with the network's species order.
    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    pub fn samples(&self) -> impl Iterator<Item = (f64, &[f64])> {
        self.times
            .iter()
            .zip(&self.states)
            .map(|(&t, state)| (t, state.as_slice()))
    }

    pub fn last(&self) -> Option<(f64, &[f64])> {
        self.samples().last()
    }
}

#[derive(Clone, Debug)]
pub struct SimulationResult {
    pub trajectory: Trajectory,
    pub termination: Termination,
    pub time: f64,
    pub final_state: Vec<f64>,
    pub events: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    Fired { reaction: usize, time: f64 },
    Terminated(Termination),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EngineState {
    Running,
    Terminated(Termination),
}

/// Computes every reaction's propensity into `propensities` and returns their sum.
///
/// `a[i] = rate[i] * product of concentration[j] over species with usage[i][j] > 0`;
/// stoichiometric coefficients gate participation only. A reaction with no
/// reactant entry (e.g. `A -> 2 A` after product overwrite) has `a[i] = 0`
/// and never fires.
pub fn propensities(
    network: &ReactionNetwork,
    concentrations: &[f64],
    propensities: &mut [f64],
) -> f64 {
    let mut total = 0.0;
    for (idx, reactants) in network.reactants.iter().enumerate() {
        if reactants.is_empty() {
            propensities[idx] = 0.0;
            continue;
        }
        let mut value = network.rates()[idx];
        for reactant in reactants {
            value *= concentrations[reactant.species];
        }
        propensities[idx] = value;
        total += value;
    }
    total
}

fn reaction_blocked(reactants: &[Reactant], concentrations: &[f64]) -> bool {
    reactants
        .iter()
        .any(|r| concentrations[r.species] < r.count)
}

/// True when no reaction has enough of every reactant to fire.
pub fn is_blocked(network: &ReactionNetwork, concentrations: &[f64]) -> bool {
    network
        .reactants
        .iter()
        .all(|reactants| reaction_blocked(reactants, concentrations))
}

/// Direct-method selection over the reactions with positive propensity: the
/// first of them whose inclusive cumulative propensity reaches `r2 * a0`.
///
/// Zero-propensity entries are skipped, so for `r2 == 0` this returns the
/// first positive entry rather than index 0.
pub fn select_reaction(propensities: &[f64], a0: f64, r2: f64) -> usize {
    debug_assert!(a0 > 0.0);
    let target = r2 * a0;
    let mut cumulative = 0.0;
    let mut last_positive = propensities.len().saturating_sub(1);
    for (idx, &value) in propensities.iter().enumerate() {
        if value <= 0.0 {
            continue;
        }
        cumulative += value;
        last_positive = idx;
        if cumulative >= target {
            return idx;
        }
    }
    // rounding left the running sum short of the target
    last_positive
}

/// Waiting time until the next event, for `r1` in `(0, 1]`.
pub fn time_increment(a0: f64, r1: f64) -> f64 {
    (1.0 / a0) * (1.0 / r1).ln()
}

/// Step-wise SSA run over a shared, read-only network.
pub struct Simulator<'a> {
    network: &'a ReactionNetwork,
    options: SimulationOptions,
    state: SimulationState,
    propensities: Vec<f64>,
    trajectory: Trajectory,
    events: u64,
    status: EngineState,
}

impl<'a> Simulator<'a> {
    pub fn new(network: &'a ReactionNetwork, options: SimulationOptions) -> Self {
        let state = SimulationState {
            time: network.initial_time(),
            concentrations: network.initial_concentrations().to_vec(),
        };
        let trajectory = Trajectory::starting_at(&state);
        Self {
            network,
            options,
            state,
            propensities: vec![0.0; network.n_reactions()],
            trajectory,
            events: 0,
            status: EngineState::Running,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn termination(&self) -> Option<Termination> {
        match self.status {
            EngineState::Running => None,
            EngineState::Terminated(reason) => Some(reason),
        }
    }

    /// Propensities from the most recent step.
    pub fn propensities(&self) -> &[f64] {
        &self.propensities
    }

    fn terminate(&mut self, reason: Termination) -> StepOutcome {
        if self.options.record == RecordMode::FinalOnly && self.events > 0 {
            self.trajectory.record(&self.state);
        }
        self.status = EngineState::Terminated(reason);
        log::debug!(
            "simulation terminated ({:?}) at t={} after {} events",
            reason,
            self.state.time,
            self.events
        );
        StepOutcome::Terminated(reason)
    }

    /// Advances by at most one reaction event.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StepOutcome {
        if let EngineState::Terminated(reason) = self.status {
            return StepOutcome::Terminated(reason);
        }
        if self.state.time >= self.network.final_time() {
            return self.terminate(Termination::TimeExceeded);
        }
        if self
            .options
            .max_events
            .is_some_and(|budget| self.events >= budget)
        {
            return self.terminate(Termination::EventLimit);
        }
        if is_blocked(self.network, &self.state.concentrations) {
            return self.terminate(Termination::Blocked);
        }

        let a0 = propensities(
            self.network,
            &self.state.concentrations,
            &mut self.propensities,
        );
        if a0.is_nan() || a0 <= 0.0 {
            return self.terminate(Termination::Blocked);
        }

        let r2: f64 = rng.r#gen();
        let chosen = select_reaction(&self.propensities, a0, r2);
        let r1 = 1.0 - rng.r#gen::<f64>();
        self.state.time += time_increment(a0, r1);

        for delta in &self.network.deltas[chosen] {
            self.state.concentrations[delta.species] += delta.delta;
        }
        self.events += 1;
        if self.options.record == RecordMode::Events {
            self.trajectory.record(&self.state);
        }

        StepOutcome::Fired {
            reaction: chosen,
            time: self.state.time,
        }
    }

    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> SimulationResult {
        while let StepOutcome::Fired { .. } = self.step(rng) {}
        self.into_result()
    }

    /// Finishes the run as it stands; an unfinished run reports `EventLimit`.
    pub fn into_result(mut self) -> SimulationResult {
        if self.status == EngineState::Running {
            self.terminate(Termination::EventLimit);
        }
        let termination = self.termination().unwrap_or(Termination::EventLimit);
        SimulationResult {
            trajectory: self.trajectory,
            termination,
            time: self.state.time,
            final_state: self.state.concentrations,
            events: self.events,
        }
    }
}

pub fn simulate<R: Rng + ?Sized>(network: &ReactionNetwork, rng: &mut R) -> SimulationResult {
    simulate_with(network, rng, &SimulationOptions::default())
}

pub fn simulate_with<R: Rng + ?Sized>(
    network: &ReactionNetwork,
    rng: &mut R,
    options: &SimulationOptions,
) -> SimulationResult {
    Simulator::new(network, options.clone()).run(rng)
}
