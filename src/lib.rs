//! Stochastic simulation of well-mixed chemical reaction networks.
//!
//! A network is written in a small text language:
//!
//! ```text
//! initial_time = 0
//! final_time = 100
//!
//! r1: A + B -> AB; k1
//! r2: AB -> A + B; k2
//!
//! k1 = 1
//! k2 = 2
//! A = 25
//! B = 583
//! ```
//!
//! [`build_network`] compiles the text into an immutable [`ReactionNetwork`]
//! and [`simulate`] runs Gillespie's direct method over it with an injected
//! random source.
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let network = crnsim::build_network(
//!     "initial_time = 0\nfinal_time = 10\nr1: A -> B; k\nk = 0.5\nA = 40\n",
//! )?;
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let result = crnsim::simulate(&network, &mut rng);
//! assert_eq!(result.trajectory.states()[0], vec![40.0, 0.0]);
//! # Ok::<(), crnsim::CrnError>(())
//! ```

pub mod ensemble;
pub mod error;
pub mod lexer;
pub mod network;
pub mod parser;
#[cfg(feature = "python")]
mod python;
pub mod ssa;

pub use ensemble::{EnsembleOptions, run_rng, simulate_ensemble};
pub use error::{CrnError, LexError, LexErrors, ParseError, ReferenceKind};
pub use lexer::{Lexer, Spanned, Token, lex};
pub use network::{
    BuildOptions, ReactionNetwork, Resolution, SpeciesIndex, build_network, build_network_with,
};
pub use parser::{Assignments, NetworkDocument, ReactionDecl, parse_document};
pub use ssa::{
    RecordMode, SimulationOptions, SimulationResult, SimulationState, Simulator, StepOutcome,
    Termination, Trajectory, is_blocked, propensities, select_reaction, simulate, simulate_with,
    time_increment,
};
