//! This crate provides the core logic for a hierarchical Turing machine simulator.
//! A `Project` holds named machines; each `Machine` holds named states linked by
//! transitions, and any state may call another machine as a submachine. The
//! `Simulation` executes a machine over a `Tape`, entering and returning from
//! submachines as it goes. Projects can be loaded from and saved to directories of
//! `.turr` machine files, checked by the analyzer, or taken from the built-in library.

pub mod analyzer;
pub mod loader;
pub mod machine;
pub mod programs;
pub mod project;
pub mod registry;
pub mod simulation;
pub mod state;
pub mod tape;
pub mod types;

/// Re-exports the `analyze` function and `AnalysisIssue` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisIssue};
/// Re-exports the `ProjectLoader` struct from the loader module.
pub use loader::ProjectLoader;
pub use machine::{Machine, MachineId};
/// Re-exports `ProgramManager` and `PROGRAMS` from the programs module.
pub use programs::{ProgramManager, PROGRAMS};
pub use project::Project;
pub use registry::{Handle, Named, Registry};
/// Re-exports the `Simulation` struct and its `Frame` from the simulation module.
pub use simulation::{Frame, Simulation};
pub use state::{Position, State, StateId, Transition, TransitionId};
pub use tape::{Head, Tape};
/// Re-exports the shared value and error types from the types module.
pub use types::{
    Direction, ModelError, SimulationError, SimulationStatus, Step, TurrError,
    DEFAULT_EMPTY_CHARACTER, DEFAULT_MAX_STEPS, START_STATE_NAME,
};
