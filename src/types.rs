//! This module defines the shared constants, small value types, and error types used
//! throughout the crate: head directions, simulation status, step outcomes, and the
//! error enums raised by the entity graph, the simulator, and the project loader.

use thiserror::Error;

/// The character used for every tape position that has never been written.
pub const DEFAULT_EMPTY_CHARACTER: char = '␣';
/// Every machine is entered at the state carrying this name.
pub const START_STATE_NAME: &str = "start";
/// File extension of a single machine document inside a project directory.
pub const MACHINE_FILE_EXTENSION: &str = "turr";
/// Default step budget applied by front-ends that bound execution.
pub const DEFAULT_MAX_STEPS: usize = 10000;

/// Represents the possible directions a head can move after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Keep the head in the same position.
    Stay,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Returns the signed movement applied to the head position.
    pub fn delta(self) -> isize {
        match self {
            Direction::Left => -1,
            Direction::Stay => 0,
            Direction::Right => 1,
        }
    }

    /// Builds a direction from a signed movement, keeping only its sign.
    pub fn from_delta(delta: isize) -> Self {
        match delta.signum() {
            -1 => Direction::Left,
            1 => Direction::Right,
            _ => Direction::Stay,
        }
    }

    /// The single-letter code used in machine files (`L`, `S`, `R`).
    pub fn code(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Stay => 'S',
            Direction::Right => 'R',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Direction::Left),
            "S" => Some(Direction::Stay),
            "R" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// The status of a simulation.
///
/// `Accepted` and `Rejected` are terminal: once reached, stepping does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStatus {
    /// The simulation can still take a transition.
    Running,
    /// The outermost machine reached an accepting state.
    Accepted,
    /// No transition matched the character under the head.
    Rejected,
}

impl SimulationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SimulationStatus::Running)
    }
}

/// Represents the outcome of a single simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A transition was taken and the simulation is still running.
    Continue,
    /// The simulation is (now) in a terminal status.
    Halt(SimulationStatus),
}

/// Errors raised while editing the entity graph.
///
/// Every operation returning one of these leaves the graph exactly as it was, so the
/// caller may retry with a different name or transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The name is already claimed within its container.
    #[error("Name already in use: {0}")]
    NameInUse(String),
    /// Another transition of the state already reads this character.
    #[error("State already has a transition for character {0:?}")]
    InputInUse(char),
    /// A transition must read at least one character.
    #[error("Transition has no input characters")]
    EmptyInput,
    /// No entity with this name exists in the container.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Errors raised by the simulator when the project cannot be simulated further.
///
/// A simulation that returned one of these must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The machine the simulation was asked to start in does not exist.
    #[error("Machine not found: {0}")]
    MachineNotFound(String),
    /// A state names a submachine that does not exist in the project.
    #[error("Submachine {submachine} called from state {state} of machine {machine} not found")]
    SubmachineNotFound {
        submachine: String,
        state: String,
        machine: String,
    },
    /// A machine that had to be entered has no `start` state.
    #[error("Start state not found in machine {0}")]
    StartStateNotFound(String),
    /// Submachine entries chained deeper than the number of machines in the project.
    #[error("Infinite submachine loop entering machine {machine} (depth {depth})")]
    InfiniteSubmachineLoop { machine: String, depth: usize },
    /// A transition points at a state its machine no longer owns.
    #[error("Transition from state {state} of machine {machine} leads to an unknown state")]
    DanglingDestination { state: String, machine: String },
}

/// Crate-level error used by the loader, the program library, and front-ends.
#[derive(Debug, Error)]
pub enum TurrError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    /// A machine file (or embedded program) is not a valid machine document.
    #[error("Malformed file: {0}")]
    MalformedFile(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_delta_roundtrip() {
        for direction in [Direction::Left, Direction::Stay, Direction::Right] {
            assert_eq!(Direction::from_delta(direction.delta()), direction);
        }
        assert_eq!(Direction::from_delta(5), Direction::Right);
        assert_eq!(Direction::from_delta(-7), Direction::Left);
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(Direction::from_code("L"), Some(Direction::Left));
        assert_eq!(Direction::from_code("S"), Some(Direction::Stay));
        assert_eq!(Direction::from_code("R"), Some(Direction::Right));
        assert_eq!(Direction::from_code("X"), None);
        assert_eq!(Direction::Right.code(), 'R');
    }

    #[test]
    fn test_status_terminal() {
        assert!(!SimulationStatus::Running.is_terminal());
        assert!(SimulationStatus::Accepted.is_terminal());
        assert!(SimulationStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_error_display() {
        let error = SimulationError::SubmachineNotFound {
            submachine: "win".to_string(),
            state: "statey".to_string(),
            machine: "mac".to_string(),
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("win"));
        assert!(error_msg.contains("statey"));
        assert!(error_msg.contains("mac"));

        let wrapped: TurrError = ModelError::NameInUse("q0".to_string()).into();
        assert!(format!("{}", wrapped).contains("q0"));
    }
}
