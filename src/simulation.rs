//! This module defines `Simulation`, which executes a machine of a `Project` over a
//! tape. It handles head movement, transition lookup, and the call/return protocol of
//! submachines.
//!
//! The simulation keeps a stack of frames, each pairing a machine with its current
//! state. Entering a state that names a submachine pushes a frame for that machine's
//! `start` state; reaching an accepting state in a called machine pops back to the
//! caller. Acceptance of the outermost machine ends the simulation.

use crate::machine::Machine;
use crate::project::Project;
use crate::state::{State, StateId};
use crate::tape::{Head, Tape};
use crate::types::{SimulationError, SimulationStatus, Step};
use tracing::{debug, trace};

/// One level of submachine nesting: a machine and the state it is in.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'p> {
    machine: &'p Machine,
    state_id: StateId,
    state: &'p State,
}

impl<'p> Frame<'p> {
    /// Builds the frame a machine is entered with.
    fn start_of(machine: &'p Machine) -> Result<Self, SimulationError> {
        let (state_id, state) = machine
            .start_state()
            .ok_or_else(|| SimulationError::StartStateNotFound(machine.name().to_string()))?;
        Ok(Self {
            machine,
            state_id,
            state,
        })
    }

    pub fn machine(&self) -> &'p Machine {
        self.machine
    }

    pub fn state(&self) -> &'p State {
        self.state
    }

    pub fn state_id(&self) -> StateId {
        self.state_id
    }
}

/// Simulation of a machine, including the submachines it calls, over a single tape.
///
/// The project is borrowed for the lifetime of the simulation, so it cannot be edited
/// while a simulation is in progress.
pub struct Simulation<'p> {
    project: &'p Project,
    head: Head,
    current: Frame<'p>,
    callers: Vec<Frame<'p>>,
    status: SimulationStatus,
    step_count: usize,
}

impl<'p> Simulation<'p> {
    /// Creates a simulation of `machine_name` starting in its `start` state.
    ///
    /// Submachines named by the start state are entered immediately, so a new
    /// simulation is always settled: it is either accepted or waiting for its first
    /// transition.
    ///
    /// # Arguments
    ///
    /// * `project` - The project containing the machine and every submachine it calls.
    /// * `machine_name` - The machine to simulate.
    /// * `tape` - The input tape. The head starts at position 0.
    ///
    /// # Returns
    ///
    /// * `Err(SimulationError::MachineNotFound)` if the machine does not exist.
    /// * `Err(SimulationError::StartStateNotFound)` if it (or an entered submachine)
    ///   has no `start` state.
    /// * Any other `SimulationError` raised while entering submachines.
    pub fn new(
        project: &'p Project,
        machine_name: &str,
        tape: Tape,
    ) -> Result<Self, SimulationError> {
        let machine = project
            .machine(machine_name)
            .ok_or_else(|| SimulationError::MachineNotFound(machine_name.to_string()))?;

        let mut simulation = Self {
            project,
            head: Head::new(tape),
            current: Frame::start_of(machine)?,
            callers: Vec::new(),
            status: SimulationStatus::Running,
            step_count: 0,
        };
        simulation.resolve()?;

        Ok(simulation)
    }

    /// Takes a single transition if the simulation is still running.
    ///
    /// Reads the character under the head, writes the transition's output character
    /// (if any), moves the head, and enters the destination state, calling or
    /// returning from submachines as needed.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if a transition was taken and the simulation still runs.
    /// * `Ok(Step::Halt(status))` if the simulation is accepted or rejected. A
    ///   rejection leaves the state, head, and tape as they were before the call.
    /// * `Err(SimulationError)` if a submachine could not be entered. The simulation
    ///   must not be used afterwards.
    pub fn step(&mut self) -> Result<Step, SimulationError> {
        if self.status != SimulationStatus::Running {
            return Ok(Step::Halt(self.status));
        }

        let Frame { machine, state, .. } = self.current;
        let symbol = self.head.read();
        let Some(transition) = state.transition_for(symbol) else {
            debug!(
                machine = machine.name(),
                state = state.name(),
                symbol = %symbol,
                "no transition, rejecting"
            );
            self.status = SimulationStatus::Rejected;
            return Ok(Step::Halt(self.status));
        };

        let destination = machine
            .state_by_id(transition.destination())
            .ok_or_else(|| SimulationError::DanglingDestination {
                state: state.name().to_string(),
                machine: machine.name().to_string(),
            })?;

        if let Some(output) = transition.output() {
            self.head.write(output);
        }
        self.head.move_by(transition.movement());

        trace!(
            machine = machine.name(),
            from = state.name(),
            to = destination.name(),
            symbol = %symbol,
            position = self.head.position(),
            "step"
        );

        self.current.state_id = transition.destination();
        self.current.state = destination;
        self.step_count += 1;

        self.resolve()?;

        Ok(match self.status {
            SimulationStatus::Running => Step::Continue,
            status => Step::Halt(status),
        })
    }

    /// Steps the simulation until it is no longer running.
    ///
    /// Note that this might not terminate; use `run_for` to bound the work.
    pub fn run(&mut self) -> Result<SimulationStatus, SimulationError> {
        while self.status == SimulationStatus::Running {
            self.step()?;
        }
        Ok(self.status)
    }

    /// Steps the simulation at most `max_steps` times.
    ///
    /// Returns the status afterwards, which is still `Running` if the budget ran out.
    pub fn run_for(&mut self, max_steps: usize) -> Result<SimulationStatus, SimulationError> {
        for _ in 0..max_steps {
            if let Step::Halt(status) = self.step()? {
                return Ok(status);
            }
        }
        Ok(self.status)
    }

    /// Settles the frame stack after a state has been entered.
    fn resolve(&mut self) -> Result<(), SimulationError> {
        self.enter_submachines()?;
        self.return_from_accepting();
        Ok(())
    }

    /// Pushes a frame for every submachine named by the state just entered.
    ///
    /// Entering a submachine consumes no input, so a chain longer than the number of
    /// machines must revisit one and would never stop.
    fn enter_submachines(&mut self) -> Result<(), SimulationError> {
        let limit = self.project.machine_count();
        let mut depth = 0;

        loop {
            let Frame { machine, state, .. } = self.current;
            let Some(name) = state.submachine() else {
                break;
            };
            let submachine =
                self.project
                    .machine(name)
                    .ok_or_else(|| SimulationError::SubmachineNotFound {
                        submachine: name.to_string(),
                        state: state.name().to_string(),
                        machine: machine.name().to_string(),
                    })?;
            let frame = Frame::start_of(submachine)?;

            depth += 1;
            if depth > limit {
                return Err(SimulationError::InfiniteSubmachineLoop {
                    machine: name.to_string(),
                    depth,
                });
            }

            debug!(
                caller = machine.name(),
                state = state.name(),
                submachine = name,
                "entering submachine"
            );
            self.callers.push(std::mem::replace(&mut self.current, frame));
        }

        Ok(())
    }

    /// Pops frames while the current state is accepting.
    ///
    /// A caller resumed this way has already made its call, so its submachine is not
    /// entered again; it may itself be accepting and return further.
    fn return_from_accepting(&mut self) {
        while self.current.state.is_accepting() {
            match self.callers.pop() {
                Some(caller) => {
                    debug!(
                        submachine = self.current.machine.name(),
                        state = self.current.state.name(),
                        caller = caller.machine.name(),
                        "returning from submachine"
                    );
                    self.current = caller;
                }
                None => {
                    debug!(
                        machine = self.current.machine.name(),
                        state = self.current.state.name(),
                        steps = self.step_count,
                        "accepted"
                    );
                    self.status = SimulationStatus::Accepted;
                    break;
                }
            }
        }
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    /// Returns the current state.
    ///
    /// When rejected, this is the state that could not continue. When accepted, it is
    /// the accepting state of the outermost machine.
    pub fn state(&self) -> &'p State {
        self.current.state
    }

    /// Returns the machine the current state belongs to.
    pub fn machine(&self) -> &'p Machine {
        self.current.machine
    }

    pub fn current_frame(&self) -> Frame<'p> {
        self.current
    }

    /// Iterates over the frame stack, outermost machine first.
    pub fn frames(&self) -> impl Iterator<Item = Frame<'p>> + '_ {
        self.callers
            .iter()
            .copied()
            .chain(std::iter::once(self.current))
    }

    /// Number of frames on the stack, 1 when no submachine is active.
    pub fn depth(&self) -> usize {
        self.callers.len() + 1
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn tape(&self) -> &Tape {
        self.head.tape()
    }

    /// Returns the total number of transitions taken.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn into_tape(self) -> Tape {
        self.head.into_tape()
    }
}
