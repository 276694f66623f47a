//! This module defines `Machine`, a named Turing machine owning a by-name set of
//! states.

use crate::registry::{Handle, Named, Registry, Rename};
use crate::state::{State, StateId, Transition, TransitionId};
use crate::types::{Direction, ModelError, START_STATE_NAME};

/// Handle of a machine within its owning project.
pub type MachineId = Handle<Machine>;

/// A Turing machine.
#[derive(Debug, Clone)]
pub struct Machine {
    name: String,
    states: Registry<State>,
}

impl Machine {
    /// Creates an empty machine. Machines are added to a project through
    /// `Project::add_machine`.
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            states: Registry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a new, non-accepting state without transitions.
    ///
    /// # Returns
    ///
    /// * `Ok(StateId)` of the new state.
    /// * `Err(ModelError::NameInUse)` if the machine already has a state with this name.
    pub fn add_state(&mut self, name: &str) -> Result<StateId, ModelError> {
        self.states.add(State::new(name))
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut State> {
        self.states.get_mut(name)
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states.handle_of(name)
    }

    pub fn state_by_id(&self, id: StateId) -> Option<&State> {
        self.states.by_handle(id)
    }

    pub fn state_by_id_mut(&mut self, id: StateId) -> Option<&mut State> {
        self.states.by_handle_mut(id)
    }

    /// Returns the state every simulation of this machine begins in.
    pub fn start_state(&self) -> Option<(StateId, &State)> {
        let id = self.states.handle_of(START_STATE_NAME)?;
        self.states.by_handle(id).map(|state| (id, state))
    }

    /// Renames a state. On failure the state keeps its old name.
    pub fn rename_state(&mut self, name: &str, new_name: &str) -> Result<(), ModelError> {
        let id = self
            .states
            .handle_of(name)
            .ok_or_else(|| ModelError::NotFound(name.to_string()))?;
        self.states.rename(id, new_name)
    }

    /// Removes a state together with every transition of this machine leading to it.
    /// Removing an unknown state does nothing.
    pub fn remove_state(&mut self, name: &str) -> Option<State> {
        let (id, state) = self.states.remove(name)?;
        for (_, other) in self.states.iter_mut() {
            other.remove_transitions_to(id);
        }
        Some(state)
    }

    /// Adds a transition between two states of this machine, both given by name.
    pub fn add_transition(
        &mut self,
        from: &str,
        to: &str,
        input: &str,
        output: Option<char>,
        direction: Direction,
    ) -> Result<TransitionId, ModelError> {
        let destination = self
            .state_id(to)
            .ok_or_else(|| ModelError::NotFound(to.to_string()))?;
        let source = self
            .state_mut(from)
            .ok_or_else(|| ModelError::NotFound(from.to_string()))?;
        source.add_transition(Transition::new(destination, input, output, direction))
    }

    /// Iterates over the state names, in the order the states were added.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.names()
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states.iter()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

impl Rename for Machine {
    fn rename(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for Machine {
    fn name(&self) -> &str {
        &self.name
    }
}
