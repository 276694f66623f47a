//! This module defines `State`, a named node of a machine, and the `Transition` edges
//! leaving it.
//!
//! A state indexes its transitions by input character so the simulator can find the
//! matching transition in constant time. At most one transition claims any character.

use crate::registry::{Handle, Named, Rename};
use crate::types::{Direction, ModelError};
use std::collections::{BTreeMap, HashMap};

/// Handle of a state within its owning machine.
pub type StateId = Handle<State>;

/// Identifies a transition within the state that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionId(usize);

/// Position of a state in the diagram representation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// State transition that reads any of its input characters, optionally writes an
/// output character, and moves the head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    destination: StateId,
    input: String,
    output: Option<char>,
    direction: Direction,
}

impl Transition {
    /// Creates a transition. Repeated input characters are kept once.
    ///
    /// # Arguments
    ///
    /// * `destination` - The state the transition leads to, in the same machine.
    /// * `input` - The characters this transition reads.
    /// * `output` - The character to write, or `None` to leave the tape as is.
    /// * `direction` - The head movement after writing.
    pub fn new(
        destination: StateId,
        input: &str,
        output: Option<char>,
        direction: Direction,
    ) -> Self {
        let mut deduped = String::with_capacity(input.len());
        for c in input.chars() {
            if !deduped.contains(c) {
                deduped.push(c);
            }
        }

        Self {
            destination,
            input: deduped,
            output,
            direction,
        }
    }

    pub fn destination(&self) -> StateId {
        self.destination
    }

    /// Returns the input characters as a string.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn reads(&self, c: char) -> bool {
        self.input.contains(c)
    }

    pub fn output(&self) -> Option<char> {
        self.output
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The signed head movement: -1, 0 or 1.
    pub fn movement(&self) -> isize {
        self.direction.delta()
    }
}

/// State of a Turing machine.
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    accepting: bool,
    submachine: Option<String>,
    position: Position,
    transitions: BTreeMap<TransitionId, Transition>,
    by_input: HashMap<char, TransitionId>,
    next_transition: usize,
}

impl State {
    /// Creates a non-accepting state without transitions, placed at the origin.
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            accepting: false,
            submachine: None,
            position: Position::default(),
            transitions: BTreeMap::new(),
            by_input: HashMap::new(),
            next_transition: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    /// Returns the name of the machine called when this state is entered.
    ///
    /// The name is resolved only when a simulation enters the state, so it may refer
    /// to a machine that does not exist (yet).
    pub fn submachine(&self) -> Option<&str> {
        self.submachine.as_deref()
    }

    pub fn set_submachine(&mut self, submachine: Option<&str>) {
        self.submachine = submachine.map(str::to_string);
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Adds a transition to the state.
    ///
    /// Every input character is checked before anything is stored, so a clash leaves
    /// the state untouched. Adding a transition equal to one already stored changes
    /// nothing.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionId)` identifying the stored transition, or the equal one
    ///   already present.
    /// * `Err(ModelError::InputInUse)` if a different transition already reads one of
    ///   the input characters.
    /// * `Err(ModelError::EmptyInput)` if the transition reads nothing.
    pub fn add_transition(&mut self, transition: Transition) -> Result<TransitionId, ModelError> {
        if transition.input.is_empty() {
            return Err(ModelError::EmptyInput);
        }

        if let Some((&id, _)) = self
            .transitions
            .iter()
            .find(|(_, existing)| **existing == transition)
        {
            return Ok(id);
        }

        if let Some(c) = transition
            .input
            .chars()
            .find(|c| self.by_input.contains_key(c))
        {
            return Err(ModelError::InputInUse(c));
        }

        let id = TransitionId(self.next_transition);
        self.next_transition += 1;

        for c in transition.input.chars() {
            self.by_input.insert(c, id);
        }
        self.transitions.insert(id, transition);

        Ok(id)
    }

    /// Removes a transition. Removing an unknown or already removed transition does
    /// nothing.
    pub fn remove_transition(&mut self, id: TransitionId) -> Option<Transition> {
        let transition = self.transitions.remove(&id)?;
        for c in transition.input.chars() {
            if self.by_input.get(&c) == Some(&id) {
                self.by_input.remove(&c);
            }
        }
        Some(transition)
    }

    /// Removes every transition leading to `destination`, returning how many were
    /// removed.
    pub(crate) fn remove_transitions_to(&mut self, destination: StateId) -> usize {
        let doomed: Vec<TransitionId> = self
            .transitions
            .iter()
            .filter(|(_, t)| t.destination == destination)
            .map(|(&id, _)| id)
            .collect();

        for &id in &doomed {
            self.remove_transition(id);
        }
        doomed.len()
    }

    /// Finds the transition reading `c`.
    pub fn transition_for(&self, c: char) -> Option<&Transition> {
        self.by_input
            .get(&c)
            .and_then(|id| self.transitions.get(id))
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(&id)
    }

    /// Iterates over all transitions, in the order they were added.
    pub fn transitions(&self) -> impl Iterator<Item = (TransitionId, &Transition)> {
        self.transitions.iter().map(|(&id, t)| (id, t))
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Returns every character some transition reads.
    pub fn input_characters(&self) -> impl Iterator<Item = char> + '_ {
        self.by_input.keys().copied()
    }
}

impl Rename for State {
    fn rename(&mut self, name: String) {
        self.name = name;
    }
}

impl Named for State {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn two_states() -> (State, StateId, StateId) {
        let mut registry = Registry::new();
        let a = registry.add(State::new("a")).unwrap();
        let b = registry.add(State::new("b")).unwrap();
        (State::new("source"), a, b)
    }

    #[test]
    fn test_new_state_defaults() {
        let state = State::new("q0");

        assert_eq!(state.name(), "q0");
        assert!(!state.is_accepting());
        assert_eq!(state.submachine(), None);
        assert_eq!(state.position(), Position::new(0.0, 0.0));
        assert_eq!(state.transition_count(), 0);
    }

    #[test]
    fn test_transition_lookup_by_input() {
        let (mut state, a, b) = two_states();
        state
            .add_transition(Transition::new(a, "xyz", Some('w'), Direction::Right))
            .unwrap();
        state
            .add_transition(Transition::new(b, "q", None, Direction::Left))
            .unwrap();

        let t = state.transition_for('y').unwrap();
        assert_eq!(t.destination(), a);
        assert_eq!(t.output(), Some('w'));
        assert_eq!(t.movement(), 1);

        assert_eq!(state.transition_for('q').unwrap().destination(), b);
        assert!(state.transition_for('w').is_none());
    }

    #[test]
    fn test_clashing_transition_changes_nothing() {
        let (mut state, a, b) = two_states();
        let first = state
            .add_transition(Transition::new(a, "ab", None, Direction::Stay))
            .unwrap();

        let result = state.add_transition(Transition::new(b, "cdb", None, Direction::Stay));
        assert_eq!(result, Err(ModelError::InputInUse('b')));

        // Neither the characters before nor after the clash were bound.
        assert!(state.transition_for('c').is_none());
        assert!(state.transition_for('d').is_none());
        assert_eq!(state.transition_for('b').unwrap().destination(), a);
        assert_eq!(state.transition_count(), 1);
        assert!(state.transition(first).is_some());
    }

    #[test]
    fn test_adding_equal_transition_again_is_noop() {
        let (mut state, a, _) = two_states();
        let first = state
            .add_transition(Transition::new(a, "ab", Some('x'), Direction::Right))
            .unwrap();

        let again = state.add_transition(Transition::new(a, "aab", Some('x'), Direction::Right));
        assert_eq!(again, Ok(first));
        assert_eq!(state.transition_count(), 1);

        // A different transition on the same characters still clashes.
        let other = state.add_transition(Transition::new(a, "ab", Some('y'), Direction::Right));
        assert_eq!(other, Err(ModelError::InputInUse('a')));
        assert_eq!(state.transition_count(), 1);
    }

    #[test]
    fn test_empty_input_rejected() {
        let (mut state, a, _) = two_states();
        let result = state.add_transition(Transition::new(a, "", None, Direction::Stay));

        assert_eq!(result, Err(ModelError::EmptyInput));
        assert_eq!(state.transition_count(), 0);
    }

    #[test]
    fn test_remove_transition_is_idempotent() {
        let (mut state, a, b) = two_states();
        let first = state
            .add_transition(Transition::new(a, "ab", None, Direction::Stay))
            .unwrap();
        state
            .add_transition(Transition::new(b, "c", None, Direction::Stay))
            .unwrap();

        assert!(state.remove_transition(first).is_some());
        assert!(state.remove_transition(first).is_none());

        assert!(state.transition_for('a').is_none());
        assert!(state.transition_for('b').is_none());
        assert_eq!(state.transition_for('c').unwrap().destination(), b);

        // Freed characters can be claimed again.
        state
            .add_transition(Transition::new(b, "a", None, Direction::Stay))
            .unwrap();
        assert_eq!(state.transition_for('a').unwrap().destination(), b);
    }

    #[test]
    fn test_transition_dedups_input() {
        let (_, a, _) = two_states();
        let t = Transition::new(a, "aabca", None, Direction::Stay);

        assert_eq!(t.input(), "abc");
        assert!(t.reads('c'));
        assert!(!t.reads('d'));
    }

    #[test]
    fn test_remove_transitions_to() {
        let (mut state, a, b) = two_states();
        state
            .add_transition(Transition::new(a, "x", None, Direction::Stay))
            .unwrap();
        state
            .add_transition(Transition::new(b, "y", None, Direction::Stay))
            .unwrap();
        state
            .add_transition(Transition::new(a, "z", None, Direction::Stay))
            .unwrap();

        assert_eq!(state.remove_transitions_to(a), 2);
        assert_eq!(state.transition_count(), 1);
        assert!(state.transition_for('x').is_none());
        assert!(state.transition_for('z').is_none());
    }
}
