//! This module defines the `Tape`, a left-bounded and logically infinite character
//! store, and the `Head` that reads, writes, and moves over it.

use crate::types::DEFAULT_EMPTY_CHARACTER;

/// Tape of a Turing machine.
///
/// Only the prefix that has been written is stored; every position past it holds the
/// empty character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<char>,
    empty: char,
}

impl Tape {
    /// Creates a tape holding `initial` from position 0, with `empty` everywhere else.
    pub fn new(initial: &str, empty: char) -> Self {
        Self {
            cells: initial.chars().collect(),
            empty,
        }
    }

    /// Creates a blank tape using `empty` as the empty character.
    pub fn blank(empty: char) -> Self {
        Self::new("", empty)
    }

    /// Returns the character used for unwritten positions.
    pub fn empty_char(&self) -> char {
        self.empty
    }

    /// Returns the character at `pos`. The leftmost position is 0.
    pub fn get(&self, pos: usize) -> char {
        self.cells.get(pos).copied().unwrap_or(self.empty)
    }

    /// Writes `c` at `pos`, padding the stored prefix with the empty character first
    /// when `pos` lies beyond it.
    pub fn set(&mut self, pos: usize, c: char) {
        if pos >= self.cells.len() {
            self.cells.resize(pos + 1, self.empty);
        }
        self.cells[pos] = c;
    }

    /// Returns the stored contents without trailing empty characters.
    pub fn contents(&self) -> String {
        let end = self
            .cells
            .iter()
            .rposition(|&c| c != self.empty)
            .map_or(0, |last| last + 1);
        self.cells[..end].iter().collect()
    }

    /// Replaces the whole stored prefix with `contents`.
    pub fn set_contents(&mut self, contents: &str) {
        self.cells = contents.chars().collect();
    }

    /// Length of the stored prefix, trailing empty characters included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::blank(DEFAULT_EMPTY_CHARACTER)
    }
}

impl From<&str> for Tape {
    fn from(initial: &str) -> Self {
        Self::new(initial, DEFAULT_EMPTY_CHARACTER)
    }
}

/// Read/write head over a single tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    tape: Tape,
    position: usize,
}

impl Head {
    /// Puts a head on `tape` at position 0.
    pub fn new(tape: Tape) -> Self {
        Self { tape, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn tape_mut(&mut self) -> &mut Tape {
        &mut self.tape
    }

    pub fn into_tape(self) -> Tape {
        self.tape
    }

    /// Moves the head by `delta` positions. Moving past the leftmost position leaves
    /// the head at position 0.
    pub fn move_by(&mut self, delta: isize) {
        self.position = self.position.saturating_add_signed(delta);
    }

    /// Reads the character under the head.
    pub fn read(&self) -> char {
        self.tape.get(self.position)
    }

    /// Writes `c` under the head.
    pub fn write(&mut self, c: char) {
        self.tape.set(self.position, c);
    }
}
