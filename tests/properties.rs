//! Property-based tests for the tape, the head, and the per-state transition index.
//!
//! These tests use proptest to verify the invariants hold across many randomly
//! generated inputs.

use proptest::prelude::*;
use turr::{Direction, Head, ModelError, Project, Simulation, SimulationStatus, Tape};

const EMPTY: char = '_';

prop_compose! {
    fn arbitrary_contents()(s in "[a-c_]{0,12}") -> String {
        s
    }
}

prop_compose! {
    fn trimmed_contents()(s in "[a-c_]{0,11}", last in "[a-c]") -> String {
        format!("{}{}", s, last)
    }
}

proptest! {
    #[test]
    fn set_then_get_returns_written_char(
        initial in arbitrary_contents(),
        pos in 0usize..40,
        c in "[a-z]",
    ) {
        let c = c.chars().next().unwrap();
        let before = Tape::new(&initial, EMPTY);
        let mut tape = before.clone();
        tape.set(pos, c);

        prop_assert_eq!(tape.get(pos), c);
        for other in (0..48).filter(|&p| p != pos) {
            prop_assert_eq!(tape.get(other), before.get(other));
        }
    }

    #[test]
    fn contents_never_ends_in_empty(
        initial in arbitrary_contents(),
        writes in prop::collection::vec((0usize..30, "[a-c_]"), 0..10),
    ) {
        let mut tape = Tape::new(&initial, EMPTY);
        for (pos, c) in writes {
            tape.set(pos, c.chars().next().unwrap());
        }

        prop_assert!(!tape.contents().ends_with(EMPTY));
    }

    #[test]
    fn set_contents_round_trips(initial in arbitrary_contents(), contents in trimmed_contents()) {
        let mut tape = Tape::new(&initial, EMPTY);
        tape.set_contents(&contents);

        prop_assert_eq!(tape.contents(), contents);
    }

    #[test]
    fn head_position_never_negative(moves in prop::collection::vec(-3isize..=3, 0..64)) {
        let mut head = Head::new(Tape::default());
        let mut expected: isize = 0;
        for delta in moves {
            head.move_by(delta);
            expected = (expected + delta).max(0);
            prop_assert_eq!(head.position() as isize, expected);
        }
    }

    #[test]
    fn clashing_transition_leaves_index_unchanged(
        first in "[a-f]{1,4}",
        second in "[a-f]{1,4}",
    ) {
        let mut project = Project::new();
        project.add_machine("m").unwrap();
        let machine = project.machine_mut("m").unwrap();
        machine.add_state("start").unwrap();
        machine.add_state("other").unwrap();
        machine.add_transition("start", "other", &first, None, Direction::Right).unwrap();

        let before: Vec<_> = ('a'..='f')
            .map(|c| machine.state("start").unwrap().transition_for(c).cloned())
            .collect();

        let result = machine.add_transition("start", "start", &second, Some('z'), Direction::Left);
        let clash = second.chars().find(|&c| first.contains(c));

        match clash {
            Some(c) => {
                prop_assert_eq!(result, Err(ModelError::InputInUse(c)));
                let after: Vec<_> = ('a'..='f')
                    .map(|c| machine.state("start").unwrap().transition_for(c).cloned())
                    .collect();
                prop_assert_eq!(before, after);
                prop_assert_eq!(machine.state("start").unwrap().transition_count(), 1);
            }
            None => {
                prop_assert!(result.is_ok());
                prop_assert_eq!(machine.state("start").unwrap().transition_count(), 2);
            }
        }
    }

    #[test]
    fn rejection_preserves_configuration(input in "[ab]{0,8}") {
        // Accepts only strings of a's followed by the empty character.
        let mut project = Project::new();
        project.add_machine("m").unwrap();
        let machine = project.machine_mut("m").unwrap();
        machine.add_state("start").unwrap();
        machine.add_state("done").unwrap();
        machine.state_mut("done").unwrap().set_accepting(true);
        machine.add_transition("start", "start", "a", Some('A'), Direction::Right).unwrap();
        machine.add_transition("start", "done", "_", None, Direction::Stay).unwrap();

        let mut simulation = Simulation::new(&project, "m", Tape::new(&input, EMPTY)).unwrap();
        loop {
            let position = simulation.head().position();
            let contents = simulation.tape().contents();
            let state = simulation.state().name().to_string();

            simulation.step().unwrap();
            match simulation.status() {
                SimulationStatus::Running => continue,
                SimulationStatus::Accepted => {
                    prop_assert!(!input.contains('b'));
                    break;
                }
                SimulationStatus::Rejected => {
                    prop_assert!(input.contains('b'));
                    prop_assert_eq!(simulation.head().position(), position);
                    prop_assert_eq!(simulation.tape().contents(), contents);
                    prop_assert_eq!(simulation.state().name(), state.as_str());
                    break;
                }
            }
        }
    }
}
