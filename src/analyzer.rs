//! This module provides functions for analyzing projects to detect common errors and
//! inconsistencies before simulation: machines without a `start` state, submachine
//! names that do not resolve, states that can never be reached, and start-state
//! submachine chains that loop forever.
//!
//! The analyzer only reports. The project itself tolerates all of these, since a
//! submachine name is resolved only when a simulation actually enters it.

use crate::machine::Machine;
use crate::project::Project;
use crate::types::{TurrError, START_STATE_NAME};
use std::collections::{BTreeSet, HashSet};

/// Represents the issues that can be found during the analysis of a project.
#[derive(Debug, PartialEq, Eq, Clone, PartialOrd, Ord)]
pub enum AnalysisIssue {
    /// The machine cannot be simulated or called: it has no `start` state.
    MissingStartState(String),
    /// A state names a submachine that is not part of the project.
    UnknownSubmachine {
        machine: String,
        state: String,
        submachine: String,
    },
    /// States of a machine that no sequence of transitions reaches from `start`.
    UnreachableStates { machine: String, states: Vec<String> },
    /// Machines whose start states call each other in a loop, in call order.
    SubmachineCycle(Vec<String>),
}

impl From<AnalysisIssue> for TurrError {
    /// Converts an `AnalysisIssue` into a `TurrError::ValidationError`.
    fn from(issue: AnalysisIssue) -> Self {
        match issue {
            AnalysisIssue::MissingStartState(machine) => TurrError::ValidationError(format!(
                "Machine {} has no {} state",
                machine, START_STATE_NAME
            )),
            AnalysisIssue::UnknownSubmachine {
                machine,
                state,
                submachine,
            } => TurrError::ValidationError(format!(
                "State {} of machine {} calls unknown submachine {}",
                state, machine, submachine
            )),
            AnalysisIssue::UnreachableStates { machine, states } => TurrError::ValidationError(
                format!("Unreachable states in machine {}: {:?}", machine, states),
            ),
            AnalysisIssue::SubmachineCycle(machines) => TurrError::ValidationError(format!(
                "Start states call submachines in a loop: {}",
                machines.join(" -> ")
            )),
        }
    }
}

/// Analyzes a project and returns every issue found, sorted.
pub fn analyze(project: &Project) -> Vec<AnalysisIssue> {
    let mut issues: Vec<AnalysisIssue> = [
        check_start_states,
        check_submachine_names,
        check_unreachable_states,
        check_submachine_cycles,
    ]
    .iter()
    .flat_map(|check| check(project))
    .collect();

    issues.sort();
    issues
}

/// Analyzes a project and fails with the first issue found.
///
/// # Returns
///
/// * `Ok(())` if no issues are found.
/// * `Err(TurrError::ValidationError)` describing the first issue otherwise.
pub fn validate(project: &Project) -> Result<(), TurrError> {
    match analyze(project).into_iter().next() {
        Some(issue) => Err(issue.into()),
        None => Ok(()),
    }
}

/// Reports every machine without a `start` state.
fn check_start_states(project: &Project) -> Vec<AnalysisIssue> {
    project
        .machines()
        .filter(|(_, machine)| machine.start_state().is_none())
        .map(|(_, machine)| AnalysisIssue::MissingStartState(machine.name().to_string()))
        .collect()
}

/// Reports every state whose submachine name does not resolve.
fn check_submachine_names(project: &Project) -> Vec<AnalysisIssue> {
    let mut issues = Vec::new();
    for (_, machine) in project.machines() {
        for (_, state) in machine.states() {
            if let Some(submachine) = state.submachine() {
                if project.machine(submachine).is_none() {
                    issues.push(AnalysisIssue::UnknownSubmachine {
                        machine: machine.name().to_string(),
                        state: state.name().to_string(),
                        submachine: submachine.to_string(),
                    });
                }
            }
        }
    }
    issues
}

/// Checks for unreachable states with a depth-first traversal of each machine,
/// starting from its `start` state. Machines without one are reported elsewhere.
fn check_unreachable_states(project: &Project) -> Vec<AnalysisIssue> {
    project
        .machines()
        .filter_map(|(_, machine)| {
            let mut unreachable = unreachable_states(machine)?;
            if unreachable.is_empty() {
                return None;
            }
            unreachable.sort();
            Some(AnalysisIssue::UnreachableStates {
                machine: machine.name().to_string(),
                states: unreachable,
            })
        })
        .collect()
}

fn unreachable_states(machine: &Machine) -> Option<Vec<String>> {
    let (start, _) = machine.start_state()?;
    let mut visited = HashSet::new();
    let mut stack = vec![start];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }

        if let Some(state) = machine.state_by_id(id) {
            for (_, transition) in state.transitions() {
                if !visited.contains(&transition.destination()) {
                    stack.push(transition.destination());
                }
            }
        }
    }

    Some(
        machine
            .states()
            .filter(|(id, _)| !visited.contains(id))
            .map(|(_, state)| state.name().to_string())
            .collect(),
    )
}

/// Follows the chain of submachines called by start states from every machine and
/// reports each loop once, rotated to begin at its smallest machine name.
fn check_submachine_cycles(project: &Project) -> Vec<AnalysisIssue> {
    let mut cycles = BTreeSet::new();

    for (_, machine) in project.machines() {
        let mut chain: Vec<&str> = vec![machine.name()];
        let mut current = machine;

        while let Some(next) = current
            .start_state()
            .and_then(|(_, state)| state.submachine())
            .and_then(|name| project.machine(name))
        {
            if let Some(pos) = chain.iter().position(|&name| name == next.name()) {
                let mut cycle: Vec<String> = chain[pos..].iter().map(|s| s.to_string()).collect();
                if let Some(min) = cycle
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.cmp(b.1))
                    .map(|(i, _)| i)
                {
                    cycle.rotate_left(min);
                }
                cycles.insert(cycle);
                break;
            }
            chain.push(next.name());
            current = next;
        }
    }

    cycles.into_iter().map(AnalysisIssue::SubmachineCycle).collect()
}
