//! This module provides the `ProjectLoader` struct, responsible for reading and writing
//! projects as directories of `.turr` machine files, and the serde documents describing
//! a single machine file.
//!
//! A machine file is a JSON object:
//!
//! ```json
//! {
//!   "states": {
//!     "start": {
//!       "transitions": [
//!         { "destination": "done", "inchar": "ab", "outchar": "x", "move": "R" }
//!       ],
//!       "accepting": false,
//!       "submachine": null,
//!       "x": 0.0,
//!       "y": 0.0
//!     },
//!     "done": { "transitions": [], "accepting": true, "submachine": null, "x": 80.0, "y": 0.0 }
//!   },
//!   "submachines": null
//! }
//! ```

use crate::machine::Machine;
use crate::project::Project;
use crate::state::{Position, Transition};
use crate::types::{Direction, TurrError, MACHINE_FILE_EXTENSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Serialized form of one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDocument {
    pub states: BTreeMap<String, StateDocument>,
    /// Reserved; always written as `null`.
    #[serde(default)]
    pub submachines: Option<serde_json::Value>,
}

/// Serialized form of one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub transitions: Vec<TransitionDocument>,
    pub accepting: bool,
    #[serde(default)]
    pub submachine: Option<String>,
    pub x: f64,
    pub y: f64,
}

/// Serialized form of one transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDocument {
    pub destination: String,
    pub inchar: String,
    pub outchar: Option<String>,
    #[serde(rename = "move")]
    pub movement: String,
}

/// `ProjectLoader` is a utility struct for loading and saving projects.
/// Every machine of a project is stored in its own `<machine name>.turr` file.
pub struct ProjectLoader;

impl ProjectLoader {
    /// Lists the machine names of all `.turr` files in a directory, sorted.
    ///
    /// Directories and files with other extensions are skipped.
    pub fn machine_names_in_directory(directory: &Path) -> Result<Vec<String>, TurrError> {
        let entries = fs::read_dir(directory).map_err(|e| {
            TurrError::FileError(format!(
                "Could not open project directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| TurrError::FileError(format!("Failed to read directory entry: {}", e)))?
                .path();

            if path.is_dir()
                || path
                    .extension()
                    .is_none_or(|ext| ext != MACHINE_FILE_EXTENSION)
            {
                continue;
            }

            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(name) => names.push(name.to_string()),
                None => warn!(path = %path.display(), "skipping machine file with unusable name"),
            }
        }

        names.sort();
        Ok(names)
    }

    /// Reads every machine file in `directory` into a project.
    ///
    /// # Returns
    ///
    /// * `Ok(Project)` containing one machine per `.turr` file.
    /// * `Err(TurrError::FileError)` if the directory or a file cannot be read.
    /// * `Err(TurrError::MalformedFile)` if a file is not a valid machine document.
    pub fn load_project(directory: &Path) -> Result<Project, TurrError> {
        let mut documents = BTreeMap::new();

        for name in Self::machine_names_in_directory(directory)? {
            let path = directory.join(format!("{}.{}", name, MACHINE_FILE_EXTENSION));
            let content = fs::read_to_string(&path).map_err(|e| {
                TurrError::FileError(format!(
                    "Could not read machine file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let document: MachineDocument = serde_json::from_str(&content).map_err(|e| {
                TurrError::MalformedFile(format!(
                    "Could not parse machine file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            documents.insert(name, document);
        }

        debug!(
            directory = %directory.display(),
            machines = documents.len(),
            "loaded project"
        );
        Self::project_from_documents(&documents)
    }

    /// Parses a whole project from a single JSON object mapping machine names to
    /// machine documents.
    pub fn load_project_from_str(content: &str) -> Result<Project, TurrError> {
        let documents: BTreeMap<String, MachineDocument> = serde_json::from_str(content)
            .map_err(|e| TurrError::MalformedFile(format!("Could not parse project: {}", e)))?;
        Self::project_from_documents(&documents)
    }

    /// Writes every machine of `project` into `directory`, which must exist.
    pub fn save_project(project: &Project, directory: &Path) -> Result<(), TurrError> {
        for (name, document) in Self::project_to_documents(project) {
            let path = directory.join(format!("{}.{}", name, MACHINE_FILE_EXTENSION));
            let content = serde_json::to_string_pretty(&document).map_err(|e| {
                TurrError::MalformedFile(format!("Could not serialize machine {}: {}", name, e))
            })?;
            fs::write(&path, content).map_err(|e| {
                TurrError::FileError(format!(
                    "Could not write machine file {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Builds a project from machine documents keyed by machine name.
    ///
    /// All states of a machine are added before any transition, so transitions may
    /// lead to any state of the same machine.
    pub fn project_from_documents(
        documents: &BTreeMap<String, MachineDocument>,
    ) -> Result<Project, TurrError> {
        let mut project = Project::new();

        for (name, document) in documents {
            project
                .add_machine(name)
                .map_err(|e| TurrError::MalformedFile(e.to_string()))?;
            let machine = project
                .machine_mut(name)
                .ok_or_else(|| TurrError::MalformedFile(format!("Machine {} vanished", name)))?;
            read_machine(machine, document)
                .map_err(|e| TurrError::MalformedFile(format!("Machine {}: {}", name, e)))?;
        }

        Ok(project)
    }

    /// Describes every machine of `project` as a machine document.
    pub fn project_to_documents(project: &Project) -> BTreeMap<String, MachineDocument> {
        project
            .machines()
            .map(|(_, machine)| (machine.name().to_string(), machine_to_document(machine)))
            .collect()
    }
}

fn read_machine(machine: &mut Machine, document: &MachineDocument) -> Result<(), String> {
    for (state_name, state_document) in &document.states {
        machine.add_state(state_name).map_err(|e| e.to_string())?;
        let state = machine
            .state_mut(state_name)
            .ok_or_else(|| format!("State {} vanished", state_name))?;
        state.set_accepting(state_document.accepting);
        state.set_submachine(state_document.submachine.as_deref());
        state.set_position(Position::new(state_document.x, state_document.y));
    }

    for (state_name, state_document) in &document.states {
        for transition in &state_document.transitions {
            let destination = machine.state_id(&transition.destination).ok_or_else(|| {
                format!(
                    "Transition from {} leads to unknown state {}",
                    state_name, transition.destination
                )
            })?;

            let output = match transition.outchar.as_deref() {
                None => None,
                Some(outchar) => {
                    let mut chars = outchar.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Some(c),
                        _ => {
                            return Err(format!(
                                "Output character {:?} of a transition from {} is not a single character",
                                outchar, state_name
                            ))
                        }
                    }
                }
            };

            let direction = Direction::from_code(&transition.movement).ok_or_else(|| {
                format!(
                    "Unknown move {:?} in a transition from {}",
                    transition.movement, state_name
                )
            })?;

            machine
                .state_mut(state_name)
                .ok_or_else(|| format!("State {} vanished", state_name))?
                .add_transition(Transition::new(
                    destination,
                    &transition.inchar,
                    output,
                    direction,
                ))
                .map_err(|e| format!("State {}: {}", state_name, e))?;
        }
    }

    Ok(())
}

fn machine_to_document(machine: &Machine) -> MachineDocument {
    let states = machine
        .states()
        .map(|(_, state)| {
            let transitions = state
                .transitions()
                .filter_map(|(_, transition)| {
                    let destination = machine.state_by_id(transition.destination())?;
                    Some(TransitionDocument {
                        destination: destination.name().to_string(),
                        inchar: transition.input().to_string(),
                        outchar: transition.output().map(String::from),
                        movement: transition.direction().code().to_string(),
                    })
                })
                .collect();

            let position = state.position();
            let document = StateDocument {
                transitions,
                accepting: state.is_accepting(),
                submachine: state.submachine().map(str::to_string),
                x: position.x,
                y: position.y,
            };
            (state.name().to_string(), document)
        })
        .collect();

    MachineDocument {
        states,
        submachines: None,
    }
}
