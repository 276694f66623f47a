//! This module provides the built-in library of sample projects, embedded into the
//! binary and parsed on first use.

use crate::loader::{MachineDocument, ProjectLoader};
use crate::project::Project;
use crate::types::TurrError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::warn;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 3] = [
    include_str!("../demos/unary-addition.json"),
    include_str!("../demos/even-ones.json"),
    include_str!("../demos/submachine-call.json"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<ProgramInfo>> = RwLock::new(Vec::new());
}

/// An embedded sample project together with the machine and input it is meant to run.
#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub name: String,
    pub description: String,
    /// The machine a simulation of this program starts in.
    pub machine: String,
    /// The suggested initial tape contents.
    pub input: String,
    pub project: Project,
}

#[derive(Debug, Deserialize)]
struct ProgramDocument {
    name: String,
    #[serde(default)]
    description: String,
    machine: String,
    #[serde(default)]
    input: String,
    machines: BTreeMap<String, MachineDocument>,
}

/// Parses one embedded program text.
pub fn parse_program(content: &str) -> Result<ProgramInfo, TurrError> {
    let document: ProgramDocument = serde_json::from_str(content)
        .map_err(|e| TurrError::MalformedFile(format!("Could not parse program: {}", e)))?;
    let project = ProjectLoader::project_from_documents(&document.machines)?;

    Ok(ProgramInfo {
        name: document.name,
        description: document.description,
        machine: document.machine,
        input: document.input,
        project,
    })
}

pub struct ProgramManager;

impl ProgramManager {
    /// Parses the embedded programs into `PROGRAMS` unless that already happened.
    pub fn load() -> Result<(), TurrError> {
        let mut programs = PROGRAMS
            .write()
            .map_err(|_| TurrError::FileError("Failed to acquire write lock".to_string()))?;
        if !programs.is_empty() {
            return Ok(());
        }

        for (index, text) in PROGRAM_TEXTS.iter().enumerate() {
            match parse_program(text) {
                Ok(program) => programs.push(program),
                Err(e) => warn!(index, error = %e, "failed to parse embedded program"),
            }
        }

        Ok(())
    }

    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        let _ = Self::load();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<ProgramInfo, TurrError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TurrError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| TurrError::ValidationError(format!("Program index {} out of range", index)))
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<ProgramInfo, TurrError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| TurrError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| TurrError::ValidationError(format!("Program '{}' not found", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map(|programs| programs.iter().map(|program| program.name.clone()).collect())
            .unwrap_or_default()
    }
}
