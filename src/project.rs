//! This module defines `Project`, a by-name collection of machines that may call each
//! other as submachines.

use crate::machine::{Machine, MachineId};
use crate::registry::Registry;
use crate::types::ModelError;

/// Turing machine project consisting of multiple machines.
#[derive(Debug, Clone, Default)]
pub struct Project {
    machines: Registry<Machine>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty machine.
    ///
    /// # Returns
    ///
    /// * `Ok(MachineId)` of the new machine.
    /// * `Err(ModelError::NameInUse)` if the project already has a machine with this name.
    pub fn add_machine(&mut self, name: &str) -> Result<MachineId, ModelError> {
        self.machines.add(Machine::new(name))
    }

    pub fn machine(&self, name: &str) -> Option<&Machine> {
        self.machines.get(name)
    }

    pub fn machine_mut(&mut self, name: &str) -> Option<&mut Machine> {
        self.machines.get_mut(name)
    }

    pub fn machine_id(&self, name: &str) -> Option<MachineId> {
        self.machines.handle_of(name)
    }

    pub fn machine_by_id(&self, id: MachineId) -> Option<&Machine> {
        self.machines.by_handle(id)
    }

    pub fn machine_by_id_mut(&mut self, id: MachineId) -> Option<&mut Machine> {
        self.machines.by_handle_mut(id)
    }

    /// Renames a machine. On failure the machine keeps its old name.
    ///
    /// States naming the machine as their submachine are not updated; submachine
    /// names are resolved only when a simulation enters them.
    pub fn rename_machine(&mut self, name: &str, new_name: &str) -> Result<(), ModelError> {
        let id = self
            .machines
            .handle_of(name)
            .ok_or_else(|| ModelError::NotFound(name.to_string()))?;
        self.machines.rename(id, new_name)
    }

    /// Removes a machine. Removing an unknown machine does nothing.
    pub fn remove_machine(&mut self, name: &str) -> Option<Machine> {
        self.machines.remove(name).map(|(_, machine)| machine)
    }

    pub fn machine_names(&self) -> impl Iterator<Item = &str> {
        self.machines.names()
    }

    pub fn machines(&self) -> impl Iterator<Item = (MachineId, &Machine)> {
        self.machines.iter()
    }

    /// Number of machines, which also bounds how deep submachine calls may chain
    /// without consuming input.
    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_machine() {
        let mut project = Project::new();
        let id = project.add_machine("mac").unwrap();
        project.add_machine("win").unwrap();

        assert_eq!(project.machine_count(), 2);
        assert_eq!(project.machine("mac").unwrap().name(), "mac");
        assert_eq!(project.machine_by_id(id).unwrap().name(), "mac");
        assert!(project.machine("lin").is_none());
    }

    #[test]
    fn test_add_duplicate_machine_fails() {
        let mut project = Project::new();
        project.add_machine("mac").unwrap();

        assert_eq!(
            project.add_machine("mac"),
            Err(ModelError::NameInUse("mac".to_string()))
        );
        assert_eq!(project.machine_count(), 1);
    }

    #[test]
    fn test_rename_machine() {
        let mut project = Project::new();
        let id = project.add_machine("mac").unwrap();
        project.add_machine("win").unwrap();

        assert_eq!(
            project.rename_machine("mac", "win"),
            Err(ModelError::NameInUse("win".to_string()))
        );
        assert_eq!(project.machine_by_id(id).unwrap().name(), "mac");

        project.rename_machine("mac", "lin").unwrap();
        assert!(project.machine("mac").is_none());
        assert_eq!(project.machine("lin").unwrap().name(), "lin");
        assert_eq!(project.machine_id("lin"), Some(id));
    }

    #[test]
    fn test_remove_machine() {
        let mut project = Project::new();
        project.add_machine("mac").unwrap();

        assert!(project.remove_machine("missing").is_none());
        assert_eq!(project.remove_machine("mac").unwrap().name(), "mac");
        assert_eq!(project.machine_count(), 0);
        assert_eq!(project.machine_names().count(), 0);
    }

    #[test]
    fn test_edit_machine_through_project() {
        let mut project = Project::new();
        project.add_machine("mac").unwrap();

        let machine = project.machine_mut("mac").unwrap();
        machine.add_state("start").unwrap();
        machine.state_mut("start").unwrap().set_submachine(Some("ghost"));

        let start = project.machine("mac").unwrap().state("start").unwrap();
        assert_eq!(start.submachine(), Some("ghost"));
    }
}
