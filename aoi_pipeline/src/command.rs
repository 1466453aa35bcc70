//! Per-state command tables
//!
//! A state registers its commands every time it is entered. Lookup walks the
//! active path from the leaf upwards, so a key registered by a state is only
//! reachable while that state is on the path.

use crate::vsm::StateKind;

/// Zero-argument operations a state can run in response to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Re-enter the previous sibling of the current leaf
    Cancel,
    ListAois,
    StepFrame,
    ConfirmName,
    ConfirmMarkers,
    ResetPoints,
    CommitAoi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GoTo(StateKind),
    Invoke(Operation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub key: String,
    pub description: String,
    pub action: Action,
}

#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    commands: Vec<Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key`; a later registration of the same key replaces the earlier one
    pub fn register(&mut self, key: &str, description: &str, action: Action) {
        let key = key.to_lowercase();
        let command = Command {
            key: key.clone(),
            description: description.to_string(),
            action,
        };
        match self.commands.iter_mut().find(|c| c.key == key) {
            Some(existing) => *existing = command,
            None => self.commands.push(command),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut table = CommandTable::new();
        table.register("P", "Pause playback.", Action::GoTo(StateKind::Paused));
        table.register("l", "List AOIs.", Action::Invoke(Operation::ListAois));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("p").unwrap().action, Action::GoTo(StateKind::Paused));
        assert!(table.get("x").is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut table = CommandTable::new();
        table.register("d", "first", Action::Invoke(Operation::ConfirmName));
        table.register("d", "second", Action::Invoke(Operation::CommitAoi));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("d").unwrap().description, "second");
    }
}
