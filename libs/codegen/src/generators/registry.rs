//! Run-scoped record of emitted symbols

use std::collections::BTreeSet;

/// Namespace of an emitted symbol. The same type name is emitted once per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Rust,
    TypeScript,
    GraphQl,
    Infra,
}

/// Tracks which types and operations were already emitted during one run.
///
/// Created once at the start of a run and passed by reference through every
/// emitter call. A fragment that defines a named symbol asks the registry
/// first and emits nothing when the answer is `false`.
#[derive(Debug, Clone, Default)]
pub struct EmissionRegistry {
    rendered_types: BTreeSet<(Target, String)>,
    rendered_operations: BTreeSet<(Target, String)>,
}

impl EmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `name` is requested for `target`.
    pub fn mark_type_rendered(&mut self, target: Target, name: &str) -> bool {
        self.rendered_types.insert((target, name.to_string()))
    }

    /// Returns `true` the first time operation `name` is requested for `target`.
    pub fn mark_operation_rendered(&mut self, target: Target, name: &str) -> bool {
        self.rendered_operations.insert((target, name.to_string()))
    }

    pub fn is_type_rendered(&self, target: Target, name: &str) -> bool {
        self.rendered_types.contains(&(target, name.to_string()))
    }

    pub fn rendered_types(&self, target: Target) -> impl Iterator<Item = &str> {
        self.rendered_types
            .iter()
            .filter(move |(t, _)| *t == target)
            .map(|(_, name)| name.as_str())
    }

    pub fn rendered_operations(&self, target: Target) -> impl Iterator<Item = &str> {
        self.rendered_operations
            .iter()
            .filter(move |(t, _)| *t == target)
            .map(|(_, name)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins() {
        let mut registry = EmissionRegistry::new();
        assert!(registry.mark_type_rendered(Target::Rust, "Address"));
        assert!(!registry.mark_type_rendered(Target::Rust, "Address"));
        assert!(registry.is_type_rendered(Target::Rust, "Address"));
    }

    #[test]
    fn targets_are_independent() {
        let mut registry = EmissionRegistry::new();
        assert!(registry.mark_type_rendered(Target::Rust, "Address"));
        assert!(registry.mark_type_rendered(Target::TypeScript, "Address"));
        assert!(registry.mark_operation_rendered(Target::GraphQl, "createWidgets"));
        assert!(registry.mark_operation_rendered(Target::Infra, "createWidgets"));
        assert!(!registry.mark_operation_rendered(Target::GraphQl, "createWidgets"));
    }

    #[test]
    fn types_and_operations_do_not_collide() {
        let mut registry = EmissionRegistry::new();
        assert!(registry.mark_type_rendered(Target::GraphQl, "widgets"));
        assert!(registry.mark_operation_rendered(Target::GraphQl, "widgets"));
        let types: Vec<&str> = registry.rendered_types(Target::GraphQl).collect();
        let ops: Vec<&str> = registry.rendered_operations(Target::GraphQl).collect();
        assert_eq!(types, vec!["widgets"]);
        assert_eq!(ops, vec!["widgets"]);
    }

    #[test]
    fn separate_registries_do_not_share_state() {
        let mut first = EmissionRegistry::new();
        first.mark_type_rendered(Target::Rust, "Widgets");
        let mut second = EmissionRegistry::new();
        assert!(second.mark_type_rendered(Target::Rust, "Widgets"));
    }
}
