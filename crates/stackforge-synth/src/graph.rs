//! The stack dependency graph.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use stackforge_core::stack::Stack;
use stackforge_core::{Error, Result};

/// An ordered set of stacks plus their dependency edges.
///
/// Insertion order is preserved and used to break ties, so a graph built
/// from the same inputs always yields the same deployment order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackGraph {
    stacks: Vec<Stack>,
}

impl StackGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack. Two stacks with the same name cannot coexist.
    pub fn add(&mut self, stack: Stack) -> Result<()> {
        if self.stacks.iter().any(|s| s.name == stack.name) {
            return Err(Error::NamingCollision {
                scope: "stack-graph".to_string(),
                name: stack.name,
            });
        }
        tracing::debug!(stack = %stack.name, deps = ?stack.depends_on, "added stack");
        self.stacks.push(stack);
        Ok(())
    }

    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn get(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// Check that every dependency edge points at a known stack and that
    /// the graph is acyclic.
    pub fn validate(&self) -> Result<()> {
        for stack in &self.stacks {
            for dep in &stack.depends_on {
                if self.get(dep).is_none() {
                    return Err(Error::UnresolvedReference(format!(
                        "stack '{}' depends on unknown stack '{}'",
                        stack.name, dep
                    )));
                }
            }
        }
        self.detect_cycle()
    }

    /// Stacks in dependency order: every stack appears after all stacks it
    /// depends on. Fails on unknown dependencies or cycles.
    pub fn topological_order(&self) -> Result<Vec<&Stack>> {
        self.validate()?;

        let mut placed = HashSet::new();
        let mut order = Vec::new();
        for stack in &self.stacks {
            self.place_after_deps(&stack.name, &mut placed, &mut order);
        }
        Ok(order)
    }

    /// Deployment tier of each stack: a stack with no dependencies is tier
    /// 1; otherwise one past its deepest dependency. Stacks in the same
    /// tier may deploy concurrently.
    pub fn deploy_tiers(&self) -> Result<HashMap<String, u32>> {
        self.validate()?;

        let mut tiers: HashMap<String, u32> = HashMap::new();
        for stack in self.topological_order()? {
            let tier = stack
                .depends_on
                .iter()
                .filter_map(|dep| tiers.get(dep))
                .max()
                .map(|t| t + 1)
                .unwrap_or(1);
            tiers.insert(stack.name.clone(), tier);
        }
        Ok(tiers)
    }

    fn detect_cycle(&self) -> Result<()> {
        let mut done = HashSet::new();
        let mut path = HashSet::new();
        for stack in &self.stacks {
            self.walk_for_cycles(&stack.name, &mut done, &mut path)?;
        }
        Ok(())
    }

    /// Depth-first walk keeping the set of stacks on the current path; a
    /// dependency edge back into that path is a cycle.
    fn walk_for_cycles<'a>(
        &'a self,
        name: &'a str,
        done: &mut HashSet<&'a str>,
        path: &mut HashSet<&'a str>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        path.insert(name);
        if let Some(stack) = self.get(name) {
            for dep in &stack.depends_on {
                if path.contains(dep.as_str()) {
                    return Err(Error::CycleDetected(format!("{name} -> {dep}")));
                }
                self.walk_for_cycles(dep, done, path)?;
            }
        }
        path.remove(name);
        done.insert(name);
        Ok(())
    }

    /// Post-order placement: dependencies first, then the stack itself.
    fn place_after_deps<'a>(
        &'a self,
        name: &'a str,
        placed: &mut HashSet<&'a str>,
        order: &mut Vec<&'a Stack>,
    ) {
        if !placed.insert(name) {
            return;
        }
        let Some(stack) = self.get(name) else { return };
        for dep in &stack.depends_on {
            self.place_after_deps(dep, placed, order);
        }
        order.push(stack);
    }
}
