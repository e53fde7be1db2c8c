//! Builder turning loaded content (plain nested tables and lists) into trees
//! and forests, optionally nested under a key prefix.

use toml::{Table, Value};
use tracing::{debug, instrument};

use crate::domain::error::{KeyTreeError, KeyTreeResult};
use crate::domain::forest::{Forest, Wood};
use crate::domain::path::Path;
use crate::domain::tree::Tree;

/// Tree from nested tables.
pub fn tree_from_map(map: Table) -> Tree {
    Tree::from_map(map)
}

/// Forest from a list of tables and nested lists.
pub fn forest_from_list(list: Vec<Value>) -> KeyTreeResult<Forest> {
    Forest::from_list(list)
}

/// Constructs trees and forests from loaded content.
///
/// With a prefix, every tree built is nested under that key path, the way a
/// loader files the content of `db@prod.toml` under `db`.
#[derive(Debug, Clone, Default)]
pub struct WoodBuilder {
    prefix: Option<Path>,
}

impl WoodBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nest everything built under `prefix`. An empty prefix means no nesting.
    pub fn with_prefix(mut self, prefix: impl Into<Path>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn prefix(&self) -> Option<&Path> {
        self.prefix.as_ref()
    }

    #[instrument(level = "trace", skip(self, map), fields(prefix = ?self.prefix))]
    pub fn build_tree(&self, map: Table) -> Tree {
        let tree = Tree::from_map(map);
        match &self.prefix {
            None => tree,
            Some(prefix) => tree.nest_under(prefix),
        }
    }

    /// Elements that are tables become trees, lists become nested forests.
    pub fn build_forest(&self, list: Vec<Value>) -> KeyTreeResult<Forest> {
        debug!(entries = list.len(), "building forest");
        Forest::from_list_with(list, |element| self.build(element))
    }

    /// Tree for a table, forest for a list; anything else is rejected.
    pub fn build(&self, content: Value) -> KeyTreeResult<Wood> {
        match content {
            Value::Table(map) => Ok(Wood::Tree(self.build_tree(map))),
            Value::Array(list) => self.build_forest(list).map(Wood::Forest),
            other => Err(KeyTreeError::invalid(format!(
                "loaded content must be a table or an array, got {}",
                other.type_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prefix_means_no_nesting() {
        let builder = WoodBuilder::new().with_prefix("");
        assert_eq!(builder.prefix(), None);
    }

    #[test]
    fn test_build_rejects_scalars() {
        let result = WoodBuilder::new().build(Value::Integer(1));
        assert!(matches!(result, Err(KeyTreeError::InvalidArgument(_))));
    }
}
