//! Forests: priority-ordered, possibly nested stacks of trees.
//!
//! Earlier entries take precedence over later ones. Nested forests are
//! expanded level by level, so a tree at the top level outranks every tree
//! inside a nested forest next to it.

use std::collections::VecDeque;
use std::ops::Index;

use indexmap::IndexSet;
use toml::Value;
use tracing::{debug, instrument, trace};

use crate::domain::combine;
use crate::domain::error::{KeyTreeError, KeyTreeResult};
use crate::domain::path::Path;
use crate::domain::tree::Tree;

/// One entry of a forest.
#[derive(Debug, Clone, PartialEq)]
pub enum Wood {
    Tree(Tree),
    Forest(Forest),
}

impl From<Tree> for Wood {
    fn from(tree: Tree) -> Self {
        Wood::Tree(tree)
    }
}

impl From<Forest> for Wood {
    fn from(forest: Forest) -> Self {
        Wood::Forest(forest)
    }
}

/// Tables become trees, arrays become forests of their elements.
impl TryFrom<Value> for Wood {
    type Error = KeyTreeError;

    fn try_from(value: Value) -> KeyTreeResult<Self> {
        match value {
            Value::Table(map) => Ok(Wood::Tree(Tree::from_map(map))),
            Value::Array(list) => Forest::from_list(list).map(Wood::Forest),
            other => Err(KeyTreeError::invalid(format!(
                "expected a table or an array, got {}",
                other.type_str()
            ))),
        }
    }
}

/// A (possibly nested) collection of trees.
///
/// ```
/// use keytree::{Forest, Tree};
///
/// let high: Tree = toml::from_str("a = 1").unwrap();
/// let low: Tree = toml::from_str("a = 2\nb = 3").unwrap();
/// let forest = Forest::from_iter([high, low]);
///
/// assert_eq!(forest.lookup("a").and_then(|v| v.as_integer()), Some(1));
/// assert_eq!(forest.lookup("b").and_then(|v| v.as_integer()), Some(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    woods: Vec<Wood>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list whose elements are tables (trees) or lists (forests).
    pub fn from_list(list: Vec<Value>) -> KeyTreeResult<Self> {
        Self::from_list_with(list, Wood::try_from)
    }

    /// Build from a list, turning each element into a tree or forest with `f`.
    pub fn from_list_with<F>(list: Vec<Value>, f: F) -> KeyTreeResult<Self>
    where
        F: FnMut(Value) -> KeyTreeResult<Wood>,
    {
        let woods = list.into_iter().map(f).collect::<KeyTreeResult<Vec<_>>>()?;
        Ok(Self { woods })
    }

    /// Append a lowest-priority entry.
    pub fn push(&mut self, wood: impl Into<Wood>) -> &mut Self {
        self.woods.push(wood.into());
        self
    }

    pub fn len(&self) -> usize {
        self.woods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.woods.is_empty()
    }

    /// Top-level entry at `index`, regardless of precedence.
    pub fn get(&self, index: usize) -> Option<&Wood> {
        self.woods.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Wood> {
        self.woods.iter()
    }

    /// Is `wood` one of the top-level entries?
    pub fn contains(&self, wood: &Wood) -> bool {
        self.woods.contains(wood)
    }

    /// Every tree in the forest and its nested forests, in level order.
    ///
    /// Each call starts a fresh traversal.
    pub fn trees(&self) -> Trees<'_> {
        Trees {
            remaining: self.woods.iter().collect(),
        }
    }

    /// Value of the closest tree that has one for `path`.
    ///
    /// A closer tree that claims `path` without a value for it (an empty
    /// table at or above it, or a subtree at it) shadows
    /// every tree further away, and the lookup comes back empty.
    pub fn lookup(&self, path: impl Into<Path>) -> Option<Value> {
        self.lookup_path(&path.into())
    }

    #[instrument(level = "trace", skip(self))]
    fn lookup_path(&self, path: &Path) -> Option<Value> {
        for (layer, tree) in self.trees().enumerate() {
            if let Ok(value) = tree.get(path) {
                trace!(layer, "found value");
                return Some(value);
            }
            if tree.claims(path) {
                debug!(%path, layer, "key path shadowed by closer layer");
                return None;
            }
        }
        None
    }

    /// Leaf of the closest tree that has one for `path`. Trees' defaults and
    /// shadowing do not apply.
    pub fn fetch(&self, path: impl Into<Path>) -> KeyTreeResult<&Value> {
        let path = path.into();
        self.trees()
            .find_map(|tree| tree.lookup(&path))
            .ok_or(KeyTreeError::KeyNotFound(path))
    }

    pub fn fetch_or_else<F>(&self, path: impl Into<Path>, fallback: F) -> Value
    where
        F: FnOnce(&Path) -> Value,
    {
        let path = path.into();
        match self.trees().find_map(|tree| tree.lookup(&path)) {
            Some(value) => value.clone(),
            None => fallback(&path),
        }
    }

    /// Combine the values of every tree that owns `path`.
    ///
    /// Values are folded from the farthest owner to the closest one through
    /// `combiner(path, accumulated, next)`. An owner holding a subtree rather
    /// than a value at `path` is an error, as is having no owner at all.
    pub fn fetch_with<F>(&self, path: impl Into<Path>, mut combiner: F) -> KeyTreeResult<Value>
    where
        F: FnMut(&Path, Value, Value) -> Value,
    {
        let path = path.into();
        let values = self
            .trees()
            .filter(|tree| tree.has_prefix(&path))
            .map(|tree| tree.fetch(&path).cloned())
            .collect::<KeyTreeResult<Vec<_>>>()?;
        debug!(%path, owners = values.len(), "combining layered values");

        let mut values = values.into_iter().rev();
        let farthest = values
            .next()
            .ok_or_else(|| KeyTreeError::KeyNotFound(path.clone()))?;
        Ok(values.fold(farthest, |accumulated, next| {
            combiner(&path, accumulated, next)
        }))
    }

    /// Does any tree have a value at `path`?
    pub fn contains_key(&self, path: impl Into<Path>) -> bool {
        let path = path.into();
        self.trees().any(|tree| tree.contains_key(&path))
    }

    /// Does any tree resolve every segment of `path`?
    pub fn has_prefix(&self, path: impl Into<Path>) -> bool {
        let path = path.into();
        self.trees().any(|tree| tree.has_prefix(&path))
    }

    /// Collapse into one tree with the same precedence as `lookup`: trees are
    /// merged farthest first, so closer trees win conflicts.
    pub fn flatten(&self) -> Tree {
        self.flatten_with(combine::replace)
    }

    pub fn flatten_with<F>(&self, mut combiner: F) -> Tree
    where
        F: FnMut(&Path, Value, Value) -> Value,
    {
        let trees: Vec<&Tree> = self.trees().collect();
        debug!(layers = trees.len(), "flattening forest");
        trees.into_iter().rev().fold(Tree::new(), |mut result, tree| {
            result.merge_in_place_with(tree, &mut combiner);
            result
        })
    }

    /// Union of the key paths of every tree, in first-seen order.
    pub fn key_paths(&self) -> IndexSet<Path> {
        self.trees().flat_map(Tree::key_paths).collect()
    }
}

impl Index<usize> for Forest {
    type Output = Wood;

    fn index(&self, index: usize) -> &Wood {
        &self.woods[index]
    }
}

impl<W: Into<Wood>> FromIterator<W> for Forest {
    fn from_iter<I: IntoIterator<Item = W>>(iter: I) -> Self {
        Self {
            woods: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<W: Into<Wood>> Extend<W> for Forest {
    fn extend<I: IntoIterator<Item = W>>(&mut self, iter: I) {
        self.woods.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a Wood;
    type IntoIter = std::slice::Iter<'a, Wood>;

    fn into_iter(self) -> Self::IntoIter {
        self.woods.iter()
    }
}

impl TryFrom<Value> for Forest {
    type Error = KeyTreeError;

    fn try_from(value: Value) -> KeyTreeResult<Self> {
        match value {
            Value::Array(list) => Forest::from_list(list),
            other => Err(KeyTreeError::invalid(format!(
                "expected an array of layers, got {}",
                other.type_str()
            ))),
        }
    }
}

/// Level-order iterator over the trees of a [`Forest`].
///
/// Works off an explicit queue: trees are yielded as they come off the
/// front, nested forests append their entries to the back.
pub struct Trees<'a> {
    remaining: VecDeque<&'a Wood>,
}

impl<'a> Iterator for Trees<'a> {
    type Item = &'a Tree;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(wood) = self.remaining.pop_front() {
            match wood {
                Wood::Tree(tree) => return Some(tree),
                Wood::Forest(forest) => self.remaining.extend(forest.woods.iter()),
            }
        }
        None
    }
}
