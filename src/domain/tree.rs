//! Single-layer key tree: nested key/value tables addressed by [`Path`].
//!
//! Values only ever live at leaves. Assigning at a path first removes any
//! stored structure that conflicts with it, an ancestor leaf or a subtree of
//! descendants, so no stored leaf path is ever a prefix of another.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use toml::{Table, Value};
use tracing::{debug, instrument, trace};

use crate::domain::combine;
use crate::domain::error::{KeyTreeError, KeyTreeResult};
use crate::domain::path::Path;

/// Entries of one branch, in insertion order.
pub type Children = IndexMap<String, Node>;

/// What a key in a branch holds: exactly one of a value or nested keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Value),
    Branch(Children),
}

impl Node {
    /// Tables become branches (recursively), everything else a leaf.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Table(table) => Node::Branch(children_from_table(table)),
            other => Node::Leaf(other),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Node::Leaf(value) => value,
            Node::Branch(children) => Value::Table(table_from_children(&children)),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Leaf(value) => value.clone(),
            Node::Branch(children) => Value::Table(table_from_children(children)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Turn this slot into a branch, discarding a leaf, and hand out its children.
    fn branch_mut(&mut self) -> &mut Children {
        match self {
            Node::Branch(children) => children,
            slot => {
                *slot = Node::Branch(Children::new());
                slot.branch_mut()
            }
        }
    }
}

/// Computes a value for a missing path from the tree it was looked up in.
pub type DefaultFn = Arc<dyn Fn(&Tree, &Path) -> Value + Send + Sync>;

/// What `get` yields when a path has no leaf.
#[derive(Clone, Default)]
pub enum DefaultPolicy {
    #[default]
    None,
    Fixed(Value),
    Computed(DefaultFn),
}

impl fmt::Debug for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultPolicy::None => f.write_str("None"),
            DefaultPolicy::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            DefaultPolicy::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A tree of key/value tables.
///
/// ```
/// use keytree::Tree;
///
/// let mut tree: Tree = toml::from_str("a = 1\n[b]\nc = 2\n").unwrap();
/// assert_eq!(tree.get("b.c").unwrap().as_integer(), Some(2));
///
/// tree.set("b", 3_i64).unwrap();
/// assert!(tree.get("b.c").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tree {
    root: Children,
    default: DefaultPolicy,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from nested tables. Dotted keys are split into nested keys, and
    /// a later key wins over an earlier one it conflicts with.
    pub fn from_map(map: Table) -> Self {
        Self {
            root: children_from_table(map),
            default: DefaultPolicy::None,
        }
    }

    /// Value returned by `get` for any missing path.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = DefaultPolicy::Fixed(value.into());
        self
    }

    /// Function evaluated by `get` for any missing path.
    pub fn with_default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Tree, &Path) -> Value + Send + Sync + 'static,
    {
        self.default = DefaultPolicy::Computed(Arc::new(f));
        self
    }

    pub fn default_policy(&self) -> &DefaultPolicy {
        &self.default
    }

    pub fn set_default_policy(&mut self, policy: DefaultPolicy) {
        self.default = policy;
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn children(&self) -> &Children {
        &self.root
    }

    /// Node stored exactly at `path`, leaf or branch.
    pub fn node(&self, path: &Path) -> Option<&Node> {
        let (last, init) = path.segments().split_last()?;
        let mut current = &self.root;
        for key in init {
            match current.get(key)? {
                Node::Branch(children) => current = children,
                Node::Leaf(_) => return None,
            }
        }
        current.get(last)
    }

    /// Leaf at `path`, without any default.
    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        match self.node(path)? {
            Node::Leaf(value) => Some(value),
            Node::Branch(_) => None,
        }
    }

    /// Leaf at `path`, else the tree's default.
    ///
    /// Fails with `KeyNotFound` when the path misses and there is no default.
    pub fn get(&self, path: impl Into<Path>) -> KeyTreeResult<Value> {
        let path = path.into();
        if let Some(value) = self.lookup(&path) {
            return Ok(value.clone());
        }
        self.default_for(&path)
            .ok_or(KeyTreeError::KeyNotFound(path))
    }

    /// Leaf at `path`, else the tree's default, else `fallback`.
    pub fn get_or(&self, path: impl Into<Path>, fallback: impl Into<Value>) -> Value {
        let path = path.into();
        match self.lookup(&path) {
            Some(value) => value.clone(),
            None => self.default_for(&path).unwrap_or_else(|| fallback.into()),
        }
    }

    /// `get` applied to each path in turn.
    pub fn values_at<I, P>(&self, paths: I) -> KeyTreeResult<Vec<Value>>
    where
        I: IntoIterator<Item = P>,
        P: Into<Path>,
    {
        paths.into_iter().map(|path| self.get(path)).collect()
    }

    /// Leaf at `path`. Defaults never apply here.
    pub fn fetch(&self, path: impl Into<Path>) -> KeyTreeResult<&Value> {
        let path = path.into();
        match self.lookup(&path) {
            Some(value) => Ok(value),
            None => Err(KeyTreeError::KeyNotFound(path)),
        }
    }

    /// Leaf at `path`, else whatever `fallback` makes of the missing path.
    pub fn fetch_or_else<F>(&self, path: impl Into<Path>, fallback: F) -> Value
    where
        F: FnOnce(&Path) -> Value,
    {
        let path = path.into();
        match self.lookup(&path) {
            Some(value) => value.clone(),
            None => fallback(&path),
        }
    }

    fn default_for(&self, path: &Path) -> Option<Value> {
        match &self.default {
            DefaultPolicy::None => None,
            DefaultPolicy::Fixed(value) => Some(value.clone()),
            DefaultPolicy::Computed(f) => Some(f(self, path)),
        }
    }

    /// Assign `value` at `path`, creating intermediate branches.
    ///
    /// A table value is stored as nested keys. Whatever conflicts with `path`
    /// is deleted first: a leaf at one of its ancestors, or everything below it.
    pub fn set(&mut self, path: impl Into<Path>, value: impl Into<Value>) -> KeyTreeResult<()> {
        let path = path.into();
        if path.is_empty() {
            return Err(KeyTreeError::invalid("cannot assign to the empty key path"));
        }
        self.store(&path, Node::from_value(value.into()));
        Ok(())
    }

    #[instrument(level = "trace", skip(self, node))]
    fn store(&mut self, path: &Path, node: Node) {
        store(&mut self.root, path.segments(), node);
    }

    /// Remove the leaf at `path`. Branches are left alone.
    pub fn delete(&mut self, path: impl Into<Path>) -> Option<Value> {
        let path = path.into();
        let (last, init) = path.segments().split_last()?;
        let mut current = &mut self.root;
        for key in init {
            current = match current.get_mut(key) {
                Some(Node::Branch(children)) => children,
                _ => return None,
            };
        }
        if !current.get(last)?.is_leaf() {
            return None;
        }
        trace!(%path, "deleting leaf");
        match current.shift_remove(last) {
            Some(Node::Leaf(value)) => Some(value),
            _ => None,
        }
    }

    /// Does `path` lead to a leaf?
    pub fn contains_key(&self, path: impl Into<Path>) -> bool {
        self.lookup(&path.into()).is_some()
    }

    /// Does every segment of `path` resolve, whether or not it ends in a leaf?
    pub fn has_prefix(&self, path: impl Into<Path>) -> bool {
        let path = path.into();
        path.is_empty() || self.node(&path).is_some()
    }

    /// Does this tree take `path` away from lower-priority layers?
    ///
    /// True when `path` resolves in full (leaf or branch), or when walking it
    /// reaches an explicitly empty branch above it. A leaf above the path
    /// does not claim it.
    pub fn claims(&self, path: &Path) -> bool {
        let segments = path.segments();
        let mut current = &self.root;
        for (depth, key) in segments.iter().enumerate() {
            let last = depth + 1 == segments.len();
            match current.get(key) {
                None => return false,
                Some(Node::Leaf(_)) => return last,
                Some(Node::Branch(children)) => {
                    if last || children.is_empty() {
                        return true;
                    }
                    current = children;
                }
            }
        }
        true
    }

    /// Is `needle` stored at any leaf?
    pub fn contains_value(&self, needle: &Value) -> bool {
        self.iter().any(|(_, value)| value == needle)
    }

    /// All maximal leaf paths, depth first in insertion order.
    pub fn key_paths(&self) -> Vec<Path> {
        self.iter().map(|(path, _)| path).collect()
    }

    /// `(path, value)` for every leaf, depth first in insertion order.
    pub fn iter(&self) -> Leaves<'_> {
        Leaves {
            stack: vec![(Path::new(), self.root.iter())],
        }
    }

    /// New tree with `other` deep-merged on top of this one; `other` wins conflicts.
    pub fn merge(&self, other: &Tree) -> Tree {
        self.merge_with(other, combine::replace)
    }

    /// New tree with `other` deep-merged on top of this one; `combiner`
    /// resolves every collision that is not branch against branch.
    pub fn merge_with<F>(&self, other: &Tree, combiner: F) -> Tree
    where
        F: FnMut(&Path, Value, Value) -> Value,
    {
        let mut result = self.clone();
        result.merge_in_place_with(other, combiner);
        result
    }

    pub fn merge_in_place(&mut self, other: &Tree) -> &mut Self {
        self.merge_in_place_with(other, combine::replace)
    }

    pub fn merge_in_place_with<F>(&mut self, other: &Tree, mut combiner: F) -> &mut Self
    where
        F: FnMut(&Path, Value, Value) -> Value,
    {
        debug!(incoming = other.root.len(), "merging tree");
        merge_children(&mut self.root, other.root.clone(), &Path::new(), &mut combiner);
        self
    }

    /// Copy of this tree with every key path moved under `prefix`.
    pub fn nest_under(&self, prefix: &Path) -> Tree {
        let mut root = self.root.clone();
        for key in prefix.segments().iter().rev() {
            let mut wrapper = Children::new();
            wrapper.insert(key.clone(), Node::Branch(root));
            root = wrapper;
        }
        Tree {
            root,
            default: self.default.clone(),
        }
    }

    /// Nested tables, keys in their string form.
    pub fn to_plain_map(&self) -> Table {
        table_from_children(&self.root)
    }
}

/// Depth-first iterator over the leaves of a [`Tree`].
pub struct Leaves<'a> {
    stack: Vec<(Path, indexmap::map::Iter<'a, String, Node>)>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (Path, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (prefix, entries) = self.stack.last_mut()?;
            match entries.next() {
                None => {
                    self.stack.pop();
                }
                Some((key, Node::Leaf(value))) => return Some((prefix.child(key), value)),
                Some((key, Node::Branch(children))) => {
                    let path = prefix.child(key);
                    self.stack.push((path, children.iter()));
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = (Path, &'a Value);
    type IntoIter = Leaves<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn store(mut current: &mut Children, segments: &[String], node: Node) {
    let Some((last, init)) = segments.split_last() else {
        return;
    };
    for key in init {
        let slot = current
            .entry(key.clone())
            .or_insert_with(|| Node::Branch(Children::new()));
        if slot.is_leaf() {
            debug!(key = %key, "replacing leaf on the way to a deeper key");
        }
        current = slot.branch_mut();
    }
    if let Some(Node::Branch(dropped)) = current.insert(last.clone(), node) {
        if !dropped.is_empty() {
            debug!(key = %last, dropped = dropped.len(), "replacing subtree");
        }
    }
}

fn merge_children(
    left: &mut Children,
    right: Children,
    prefix: &Path,
    combiner: &mut dyn FnMut(&Path, Value, Value) -> Value,
) {
    for (key, incoming) in right {
        let path = prefix.child(&key);
        let Some(existing) = left.get_mut(&key) else {
            left.insert(key, incoming);
            continue;
        };
        match (existing, incoming) {
            (Node::Branch(children), Node::Branch(incoming)) => {
                merge_children(children, incoming, &path, combiner);
            }
            (existing, incoming) => {
                trace!(%path, "resolving merge collision");
                let current = std::mem::replace(existing, Node::Branch(Children::new()));
                let combined = combiner(&path, current.into_value(), incoming.into_value());
                *existing = Node::from_value(combined);
            }
        }
    }
}

fn children_from_table(table: Table) -> Children {
    let mut children = Children::new();
    for (key, value) in table {
        let path = if key.is_empty() {
            Path::new().child(&key)
        } else {
            Path::from(key)
        };
        store(&mut children, path.segments(), Node::from_value(value));
    }
    children
}

fn table_from_children(children: &Children) -> Table {
    children
        .iter()
        .map(|(key, node)| (key.clone(), node.to_value()))
        .collect()
}

impl From<Table> for Tree {
    fn from(map: Table) -> Self {
        Tree::from_map(map)
    }
}

impl TryFrom<Value> for Tree {
    type Error = KeyTreeError;

    fn try_from(value: Value) -> KeyTreeResult<Self> {
        match value {
            Value::Table(map) => Ok(Tree::from_map(map)),
            other => Err(KeyTreeError::invalid(format!(
                "expected a table of keys, got {}",
                other.type_str()
            ))),
        }
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        Value::Table(tree.to_plain_map())
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_plain_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Table::deserialize(deserializer).map(Tree::from_map)
    }
}
