//! Layered, dot-addressable configuration trees.
//!
//! - [`Path`]: ordered key segments, written `"a.b.c"`
//! - [`Tree`]: one layer of nested keys where only leaves carry values
//! - [`Forest`]: a priority stack of trees (and nested forests) with
//!   shadowing lookup and flattening into a single tree
//!
//! Loading text is left to serde: a [`Tree`] deserializes from any nested
//! map and serializes back to one.
//!
//! ```
//! use keytree::{Forest, Tree};
//!
//! let project: Tree = toml::from_str("[db]\nhost = \"db.local\"\n").unwrap();
//! let defaults: Tree = toml::from_str("[db]\nhost = \"localhost\"\nport = 5432\n").unwrap();
//! let layers = Forest::from_iter([project, defaults]);
//!
//! let settings = layers.flatten();
//! assert_eq!(settings.get("db.host").unwrap().as_str(), Some("db.local"));
//! assert_eq!(settings.get("db.port").unwrap().as_integer(), Some(5432));
//! ```

pub mod domain;
pub mod tree_traits;
pub mod util;

pub use domain::{
    combine, forest_from_list, tree_from_map, DefaultPolicy, Forest, KeyTreeError,
    KeyTreeResult, Node, Path, Tree, Wood, WoodBuilder,
};
pub use toml::{Table, Value};
pub use tree_traits::TreeDisplay;
