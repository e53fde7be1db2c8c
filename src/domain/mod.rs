//! Domain layer: key paths, trees and forests
//!
//! This layer is independent of external concerns (no I/O, no parsing, no file discovery).

pub mod builder;
pub mod combine;
pub mod error;
pub mod forest;
pub mod path;
pub mod tree;

pub use builder::{forest_from_list, tree_from_map, WoodBuilder};
pub use error::{KeyTreeError, KeyTreeResult};
pub use forest::{Forest, Trees, Wood};
pub use path::{Path, SEPARATOR};
pub use tree::{Children, DefaultFn, DefaultPolicy, Leaves, Node, Tree};
