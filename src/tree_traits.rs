//! Text rendering of key trees and forests.

use std::fmt;

use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::{Children, Forest, Node, Tree, Wood};

pub trait TreeDisplay {
    fn to_term_tree(&self) -> TermTree<String>;
}

impl TreeDisplay for Tree {
    #[instrument(level = "trace", skip(self))]
    fn to_term_tree(&self) -> TermTree<String> {
        TermTree::new(".".to_string()).with_leaves(branch_leaves(self.children()))
    }
}

impl TreeDisplay for Forest {
    fn to_term_tree(&self) -> TermTree<String> {
        let leaves: Vec<_> = self
            .iter()
            .enumerate()
            .map(|(position, wood)| match wood {
                Wood::Tree(tree) => {
                    TermTree::new(format!("[{position}]")).with_leaves(branch_leaves(tree.children()))
                }
                Wood::Forest(forest) => {
                    let mut nested = forest.to_term_tree();
                    nested.root = format!("[{position}] forest");
                    nested
                }
            })
            .collect();
        TermTree::new("forest".to_string()).with_leaves(leaves)
    }
}

fn branch_leaves(children: &Children) -> Vec<TermTree<String>> {
    children
        .iter()
        .map(|(key, node)| match node {
            Node::Leaf(value) => TermTree::new(format!("{key} = {value}")),
            Node::Branch(children) => TermTree::new(key.clone()).with_leaves(branch_leaves(children)),
        })
        .collect()
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_term_tree())
    }
}

impl fmt::Display for Forest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_term_tree())
    }
}
