// SPDX-License-Identifier: MIT

//! The module tree a descriptor is compiled from.
//!
//! The tree is built bottom-up: leaves first, then the collections and
//! reports that own them, then the application collections. Each node owns
//! its children, there are no back-references. The report kind a leaf
//! belongs to is passed in when the leaf is built.
//!
//! ```text
//! ApplicationCollectionModule
//! └── ReportModule (Input/Output/Feature, report id)
//!     ├── LeafModule
//!     └── CollectionModule (Logical/Physical)
//!         └── LeafModule, CollectionModule, ...
//! ```

mod application;
mod collection;
mod layout;
mod leaf;
mod report;

pub use application::ApplicationCollectionModule;
pub use collection::{CollectionKind, CollectionModule};
pub use leaf::{
    minimal_bits, signed_range, unsigned_range, ArrayModule, DataField, FieldSize, LeafModule,
    PaddingModule, VariableModule, VariableRangeModule, MAX_REPORT_COUNT, UNDEFINED_PHYSICAL,
};
pub use report::{ReportKind, ReportModule};

use crate::emit::Emitter;

/// The operations every node of the tree has in common.
pub trait Module {
    /// The size in bits on the wire, after packing
    fn total_size_bits(&self) -> u32;

    /// The size in bits as requested, before packing
    fn total_nonadjusted_size_bits(&self) -> u32;

    /// Append this node's short items
    fn emit(&self, out: &mut Emitter);
}

/// A child of a report or collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Collection(CollectionModule),
    Leaf(LeafModule),
}

impl Node {
    /// All leaves below this node in depth-first order
    pub fn leaves(&self) -> Vec<&LeafModule> {
        let mut leaves = Vec::new();
        collect_leaves(core::slice::from_ref(self), &mut leaves);
        leaves
    }
}

impl Module for Node {
    fn total_size_bits(&self) -> u32 {
        match self {
            Node::Collection(c) => c.total_size_bits(),
            Node::Leaf(l) => l.total_size_bits(),
        }
    }

    fn total_nonadjusted_size_bits(&self) -> u32 {
        match self {
            Node::Collection(c) => c.total_nonadjusted_size_bits(),
            Node::Leaf(l) => l.total_nonadjusted_size_bits(),
        }
    }

    fn emit(&self, out: &mut Emitter) {
        match self {
            Node::Collection(c) => c.emit(out),
            Node::Leaf(l) => l.emit(out),
        }
    }
}

impl From<LeafModule> for Node {
    fn from(leaf: LeafModule) -> Node {
        Node::Leaf(leaf)
    }
}

impl From<CollectionModule> for Node {
    fn from(collection: CollectionModule) -> Node {
        Node::Collection(collection)
    }
}

fn collect_leaves<'a>(nodes: &'a [Node], leaves: &mut Vec<&'a LeafModule>) {
    for node in nodes {
        match node {
            Node::Leaf(leaf) => leaves.push(leaf),
            Node::Collection(c) => collect_leaves(c.children(), leaves),
        }
    }
}

pub(crate) fn leaves_of(nodes: &[Node]) -> Vec<&LeafModule> {
    let mut leaves = Vec::new();
    collect_leaves(nodes, &mut leaves);
    leaves
}

/// True if every leaf below `nodes` is padding
pub(crate) fn only_padding(nodes: &[Node]) -> bool {
    leaves_of(nodes).iter().all(|leaf| leaf.is_padding())
}

pub(crate) fn total_size_bits(nodes: &[Node]) -> u32 {
    nodes.iter().map(|node| node.total_size_bits()).sum()
}

pub(crate) fn total_nonadjusted_size_bits(nodes: &[Node]) -> u32 {
    nodes
        .iter()
        .map(|node| node.total_nonadjusted_size_bits())
        .sum()
}
