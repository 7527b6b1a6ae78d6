// SPDX-License-Identifier: MIT

use super::{only_padding, Module, Node};
use crate::emit::Emitter;
use crate::usage::UsageRef;
use crate::{DescriptorError, Result};

/// The kind of a collection nested inside a report.
///
/// Application collections are the top level of the tree and are
/// represented by [ApplicationCollectionModule](super::ApplicationCollectionModule).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Physical,
    Logical,
}

/// A Physical or Logical collection. Collections group fields, they have no
/// influence on the report data itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionModule {
    kind: CollectionKind,
    usage: UsageRef,
    pub(super) children: Vec<Node>,
}

impl CollectionModule {
    /// Create a collection. It must contain at least one field that is
    /// not padding.
    pub fn new(kind: CollectionKind, usage: UsageRef, children: Vec<Node>) -> Result<Self> {
        if children.is_empty() {
            return Err(DescriptorError::Missing("collection children"));
        }
        if only_padding(&children) {
            return Err(DescriptorError::OnlyPadding("collection"));
        }
        Ok(CollectionModule {
            kind,
            usage,
            children,
        })
    }

    pub fn physical(usage: UsageRef, children: Vec<Node>) -> Result<Self> {
        CollectionModule::new(CollectionKind::Physical, usage, children)
    }

    pub fn logical(usage: UsageRef, children: Vec<Node>) -> Result<Self> {
        CollectionModule::new(CollectionKind::Logical, usage, children)
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn usage(&self) -> UsageRef {
        self.usage
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl Module for CollectionModule {
    fn total_size_bits(&self) -> u32 {
        super::total_size_bits(&self.children)
    }

    fn total_nonadjusted_size_bits(&self) -> u32 {
        super::total_nonadjusted_size_bits(&self.children)
    }

    fn emit(&self, out: &mut Emitter) {
        out.collection(self.kind, self.usage, &self.children);
    }
}
