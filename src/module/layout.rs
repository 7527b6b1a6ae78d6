// SPDX-License-Identifier: MIT

//! Report layout correction.
//!
//! Runs once over the children of a report, treating collections as
//! transparent, in three passes that each run to a fixed point:
//!
//! 1. overspan correction: no field instance may extend beyond 32 bits
//!    from the start of the byte it starts in. Offending fields get
//!    prefix padding and/or a larger size.
//! 2. byte alignment: a trailing pad rounds the report up to whole bytes.
//! 3. padding coalescing: adjacent pads merge where the result still fits.

use super::{leaves_of, FieldSize, LeafModule, Module, Node};
use crate::{Result, MAX_FIELD_BITS};
use log::{debug, trace};

type Path = Vec<usize>;

/// True if any of `count` instances of `size` bits, the first starting at
/// bit `offset`, ends more than 32 bits after the start of its first byte.
pub(crate) fn overspans(offset: u32, size: u32, count: u32) -> bool {
    let (offset, size) = (u64::from(offset), u64::from(size));
    // Instance offsets modulo 8 repeat after 8 instances
    (0..u64::from(count.min(8)))
        .any(|i| (offset + i * size) % 8 + size > u64::from(MAX_FIELD_BITS))
}

/// The paths of all leaves in depth-first order, matching [leaves_of].
fn leaf_paths(nodes: &[Node]) -> Vec<Path> {
    fn walk(nodes: &[Node], prefix: &mut Path, paths: &mut Vec<Path>) {
        for (idx, node) in nodes.iter().enumerate() {
            prefix.push(idx);
            match node {
                Node::Leaf(_) => paths.push(prefix.clone()),
                Node::Collection(c) => walk(&c.children, prefix, paths),
            }
            prefix.pop();
        }
    }

    let mut paths = Vec::new();
    walk(nodes, &mut Vec::new(), &mut paths);
    paths
}

/// The list holding the node at `path`, and the node's index in it.
fn siblings_mut<'a>(nodes: &'a mut Vec<Node>, path: &[usize]) -> (&'a mut Vec<Node>, usize) {
    let Some((&last, parents)) = path.split_last() else {
        panic!("empty path into the module tree");
    };
    let mut siblings = nodes;
    for &idx in parents {
        siblings = match &mut siblings[idx] {
            Node::Collection(c) => &mut c.children,
            Node::Leaf(_) => panic!("path {path:?} runs through a leaf"),
        };
    }
    (siblings, last)
}

fn leaf_mut<'a>(nodes: &'a mut Vec<Node>, path: &[usize]) -> &'a mut LeafModule {
    let (siblings, idx) = siblings_mut(nodes, path);
    match &mut siblings[idx] {
        Node::Leaf(leaf) => leaf,
        Node::Collection(_) => panic!("path {path:?} does not end in a leaf"),
    }
}

/// Find the smallest size and prefix padding that place `count` instances
/// at `offset` without overspanning. Size is tried first.
fn resolve_overspan(offset: u32, size: FieldSize, count: u32) -> (u32, u32) {
    for requested in size.requested()..=MAX_FIELD_BITS {
        let adjusted = size.with_requested(requested).adjusted();
        if let Some(pad) = (0..8).find(|pad| !overspans(offset + pad, adjusted, count)) {
            return (requested, pad);
        }
    }
    // A 32-bit field on a byte boundary never overspans
    panic!(
        "no layout for {count} x {} bits at bit offset {offset}",
        size.requested()
    );
}

/// The index of the first overspanning leaf and the (size, padding)
/// that fixes it.
fn find_overspan(nodes: &[Node]) -> Option<(usize, u32, u32)> {
    let mut offset = 0;
    for (index, leaf) in leaves_of(nodes).into_iter().enumerate() {
        let size = leaf.size();
        if overspans(offset, size.adjusted(), leaf.count()) {
            let (requested, pad) = resolve_overspan(offset, size, leaf.count());
            trace!(
                "leaf {index} at bit {offset} overspans, using {requested} bits after {pad} bits of padding"
            );
            return Some((index, requested, pad));
        }
        offset += leaf.total_size_bits();
    }
    None
}

fn correct_overspans(nodes: &mut Vec<Node>) -> Result<()> {
    while let Some((index, requested, pad)) = find_overspan(nodes) {
        let paths = leaf_paths(nodes);
        let path = &paths[index];
        let leaf = leaf_mut(nodes, path);
        if leaf.size().requested() != requested {
            debug!(
                "growing leaf {index} from {} to {requested} bits",
                leaf.size().requested()
            );
            leaf.set_requested_size(requested);
        }
        if pad > 0 {
            debug!("inserting {pad} bits of padding before leaf {index}");
            let (siblings, idx) = siblings_mut(nodes, path);
            siblings.insert(idx, LeafModule::padding(pad)?.into());
        }
    }
    Ok(())
}

fn align_to_byte(nodes: &mut Vec<Node>) -> Result<()> {
    let total = super::total_size_bits(nodes);
    let remainder = total % 8;
    if remainder != 0 {
        let pad = 8 - remainder;
        debug!("appending {pad} bits of padding to reach {} bits", total + pad);
        nodes.push(LeafModule::padding(pad)?.into());
    }
    Ok(())
}

/// The index of the first pad that can absorb the pad after it, and the
/// combined size.
fn find_mergeable(nodes: &[Node]) -> Option<(usize, u32)> {
    let leaves = leaves_of(nodes);
    let mut offset = 0;
    for (index, pair) in leaves.windows(2).enumerate() {
        let (first, second) = (pair[0], pair[1]);
        if first.is_padding() && second.is_padding() {
            let combined = first.size().requested() + second.size().requested();
            if combined <= MAX_FIELD_BITS && !overspans(offset, combined, 1) {
                return Some((index, combined));
            }
        }
        offset += first.total_size_bits();
    }
    None
}

fn coalesce_padding(nodes: &mut Vec<Node>) {
    while let Some((index, combined)) = find_mergeable(nodes) {
        debug!("merging padding leaves {index} and {} into {combined} bits", index + 1);
        let paths = leaf_paths(nodes);
        leaf_mut(nodes, &paths[index]).set_requested_size(combined);
        let (siblings, idx) = siblings_mut(nodes, &paths[index + 1]);
        siblings.remove(idx);
    }
}

/// Lay out the children of a report.
pub(super) fn apply(nodes: &mut Vec<Node>) -> Result<()> {
    trace!("layout: {} bits before correction", super::total_size_bits(nodes));
    correct_overspans(nodes)?;
    align_to_byte(nodes)?;
    coalesce_padding(nodes);
    trace!("layout: {} bits after correction", super::total_size_bits(nodes));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompileOptions, ComposeContext, PackingPolicy};
    use crate::element::ElementSpec;
    use crate::init_logging;
    use crate::module::{CollectionModule, ReportKind};
    use crate::usage::{AnyUsage, UsageRef};

    fn field(id: u16, bits: u32) -> Node {
        let options = CompileOptions::new();
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let spec = ElementSpec::variable(UsageRef::new(0x01, id)).size_in_bits(bits);
        LeafModule::new(spec, ReportKind::Input, &ctx).unwrap().into()
    }

    fn pad(bits: u32) -> Node {
        LeafModule::padding(bits).unwrap().into()
    }

    /// (is_padding, requested size) of every leaf
    fn shape(nodes: &[Node]) -> Vec<(bool, u32)> {
        leaves_of(nodes)
            .iter()
            .map(|leaf| (leaf.is_padding(), leaf.size().requested()))
            .collect()
    }

    #[test]
    fn test_overspans() {
        assert!(!overspans(0, 32, 1));
        assert!(overspans(1, 32, 1));
        assert!(!overspans(7, 25, 1));
        assert!(overspans(7, 26, 1));
        // The second instance starts at bit 31
        assert!(overspans(0, 31, 2));
        assert!(!overspans(0, 16, 100));
        assert!(!overspans(4, 4, 65535));
    }

    #[test]
    fn test_trailing_padding() {
        init_logging();
        let mut nodes = vec![field(0x30, 12), field(0x31, 8)];
        apply(&mut nodes).unwrap();
        assert_eq!(super::super::total_size_bits(&nodes), 24);
        assert_eq!(shape(&nodes), vec![(false, 12), (false, 8), (true, 4)]);
    }

    #[test]
    fn test_aligned_report_unchanged() {
        init_logging();
        let mut nodes = vec![field(0x30, 8), field(0x31, 16)];
        let before = nodes.clone();
        apply(&mut nodes).unwrap();
        assert_eq!(nodes, before);
    }

    #[test]
    fn test_overspan_inserts_padding() {
        init_logging();
        // A 30-bit field at bit 3 would end at bit 33 of its first byte,
        // the next usable start is the following byte boundary
        let mut nodes = vec![field(0x30, 3), field(0x31, 30)];
        apply(&mut nodes).unwrap();
        assert_eq!(
            shape(&nodes),
            vec![(false, 3), (true, 5), (false, 30), (true, 2)]
        );
        assert_eq!(super::super::total_size_bits(&nodes), 40);
    }

    #[test]
    fn test_overspan_grows_field() {
        init_logging();
        // No prefix padding places three 31-bit instances, 32 bits does
        let options = CompileOptions::new();
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let spec = ElementSpec::variable(UsageRef::new(0x01, 0x30))
            .size_in_bits(31)
            .count(3);
        let mut nodes: Vec<Node> = vec![LeafModule::new(spec, ReportKind::Input, &ctx)
            .unwrap()
            .into()];
        apply(&mut nodes).unwrap();
        assert_eq!(shape(&nodes), vec![(false, 32)]);
    }

    #[test]
    fn test_overspan_inside_collection() {
        init_logging();
        let inner = CollectionModule::physical(UsageRef::new(0x01, 0x01), vec![field(0x31, 30)])
            .unwrap();
        let mut nodes = vec![field(0x30, 3), inner.into()];
        apply(&mut nodes).unwrap();
        let Node::Collection(c) = &nodes[1] else {
            panic!("expected the collection to stay in place");
        };
        assert_eq!(shape(c.children()), vec![(true, 5), (false, 30)]);
    }

    #[test]
    fn test_coalescing() {
        init_logging();
        let mut nodes = vec![field(0x30, 8), pad(3), pad(5)];
        apply(&mut nodes).unwrap();
        assert_eq!(shape(&nodes), vec![(false, 8), (true, 8)]);
    }

    #[test]
    fn test_coalescing_respects_limit() {
        init_logging();
        let mut nodes = vec![pad(24), pad(16), field(0x30, 8)];
        apply(&mut nodes).unwrap();
        assert_eq!(shape(&nodes), vec![(true, 24), (true, 16), (false, 8)]);
    }

    #[test]
    fn test_coalescing_across_collection() {
        init_logging();
        let inner =
            CollectionModule::logical(UsageRef::new(0x01, 0x01), vec![pad(2), field(0x31, 6)])
                .unwrap();
        let mut nodes = vec![field(0x30, 8), pad(6), inner.into()];
        apply(&mut nodes).unwrap();
        assert_eq!(
            shape(&nodes),
            vec![(false, 8), (true, 8), (false, 6), (true, 2)]
        );
    }

    #[test]
    fn test_byte_packing_layout() {
        init_logging();
        let options = CompileOptions::new().packing(PackingPolicy::bytes(1).unwrap());
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let spec = ElementSpec::variable(UsageRef::new(0x01, 0x30)).logical_range(0, 100);
        let mut nodes: Vec<Node> =
            vec![LeafModule::new(spec, ReportKind::Input, &ctx).unwrap().into(), pad(4)];
        apply(&mut nodes).unwrap();
        assert_eq!(super::super::total_size_bits(&nodes), 16);
        assert_eq!(super::super::total_nonadjusted_size_bits(&nodes), 15);
    }
}
