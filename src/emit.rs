// SPDX-License-Identifier: MIT

//! Conversion of the module tree into short items.
//!
//! Every field is emitted self-contained: its usage page, usages, logical
//! and physical range, unit, size and count precede its main item. With
//! optimization enabled, runs of sibling variables that only differ in
//! their usage share one main item. With global elision enabled, global
//! items that restate the current value are dropped.

use crate::config::CompileOptions;
use crate::flags::{DataFlags, Grouping};
use crate::item::{
    ItemCategory, ItemKind, ItemValue, ShortItem, COLLECTION_APPLICATION, COLLECTION_LOGICAL,
    COLLECTION_PHYSICAL,
};
use crate::module::{
    CollectionKind, DataField, LeafModule, Module, Node, ReportKind, ReportModule, VariableModule,
};
use crate::usage::{UsageRange, UsageRef};
use log::{debug, trace};
use std::collections::BTreeMap;

/// The usages preceding a data field's main item
pub(crate) enum FieldUsages<'a> {
    /// One Usage item each, all on the page of the first
    List(&'a [UsageRef]),
    /// Usage Minimum and Usage Maximum
    Range(UsageRange),
}

/// State tracker for the global items emitted so far.
#[derive(Debug, Default)]
struct GlobalState {
    current: BTreeMap<ItemKind, ItemValue>,
    stack: Vec<BTreeMap<ItemKind, ItemValue>>,
}

impl GlobalState {
    /// Apply `item` to the state, returns false if the item changes nothing
    /// and can be dropped.
    fn update(&mut self, item: &ShortItem) -> bool {
        match item.kind() {
            ItemKind::Push => {
                self.stack.push(self.current.clone());
                true
            }
            ItemKind::Pop => {
                if let Some(saved) = self.stack.pop() {
                    self.current = saved;
                }
                true
            }
            kind if kind.category() == ItemCategory::Global => {
                self.current.insert(kind, item.value()) != Some(item.value())
            }
            _ => true,
        }
    }
}

/// Collects the short items of a descriptor.
#[derive(Debug)]
pub struct Emitter {
    items: Vec<ShortItem>,
    optimize: bool,
    globals: Option<GlobalState>,
    report: Option<ReportKind>,
}

impl Emitter {
    /// An empty emitter. Only the optimize and elide switches of
    /// `options` apply here, packing was applied when the leaves were built.
    pub fn new(options: &CompileOptions) -> Emitter {
        Emitter {
            items: Vec::new(),
            optimize: options.is_optimized(),
            globals: options.elides_redundant_globals().then(GlobalState::default),
            report: None,
        }
    }

    /// The items emitted so far
    pub fn finish(self) -> Vec<ShortItem> {
        self.items
    }

    fn push(&mut self, item: ShortItem) {
        if let Some(globals) = &mut self.globals {
            if !globals.update(&item) {
                trace!("eliding redundant {item}");
                return;
            }
        }
        self.items.push(item);
    }

    fn unsigned(&mut self, kind: ItemKind, value: u32) {
        self.push(ShortItem::unsigned(kind, value));
    }

    fn signed(&mut self, kind: ItemKind, value: i32) {
        self.push(ShortItem::signed(kind, value));
    }

    fn open_collection(&mut self, usage: UsageRef, code: u32) {
        self.unsigned(ItemKind::UsagePage, u32::from(usage.page()));
        self.unsigned(ItemKind::Usage, u32::from(usage.id()));
        self.unsigned(ItemKind::Collection, code);
    }

    fn close_collection(&mut self) {
        self.push(ShortItem::empty(ItemKind::EndCollection));
    }

    fn main_item(&mut self, bits: u32) {
        let Some(report) = self.report else {
            panic!("field emitted outside of a report");
        };
        self.push(ShortItem::main(report, bits));
    }

    pub(crate) fn application(&mut self, usage: UsageRef, reports: &[ReportModule]) {
        self.open_collection(usage, COLLECTION_APPLICATION);
        for report in reports {
            report.emit(self);
        }
        self.close_collection();
    }

    pub(crate) fn report(&mut self, kind: ReportKind, report_id: u8, children: &[Node]) {
        self.report = Some(kind);
        self.unsigned(ItemKind::ReportId, u32::from(report_id));
        self.children(children);
        self.report = None;
    }

    pub(crate) fn collection(&mut self, kind: CollectionKind, usage: UsageRef, children: &[Node]) {
        let code = match kind {
            CollectionKind::Physical => COLLECTION_PHYSICAL,
            CollectionKind::Logical => COLLECTION_LOGICAL,
        };
        self.open_collection(usage, code);
        self.children(children);
        self.close_collection();
    }

    /// Emit the children of a report or collection in order, combining
    /// runs of compatible single-value variables when optimizing.
    fn children(&mut self, children: &[Node]) {
        let mut run: Vec<&VariableModule> = Vec::new();
        for child in children {
            match child {
                Node::Leaf(LeafModule::Variable(v)) if self.optimize => {
                    let joins = run.first().is_some_and(|first| first.combinable_with(v));
                    if !joins {
                        self.flush(&mut run);
                    }
                    run.push(v);
                }
                other => {
                    self.flush(&mut run);
                    other.emit(self);
                }
            }
        }
        self.flush(&mut run);
    }

    fn flush(&mut self, run: &mut Vec<&VariableModule>) {
        match run.as_slice() {
            [] => {}
            [single] => self.data_field(
                FieldUsages::List(&[single.usage()]),
                single.field(),
                single.count(),
                Grouping::Variable,
            ),
            [first, ..] => {
                let usages: Vec<UsageRef> = run.iter().map(|v| v.usage()).collect();
                debug!(
                    "combining {} variables on usage page {:#06x}",
                    usages.len(),
                    first.usage().page()
                );
                self.data_field(
                    FieldUsages::List(&usages),
                    first.field(),
                    usages.len() as u32,
                    Grouping::Variable,
                );
            }
        }
        run.clear();
    }

    pub(crate) fn data_field(
        &mut self,
        usages: FieldUsages<'_>,
        field: &DataField,
        count: u32,
        grouping: Grouping,
    ) {
        match usages {
            FieldUsages::List(list) => {
                if let Some(first) = list.first() {
                    self.unsigned(ItemKind::UsagePage, u32::from(first.page()));
                }
                for usage in list {
                    self.unsigned(ItemKind::Usage, u32::from(usage.id()));
                }
            }
            FieldUsages::Range(range) => {
                self.unsigned(ItemKind::UsagePage, u32::from(range.page()));
                self.unsigned(ItemKind::UsageMinimum, u32::from(range.start().id()));
                self.unsigned(ItemKind::UsageMaximum, u32::from(range.end().id()));
            }
        }

        self.signed(ItemKind::LogicalMinimum, field.logical_minimum());
        self.signed(ItemKind::LogicalMaximum, field.logical_maximum());
        self.signed(ItemKind::PhysicalMinimum, field.physical_minimum());
        self.signed(ItemKind::PhysicalMaximum, field.physical_maximum());
        let exponent = field.unit_exponent().map_or(0, |e| u32::from(e.code()));
        self.unsigned(ItemKind::UnitExponent, exponent);
        self.unsigned(ItemKind::Unit, field.unit().map_or(0, |u| u.packed()));
        self.unsigned(ItemKind::ReportSize, field.size().adjusted());
        self.unsigned(ItemKind::ReportCount, count);
        self.main_item(field.flags().bits(grouping));
    }

    pub(crate) fn padding(&mut self, size_in_bits: u32) {
        self.unsigned(ItemKind::ReportSize, size_in_bits);
        self.unsigned(ItemKind::ReportCount, 1);
        self.main_item(DataFlags::padding().bits(Grouping::Variable));
    }
}
