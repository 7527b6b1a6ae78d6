// SPDX-License-Identifier: MIT

use super::{layout, leaves_of, only_padding, LeafModule, Module, Node};
use crate::emit::Emitter;
use crate::{DescriptorError, Result};
use log::debug;

/// Type of HID report
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportKind {
    Input,
    Output,
    Feature,
}

impl core::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ReportKind::Input => "Input",
            ReportKind::Output => "Output",
            ReportKind::Feature => "Feature",
        };
        write!(f, "{name}")
    }
}

/// One Input, Output or Feature report.
///
/// The report's fields are laid out when the report is created: fields
/// that would overspan get padding or a larger size, the report is padded
/// to whole bytes and adjacent padding is merged. A [ReportModule] is
/// final once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportModule {
    kind: ReportKind,
    report_id: u8,
    children: Vec<Node>,
}

impl ReportModule {
    /// Create a report from its fields and collections in wire order.
    ///
    /// Every field must have been built for a report of the same `kind`.
    pub fn new(kind: ReportKind, report_id: u8, mut children: Vec<Node>) -> Result<ReportModule> {
        if report_id == 0 {
            return Err(DescriptorError::OutOfRange {
                what: "report id",
                value: 0,
                min: 1,
                max: i64::from(u8::MAX),
            });
        }
        if children.is_empty() {
            return Err(DescriptorError::Missing("report children"));
        }
        let mismatched = leaves_of(&children)
            .iter()
            .filter_map(|leaf| leaf.report_kind())
            .any(|leaf_kind| leaf_kind != kind);
        if mismatched {
            return Err(DescriptorError::Conflict(
                "a field was built for a different report kind",
            ));
        }

        debug!("laying out {kind} report {report_id}");
        layout::apply(&mut children)?;

        if only_padding(&children) {
            return Err(DescriptorError::OnlyPadding("report"));
        }

        Ok(ReportModule {
            kind,
            report_id,
            children,
        })
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn report_id(&self) -> u8 {
        self.report_id
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// All fields of this report in wire order, including padding
    pub fn leaves(&self) -> Vec<&LeafModule> {
        leaves_of(&self.children)
    }

    /// The length of this report on the wire, including the report id byte
    pub fn size_in_bytes(&self) -> usize {
        self.total_size_bits() as usize / 8 + 1
    }
}

impl Module for ReportModule {
    fn total_size_bits(&self) -> u32 {
        super::total_size_bits(&self.children)
    }

    fn total_nonadjusted_size_bits(&self) -> u32 {
        super::total_nonadjusted_size_bits(&self.children)
    }

    fn emit(&self, out: &mut Emitter) {
        out.report(self.kind, self.report_id, &self.children);
    }
}
