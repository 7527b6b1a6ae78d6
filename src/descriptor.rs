// SPDX-License-Identifier: MIT

use crate::config::CompileOptions;
use crate::emit::Emitter;
use crate::item::{ItemKind, ShortItem};
use crate::module::{ApplicationCollectionModule, Module, ReportKind};
use crate::{DescriptorError, Result};
use log::trace;
use std::collections::BTreeSet;

/// A complete HID Report Descriptor: one or more application collections.
///
/// Report ids are unique per report kind across the whole descriptor, an
/// Input report and a Feature report may share an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    applications: Vec<ApplicationCollectionModule>,
}

impl Descriptor {
    pub fn new(applications: Vec<ApplicationCollectionModule>) -> Result<Descriptor> {
        if applications.is_empty() {
            return Err(DescriptorError::Missing("application collection"));
        }
        let mut seen: BTreeSet<(ReportKind, u8)> = BTreeSet::new();
        for report in applications.iter().flat_map(|app| app.reports()) {
            if !seen.insert((report.kind(), report.report_id())) {
                return Err(DescriptorError::DuplicateReportId {
                    kind: report.kind(),
                    id: report.report_id(),
                });
            }
        }
        Ok(Descriptor { applications })
    }

    pub fn applications(&self) -> &[ApplicationCollectionModule] {
        &self.applications
    }

    /// The short items of this descriptor in order
    pub fn items(&self, options: &CompileOptions) -> Vec<ShortItem> {
        let mut out = Emitter::new(options);
        for application in &self.applications {
            application.emit(&mut out);
        }
        out.finish()
    }

    /// The binary report descriptor.
    ///
    /// The output of this function is not guaranteed to be stable, different
    /// versions of this crate may produce different report descriptors for
    /// the same tree.
    pub fn to_bytes(&self, options: &CompileOptions) -> Vec<u8> {
        let bytes: Vec<u8> = self
            .items(options)
            .iter()
            .flat_map(ShortItem::to_bytes)
            .collect();
        trace!("report descriptor is {} bytes", bytes.len());
        bytes
    }

    /// A human-readable listing of the items, one per line, indented by
    /// collection depth.
    pub fn summary(&self, options: &CompileOptions) -> String {
        let mut depth = 0usize;
        let mut lines = Vec::new();
        for item in self.items(options) {
            if item.kind() == ItemKind::EndCollection {
                depth = depth.saturating_sub(1);
            }
            let hex: Vec<String> = item.to_bytes().iter().map(|b| format!("{b:02x}")).collect();
            lines.push(format!("{:<15} {}{item}", hex.join(" "), "  ".repeat(depth)));
            if item.kind() == ItemKind::Collection {
                depth += 1;
            }
        }
        lines.join("\n")
    }
}
