// SPDX-License-Identifier: MIT

use super::{Module, ReportModule};
use crate::emit::Emitter;
use crate::usage::UsageRef;
use crate::{DescriptorError, Result};

/// A top-level Application collection, e.g. a mouse or a keyboard.
///
/// An application collection owns its reports, each report owns its
/// fields and nested collections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationCollectionModule {
    usage: UsageRef,
    reports: Vec<ReportModule>,
}

impl ApplicationCollectionModule {
    pub fn new(usage: UsageRef, reports: Vec<ReportModule>) -> Result<Self> {
        if reports.is_empty() {
            return Err(DescriptorError::Missing("application collection reports"));
        }
        Ok(ApplicationCollectionModule { usage, reports })
    }

    pub fn usage(&self) -> UsageRef {
        self.usage
    }

    pub fn reports(&self) -> &[ReportModule] {
        &self.reports
    }
}

impl Module for ApplicationCollectionModule {
    fn total_size_bits(&self) -> u32 {
        self.reports.iter().map(|r| r.total_size_bits()).sum()
    }

    fn total_nonadjusted_size_bits(&self) -> u32 {
        self.reports
            .iter()
            .map(|r| r.total_nonadjusted_size_bits())
            .sum()
    }

    fn emit(&self, out: &mut Emitter) {
        out.application(self.usage, &self.reports);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompileOptions, ComposeContext};
    use crate::element::ElementSpec;
    use crate::module::{LeafModule, ReportKind};
    use crate::usage::AnyUsage;

    #[test]
    fn test_application_requires_reports() {
        let app = ApplicationCollectionModule::new(UsageRef::new(0x01, 0x02), vec![]);
        assert!(matches!(app, Err(DescriptorError::Missing(_))));
    }

    #[test]
    fn test_application_size() {
        let options = CompileOptions::new();
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let report = |kind, id| {
            let spec = ElementSpec::variable(UsageRef::new(0x01, 0x30)).size_in_bits(16);
            let leaf = LeafModule::new(spec, kind, &ctx).unwrap();
            ReportModule::new(kind, id, vec![leaf.into()]).unwrap()
        };
        let app = ApplicationCollectionModule::new(
            UsageRef::new(0x01, 0x02),
            vec![report(ReportKind::Input, 1), report(ReportKind::Feature, 1)],
        )
        .unwrap();
        assert_eq!(app.reports().len(), 2);
        assert_eq!(app.total_size_bits(), 32);
    }
}
