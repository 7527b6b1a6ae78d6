// SPDX-License-Identifier: MIT

//! Property-based tests for item encoding, range resolution and report
//! layout.
//!
//! Uses proptest to verify invariants on:
//! - short items decode to the value they were encoded from
//! - minimal_bits is the smallest size that holds a range
//! - laid out reports are byte-aligned and free of overspanning fields
//! - layout is a fixed point: laying out a laid out report changes nothing
//! - combined sibling fields report one value per usage

use hidcompose::*;
use proptest::prelude::*;

/// A leaf to generate: padding or a variable, with size and count.
#[derive(Clone, Debug)]
struct LeafSpec {
    padding: bool,
    bits: u32,
    count: u32,
}

fn leaf_spec() -> impl Strategy<Value = LeafSpec> {
    (any::<bool>(), 1u32..=32, 1u32..=4).prop_map(|(padding, bits, count)| LeafSpec {
        padding,
        bits,
        count,
    })
}

fn build_report(specs: &[LeafSpec], options: &CompileOptions) -> Result<ReportModule> {
    let ctx = ComposeContext::new(options, &AnyUsage);
    let mut children: Vec<Node> = Vec::new();
    for (idx, spec) in specs.iter().enumerate() {
        let element = if spec.padding {
            ElementSpec::padding(spec.bits)
        } else {
            ElementSpec::variable(UsageRef::new(0xFF00, idx as u16 + 1))
                .size_in_bits(spec.bits)
                .count(spec.count)
        };
        children.push(LeafModule::new(element, ReportKind::Feature, &ctx)?.into());
    }
    ReportModule::new(ReportKind::Feature, 1, children)
}

fn fits(bits: u32, minimum: i32, maximum: i32) -> bool {
    let (lo, hi) = (i64::from(minimum), i64::from(maximum));
    let signed = lo >= -(1i64 << (bits - 1)) && hi < (1i64 << (bits - 1));
    let unsigned = lo >= 0 && hi < (1i64 << bits);
    signed || unsigned
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A signed item decodes to the value it was built from.
    #[test]
    fn prop_signed_item_decodes(value: i32) {
        let item = ShortItem::signed(ItemKind::LogicalMinimum, value);
        let bytes = item.to_bytes();
        prop_assert!(matches!(bytes.len(), 2 | 3 | 5), "unexpected length {}", bytes.len());

        let (decoded, len) = ShortItem::decode(&bytes).expect("item should decode");
        prop_assert_eq!(len, bytes.len());
        prop_assert_eq!(decoded.kind(), ItemKind::LogicalMinimum);
        prop_assert_eq!(decoded.value(), ItemValue::Signed(value));
    }

    /// An unsigned item decodes to the value it was built from.
    #[test]
    fn prop_unsigned_item_decodes(value: u32) {
        let item = ShortItem::unsigned(ItemKind::ReportCount, value);
        let bytes = item.to_bytes();
        let (decoded, len) = ShortItem::decode(&bytes).expect("item should decode");
        prop_assert_eq!(len, bytes.len());
        prop_assert_eq!(decoded.value(), ItemValue::Unsigned(value));
    }

    /// The minimal size holds the range and one bit less does not.
    #[test]
    fn prop_minimal_bits_is_minimal(a: i32, b: i32) {
        let (minimum, maximum) = (a.min(b), a.max(b));
        let bits = minimal_bits(minimum, maximum);
        prop_assert!((1..=MAX_FIELD_BITS).contains(&bits));
        prop_assert!(fits(bits, minimum, maximum), "{bits} bits for [{minimum}, {maximum}]");
        if bits > 1 {
            prop_assert!(!fits(bits - 1, minimum, maximum));
        }
    }

    /// The full signed range of a size needs exactly that size.
    #[test]
    fn prop_minimal_bits_of_signed_range(bits in 1u32..=32) {
        let (minimum, maximum) = signed_range(bits);
        prop_assert_eq!(minimal_bits(minimum, maximum), bits);
    }

    /// Reports are whole bytes and no field instance overspans.
    #[test]
    fn prop_layout_invariants(
        specs in prop::collection::vec(leaf_spec(), 1..8),
        byte_packing: bool,
    ) {
        let mut specs = specs;
        specs[0].padding = false;
        let packing = if byte_packing {
            PackingPolicy::bytes(1).unwrap()
        } else {
            PackingPolicy::none()
        };
        let options = CompileOptions::new().packing(packing);
        let report = build_report(&specs, &options).unwrap();

        let total = report.total_size_bits();
        prop_assert_eq!(total % 8, 0);
        prop_assert_eq!(report.size_in_bytes(), total as usize / 8 + 1);
        prop_assert!(total >= report.total_nonadjusted_size_bits());

        let mut offset = 0u32;
        for leaf in report.leaves() {
            let size = leaf.size().adjusted();
            for i in 0..leaf.count() {
                let start = offset + i * size;
                prop_assert!(start % 8 + size <= 32, "{size} bits at bit {start}");
            }
            offset += size * leaf.count();
        }
        prop_assert_eq!(offset, total);
        prop_assert!(!report.leaves().iter().all(|leaf| leaf.is_padding()));
    }

    /// Laying out an already laid out report leaves it unchanged.
    #[test]
    fn prop_layout_is_stable(specs in prop::collection::vec(leaf_spec(), 1..8)) {
        let mut specs = specs;
        specs[0].padding = false;
        let report = build_report(&specs, &CompileOptions::new()).unwrap();
        let again = ReportModule::new(ReportKind::Feature, 1, report.children().to_vec()).unwrap();
        prop_assert_eq!(again.children(), report.children());
    }

    /// With optimization every usage is emitted once. A main item with
    /// several usages has one value per usage.
    #[test]
    fn prop_combined_count_matches_usages(
        fields in prop::collection::vec((prop::sample::select(vec![8u32, 16]), 1u32..=3), 1..10),
    ) {
        let options = CompileOptions::new().optimize(true);
        let ctx = ComposeContext::new(&options, &AnyUsage);
        let children: Vec<Node> = fields
            .iter()
            .enumerate()
            .map(|(idx, (bits, count))| {
                let spec = ElementSpec::variable(UsageRef::new(0x01, 0x30 + idx as u16))
                    .size_in_bits(*bits)
                    .count(*count);
                LeafModule::new(spec, ReportKind::Input, &ctx).unwrap().into()
            })
            .collect();
        let report = ReportModule::new(ReportKind::Input, 1, children).unwrap();
        let app = ApplicationCollectionModule::new(UsageRef::new(0x01, 0x04), vec![report]).unwrap();
        let items = Descriptor::new(vec![app]).unwrap().items(&options);

        // The usage of the application collection comes before Report ID
        let report_start = items
            .iter()
            .position(|item| item.kind() == ItemKind::ReportId)
            .unwrap();

        let mut usages = 0u32;
        let mut total_usages = 0u32;
        let mut report_count = 0u32;
        for item in &items[report_start..] {
            match (item.kind(), item.value()) {
                (ItemKind::Usage, _) => usages += 1,
                (ItemKind::ReportCount, ItemValue::Unsigned(count)) => report_count = count,
                (ItemKind::Input, _) => {
                    if usages > 1 {
                        prop_assert_eq!(report_count, usages);
                    }
                    total_usages += usages;
                    usages = 0;
                }
                _ => {}
            }
        }
        prop_assert_eq!(total_usages as usize, fields.len());
    }
}
